use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use modkit::{ModuleRegistry, RegistryBuilder, RunOptions, StopOn};
use runtime::AppConfig;
use serde_json::{json, Value};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// ImobPrime Server - real estate agency registry
#[derive(Parser)]
#[command(name = "imobprime-server", version = "0.1.0")]
#[command(about = "ImobPrime Server - real estate agency registry")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port for HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Start the server
    Run,
    /// Validate the configuration and exit
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    config.apply_cli(cli.port, cli.verbose);
    inject_bind_addr(&mut config, cli.port.is_some());

    runtime::logging::init(
        &config.logging.clone().unwrap_or_default(),
        Path::new(&config.server.home_dir),
    );
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "imobprime-server starting");

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => serve(config).await,
        Command::Check => check(&config),
    }
}

/// The ingress listens on `server.host:port` unless its own section names a
/// `bind_addr`. `--port` overrides both.
fn inject_bind_addr(config: &mut AppConfig, port_flag: bool) {
    let addr = config.bind_addr();
    let section = config
        .modules
        .entry(api_ingress::MODULE_NAME.to_string())
        .or_insert_with(|| json!({}));
    if let Some(section) = section.as_object_mut() {
        if port_flag || !section.contains_key("bind_addr") {
            section.insert("bind_addr".into(), Value::String(addr));
        }
    }
}

fn modules() -> Result<ModuleRegistry> {
    let mut builder = RegistryBuilder::default();
    api_ingress::register(&mut builder);
    real_estates::register(&mut builder);
    Ok(builder.build()?)
}

async fn serve(config: AppConfig) -> Result<()> {
    let registry = modules()?;
    tracing::info!(modules = ?registry.names(), "module graph resolved");
    modkit::run(RunOptions {
        registry,
        config: Arc::new(config),
        stop_on: StopOn::Signals,
    })
    .await
}

/// Parse every module section strictly and resolve the module graph without
/// starting anything.
fn check(config: &AppConfig) -> Result<()> {
    let ingress: api_ingress::ApiIngressConfig = section(config, api_ingress::MODULE_NAME)?;
    ingress
        .bind_addr
        .parse::<SocketAddr>()
        .with_context(|| format!("invalid bind address '{}'", ingress.bind_addr))?;

    let estates: real_estates::config::RealEstatesConfig = section(config, real_estates::MODULE_NAME)?;
    http::HeaderValue::from_str(&estates.cors_allowed_origin)
        .with_context(|| format!("invalid CORS origin '{}'", estates.cors_allowed_origin))?;

    let registry = modules()?;
    tracing::info!(modules = registry.names().len(), "configuration is valid");

    println!("Configuration check passed");
    println!("{}", config.to_yaml()?);
    Ok(())
}

fn section<T>(config: &AppConfig, name: &str) -> Result<T>
where
    T: serde::de::DeserializeOwned + Default,
{
    config
        .modules
        .get(name)
        .map(|value| {
            serde_json::from_value(value.clone()).with_context(|| format!("invalid config section modules.{name}"))
        })
        .unwrap_or_else(|| Ok(T::default()))
}
