//! Server configuration. Sources are applied in order, later ones winning:
//! built-in defaults, the YAML file, `APP__` environment variables
//! (`APP__SERVER__PORT=8081` sets `server.port`) and command line flags.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: Option<LoggingConfig>,
    /// Every `<name>.yaml` in here becomes `modules.<name>`.
    #[serde(default)]
    pub modules_dir: Option<String>,
    #[serde(default)]
    pub modules: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Base for relative log paths. Absolute after loading; empty means
    /// `~/.imobprime`.
    pub home_dir: String,
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub timeout_sec: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            home_dir: String::new(),
            host: "127.0.0.1".into(),
            port: 8080,
            timeout_sec: 0,
        }
    }
}

/// Log sections by target prefix; `default` applies to everything else.
pub type LoggingConfig = BTreeMap<String, LogSection>;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LogSection {
    pub console_level: String,
    /// Empty disables the file sink for this section.
    pub file: String,
    #[serde(default)]
    pub file_level: String,
    #[serde(default)]
    pub max_size_mb: Option<u64>,
}

/// Used when the config names no logging at all.
pub fn default_logging() -> LoggingConfig {
    LoggingConfig::from([(
        "default".to_string(),
        LogSection {
            console_level: "info".into(),
            file: "logs/imobprime.log".into(),
            file_level: "debug".into(),
            max_size_mb: Some(100),
        },
    )])
}

impl AppConfig {
    /// Load `path`, or use the defaults when there is none. `home_dir` is
    /// resolved and created either way.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self {
                logging: Some(default_logging()),
                ..Self::default()
            },
        };
        let home = resolve_home(&config.server.home_dir)?;
        std::fs::create_dir_all(&home)
            .with_context(|| format!("cannot create home_dir {}", home.display()))?;
        config.server.home_dir = home.to_string_lossy().into_owned();
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        anyhow::ensure!(path.is_file(), "config file not found: {}", path.display());
        let mut config: Self = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Yaml::file(path))
            .merge(Env::prefixed("APP__").split("__"))
            .extract()
            .with_context(|| format!("invalid config {}", path.display()))?;
        if let Some(dir) = &config.modules_dir {
            load_module_files(Path::new(dir), &mut config.modules)?;
        }
        Ok(config)
    }

    /// `--port` replaces `server.port`; each `-v` raises the default console
    /// level one step (debug, then trace).
    pub fn apply_cli(&mut self, port: Option<u16>, verbose: u8) {
        if let Some(port) = port {
            self.server.port = port;
        }
        let level = match verbose {
            0 => return,
            1 => "debug",
            _ => "trace",
        };
        if let Some(section) = self.logging.get_or_insert_with(default_logging).get_mut("default") {
            section.console_level = level.into();
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

impl modkit::ConfigProvider for AppConfig {
    fn module_section(&self, module: &str) -> Option<&Value> {
        self.modules.get(module)
    }
}

fn user_home() -> Result<PathBuf> {
    let var = if cfg!(windows) { "USERPROFILE" } else { "HOME" };
    std::env::var_os(var)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .context("cannot determine user home directory")
}

/// `~` expands to the user home, relative paths are taken from the current
/// directory and an empty value means `~/.imobprime`.
fn resolve_home(raw: &str) -> Result<PathBuf> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(user_home()?.join(".imobprime"));
    }
    if raw == "~" {
        return user_home();
    }
    if let Some(rest) = raw.strip_prefix("~/").or_else(|| raw.strip_prefix("~\\")) {
        return Ok(user_home()?.join(rest));
    }
    let path = PathBuf::from(raw);
    if path.is_absolute() {
        Ok(path)
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

fn load_module_files(dir: &Path, modules: &mut BTreeMap<String, Value>) -> Result<()> {
    if !dir.is_dir() {
        return Ok(());
    }
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_yaml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));
        let Some(name) = path.file_stem().and_then(|s| s.to_str()).filter(|_| is_yaml) else {
            continue;
        };
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        let section: Value = serde_yaml::from_str(&text)
            .with_context(|| format!("invalid YAML in {}", path.display()))?;
        modules.insert(name.to_string(), section);
    }
    Ok(())
}
