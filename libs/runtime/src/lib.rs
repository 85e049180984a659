//! Process plumbing for the server binary: configuration loading and the
//! tracing subscriber.

pub mod config;
pub mod logging;

pub use config::{default_logging, AppConfig, LogSection, LoggingConfig, ServerConfig};
