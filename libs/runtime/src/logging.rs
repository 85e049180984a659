//! Tracing subscriber built from the `logging` config sections.
//!
//! Every section is keyed by a target prefix (`real_estates`, `tower_http`)
//! except `default`, which covers the rest. The console gets human readable
//! lines, files get one JSON object per line and rotate by size.

use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use file_rotate::compression::Compression;
use file_rotate::suffix::{AppendTimestamp, FileLimit};
use file_rotate::{ContentLimit, FileRotate};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::fmt::{self, MakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{Layer, Registry};

use crate::config::{LogSection, LoggingConfig};

const DEFAULT: &str = "default";
const MAX_SIZE_MB: u64 = 100;

/// Unknown names fall back to `info`.
fn level(name: &str) -> LevelFilter {
    name.trim().parse().unwrap_or(match name.trim() {
        "none" => LevelFilter::OFF,
        _ => LevelFilter::INFO,
    })
}

/// `prefix` itself or any path below it, but not `prefix_other`.
fn under(target: &str, prefix: &str) -> bool {
    target
        .strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
}

type Sink = Arc<Mutex<FileRotate<AppendTimestamp>>>;

fn open_sink(path: &Path, max_bytes: usize) -> io::Result<Sink> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let file = FileRotate::new(
        path,
        AppendTimestamp::default(FileLimit::Age(chrono::Duration::days(1))),
        ContentLimit::BytesSurpassed(max_bytes),
        Compression::None,
        #[cfg(unix)]
        None,
    );
    Ok(Arc::new(Mutex::new(file)))
}

fn log_path(file: &str, home: &Path) -> PathBuf {
    let file = Path::new(file);
    if file.is_absolute() {
        file.to_path_buf()
    } else {
        home.join(file)
    }
}

/// `None` when the section has no file or it cannot be opened. A broken log
/// file never stops the server.
fn sink_for(name: &str, section: &LogSection, home: &Path) -> Option<Sink> {
    if section.file.trim().is_empty() {
        return None;
    }
    let path = log_path(&section.file, home);
    let max_bytes = section.max_size_mb.unwrap_or(MAX_SIZE_MB) * 1024 * 1024;
    open_sink(&path, usize::try_from(max_bytes).unwrap_or(usize::MAX))
        .inspect_err(|e| eprintln!("log file for '{name}' unavailable at {}: {e}", path.display()))
        .ok()
}

/// One write handle per event; `None` swallows the bytes.
struct Output(Option<Sink>);

impl Write for Output {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &self.0 {
            Some(sink) => sink
                .lock()
                .map_err(|_| io::Error::other("log file lock poisoned"))?
                .write(buf),
            None => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &self.0 {
            Some(sink) => sink
                .lock()
                .map_err(|_| io::Error::other("log file lock poisoned"))?
                .flush(),
            None => Ok(()),
        }
    }
}

/// Picks the file for an event: the longest matching section prefix, else the
/// default file.
#[derive(Clone, Default)]
struct LogFiles {
    fallback: Option<Sink>,
    routes: Vec<(String, Sink)>,
}

impl LogFiles {
    fn open(cfg: &LoggingConfig, home: &Path) -> Self {
        let mut files = Self::default();
        for (name, section) in cfg {
            match sink_for(name, section, home) {
                Some(sink) if name == DEFAULT => files.fallback = Some(sink),
                Some(sink) => files.routes.push((name.clone(), sink)),
                None => {}
            }
        }
        files.routes.sort_by_key(|(prefix, _)| std::cmp::Reverse(prefix.len()));
        files
    }

    fn route(&self, target: &str) -> Option<Sink> {
        self.routes
            .iter()
            .find(|(prefix, _)| under(target, prefix))
            .map(|(_, sink)| sink.clone())
            .or_else(|| self.fallback.clone())
    }

    fn is_empty(&self) -> bool {
        self.fallback.is_none() && self.routes.is_empty()
    }
}

impl<'a> MakeWriter<'a> for LogFiles {
    type Writer = Output;

    fn make_writer(&'a self) -> Output {
        Output(self.fallback.clone())
    }

    fn make_writer_for(&'a self, meta: &tracing::Metadata<'_>) -> Output {
        Output(self.route(meta.target()))
    }
}

fn console_filter(cfg: &LoggingConfig) -> Targets {
    let fallback = cfg.get(DEFAULT).map_or(LevelFilter::OFF, |s| level(&s.console_level));
    cfg.iter()
        .filter(|(name, _)| *name != DEFAULT)
        .fold(Targets::new().with_default(fallback), |t, (name, s)| {
            t.with_target(name.as_str(), level(&s.console_level))
        })
}

/// A section without its own file writes into the default one, so it is
/// silenced only when there is no default file either.
fn file_filter(cfg: &LoggingConfig, has_default_file: bool) -> Targets {
    let fallback = match cfg.get(DEFAULT) {
        Some(s) if has_default_file => level(&s.file_level),
        _ => LevelFilter::OFF,
    };
    cfg.iter()
        .filter(|(name, _)| *name != DEFAULT)
        .fold(Targets::new().with_default(fallback), |t, (name, s)| {
            let lvl = if s.file.trim().is_empty() && !has_default_file {
                LevelFilter::OFF
            } else {
                level(&s.file_level)
            };
            t.with_target(name.as_str(), lvl)
        })
}

/// Install the global subscriber. Relative log paths are taken from `home`.
/// Later calls keep the first subscriber.
pub fn init(cfg: &LoggingConfig, home: &Path) {
    let _ = tracing_log::LogTracer::init();

    if cfg.is_empty() {
        let _ = fmt::fmt()
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .try_init();
        return;
    }

    let console = fmt::layer()
        .with_ansi(io::stdout().is_terminal())
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_filter(console_filter(cfg));

    let files = LogFiles::open(cfg, home);
    let file_layer = (!files.is_empty()).then(|| {
        let has_default_file = files.fallback.is_some();
        fmt::layer()
            .json()
            .with_ansi(false)
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .with_writer(files)
            .with_filter(file_filter(cfg, has_default_file))
    });

    let _ = Registry::default().with(console).with(file_layer).try_init();
}
