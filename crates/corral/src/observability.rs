//! Log subscriber for the corral binary. libcorral only emits `tracing`
//! events; this decides where they go and how they look.
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::prelude::*;

// Debug builds show every engine call the library makes.
#[cfg(debug_assertions)]
const DEFAULT_LEVEL: Level = Level::DEBUG;
#[cfg(not(debug_assertions))]
const DEFAULT_LEVEL: Level = Level::WARN;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => bail!("unknown log format {other:?}, expected text or json"),
        }
    }
}

/// Logging switches taken from the global command line options.
#[derive(Debug, Default)]
pub struct ObservabilityConfig {
    pub debug: bool,
    pub level: Option<String>,
    pub file: Option<PathBuf>,
    pub format: Option<String>,
}

impl From<&crate::Opts> for ObservabilityConfig {
    fn from(opts: &crate::Opts) -> Self {
        Self {
            debug: opts.global.debug,
            level: opts.global.log_level.clone(),
            file: opts.global.log.clone(),
            format: opts.global.log_format.clone(),
        }
    }
}

impl ObservabilityConfig {
    /// `--log-level` beats `--debug`.
    fn level(&self) -> Result<Level> {
        match (&self.level, self.debug) {
            (Some(level), _) => {
                Level::from_str(level).with_context(|| format!("invalid log level {level:?}"))
            }
            (None, true) => Ok(Level::DEBUG),
            (None, false) => Ok(DEFAULT_LEVEL),
        }
    }

    fn format(&self) -> Result<LogFormat> {
        self.format
            .as_deref()
            .map_or(Ok(LogFormat::default()), LogFormat::from_str)
    }

    /// Stderr, or the log file opened for appending.
    fn writer(&self) -> Result<BoxMakeWriter> {
        let Some(path) = &self.file else {
            return Ok(BoxMakeWriter::new(std::io::stderr));
        };
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("failed to open log file {path:?}"))?;
        Ok(BoxMakeWriter::new(Arc::new(file)))
    }
}

/// Installs the global subscriber. Fails if one is already installed.
pub fn init<T>(config: T) -> Result<()>
where
    T: Into<ObservabilityConfig>,
{
    let config = config.into();
    let level = config.level()?;
    let format = config.format()?;
    let writer = config.writer()?;
    let ansi = config.file.is_none();

    let (text, json) = match format {
        LogFormat::Text => (
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(ansi)
                    .with_writer(writer),
            ),
            None,
        ),
        LogFormat::Json => (
            None,
            Some(
                tracing_subscriber::fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_span_list(false)
                    .with_writer(writer),
            ),
        ),
    };

    tracing_subscriber::registry()
        .with(LevelFilter::from_level(level))
        .with(text)
        .with(json)
        .try_init()
        .map_err(|err| anyhow!("failed to install log subscriber: {err}"))
}
