//! Tracing subscriber setup.
//!
//! Library code only emits `tracing` events; binaries and tests that want
//! them printed call `init_tracing` once at startup.

use crate::config_utils;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "upload_records=info";
const LOG_FILE_PREFIX: &str = "upload-records.log";

/// Where log lines go
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LogOutput {
    #[default]
    Stderr,
    /// Daily-rolling file in `config_utils::get_logs_dir()`
    DefaultFile,
    /// Daily-rolling file in the given directory
    File(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Used when `RUST_LOG` is not set
    pub default_filter: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
    pub output: LogOutput,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            default_filter: DEFAULT_FILTER.to_string(),
            json: false,
            output: LogOutput::Stderr,
        }
    }
}

/// Install the global subscriber.
///
/// Returns the appender guard when logging to a file; keep it alive for as
/// long as logs should be flushed. Calling this more than once is harmless:
/// later calls leave the first subscriber in place.
pub fn init_tracing(config: &LogConfig) -> Result<Option<WorkerGuard>, String> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.default_filter))
        .map_err(|e| format!("Invalid log filter: {}", e))?;

    let file_dir = match &config.output {
        LogOutput::Stderr => None,
        LogOutput::DefaultFile => Some(config_utils::get_logs_dir()?),
        LogOutput::File(dir) => Some(dir.clone()),
    };

    let (writer, guard) = match file_dir {
        None => (BoxMakeWriter::new(std::io::stderr), None),
        Some(dir) => {
            std::fs::create_dir_all(&dir)
                .map_err(|e| format!("Failed to create logs directory: {}", e))?;
            let appender = tracing_appender::rolling::daily(&dir, LOG_FILE_PREFIX);
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            (BoxMakeWriter::new(non_blocking), Some(guard))
        }
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer);

    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    if installed.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }

    Ok(guard)
}
