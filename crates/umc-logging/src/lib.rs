use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing_appender::rolling;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level filter (trace, debug, info, warn, error). `RUST_LOG` in
    /// the environment takes precedence.
    #[serde(default = "default_level")]
    pub level: String,

    /// Directory for rolling log files. If None, console only.
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// Log rotation for file output: "daily" or "never".
    #[serde(default = "default_rotation")]
    pub rotation: String,

    /// Whether to also log to stdout.
    #[serde(default = "default_true")]
    pub console: bool,
}

fn default_level() -> String {
    "info".into()
}

fn default_rotation() -> String {
    "daily".into()
}

fn default_true() -> bool {
    true
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            level: default_level(),
            log_dir: None,
            rotation: default_rotation(),
            console: true,
        }
    }
}

/// Initializes the logging system. Call once at startup; the returned
/// guard must stay alive for the life of the process so the non-blocking
/// file writer can flush.
pub fn init(config: &LogConfig) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let console_layer: Option<Box<dyn tracing_subscriber::Layer<_> + Send + Sync>> =
        if config.console {
            Some(Box::new(fmt::layer()))
        } else {
            None
        };

    let (file_layer, guard): (
        Option<Box<dyn tracing_subscriber::Layer<_> + Send + Sync>>,
        Option<tracing_appender::non_blocking::WorkerGuard>,
    ) = if let Some(ref log_dir) = config.log_dir {
        let rotation = match config.rotation.as_str() {
            "never" => rolling::Rotation::NEVER,
            _ => rolling::Rotation::DAILY,
        };

        let file_appender = rolling::RollingFileAppender::builder()
            .rotation(rotation)
            .filename_prefix("umc")
            .filename_suffix("log")
            .build(log_dir)
            .expect("failed to create rolling file appender");

        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        (
            Some(Box::new(fmt::layer().with_writer(non_blocking))),
            Some(guard),
        )
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    guard
}
