//! Logging setup for applications embedding kiln.
//!
//! Only available with the `logging` feature. Library code in kiln emits
//! `tracing` events and never installs a subscriber itself.

use std::sync::Once;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

static INIT: Once = Once::new();

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    Silent,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
}

impl LogLevel {
    fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Silent => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "silent" | "off" => Ok(LogLevel::Silent),
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            other => Err(format!("Invalid log level: {}", other)),
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_filter())
    }
}

/// Install a compact subscriber at `level`. `RUST_LOG` directives still
/// apply on top. Only the first call in a process takes effect.
pub fn init_logging(level: LogLevel) {
    INIT.call_once(|| {
        let filter = EnvFilter::builder()
            .with_default_directive(level_directive(level))
            .from_env_lossy();
        install(filter);
    });
}

/// Install a subscriber configured from `RUST_LOG`, defaulting to info.
pub fn init_logging_from_env() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::builder()
                .with_default_directive(level_directive(LogLevel::Info))
                .from_env_lossy()
        });
        install(filter);
    });
}

fn level_directive(level: LogLevel) -> tracing_subscriber::filter::Directive {
    match level {
        LogLevel::Silent => tracing_subscriber::filter::LevelFilter::OFF.into(),
        LogLevel::Error => tracing_subscriber::filter::LevelFilter::ERROR.into(),
        LogLevel::Warn => tracing_subscriber::filter::LevelFilter::WARN.into(),
        LogLevel::Info => tracing_subscriber::filter::LevelFilter::INFO.into(),
        LogLevel::Debug => tracing_subscriber::filter::LevelFilter::DEBUG.into(),
    }
}

fn install(filter: EnvFilter) {
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_target(false).without_time())
        .try_init();
}
