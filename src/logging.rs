// src/logging.rs

//! Subscriber setup for programs embedding taskdag.
//!
//! The library only emits `tracing` events (task ids and statuses as
//! structured fields). [`init_logging`] installs a stderr `fmt` subscriber
//! whose filter is chosen as follows:
//! 1. an explicit level, usually `[logging].level` from the config file;
//! 2. the `TASKDAG_LOG` environment variable, which accepts full
//!    `EnvFilter` directives such as `warn,taskdag::engine=debug`;
//! 3. `info`.

use anyhow::{Result, anyhow};
use tracing::Level;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::ConfigFile;
use crate::types::LogLevel;

/// Environment variable consulted when no explicit level is given.
pub const LOG_ENV_VAR: &str = "TASKDAG_LOG";

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(level: Option<LogLevel>) -> Result<()> {
    let filter = build_filter(level);

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("installing tracing subscriber: {e}"))
}

/// Shorthand for [`init_logging`] with the level from a loaded config.
pub fn init_from_config(cfg: &ConfigFile) -> Result<()> {
    init_logging(cfg.logging().level)
}

/// Single effective level for an optional explicit choice.
///
/// Directive strings in `TASKDAG_LOG` that are not a bare level name fall
/// back to `info` here; [`init_logging`] still honours them in full.
pub fn resolve_level(level: Option<LogLevel>) -> Level {
    match level {
        Some(lvl) => lvl.into(),
        None => std::env::var(LOG_ENV_VAR)
            .ok()
            .and_then(|s| s.trim().parse::<Level>().ok())
            .unwrap_or(Level::INFO),
    }
}

fn build_filter(level: Option<LogLevel>) -> EnvFilter {
    if let Some(lvl) = level {
        let max = LevelFilter::from_level(lvl.into());
        return EnvFilter::default().add_directive(max.into());
    }

    EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("info"))
}

impl From<LogLevel> for Level {
    fn from(lvl: LogLevel) -> Self {
        match lvl {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}
