// src/config/model.rs

use serde::Deserialize;

use crate::types::{DEFAULT_PRIORITY, LogLevel, Priority, StallPolicy};

/// Configuration exactly as read from a TOML file, before validation.
///
/// ```toml
/// [scheduler]
/// max_parallel_tasks = 4
/// stall_policy = "cancel_blocked"
/// default_priority = 1
///
/// [logging]
/// level = "debug"
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub scheduler: SchedulerSection,

    #[serde(default)]
    pub logging: LoggingSection,
}

/// `[scheduler]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerSection {
    /// Upper bound on concurrently running task bodies. Must be >= 1.
    #[serde(default = "default_max_parallel_tasks")]
    pub max_parallel_tasks: usize,

    /// What to do when pending tasks can never become ready.
    #[serde(default)]
    pub stall_policy: StallPolicy,

    /// Priority used by `TaskOptions::from_config`.
    #[serde(default = "default_priority")]
    pub default_priority: Priority,
}

pub(crate) fn default_max_parallel_tasks() -> usize {
    2
}

fn default_priority() -> Priority {
    DEFAULT_PRIORITY
}

impl Default for SchedulerSection {
    fn default() -> Self {
        Self {
            max_parallel_tasks: default_max_parallel_tasks(),
            stall_policy: StallPolicy::default(),
            default_priority: default_priority(),
        }
    }
}

/// `[logging]` section.
///
/// If `level` is absent, `TASKDAG_LOG` or `info` is used.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingSection {
    #[serde(default)]
    pub level: Option<LogLevel>,
}

/// Validated configuration.
///
/// Only obtainable through `ConfigFile::try_from(RawConfigFile)` (or the
/// loader helpers), so holders can rely on the invariants checked in
/// `config::validate`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    scheduler: SchedulerSection,
    logging: LoggingSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(scheduler: SchedulerSection, logging: LoggingSection) -> Self {
        Self { scheduler, logging }
    }

    pub fn scheduler(&self) -> &SchedulerSection {
        &self.scheduler
    }

    pub fn logging(&self) -> &LoggingSection {
        &self.logging
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self::new_unchecked(SchedulerSection::default(), LoggingSection::default())
    }
}
