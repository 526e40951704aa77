// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

use crate::types::TaskId;

#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Task {task} depends on unknown task {dependency}")]
    UnknownDependency { task: TaskId, dependency: TaskId },

    #[error("Cycle detected in dependency graph: {0}")]
    DependencyCycle(String),

    #[error("execute_tasks is already running for this scheduler")]
    AlreadyExecuting,

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, SchedulerError>;
