// src/config/mod.rs

//! Configuration loading and validation for taskdag.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk or a string (`loader.rs`).
//! - Validate basic invariants like a non-zero parallelism limit (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, parse_str};
pub use model::{ConfigFile, LoggingSection, RawConfigFile, SchedulerSection};
