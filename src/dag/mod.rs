// src/dag/mod.rs

//! Task registry and dependency graph.
//!
//! - [`graph`] keeps the reverse dependency index and graph validation.
//! - [`registry`] owns task records and every state transition.
//! - [`task_info`] provides task records, options and dispatch types.

pub mod graph;
pub mod registry;
pub mod task_info;

pub use graph::DependencyIndex;
pub use registry::Registry;
pub use task_info::{PendingSignal, ScheduledTask, TaskOptions, TaskRecord};
