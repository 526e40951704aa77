// src/lib.rs

//! Bounded-concurrency task scheduler with priorities, dependencies,
//! timeouts and cascading cancellation.
//!
//! The crate is organised as:
//! - [`dag`]: the task registry and dependency index
//! - [`engine`]: the run loop (pure core + async shell)
//! - [`exec`]: how task bodies are executed
//! - [`config`] / [`logging`]: ambient setup
//!
//! Most callers only need [`Scheduler`] and [`TaskOptions`].

pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod scheduler;
pub mod types;

pub use dag::TaskOptions;
pub use errors::{Result, SchedulerError};
pub use exec::TaskWork;
pub use scheduler::Scheduler;
pub use tokio_util::sync::CancellationToken;
pub use types::{Priority, StallPolicy, TaskId, TaskStatus};
