// src/exec/mod.rs

//! Task execution layer.
//!
//! This module runs the caller-supplied task bodies on the Tokio runtime and
//! reports back to the run loop via `SchedulerEvent`s.
//!
//! - [`work`] defines the opaque [`TaskWork`] type callers register.
//! - [`task_runner`] runs one task body, enforcing its timeout.
//! - [`backend`] provides the `ExecutorBackend` trait and the
//!   `TokioExecutor` the scheduler uses in production, and which tests can
//!   replace with a fake implementation.

pub mod backend;
pub mod task_runner;
pub mod work;

pub use backend::{ExecutorBackend, TokioExecutor};
pub use work::{TaskWork, WorkFuture};
