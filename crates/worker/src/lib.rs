//! Worker process: configuration, engine wiring and the worker pool that
//! drains the task queue.

pub mod config;
pub mod pool;
pub mod runtime;
