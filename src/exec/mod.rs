// src/exec/mod.rs

//! Execution layer: the consumers that actually "do" the tasks.
//!
//! - [`driver`] holds [`RunSchedule`], the sequential random-order driver
//!   that works with any [`Schedule`](crate::dag::Schedule).
//! - [`backend`] provides the `ExecutorBackend` trait used by the
//!   concurrent coordinator, and [`SimulatedExecutorBackend`].

pub mod backend;
pub mod driver;

pub use backend::{ExecutorBackend, SimulatedExecutorBackend};
pub use driver::RunSchedule;
