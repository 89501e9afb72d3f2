//! Benchmarking suite.
//!
//! [`BenchmarkSuite::run_comparison`] runs each method on each problem
//! several times with independent derived seeds, then aggregates the runs
//! of every (method, problem) pair into a [`BenchmarkRow`]. Runs never
//! share mutable state; with the `parallel` feature they execute on the
//! rayon pool. A run that errors is recorded as a [`FailedCell`] and the
//! sweep continues.

mod report;
mod suite;

pub use report::{BenchmarkReport, BenchmarkRow, FailedCell};
pub use suite::{BenchmarkConfig, BenchmarkSuite};
