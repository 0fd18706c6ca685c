//! Concurrent header compilation
//!
//! The parallel module decides **how many** compilations run at once; what a single
//! compilation does lives in [`crate::compile`].
//!
//! # Strategies
//!
//! - **Fan-out**: one thread per header, no cap. Lowest latency for small header sets,
//!   but N headers means N simultaneous compiler processes.
//! - **Worker pool**: W long-lived workers pull headers from a pre-loaded, closed
//!   queue. At most W compiler processes run at any moment, whatever N is.
//!
//! Both publish results over a channel bounded to N and return exactly one result per
//! header, in arrival order. Include flags and the working directory are resolved once
//! before any thread starts; failing to resolve them aborts the run with `Err`.
//!
//! ```text
//!   headers ──▶ [job queue (N, closed)] ──▶ worker 1..W ──▶ [results (N)] ──▶ ResultSet
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use headertest::compile::CompileContext;
//! use headertest::parallel::ExecutionStrategy;
//!
//! let ctx = CompileContext::new("clang++").with_include_dirs(vec!["include".into()]);
//! let headers = vec!["a.hpp".to_string(), "b.hpp".to_string()];
//!
//! // 0 selects fan-out, anything else a pool of that size
//! let strategy = ExecutionStrategy::from_batch_size(4);
//! let results = strategy.execute(&headers, &ctx, None)?;
//! assert_eq!(results.len(), headers.len());
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod core;
pub mod progress;

pub use core::{FanOutExecutor, WorkerPoolExecutor};
pub use progress::ProgressRegistry;

use anyhow::Result;

use crate::compile::{CompileContext, ResultSet};

/// Execution strategy enum for choosing between fan-out and a bounded pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStrategy {
    FanOut,
    WorkerPool { workers: usize },
}

impl ExecutionStrategy {
    pub fn execute(
        &self,
        headers: &[String],
        ctx: &CompileContext,
        progress: Option<&ProgressRegistry>,
    ) -> Result<ResultSet> {
        match self {
            ExecutionStrategy::FanOut => FanOutExecutor::execute(headers, ctx, progress),
            ExecutionStrategy::WorkerPool { workers } => {
                WorkerPoolExecutor::new(*workers).execute(headers, ctx, progress)
            }
        }
    }

    /// Threshold decision made before the engine runs: a batch size of 0 means
    /// unbounded fan-out, any other value a worker pool of that size.
    pub fn from_batch_size(batch_size: usize) -> Self {
        if batch_size == 0 {
            ExecutionStrategy::FanOut
        } else {
            ExecutionStrategy::WorkerPool {
                workers: batch_size,
            }
        }
    }

    /// Worker count matching the machine's logical CPUs
    pub fn available_workers() -> usize {
        std::cmp::max(1, num_cpus::get())
    }

    pub fn describe(&self) -> String {
        match self {
            ExecutionStrategy::FanOut => "fan-out".to_string(),
            ExecutionStrategy::WorkerPool { workers } => format!("worker pool ({workers} workers)"),
        }
    }
}

/// Compile every header on its own thread
pub fn compile_fanout(headers: &[String], ctx: &CompileContext) -> Result<ResultSet> {
    FanOutExecutor::execute(headers, ctx, None)
}

/// Compile headers with at most `workers` compilations in flight
pub fn compile_workerpool(
    headers: &[String],
    ctx: &CompileContext,
    workers: usize,
) -> Result<ResultSet> {
    WorkerPoolExecutor::new(workers).execute(headers, ctx, None)
}

/// [`compile_fanout`] with one progress bar per header
pub fn compile_fanout_with_progress(
    headers: &[String],
    ctx: &CompileContext,
    progress: &ProgressRegistry,
) -> Result<ResultSet> {
    FanOutExecutor::execute(headers, ctx, Some(progress))
}

/// [`compile_workerpool`] with one progress bar per header
pub fn compile_workerpool_with_progress(
    headers: &[String],
    ctx: &CompileContext,
    workers: usize,
    progress: &ProgressRegistry,
) -> Result<ResultSet> {
    WorkerPoolExecutor::new(workers).execute(headers, ctx, Some(progress))
}
