use anyhow::{Result, anyhow};
use crossbeam::channel::{Receiver, Sender, bounded};
use std::path::PathBuf;

use super::progress::ProgressRegistry;
use crate::compile::unit::compile_task;
use crate::compile::{CompileContext, CompileResult, CompileTask, IncludeFlags, ResultSet};

/// Everything a task needs, resolved once per run and shared read-only
struct RunContext<'a> {
    ctx: &'a CompileContext,
    flags: IncludeFlags,
    working_dir: PathBuf,
    progress: Option<&'a ProgressRegistry>,
}

impl<'a> RunContext<'a> {
    /// Resolving the working directory is the one failure that aborts the run
    fn prepare(ctx: &'a CompileContext, progress: Option<&'a ProgressRegistry>) -> Result<Self> {
        let working_dir = ctx.resolve_working_dir()?;
        let flags = IncludeFlags::resolve(&working_dir, &ctx.include_dirs, &ctx.imported_include_dirs);
        Ok(Self {
            ctx,
            flags,
            working_dir,
            progress,
        })
    }

    /// `index` is the header's position in the scheduled list, which keys its bar
    fn compile(&self, index: usize, header: &str) -> CompileResult {
        let task = CompileTask {
            header,
            context: self.ctx,
        };
        let bar = self.progress.and_then(|registry| registry.handle(index));
        compile_task(task, &self.flags, &self.working_dir, bar)
    }
}

/// One thread per header, no cap on simultaneous compilations
pub struct FanOutExecutor;

impl FanOutExecutor {
    pub fn execute(
        headers: &[String],
        ctx: &CompileContext,
        progress: Option<&ProgressRegistry>,
    ) -> Result<ResultSet> {
        if headers.is_empty() {
            return Ok(ResultSet::default());
        }
        let run = RunContext::prepare(ctx, progress)?;
        let (result_tx, result_rx): (Sender<CompileResult>, Receiver<CompileResult>) =
            bounded(headers.len());

        crossbeam::thread::scope(|s| {
            for (index, header) in headers.iter().enumerate() {
                let result_tx = result_tx.clone();
                let run = &run;
                s.spawn(move |_| {
                    // Receiver outlives every task, so send cannot fail
                    let _ = result_tx.send(run.compile(index, header));
                });
            }
            drop(result_tx);

            collect_results(result_rx, headers.len())
        })
        .map_err(|_| anyhow!("Thread panic occurred during fan-out compilation"))
    }
}

/// Fixed number of workers pulling headers from a shared queue
pub struct WorkerPoolExecutor {
    workers: usize,
}

impl WorkerPoolExecutor {
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn execute(
        &self,
        headers: &[String],
        ctx: &CompileContext,
        progress: Option<&ProgressRegistry>,
    ) -> Result<ResultSet> {
        if headers.is_empty() {
            return Ok(ResultSet::default());
        }
        let run = RunContext::prepare(ctx, progress)?;
        let total = headers.len();
        let actual_workers = std::cmp::min(self.workers, total);

        // Pre-load every job, then close the queue so workers stop once it drains
        let (work_tx, work_rx): (Sender<(usize, &str)>, Receiver<(usize, &str)>) = bounded(total);
        for (index, header) in headers.iter().enumerate() {
            work_tx
                .send((index, header.as_str()))
                .map_err(|_| anyhow!("Job queue closed before all headers were queued"))?;
        }
        drop(work_tx);

        let (result_tx, result_rx): (Sender<CompileResult>, Receiver<CompileResult>) =
            bounded(total);

        crossbeam::thread::scope(|s| {
            for worker_id in 0..actual_workers {
                let work_rx = work_rx.clone();
                let result_tx = result_tx.clone();
                let run = &run;
                s.spawn(move |_| {
                    while let Ok((index, header)) = work_rx.recv() {
                        tracing::trace!(worker_id, header, "worker picked up header");
                        if result_tx.send(run.compile(index, header)).is_err() {
                            break; // Receiver dropped
                        }
                    }
                });
            }
            drop(result_tx);

            collect_results(result_rx, total)
        })
        .map_err(|_| anyhow!("Thread panic occurred during worker-pool compilation"))
    }
}

/// Drain exactly `total` results in arrival order
fn collect_results(result_rx: Receiver<CompileResult>, total: usize) -> ResultSet {
    let mut results = ResultSet::with_capacity(total);
    while results.len() < total {
        match result_rx.recv() {
            Ok(result) => results.push(result),
            Err(_) => break, // Every sender gone
        }
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::FailureKind;

    fn headers(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("h{i}.h")).collect()
    }

    fn missing_compiler() -> CompileContext {
        CompileContext::new("headertest-absent-compiler-0b7c")
    }

    fn assert_complete(results: &ResultSet, expected: &[String]) {
        assert_eq!(results.len(), expected.len());
        let mut got: Vec<&str> = results.headers();
        got.sort_unstable();
        let mut want: Vec<&str> = expected.iter().map(String::as_str).collect();
        want.sort_unstable();
        assert_eq!(got, want);
    }

    #[test]
    fn test_fan_out_returns_one_result_per_header() {
        let hs = headers(12);
        let results = FanOutExecutor::execute(&hs, &missing_compiler(), None).unwrap();
        assert_complete(&results, &hs);
        assert!(results.iter().all(|r| r.kind() == Some(FailureKind::CompilerUnavailable)));
    }

    #[test]
    fn test_worker_pool_returns_one_result_per_header() {
        let hs = headers(17);
        for workers in [1, 3, 8, 64] {
            let results = WorkerPoolExecutor::new(workers)
                .execute(&hs, &missing_compiler(), None)
                .unwrap();
            assert_complete(&results, &hs);
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(FanOutExecutor::execute(&[], &missing_compiler(), None).unwrap().is_empty());
        assert!(
            WorkerPoolExecutor::new(4)
                .execute(&[], &missing_compiler(), None)
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn test_zero_workers_clamped_to_one() {
        assert_eq!(WorkerPoolExecutor::new(0).workers(), 1);
    }

    #[test]
    fn test_progress_bars_cleared_on_failure() {
        let hs = headers(3);
        let registry = ProgressRegistry::hidden(&hs);
        let results = WorkerPoolExecutor::new(2)
            .execute(&hs, &missing_compiler(), Some(&registry))
            .unwrap();
        assert_eq!(results.len(), 3);
        for index in 0..hs.len() {
            let bar = registry.handle(index).unwrap();
            assert!(bar.is_finished());
            assert_eq!(bar.position(), 0);
        }
    }
}
