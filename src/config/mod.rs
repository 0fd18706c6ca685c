//! Configuration management for headertest
//!
//! Settings are layered with figment, lowest priority first:
//!
//! 1. Embedded `default-config.toml`
//! 2. Repository config: `headertest.toml`, `headertest.json`, `headertest.yaml`/`.yml`,
//!    or the legacy `config.json` (or only the file given with `--config`)
//! 3. `HEADERTEST_*` environment variables (`HEADERTEST_BATCH_SIZE=4` sets `batchSize`)
//! 4. Command-line flags
//!
//! Keys are camelCase, matching the `config.json` format of earlier releases.

pub mod core;
pub mod overrides;
pub mod smart_load;

pub use core::HeaderTestConfig;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::compile::CompileContext;
use crate::parallel::ExecutionStrategy;

/// Typed view of the merged configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub compiler: String,
    #[serde(default)]
    pub include_dirs: Vec<String>,
    #[serde(default)]
    pub imported_include_dirs: Vec<String>,
    #[serde(default)]
    pub compiler_args: Vec<String>,
    #[serde(default)]
    pub batch_size: BatchSize,
    #[serde(default)]
    pub timeout_secs: u64,
    #[serde(default)]
    pub extensions: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
    #[serde(default)]
    pub recursive: bool,
    /// None = show progress bars only on a terminal
    #[serde(default)]
    pub progress: Option<bool>,
}

impl Settings {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    pub fn strategy(&self) -> ExecutionStrategy {
        match self.batch_size {
            BatchSize::Auto => ExecutionStrategy::WorkerPool {
                workers: ExecutionStrategy::available_workers(),
            },
            BatchSize::Fixed(n) => ExecutionStrategy::from_batch_size(n),
        }
    }

    pub fn compile_context(&self) -> CompileContext {
        CompileContext::new(self.compiler.clone())
            .with_include_dirs(self.include_dirs.clone())
            .with_imported_include_dirs(self.imported_include_dirs.clone())
            .with_compiler_args(self.compiler_args.clone())
            .with_timeout(self.timeout())
    }
}

/// Concurrency limit: a fixed worker count (0 = unbounded fan-out) or one per CPU
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BatchSizeRepr", into = "BatchSizeRepr")]
pub enum BatchSize {
    Auto,
    Fixed(usize),
}

impl Default for BatchSize {
    fn default() -> Self {
        BatchSize::Fixed(0)
    }
}

impl fmt::Display for BatchSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchSize::Auto => f.write_str("auto"),
            BatchSize::Fixed(n) => write!(f, "{n}"),
        }
    }
}

impl FromStr for BatchSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("auto") {
            return Ok(BatchSize::Auto);
        }
        s.parse::<usize>()
            .map(BatchSize::Fixed)
            .map_err(|_| format!("invalid batch size '{s}': expected a number or 'auto'"))
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum BatchSizeRepr {
    Count(usize),
    Keyword(String),
}

impl TryFrom<BatchSizeRepr> for BatchSize {
    type Error = String;

    fn try_from(repr: BatchSizeRepr) -> Result<Self, Self::Error> {
        match repr {
            BatchSizeRepr::Count(n) => Ok(BatchSize::Fixed(n)),
            BatchSizeRepr::Keyword(word) => word.parse(),
        }
    }
}

impl From<BatchSize> for BatchSizeRepr {
    fn from(size: BatchSize) -> Self {
        match size {
            BatchSize::Auto => BatchSizeRepr::Keyword("auto".to_string()),
            BatchSize::Fixed(n) => BatchSizeRepr::Count(n),
        }
    }
}
