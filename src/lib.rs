//! # headertest - standalone header compilation checks
//!
//! Every public header should compile on its own. headertest wraps each header in a
//! one-line translation unit (`#include "<header>"`), compiles it with the configured
//! compiler, and reports which headers depend on something they never include.
//!
//! ## Features
//!
//! - **Two schedulers**: unbounded fan-out or a bounded worker pool, same verdicts
//! - **Layered config**: embedded defaults, repo config file, `HEADERTEST_*` env, flags
//! - **Progress bars**: one bar per header while compilations run
//! - **Clean runs**: temporary sources and objects are removed whatever the outcome
//!
//! ## Quick Start
//!
//! ```bash
//! # Check every header in ./include with a pool of 8 workers
//! headertest check -I include --batch-size 8
//!
//! # See which headers would be checked
//! headertest list
//! ```
//!
//! ## Library use
//!
//! ```rust,no_run
//! use headertest::compile::{CompileContext, compile_one};
//!
//! let ctx = CompileContext::new("c++").with_include_dirs(vec!["include".into()]);
//! let result = compile_one("widget.hpp", &ctx)?;
//! println!("{}: {}", result.header, result.is_success());
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod cli;
pub mod compile;
pub mod config;
pub mod discovery;
pub mod parallel;

pub use cli::{Cli, Output};
pub use config::{HeaderTestConfig, Settings};

/// Result type alias for headertest operations
pub type Result<T> = anyhow::Result<T>;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const PKG_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
