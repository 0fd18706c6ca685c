//! Standalone header compilation
//!
//! This module compiles one header at a time as its own translation unit. It owns
//! everything a single compilation needs:
//!
//! - **Compiler probe**: resolves the compiler on `PATH` before any artifact is created
//! - **Include flags**: turns relative include directories into absolute `-I` flags
//! - **Translation unit**: a temporary `.cpp` file holding one `#include` line
//! - **Subprocess**: runs `<compiler> -c <tu> <include flags...> <extra args...>` and keeps
//!   the combined output verbatim
//! - **Artifacts**: removes the temporary source and the emitted object file on every path
//!
//! Scheduling many headers at once lives in [`crate::parallel`].
//!
//! # Example
//!
//! ```rust,no_run
//! use headertest::compile::{compile_one, CompileContext};
//!
//! let ctx = CompileContext::new("g++")
//!     .with_include_dirs(vec!["include".into()])
//!     .with_compiler_args(vec!["-std=c++17".into()]);
//!
//! let result = compile_one("widget.hpp", &ctx)?;
//! if let Some(err) = &result.failure {
//!     eprintln!("{}: {}", result.header, err);
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod include;
pub mod probe;
pub mod process;
pub mod types;
pub mod unit;

pub use include::{IncludeFlags, format_include_flags};
pub use probe::is_compiler_available;
pub use types::{CompileContext, CompileError, CompileResult, CompileTask, FailureKind, ResultSet};
pub use unit::{compile_one, object_path_for};
