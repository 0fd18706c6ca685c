use serde::Serialize;
use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Shared, read-only compilation context for one engine run
#[derive(Debug, Clone, Default)]
pub struct CompileContext {
    /// Compiler executable name or path
    pub compiler: String,
    /// Include directories belonging to the header set under test
    pub include_dirs: Vec<String>,
    /// Include directories pulled in from dependencies
    pub imported_include_dirs: Vec<String>,
    /// Extra arguments appended after the include flags
    pub compiler_args: Vec<String>,
    /// Anchor for include flags and the compiler's working directory (None = process cwd)
    pub working_dir: Option<PathBuf>,
    /// Per-header deadline for the compiler subprocess (None = wait indefinitely)
    pub timeout: Option<Duration>,
}

impl CompileContext {
    pub fn new(compiler: impl Into<String>) -> Self {
        Self {
            compiler: compiler.into(),
            ..Default::default()
        }
    }

    pub fn with_include_dirs(mut self, dirs: Vec<String>) -> Self {
        self.include_dirs = dirs;
        self
    }

    pub fn with_imported_include_dirs(mut self, dirs: Vec<String>) -> Self {
        self.imported_include_dirs = dirs;
        self
    }

    pub fn with_compiler_args(mut self, args: Vec<String>) -> Self {
        self.compiler_args = args;
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Resolve the directory compilations run in, falling back to the process cwd.
    pub fn resolve_working_dir(&self) -> anyhow::Result<PathBuf> {
        match &self.working_dir {
            Some(dir) if dir.is_absolute() => Ok(dir.clone()),
            Some(dir) => Ok(super::include::current_dir()?.join(dir)),
            None => super::include::current_dir(),
        }
    }
}

/// One header paired with the context it is compiled under
#[derive(Debug, Clone, Copy)]
pub struct CompileTask<'a> {
    pub header: &'a str,
    pub context: &'a CompileContext,
}

/// Failure category of a single header compilation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureKind {
    CompilerUnavailable,
    TranslationUnit,
    LaunchFailed,
    CompilationFailed,
    TimedOut,
    ArtifactCleanupFailed,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FailureKind::CompilerUnavailable => "compiler-unavailable",
            FailureKind::TranslationUnit => "translation-unit",
            FailureKind::LaunchFailed => "launch-failed",
            FailureKind::CompilationFailed => "compilation-failed",
            FailureKind::TimedOut => "timed-out",
            FailureKind::ArtifactCleanupFailed => "artifact-cleanup-failed",
        };
        f.write_str(name)
    }
}

/// Why a header did not pass
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("compiler `{0}` is not available")]
    CompilerUnavailable(String),

    #[error("failed to create translation unit: {0}")]
    TranslationUnit(#[source] io::Error),

    #[error("failed to run compiler: {0}")]
    Launch(#[source] io::Error),

    #[error("compilation failed: {status}\nOutput: {output}")]
    CompilationFailed { status: String, output: String },

    #[error("compilation timed out after {}s\nOutput: {output}", .limit.as_secs_f64())]
    TimedOut { limit: Duration, output: String },

    #[error("failed to delete object file {}: {source}", .path.display())]
    ArtifactCleanup {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl CompileError {
    pub fn kind(&self) -> FailureKind {
        match self {
            CompileError::CompilerUnavailable(_) => FailureKind::CompilerUnavailable,
            CompileError::TranslationUnit(_) => FailureKind::TranslationUnit,
            CompileError::Launch(_) => FailureKind::LaunchFailed,
            CompileError::CompilationFailed { .. } => FailureKind::CompilationFailed,
            CompileError::TimedOut { .. } => FailureKind::TimedOut,
            CompileError::ArtifactCleanup { .. } => FailureKind::ArtifactCleanupFailed,
        }
    }

    /// Captured compiler output, if the compiler got far enough to produce any
    pub fn diagnostics(&self) -> Option<&str> {
        match self {
            CompileError::CompilationFailed { output, .. } | CompileError::TimedOut { output, .. } => {
                Some(output.as_str())
            }
            _ => None,
        }
    }
}

/// Outcome for one header; created once by the task that compiled it
#[derive(Debug)]
pub struct CompileResult {
    pub header: String,
    pub failure: Option<CompileError>,
}

impl CompileResult {
    pub fn success(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            failure: None,
        }
    }

    pub fn failed(header: impl Into<String>, error: CompileError) -> Self {
        Self {
            header: header.into(),
            failure: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    pub fn kind(&self) -> Option<FailureKind> {
        self.failure.as_ref().map(CompileError::kind)
    }
}

/// All results of one engine run, in arrival order
#[derive(Debug, Default)]
pub struct ResultSet {
    results: Vec<CompileResult>,
}

impl ResultSet {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            results: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, result: CompileResult) {
        self.results.push(result);
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CompileResult> {
        self.results.iter()
    }

    pub fn passed(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.len() - self.passed()
    }

    pub fn headers(&self) -> Vec<&str> {
        self.results.iter().map(|r| r.header.as_str()).collect()
    }

    /// Pass/fail verdict per header, independent of arrival order
    pub fn verdicts(&self) -> BTreeMap<String, Option<FailureKind>> {
        self.results
            .iter()
            .map(|r| (r.header.clone(), r.kind()))
            .collect()
    }

    pub fn get(&self, header: &str) -> Option<&CompileResult> {
        self.results.iter().find(|r| r.header == header)
    }

    /// Results ordered by header, for stable presentation
    pub fn into_sorted(mut self) -> Vec<CompileResult> {
        self.results.sort_by(|a, b| a.header.cmp(&b.header));
        self.results
    }
}

impl IntoIterator for ResultSet {
    type Item = CompileResult;
    type IntoIter = std::vec::IntoIter<CompileResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a CompileResult;
    type IntoIter = std::slice::Iter<'a, CompileResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}

impl FromIterator<CompileResult> for ResultSet {
    fn from_iter<I: IntoIterator<Item = CompileResult>>(iter: I) -> Self {
        Self {
            results: iter.into_iter().collect(),
        }
    }
}
