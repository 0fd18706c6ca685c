use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Formatted include flags for one engine run.
///
/// Own and imported directories stay in separate lists so the command line keeps
/// them apart: own directories first, imported directories after.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncludeFlags {
    pub own: Vec<String>,
    pub imported: Vec<String>,
}

impl IncludeFlags {
    /// Resolve both include-directory sets against `working_dir`.
    pub fn resolve(
        working_dir: &Path,
        include_dirs: &[String],
        imported_include_dirs: &[String],
    ) -> Self {
        Self {
            own: include_flags_in(working_dir, include_dirs),
            imported: include_flags_in(working_dir, imported_include_dirs),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.own.iter().chain(self.imported.iter())
    }
}

/// Format include directories as absolute `-I` flags anchored at the process
/// working directory.
///
/// Failing to read the working directory is fatal for the whole run: no header
/// could be given correct flags.
pub fn format_include_flags(include_dirs: &[String]) -> Result<Vec<String>> {
    let cwd = current_dir()?;
    Ok(include_flags_in(&cwd, include_dirs))
}

/// Resolve the process working directory.
pub fn current_dir() -> Result<PathBuf> {
    std::env::current_dir().context("Failed to determine the current working directory")
}

/// Format include directories as `-I` flags anchored at `base`.
pub fn include_flags_in(base: &Path, include_dirs: &[String]) -> Vec<String> {
    include_dirs
        .iter()
        .map(|dir| format!("-I{}", base.join(dir).display()))
        .collect()
}
