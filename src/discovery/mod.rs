//! Header discovery
//!
//! Finds candidate headers inside the configured include directories. Headers are
//! reported relative to the directory they were found in, so the generated
//! `#include "<name>"` resolves through that directory's `-I` flag.

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use std::collections::HashSet;
use std::path::Path;

/// Extensions treated as headers when none are configured
pub const DEFAULT_EXTENSIONS: &[&str] = &["h", "hpp", "hxx", "hh"];

/// Walks include directories and collects header names
#[derive(Debug, Clone)]
pub struct HeaderDiscovery {
    extensions: Vec<String>,
    exclude: GlobSet,
    recursive: bool,
}

impl Default for HeaderDiscovery {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_EXTENSIONS.iter().map(|ext| ext.to_string()).collect(),
            exclude: GlobSet::empty(),
            recursive: false,
        }
    }
}

impl HeaderDiscovery {
    pub fn new(extensions: &[String], exclude: &[String], recursive: bool) -> Result<Self> {
        let extensions = if extensions.is_empty() {
            DEFAULT_EXTENSIONS.iter().map(|ext| ext.to_string()).collect()
        } else {
            extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
                .collect()
        };

        let mut builder = GlobSetBuilder::new();
        for pattern in exclude {
            let glob = Glob::new(pattern)
                .with_context(|| format!("Invalid exclude pattern: {pattern}"))?;
            builder.add(glob);
        }

        Ok(Self {
            extensions,
            exclude: builder.build()?,
            recursive,
        })
    }

    /// Headers directly inside `dir` (or below it when recursive), sorted, with
    /// `/` separators. A directory that cannot be read yields no headers.
    pub fn discover(&self, dir: &Path) -> Vec<String> {
        if !dir.is_dir() {
            tracing::warn!("Include directory not found: {}", dir.display());
            return Vec::new();
        }

        let walker = WalkBuilder::new(dir)
            .max_depth(if self.recursive { None } else { Some(1) })
            .sort_by_file_name(|a, b| a.cmp(b))
            .build();

        let mut headers = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Failed to read entry under {}: {e}", dir.display());
                    continue;
                }
            };
            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(dir) else {
                continue;
            };
            if !self.is_header(relative) || self.exclude.is_match(relative) {
                continue;
            }
            headers.push(to_include_name(relative));
        }

        headers.sort();
        headers
    }

    /// Discover headers across several directories, dropping duplicates while
    /// keeping first-seen order.
    pub fn discover_all(&self, dirs: &[String]) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut headers = Vec::new();
        for dir in dirs {
            for header in self.discover(Path::new(dir)) {
                if seen.insert(header.clone()) {
                    headers.push(header);
                }
            }
        }
        headers
    }

    fn is_header(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .is_some_and(|ext| self.extensions.iter().any(|known| *known == ext))
    }
}

fn to_include_name(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
