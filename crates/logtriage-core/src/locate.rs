//! Execution log discovery.

use crate::error::{Result, TriageError};
use globset::{Glob, GlobMatcher};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File name pattern of the runner's execution log.
pub const EXECUTION_LOG_GLOB: &str = "Execution-*.log";

/// Strategy resolving the one execution log a run reads.
pub trait LogLocator {
    fn locate(&self) -> Result<PathBuf>;
}

/// A log path given explicitly on the command line.
#[derive(Debug, Clone)]
pub struct ExplicitPath(pub PathBuf);

impl LogLocator for ExplicitPath {
    fn locate(&self) -> Result<PathBuf> {
        if self.0.is_file() {
            Ok(self.0.clone())
        } else {
            Err(TriageError::LogNotFound {
                searched: self.0.display().to_string(),
            })
        }
    }
}

/// Finds the log by matching file names in one directory.
///
/// When several files match, the lexicographically smallest path wins so the
/// choice does not depend on directory iteration order.
#[derive(Debug, Clone)]
pub struct GlobLocator {
    dir: PathBuf,
    pattern: String,
    matcher: GlobMatcher,
}

impl GlobLocator {
    pub fn new(dir: impl Into<PathBuf>, pattern: &str) -> Result<Self> {
        let matcher = Glob::new(pattern)
            .map_err(|e| TriageError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })?
            .compile_matcher();

        Ok(Self {
            dir: dir.into(),
            pattern: pattern.to_string(),
            matcher,
        })
    }

    /// Searches for `Execution-*.log` two directory levels above the working directory.
    pub fn from_cwd() -> Result<Self> {
        let cwd = std::env::current_dir()?;
        Self::new(two_levels_up(&cwd), EXECUTION_LOG_GLOB)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Every matching file, sorted.
    pub fn candidates(&self) -> Result<Vec<PathBuf>> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut matches = Vec::new();
        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            if path.is_file() && self.matcher.is_match(entry.file_name()) {
                matches.push(path);
            }
        }
        matches.sort();
        Ok(matches)
    }
}

impl LogLocator for GlobLocator {
    fn locate(&self) -> Result<PathBuf> {
        debug!(dir = %self.dir.display(), pattern = %self.pattern, "Searching for execution log");

        let candidates = self.candidates()?;
        if candidates.len() > 1 {
            warn!(
                count = candidates.len(),
                chosen = %candidates[0].display(),
                "Several execution logs matched; using the first in sorted order"
            );
        }

        candidates
            .into_iter()
            .next()
            .ok_or_else(|| TriageError::LogNotFound {
                searched: self.dir.join(&self.pattern).display().to_string(),
            })
    }
}

fn two_levels_up(dir: &Path) -> PathBuf {
    dir.parent()
        .and_then(Path::parent)
        .unwrap_or(dir)
        .to_path_buf()
}
