//! Restrict file reads and writes to configured resource directories

use crate::error::{Error, Result};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Allowed roots for input and output paths. Empty means unrestricted.
#[derive(Debug, Clone, Default)]
pub struct AccessPolicy {
    resource_dirs: Vec<PathBuf>,
}

impl AccessPolicy {
    pub fn new<I, P>(dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            resource_dirs: dirs.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_restricted(&self) -> bool {
        !self.resource_dirs.is_empty()
    }

    /// Check an existing file; returns its canonical path when restricted
    pub fn check_input(&self, path: &str) -> Result<PathBuf> {
        if !self.is_restricted() {
            return Ok(PathBuf::from(path));
        }

        let canonical = std::fs::canonicalize(path).map_err(|_| denied(path))?;
        self.within_roots(canonical).ok_or_else(|| denied(path))
    }

    /// Check a file that may not exist yet by canonicalizing its parent
    pub fn check_output(&self, path: &str) -> Result<PathBuf> {
        if !self.is_restricted() {
            return Ok(PathBuf::from(path));
        }

        let target = Path::new(path);
        let parent = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let canonical_parent = std::fs::canonicalize(parent).map_err(|_| denied(path))?;
        let canonical = canonical_parent.join(target.file_name().unwrap_or(OsStr::new("")));

        self.within_roots(canonical).ok_or_else(|| denied(path))
    }

    fn within_roots(&self, canonical: PathBuf) -> Option<PathBuf> {
        self.resource_dirs
            .iter()
            .filter_map(|dir| std::fs::canonicalize(dir).ok())
            .any(|root| canonical.starts_with(root))
            .then_some(canonical)
    }
}

fn denied(path: &str) -> Error {
    Error::PathAccessDenied {
        path: path.to_string(),
    }
}
