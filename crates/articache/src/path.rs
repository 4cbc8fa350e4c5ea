//! # Path Resolver
//!
//! Maps an inbound request path onto a file below the cache root.
//!
//! Resolution is purely lexical: `.` segments and empty segments are
//! dropped, `..` removes the previous segment. A `..` with nothing left to
//! remove would climb above the root and rejects the whole path, as does a
//! path naming the root itself. The filesystem is never consulted.

use std::path::{Component, Path, PathBuf};

use crate::error::{CacheError, CacheResult};

/// A request path that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    key: String,
    path: PathBuf,
}

impl ResolvedPath {
    /// Normalized artifact key, always starting with `/`
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Location of the artifact below the cache root
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn into_path(self) -> PathBuf {
        self.path
    }
}

/// Resolve `request_path` against `cache_root`.
pub fn resolve(cache_root: &Path, request_path: &str) -> CacheResult<ResolvedPath> {
    let invalid = || CacheError::InvalidPath(request_path.to_owned());

    let mut segments: Vec<&str> = Vec::new();
    for segment in request_path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop().ok_or_else(invalid)?;
            }
            s if s.contains(['\0', '\\']) => return Err(invalid()),
            s => segments.push(s),
        }
    }

    if segments.is_empty() {
        return Err(invalid());
    }

    let path = segments
        .iter()
        .fold(cache_root.to_path_buf(), |acc, segment| acc.join(segment));

    // The joined path must stay strictly below the root.
    let relative = path.strip_prefix(cache_root).map_err(|_| invalid())?;
    let mut components = relative.components().peekable();
    if components.peek().is_none() {
        return Err(invalid());
    }
    if !components.all(|c| matches!(c, Component::Normal(_))) {
        return Err(invalid());
    }

    Ok(ResolvedPath {
        key: format!("/{}", segments.join("/")),
        path,
    })
}
