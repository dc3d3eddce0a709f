//! Stale-artifact reconciliation
//!
//! A managed output directory must hold exactly the files the current schema
//! corpus implies. Anything else at the top level of the directory is a
//! leftover from a removed or renamed schema and gets deleted. Subdirectories
//! are never touched.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Files directly under `dir` whose names are not in `expected`, sorted.
///
/// A directory that does not exist yet has no stale files.
pub fn stale_files(dir: &Path, expected: &BTreeSet<String>) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut stale = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| Error::io(dir, e))? {
        let entry = entry.map_err(|e| Error::io(dir, e))?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(|e| Error::io(&path, e))?;
        if file_type.is_dir() {
            continue;
        }
        let keep = entry
            .file_name()
            .to_str()
            .is_some_and(|name| expected.contains(name));
        if !keep {
            stale.push(path);
        }
    }

    stale.sort();
    Ok(stale)
}

/// Delete every stale file under `dir` and return what was removed.
pub fn reconcile(dir: &Path, expected: &BTreeSet<String>) -> Result<Vec<PathBuf>> {
    let stale = stale_files(dir, expected)?;
    for path in &stale {
        fs::remove_file(path).map_err(|e| Error::io(path, e))?;
        tracing::info!(path = %path.display(), "removed stale artifact");
    }
    Ok(stale)
}
