//! Schema document loader
//!
//! Discovers schema documents in a directory, parses them as YAML (JSON is a
//! subset), and validates each one. Loading is all-or-nothing: the first
//! invalid document, in file-name order, aborts the run before anything is
//! generated.

mod document;
mod validation;

pub use document::{
    AttributeDocument, DocumentBody, EnumDocument, IndexDocument, SchemaDocument, TableDocument,
};

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::error::{Error, Result, Rule};
use document::{RawDocument, RawEnumCatalog};

const SCHEMA_EXTENSIONS: [&str; 3] = ["yml", "yaml", "json"];

/// Every validated document of a schema directory
#[derive(Debug, Clone)]
pub struct LoadedSchemas {
    /// Sorted by file name
    pub documents: Vec<SchemaDocument>,
    pub enums: Vec<EnumDocument>,
    /// Newest modification time among the input documents
    pub newest_modified: Option<SystemTime>,
}

/// Load and validate every schema document in `dir`, plus the optional enum catalog.
pub fn load(dir: &Path, enums_file: &Path) -> Result<LoadedSchemas> {
    let paths = discover(dir)?;
    let mut newest_modified = None;
    let mut documents = Vec::with_capacity(paths.len());

    for path in &paths {
        let source = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        newest_modified = newer(newest_modified, modified(path));
        let document = parse_document(path, &source)?;
        tracing::debug!(file = %path.display(), entity = %document.name, "schema document validated");
        documents.push(document);
    }

    let enums = if enums_file.is_file() {
        let source = fs::read_to_string(enums_file).map_err(|e| Error::io(enums_file, e))?;
        newest_modified = newer(newest_modified, modified(enums_file));
        parse_enum_catalog(enums_file, &source)?
    } else {
        tracing::debug!(file = %enums_file.display(), "no enum catalog found");
        Vec::new()
    };

    tracing::info!(
        dir = %dir.display(),
        documents = documents.len(),
        enums = enums.len(),
        "schema documents loaded"
    );

    Ok(LoadedSchemas {
        documents,
        enums,
        newest_modified,
    })
}

/// Parse and validate a single schema document.
///
/// `path` is used for the file-name rule and for error messages only.
pub fn parse_document(path: &Path, source: &str) -> Result<SchemaDocument> {
    let raw: RawDocument = if source.trim().is_empty() {
        RawDocument::default()
    } else {
        serde_yaml::from_str(source)
            .map_err(|e| Error::validation(path, "document", Rule::Parse, e.to_string()))?
    };
    validation::validate_document(path, raw)
}

/// Parse and validate the enum catalog document (`EnumName: [VALUE, ...]`).
pub fn parse_enum_catalog(path: &Path, source: &str) -> Result<Vec<EnumDocument>> {
    if source.trim().is_empty() {
        return Ok(Vec::new());
    }
    let raw: RawEnumCatalog = serde_yaml::from_str(source)
        .map_err(|e| Error::validation(path, "document", Rule::Parse, e.to_string()))?;
    validation::validate_enum_catalog(path, raw)
}

/// Schema document paths in `dir`, sorted by file name.
fn discover(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| Error::io(dir, e))?;
    let mut paths = Vec::new();

    for entry in entries {
        let entry = entry.map_err(|e| Error::io(dir, e))?;
        let path = entry.path();
        if !path.is_file() || is_hidden(&path) {
            continue;
        }
        let is_schema = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| SCHEMA_EXTENSIONS.contains(&e));
        if is_schema {
            paths.push(path);
        } else {
            tracing::debug!(file = %path.display(), "skipping non-schema file");
        }
    }

    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(paths)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|f| f.to_str())
        .is_some_and(|f| f.starts_with('.'))
}

fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

fn newer(current: Option<SystemTime>, candidate: Option<SystemTime>) -> Option<SystemTime> {
    match (current, candidate) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    }
}
