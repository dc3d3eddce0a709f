//! Code generators for the output targets
//!
//! Each target has its own module that implements the `Generator` trait. All
//! generators of a run share one `EmissionRegistry`, so a symbol is emitted
//! at most once per target even when several entities reference it.

pub mod fragments;
pub mod graphql;
pub mod infra;
pub mod registry;
pub mod rust;
pub mod typescript;

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use crate::error::Result;
use crate::ir::SchemaCatalog;
pub use registry::{EmissionRegistry, Target};

/// Trait that all target generators must implement
pub trait Generator {
    /// Registry namespace of this generator
    fn target(&self) -> Target;

    /// Directory this generator owns
    fn output_dir(&self) -> PathBuf;

    /// File names the catalog implies for this target, known before rendering
    fn expected_files(&self, catalog: &SchemaCatalog) -> BTreeSet<String>;

    /// Render every artifact of this target into memory
    fn generate(
        &self,
        catalog: &SchemaCatalog,
        registry: &mut EmissionRegistry,
    ) -> Result<GeneratedFiles>;
}

/// Rendered artifacts of one target, keyed by file name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratedFiles {
    pub files: BTreeMap<String, String>,
}

impl GeneratedFiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, file_name: impl Into<String>, contents: impl Into<String>) {
        self.files.insert(file_name.into(), contents.into());
    }

    pub fn get(&self, file_name: &str) -> Option<&str> {
        self.files.get(file_name).map(String::as_str)
    }

    pub fn names(&self) -> BTreeSet<String> {
        self.files.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Configuration options shared by every generator
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Whether to generate documentation comments
    pub generate_docs: bool,
    /// Name of the API resource in the API infra description
    pub api_name: String,
    /// Timestamp stamped into the combined API schema
    pub generated_at: DateTime<Utc>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            generate_docs: true,
            api_name: "tessera-api".to_string(),
            generated_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }
}

/// Header line stamped at the top of every generated source file
pub(crate) const GENERATED_BANNER: &str = "Generated by tessera. Do not edit.";
