//! Generator configuration

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Input/output locations and generation switches for one run.
///
/// Relative paths are resolved against the process working directory.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CodegenConfig {
    /// Directory holding one schema document per entity
    pub schema_dir: PathBuf,
    /// Optional enum catalog document (absent file means no shared enums)
    pub enums_file: PathBuf,
    /// Host-language (Rust) model output
    pub rust_dir: PathBuf,
    /// Client-language (TypeScript) model and operation output
    pub typescript_dir: PathBuf,
    /// Combined API schema output
    pub graphql_dir: PathBuf,
    /// Storage and API infrastructure descriptions
    pub infra_dir: PathBuf,
    /// Name given to the API resource in the API infra description
    pub api_name: String,
    /// Whether to carry attribute descriptions into generated doc comments
    pub generate_docs: bool,
    /// Fixed timestamp (seconds since epoch) for the combined schema header
    pub source_date_epoch: Option<i64>,
}

impl Default for CodegenConfig {
    fn default() -> Self {
        Self {
            schema_dir: PathBuf::from("schemas"),
            enums_file: PathBuf::from("enums.yml"),
            rust_dir: PathBuf::from("generated/rust"),
            typescript_dir: PathBuf::from("generated/typescript"),
            graphql_dir: PathBuf::from("generated/graphql"),
            infra_dir: PathBuf::from("generated/infra"),
            api_name: "tessera-api".to_string(),
            generate_docs: true,
            source_date_epoch: None,
        }
    }
}

impl CodegenConfig {
    /// Configuration rooted at `root`: every default location is joined onto it.
    pub fn rooted_at(root: &Path) -> Self {
        let defaults = Self::default();
        Self {
            schema_dir: root.join(defaults.schema_dir),
            enums_file: root.join(defaults.enums_file),
            rust_dir: root.join(defaults.rust_dir),
            typescript_dir: root.join(defaults.typescript_dir),
            graphql_dir: root.join(defaults.graphql_dir),
            infra_dir: root.join(defaults.infra_dir),
            ..defaults
        }
    }

    /// Every directory the reconciler owns.
    pub fn managed_dirs(&self) -> [&Path; 4] {
        [
            self.rust_dir.as_path(),
            self.typescript_dir.as_path(),
            self.graphql_dir.as_path(),
            self.infra_dir.as_path(),
        ]
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_name.trim().is_empty() {
            return Err(Error::Config("api_name must not be empty".into()));
        }

        if self.schema_dir.as_os_str().is_empty() {
            return Err(Error::Config("schema_dir must not be empty".into()));
        }
        // the loader would read the catalog as one more schema document
        if self.enums_file.starts_with(&self.schema_dir) {
            return Err(Error::Config(format!(
                "enums_file {} must live outside the schema directory {}",
                self.enums_file.display(),
                self.schema_dir.display()
            )));
        }

        let dirs = self.managed_dirs();
        for (i, dir) in dirs.iter().enumerate() {
            if dir.as_os_str().is_empty() {
                return Err(Error::Config("output directories must not be empty".into()));
            }
            if *dir == self.schema_dir.as_path() {
                return Err(Error::Config(format!(
                    "output directory {} must differ from the schema directory",
                    dir.display()
                )));
            }
            if dirs[i + 1..].contains(dir) {
                return Err(Error::Config(format!(
                    "output directory {} is configured for more than one target",
                    dir.display()
                )));
            }
        }

        Ok(())
    }
}
