//! Infrastructure descriptions
//!
//! Two JSON documents cover every table entity: `storage.json` describes the
//! tables and their indexes, `api.json` describes the API resource that
//! serves the combined schema. The storage document exports each table name
//! and the API document imports it.

mod api;
mod storage;

pub use api::{data_source_name, resolver_logical_id};
pub use storage::{table_export_name, table_logical_id};

use std::collections::BTreeSet;
use std::path::PathBuf;

use serde_json::Value;

use crate::error::{Error, Result};
use crate::generators::{EmissionRegistry, GeneratedFiles, Generator, GeneratorConfig, Target};
use crate::ir::SchemaCatalog;

pub const STORAGE_FILE: &str = "storage.json";
pub const API_FILE: &str = "api.json";

pub struct InfraGenerator {
    config: GeneratorConfig,
    output_dir: PathBuf,
    /// Where the API description finds the combined schema
    schema_location: String,
}

impl InfraGenerator {
    pub fn new(
        config: GeneratorConfig,
        output_dir: impl Into<PathBuf>,
        schema_location: impl Into<String>,
    ) -> Self {
        Self {
            config,
            output_dir: output_dir.into(),
            schema_location: schema_location.into(),
        }
    }
}

impl Generator for InfraGenerator {
    fn target(&self) -> Target {
        Target::Infra
    }

    fn output_dir(&self) -> PathBuf {
        self.output_dir.clone()
    }

    fn expected_files(&self, _catalog: &SchemaCatalog) -> BTreeSet<String> {
        BTreeSet::from([STORAGE_FILE.to_string(), API_FILE.to_string()])
    }

    fn generate(
        &self,
        catalog: &SchemaCatalog,
        registry: &mut EmissionRegistry,
    ) -> Result<GeneratedFiles> {
        let storage = storage::storage_template(catalog, registry)?;
        let api = api::api_template(
            catalog,
            registry,
            &self.config.api_name,
            &self.schema_location,
        )?;

        let mut output = GeneratedFiles::new();
        output.insert(STORAGE_FILE, to_document(STORAGE_FILE, &storage)?);
        output.insert(API_FILE, to_document(API_FILE, &api)?);
        Ok(output)
    }
}

fn to_document(name: &str, value: &Value) -> Result<String> {
    let mut text =
        serde_json::to_string_pretty(value).map_err(|e| Error::render(name, e.to_string()))?;
    text.push('\n');
    Ok(text)
}
