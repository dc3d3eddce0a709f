//! Tessera code generator
//!
//! Reads a directory of schema documents, one per entity, and generates typed
//! models, client operations, a combined API schema and infrastructure
//! descriptions from them.
//!
//! ## Architecture
//!
//! The generator uses a three-stage pipeline:
//! 1. **Parser**: discovers, parses and validates schema documents
//! 2. **IR (Intermediate Representation)**: target-neutral `SchemaCatalog`
//! 3. **Generators**: one emitter per target, built from shared fragments
//!
//! Every artifact is rendered in memory first. Only a run that rendered
//! everything reconciles the managed output directories and writes files.

pub mod config;
pub mod error;
pub mod generators;
pub mod ir;
pub mod naming;
pub mod parser;
pub mod reconcile;
pub mod types;
pub mod utils;

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::SystemTime;

use chrono::{DateTime, Utc};

pub use config::CodegenConfig;
pub use error::{Error, Result, Rule};

use generators::graphql::{GraphqlGenerator, SCHEMA_FILE};
use generators::infra::InfraGenerator;
use generators::rust::RustGenerator;
use generators::typescript::TypeScriptGenerator;
use generators::{EmissionRegistry, GeneratedFiles, Generator, GeneratorConfig};
use ir::SchemaCatalog;
use parser::{EnumDocument, SchemaDocument};

/// Main entry point for code generation
pub struct CodeGenerator {
    catalog: SchemaCatalog,
}

impl CodeGenerator {
    /// Create a new code generator from validated documents
    pub fn from_documents(documents: &[SchemaDocument], enums: &[EnumDocument]) -> Result<Self> {
        let catalog = ir::build_catalog(documents, enums)?;
        Ok(Self { catalog })
    }

    /// Get the schema catalog
    pub fn catalog(&self) -> &SchemaCatalog {
        &self.catalog
    }

    /// Render one target into memory, checking it produced exactly its expected files
    pub fn generate(
        &self,
        generator: &dyn Generator,
        registry: &mut EmissionRegistry,
    ) -> Result<GeneratedFiles> {
        let expected = generator.expected_files(&self.catalog);
        let files = generator.generate(&self.catalog, registry)?;

        let rendered = files.names();
        if rendered != expected {
            let missing: Vec<&String> = expected.difference(&rendered).collect();
            let extra: Vec<&String> = rendered.difference(&expected).collect();
            return Err(Error::render(
                format!("{:?} target", generator.target()),
                format!("rendered files differ from expected: missing {:?}, unexpected {:?}", missing, extra),
            ));
        }
        Ok(files)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    /// Reconcile and write the output tree
    #[default]
    Write,
    /// Report what a write would change, touching nothing
    Check,
}

/// What a run did, or in check mode would do
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub entities: usize,
    pub enums: usize,
    pub written: Vec<PathBuf>,
    pub unchanged: usize,
    pub removed: Vec<PathBuf>,
}

impl RunSummary {
    pub fn is_up_to_date(&self) -> bool {
        self.written.is_empty() && self.removed.is_empty()
    }
}

struct StagedTarget {
    dir: PathBuf,
    expected: BTreeSet<String>,
    files: GeneratedFiles,
}

/// Run the whole pipeline: load, validate, build IR, render, reconcile, write.
///
/// Nothing on disk changes unless every document validates and every
/// artifact renders.
pub fn run(config: &CodegenConfig, mode: RunMode) -> Result<RunSummary> {
    config.validate()?;

    let loaded = parser::load(&config.schema_dir, &config.enums_file)?;
    let codegen = CodeGenerator::from_documents(&loaded.documents, &loaded.enums)?;
    let catalog = codegen.catalog();

    let generator_config = GeneratorConfig {
        generate_docs: config.generate_docs,
        api_name: config.api_name.clone(),
        generated_at: generation_timestamp(config.source_date_epoch, loaded.newest_modified)?,
    };

    let schema_location = utils::relative_path(&config.infra_dir, &config.graphql_dir.join(SCHEMA_FILE))?;
    let generators: Vec<Box<dyn Generator>> = vec![
        Box::new(RustGenerator::new(generator_config.clone(), &config.rust_dir)),
        Box::new(TypeScriptGenerator::new(generator_config.clone(), &config.typescript_dir)),
        Box::new(GraphqlGenerator::new(generator_config.clone(), &config.graphql_dir)),
        Box::new(InfraGenerator::new(
            generator_config,
            &config.infra_dir,
            schema_location,
        )),
    ];

    let mut registry = EmissionRegistry::new();
    let mut staged = Vec::with_capacity(generators.len());
    for generator in &generators {
        let files = codegen.generate(generator.as_ref(), &mut registry)?;
        tracing::debug!(
            target_kind = ?generator.target(),
            files = files.len(),
            "target rendered"
        );
        staged.push(StagedTarget {
            dir: generator.output_dir(),
            expected: generator.expected_files(catalog),
            files,
        });
    }

    let mut summary = RunSummary {
        entities: catalog.entity_count(),
        enums: catalog.enum_count(),
        ..RunSummary::default()
    };

    match mode {
        RunMode::Write => {
            for target in &staged {
                summary
                    .removed
                    .extend(reconcile::reconcile(&target.dir, &target.expected)?);
            }
            for target in &staged {
                let report = utils::write_files(&target.dir, &target.files)?;
                summary.written.extend(report.written);
                summary.unchanged += report.unchanged;
            }
        }
        RunMode::Check => {
            for target in &staged {
                summary
                    .removed
                    .extend(reconcile::stale_files(&target.dir, &target.expected)?);
                let changed = utils::changed_files(&target.dir, &target.files)?;
                summary.unchanged += target.files.len() - changed.len();
                summary.written.extend(changed);
            }
        }
    }

    tracing::info!(
        entities = summary.entities,
        enums = summary.enums,
        written = summary.written.len(),
        unchanged = summary.unchanged,
        removed = summary.removed.len(),
        mode = ?mode,
        "generation finished"
    );

    Ok(summary)
}

/// Timestamp for the combined schema header: the configured epoch, else the
/// newest input modification time, else the Unix epoch.
fn generation_timestamp(
    source_date_epoch: Option<i64>,
    newest_modified: Option<SystemTime>,
) -> Result<DateTime<Utc>> {
    if let Some(secs) = source_date_epoch {
        return DateTime::from_timestamp(secs, 0).ok_or_else(|| {
            Error::Config(format!("source_date_epoch {} is out of range", secs))
        });
    }
    Ok(newest_modified
        .map(DateTime::<Utc>::from)
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn configured_epoch_wins_over_mtime() {
        let mtime = SystemTime::UNIX_EPOCH + Duration::from_secs(50);
        let ts = generation_timestamp(Some(100), Some(mtime)).unwrap();
        assert_eq!(ts.timestamp(), 100);
        let ts = generation_timestamp(None, Some(mtime)).unwrap();
        assert_eq!(ts.timestamp(), 50);
        let ts = generation_timestamp(None, None).unwrap();
        assert_eq!(ts, DateTime::<Utc>::UNIX_EPOCH);
    }

    #[test]
    fn out_of_range_epoch_is_a_config_error() {
        assert!(matches!(
            generation_timestamp(Some(i64::MAX), None),
            Err(Error::Config(_))
        ));
    }
}
