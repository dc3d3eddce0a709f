//! Rust code generator for host-language models

mod types;

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::generators::fragments::{self, FieldType, FragmentScope, TypeDecl};
use crate::generators::{
    EmissionRegistry, GeneratedFiles, Generator, GeneratorConfig, Target, GENERATED_BANNER,
};
use crate::ir::{Entity, SchemaCatalog};
use crate::naming::{enum_file_name, model_file_name, rust_module_name};

const EXT: &str = "rs";
const MOD_RS: &str = "mod.rs";

/// Rust code generator
pub struct RustGenerator {
    config: GeneratorConfig,
    output_dir: PathBuf,
}

impl RustGenerator {
    pub fn new(config: GeneratorConfig, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            config,
            output_dir: output_dir.into(),
        }
    }
}

impl Generator for RustGenerator {
    fn target(&self) -> Target {
        Target::Rust
    }

    fn output_dir(&self) -> PathBuf {
        self.output_dir.clone()
    }

    fn expected_files(&self, catalog: &SchemaCatalog) -> BTreeSet<String> {
        let mut files: BTreeSet<String> = catalog
            .entities()
            .map(|e| model_file_name(e.name(), EXT))
            .chain(catalog.enums().map(|e| enum_file_name(&e.name, EXT)))
            .collect();
        files.insert(MOD_RS.to_string());
        files
    }

    fn generate(
        &self,
        catalog: &SchemaCatalog,
        registry: &mut EmissionRegistry,
    ) -> Result<GeneratedFiles> {
        let mut output = GeneratedFiles::new();

        // One file per entity
        for entity in catalog.entities() {
            let scope = FragmentScope::new(catalog, entity, Target::Rust);
            let declarations = fragments::render(fragments::MODEL_ARTIFACT, &scope, registry)?;
            let (decls, _) = fragments::partition(declarations);
            let code = self.generate_model_module(entity, &decls, catalog);
            output.insert(model_file_name(entity.name(), EXT), code);
        }

        // One file per enum
        for definition in catalog.enums() {
            if !registry.mark_type_rendered(Target::Rust, &definition.name) {
                continue;
            }
            let mut code = header(&format!("{} enum", definition.name));
            code.push_str("use serde::{Deserialize, Serialize};\n\n");
            code.push_str(&types::generate_enum(definition, &self.config)?);
            code.push('\n');
            output.insert(enum_file_name(&definition.name, EXT), code);
        }

        let mod_rs = self.generate_mod_rs(&output)?;
        output.insert(MOD_RS, mod_rs);

        Ok(output)
    }
}

impl RustGenerator {
    /// Generate a complete module for a single entity
    fn generate_model_module(
        &self,
        entity: &Entity,
        decls: &[TypeDecl],
        catalog: &SchemaCatalog,
    ) -> String {
        let mut code = header(&format!("{} model", entity.name()));

        code.push_str("use serde::{Deserialize, Serialize};\n");
        code.push_str(&self.generate_imports(decls, catalog));
        code.push('\n');

        for (i, decl) in decls.iter().enumerate() {
            if i > 0 {
                code.push_str("\n\n");
            }
            code.push_str(&types::generate_struct(decl, &self.config));
        }
        code.push('\n');

        code
    }

    /// Generate imports for catalog types declared in sibling modules
    fn generate_imports(&self, decls: &[TypeDecl], catalog: &SchemaCatalog) -> String {
        let local: BTreeSet<&str> = decls.iter().map(|d| d.name.as_str()).collect();
        let mut imports = BTreeSet::new();

        for field in decls.iter().flat_map(|d| &d.fields) {
            let FieldType::Attribute(kind) = &field.ty else {
                continue;
            };
            if let Some(name) = kind.enum_name() {
                imports.insert(format!(
                    "use super::{}::{};\n",
                    rust_module_name(&format!("{}.enum", name)),
                    name
                ));
            } else if let Some(name) = kind.referenced_type() {
                if !local.contains(name) && catalog.entity(name).is_some() {
                    imports.insert(format!(
                        "use super::{}::{};\n",
                        rust_module_name(&format!("{}.model", name)),
                        name
                    ));
                }
            }
        }

        imports.into_iter().collect()
    }

    fn generate_mod_rs(&self, output: &GeneratedFiles) -> Result<String> {
        let mut code = header("Generated host models");

        let mut modules: BTreeMap<String, &str> = BTreeMap::new();
        for file_name in output.files.keys() {
            let stem = file_name.strip_suffix(".rs").unwrap_or(file_name);
            let module = rust_module_name(stem);
            if let Some(other) = modules.insert(module.clone(), file_name) {
                return Err(Error::render(
                    stem,
                    format!("module `{}` would be declared by both {} and {}", module, other, file_name),
                ));
            }
        }

        let mut by_file: Vec<(&str, &String)> = modules.iter().map(|(m, f)| (*f, m)).collect();
        by_file.sort();

        for (file_name, module) in &by_file {
            code.push_str(&format!("#[path = \"{}\"]\n", file_name));
            code.push_str(&format!("pub mod {};\n", module));
        }

        code.push_str("\n// Re-export all types\n");
        for (_, module) in &by_file {
            code.push_str(&format!("pub use {}::*;\n", module));
        }

        Ok(code)
    }
}

fn header(title: &str) -> String {
    format!("//! {}\n//!\n//! {}\n\n", title, GENERATED_BANNER)
}
