//! TypeScript code generator for client models and operations

mod operations;

use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::error::Result;
use crate::generators::fragments::{self, FieldDecl, FieldType, FragmentScope, TypeDecl};
use crate::generators::{
    EmissionRegistry, GeneratedFiles, Generator, GeneratorConfig, Target, GENERATED_BANNER,
};
use crate::ir::{EnumDefinition, SchemaCatalog};
use crate::naming::{enum_file_name, model_file_name, operations_file_name};
use crate::types::{map_type, Surface};

const EXT: &str = "ts";
const INDEX_TS: &str = "index.ts";

pub struct TypeScriptGenerator {
    config: GeneratorConfig,
    output_dir: PathBuf,
}

impl TypeScriptGenerator {
    pub fn new(config: GeneratorConfig, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            config,
            output_dir: output_dir.into(),
        }
    }
}

impl Generator for TypeScriptGenerator {
    fn target(&self) -> Target {
        Target::TypeScript
    }

    fn output_dir(&self) -> PathBuf {
        self.output_dir.clone()
    }

    fn expected_files(&self, catalog: &SchemaCatalog) -> BTreeSet<String> {
        let mut files: BTreeSet<String> = catalog
            .entities()
            .map(|e| model_file_name(e.name(), EXT))
            .chain(catalog.tables().map(|t| operations_file_name(&t.name, EXT)))
            .chain(catalog.enums().map(|e| enum_file_name(&e.name, EXT)))
            .collect();
        files.insert(INDEX_TS.to_string());
        files
    }

    fn generate(
        &self,
        catalog: &SchemaCatalog,
        registry: &mut EmissionRegistry,
    ) -> Result<GeneratedFiles> {
        let mut output = GeneratedFiles::new();

        for entity in catalog.entities() {
            let scope = FragmentScope::new(catalog, entity, Target::TypeScript);
            let declarations = fragments::render(fragments::MODEL_ARTIFACT, &scope, registry)?;
            let (decls, _) = fragments::partition(declarations);
            output.insert(
                model_file_name(entity.name(), EXT),
                self.generate_model_module(&decls, catalog),
            );
        }

        for table in catalog.tables() {
            let Some(entity) = catalog.entity(&table.name) else {
                continue;
            };
            let scope = FragmentScope::new(catalog, entity, Target::TypeScript);
            let (_, ops) = fragments::partition(fragments::render(
                fragments::OPERATIONS,
                &scope,
                registry,
            )?);
            output.insert(
                operations_file_name(&table.name, EXT),
                operations::generate_operations_module(&table.name, &ops, catalog),
            );
        }

        for definition in catalog.enums() {
            if registry.mark_type_rendered(Target::TypeScript, &definition.name) {
                output.insert(
                    enum_file_name(&definition.name, EXT),
                    generate_enum_module(definition),
                );
            }
        }

        let index = generate_index(&output);
        output.insert(INDEX_TS, index);

        Ok(output)
    }
}

impl TypeScriptGenerator {
    fn generate_model_module(&self, decls: &[TypeDecl], catalog: &SchemaCatalog) -> String {
        let mut code = format!("// {}\n\n", GENERATED_BANNER);

        let imports = generate_imports(decls, catalog);
        if !imports.is_empty() {
            code.push_str(&imports);
            code.push('\n');
        }

        for (i, decl) in decls.iter().enumerate() {
            if i > 0 {
                code.push('\n');
            }
            code.push_str(&self.generate_interface(decl));
        }

        code
    }

    fn generate_interface(&self, decl: &TypeDecl) -> String {
        let mut code = String::new();
        if self.config.generate_docs {
            if let Some(desc) = &decl.description {
                code.push_str(&doc_comment("", desc));
            }
        }

        code.push_str(&format!("export interface {} {{\n", decl.name));
        for field in &decl.fields {
            if self.config.generate_docs {
                if let Some(desc) = &field.description {
                    code.push_str(&doc_comment("  ", desc));
                }
            }
            code.push_str(&format!(
                "  {}{}: {};\n",
                field.name,
                if field.required { "" } else { "?" },
                field_type(field)
            ));
        }
        code.push_str("}\n");
        code
    }
}

fn field_type(field: &FieldDecl) -> String {
    match &field.ty {
        FieldType::Integer => Surface::ClientModel.integer().to_string(),
        FieldType::Attribute(kind) => map_type(Surface::ClientModel, kind),
    }
}

/// `import type` lines for catalog types declared in sibling files
fn generate_imports(decls: &[TypeDecl], catalog: &SchemaCatalog) -> String {
    let local: BTreeSet<&str> = decls.iter().map(|d| d.name.as_str()).collect();
    let mut imports = BTreeSet::new();

    for field in decls.iter().flat_map(|d| &d.fields) {
        let FieldType::Attribute(kind) = &field.ty else {
            continue;
        };
        if let Some(name) = kind.enum_name() {
            imports.insert(format!(
                "import type {{ {} }} from './{}.enum';\n",
                name, name
            ));
        } else if let Some(name) = kind.referenced_type() {
            if !local.contains(name) && catalog.entity(name).is_some() {
                imports.insert(format!(
                    "import type {{ {} }} from './{}.model';\n",
                    name, name
                ));
            }
        }
    }

    imports.into_iter().collect()
}

fn generate_enum_module(definition: &EnumDefinition) -> String {
    let mut code = format!("// {}\n\n", GENERATED_BANNER);
    code.push_str(&format!("export enum {} {{\n", definition.name));
    for value in &definition.values {
        code.push_str(&format!("  {} = '{}',\n", value, value));
    }
    code.push_str("}\n");
    code
}

fn generate_index(output: &GeneratedFiles) -> String {
    let mut code = format!("// {}\n\n", GENERATED_BANNER);
    for file_name in output.files.keys() {
        let module = file_name.strip_suffix(".ts").unwrap_or(file_name);
        code.push_str(&format!("export * from './{}';\n", module));
    }
    code
}

fn doc_comment(indent: &str, text: &str) -> String {
    let text = text.trim().replace("*/", "*\\/");
    if text.contains('\n') {
        let mut out = format!("{}/**\n", indent);
        for line in text.lines() {
            out.push_str(&format!("{} * {}\n", indent, line.trim_end()));
        }
        out.push_str(&format!("{} */\n", indent));
        out
    } else {
        format!("{}/** {} */\n", indent, text)
    }
}
