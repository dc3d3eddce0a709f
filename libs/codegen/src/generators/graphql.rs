//! Combined API schema generator (GraphQL SDL)
//!
//! Every API-visible entity contributes its object type, input types,
//! envelopes and operations. Static value types are pulled in only through
//! references. One registry namespace covers the whole schema, so a type
//! shared by several entities is printed once.

use std::collections::BTreeSet;
use std::path::PathBuf;

use chrono::SecondsFormat;

use crate::error::{Error, Result};
use crate::generators::fragments::{
    self, DeclKind, FieldDecl, FieldType, FragmentScope, OperationDecl, OperationKind, TypeDecl,
};
use crate::generators::{
    EmissionRegistry, GeneratedFiles, Generator, GeneratorConfig, Target, GENERATED_BANNER,
};
use crate::ir::{AttributeKind, Entity, EnumDefinition, SchemaCatalog};
use crate::naming;
use crate::types::{map_type, Surface};

pub const SCHEMA_FILE: &str = "schema.graphql";

pub struct GraphqlGenerator {
    config: GeneratorConfig,
    output_dir: PathBuf,
}

impl GraphqlGenerator {
    pub fn new(config: GeneratorConfig, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            config,
            output_dir: output_dir.into(),
        }
    }
}

impl Generator for GraphqlGenerator {
    fn target(&self) -> Target {
        Target::GraphQl
    }

    fn output_dir(&self) -> PathBuf {
        self.output_dir.clone()
    }

    fn expected_files(&self, _catalog: &SchemaCatalog) -> BTreeSet<String> {
        BTreeSet::from([SCHEMA_FILE.to_string()])
    }

    fn generate(
        &self,
        catalog: &SchemaCatalog,
        registry: &mut EmissionRegistry,
    ) -> Result<GeneratedFiles> {
        let mut types = Vec::new();
        let mut operations = Vec::new();
        for entity in catalog.entities().filter(|e| e.is_api_visible()) {
            let scope = FragmentScope::new(catalog, entity, Target::GraphQl);
            let declarations = fragments::render(fragments::API_SCHEMA_ENTITY, &scope, registry)?;
            let (t, o) = fragments::partition(declarations);
            types.extend(t);
            operations.extend(o);
        }

        let mut sdl = format!(
            "# {}\n# Generated at {}\n",
            GENERATED_BANNER,
            self.config
                .generated_at
                .to_rfc3339_opts(SecondsFormat::Secs, true)
        );

        for definition in catalog.enums() {
            if registry.mark_type_rendered(Target::GraphQl, &definition.name) {
                sdl.push('\n');
                sdl.push_str(&print_enum(definition)?);
            }
        }

        for decl in &types {
            sdl.push('\n');
            sdl.push_str(&print_type(decl, catalog, self.config.generate_docs));
        }

        let queries: Vec<&OperationDecl> = operations
            .iter()
            .filter(|o| o.kind == OperationKind::Query)
            .collect();
        let mutations: Vec<&OperationDecl> = operations
            .iter()
            .filter(|o| o.kind == OperationKind::Mutation)
            .collect();

        if !queries.is_empty() {
            sdl.push('\n');
            sdl.push_str(&print_root("Query", &queries));
        }
        if !mutations.is_empty() {
            sdl.push('\n');
            sdl.push_str(&print_root("Mutation", &mutations));
        }
        if !queries.is_empty() || !mutations.is_empty() {
            sdl.push_str("\nschema {\n");
            if !queries.is_empty() {
                sdl.push_str("  query: Query\n");
            }
            if !mutations.is_empty() {
                sdl.push_str("  mutation: Mutation\n");
            }
            sdl.push_str("}\n");
        }

        tracing::debug!(
            types = types.len(),
            operations = operations.len(),
            "API schema rendered"
        );

        let mut output = GeneratedFiles::new();
        output.insert(SCHEMA_FILE, sdl);
        Ok(output)
    }
}

fn print_enum(definition: &EnumDefinition) -> Result<String> {
    let mut sdl = format!("enum {} {{\n", definition.name);
    for value in &definition.values {
        if matches!(value.as_str(), "true" | "false" | "null") {
            return Err(Error::render(
                &definition.name,
                format!("`{}` is not a valid API schema enum value", value),
            ));
        }
        sdl.push_str(&format!("  {}\n", value));
    }
    sdl.push_str("}\n");
    Ok(sdl)
}

fn print_type(decl: &TypeDecl, catalog: &SchemaCatalog, docs: bool) -> String {
    let mut sdl = String::new();
    if docs {
        if let Some(desc) = &decl.description {
            sdl.push_str(&description("", desc));
        }
    }

    let keyword = match decl.kind {
        DeclKind::Object => "type",
        DeclKind::Input => "input",
    };
    sdl.push_str(&format!("{} {} {{\n", keyword, decl.name));
    for field in &decl.fields {
        if docs {
            if let Some(desc) = &field.description {
                sdl.push_str(&description("  ", desc));
            }
        }
        sdl.push_str(&format!(
            "  {}: {}\n",
            field.name,
            field_type(field, decl.kind, catalog)
        ));
    }
    sdl.push_str("}\n");
    sdl
}

fn print_root(type_name: &str, operations: &[&OperationDecl]) -> String {
    let mut sdl = format!("type {} {{\n", type_name);
    for op in operations {
        sdl.push_str(&format!(
            "  {}(input: {}!): {}\n",
            op.name, op.input_type, op.result_type
        ));
    }
    sdl.push_str("}\n");
    sdl
}

fn description(indent: &str, text: &str) -> String {
    let text = text.trim().replace("\"\"\"", "\\\"\"\"");
    if text.contains('\n') {
        let body: String = text
            .lines()
            .map(|l| format!("{}{}\n", indent, l.trim_end()))
            .collect();
        format!("{0}\"\"\"\n{1}{0}\"\"\"\n", indent, body)
    } else {
        format!("{}\"\"\"{}\"\"\"\n", indent, text)
    }
}

fn field_type(field: &FieldDecl, kind: DeclKind, catalog: &SchemaCatalog) -> String {
    let base = match (&field.ty, kind) {
        (FieldType::Integer, _) => Surface::ApiSchema.integer().to_string(),
        (FieldType::Attribute(attr), DeclKind::Input) => input_type(attr, catalog),
        (FieldType::Attribute(attr), DeclKind::Object) => map_type(Surface::ApiSchema, attr),
    };
    if field.required {
        format!("{}!", base)
    } else {
        base
    }
}

/// Input types may only reference other input types
fn input_type(kind: &AttributeKind, catalog: &SchemaCatalog) -> String {
    match kind {
        AttributeKind::Reference(name) => input_reference(name, catalog),
        AttributeKind::ReferenceArray(name) => format!("[{}]", input_reference(name, catalog)),
        other => map_type(Surface::ApiSchema, other),
    }
}

fn input_reference(name: &str, catalog: &SchemaCatalog) -> String {
    match catalog.entity(name) {
        Some(Entity::Type(_)) => naming::input_variant_name(name),
        Some(Entity::Table(_)) => Surface::ApiSchema
            .scalar(crate::ir::ScalarType::Object)
            .to_string(),
        None => name.to_string(),
    }
}

/// Selection set of every field of `entity`, expanding catalog references.
///
/// A reference back to a type already on the current path is left out, since
/// expanding it would never terminate.
pub(crate) fn selection_set(catalog: &SchemaCatalog, entity: &str, indent: usize) -> String {
    let mut out = String::new();
    let mut path = Vec::new();
    write_selection(catalog, entity, indent, &mut path, &mut out);
    out
}

fn write_selection<'a>(
    catalog: &'a SchemaCatalog,
    name: &str,
    indent: usize,
    path: &mut Vec<&'a str>,
    out: &mut String,
) {
    let Some(entity) = catalog.entity(name) else {
        return;
    };
    path.push(entity.name());
    let pad = " ".repeat(indent);

    for attr in entity.attributes() {
        match attr.kind.referenced_type().and_then(|t| catalog.entity(t)) {
            Some(target) => {
                if path.contains(&target.name()) {
                    continue;
                }
                let mut nested = String::new();
                write_selection(catalog, target.name(), indent + 2, path, &mut nested);
                if !nested.is_empty() {
                    out.push_str(&format!("{}{} {{\n{}{}}}\n", pad, attr.name, nested, pad));
                }
            }
            None => out.push_str(&format!("{}{}\n", pad, attr.name)),
        }
    }

    path.pop();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::build_catalog;
    use crate::parser::parse_document;
    use chrono::{TimeZone, Utc};
    use std::path::Path;

    const WIDGETS: &str = r#"
name: Widgets
kind: table
version: 1
model:
  keys:
    primary:
      partition: widgetId
    secondary:
      - name: status-index
        partition: status
        sort: createdAt
  attributes:
    - name: widgetId
      type: string
      required: true
    - name: status
      type: string
    - name: createdAt
      type: timestamp
    - name: shipping
      type: Address
    - name: parts
      type: array<Part>
"#;

    const ADDRESS: &str = "name: Address\nkind: static\nattributes:\n  - name: street\n    type: string\n";

    const PART: &str = "name: Part\nkind: graphql\nattributes:\n  - name: label\n    type: string\n  - name: parent\n    type: Part\n";

    fn catalog() -> SchemaCatalog {
        let docs = [("Widgets.yml", WIDGETS), ("Address.yml", ADDRESS), ("Part.yml", PART)]
            .iter()
            .map(|(f, s)| parse_document(Path::new(f), s).unwrap())
            .collect::<Vec<_>>();
        build_catalog(&docs, &[]).unwrap()
    }

    fn schema() -> String {
        let config = GeneratorConfig {
            generated_at: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            ..GeneratorConfig::default()
        };
        let generator = GraphqlGenerator::new(config, "out");
        let mut registry = EmissionRegistry::new();
        let output = generator.generate(&catalog(), &mut registry).unwrap();
        output.get(SCHEMA_FILE).unwrap().to_string()
    }

    #[test]
    fn header_carries_timestamp() {
        assert!(schema().starts_with(
            "# Generated by tessera. Do not edit.\n# Generated at 2023-11-14T22:13:20Z\n"
        ));
    }

    #[test]
    fn inputs_reference_input_variants() {
        let sdl = schema();
        assert!(sdl.contains("input AddressInput {"));
        assert!(sdl.contains("input PartInput {"));
        assert!(sdl.contains("input CreateWidgetsInput {\n"));
        assert!(sdl.contains("  shipping: AddressInput\n  parts: [PartInput]\n}"));
        assert!(sdl.contains("type Widgets {"));
        assert!(sdl.contains("  shipping: Address\n  parts: [Part]\n}"));
    }

    #[test]
    fn every_symbol_is_declared_once() {
        let sdl = schema();
        for decl in ["type Address {", "input AddressInput {", "type Part {", "type Widgets {"] {
            assert_eq!(sdl.matches(decl).count(), 1, "{}", decl);
        }
    }

    #[test]
    fn root_types_list_operations() {
        let sdl = schema();
        assert!(sdl.contains(
            "  queryWidgetsByStatus(input: WidgetsQueryByStatusInput!): WidgetsListResponse\n"
        ));
        assert!(sdl.contains("  createWidgets(input: CreateWidgetsInput!): WidgetsResponse\n"));
        assert!(sdl.contains("schema {\n  query: Query\n  mutation: Mutation\n}\n"));
    }

    #[test]
    fn no_tables_means_no_root_types() {
        let docs = vec![parse_document(Path::new("Address.yml"), ADDRESS).unwrap()];
        let catalog = build_catalog(&docs, &[]).unwrap();
        let generator = GraphqlGenerator::new(GeneratorConfig::default(), "out");
        let mut registry = EmissionRegistry::new();
        let output = generator.generate(&catalog, &mut registry).unwrap();
        let sdl = output.get(SCHEMA_FILE).unwrap();
        assert!(!sdl.contains("type Query"));
        assert!(!sdl.contains("schema {"));
        // static types only appear when referenced
        assert!(!sdl.contains("type Address"));
    }

    #[test]
    fn selection_set_skips_cycles() {
        let selection = selection_set(&catalog(), "Widgets", 2);
        assert!(selection.contains("  shipping {\n    street\n  }\n"));
        assert!(selection.contains("  parts {\n    label\n  }\n"));
        assert!(!selection.contains("parent"));
    }

    #[test]
    fn reserved_enum_values_are_rejected() {
        let definition = EnumDefinition {
            name: "Flag".into(),
            values: vec!["true".into()],
        };
        assert!(print_enum(&definition).is_err());
    }
}
