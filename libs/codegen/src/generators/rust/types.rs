//! Struct and enum generation for Rust models

use crate::error::{Error, Result};
use crate::generators::fragments::{FieldDecl, FieldType, TypeDecl};
use crate::generators::GeneratorConfig;
use crate::ir::{AttributeKind, EnumDefinition};
use crate::naming::{is_rust_keyword, rust_field_name, to_pascal_case};
use crate::types::{map_type, Surface};

/// Generate a Rust struct for a type declaration
pub fn generate_struct(decl: &TypeDecl, config: &GeneratorConfig) -> String {
    let mut code = String::new();

    if config.generate_docs {
        if let Some(desc) = &decl.description {
            push_doc(&mut code, "", desc);
        } else {
            code.push_str(&format!("/// {}\n", decl.name));
        }
    }

    code.push_str("#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]\n");
    code.push_str("#[serde(rename_all = \"camelCase\")]\n");
    code.push_str(&format!("pub struct {} {{\n", decl.name));

    for field in &decl.fields {
        code.push_str(&generate_field(field, &decl.name, config));
    }

    code.push('}');

    code
}

/// Generate a field for a declaration
fn generate_field(field: &FieldDecl, owner: &str, config: &GeneratorConfig) -> String {
    let mut code = String::new();

    if config.generate_docs {
        if let Some(desc) = &field.description {
            push_doc(&mut code, "    ", desc);
        }
    }

    if !field.required {
        code.push_str("    #[serde(default, skip_serializing_if = \"Option::is_none\")]\n");
    }

    let field_name = rust_field_name(&field.name);
    if serde_camel_case(&field_name) != field.name {
        code.push_str(&format!("    #[serde(rename = \"{}\")]\n", field.name));
    }

    let field_type = generate_field_type(field, owner);
    code.push_str(&format!("    pub {}: {},\n", field_name, field_type));

    code
}

/// Generate the Rust type for a field
fn generate_field_type(field: &FieldDecl, owner: &str) -> String {
    let base_type = match &field.ty {
        FieldType::Integer => Surface::HostModel.integer().to_string(),
        // a struct cannot contain itself by value
        FieldType::Attribute(AttributeKind::Reference(name)) if name == owner => {
            format!("Box<{}>", name)
        }
        FieldType::Attribute(kind) => map_type(Surface::HostModel, kind),
    };

    if field.required {
        base_type
    } else {
        format!("Option<{}>", base_type)
    }
}

/// Generate a unit-variant enum whose wire values are the declared values, in order
pub fn generate_enum(definition: &EnumDefinition, config: &GeneratorConfig) -> Result<String> {
    let variants = variant_names(definition)?;
    let mut code = String::new();

    if config.generate_docs {
        code.push_str(&format!("/// {}\n", definition.name));
    }
    code.push_str("#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]\n");
    code.push_str(&format!("pub enum {} {{\n", definition.name));
    for (value, variant) in definition.values.iter().zip(&variants) {
        code.push_str(&format!("    #[serde(rename = \"{}\")]\n", value));
        code.push_str(&format!("    {},\n", variant));
    }
    code.push_str("}\n\n");

    code.push_str(&format!("impl {} {{\n", definition.name));
    code.push_str(&format!(
        "    pub const ALL: [{}; {}] = [\n",
        definition.name,
        variants.len()
    ));
    for variant in &variants {
        code.push_str(&format!("        {}::{},\n", definition.name, variant));
    }
    code.push_str("    ];\n\n");

    code.push_str("    pub fn as_str(&self) -> &'static str {\n");
    code.push_str("        match self {\n");
    for (value, variant) in definition.values.iter().zip(&variants) {
        code.push_str(&format!(
            "            {}::{} => \"{}\",\n",
            definition.name, variant, value
        ));
    }
    code.push_str("        }\n");
    code.push_str("    }\n");
    code.push('}');

    Ok(code)
}

fn variant_names(definition: &EnumDefinition) -> Result<Vec<String>> {
    let mut variants: Vec<String> = Vec::with_capacity(definition.values.len());
    for value in &definition.values {
        let mut variant = to_pascal_case(value);
        if variant.is_empty() || variant.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(Error::render(
                &definition.name,
                format!("enum value `{}` has no valid Rust variant name", value),
            ));
        }
        if is_rust_keyword(&variant) {
            variant.push('_');
        }
        if variants.contains(&variant) {
            return Err(Error::render(
                &definition.name,
                format!(
                    "enum values collide on Rust variant `{}` (from `{}`)",
                    variant, value
                ),
            ));
        }
        variants.push(variant);
    }
    Ok(variants)
}

fn push_doc(code: &mut String, indent: &str, text: &str) {
    for line in text.lines() {
        if line.trim().is_empty() {
            code.push_str(&format!("{}///\n", indent));
        } else {
            code.push_str(&format!("{}/// {}\n", indent, line.trim_end()));
        }
    }
}

/// Field name as serde's `rename_all = "camelCase"` would spell it
fn serde_camel_case(field_name: &str) -> String {
    let raw = field_name.strip_prefix("r#").unwrap_or(field_name);
    let mut out = String::with_capacity(raw.len());
    let mut capitalize = false;
    for c in raw.chars() {
        if c == '_' {
            capitalize = true;
        } else if capitalize {
            out.push(c.to_ascii_uppercase());
            capitalize = false;
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::fragments::DeclKind;
    use crate::ir::ScalarType;

    fn decl(fields: Vec<FieldDecl>) -> TypeDecl {
        TypeDecl {
            name: "Node".into(),
            kind: DeclKind::Object,
            description: Some("A tree node".into()),
            fields,
        }
    }

    fn field(name: &str, ty: FieldType, required: bool) -> FieldDecl {
        FieldDecl {
            name: name.into(),
            ty,
            required,
            description: None,
        }
    }

    #[test]
    fn optional_fields_are_wrapped_and_skipped() {
        let code = generate_struct(
            &decl(vec![
                field("nodeId", FieldType::Attribute(AttributeKind::Scalar(ScalarType::String)), true),
                field("weight", FieldType::Attribute(AttributeKind::Scalar(ScalarType::Number)), false),
            ]),
            &GeneratorConfig::default(),
        );
        assert!(code.contains("/// A tree node\n"));
        assert!(code.contains("    pub node_id: String,\n"));
        assert!(code.contains("    pub weight: Option<f64>,\n"));
        assert!(code.contains("skip_serializing_if = \"Option::is_none\""));
    }

    #[test]
    fn self_reference_is_boxed() {
        let code = generate_struct(
            &decl(vec![field(
                "parent",
                FieldType::Attribute(AttributeKind::Reference("Node".into())),
                false,
            )]),
            &GeneratorConfig::default(),
        );
        assert!(code.contains("pub parent: Option<Box<Node>>,"));
    }

    #[test]
    fn keyword_and_acronym_fields_are_renamed() {
        let string = || FieldType::Attribute(AttributeKind::Scalar(ScalarType::String));
        let code = generate_struct(
            &decl(vec![field("type", string(), true), field("userID", string(), true)]),
            &GeneratorConfig::default(),
        );
        assert!(code.contains("    pub r#type: String,\n"));
        assert!(code.contains("#[serde(rename = \"userID\")]\n    pub user_id: String,"));
        assert!(!code.contains("rename = \"type\""));
    }

    #[test]
    fn enum_keeps_wire_values_in_order() {
        let definition = EnumDefinition {
            name: "UserStatus".into(),
            values: vec!["ACTIVE".into(), "INACTIVE".into()],
        };
        let code = generate_enum(&definition, &GeneratorConfig::default()).unwrap();
        let active = code.find("rename = \"ACTIVE\"").unwrap();
        let inactive = code.find("rename = \"INACTIVE\"").unwrap();
        assert!(active < inactive);
        assert!(code.contains("    Active,\n"));
        assert!(code.contains("pub const ALL: [UserStatus; 2]"));
    }

    #[test]
    fn colliding_variants_are_a_render_error() {
        let definition = EnumDefinition {
            name: "Mode".into(),
            values: vec!["ACTIVE".into(), "active".into()],
        };
        assert!(matches!(
            generate_enum(&definition, &GeneratorConfig::default()),
            Err(Error::Render { .. })
        ));
    }

    #[test]
    fn serde_camel_case_matches_rename_all() {
        assert_eq!(serde_camel_case("address2_line"), "address2Line");
        assert_eq!(serde_camel_case("r#type"), "type");
        assert_eq!(serde_camel_case("user_id"), "userId");
    }
}
