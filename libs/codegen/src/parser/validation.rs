//! Loader rules: turn a raw document into a validated `SchemaDocument`

use regex::Regex;
use std::collections::HashSet;
use std::path::Path;
use std::sync::OnceLock;

use super::document::{
    AttributeDocument, DocumentBody, EnumDocument, IndexDocument, RawAttribute, RawDocument,
    RawEnumCatalog, RawIndex, SchemaDocument, TableDocument,
};
use crate::error::{Error, Result, Rule};
use crate::ir::{AttributeKind, IndexKind, Projection, ScalarType};
use crate::types::{storage_key_type, Surface};

fn camel_case_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z][a-zA-Z0-9]*$").expect("valid regex"))
}

fn kebab_case_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z][a-z0-9]*(-[a-z0-9]+)*$").expect("valid regex"))
}

fn pascal_case_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Z][A-Za-z0-9]*$").expect("valid regex"))
}

fn enum_value_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid regex"))
}

/// Validate one parsed document against every loader rule.
pub(crate) fn validate_document(path: &Path, raw: RawDocument) -> Result<SchemaDocument> {
    let name = require(path, "name", raw.name)?;
    let kind = require(path, "kind", raw.kind)?;

    check_file_name(path, &name)?;

    if !pascal_case_re().is_match(&name) {
        return Err(Error::validation(
            path,
            "name",
            Rule::EntityName,
            format!("entity name `{}` must be PascalCase", name),
        ));
    }

    let body = match kind.as_str() {
        "table" => DocumentBody::Table(validate_table(path, raw.version, raw.model)?),
        "graphql" => DocumentBody::Graphql {
            attributes: validate_attributes(path, "attributes", raw.attributes)?,
        },
        "static" => DocumentBody::Static {
            attributes: validate_attributes(path, "attributes", raw.attributes)?,
        },
        other => {
            return Err(Error::validation(
                path,
                "kind",
                Rule::UnknownKind,
                format!("unknown kind `{}` (expected table, graphql or static)", other),
            ))
        }
    };

    Ok(SchemaDocument {
        path: path.to_path_buf(),
        name,
        description: raw.description,
        body,
    })
}

fn require(path: &Path, field: &str, value: Option<String>) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(Error::validation(
            path,
            field,
            Rule::MissingField,
            format!("`{}` is required", field),
        )),
    }
}

fn check_file_name(path: &Path, name: &str) -> Result<()> {
    let file_name = path
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    if stem != name {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();
        return Err(Error::validation(
            path,
            "name",
            Rule::FilenameMismatch,
            format!(
                "file name `{}` does not match declared name `{}` (expected `{}.{}`)",
                file_name, name, name, ext
            ),
        ));
    }
    Ok(())
}

fn validate_table(
    path: &Path,
    version: Option<serde_yaml::Value>,
    model: Option<super::document::RawModel>,
) -> Result<TableDocument> {
    let version = match version {
        Some(serde_yaml::Value::String(s)) if !s.trim().is_empty() => s,
        Some(serde_yaml::Value::Number(n)) => n.to_string(),
        _ => {
            return Err(Error::validation(
                path,
                "version",
                Rule::MissingField,
                "table documents must declare `version`",
            ))
        }
    };

    let model = model.ok_or_else(|| {
        Error::validation(
            path,
            "model",
            Rule::MissingField,
            "table documents must declare a `model` block",
        )
    })?;

    let keys = model.keys.unwrap_or_default();
    let primary = keys.primary.unwrap_or_default();
    let partition = require(path, "model.keys.primary.partition", primary.partition)?;
    let sort = primary.sort.filter(|s| !s.trim().is_empty());

    let attributes = validate_attributes(path, "model.attributes", model.attributes)?;
    let declared: HashSet<&str> = attributes.iter().map(|a| a.name.as_str()).collect();

    check_key_attribute(path, "model.keys.primary.partition", &partition, &attributes)?;
    if let Some(sort) = &sort {
        check_key_attribute(path, "model.keys.primary.sort", sort, &attributes)?;
    }

    let indexes = match keys.secondary {
        None => None,
        Some(raw_indexes) => {
            let mut seen = HashSet::new();
            let mut indexes = Vec::with_capacity(raw_indexes.len());
            for (i, raw) in raw_indexes.into_iter().enumerate() {
                let field = format!("model.keys.secondary[{}]", i);
                let index = validate_index(path, &field, raw, &partition, &attributes, &declared)?;
                if !seen.insert(index.name.clone()) {
                    return Err(Error::validation(
                        path,
                        format!("{}.name", field),
                        Rule::DuplicateIndex,
                        format!("index name `{}` is declared more than once", index.name),
                    ));
                }
                indexes.push(index);
            }
            Some(indexes)
        }
    };

    Ok(TableDocument {
        version,
        partition,
        sort,
        indexes,
        attributes,
    })
}

fn validate_index(
    path: &Path,
    field: &str,
    raw: RawIndex,
    table_partition: &str,
    attributes: &[AttributeDocument],
    declared: &HashSet<&str>,
) -> Result<IndexDocument> {
    let name = require(path, &format!("{}.name", field), raw.name)?;
    if !kebab_case_re().is_match(&name) {
        return Err(Error::validation(
            path,
            format!("{}.name", field),
            Rule::KebabCase,
            format!("index name `{}` must be kebab-case", name),
        ));
    }

    let kind = match raw.kind.as_deref().unwrap_or("GSI") {
        "GSI" | "gsi" => IndexKind::Global,
        "LSI" | "lsi" => IndexKind::Local,
        other => {
            return Err(Error::validation(
                path,
                format!("{}.kind", field),
                Rule::UnknownKind,
                format!("unknown index kind `{}` (expected GSI or LSI)", other),
            ))
        }
    };

    let partition = require(path, &format!("{}.partition", field), raw.partition)?;
    check_key_attribute(path, &format!("{}.partition", field), &partition, attributes)?;
    let sort = raw.sort.filter(|s| !s.trim().is_empty());
    if let Some(sort) = &sort {
        check_key_attribute(path, &format!("{}.sort", field), sort, attributes)?;
    }

    if kind == IndexKind::Local {
        if partition != table_partition {
            return Err(Error::validation(
                path,
                format!("{}.partition", field),
                Rule::LocalIndex,
                format!(
                    "local index `{}` must use the table partition key `{}`",
                    name, table_partition
                ),
            ));
        }
        if sort.is_none() {
            return Err(Error::validation(
                path,
                format!("{}.sort", field),
                Rule::LocalIndex,
                format!("local index `{}` must declare a sort attribute", name),
            ));
        }
    }

    let projection = match raw.projection_type.as_deref().unwrap_or("ALL") {
        "ALL" => Projection::All,
        "KEYS_ONLY" => Projection::KeysOnly,
        "INCLUDE" => {
            let projected = raw.projected_attributes.unwrap_or_default();
            if projected.is_empty() {
                return Err(Error::validation(
                    path,
                    format!("{}.projectedAttributes", field),
                    Rule::ProjectionInclude,
                    format!(
                        "index `{}` uses INCLUDE projection but lists no projectedAttributes",
                        name
                    ),
                ));
            }
            for attr in &projected {
                if !declared.contains(attr.as_str()) {
                    return Err(Error::validation(
                        path,
                        format!("{}.projectedAttributes", field),
                        Rule::UnknownKeyAttribute,
                        format!("projected attribute `{}` is not declared", attr),
                    ));
                }
            }
            Projection::Include(projected)
        }
        other => {
            return Err(Error::validation(
                path,
                format!("{}.projectionType", field),
                Rule::ProjectionInclude,
                format!(
                    "unknown projection type `{}` (expected ALL, KEYS_ONLY or INCLUDE)",
                    other
                ),
            ))
        }
    };

    Ok(IndexDocument {
        name,
        kind,
        partition,
        sort,
        projection,
    })
}

fn check_key_attribute(
    path: &Path,
    field: &str,
    name: &str,
    attributes: &[AttributeDocument],
) -> Result<()> {
    let attribute = attributes.iter().find(|a| a.name == name).ok_or_else(|| {
        Error::validation(
            path,
            field,
            Rule::UnknownKeyAttribute,
            format!("key attribute `{}` is not declared", name),
        )
    })?;

    if storage_key_type(&attribute.kind).is_none() {
        return Err(Error::validation(
            path,
            field,
            Rule::KeyType,
            format!(
                "key attribute `{}` has type `{}` which cannot be used as a {} key",
                name,
                describe_kind(&attribute.kind),
                Surface::Storage.label()
            ),
        ));
    }
    Ok(())
}

fn describe_kind(kind: &AttributeKind) -> String {
    match kind {
        AttributeKind::Scalar(s) => s.to_string(),
        AttributeKind::Enum { name, .. } => name.clone(),
        AttributeKind::ScalarArray(s) => format!("array<{}>", s),
        AttributeKind::ReferenceArray(r) => format!("array<{}>", r),
        AttributeKind::Reference(r) => r.clone(),
    }
}

fn validate_attributes(
    path: &Path,
    field: &str,
    raw: Option<Vec<RawAttribute>>,
) -> Result<Vec<AttributeDocument>> {
    let raw = raw.ok_or_else(|| {
        Error::validation(
            path,
            field,
            Rule::MissingField,
            format!("`{}` is required", field),
        )
    })?;

    let mut seen = HashSet::new();
    let mut attributes = Vec::with_capacity(raw.len());
    for (i, attr) in raw.into_iter().enumerate() {
        let attr_field = format!("{}[{}]", field, i);
        let name = require(path, &format!("{}.name", attr_field), attr.name)?;
        if !camel_case_re().is_match(&name) {
            return Err(Error::validation(
                path,
                format!("{}.name", attr_field),
                Rule::CamelCase,
                format!("attribute name `{}` must be camelCase", name),
            ));
        }
        if !seen.insert(name.clone()) {
            return Err(Error::validation(
                path,
                format!("{}.name", attr_field),
                Rule::DuplicateAttribute,
                format!("attribute `{}` is declared more than once", name),
            ));
        }

        let kind = match attr.enum_type {
            Some(enum_name) => {
                if !pascal_case_re().is_match(&enum_name) {
                    return Err(Error::validation(
                        path,
                        format!("{}.enumType", attr_field),
                        Rule::EntityName,
                        format!("enum name `{}` must be PascalCase", enum_name),
                    ));
                }
                if let Some(ty) = attr.type_.as_deref() {
                    if ty != ScalarType::String.as_str() {
                        return Err(Error::validation(
                            path,
                            format!("{}.type", attr_field),
                            Rule::AttributeType,
                            format!("enum attribute `{}` must have type `string`, found `{}`", name, ty),
                        ));
                    }
                }
                AttributeKind::Enum {
                    name: enum_name,
                    values: Vec::new(),
                }
            }
            None => {
                let ty = require(path, &format!("{}.type", attr_field), attr.type_)?;
                AttributeKind::parse(&ty).ok_or_else(|| {
                    Error::validation(
                        path,
                        format!("{}.type", attr_field),
                        Rule::AttributeType,
                        format!("`{}` is not a valid attribute type", ty),
                    )
                })?
            }
        };

        if let Some(values) = &attr.enum_values {
            if kind.enum_name().is_none() {
                return Err(Error::validation(
                    path,
                    format!("{}.enumValues", attr_field),
                    Rule::EnumValues,
                    "`enumValues` requires `enumType`",
                ));
            }
            check_enum_values(path, &format!("{}.enumValues", attr_field), values)?;
        }

        attributes.push(AttributeDocument {
            name,
            kind,
            required: attr.required,
            description: attr.description,
            enum_values: attr.enum_values,
        });
    }

    Ok(attributes)
}

fn check_enum_values(path: &Path, field: &str, values: &[String]) -> Result<()> {
    if values.is_empty() {
        return Err(Error::validation(
            path,
            field,
            Rule::EnumValues,
            "enum must declare at least one value",
        ));
    }
    let mut seen = HashSet::new();
    for value in values {
        if !enum_value_re().is_match(value) {
            return Err(Error::validation(
                path,
                field,
                Rule::EnumValues,
                format!("enum value `{}` is not a valid identifier", value),
            ));
        }
        if !seen.insert(value.as_str()) {
            return Err(Error::validation(
                path,
                field,
                Rule::EnumValues,
                format!("enum value `{}` is declared more than once", value),
            ));
        }
    }
    Ok(())
}

/// Validate the enum catalog document.
pub(crate) fn validate_enum_catalog(path: &Path, raw: RawEnumCatalog) -> Result<Vec<EnumDocument>> {
    let mut enums = Vec::with_capacity(raw.len());
    for (name, values) in raw {
        if !pascal_case_re().is_match(&name) {
            return Err(Error::validation(
                path,
                name.clone(),
                Rule::EntityName,
                format!("enum name `{}` must be PascalCase", name),
            ));
        }
        check_enum_values(path, &name, &values)?;
        enums.push(EnumDocument {
            path: path.to_path_buf(),
            name,
            values,
        });
    }
    Ok(enums)
}
