//! Raw and validated schema document shapes

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::ir::{AttributeKind, IndexKind, Projection};

// Raw shapes mirror the on-disk format. Every field is optional so that a
// missing field is reported by the validator with its own rule instead of a
// generic deserialization message.

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawDocument {
    pub name: Option<String>,
    pub kind: Option<String>,
    pub version: Option<serde_yaml::Value>,
    pub description: Option<String>,
    pub model: Option<RawModel>,
    pub attributes: Option<Vec<RawAttribute>>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawModel {
    pub keys: Option<RawKeys>,
    pub attributes: Option<Vec<RawAttribute>>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawKeys {
    pub primary: Option<RawPrimaryKey>,
    #[serde(alias = "secondaryIndexes", alias = "secondary_indexes")]
    pub secondary: Option<Vec<RawIndex>>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawPrimaryKey {
    pub partition: Option<String>,
    pub sort: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawIndex {
    pub name: Option<String>,
    pub kind: Option<String>,
    pub partition: Option<String>,
    pub sort: Option<String>,
    pub projection_type: Option<String>,
    pub projected_attributes: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawAttribute {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub type_: Option<String>,
    #[serde(default)]
    pub required: bool,
    pub description: Option<String>,
    pub enum_type: Option<String>,
    pub enum_values: Option<Vec<String>>,
}

/// Enum catalog document: enum name → ordered values
pub(crate) type RawEnumCatalog = BTreeMap<String, Vec<String>>;

/// A document that passed every loader rule
#[derive(Debug, Clone)]
pub struct SchemaDocument {
    pub path: PathBuf,
    pub name: String,
    pub description: Option<String>,
    pub body: DocumentBody,
}

#[derive(Debug, Clone)]
pub enum DocumentBody {
    Table(TableDocument),
    Graphql { attributes: Vec<AttributeDocument> },
    Static { attributes: Vec<AttributeDocument> },
}

#[derive(Debug, Clone)]
pub struct TableDocument {
    pub version: String,
    pub partition: String,
    pub sort: Option<String>,
    /// `None` when the document declares no secondary indexes at all
    pub indexes: Option<Vec<IndexDocument>>,
    pub attributes: Vec<AttributeDocument>,
}

#[derive(Debug, Clone)]
pub struct AttributeDocument {
    pub name: String,
    /// Parsed type; enum attributes carry an empty value list until the
    /// catalog is assembled
    pub kind: AttributeKind,
    pub required: bool,
    pub description: Option<String>,
    /// Inline `enumValues`, when declared
    pub enum_values: Option<Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct IndexDocument {
    pub name: String,
    pub kind: IndexKind,
    pub partition: String,
    pub sort: Option<String>,
    pub projection: Projection,
}

/// One entry of the enum catalog document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDocument {
    pub path: PathBuf,
    pub name: String,
    pub values: Vec<String>,
}
