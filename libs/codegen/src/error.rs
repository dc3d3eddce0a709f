//! Error types for the schema code generator

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Validation rule a schema document can violate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    /// The document could not be parsed as YAML/JSON at all.
    Parse,
    /// A required field is absent or empty.
    MissingField,
    /// `kind` is not one of `table`, `graphql`, `static`.
    UnknownKind,
    /// The file stem differs from the declared `name`.
    FilenameMismatch,
    /// Entity names must be PascalCase.
    EntityName,
    /// Attribute names must be camelCase.
    CamelCase,
    /// Secondary index names must be kebab-case.
    KebabCase,
    /// The attribute `type` expression is malformed.
    AttributeType,
    DuplicateAttribute,
    DuplicateIndex,
    /// Two documents declare the same entity name.
    DuplicateEntity,
    /// A key or projection names an attribute that is not declared.
    UnknownKeyAttribute,
    /// A key attribute does not map to a storage key scalar.
    KeyType,
    /// `INCLUDE` projection without a non-empty `projectedAttributes`.
    ProjectionInclude,
    /// A local index does not share the table partition key or lacks a sort key.
    LocalIndex,
    /// An enum has no values or malformed values.
    EnumValues,
    /// The same enum name is declared with different value lists.
    EnumConflict,
}

impl Rule {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rule::Parse => "parse",
            Rule::MissingField => "missing-field",
            Rule::UnknownKind => "unknown-kind",
            Rule::FilenameMismatch => "filename-mismatch",
            Rule::EntityName => "entity-name",
            Rule::CamelCase => "camel-case",
            Rule::KebabCase => "kebab-case",
            Rule::AttributeType => "attribute-type",
            Rule::DuplicateAttribute => "duplicate-attribute",
            Rule::DuplicateIndex => "duplicate-index",
            Rule::DuplicateEntity => "duplicate-entity",
            Rule::UnknownKeyAttribute => "unknown-key-attribute",
            Rule::KeyType => "key-type",
            Rule::ProjectionInclude => "projection-include",
            Rule::LocalIndex => "local-index",
            Rule::EnumValues => "enum-values",
            Rule::EnumConflict => "enum-conflict",
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Schema validation error in {}: field `{field}` violates rule `{rule}`: {message}", file.display())]
    SchemaValidation {
        file: PathBuf,
        field: String,
        rule: Rule,
        message: String,
    },

    #[error("Rendering error for {entity}: {message}")]
    Render { entity: String, message: String },

    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn validation(
        file: impl Into<PathBuf>,
        field: impl Into<String>,
        rule: Rule,
        message: impl Into<String>,
    ) -> Self {
        Error::SchemaValidation {
            file: file.into(),
            field: field.into(),
            rule,
            message: message.into(),
        }
    }

    pub(crate) fn render(entity: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Render {
            entity: entity.into(),
            message: message.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// The validation rule, when this is a schema validation failure.
    pub fn rule(&self) -> Option<Rule> {
        match self {
            Error::SchemaValidation { rule, .. } => Some(*rule),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
