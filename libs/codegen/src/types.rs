//! Type mapping tables, one per output surface
//!
//! Unknown tokens are not coerced uniformly: the storage surface falls back to
//! its generic scalar, while the model and API surfaces pass the token through
//! as a reference to another generated type.

use crate::ir::{AttributeKind, ScalarType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Surface {
    /// Typed host-language (Rust) model
    HostModel,
    /// Typed client-language (TypeScript) model and operations
    ClientModel,
    /// Storage attribute types of the key-value store
    Storage,
    /// Combined API schema (GraphQL SDL)
    ApiSchema,
}

impl Surface {
    pub fn label(&self) -> &'static str {
        match self {
            Surface::HostModel => "host model",
            Surface::ClientModel => "client model",
            Surface::Storage => "storage",
            Surface::ApiSchema => "API schema",
        }
    }

    /// Lookup table for the logical scalar vocabulary
    pub fn scalar(&self, scalar: ScalarType) -> &'static str {
        match self {
            Surface::HostModel => match scalar {
                ScalarType::String => "String",
                ScalarType::Number => "f64",
                ScalarType::Boolean => "bool",
                ScalarType::Array => "Vec<serde_json::Value>",
                ScalarType::Object => "serde_json::Value",
                ScalarType::Timestamp => "String",
                ScalarType::Map => "std::collections::HashMap<String, serde_json::Value>",
                ScalarType::Set => "Vec<String>",
                ScalarType::Binary => "Vec<u8>",
                ScalarType::Null => "()",
            },
            Surface::ClientModel => match scalar {
                ScalarType::String => "string",
                ScalarType::Number => "number",
                ScalarType::Boolean => "boolean",
                ScalarType::Array => "unknown[]",
                ScalarType::Object => "Record<string, unknown>",
                ScalarType::Timestamp => "string",
                ScalarType::Map => "Record<string, unknown>",
                ScalarType::Set => "string[]",
                ScalarType::Binary => "string",
                ScalarType::Null => "null",
            },
            Surface::Storage => match scalar {
                ScalarType::String => "S",
                ScalarType::Number => "N",
                ScalarType::Boolean => "BOOL",
                ScalarType::Array => "L",
                ScalarType::Object => "M",
                ScalarType::Timestamp => "S",
                ScalarType::Map => "M",
                ScalarType::Set => "SS",
                ScalarType::Binary => "B",
                ScalarType::Null => "NULL",
            },
            Surface::ApiSchema => match scalar {
                ScalarType::String => "String",
                ScalarType::Number => "Float",
                ScalarType::Boolean => "Boolean",
                ScalarType::Array => "[AWSJSON]",
                ScalarType::Object => "AWSJSON",
                ScalarType::Timestamp => "AWSDateTime",
                ScalarType::Map => "AWSJSON",
                ScalarType::Set => "[String]",
                ScalarType::Binary => "String",
                ScalarType::Null => "String",
            },
        }
    }

    /// Integer type used for envelope status codes. Storage has no integer
    /// attribute type, so it stores them as its number scalar.
    pub fn integer(&self) -> &'static str {
        match self {
            Surface::HostModel => "i32",
            Surface::ClientModel => "number",
            Surface::Storage => self.scalar(ScalarType::Number),
            Surface::ApiSchema => "Int",
        }
    }

    fn list_of(&self, element: &str) -> String {
        match self {
            Surface::HostModel => format!("Vec<{}>", element),
            Surface::ClientModel => {
                if element.contains(|c: char| c == '<' || c == '|' || c == ' ') {
                    format!("Array<{}>", element)
                } else {
                    format!("{}[]", element)
                }
            }
            Surface::Storage => "L".to_string(),
            Surface::ApiSchema => format!("[{}]", element),
        }
    }

    /// Unrecognized token: generic scalar for storage, passthrough elsewhere
    fn unknown(&self, token: &str) -> String {
        match self {
            Surface::Storage => self.scalar(ScalarType::String).to_string(),
            _ => token.to_string(),
        }
    }
}

/// Map an attribute kind to a surface type. Array element types resolve first, then wrap.
pub fn map_type(surface: Surface, kind: &AttributeKind) -> String {
    match kind {
        AttributeKind::Scalar(scalar) => surface.scalar(*scalar).to_string(),
        AttributeKind::Enum { name, .. } => match surface {
            Surface::Storage => surface.scalar(ScalarType::String).to_string(),
            _ => name.clone(),
        },
        AttributeKind::ScalarArray(scalar) => surface.list_of(surface.scalar(*scalar)),
        AttributeKind::ReferenceArray(name) => surface.list_of(&surface.unknown(name)),
        AttributeKind::Reference(name) => surface.unknown(name),
    }
}

/// Storage key scalar (`S`, `N`, `B`) for an attribute, if it can be a key at all
pub fn storage_key_type(kind: &AttributeKind) -> Option<&'static str> {
    match kind {
        AttributeKind::Scalar(ScalarType::String | ScalarType::Timestamp) => Some("S"),
        AttributeKind::Scalar(ScalarType::Number) => Some("N"),
        AttributeKind::Scalar(ScalarType::Binary) => Some("B"),
        AttributeKind::Enum { .. } => Some("S"),
        _ => None,
    }
}
