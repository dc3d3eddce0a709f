//! Intermediate Representation (IR)
//!
//! Typed, target-neutral representation of validated schema documents. This IR
//! is the bridge between the loader and every emitter; it is rebuilt from
//! source documents on every run and never persisted.

mod build;

pub use build::build_catalog;

use std::collections::BTreeMap;
use std::fmt;

/// Logical scalar vocabulary shared by every type-mapping table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScalarType {
    String,
    Number,
    Boolean,
    Array,
    Object,
    Timestamp,
    Map,
    Set,
    Binary,
    Null,
}

impl ScalarType {
    pub const ALL: [ScalarType; 10] = [
        ScalarType::String,
        ScalarType::Number,
        ScalarType::Boolean,
        ScalarType::Array,
        ScalarType::Object,
        ScalarType::Timestamp,
        ScalarType::Map,
        ScalarType::Set,
        ScalarType::Binary,
        ScalarType::Null,
    ];

    pub fn parse(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == token)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScalarType::String => "string",
            ScalarType::Number => "number",
            ScalarType::Boolean => "boolean",
            ScalarType::Array => "array",
            ScalarType::Object => "object",
            ScalarType::Timestamp => "timestamp",
            ScalarType::Map => "map",
            ScalarType::Set => "set",
            ScalarType::Binary => "binary",
            ScalarType::Null => "null",
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shape of an attribute, handled exhaustively by every emitter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeKind {
    Scalar(ScalarType),
    /// Declared enum name plus its value list, verbatim
    Enum { name: String, values: Vec<String> },
    /// `array<string>` and friends
    ScalarArray(ScalarType),
    /// `array<Address>`
    ReferenceArray(String),
    /// Another generated type, or an opaque type name passed through
    Reference(String),
}

impl AttributeKind {
    /// Parse a logical type expression (`string`, `Address`, `array<X>`).
    ///
    /// Enum-typed attributes are not expressed through this syntax; they are
    /// built from `enumType`/`enumValues`.
    pub fn parse(expr: &str) -> Option<Self> {
        let expr = expr.trim();
        if let Some(inner) = expr
            .strip_prefix("array<")
            .and_then(|rest| rest.strip_suffix('>'))
        {
            let inner = inner.trim();
            return match ScalarType::parse(inner) {
                Some(scalar) => Some(AttributeKind::ScalarArray(scalar)),
                None if is_type_name(inner) => Some(AttributeKind::ReferenceArray(inner.to_string())),
                None => None,
            };
        }

        match ScalarType::parse(expr) {
            Some(scalar) => Some(AttributeKind::Scalar(scalar)),
            None if is_type_name(expr) => Some(AttributeKind::Reference(expr.to_string())),
            None => None,
        }
    }

    /// Name of the referenced type, for reference and array-of-reference kinds
    pub fn referenced_type(&self) -> Option<&str> {
        match self {
            AttributeKind::Reference(name) | AttributeKind::ReferenceArray(name) => Some(name),
            _ => None,
        }
    }

    pub fn enum_name(&self) -> Option<&str> {
        match self {
            AttributeKind::Enum { name, .. } => Some(name),
            _ => None,
        }
    }
}

/// Referenced types are entities or enums, whose names are PascalCase
fn is_type_name(token: &str) -> bool {
    let mut chars = token.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_uppercase()) && chars.all(|c| c.is_ascii_alphanumeric())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Canonical camelCase identifier
    pub name: String,
    pub kind: AttributeKind,
    pub required: bool,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    Global,
    Local,
}

impl IndexKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexKind::Global => "GSI",
            IndexKind::Local => "LSI",
        }
    }
}

/// How much of an entity a secondary index carries
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    All,
    KeysOnly,
    /// Non-empty list of extra attributes
    Include(Vec<String>),
}

impl Projection {
    pub fn projection_type(&self) -> &'static str {
        match self {
            Projection::All => "ALL",
            Projection::KeysOnly => "KEYS_ONLY",
            Projection::Include(_) => "INCLUDE",
        }
    }

    pub fn projected_attributes(&self) -> &[String] {
        match self {
            Projection::Include(attrs) => attrs,
            _ => &[],
        }
    }
}

/// Sort key of a table or index. `None` is an explicit sentinel, not an absent value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortKey {
    None,
    Attribute(String),
}

impl SortKey {
    pub fn from_option(value: Option<String>) -> Self {
        value.map(SortKey::Attribute).unwrap_or(SortKey::None)
    }

    pub fn attribute(&self) -> Option<&str> {
        match self {
            SortKey::None => None,
            SortKey::Attribute(name) => Some(name),
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, SortKey::Attribute(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaIndex {
    pub kind: IndexKind,
    /// kebab-case index name
    pub name: String,
    pub partition_attr: String,
    pub sort_attr: SortKey,
    pub projection: Projection,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub name: String,
    pub version: String,
    pub description: Option<String>,
    pub attributes: Vec<Attribute>,
    pub partition_key: String,
    pub sort_key: SortKey,
    pub indexes: Vec<SchemaIndex>,
}

/// One way of reading a table: a query-input type and the operation that answers it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryKey {
    /// Attributes the query requires
    pub required: Vec<String>,
    /// Index sort attribute that may narrow the query
    pub optional: Option<String>,
    /// Index answering the query, `None` for the primary key
    pub index: Option<String>,
}

impl TableSchema {
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Primary key attribute names, partition first
    pub fn primary_key(&self) -> Vec<&str> {
        let mut keys = vec![self.partition_key.as_str()];
        if let Some(sort) = self.sort_key.attribute() {
            keys.push(sort);
        }
        keys
    }

    /// Union of every attribute named by the primary key or any index, in first-seen order
    pub fn key_attributes(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        let candidates = self.primary_key().into_iter().chain(self.indexes.iter().flat_map(|idx| {
            std::iter::once(idx.partition_attr.as_str()).chain(idx.sort_attr.attribute())
        }));
        for name in candidates {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    /// Query keys in emission order: primary partition, primary sort, primary
    /// pair, then one per secondary index partition.
    pub fn query_keys(&self) -> Vec<QueryKey> {
        let mut keys = vec![QueryKey {
            required: vec![self.partition_key.clone()],
            optional: None,
            index: None,
        }];

        if let Some(sort) = self.sort_key.attribute() {
            keys.push(QueryKey {
                required: vec![sort.to_string()],
                optional: None,
                index: None,
            });
            keys.push(QueryKey {
                required: vec![self.partition_key.clone(), sort.to_string()],
                optional: None,
                index: None,
            });
        }

        for idx in &self.indexes {
            keys.push(QueryKey {
                required: vec![idx.partition_attr.clone()],
                optional: idx.sort_attr.attribute().map(str::to_string),
                index: Some(idx.name.clone()),
            });
        }

        keys
    }
}

/// Where a non-table type came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeOrigin {
    /// `graphql` document: always part of the API schema
    Api,
    /// `static` document: a value type, in the API schema only when referenced
    Static,
}

/// Non-table type: no keys, no indexes, no operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphQLType {
    pub name: String,
    pub description: Option<String>,
    pub attributes: Vec<Attribute>,
    pub origin: TypeOrigin,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDefinition {
    pub name: String,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entity {
    Table(TableSchema),
    Type(GraphQLType),
}

impl Entity {
    pub fn name(&self) -> &str {
        match self {
            Entity::Table(t) => &t.name,
            Entity::Type(t) => &t.name,
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            Entity::Table(t) => t.description.as_deref(),
            Entity::Type(t) => t.description.as_deref(),
        }
    }

    pub fn attributes(&self) -> &[Attribute] {
        match self {
            Entity::Table(t) => &t.attributes,
            Entity::Type(t) => &t.attributes,
        }
    }

    pub fn as_table(&self) -> Option<&TableSchema> {
        match self {
            Entity::Table(t) => Some(t),
            Entity::Type(_) => None,
        }
    }

    /// Whether the entity belongs in the API schema on its own account
    pub fn is_api_visible(&self) -> bool {
        match self {
            Entity::Table(_) => true,
            Entity::Type(t) => t.origin == TypeOrigin::Api,
        }
    }
}

/// All IR objects of one run, ordered by name
#[derive(Debug, Clone, Default)]
pub struct SchemaCatalog {
    entities: BTreeMap<String, Entity>,
    enums: BTreeMap<String, EnumDefinition>,
}

impl SchemaCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert_entity(&mut self, entity: Entity) {
        self.entities.insert(entity.name().to_string(), entity);
    }

    pub(crate) fn insert_enum(&mut self, definition: EnumDefinition) {
        self.enums.insert(definition.name.clone(), definition);
    }

    pub fn entity(&self, name: &str) -> Option<&Entity> {
        self.entities.get(name)
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn tables(&self) -> impl Iterator<Item = &TableSchema> {
        self.entities.values().filter_map(Entity::as_table)
    }

    pub fn enums(&self) -> impl Iterator<Item = &EnumDefinition> {
        self.enums.values()
    }

    pub fn get_enum(&self, name: &str) -> Option<&EnumDefinition> {
        self.enums.get(name)
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn enum_count(&self) -> usize {
        self.enums.len()
    }

    /// Catalog entities an entity references directly, sorted and deduplicated
    pub fn dependencies(&self, entity: &Entity) -> Vec<&Entity> {
        let mut names: Vec<&str> = entity
            .attributes()
            .iter()
            .filter_map(|a| a.kind.referenced_type())
            .filter(|name| *name != entity.name())
            .collect();
        names.sort_unstable();
        names.dedup();
        names.into_iter().filter_map(|n| self.entity(n)).collect()
    }

    /// Enum names an entity's attributes use, sorted and deduplicated
    pub fn enum_dependencies<'a>(&self, entity: &'a Entity) -> Vec<&'a str> {
        let mut names: Vec<&str> = entity
            .attributes()
            .iter()
            .filter_map(|a| a.kind.enum_name())
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }
}
