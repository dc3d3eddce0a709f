//! Template fragments and the render engine
//!
//! A fragment turns one IR entity into target-neutral declarations. Fragments
//! hold no state of their own; everything run-scoped lives in the
//! `EmissionRegistry` passed to them. Every fragment that defines a named
//! symbol marks it in the registry first and yields nothing for a duplicate,
//! so fragment order changes only which call site emits a symbol, never the
//! final symbol set. Target printers turn declarations into source text.

use crate::error::{Error, Result};
use crate::generators::registry::{EmissionRegistry, Target};
use crate::ir::{Attribute, AttributeKind, Entity, SchemaCatalog, ScalarType, TableSchema};
use crate::naming;

pub const ENTITY_MODEL: &str = "entity-model";
pub const INPUT_VARIANT: &str = "input-variant";
pub const EMBEDDED_TYPES: &str = "embedded-types";
pub const CRUD_INPUTS: &str = "crud-inputs";
pub const QUERY_INPUTS: &str = "query-inputs";
pub const RESPONSE_ENVELOPES: &str = "response-envelopes";
pub const OPERATIONS: &str = "operations";
pub const MODEL_ARTIFACT: &str = "model-artifact";
pub const API_SCHEMA_ENTITY: &str = "api-schema-entity";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    Attribute(AttributeKind),
    /// Envelope status code
    Integer,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDecl {
    pub name: String,
    pub ty: FieldType,
    pub required: bool,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Object,
    Input,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDecl {
    pub name: String,
    pub kind: DeclKind,
    pub description: Option<String>,
    pub fields: Vec<FieldDecl>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Query,
    Mutation,
}

impl OperationKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            OperationKind::Query => "Query",
            OperationKind::Mutation => "Mutation",
        }
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            OperationKind::Query => "query",
            OperationKind::Mutation => "mutation",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationDecl {
    pub name: String,
    pub kind: OperationKind,
    pub entity: String,
    pub input_type: String,
    pub result_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Declaration {
    Type(TypeDecl),
    Operation(OperationDecl),
}

impl Declaration {
    pub fn name(&self) -> &str {
        match self {
            Declaration::Type(t) => &t.name,
            Declaration::Operation(o) => &o.name,
        }
    }
}

/// Split declarations into types and operations, keeping order
pub fn partition(declarations: Vec<Declaration>) -> (Vec<TypeDecl>, Vec<OperationDecl>) {
    let mut types = Vec::new();
    let mut operations = Vec::new();
    for decl in declarations {
        match decl {
            Declaration::Type(t) => types.push(t),
            Declaration::Operation(o) => operations.push(o),
        }
    }
    (types, operations)
}

/// Everything a fragment is parameterized by besides the registry
#[derive(Debug, Clone, Copy)]
pub struct FragmentScope<'a> {
    pub catalog: &'a SchemaCatalog,
    pub entity: &'a Entity,
    pub target: Target,
}

impl<'a> FragmentScope<'a> {
    pub fn new(catalog: &'a SchemaCatalog, entity: &'a Entity, target: Target) -> Self {
        Self {
            catalog,
            entity,
            target,
        }
    }

    fn with_entity(&self, entity: &'a Entity) -> Self {
        Self { entity, ..*self }
    }
}

type FragmentBody = fn(&FragmentScope<'_>, &mut EmissionRegistry) -> Result<Vec<Declaration>>;

/// A named, reusable unit of emission logic
pub struct TemplateFragment {
    pub name: &'static str,
    pub parameters: &'static [&'static str],
    /// Fragments rendered, in order, before this one's body
    pub dependencies: &'static [&'static str],
    body: FragmentBody,
}

impl std::fmt::Debug for TemplateFragment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateFragment")
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .field("dependencies", &self.dependencies)
            .finish()
    }
}

static FRAGMENTS: [TemplateFragment; 9] = [
    TemplateFragment {
        name: ENTITY_MODEL,
        parameters: &["entity"],
        dependencies: &[],
        body: entity_model,
    },
    TemplateFragment {
        name: INPUT_VARIANT,
        parameters: &["entity"],
        dependencies: &[],
        body: input_variant,
    },
    TemplateFragment {
        name: EMBEDDED_TYPES,
        parameters: &["entity", "catalog"],
        dependencies: &[],
        body: embedded_types,
    },
    TemplateFragment {
        name: CRUD_INPUTS,
        parameters: &["table"],
        dependencies: &[],
        body: crud_inputs,
    },
    TemplateFragment {
        name: QUERY_INPUTS,
        parameters: &["table"],
        dependencies: &[],
        body: query_inputs,
    },
    TemplateFragment {
        name: RESPONSE_ENVELOPES,
        parameters: &["table"],
        dependencies: &[],
        body: response_envelopes,
    },
    TemplateFragment {
        name: OPERATIONS,
        parameters: &["table"],
        dependencies: &[],
        body: operations,
    },
    TemplateFragment {
        name: MODEL_ARTIFACT,
        parameters: &["entity"],
        dependencies: &[ENTITY_MODEL, CRUD_INPUTS, QUERY_INPUTS, RESPONSE_ENVELOPES],
        body: nothing,
    },
    TemplateFragment {
        name: API_SCHEMA_ENTITY,
        parameters: &["entity", "catalog"],
        dependencies: &[
            EMBEDDED_TYPES,
            ENTITY_MODEL,
            INPUT_VARIANT,
            CRUD_INPUTS,
            QUERY_INPUTS,
            RESPONSE_ENVELOPES,
            OPERATIONS,
        ],
        body: nothing,
    },
];

/// Look up a fragment by name
pub fn fragment(name: &str) -> Option<&'static TemplateFragment> {
    FRAGMENTS.iter().find(|f| f.name == name)
}

/// Render a fragment (dependencies first) against one entity.
pub fn render(
    name: &str,
    scope: &FragmentScope<'_>,
    registry: &mut EmissionRegistry,
) -> Result<Vec<Declaration>> {
    let fragment = fragment(name).ok_or_else(|| {
        Error::render(scope.entity.name(), format!("unknown fragment `{}`", name))
    })?;

    let mut declarations = Vec::new();
    for dependency in fragment.dependencies {
        declarations.extend(render(dependency, scope, registry)?);
    }
    declarations.extend((fragment.body)(scope, registry)?);
    Ok(declarations)
}

fn nothing(_: &FragmentScope<'_>, _: &mut EmissionRegistry) -> Result<Vec<Declaration>> {
    Ok(Vec::new())
}

fn field(attr: &Attribute, required: bool) -> FieldDecl {
    FieldDecl {
        name: attr.name.clone(),
        ty: FieldType::Attribute(attr.kind.clone()),
        required,
        description: attr.description.clone(),
    }
}

fn key_field(table: &TableSchema, name: &str, required: bool) -> Result<FieldDecl> {
    let attr = table.attribute(name).ok_or_else(|| {
        Error::render(
            &table.name,
            format!("key attribute `{}` is not declared on the table", name),
        )
    })?;
    Ok(field(attr, required))
}

fn entity_model(scope: &FragmentScope<'_>, registry: &mut EmissionRegistry) -> Result<Vec<Declaration>> {
    let entity = scope.entity;
    if !registry.mark_type_rendered(scope.target, entity.name()) {
        return Ok(Vec::new());
    }

    let keys = entity.as_table().map(TableSchema::primary_key).unwrap_or_default();
    let fields = entity
        .attributes()
        .iter()
        .map(|a| field(a, a.required || keys.contains(&a.name.as_str())))
        .collect();

    Ok(vec![Declaration::Type(TypeDecl {
        name: entity.name().to_string(),
        kind: DeclKind::Object,
        description: entity.description().map(str::to_string),
        fields,
    })])
}

fn input_variant(scope: &FragmentScope<'_>, registry: &mut EmissionRegistry) -> Result<Vec<Declaration>> {
    let Entity::Type(ty) = scope.entity else {
        return Ok(Vec::new());
    };
    let name = naming::input_variant_name(&ty.name);
    if !registry.mark_type_rendered(scope.target, &name) {
        return Ok(Vec::new());
    }

    Ok(vec![Declaration::Type(TypeDecl {
        name,
        kind: DeclKind::Input,
        description: ty.description.clone(),
        fields: ty.attributes.iter().map(|a| field(a, a.required)).collect(),
    })])
}

/// Non-table types an entity embeds, transitively, with their input variants
fn embedded_types(scope: &FragmentScope<'_>, registry: &mut EmissionRegistry) -> Result<Vec<Declaration>> {
    let mut declarations = Vec::new();
    for dependency in scope.catalog.dependencies(scope.entity) {
        if dependency.as_table().is_some() {
            continue;
        }
        let dep_scope = scope.with_entity(dependency);
        let model = render(ENTITY_MODEL, &dep_scope, registry)?;
        if model.is_empty() {
            continue;
        }
        declarations.extend(model);
        declarations.extend(render(EMBEDDED_TYPES, &dep_scope, registry)?);
        declarations.extend(render(INPUT_VARIANT, &dep_scope, registry)?);
    }
    Ok(declarations)
}

fn crud_inputs(scope: &FragmentScope<'_>, registry: &mut EmissionRegistry) -> Result<Vec<Declaration>> {
    let Some(table) = scope.entity.as_table() else {
        return Ok(Vec::new());
    };
    let keys = table.primary_key();
    let mut declarations = Vec::new();

    let create = naming::create_input_name(&table.name);
    if registry.mark_type_rendered(scope.target, &create) {
        declarations.push(Declaration::Type(TypeDecl {
            name: create,
            kind: DeclKind::Input,
            description: Some(format!("Input for creating a {} item", table.name)),
            fields: table
                .attributes
                .iter()
                .map(|a| field(a, a.required || keys.contains(&a.name.as_str())))
                .collect(),
        }));
    }

    let update = naming::update_input_name(&table.name);
    if registry.mark_type_rendered(scope.target, &update) {
        declarations.push(Declaration::Type(TypeDecl {
            name: update,
            kind: DeclKind::Input,
            description: Some(format!("Input for updating a {} item", table.name)),
            fields: table
                .attributes
                .iter()
                .map(|a| field(a, keys.contains(&a.name.as_str())))
                .collect(),
        }));
    }

    let delete = naming::delete_input_name(&table.name);
    if registry.mark_type_rendered(scope.target, &delete) {
        declarations.push(Declaration::Type(TypeDecl {
            name: delete,
            kind: DeclKind::Input,
            description: Some(format!("Input for deleting a {} item", table.name)),
            fields: keys
                .iter()
                .map(|k| key_field(table, k, true))
                .collect::<Result<_>>()?,
        }));
    }

    Ok(declarations)
}

fn query_inputs(scope: &FragmentScope<'_>, registry: &mut EmissionRegistry) -> Result<Vec<Declaration>> {
    let Some(table) = scope.entity.as_table() else {
        return Ok(Vec::new());
    };

    let mut keys: Vec<_> = table
        .query_keys()
        .into_iter()
        .map(|key| {
            let required: Vec<&str> = key.required.iter().map(String::as_str).collect();
            (naming::query_input_name(&table.name, &required), key)
        })
        .collect();
    // stable: a primary key wins over an index sharing its attribute
    keys.sort_by(|a, b| a.0.cmp(&b.0));

    let mut declarations = Vec::new();
    for (name, key) in keys {
        if !registry.mark_type_rendered(scope.target, &name) {
            continue;
        }
        let mut fields = key
            .required
            .iter()
            .map(|k| key_field(table, k, true))
            .collect::<Result<Vec<_>>>()?;
        if let Some(optional) = &key.optional {
            fields.push(key_field(table, optional, false)?);
        }
        let description = match &key.index {
            Some(index) => format!("Query {} through index {}", table.name, index),
            None => format!("Query {} by primary key", table.name),
        };
        declarations.push(Declaration::Type(TypeDecl {
            name,
            kind: DeclKind::Input,
            description: Some(description),
            fields,
        }));
    }
    Ok(declarations)
}

fn envelope(name: String, data: AttributeKind, description: String) -> Declaration {
    Declaration::Type(TypeDecl {
        name,
        kind: DeclKind::Object,
        description: Some(description),
        fields: vec![
            FieldDecl {
                name: "statusCode".into(),
                ty: FieldType::Integer,
                required: true,
                description: None,
            },
            FieldDecl {
                name: "message".into(),
                ty: FieldType::Attribute(AttributeKind::Scalar(ScalarType::String)),
                required: false,
                description: None,
            },
            FieldDecl {
                name: "data".into(),
                ty: FieldType::Attribute(data),
                required: false,
                description: None,
            },
        ],
    })
}

fn response_envelopes(
    scope: &FragmentScope<'_>,
    registry: &mut EmissionRegistry,
) -> Result<Vec<Declaration>> {
    let Some(table) = scope.entity.as_table() else {
        return Ok(Vec::new());
    };
    let mut declarations = Vec::new();

    let list = naming::list_response_name(&table.name);
    if registry.mark_type_rendered(scope.target, &list) {
        declarations.push(envelope(
            list,
            AttributeKind::ReferenceArray(table.name.clone()),
            format!("Result envelope carrying a list of {} items", table.name),
        ));
    }

    let single = naming::response_name(&table.name);
    if registry.mark_type_rendered(scope.target, &single) {
        declarations.push(envelope(
            single,
            AttributeKind::Reference(table.name.clone()),
            format!("Result envelope carrying one {} item", table.name),
        ));
    }

    Ok(declarations)
}

fn operations(scope: &FragmentScope<'_>, registry: &mut EmissionRegistry) -> Result<Vec<Declaration>> {
    let Some(table) = scope.entity.as_table() else {
        return Ok(Vec::new());
    };
    let entity = &table.name;
    let single = naming::response_name(entity);

    let mut candidates = vec![
        OperationDecl {
            name: naming::mutation_name("create", entity),
            kind: OperationKind::Mutation,
            entity: entity.clone(),
            input_type: naming::create_input_name(entity),
            result_type: single.clone(),
        },
        OperationDecl {
            name: naming::mutation_name("update", entity),
            kind: OperationKind::Mutation,
            entity: entity.clone(),
            input_type: naming::update_input_name(entity),
            result_type: single.clone(),
        },
        OperationDecl {
            name: naming::mutation_name("delete", entity),
            kind: OperationKind::Mutation,
            entity: entity.clone(),
            input_type: naming::delete_input_name(entity),
            result_type: single,
        },
    ];

    for key in table.query_keys() {
        let required: Vec<&str> = key.required.iter().map(String::as_str).collect();
        candidates.push(OperationDecl {
            name: naming::query_operation_name(entity, &required),
            kind: OperationKind::Query,
            entity: entity.clone(),
            input_type: naming::query_input_name(entity, &required),
            result_type: naming::list_response_name(entity),
        });
    }
    candidates.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(candidates
        .into_iter()
        .filter(|op| registry.mark_operation_rendered(scope.target, &op.name))
        .map(Declaration::Operation)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{
        GraphQLType, IndexKind, Projection, SchemaIndex, SortKey, TypeOrigin,
    };

    fn attr(name: &str, kind: AttributeKind, required: bool) -> Attribute {
        Attribute {
            name: name.into(),
            kind,
            required,
            description: None,
        }
    }

    fn string(name: &str) -> Attribute {
        attr(name, AttributeKind::Scalar(ScalarType::String), false)
    }

    fn table(name: &str, partition: &str, extra: Vec<Attribute>, indexes: Vec<SchemaIndex>) -> Entity {
        let mut attributes = vec![attr(partition, AttributeKind::Scalar(ScalarType::String), true)];
        attributes.extend(extra);
        Entity::Table(TableSchema {
            name: name.into(),
            version: "1".into(),
            description: None,
            attributes,
            partition_key: partition.into(),
            sort_key: SortKey::None,
            indexes,
        })
    }

    fn address() -> Entity {
        Entity::Type(GraphQLType {
            name: "Address".into(),
            description: None,
            attributes: vec![string("street"), string("city")],
            origin: TypeOrigin::Static,
        })
    }

    fn catalog() -> SchemaCatalog {
        let mut catalog = SchemaCatalog::new();
        catalog.insert_entity(address());
        catalog.insert_entity(table(
            "Customers",
            "customerId",
            vec![attr("home", AttributeKind::Reference("Address".into()), false)],
            vec![],
        ));
        catalog.insert_entity(table(
            "Warehouses",
            "warehouseId",
            vec![
                attr("location", AttributeKind::Reference("Address".into()), false),
                string("region"),
            ],
            vec![
                SchemaIndex {
                    kind: IndexKind::Global,
                    name: "region-index".into(),
                    partition_attr: "region".into(),
                    sort_attr: SortKey::None,
                    projection: Projection::KeysOnly,
                },
                SchemaIndex {
                    kind: IndexKind::Global,
                    name: "warehouse-by-id".into(),
                    partition_attr: "warehouseId".into(),
                    sort_attr: SortKey::Attribute("region".into()),
                    projection: Projection::All,
                },
            ],
        ));
        catalog
    }

    fn render_api_schema(catalog: &SchemaCatalog, order: &[&str]) -> Vec<Declaration> {
        let mut registry = EmissionRegistry::new();
        let mut out = Vec::new();
        for name in order {
            let entity = catalog.entity(name).expect("entity");
            let scope = FragmentScope::new(catalog, entity, Target::GraphQl);
            out.extend(render(API_SCHEMA_ENTITY, &scope, &mut registry).expect("render"));
        }
        out
    }

    fn count(decls: &[Declaration], name: &str) -> usize {
        decls.iter().filter(|d| d.name() == name).count()
    }

    #[test]
    fn shared_embedded_type_is_emitted_once() {
        let catalog = catalog();
        let decls = render_api_schema(&catalog, &["Customers", "Warehouses"]);
        assert_eq!(count(&decls, "Address"), 1);
        assert_eq!(count(&decls, "AddressInput"), 1);
        assert_eq!(count(&decls, "Customers"), 1);
        assert_eq!(count(&decls, "Warehouses"), 1);
    }

    #[test]
    fn index_sharing_primary_partition_is_deduplicated() {
        let catalog = catalog();
        let decls = render_api_schema(&catalog, &["Warehouses"]);
        assert_eq!(count(&decls, "WarehousesQueryByWarehouseIdInput"), 1);
        assert_eq!(count(&decls, "queryWarehousesByWarehouseId"), 1);
        assert_eq!(count(&decls, "WarehousesQueryByRegionInput"), 1);

        let (types, _) = partition(decls);
        let primary = types
            .iter()
            .find(|t| t.name == "WarehousesQueryByWarehouseIdInput")
            .unwrap();
        // primary key query wins: no optional sort field from the index
        assert_eq!(primary.fields.len(), 1);
    }

    #[test]
    fn render_order_does_not_change_symbol_set() {
        let catalog = catalog();
        let mut forward: Vec<String> = render_api_schema(&catalog, &["Customers", "Warehouses", "Address"])
            .iter()
            .map(|d| d.name().to_string())
            .collect();
        let mut backward: Vec<String> = render_api_schema(&catalog, &["Address", "Warehouses", "Customers"])
            .iter()
            .map(|d| d.name().to_string())
            .collect();
        forward.sort();
        backward.sort();
        assert_eq!(forward, backward);
    }

    #[test]
    fn model_artifact_has_entity_crud_query_and_envelopes() {
        let catalog = catalog();
        let entity = catalog.entity("Customers").unwrap();
        let mut registry = EmissionRegistry::new();
        let scope = FragmentScope::new(&catalog, entity, Target::TypeScript);
        let names: Vec<String> = render(MODEL_ARTIFACT, &scope, &mut registry)
            .unwrap()
            .iter()
            .map(|d| d.name().to_string())
            .collect();
        assert_eq!(
            names,
            vec![
                "Customers",
                "CreateCustomersInput",
                "UpdateCustomersInput",
                "DeleteCustomersInput",
                "CustomersQueryByCustomerIdInput",
                "CustomersListResponse",
                "CustomersResponse",
            ]
        );
    }

    #[test]
    fn update_input_makes_only_keys_required() {
        let catalog = catalog();
        let entity = catalog.entity("Customers").unwrap();
        let mut registry = EmissionRegistry::new();
        let scope = FragmentScope::new(&catalog, entity, Target::Rust);
        let (types, _) = partition(render(CRUD_INPUTS, &scope, &mut registry).unwrap());
        let update = types.iter().find(|t| t.name == "UpdateCustomersInput").unwrap();
        let required: Vec<&str> = update
            .fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(required, vec!["customerId"]);
    }

    #[test]
    fn operations_are_sorted_and_typed() {
        let catalog = catalog();
        let entity = catalog.entity("Customers").unwrap();
        let mut registry = EmissionRegistry::new();
        let scope = FragmentScope::new(&catalog, entity, Target::TypeScript);
        let (_, ops) = partition(render(OPERATIONS, &scope, &mut registry).unwrap());
        let names: Vec<&str> = ops.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "createCustomers",
                "deleteCustomers",
                "queryCustomersByCustomerId",
                "updateCustomers"
            ]
        );
        let query = &ops[2];
        assert_eq!(query.kind, OperationKind::Query);
        assert_eq!(query.result_type, "CustomersListResponse");
        assert_eq!(query.input_type, "CustomersQueryByCustomerIdInput");
    }

    #[test]
    fn unknown_fragment_is_a_render_error() {
        let catalog = catalog();
        let entity = catalog.entity("Customers").unwrap();
        let mut registry = EmissionRegistry::new();
        let scope = FragmentScope::new(&catalog, entity, Target::Rust);
        assert!(matches!(
            render("no-such-fragment", &scope, &mut registry),
            Err(Error::Render { .. })
        ));
    }

    #[test]
    fn fragment_table_is_consistent() {
        for f in FRAGMENTS.iter() {
            for dep in f.dependencies {
                assert!(fragment(dep).is_some(), "{} depends on missing {}", f.name, dep);
            }
        }
    }
}
