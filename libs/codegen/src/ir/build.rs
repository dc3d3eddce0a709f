//! Canonical IR construction from validated documents

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use super::{
    Attribute, AttributeKind, Entity, EnumDefinition, GraphQLType, SchemaCatalog, SchemaIndex,
    SortKey, TableSchema, TypeOrigin,
};
use crate::error::{Error, Result, Rule};
use crate::naming;
use crate::parser::{AttributeDocument, DocumentBody, EnumDocument, SchemaDocument};

/// Build the catalog for one run.
///
/// Enum shapes are merged from the enum catalog and inline `enumValues`
/// declarations into a single source of truth before any attribute is built.
pub fn build_catalog(documents: &[SchemaDocument], enums: &[EnumDocument]) -> Result<SchemaCatalog> {
    let mut seen: HashMap<&str, &PathBuf> = HashMap::new();
    for doc in documents {
        if let Some(first) = seen.insert(doc.name.as_str(), &doc.path) {
            return Err(Error::validation(
                &doc.path,
                "name",
                Rule::DuplicateEntity,
                format!("entity `{}` is already declared in {}", doc.name, first.display()),
            ));
        }
    }

    let enum_values = collect_enums(documents, enums)?;
    for doc in documents {
        if enum_values.contains_key(&doc.name) {
            return Err(Error::validation(
                &doc.path,
                "name",
                Rule::DuplicateEntity,
                format!("entity `{}` has the same name as an enum", doc.name),
            ));
        }
    }

    let mut catalog = SchemaCatalog::new();
    for (name, values) in &enum_values {
        catalog.insert_enum(EnumDefinition {
            name: name.clone(),
            values: values.clone(),
        });
    }

    for doc in documents {
        catalog.insert_entity(build_entity(doc, &enum_values));
    }
    check_generated_names(documents, &catalog)?;

    for entity in catalog.entities() {
        for attr in entity.attributes() {
            if let Some(target) = attr.kind.referenced_type() {
                if catalog.entity(target).is_none() {
                    tracing::warn!(
                        entity = %entity.name(),
                        attribute = %attr.name,
                        reference = %target,
                        "reference does not name a schema entity; passing it through unchanged"
                    );
                }
            }
        }
    }

    tracing::debug!(
        entities = catalog.entity_count(),
        enums = catalog.enum_count(),
        "schema catalog built"
    );

    Ok(catalog)
}

/// Root operation types of the API schema
const RESERVED_NAMES: &[&str] = &["Query", "Mutation"];

/// Names the fragments derive from an entity: CRUD inputs, envelopes and
/// query inputs for a table, the input variant for any other type
fn generated_names(entity: &Entity) -> Vec<String> {
    match entity {
        Entity::Table(table) => {
            let mut names = vec![
                naming::create_input_name(&table.name),
                naming::update_input_name(&table.name),
                naming::delete_input_name(&table.name),
                naming::response_name(&table.name),
                naming::list_response_name(&table.name),
            ];
            for key in table.query_keys() {
                let required: Vec<&str> = key.required.iter().map(String::as_str).collect();
                names.push(naming::query_input_name(&table.name, &required));
            }
            names
        }
        Entity::Type(ty) => vec![naming::input_variant_name(&ty.name)],
    }
}

/// Every emitted type name must have exactly one owner, otherwise the
/// emission registry would silently keep whichever came first
fn check_generated_names(documents: &[SchemaDocument], catalog: &SchemaCatalog) -> Result<()> {
    let path_of = |entity: &str| -> PathBuf {
        documents
            .iter()
            .find(|d| d.name == entity)
            .map(|d| d.path.clone())
            .unwrap_or_default()
    };

    let mut owners: BTreeMap<String, &str> = BTreeMap::new();
    for entity in catalog.entities() {
        for name in generated_names(entity) {
            match owners.get(name.as_str()) {
                Some(owner) if *owner != entity.name() => {
                    return Err(Error::validation(
                        path_of(entity.name()),
                        "name",
                        Rule::DuplicateEntity,
                        format!(
                            "`{}` is generated for both `{}` and `{}`",
                            name,
                            owner,
                            entity.name()
                        ),
                    ));
                }
                Some(_) => {}
                None => {
                    owners.insert(name, entity.name());
                }
            }
        }
    }

    for doc in documents {
        if RESERVED_NAMES.contains(&doc.name.as_str()) {
            return Err(Error::validation(
                &doc.path,
                "name",
                Rule::DuplicateEntity,
                format!("`{}` is reserved for the API schema root", doc.name),
            ));
        }
        if let Some(owner) = owners.get(doc.name.as_str()) {
            return Err(Error::validation(
                &doc.path,
                "name",
                Rule::DuplicateEntity,
                format!("entity `{}` collides with a type generated for `{}`", doc.name, owner),
            ));
        }
    }

    for definition in catalog.enums() {
        if let Some(owner) = owners.get(definition.name.as_str()) {
            return Err(Error::validation(
                path_of(*owner),
                "name",
                Rule::DuplicateEntity,
                format!("enum `{}` collides with a type generated for `{}`", definition.name, owner),
            ));
        }
    }

    Ok(())
}

fn attributes_of(doc: &SchemaDocument) -> (&'static str, &[AttributeDocument]) {
    match &doc.body {
        DocumentBody::Table(t) => ("model.attributes", &t.attributes),
        DocumentBody::Graphql { attributes } | DocumentBody::Static { attributes } => {
            ("attributes", attributes)
        }
    }
}

fn collect_enums(
    documents: &[SchemaDocument],
    enums: &[EnumDocument],
) -> Result<BTreeMap<String, Vec<String>>> {
    let mut merged: BTreeMap<String, Vec<String>> = enums
        .iter()
        .map(|e| (e.name.clone(), e.values.clone()))
        .collect();

    for doc in documents {
        let (field, attributes) = attributes_of(doc);
        for (i, attr) in attributes.iter().enumerate() {
            let (Some(name), Some(values)) = (attr.kind.enum_name(), attr.enum_values.as_ref()) else {
                continue;
            };
            match merged.get(name) {
                Some(existing) if existing != values => {
                    return Err(Error::validation(
                        &doc.path,
                        format!("{}[{}].enumValues", field, i),
                        Rule::EnumConflict,
                        format!(
                            "enum `{}` is declared with values [{}] here but [{}] elsewhere",
                            name,
                            values.join(", "),
                            existing.join(", ")
                        ),
                    ));
                }
                Some(_) => {}
                None => {
                    merged.insert(name.to_string(), values.clone());
                }
            }
        }
    }

    for doc in documents {
        let (field, attributes) = attributes_of(doc);
        for (i, attr) in attributes.iter().enumerate() {
            if let Some(name) = attr.kind.enum_name() {
                if !merged.contains_key(name) {
                    return Err(Error::validation(
                        &doc.path,
                        format!("{}[{}].enumType", field, i),
                        Rule::EnumValues,
                        format!("enum `{}` has no values in the enum catalog or inline", name),
                    ));
                }
            }
        }
    }

    Ok(merged)
}

fn build_entity(doc: &SchemaDocument, enums: &BTreeMap<String, Vec<String>>) -> Entity {
    match &doc.body {
        DocumentBody::Table(table) => Entity::Table(TableSchema {
            name: doc.name.clone(),
            version: table.version.clone(),
            description: doc.description.clone(),
            attributes: build_attributes(&table.attributes, enums),
            partition_key: table.partition.clone(),
            sort_key: SortKey::from_option(table.sort.clone()),
            indexes: table
                .indexes
                .as_deref()
                .unwrap_or_default()
                .iter()
                .map(|idx| SchemaIndex {
                    kind: idx.kind,
                    name: idx.name.clone(),
                    partition_attr: idx.partition.clone(),
                    sort_attr: SortKey::from_option(idx.sort.clone()),
                    projection: idx.projection.clone(),
                })
                .collect(),
        }),
        DocumentBody::Graphql { attributes } => Entity::Type(GraphQLType {
            name: doc.name.clone(),
            description: doc.description.clone(),
            attributes: build_attributes(attributes, enums),
            origin: TypeOrigin::Api,
        }),
        DocumentBody::Static { attributes } => Entity::Type(GraphQLType {
            name: doc.name.clone(),
            description: doc.description.clone(),
            attributes: build_attributes(attributes, enums),
            origin: TypeOrigin::Static,
        }),
    }
}

fn build_attributes(
    attributes: &[AttributeDocument],
    enums: &BTreeMap<String, Vec<String>>,
) -> Vec<Attribute> {
    attributes
        .iter()
        .map(|attr| Attribute {
            name: attr.name.clone(),
            kind: resolve_kind(&attr.kind, enums),
            required: attr.required,
            description: attr.description.clone(),
        })
        .collect()
}

/// Fill enum values, and turn plain references to a known enum into enum kinds
fn resolve_kind(kind: &AttributeKind, enums: &BTreeMap<String, Vec<String>>) -> AttributeKind {
    match kind {
        AttributeKind::Enum { name, .. } | AttributeKind::Reference(name)
            if enums.contains_key(name) =>
        {
            AttributeKind::Enum {
                name: name.clone(),
                values: enums[name].clone(),
            }
        }
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::ScalarType;
    use crate::parser::parse_document;
    use std::path::Path;

    fn doc(file: &str, source: &str) -> SchemaDocument {
        parse_document(Path::new(file), source).expect("valid document")
    }

    const ORDERS: &str = r#"
name: Orders
kind: table
version: 3
model:
  keys:
    primary:
      partition: orderId
  attributes:
    - name: orderId
      type: string
      required: true
    - name: status
      enumType: OrderStatus
      enumValues: [OPEN, CLOSED]
    - name: shipTo
      type: Address
    - name: color
      type: Color
"#;

    const ADDRESS: &str = "name: Address\nkind: static\nattributes:\n  - name: street\n    type: string\n";

    fn color_enum() -> Vec<EnumDocument> {
        vec![EnumDocument {
            path: PathBuf::from("enums.yml"),
            name: "Color".into(),
            values: vec!["RED".into(), "BLUE".into()],
        }]
    }

    #[test]
    fn builds_table_with_defaults() {
        let catalog = build_catalog(
            &[doc("Orders.yml", ORDERS), doc("Address.yml", ADDRESS)],
            &color_enum(),
        )
        .expect("catalog");
        let orders = catalog.entity("Orders").and_then(Entity::as_table).expect("table");
        assert_eq!(orders.sort_key, SortKey::None);
        assert!(orders.indexes.is_empty());
        assert_eq!(orders.version, "3");
        assert_eq!(
            orders.attribute("status").map(|a| &a.kind),
            Some(&AttributeKind::Enum {
                name: "OrderStatus".into(),
                values: vec!["OPEN".into(), "CLOSED".into()],
            })
        );
        assert_eq!(
            orders.attribute("color").map(|a| &a.kind),
            Some(&AttributeKind::Enum {
                name: "Color".into(),
                values: vec!["RED".into(), "BLUE".into()],
            })
        );
        assert_eq!(
            orders.attribute("orderId").map(|a| &a.kind),
            Some(&AttributeKind::Scalar(ScalarType::String))
        );

        let names: Vec<&str> = catalog.enums().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Color", "OrderStatus"]);

        let address = catalog.entity("Address").expect("address");
        assert!(!address.is_api_visible());
        let deps: Vec<&str> = catalog
            .dependencies(catalog.entity("Orders").unwrap())
            .into_iter()
            .map(Entity::name)
            .collect();
        assert_eq!(deps, vec!["Address"]);
    }

    #[test]
    fn conflicting_enum_values_are_rejected() {
        let other = "name: Returns\nkind: graphql\nattributes:\n  - name: status\n    enumType: OrderStatus\n    enumValues: [OPEN]\n";
        let err = build_catalog(&[doc("Orders.yml", ORDERS), doc("Returns.yml", other)], &[])
            .unwrap_err();
        assert_eq!(err.rule(), Some(Rule::EnumConflict));
    }

    #[test]
    fn enum_without_values_is_rejected() {
        let source = "name: Tags\nkind: graphql\nattributes:\n  - name: tone\n    enumType: Tone\n";
        let err = build_catalog(&[doc("Tags.yml", source)], &[]).unwrap_err();
        assert_eq!(err.rule(), Some(Rule::EnumValues));
    }

    #[test]
    fn entity_named_like_a_generated_type_is_rejected() {
        let response = "name: OrdersResponse\nkind: static\nattributes:\n  - name: note\n    type: string\n";
        let err = build_catalog(
            &[doc("Orders.yml", ORDERS), doc("Address.yml", ADDRESS), doc("OrdersResponse.yml", response)],
            &color_enum(),
        )
        .unwrap_err();
        assert_eq!(err.rule(), Some(Rule::DuplicateEntity));
        assert!(err.to_string().contains("OrdersResponse.yml"), "{}", err);

        let input = "name: AddressInput\nkind: graphql\nattributes:\n  - name: line\n    type: string\n";
        let err = build_catalog(&[doc("Address.yml", ADDRESS), doc("AddressInput.yml", input)], &[])
            .unwrap_err();
        assert_eq!(err.rule(), Some(Rule::DuplicateEntity));

        let query_input = "name: OrdersQueryByOrderIdInput\nkind: graphql\nattributes:\n  - name: orderId\n    type: string\n";
        let err = build_catalog(
            &[doc("Orders.yml", ORDERS), doc("Address.yml", ADDRESS), doc("OrdersQueryByOrderIdInput.yml", query_input)],
            &color_enum(),
        )
        .unwrap_err();
        assert_eq!(err.rule(), Some(Rule::DuplicateEntity));
    }

    #[test]
    fn generated_names_may_not_collide_between_entities() {
        let create = "name: CreateOrders\nkind: static\nattributes:\n  - name: note\n    type: string\n";
        let err = build_catalog(
            &[doc("Orders.yml", ORDERS), doc("Address.yml", ADDRESS), doc("CreateOrders.yml", create)],
            &color_enum(),
        )
        .unwrap_err();
        assert_eq!(err.rule(), Some(Rule::DuplicateEntity));
        assert!(err.to_string().contains("CreateOrdersInput"), "{}", err);
    }

    #[test]
    fn root_type_names_are_reserved() {
        let query = "name: Query\nkind: graphql\nattributes:\n  - name: text\n    type: string\n";
        let err = build_catalog(&[doc("Query.yml", query)], &[]).unwrap_err();
        assert_eq!(err.rule(), Some(Rule::DuplicateEntity));
    }

    #[test]
    fn duplicate_entity_across_extensions_is_rejected() {
        let err = build_catalog(&[doc("Address.yml", ADDRESS), doc("Address.yaml", ADDRESS)], &[])
            .unwrap_err();
        assert_eq!(err.rule(), Some(Rule::DuplicateEntity));
    }
}
