//! Storage description: one key-value table per table entity

use serde_json::{json, Map, Value};

use crate::error::{Error, Result};
use crate::generators::{EmissionRegistry, Target};
use crate::ir::{IndexKind, Projection, SchemaCatalog, SchemaIndex, SortKey, TableSchema};
use crate::naming::to_kebab_case;
use crate::types::{map_type, Surface};

/// Logical resource ID of a table's storage resource
pub fn table_logical_id(entity: &str) -> String {
    format!("{}Table", entity)
}

/// Export name under which the table's physical name is shared with the API stack
pub fn table_export_name(entity: &str) -> String {
    format!("{}-table-name", to_kebab_case(entity))
}

pub fn storage_template(catalog: &SchemaCatalog, registry: &mut EmissionRegistry) -> Result<Value> {
    let mut resources = Map::new();
    let mut outputs = Map::new();

    for table in catalog.tables() {
        let logical_id = table_logical_id(&table.name);
        if !registry.mark_type_rendered(Target::Infra, &logical_id) {
            continue;
        }
        resources.insert(logical_id.clone(), table_resource(table)?);
        outputs.insert(
            format!("{}Name", logical_id),
            json!({
                "Description": format!("Physical name of the {} table", table.name),
                "Value": { "Ref": logical_id },
                "Export": { "Name": table_export_name(&table.name) },
            }),
        );
    }

    Ok(json!({
        "AWSTemplateFormatVersion": "2010-09-09",
        "Description": "Storage tables",
        "Resources": resources,
        "Outputs": outputs,
    }))
}

fn table_resource(table: &TableSchema) -> Result<Value> {
    let definitions = table
        .key_attributes()
        .into_iter()
        .map(|name| {
            let attr = table.attribute(name).ok_or_else(|| {
                Error::render(&table.name, format!("key attribute `{}` is not declared", name))
            })?;
            Ok(json!({
                "AttributeName": name,
                "AttributeType": map_type(Surface::Storage, &attr.kind),
            }))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut properties = Map::new();
    properties.insert("TableName".into(), json!(to_kebab_case(&table.name)));
    properties.insert("BillingMode".into(), json!("PAY_PER_REQUEST"));
    properties.insert("AttributeDefinitions".into(), Value::Array(definitions));
    properties.insert(
        "KeySchema".into(),
        key_schema(&table.partition_key, &table.sort_key),
    );

    let global = indexes_of(table, IndexKind::Global);
    if !global.is_empty() {
        properties.insert("GlobalSecondaryIndexes".into(), Value::Array(global));
    }
    let local = indexes_of(table, IndexKind::Local);
    if !local.is_empty() {
        properties.insert("LocalSecondaryIndexes".into(), Value::Array(local));
    }

    properties.insert(
        "Tags".into(),
        json!([{ "Key": "schema-version", "Value": table.version }]),
    );

    Ok(json!({
        "Type": "AWS::DynamoDB::Table",
        "Properties": properties,
    }))
}

fn indexes_of(table: &TableSchema, kind: IndexKind) -> Vec<Value> {
    table
        .indexes
        .iter()
        .filter(|idx| idx.kind == kind)
        .map(index_descriptor)
        .collect()
}

fn index_descriptor(index: &SchemaIndex) -> Value {
    json!({
        "IndexName": index.name,
        "KeySchema": key_schema(&index.partition_attr, &index.sort_attr),
        "Projection": projection(&index.projection),
    })
}

fn key_schema(partition: &str, sort: &SortKey) -> Value {
    let mut keys = vec![json!({ "AttributeName": partition, "KeyType": "HASH" })];
    if let Some(sort) = sort.attribute() {
        keys.push(json!({ "AttributeName": sort, "KeyType": "RANGE" }));
    }
    Value::Array(keys)
}

fn projection(projection: &Projection) -> Value {
    match projection {
        Projection::Include(attrs) => json!({
            "ProjectionType": projection.projection_type(),
            "NonKeyAttributes": attrs,
        }),
        _ => json!({ "ProjectionType": projection.projection_type() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Attribute, AttributeKind, Entity, ScalarType};

    fn attr(name: &str, scalar: ScalarType) -> Attribute {
        Attribute {
            name: name.into(),
            kind: AttributeKind::Scalar(scalar),
            required: false,
            description: None,
        }
    }

    fn widgets() -> TableSchema {
        TableSchema {
            name: "Widgets".into(),
            version: "1".into(),
            description: None,
            attributes: vec![
                attr("widgetId", ScalarType::String),
                attr("status", ScalarType::String),
                attr("createdAt", ScalarType::Timestamp),
                attr("price", ScalarType::Number),
            ],
            partition_key: "widgetId".into(),
            sort_key: SortKey::None,
            indexes: vec![
                SchemaIndex {
                    kind: IndexKind::Global,
                    name: "status-index".into(),
                    partition_attr: "status".into(),
                    sort_attr: SortKey::Attribute("createdAt".into()),
                    projection: Projection::All,
                },
                SchemaIndex {
                    kind: IndexKind::Global,
                    name: "price-index".into(),
                    partition_attr: "price".into(),
                    sort_attr: SortKey::None,
                    projection: Projection::Include(vec!["status".into()]),
                },
            ],
        }
    }

    #[test]
    fn table_descriptor_covers_keys_and_indexes() {
        let resource = table_resource(&widgets()).unwrap();
        let props = &resource["Properties"];
        assert_eq!(props["TableName"], "widgets");
        assert_eq!(
            props["KeySchema"],
            json!([{ "AttributeName": "widgetId", "KeyType": "HASH" }])
        );
        assert_eq!(
            props["AttributeDefinitions"],
            json!([
                { "AttributeName": "widgetId", "AttributeType": "S" },
                { "AttributeName": "status", "AttributeType": "S" },
                { "AttributeName": "createdAt", "AttributeType": "S" },
                { "AttributeName": "price", "AttributeType": "N" },
            ])
        );

        let gsis = props["GlobalSecondaryIndexes"].as_array().unwrap();
        assert_eq!(gsis.len(), 2);
        assert_eq!(
            gsis[0]["KeySchema"],
            json!([
                { "AttributeName": "status", "KeyType": "HASH" },
                { "AttributeName": "createdAt", "KeyType": "RANGE" },
            ])
        );
        assert_eq!(
            gsis[1]["Projection"],
            json!({ "ProjectionType": "INCLUDE", "NonKeyAttributes": ["status"] })
        );
        assert!(props.get("LocalSecondaryIndexes").is_none());
    }

    #[test]
    fn template_exports_table_names() {
        let mut catalog = SchemaCatalog::new();
        catalog.insert_entity(Entity::Table(widgets()));
        let mut registry = EmissionRegistry::new();
        let template = storage_template(&catalog, &mut registry).unwrap();
        assert_eq!(template["Resources"]["WidgetsTable"]["Type"], "AWS::DynamoDB::Table");
        assert_eq!(
            template["Outputs"]["WidgetsTableName"]["Export"]["Name"],
            "widgets-table-name"
        );
    }
}
