//! API description: the API resource, one data source per table and one
//! resolver per operation

use serde_json::{json, Map, Value};

use super::storage::table_export_name;
use crate::error::{Error, Result};
use crate::generators::fragments::{self, FragmentScope, OperationDecl};
use crate::generators::{EmissionRegistry, Target};
use crate::ir::{QueryKey, SchemaCatalog, TableSchema};
use crate::naming::{mutation_name, query_operation_name, to_pascal_case};

const API_ID: &str = "GraphQlApi";
const SCHEMA_ID: &str = "GraphQlSchema";
const ROLE_PARAMETER: &str = "DataSourceRoleArn";

pub fn data_source_name(entity: &str) -> String {
    format!("{}DataSource", entity)
}

pub fn resolver_logical_id(op: &OperationDecl) -> String {
    format!("{}{}Resolver", op.kind.type_name(), to_pascal_case(&op.name))
}

pub fn api_template(
    catalog: &SchemaCatalog,
    registry: &mut EmissionRegistry,
    api_name: &str,
    schema_location: &str,
) -> Result<Value> {
    let mut resources = Map::new();
    resources.insert(
        API_ID.into(),
        json!({
            "Type": "AWS::AppSync::GraphQLApi",
            "Properties": {
                "Name": api_name,
                "AuthenticationType": "API_KEY",
            },
        }),
    );
    resources.insert(
        SCHEMA_ID.into(),
        json!({
            "Type": "AWS::AppSync::GraphQLSchema",
            "Properties": {
                "ApiId": api_id(),
                "DefinitionS3Location": schema_location,
            },
        }),
    );

    for table in catalog.tables() {
        let Some(entity) = catalog.entity(&table.name) else {
            continue;
        };
        let source = data_source_name(&table.name);
        resources.insert(source.clone(), data_source(table, &source));

        let scope = FragmentScope::new(catalog, entity, Target::Infra);
        let (_, operations) =
            fragments::partition(fragments::render(fragments::OPERATIONS, &scope, registry)?);
        for op in &operations {
            resources.insert(resolver_logical_id(op), resolver(table, op, &source)?);
        }
    }

    Ok(json!({
        "AWSTemplateFormatVersion": "2010-09-09",
        "Description": format!("API resources for {}", api_name),
        "Parameters": {
            ROLE_PARAMETER: {
                "Type": "String",
                "Description": "Role the API assumes to reach the storage tables",
            },
        },
        "Resources": resources,
        "Outputs": {
            "GraphQlApiUrl": {
                "Value": { "Fn::GetAtt": [API_ID, "GraphQLUrl"] },
            },
        },
    }))
}

fn api_id() -> Value {
    json!({ "Fn::GetAtt": [API_ID, "ApiId"] })
}

fn data_source(table: &TableSchema, name: &str) -> Value {
    json!({
        "Type": "AWS::AppSync::DataSource",
        "Properties": {
            "ApiId": api_id(),
            "Name": name,
            "Type": "AMAZON_DYNAMODB",
            "ServiceRoleArn": { "Ref": ROLE_PARAMETER },
            "DynamoDBConfig": {
                "TableName": { "Fn::ImportValue": table_export_name(&table.name) },
                "AwsRegion": { "Ref": "AWS::Region" },
            },
        },
    })
}

fn resolver(table: &TableSchema, op: &OperationDecl, source: &str) -> Result<Value> {
    Ok(json!({
        "Type": "AWS::AppSync::Resolver",
        "DependsOn": [SCHEMA_ID, source],
        "Properties": {
            "ApiId": api_id(),
            "TypeName": op.kind.type_name(),
            "FieldName": op.name,
            "DataSourceName": { "Fn::GetAtt": [source, "Name"] },
            "Kind": "UNIT",
            "Runtime": { "Name": "APPSYNC_JS", "RuntimeVersion": "1.0.0" },
            "Code": resolver_code(table, op)?,
        },
    }))
}

/// Resolver source for one operation
fn resolver_code(table: &TableSchema, op: &OperationDecl) -> Result<String> {
    let keys = table.primary_key();
    let entity = &table.name;

    let (request, list) = if op.name == mutation_name("create", entity) {
        (
            format!(
                "  const {{ input }} = ctx.args;\n  return ddb.put({{ key: {{ {} }}, item: input }});\n",
                key_from_input(&keys)
            ),
            false,
        )
    } else if op.name == mutation_name("update", entity) {
        (
            format!(
                "  const {{ {}, ...values }} = ctx.args.input;\n  return ddb.update({{ key: {{ {} }}, update: values }});\n",
                keys.join(", "),
                keys.join(", ")
            ),
            false,
        )
    } else if op.name == mutation_name("delete", entity) {
        (
            format!(
                "  const {{ input }} = ctx.args;\n  return ddb.remove({{ key: {{ {} }} }});\n",
                key_from_input(&keys)
            ),
            false,
        )
    } else {
        let key = query_key(table, &op.name).ok_or_else(|| {
            Error::render(entity, format!("no resolver for operation `{}`", op.name))
        })?;
        (query_request(table, &key), true)
    };

    let data = if list { "ctx.result.items" } else { "ctx.result" };
    Ok(format!(
        "import * as ddb from '@aws-appsync/utils/dynamodb';\n\n\
         export function request(ctx) {{\n{}}}\n\n\
         export function response(ctx) {{\n  \
         if (ctx.error) {{\n    return {{ statusCode: 500, message: ctx.error.message, data: null }};\n  }}\n  \
         return {{ statusCode: 200, message: null, data: {} }};\n}}\n",
        request, data
    ))
}

fn key_from_input(keys: &[&str]) -> String {
    keys.iter()
        .map(|k| format!("{0}: input.{0}", k))
        .collect::<Vec<_>>()
        .join(", ")
}

/// First query key whose operation carries `name`, the one that won deduplication
fn query_key(table: &TableSchema, name: &str) -> Option<QueryKey> {
    table.query_keys().into_iter().find(|key| {
        let required: Vec<&str> = key.required.iter().map(String::as_str).collect();
        query_operation_name(&table.name, &required) == name
    })
}

fn query_request(table: &TableSchema, key: &QueryKey) -> String {
    let conditions = key
        .required
        .iter()
        .map(|k| format!("{0}: {{ eq: input.{0} }}", k))
        .collect::<Vec<_>>()
        .join(", ");

    let mut code = String::from("  const { input } = ctx.args;\n");

    // the primary sort key alone cannot drive a key query
    if key.index.is_none() && key.required.first() != Some(&table.partition_key) {
        code.push_str(&format!("  return ddb.scan({{ filter: {{ {} }} }});\n", conditions));
        return code;
    }

    code.push_str(&format!("  const query = {{ {} }};\n", conditions));
    if let Some(optional) = &key.optional {
        code.push_str(&format!(
            "  if (input.{0} !== undefined && input.{0} !== null) {{\n    query.{0} = {{ eq: input.{0} }};\n  }}\n",
            optional
        ));
    }
    match &key.index {
        Some(index) => code.push_str(&format!(
            "  return ddb.query({{ query, index: '{}' }});\n",
            index
        )),
        None => code.push_str("  return ddb.query({ query });\n"),
    }
    code
}
