//! Client operation documents for one table

use std::collections::BTreeSet;

use crate::generators::fragments::OperationDecl;
use crate::generators::graphql::selection_set;
use crate::generators::GENERATED_BANNER;
use crate::ir::SchemaCatalog;
use crate::naming::to_pascal_case;

/// Operation documents plus typed variables and results for every operation of `entity`
pub fn generate_operations_module(
    entity: &str,
    operations: &[OperationDecl],
    catalog: &SchemaCatalog,
) -> String {
    let mut code = format!("// {}\n\n", GENERATED_BANNER);

    let types: BTreeSet<&str> = operations
        .iter()
        .flat_map(|op| [op.input_type.as_str(), op.result_type.as_str()])
        .collect();
    if !types.is_empty() {
        code.push_str("import type {\n");
        for name in &types {
            code.push_str(&format!("  {},\n", name));
        }
        code.push_str(&format!("}} from './{}.model';\n", entity));
    }

    let selection = selection_set(catalog, entity, 8);
    for op in operations {
        code.push('\n');
        code.push_str(&generate_operation(op, &selection));
    }

    code
}

fn generate_operation(op: &OperationDecl, selection: &str) -> String {
    let pascal = to_pascal_case(&op.name);
    let mut code = format!("export const {} = /* GraphQL */ `\n", op.name);
    code.push_str(&format!(
        "  {} {}($input: {}!) {{\n",
        op.kind.keyword(),
        pascal,
        op.input_type
    ));
    code.push_str(&format!("    {}(input: $input) {{\n", op.name));
    code.push_str("      statusCode\n");
    code.push_str("      message\n");
    if selection.is_empty() {
        code.push_str("      data\n");
    } else {
        code.push_str("      data {\n");
        code.push_str(selection);
        code.push_str("      }\n");
    }
    code.push_str("    }\n");
    code.push_str("  }\n");
    code.push_str("`;\n\n");

    code.push_str(&format!(
        "export type {}Variables = {{ input: {} }};\n",
        pascal, op.input_type
    ));
    code.push_str(&format!(
        "export type {}Result = {{ {}: {} }};\n",
        pascal, op.name, op.result_type
    ));
    code
}
