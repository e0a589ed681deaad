//! Generates `<X>ListOptions` inputs for paginated list queries.
//!
//! A query field such as `products(options: ProductListOptions): ProductList!`
//! only has to name its options type; the sort and filter parameters are
//! derived from the fields of the list's item type.

use crate::document::{
    SchemaDocument, find_type, is_list, named_type, parse_generated, push_sdl_block,
    query_type_name,
};
use crate::error::SchemaResult;
use graphql_parser::schema::TypeDefinition;
use std::collections::HashSet;
use tracing::debug;

const SORTABLE: [&str; 6] = ["ID", "String", "Int", "Float", "DateTime", "Money"];

/// Adds every missing `<X>ListOptions` input referenced from the query type.
pub fn generate_list_options(document: &SchemaDocument) -> SchemaResult<SchemaDocument> {
    let mut result = document.clone();
    let query = query_type_name(document);
    let Some(TypeDefinition::Object(query_type)) = find_type(document, &query) else {
        return Ok(result);
    };

    let mut generated = HashSet::new();
    let mut sdl = String::new();
    for field in &query_type.fields {
        let list_type = named_type(&field.field_type);
        let Some(prefix) = list_type.strip_suffix("List") else {
            continue;
        };
        let options_name = format!("{prefix}ListOptions");
        let has_options_arg = field
            .arguments
            .iter()
            .any(|arg| arg.name == "options" && named_type(&arg.value_type) == options_name);
        if !has_options_arg
            || find_type(document, &options_name).is_some()
            || !generated.insert(options_name.clone())
        {
            continue;
        }
        let Some(item_type) = list_item_type(document, list_type) else {
            debug!(list = list_type, "List type has no items field, skipping list options");
            generated.remove(&options_name);
            continue;
        };
        write_options(&mut sdl, document, prefix, item_type);
    }

    if !sdl.is_empty() {
        result
            .definitions
            .extend(parse_generated("list options", &sdl)?);
        debug!(count = generated.len(), "Generated list options");
    }
    Ok(result)
}

fn list_item_type<'d>(document: &'d SchemaDocument, list_type: &str) -> Option<&'d str> {
    match find_type(document, list_type)? {
        TypeDefinition::Object(list) => list
            .fields
            .iter()
            .find(|f| f.name == "items")
            .map(|f| named_type(&f.field_type)),
        _ => None,
    }
}

fn write_options(sdl: &mut String, document: &SchemaDocument, prefix: &str, item_type: &str) {
    let defined = |name: &str| find_type(document, name).is_some();
    let mut sort_fields = Vec::new();
    let mut filter_fields = Vec::new();
    if let Some(TypeDefinition::Object(item)) = find_type(document, item_type) {
        for field in item.fields.iter().filter(|f| !is_list(&f.field_type)) {
            let type_name = named_type(&field.field_type);
            if SORTABLE.contains(&type_name) {
                sort_fields.push(field.name.as_str());
            }
            if let Some(operators) = filter_operators(document, type_name).filter(|op| defined(*op)) {
                filter_fields.push((field.name.as_str(), operators));
            }
        }
    }

    let sort_name = format!("{prefix}SortParameter");
    let filter_name = format!("{prefix}FilterParameter");
    let has_sort = !sort_fields.is_empty() && defined("SortOrder");
    let has_filter = !filter_fields.is_empty();

    if has_sort && !defined(&sort_name) {
        push_sdl_block(
            sdl,
            &format!("input {sort_name}"),
            sort_fields.iter().map(|name| format!("{name}: SortOrder")),
        );
    }
    if has_filter && !defined(&filter_name) {
        push_sdl_block(
            sdl,
            &format!("input {filter_name}"),
            filter_fields
                .iter()
                .map(|(name, operators)| format!("{name}: {operators}")),
        );
    }

    let mut options = vec!["skip: Int".to_string(), "take: Int".to_string()];
    if has_sort {
        options.push(format!("sort: {sort_name}"));
    }
    if has_filter {
        options.push(format!("filter: {filter_name}"));
    }
    if defined("LogicalOperator") {
        options.push("filterOperator: LogicalOperator".to_string());
    }
    push_sdl_block(sdl, &format!("input {prefix}ListOptions"), options);
}

fn filter_operators(document: &SchemaDocument, type_name: &str) -> Option<&'static str> {
    match type_name {
        "String" => Some("StringOperators"),
        "ID" => Some("IDOperators"),
        "Int" | "Float" | "Money" => Some("NumberOperators"),
        "Boolean" => Some("BooleanOperators"),
        "DateTime" => Some("DateOperators"),
        other => match find_type(document, other) {
            Some(TypeDefinition::Enum(_)) => Some("StringOperators"),
            _ => None,
        },
    }
}
