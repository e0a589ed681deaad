//! Schema directives that reshape fields before the schema is built.
//!
//! - `@vendureRemove` deletes the field from its object or input object type.
//! - `@vendureMakeNullable` removes the outermost non-null wrapper. A second
//!   application on the same field targets the list item type, so `[ID!]!`
//!   becomes `[ID!]` after one application and `[ID]` after two. A field
//!   whose outermost wrapper is already nullable is left alone: `[ID!]`
//!   stays `[ID!]`.
//!
//! All removals are applied before any nullability change, so a field
//! carrying both markers is simply removed. The transformer returns a new
//! document and strips every marker usage and declaration; running it again
//! on its own output changes nothing.

use crate::document::{SchemaDocument, TypeRef, type_definition_name, type_extension_name};
use crate::error::{SchemaError, SchemaResult};
use graphql_parser::schema::{
    Definition, Directive, Field, InputValue, Type, TypeDefinition, TypeExtension,
};
use tracing::debug;

pub const REMOVE_DIRECTIVE: &str = "vendureRemove";
pub const MAKE_NULLABLE_DIRECTIVE: &str = "vendureMakeNullable";

/// Whether a directive name is one of the pipeline's own field markers.
pub fn is_marker(name: &str) -> bool {
    name == REMOVE_DIRECTIVE || name == MAKE_NULLABLE_DIRECTIVE
}

pub(crate) fn first_marker<'a>(directives: &'a [Directive<'static, String>]) -> Option<&'a str> {
    directives
        .iter()
        .map(|d| d.name.as_str())
        .find(|name| is_marker(name))
}

fn count_directive(directives: &[Directive<'static, String>], name: &str) -> usize {
    directives.iter().filter(|d| d.name == name).count()
}

/// Applies `@vendureRemove` then `@vendureMakeNullable` to a copy of the
/// document and strips the markers.
pub fn transform_directives(document: &SchemaDocument) -> SchemaResult<SchemaDocument> {
    check_marker_placement(document)?;

    let mut transformed = document.clone();
    transformed.definitions.retain(|def| {
        !matches!(def, Definition::DirectiveDefinition(d) if is_marker(&d.name))
    });

    let removed = apply_removals(&mut transformed);
    let relaxed = apply_nullability(&mut transformed);
    if removed > 0 || relaxed > 0 {
        debug!(removed, relaxed, "Applied schema directives");
    }
    Ok(transformed)
}

/// Removes the outermost non-null wrapper, if there is one.
pub fn unwrap_non_null(ty: TypeRef) -> TypeRef {
    match ty {
        Type::NonNullType(inner) => *inner,
        other => other,
    }
}

/// Applies `applications` nullability markers. Each one unwraps the
/// outermost `!` of the current layer, then moves into the list item type.
/// Stops at the first layer that is already nullable.
fn make_nullable(ty: TypeRef, applications: usize) -> TypeRef {
    if applications == 0 {
        return ty;
    }
    match ty {
        Type::NonNullType(inner) => match *inner {
            Type::ListType(item) => {
                Type::ListType(Box::new(make_nullable(*item, applications - 1)))
            }
            other => other,
        },
        other => other,
    }
}

fn apply_removals(document: &mut SchemaDocument) -> usize {
    let mut removed = 0;
    for def in &mut document.definitions {
        match def {
            Definition::TypeDefinition(TypeDefinition::Object(t)) => {
                removed += remove_fields(&mut t.fields);
            }
            Definition::TypeExtension(TypeExtension::Object(t)) => {
                removed += remove_fields(&mut t.fields);
            }
            Definition::TypeDefinition(TypeDefinition::InputObject(t)) => {
                removed += remove_input_fields(&mut t.fields);
            }
            Definition::TypeExtension(TypeExtension::InputObject(t)) => {
                removed += remove_input_fields(&mut t.fields);
            }
            _ => {}
        }
    }
    removed
}

fn remove_fields(fields: &mut Vec<Field<'static, String>>) -> usize {
    let before = fields.len();
    fields.retain(|f| count_directive(&f.directives, REMOVE_DIRECTIVE) == 0);
    before - fields.len()
}

fn remove_input_fields(fields: &mut Vec<InputValue<'static, String>>) -> usize {
    let before = fields.len();
    fields.retain(|f| count_directive(&f.directives, REMOVE_DIRECTIVE) == 0);
    before - fields.len()
}

fn apply_nullability(document: &mut SchemaDocument) -> usize {
    let mut relaxed = 0;
    for def in &mut document.definitions {
        match def {
            Definition::TypeDefinition(TypeDefinition::Object(t)) => {
                for field in &mut t.fields {
                    relaxed += relax(&mut field.field_type, &mut field.directives);
                }
            }
            Definition::TypeExtension(TypeExtension::Object(t)) => {
                for field in &mut t.fields {
                    relaxed += relax(&mut field.field_type, &mut field.directives);
                }
            }
            Definition::TypeDefinition(TypeDefinition::InputObject(t)) => {
                for field in &mut t.fields {
                    relaxed += relax(&mut field.value_type, &mut field.directives);
                }
            }
            Definition::TypeExtension(TypeExtension::InputObject(t)) => {
                for field in &mut t.fields {
                    relaxed += relax(&mut field.value_type, &mut field.directives);
                }
            }
            _ => {}
        }
    }
    relaxed
}

fn relax(ty: &mut TypeRef, directives: &mut Vec<Directive<'static, String>>) -> usize {
    let applications = count_directive(directives, MAKE_NULLABLE_DIRECTIVE);
    if applications > 0 {
        *ty = make_nullable(ty.clone(), applications);
    }
    directives.retain(|d| !is_marker(&d.name));
    applications
}

fn misuse(directive: &str, location: String, reason: &str) -> SchemaError {
    SchemaError::DirectiveMisuse {
        directive: directive.to_string(),
        location,
        reason: reason.to_string(),
    }
}

/// Rejects markers anywhere other than fields of object and input object
/// types, and markers given arguments.
fn check_marker_placement(document: &SchemaDocument) -> SchemaResult<()> {
    for def in &document.definitions {
        match def {
            Definition::SchemaDefinition(schema) => {
                if let Some(marker) = first_marker(&schema.directives) {
                    return Err(misuse(marker, "schema".into(), "only fields can be marked"));
                }
            }
            Definition::DirectiveDefinition(_) => {}
            Definition::TypeDefinition(td) => {
                let name = type_definition_name(td);
                match td {
                    TypeDefinition::Object(t) => {
                        check_type_level(name, &t.directives)?;
                        check_fields(name, &t.fields, true)?;
                    }
                    TypeDefinition::Interface(t) => {
                        check_type_level(name, &t.directives)?;
                        check_fields(name, &t.fields, false)?;
                    }
                    TypeDefinition::InputObject(t) => {
                        check_type_level(name, &t.directives)?;
                        check_input_fields(name, &t.fields)?;
                    }
                    TypeDefinition::Enum(t) => {
                        check_type_level(name, &t.directives)?;
                        for value in &t.values {
                            check_enum_value(name, &value.name, &value.directives)?;
                        }
                    }
                    TypeDefinition::Scalar(t) => check_type_level(name, &t.directives)?,
                    TypeDefinition::Union(t) => check_type_level(name, &t.directives)?,
                }
            }
            Definition::TypeExtension(te) => {
                let name = type_extension_name(te);
                match te {
                    TypeExtension::Object(t) => {
                        check_type_level(name, &t.directives)?;
                        check_fields(name, &t.fields, true)?;
                    }
                    TypeExtension::Interface(t) => {
                        check_type_level(name, &t.directives)?;
                        check_fields(name, &t.fields, false)?;
                    }
                    TypeExtension::InputObject(t) => {
                        check_type_level(name, &t.directives)?;
                        check_input_fields(name, &t.fields)?;
                    }
                    TypeExtension::Enum(t) => {
                        check_type_level(name, &t.directives)?;
                        for value in &t.values {
                            check_enum_value(name, &value.name, &value.directives)?;
                        }
                    }
                    TypeExtension::Scalar(t) => check_type_level(name, &t.directives)?,
                    TypeExtension::Union(t) => check_type_level(name, &t.directives)?,
                }
            }
        }
    }
    Ok(())
}

fn check_type_level(type_name: &str, directives: &[Directive<'static, String>]) -> SchemaResult<()> {
    match first_marker(directives) {
        Some(marker) => Err(misuse(
            marker,
            format!("type '{type_name}'"),
            "only fields of object and input object types can be marked",
        )),
        None => Ok(()),
    }
}

fn check_marker_arguments(location: &str, directives: &[Directive<'static, String>]) -> SchemaResult<()> {
    match directives
        .iter()
        .find(|d| is_marker(&d.name) && !d.arguments.is_empty())
    {
        Some(d) => Err(misuse(&d.name, location.to_string(), "takes no arguments")),
        None => Ok(()),
    }
}

fn check_fields(
    type_name: &str,
    fields: &[Field<'static, String>],
    markable: bool,
) -> SchemaResult<()> {
    for field in fields {
        let location = format!("{type_name}.{}", field.name);
        if let Some(marker) = first_marker(&field.directives) {
            if !markable {
                return Err(misuse(
                    marker,
                    location,
                    "interface fields cannot be marked; mark the implementing type's field instead",
                ));
            }
        }
        check_marker_arguments(&location, &field.directives)?;
        for arg in &field.arguments {
            if let Some(marker) = first_marker(&arg.directives) {
                return Err(misuse(
                    marker,
                    format!("{location}({}:)", arg.name),
                    "arguments cannot be marked",
                ));
            }
        }
    }
    Ok(())
}

fn check_input_fields(type_name: &str, fields: &[InputValue<'static, String>]) -> SchemaResult<()> {
    for field in fields {
        check_marker_arguments(&format!("{type_name}.{}", field.name), &field.directives)?;
    }
    Ok(())
}

fn check_enum_value(
    type_name: &str,
    value: &str,
    directives: &[Directive<'static, String>],
) -> SchemaResult<()> {
    match first_marker(directives) {
        Some(marker) => Err(misuse(
            marker,
            format!("{type_name}.{value}"),
            "enum values cannot be marked",
        )),
        None => Ok(()),
    }
}
