//! Combines base type definitions with every collected plugin extension.
//!
//! Merging happens in two passes over the fragments in registration order
//! (base files first, then plugins): type definitions first, then `extend`
//! blocks. A plugin may therefore extend a type that a later plugin defines.
//! Type and field order in the output is first-appearance order, so the
//! same inputs always print the same SDL.

use crate::collector::CollectedExtension;
use crate::directives::first_marker;
use crate::document::{
    SchemaDocument, SchemaSource, SourcedDocument, TypeKind, definition_shape, field_signature, input_value_signature, type_definition_name, type_extension_name,
};
use crate::error::{MergeConflict, SchemaError, SchemaResult};
use crate::resolver::{MergedResolvers, RegisteredResolver, ResolverMap};
use graphql_parser::schema::{
    Definition, Directive, DirectiveDefinition, Document, Field, InputValue, SchemaDefinition,
    TypeDefinition, TypeExtension,
};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::collections::btree_map::Entry;
use std::sync::Arc;
use tracing::debug;

/// The union of the base document and all extensions for one API type.
/// Built fresh for every build and consumed by the later stages.
#[derive(Debug, Clone)]
pub struct MergedSchemaDocument {
    document: SchemaDocument,
    type_sources: IndexMap<String, SchemaSource>,
}

impl MergedSchemaDocument {
    pub fn document(&self) -> &SchemaDocument {
        &self.document
    }

    pub fn into_document(self) -> SchemaDocument {
        self.document
    }

    /// The contributor whose definition of `type_name` was kept.
    pub fn defined_by(&self, type_name: &str) -> Option<&SchemaSource> {
        self.type_sources.get(type_name)
    }

    /// Type names in output order.
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.type_sources.keys().map(String::as_str)
    }
}

struct MergedType {
    definition: TypeDefinition<'static, String>,
    source: SchemaSource,
    /// First contributor of each field, input field, enum value or union member.
    members: HashMap<String, SchemaSource>,
}

#[derive(Default)]
struct Merger {
    schema: Option<(SchemaDefinition<'static, String>, SchemaSource)>,
    directives: IndexMap<String, (DirectiveDefinition<'static, String>, SchemaSource)>,
    types: IndexMap<String, MergedType>,
}

/// Merges base documents and extensions into one document.
pub fn merge_documents(
    base: &[SourcedDocument],
    extensions: &[CollectedExtension],
) -> SchemaResult<MergedSchemaDocument> {
    let fragments = base
        .iter()
        .map(|doc| (doc.source.clone(), &doc.document))
        .chain(
            extensions
                .iter()
                .map(|ext| (ext.source(), ext.extension.type_defs())),
        );

    let mut merger = Merger::default();
    let mut deferred = Vec::new();
    for (source, document) in fragments {
        for def in &document.definitions {
            match def {
                Definition::SchemaDefinition(schema) => merger.add_schema(schema, &source)?,
                Definition::DirectiveDefinition(directive) => {
                    merger.add_directive(directive, &source)?
                }
                Definition::TypeDefinition(td) => merger.add_type(td, &source)?,
                Definition::TypeExtension(te) => deferred.push((te, source.clone())),
            }
        }
    }
    for (extension, source) in deferred {
        merger.apply_extension(extension, &source)?;
    }

    let merged = merger.finish();
    debug!(types = merged.type_sources.len(), "Merged schema document");
    Ok(merged)
}

/// Merges core resolvers with every extension's resolvers. Exactly one
/// resolver may serve a field; a second one is a hard error.
pub fn merge_resolvers(
    core: &ResolverMap,
    extensions: &[CollectedExtension],
) -> SchemaResult<MergedResolvers> {
    let sources = std::iter::once((SchemaSource::Core, core)).chain(
        extensions
            .iter()
            .map(|ext| (ext.source(), ext.extension.resolvers())),
    );

    let mut merged = MergedResolvers::new();
    for (origin, resolvers) in sources {
        for (key, resolver) in resolvers {
            match merged.entry(key.clone()) {
                Entry::Occupied(existing) => {
                    return Err(SchemaError::ResolverConflict {
                        type_name: key.type_name.clone(),
                        field_name: key.field_name.clone(),
                        first: existing.get().origin.clone(),
                        second: origin,
                    });
                }
                Entry::Vacant(slot) => {
                    slot.insert(RegisteredResolver {
                        origin: origin.clone(),
                        resolver: Arc::clone(resolver),
                    });
                }
            }
        }
    }
    Ok(merged)
}

impl Merger {
    fn add_schema(
        &mut self,
        schema: &SchemaDefinition<'static, String>,
        source: &SchemaSource,
    ) -> SchemaResult<()> {
        match &self.schema {
            None => {
                self.schema = Some((schema.clone(), source.clone()));
                Ok(())
            }
            Some((existing, _)) if schema_roots(existing) == schema_roots(schema) => Ok(()),
            Some((_, first)) => Err(MergeConflict::SchemaDefinition {
                first: first.clone(),
                second: source.clone(),
            }
            .into()),
        }
    }

    fn add_directive(
        &mut self,
        directive: &DirectiveDefinition<'static, String>,
        source: &SchemaSource,
    ) -> SchemaResult<()> {
        match self.directives.get(&directive.name) {
            None => {
                self.directives
                    .insert(directive.name.clone(), (directive.clone(), source.clone()));
                Ok(())
            }
            Some((existing, _))
                if directive_definition_shape(existing) == directive_definition_shape(directive) =>
            {
                Ok(())
            }
            Some((_, first)) => Err(MergeConflict::DirectiveDefinition {
                name: directive.name.clone(),
                first: first.clone(),
                second: source.clone(),
            }
            .into()),
        }
    }

    fn add_type(
        &mut self,
        definition: &TypeDefinition<'static, String>,
        source: &SchemaSource,
    ) -> SchemaResult<()> {
        let name = type_definition_name(definition);
        let Some(existing) = self.types.get(name) else {
            self.types.insert(
                name.to_string(),
                MergedType {
                    definition: definition.clone(),
                    source: source.clone(),
                    members: member_names(definition)
                        .into_iter()
                        .map(|member| (member, source.clone()))
                        .collect(),
                },
            );
            return Ok(());
        };

        let first_kind = TypeKind::of_definition(&existing.definition);
        let second_kind = TypeKind::of_definition(definition);
        if first_kind != second_kind {
            return Err(MergeConflict::TypeKind {
                type_name: name.to_string(),
                first_kind,
                first: existing.source.clone(),
                second_kind,
                second: source.clone(),
            }
            .into());
        }
        if definition_shape(&existing.definition) != definition_shape(definition) {
            return Err(MergeConflict::TypeShape {
                type_name: name.to_string(),
                first: existing.source.clone(),
                second: source.clone(),
            }
            .into());
        }
        debug!(type_name = name, first = %existing.source, duplicate = %source, "Deduplicated identical type definition");
        Ok(())
    }

    fn apply_extension(
        &mut self,
        extension: &TypeExtension<'static, String>,
        source: &SchemaSource,
    ) -> SchemaResult<()> {
        let name = type_extension_name(extension);
        let Some(target) = self.types.get_mut(name) else {
            return Err(MergeConflict::UnknownExtensionTarget {
                type_name: name.to_string(),
                origin: source.clone(),
            }
            .into());
        };
        let MergedType {
            definition,
            source: defined_by,
            members,
        } = target;

        match (definition, extension) {
            (TypeDefinition::Object(obj), TypeExtension::Object(ext)) => {
                for interface in &ext.implements_interfaces {
                    if !obj.implements_interfaces.contains(interface) {
                        obj.implements_interfaces.push(interface.clone());
                    }
                }
                union_directives(&mut obj.directives, &ext.directives);
                for field in &ext.fields {
                    merge_field(name, &mut obj.fields, members, field, source)?;
                }
            }
            (TypeDefinition::Interface(iface), TypeExtension::Interface(ext)) => {
                union_directives(&mut iface.directives, &ext.directives);
                for field in &ext.fields {
                    merge_field(name, &mut iface.fields, members, field, source)?;
                }
            }
            (TypeDefinition::InputObject(input), TypeExtension::InputObject(ext)) => {
                union_directives(&mut input.directives, &ext.directives);
                for field in &ext.fields {
                    merge_input_field(name, &mut input.fields, members, field, source)?;
                }
            }
            (TypeDefinition::Enum(enum_type), TypeExtension::Enum(ext)) => {
                union_directives(&mut enum_type.directives, &ext.directives);
                for value in &ext.values {
                    match enum_type.values.iter_mut().find(|v| v.name == value.name) {
                        Some(existing) => union_directives(&mut existing.directives, &value.directives),
                        None => {
                            members.insert(value.name.clone(), source.clone());
                            enum_type.values.push(value.clone());
                        }
                    }
                }
            }
            (TypeDefinition::Union(union_type), TypeExtension::Union(ext)) => {
                union_directives(&mut union_type.directives, &ext.directives);
                for member in &ext.types {
                    if !union_type.types.contains(member) {
                        members.insert(member.clone(), source.clone());
                        union_type.types.push(member.clone());
                    }
                }
            }
            (TypeDefinition::Scalar(scalar), TypeExtension::Scalar(ext)) => {
                union_directives(&mut scalar.directives, &ext.directives);
            }
            (definition, extension) => {
                return Err(MergeConflict::ExtensionKind {
                    type_name: name.to_string(),
                    origin: source.clone(),
                    extension_kind: TypeKind::of_extension(extension),
                    defined_by: defined_by.clone(),
                    defined_kind: TypeKind::of_definition(definition),
                }
                .into());
            }
        }
        Ok(())
    }

    fn finish(self) -> MergedSchemaDocument {
        let mut definitions = Vec::with_capacity(self.types.len() + self.directives.len() + 1);
        if let Some((schema, _)) = self.schema {
            definitions.push(Definition::SchemaDefinition(schema));
        }
        definitions.extend(
            self.directives
                .into_values()
                .map(|(directive, _)| Definition::DirectiveDefinition(directive)),
        );
        let mut type_sources = IndexMap::with_capacity(self.types.len());
        for (name, merged) in self.types {
            type_sources.insert(name, merged.source);
            definitions.push(Definition::TypeDefinition(merged.definition));
        }
        MergedSchemaDocument {
            document: Document { definitions },
            type_sources,
        }
    }
}

fn merge_field(
    type_name: &str,
    fields: &mut Vec<Field<'static, String>>,
    members: &mut HashMap<String, SchemaSource>,
    field: &Field<'static, String>,
    source: &SchemaSource,
) -> SchemaResult<()> {
    if let Some(existing) = fields.iter_mut().find(|f| f.name == field.name) {
        let first_signature = field_signature(existing);
        let second_signature = field_signature(field);
        if first_signature != second_signature {
            return Err(MergeConflict::Field {
                type_name: type_name.to_string(),
                field_name: field.name.clone(),
                first: members.get(&field.name).cloned().unwrap_or_else(|| source.clone()),
                first_signature,
                second: source.clone(),
                second_signature,
            }
            .into());
        }
        union_directives(&mut existing.directives, &field.directives);
        debug!(type_name, field = %field.name, %source, "Deduplicated identical field");
        return Ok(());
    }
    reject_marked_new_member(type_name, &field.name, &field.directives, source)?;
    members.insert(field.name.clone(), source.clone());
    fields.push(field.clone());
    Ok(())
}

fn merge_input_field(
    type_name: &str,
    fields: &mut Vec<InputValue<'static, String>>,
    members: &mut HashMap<String, SchemaSource>,
    field: &InputValue<'static, String>,
    source: &SchemaSource,
) -> SchemaResult<()> {
    if let Some(existing) = fields.iter_mut().find(|f| f.name == field.name) {
        let first_signature = input_value_signature(existing);
        let second_signature = input_value_signature(field);
        if first_signature != second_signature {
            return Err(MergeConflict::Field {
                type_name: type_name.to_string(),
                field_name: field.name.clone(),
                first: members.get(&field.name).cloned().unwrap_or_else(|| source.clone()),
                first_signature,
                second: source.clone(),
                second_signature,
            }
            .into());
        }
        union_directives(&mut existing.directives, &field.directives);
        return Ok(());
    }
    reject_marked_new_member(type_name, &field.name, &field.directives, source)?;
    members.insert(field.name.clone(), source.clone());
    fields.push(field.clone());
    Ok(())
}

/// A marker inside an `extend` block must target a field some definition
/// already declares; marking a brand-new field has nothing to act on.
fn reject_marked_new_member(
    type_name: &str,
    member: &str,
    directives: &[Directive<'static, String>],
    source: &SchemaSource,
) -> SchemaResult<()> {
    match first_marker(directives) {
        Some(marker) => Err(SchemaError::DirectiveMisuse {
            directive: marker.to_string(),
            location: format!("{type_name}.{member}"),
            reason: format!("{source} marks a field that no definition of '{type_name}' declares"),
        }),
        None => Ok(()),
    }
}

fn union_directives(
    existing: &mut Vec<Directive<'static, String>>,
    incoming: &[Directive<'static, String>],
) {
    for directive in incoming {
        if !existing.iter().any(|d| d.name == directive.name) {
            existing.push(directive.clone());
        }
    }
}

fn member_names(definition: &TypeDefinition<'static, String>) -> Vec<String> {
    match definition {
        TypeDefinition::Scalar(_) => Vec::new(),
        TypeDefinition::Object(t) => t.fields.iter().map(|f| f.name.clone()).collect(),
        TypeDefinition::Interface(t) => t.fields.iter().map(|f| f.name.clone()).collect(),
        TypeDefinition::Union(t) => t.types.clone(),
        TypeDefinition::Enum(t) => t.values.iter().map(|v| v.name.clone()).collect(),
        TypeDefinition::InputObject(t) => t.fields.iter().map(|f| f.name.clone()).collect(),
    }
}

fn schema_roots<'a>(
    schema: &'a SchemaDefinition<'static, String>,
) -> (Option<&'a String>, Option<&'a String>, Option<&'a String>) {
    (
        schema.query.as_ref(),
        schema.mutation.as_ref(),
        schema.subscription.as_ref(),
    )
}

fn directive_definition_shape(directive: &DirectiveDefinition<'static, String>) -> String {
    let args: Vec<String> = directive.arguments.iter().map(input_value_signature).collect();
    let locations: Vec<&str> = directive.locations.iter().map(|l| l.as_str()).collect();
    format!(
        "@{}({}){} on {}",
        directive.name,
        args.join(", "),
        if directive.repeatable { " repeatable" } else { "" },
        locations.join(" | ")
    )
}
