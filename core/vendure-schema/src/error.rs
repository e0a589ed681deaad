//! Error types for the schema pipeline.

use crate::document::{SchemaSource, TypeKind};
use crate::resolver::ResolverKey;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for schema pipeline operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors that abort a schema build. No partial schema is ever produced.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("failed to parse GraphQL SDL from {origin}: {message}")]
    Parse { origin: String, message: String },

    #[error("failed to read type definitions from {}: {error}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    #[error(transparent)]
    MergeConflict(#[from] MergeConflict),

    #[error("resolver conflict on {type_name}.{field_name}: supplied by both {first} and {second}")]
    ResolverConflict {
        type_name: String,
        field_name: String,
        first: SchemaSource,
        second: SchemaSource,
    },

    #[error("directive @{directive} misused on {location}: {reason}")]
    DirectiveMisuse {
        directive: String,
        location: String,
        reason: String,
    },

    #[error("invalid custom field '{entity}.{field}': {reason}")]
    CustomField {
        entity: String,
        field: String,
        reason: String,
    },

    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error("invalid schema configuration: {0}")]
    Config(String),
}

/// Two contributors disagree about a type, field or root definition.
/// Every variant names both sides so the plugin author can fix it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeConflict {
    #[error("type '{type_name}' is defined as {first_kind} by {first} and as {second_kind} by {second}")]
    TypeKind {
        type_name: String,
        first_kind: TypeKind,
        first: SchemaSource,
        second_kind: TypeKind,
        second: SchemaSource,
    },

    #[error("type '{type_name}' is defined differently by {first} and {second}")]
    TypeShape {
        type_name: String,
        first: SchemaSource,
        second: SchemaSource,
    },

    #[error(
        "field '{type_name}.{field_name}' is declared as `{first_signature}` by {first} \
         and as `{second_signature}` by {second}"
    )]
    Field {
        type_name: String,
        field_name: String,
        first: SchemaSource,
        first_signature: String,
        second: SchemaSource,
        second_signature: String,
    },

    #[error("{origin} extends unknown type '{type_name}'")]
    UnknownExtensionTarget { type_name: String, origin: SchemaSource },

    #[error(
        "{origin} extends '{type_name}' as {extension_kind}, but {defined_by} defines it as {defined_kind}"
    )]
    ExtensionKind {
        type_name: String,
        origin: SchemaSource,
        extension_kind: TypeKind,
        defined_by: SchemaSource,
        defined_kind: TypeKind,
    },

    #[error("schema root operation types differ between {first} and {second}")]
    SchemaDefinition { first: SchemaSource, second: SchemaSource },

    #[error("directive '@{name}' is declared differently by {first} and {second}")]
    DirectiveDefinition {
        name: String,
        first: SchemaSource,
        second: SchemaSource,
    },
}

/// A single GraphQL language rule violation found in an assembled document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("unknown type '{type_name}' referenced by {referenced_by}")]
    UnknownType {
        type_name: String,
        referenced_by: String,
    },

    #[error("{referenced_by} must be an output type, but '{type_name}' is an input object")]
    NotOutputType {
        type_name: String,
        referenced_by: String,
    },

    #[error("{referenced_by} must be an input type, but '{type_name}' is {kind}")]
    NotInputType {
        type_name: String,
        kind: TypeKind,
        referenced_by: String,
    },

    #[error("union '{union_name}' includes '{member}', which is not an object type")]
    UnionMemberNotObject { union_name: String, member: String },

    #[error("type '{type_name}' implements unknown interface '{interface}'")]
    UnknownInterface { type_name: String, interface: String },

    #[error("type '{type_name}' implements '{interface}', which is {kind}, not an interface")]
    NotAnInterface {
        type_name: String,
        interface: String,
        kind: TypeKind,
    },

    #[error("type '{type_name}' does not provide field '{field}' required by interface '{interface}'")]
    MissingInterfaceField {
        type_name: String,
        interface: String,
        field: String,
    },

    #[error(
        "field '{type_name}.{field}' has type `{found}`, which is not compatible with `{expected}` \
         required by interface '{interface}'"
    )]
    InvalidInterfaceField {
        type_name: String,
        interface: String,
        field: String,
        expected: String,
        found: String,
    },

    #[error("root {operation} type '{type_name}' is not defined as an object type")]
    MissingRootType { operation: String, type_name: String },

    #[error("'{type_name}' declares '{member}' more than once")]
    DuplicateMember { type_name: String, member: String },

    #[error("{kind} '{type_name}' must define at least one member")]
    EmptyType { type_name: String, kind: TypeKind },

    #[error("unknown directive '@{directive}' used on {location}")]
    UnknownDirective { directive: String, location: String },

    #[error("directive '@{directive}' may not be used on {location} ({found}); allowed on {allowed}")]
    MisplacedDirective {
        directive: String,
        location: String,
        found: String,
        allowed: String,
    },

    #[error("directive '@{directive}' on {location} has no argument '{argument}'")]
    UnknownDirectiveArgument {
        directive: String,
        location: String,
        argument: String,
    },

    #[error("directive '@{directive}' on {location} is missing required argument '{argument}'")]
    MissingDirectiveArgument {
        directive: String,
        location: String,
        argument: String,
    },

    #[error("directive '@{directive}' is not repeatable but is used more than once on {location}")]
    RepeatedDirective { directive: String, location: String },

    #[error("schema directive '@{directive}' on {location} was not resolved before building")]
    UnresolvedMarker { directive: String, location: String },

    #[error("type extension for '{type_name}' was not merged before building")]
    UnmergedExtension { type_name: String },

    #[error("{origin} supplies a resolver for '{type_name}.{field_name}', which is not in the schema")]
    ResolverWithoutField {
        type_name: String,
        field_name: String,
        origin: SchemaSource,
    },
}

/// Every violation found in one validation pass, in discovery order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    pub fn new(errors: Vec<ValidationError>) -> Self {
        Self(errors)
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<ValidationError> {
        self.0
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "schema validation failed with {} error(s)", self.0.len())?;
        for error in &self.0 {
            write!(f, "\n  - {error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Failure to produce a field value from an [`ExecutableSchema`](crate::ExecutableSchema).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("'{type_name}' has no field '{field_name}'")]
    UnknownField {
        type_name: String,
        field_name: String,
    },

    #[error("resolver for {key} failed: {message}")]
    Resolver { key: ResolverKey, message: String },

    #[error("non-null field {key} resolved to null")]
    NullForNonNull { key: ResolverKey },
}
