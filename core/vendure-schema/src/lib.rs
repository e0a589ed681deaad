//! GraphQL schema assembly for the Vendure admin and shop APIs.
//!
//! Base type definitions are loaded from disk, combined with the schema
//! extensions contributed by plugins, reshaped by the `@vendureRemove` and
//! `@vendureMakeNullable` schema directives, and validated into a single
//! schema per API surface.
//!
//! The entry point is [`build_schema`]. Each stage is also public so a
//! server can run it on its own (e.g. merging without validation in a
//! schema linter).

mod builder;
mod collector;
mod config;
mod custom_fields;
mod directives;
mod document;
mod error;
mod executable;
mod extension;
mod list_options;
mod loader;
mod merger;
mod plugin;
mod resolver;
mod schema_info;
mod validation;

pub use builder::{BuiltSchema, build_schema};
pub use collector::{CollectedExtension, collect_extensions};
pub use config::{BuildOptions, SchemaConfig, SchemaOutput};
pub use custom_fields::{CustomFieldConfig, CustomFieldType, CustomFields, add_custom_fields};
pub use directives::{
    MAKE_NULLABLE_DIRECTIVE, REMOVE_DIRECTIVE, is_marker, transform_directives, unwrap_non_null,
};
pub use document::{
    BUILT_IN_SCALARS, SchemaDocument, SchemaSource, SourcedDocument, TypeKind, TypeRef,
    find_type, named_type, parse_sdl, print_sdl, query_type_name, type_ref_string,
};
pub use error::{
    MergeConflict, ResolveError, SchemaError, SchemaResult, ValidationError, ValidationErrors,
};
pub use executable::ExecutableSchema;
pub use extension::{ApiExtension, ApiTarget, SchemaExtension};
pub use list_options::generate_list_options;
pub use loader::{FileTypesLoader, InMemoryTypesLoader, TypesLoader, api_type_paths};
pub use merger::{MergedSchemaDocument, merge_documents, merge_resolvers};
pub use plugin::{VendurePlugin, VendurePluginBuilder};
pub use resolver::{
    FieldResolver, FnResolver, MergedResolvers, RegisteredResolver, ResolverContext, ResolverKey,
    ResolverMap, resolver_fn,
};
pub use schema_info::{FieldInfo, SchemaInfo, schema_info};
pub use validation::validate;

pub use vendure_types::ApiType;
