//! Assembles the schema for one API surface.
//!
//! Stages, in order:
//! 1. load base type definitions
//! 2. collect the plugin extensions targeting the API
//! 3. merge type definitions, then `extend` blocks, then resolvers
//! 4. add extension scalars and configured custom fields
//! 5. apply schema directives
//! 6. generate list options
//! 7. validate, reporting every violation at once
//!
//! Any failure aborts the build; no partial schema is returned.

use crate::collector::{CollectedExtension, collect_extensions};
use crate::config::{BuildOptions, SchemaConfig, SchemaOutput};
use crate::custom_fields::add_custom_fields;
use crate::directives::transform_directives;
use crate::document::{SchemaDocument, find_type, parse_generated, print_sdl};
use crate::error::SchemaResult;
use crate::executable::ExecutableSchema;
use crate::list_options::generate_list_options;
use crate::merger::{merge_documents, merge_resolvers};
use crate::validation::validate;
use std::collections::BTreeSet;
use tracing::{debug, info};

/// The result of a build.
#[derive(Debug, Clone)]
pub enum BuiltSchema {
    Executable(ExecutableSchema),
    Sdl(String),
}

impl BuiltSchema {
    pub fn sdl(&self) -> &str {
        match self {
            Self::Executable(schema) => schema.sdl(),
            Self::Sdl(sdl) => sdl,
        }
    }

    pub fn into_sdl(self) -> String {
        match self {
            Self::Executable(schema) => schema.sdl().to_string(),
            Self::Sdl(sdl) => sdl,
        }
    }

    pub fn into_executable(self) -> Option<ExecutableSchema> {
        match self {
            Self::Executable(schema) => Some(schema),
            Self::Sdl(_) => None,
        }
    }
}

/// Builds the schema for `options.api_type`.
///
/// Builds for different API types share no state and may run concurrently.
/// The same configuration and plugin order always yield identical SDL.
pub fn build_schema(config: &SchemaConfig, options: &BuildOptions) -> SchemaResult<BuiltSchema> {
    config.check()?;
    let api_type = options.api_type;
    info!(api = %api_type, plugins = config.plugins.len(), "Building schema");

    let base = options.types_loader.load(&options.type_paths)?;
    let extensions = collect_extensions(&config.plugins, api_type);
    debug!(api = %api_type, base_documents = base.len(), extensions = extensions.len(), "Inputs loaded");

    let merged = merge_documents(&base, &extensions)?;
    let resolvers = merge_resolvers(&config.base_resolvers, &extensions)?;

    let document = inject_scalars(merged.into_document(), &extensions)?;
    let document = add_custom_fields(&document, &config.custom_fields, api_type)?;
    let document = transform_directives(&document)?;
    let document = generate_list_options(&document)?;
    validate(&document, &resolvers)?;

    let sdl = print_sdl(&document);
    info!(
        api = %api_type,
        definitions = document.definitions.len(),
        resolvers = resolvers.len(),
        "Schema built"
    );

    Ok(match options.output {
        SchemaOutput::Sdl => BuiltSchema::Sdl(sdl),
        SchemaOutput::Executable => {
            BuiltSchema::Executable(ExecutableSchema::new(api_type, document, sdl, resolvers))
        }
    })
}

/// Declares every scalar an extension relies on that no definition provides.
fn inject_scalars(
    mut document: SchemaDocument,
    extensions: &[CollectedExtension],
) -> SchemaResult<SchemaDocument> {
    let missing: BTreeSet<&str> = extensions
        .iter()
        .flat_map(|ext| ext.extension.scalars())
        .map(String::as_str)
        .filter(|name| find_type(&document, name).is_none())
        .collect();
    if missing.is_empty() {
        return Ok(document);
    }
    let sdl: String = missing.iter().map(|name| format!("scalar {name}\n")).collect();
    document.definitions.extend(parse_generated("scalar", &sdl)?);
    debug!(scalars = ?missing, "Injected extension scalars");
    Ok(document)
}
