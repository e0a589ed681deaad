//! Build configuration.

use crate::custom_fields::CustomFields;
use crate::error::{SchemaError, SchemaResult};
use crate::loader::{FileTypesLoader, TypesLoader};
use crate::plugin::VendurePlugin;
use crate::resolver::{FieldResolver, ResolverKey, ResolverMap};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use vendure_types::ApiType;

/// Application-level inputs shared by the admin and shop builds.
#[derive(Clone, Default)]
pub struct SchemaConfig {
    /// Registered plugins. Their order decides merge order.
    pub plugins: Vec<VendurePlugin>,
    pub custom_fields: CustomFields,
    /// Resolvers the core application provides for the base types.
    pub base_resolvers: ResolverMap,
}

impl SchemaConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_plugin(mut self, plugin: VendurePlugin) -> Self {
        self.plugins.push(plugin);
        self
    }

    pub fn with_custom_fields(mut self, custom_fields: CustomFields) -> Self {
        self.custom_fields = custom_fields;
        self
    }

    pub fn with_resolver(
        mut self,
        type_name: impl Into<String>,
        field_name: impl Into<String>,
        resolver: impl FieldResolver + 'static,
    ) -> Self {
        self.base_resolvers
            .insert(ResolverKey::new(type_name, field_name), Arc::new(resolver));
        self
    }

    /// Rejects configurations the pipeline cannot attribute unambiguously.
    pub fn check(&self) -> SchemaResult<()> {
        let mut names = HashSet::new();
        for plugin in &self.plugins {
            if !names.insert(plugin.name()) {
                return Err(SchemaError::Config(format!(
                    "plugin '{}' is registered more than once",
                    plugin.name()
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Debug for SchemaConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plugins: Vec<&str> = self.plugins.iter().map(VendurePlugin::name).collect();
        f.debug_struct("SchemaConfig")
            .field("plugins", &plugins)
            .field("custom_fields", &self.custom_fields)
            .field("base_resolvers", &self.base_resolvers.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// What [`build_schema`](crate::build_schema) returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaOutput {
    /// A schema with resolvers attached, ready for a GraphQL server.
    #[default]
    Executable,
    /// The printed SDL only.
    Sdl,
}

/// Per-build options.
#[derive(Clone)]
pub struct BuildOptions {
    pub api_type: ApiType,
    pub type_paths: Vec<PathBuf>,
    pub types_loader: Arc<dyn TypesLoader>,
    pub output: SchemaOutput,
}

impl BuildOptions {
    /// Executable output, file-based loading, no type paths yet.
    pub fn new(api_type: ApiType) -> Self {
        Self {
            api_type,
            type_paths: Vec::new(),
            types_loader: Arc::new(FileTypesLoader),
            output: SchemaOutput::default(),
        }
    }

    pub fn with_type_paths(mut self, paths: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        self.type_paths = paths.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_loader(mut self, loader: impl TypesLoader + 'static) -> Self {
        self.types_loader = Arc::new(loader);
        self
    }

    pub fn with_output(mut self, output: SchemaOutput) -> Self {
        self.output = output;
        self
    }
}

impl fmt::Debug for BuildOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildOptions")
            .field("api_type", &self.api_type)
            .field("type_paths", &self.type_paths)
            .field("output", &self.output)
            .finish_non_exhaustive()
    }
}
