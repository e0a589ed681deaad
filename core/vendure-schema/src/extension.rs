//! Schema extensions: what a plugin contributes to one or both API surfaces.

use crate::document::{parse_sdl, SchemaDocument};
use crate::error::{SchemaError, SchemaResult};
use crate::resolver::{FieldResolver, ResolverKey, ResolverMap};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use vendure_types::ApiType;

/// Which API surfaces an extension applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiTarget {
    Admin,
    Shop,
    Both,
}

impl ApiTarget {
    pub fn includes(&self, api_type: ApiType) -> bool {
        match self {
            Self::Both => true,
            Self::Admin => api_type == ApiType::Admin,
            Self::Shop => api_type == ApiType::Shop,
        }
    }
}

impl From<ApiType> for ApiTarget {
    fn from(api_type: ApiType) -> Self {
        match api_type {
            ApiType::Admin => Self::Admin,
            ApiType::Shop => Self::Shop,
        }
    }
}

impl fmt::Display for ApiTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Admin => "admin",
            Self::Shop => "shop",
            Self::Both => "admin+shop",
        })
    }
}

/// An extension as a plugin declares it: SDL text, resolvers and custom
/// scalar names. Parsed into a [`SchemaExtension`] when the plugin is built.
#[derive(Default)]
pub struct ApiExtension {
    schema: Vec<String>,
    resolvers: ResolverMap,
    scalars: BTreeSet<String>,
}

impl ApiExtension {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an SDL fragment. May be called more than once; fragments are
    /// concatenated in call order.
    pub fn schema(mut self, sdl: impl Into<String>) -> Self {
        self.schema.push(sdl.into());
        self
    }

    /// Registers the resolver for `type_name.field_name`, replacing any
    /// resolver this extension already declared for that field.
    pub fn resolver(
        mut self,
        type_name: impl Into<String>,
        field_name: impl Into<String>,
        resolver: impl FieldResolver + 'static,
    ) -> Self {
        self.resolvers
            .insert(ResolverKey::new(type_name, field_name), Arc::new(resolver));
        self
    }

    /// Declares a custom scalar this extension relies on.
    pub fn scalar(mut self, name: impl Into<String>) -> Self {
        self.scalars.insert(name.into());
        self
    }

    pub(crate) fn parse(self, plugin: &str, api_target: ApiTarget) -> SchemaResult<SchemaExtension> {
        let origin = format!("plugin '{plugin}' ({api_target} extension)");
        let type_defs = parse_sdl(&origin, &self.schema.join("\n"))?;
        if let Some(scalar) = self
            .scalars
            .iter()
            .find(|name| !crate::document::is_valid_name(name))
        {
            return Err(SchemaError::Config(format!(
                "{origin} declares invalid scalar name '{scalar}'"
            )));
        }
        Ok(SchemaExtension {
            api_target,
            type_defs,
            resolvers: self.resolvers,
            scalars: self.scalars,
        })
    }
}

/// One plugin's parsed contribution to one or both API surfaces.
/// Immutable once built.
pub struct SchemaExtension {
    api_target: ApiTarget,
    type_defs: SchemaDocument,
    resolvers: ResolverMap,
    scalars: BTreeSet<String>,
}

impl SchemaExtension {
    pub fn api_target(&self) -> ApiTarget {
        self.api_target
    }

    pub fn type_defs(&self) -> &SchemaDocument {
        &self.type_defs
    }

    pub fn resolvers(&self) -> &ResolverMap {
        &self.resolvers
    }

    pub fn scalars(&self) -> &BTreeSet<String> {
        &self.scalars
    }
}

impl fmt::Debug for SchemaExtension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaExtension")
            .field("api_target", &self.api_target)
            .field("definitions", &self.type_defs.definitions.len())
            .field("resolvers", &self.resolvers.keys().collect::<Vec<_>>())
            .field("scalars", &self.scalars)
            .finish()
    }
}
