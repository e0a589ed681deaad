//! Plugin declarations as seen by the schema pipeline.

use crate::error::{SchemaError, SchemaResult};
use crate::extension::{ApiExtension, ApiTarget, SchemaExtension};
use std::sync::Arc;
use tracing::debug;

/// A plugin's schema-relevant metadata: its name and the extensions it
/// contributes. Built once at configuration time.
#[derive(Debug, Clone)]
pub struct VendurePlugin {
    name: String,
    extensions: Vec<Arc<SchemaExtension>>,
}

impl VendurePlugin {
    pub fn builder(name: impl Into<String>) -> VendurePluginBuilder {
        VendurePluginBuilder {
            name: name.into(),
            pending: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Extensions in declaration order.
    pub fn extensions(&self) -> &[Arc<SchemaExtension>] {
        &self.extensions
    }
}

/// Collects a plugin's extension declarations; parsing happens in [`build`].
///
/// [`build`]: VendurePluginBuilder::build
pub struct VendurePluginBuilder {
    name: String,
    pending: Vec<(ApiTarget, ApiExtension)>,
}

impl VendurePluginBuilder {
    pub fn admin_api_extensions(mut self, extension: ApiExtension) -> Self {
        self.pending.push((ApiTarget::Admin, extension));
        self
    }

    pub fn shop_api_extensions(mut self, extension: ApiExtension) -> Self {
        self.pending.push((ApiTarget::Shop, extension));
        self
    }

    /// Contributes the same extension to both API surfaces.
    pub fn api_extensions(mut self, extension: ApiExtension) -> Self {
        self.pending.push((ApiTarget::Both, extension));
        self
    }

    pub fn build(self) -> SchemaResult<VendurePlugin> {
        if self.name.trim().is_empty() {
            return Err(SchemaError::Config("plugin name must not be empty".into()));
        }
        let extensions = self
            .pending
            .into_iter()
            .map(|(target, ext)| ext.parse(&self.name, target).map(Arc::new))
            .collect::<SchemaResult<Vec<_>>>()?;
        debug!(plugin = %self.name, extensions = extensions.len(), "Plugin declared");
        Ok(VendurePlugin {
            name: self.name,
            extensions,
        })
    }
}
