//! Gathers the extensions that apply to one API surface.

use crate::document::SchemaSource;
use crate::extension::SchemaExtension;
use crate::plugin::VendurePlugin;
use std::sync::Arc;
use tracing::debug;
use vendure_types::ApiType;

/// An extension selected for a build, tagged with the plugin that declared it.
#[derive(Debug, Clone)]
pub struct CollectedExtension {
    pub plugin: String,
    pub extension: Arc<SchemaExtension>,
}

impl CollectedExtension {
    pub fn source(&self) -> SchemaSource {
        SchemaSource::Plugin(self.plugin.clone())
    }
}

/// Returns every extension targeting `api_type`, in plugin registration
/// order and then in each plugin's declaration order. Merge order (and
/// therefore SDL output order and diagnostics) follows this sequence.
pub fn collect_extensions(plugins: &[VendurePlugin], api_type: ApiType) -> Vec<CollectedExtension> {
    let mut collected = Vec::new();
    for plugin in plugins {
        let before = collected.len();
        collected.extend(
            plugin
                .extensions()
                .iter()
                .filter(|ext| ext.api_target().includes(api_type))
                .map(|ext| CollectedExtension {
                    plugin: plugin.name().to_string(),
                    extension: Arc::clone(ext),
                }),
        );
        if collected.len() == before {
            debug!(plugin = plugin.name(), api = %api_type, "Plugin contributes no extensions");
        }
    }
    collected
}
