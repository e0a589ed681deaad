//! Configuration file and rendering for the `vendure-schema` tool.
//!
//! The tool assembles the schema for one API surface exactly as a server
//! would, from base type files plus SDL-only plugin extensions declared in a
//! TOML file, and prints either the SDL or the compact type table used for
//! client code generation.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use vendure_schema::{
    ApiExtension, ApiType, BuildOptions, CustomFields, SchemaConfig, SchemaOutput, VendurePlugin,
    api_type_paths, build_schema, parse_sdl, schema_info,
};

/// What the tool prints.
#[derive(clap::ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// The printed schema.
    #[default]
    Sdl,
    /// `type -> field -> {type_name, non_null, is_list}` as JSON.
    Info,
}

/// `vendure.toml`.
///
/// ```toml
/// schema_root = "schema"
///
/// [[plugins]]
/// name = "reviews"
/// admin_schema = "extend type Product { reviewCount: Int! }"
///
/// [[custom_fields.Product]]
/// name = "subtitle"
/// type = "string"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaConfigFile {
    /// Directory holding `common/`, `admin-api/` and `shop-api/`.
    pub schema_root: Option<PathBuf>,
    /// Explicit type paths, used instead of `schema_root` when set.
    pub type_paths: Vec<PathBuf>,
    pub plugins: Vec<PluginFile>,
    pub custom_fields: CustomFields,
}

/// A plugin contributing SDL only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginFile {
    pub name: String,
    /// Extension for both API surfaces.
    pub schema: Option<String>,
    pub admin_schema: Option<String>,
    pub shop_schema: Option<String>,
    /// Custom scalars the plugin's SDL relies on.
    pub scalars: Vec<String>,
}

impl PluginFile {
    fn extension(&self, sdl: &str) -> ApiExtension {
        self.scalars
            .iter()
            .fold(ApiExtension::new().schema(sdl), |ext, scalar| ext.scalar(scalar))
    }

    pub fn to_plugin(&self) -> Result<VendurePlugin> {
        let mut builder = VendurePlugin::builder(&self.name);
        if let Some(sdl) = &self.schema {
            builder = builder.api_extensions(self.extension(sdl));
        }
        if let Some(sdl) = &self.admin_schema {
            builder = builder.admin_api_extensions(self.extension(sdl));
        }
        if let Some(sdl) = &self.shop_schema {
            builder = builder.shop_api_extensions(self.extension(sdl));
        }
        builder
            .build()
            .with_context(|| format!("Invalid plugin '{}'", self.name))
    }
}

impl SchemaConfigFile {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).context("Failed to parse schema config")
    }

    /// Reads a config file. Relative paths inside it are resolved against
    /// the file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config = Self::from_toml_str(&text)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        debug!(path = %path.display(), plugins = config.plugins.len(), "Loaded schema config");
        Ok(config)
    }

    fn resolve_paths(&mut self, base: &Path) {
        if let Some(root) = &mut self.schema_root {
            *root = base.join(&*root);
        }
        for path in &mut self.type_paths {
            *path = base.join(&*path);
        }
    }

    pub fn type_paths(&self, api_type: ApiType) -> Result<Vec<PathBuf>> {
        if !self.type_paths.is_empty() {
            return Ok(self.type_paths.clone());
        }
        match &self.schema_root {
            Some(root) => Ok(api_type_paths(root, api_type)),
            None => bail!("Config sets neither `schema_root` nor `type_paths`"),
        }
    }

    pub fn schema_config(&self) -> Result<SchemaConfig> {
        self.plugins.iter().try_fold(
            SchemaConfig::new().with_custom_fields(self.custom_fields.clone()),
            |config, plugin| Ok(config.with_plugin(plugin.to_plugin()?)),
        )
    }
}

/// Builds the schema for `api_type` and renders it in `format`.
pub fn render(config: &SchemaConfigFile, api_type: ApiType, format: OutputFormat) -> Result<String> {
    let options = BuildOptions::new(api_type)
        .with_type_paths(config.type_paths(api_type)?)
        .with_output(SchemaOutput::Sdl);
    let sdl = build_schema(&config.schema_config()?, &options)
        .with_context(|| format!("Failed to build the {api_type} API schema"))?
        .into_sdl();
    info!(api = %api_type, ?format, bytes = sdl.len(), "Schema built");

    match format {
        OutputFormat::Sdl => Ok(sdl),
        OutputFormat::Info => {
            let document = parse_sdl("built schema", &sdl)?;
            serde_json::to_string_pretty(&schema_info(&document))
                .context("Failed to serialize schema info")
        }
    }
}
