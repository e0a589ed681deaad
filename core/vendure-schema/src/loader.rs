//! Loading base type definitions.

use crate::document::{SchemaSource, SourcedDocument, parse_sdl};
use crate::error::{SchemaError, SchemaResult};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use vendure_types::ApiType;
use walkdir::WalkDir;

const SDL_EXTENSIONS: [&str; 2] = ["graphql", "gql"];

/// Supplies the base type definitions of a build.
pub trait TypesLoader: Send + Sync {
    fn load(&self, paths: &[PathBuf]) -> SchemaResult<Vec<SourcedDocument>>;
}

/// Reads `*.graphql` and `*.gql` files. Directories are walked recursively;
/// files are returned in sorted path order within each configured path.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileTypesLoader;

impl FileTypesLoader {
    fn files_in(path: &Path) -> SchemaResult<Vec<PathBuf>> {
        if path.is_file() {
            return Ok(vec![path.to_path_buf()]);
        }
        if !path.exists() {
            return Err(SchemaError::Io {
                path: path.to_path_buf(),
                error: std::io::Error::new(std::io::ErrorKind::NotFound, "type path does not exist"),
            });
        }
        let mut files = Vec::new();
        for entry in WalkDir::new(path).follow_links(true) {
            let entry = entry.map_err(|e| SchemaError::Io {
                path: e.path().map(Path::to_path_buf).unwrap_or_else(|| path.to_path_buf()),
                error: e.into(),
            })?;
            let is_sdl = entry
                .path()
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| SDL_EXTENSIONS.contains(&ext));
            if entry.file_type().is_file() && is_sdl {
                files.push(entry.into_path());
            }
        }
        files.sort();
        Ok(files)
    }
}

impl TypesLoader for FileTypesLoader {
    fn load(&self, paths: &[PathBuf]) -> SchemaResult<Vec<SourcedDocument>> {
        let mut documents = Vec::new();
        for root in paths {
            let files = Self::files_in(root)?;
            if files.is_empty() {
                warn!(path = %root.display(), "Type path contains no SDL files");
            }
            for file in files {
                let sdl = std::fs::read_to_string(&file).map_err(|error| SchemaError::Io {
                    path: file.clone(),
                    error,
                })?;
                let origin = file.display().to_string();
                let document = parse_sdl(&origin, &sdl)?;
                debug!(file = %origin, definitions = document.definitions.len(), "Loaded type definitions");
                documents.push(SourcedDocument::new(SchemaSource::Base(origin), document));
            }
        }
        Ok(documents)
    }
}

/// Serves SDL held in memory. A requested path selects every entry whose
/// name starts with it; an empty path list selects everything.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTypesLoader {
    sources: Vec<(String, String)>,
}

impl InMemoryTypesLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(mut self, name: impl Into<String>, sdl: impl Into<String>) -> Self {
        self.sources.push((name.into(), sdl.into()));
        self
    }
}

impl TypesLoader for InMemoryTypesLoader {
    fn load(&self, paths: &[PathBuf]) -> SchemaResult<Vec<SourcedDocument>> {
        self.sources
            .iter()
            .filter(|(name, _)| paths.is_empty() || paths.iter().any(|p| Path::new(name).starts_with(p)))
            .map(|(name, sdl)| {
                parse_sdl(name, sdl)
                    .map(|doc| SourcedDocument::new(SchemaSource::Base(name.clone()), doc))
            })
            .collect()
    }
}

/// Conventional type paths below a schema root: the shared `common`
/// directory followed by the API-specific one.
pub fn api_type_paths(root: &Path, api_type: ApiType) -> Vec<PathBuf> {
    vec![
        root.join("common"),
        root.join(format!("{}-api", api_type.as_str())),
    ]
}
