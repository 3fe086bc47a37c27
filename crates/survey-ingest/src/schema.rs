//! Loading normalized schema documents.

use std::path::Path;

use survey_model::{FormVersion, SchemaDocument, VersionSource};
use tracing::debug;

use crate::error::{IngestError, Result};

/// Parse a schema document: one version, or `{"versions": [...]}`.
pub fn parse_schema(text: &str, path: &Path) -> Result<Vec<VersionSource>> {
    let document: SchemaDocument =
        serde_json::from_str(text).map_err(|source| IngestError::Schema {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(document.into_versions())
}

/// Read the version sources stored in `path`, oldest first.
pub fn load_schema(path: &Path) -> Result<Vec<VersionSource>> {
    if !path.is_file() {
        return Err(IngestError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let text = std::fs::read_to_string(path).map_err(|source| IngestError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_schema(&text, path)
}

/// Read and build every form version stored in `path`, oldest first.
pub fn load_versions(path: &Path) -> Result<Vec<FormVersion>> {
    let sources = load_schema(path)?;
    let versions = sources
        .iter()
        .map(|source| {
            FormVersion::from_source(source).map_err(|error| IngestError::Version {
                path: path.to_path_buf(),
                version: source.version.clone(),
                source: error,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    debug!(path = %path.display(), versions = versions.len(), "loaded schema");
    Ok(versions)
}
