//! Submission file discovery.

use std::path::{Path, PathBuf};

use crate::error::{IngestError, Result};

/// Extensions recognised as submission files.
pub const SUBMISSION_EXTENSIONS: [&str; 3] = ["json", "ndjson", "jsonl"];

/// Lists all submission files in a directory.
///
/// Returns files sorted by filename, so the export order is stable.
pub fn list_submission_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(IngestError::DirectoryNotFound {
            path: dir.to_path_buf(),
        });
    }

    let entries = std::fs::read_dir(dir).map_err(|e| IngestError::Read {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut files = Vec::new();
    for entry_result in entries {
        let entry = entry_result.map_err(|e| IngestError::Read {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let known = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                SUBMISSION_EXTENSIONS
                    .iter()
                    .any(|known| ext.eq_ignore_ascii_case(known))
            })
            .unwrap_or(false);
        if known {
            files.push(path);
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}
