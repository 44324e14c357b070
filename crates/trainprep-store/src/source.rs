//! Path expression resolution: local file, directory, glob, or object-store URI.

use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use crate::StoreError;

/// URI schemes served by the object-store reader (Azure Data Lake / Blob).
pub const REMOTE_SCHEMES: [&str; 3] = ["abfs://", "abfss://", "az://"];

const PARQUET_EXT: &str = "parquet";

pub fn is_remote(expr: &str) -> bool {
    REMOTE_SCHEMES.iter().any(|scheme| expr.starts_with(scheme))
}

/// Expand a local path expression into the Parquet files it names, sorted by path.
///
/// - `file://` is stripped.
/// - A pattern containing `*`, `?` or `[` is expanded as a glob; matched directories
///   are walked like a directory argument.
/// - A directory is walked recursively for `*.parquet`, skipping entries whose name
///   starts with `.` or `_` (e.g. `_SUCCESS` markers).
/// - Anything else must be an existing file.
pub fn resolve_local(expr: &str) -> Result<Vec<PathBuf>, StoreError> {
    let path_str = expr.strip_prefix("file://").unwrap_or(expr);

    let mut files = if has_glob_meta(path_str) {
        expand_glob(path_str)?
    } else {
        let path = Path::new(path_str);
        if path.is_dir() {
            walk_dir(path)?
        } else if path.is_file() {
            vec![path.to_path_buf()]
        } else {
            Vec::new()
        }
    };

    if files.is_empty() {
        return Err(StoreError::InputNotFound(expr.to_string()));
    }
    files.sort();
    files.dedup();
    debug!(expr, count = files.len(), "resolved input files");
    Ok(files)
}

fn has_glob_meta(s: &str) -> bool {
    s.contains(['*', '?', '['])
}

fn expand_glob(pattern: &str) -> Result<Vec<PathBuf>, StoreError> {
    let paths = glob::glob(pattern).map_err(|e| StoreError::read(pattern, e))?;
    let mut files = Vec::new();
    for entry in paths {
        let path = entry.map_err(|e| StoreError::read(pattern, e))?;
        if path.is_dir() {
            files.extend(walk_dir(&path)?);
        } else if path.is_file() {
            files.push(path);
        }
    }
    Ok(files)
}

fn walk_dir(dir: &Path) -> Result<Vec<PathBuf>, StoreError> {
    let mut files = Vec::new();
    let walker = WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e));
    for entry in walker {
        let entry = entry.map_err(|e| StoreError::read(dir.display().to_string(), e))?;
        if entry.file_type().is_file()
            && entry.path().extension().is_some_and(|ext| ext == PARQUET_EXT)
        {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| name.starts_with('.') || name.starts_with('_'))
}
