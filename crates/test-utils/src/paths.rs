//! Helpers for tests that read schema, encoding and data documents from disk.

use std::fs;
use std::path::{Path, PathBuf};

/// Returns the workspace root directory.
pub fn workspace_root() -> PathBuf {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    PathBuf::from(manifest_dir)
        .parent()
        .and_then(|p| p.parent())
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from(manifest_dir))
}

/// Creates a temporary directory removed when the handle is dropped.
pub fn temp_test_dir() -> tempfile::TempDir {
    tempfile::Builder::new()
        .prefix("swe_test")
        .tempdir()
        .expect("Failed to create temporary test directory")
}

/// Writes `contents` to `dir/name` and returns the full path.
pub fn write_document(dir: &Path, name: &str, contents: impl AsRef<[u8]>) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("Failed to write test document");
    path
}
