//! Snapshot persistence.
//!
//! Each recovery run writes two self-contained SQLite snapshot files, one
//! before any mutation and one after all annotations: full copies of the
//! [`crate::model::BinaryView`] plus provenance metadata. Snapshots are
//! archival; the pass itself never reads them back, but tests and follow-up
//! tooling do through [`SnapshotDb::load_view`].

use std::path::{Path, PathBuf};

mod store;

pub use store::{SnapshotDb, SnapshotError, SnapshotResult, CURRENT_SCHEMA_VERSION};

/// Snapshot file path for a binary: `<dir>/<file name>_<suffix>.db`.
///
/// Names derive from the input's file name, not its full path; two inputs
/// sharing a file name share snapshot files when written to one directory.
pub fn snapshot_path(dir: &Path, binary_path: &Path, suffix: &str) -> PathBuf {
    let file_name = binary_path
        .file_name()
        .map(|os| os.to_string_lossy().to_string())
        .unwrap_or_else(|| "binary".to_string());
    dir.join(format!("{file_name}_{suffix}.db"))
}
