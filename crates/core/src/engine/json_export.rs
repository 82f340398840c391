use std::fs;
use std::path::{Path, PathBuf};

use crate::engine::{AnalysisEngine, EngineError, LoadRequest};
use crate::model::BinaryView;

/// Loads a view that a host engine exported to JSON ahead of time.
///
/// The export is expected next to the binary as `<path>.analysis.json`
/// unless `GPREC_EXPORT` points somewhere else. This lets the pass run on
/// machines where the engine itself is not installed, and gives tests a
/// deterministic input.
pub struct JsonExportEngine;

impl AnalysisEngine for JsonExportEngine {
    fn load(&self, request: &LoadRequest) -> Result<BinaryView, EngineError> {
        if !request.binary_path.is_file() {
            return Err(EngineError::MissingBinary(request.binary_path.clone()));
        }

        let export_path = resolve_export_path(&request.binary_path);
        if !export_path.is_file() {
            return Err(EngineError::MissingExport(export_path));
        }

        let body = fs::read_to_string(&export_path).map_err(|e| {
            EngineError::Engine(format!("failed to read export {}: {e}", export_path.display()))
        })?;
        let view: BinaryView = serde_json::from_str(&body).map_err(|e| {
            EngineError::Engine(format!("failed to parse export {}: {e}", export_path.display()))
        })?;
        Ok(view)
    }

    fn name(&self) -> &'static str {
        "json-export"
    }
}

/// `GPREC_EXPORT` wins; otherwise the export sits next to the binary.
fn resolve_export_path(binary: &Path) -> PathBuf {
    match std::env::var_os("GPREC_EXPORT") {
        Some(path) => PathBuf::from(path),
        None => {
            let mut name = binary.as_os_str().to_os_string();
            name.push(".analysis.json");
            PathBuf::from(name)
        }
    }
}
