//! Host engine adapters.
//!
//! The heavy lifting of loading a binary and running full auto-analysis
//! belongs to an external engine; this crate only consumes the converged
//! result as a [`BinaryView`]. Adapters implement [`AnalysisEngine`] and are
//! selected by name through the [`EngineRegistry`].

use std::collections::HashMap;
use std::fs;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::model::BinaryView;

pub mod json_export;
#[cfg(feature = "rizin-engine")]
pub mod rizin;

pub use json_export::JsonExportEngine;
#[cfg(feature = "rizin-engine")]
pub use rizin::RizinEngine;

/// Request to load one binary through a host engine.
#[derive(Debug, Clone)]
pub struct LoadRequest {
    pub binary_path: PathBuf,
    /// Optional explicit path to the engine executable.
    pub engine_path: Option<PathBuf>,
}

impl LoadRequest {
    pub fn new(binary_path: impl Into<PathBuf>) -> Self {
        Self { binary_path: binary_path.into(), engine_path: None }
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Binary not found at {0}")]
    MissingBinary(PathBuf),
    #[error("Analysis export not found at {0}")]
    MissingExport(PathBuf),
    #[error("Engine not found: {0}")]
    MissingEngine(String),
    #[error("Analysis engine error: {0}")]
    Engine(String),
}

/// Trait implemented by host-engine adapters.
///
/// `load` runs the engine's full auto-analysis and blocks until it settles;
/// there is no timeout, that contract is inherited from the engine itself.
/// The returned view is the converged database, ready to scan.
pub trait AnalysisEngine: Send + Sync {
    fn load(&self, request: &LoadRequest) -> Result<BinaryView, EngineError>;
    fn name(&self) -> &'static str;
}

/// Registry of engine adapters; callers select by name.
#[derive(Default)]
pub struct EngineRegistry {
    engines: HashMap<String, Box<dyn AnalysisEngine>>,
}

impl EngineRegistry {
    pub fn new() -> Self {
        Self { engines: HashMap::new() }
    }

    pub fn register<E: AnalysisEngine + 'static>(&mut self, engine: E) -> &mut Self {
        self.engines.insert(engine.name().to_string(), Box::new(engine));
        self
    }

    pub fn get(&self, name: &str) -> Option<&dyn AnalysisEngine> {
        self.engines.get(name).map(|e| &**e)
    }

    /// Return a sorted list of registered engine names for error messages/help.
    pub fn names(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.engines.keys().cloned().collect();
        keys.sort();
        keys
    }
}

/// Registry populated with every adapter this build carries.
pub fn default_engine_registry() -> EngineRegistry {
    let mut registry = EngineRegistry::new();
    registry.register(json_export::JsonExportEngine);
    #[cfg(feature = "rizin-engine")]
    {
        registry.register(rizin::RizinEngine);
    }
    registry
}

/// Compute the SHA-256 hash of a file and return it as a hex string.
pub fn sha256_file(path: &Path) -> std::io::Result<String> {
    let file = fs::File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];

    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}
