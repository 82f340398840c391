use std::path::PathBuf;

use log::{debug, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::{AnalysisEngine, EngineError, LoadRequest};
use crate::model::Symbol;
use crate::recovery::annotate::{annotate_import_ref, RecoveredRef};
use crate::recovery::gp_base::find_canonical_gp;
use crate::recovery::resolve::resolve_import;
use crate::recovery::scanner::scan_gp_loads;
use crate::snapshot::{snapshot_path, SnapshotDb, SnapshotError};

/// Suffix of the snapshot taken right after the engine load converges,
/// before any mutation.
pub const PRE_SCAN_SNAPSHOT_SUFFIX: &str = "default_analysis";

/// Suffix of the snapshot taken once all annotations are applied.
pub const POST_SCAN_SNAPSHOT_SUFFIX: &str = "after_analysis";

/// Lifecycle of one recovery run. `Aborted` is terminal and reached only
/// when no canonical `$gp` symbol exists.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PassState {
    Loaded,
    AnalysisConverged,
    GpResolved,
    Scanning,
    Done,
    Aborted,
}

impl PassState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PassState::Loaded => "loaded",
            PassState::AnalysisConverged => "analysis_converged",
            PassState::GpResolved => "gp_resolved",
            PassState::Scanning => "scanning",
            PassState::Done => "done",
            PassState::Aborted => "aborted",
        }
    }
}

/// What to process and where the bracketing snapshots land.
#[derive(Debug, Clone)]
pub struct RecoveryRequest {
    pub binary_path: PathBuf,
    /// Directory for the two snapshot files; the working directory when unset.
    pub snapshot_dir: Option<PathBuf>,
    /// Optional explicit engine executable path, forwarded to the adapter.
    pub engine_path: Option<PathBuf>,
}

impl RecoveryRequest {
    pub fn new(binary_path: impl Into<PathBuf>) -> Self {
        Self { binary_path: binary_path.into(), snapshot_dir: None, engine_path: None }
    }
}

#[derive(Debug, Error)]
pub enum PassError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

/// Outcome of one recovery run.
///
/// A missing canonical `$gp` is a handled outcome, reported through
/// [`PassState::Aborted`] here rather than as an error; fatal engine and
/// snapshot failures surface as [`PassError`]. The caller decides what each
/// means for its exit status.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PassSummary {
    pub state: PassState,
    pub binary: PathBuf,
    pub gp_base: Option<u64>,
    pub recovered: Vec<RecoveredRef>,
    /// Snapshot files written, in the order they were taken.
    pub snapshots: Vec<PathBuf>,
}

impl PassSummary {
    /// True when the pass stopped before scanning because no canonical
    /// `$gp` symbol was found.
    pub fn aborted(&self) -> bool {
        self.state == PassState::Aborted
    }
}

/// Recovers import references reachable through `$gp`-relative `lw` loads.
///
/// One run processes one binary end to end, single threaded: load and wait
/// for the engine's analysis to converge, snapshot, resolve the `$gp` base
/// once, scan and annotate, snapshot again. The loaded view is owned
/// exclusively for the whole run, so annotation writes need no locking.
pub struct GpRecoveryPass<'a> {
    pub engine: &'a dyn AnalysisEngine,
}

impl<'a> GpRecoveryPass<'a> {
    pub fn new(engine: &'a dyn AnalysisEngine) -> Self {
        Self { engine }
    }

    pub fn run(&self, request: &RecoveryRequest) -> Result<PassSummary, PassError> {
        let load = LoadRequest {
            binary_path: request.binary_path.clone(),
            engine_path: request.engine_path.clone(),
        };

        // Blocks until the engine's auto-analysis settles.
        let mut view = self.engine.load(&load)?;
        let mut state = PassState::Loaded;
        debug!("pass state: {}", state.as_str());
        state = PassState::AnalysisConverged;
        debug!("pass state: {}", state.as_str());

        let snapshot_dir = request.snapshot_dir.clone().unwrap_or_else(|| PathBuf::from("."));
        let pre_path =
            snapshot_path(&snapshot_dir, &request.binary_path, PRE_SCAN_SNAPSHOT_SUFFIX);
        SnapshotDb::open(&pre_path)?.save_view(&view)?;
        let mut snapshots = vec![pre_path];

        let gp_base = match find_canonical_gp(&view) {
            Some(symbol) => symbol.address,
            None => {
                info!("Unable to find canonical $gp");
                state = PassState::Aborted;
                debug!("pass state: {}", state.as_str());
                return Ok(PassSummary {
                    state,
                    binary: request.binary_path.clone(),
                    gp_base: None,
                    recovered: Vec::new(),
                    snapshots,
                });
            }
        };
        state = PassState::GpResolved;
        debug!("pass state: {}", state.as_str());
        info!("Found canonical $gp at: {:#x}", gp_base);

        state = PassState::Scanning;
        debug!("pass state: {}", state.as_str());
        info!("Candidates for gp-based offset reference recovery:");

        // Resolution borrows the view, annotation mutates it; collect the
        // accepted candidates first. The gp base stays fixed throughout.
        let accepted: Vec<(u64, Symbol, String)> = scan_gp_loads(&view)
            .filter_map(|candidate| {
                resolve_import(&view, gp_base, candidate.immediate).map(|symbol| {
                    (candidate.address, symbol.clone(), candidate.instruction.to_string())
                })
            })
            .collect();

        let mut recovered = Vec::with_capacity(accepted.len());
        for (address, symbol, text) in accepted {
            info!("{address:#x} {text}");
            recovered.push(annotate_import_ref(&mut view, address, &symbol));
        }
        state = PassState::Done;
        debug!("pass state: {}", state.as_str());

        let post_path =
            snapshot_path(&snapshot_dir, &request.binary_path, POST_SCAN_SNAPSHOT_SUFFIX);
        SnapshotDb::open(&post_path)?.save_view(&view)?;
        snapshots.push(post_path);

        Ok(PassSummary {
            state,
            binary: request.binary_path.clone(),
            gp_base: Some(gp_base),
            recovered,
            snapshots,
        })
    }
}
