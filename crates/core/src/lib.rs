//! gprec-core
//!
//! Core library for recovering hidden import references in MIPS32 binaries.
//!
//! Runtime-linked MIPS32 code reaches imported symbols through `lw`
//! instructions loading from fixed offsets off the `$gp` register. The host
//! disassembler sees the load but not which import slot it aliases, so the
//! cross-reference is missing. This crate resolves those loads against the
//! symbol table and writes the recovered name and reference edge back into
//! the analysis view.
//!
//! The crate defines the analysis view model, the engine adapters that
//! produce views, the recovery pass itself, and the snapshot store that
//! brackets each run. All substantive logic lives here so it is fully
//! testable and reusable from multiple frontends.

pub mod engine;
pub mod model;
pub mod recovery;
pub mod snapshot;

/// Returns the library version as encoded at compile time.
///
/// Useful for tests and for frontends to report consistent version info.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
