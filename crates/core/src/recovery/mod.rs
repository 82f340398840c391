//! The `$gp`-relative import reference recovery pass.
//!
//! Pipeline, leaves first: [`gp_base`] finds the canonical `$gp` base once
//! per run, [`scanner`] walks every instruction for the `lw Dest, Imm($gp)`
//! pattern, [`resolve`] turns each immediate into an exact-address symbol
//! lookup and keeps only import slots, [`annotate`] writes the comment and
//! data-reference pair, and [`pass`] drives the whole thing between the two
//! bracketing snapshots.

pub mod annotate;
pub mod gp_base;
pub mod pass;
pub mod resolve;
pub mod scanner;

pub use annotate::{annotate_import_ref, RecoveredRef};
pub use gp_base::{find_canonical_gp, GP_SYMBOL_NAME};
pub use pass::{
    GpRecoveryPass, PassError, PassState, PassSummary, RecoveryRequest,
    POST_SCAN_SNAPSHOT_SUFFIX, PRE_SCAN_SNAPSHOT_SUFFIX,
};
pub use resolve::{effective_address, resolve_import};
pub use scanner::{parse_signed_hex, scan_gp_loads, GpLoadCandidate};
