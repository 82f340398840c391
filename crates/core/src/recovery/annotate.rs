use serde::{Deserialize, Serialize};

use crate::model::{BinaryView, Symbol};

/// One recovered import reference: what was written, and where.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecoveredRef {
    /// Address of the `lw` instruction that was annotated.
    pub address: u64,
    /// Name of the import slot, also the comment text.
    pub import_name: String,
    /// Address of the import slot the reference points at.
    pub target: u64,
}

/// Apply the annotation pair for one accepted candidate: the import's name
/// as the comment at `address`, and a data reference from `address` to the
/// slot. Both are written together; a candidate is only reported once both
/// mutations have landed.
///
/// Idempotent: the comment overwrite produces the same text and the edge
/// set ignores duplicates, so repeat runs leave the view unchanged.
pub fn annotate_import_ref(view: &mut BinaryView, address: u64, symbol: &Symbol) -> RecoveredRef {
    view.set_comment_at(address, symbol.name.clone());
    view.add_data_ref(address, symbol.address);
    RecoveredRef { address, import_name: symbol.name.clone(), target: symbol.address }
}
