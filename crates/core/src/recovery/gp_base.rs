use crate::model::{BinaryView, Symbol, SymbolKind};

/// Name the runtime loader gives the `$gp` base value.
pub const GP_SYMBOL_NAME: &str = "_gp";

/// Find the canonical `$gp` symbol: a Data-kind symbol named `_gp`.
///
/// Binaries occasionally carry several `_gp` entries; among the Data-kind
/// ones, the last in view order wins. Returns `None` when no Data-kind
/// `_gp` exists, in which case the caller must stop before scanning or
/// mutating anything.
///
/// The result is resolved once per pass and never re-queried mid-scan;
/// annotations touch neither symbol addresses nor the `_gp` entry itself.
pub fn find_canonical_gp(view: &BinaryView) -> Option<&Symbol> {
    let mut canonical = None;
    for symbol in view.symbols_by_name(GP_SYMBOL_NAME) {
        if symbol.kind == SymbolKind::Data {
            canonical = Some(symbol);
        }
    }
    canonical
}
