use crate::model::{BinaryView, Symbol, SymbolKind};

/// Effective address of a `$gp`-relative access: base plus signed offset.
/// `None` when the sum leaves the address space.
pub fn effective_address(gp_base: u64, immediate: i64) -> Option<u64> {
    gp_base.checked_add_signed(immediate)
}

/// Resolve a candidate offset to an import slot.
///
/// The lookup is exact-address only, and symbols of any other kind are
/// rejected; both misses are ordinary skips, not errors.
pub fn resolve_import<'a>(
    view: &'a BinaryView,
    gp_base: u64,
    immediate: i64,
) -> Option<&'a Symbol> {
    let effective = effective_address(gp_base, immediate)?;
    view.symbol_at(effective).filter(|symbol| symbol.kind == SymbolKind::ImportSlot)
}
