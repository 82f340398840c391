use gprec_core::model::{BinaryView, Symbol, SymbolKind};
use gprec_core::recovery::{find_canonical_gp, GP_SYMBOL_NAME};

fn view_with(symbols: Vec<Symbol>) -> BinaryView {
    let mut view = BinaryView::default();
    for symbol in symbols {
        view.add_symbol(symbol);
    }
    view
}

#[test]
fn resolves_a_single_data_gp() {
    let view = view_with(vec![Symbol::new(0x412345, GP_SYMBOL_NAME, SymbolKind::Data)]);
    let gp = find_canonical_gp(&view).expect("canonical gp");
    assert_eq!(gp.address, 0x412345);
    assert_eq!(gp.name, GP_SYMBOL_NAME);
}

#[test]
fn empty_symbol_table_has_no_canonical_gp() {
    let view = BinaryView::default();
    assert!(find_canonical_gp(&view).is_none());
}

#[test]
fn gp_entries_of_other_kinds_do_not_qualify() {
    let view = view_with(vec![
        Symbol::new(0x100, GP_SYMBOL_NAME, SymbolKind::Function),
        Symbol::new(0x200, GP_SYMBOL_NAME, SymbolKind::ImportSlot),
        Symbol::new(0x300, GP_SYMBOL_NAME, SymbolKind::Other),
        Symbol::new(0x400, "memcpy", SymbolKind::Data),
    ]);
    assert!(find_canonical_gp(&view).is_none());
}

#[test]
fn the_last_data_gp_wins_when_several_exist() {
    let view = view_with(vec![
        Symbol::new(0x1000, GP_SYMBOL_NAME, SymbolKind::Data),
        Symbol::new(0x2000, GP_SYMBOL_NAME, SymbolKind::Data),
    ]);
    assert_eq!(find_canonical_gp(&view).expect("canonical gp").address, 0x2000);
}

#[test]
fn later_non_data_entries_do_not_displace_the_data_pick() {
    let view = view_with(vec![
        Symbol::new(0x1000, GP_SYMBOL_NAME, SymbolKind::Data),
        Symbol::new(0x2000, GP_SYMBOL_NAME, SymbolKind::Function),
    ]);
    assert_eq!(find_canonical_gp(&view).expect("canonical gp").address, 0x1000);
}
