use std::path::{Path, PathBuf};

use gprec_core::model::{
    BasicBlock, BinaryView, Function, Instruction, OperandRole, Symbol, SymbolKind, ViewMeta,
};
use gprec_core::snapshot::{snapshot_path, SnapshotDb, SnapshotError, CURRENT_SCHEMA_VERSION};

/// View exercising every persisted table: duplicate-address symbols, a
/// multi-block function with role-tagged operands, comments, and edges.
fn full_view() -> BinaryView {
    let mut view = BinaryView::new(ViewMeta {
        binary_path: "/tmp/libdemo.so".to_string(),
        binary_name: "libdemo.so".to_string(),
        engine: "rizin".to_string(),
        engine_version: Some("rizin 0.7.0".to_string()),
        binary_sha256: Some("abc123".to_string()),
        loaded_at: Some("2024-05-01T12:00:00+00:00".to_string()),
    });

    view.add_symbol(Symbol::new(0x412345, "_gp", SymbolKind::Data));
    view.add_symbol(Symbol::new(0x40a56d, "old_name", SymbolKind::Data));
    view.add_symbol(Symbol::new(0x40a56d, "memcpy", SymbolKind::ImportSlot));
    view.add_symbol(Symbol::new(0x1000, "main", SymbolKind::Function));
    view.add_symbol(Symbol::new(0x9999, "mystery", SymbolKind::Other));

    let mut entry = BasicBlock::new(0x1000);
    entry.instructions.push(
        Instruction::new("lw")
            .with_operand(OperandRole::Dest, "$t9")
            .with_operand(OperandRole::Imm, "-0x7dd8")
            .with_operand(OperandRole::Base, "$gp"),
    );
    entry.instructions.push(Instruction::new("nop"));
    let mut exit = BasicBlock::new(0x2000);
    exit.instructions.push(
        Instruction::new("jr").with_operand(OperandRole::Src, "$ra"),
    );
    let mut main = Function::new("main");
    main.blocks.push(entry);
    main.blocks.push(exit);
    view.add_function(main);
    view.add_function(Function::new("empty_fn"));

    view.set_comment_at(0x1000, "memcpy");
    view.add_data_ref(0x1000, 0x40a56d);
    view.add_data_ref(0x1004, 0x412345);
    view
}

#[test]
fn snapshot_round_trips_a_full_view() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("libdemo.so_default_analysis.db");
    let view = full_view();

    let db = SnapshotDb::open(&path).expect("open snapshot");
    db.save_view(&view).expect("save view");
    let loaded = db.load_view().expect("load view");
    assert_eq!(loaded, view);
}

#[test]
fn saved_views_survive_reopening_the_file() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("persisted.db");
    let view = full_view();

    SnapshotDb::open(&path).expect("open").save_view(&view).expect("save");
    let loaded = SnapshotDb::open(&path).expect("reopen").load_view().expect("load");
    assert_eq!(loaded, view);
}

#[test]
fn resaving_replaces_instead_of_accumulating() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("resave.db");
    let view = full_view();

    let db = SnapshotDb::open(&path).expect("open");
    db.save_view(&view).expect("first save");
    db.save_view(&view).expect("second save");

    // Equality would fail if rows had accumulated across saves.
    let loaded = db.load_view().expect("load");
    assert_eq!(loaded, view);

    let symbol_count: i64 = db
        .connection()
        .query_row("SELECT COUNT(*) FROM symbols", [], |row| row.get(0))
        .expect("count symbols");
    assert_eq!(symbol_count as usize, view.symbols.len());
}

#[test]
fn empty_views_round_trip_too() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("empty.db");
    let view = BinaryView::default();

    let db = SnapshotDb::open(&path).expect("open");
    db.save_view(&view).expect("save");
    assert_eq!(db.load_view().expect("load"), view);
}

#[test]
fn fresh_files_are_stamped_with_the_current_schema_version() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("fresh.db");
    let db = SnapshotDb::open(&path).expect("open");
    let version: i32 = db
        .connection()
        .query_row("PRAGMA user_version", [], |row| row.get(0))
        .expect("read user_version");
    assert_eq!(version, CURRENT_SCHEMA_VERSION);
}

#[test]
fn files_from_a_newer_schema_are_rejected() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("future.db");
    {
        let conn = rusqlite::Connection::open(&path).expect("create file");
        conn.execute_batch("PRAGMA user_version = 99;").expect("stamp version");
    }

    let err = SnapshotDb::open(&path).expect_err("open fails");
    match err {
        SnapshotError::UnsupportedSchemaVersion { found, min_supported, max_supported } => {
            assert_eq!(found, 99);
            assert!(min_supported <= max_supported);
            assert_eq!(max_supported, CURRENT_SCHEMA_VERSION);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn snapshot_paths_derive_from_the_file_name() {
    let dir = Path::new("/tmp/out");
    assert_eq!(
        snapshot_path(dir, Path::new("demos/libfoo.so"), "default_analysis"),
        PathBuf::from("/tmp/out/libfoo.so_default_analysis.db")
    );
    assert_eq!(
        snapshot_path(dir, Path::new("/abs/path/libfoo.so"), "after_analysis"),
        PathBuf::from("/tmp/out/libfoo.so_after_analysis.db")
    );
    // Inputs with no file name still produce a usable path.
    assert_eq!(
        snapshot_path(dir, Path::new(".."), "default_analysis"),
        PathBuf::from("/tmp/out/binary_default_analysis.db")
    );
}
