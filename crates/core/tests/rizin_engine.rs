#![cfg(feature = "rizin-engine")]

use gprec_core::engine::{AnalysisEngine, LoadRequest, RizinEngine};
use gprec_core::model::{OperandRole, SymbolKind};

#[test]
fn rizin_engine_errors_for_missing_binary() {
    let err = RizinEngine
        .load(&LoadRequest::new("does_not_exist.bin"))
        .unwrap_err();
    assert!(format!("{err:?}").contains("MissingBinary"));
}

#[test]
fn rizin_engine_parses_fake_json_without_rizin_installed() {
    let temp = tempfile::tempdir().unwrap();
    let binary = temp.path().join("libdemo.so");
    std::fs::write(&binary, b"elf").unwrap();

    // Fake rizin output and version to avoid external dependency in CI.
    let fake_symbols = temp.path().join("isj.json");
    std::fs::write(
        &fake_symbols,
        r#"[
            {"name":"_gp","vaddr":4268869,"type":"OBJ"},
            {"name":"imp.memcpy","realname":"memcpy","vaddr":4236653,"type":"FUNC","is_imported":true},
            {"name":"main","vaddr":4096,"type":"FUNC"},
            {"name":"mystery","vaddr":8192,"type":"NOTYPE"},
            {"name":"no_address"}
        ]"#,
    )
    .unwrap();
    let fake_functions = temp.path().join("agfj.json");
    std::fs::write(
        &fake_functions,
        r#"[
            {"name":"main","offset":4096,"blocks":[
                {"offset":4096,"ops":[
                    {"disasm":"lui gp, 0x42"},
                    {"disasm":"addiu gp, gp, 0x2345"},
                    {"disasm":"lw t9, -0x7dd8(gp)"},
                    {"disasm":"jalr t9"},
                    {}
                ]}
            ]}
        ]"#,
    )
    .unwrap();
    std::env::set_var("GPREC_RIZIN_FAKE_SYMBOLS", &fake_symbols);
    std::env::set_var("GPREC_RIZIN_FAKE_FUNCTIONS", &fake_functions);
    std::env::set_var("GPREC_RIZIN_FAKE_VERSION", "rizin 1.0-fake");

    let result = RizinEngine.load(&LoadRequest::new(&binary));

    std::env::remove_var("GPREC_RIZIN_FAKE_SYMBOLS");
    std::env::remove_var("GPREC_RIZIN_FAKE_FUNCTIONS");
    std::env::remove_var("GPREC_RIZIN_FAKE_VERSION");

    let view = result.expect("load fake view");
    assert_eq!(view.meta.engine, "rizin");
    assert_eq!(view.meta.engine_version.as_deref(), Some("rizin 1.0-fake"));
    assert_eq!(view.meta.binary_name, "libdemo.so");
    assert!(view.meta.binary_sha256.is_some());
    assert!(view.meta.loaded_at.is_some());

    // The entry without an address is dropped; the rest map onto our kinds.
    assert_eq!(view.symbols.len(), 4);
    assert_eq!(view.symbol_at(0x412345).expect("_gp").kind, SymbolKind::Data);
    let memcpy = view.symbol_at(0x40a56d).expect("memcpy");
    assert_eq!(memcpy.name, "memcpy");
    assert_eq!(memcpy.kind, SymbolKind::ImportSlot);
    assert_eq!(view.symbol_at(0x1000).expect("main").kind, SymbolKind::Function);
    assert_eq!(view.symbol_at(0x2000).expect("mystery").kind, SymbolKind::Other);

    // Disassembly text became role-tagged operands with `$`-spelled registers.
    assert_eq!(view.functions.len(), 1);
    assert_eq!(view.functions[0].name, "main");
    let block = &view.functions[0].blocks[0];
    assert_eq!(block.start, 0x1000);
    assert_eq!(block.instructions.len(), 5);

    let load = &block.instructions[2];
    assert_eq!(load.mnemonic, "lw");
    assert_eq!(load.operand(OperandRole::Dest).expect("dest").text, "$t9");
    assert_eq!(load.operand(OperandRole::Imm).expect("imm").text, "-0x7dd8");
    assert_eq!(load.operand(OperandRole::Base).expect("base").text, "$gp");
    assert_eq!(load.to_string(), "lw $t9, -0x7dd8($gp)");
    assert_eq!(block.instruction_address(2), 0x1008);

    // The op with no text keeps its four-byte slot as a blank placeholder.
    assert_eq!(block.instructions[4].mnemonic, "");
}
