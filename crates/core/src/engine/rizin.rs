use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use log::debug;
use serde::Deserialize;

use crate::engine::{sha256_file, AnalysisEngine, EngineError, LoadRequest};
use crate::model::{
    BasicBlock, BinaryView, Function, Instruction, OperandRole, Symbol, SymbolKind, ViewMeta,
};

/// Rizin-backed loader that shells out to rizin for symbols and disassembly.
///
/// Two queries per load: `aa;isj` for the symbol table and `aa;agfj` for the
/// function graphs with per-block instruction listings. Each runs rizin's
/// auto-analysis first and returns only once it has settled.
pub struct RizinEngine;

impl AnalysisEngine for RizinEngine {
    fn load(&self, request: &LoadRequest) -> Result<BinaryView, EngineError> {
        if !request.binary_path.is_file() {
            return Err(EngineError::MissingBinary(request.binary_path.clone()));
        }

        let rizin_path = request.engine_path.clone().unwrap_or_else(resolve_rizin_path);
        let version = version_string(&rizin_path).map_err(EngineError::Engine)?;

        // Allow tests to feed synthetic JSON via env to avoid needing rizin installed.
        let symbols_json = if let Some(fake) = std::env::var_os("GPREC_RIZIN_FAKE_SYMBOLS") {
            fs::read_to_string(fake).map_err(|e| {
                EngineError::Engine(format!("failed to read GPREC_RIZIN_FAKE_SYMBOLS: {e}"))
            })?
        } else {
            run_rizin_json(&rizin_path, &request.binary_path, "aa;isj")?
        };

        let functions_json = if let Some(fake) = std::env::var_os("GPREC_RIZIN_FAKE_FUNCTIONS") {
            fs::read_to_string(fake).map_err(|e| {
                EngineError::Engine(format!("failed to read GPREC_RIZIN_FAKE_FUNCTIONS: {e}"))
            })?
        } else {
            run_rizin_json(&rizin_path, &request.binary_path, "aa;agfj")?
        };

        let binary_name = request
            .binary_path
            .file_name()
            .map(|os| os.to_string_lossy().to_string())
            .unwrap_or_else(|| request.binary_path.display().to_string());

        let mut view = BinaryView::new(ViewMeta {
            binary_path: request.binary_path.display().to_string(),
            binary_name,
            engine: "rizin".to_string(),
            engine_version: Some(version),
            binary_sha256: sha256_file(&request.binary_path).ok(),
            loaded_at: Some(chrono::Utc::now().to_rfc3339()),
        });

        for symbol in parse_symbols(&symbols_json)? {
            view.add_symbol(symbol);
        }
        for function in parse_functions(&functions_json)? {
            view.add_function(function);
        }

        Ok(view)
    }

    fn name(&self) -> &'static str {
        "rizin"
    }
}

fn resolve_rizin_path() -> PathBuf {
    std::env::var_os("RIZIN_BIN").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("rizin"))
}

fn run_rizin_json(rizin_bin: &Path, binary: &Path, command: &str) -> Result<String, EngineError> {
    debug!("running {} -c '{}' on {}", rizin_bin.display(), command, binary.display());
    let output = Command::new(rizin_bin)
        .args(["-2", "-q0", "-c", command])
        .arg(binary)
        .output()
        .map_err(|e| EngineError::Engine(format!("failed to spawn rizin: {e}")))?;
    if !output.status.success() {
        return Err(EngineError::Engine(format!("rizin exited with {}", output.status)));
    }
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    Ok(stdout)
}

fn version_string(rizin_bin: &Path) -> Result<String, String> {
    if let Some(fake) = std::env::var_os("GPREC_RIZIN_FAKE_VERSION") {
        return Ok(fake.to_string_lossy().to_string());
    }
    let output = Command::new(rizin_bin)
        .arg("-v")
        .output()
        .map_err(|e| format!("failed to spawn rizin: {e}"))?;
    if !output.status.success() {
        return Err(format!("rizin -v exited with {}", output.status));
    }
    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if stdout.is_empty() {
        Err("rizin -v produced no output".to_string())
    } else {
        Ok(stdout)
    }
}

#[derive(Debug, Deserialize)]
struct RizinSymbol {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    realname: Option<String>,
    #[serde(default)]
    vaddr: Option<u64>,
    #[serde(default)]
    #[serde(rename = "type")]
    typ: Option<String>,
    #[serde(default)]
    is_imported: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct RizinGraphFunction {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    offset: Option<u64>,
    #[serde(default)]
    blocks: Option<Vec<RizinBlock>>,
}

#[derive(Debug, Deserialize)]
struct RizinBlock {
    #[serde(default)]
    offset: Option<u64>,
    #[serde(default)]
    ops: Option<Vec<RizinOp>>,
}

#[derive(Debug, Deserialize)]
struct RizinOp {
    #[serde(default)]
    disasm: Option<String>,
    #[serde(default)]
    opcode: Option<String>,
}

fn parse_symbols(body: &str) -> Result<Vec<Symbol>, EngineError> {
    let raw: Vec<RizinSymbol> = serde_json::from_str(body)
        .map_err(|e| EngineError::Engine(format!("failed to parse rizin isj JSON: {e}")))?;
    let mut out = Vec::new();
    for sym in raw {
        let address = match sym.vaddr {
            Some(addr) => addr,
            None => continue,
        };
        let name = match sym.realname.clone().or_else(|| sym.name.clone()) {
            Some(name) if !name.is_empty() => name,
            _ => continue,
        };
        out.push(Symbol::new(address, name, symbol_kind(&sym)));
    }
    Ok(out)
}

/// Map a rizin symbol record onto our kind tags. Imports win over the type
/// string, since rizin marks import-table entries with `is_imported` while
/// still reporting the pointee's type.
fn symbol_kind(sym: &RizinSymbol) -> SymbolKind {
    if sym.is_imported.unwrap_or(false) {
        return SymbolKind::ImportSlot;
    }
    match sym.typ.as_deref() {
        Some("OBJ") | Some("OBJECT") => SymbolKind::Data,
        Some("FUNC") => SymbolKind::Function,
        _ => SymbolKind::Other,
    }
}

fn parse_functions(body: &str) -> Result<Vec<Function>, EngineError> {
    let raw: Vec<RizinGraphFunction> = serde_json::from_str(body)
        .map_err(|e| EngineError::Engine(format!("failed to parse rizin agfj JSON: {e}")))?;
    let mut out = Vec::new();
    for func in raw {
        let name = func
            .name
            .unwrap_or_else(|| format!("fcn.{:08x}", func.offset.unwrap_or(0)));
        let mut function = Function::new(name);
        for raw_block in func.blocks.unwrap_or_default() {
            let mut block = BasicBlock::new(raw_block.offset.unwrap_or(0));
            for op in raw_block.ops.unwrap_or_default() {
                let text = op.disasm.or(op.opcode).unwrap_or_default();
                // Every op occupies one four-byte slot; keep a placeholder when
                // the engine gives no text so derived addresses stay aligned.
                let instruction =
                    parse_mips_disasm(&text).unwrap_or_else(|| Instruction::new(""));
                block.instructions.push(instruction);
            }
            function.blocks.push(block);
        }
        out.push(function);
    }
    Ok(out)
}

/// MIPS32 general-purpose register names, indexed by register number.
const MIPS_GPR_NAMES: [&str; 32] = [
    "zero", "at", "v0", "v1", "a0", "a1", "a2", "a3", "t0", "t1", "t2", "t3", "t4", "t5", "t6",
    "t7", "s0", "s1", "s2", "s3", "s4", "s5", "s6", "s7", "t8", "t9", "k0", "k1", "gp", "sp",
    "fp", "ra",
];

fn is_gpr(token: &str) -> bool {
    let bare = token.strip_prefix('$').unwrap_or(token);
    bare == "s8" || MIPS_GPR_NAMES.contains(&bare)
}

/// Registers are normalized to the `$`-prefixed spelling; rizin prints them
/// bare while other engines keep the sigil.
fn normalize_register(token: &str) -> String {
    format!("${}", token.strip_prefix('$').unwrap_or(token))
}

/// Split `imm(base)` into its parts; `None` when the token is not a memory
/// operand with a register base.
fn split_memory_operand(token: &str) -> Option<(&str, &str)> {
    let open = token.find('(')?;
    let close = token.rfind(')')?;
    if close != token.len() - 1 || close <= open {
        return None;
    }
    let imm = token[..open].trim();
    let base = token[open + 1..close].trim();
    if imm.is_empty() || !is_gpr(base) {
        return None;
    }
    Some((imm, base))
}

/// Parse one line of disassembly text into role-tagged operands.
///
/// Understands the shapes MIPS32 loads and stores come in: a memory form
/// `op rd, imm(base)` and plain register lists. Tokens that are neither a
/// register nor a memory operand keep their text under a Src role so nothing
/// is dropped.
fn parse_mips_disasm(text: &str) -> Option<Instruction> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    let (mnemonic, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((mnemonic, rest)) => (mnemonic, rest.trim()),
        None => (trimmed, ""),
    };

    let mut instruction = Instruction::new(mnemonic);
    for (index, token) in rest.split(',').map(str::trim).filter(|t| !t.is_empty()).enumerate() {
        if let Some((imm, base)) = split_memory_operand(token) {
            instruction = instruction
                .with_operand(OperandRole::Imm, imm)
                .with_operand(OperandRole::Base, normalize_register(base));
        } else if is_gpr(token) {
            let role = if index == 0 { OperandRole::Dest } else { OperandRole::Src };
            instruction = instruction.with_operand(role, normalize_register(token));
        } else {
            instruction = instruction.with_operand(OperandRole::Src, token);
        }
    }
    Some(instruction)
}
