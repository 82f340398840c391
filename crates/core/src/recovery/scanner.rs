use crate::model::{BinaryView, Instruction, OperandRole};

/// One `lw` through `$gp` with its parsed immediate, ready for resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpLoadCandidate<'a> {
    /// Derived instruction address: block start plus four bytes per index.
    pub address: u64,
    pub immediate: i64,
    pub instruction: &'a Instruction,
}

/// Walk every function, block, and instruction in the view, yielding the
/// instructions that load a word through `$gp` with an immediate offset.
///
/// Lazy and single-use. Instructions failing any check are skipped silently;
/// this is the only filtering point, and each decision is local to one
/// instruction with no cross-instruction state.
pub fn scan_gp_loads(view: &BinaryView) -> impl Iterator<Item = GpLoadCandidate<'_>> {
    view.functions.iter().flat_map(|function| {
        function.blocks.iter().flat_map(|block| {
            block.instructions.iter().enumerate().filter_map(move |(index, instruction)| {
                let immediate = match_gp_load(instruction)?;
                Some(GpLoadCandidate {
                    address: block.instruction_address(index),
                    immediate,
                    instruction,
                })
            })
        })
    })
}

/// Immediate of a matching `lw Dest, Imm($gp)`; `None` when the pattern does
/// not hold. Checks, in order: the instruction is an `lw` with a destination
/// register, its base register is exactly `$gp`, and its immediate parses as
/// signed base-16 text.
fn match_gp_load(instruction: &Instruction) -> Option<i64> {
    if instruction.mnemonic != "lw" || instruction.operand(OperandRole::Dest).is_none() {
        return None;
    }
    let base = instruction.operand(OperandRole::Base)?;
    if base.text != "$gp" {
        return None;
    }
    let imm = instruction.operand(OperandRole::Imm)?;
    parse_signed_hex(&imm.text)
}

/// Parse a signed base-16 immediate the way disassemblers print them: an
/// optional leading `-`, then an optional `0x` prefix, then hex digits.
pub fn parse_signed_hex(text: &str) -> Option<i64> {
    let trimmed = text.trim();
    let (negative, magnitude) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };
    let digits = magnitude
        .strip_prefix("0x")
        .or_else(|| magnitude.strip_prefix("0X"))
        .unwrap_or(magnitude);
    if digits.is_empty() {
        return None;
    }
    let value = i64::from_str_radix(digits, 16).ok()?;
    if negative {
        value.checked_neg()
    } else {
        Some(value)
    }
}
