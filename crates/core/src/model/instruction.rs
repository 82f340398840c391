use std::fmt;

use serde::{Deserialize, Serialize};

/// Role an operand plays within its instruction.
///
/// Matching is done by role, never by token position, so the pattern checks
/// survive formatting differences between engines.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OperandRole {
    /// Register receiving the result.
    Dest,
    /// Register read as a plain source.
    Src,
    /// Immediate value, kept as the engine printed it.
    Imm,
    /// Register a memory operand indexes through.
    Base,
}

impl OperandRole {
    /// Encode as an integer for storage in SQLite.
    pub fn to_i32(self) -> i32 {
        match self {
            OperandRole::Dest => 0,
            OperandRole::Src => 1,
            OperandRole::Imm => 2,
            OperandRole::Base => 3,
        }
    }

    /// Decode from an integer stored in SQLite.
    pub fn from_i32(value: i32) -> Self {
        match value {
            0 => OperandRole::Dest,
            2 => OperandRole::Imm,
            3 => OperandRole::Base,
            _ => OperandRole::Src,
        }
    }
}

/// One operand: its role plus the text the engine printed for it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Operand {
    pub role: OperandRole,
    pub text: String,
}

impl Operand {
    pub fn new(role: OperandRole, text: impl Into<String>) -> Self {
        Self { role, text: text.into() }
    }
}

/// A single decoded instruction.
///
/// The address is not stored here; it is derived from the owning block, see
/// [`BasicBlock::instruction_address`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Instruction {
    pub mnemonic: String,
    pub operands: Vec<Operand>,
}

impl Instruction {
    pub fn new(mnemonic: impl Into<String>) -> Self {
        Self { mnemonic: mnemonic.into(), operands: Vec::new() }
    }

    /// Builder-style helper to append an operand when constructing by hand.
    pub fn with_operand(mut self, role: OperandRole, text: impl Into<String>) -> Self {
        self.operands.push(Operand::new(role, text));
        self
    }

    /// First operand carrying `role`, if any.
    pub fn operand(&self, role: OperandRole) -> Option<&Operand> {
        self.operands.iter().find(|op| op.role == role)
    }
}

impl fmt::Display for Instruction {
    /// Reconstructs canonical assembly text: operands are comma separated,
    /// except that an immediate directly followed by a base register renders
    /// as the memory form `imm(base)`, e.g. `lw $t9, -0x7dd8($gp)`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mnemonic)?;
        let mut index = 0;
        let mut first = true;
        while index < self.operands.len() {
            let sep = if first { " " } else { ", " };
            let operand = &self.operands[index];
            let next_is_base = self
                .operands
                .get(index + 1)
                .map(|next| next.role == OperandRole::Base)
                .unwrap_or(false);
            if operand.role == OperandRole::Imm && next_is_base {
                write!(f, "{sep}{}({})", operand.text, self.operands[index + 1].text)?;
                index += 2;
            } else {
                write!(f, "{sep}{}", operand.text)?;
                index += 1;
            }
            first = false;
        }
        Ok(())
    }
}

/// Straight-line run of instructions starting at `start`.
///
/// MIPS32 instructions are a fixed four bytes wide, so per-instruction
/// addresses are derived from the block start instead of being stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BasicBlock {
    pub start: u64,
    pub instructions: Vec<Instruction>,
}

impl BasicBlock {
    pub fn new(start: u64) -> Self {
        Self { start, instructions: Vec::new() }
    }

    /// Address of the instruction at `index` within this block.
    pub fn instruction_address(&self, index: usize) -> u64 {
        self.start + 4 * index as u64
    }
}

/// Function as the engine carved it: a name plus its basic blocks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Function {
    pub name: String,
    pub blocks: Vec<BasicBlock>,
}

impl Function {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), blocks: Vec::new() }
    }
}
