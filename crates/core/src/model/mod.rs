//! Analysis view model.
//!
//! Value types describing one loaded binary the way the host engine reports
//! it: symbols with kind tags, functions made of basic blocks, instructions
//! with role-tagged operands, and the [`BinaryView`] that owns them together
//! with the comment and cross-reference annotations written by passes.

mod instruction;
mod symbol;
mod view;

pub use instruction::{BasicBlock, Function, Instruction, Operand, OperandRole};
pub use symbol::{Symbol, SymbolKind};
pub use view::{BinaryView, ViewMeta};
