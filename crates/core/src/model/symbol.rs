use serde::{Deserialize, Serialize};

/// Classification of a symbol as reported by the host engine.
///
/// Only [`SymbolKind::ImportSlot`] targets are ever annotated; the other
/// kinds exist so the canonical `$gp` marker (a Data symbol) and ordinary
/// code/data can be told apart from import-table slots.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    /// Plain data object, including the canonical `_gp` marker.
    Data,
    /// Function entry point.
    Function,
    /// Import-table slot holding the address of an externally resolved symbol.
    ImportSlot,
    /// Anything the engine reported that fits none of the above.
    Other,
}

impl SymbolKind {
    /// Encode as an integer for storage in SQLite.
    pub fn to_i32(self) -> i32 {
        match self {
            SymbolKind::Data => 0,
            SymbolKind::Function => 1,
            SymbolKind::ImportSlot => 2,
            SymbolKind::Other => 3,
        }
    }

    /// Decode from an integer stored in SQLite.
    pub fn from_i32(value: i32) -> Self {
        match value {
            0 => SymbolKind::Data,
            1 => SymbolKind::Function,
            2 => SymbolKind::ImportSlot,
            _ => SymbolKind::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Data => "data",
            SymbolKind::Function => "function",
            SymbolKind::ImportSlot => "import_slot",
            SymbolKind::Other => "other",
        }
    }
}

/// A named address in the analysis view.
///
/// Immutable once loaded from the engine. Several symbols may share a name;
/// at most one is the canonical `$gp` marker (`_gp`, kind Data).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Symbol {
    pub address: u64,
    pub name: String,
    pub kind: SymbolKind,
}

impl Symbol {
    pub fn new(address: u64, name: impl Into<String>, kind: SymbolKind) -> Self {
        Self { address, name: name.into(), kind }
    }
}
