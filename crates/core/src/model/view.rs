use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::model::{Function, Symbol};

/// Provenance for a loaded view: which binary, through which engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ViewMeta {
    pub binary_path: String,
    pub binary_name: String,
    pub engine: String,
    pub engine_version: Option<String>,
    /// SHA-256 of the binary file, when the adapter could compute it.
    pub binary_sha256: Option<String>,
    /// RFC 3339 timestamp of when the engine load converged.
    pub loaded_at: Option<String>,
}

/// In-memory analysis database for one binary.
///
/// Owns the converged symbol table and disassembly produced by the host
/// engine, plus the comments and data-reference edges a recovery pass writes
/// back. Exactly one pass holds and mutates a view at a time; there is no
/// interior locking.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BinaryView {
    pub meta: ViewMeta,
    /// Symbols in the order the engine reported them.
    pub symbols: Vec<Symbol>,
    pub functions: Vec<Function>,
    #[serde(default)]
    pub comments: BTreeMap<u64, String>,
    /// Directed `(from, to)` data-reference edges.
    #[serde(default)]
    pub data_refs: BTreeSet<(u64, u64)>,
}

impl BinaryView {
    pub fn new(meta: ViewMeta) -> Self {
        Self { meta, ..Self::default() }
    }

    pub fn add_symbol(&mut self, symbol: Symbol) {
        self.symbols.push(symbol);
    }

    pub fn add_function(&mut self, function: Function) {
        self.functions.push(function);
    }

    /// Symbols carrying `name`, in engine report order.
    pub fn symbols_by_name<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Symbol> + 'a {
        self.symbols.iter().filter(move |symbol| symbol.name == name)
    }

    /// Symbol sitting exactly at `address`; no range or containment match.
    ///
    /// When several symbols share an address the most recently reported one
    /// wins.
    pub fn symbol_at(&self, address: u64) -> Option<&Symbol> {
        self.symbols.iter().rev().find(|symbol| symbol.address == address)
    }

    /// Set or overwrite the comment at `address`.
    pub fn set_comment_at(&mut self, address: u64, comment: impl Into<String>) {
        self.comments.insert(address, comment.into());
    }

    pub fn comment_at(&self, address: u64) -> Option<&str> {
        self.comments.get(&address).map(String::as_str)
    }

    /// Record a directed data reference. Returns false when the edge was
    /// already present; re-adding is a no-op either way.
    pub fn add_data_ref(&mut self, from: u64, to: u64) -> bool {
        self.data_refs.insert((from, to))
    }
}
