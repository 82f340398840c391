use std::path::Path;

use chrono::Utc;
use rusqlite::{params, Connection};
use thiserror::Error;

use crate::model::{
    BasicBlock, BinaryView, Function, Instruction, Operand, OperandRole, Symbol, SymbolKind,
    ViewMeta,
};

/// Minimum schema version we know how to handle.
///
/// `0` means "no schema yet" (fresh file).
const MIN_SUPPORTED_SCHEMA_VERSION: i32 = 0;

/// Latest schema version this crate knows about.
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// Error type for snapshot store operations.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Underlying SQLite error.
    #[error("SQLite error: {0}")]
    Sql(#[from] rusqlite::Error),

    /// The snapshot was created with a newer schema version than we support.
    #[error(
        "Unsupported schema version {found}; supported range is {min_supported}..={max_supported}"
    )]
    UnsupportedSchemaVersion { found: i32, min_supported: i32, max_supported: i32 },
}

/// Convenience result type for snapshot operations.
pub type SnapshotResult<T> = Result<T, SnapshotError>;

/// SQLite-backed snapshot of one analysis view.
///
/// A thin wrapper around `rusqlite::Connection` responsible for:
/// - Opening/creating the snapshot file.
/// - Applying schema migrations.
/// - Saving a full view and loading it back intact.
#[derive(Debug)]
pub struct SnapshotDb {
    conn: Connection,
}

impl SnapshotDb {
    /// Open (or create) a snapshot file at the given path and ensure the
    /// schema exists.
    pub fn open(path: &Path) -> SnapshotResult<Self> {
        let conn = Connection::open(path)?;
        apply_migrations(&conn)?;
        Ok(Self { conn })
    }

    /// Expose a reference to the underlying connection for advanced callers.
    /// For most code, prefer `save_view`/`load_view`.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Persist a full copy of the view, replacing any previous content so
    /// re-saving is idempotent. Written in one transaction.
    pub fn save_view(&self, view: &BinaryView) -> SnapshotResult<()> {
        let tx = self.conn.unchecked_transaction()?;

        tx.execute_batch(
            r#"
            DELETE FROM snapshot_meta;
            DELETE FROM symbols;
            DELETE FROM functions;
            DELETE FROM blocks;
            DELETE FROM instructions;
            DELETE FROM operands;
            DELETE FROM comments;
            DELETE FROM data_refs;
            "#,
        )?;

        tx.execute(
            r#"
            INSERT INTO snapshot_meta (id, binary_path, binary_name, engine, engine_version, binary_sha256, loaded_at, created_at)
            VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                view.meta.binary_path,
                view.meta.binary_name,
                view.meta.engine,
                view.meta.engine_version,
                view.meta.binary_sha256,
                view.meta.loaded_at,
                Utc::now().to_rfc3339()
            ],
        )?;

        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO symbols (idx, address, name, kind)
                VALUES (?1, ?2, ?3, ?4)
                "#,
            )?;
            for (idx, symbol) in view.symbols.iter().enumerate() {
                stmt.execute(params![
                    idx as i64,
                    symbol.address as i64,
                    symbol.name,
                    symbol.kind.to_i32()
                ])?;
            }
        }

        {
            let mut func_stmt = tx.prepare(
                r#"
                INSERT INTO functions (id, name)
                VALUES (?1, ?2)
                "#,
            )?;
            let mut block_stmt = tx.prepare(
                r#"
                INSERT INTO blocks (function_id, block_idx, start)
                VALUES (?1, ?2, ?3)
                "#,
            )?;
            let mut instr_stmt = tx.prepare(
                r#"
                INSERT INTO instructions (function_id, block_idx, instr_idx, mnemonic)
                VALUES (?1, ?2, ?3, ?4)
                "#,
            )?;
            let mut operand_stmt = tx.prepare(
                r#"
                INSERT INTO operands (function_id, block_idx, instr_idx, operand_idx, role, text)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )?;

            for (function_id, function) in view.functions.iter().enumerate() {
                func_stmt.execute(params![function_id as i64, function.name])?;
                for (block_idx, block) in function.blocks.iter().enumerate() {
                    block_stmt.execute(params![
                        function_id as i64,
                        block_idx as i64,
                        block.start as i64
                    ])?;
                    for (instr_idx, instruction) in block.instructions.iter().enumerate() {
                        instr_stmt.execute(params![
                            function_id as i64,
                            block_idx as i64,
                            instr_idx as i64,
                            instruction.mnemonic
                        ])?;
                        for (operand_idx, operand) in instruction.operands.iter().enumerate() {
                            operand_stmt.execute(params![
                                function_id as i64,
                                block_idx as i64,
                                instr_idx as i64,
                                operand_idx as i64,
                                operand.role.to_i32(),
                                operand.text
                            ])?;
                        }
                    }
                }
            }
        }

        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO comments (address, comment)
                VALUES (?1, ?2)
                "#,
            )?;
            for (address, comment) in &view.comments {
                stmt.execute(params![*address as i64, comment])?;
            }
        }

        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO data_refs (from_addr, to_addr)
                VALUES (?1, ?2)
                "#,
            )?;
            for (from, to) in &view.data_refs {
                stmt.execute(params![*from as i64, *to as i64])?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    /// Load the saved view back, equal to the view passed to `save_view`.
    pub fn load_view(&self) -> SnapshotResult<BinaryView> {
        let meta = self.conn.query_row(
            r#"
            SELECT binary_path, binary_name, engine, engine_version, binary_sha256, loaded_at
            FROM snapshot_meta
            WHERE id = 1
            "#,
            [],
            |row| {
                Ok(ViewMeta {
                    binary_path: row.get(0)?,
                    binary_name: row.get(1)?,
                    engine: row.get(2)?,
                    engine_version: row.get(3)?,
                    binary_sha256: row.get(4)?,
                    loaded_at: row.get(5)?,
                })
            },
        )?;

        let mut view = BinaryView::new(meta);

        {
            let mut stmt = self.conn.prepare(
                r#"
                SELECT address, name, kind FROM symbols
                ORDER BY idx
                "#,
            )?;
            let rows = stmt.query_map([], |row| {
                let kind: i32 = row.get(2)?;
                Ok(Symbol {
                    address: row.get::<_, i64>(0)? as u64,
                    name: row.get(1)?,
                    kind: SymbolKind::from_i32(kind),
                })
            })?;
            for row in rows {
                view.add_symbol(row?);
            }
        }

        {
            let mut func_stmt = self.conn.prepare(
                r#"
                SELECT id, name FROM functions
                ORDER BY id
                "#,
            )?;
            let mut block_stmt = self.conn.prepare(
                r#"
                SELECT block_idx, start FROM blocks
                WHERE function_id = ?1
                ORDER BY block_idx
                "#,
            )?;
            let mut instr_stmt = self.conn.prepare(
                r#"
                SELECT block_idx, instr_idx, mnemonic FROM instructions
                WHERE function_id = ?1
                ORDER BY block_idx, instr_idx
                "#,
            )?;
            let mut operand_stmt = self.conn.prepare(
                r#"
                SELECT block_idx, instr_idx, role, text FROM operands
                WHERE function_id = ?1
                ORDER BY block_idx, instr_idx, operand_idx
                "#,
            )?;

            let funcs: Vec<(i64, String)> = func_stmt
                .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
                .collect::<Result<_, _>>()?;

            for (function_id, name) in funcs {
                let mut function = Function::new(name);

                let blocks = block_stmt.query_map(params![function_id], |row| {
                    Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?))
                })?;
                for block in blocks {
                    let (_, start) = block?;
                    function.blocks.push(BasicBlock::new(start as u64));
                }

                let instrs = instr_stmt.query_map(params![function_id], |row| {
                    Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?, row.get::<_, String>(2)?))
                })?;
                for instr in instrs {
                    let (block_idx, _, mnemonic) = instr?;
                    if let Some(block) = function.blocks.get_mut(block_idx as usize) {
                        block.instructions.push(Instruction::new(mnemonic));
                    }
                }

                let operands = operand_stmt.query_map(params![function_id], |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, i32>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                })?;
                for operand in operands {
                    let (block_idx, instr_idx, role, text) = operand?;
                    if let Some(instruction) = function
                        .blocks
                        .get_mut(block_idx as usize)
                        .and_then(|block| block.instructions.get_mut(instr_idx as usize))
                    {
                        instruction.operands.push(Operand::new(OperandRole::from_i32(role), text));
                    }
                }

                view.add_function(function);
            }
        }

        {
            let mut stmt = self.conn.prepare(
                r#"
                SELECT address, comment FROM comments
                "#,
            )?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, i64>(0)? as u64, row.get::<_, String>(1)?))
            })?;
            for row in rows {
                let (address, comment) = row?;
                view.set_comment_at(address, comment);
            }
        }

        {
            let mut stmt = self.conn.prepare(
                r#"
                SELECT from_addr, to_addr FROM data_refs
                "#,
            )?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, i64>(0)? as u64, row.get::<_, i64>(1)? as u64))
            })?;
            for row in rows {
                let (from, to) = row?;
                view.add_data_ref(from, to);
            }
        }

        Ok(view)
    }
}

/// Apply schema migrations to bring the snapshot file to the latest version.
///
/// We use `PRAGMA user_version` as the schema version indicator.
///
/// Version map:
/// - 0: no schema
/// - 1: full view snapshot (meta, symbols, functions, blocks, instructions,
///   operands, comments, data refs)
fn apply_migrations(conn: &Connection) -> SnapshotResult<()> {
    let current_version = current_schema_version(conn)?;

    // Reject snapshots created with a newer schema than we support.
    if current_version > CURRENT_SCHEMA_VERSION {
        return Err(SnapshotError::UnsupportedSchemaVersion {
            found: current_version,
            min_supported: MIN_SUPPORTED_SCHEMA_VERSION,
            max_supported: CURRENT_SCHEMA_VERSION,
        });
    }

    if current_version == 0 {
        conn.execute_batch(
            r#"
            BEGIN;
            CREATE TABLE IF NOT EXISTS snapshot_meta (
                id             INTEGER PRIMARY KEY CHECK (id = 1),
                binary_path    TEXT NOT NULL,
                binary_name    TEXT NOT NULL,
                engine         TEXT NOT NULL,
                engine_version TEXT,
                binary_sha256  TEXT,
                loaded_at      TEXT,
                created_at     TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS symbols (
                idx     INTEGER PRIMARY KEY,
                address INTEGER NOT NULL,
                name    TEXT NOT NULL,
                kind    INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS functions (
                id   INTEGER PRIMARY KEY,
                name TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS blocks (
                function_id INTEGER NOT NULL,
                block_idx   INTEGER NOT NULL,
                start       INTEGER NOT NULL,
                PRIMARY KEY(function_id, block_idx)
            );

            CREATE TABLE IF NOT EXISTS instructions (
                function_id INTEGER NOT NULL,
                block_idx   INTEGER NOT NULL,
                instr_idx   INTEGER NOT NULL,
                mnemonic    TEXT NOT NULL,
                PRIMARY KEY(function_id, block_idx, instr_idx)
            );

            CREATE TABLE IF NOT EXISTS operands (
                function_id INTEGER NOT NULL,
                block_idx   INTEGER NOT NULL,
                instr_idx   INTEGER NOT NULL,
                operand_idx INTEGER NOT NULL,
                role        INTEGER NOT NULL,
                text        TEXT NOT NULL,
                PRIMARY KEY(function_id, block_idx, instr_idx, operand_idx)
            );

            CREATE TABLE IF NOT EXISTS comments (
                address INTEGER PRIMARY KEY,
                comment TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS data_refs (
                from_addr INTEGER NOT NULL,
                to_addr   INTEGER NOT NULL,
                PRIMARY KEY(from_addr, to_addr)
            );

            PRAGMA user_version = 1;
            COMMIT;
            "#,
        )?;
    }

    Ok(())
}

/// Read the SQLite schema version from `PRAGMA user_version`.
fn current_schema_version(conn: &Connection) -> SnapshotResult<i32> {
    let version: i32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    Ok(version)
}
