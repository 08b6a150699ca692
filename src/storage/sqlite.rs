//! SQLite storage implementation

use std::collections::HashSet;
use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use super::migrate::{self, MigrationOutcome};
use super::schema;
use super::transaction::EmitterTransaction;
use super::StoreOptions;
use crate::bounds::BoundingBox;
use crate::emitter::{EmitterInfo, EmitterType};
use crate::ident::RfIdentification;
use crate::Result;

/// SQLite-backed emitter store.
///
/// Every constructor migrates the schema before returning, so a store only
/// ever exists on top of the current layout. Not safe for concurrent use;
/// callers serialize access.
pub struct EmitterStore {
    conn: Connection,
}

impl EmitterStore {
    /// Open a database file (creates if doesn't exist)
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with(path, &StoreOptions::default())
    }

    pub fn open_with(path: &Path, options: &StoreOptions) -> Result<Self> {
        let conn = Connection::open(path)?;
        debug!("Opened emitter database {}", path.display());
        Self::from_connection(conn, options)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn, &StoreOptions::default())
    }

    /// Take over an existing connection, migrating it first
    pub fn from_connection(mut conn: Connection, options: &StoreOptions) -> Result<Self> {
        let outcome = migrate::run_migrations(&mut conn, options)?;
        if outcome != MigrationOutcome::Current {
            debug!("Emitter schema ready ({:?})", outcome);
        }

        let store = Self { conn };
        store.initialize_indexes()?;
        Ok(store)
    }

    fn initialize_indexes(&self) -> Result<()> {
        for stmt in schema::post_migration_statements() {
            self.conn.execute(stmt, [])?;
        }
        Ok(())
    }

    /// Schema version recorded in the database
    pub fn schema_version(&self) -> Result<i32> {
        migrate::stored_version(&self.conn)
    }

    // ========== Transactions ==========

    /// Start a write transaction.
    ///
    /// All inserts, updates and drops go through the returned handle. It
    /// borrows the store mutably, so only one can be open at a time.
    pub fn begin_transaction(&mut self) -> Result<EmitterTransaction<'_>> {
        EmitterTransaction::begin(&mut self.conn)
    }

    // ========== Emitter Queries ==========

    /// Get everything known about one emitter
    pub fn get_emitter(&self, ident: &RfIdentification) -> Result<Option<EmitterInfo>> {
        read_emitter(&self.conn, ident)
    }

    /// Identities of every emitter of `rf_type` inside `bb`, edges included
    pub fn get_emitters(
        &self,
        rf_type: EmitterType,
        bb: &BoundingBox,
    ) -> Result<HashSet<RfIdentification>> {
        read_emitters_in_box(&self.conn, rf_type, bb)
    }

    /// Count all emitters
    pub fn count_emitters(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row(schema::COUNT_EMITTERS, [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<StoreStats> {
        let mut stmt = self.conn.prepare(schema::COUNT_EMITTERS_BY_TYPE)?;
        let by_type = stmt
            .query_map([], |row| {
                let rf_type: String = row.get(0)?;
                let count: i64 = row.get(1)?;
                Ok((rf_type, count as usize))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(StoreStats {
            schema_version: self.schema_version()?,
            emitters: by_type.iter().map(|(_, count)| count).sum(),
            by_type,
        })
    }
}

/// Point lookup shared by the store and open transactions
pub(super) fn read_emitter(conn: &Connection, ident: &RfIdentification) -> Result<Option<EmitterInfo>> {
    let mut stmt = conn.prepare_cached(schema::SELECT_EMITTER)?;
    stmt.query_row(params![ident.rf_id(), ident.rf_type().as_str()], row_to_info)
        .optional()
        .map_err(Into::into)
}

/// Bounding-box lookup shared by the store and open transactions
pub(super) fn read_emitters_in_box(
    conn: &Connection,
    rf_type: EmitterType,
    bb: &BoundingBox,
) -> Result<HashSet<RfIdentification>> {
    let mut stmt = conn.prepare_cached(schema::SELECT_EMITTERS_IN_BOX)?;
    let ids = stmt.query_map(
        params![rf_type.as_str(), bb.south(), bb.north(), bb.west(), bb.east()],
        |row| row.get::<_, String>(0),
    )?;

    let mut found = HashSet::new();
    for id in ids {
        found.insert(RfIdentification::new(id?, rf_type));
    }
    Ok(found)
}

/// Helper to convert a row to EmitterInfo; a NULL note reads as ""
fn row_to_info(row: &rusqlite::Row) -> rusqlite::Result<EmitterInfo> {
    let note: Option<String> = row.get(5)?;

    Ok(EmitterInfo {
        trust: row.get(0)?,
        latitude: row.get(1)?,
        longitude: row.get(2)?,
        radius_ns: row.get(3)?,
        radius_ew: row.get(4)?,
        note: note.unwrap_or_default(),
    })
}

/// Database statistics
#[derive(Debug, Clone, serde::Serialize)]
pub struct StoreStats {
    pub schema_version: i32,
    pub emitters: usize,
    /// Row count per stored `rfType` string
    pub by_type: Vec<(String, usize)>,
}

impl std::fmt::Display for StoreStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Emitter Store Statistics:")?;
        writeln!(f, "  Schema version: {}", self.schema_version)?;
        writeln!(f, "  Emitters: {}", self.emitters)?;
        for (rf_type, count) in &self.by_type {
            writeln!(f, "    {}: {}", rf_type, count)?;
        }
        Ok(())
    }
}
