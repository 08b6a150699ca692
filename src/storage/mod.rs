//! Storage Layer - SQLite-backed persistence
//!
//! System of record is a single SQLite table:
//! - emitters(rfID, rfType, trust, latitude, longitude, radius_ns, radius_ew, note)
//!
//! Writes go through an [`EmitterTransaction`] borrowed from the store.

pub mod migrate;
pub mod schema;
pub mod sqlite;
pub mod transaction;

pub use migrate::MigrationOutcome;
pub use sqlite::{EmitterStore, StoreStats};
pub use transaction::EmitterTransaction;

/// Knobs for opening a store
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Copy the file to `<db>.pre-migration.bak` before rebuilding an old schema
    pub backup_before_migration: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            backup_before_migration: true,
        }
    }
}
