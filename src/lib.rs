//! # emitter-cache - Persistent radio-emitter location cache
//!
//! Stores, per radio emitter (Wi-Fi AP, cell tower, Bluetooth beacon), the
//! current position estimate and a trust counter, and answers bounding-box
//! queries used to find emitters near a device.
//!
//! emitter-cache provides:
//! - Emitter identity types (`EmitterType`, `RfIdentification`)
//! - Observation records with clamped signal strength and a ranking order
//! - A schema-versioned, transactional SQLite store with spatial lookup

pub mod emitter;
pub mod ident;
pub mod bounds;
pub mod observation;
pub mod storage;
pub mod config;
pub mod ui;

// Re-exports for convenient access
pub use emitter::{EmitterInfo, EmitterType};
pub use ident::RfIdentification;
pub use bounds::BoundingBox;
pub use observation::{Observation, MAX_ASU, MIN_ASU};
pub use storage::{EmitterStore, EmitterTransaction, StoreOptions, StoreStats};

/// Result type alias for emitter-cache operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for emitter-cache operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid emitter identity: {0}")]
    InvalidIdentity(String),

    #[error("Invalid emitter info: {0}")]
    InvalidEmitterInfo(String),

    #[error("Emitter already stored: {0}")]
    DuplicateEmitter(RfIdentification),

    #[error("Storage unavailable: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Schema migration v{from} -> v{to} failed: {source}")]
    SchemaMigration {
        from: i32,
        to: i32,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Database schema version {found} is newer than supported version {supported}")]
    SchemaTooNew { found: i32, supported: i32 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
