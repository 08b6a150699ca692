//! Write sessions against the emitter store

use std::collections::HashSet;

use rusqlite::{params, Connection, Transaction, TransactionBehavior};
use tracing::debug;

use super::schema;
use super::sqlite::{read_emitter, read_emitters_in_box};
use crate::bounds::BoundingBox;
use crate::emitter::{EmitterInfo, EmitterType};
use crate::ident::RfIdentification;
use crate::{Error, Result};

/// An open write transaction on an [`EmitterStore`](super::EmitterStore).
///
/// Mutations are only reachable through this handle. [`end`](Self::end)
/// commits if anything was written and rolls back otherwise; dropping the
/// handle without ending it also rolls back.
pub struct EmitterTransaction<'conn> {
    tx: Transaction<'conn>,
    updates_made: bool,
}

impl<'conn> EmitterTransaction<'conn> {
    pub(super) fn begin(conn: &'conn mut Connection) -> Result<Self> {
        // IMMEDIATE takes the write lock up front
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        debug!("Emitter transaction started");
        Ok(Self {
            tx,
            updates_made: false,
        })
    }

    /// Whether any insert, update or drop has run in this transaction
    pub fn has_updates(&self) -> bool {
        self.updates_made
    }

    /// Add a new emitter. Fails with `DuplicateEmitter` if the identity exists.
    pub fn insert_emitter(&mut self, ident: &RfIdentification, info: &EmitterInfo) -> Result<()> {
        info.validate()?;

        let mut stmt = self.tx.prepare_cached(schema::INSERT_EMITTER)?;
        let inserted = stmt.execute(params![
            ident.rf_id(),
            ident.rf_type().as_str(),
            info.trust,
            info.latitude,
            info.longitude,
            info.radius_ns,
            info.radius_ew,
            info.note,
        ]);

        match inserted {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
            {
                return Err(Error::DuplicateEmitter(ident.clone()));
            }
            Err(e) => return Err(e.into()),
        }

        self.updates_made = true;
        Ok(())
    }

    /// Overwrite an existing emitter. Returns false if it was not stored.
    pub fn update_emitter(&mut self, ident: &RfIdentification, info: &EmitterInfo) -> Result<bool> {
        info.validate()?;

        let mut stmt = self.tx.prepare_cached(schema::UPDATE_EMITTER)?;
        let changed = stmt.execute(params![
            info.trust,
            info.latitude,
            info.longitude,
            info.radius_ns,
            info.radius_ew,
            info.note,
            ident.rf_id(),
            ident.rf_type().as_str(),
        ])?;

        self.updates_made = true;
        Ok(changed > 0)
    }

    /// Remove an emitter. Returns false if it was not stored.
    pub fn drop_emitter(&mut self, ident: &RfIdentification) -> Result<bool> {
        let mut stmt = self.tx.prepare_cached(schema::DROP_EMITTER)?;
        let removed = stmt.execute(params![ident.rf_id(), ident.rf_type().as_str()])?;

        self.updates_made = true;
        Ok(removed > 0)
    }

    /// Point lookup that sees this transaction's own writes
    pub fn get_emitter(&self, ident: &RfIdentification) -> Result<Option<EmitterInfo>> {
        read_emitter(&self.tx, ident)
    }

    /// Bounding-box lookup that sees this transaction's own writes
    pub fn get_emitters(
        &self,
        rf_type: EmitterType,
        bb: &BoundingBox,
    ) -> Result<HashSet<RfIdentification>> {
        read_emitters_in_box(&self.tx, rf_type, bb)
    }

    /// Close the transaction, committing only if something was written.
    ///
    /// Returns whether a commit happened.
    pub fn end(self) -> Result<bool> {
        if self.updates_made {
            self.tx.commit()?;
            debug!("Emitter transaction committed");
            Ok(true)
        } else {
            self.tx.rollback()?;
            debug!("Emitter transaction closed without updates");
            Ok(false)
        }
    }
}
