//! Schema migration
//!
//! The schema version lives in `PRAGMA user_version` and is written in the
//! same transaction as the DDL it describes. A reader therefore sees either
//! the old layout with the old number or the new layout with the new number.
//!
//! The marker alone is not trusted. The table is classified by its
//! declared columns, so databases written before the marker existed and
//! v2 files declared with `STRING` columns and an `rfID`-only key are
//! both rebuilt into the current layout.

use std::path::PathBuf;

use rusqlite::{Connection, TransactionBehavior};
use tracing::{info, warn};

use super::schema::{self, EMITTERS_TABLE, SCHEMA_VERSION};
use super::StoreOptions;
use crate::{Error, Result};

struct Migration {
    /// Version the table is at after this step
    version: i32,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 2,
    sql: schema::MIGRATE_V1_TO_V2,
}];

/// What opening the database did to its schema
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// Empty database, current layout created directly
    Created,
    /// Already at the current version
    Current,
    /// Current layout without a version marker; marker written
    Stamped,
    /// Rebuilt from an older layout
    Migrated { from: i32 },
    /// v2 columns with a different declaration, rebuilt in place
    Rebuilt,
}

/// Version recorded in the database header, 0 if never set
pub fn stored_version(conn: &Connection) -> Result<i32> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?)
}

fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    let mut stmt = conn.prepare("SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1")?;
    Ok(stmt.exists([name])?)
}

fn table_columns(conn: &Connection, table: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1)")?;
    let columns = stmt
        .query_map([table], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(columns)
}

/// Shape of the emitter table as found on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    /// No emitter table yet
    Missing,
    /// Single `radius` column
    V1,
    /// v2 columns, but declared differently from `CREATE_EMITTERS_TABLE`
    NonConformingV2,
    /// Exactly the current declaration
    Current,
}

/// Whether the table matches `schema::CURRENT_COLUMNS` column for column.
fn conforms_to_current(conn: &Connection) -> Result<bool> {
    let mut stmt = conn.prepare("SELECT name, type, \"notnull\", pk FROM pragma_table_info(?1)")?;
    let found = stmt
        .query_map([EMITTERS_TABLE], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, bool>(2)?,
                row.get::<_, i32>(3)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(found.len() == schema::CURRENT_COLUMNS.len()
        && schema::CURRENT_COLUMNS.iter().all(|(name, decl, not_null, pk)| {
            found.iter().any(|(n, t, nn, p)| {
                n == name && t.eq_ignore_ascii_case(decl) && nn == not_null && p == pk
            })
        }))
}

/// Classify the emitter table by its columns, independent of the marker.
fn detect_layout(conn: &Connection) -> Result<Layout> {
    if !table_exists(conn, EMITTERS_TABLE)? {
        return Ok(Layout::Missing);
    }

    let columns = table_columns(conn, EMITTERS_TABLE)?;
    if !(columns.iter().any(|c| c == "radius_ns") && columns.iter().any(|c| c == "radius_ew")) {
        return Ok(Layout::V1);
    }

    if conforms_to_current(conn)? {
        Ok(Layout::Current)
    } else {
        Ok(Layout::NonConformingV2)
    }
}

/// Hot-copy the database to `<db_path>.pre-migration.bak`.
///
/// Returns `None` for in-memory and temporary databases, which have no path.
fn backup_before_migration(conn: &Connection) -> Result<Option<PathBuf>> {
    let db_path: String = conn.query_row("PRAGMA database_list", [], |row| row.get(2))?;
    if db_path.is_empty() {
        return Ok(None);
    }

    let backup_path = PathBuf::from(format!("{}.pre-migration.bak", db_path));
    let mut backup_conn = Connection::open(&backup_path)?;
    let backup = rusqlite::backup::Backup::new(conn, &mut backup_conn)?;
    backup.step(-1)?;

    info!("Pre-migration backup written to {}", backup_path.display());
    Ok(Some(backup_path))
}

fn create_current_schema(conn: &mut Connection) -> Result<()> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    tx.execute_batch(schema::CREATE_EMITTERS_TABLE)?;
    tx.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    tx.commit()?;
    Ok(())
}

fn stamp_current_version(conn: &mut Connection) -> Result<()> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    tx.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    tx.commit()?;
    Ok(())
}

fn migration_error(from: i32, to: i32) -> impl FnOnce(rusqlite::Error) -> Error {
    move |source| Error::SchemaMigration { from, to, source }
}

/// Run `sql` and stamp `SCHEMA_VERSION` in one transaction.
fn rebuild(conn: &mut Connection, from: i32, sql: &str) -> Result<()> {
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(migration_error(from, SCHEMA_VERSION))?;

    tx.execute_batch(sql).map_err(migration_error(from, SCHEMA_VERSION))?;
    tx.pragma_update(None, "user_version", SCHEMA_VERSION)
        .map_err(migration_error(from, SCHEMA_VERSION))?;
    tx.commit().map_err(migration_error(from, SCHEMA_VERSION))?;
    Ok(())
}

/// Apply every step above `from` in a single transaction.
fn apply_migrations(conn: &mut Connection, from: i32) -> Result<()> {
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(migration_error(from, SCHEMA_VERSION))?;

    for migration in MIGRATIONS.iter().filter(|m| m.version > from) {
        tx.execute_batch(migration.sql)
            .map_err(migration_error(from, migration.version))?;
        info!("Applied schema migration v{} -> v{}", migration.version - 1, migration.version);
    }

    tx.pragma_update(None, "user_version", SCHEMA_VERSION)
        .map_err(migration_error(from, SCHEMA_VERSION))?;
    tx.commit().map_err(migration_error(from, SCHEMA_VERSION))?;
    Ok(())
}

/// Bring the database up to `SCHEMA_VERSION`.
///
/// The marker only decides whether this build may touch the file at all.
/// What happens next depends on the table actually found: anything other
/// than the exact current declaration is rebuilt into it. Any failure
/// leaves the database exactly as it was found; the dropped transaction
/// rolls back.
pub fn run_migrations(conn: &mut Connection, options: &StoreOptions) -> Result<MigrationOutcome> {
    let marked = stored_version(conn)?;

    if marked > SCHEMA_VERSION {
        warn!(
            "Refusing to open emitter database at schema v{} (this build supports v{})",
            marked, SCHEMA_VERSION
        );
        return Err(Error::SchemaTooNew {
            found: marked,
            supported: SCHEMA_VERSION,
        });
    }

    match detect_layout(conn)? {
        Layout::Missing => {
            create_current_schema(conn)?;
            info!("Created emitter schema v{}", SCHEMA_VERSION);
            Ok(MigrationOutcome::Created)
        }
        Layout::Current if marked == SCHEMA_VERSION => Ok(MigrationOutcome::Current),
        Layout::Current => {
            stamp_current_version(conn)?;
            info!("Stamped unversioned emitter schema as v{}", SCHEMA_VERSION);
            Ok(MigrationOutcome::Stamped)
        }
        Layout::NonConformingV2 => {
            if options.backup_before_migration {
                backup_before_migration(conn)?;
            }
            rebuild(conn, SCHEMA_VERSION, schema::REBUILD_V2)?;
            info!("Rebuilt non-conforming v{} emitter table", SCHEMA_VERSION);
            Ok(MigrationOutcome::Rebuilt)
        }
        Layout::V1 => {
            if options.backup_before_migration {
                backup_before_migration(conn)?;
            }
            apply_migrations(conn, 1)?;
            Ok(MigrationOutcome::Migrated { from: 1 })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emitter::EmitterType;
    use crate::ident::RfIdentification;
    use crate::storage::EmitterStore;
    use rusqlite::params;
    use std::path::Path;

    fn v1_db(conn: &Connection, user_version: i32) {
        conn.execute_batch(schema::CREATE_EMITTERS_TABLE_V1).unwrap();
        conn.pragma_update(None, "user_version", user_version).unwrap();
    }

    fn insert_v1(conn: &Connection, id: &str, rf_type: &str, radius: f64, note: Option<&str>) {
        conn.execute(
            "INSERT INTO emitters (rfID, rfType, trust, latitude, longitude, radius, note)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![id, rf_type, 20, 47.6097, -122.3331, radius, note],
        )
        .unwrap();
    }

    fn columns_of(path: &Path) -> Vec<String> {
        let conn = Connection::open(path).unwrap();
        table_columns(&conn, EMITTERS_TABLE).unwrap()
    }

    /// v2 columns declared with `STRING` types and an `rfID`-only key
    const CREATE_EMITTERS_TABLE_STRING_V2: &str = r#"
    CREATE TABLE IF NOT EXISTS emitters (
        rfID STRING PRIMARY KEY,
        rfType STRING,
        trust INTEGER,
        latitude REAL,
        longitude REAL,
        radius_ns REAL,
        radius_ew REAL,
        note STRING
    )
    "#;

    fn string_typed_v2_db(conn: &Connection) {
        conn.execute_batch(CREATE_EMITTERS_TABLE_STRING_V2).unwrap();
        conn.pragma_update(None, "user_version", 2).unwrap();
    }

    fn storage_class(conn: &Connection, column: &str, id: &str) -> String {
        conn.query_row(
            &format!("SELECT typeof({}) FROM emitters WHERE rfID = ?1", column),
            [id],
            |row| row.get(0),
        )
        .unwrap()
    }

    #[test]
    fn test_fresh_db_created_at_current_version() {
        let mut conn = Connection::open_in_memory().unwrap();
        let outcome = run_migrations(&mut conn, &StoreOptions::default()).unwrap();
        assert_eq!(outcome, MigrationOutcome::Created);
        assert_eq!(stored_version(&conn).unwrap(), SCHEMA_VERSION);

        let columns = table_columns(&conn, EMITTERS_TABLE).unwrap();
        assert!(columns.contains(&"radius_ns".to_string()));
        assert!(columns.contains(&"radius_ew".to_string()));
        assert!(!columns.contains(&"radius".to_string()));

        // Second run is a no-op
        let outcome = run_migrations(&mut conn, &StoreOptions::default()).unwrap();
        assert_eq!(outcome, MigrationOutcome::Current);
    }

    #[test]
    fn test_v1_radius_copied_to_both_axes() {
        let conn = Connection::open_in_memory().unwrap();
        v1_db(&conn, 1);
        insert_v1(&conn, "00:11:22:33:44:55", "WLAN", 5.0, Some("cafe"));
        insert_v1(&conn, "310/260/1/2", "LTE", 1500.0, None);

        let store = EmitterStore::from_connection(conn, &StoreOptions::default()).unwrap();
        assert_eq!(store.schema_version().unwrap(), SCHEMA_VERSION);
        assert_eq!(store.count_emitters().unwrap(), 2);

        let wifi = store
            .get_emitter(&RfIdentification::new("00:11:22:33:44:55", EmitterType::Wlan))
            .unwrap()
            .unwrap();
        assert_eq!(wifi.radius_ns, 5.0);
        assert_eq!(wifi.radius_ew, 5.0);
        assert_eq!(wifi.trust, 20);
        assert_eq!(wifi.latitude, 47.6097);
        assert_eq!(wifi.longitude, -122.3331);
        assert_eq!(wifi.note, "cafe");

        let cell = store
            .get_emitter(&RfIdentification::new("310/260/1/2", EmitterType::Lte))
            .unwrap()
            .unwrap();
        assert_eq!(cell.radius_ns, 1500.0);
        assert_eq!(cell.radius_ew, 1500.0);
        assert_eq!(cell.note, "");
    }

    #[test]
    fn test_unversioned_v1_is_migrated() {
        let mut conn = Connection::open_in_memory().unwrap();
        v1_db(&conn, 0);
        insert_v1(&conn, "abc", "BT", 12.5, None);

        let outcome = run_migrations(&mut conn, &StoreOptions::default()).unwrap();
        assert_eq!(outcome, MigrationOutcome::Migrated { from: 1 });
        assert_eq!(stored_version(&conn).unwrap(), SCHEMA_VERSION);
        assert!(!table_exists(&conn, "emitters_v1").unwrap());
    }

    #[test]
    fn test_unversioned_v2_is_stamped() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(schema::CREATE_EMITTERS_TABLE).unwrap();

        let outcome = run_migrations(&mut conn, &StoreOptions::default()).unwrap();
        assert_eq!(outcome, MigrationOutcome::Stamped);
        assert_eq!(stored_version(&conn).unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn test_newer_schema_refused() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(schema::CREATE_EMITTERS_TABLE).unwrap();
        conn.pragma_update(None, "user_version", SCHEMA_VERSION + 1).unwrap();

        let err = run_migrations(&mut conn, &StoreOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            Error::SchemaTooNew { found: 3, supported: 2 }
        ));
        assert_eq!(stored_version(&conn).unwrap(), SCHEMA_VERSION + 1);
    }

    #[test]
    fn test_failed_migration_leaves_v1_intact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rf.db");
        {
            let conn = Connection::open(&path).unwrap();
            v1_db(&conn, 1);
            insert_v1(&conn, "good", "WLAN", 3.0, None);
            // v2 requires a latitude, so copying this row must fail
            conn.execute(
                "INSERT INTO emitters (rfID, rfType, trust, latitude, longitude, radius, note)
                 VALUES ('broken', 'WLAN', 1, NULL, 0.0, 1.0, NULL)",
                [],
            )
            .unwrap();
        }

        let options = StoreOptions {
            backup_before_migration: false,
        };
        let err = match EmitterStore::open_with(&path, &options) {
            Err(e) => e,
            Ok(_) => panic!("migration should have failed"),
        };
        assert!(matches!(err, Error::SchemaMigration { from: 1, to: 2, .. }));

        let conn = Connection::open(&path).unwrap();
        assert_eq!(stored_version(&conn).unwrap(), 1);
        assert!(!table_exists(&conn, "emitters_v1").unwrap());
        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM emitters", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 2);
        drop(conn);

        let columns = columns_of(&path);
        assert!(columns.contains(&"radius".to_string()));
        assert!(!columns.contains(&"radius_ns".to_string()));
    }

    #[test]
    fn test_backup_written_before_migration() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rf.db");
        {
            let conn = Connection::open(&path).unwrap();
            v1_db(&conn, 1);
            insert_v1(&conn, "abc", "WLAN", 7.0, None);
        }

        let store = EmitterStore::open(&path).unwrap();
        assert_eq!(store.schema_version().unwrap(), SCHEMA_VERSION);

        let backup_path = dir.path().join("rf.db.pre-migration.bak");
        assert!(backup_path.exists());

        let backup = Connection::open(&backup_path).unwrap();
        assert_eq!(stored_version(&backup).unwrap(), 1);
        assert!(table_columns(&backup, EMITTERS_TABLE)
            .unwrap()
            .contains(&"radius".to_string()));
    }

    #[test]
    fn test_no_backup_for_fresh_or_current_db() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rf.db");

        drop(EmitterStore::open(&path).unwrap());
        drop(EmitterStore::open(&path).unwrap());

        assert!(!dir.path().join("rf.db.pre-migration.bak").exists());
    }

    #[test]
    fn test_string_typed_v2_rebuilt_into_current_layout() {
        let conn = Connection::open_in_memory().unwrap();
        string_typed_v2_db(&conn);
        conn.execute(
            "INSERT INTO emitters (rfID, rfType, trust, latitude, longitude, radius_ns, radius_ew, note)
             VALUES ('12345', 'GSM', 30, 51.5, -0.12, 800.0, 600.0, '42')",
            [],
        )
        .unwrap();
        // STRING has NUMERIC affinity, so both texts were stored as integers
        assert_eq!(storage_class(&conn, "note", "12345"), "integer");
        assert!(!conforms_to_current(&conn).unwrap());

        let mut store = EmitterStore::from_connection(conn, &StoreOptions::default()).unwrap();
        assert_eq!(store.schema_version().unwrap(), SCHEMA_VERSION);

        let gsm = RfIdentification::new("12345", EmitterType::Gsm);
        let info = store.get_emitter(&gsm).unwrap().unwrap();
        assert_eq!(info.note, "42");
        assert_eq!(info.trust, 30);
        assert_eq!(info.radius_ns, 800.0);
        assert_eq!(info.radius_ew, 600.0);

        let bb = crate::bounds::BoundingBox::new(51.0, -1.0, 52.0, 1.0);
        let found = store.get_emitters(EmitterType::Gsm, &bb).unwrap();
        assert!(found.contains(&gsm));

        // Composite key: the same id under another type is a separate row
        let lte = RfIdentification::new("12345", EmitterType::Lte);
        let mut tx = store.begin_transaction().unwrap();
        tx.insert_emitter(&lte, &crate::emitter::EmitterInfo::new(51.5, -0.12, 50.0, 50.0, 1).with_note("7"))
            .unwrap();
        assert!(tx.end().unwrap());
        assert_eq!(store.count_emitters().unwrap(), 2);
        assert_eq!(store.get_emitter(&lte).unwrap().unwrap().note, "7");
    }

    #[test]
    fn test_string_typed_v2_rebuild_outcome_and_idempotence() {
        let mut conn = Connection::open_in_memory().unwrap();
        string_typed_v2_db(&conn);
        conn.execute(
            "INSERT INTO emitters (rfID, rfType, trust, latitude, longitude, radius_ns, radius_ew, note)
             VALUES ('777', 'LTE', 1, 0.0, 0.0, 1.0, 1.0, NULL)",
            [],
        )
        .unwrap();

        let outcome = run_migrations(&mut conn, &StoreOptions::default()).unwrap();
        assert_eq!(outcome, MigrationOutcome::Rebuilt);
        assert!(conforms_to_current(&conn).unwrap());
        assert!(!table_exists(&conn, "emitters_nonconforming").unwrap());
        assert_eq!(storage_class(&conn, "rfID", "777"), "text");
        assert_eq!(storage_class(&conn, "note", "777"), "null");

        let outcome = run_migrations(&mut conn, &StoreOptions::default()).unwrap();
        assert_eq!(outcome, MigrationOutcome::Current);
    }

    #[test]
    fn test_string_typed_v2_with_null_trust_fails_atomically() {
        let mut conn = Connection::open_in_memory().unwrap();
        string_typed_v2_db(&conn);
        conn.execute(
            "INSERT INTO emitters (rfID, rfType, trust, latitude, longitude, radius_ns, radius_ew, note)
             VALUES ('1', 'WLAN', NULL, 0.0, 0.0, 1.0, 1.0, NULL)",
            [],
        )
        .unwrap();

        let err = run_migrations(&mut conn, &StoreOptions::default()).unwrap_err();
        assert!(matches!(err, Error::SchemaMigration { from: 2, to: 2, .. }));
        assert!(!conforms_to_current(&conn).unwrap());
        assert!(!table_exists(&conn, "emitters_nonconforming").unwrap());
    }

    #[test]
    fn test_v1_numeric_ids_and_notes_read_back_as_text() {
        let conn = Connection::open_in_memory().unwrap();
        v1_db(&conn, 1);
        insert_v1(&conn, "310260", "GSM", 900.0, Some("15"));
        assert_eq!(storage_class(&conn, "rfID", "310260"), "integer");

        let store = EmitterStore::from_connection(conn, &StoreOptions::default()).unwrap();
        let gsm = RfIdentification::new("310260", EmitterType::Gsm);
        assert_eq!(store.get_emitter(&gsm).unwrap().unwrap().note, "15");

        let bb = crate::bounds::BoundingBox::new(47.0, -123.0, 48.0, -122.0);
        assert!(store.get_emitters(EmitterType::Gsm, &bb).unwrap().contains(&gsm));
    }
}
