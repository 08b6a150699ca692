//! Database schema definitions
//!
//! The on-disk layout is versioned through `PRAGMA user_version`:
//! - v1: single `radius` column
//! - v2: independent `radius_ns` / `radius_ew` columns

/// Schema version this build reads and writes
pub const SCHEMA_VERSION: i32 = 2;

/// Name of the emitter table, shared by every version
pub const EMITTERS_TABLE: &str = "emitters";

/// SQL to create the emitters table (v2)
pub const CREATE_EMITTERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS emitters (
    rfID TEXT NOT NULL,
    rfType TEXT NOT NULL,
    trust INTEGER NOT NULL,
    latitude REAL NOT NULL,
    longitude REAL NOT NULL,
    radius_ns REAL NOT NULL,
    radius_ew REAL NOT NULL,
    note TEXT,
    PRIMARY KEY (rfID, rfType)
)
"#;

/// v1 layout, kept so legacy files can be recognised and tests can build one
pub const CREATE_EMITTERS_TABLE_V1: &str = r#"
CREATE TABLE IF NOT EXISTS emitters (
    rfID STRING PRIMARY KEY,
    rfType STRING,
    trust INTEGER,
    latitude REAL,
    longitude REAL,
    radius REAL,
    note STRING
)
"#;

/// Declared shape of the v2 table as reported by `pragma_table_info`:
/// name, declared type, NOT NULL, position in the primary key (0 = not part).
pub const CURRENT_COLUMNS: &[(&str, &str, bool, i32)] = &[
    ("rfID", "TEXT", true, 1),
    ("rfType", "TEXT", true, 2),
    ("trust", "INTEGER", true, 0),
    ("latitude", "REAL", true, 0),
    ("longitude", "REAL", true, 0),
    ("radius_ns", "REAL", true, 0),
    ("radius_ew", "REAL", true, 0),
    ("note", "TEXT", false, 0),
];

/// v1 -> v2: split `radius` into both axis radii.
///
/// SQLite cannot drop columns on old versions, so the table is rebuilt.
/// v1 declared its text columns as `STRING`, which has NUMERIC affinity,
/// so numeric-looking ids and notes come back as numbers and are cast.
pub const MIGRATE_V1_TO_V2: &str = r#"
ALTER TABLE emitters RENAME TO emitters_v1;

CREATE TABLE emitters (
    rfID TEXT NOT NULL,
    rfType TEXT NOT NULL,
    trust INTEGER NOT NULL,
    latitude REAL NOT NULL,
    longitude REAL NOT NULL,
    radius_ns REAL NOT NULL,
    radius_ew REAL NOT NULL,
    note TEXT,
    PRIMARY KEY (rfID, rfType)
);

INSERT INTO emitters (rfID, rfType, trust, latitude, longitude, radius_ns, radius_ew, note)
SELECT CAST(rfID AS TEXT), CAST(rfType AS TEXT), trust, latitude, longitude,
       radius, radius, CAST(note AS TEXT)
FROM emitters_v1;

DROP TABLE emitters_v1;
"#;

/// Rebuild a table that has the v2 columns but not the v2 declaration
/// (`STRING` columns, `rfID`-only primary key, nullable fields).
pub const REBUILD_V2: &str = r#"
ALTER TABLE emitters RENAME TO emitters_nonconforming;

CREATE TABLE emitters (
    rfID TEXT NOT NULL,
    rfType TEXT NOT NULL,
    trust INTEGER NOT NULL,
    latitude REAL NOT NULL,
    longitude REAL NOT NULL,
    radius_ns REAL NOT NULL,
    radius_ew REAL NOT NULL,
    note TEXT,
    PRIMARY KEY (rfID, rfType)
);

INSERT INTO emitters (rfID, rfType, trust, latitude, longitude, radius_ns, radius_ew, note)
SELECT CAST(rfID AS TEXT), CAST(rfType AS TEXT), trust, latitude, longitude,
       radius_ns, radius_ew, CAST(note AS TEXT)
FROM emitters_nonconforming;

DROP TABLE emitters_nonconforming;
"#;

/// SQL to create indexes
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_emitters_spatial ON emitters(rfType, latitude, longitude)",
];

pub const INSERT_EMITTER: &str = r#"
INSERT INTO emitters (rfID, rfType, trust, latitude, longitude, radius_ns, radius_ew, note)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
"#;

pub const UPDATE_EMITTER: &str = r#"
UPDATE emitters
SET trust = ?1, latitude = ?2, longitude = ?3, radius_ns = ?4, radius_ew = ?5, note = ?6
WHERE rfID = ?7 AND rfType = ?8
"#;

pub const DROP_EMITTER: &str = "DELETE FROM emitters WHERE rfID = ?1 AND rfType = ?2";

pub const SELECT_EMITTER: &str = r#"
SELECT trust, latitude, longitude, radius_ns, radius_ew, note
FROM emitters
WHERE rfID = ?1 AND rfType = ?2
"#;

pub const SELECT_EMITTERS_IN_BOX: &str = r#"
SELECT rfID
FROM emitters
WHERE rfType = ?1
  AND latitude >= ?2 AND latitude <= ?3
  AND longitude >= ?4 AND longitude <= ?5
"#;

pub const COUNT_EMITTERS: &str = "SELECT COUNT(*) FROM emitters";

pub const COUNT_EMITTERS_BY_TYPE: &str = r#"
SELECT rfType, COUNT(*)
FROM emitters
GROUP BY rfType
ORDER BY rfType
"#;

/// Statements run on every open once the table is at `SCHEMA_VERSION`
pub fn post_migration_statements() -> Vec<&'static str> {
    CREATE_INDEXES.to_vec()
}
