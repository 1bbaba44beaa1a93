//! SQLite schema definitions.

/// Creates every table and index. Safe to run on an existing database.
pub const CREATE_TABLES: &str = r#"
CREATE TABLE IF NOT EXISTS trips_years (
    year INTEGER PRIMARY KEY,
    is_current INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    netid TEXT NOT NULL UNIQUE COLLATE NOCASE,
    name TEXT NOT NULL,
    email TEXT NOT NULL,
    is_superuser INTEGER NOT NULL DEFAULT 0,
    groups_json TEXT NOT NULL DEFAULT '[]'
);

CREATE TABLE IF NOT EXISTS timetable (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    data TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS records (
    id TEXT PRIMARY KEY,
    kind TEXT NOT NULL,
    trips_year INTEGER NOT NULL,
    label TEXT NOT NULL,
    sort_key TEXT NOT NULL,
    unique_key TEXT,
    references_json TEXT NOT NULL DEFAULT '[]',
    data TEXT NOT NULL,
    UNIQUE (kind, trips_year, unique_key)
);

CREATE INDEX IF NOT EXISTS idx_records_kind_year ON records(kind, trips_year, sort_key);

CREATE TABLE IF NOT EXISTS record_references (
    source_id TEXT NOT NULL,
    target_id TEXT NOT NULL,
    PRIMARY KEY (source_id, target_id)
);

CREATE INDEX IF NOT EXISTS idx_record_references_target ON record_references(target_id);
"#;

pub const SELECT_RECORD: &str = "SELECT id, kind, trips_year, label, sort_key, unique_key, references_json, data FROM records WHERE id = ?1 AND kind = ?2";

pub const LIST_RECORDS: &str = "SELECT id, kind, trips_year, label, sort_key, unique_key, references_json, data FROM records WHERE kind = ?1 AND trips_year = ?2 ORDER BY sort_key, id";

pub const LIST_REFERENCING: &str = r#"
SELECT id, kind, trips_year, label, sort_key, unique_key, references_json, data
FROM records
WHERE id IN (SELECT source_id FROM record_references WHERE target_id = ?1)
ORDER BY sort_key, id
"#;

pub const RECORD_EXISTS: &str = "SELECT 1 FROM records WHERE id = ?1";

pub const SELECT_RECORD_KIND_YEAR: &str = "SELECT kind, trips_year FROM records WHERE id = ?1";

pub const LIST_REFERENCING_LABELS: &str = r#"
SELECT DISTINCT r.label
FROM record_references x
JOIN records r ON r.id = x.source_id
WHERE x.target_id = ?1
ORDER BY r.label
"#;

pub const INSERT_RECORD: &str = r#"
INSERT INTO records (id, kind, trips_year, label, sort_key, unique_key, references_json, data)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
"#;

pub const UPDATE_RECORD: &str = r#"
UPDATE records
SET trips_year = ?3, label = ?4, sort_key = ?5, unique_key = ?6, references_json = ?7, data = ?8
WHERE id = ?1 AND kind = ?2
"#;

pub const DELETE_RECORD: &str = "DELETE FROM records WHERE id = ?1 AND kind = ?2";

pub const INSERT_REFERENCE: &str =
    "INSERT OR IGNORE INTO record_references (source_id, target_id) VALUES (?1, ?2)";

pub const DELETE_REFERENCES: &str = "DELETE FROM record_references WHERE source_id = ?1";

pub const SELECT_YEAR: &str = "SELECT year, is_current FROM trips_years WHERE year = ?1";

pub const SELECT_CURRENT_YEAR: &str =
    "SELECT year, is_current FROM trips_years WHERE is_current = 1 LIMIT 1";

pub const LIST_YEARS: &str = "SELECT year, is_current FROM trips_years ORDER BY year DESC";

pub const INSERT_YEAR: &str = "INSERT INTO trips_years (year, is_current) VALUES (?1, ?2)";

pub const CLEAR_CURRENT_YEAR: &str = "UPDATE trips_years SET is_current = 0";

pub const SELECT_USER: &str =
    "SELECT id, netid, name, email, is_superuser, groups_json FROM users WHERE id = ?1";

pub const SELECT_USER_BY_NETID: &str =
    "SELECT id, netid, name, email, is_superuser, groups_json FROM users WHERE netid = ?1";

pub const LIST_USERS: &str =
    "SELECT id, netid, name, email, is_superuser, groups_json FROM users ORDER BY netid";

pub const INSERT_USER: &str = r#"
INSERT INTO users (id, netid, name, email, is_superuser, groups_json)
VALUES (?1, ?2, ?3, ?4, ?5, ?6)
"#;

pub const UPDATE_USER: &str = r#"
UPDATE users SET netid = ?2, name = ?3, email = ?4, is_superuser = ?5, groups_json = ?6
WHERE id = ?1
"#;

pub const SELECT_TIMETABLE: &str = "SELECT data FROM timetable WHERE id = 1";

pub const UPSERT_TIMETABLE: &str = r#"
INSERT INTO timetable (id, data) VALUES (1, ?1)
ON CONFLICT(id) DO UPDATE SET data = excluded.data
"#;
