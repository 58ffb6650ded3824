//! SQL schema for the Colecta SQLite store.
//!
//! The schema version lives in `PRAGMA user_version`; opening a store
//! whose stored version is older drops and recreates everything below,
//! then reseeds, in one exclusive transaction.

/// Current schema version. Bump on any change to the DDL below.
pub const SCHEMA_VERSION: u32 = 8;

/// Full DDL for one schema generation.
///
/// Each table is a JSON document table: the record (minus its id) lives
/// in `data`, and indexed attributes are STORED generated columns over
/// `json_extract`, so the generic CRUD surface never writes them
/// directly. `AUTOINCREMENT` keeps ids monotonic per table even across
/// deletes.
pub const SCHEMA: &str = "
CREATE TABLE users (
    id    INTEGER PRIMARY KEY AUTOINCREMENT,
    data  TEXT NOT NULL,
    email TEXT NOT NULL GENERATED ALWAYS AS (json_extract(data, '$.email')) STORED
);
CREATE UNIQUE INDEX users_email_idx ON users(email);

CREATE TABLE projects (
    id   INTEGER PRIMARY KEY AUTOINCREMENT,
    data TEXT NOT NULL
);

CREATE TABLE indicators (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    data       TEXT NOT NULL,
    project_id INTEGER NOT NULL GENERATED ALWAYS AS (json_extract(data, '$.project_id')) STORED,
    axis       TEXT NOT NULL GENERATED ALWAYS AS (json_extract(data, '$.axis')) STORED
);
CREATE INDEX indicators_project_idx ON indicators(project_id);
CREATE INDEX indicators_axis_idx    ON indicators(axis);

CREATE TABLE captures (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    data         TEXT NOT NULL,
    indicator_id INTEGER NOT NULL GENERATED ALWAYS AS (json_extract(data, '$.indicator_id')) STORED,
    status       TEXT NOT NULL GENERATED ALWAYS AS (json_extract(data, '$.status')) STORED,
    sync_status  TEXT NOT NULL GENERATED ALWAYS AS (json_extract(data, '$.sync_status')) STORED
);
CREATE INDEX captures_indicator_idx ON captures(indicator_id);
CREATE INDEX captures_status_idx    ON captures(status);
CREATE INDEX captures_sync_idx      ON captures(sync_status);
";
