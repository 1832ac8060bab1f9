//! Database schema migrations for habitrack.
//!
//! Migrations are versioned and applied automatically when opening the
//! database. The `schema_version` table tracks the current migration
//! version.

use rusqlite::{Connection, Result as SqliteResult};

/// Apply all pending migrations to bring the database to the current
/// schema version.
///
/// # Errors
/// Returns an error if migration fails.
pub fn migrate(conn: &Connection) -> SqliteResult<()> {
    create_schema_version_table(conn)?;

    let current_version = get_schema_version(conn)?;

    if current_version < 1 {
        migrate_v1(conn)?;
    }
    if current_version < 2 {
        migrate_v2(conn)?;
    }

    Ok(())
}

/// Create the schema_version table if it doesn't exist.
fn create_schema_version_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );",
    )
}

/// Get the current schema version, 0 for a fresh database.
fn get_schema_version(conn: &Connection) -> SqliteResult<i32> {
    match conn.query_row("SELECT version FROM schema_version", [], |row| {
        row.get::<_, i32>(0)
    }) {
        Ok(version) => Ok(version),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(0),
        Err(e) => Err(e),
    }
}

/// Set the schema version in the database.
fn set_schema_version(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute(
        "INSERT INTO schema_version (version) VALUES (?1)",
        [version],
    )?;
    Ok(())
}

/// Migration v1: users, habits, and completions tables.
///
/// `completions` carries one row per (habit, UTC day); the UNIQUE
/// constraint is what makes "mark complete" an atomic check-then-append
/// rather than a read-then-write race.
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS users (
            id         TEXT PRIMARY KEY,
            uid        TEXT NOT NULL UNIQUE,
            email      TEXT NOT NULL,
            name       TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS habits (
            id             TEXT PRIMARY KEY,
            owner_uid      TEXT NOT NULL,
            owner_email    TEXT NOT NULL,
            owner_name     TEXT NOT NULL,
            title          TEXT NOT NULL,
            description    TEXT NOT NULL DEFAULT '',
            category       TEXT NOT NULL DEFAULT 'General',
            image_url      TEXT,
            created_at     TEXT NOT NULL,
            current_streak INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS completions (
            habit_id     TEXT NOT NULL REFERENCES habits(id) ON DELETE CASCADE,
            completed_at TEXT NOT NULL,
            day          TEXT NOT NULL,
            UNIQUE(habit_id, day)
        );",
    )?;

    tx.execute("DELETE FROM schema_version", [])?;
    tx.execute("INSERT INTO schema_version (version) VALUES (1)", [])?;
    tx.commit()
}

/// Migration v2: indexes for the common query patterns
/// (owner listing, newest-first public listing, history loads).
fn migrate_v2(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE INDEX IF NOT EXISTS idx_habits_owner_uid ON habits(owner_uid);
        CREATE INDEX IF NOT EXISTS idx_habits_created_at ON habits(created_at);
        CREATE INDEX IF NOT EXISTS idx_completions_habit_id ON completions(habit_id);",
    )?;
    set_schema_version(conn, 2)
}
