//! SQLite-based habit, user, and completion storage.
//!
//! The [`Database`] owns its connection and is constructed explicitly:
//! opened once at startup, passed by reference to whoever needs it, and
//! dropped at shutdown. There is no process-wide handle.
//!
//! Completion history lives in its own `completions` table with one row
//! per (habit, UTC day). The UNIQUE constraint on that pair gives
//! at-most-one-successful-append per habit per day without a
//! read-then-write race, and the append plus streak overwrite commit in
//! a single transaction so readers never see one without the other.

use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use uuid::Uuid;

use crate::error::StoreError;
use crate::habit::{Habit, HabitPatch, User};
use crate::service::HabitQuery;
use crate::streak;

use super::{data_dir, migrations};

/// Outcome of a completion append attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionInsert {
    /// Appended; carries the recomputed streak that was persisted.
    Recorded { streak: u32 },
    /// A completion already existed for this habit on this day.
    DuplicateDay,
}

/// SQLite database for habit storage.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `~/.config/habitrack[-dev]/habitrack.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, StoreError> {
        let path = data_dir()?.join("habitrack.db");
        Self::open_at(&path)
    }

    /// Open (or create) the database at an explicit path.
    pub fn open_at(path: &std::path::Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|source| StoreError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_connection(conn)
    }

    /// Open an in-memory database (tests and ephemeral use).
    pub fn open_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(StoreError::from)?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        migrations::migrate(&conn)
            .map_err(|e| StoreError::MigrationFailed(e.to_string()))?;
        Ok(Self { conn })
    }

    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    // === Users ===

    /// Insert a user record.
    pub fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO users (id, uid, email, name, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                user.id.to_string(),
                user.uid,
                user.email,
                user.name,
                user.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Look up a user by identity-provider subject id.
    pub fn find_user_by_uid(&self, uid: &str) -> Result<Option<User>, StoreError> {
        self.conn
            .query_row(
                "SELECT id, uid, email, name, created_at FROM users WHERE uid = ?1",
                params![uid],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                },
            )
            .optional()?
            .map(|(id, uid, email, name, created_at)| {
                Ok(User {
                    id: parse_uuid("users", &id)?,
                    uid,
                    email,
                    name,
                    created_at: parse_timestamp("users", &created_at)?,
                })
            })
            .transpose()
    }

    // === Habits ===

    /// Insert a habit record. The habit's history must be empty; completions
    /// are only ever added through [`Database::record_completion`].
    pub fn insert_habit(&self, habit: &Habit) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO habits
                (id, owner_uid, owner_email, owner_name, title, description,
                 category, image_url, created_at, current_streak)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                habit.id.to_string(),
                habit.owner_uid,
                habit.owner_email,
                habit.owner_name,
                habit.title,
                habit.description,
                habit.category,
                habit.image_url,
                habit.created_at.to_rfc3339(),
                habit.current_streak,
            ],
        )?;
        Ok(())
    }

    /// Find a single habit by id, with its full completion history.
    pub fn find_habit(&self, id: Uuid) -> Result<Option<Habit>, StoreError> {
        let row = self
            .conn
            .query_row(
                "SELECT id, owner_uid, owner_email, owner_name, title, description,
                        category, image_url, created_at, current_streak
                 FROM habits WHERE id = ?1",
                params![id.to_string()],
                habit_row,
            )
            .optional()?;

        match row {
            Some(raw) => {
                let mut habit = raw.into_habit()?;
                habit.completion_history = self.load_history(habit.id)?;
                Ok(Some(habit))
            }
            None => Ok(None),
        }
    }

    /// List habits matching `query`, newest-first.
    pub fn list_habits(&self, query: &HabitQuery) -> Result<Vec<Habit>, StoreError> {
        let mut sql = String::from(
            "SELECT id, owner_uid, owner_email, owner_name, title, description,
                    category, image_url, created_at, current_streak
             FROM habits",
        );
        let mut clauses: Vec<String> = Vec::new();
        let mut binds: Vec<String> = Vec::new();

        if let Some(search) = &query.search {
            binds.push(format!("%{}%", search.to_lowercase()));
            clauses.push(format!("lower(title) LIKE ?{}", binds.len()));
        }
        if let Some(category) = &query.category {
            binds.push(category.clone());
            clauses.push(format!("category = ?{}", binds.len()));
        }
        if let Some(owner_uid) = &query.owner_uid {
            binds.push(owner_uid.clone());
            clauses.push(format!("owner_uid = ?{}", binds.len()));
        }
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY created_at DESC");
        if let Some(limit) = query.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(binds.iter()), habit_row)?;

        let mut habits = Vec::new();
        for row in rows {
            let mut habit = row?.into_habit()?;
            habit.completion_history = self.load_history(habit.id)?;
            habits.push(habit);
        }
        Ok(habits)
    }

    /// Apply a patch to a habit owned by `owner_uid`.
    ///
    /// Returns false when no habit matched (absent id or different owner).
    pub fn update_habit(
        &self,
        id: Uuid,
        owner_uid: &str,
        patch: &HabitPatch,
    ) -> Result<bool, StoreError> {
        let mut sets: Vec<String> = Vec::new();
        let mut binds: Vec<String> = Vec::new();

        if let Some(title) = &patch.title {
            binds.push(title.clone());
            sets.push(format!("title = ?{}", binds.len()));
        }
        if let Some(description) = &patch.description {
            binds.push(description.clone());
            sets.push(format!("description = ?{}", binds.len()));
        }
        if let Some(category) = &patch.category {
            binds.push(category.clone());
            sets.push(format!("category = ?{}", binds.len()));
        }
        if let Some(image_url) = &patch.image_url {
            binds.push(image_url.clone());
            sets.push(format!("image_url = ?{}", binds.len()));
        }
        if sets.is_empty() {
            return Ok(false);
        }

        binds.push(id.to_string());
        let id_slot = binds.len();
        binds.push(owner_uid.to_string());
        let owner_slot = binds.len();

        let sql = format!(
            "UPDATE habits SET {} WHERE id = ?{} AND owner_uid = ?{}",
            sets.join(", "),
            id_slot,
            owner_slot,
        );
        let changed = self.conn.execute(&sql, params_from_iter(binds.iter()))?;
        Ok(changed > 0)
    }

    /// Delete a habit owned by `owner_uid`, cascading its completions.
    ///
    /// Returns false when no habit matched.
    pub fn delete_habit(&self, id: Uuid, owner_uid: &str) -> Result<bool, StoreError> {
        let deleted = self.conn.execute(
            "DELETE FROM habits WHERE id = ?1 AND owner_uid = ?2",
            params![id.to_string(), owner_uid],
        )?;
        Ok(deleted > 0)
    }

    // === Completions ===

    /// Append a completion at `now` and overwrite the stored streak, in
    /// one transaction.
    ///
    /// The UNIQUE(habit_id, day) constraint rejects a second completion
    /// on the same UTC day; that case is reported as
    /// [`CompletionInsert::DuplicateDay`], not as an error.
    pub fn record_completion(
        &self,
        habit_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<CompletionInsert, StoreError> {
        let day = now.date_naive();
        let tx = self.conn.unchecked_transaction()?;

        let inserted = tx.execute(
            "INSERT INTO completions (habit_id, completed_at, day)
             VALUES (?1, ?2, ?3)",
            params![
                habit_id.to_string(),
                now.to_rfc3339(),
                day.format("%Y-%m-%d").to_string(),
            ],
        );
        match inserted {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                return Ok(CompletionInsert::DuplicateDay);
            }
            Err(e) => return Err(e.into()),
        }

        let history = load_history_on(&tx, habit_id)?;
        let streak = streak::current_streak(&history, day);
        tx.execute(
            "UPDATE habits SET current_streak = ?1 WHERE id = ?2",
            params![streak, habit_id.to_string()],
        )?;
        tx.commit()?;

        Ok(CompletionInsert::Recorded { streak })
    }

    /// Load the completion history for a habit, oldest-first.
    pub fn load_history(&self, habit_id: Uuid) -> Result<Vec<DateTime<Utc>>, StoreError> {
        load_history_on(&self.conn, habit_id)
    }
}

fn load_history_on(
    conn: &Connection,
    habit_id: Uuid,
) -> Result<Vec<DateTime<Utc>>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT completed_at FROM completions WHERE habit_id = ?1 ORDER BY completed_at ASC",
    )?;
    let rows = stmt.query_map(params![habit_id.to_string()], |row| {
        row.get::<_, String>(0)
    })?;

    let mut history = Vec::new();
    for row in rows {
        history.push(parse_timestamp("completions", &row?)?);
    }
    Ok(history)
}

/// Raw habit row before uuid/timestamp decoding.
struct HabitRow {
    id: String,
    owner_uid: String,
    owner_email: String,
    owner_name: String,
    title: String,
    description: String,
    category: String,
    image_url: Option<String>,
    created_at: String,
    current_streak: u32,
}

fn habit_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<HabitRow> {
    Ok(HabitRow {
        id: row.get(0)?,
        owner_uid: row.get(1)?,
        owner_email: row.get(2)?,
        owner_name: row.get(3)?,
        title: row.get(4)?,
        description: row.get(5)?,
        category: row.get(6)?,
        image_url: row.get(7)?,
        created_at: row.get(8)?,
        current_streak: row.get(9)?,
    })
}

impl HabitRow {
    fn into_habit(self) -> Result<Habit, StoreError> {
        Ok(Habit {
            id: parse_uuid("habits", &self.id)?,
            owner_uid: self.owner_uid,
            owner_email: self.owner_email,
            owner_name: self.owner_name,
            title: self.title,
            description: self.description,
            category: self.category,
            image_url: self.image_url,
            created_at: parse_timestamp("habits", &self.created_at)?,
            completion_history: Vec::new(),
            current_streak: self.current_streak,
        })
    }
}

fn parse_uuid(table: &str, value: &str) -> Result<Uuid, StoreError> {
    Uuid::parse_str(value).map_err(|e| StoreError::CorruptRow {
        table: table.to_string(),
        message: format!("bad uuid '{value}': {e}"),
    })
}

fn parse_timestamp(table: &str, value: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| StoreError::CorruptRow {
            table: table.to_string(),
            message: format!("bad timestamp '{value}': {e}"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_habit(owner_uid: &str) -> Habit {
        Habit {
            id: Uuid::new_v4(),
            owner_uid: owner_uid.to_string(),
            owner_email: format!("{owner_uid}@example.com"),
            owner_name: owner_uid.to_string(),
            title: "Read 20 pages".to_string(),
            description: String::new(),
            category: "Learning".to_string(),
            image_url: None,
            created_at: Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap(),
            completion_history: Vec::new(),
            current_streak: 0,
        }
    }

    #[test]
    fn insert_and_find_roundtrip() {
        let db = Database::open_memory().unwrap();
        let habit = sample_habit("u1");
        db.insert_habit(&habit).unwrap();

        let found = db.find_habit(habit.id).unwrap().unwrap();
        assert_eq!(found.title, habit.title);
        assert_eq!(found.owner_uid, "u1");
        assert_eq!(found.created_at, habit.created_at);
        assert!(found.completion_history.is_empty());
    }

    #[test]
    fn find_missing_habit_is_none() {
        let db = Database::open_memory().unwrap();
        assert!(db.find_habit(Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn record_completion_appends_and_sets_streak() {
        let db = Database::open_memory().unwrap();
        let habit = sample_habit("u1");
        db.insert_habit(&habit).unwrap();

        let now = Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0).unwrap();
        let outcome = db.record_completion(habit.id, now).unwrap();
        assert_eq!(outcome, CompletionInsert::Recorded { streak: 1 });

        let found = db.find_habit(habit.id).unwrap().unwrap();
        assert_eq!(found.completion_history, vec![now]);
        assert_eq!(found.current_streak, 1);
    }

    #[test]
    fn second_completion_same_day_is_duplicate() {
        let db = Database::open_memory().unwrap();
        let habit = sample_habit("u1");
        db.insert_habit(&habit).unwrap();

        let morning = Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0).unwrap();
        let evening = Utc.with_ymd_and_hms(2025, 6, 2, 21, 0, 0).unwrap();
        db.record_completion(habit.id, morning).unwrap();
        let outcome = db.record_completion(habit.id, evening).unwrap();
        assert_eq!(outcome, CompletionInsert::DuplicateDay);

        // History and streak unchanged by the rejected append.
        let found = db.find_habit(habit.id).unwrap().unwrap();
        assert_eq!(found.completion_history.len(), 1);
        assert_eq!(found.current_streak, 1);
    }

    #[test]
    fn consecutive_days_grow_the_stored_streak() {
        let db = Database::open_memory().unwrap();
        let habit = sample_habit("u1");
        db.insert_habit(&habit).unwrap();

        for day in 2..5 {
            let now = Utc.with_ymd_and_hms(2025, 6, day, 12, 0, 0).unwrap();
            db.record_completion(habit.id, now).unwrap();
        }
        let found = db.find_habit(habit.id).unwrap().unwrap();
        assert_eq!(found.current_streak, 3);
    }

    #[test]
    fn update_is_owner_scoped() {
        let db = Database::open_memory().unwrap();
        let habit = sample_habit("u1");
        db.insert_habit(&habit).unwrap();

        let patch = HabitPatch {
            title: Some("Read 30 pages".to_string()),
            ..Default::default()
        };
        assert!(!db.update_habit(habit.id, "intruder", &patch).unwrap());
        assert!(db.update_habit(habit.id, "u1", &patch).unwrap());

        let found = db.find_habit(habit.id).unwrap().unwrap();
        assert_eq!(found.title, "Read 30 pages");
    }

    #[test]
    fn delete_cascades_completions() {
        let db = Database::open_memory().unwrap();
        let habit = sample_habit("u1");
        db.insert_habit(&habit).unwrap();
        let now = Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0).unwrap();
        db.record_completion(habit.id, now).unwrap();

        assert!(!db.delete_habit(habit.id, "intruder").unwrap());
        assert!(db.delete_habit(habit.id, "u1").unwrap());

        let remaining: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM completions", [], |row| row.get(0))
            .unwrap();
        assert_eq!(remaining, 0);
    }

    #[test]
    fn list_filters_and_sorts() {
        let db = Database::open_memory().unwrap();
        let mut a = sample_habit("u1");
        a.title = "Morning run".to_string();
        a.category = "Health".to_string();
        let mut b = sample_habit("u2");
        b.title = "Run errands".to_string();
        b.category = "Chores".to_string();
        b.created_at = a.created_at + chrono::Duration::days(1);
        db.insert_habit(&a).unwrap();
        db.insert_habit(&b).unwrap();

        // Newest-first with no filter.
        let all = db.list_habits(&HabitQuery::default()).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, b.id);

        // Case-insensitive substring search.
        let runs = db
            .list_habits(&HabitQuery {
                search: Some("RUN".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(runs.len(), 2);

        let health = db
            .list_habits(&HabitQuery {
                category: Some("Health".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(health.len(), 1);
        assert_eq!(health[0].id, a.id);

        let mine = db
            .list_habits(&HabitQuery {
                owner_uid: Some("u2".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(mine.len(), 1);

        let limited = db
            .list_habits(&HabitQuery {
                limit: Some(1),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[test]
    fn reopen_preserves_history_and_streak() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("habitrack.db");
        let habit = sample_habit("u1");
        let now = Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0).unwrap();

        {
            let db = Database::open_at(&path).unwrap();
            db.insert_habit(&habit).unwrap();
            db.record_completion(habit.id, now).unwrap();
        }

        let db = Database::open_at(&path).unwrap();
        let found = db.find_habit(habit.id).unwrap().unwrap();
        assert_eq!(found.completion_history, vec![now]);
        assert_eq!(found.current_streak, 1);
    }

    #[test]
    fn user_roundtrip_and_lookup() {
        let db = Database::open_memory().unwrap();
        let user = User {
            id: Uuid::new_v4(),
            uid: "uid-1".to_string(),
            email: "ada@example.com".to_string(),
            name: "Ada".to_string(),
            created_at: Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap(),
        };
        db.insert_user(&user).unwrap();

        let found = db.find_user_by_uid("uid-1").unwrap().unwrap();
        assert_eq!(found.email, "ada@example.com");
        assert!(db.find_user_by_uid("uid-2").unwrap().is_none());
    }
}
