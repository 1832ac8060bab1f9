//! Habit completion and CRUD workflow.
//!
//! [`HabitService`] borrows an explicitly constructed [`Database`] and an
//! injected [`Clock`]; it holds no state of its own. Completion recording
//! delegates the "already done today" check to the store's uniqueness
//! constraint, so two racing requests for the same habit on the same day
//! cannot both append.

use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::clock::Clock;
use crate::error::{CoreError, Result};
use crate::habit::{Habit, HabitDraft, HabitPatch, User};
use crate::storage::{CompletionInsert, Database};
use crate::streak;

/// Public listings return at most this many habits.
pub const PUBLIC_LIST_LIMIT: u32 = 20;

/// Filter for habit listings.
#[derive(Debug, Clone, Default)]
pub struct HabitQuery {
    /// Case-insensitive substring match on the title.
    pub search: Option<String>,
    pub category: Option<String>,
    pub owner_uid: Option<String>,
    pub limit: Option<u32>,
}

/// Outcome of a completion request.
///
/// "Already completed today" is a benign rejection, not a failure; it
/// surfaces here rather than in the error taxonomy.
#[derive(Debug, Clone)]
pub enum CompletionOutcome {
    /// The completion was appended; carries the updated habit.
    Recorded(Habit),
    AlreadyCompletedToday,
}

/// The habit workflow over a database and a clock.
pub struct HabitService<'a> {
    db: &'a Database,
    clock: &'a dyn Clock,
}

impl<'a> HabitService<'a> {
    pub fn new(db: &'a Database, clock: &'a dyn Clock) -> Self {
        Self { db, clock }
    }

    /// Find-or-create the user record for a verified identity.
    pub fn register_user(&self, identity: &AuthenticatedUser) -> Result<User> {
        if let Some(existing) = self.db.find_user_by_uid(&identity.uid)? {
            return Ok(existing);
        }
        let user = User {
            id: Uuid::new_v4(),
            uid: identity.uid.clone(),
            email: identity.email.clone(),
            name: identity.display_name(),
            created_at: self.clock.now(),
        };
        self.db.insert_user(&user)?;
        log::info!("registered user {} ({})", user.uid, user.email);
        Ok(user)
    }

    /// Create a habit owned by the verified identity.
    ///
    /// Owner fields come from the identity triple, never from the draft;
    /// the habit starts with an empty history and a zero streak.
    pub fn create_habit(&self, owner: &AuthenticatedUser, draft: HabitDraft) -> Result<Habit> {
        draft.validate()?;
        let habit = Habit {
            id: Uuid::new_v4(),
            owner_uid: owner.uid.clone(),
            owner_email: owner.email.clone(),
            owner_name: owner.display_name(),
            title: draft.title,
            description: draft.description,
            category: draft.category,
            image_url: draft.image_url,
            created_at: self.clock.now(),
            completion_history: Vec::new(),
            current_streak: 0,
        };
        self.db.insert_habit(&habit)?;
        log::info!("created habit {} for {}", habit.id, habit.owner_uid);
        Ok(habit)
    }

    /// Public listing: optional title search and category filter,
    /// newest-first, capped at [`PUBLIC_LIST_LIMIT`].
    ///
    /// A category of `All` means no category filter.
    pub fn list_public(
        &self,
        search: Option<&str>,
        category: Option<&str>,
    ) -> Result<Vec<Habit>> {
        let query = HabitQuery {
            search: search
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            category: category
                .filter(|c| !c.eq_ignore_ascii_case("All"))
                .map(str::to_string),
            owner_uid: None,
            limit: Some(PUBLIC_LIST_LIMIT),
        };
        Ok(self.db.list_habits(&query)?)
    }

    /// All habits owned by `uid`, newest-first.
    pub fn my_habits(&self, uid: &str) -> Result<Vec<Habit>> {
        let query = HabitQuery {
            owner_uid: Some(uid.to_string()),
            ..Default::default()
        };
        Ok(self.db.list_habits(&query)?)
    }

    /// Fetch a habit by id.
    pub fn get_habit(&self, id: Uuid) -> Result<Habit> {
        self.db
            .find_habit(id)?
            .ok_or(CoreError::HabitNotFound(id))
    }

    /// Apply a patch to a habit owned by `uid`.
    ///
    /// An id that exists but belongs to someone else reports not-found,
    /// the same as an absent id.
    pub fn update_habit(&self, uid: &str, id: Uuid, patch: HabitPatch) -> Result<Habit> {
        patch.validate()?;
        if !self.db.update_habit(id, uid, &patch)? {
            return Err(CoreError::HabitNotFound(id));
        }
        self.get_habit(id)
    }

    /// Delete a habit owned by `uid`.
    pub fn delete_habit(&self, uid: &str, id: Uuid) -> Result<()> {
        if !self.db.delete_habit(id, uid)? {
            return Err(CoreError::HabitNotFound(id));
        }
        log::info!("deleted habit {id}");
        Ok(())
    }

    /// Record a completion for today.
    ///
    /// Deliberately not owner-scoped: any authenticated caller may
    /// complete any habit. At most one completion per habit per UTC day
    /// succeeds; the store appends the timestamp and overwrites the
    /// streak in one transaction.
    pub fn complete_habit(&self, id: Uuid) -> Result<CompletionOutcome> {
        // Surface not-found before the benign duplicate case.
        let _ = self.get_habit(id)?;

        match self.db.record_completion(id, self.clock.now())? {
            CompletionInsert::Recorded { streak } => {
                log::info!("habit {id} completed, streak now {streak}");
                Ok(CompletionOutcome::Recorded(self.get_habit(id)?))
            }
            CompletionInsert::DuplicateDay => {
                log::debug!("habit {id} already completed today");
                Ok(CompletionOutcome::AlreadyCompletedToday)
            }
        }
    }

    /// Read-only streak recomputation for display or audit.
    ///
    /// Always recomputes from the history rather than trusting the
    /// stored value.
    pub fn streak_of(&self, id: Uuid) -> Result<u32> {
        let habit = self.get_habit(id)?;
        Ok(streak::current_streak(
            &habit.completion_history,
            self.clock.today(),
        ))
    }
}
