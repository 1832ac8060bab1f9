//! # Habitrack Core Library
//!
//! This library provides the core business logic for the habitrack habit
//! tracker. It implements a CLI-first philosophy where all operations are
//! available via a standalone CLI binary, with any transport layer (HTTP or
//! otherwise) being a thin shell over the same core library.
//!
//! ## Architecture
//!
//! - **Streak Engine**: A pure function over completion timestamps that
//!   computes the current consecutive-day streak
//! - **Service**: The completion/CRUD workflow over habits and users,
//!   parameterized by an injected [`Clock`]
//! - **Storage**: SQLite-based habit storage and TOML-based configuration,
//!   constructed explicitly and passed by reference
//! - **Auth**: A token-verification boundary yielding a verified
//!   (uid, email, name) identity triple
//!
//! ## Time-zone convention
//!
//! All timestamps are recorded and projected to calendar dates in **UTC**,
//! at write time and read time alike. Mixing conventions would silently
//! corrupt streak results at day boundaries.
//!
//! ## Key Components
//!
//! - [`streak::current_streak`]: The streak calculator
//! - [`HabitService`]: Completion recording and habit CRUD
//! - [`Database`]: Habit, user, and completion persistence
//! - [`TokenVerifier`]: Trait for the identity-verification oracle

pub mod auth;
pub mod clock;
pub mod error;
pub mod habit;
pub mod service;
pub mod storage;
pub mod streak;

pub use auth::{AuthenticatedUser, StaticTokenVerifier, TokenVerifier};
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{AuthError, ConfigError, CoreError, StoreError, ValidationError};
pub use habit::{Habit, HabitDraft, HabitPatch, User};
pub use service::{CompletionOutcome, HabitQuery, HabitService};
pub use storage::{Config, Database, OperatorProfile};
