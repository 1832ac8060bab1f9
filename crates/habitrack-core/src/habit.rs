//! Habit and user entities.
//!
//! The habit record is an explicit structured type: identity, owner
//! reference, completion history, and the derived streak all have named,
//! typed fields. Caller-supplied payloads go through [`HabitDraft`] and
//! [`HabitPatch`], which carry only the mutable fields and reject unknown
//! ones at deserialization time, so owner identity, history, and streak
//! can never be smuggled in through a payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// A registered user, created on first verified token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    /// Subject id from the identity provider.
    pub uid: String,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// A tracked habit.
///
/// `completion_history` is append-only: one timestamp per completion
/// event, at most one per UTC calendar day. `current_streak` is a pure
/// projection of the history's date set and is overwritten on every
/// append; it can be recomputed from the history at any time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Habit {
    pub id: Uuid,
    /// Subject id of the owner, stamped from the verified identity.
    pub owner_uid: String,
    pub owner_email: String,
    pub owner_name: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completion_history: Vec<DateTime<Utc>>,
    pub current_streak: u32,
}

/// Caller-supplied payload for creating a habit.
///
/// Unknown fields are rejected rather than merged in, so a payload cannot
/// set owner, history, streak, or timestamps.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HabitDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

fn default_category() -> String {
    "General".to_string()
}

impl HabitDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            category: default_category(),
            image_url: None,
        }
    }

    /// Reject drafts a habit cannot be built from.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "title".to_string(),
                message: "title must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

/// Caller-supplied payload for updating a habit.
///
/// Restricted to the same mutable fields as [`HabitDraft`]; protected
/// fields are absent from the type entirely, mirroring how the boundary
/// strips them instead of trusting the payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HabitPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl HabitPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.image_url.is_none()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.is_empty() {
            return Err(ValidationError::EmptyPatch);
        }
        if let Some(title) = &self.title {
            if title.trim().is_empty() {
                return Err(ValidationError::InvalidValue {
                    field: "title".to_string(),
                    message: "title must not be empty".to_string(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_rejects_unknown_fields() {
        let payload = r#"{"title": "Read", "current_streak": 999}"#;
        let result: Result<HabitDraft, _> = serde_json::from_str(payload);
        assert!(result.is_err(), "protected field must not deserialize");
    }

    #[test]
    fn draft_defaults_fill_in() {
        let draft: HabitDraft = serde_json::from_str(r#"{"title": "Read"}"#).unwrap();
        assert_eq!(draft.description, "");
        assert_eq!(draft.category, "General");
        assert!(draft.image_url.is_none());
    }

    #[test]
    fn draft_empty_title_fails_validation() {
        let draft = HabitDraft::new("   ");
        assert!(draft.validate().is_err());
    }

    #[test]
    fn patch_rejects_owner_override() {
        let payload = r#"{"title": "Read", "owner_uid": "intruder"}"#;
        let result: Result<HabitPatch, _> = serde_json::from_str(payload);
        assert!(result.is_err());
    }

    #[test]
    fn patch_rejects_history_override() {
        let payload = r#"{"completion_history": []}"#;
        let result: Result<HabitPatch, _> = serde_json::from_str(payload);
        assert!(result.is_err());
    }

    #[test]
    fn empty_patch_fails_validation() {
        assert!(HabitPatch::default().validate().is_err());
    }

    #[test]
    fn patch_with_one_field_is_valid() {
        let patch = HabitPatch {
            category: Some("Health".to_string()),
            ..Default::default()
        };
        assert!(patch.validate().is_ok());
        assert!(!patch.is_empty());
    }
}
