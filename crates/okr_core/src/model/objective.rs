//! Objective domain model.
//!
//! # Invariants
//! - `title` is never blank.
//! - `deadline`, when set, is a normalized `YYYY-MM-DD` date.
//! - `progress` mirrors the mean of active key results and stays in `[0, 100]`.

use super::validation::{normalize_deadline, normalize_text, normalize_title, ValidationError};
use super::EntityKind;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable objective identifier.
pub type ObjectiveId = Uuid;

/// Descriptive lifecycle label. Has no effect on progress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveStatus {
    #[default]
    Active,
    Completed,
    Paused,
}

impl ObjectiveStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Paused => "paused",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(Self::Active),
            "completed" => Some(Self::Completed),
            "paused" => Some(Self::Paused),
            _ => None,
        }
    }
}

/// Client input for creating or replacing an objective.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectiveDraft {
    pub title: String,
    pub description: Option<String>,
    pub owner: Option<String>,
    /// ISO date or date-time; blank means no deadline.
    pub deadline: Option<String>,
    pub status: Option<ObjectiveStatus>,
}

impl ObjectiveDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

/// Top-level goal. Progress is aggregated from its key results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Objective {
    pub id: ObjectiveId,
    pub title: String,
    pub description: String,
    pub owner: String,
    pub deadline: Option<String>,
    pub status: ObjectiveStatus,
    pub progress: f64,
    /// Epoch milliseconds, assigned by storage.
    pub created_at: i64,
    /// Epoch milliseconds, assigned by storage.
    pub updated_at: i64,
}

impl Objective {
    /// Builds a new objective with a generated id and zero progress.
    pub fn from_draft(draft: ObjectiveDraft) -> Result<Self, ValidationError> {
        Self::with_id(Uuid::new_v4(), draft)
    }

    /// Builds an objective for a caller-provided id.
    pub fn with_id(id: ObjectiveId, draft: ObjectiveDraft) -> Result<Self, ValidationError> {
        Ok(Self {
            id,
            title: normalize_title(EntityKind::Objective, &draft.title)?,
            description: normalize_text(draft.description),
            owner: normalize_text(draft.owner),
            deadline: normalize_deadline(draft.deadline.as_deref())?,
            status: draft.status.unwrap_or_default(),
            progress: 0.0,
            created_at: 0,
            updated_at: 0,
        })
    }

    /// Replaces all editable fields. Identity and progress are kept.
    pub fn apply_draft(&mut self, draft: ObjectiveDraft) -> Result<(), ValidationError> {
        let next = Self::with_id(self.id, draft)?;
        self.title = next.title;
        self.description = next.description;
        self.owner = next.owner;
        self.deadline = next.deadline;
        self.status = next.status;
        Ok(())
    }

    /// Re-checks invariants on an already built objective.
    pub fn validate(&self) -> Result<(), ValidationError> {
        normalize_title(EntityKind::Objective, &self.title)?;
        normalize_deadline(self.deadline.as_deref())?;
        Ok(())
    }
}
