//! Initiative domain model.
//!
//! Initiatives are the actionable tasks behind a key result. Their status
//! is tracked for display only and never feeds into progress.

use super::key_result::KeyResultId;
use super::validation::{normalize_text, normalize_title, ValidationError};
use super::EntityKind;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable initiative identifier.
pub type InitiativeId = Uuid;

/// Initiative lifecycle. Any state may move to any other state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitiativeStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
}

impl InitiativeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "not_started" => Some(Self::NotStarted),
            "in_progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

/// Client input for creating or replacing an initiative.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InitiativeDraft {
    pub title: String,
    pub description: Option<String>,
    pub owner: Option<String>,
    pub status: Option<InitiativeStatus>,
}

impl InitiativeDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: InitiativeStatus) -> Self {
        self.status = Some(status);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Initiative {
    pub id: InitiativeId,
    pub key_result_id: KeyResultId,
    pub title: String,
    pub description: String,
    pub owner: String,
    pub status: InitiativeStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Initiative {
    pub fn from_draft(
        key_result_id: KeyResultId,
        draft: InitiativeDraft,
    ) -> Result<Self, ValidationError> {
        Self::with_id(Uuid::new_v4(), key_result_id, draft)
    }

    pub fn with_id(
        id: InitiativeId,
        key_result_id: KeyResultId,
        draft: InitiativeDraft,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            id,
            key_result_id,
            title: normalize_title(EntityKind::Initiative, &draft.title)?,
            description: normalize_text(draft.description),
            owner: normalize_text(draft.owner),
            status: draft.status.unwrap_or_default(),
            created_at: 0,
            updated_at: 0,
        })
    }

    /// Replaces all editable fields, including an unrestricted status jump.
    pub fn apply_draft(&mut self, draft: InitiativeDraft) -> Result<(), ValidationError> {
        let next = Self::with_id(self.id, self.key_result_id, draft)?;
        self.title = next.title;
        self.description = next.description;
        self.owner = next.owner;
        self.status = next.status;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        normalize_title(EntityKind::Initiative, &self.title)?;
        Ok(())
    }
}
