//! Key result domain model.
//!
//! # Invariants
//! - A key result belongs to exactly one objective for its whole lifetime.
//! - Value fields are finite and `target_value != start_value`.
//! - `progress` and `completed` are recomputed from value fields on every
//!   mutation and are never taken from client input.

use super::objective::ObjectiveId;
use super::validation::{ensure_finite, normalize_text, normalize_title, ValidationError};
use super::EntityKind;
use crate::progress;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable key result identifier.
pub type KeyResultId = Uuid;

pub const DEFAULT_START_VALUE: f64 = 0.0;
pub const DEFAULT_TARGET_VALUE: f64 = 100.0;

/// How a key result measures progress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyResultType {
    /// Linear progress between start and target value.
    #[default]
    Metric,
    /// Done or not done.
    Binary,
}

impl KeyResultType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Metric => "metric",
            Self::Binary => "binary",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "metric" => Some(Self::Metric),
            "binary" => Some(Self::Binary),
            _ => None,
        }
    }
}

/// Client input for creating or replacing a key result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyResultDraft {
    pub title: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<KeyResultType>,
    pub start_value: Option<f64>,
    pub target_value: Option<f64>,
    pub current_value: Option<f64>,
    pub unit: Option<String>,
    pub owner: Option<String>,
    /// Explicit completion flag; overrides `current_value` when present.
    pub completed: Option<bool>,
}

impl KeyResultDraft {
    /// Metric draft moving from `start_value` to `target_value`.
    pub fn metric(title: impl Into<String>, start_value: f64, target_value: f64) -> Self {
        Self {
            title: title.into(),
            kind: Some(KeyResultType::Metric),
            start_value: Some(start_value),
            target_value: Some(target_value),
            ..Self::default()
        }
    }

    /// Binary draft with the given completion state.
    pub fn binary(title: impl Into<String>, completed: bool) -> Self {
        Self {
            title: title.into(),
            kind: Some(KeyResultType::Binary),
            completed: Some(completed),
            ..Self::default()
        }
    }
}

/// Measurable outcome attached to one objective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyResult {
    pub id: KeyResultId,
    pub objective_id: ObjectiveId,
    pub title: String,
    pub description: String,
    /// Serialized as `type` to match the client schema.
    #[serde(rename = "type")]
    pub kind: KeyResultType,
    pub start_value: f64,
    pub target_value: f64,
    pub current_value: f64,
    pub unit: String,
    pub owner: String,
    pub progress: f64,
    pub completed: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl KeyResult {
    /// Builds a new key result under `objective_id` with a generated id.
    pub fn from_draft(
        objective_id: ObjectiveId,
        draft: KeyResultDraft,
    ) -> Result<Self, ValidationError> {
        Self::with_id(Uuid::new_v4(), objective_id, draft)
    }

    pub fn with_id(
        id: KeyResultId,
        objective_id: ObjectiveId,
        draft: KeyResultDraft,
    ) -> Result<Self, ValidationError> {
        let kind = draft.kind.unwrap_or_default();
        let start_value = ensure_finite(
            "start_value",
            draft.start_value.unwrap_or(DEFAULT_START_VALUE),
        )?;
        let target_value = ensure_finite(
            "target_value",
            draft.target_value.unwrap_or(DEFAULT_TARGET_VALUE),
        )?;
        let current_value = match draft.completed {
            Some(true) => target_value,
            Some(false) => start_value,
            None => ensure_finite("current_value", draft.current_value.unwrap_or(start_value))?,
        };

        let mut key_result = Self {
            id,
            objective_id,
            title: normalize_title(EntityKind::KeyResult, &draft.title)?,
            description: normalize_text(draft.description),
            kind,
            start_value,
            target_value,
            current_value,
            unit: normalize_text(draft.unit),
            owner: normalize_text(draft.owner),
            progress: 0.0,
            completed: false,
            created_at: 0,
            updated_at: 0,
        };
        key_result.validate()?;
        key_result.refresh_progress();
        Ok(key_result)
    }

    /// Replaces all editable fields. Identity and parent linkage are kept.
    pub fn apply_draft(&mut self, draft: KeyResultDraft) -> Result<(), ValidationError> {
        let next = Self::with_id(self.id, self.objective_id, draft)?;
        *self = Self {
            created_at: self.created_at,
            updated_at: self.updated_at,
            ..next
        };
        Ok(())
    }

    /// Records a new measurement and re-derives progress.
    pub fn set_current_value(&mut self, current_value: f64) -> Result<(), ValidationError> {
        self.current_value = ensure_finite("current_value", current_value)?;
        self.refresh_progress();
        Ok(())
    }

    /// Recomputes `progress` and `completed` from value fields.
    pub fn refresh_progress(&mut self) {
        self.progress = progress::key_result_progress(
            self.kind,
            self.start_value,
            self.target_value,
            self.current_value,
        );
        self.completed = progress::is_completed(self.start_value, self.target_value, self.current_value);
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        normalize_title(EntityKind::KeyResult, &self.title)?;
        ensure_finite("start_value", self.start_value)?;
        ensure_finite("target_value", self.target_value)?;
        ensure_finite("current_value", self.current_value)?;
        if self.target_value == self.start_value {
            return Err(ValidationError::ZeroValueSpan);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{KeyResult, KeyResultDraft, KeyResultType};
    use crate::model::validation::ValidationError;
    use uuid::Uuid;

    #[test]
    fn metric_draft_derives_progress() {
        let mut draft = KeyResultDraft::metric("Signups", 0.0, 50.0);
        draft.current_value = Some(25.0);
        let key_result = KeyResult::from_draft(Uuid::new_v4(), draft).unwrap();

        assert_eq!(key_result.progress, 50.0);
        assert!(!key_result.completed);
    }

    #[test]
    fn binary_draft_uses_completion_flag() {
        let open = KeyResult::from_draft(Uuid::new_v4(), KeyResultDraft::binary("Launch", false))
            .unwrap();
        assert_eq!(open.progress, 0.0);
        assert!(!open.completed);

        let done = KeyResult::from_draft(Uuid::new_v4(), KeyResultDraft::binary("Launch", true))
            .unwrap();
        assert_eq!(done.progress, 100.0);
        assert!(done.completed);
    }

    #[test]
    fn binary_completion_flag_holds_for_descending_values() {
        let mut draft = KeyResultDraft::binary("Close incident backlog", false);
        draft.start_value = Some(1.0);
        draft.target_value = Some(0.0);
        let open = KeyResult::from_draft(Uuid::new_v4(), draft.clone()).unwrap();
        assert_eq!(open.current_value, 1.0);
        assert_eq!(open.progress, 0.0);
        assert!(!open.completed);

        draft.completed = Some(true);
        let done = KeyResult::from_draft(Uuid::new_v4(), draft).unwrap();
        assert_eq!(done.current_value, 0.0);
        assert_eq!(done.progress, 100.0);
        assert!(done.completed);
    }

    #[test]
    fn binary_with_zero_span_is_rejected() {
        let mut draft = KeyResultDraft::binary("Launch", false);
        draft.target_value = Some(0.0);
        let err = KeyResult::from_draft(Uuid::new_v4(), draft).unwrap_err();
        assert_eq!(err, ValidationError::ZeroValueSpan);
    }

    #[test]
    fn descending_metric_is_not_completed_until_target() {
        let mut draft = KeyResultDraft::metric("Churn", 10.0, 5.0);
        draft.current_value = Some(9.0);
        let mut key_result = KeyResult::from_draft(Uuid::new_v4(), draft).unwrap();
        assert_eq!(key_result.progress, 20.0);
        assert!(!key_result.completed);

        key_result.set_current_value(5.0).unwrap();
        assert_eq!(key_result.progress, 100.0);
        assert!(key_result.completed);
    }

    #[test]
    fn metric_with_zero_span_is_rejected() {
        let err = KeyResult::from_draft(Uuid::new_v4(), KeyResultDraft::metric("Flat", 3.0, 3.0))
            .unwrap_err();
        assert_eq!(err, ValidationError::ZeroValueSpan);
        assert_eq!(err.field(), "target_value");
    }

    #[test]
    fn non_finite_current_value_is_rejected() {
        let mut key_result =
            KeyResult::from_draft(Uuid::new_v4(), KeyResultDraft::metric("NPS", 0.0, 10.0))
                .unwrap();
        let err = key_result.set_current_value(f64::NAN).unwrap_err();
        assert_eq!(err, ValidationError::NonFiniteValue("current_value"));
        assert_eq!(key_result.current_value, 0.0);
    }

    #[test]
    fn type_field_uses_client_name() {
        let draft: KeyResultDraft =
            serde_json::from_str(r#"{"title":"Ship","type":"binary"}"#).unwrap();
        assert_eq!(draft.kind, Some(KeyResultType::Binary));

        let key_result = KeyResult::from_draft(Uuid::new_v4(), draft).unwrap();
        let json = serde_json::to_value(&key_result).unwrap();
        assert_eq!(json["type"], "binary");
        assert_eq!(json["target_value"], 100.0);
    }
}
