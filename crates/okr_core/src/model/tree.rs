//! Nested read models returned to callers after every command.

use super::initiative::Initiative;
use super::key_result::KeyResult;
use super::objective::Objective;
use serde::{Deserialize, Serialize};

/// Key result with its initiatives, serialized as one flat object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyResultTree {
    #[serde(flatten)]
    pub key_result: KeyResult,
    pub initiatives: Vec<Initiative>,
}

/// Objective with its full key result / initiative subtree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveTree {
    #[serde(flatten)]
    pub objective: Objective,
    pub key_results: Vec<KeyResultTree>,
}

impl ObjectiveTree {
    pub fn find_key_result(&self, id: uuid::Uuid) -> Option<&KeyResultTree> {
        self.key_results
            .iter()
            .find(|entry| entry.key_result.id == id)
    }
}
