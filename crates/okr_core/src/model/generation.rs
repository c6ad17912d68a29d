//! Request/response shapes for AI-assisted OKR generation.
//!
//! The generator itself is an external collaborator; core only knows what
//! it is asked and what comes back, and how to turn the answer into drafts.

use super::key_result::{KeyResultDraft, KeyResultType};
use super::objective::ObjectiveDraft;
use super::validation::ValidationError;
use serde::{Deserialize, Serialize};

/// Business context sent to the generator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateOkrsRequest {
    pub context: String,
    pub company_size: String,
    pub industry: String,
    pub time_period: String,
}

impl GenerateOkrsRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.context.trim().is_empty() {
            return Err(ValidationError::EmptyGenerationContext);
        }
        Ok(())
    }
}

/// One generated key result proposal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratedKeyResult {
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: KeyResultType,
    pub start_value: Option<f64>,
    pub target_value: Option<f64>,
    pub unit: String,
}

/// One generated objective proposal with its key results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratedObjective {
    pub title: String,
    pub description: String,
    pub key_results: Vec<GeneratedKeyResult>,
}

/// Generator response envelope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratedOkrs {
    pub generated_okrs: Vec<GeneratedObjective>,
}

impl GeneratedObjective {
    pub fn objective_draft(&self) -> ObjectiveDraft {
        ObjectiveDraft {
            title: self.title.clone(),
            description: Some(self.description.clone()),
            ..ObjectiveDraft::default()
        }
    }

    pub fn key_result_drafts(&self) -> impl Iterator<Item = KeyResultDraft> + '_ {
        self.key_results.iter().map(|generated| KeyResultDraft {
            title: generated.title.clone(),
            description: Some(generated.description.clone()),
            kind: Some(generated.kind),
            start_value: generated.start_value,
            target_value: generated.target_value,
            current_value: None,
            unit: Some(generated.unit.clone()),
            owner: None,
            completed: None,
        })
    }
}
