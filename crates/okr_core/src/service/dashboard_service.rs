//! Cross-objective summary for the dashboard view.
//!
//! Reads only; every figure is taken from the progress columns kept
//! current by the write path, so a freshly written objective is visible
//! immediately.

use crate::model::objective::Objective;
use crate::progress;
use crate::repo::key_result_repo::KeyResultRepository;
use crate::repo::objective_repo::ObjectiveRepository;
use crate::service::okr_service::OkrServiceResult;
use serde::{Deserialize, Serialize};

/// Objective row on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveSummary {
    #[serde(flatten)]
    pub objective: Objective,
    pub key_results_count: u32,
}

/// Dashboard payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    /// Active objectives in insertion order.
    pub objectives: Vec<ObjectiveSummary>,
    pub total_objectives: usize,
    /// Mean objective progress; `0` without objectives.
    pub avg_progress: f64,
}

pub struct DashboardService<R> {
    repo: R,
}

impl<R> DashboardService<R>
where
    R: ObjectiveRepository + KeyResultRepository,
{
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn dashboard(&self) -> OkrServiceResult<Dashboard> {
        let objectives = self.repo.list_objectives()?;
        let counts = self.repo.key_result_counts()?;

        let values = objectives
            .iter()
            .map(|objective| objective.progress)
            .collect::<Vec<_>>();
        let avg_progress = progress::mean(&values);

        let objectives = objectives
            .into_iter()
            .map(|objective| ObjectiveSummary {
                key_results_count: counts.get(&objective.id).copied().unwrap_or(0),
                objective,
            })
            .collect::<Vec<_>>();

        Ok(Dashboard {
            total_objectives: objectives.len(),
            objectives,
            avg_progress,
        })
    }
}
