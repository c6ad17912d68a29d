//! OKR command handlers.
//!
//! # Responsibility
//! - Validate input and parent existence before any mutation.
//! - Return the mutated entity together with the refreshed objective
//!   subtree, so callers never need a second read.
//!
//! # Invariants
//! - Not-found and validation failures leave storage untouched.
//! - Initiative status transitions are unrestricted.
//! - Service APIs never bypass repository validation/persistence contracts.

use crate::model::generation::GeneratedObjective;
use crate::model::initiative::{Initiative, InitiativeDraft, InitiativeId};
use crate::model::key_result::{KeyResult, KeyResultDraft, KeyResultId};
use crate::model::objective::{Objective, ObjectiveDraft, ObjectiveId};
use crate::model::tree::{KeyResultTree, ObjectiveTree};
use crate::model::validation::ValidationError;
use crate::model::EntityKind;
use crate::repo::initiative_repo::InitiativeRepository;
use crate::repo::key_result_repo::KeyResultRepository;
use crate::repo::objective_repo::ObjectiveRepository;
use crate::repo::RepoError;
use log::{info, warn};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Errors surfaced by OKR commands.
#[derive(Debug)]
pub enum OkrServiceError {
    /// Input rejected; carries the offending field.
    Validation(ValidationError),
    /// Referenced entity is unknown or deleted.
    NotFound(EntityKind, Uuid),
    /// Storage-level failure.
    Repo(RepoError),
}

impl Display for OkrServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(kind, id) => write!(f, "{kind} not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for OkrServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::NotFound(..) => None,
        }
    }
}

impl From<RepoError> for OkrServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            RepoError::NotFound(kind, id) => Self::NotFound(kind, id),
            other => Self::Repo(other),
        }
    }
}

impl From<ValidationError> for OkrServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

pub type OkrServiceResult<T> = Result<T, OkrServiceError>;

/// Mutated entity plus the refreshed subtree of its objective.
///
/// Serialized flat: the entity's fields at top level and the subtree under
/// `objective`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandOutcome<T> {
    #[serde(flatten)]
    pub entity: T,
    pub objective: ObjectiveTree,
}

/// Use-case facade over the OKR repositories.
pub struct OkrService<R> {
    repo: R,
}

impl<R> OkrService<R>
where
    R: ObjectiveRepository + KeyResultRepository + InitiativeRepository,
{
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates an objective. It starts with progress `0` and no key results.
    pub fn create_objective(&self, draft: ObjectiveDraft) -> OkrServiceResult<ObjectiveTree> {
        let objective = Objective::from_draft(draft)?;
        let stored = self.repo.create_objective(&objective)?;
        info!(
            "event=objective_create module=service status=ok objective_id={}",
            stored.id
        );
        Ok(ObjectiveTree {
            objective: stored,
            key_results: Vec::new(),
        })
    }

    /// Replaces an objective's editable fields.
    pub fn update_objective(
        &self,
        id: ObjectiveId,
        draft: ObjectiveDraft,
    ) -> OkrServiceResult<ObjectiveTree> {
        let mut objective = self.require_objective(id)?;
        objective.apply_draft(draft)?;
        self.repo.update_objective(&objective)?;
        self.objective_tree(id)
    }

    /// Loads one objective with nested key results and initiatives.
    pub fn objective_tree(&self, id: ObjectiveId) -> OkrServiceResult<ObjectiveTree> {
        let objective = self.require_objective(id)?;
        let key_results = self
            .repo
            .list_key_results(id)?
            .into_iter()
            .map(|key_result| self.key_result_tree(key_result))
            .collect::<OkrServiceResult<Vec<_>>>()?;
        Ok(ObjectiveTree {
            objective,
            key_results,
        })
    }

    /// Lists active objectives in insertion order, without subtrees.
    pub fn list_objectives(&self) -> OkrServiceResult<Vec<Objective>> {
        Ok(self.repo.list_objectives()?)
    }

    /// Tombstones an objective together with its key results and initiatives.
    pub fn delete_objective(&self, id: ObjectiveId) -> OkrServiceResult<()> {
        self.repo.soft_delete_objective(id)?;
        info!("event=objective_delete module=service status=ok objective_id={id}");
        Ok(())
    }

    /// Adds a key result and recomputes the parent objective.
    pub fn create_key_result(
        &self,
        objective_id: ObjectiveId,
        draft: KeyResultDraft,
    ) -> OkrServiceResult<CommandOutcome<KeyResultTree>> {
        self.require_objective(objective_id)?;
        let key_result = KeyResult::from_draft(objective_id, draft)?;
        let stored = self.repo.create_key_result(&key_result)?;
        info!(
            "event=key_result_create module=service status=ok objective_id={objective_id} key_result_id={} progress={:.2}",
            stored.id, stored.progress
        );
        self.key_result_outcome(stored)
    }

    /// Replaces a key result's editable fields and recomputes progress.
    pub fn update_key_result(
        &self,
        id: KeyResultId,
        draft: KeyResultDraft,
    ) -> OkrServiceResult<CommandOutcome<KeyResultTree>> {
        let mut key_result = self.require_key_result(id)?;
        key_result.apply_draft(draft)?;
        let stored = self.repo.update_key_result(&key_result)?;
        self.key_result_outcome(stored)
    }

    /// Records a new measurement; key result and objective progress are
    /// recomputed before this returns.
    pub fn update_key_result_progress(
        &self,
        id: KeyResultId,
        current_value: f64,
    ) -> OkrServiceResult<CommandOutcome<KeyResultTree>> {
        let stored = self.repo.set_current_value(id, current_value).map_err(|err| {
            warn!(
                "event=key_result_progress module=service status=error key_result_id={id} error={err}"
            );
            err
        })?;
        info!(
            "event=key_result_progress module=service status=ok key_result_id={id} progress={:.2}",
            stored.progress
        );
        self.key_result_outcome(stored)
    }

    /// Tombstones a key result and its initiatives; the parent objective is
    /// recomputed without it.
    pub fn delete_key_result(&self, id: KeyResultId) -> OkrServiceResult<()> {
        self.repo.soft_delete_key_result(id)?;
        info!("event=key_result_delete module=service status=ok key_result_id={id}");
        Ok(())
    }

    pub fn create_initiative(
        &self,
        key_result_id: KeyResultId,
        draft: InitiativeDraft,
    ) -> OkrServiceResult<CommandOutcome<Initiative>> {
        let key_result = self.require_key_result(key_result_id)?;
        let initiative = Initiative::from_draft(key_result_id, draft)?;
        let stored = self.repo.create_initiative(&initiative)?;
        Ok(CommandOutcome {
            entity: stored,
            objective: self.objective_tree(key_result.objective_id)?,
        })
    }

    /// Replaces an initiative's editable fields; any status may follow any
    /// other.
    pub fn update_initiative(
        &self,
        id: InitiativeId,
        draft: InitiativeDraft,
    ) -> OkrServiceResult<CommandOutcome<Initiative>> {
        let mut initiative = self
            .repo
            .get_initiative(id)?
            .ok_or(OkrServiceError::NotFound(EntityKind::Initiative, id))?;
        initiative.apply_draft(draft)?;
        let stored = self.repo.update_initiative(&initiative)?;
        let key_result = self.require_key_result(stored.key_result_id)?;
        Ok(CommandOutcome {
            entity: stored,
            objective: self.objective_tree(key_result.objective_id)?,
        })
    }

    pub fn delete_initiative(&self, id: InitiativeId) -> OkrServiceResult<()> {
        self.repo.soft_delete_initiative(id)?;
        Ok(())
    }

    /// Persists generated objectives with their key results, all or nothing.
    ///
    /// Every proposal is validated before the first row is written.
    pub fn create_generated(
        &self,
        generated: &[GeneratedObjective],
    ) -> OkrServiceResult<Vec<ObjectiveTree>> {
        let mut trees = Vec::with_capacity(generated.len());
        for proposal in generated {
            let objective = Objective::from_draft(proposal.objective_draft())?;
            let key_results = proposal
                .key_result_drafts()
                .map(|draft| KeyResult::from_draft(objective.id, draft))
                .collect::<Result<Vec<_>, _>>()?;
            trees.push((objective, key_results));
        }

        self.repo.create_objective_trees(&trees)?;
        info!(
            "event=generated_okrs_create module=service status=ok objectives={}",
            trees.len()
        );

        trees
            .iter()
            .map(|(objective, _)| self.objective_tree(objective.id))
            .collect()
    }

    fn key_result_tree(&self, key_result: KeyResult) -> OkrServiceResult<KeyResultTree> {
        let initiatives = self.repo.list_initiatives(key_result.id)?;
        Ok(KeyResultTree {
            key_result,
            initiatives,
        })
    }

    fn key_result_outcome(
        &self,
        key_result: KeyResult,
    ) -> OkrServiceResult<CommandOutcome<KeyResultTree>> {
        let objective = self.objective_tree(key_result.objective_id)?;
        Ok(CommandOutcome {
            entity: self.key_result_tree(key_result)?,
            objective,
        })
    }

    fn require_objective(&self, id: ObjectiveId) -> OkrServiceResult<Objective> {
        self.repo
            .get_objective(id)?
            .ok_or(OkrServiceError::NotFound(EntityKind::Objective, id))
    }

    fn require_key_result(&self, id: KeyResultId) -> OkrServiceResult<KeyResult> {
        self.repo
            .get_key_result(id)?
            .ok_or(OkrServiceError::NotFound(EntityKind::KeyResult, id))
    }
}
