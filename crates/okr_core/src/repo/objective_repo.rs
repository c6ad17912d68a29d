//! Objective persistence.
//!
//! # Invariants
//! - Listing order is insertion order (`rowid ASC`).
//! - Deleting an objective tombstones its key results and their
//!   initiatives in the same transaction.

use super::key_result_repo::insert_key_result_row;
use super::{ensure_changed, parse_uuid, recompute_objective_progress};
use super::{RepoError, RepoResult, SqliteOkrRepository};
use crate::model::key_result::KeyResult;
use crate::model::objective::{Objective, ObjectiveId, ObjectiveStatus};
use crate::model::EntityKind;
use rusqlite::{params, Connection, OptionalExtension, Row};

const OBJECTIVE_SELECT_SQL: &str = "SELECT
    uuid,
    title,
    description,
    owner,
    deadline,
    status,
    progress,
    created_at,
    updated_at
FROM objectives";

/// Repository interface for objectives.
pub trait ObjectiveRepository {
    /// Inserts one objective and returns the stored record.
    fn create_objective(&self, objective: &Objective) -> RepoResult<Objective>;
    /// Inserts several objectives with their key results, all or nothing.
    fn create_objective_trees(&self, trees: &[(Objective, Vec<KeyResult>)]) -> RepoResult<()>;
    /// Replaces editable fields of an active objective.
    fn update_objective(&self, objective: &Objective) -> RepoResult<Objective>;
    fn get_objective(&self, id: ObjectiveId) -> RepoResult<Option<Objective>>;
    /// Lists active objectives in insertion order.
    fn list_objectives(&self) -> RepoResult<Vec<Objective>>;
    /// Tombstones one objective and its whole subtree.
    fn soft_delete_objective(&self, id: ObjectiveId) -> RepoResult<()>;
}

impl ObjectiveRepository for SqliteOkrRepository<'_> {
    fn create_objective(&self, objective: &Objective) -> RepoResult<Objective> {
        objective.validate()?;
        insert_objective_row(self.conn, objective)?;
        load_required_objective(self.conn, objective.id)
    }

    fn create_objective_trees(&self, trees: &[(Objective, Vec<KeyResult>)]) -> RepoResult<()> {
        for (objective, key_results) in trees {
            objective.validate()?;
            for key_result in key_results {
                key_result.validate()?;
            }
        }

        let tx = self.immediate_tx()?;
        for (objective, key_results) in trees {
            insert_objective_row(&tx, objective)?;
            for key_result in key_results {
                insert_key_result_row(&tx, objective.id, key_result)?;
            }
            recompute_objective_progress(&tx, objective.id)?;
        }
        tx.commit()?;
        Ok(())
    }

    fn update_objective(&self, objective: &Objective) -> RepoResult<Objective> {
        objective.validate()?;

        let changed = self.conn.execute(
            "UPDATE objectives
             SET
                title = ?2,
                description = ?3,
                owner = ?4,
                deadline = ?5,
                status = ?6,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1
               AND is_deleted = 0;",
            params![
                objective.id.to_string(),
                objective.title.as_str(),
                objective.description.as_str(),
                objective.owner.as_str(),
                objective.deadline.as_deref(),
                objective.status.as_str(),
            ],
        )?;
        ensure_changed(changed, EntityKind::Objective, objective.id)?;

        load_required_objective(self.conn, objective.id)
    }

    fn get_objective(&self, id: ObjectiveId) -> RepoResult<Option<Objective>> {
        load_objective(self.conn, id)
    }

    fn list_objectives(&self) -> RepoResult<Vec<Objective>> {
        let mut stmt = self.conn.prepare(&format!(
            "{OBJECTIVE_SELECT_SQL}
             WHERE is_deleted = 0
             ORDER BY rowid ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut objectives = Vec::new();
        while let Some(row) = rows.next()? {
            objectives.push(parse_objective_row(row)?);
        }
        Ok(objectives)
    }

    fn soft_delete_objective(&self, id: ObjectiveId) -> RepoResult<()> {
        let tx = self.immediate_tx()?;

        let changed = tx.execute(
            "UPDATE objectives
             SET
                is_deleted = 1,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1
               AND is_deleted = 0;",
            [id.to_string()],
        )?;
        ensure_changed(changed, EntityKind::Objective, id)?;

        tx.execute(
            "UPDATE initiatives
             SET
                is_deleted = 1,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE is_deleted = 0
               AND key_result_uuid IN (
                 SELECT uuid FROM key_results WHERE objective_uuid = ?1
               );",
            [id.to_string()],
        )?;
        tx.execute(
            "UPDATE key_results
             SET
                is_deleted = 1,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE objective_uuid = ?1
               AND is_deleted = 0;",
            [id.to_string()],
        )?;

        tx.commit()?;
        Ok(())
    }
}

fn insert_objective_row(conn: &Connection, objective: &Objective) -> RepoResult<()> {
    conn.execute(
        "INSERT INTO objectives (
            uuid,
            title,
            description,
            owner,
            deadline,
            status,
            progress,
            is_deleted
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, 0);",
        params![
            objective.id.to_string(),
            objective.title.as_str(),
            objective.description.as_str(),
            objective.owner.as_str(),
            objective.deadline.as_deref(),
            objective.status.as_str(),
        ],
    )?;
    Ok(())
}

/// Loads one active objective.
pub(crate) fn load_objective(conn: &Connection, id: ObjectiveId) -> RepoResult<Option<Objective>> {
    let mut stmt = conn.prepare(&format!(
        "{OBJECTIVE_SELECT_SQL}
         WHERE uuid = ?1
           AND is_deleted = 0;"
    ))?;
    let row = stmt
        .query_row([id.to_string()], |row| Ok(parse_objective_row(row)))
        .optional()?;
    row.transpose()
}

fn load_required_objective(conn: &Connection, id: ObjectiveId) -> RepoResult<Objective> {
    load_objective(conn, id)?.ok_or(RepoError::NotFound(EntityKind::Objective, id))
}

fn parse_objective_row(row: &Row<'_>) -> RepoResult<Objective> {
    let uuid_text: String = row.get("uuid")?;
    let status_text: String = row.get("status")?;
    let status = ObjectiveStatus::parse(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid objective status `{status_text}` in objectives.status"
        ))
    })?;

    let objective = Objective {
        id: parse_uuid(&uuid_text, "objectives.uuid")?,
        title: row.get("title")?,
        description: row.get("description")?,
        owner: row.get("owner")?,
        deadline: row.get("deadline")?,
        status,
        progress: row.get("progress")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    };
    objective
        .validate()
        .map_err(|err| RepoError::InvalidData(format!("objective {}: {err}", objective.id)))?;
    Ok(objective)
}
