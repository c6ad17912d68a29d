//! Key result persistence and progress cascade.
//!
//! # Invariants
//! - `key_results.progress` is always derived from the stored value fields.
//! - Any write touching values, membership or tombstones recomputes the
//!   parent objective in the same transaction.

use super::{ensure_changed, parse_uuid, recompute_objective_progress};
use super::{RepoError, RepoResult, SqliteOkrRepository};
use crate::model::key_result::{KeyResult, KeyResultId, KeyResultType};
use crate::model::objective::ObjectiveId;
use crate::model::EntityKind;
use crate::progress;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::HashMap;

const KEY_RESULT_SELECT_SQL: &str = "SELECT
    uuid,
    objective_uuid,
    title,
    description,
    type,
    start_value,
    target_value,
    current_value,
    unit,
    owner,
    progress,
    created_at,
    updated_at
FROM key_results";

/// Repository interface for key results.
pub trait KeyResultRepository {
    /// Inserts a key result under its active objective.
    fn create_key_result(&self, key_result: &KeyResult) -> RepoResult<KeyResult>;
    /// Replaces editable fields and re-derives progress.
    fn update_key_result(&self, key_result: &KeyResult) -> RepoResult<KeyResult>;
    /// Records a new `current_value` as one read-modify-write transaction.
    fn set_current_value(&self, id: KeyResultId, current_value: f64) -> RepoResult<KeyResult>;
    fn get_key_result(&self, id: KeyResultId) -> RepoResult<Option<KeyResult>>;
    /// Lists active key results of one objective in insertion order.
    fn list_key_results(&self, objective_id: ObjectiveId) -> RepoResult<Vec<KeyResult>>;
    /// Active key result count per active objective.
    fn key_result_counts(&self) -> RepoResult<HashMap<ObjectiveId, u32>>;
    /// Tombstones one key result and its initiatives.
    fn soft_delete_key_result(&self, id: KeyResultId) -> RepoResult<()>;
}

impl KeyResultRepository for SqliteOkrRepository<'_> {
    fn create_key_result(&self, key_result: &KeyResult) -> RepoResult<KeyResult> {
        key_result.validate()?;

        let tx = self.immediate_tx()?;
        ensure_active_objective(&tx, key_result.objective_id)?;
        insert_key_result_row(&tx, key_result.objective_id, key_result)?;
        recompute_objective_progress(&tx, key_result.objective_id)?;
        tx.commit()?;

        load_required_key_result(self.conn, key_result.id)
    }

    fn update_key_result(&self, key_result: &KeyResult) -> RepoResult<KeyResult> {
        key_result.validate()?;

        let tx = self.immediate_tx()?;
        let stored = load_key_result(&tx, key_result.id)?
            .ok_or(RepoError::NotFound(EntityKind::KeyResult, key_result.id))?;
        let changed = tx.execute(
            "UPDATE key_results
             SET
                title = ?2,
                description = ?3,
                type = ?4,
                start_value = ?5,
                target_value = ?6,
                current_value = ?7,
                unit = ?8,
                owner = ?9,
                progress = ?10,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1
               AND is_deleted = 0;",
            params![
                key_result.id.to_string(),
                key_result.title.as_str(),
                key_result.description.as_str(),
                key_result.kind.as_str(),
                key_result.start_value,
                key_result.target_value,
                key_result.current_value,
                key_result.unit.as_str(),
                key_result.owner.as_str(),
                derived_progress(key_result),
            ],
        )?;
        ensure_changed(changed, EntityKind::KeyResult, key_result.id)?;
        recompute_objective_progress(&tx, stored.objective_id)?;
        tx.commit()?;

        load_required_key_result(self.conn, key_result.id)
    }

    fn set_current_value(&self, id: KeyResultId, current_value: f64) -> RepoResult<KeyResult> {
        let tx = self.immediate_tx()?;
        let mut key_result =
            load_key_result(&tx, id)?.ok_or(RepoError::NotFound(EntityKind::KeyResult, id))?;
        key_result.set_current_value(current_value)?;

        tx.execute(
            "UPDATE key_results
             SET
                current_value = ?2,
                progress = ?3,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1
               AND is_deleted = 0;",
            params![
                id.to_string(),
                key_result.current_value,
                derived_progress(&key_result)
            ],
        )?;
        recompute_objective_progress(&tx, key_result.objective_id)?;
        tx.commit()?;

        load_required_key_result(self.conn, id)
    }

    fn get_key_result(&self, id: KeyResultId) -> RepoResult<Option<KeyResult>> {
        load_key_result(self.conn, id)
    }

    fn list_key_results(&self, objective_id: ObjectiveId) -> RepoResult<Vec<KeyResult>> {
        let mut stmt = self.conn.prepare(&format!(
            "{KEY_RESULT_SELECT_SQL}
             WHERE objective_uuid = ?1
               AND is_deleted = 0
             ORDER BY rowid ASC;"
        ))?;
        let mut rows = stmt.query([objective_id.to_string()])?;
        let mut key_results = Vec::new();
        while let Some(row) = rows.next()? {
            key_results.push(parse_key_result_row(row)?);
        }
        Ok(key_results)
    }

    fn key_result_counts(&self) -> RepoResult<HashMap<ObjectiveId, u32>> {
        let mut stmt = self.conn.prepare(
            "SELECT objective_uuid, COUNT(*)
             FROM key_results
             WHERE is_deleted = 0
             GROUP BY objective_uuid;",
        )?;
        let mut rows = stmt.query([])?;
        let mut counts = HashMap::new();
        while let Some(row) = rows.next()? {
            let objective_text: String = row.get(0)?;
            let count: u32 = row.get(1)?;
            counts.insert(
                parse_uuid(&objective_text, "key_results.objective_uuid")?,
                count,
            );
        }
        Ok(counts)
    }

    fn soft_delete_key_result(&self, id: KeyResultId) -> RepoResult<()> {
        let tx = self.immediate_tx()?;
        let key_result =
            load_key_result(&tx, id)?.ok_or(RepoError::NotFound(EntityKind::KeyResult, id))?;

        tx.execute(
            "UPDATE key_results
             SET
                is_deleted = 1,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1
               AND is_deleted = 0;",
            [id.to_string()],
        )?;
        tx.execute(
            "UPDATE initiatives
             SET
                is_deleted = 1,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE key_result_uuid = ?1
               AND is_deleted = 0;",
            [id.to_string()],
        )?;
        recompute_objective_progress(&tx, key_result.objective_id)?;

        tx.commit()?;
        Ok(())
    }
}

/// Inserts one key result row; caller owns the transaction and the
/// objective recompute.
pub(crate) fn insert_key_result_row(
    conn: &Connection,
    objective_id: ObjectiveId,
    key_result: &KeyResult,
) -> RepoResult<()> {
    conn.execute(
        "INSERT INTO key_results (
            uuid,
            objective_uuid,
            title,
            description,
            type,
            start_value,
            target_value,
            current_value,
            unit,
            owner,
            progress,
            is_deleted
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, 0);",
        params![
            key_result.id.to_string(),
            objective_id.to_string(),
            key_result.title.as_str(),
            key_result.description.as_str(),
            key_result.kind.as_str(),
            key_result.start_value,
            key_result.target_value,
            key_result.current_value,
            key_result.unit.as_str(),
            key_result.owner.as_str(),
            derived_progress(key_result),
        ],
    )?;
    Ok(())
}

/// Loads one active key result.
pub(crate) fn load_key_result(
    conn: &Connection,
    id: KeyResultId,
) -> RepoResult<Option<KeyResult>> {
    let mut stmt = conn.prepare(&format!(
        "{KEY_RESULT_SELECT_SQL}
         WHERE uuid = ?1
           AND is_deleted = 0;"
    ))?;
    let row = stmt
        .query_row([id.to_string()], |row| Ok(parse_key_result_row(row)))
        .optional()?;
    row.transpose()
}

fn load_required_key_result(conn: &Connection, id: KeyResultId) -> RepoResult<KeyResult> {
    load_key_result(conn, id)?.ok_or(RepoError::NotFound(EntityKind::KeyResult, id))
}

fn ensure_active_objective(conn: &Connection, objective_id: ObjectiveId) -> RepoResult<()> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM objectives
            WHERE uuid = ?1
              AND is_deleted = 0
        );",
        [objective_id.to_string()],
        |row| row.get(0),
    )?;
    if exists == 1 {
        Ok(())
    } else {
        Err(RepoError::NotFound(EntityKind::Objective, objective_id))
    }
}

// Storage never trusts the in-memory `progress` field.
fn derived_progress(key_result: &KeyResult) -> f64 {
    progress::key_result_progress(
        key_result.kind,
        key_result.start_value,
        key_result.target_value,
        key_result.current_value,
    )
}

fn parse_key_result_row(row: &Row<'_>) -> RepoResult<KeyResult> {
    let uuid_text: String = row.get("uuid")?;
    let objective_text: String = row.get("objective_uuid")?;
    let type_text: String = row.get("type")?;
    let kind = KeyResultType::parse(&type_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid key result type `{type_text}` in key_results.type"))
    })?;

    let start_value: f64 = row.get("start_value")?;
    let target_value: f64 = row.get("target_value")?;
    let current_value: f64 = row.get("current_value")?;
    let key_result = KeyResult {
        id: parse_uuid(&uuid_text, "key_results.uuid")?,
        objective_id: parse_uuid(&objective_text, "key_results.objective_uuid")?,
        title: row.get("title")?,
        description: row.get("description")?,
        kind,
        start_value,
        target_value,
        current_value,
        unit: row.get("unit")?,
        owner: row.get("owner")?,
        progress: row.get("progress")?,
        completed: progress::is_completed(start_value, target_value, current_value),
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    };
    key_result
        .validate()
        .map_err(|err| RepoError::InvalidData(format!("key result {}: {err}", key_result.id)))?;
    Ok(key_result)
}
