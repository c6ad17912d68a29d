//! Initiative persistence.
//!
//! Initiative writes never touch progress columns.

use super::{ensure_changed, parse_uuid};
use super::{RepoError, RepoResult, SqliteOkrRepository};
use crate::model::initiative::{Initiative, InitiativeId, InitiativeStatus};
use crate::model::key_result::KeyResultId;
use crate::model::EntityKind;
use rusqlite::{params, Connection, OptionalExtension, Row};

const INITIATIVE_SELECT_SQL: &str = "SELECT
    uuid,
    key_result_uuid,
    title,
    description,
    owner,
    status,
    created_at,
    updated_at
FROM initiatives";

/// Repository interface for initiatives.
pub trait InitiativeRepository {
    /// Inserts an initiative under its active key result.
    fn create_initiative(&self, initiative: &Initiative) -> RepoResult<Initiative>;
    fn update_initiative(&self, initiative: &Initiative) -> RepoResult<Initiative>;
    fn get_initiative(&self, id: InitiativeId) -> RepoResult<Option<Initiative>>;
    /// Lists active initiatives of one key result in insertion order.
    fn list_initiatives(&self, key_result_id: KeyResultId) -> RepoResult<Vec<Initiative>>;
    fn soft_delete_initiative(&self, id: InitiativeId) -> RepoResult<()>;
}

impl InitiativeRepository for SqliteOkrRepository<'_> {
    fn create_initiative(&self, initiative: &Initiative) -> RepoResult<Initiative> {
        initiative.validate()?;

        // Parent check and insert must not interleave with a key result delete.
        let tx = self.immediate_tx()?;
        let parent_exists: i64 = tx.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM key_results
                WHERE uuid = ?1
                  AND is_deleted = 0
            );",
            [initiative.key_result_id.to_string()],
            |row| row.get(0),
        )?;
        if parent_exists != 1 {
            return Err(RepoError::NotFound(
                EntityKind::KeyResult,
                initiative.key_result_id,
            ));
        }

        tx.execute(
            "INSERT INTO initiatives (
                uuid,
                key_result_uuid,
                title,
                description,
                owner,
                status,
                is_deleted
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0);",
            params![
                initiative.id.to_string(),
                initiative.key_result_id.to_string(),
                initiative.title.as_str(),
                initiative.description.as_str(),
                initiative.owner.as_str(),
                initiative.status.as_str(),
            ],
        )?;
        tx.commit()?;

        load_required_initiative(self.conn, initiative.id)
    }

    fn update_initiative(&self, initiative: &Initiative) -> RepoResult<Initiative> {
        initiative.validate()?;

        let changed = self.conn.execute(
            "UPDATE initiatives
             SET
                title = ?2,
                description = ?3,
                owner = ?4,
                status = ?5,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1
               AND is_deleted = 0;",
            params![
                initiative.id.to_string(),
                initiative.title.as_str(),
                initiative.description.as_str(),
                initiative.owner.as_str(),
                initiative.status.as_str(),
            ],
        )?;
        ensure_changed(changed, EntityKind::Initiative, initiative.id)?;

        load_required_initiative(self.conn, initiative.id)
    }

    fn get_initiative(&self, id: InitiativeId) -> RepoResult<Option<Initiative>> {
        let mut stmt = self.conn.prepare(&format!(
            "{INITIATIVE_SELECT_SQL}
             WHERE uuid = ?1
               AND is_deleted = 0;"
        ))?;
        let row = stmt
            .query_row([id.to_string()], |row| Ok(parse_initiative_row(row)))
            .optional()?;
        row.transpose()
    }

    fn list_initiatives(&self, key_result_id: KeyResultId) -> RepoResult<Vec<Initiative>> {
        let mut stmt = self.conn.prepare(&format!(
            "{INITIATIVE_SELECT_SQL}
             WHERE key_result_uuid = ?1
               AND is_deleted = 0
             ORDER BY rowid ASC;"
        ))?;
        let mut rows = stmt.query([key_result_id.to_string()])?;
        let mut initiatives = Vec::new();
        while let Some(row) = rows.next()? {
            initiatives.push(parse_initiative_row(row)?);
        }
        Ok(initiatives)
    }

    fn soft_delete_initiative(&self, id: InitiativeId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE initiatives
             SET
                is_deleted = 1,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1
               AND is_deleted = 0;",
            [id.to_string()],
        )?;
        ensure_changed(changed, EntityKind::Initiative, id)
    }
}

fn load_required_initiative(conn: &Connection, id: InitiativeId) -> RepoResult<Initiative> {
    SqliteOkrRepository { conn }
        .get_initiative(id)?
        .ok_or(RepoError::NotFound(EntityKind::Initiative, id))
}

fn parse_initiative_row(row: &Row<'_>) -> RepoResult<Initiative> {
    let uuid_text: String = row.get("uuid")?;
    let key_result_text: String = row.get("key_result_uuid")?;
    let status_text: String = row.get("status")?;
    let status = InitiativeStatus::parse(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid initiative status `{status_text}` in initiatives.status"
        ))
    })?;

    let initiative = Initiative {
        id: parse_uuid(&uuid_text, "initiatives.uuid")?,
        key_result_id: parse_uuid(&key_result_text, "initiatives.key_result_uuid")?,
        title: row.get("title")?,
        description: row.get("description")?,
        owner: row.get("owner")?,
        status,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    };
    initiative
        .validate()
        .map_err(|err| RepoError::InvalidData(format!("initiative {}: {err}", initiative.id)))?;
    Ok(initiative)
}
