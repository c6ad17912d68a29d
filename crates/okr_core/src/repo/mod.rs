//! Repository contracts and the SQLite entity store.
//!
//! # Responsibility
//! - Persist objectives, key results and initiatives with parent linkage.
//! - Keep derived progress columns consistent inside every write
//!   transaction.
//!
//! # Invariants
//! - Write paths validate entities and derive progress before SQL runs.
//! - Tombstoned rows (`is_deleted = 1`) are invisible to every read and
//!   count as unknown ids for every write.
//! - Multi-row writes run in one `BEGIN IMMEDIATE` transaction.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::validation::ValidationError;
use crate::model::EntityKind;
use crate::progress;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod initiative_repo;
pub mod key_result_repo;
pub mod objective_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Persistence error for OKR entities.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    Db(DbError),
    /// Id is unknown or tombstoned.
    NotFound(EntityKind, Uuid),
    /// Persisted data cannot be converted into a valid domain entity.
    InvalidData(String),
    /// Connection is not migrated to the schema this binary expects.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(kind, id) => write!(f, "{kind} not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted okr data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "okr repository requires schema version {expected_version}, got {actual_version}"
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(..) | Self::InvalidData(_) | Self::UninitializedConnection { .. } => {
                None
            }
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// SQLite-backed store implementing every OKR repository trait.
///
/// Holds a borrowed connection, so it is cheap to copy into several
/// services sharing one request.
#[derive(Clone, Copy)]
pub struct SqliteOkrRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteOkrRepository<'conn> {
    /// Wraps a connection opened through [`crate::db::open_db`].
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let expected_version = latest_version();
        let actual_version: u32 =
            conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
        if actual_version != expected_version {
            return Err(RepoError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }
        Ok(Self { conn })
    }

    fn immediate_tx(&self) -> RepoResult<Transaction<'conn>> {
        Ok(Transaction::new_unchecked(
            self.conn,
            TransactionBehavior::Immediate,
        )?)
    }
}

/// Re-derives and stores one objective's progress from its active key
/// results. Must run inside the transaction that changed them.
pub(crate) fn recompute_objective_progress(
    conn: &Connection,
    objective_id: Uuid,
) -> RepoResult<f64> {
    let mut stmt = conn.prepare(
        "SELECT progress
         FROM key_results
         WHERE objective_uuid = ?1
           AND is_deleted = 0;",
    )?;
    let values = stmt
        .query_map([objective_id.to_string()], |row| row.get::<_, f64>(0))?
        .collect::<Result<Vec<_>, _>>()?;

    let objective_progress = progress::objective_progress(&values);
    conn.execute(
        "UPDATE objectives
         SET progress = ?2
         WHERE uuid = ?1;",
        rusqlite::params![objective_id.to_string(), objective_progress],
    )?;
    Ok(objective_progress)
}

pub(crate) fn parse_uuid(value: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}

pub(crate) fn ensure_changed(changed: usize, kind: EntityKind, id: Uuid) -> RepoResult<()> {
    if changed == 0 {
        return Err(RepoError::NotFound(kind, id));
    }
    Ok(())
}
