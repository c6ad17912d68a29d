//! Shared request state.
//!
//! One SQLite connection sits behind a mutex. Storage work runs on the
//! blocking thread pool and holds the lock for its whole
//! read-modify-recompute cycle.

use crate::error::ApiError;
use crate::generator::OkrGenerator;
use okr_core::{DashboardService, OkrService, SqliteOkrRepository};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct AppState {
    db: Arc<Mutex<Connection>>,
    generator: Arc<dyn OkrGenerator>,
}

impl AppState {
    /// Wraps an already migrated connection.
    pub fn new(conn: Connection, generator: Arc<dyn OkrGenerator>) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
            generator,
        }
    }

    pub fn generator(&self) -> &dyn OkrGenerator {
        self.generator.as_ref()
    }

    /// Runs `f` against the command service while holding the storage lock.
    pub async fn with_okr_service<T, F>(&self, f: F) -> Result<T, ApiError>
    where
        F: FnOnce(&OkrService<SqliteOkrRepository<'_>>) -> Result<T, ApiError> + Send + 'static,
        T: Send + 'static,
    {
        self.with_repo(move |repo| f(&OkrService::new(repo))).await
    }

    pub async fn with_dashboard_service<T, F>(&self, f: F) -> Result<T, ApiError>
    where
        F: FnOnce(&DashboardService<SqliteOkrRepository<'_>>) -> Result<T, ApiError>
            + Send
            + 'static,
        T: Send + 'static,
    {
        self.with_repo(move |repo| f(&DashboardService::new(repo))).await
    }

    async fn with_repo<T, F>(&self, f: F) -> Result<T, ApiError>
    where
        F: FnOnce(SqliteOkrRepository<'_>) -> Result<T, ApiError> + Send + 'static,
        T: Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            let conn = db
                .lock()
                .map_err(|_| ApiError::Internal("storage lock poisoned".to_string()))?;
            let repo = SqliteOkrRepository::try_new(&conn)?;
            f(repo)
        })
        .await
        .map_err(|err| ApiError::Internal(format!("storage task failed: {err}")))?
    }
}
