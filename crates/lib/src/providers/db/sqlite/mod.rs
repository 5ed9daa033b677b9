use crate::errors::AssistantError;
use std::fmt::{self, Debug};
use tracing::info;
use turso::Database;

pub mod sql;

/// A provider for interacting with a local SQLite database using Turso.
///
/// The `Database` handle is cheap to clone and shared by every request; each
/// unit of work opens its own connection from it. To share an in-memory
/// database between components (e.g., in tests), create one provider with
/// `":memory:"` and clone it.
#[derive(Clone)]
pub struct SqliteProvider {
    pub db: Database,
}

impl SqliteProvider {
    /// Opens or creates the database at `db_path`.
    ///
    /// A leading `sqlite:///` (as found in SQLAlchemy-style URLs) is stripped.
    pub async fn new(db_path: &str) -> Result<Self, AssistantError> {
        let db_path = normalize_database_url(db_path);
        let db = turso::Builder::new_local(db_path)
            .build()
            .await
            .map_err(|e| AssistantError::StorageConnection(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| AssistantError::StorageConnection(e.to_string()))?;
        // PRAGMA returns a row, so it must go through `query`.
        conn.query("PRAGMA journal_mode=WAL;", ())
            .await
            .map_err(|e| AssistantError::StorageConnection(e.to_string()))?;

        info!(path = %db_path, "Opened SQLite database.");
        Ok(Self { db })
    }

    /// Creates every application table that does not exist yet.
    pub async fn initialize_schema(&self) -> Result<(), AssistantError> {
        let conn = self
            .db
            .connect()
            .map_err(|e| AssistantError::StorageConnection(e.to_string()))?;

        for statement in sql::ALL_TABLE_CREATION_SQL {
            conn.execute(statement, ())
                .await
                .map_err(|e| AssistantError::StorageOperationFailed(e.to_string()))?;
        }
        Ok(())
    }
}

impl Debug for SqliteProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteProvider").finish_non_exhaustive()
    }
}

/// Turns `sqlite:///./anti_todo.db` into `./anti_todo.db`.
pub fn normalize_database_url(url: &str) -> &str {
    url.strip_prefix("sqlite:///")
        .or_else(|| url.strip_prefix("sqlite://"))
        .unwrap_or(url)
}
