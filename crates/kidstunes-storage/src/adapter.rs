// SPDX-FileCopyrightText: 2026 KidsTunes Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the RequestStore trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use kidstunes_core::{
    AdapterType, HealthStatus, KidsTunesError, PluginAdapter, RequestStatus, RequestStore,
};

use crate::database::Database;
use crate::models::{ApprovalRef, NewRequest, Request, RequestId, RequestUpdate};
use crate::queries;

/// SQLite-backed request store.
///
/// Wraps a [`Database`] handle and delegates all query operations to the
/// typed query modules. The database is lazily opened on the first call to
/// [`SqliteRequestStore::initialize`].
pub struct SqliteRequestStore {
    database_path: String,
    db: OnceCell<Database>,
}

impl SqliteRequestStore {
    /// Create a new store for the database at `database_path`.
    ///
    /// The database connection is not opened until [`initialize`](Self::initialize) is called.
    pub fn new(database_path: impl Into<String>) -> Self {
        Self {
            database_path: database_path.into(),
            db: OnceCell::new(),
        }
    }

    /// Open the database and run migrations. Fails if called twice.
    pub async fn initialize(&self) -> Result<(), KidsTunesError> {
        let db = Database::open(&self.database_path).await?;
        self.db.set(db).map_err(|_| KidsTunesError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.database_path, "SQLite request store initialized");
        Ok(())
    }

    /// Open a store in one step.
    pub async fn open(database_path: impl Into<String>) -> Result<Self, KidsTunesError> {
        let store = Self::new(database_path);
        store.initialize().await?;
        Ok(store)
    }

    /// Checkpoint the WAL so the database file is self-contained.
    pub async fn close(&self) -> Result<(), KidsTunesError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        debug!("WAL checkpoint complete");
        Ok(())
    }

    /// Returns a reference to the underlying Database, or an error if not initialized.
    fn db(&self) -> Result<&Database, KidsTunesError> {
        self.db.get().ok_or_else(|| KidsTunesError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl PluginAdapter for SqliteRequestStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, KidsTunesError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl RequestStore for SqliteRequestStore {
    async fn create(&self, request: &NewRequest) -> Result<RequestId, KidsTunesError> {
        queries::requests::insert(self.db()?, request).await
    }

    async fn get(&self, id: RequestId) -> Result<Option<Request>, KidsTunesError> {
        queries::requests::get(self.db()?, id).await
    }

    async fn get_by_approval_ref(
        &self,
        approval_ref: &ApprovalRef,
    ) -> Result<Option<Request>, KidsTunesError> {
        queries::requests::get_by_approval_ref(self.db()?, approval_ref).await
    }

    async fn get_by_file_path(&self, file_path: &str) -> Result<Vec<Request>, KidsTunesError> {
        queries::requests::get_by_file_path(self.db()?, file_path).await
    }

    async fn list_by_status(&self, status: RequestStatus) -> Result<Vec<Request>, KidsTunesError> {
        queries::requests::list_by_status(self.db()?, status).await
    }

    async fn attach_approval_ref(
        &self,
        id: RequestId,
        approval_ref: &ApprovalRef,
    ) -> Result<bool, KidsTunesError> {
        queries::requests::attach_approval_ref(self.db()?, id, approval_ref).await
    }

    async fn update(&self, id: RequestId, update: &RequestUpdate) -> Result<bool, KidsTunesError> {
        queries::requests::update(self.db()?, id, update).await
    }
}
