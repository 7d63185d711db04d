//! Session persistence as four independently keyed JSON records.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tally_core::{CategoryRule, Statement, StatementId, Transaction};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

use crate::db::{self, DbPool};

pub const TRANSACTIONS_KEY: &str = "transactions";
pub const STATEMENTS_KEY: &str = "statements";
pub const RULES_KEY: &str = "rules";
pub const UI_STATE_KEY: &str = "ui_state";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Failed to serialize '{key}': {source}")]
    Serialize {
        key: String,
        source: serde_json::Error,
    },
    #[error("Stored record '{key}' is corrupt: {source}")]
    Corrupt {
        key: String,
        source: serde_json::Error,
    },
}

/// Presentation state that survives restarts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiState {
    #[serde(default = "default_tab")]
    pub active_tab: String,
    #[serde(default)]
    pub selected_statement_id: Option<StatementId>,
}

fn default_tab() -> String {
    "upload".to_string()
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            active_tab: default_tab(),
            selected_statement_id: None,
        }
    }
}

/// Key-value persistence for a session. Implementors provide raw string
/// access; the typed record methods are shared.
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    async fn put(&self, key: &str, value: String) -> Result<(), StorageError>;

    async fn load_transactions(&self) -> Result<Vec<Transaction>, StorageError> {
        Ok(load_json(self, TRANSACTIONS_KEY).await?.unwrap_or_default())
    }

    async fn save_transactions(&self, transactions: &[Transaction]) -> Result<(), StorageError> {
        save_json(self, TRANSACTIONS_KEY, transactions).await
    }

    async fn load_statements(&self) -> Result<Vec<Statement>, StorageError> {
        Ok(load_json(self, STATEMENTS_KEY).await?.unwrap_or_default())
    }

    async fn save_statements(&self, statements: &[Statement]) -> Result<(), StorageError> {
        save_json(self, STATEMENTS_KEY, statements).await
    }

    async fn load_rules(&self) -> Result<Vec<CategoryRule>, StorageError> {
        Ok(load_json(self, RULES_KEY).await?.unwrap_or_default())
    }

    async fn save_rules(&self, rules: &[CategoryRule]) -> Result<(), StorageError> {
        save_json(self, RULES_KEY, rules).await
    }

    async fn load_ui_state(&self) -> Result<UiState, StorageError> {
        Ok(load_json(self, UI_STATE_KEY).await?.unwrap_or_default())
    }

    async fn save_ui_state(&self, state: &UiState) -> Result<(), StorageError> {
        save_json(self, UI_STATE_KEY, state).await
    }
}

async fn load_json<T, S>(store: &S, key: &str) -> Result<Option<T>, StorageError>
where
    T: DeserializeOwned,
    S: StateStore + ?Sized,
{
    let Some(raw) = store.get(key).await? else {
        debug!(key, "no stored record");
        return Ok(None);
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|source| StorageError::Corrupt {
            key: key.to_string(),
            source,
        })
}

async fn save_json<T, S>(store: &S, key: &str, value: &T) -> Result<(), StorageError>
where
    T: Serialize + Sync + ?Sized,
    S: StateStore + ?Sized,
{
    let raw = serde_json::to_string(value).map_err(|source| StorageError::Serialize {
        key: key.to_string(),
        source,
    })?;
    store.put(key, raw).await
}

// ── SQLite ────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct SqliteStore {
    pool: DbPool,
}

impl SqliteStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Open (creating if needed) the database at `path`.
    pub async fn open(path: &Path) -> Result<Self, StorageError> {
        Ok(Self::new(db::create_db(path).await?))
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl StateStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(db::get_record(&self.pool, key).await?)
    }

    async fn put(&self, key: &str, value: String) -> Result<(), StorageError> {
        Ok(db::put_record(&self.pool, key, &value).await?)
    }
}

// ── In-memory ─────────────────────────────────────────────────────────────────

/// Non-persistent store for tests and throwaway sessions.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.records.lock().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: String) -> Result<(), StorageError> {
        self.records.lock().await.insert(key.to_string(), value);
        Ok(())
    }
}
