pub mod db;
pub mod store;

pub use db::{create_db, DbPool};
pub use store::{
    MemoryStore, SqliteStore, StateStore, StorageError, UiState, RULES_KEY, STATEMENTS_KEY,
    TRANSACTIONS_KEY, UI_STATE_KEY,
};
