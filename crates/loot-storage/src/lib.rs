pub mod config;
pub mod kv;
pub mod payloads;
pub mod shared;
pub mod sqlite;

use loot_core::LootError;
use thiserror::Error;

pub use config::{config_path, load_config, TrackerConfig, DEFAULT_ITEM_LINK_BASE};
pub use kv::{KvStore, MemoryStore};
pub use payloads::{ImportMode, ImportOutcome, ImportReport, PayloadStore, PAYLOADS_KEY};
pub use shared::{fetch_shared, FetchError, SharedSource};
pub use sqlite::{SqliteStore, KV_SCHEMA_VERSION};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Payload(#[from] LootError),
    #[error("unsupported schema version {found}, max supported {supported}")]
    UnsupportedSchemaVersion { found: i64, supported: i64 },
}

/// Payload store over the SQLite database at `path`.
pub fn open_payload_store(
    path: impl AsRef<std::path::Path>,
) -> Result<PayloadStore<SqliteStore>, StorageError> {
    Ok(PayloadStore::new(SqliteStore::open(path)?))
}
