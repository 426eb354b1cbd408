//! Key/value persistence for character state.
//!
//! The durable layout is four string-encoded entries: `level` and
//! `phrenicPool` as decimal text, the two id sets as JSON arrays.
//! Writes replace the whole state; loads fail soft, falling back to
//! defaults rather than surfacing errors to the player.

use crate::state::{CharacterState, MAX_LEVEL, MIN_LEVEL};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tokio::sync::Mutex;

/// Storage key for the character level (decimal text).
pub const KEY_LEVEL: &str = "level";

/// Storage key for the current pool (decimal text).
pub const KEY_PHRENIC_POOL: &str = "phrenicPool";

/// Storage key for the activated spell ids (JSON array of strings).
pub const KEY_ACTIVATED_SPELLS: &str = "activatedSpellIds";

/// Storage key for the active amplification ids (JSON array of strings).
pub const KEY_ACTIVE_AMPLIFICATIONS: &str = "activeAmplificationIds";

/// Errors from the storage layer. Both are recoverable: reads fall
/// back to defaults, writes are logged and the in-memory state stands.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage read failed: {0}")]
    Read(String),

    #[error("storage write failed: {0}")]
    Write(String),
}

/// Durable key/value storage the tracker loads from at startup and
/// writes to after every state transition.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Read every stored entry. An empty map means a fresh start.
    async fn read_all(&self) -> Result<HashMap<String, String>, StorageError>;

    /// Replace the stored entries as one logical batch.
    async fn write_all(&self, entries: HashMap<String, String>) -> Result<(), StorageError>;
}

// ============================================================================
// Encoding
// ============================================================================

/// Encode state into the persisted key/value layout.
pub fn encode_state(state: &CharacterState) -> HashMap<String, String> {
    let mut entries = HashMap::new();
    entries.insert(KEY_LEVEL.to_string(), state.level.to_string());
    entries.insert(
        KEY_PHRENIC_POOL.to_string(),
        state.phrenic_pool.to_string(),
    );
    entries.insert(
        KEY_ACTIVATED_SPELLS.to_string(),
        encode_id_set(&state.activated_spells),
    );
    entries.insert(
        KEY_ACTIVE_AMPLIFICATIONS.to_string(),
        encode_id_set(&state.active_amplifications),
    );
    entries
}

/// Decode persisted entries into state, failing soft on every field:
/// a missing or unparseable level defaults to 1, a missing pool to the
/// level's capacity, malformed id sets to empty, and everything is
/// clamped and filtered against the catalog afterward.
pub fn decode_state(entries: &HashMap<String, String>) -> CharacterState {
    let level = entries
        .get(KEY_LEVEL)
        .and_then(|raw| raw.trim().parse::<i64>().ok())
        .map(|n| n.clamp(MIN_LEVEL as i64, MAX_LEVEL as i64) as u8)
        .unwrap_or(MIN_LEVEL);

    let capacity = crate::rules::pool_capacity(level);
    let phrenic_pool = entries
        .get(KEY_PHRENIC_POOL)
        .and_then(|raw| raw.trim().parse::<i64>().ok())
        .map(|n| n.clamp(0, capacity as i64) as u8)
        .unwrap_or(capacity);

    let mut state = CharacterState {
        level,
        phrenic_pool,
        activated_spells: decode_id_set(entries.get(KEY_ACTIVATED_SPELLS)),
        active_amplifications: decode_id_set(entries.get(KEY_ACTIVE_AMPLIFICATIONS)),
    };
    state.sanitize();
    state
}

fn encode_id_set(ids: &std::collections::HashSet<String>) -> String {
    // Sorted so repeated saves of the same state write identical bytes.
    let mut sorted: Vec<&String> = ids.iter().collect();
    sorted.sort();
    serde_json::to_string(&sorted).unwrap_or_else(|_| "[]".to_string())
}

fn decode_id_set(raw: Option<&String>) -> std::collections::HashSet<String> {
    raw.and_then(|value| serde_json::from_str(value).ok())
        .unwrap_or_default()
}

// ============================================================================
// File-backed storage
// ============================================================================

/// Storage backed by a single JSON-object file, rewritten whole on
/// every save.
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl Storage for FileStorage {
    async fn read_all(&self) -> Result<HashMap<String, String>, StorageError> {
        match fs::read_to_string(&self.path).await {
            Ok(content) => {
                serde_json::from_str(&content).map_err(|err| StorageError::Read(err.to_string()))
            }
            // No file yet is a fresh start, not a failure.
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(err) => Err(StorageError::Read(err.to_string())),
        }
    }

    async fn write_all(&self, entries: HashMap<String, String>) -> Result<(), StorageError> {
        let content = serde_json::to_string_pretty(&entries)
            .map_err(|err| StorageError::Write(err.to_string()))?;
        fs::write(&self.path, content)
            .await
            .map_err(|err| StorageError::Write(err.to_string()))
    }
}

// ============================================================================
// In-memory storage
// ============================================================================

/// Storage that lives and dies with the process. Used by tests and by
/// ephemeral sessions that don't want a save file.
#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the stored entries, for inspection in tests.
    pub async fn snapshot(&self) -> HashMap<String, String> {
        self.entries.lock().await.clone()
    }

    /// Seed an entry, bypassing the normal write path.
    pub async fn insert(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn read_all(&self) -> Result<HashMap<String, String>, StorageError> {
        Ok(self.entries.lock().await.clone())
    }

    async fn write_all(&self, entries: HashMap<String, String>) -> Result<(), StorageError> {
        *self.entries.lock().await = entries;
        Ok(())
    }
}
