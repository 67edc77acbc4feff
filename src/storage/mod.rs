// storage/mod.rs - Host key-value storage and the typed entries the session keeps

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::evidence::TranscriptSegment;
use crate::privacy::PrivacyPolicy;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const POLICY_KEY: &str = "scribe.privacyPolicy";
pub const TRANSCRIPT_KEY: &str = "scribe.lastTranscript";
pub const SEGMENTS_KEY: &str = "scribe.lastSegments";
pub const TASKS_KEY: &str = "scribe.lastTasks";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to serialize {0}")]
    Serialization(String),

    #[error("Invalid storage key: {0:?}")]
    InvalidKey(String),
}

/// Minimal string store supplied by the host
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Last generated task list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskList {
    pub session_id: String,
    /// RFC 3339
    pub generated_at: String,
    pub tasks: Vec<String>,
}

/// Read a JSON entry. Unreadable JSON is logged and treated as absent so a
/// stale shape never wedges startup.
fn load_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Result<Option<T>, StorageError> {
    let Some(raw) = store.get(key)? else {
        return Ok(None);
    };
    match serde_json::from_str::<T>(&raw) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            tracing::warn!(
                "Ignoring unreadable entry {} ({:?} at line {}, column {})",
                key,
                e.classify(),
                e.line(),
                e.column()
            );
            Ok(None)
        }
    }
}

fn save_json<T: Serialize>(store: &dyn KeyValueStore, key: &str, value: &T) -> Result<(), StorageError> {
    let json = serde_json::to_string(value).map_err(|_| StorageError::Serialization(key.to_string()))?;
    store.set(key, &json)
}

pub fn load_policy(store: &dyn KeyValueStore) -> Result<PrivacyPolicy, StorageError> {
    Ok(load_json(store, POLICY_KEY)?.unwrap_or_default())
}

pub fn save_policy(store: &dyn KeyValueStore, policy: &PrivacyPolicy) -> Result<(), StorageError> {
    save_json(store, POLICY_KEY, policy)
}

pub fn load_transcript(store: &dyn KeyValueStore) -> Result<Option<String>, StorageError> {
    load_json(store, TRANSCRIPT_KEY)
}

pub fn load_segments(store: &dyn KeyValueStore) -> Result<Vec<TranscriptSegment>, StorageError> {
    Ok(load_json(store, SEGMENTS_KEY)?.unwrap_or_default())
}

pub fn load_tasks(store: &dyn KeyValueStore) -> Result<Option<TaskList>, StorageError> {
    load_json(store, TASKS_KEY)
}

/// Store the transcript and its segments, or clear them under an
/// ephemeral policy
pub fn save_transcript(
    store: &dyn KeyValueStore,
    policy: &PrivacyPolicy,
    transcript: &str,
    segments: &[TranscriptSegment],
) -> Result<(), StorageError> {
    if policy.ephemeral {
        store.remove(TRANSCRIPT_KEY)?;
        return store.remove(SEGMENTS_KEY);
    }
    save_json(store, TRANSCRIPT_KEY, &transcript)?;
    save_json(store, SEGMENTS_KEY, &segments)
}

pub fn save_tasks(store: &dyn KeyValueStore, policy: &PrivacyPolicy, tasks: &TaskList) -> Result<(), StorageError> {
    if policy.ephemeral {
        return store.remove(TASKS_KEY);
    }
    save_json(store, TASKS_KEY, tasks)
}

/// Drop everything derived from patient speech. The policy stays.
pub fn clear_session_data(store: &dyn KeyValueStore) -> Result<(), StorageError> {
    store.remove(TRANSCRIPT_KEY)?;
    store.remove(SEGMENTS_KEY)?;
    store.remove(TASKS_KEY)
}
