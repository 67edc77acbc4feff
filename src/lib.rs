pub mod collab;
pub mod config;
pub mod evidence;
pub mod privacy;
pub mod session;
pub mod storage;
pub mod tasks;

pub use config::{ConfigError, ServiceConfig};
pub use evidence::{annotate, resolve, stamp, EvidenceRecord, StructuredNote, TranscriptSegment};
pub use privacy::{decide, detect, preview, redact, Channel, GateAction, GateDecision, PhiFinding, PrivacyPolicy};
pub use session::{GeneratedNote, ScribeSession, Services, SessionError};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
pub use tasks::to_tasks;
