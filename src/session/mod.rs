use crate::collab::{
    AudioPayload, CollabError, ExtractedEntity, GenerationRequest, HttpCollaborator,
    NoteGenerationService, Operation, RedactionRequest, RedactionResponse, RedactionService,
    TranscriptionService,
};
use crate::config::ServiceConfig;
use crate::evidence::{self, GenerationSnapshot, NoteEvidence, StructuredNote, TranscriptSegment};
use crate::privacy::{self, Channel, GateAction, GateDecision, PhiFinding, PrivacyPolicy};
use crate::storage::{self, KeyValueStore, StorageError, TaskList};
use crate::tasks;
use chrono::Utc;
use serde::Serialize;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

pub mod sequencer;

pub use sequencer::{InFlight, RequestSequencer};

/// The three remote collaborators a session talks to
#[derive(Clone)]
pub struct Services {
    pub transcriber: Arc<dyn TranscriptionService>,
    pub generator: Arc<dyn NoteGenerationService>,
    pub redactor: Arc<dyn RedactionService>,
}

impl Services {
    /// All three contracts served by one backend
    pub fn http(config: &ServiceConfig) -> Result<Self, CollabError> {
        let client = Arc::new(HttpCollaborator::new(config)?);
        Ok(Self {
            transcriber: client.clone(),
            generator: client.clone(),
            redactor: client,
        })
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("A note is already being generated")]
    Busy,

    #[error("Response to {} request #{ticket} superseded", .operation.as_str())]
    Stale { operation: Operation, ticket: u64 },

    #[error("Outbound text blocked by privacy policy")]
    Blocked,

    #[error("Transcript is empty")]
    EmptyTranscript,

    #[error("{} failed: {source}", .operation.as_str())]
    Collab {
        operation: Operation,
        #[source]
        source: CollabError,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl SessionError {
    fn collab(operation: Operation) -> impl FnOnce(CollabError) -> SessionError {
        move |source| SessionError::Collab { operation, source }
    }

    /// True for results the caller should silently drop
    pub fn is_stale(&self) -> bool {
        matches!(self, SessionError::Stale { .. })
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            SessionError::Busy => "A note is already being generated.",
            SessionError::Stale { .. } => "This result was replaced by a newer request.",
            SessionError::Blocked => {
                "Identifying details were found. Remove them or allow redacted sending before continuing."
            }
            SessionError::EmptyTranscript => "There is no transcript to send yet.",
            SessionError::Collab { operation, source } => source.user_message(*operation),
            SessionError::Storage(_) => "Local storage is unavailable. Changes were not saved.",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptionOutcome {
    pub transcript: String,
    pub segments: Vec<TranscriptSegment>,
    pub warnings: Vec<String>,
}

/// A generated note together with exactly what was sent to produce it
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedNote {
    pub sequence: u64,
    pub action: GateAction,
    pub note: StructuredNote,
    pub snapshot: GenerationSnapshot,
    pub entities: Vec<ExtractedEntity>,
    pub warnings: Vec<String>,
    pub tasks: Vec<String>,
}

struct SessionState {
    policy: PrivacyPolicy,
    transcript: String,
    segments: Vec<TranscriptSegment>,
    last_note: Option<GeneratedNote>,
}

/// Host-facing coordinator. Nothing leaves the device without passing the
/// gate, and each note keeps the snapshot it was generated from.
pub struct ScribeSession {
    id: String,
    services: Services,
    store: Arc<dyn KeyValueStore>,
    transcribe_timeout: Duration,
    generate_timeout: Duration,
    redact_timeout: Duration,
    transcribe_seq: RequestSequencer,
    // Only one generation runs at a time, so this numbers notes and never
    // marks one stale.
    generate_seq: RequestSequencer,
    redact_seq: RequestSequencer,
    generating: InFlight,
    state: Mutex<SessionState>,
}

impl ScribeSession {
    /// Restore policy and last transcript from `store`
    pub fn new(
        config: &ServiceConfig,
        services: Services,
        store: Arc<dyn KeyValueStore>,
    ) -> Result<Self, SessionError> {
        let policy = storage::load_policy(store.as_ref())?;
        let (transcript, segments) = if policy.ephemeral {
            (String::new(), Vec::new())
        } else {
            (
                storage::load_transcript(store.as_ref())?.unwrap_or_default(),
                storage::load_segments(store.as_ref())?,
            )
        };

        let id = Uuid::new_v4().to_string();
        tracing::info!(
            "Session {} started: hard_gate={}, send_redacted={}, ephemeral={}, restored {} chars",
            id,
            policy.hard_gate_enabled,
            policy.send_redacted_externally,
            policy.ephemeral,
            transcript.chars().count()
        );

        Ok(Self {
            id,
            services,
            store,
            transcribe_timeout: config.transcribe_timeout,
            generate_timeout: config.generate_timeout,
            redact_timeout: config.redact_timeout,
            transcribe_seq: RequestSequencer::new(),
            generate_seq: RequestSequencer::new(),
            redact_seq: RequestSequencer::new(),
            generating: InFlight::default(),
            state: Mutex::new(SessionState {
                policy,
                transcript,
                segments,
                last_note: None,
            }),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn policy(&self) -> PrivacyPolicy {
        self.state().policy
    }

    /// Apply a user toggle. Switching to ephemeral wipes stored session data.
    pub fn update_policy(&self, policy: PrivacyPolicy) -> Result<(), SessionError> {
        self.state().policy = policy;
        tracing::info!(
            "Session {} policy: hard_gate={}, send_redacted={}, ephemeral={}",
            self.id,
            policy.hard_gate_enabled,
            policy.send_redacted_externally,
            policy.ephemeral
        );

        storage::save_policy(self.store.as_ref(), &policy)?;
        if policy.ephemeral {
            storage::clear_session_data(self.store.as_ref())?;
        }
        Ok(())
    }

    pub fn transcript(&self) -> String {
        self.state().transcript.clone()
    }

    pub fn segments(&self) -> Vec<TranscriptSegment> {
        self.state().segments.clone()
    }

    /// Replace the live transcript, e.g. after a manual edit
    pub fn set_transcript(
        &self,
        transcript: impl Into<String>,
        segments: Vec<TranscriptSegment>,
    ) -> Result<(), SessionError> {
        let transcript = transcript.into();
        let policy = {
            let mut state = self.state();
            state.transcript = transcript.clone();
            state.segments = segments.clone();
            state.policy
        };
        storage::save_transcript(self.store.as_ref(), &policy, &transcript, &segments)?;
        Ok(())
    }

    /// Findings for the live transcript, recomputed on every call
    pub fn findings(&self) -> Vec<PhiFinding> {
        privacy::detect(&self.state().transcript)
    }

    /// What generation would send right now. Segment texts are scanned
    /// too, since they travel in the same request.
    pub fn preview_outbound(&self) -> GateDecision {
        let state = self.state();
        gate_with_segments(&state.policy, &state.transcript, &state.segments)
    }

    pub fn last_note(&self) -> Option<GeneratedNote> {
        self.state().last_note.clone()
    }

    pub fn is_generating(&self) -> bool {
        self.generating.is_busy()
    }

    pub async fn transcribe(&self, audio: &AudioPayload) -> Result<TranscriptionOutcome, SessionError> {
        let ticket = self.transcribe_seq.issue();
        tracing::info!("Session {}: transcription #{} ({} bytes)", self.id, ticket, audio.bytes.len());

        let response = with_timeout(self.transcribe_timeout, self.services.transcriber.transcribe(audio))
            .await
            .map_err(|e| {
                tracing::warn!("Session {}: transcription #{} failed: {:?}", self.id, ticket, e);
                SessionError::collab(Operation::Transcribe)(e)
            })?
            .validate()
            .map_err(SessionError::collab(Operation::Transcribe))?;

        if !self.transcribe_seq.is_current(ticket) {
            tracing::info!("Session {}: dropping stale transcription #{}", self.id, ticket);
            return Err(SessionError::Stale {
                operation: Operation::Transcribe,
                ticket,
            });
        }

        let outcome = TranscriptionOutcome {
            transcript: response.transcript,
            segments: response.segments.unwrap_or_default(),
            warnings: response.warnings.unwrap_or_default(),
        };
        tracing::info!(
            "Session {}: transcription #{} done: {} chars, {} segments",
            self.id,
            ticket,
            outcome.transcript.chars().count(),
            outcome.segments.len()
        );

        self.set_transcript(outcome.transcript.clone(), outcome.segments.clone())?;
        Ok(outcome)
    }

    /// Send whatever the gate allows and keep the result alongside a
    /// frozen copy of what was sent
    pub async fn generate_note(&self) -> Result<GeneratedNote, SessionError> {
        let Some(_guard) = self.generating.try_begin() else {
            return Err(SessionError::Busy);
        };
        let ticket = self.generate_seq.issue();

        let (policy, transcript, segments) = {
            let state = self.state();
            (state.policy, state.transcript.clone(), state.segments.clone())
        };
        if transcript.trim().is_empty() {
            return Err(SessionError::EmptyTranscript);
        }

        let decision = gate_with_segments(&policy, &transcript, &segments);
        let outbound_segments: Vec<TranscriptSegment> = match decision.action {
            GateAction::Blocked => {
                tracing::warn!("Session {}: generation #{} blocked by policy", self.id, ticket);
                return Err(SessionError::Blocked);
            }
            GateAction::Raw => segments,
            GateAction::Redacted => segments
                .into_iter()
                .map(|seg| TranscriptSegment {
                    text: privacy::redact(&seg.text),
                    ..seg
                })
                .collect(),
        };

        let snapshot = GenerationSnapshot {
            transcript: decision.payload,
            segments: outbound_segments,
        };
        let request = GenerationRequest {
            transcript: snapshot.transcript.clone(),
            segments: (!snapshot.segments.is_empty()).then(|| snapshot.segments.clone()),
            enforce_redaction: policy.hard_gate_enabled,
        };

        tracing::info!(
            "Session {}: generation #{} sending {} chars as {:?} via {}",
            self.id,
            ticket,
            request.transcript.chars().count(),
            decision.action,
            self.services.generator.name()
        );

        let response = with_timeout(self.generate_timeout, self.services.generator.generate(&request))
            .await
            .map_err(|e| {
                tracing::warn!("Session {}: generation #{} failed: {:?}", self.id, ticket, e);
                SessionError::collab(Operation::Generate)(e)
            })?
            .validate()
            .map_err(SessionError::collab(Operation::Generate))?;

        let tasks = tasks::to_tasks(&response.note.plan);
        let generated = GeneratedNote {
            sequence: ticket,
            action: decision.action,
            note: response.note,
            snapshot,
            entities: response.entities.unwrap_or_default(),
            warnings: response.warnings.unwrap_or_default(),
            tasks,
        };

        let stats = evidence::evidence_stats(&generated.note.evidence);
        tracing::info!(
            "Session {}: generation #{} done: {} evidence ({} verified), {} tasks",
            self.id,
            ticket,
            stats.total,
            stats.verified_count,
            generated.tasks.len()
        );

        self.state().last_note = Some(generated.clone());

        let task_list = TaskList {
            session_id: self.id.clone(),
            generated_at: Utc::now().to_rfc3339(),
            tasks: generated.tasks.clone(),
        };
        let policy = self.policy();
        storage::save_tasks(self.store.as_ref(), &policy, &task_list)?;

        Ok(generated)
    }

    /// Server-side redaction, gated like generation
    pub async fn redact_remote(&self, text: &str) -> Result<RedactionResponse, SessionError> {
        let ticket = self.redact_seq.issue();
        let decision = privacy::preview(&self.policy(), text, Channel::External);
        if decision.is_blocked() {
            tracing::warn!("Session {}: redaction #{} blocked by policy", self.id, ticket);
            return Err(SessionError::Blocked);
        }

        let request = RedactionRequest {
            text: decision.payload,
        };
        let response = with_timeout(self.redact_timeout, self.services.redactor.redact(&request))
            .await
            .map_err(|e| {
                tracing::warn!("Session {}: redaction #{} failed: {:?}", self.id, ticket, e);
                SessionError::collab(Operation::Redact)(e)
            })?;

        if !self.redact_seq.is_current(ticket) {
            return Err(SessionError::Stale {
                operation: Operation::Redact,
                ticket,
            });
        }
        Ok(response)
    }

    /// Per-line evidence for a generated note, always resolved against the
    /// snapshot it was generated from
    pub fn annotate_note(&self, generated: &GeneratedNote) -> NoteEvidence {
        evidence::annotate(&generated.note, &generated.snapshot)
    }

    /// Forget the transcript, segments, last note and stored task list
    pub fn clear(&self) -> Result<(), SessionError> {
        {
            let mut state = self.state();
            state.transcript.clear();
            state.segments.clear();
            state.last_note = None;
        }
        storage::clear_session_data(self.store.as_ref())?;
        tracing::info!("Session {} cleared", self.id);
        Ok(())
    }
}

fn gate_with_segments(policy: &PrivacyPolicy, transcript: &str, segments: &[TranscriptSegment]) -> GateDecision {
    let texts: Vec<&str> = segments.iter().map(|seg| seg.text.as_str()).collect();
    privacy::preview_with(policy, transcript, &texts, Channel::External)
}

async fn with_timeout<T, F>(timeout: Duration, call: F) -> Result<T, CollabError>
where
    F: Future<Output = Result<T, CollabError>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(CollabError::TimeoutError),
    }
}
