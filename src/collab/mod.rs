// collab/mod.rs - Contracts for the remote transcription, note and redaction services

mod http;
mod types;

pub use http::HttpCollaborator;
pub use types::{
    AudioPayload, CollabError, ExtractedEntity, GenerationRequest, GenerationResponse, Operation,
    RedactionRequest, RedactionResponse, TranscriptionResponse, PII_DETECTED_CODE,
};

use async_trait::async_trait;

#[async_trait]
pub trait TranscriptionService: Send + Sync {
    /// Transcribe recorded audio. The response is already validated.
    async fn transcribe(&self, audio: &AudioPayload) -> Result<TranscriptionResponse, CollabError>;

    /// Get provider name
    fn name(&self) -> &str;
}

#[async_trait]
pub trait NoteGenerationService: Send + Sync {
    /// Generate a structured note. Returns [`CollabError::PiiDetected`]
    /// when `enforce_redaction` was set and the service found identifiers.
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, CollabError>;

    fn name(&self) -> &str;
}

#[async_trait]
pub trait RedactionService: Send + Sync {
    async fn redact(&self, request: &RedactionRequest) -> Result<RedactionResponse, CollabError>;

    fn name(&self) -> &str;
}
