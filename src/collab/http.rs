// collab/http.rs - HTTP adapter for the scribe backend

use super::types::ErrorBody;
use super::{
    AudioPayload, CollabError, GenerationRequest, GenerationResponse, NoteGenerationService, Operation,
    RedactionRequest, RedactionResponse, RedactionService, TranscriptionResponse, TranscriptionService,
};
use crate::config::ServiceConfig;
use async_trait::async_trait;
use reqwest::{multipart, Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

const TRANSCRIBE_PATH: &str = "/api/transcribe";
const GENERATE_PATH: &str = "/api/generate";
const REDACT_PATH: &str = "/api/redact";

/// One client speaking all three service contracts against a single base URL
pub struct HttpCollaborator {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    transcribe_timeout: Duration,
    generate_timeout: Duration,
    redact_timeout: Duration,
}

impl HttpCollaborator {
    pub fn new(config: &ServiceConfig) -> Result<Self, CollabError> {
        let client = Client::builder()
            .build()
            .map_err(|e| CollabError::ProviderError(format!("Failed to create HTTP client: {}", e)))?;

        tracing::info!("HTTP collaborator initialized: base_url={}", config.base_url);

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            transcribe_timeout: config.transcribe_timeout,
            generate_timeout: config.generate_timeout,
            redact_timeout: config.redact_timeout,
        })
    }

    fn post(&self, path: &str, timeout: Duration) -> RequestBuilder {
        let request = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .timeout(timeout);
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(
        request: RequestBuilder,
        operation: Operation,
    ) -> Result<T, CollabError> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                CollabError::TimeoutError
            } else {
                CollabError::NetworkError(e.to_string())
            }
        })?;
        Self::read_json(response, operation).await
    }

    async fn read_json<T: DeserializeOwned>(
        response: Response,
        operation: Operation,
    ) -> Result<T, CollabError> {
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| CollabError::NetworkError(e.to_string()))?;
        decode_body(status, &body, operation)
    }
}

/// Map a status and body to the typed response or a [`CollabError`]
fn decode_body<T: DeserializeOwned>(status: StatusCode, body: &[u8], operation: Operation) -> Result<T, CollabError> {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => return Err(CollabError::AuthenticationError),
        StatusCode::TOO_MANY_REQUESTS => return Err(CollabError::RateLimitError),
        _ => {}
    }

    // The PII signal wins whatever the status, so it is never read as a note
    let error: ErrorBody = serde_json::from_slice(body).unwrap_or_default();
    if error.is_pii_detected() {
        return Err(CollabError::PiiDetected);
    }

    if !status.is_success() {
        return Err(CollabError::ProviderError(format!("HTTP {}", status)));
    }

    // Parse errors are reported by kind only; the body is patient text.
    serde_json::from_slice::<T>(body).map_err(|e| {
        CollabError::InvalidResponse(format!(
            "{} body rejected ({:?} at line {}, column {})",
            operation.as_str(),
            e.classify(),
            e.line(),
            e.column()
        ))
    })
}

#[async_trait]
impl TranscriptionService for HttpCollaborator {
    async fn transcribe(&self, audio: &AudioPayload) -> Result<TranscriptionResponse, CollabError> {
        if audio.bytes.is_empty() {
            return Err(CollabError::ProviderError("Empty audio".to_string()));
        }

        tracing::info!("Transcription request: {} bytes ({})", audio.bytes.len(), audio.mime_type);

        let file_part = multipart::Part::bytes(audio.bytes.clone())
            .file_name(audio.file_name.clone())
            .mime_str(&audio.mime_type)
            .map_err(|e| CollabError::ProviderError(e.to_string()))?;
        let form = multipart::Form::new().part("file", file_part);

        let request = self.post(TRANSCRIBE_PATH, self.transcribe_timeout).multipart(form);
        let response: TranscriptionResponse = Self::send(request, Operation::Transcribe).await?;
        response.validate()
    }

    fn name(&self) -> &str {
        "http"
    }
}

#[async_trait]
impl NoteGenerationService for HttpCollaborator {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, CollabError> {
        tracing::info!(
            "Generation request: {} chars, {} segments, enforce_redaction={}",
            request.transcript.chars().count(),
            request.segments.as_ref().map_or(0, Vec::len),
            request.enforce_redaction
        );

        let http_request = self.post(GENERATE_PATH, self.generate_timeout).json(request);
        let response: GenerationResponse = Self::send(http_request, Operation::Generate).await?;
        response.validate()
    }

    fn name(&self) -> &str {
        "http"
    }
}

#[async_trait]
impl RedactionService for HttpCollaborator {
    async fn redact(&self, request: &RedactionRequest) -> Result<RedactionResponse, CollabError> {
        tracing::info!("Redaction request: {} chars", request.text.chars().count());

        let http_request = self.post(REDACT_PATH, self.redact_timeout).json(request);
        Self::send(http_request, Operation::Redact).await
    }

    fn name(&self) -> &str {
        "http"
    }
}
