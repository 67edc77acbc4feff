// collab/types.rs - Collaborator contracts and error definitions

use crate::evidence::{StructuredNote, TranscriptSegment};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error code the generation service returns when enforcement was
/// requested and its own detector fired
pub const PII_DETECTED_CODE: &str = "PII_DETECTED";

/// User-facing operation, used to pick the generic failure message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Transcribe,
    Generate,
    Redact,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Transcribe => "transcribe",
            Operation::Generate => "generate",
            Operation::Redact => "redact",
        }
    }
}

/// Collaborator error types with retry classification
#[derive(Debug, Error)]
pub enum CollabError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    TimeoutError,

    #[error("Authentication failed")]
    AuthenticationError,

    #[error("Rate limit exceeded")]
    RateLimitError,

    #[error("Identifiers detected by the service")]
    PiiDetected,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Provider error: {0}")]
    ProviderError(String),
}

impl CollabError {
    /// Returns true if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CollabError::NetworkError(_) | CollabError::TimeoutError | CollabError::RateLimitError
        )
    }

    /// The only text a user sees for a failed call. Causes stay in logs.
    pub fn user_message(&self, operation: Operation) -> &'static str {
        if matches!(self, CollabError::PiiDetected) {
            return "The note service found identifying details in the transcript. Redact them and try again.";
        }
        match operation {
            Operation::Transcribe => "Transcription failed. Please try again.",
            Operation::Generate => "Note generation failed. Please try again.",
            Operation::Redact => "Redaction failed. Please try again.",
        }
    }
}

/// Recorded audio handed to the transcription service
#[derive(Debug, Clone)]
pub struct AudioPayload {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub file_name: String,
}

impl AudioPayload {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
            file_name: "audio.webm".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptionResponse {
    pub transcript: String,
    #[serde(default)]
    pub segments: Option<Vec<TranscriptSegment>>,
    #[serde(default)]
    pub warnings: Option<Vec<String>>,
}

impl TranscriptionResponse {
    /// Reject the whole payload if any segment breaks the contract
    pub fn validate(self) -> Result<Self, CollabError> {
        if let Some(segments) = &self.segments {
            validate_segments(segments)?;
        }
        Ok(self)
    }
}

pub(crate) fn validate_segments(segments: &[TranscriptSegment]) -> Result<(), CollabError> {
    let mut previous_start = 0u64;
    for (idx, segment) in segments.iter().enumerate() {
        if segment.text.trim().is_empty() {
            return Err(CollabError::InvalidResponse(format!("segment {} has no text", idx)));
        }
        if segment.end_ms < segment.start_ms {
            return Err(CollabError::InvalidResponse(format!("segment {} ends before it starts", idx)));
        }
        if segment.start_ms < previous_start {
            return Err(CollabError::InvalidResponse(format!("segment {} is out of order", idx)));
        }
        previous_start = segment.start_ms;
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub transcript: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segments: Option<Vec<TranscriptSegment>>,
    pub enforce_redaction: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedEntity {
    pub text: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResponse {
    #[serde(flatten)]
    pub note: StructuredNote,
    #[serde(default)]
    pub entities: Option<Vec<ExtractedEntity>>,
    #[serde(default)]
    pub warnings: Option<Vec<String>>,
}

impl GenerationResponse {
    pub fn validate(self) -> Result<Self, CollabError> {
        for (idx, ev) in self.note.evidence.iter().enumerate() {
            if ev.section.trim().is_empty() {
                return Err(CollabError::InvalidResponse(format!("evidence {} has no section", idx)));
            }
        }
        Ok(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedactionRequest {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedactionResponse {
    pub redacted: String,
    #[serde(default)]
    pub pii_detected: Option<bool>,
}

/// Error body shape shared by all three services
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorBody {
    pub fn is_pii_detected(&self) -> bool {
        self.code.as_deref() == Some(PII_DETECTED_CODE) || self.error.as_deref() == Some(PII_DETECTED_CODE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::{EvidenceAnchor, NoteField};

    #[test]
    fn test_transcription_response_validation() {
        let ok: TranscriptionResponse = serde_json::from_str(
            r#"{"transcript":"hi there","segments":[{"startMs":0,"endMs":0,"text":"hi"},{"startMs":0,"endMs":900,"text":"there"}]}"#,
        )
        .unwrap();
        assert!(ok.validate().is_ok());

        let bare: TranscriptionResponse = serde_json::from_str(r#"{"transcript":"hi"}"#).unwrap();
        assert_eq!(bare.segments, None);
        assert!(bare.validate().is_ok());

        let backwards = TranscriptionResponse {
            transcript: "x".to_string(),
            segments: Some(vec![TranscriptSegment::new(500, 100, "x")]),
            warnings: None,
        };
        assert!(matches!(backwards.validate(), Err(CollabError::InvalidResponse(_))));

        let unordered = TranscriptionResponse {
            transcript: "x y".to_string(),
            segments: Some(vec![
                TranscriptSegment::new(1000, 2000, "x"),
                TranscriptSegment::new(0, 500, "y"),
            ]),
            warnings: None,
        };
        assert!(matches!(unordered.validate(), Err(CollabError::InvalidResponse(_))));

        let blank = TranscriptionResponse {
            transcript: "x".to_string(),
            segments: Some(vec![TranscriptSegment::new(0, 10, "  ")]),
            warnings: None,
        };
        assert!(blank.validate().is_err());
    }

    #[test]
    fn test_negative_timestamps_fail_to_parse() {
        let result: Result<TranscriptionResponse, _> = serde_json::from_str(
            r#"{"transcript":"x","segments":[{"startMs":-5,"endMs":10,"text":"x"}]}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_generation_response_shape() {
        let response: GenerationResponse = serde_json::from_str(
            r#"{
                "subjective": "Cough for a week",
                "objective": ["Temp 37.9"],
                "assessment": "Likely viral",
                "plan": ["Fluids", "Rest"],
                "evidence": [{"section":"subjective","text":"Cough for a week","start":0,"end":12,"verified":true}],
                "entities": [{"text":"cough","type":"symptom"}],
                "warnings": []
            }"#,
        )
        .unwrap();
        let response = response.validate().unwrap();
        assert_eq!(response.note.objective, NoteField::Lines(vec!["Temp 37.9".to_string()]));
        assert_eq!(response.note.evidence.len(), 1);
        assert!(matches!(response.note.evidence[0].anchor, EvidenceAnchor::Span(_)));
        assert_eq!(response.entities.unwrap()[0].kind.as_deref(), Some("symptom"));
    }

    #[test]
    fn test_evidence_without_section_is_invalid() {
        let response: GenerationResponse =
            serde_json::from_str(
            r#"{"subjective":"","objective":"","assessment":"","plan":"Rest","evidence":[{"section":" ","text":"Rest"}]}"#,
        )
        .unwrap();
        assert!(matches!(response.validate(), Err(CollabError::InvalidResponse(_))));
    }

    #[test]
    fn test_generation_request_wire_names() {
        let request = GenerationRequest {
            transcript: "t".to_string(),
            segments: None,
            enforce_redaction: true,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["enforceRedaction"], true);
        assert!(json.get("segments").is_none());
    }

    #[test]
    fn test_user_messages_are_generic() {
        let err = CollabError::ProviderError("HTTP 500: stack trace".to_string());
        let message = err.user_message(Operation::Generate);
        assert!(!message.contains("500"));
        assert!(CollabError::TimeoutError.is_retryable());
        assert!(!CollabError::PiiDetected.is_retryable());
        assert_ne!(
            CollabError::PiiDetected.user_message(Operation::Generate),
            CollabError::TimeoutError.user_message(Operation::Generate)
        );
    }

    #[test]
    fn test_error_body_pii_code() {
        let body: ErrorBody = serde_json::from_str(r#"{"code":"PII_DETECTED"}"#).unwrap();
        assert!(body.is_pii_detected());
        let body: ErrorBody = serde_json::from_str(r#"{"error":"boom"}"#).unwrap();
        assert!(!body.is_pii_detected());
    }
}
