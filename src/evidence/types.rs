// evidence/types.rs - Transcript segments, structured notes and evidence records

use serde::{Deserialize, Serialize};

/// A timestamped slice of the transcript, as produced by speech-to-text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptSegment {
    pub start_ms: u64,
    pub end_ms: u64,
    pub text: String,
}

impl TranscriptSegment {
    pub fn new(start_ms: u64, end_ms: u64, text: impl Into<String>) -> Self {
        Self {
            start_ms,
            end_ms,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start_ms: u64,
    pub end_ms: u64,
}

/// Offsets into the transcript, counted in chars
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharSpan {
    pub start: usize,
    pub end: usize,
}

/// How an evidence record points back into the transcript
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvidenceAnchor {
    /// The generator quoted the transcript itself. Any time or span it sent
    /// along is kept for display only.
    Snippet {
        snippet: String,
        time: Option<TimeRange>,
        span: Option<CharSpan>,
    },
    /// A valid time range (`end > start`). The span is used when no
    /// segments are available.
    Timed {
        time: TimeRange,
        span: Option<CharSpan>,
    },
    /// A non-empty character span (`start < end`)
    Span(CharSpan),
    Unresolved,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "EvidenceWire", into = "EvidenceWire")]
pub struct EvidenceRecord {
    pub section: String,
    pub text: String,
    pub verified: Option<bool>,
    pub anchor: EvidenceAnchor,
}

impl EvidenceRecord {
    pub fn new(section: impl Into<String>, text: impl Into<String>, anchor: EvidenceAnchor) -> Self {
        Self {
            section: section.into(),
            text: text.into(),
            verified: None,
            anchor,
        }
    }

    pub fn with_verified(mut self, verified: bool) -> Self {
        self.verified = Some(verified);
        self
    }

    /// Only an explicit `true` counts. Unset is treated like `false`.
    pub fn is_verified(&self) -> bool {
        self.verified == Some(true)
    }
}

/// Flat shape the generation service sends
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceWire {
    section: String,
    text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    snippet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    start_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    end_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    start: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    end: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    verified: Option<bool>,
}

impl From<EvidenceWire> for EvidenceRecord {
    fn from(wire: EvidenceWire) -> Self {
        let time = match (wire.start_ms, wire.end_ms) {
            (Some(start_ms), Some(end_ms)) => Some(TimeRange { start_ms, end_ms }),
            _ => None,
        };
        let span = match (wire.start, wire.end) {
            (Some(start), Some(end)) => Some(CharSpan { start, end }),
            _ => None,
        };
        let valid_time = time.filter(|t| t.end_ms > t.start_ms);
        let valid_span = span.filter(|s| s.start < s.end);

        let anchor = match wire.snippet {
            Some(snippet) if !snippet.trim().is_empty() => EvidenceAnchor::Snippet { snippet, time, span },
            _ => match (valid_time, valid_span) {
                (Some(time), span) => EvidenceAnchor::Timed { time, span },
                (None, Some(span)) => EvidenceAnchor::Span(span),
                (None, None) => EvidenceAnchor::Unresolved,
            },
        };

        Self {
            section: wire.section,
            text: wire.text,
            verified: wire.verified,
            anchor,
        }
    }
}

impl From<EvidenceRecord> for EvidenceWire {
    fn from(record: EvidenceRecord) -> Self {
        let mut wire = EvidenceWire {
            section: record.section,
            text: record.text,
            verified: record.verified,
            ..Default::default()
        };

        let (time, span) = match record.anchor {
            EvidenceAnchor::Snippet { snippet, time, span } => {
                wire.snippet = Some(snippet);
                (time, span)
            }
            EvidenceAnchor::Timed { time, span } => (Some(time), span),
            EvidenceAnchor::Span(span) => (None, Some(span)),
            EvidenceAnchor::Unresolved => (None, None),
        };
        if let Some(time) = time {
            wire.start_ms = Some(time.start_ms);
            wire.end_ms = Some(time.end_ms);
        }
        if let Some(span) = span {
            wire.start = Some(span.start);
            wire.end = Some(span.end);
        }
        wire
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteSection {
    Subjective,
    Objective,
    Assessment,
    Plan,
}

impl NoteSection {
    pub const ALL: [NoteSection; 4] = [
        NoteSection::Subjective,
        NoteSection::Objective,
        NoteSection::Assessment,
        NoteSection::Plan,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NoteSection::Subjective => "subjective",
            NoteSection::Objective => "objective",
            NoteSection::Assessment => "assessment",
            NoteSection::Plan => "plan",
        }
    }
}

/// A note section is either free text or a list of lines
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NoteField {
    Text(String),
    Lines(Vec<String>),
}

impl Default for NoteField {
    fn default() -> Self {
        NoteField::Text(String::new())
    }
}

impl NoteField {
    /// Lines as displayed: list entries, or the lines of the text, trimmed
    /// and without blanks
    pub fn display_lines(&self) -> Vec<&str> {
        match self {
            NoteField::Text(text) => text
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .collect(),
            NoteField::Lines(lines) => lines
                .iter()
                .map(|l| l.trim())
                .filter(|l| !l.is_empty())
                .collect(),
        }
    }
}

/// All five fields are required on the wire. A body missing any of them is
/// not a note.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredNote {
    pub subjective: NoteField,
    pub objective: NoteField,
    pub assessment: NoteField,
    pub plan: NoteField,
    pub evidence: Vec<EvidenceRecord>,
}

impl StructuredNote {
    pub fn section(&self, section: NoteSection) -> &NoteField {
        match section {
            NoteSection::Subjective => &self.subjective,
            NoteSection::Objective => &self.objective,
            NoteSection::Assessment => &self.assessment,
            NoteSection::Plan => &self.plan,
        }
    }
}

/// The transcript and segments exactly as sent for generation. Evidence is
/// always rendered against this, never against the live transcript.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationSnapshot {
    pub transcript: String,
    pub segments: Vec<TranscriptSegment>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> EvidenceRecord {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_snippet_wins_over_offsets() {
        let ev = parse(r#"{"section":"plan","text":"Rest","snippet":"take it easy","startMs":0,"endMs":900}"#);
        assert_eq!(
            ev.anchor,
            EvidenceAnchor::Snippet {
                snippet: "take it easy".to_string(),
                time: Some(TimeRange { start_ms: 0, end_ms: 900 }),
                span: None,
            }
        );
    }

    #[test]
    fn test_blank_snippet_falls_through() {
        let ev = parse(r#"{"section":"plan","text":"Rest","snippet":"  ","start":3,"end":9}"#);
        assert_eq!(ev.anchor, EvidenceAnchor::Span(CharSpan { start: 3, end: 9 }));
    }

    #[test]
    fn test_timed_keeps_span_fallback() {
        let ev = parse(r#"{"section":"s","text":"t","startMs":100,"endMs":200,"start":0,"end":4,"verified":true}"#);
        assert_eq!(
            ev.anchor,
            EvidenceAnchor::Timed {
                time: TimeRange { start_ms: 100, end_ms: 200 },
                span: Some(CharSpan { start: 0, end: 4 }),
            }
        );
        assert!(ev.is_verified());
    }

    #[test]
    fn test_degenerate_ranges_are_unresolved() {
        let ev = parse(r#"{"section":"s","text":"t","startMs":200,"endMs":200,"start":5,"end":5}"#);
        assert_eq!(ev.anchor, EvidenceAnchor::Unresolved);
        assert_eq!(ev.verified, None);
        assert!(!ev.is_verified());
    }

    #[test]
    fn test_wrong_field_type_is_rejected() {
        let result: Result<EvidenceRecord, _> =
            serde_json::from_str(r#"{"section":"s","text":"t","verified":"yes"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_record_serializes_flat() {
        let ev = EvidenceRecord::new("plan", "Rest", EvidenceAnchor::Span(CharSpan { start: 1, end: 4 }))
            .with_verified(false);
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["start"], 1);
        assert_eq!(json["end"], 4);
        assert_eq!(json["verified"], false);
        assert!(json.get("snippet").is_none());
    }

    #[test]
    fn test_note_fields_accept_text_or_lines() {
        let note: StructuredNote = serde_json::from_str(
            r#"{"subjective":"Headache\n\n  Nausea ","objective":"","assessment":[],"plan":["Rest"," ","Fluids"],"evidence":[]}"#,
        )
        .unwrap();
        assert_eq!(note.subjective.display_lines(), vec!["Headache", "Nausea"]);
        assert_eq!(note.plan.display_lines(), vec!["Rest", "Fluids"]);
        assert!(note.section(NoteSection::Objective).display_lines().is_empty());
    }

    #[test]
    fn test_note_requires_every_section() {
        assert!(serde_json::from_str::<StructuredNote>("{}").is_err());
        assert!(serde_json::from_str::<StructuredNote>(
            r#"{"subjective":"a","objective":"b","assessment":"c","plan":"d"}"#
        )
        .is_err());
    }
}
