// evidence/resolver.rs - Turn an evidence record into a viewable transcript excerpt

use super::types::{CharSpan, EvidenceAnchor, EvidenceRecord, GenerationSnapshot, TimeRange, TranscriptSegment};
use serde::Serialize;

const MAX_SEGMENTS: usize = 4;
const CONTEXT_BEFORE: usize = 40;
const CONTEXT_AFTER: usize = 80;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolvedEvidence {
    /// Empty when nothing could be resolved
    pub snippet: String,
    /// Time range (`m:ss–m:ss`) or character span (`[start, end]`)
    pub meta: Option<String>,
}

/// Resolve against the snapshot the note was generated from
pub fn resolve_in(evidence: &EvidenceRecord, snapshot: &GenerationSnapshot) -> ResolvedEvidence {
    resolve(evidence, &snapshot.transcript, &snapshot.segments)
}

pub fn resolve(
    evidence: &EvidenceRecord,
    transcript_used: &str,
    segments_used: &[TranscriptSegment],
) -> ResolvedEvidence {
    match &evidence.anchor {
        EvidenceAnchor::Snippet { snippet, time, span } => ResolvedEvidence {
            snippet: snippet.clone(),
            meta: time
                .map(|t| format_range(&t))
                .or_else(|| span.map(|s| format_span(&s))),
        },
        EvidenceAnchor::Timed { time, span } => {
            if !segments_used.is_empty() {
                from_segments(time, segments_used)
            } else if let Some(span) = span {
                from_span(span, transcript_used)
            } else {
                ResolvedEvidence::default()
            }
        }
        EvidenceAnchor::Span(span) => from_span(span, transcript_used),
        EvidenceAnchor::Unresolved => ResolvedEvidence::default(),
    }
}

/// Render milliseconds as `m:ss`
pub fn stamp(ms: u64) -> String {
    let seconds = ms / 1000;
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

fn format_range(time: &TimeRange) -> String {
    format!("{}–{}", stamp(time.start_ms), stamp(time.end_ms))
}

fn format_span(span: &CharSpan) -> String {
    format!("[{}, {}]", span.start, span.end)
}

fn from_segments(time: &TimeRange, segments: &[TranscriptSegment]) -> ResolvedEvidence {
    let snippet = segments
        .iter()
        .filter(|seg| seg.end_ms >= time.start_ms && seg.start_ms <= time.end_ms)
        .take(MAX_SEGMENTS)
        .map(|seg| seg.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    ResolvedEvidence {
        snippet,
        meta: Some(format_range(time)),
    }
}

fn from_span(span: &CharSpan, transcript: &str) -> ResolvedEvidence {
    let len = transcript.chars().count();
    if span.start >= span.end || span.end > len {
        return ResolvedEvidence::default();
    }

    let from = span.start.saturating_sub(CONTEXT_BEFORE);
    let to = (span.end + CONTEXT_AFTER).min(len);

    ResolvedEvidence {
        snippet: char_slice(transcript, from, to).to_string(),
        meta: Some(format_span(span)),
    }
}

/// Slice by char offsets; callers guarantee `from <= to <= char count`
fn char_slice(text: &str, from: usize, to: usize) -> &str {
    let byte_at = |idx: usize| {
        text.char_indices()
            .nth(idx)
            .map(|(b, _)| b)
            .unwrap_or(text.len())
    };
    &text[byte_at(from)..byte_at(to)]
}
