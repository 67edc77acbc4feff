// evidence/mod.rs - Provenance for generated note lines

mod matcher;
mod resolver;
mod types;

pub use matcher::{
    annotate, evidence_stats, find_evidence, is_line_confirmed, EvidenceStats, LineEvidence,
    NoteEvidence, SectionEvidence,
};
pub use resolver::{resolve, resolve_in, stamp, ResolvedEvidence};
pub use types::{
    CharSpan, EvidenceAnchor, EvidenceRecord, GenerationSnapshot, NoteField, NoteSection,
    StructuredNote, TimeRange, TranscriptSegment,
};
