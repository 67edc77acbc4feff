// evidence/matcher.rs - Link note lines to evidence and tally verification

use super::resolver::{resolve_in, ResolvedEvidence};
use super::types::{EvidenceRecord, GenerationSnapshot, NoteSection, StructuredNote};
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceStats {
    pub total: usize,
    pub verified_count: usize,
    /// Explicitly unverified plus unset
    pub unverified_count: usize,
}

/// One displayed note line and what backs it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineEvidence {
    pub line: String,
    /// True only for a matching record with `verified == Some(true)`
    pub confirmed: bool,
    pub evidence: Option<ResolvedEvidence>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionEvidence {
    pub section: NoteSection,
    pub lines: Vec<LineEvidence>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteEvidence {
    pub sections: Vec<SectionEvidence>,
    pub stats: EvidenceStats,
}

fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

/// First evidence record whose section and text match the line, compared
/// trimmed and case-folded
pub fn find_evidence<'a>(
    evidence: &'a [EvidenceRecord],
    section: NoteSection,
    line: &str,
) -> Option<&'a EvidenceRecord> {
    let wanted_section = normalize(section.as_str());
    let wanted_text = normalize(line);
    evidence
        .iter()
        .find(|ev| normalize(&ev.section) == wanted_section && normalize(&ev.text) == wanted_text)
}

/// A missing record and an unverified one look the same to callers: no
/// confirmed evidence.
pub fn is_line_confirmed(evidence: &[EvidenceRecord], section: NoteSection, line: &str) -> bool {
    find_evidence(evidence, section, line).is_some_and(EvidenceRecord::is_verified)
}

pub fn evidence_stats(evidence: &[EvidenceRecord]) -> EvidenceStats {
    let verified_count = evidence.iter().filter(|ev| ev.is_verified()).count();
    EvidenceStats {
        total: evidence.len(),
        verified_count,
        unverified_count: evidence.len() - verified_count,
    }
}

/// Walk every section line of `note`, attaching resolved evidence from
/// `snapshot`
pub fn annotate(note: &StructuredNote, snapshot: &GenerationSnapshot) -> NoteEvidence {
    let sections = NoteSection::ALL
        .iter()
        .map(|&section| {
            let lines = note
                .section(section)
                .display_lines()
                .into_iter()
                .map(|line| {
                    let record = find_evidence(&note.evidence, section, line);
                    LineEvidence {
                        line: line.to_string(),
                        confirmed: record.is_some_and(EvidenceRecord::is_verified),
                        evidence: record.map(|ev| resolve_in(ev, snapshot)),
                    }
                })
                .collect();
            SectionEvidence { section, lines }
        })
        .collect();

    NoteEvidence {
        sections,
        stats: evidence_stats(&note.evidence),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::{CharSpan, EvidenceAnchor, NoteField};

    fn record(section: &str, text: &str, verified: Option<bool>) -> EvidenceRecord {
        let mut ev = EvidenceRecord::new(section, text, EvidenceAnchor::Unresolved);
        ev.verified = verified;
        ev
    }

    #[test]
    fn test_match_is_trimmed_and_case_folded() {
        let evidence = vec![record("  Plan ", "  Take ASPIRIN daily ", Some(true))];
        let found = find_evidence(&evidence, NoteSection::Plan, "take aspirin daily");
        assert!(found.is_some());
        assert!(find_evidence(&evidence, NoteSection::Assessment, "take aspirin daily").is_none());
        assert!(find_evidence(&evidence, NoteSection::Plan, "take aspirin").is_none());
    }

    #[test]
    fn test_miss_and_unverified_look_the_same() {
        let evidence = vec![
            record("plan", "Rest", Some(false)),
            record("plan", "Fluids", None),
            record("plan", "Ibuprofen", Some(true)),
        ];
        assert!(!is_line_confirmed(&evidence, NoteSection::Plan, "Rest"));
        assert!(!is_line_confirmed(&evidence, NoteSection::Plan, "Fluids"));
        assert!(!is_line_confirmed(&evidence, NoteSection::Plan, "Not there"));
        assert!(is_line_confirmed(&evidence, NoteSection::Plan, "ibuprofen"));
    }

    #[test]
    fn test_stats_treat_unset_as_unverified() {
        let evidence = vec![
            record("plan", "a", Some(true)),
            record("plan", "b", Some(false)),
            record("plan", "c", None),
        ];
        assert_eq!(
            evidence_stats(&evidence),
            EvidenceStats {
                total: 3,
                verified_count: 1,
                unverified_count: 2,
            }
        );
        assert_eq!(evidence_stats(&[]), EvidenceStats::default());
    }

    #[test]
    fn test_annotate_resolves_against_snapshot() {
        let transcript = "I have had a headache since Monday.";
        let note = StructuredNote {
            subjective: NoteField::Text("Headache since Monday\nNo fever".to_string()),
            plan: NoteField::Lines(vec!["Rest".to_string()]),
            evidence: vec![EvidenceRecord::new(
                "subjective",
                "headache since monday",
                EvidenceAnchor::Span(CharSpan { start: 13, end: 34 }),
            )
            .with_verified(true)],
            ..Default::default()
        };
        let snapshot = GenerationSnapshot {
            transcript: transcript.to_string(),
            segments: Vec::new(),
        };

        let annotated = annotate(&note, &snapshot);
        assert_eq!(annotated.sections.len(), 4);

        let subjective = &annotated.sections[0];
        assert_eq!(subjective.section, NoteSection::Subjective);
        assert_eq!(subjective.lines.len(), 2);
        assert!(subjective.lines[0].confirmed);
        let resolved = subjective.lines[0].evidence.as_ref().unwrap();
        assert_eq!(resolved.snippet, transcript);
        assert!(!subjective.lines[1].confirmed);
        assert!(subjective.lines[1].evidence.is_none());

        let plan = &annotated.sections[3];
        assert_eq!(plan.lines[0].line, "Rest");
        assert!(!plan.lines[0].confirmed);

        assert_eq!(annotated.stats.total, 1);
        assert_eq!(annotated.stats.verified_count, 1);
    }
}
