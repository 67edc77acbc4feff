// privacy/detector.rs - Pattern-based PHI detection

use super::types::{PhiCategory, PhiFinding};

const MAX_EXAMPLES: usize = 3;

/// Scan `text` for identifiers, one finding per category that matched.
///
/// Categories are scanned independently in [`PhiCategory::ALL`] order, so a
/// substring that satisfies two patterns (a ten digit phone number is also a
/// long digit run) is counted in both. That is fine for an on-screen warning
/// but is not a count of distinct identifiers.
pub fn detect(text: &str) -> Vec<PhiFinding> {
    detect_all(&[text])
}

/// Like [`detect`], but over several texts sent together. Each text is
/// scanned on its own, so no match spans two of them.
pub fn detect_all(texts: &[&str]) -> Vec<PhiFinding> {
    let mut findings = Vec::new();

    for category in PhiCategory::ALL {
        let mut count = 0usize;
        let mut examples: Vec<String> = Vec::new();

        for m in texts.iter().flat_map(|text| category.pattern().find_iter(*text)) {
            count += 1;
            if examples.len() < MAX_EXAMPLES && !examples.iter().any(|e| e == m.as_str()) {
                examples.push(m.as_str().to_string());
            }
        }

        if count > 0 {
            findings.push(PhiFinding {
                category,
                count,
                examples,
            });
        }
    }

    findings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_email() {
        let findings = detect("Contact test@example.com now");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].category, PhiCategory::Email);
        assert_eq!(findings[0].count, 1);
        assert_eq!(findings[0].examples, vec!["test@example.com".to_string()]);
    }

    #[test]
    fn test_clean_text_has_no_findings() {
        assert!(detect("Patient reports mild headache for two days.").is_empty());
        assert!(detect("").is_empty());
    }

    #[test]
    fn test_counts_are_not_deduplicated() {
        let text = "a@b.io, a@b.io, c@d.io, e@f.io, g@h.io";
        let findings = detect(text);
        assert_eq!(findings[0].count, 5);
        assert_eq!(
            findings[0].examples,
            vec!["a@b.io".to_string(), "c@d.io".to_string(), "e@f.io".to_string()]
        );
    }

    #[test]
    fn test_fixed_category_order() {
        let text = "MRN 123456789, born 04/12/1980, lives at 42 Oak Street, call 555-123-4567, mail x@y.org";
        let categories: Vec<PhiCategory> = detect(text).iter().map(|f| f.category).collect();
        assert_eq!(
            categories,
            vec![
                PhiCategory::Email,
                PhiCategory::Phone,
                PhiCategory::Address,
                PhiCategory::Dob,
                PhiCategory::Id,
            ]
        );
    }

    #[test]
    fn test_overlapping_categories_counted_twice() {
        let findings = detect("call 5551234567");
        let categories: Vec<PhiCategory> = findings.iter().map(|f| f.category).collect();
        assert_eq!(categories, vec![PhiCategory::Phone, PhiCategory::Id]);
    }

    #[test]
    fn test_detect_is_stable() {
        let text = "DOB 1975-03-09, phone (555) 222-3333";
        assert_eq!(detect(text), detect(text));
    }

    #[test]
    fn test_detect_all_merges_texts() {
        let findings = detect_all(&["Patient reports a dry cough.", "reach me at jo@clinic.org", "or jo@clinic.org"]);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].category, PhiCategory::Email);
        assert_eq!(findings[0].count, 2);
        assert_eq!(findings[0].examples, vec!["jo@clinic.org".to_string()]);
    }

    #[test]
    fn test_detect_all_does_not_join_texts() {
        // "555" and "1234567" are separate texts; joined they would read as a phone number
        let categories: Vec<PhiCategory> = detect_all(&["call 555", "1234567"]).iter().map(|f| f.category).collect();
        assert_eq!(categories, vec![PhiCategory::Id]);
        assert!(detect_all(&[]).is_empty());
    }
}
