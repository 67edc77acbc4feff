// privacy/redactor.rs - Best-effort identifier masking

use super::types::PhiCategory;

/// Replace every match of every category with that category's token.
///
/// Passes run in the same order as [`super::detect`]. A token written by an
/// earlier pass can in principle satisfy a later pattern, so the output is
/// not guaranteed to be a fixed point.
pub fn redact(text: &str) -> String {
    let mut result = text.to_string();
    for category in PhiCategory::ALL {
        result = category
            .pattern()
            .replace_all(&result, regex::NoExpand(category.token()))
            .into_owned();
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::privacy::detect;

    #[test]
    fn test_redact_email() {
        assert_eq!(
            redact("Contact test@example.com now"),
            "Contact [REDACTED_EMAIL] now"
        );
    }

    #[test]
    fn test_redact_leaves_clean_text_untouched() {
        let text = "Follow up in 2 weeks. Continue lisinopril 10 mg daily.";
        assert!(detect(text).is_empty());
        assert_eq!(redact(text), text);
    }

    #[test]
    fn test_redact_all_categories() {
        let text = "Reach me at 555-123-4567 or jo@clinic.org, 12 Elm Ave., DOB 01/02/1990, MRN 98765432";
        let redacted = redact(text);
        assert_eq!(
            redacted,
            "Reach me at [REDACTED_PHONE] or [REDACTED_EMAIL], [REDACTED_ADDRESS], DOB [REDACTED_DOB], MRN [REDACTED_ID]"
        );
        assert!(detect(&redacted).is_empty());
    }
}
