// privacy/types.rs - PHI categories and findings

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Identifier categories, in the fixed order they are scanned and masked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhiCategory {
    Email,
    Phone,
    Address,
    Dob,
    Id,
}

impl PhiCategory {
    pub const ALL: [PhiCategory; 5] = [
        PhiCategory::Email,
        PhiCategory::Phone,
        PhiCategory::Address,
        PhiCategory::Dob,
        PhiCategory::Id,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PhiCategory::Email => "email",
            PhiCategory::Phone => "phone",
            PhiCategory::Address => "address",
            PhiCategory::Dob => "dob",
            PhiCategory::Id => "id",
        }
    }

    /// Literal written in place of every match of this category
    pub fn token(&self) -> &'static str {
        match self {
            PhiCategory::Email => "[REDACTED_EMAIL]",
            PhiCategory::Phone => "[REDACTED_PHONE]",
            PhiCategory::Address => "[REDACTED_ADDRESS]",
            PhiCategory::Dob => "[REDACTED_DOB]",
            PhiCategory::Id => "[REDACTED_ID]",
        }
    }

    pub fn pattern(&self) -> &'static Regex {
        static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
        static PHONE_RE: OnceLock<Regex> = OnceLock::new();
        static ADDRESS_RE: OnceLock<Regex> = OnceLock::new();
        static DOB_RE: OnceLock<Regex> = OnceLock::new();
        static ID_RE: OnceLock<Regex> = OnceLock::new();

        match self {
            PhiCategory::Email => EMAIL_RE.get_or_init(|| {
                Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}")
                    .expect("valid email regex")
            }),
            PhiCategory::Phone => PHONE_RE.get_or_init(|| {
                Regex::new(r"(?:\+?1[\s.-]?)?(?:\(\d{3}\)|\b\d{3})[\s.-]?\d{3}[\s.-]?\d{4}\b")
                    .expect("valid phone regex")
            }),
            PhiCategory::Address => ADDRESS_RE.get_or_init(|| {
                Regex::new(
                    r"(?i)\b\d{1,5}\s+(?:[a-z0-9.'-]+\s+){0,4}(?:street|st|avenue|ave|road|rd|boulevard|blvd|lane|ln|drive|dr|court|ct|way|place|pl)\b\.?",
                )
                .expect("valid address regex")
            }),
            PhiCategory::Dob => DOB_RE.get_or_init(|| {
                Regex::new(
                    r"\b(?:(?:0?[1-9]|1[0-2])[/-](?:0?[1-9]|[12]\d|3[01])[/-](?:19|20)?\d{2}|(?:19|20)\d{2}-(?:0[1-9]|1[0-2])-(?:0[1-9]|[12]\d|3[01]))\b",
                )
                .expect("valid dob regex")
            }),
            PhiCategory::Id => {
                ID_RE.get_or_init(|| Regex::new(r"\b\d{7,}\b").expect("valid id regex"))
            }
        }
    }
}

impl std::fmt::Display for PhiCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One category's hits within a piece of text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhiFinding {
    pub category: PhiCategory,
    /// Total occurrences, not deduplicated
    pub count: usize,
    /// First distinct matched strings, at most three
    pub examples: Vec<String>,
}
