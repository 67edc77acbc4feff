// tasks.rs - Plan section to discrete follow-up tasks

use crate::evidence::NoteField;
use regex::Regex;
use std::sync::OnceLock;

pub const MAX_TASKS: usize = 12;
const MIN_TASK_CHARS: usize = 3;

fn separator_re() -> &'static Regex {
    static SEP_RE: OnceLock<Regex> = OnceLock::new();
    SEP_RE.get_or_init(|| Regex::new(r"\r?\n|•|\s+-\s+").expect("valid separator regex"))
}

fn bullet_re() -> &'static Regex {
    static BULLET_RE: OnceLock<Regex> = OnceLock::new();
    BULLET_RE.get_or_init(|| Regex::new(r"^-\s+").expect("valid bullet regex"))
}

fn ordinal_re() -> &'static Regex {
    static ORDINAL_RE: OnceLock<Regex> = OnceLock::new();
    ORDINAL_RE.get_or_init(|| Regex::new(r"^\d+\.\s+").expect("valid ordinal regex"))
}

/// Remove one leading match of `re`. A piece whose remainder would match
/// again is left alone, so a second pass over the output is a no-op.
fn strip_once<'a>(re: &Regex, piece: &'a str) -> &'a str {
    match re.find(piece) {
        Some(m) if !re.is_match(&piece[m.end()..]) => &piece[m.end()..],
        _ => piece,
    }
}

/// Split a plan into actionable strings. Running it again on its own
/// output changes nothing.
pub fn to_tasks(plan: &NoteField) -> Vec<String> {
    // 1. Break into raw pieces
    let pieces: Vec<&str> = match plan {
        NoteField::Lines(lines) => lines
            .iter()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .collect(),
        NoteField::Text(text) => {
            let split: Vec<&str> = separator_re()
                .split(text)
                .map(|p| strip_once(bullet_re(), p.trim()))
                .filter(|p| !p.is_empty())
                .collect();
            if split.is_empty() && !text.trim().is_empty() {
                vec![text.trim()]
            } else {
                split
            }
        }
    };

    // 2. Strip the ordinal, drop fragments, cap
    pieces
        .into_iter()
        .map(|p| strip_once(ordinal_re(), p).trim().to_string())
        .filter(|p| p.chars().count() >= MIN_TASK_CHARS)
        .take(MAX_TASKS)
        .collect()
}
