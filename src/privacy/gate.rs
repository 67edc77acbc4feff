// privacy/gate.rs - Outbound payload decision

use super::detector::{detect, detect_all};
use super::policy::PrivacyPolicy;
use super::redactor::redact;
use super::types::PhiFinding;
use serde::{Deserialize, Serialize};

/// Where a payload is headed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Channel {
    /// Stays on the device; never gated
    LocalOnly,
    External,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GateAction {
    Raw,
    Redacted,
    Blocked,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateDecision {
    pub action: GateAction,
    /// Exactly what may be transmitted. Empty when blocked.
    pub payload: String,
}

impl GateDecision {
    fn raw(text: &str) -> Self {
        Self {
            action: GateAction::Raw,
            payload: text.to_string(),
        }
    }

    pub fn is_blocked(&self) -> bool {
        self.action == GateAction::Blocked
    }
}

/// Decide what may leave the device for `text`, given findings already
/// computed for that same text.
pub fn decide(
    policy: &PrivacyPolicy,
    text: &str,
    findings: &[PhiFinding],
    channel: Channel,
) -> GateDecision {
    if channel == Channel::LocalOnly {
        return GateDecision::raw(text);
    }

    if !policy.hard_gate_enabled || findings.is_empty() {
        return GateDecision::raw(text);
    }

    if policy.send_redacted_externally {
        return GateDecision {
            action: GateAction::Redacted,
            payload: redact(text),
        };
    }

    GateDecision {
        action: GateAction::Blocked,
        payload: String::new(),
    }
}

/// Detect and decide in one step. The session calls this for both the
/// on-screen preview and the actual send, so the two cannot diverge.
pub fn preview(policy: &PrivacyPolicy, text: &str, channel: Channel) -> GateDecision {
    let findings = detect(text);
    decide(policy, text, &findings, channel)
}

/// Gate `text` together with `companions` that travel in the same request
/// (segment texts). A finding in any of them applies to the whole request.
/// The payload covers `text` only; on [`GateAction::Redacted`] the caller
/// redacts each companion the same way.
pub fn preview_with(policy: &PrivacyPolicy, text: &str, companions: &[&str], channel: Channel) -> GateDecision {
    let mut texts = Vec::with_capacity(companions.len() + 1);
    texts.push(text);
    texts.extend_from_slice(companions);
    let findings = detect_all(&texts);
    decide(policy, text, &findings, channel)
}
