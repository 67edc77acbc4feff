// privacy/policy.rs - User-controlled privacy policy

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PrivacyPolicy {
    /// Refuse to send raw text containing identifiers off the device
    pub hard_gate_enabled: bool,
    /// When the gate fires, send the redacted text instead of nothing
    pub send_redacted_externally: bool,
    /// Keep transcripts and tasks out of persistent storage
    pub ephemeral: bool,
}

impl Default for PrivacyPolicy {
    fn default() -> Self {
        Self {
            hard_gate_enabled: true,
            send_redacted_externally: true,
            ephemeral: false,
        }
    }
}
