// privacy/mod.rs - PHI detection, redaction and the outbound gate

mod detector;
mod gate;
mod policy;
mod redactor;
mod types;

pub use detector::{detect, detect_all};
pub use gate::{decide, preview, preview_with, Channel, GateAction, GateDecision};
pub use policy::PrivacyPolicy;
pub use redactor::redact;
pub use types::{PhiCategory, PhiFinding};
