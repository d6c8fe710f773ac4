//! Field-level sanitization of captured events.
//!
//! Captured events are scrubbed before they are persisted so a scenario can be
//! shared and replayed without carrying customer data along.

mod ip;
mod rules;
mod sanitizer;

pub use ip::{obfuscate_ip, OCTET_MASK, PRIVATE_PREFIXES};
pub use rules::{ReplaceRule, SanitizationRules, SetRule};
pub use sanitizer::{sanitize, Sanitizer};
