use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Literal substring substitution applied to every string leaf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplaceRule {
    pub find: String,
    #[serde(default)]
    pub replace: String,
}

impl ReplaceRule {
    pub fn new(find: impl Into<String>, replace: impl Into<String>) -> Self {
        Self {
            find: find.into(),
            replace: replace.into(),
        }
    }
}

/// Unconditional override of a named field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetRule {
    pub field: String,
    #[serde(alias = "value")]
    pub replace: Value,
}

impl SetRule {
    pub fn new(field: impl Into<String>, replace: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            replace: replace.into(),
        }
    }
}

/// Field-level redaction rules for captured events.
///
/// Passes run in a fixed order over the whole tree: replace, set, drop, then
/// IP obfuscation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SanitizationRules {
    pub replace: Vec<ReplaceRule>,
    pub drop: Vec<String>,
    pub set: Vec<SetRule>,
    #[serde(alias = "ip_obfuscate")]
    pub ip_obfuscate: Vec<String>,
}

impl SanitizationRules {
    pub fn is_empty(&self) -> bool {
        self.replace.is_empty()
            && self.drop.is_empty()
            && self.set.is_empty()
            && self.ip_obfuscate.is_empty()
    }

    pub fn with_replace(mut self, find: impl Into<String>, replace: impl Into<String>) -> Self {
        self.replace.push(ReplaceRule::new(find, replace));
        self
    }

    pub fn with_drop(mut self, field: impl Into<String>) -> Self {
        self.drop.push(field.into());
        self
    }

    pub fn with_set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set.push(SetRule::new(field, value));
        self
    }

    pub fn with_ip_obfuscate(mut self, field: impl Into<String>) -> Self {
        self.ip_obfuscate.push(field.into());
        self
    }
}
