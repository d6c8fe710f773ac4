use std::collections::{HashMap, HashSet};

use serde_json::{Map, Value};

use super::ip::obfuscate_ip;
use super::rules::{ReplaceRule, SanitizationRules};

/// Applies a [`SanitizationRules`] set to arbitrary JSON trees.
#[derive(Debug, Clone)]
pub struct Sanitizer {
    replace: Vec<ReplaceRule>,
    set: HashMap<String, Value>,
    drop: HashSet<String>,
    ip_fields: HashSet<String>,
}

impl Sanitizer {
    pub fn new(rules: &SanitizationRules) -> Self {
        let replace = rules
            .replace
            .iter()
            .filter(|rule| {
                if rule.find.is_empty() {
                    tracing::warn!("ignoring replace rule with an empty find string");
                    return false;
                }
                true
            })
            .cloned()
            .collect();

        // Later set rules for the same field win.
        let set = rules
            .set
            .iter()
            .map(|rule| (rule.field.clone(), rule.replace.clone()))
            .collect();

        Self {
            replace,
            set,
            drop: rules.drop.iter().cloned().collect(),
            ip_fields: rules.ip_obfuscate.iter().cloned().collect(),
        }
    }

    /// Apply every replace rule, in order, to one string.
    pub fn replace_in(&self, input: &str) -> String {
        let mut out = input.to_string();
        for rule in &self.replace {
            if out.contains(&rule.find) {
                out = out.replace(&rule.find, &rule.replace);
            }
        }
        out
    }

    /// Sanitize `tree` in place.
    pub fn apply(&self, tree: &mut Value) {
        if !self.replace.is_empty() {
            visit_strings(tree, &mut |s: &mut String| {
                if self.replace.iter().any(|rule| s.contains(&rule.find)) {
                    *s = self.replace_in(s);
                }
            });
        }

        if !self.set.is_empty() {
            self.set_fields(tree);
        }

        if !self.drop.is_empty() {
            visit_maps(tree, &mut |map: &mut Map<String, Value>| {
                map.retain(|key, _| !self.drop.contains(key));
            });
        }

        if !self.ip_fields.is_empty() {
            visit_maps(tree, &mut |map: &mut Map<String, Value>| {
                for (key, value) in map.iter_mut() {
                    if !self.ip_fields.contains(key) {
                        continue;
                    }
                    if let Value::String(ip) = value {
                        *ip = obfuscate_ip(ip);
                    }
                }
            });
        }
    }

    /// Overwrite every field named by a set rule. A written literal is not
    /// descended into, so a literal holding its own field name terminates.
    fn set_fields(&self, value: &mut Value) {
        match value {
            Value::Array(items) => {
                for item in items {
                    self.set_fields(item);
                }
            }
            Value::Object(map) => {
                for (key, item) in map.iter_mut() {
                    match self.set.get(key) {
                        Some(literal) => *item = literal.clone(),
                        None => self.set_fields(item),
                    }
                }
            }
            _ => {}
        }
    }

    /// Sanitize each element of a batch in place.
    pub fn apply_all(&self, batch: &mut [Value]) {
        for tree in batch {
            self.apply(tree);
        }
    }
}

/// Sanitize an owned tree and hand it back.
pub fn sanitize(mut tree: Value, rules: &SanitizationRules) -> Value {
    Sanitizer::new(rules).apply(&mut tree);
    tree
}

fn visit_strings(value: &mut Value, f: &mut impl FnMut(&mut String)) {
    match value {
        Value::String(s) => f(s),
        Value::Array(items) => {
            for item in items {
                visit_strings(item, f);
            }
        }
        Value::Object(map) => {
            for (_, item) in map.iter_mut() {
                visit_strings(item, f);
            }
        }
        _ => {}
    }
}

/// Call `f` on every mapping, parent before children, so a mapping edited by
/// `f` is descended in its edited form.
fn visit_maps(value: &mut Value, f: &mut impl FnMut(&mut Map<String, Value>)) {
    match value {
        Value::Array(items) => {
            for item in items {
                visit_maps(item, f);
            }
        }
        Value::Object(map) => {
            f(map);
            for (_, item) in map.iter_mut() {
                visit_maps(item, f);
            }
        }
        _ => {}
    }
}
