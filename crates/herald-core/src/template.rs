//! Reusable message templates with `{{variable}}` substitution.
//!
//! Rendering never fails: unresolved placeholders are left verbatim.
//! Completeness is a separate pre-flight check (`validate_variables`) that
//! callers invoke before relying on a render.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::LazyLock;
use time::OffsetDateTime;

use crate::types::{NotificationButton, NotificationKind, NotificationPriority};

static VARIABLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{(\w+)\}\}").unwrap());

/// Values supplied for template rendering, keyed by variable name.
pub type VariableMap = HashMap<String, serde_json::Value>;

/// Result of the pre-flight variable completeness check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableValidation {
    pub valid: bool,
    /// Declared variables absent from the supplied map, in declaration order.
    pub missing: Vec<String>,
}

/// Scan a body for `{{name}}` placeholders.
///
/// Returns unique names in first-seen order. Names are case-sensitive.
pub fn detect_variables(body: &str) -> Vec<String> {
    let mut seen = Vec::new();
    for capture in VARIABLE_RE.captures_iter(body) {
        let name = &capture[1];
        if !seen.iter().any(|s: &String| s == name) {
            seen.push(name.to_string());
        }
    }
    seen
}

/// Replace every `{{name}}` occurrence with its supplied value.
///
/// Placeholders without a supplied value are kept verbatim.
pub fn render_body(body: &str, variables: &VariableMap) -> String {
    let mut rendered = body.to_string();
    for (name, value) in variables {
        let placeholder = format!("{{{{{name}}}}}");
        rendered = rendered.replace(&placeholder, &stringify(value));
    }
    rendered
}

fn stringify(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// A reusable notification template.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: String,
    pub name: String,
    pub body: String,
    pub kind: NotificationKind,
    pub priority: NotificationPriority,

    /// Declared variable names; validated against supplied values before a
    /// template-based send.
    pub variables: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub buttons: Vec<NotificationButton>,

    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,

    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Template {
    /// Create a template with variables auto-detected from the body.
    pub fn new(id: impl Into<String>, name: impl Into<String>, body: impl Into<String>) -> Self {
        let body = body.into();
        let now = OffsetDateTime::now_utc();
        Self {
            id: id.into(),
            name: name.into(),
            variables: detect_variables(&body),
            body,
            kind: NotificationKind::Info,
            priority: NotificationPriority::Normal,
            buttons: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_kind(mut self, kind: NotificationKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_priority(mut self, priority: NotificationPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Declare variables explicitly, overriding auto-detection.
    pub fn with_variables(mut self, variables: Vec<String>) -> Self {
        self.variables = variables;
        self
    }

    pub fn with_buttons(mut self, buttons: Vec<NotificationButton>) -> Self {
        self.buttons = buttons;
        self
    }

    /// Re-derive the declared variables from the current body.
    pub fn auto_detect_variables(&mut self) {
        self.variables = detect_variables(&self.body);
        self.updated_at = OffsetDateTime::now_utc();
    }

    pub fn render(&self, variables: &VariableMap) -> String {
        render_body(&self.body, variables)
    }

    /// Check that every declared variable has a supplied value.
    ///
    /// Presence of the key is what matters; any value counts, including
    /// null and false.
    pub fn validate_variables(&self, supplied: &VariableMap) -> VariableValidation {
        let missing: Vec<String> = self
            .variables
            .iter()
            .filter(|name| !supplied.contains_key(*name))
            .cloned()
            .collect();
        VariableValidation {
            valid: missing.is_empty(),
            missing,
        }
    }

    /// Deep copy under a new identity; the copy can be edited independently.
    pub fn clone_as(&self, new_id: impl Into<String>, new_name: impl Into<String>) -> Template {
        let now = OffsetDateTime::now_utc();
        Template {
            id: new_id.into(),
            name: new_name.into(),
            body: self.body.clone(),
            kind: self.kind,
            priority: self.priority,
            variables: self.variables.clone(),
            buttons: self.buttons.clone(),
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vars(pairs: &[(&str, serde_json::Value)]) -> VariableMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_detect_variables_first_seen_order() {
        let detected = detect_variables("Hi {{name}}, you have {{points}} points, {{name}}!");
        assert_eq!(detected, vec!["name", "points"]);
    }

    #[test]
    fn test_detect_variables_case_sensitive() {
        let detected = detect_variables("{{Name}} and {{name}}");
        assert_eq!(detected, vec!["Name", "name"]);
    }

    #[test]
    fn test_render_replaces_every_occurrence() {
        let body = "{{name}} meets {{name}} on {{date}}";
        let rendered = render_body(body, &vars(&[("name", json!("Ada")), ("date", json!("Friday"))]));
        assert_eq!(rendered, "Ada meets Ada on Friday");
    }

    #[test]
    fn test_render_keeps_unresolved_placeholders() {
        let rendered = render_body("Hi {{name}}, balance: {{points}}", &vars(&[("name", json!("Ada"))]));
        assert_eq!(rendered, "Hi Ada, balance: {{points}}");
    }

    #[test]
    fn test_render_empty_body() {
        assert_eq!(render_body("", &vars(&[("name", json!("Ada"))])), "");
    }

    #[test]
    fn test_render_value_kinds() {
        let rendered = render_body(
            "{{n}} {{b}} {{nothing}}end",
            &vars(&[("n", json!(5)), ("b", json!(true)), ("nothing", json!(null))]),
        );
        assert_eq!(rendered, "5 true end");
    }

    #[test]
    fn test_render_idempotent() {
        let body = "Hi {{name}}, you have {{count}} messages";
        let supplied = vars(&[("name", json!("Ada")), ("count", json!(3))]);
        let once = render_body(body, &supplied);
        let twice = render_body(&once, &supplied);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_validate_missing_in_declaration_order() {
        let template = Template::new("welcome", "Welcome", "ignored")
            .with_variables(vec!["name".into(), "userId".into(), "points".into()]);
        let validation = template.validate_variables(&vars(&[("userId", json!(123))]));
        assert!(!validation.valid);
        assert_eq!(validation.missing, vec!["name", "points"]);
    }

    #[test]
    fn test_validate_falsy_values_count_as_supplied() {
        let template =
            Template::new("t", "T", "{{flag}} {{note}}");
        let validation = template.validate_variables(&vars(&[
            ("flag", json!(false)),
            ("note", json!(null)),
        ]));
        assert!(validation.valid);
        assert!(validation.missing.is_empty());
    }

    #[test]
    fn test_new_auto_detects() {
        let template = Template::new("welcome", "Welcome", "Hi {{name}}, id {{userId}}");
        assert_eq!(template.variables, vec!["name", "userId"]);
    }

    #[test]
    fn test_clone_as_is_independent() {
        let original = Template::new("a", "A", "Hello {{name}}")
            .with_buttons(vec![NotificationButton::link("Open", "https://example.com")]);
        let mut copy = original.clone_as("b", "B");
        assert_eq!(copy.body, original.body);
        assert_eq!(copy.variables, original.variables);
        assert_eq!(copy.buttons, original.buttons);

        copy.body = "Bye {{name}}".to_string();
        copy.buttons.clear();
        assert_eq!(original.body, "Hello {{name}}");
        assert_eq!(original.buttons.len(), 1);
    }
}
