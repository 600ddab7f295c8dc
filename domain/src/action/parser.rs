//! Action extraction from agent replies.
//!
//! Agents describe side effects in a fenced ` ```actions` block:
//!
//! ````text
//! Sounds good, I'll loop in the architect.
//!
//! ```actions
//! {
//!   "status": "waiting",
//!   "actions": [
//!     {"type": "coordinate-with-agent", "params": {"target": "architect", "request": "Sketch the data model"}},
//!     {"type": "update-plan", "params": {"summary": "Design first"}, "requires_confirmation": false}
//!   ]
//! }
//! ```
//! ````
//!
//! The block may also hold a bare JSON array of actions. A reply that is
//! nothing but such JSON is accepted too.
//!
//! Extraction never fails: a malformed block yields an empty action list
//! plus an [`ExtractionError`] that the caller records as non-fatal.

use super::entities::{ActionKind, ActionPayload, AgentAction};
use crate::agent::AgentStatus;
use serde::Deserialize;
use thiserror::Error;

/// Non-fatal problems found while extracting actions.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractionError {
    #[error("Malformed actions block: {0}")]
    Malformed(String),

    #[error("Action {index}: unknown kind '{kind}'")]
    UnknownKind { index: usize, kind: String },

    #[error("Action {index} ({kind}): invalid params: {reason}")]
    InvalidParams {
        index: usize,
        kind: ActionKind,
        reason: String,
    },

    #[error("Unknown status directive '{0}'")]
    InvalidStatus(String),
}

/// Result of interpreting a reply.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionExtraction {
    /// Reply text with the actions block removed
    pub content: String,
    pub actions: Vec<AgentAction>,
    pub status_update: Option<AgentStatus>,
    pub errors: Vec<ExtractionError>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawAction {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    params: Option<serde_json::Value>,
    #[serde(default)]
    requires_confirmation: bool,
}

/// Extract actions and an optional status directive from reply text.
pub fn extract_actions(response: &str) -> ActionExtraction {
    if let Some((block, content)) = split_actions_block(response) {
        let mut extraction = match serde_json::from_str::<serde_json::Value>(&block) {
            Ok(json) => parse_actions_json(&json),
            Err(e) => ActionExtraction {
                errors: vec![ExtractionError::Malformed(e.to_string())],
                ..Default::default()
            },
        };
        extraction.content = content;
        return extraction;
    }

    // A reply made only of JSON is treated as an actions document
    let trimmed = response.trim();
    if (trimmed.starts_with('{') || trimmed.starts_with('['))
        && let Ok(json) = serde_json::from_str::<serde_json::Value>(trimmed)
        && is_actions_document(&json)
    {
        let mut extraction = parse_actions_json(&json);
        extraction.content = json
            .get("message")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        return extraction;
    }

    ActionExtraction {
        content: trimmed.to_string(),
        ..Default::default()
    }
}

/// Parse an actions document (array, or object with `actions`/`status`).
pub fn parse_actions_json(json: &serde_json::Value) -> ActionExtraction {
    let mut extraction = ActionExtraction::default();

    let items = match json {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Object(map) => {
            if let Some(status) = map.get("status").and_then(|v| v.as_str()) {
                match status.parse::<AgentStatus>() {
                    Ok(s) => extraction.status_update = Some(s),
                    Err(_) => extraction
                        .errors
                        .push(ExtractionError::InvalidStatus(status.to_string())),
                }
            }
            match map.get("actions") {
                Some(serde_json::Value::Array(items)) => items,
                Some(_) => {
                    extraction
                        .errors
                        .push(ExtractionError::Malformed("'actions' must be an array".into()));
                    return extraction;
                }
                None => return extraction,
            }
        }
        _ => {
            extraction.errors.push(ExtractionError::Malformed(
                "expected an array or an object".into(),
            ));
            return extraction;
        }
    };

    match parse_action_list(items) {
        Ok(actions) => extraction.actions = actions,
        Err(e) => extraction.errors.push(e),
    }
    extraction
}

/// All-or-nothing: one bad entry makes the whole list malformed.
fn parse_action_list(items: &[serde_json::Value]) -> Result<Vec<AgentAction>, ExtractionError> {
    let mut actions = Vec::with_capacity(items.len());

    for (index, item) in items.iter().enumerate() {
        let raw: RawAction = serde_json::from_value(item.clone())
            .map_err(|e| ExtractionError::Malformed(format!("action {index}: {e}")))?;

        let kind = raw
            .kind
            .parse::<ActionKind>()
            .map_err(|kind| ExtractionError::UnknownKind { index, kind })?;

        let params = raw
            .params
            .unwrap_or_else(|| serde_json::Value::Object(Default::default()));
        let payload = ActionPayload::from_params(kind, params).map_err(|e| {
            ExtractionError::InvalidParams {
                index,
                kind,
                reason: e.to_string(),
            }
        })?;

        actions.push(AgentAction {
            payload,
            requires_confirmation: raw.requires_confirmation,
        });
    }

    Ok(actions)
}

fn is_actions_document(json: &serde_json::Value) -> bool {
    match json {
        serde_json::Value::Array(items) => items
            .first()
            .is_some_and(|first| first.get("type").is_some()),
        serde_json::Value::Object(map) => map.contains_key("actions"),
        _ => false,
    }
}

/// Returns `(block_json, remaining_text)` for the first ` ```actions` block.
fn split_actions_block(response: &str) -> Option<(String, String)> {
    let mut in_block = false;
    let mut found = false;
    let mut block = String::new();
    let mut remaining = Vec::new();

    for line in response.lines() {
        if !found && !in_block && line.trim() == "```actions" {
            in_block = true;
        } else if in_block && line.trim() == "```" {
            in_block = false;
            found = true;
        } else if in_block {
            block.push_str(line);
            block.push('\n');
        } else {
            remaining.push(line);
        }
    }

    // Unterminated block: take what we have, the JSON parse decides
    if in_block {
        found = true;
    }

    found.then(|| (block, remaining.join("\n").trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::entities::{CoordinateParams, Priority};

    #[test]
    fn test_plain_text_has_no_actions() {
        let extraction = extract_actions("Hello! How can the crew help today?");
        assert_eq!(extraction.content, "Hello! How can the crew help today?");
        assert!(extraction.actions.is_empty());
        assert!(extraction.errors.is_empty());
        assert!(extraction.status_update.is_none());
    }

    #[test]
    fn test_fenced_block_with_status() {
        let response = r#"I'll get the architect on it.

```actions
{
  "status": "waiting",
  "actions": [
    {"type": "coordinate-with-agent", "params": {"target": "architect", "request": "Draft the schema"}},
    {"type": "update-plan", "params": {"summary": "Design first", "steps": ["schema", "api"]}}
  ]
}
```
Talk soon."#;

        let extraction = extract_actions(response);
        assert!(extraction.errors.is_empty(), "{:?}", extraction.errors);
        assert_eq!(extraction.status_update, Some(AgentStatus::Waiting));
        assert_eq!(extraction.actions.len(), 2);
        assert_eq!(
            extraction.actions[0].payload,
            ActionPayload::CoordinateWithAgent(CoordinateParams {
                target: "architect".into(),
                request: "Draft the schema".into(),
                kind: None,
            })
        );
        assert_eq!(extraction.actions[1].kind(), ActionKind::UpdatePlan);
        assert_eq!(
            extraction.content,
            "I'll get the architect on it.\n\nTalk soon."
        );
    }

    #[test]
    fn test_fenced_array_keeps_order_and_confirmation() {
        let response = r#"```actions
[
  {"type": "report-issue", "params": {"title": "Login fails", "severity": "high"}, "requires_confirmation": true},
  {"type": "celebrate-milestone", "params": {"milestone": "Beta"}}
]
```"#;
        let extraction = extract_actions(response);
        assert_eq!(extraction.actions.len(), 2);
        assert_eq!(extraction.actions[0].kind(), ActionKind::ReportIssue);
        assert!(extraction.actions[0].requires_confirmation);
        assert!(matches!(
            &extraction.actions[0].payload,
            ActionPayload::ReportIssue(p) if p.severity == Priority::High
        ));
        assert_eq!(extraction.actions[1].kind(), ActionKind::CelebrateMilestone);
        assert!(!extraction.actions[1].requires_confirmation);
        assert_eq!(extraction.content, "");
    }

    #[test]
    fn test_malformed_json_degrades_to_empty() {
        let response = "Here you go\n```actions\n[{\"type\": \"update-plan\",]\n```";
        let extraction = extract_actions(response);
        assert!(extraction.actions.is_empty());
        assert_eq!(extraction.errors.len(), 1);
        assert!(matches!(extraction.errors[0], ExtractionError::Malformed(_)));
        assert_eq!(extraction.content, "Here you go");
    }

    #[test]
    fn test_unknown_kind_rejects_whole_list() {
        let response = r#"```actions
[
  {"type": "celebrate-milestone", "params": {"milestone": "Alpha"}},
  {"type": "deploy-to-production", "params": {}}
]
```"#;
        let extraction = extract_actions(response);
        assert!(extraction.actions.is_empty());
        assert_eq!(
            extraction.errors,
            vec![ExtractionError::UnknownKind {
                index: 1,
                kind: "deploy-to-production".into()
            }]
        );
    }

    #[test]
    fn test_invalid_params_rejects_whole_list() {
        let response = r#"```actions
[{"type": "ask-clarifying-question", "params": {"options": ["a", "b"]}}]
```"#;
        let extraction = extract_actions(response);
        assert!(extraction.actions.is_empty());
        assert!(matches!(
            extraction.errors[0],
            ExtractionError::InvalidParams { index: 0, kind: ActionKind::AskClarifyingQuestion, .. }
        ));
    }

    #[test]
    fn test_invalid_status_keeps_actions() {
        let json = serde_json::json!({
            "status": "sleeping",
            "actions": [{"type": "celebrate-milestone", "params": {"milestone": "Done"}}]
        });
        let extraction = parse_actions_json(&json);
        assert_eq!(extraction.actions.len(), 1);
        assert_eq!(
            extraction.errors,
            vec![ExtractionError::InvalidStatus("sleeping".into())]
        );
        assert!(extraction.status_update.is_none());
    }

    #[test]
    fn test_raw_json_document() {
        let response = r#"{"message": "Plan updated.", "actions": [{"type": "update-plan", "params": {"summary": "v2"}}]}"#;
        let extraction = extract_actions(response);
        assert_eq!(extraction.actions.len(), 1);
        assert_eq!(extraction.content, "Plan updated.");
    }

    #[test]
    fn test_unrelated_json_is_plain_text() {
        let response = r#"{"name": "crew"}"#;
        let extraction = extract_actions(response);
        assert!(extraction.actions.is_empty());
        assert!(extraction.errors.is_empty());
        assert_eq!(extraction.content, response);
    }

    #[test]
    fn test_missing_params_defaults_to_empty_object() {
        let response = "```actions\n[{\"type\": \"celebrate-milestone\"}]\n```";
        let extraction = extract_actions(response);
        // milestone is required, so an empty params object is rejected
        assert!(extraction.actions.is_empty());
        assert!(matches!(
            extraction.errors[0],
            ExtractionError::InvalidParams { .. }
        ));
    }
}
