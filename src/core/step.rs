//! # Steps
//!
//! The records a producer hands to the UI. A step is opaque beyond its role,
//! its text, and its tool-call records; the UI renders them and nothing more.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallResponse {
    pub name: String,
    #[serde(default)]
    pub result: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub id: String,
    pub role: Role,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub tool_call_requests: Vec<ToolCallRequest>,
    #[serde(default)]
    pub tool_call_responses: Vec<ToolCallResponse>,
}

impl Step {
    /// A text step with a fresh id.
    pub fn text(role: Role, text: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            text: Some(text.into()),
            tool_call_requests: Vec::new(),
            tool_call_responses: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_request(mut self, request: ToolCallRequest) -> Self {
        self.tool_call_requests.push(request);
        self
    }

    pub fn with_response(mut self, response: ToolCallResponse) -> Self {
        self.tool_call_responses.push(response);
        self
    }
}

/// One autocomplete suggestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutocompleteItem {
    /// Shown in the list (markdown).
    pub title: String,
    /// Inserted on selection; defaults to `title`.
    #[serde(default)]
    pub replace_with: Option<String>,
    /// Byte range of the input to replace; defaults to the word under the
    /// cursor.
    #[serde(default)]
    pub replace_range: Option<(usize, usize)>,
}

impl AutocompleteItem {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            replace_with: None,
            replace_range: None,
        }
    }

    pub fn insertion(&self) -> &str {
        self.replace_with.as_deref().unwrap_or(&self.title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn step_deserializes_sparse_json() {
        let step: Step = serde_json::from_value(json!({
            "id": "s1",
            "role": "assistant",
            "tool_call_responses": [{ "name": "ls", "result": ["a", "b"] }]
        }))
        .unwrap();
        assert_eq!(step.role, Role::Assistant);
        assert!(step.text.is_none());
        assert_eq!(step.tool_call_responses[0].result, json!(["a", "b"]));
    }

    #[test]
    fn text_steps_get_unique_ids() {
        let a = Step::text(Role::User, "hi");
        let b = Step::text(Role::User, "hi");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn insertion_defaults_to_title() {
        let mut item = AutocompleteItem::new("/help");
        assert_eq!(item.insertion(), "/help");
        item.replace_with = Some("/help ".into());
        assert_eq!(item.insertion(), "/help ");
    }
}
