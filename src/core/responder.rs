//! # Responder
//!
//! The producer side of a session: turns a submitted line into steps for the
//! UI, and answers autocomplete requests. [`EchoResponder`] is the built-in
//! one used by the `lumen` binary.

use std::fmt;

use async_trait::async_trait;
use serde_json::{Value, json};

use super::step::{AutocompleteItem, Role, Step, ToolCallRequest, ToolCallResponse};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponderError {
    /// The input named a command but its arguments did not parse.
    BadArguments(String),
}

impl fmt::Display for ResponderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponderError::BadArguments(msg) => write!(f, "bad arguments: {msg}"),
        }
    }
}

impl std::error::Error for ResponderError {}

#[async_trait]
pub trait Responder: Send + Sync {
    fn name(&self) -> &str;

    /// Steps to show for one submitted line, in order.
    async fn respond(&self, input: &str) -> Result<Vec<Step>, ResponderError>;

    /// Suggestions for `text`, the input line up to the end of the word
    /// under the cursor. `None` hides any open list.
    fn complete(&self, _text: &str) -> Option<Vec<AutocompleteItem>> {
        None
    }
}

/// Slash commands the echo session understands. `/help` and `/logs` are
/// handled by the binary itself.
pub const SLASH_COMMANDS: &[&str] = &["/add", "/help", "/logs"];

/// Echoes each line back as assistant markdown. `/add a b` runs the one
/// built-in tool so tool-call rendering can be seen.
#[derive(Debug, Default)]
pub struct EchoResponder;

impl EchoResponder {
    pub fn new() -> Self {
        Self
    }

    fn add(arguments: &str) -> Result<Step, ResponderError> {
        let numbers: Vec<i64> = arguments
            .split_whitespace()
            .map(|n| n.parse::<i64>())
            .collect::<Result<_, _>>()
            .map_err(|e| ResponderError::BadArguments(e.to_string()))?;
        let [a, b] = numbers[..] else {
            return Err(ResponderError::BadArguments(format!(
                "expected two integers, got {}",
                numbers.len()
            )));
        };

        let result: Value = match a.checked_add(b) {
            Some(sum) => json!({ "result": sum }),
            None => json!({ "error": "overflow" }),
        };
        Ok(Step {
            id: uuid::Uuid::new_v4().to_string(),
            role: Role::Assistant,
            text: None,
            tool_call_requests: vec![ToolCallRequest {
                name: "add".into(),
                arguments: json!({ "a": a, "b": b }),
            }],
            tool_call_responses: vec![ToolCallResponse {
                name: "add".into(),
                result,
            }],
        })
    }
}

#[async_trait]
impl Responder for EchoResponder {
    fn name(&self) -> &str {
        "echo"
    }

    async fn respond(&self, input: &str) -> Result<Vec<Step>, ResponderError> {
        let mut steps = vec![Step::text(Role::User, input)];
        if let Some(arguments) = input.strip_prefix("/add") {
            steps.push(Self::add(arguments)?);
        } else {
            steps.push(Step::text(Role::Assistant, format!("**echo:** {input}")));
        }
        Ok(steps)
    }

    fn complete(&self, text: &str) -> Option<Vec<AutocompleteItem>> {
        if !text.starts_with('/') || text.contains(char::is_whitespace) {
            return None;
        }
        let items: Vec<AutocompleteItem> = SLASH_COMMANDS
            .iter()
            .filter(|c| c.starts_with(text) && **c != text)
            .map(|c| AutocompleteItem::new(*c))
            .collect();
        (!items.is_empty()).then_some(items)
    }
}
