//! # Tool-Call Formatters
//!
//! A name → formatter table used when rendering tool calls. Resolution is an
//! exact tool-name match, else the formatter registered as `"generic"`.
//!
//! ```text
//!   "read_file" ──► registry ──► ReadFileFormatter   (registered)
//!   "grep"      ──► registry ──► GenericFormatter    (fallback)
//! ```

use std::collections::HashMap;
use std::fmt;

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use serde_json::Value;

use crate::core::step::{ToolCallRequest, ToolCallResponse};

pub const GENERIC: &str = "generic";

const MAX_PAIRS: usize = 3;
const MAX_VALUE_CHARS: usize = 40;

pub trait ToolCallFormatter {
    /// One-line summary of a call's arguments. `None` hides the request.
    fn format_input(&self, tool_name: &str, arguments: &Value) -> Option<Text<'static>>;

    /// Rendering of a call's result. `None` hides the output.
    fn format_output(&self, tool_name: &str, result: &Value) -> Option<Text<'static>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatterError {
    Duplicate(String),
}

impl fmt::Display for FormatterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatterError::Duplicate(name) => {
                write!(f, "tool call formatter '{name}' already registered")
            }
        }
    }
}

impl std::error::Error for FormatterError {}

pub struct FormatterRegistry {
    formatters: HashMap<String, Box<dyn ToolCallFormatter>>,
}

impl Default for FormatterRegistry {
    /// A registry holding only the generic fallback.
    fn default() -> Self {
        let mut formatters: HashMap<String, Box<dyn ToolCallFormatter>> = HashMap::new();
        formatters.insert(GENERIC.to_string(), Box::new(GenericFormatter));
        Self { formatters }
    }
}

impl FormatterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        name: impl Into<String>,
        formatter: Box<dyn ToolCallFormatter>,
    ) -> Result<(), FormatterError> {
        let name = name.into();
        if self.formatters.contains_key(&name) {
            return Err(FormatterError::Duplicate(name));
        }
        self.formatters.insert(name, formatter);
        Ok(())
    }

    pub fn resolve(&self, tool_name: &str) -> Option<&dyn ToolCallFormatter> {
        self.formatters
            .get(tool_name)
            .or_else(|| self.formatters.get(GENERIC))
            .map(|f| f.as_ref())
    }

    pub fn format_request(&self, request: &ToolCallRequest) -> Option<Text<'static>> {
        self.resolve(&request.name)?
            .format_input(&request.name, &request.arguments)
    }

    pub fn format_response(&self, response: &ToolCallResponse) -> Option<Text<'static>> {
        self.resolve(&response.name)?
            .format_output(&response.name, &response.result)
    }
}

// ============================================================================
// Generic formatter
// ============================================================================

/// `name k=v k=v ...` for inputs; the stringified result for outputs.
pub struct GenericFormatter;

fn name_style() -> Style {
    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
}

fn meta_style() -> Style {
    Style::default().add_modifier(Modifier::DIM)
}

/// Collapse all whitespace runs to single spaces.
fn single_line(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn stringify(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::String(s) => s.clone(),
        // Numbers and booleans print bare; structures as compact JSON.
        other => other.to_string(),
    }
}

fn truncate(value: String, max: usize) -> String {
    if value.chars().count() <= max {
        return value;
    }
    let kept: String = value.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}

impl ToolCallFormatter for GenericFormatter {
    fn format_input(&self, tool_name: &str, arguments: &Value) -> Option<Text<'static>> {
        let pairs: Vec<(String, &Value)> = match arguments {
            Value::Object(map) => map.iter().map(|(k, v)| (k.clone(), v)).collect(),
            Value::Null => Vec::new(),
            other => vec![("args".to_string(), other)],
        };

        let mut spans = vec![Span::styled(tool_name.to_string(), name_style())];
        for (key, value) in pairs.iter().take(MAX_PAIRS) {
            let rendered = truncate(single_line(&stringify(value)), MAX_VALUE_CHARS);
            spans.push(Span::raw(" "));
            spans.push(Span::styled(key.clone(), Style::default().fg(Color::Yellow)));
            spans.push(Span::styled("=", meta_style()));
            spans.push(Span::raw(rendered));
        }
        if pairs.len() > MAX_PAIRS {
            spans.push(Span::raw(" "));
            spans.push(Span::styled("...", meta_style()));
        }
        Some(Text::from(Line::from(spans)))
    }

    fn format_output(&self, _tool_name: &str, result: &Value) -> Option<Text<'static>> {
        let body = match result {
            Value::Null => return None,
            Value::String(s) => s.clone(),
            structured => {
                serde_json::to_string_pretty(structured).unwrap_or_else(|_| structured.to_string())
            }
        };
        Some(Text::from(
            body.lines()
                .map(|l| Line::from(l.replace('\t', "    ")))
                .collect::<Vec<_>>(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::plain;
    use serde_json::json;

    struct Fixed;

    impl ToolCallFormatter for Fixed {
        fn format_input(&self, _: &str, _: &Value) -> Option<Text<'static>> {
            Some(Text::from("fixed"))
        }
        fn format_output(&self, _: &str, _: &Value) -> Option<Text<'static>> {
            None
        }
    }

    #[test]
    fn resolution_prefers_exact_name() {
        let mut registry = FormatterRegistry::new();
        registry.register("ls", Box::new(Fixed)).unwrap();
        let req = ToolCallRequest {
            name: "ls".into(),
            arguments: json!({}),
        };
        assert_eq!(registry.format_request(&req), Some(Text::from("fixed")));

        let other = ToolCallRequest {
            name: "grep".into(),
            arguments: json!({"pattern": "x"}),
        };
        let text = registry.format_request(&other).unwrap();
        assert_eq!(plain(&text.lines[0]), "grep pattern=x");
    }

    #[test]
    fn duplicate_registration_rejected() {
        let mut registry = FormatterRegistry::new();
        let err = registry.register(GENERIC, Box::new(Fixed)).unwrap_err();
        assert_eq!(err, FormatterError::Duplicate("generic".into()));
    }

    #[test]
    fn generic_input_caps_pairs_and_truncates() {
        let args = json!({
            "a": "x".repeat(60),
            "b": "two\nlines",
            "c": 3,
            "d": true,
        });
        let text = GenericFormatter.format_input("tool", &args).unwrap();
        let line = plain(&text.lines[0]);
        let expected_a = format!("a={}...", "x".repeat(37));
        assert!(line.starts_with(&format!("tool {expected_a} b=two lines c=3")));
        assert!(line.ends_with(" ..."));
    }

    #[test]
    fn generic_output_pretty_prints_structures() {
        let text = GenericFormatter
            .format_output("tool", &json!({"k": [1]}))
            .unwrap();
        let lines: Vec<String> = text.lines.iter().map(plain).collect();
        assert_eq!(lines, vec!["{", "  \"k\": [", "    1", "  ]", "}"]);
        assert!(GenericFormatter.format_output("tool", &Value::Null).is_none());
    }
}
