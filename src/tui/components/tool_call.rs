//! Tool-call results, rendered through the formatter registry.
//!
//! ```text
//!   read_file            ← name header
//!    line 1              ← formatted output, indented one column,
//!    ...                   compacted per call while collapsed
//!    ... (42 other lines)
//! ```

use std::rc::Rc;

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};

use crate::core::step::ToolCallResponse;
use crate::tui::compact::{Collapse, DEFAULT_COMPACT_LINES, compact_lines};
use crate::tui::component::{Collapsible, Component, ComponentCore};
use crate::tui::formatters::FormatterRegistry;
use crate::tui::render::{render_styled, wrap_text};

const OUTPUT_INDENT: u16 = 1;

pub struct ToolCallComponent {
    core: ComponentCore,
    responses: Vec<ToolCallResponse>,
    formatters: Rc<FormatterRegistry>,
    collapse: Collapse,
}

impl ToolCallComponent {
    /// Starts collapsed.
    pub fn new(responses: Vec<ToolCallResponse>, formatters: Rc<FormatterRegistry>) -> Self {
        Self {
            core: ComponentCore::new(),
            responses,
            formatters,
            collapse: Collapse::collapsed(DEFAULT_COMPACT_LINES),
        }
    }

    pub fn with_max_lines(mut self, max_lines: usize) -> Self {
        self.collapse.max_lines = max_lines;
        self
    }

    pub fn responses(&self) -> &[ToolCallResponse] {
        &self.responses
    }

    pub fn set_responses(&mut self, responses: Vec<ToolCallResponse>) {
        if self.responses != responses {
            self.responses = responses;
            self.core.mark_dirty();
        }
    }
}

impl Component for ToolCallComponent {
    fn core(&self) -> &ComponentCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ComponentCore {
        &mut self.core
    }

    fn render(&self, width: u16) -> Vec<Line<'static>> {
        let style = self.core.style();
        let inner = width.saturating_sub(style.horizontal_overhead());
        let body_width = inner.saturating_sub(OUTPUT_INDENT);
        let header = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
        let indent = " ".repeat(OUTPUT_INDENT as usize);

        let mut lines: Vec<Line<'static>> = Vec::new();
        for response in &self.responses {
            let Some(output) = self.formatters.format_response(response) else {
                continue;
            };
            lines.push(Line::from(Span::styled(response.name.clone(), header)));

            let mut body = wrap_text(output, style.base, body_width);
            if let Some(max) = self.collapse.limit() {
                body = compact_lines(body, max);
            }
            for mut line in body {
                line.spans.insert(0, Span::raw(indent.clone()));
                lines.push(line);
            }
        }

        if lines.is_empty() {
            return Vec::new();
        }
        render_styled(Text::from(lines), style, width, None)
    }

    fn as_collapsible(&self) -> Option<&dyn Collapsible> {
        Some(self)
    }

    fn as_collapsible_mut(&mut self) -> Option<&mut dyn Collapsible> {
        Some(self)
    }
}

impl Collapsible for ToolCallComponent {
    fn is_collapsed(&self) -> bool {
        self.collapse.collapsed
    }

    fn set_collapsed(&mut self, collapsed: bool) {
        if self.collapse.collapsed != collapsed {
            self.collapse.collapsed = collapsed;
            self.core.mark_dirty();
        }
    }
}
