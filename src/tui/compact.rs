//! Line compaction for collapsed components.

use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};

/// Default number of lines a collapsed component keeps.
pub const DEFAULT_COMPACT_LINES: usize = 10;

/// Keep the first `max_lines` lines and append a dim summary counting the
/// rest. Output at or under the cap is returned untouched.
pub fn compact_lines(mut lines: Vec<Line<'static>>, max_lines: usize) -> Vec<Line<'static>> {
    if lines.len() <= max_lines {
        return lines;
    }
    let remaining = lines.len() - max_lines;
    lines.truncate(max_lines);
    lines.push(summary_line(remaining));
    lines
}

fn summary_line(remaining: usize) -> Line<'static> {
    Line::from(Span::styled(
        format!("... ({remaining} other lines)"),
        Style::default().add_modifier(Modifier::DIM),
    ))
}

/// Collapse state carried by collapsible components.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Collapse {
    pub collapsed: bool,
    pub max_lines: usize,
}

impl Default for Collapse {
    fn default() -> Self {
        Self {
            collapsed: false,
            max_lines: DEFAULT_COMPACT_LINES,
        }
    }
}

impl Collapse {
    pub fn collapsed(max_lines: usize) -> Self {
        Self {
            collapsed: true,
            max_lines,
        }
    }

    /// The cap to apply at render time, if any.
    pub fn limit(&self) -> Option<usize> {
        self.collapsed.then_some(self.max_lines)
    }
}
