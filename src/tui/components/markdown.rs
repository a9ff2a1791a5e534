use ratatui::text::Line;

use crate::tui::compact::Collapse;
use crate::tui::component::{Collapsible, Component, ComponentCore};
use crate::tui::markdown;
use crate::tui::render::render_styled;

/// Markdown rendered to styled text, or shown as its raw source.
pub struct MarkdownComponent {
    core: ComponentCore,
    markdown: String,
    show_source: bool,
    collapse: Collapse,
}

impl MarkdownComponent {
    pub fn new(markdown: impl Into<String>) -> Self {
        Self {
            core: ComponentCore::new(),
            markdown: markdown.into(),
            show_source: false,
            collapse: Collapse::default(),
        }
    }

    pub fn collapsed(mut self, max_lines: usize) -> Self {
        self.collapse = Collapse::collapsed(max_lines);
        self
    }

    pub fn markdown(&self) -> &str {
        &self.markdown
    }

    pub fn set_markdown(&mut self, markdown: impl Into<String>) {
        let markdown = markdown.into();
        if self.markdown != markdown {
            self.markdown = markdown;
            self.core.mark_dirty();
        }
    }

    pub fn show_source(&self) -> bool {
        self.show_source
    }

    pub fn set_show_source(&mut self, show_source: bool) {
        if self.show_source != show_source {
            self.show_source = show_source;
            self.core.mark_dirty();
        }
    }
}

impl Component for MarkdownComponent {
    fn core(&self) -> &ComponentCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ComponentCore {
        &mut self.core
    }

    fn render(&self, width: u16) -> Vec<Line<'static>> {
        let style = self.core.style();
        let text = if self.show_source {
            markdown::render_source(&self.markdown, style.base)
        } else {
            let inner = width.saturating_sub(style.horizontal_overhead());
            markdown::render(&self.markdown, style.base, inner)
        };
        render_styled(text, style, width, self.collapse.limit())
    }

    fn as_collapsible(&self) -> Option<&dyn Collapsible> {
        Some(self)
    }

    fn as_collapsible_mut(&mut self) -> Option<&mut dyn Collapsible> {
        Some(self)
    }
}

impl Collapsible for MarkdownComponent {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::plain_lines;
    use ratatui::style::Modifier;

    #[test]
    fn renders_markdown_styles() {
        let md = MarkdownComponent::new("**bold** text");
        let lines = md.render(40);
        let bold = lines[0]
            .spans
            .iter()
            .find(|s| s.content.contains("bold"))
            .map(|s| s.style.add_modifier.contains(Modifier::BOLD));
        assert_eq!(bold, Some(true));
    }

    #[test]
    fn source_mode_shows_raw_text() {
        let mut md = MarkdownComponent::new("# Title\n*em*");
        md.set_show_source(true);
        assert_eq!(plain_lines(&md.render(40)), vec!["# Title", "*em*"]);
    }

    #[test]
    fn collapsed_markdown_is_compacted() {
        let body = (0..15).map(|i| format!("- item {i}")).collect::<Vec<_>>().join("\n");
        let md = MarkdownComponent::new(body).collapsed(4);
        let out = plain_lines(&md.render(40));
        assert_eq!(out.len(), 5);
        assert_eq!(out[4], "... (11 other lines)");
    }
}
