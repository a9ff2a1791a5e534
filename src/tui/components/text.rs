use ratatui::text::{Line, Text};

use crate::tui::compact::Collapse;
use crate::tui::component::{Collapsible, Component, ComponentCore};
use crate::tui::render::render_styled;

/// Static styled text, wrapped to the render width.
pub struct TextComponent {
    core: ComponentCore,
    text: Text<'static>,
    collapse: Collapse,
}

impl TextComponent {
    pub fn new(text: impl Into<Text<'static>>) -> Self {
        Self {
            core: ComponentCore::new(),
            text: text.into(),
            collapse: Collapse::default(),
        }
    }

    /// Start collapsed to `max_lines`.
    pub fn collapsed(mut self, max_lines: usize) -> Self {
        self.collapse = Collapse::collapsed(max_lines);
        self
    }

    pub fn text(&self) -> &Text<'static> {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<Text<'static>>) {
        let text = text.into();
        if self.text != text {
            self.text = text;
            self.core.mark_dirty();
        }
    }
}

impl Component for TextComponent {
    fn core(&self) -> &ComponentCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ComponentCore {
        &mut self.core
    }

    fn render(&self, width: u16) -> Vec<Line<'static>> {
        render_styled(self.text.clone(), self.core.style(), width, self.collapse.limit())
    }

    fn as_collapsible(&self) -> Option<&dyn Collapsible> {
        Some(self)
    }

    fn as_collapsible_mut(&mut self) -> Option<&mut dyn Collapsible> {
        Some(self)
    }
}

impl Collapsible for TextComponent {
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
