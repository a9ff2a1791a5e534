use log::warn;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};

use crate::tui::compact::Collapse;
use crate::tui::component::{Collapsible, Component, ComponentCore};
use crate::tui::render::{RenderError, render_styled};

pub type RenderCallback = Box<dyn Fn(u16) -> Result<Text<'static>, RenderError>>;

/// Content produced by a caller-supplied function of the inner width.
///
/// The callback must be deterministic for a given width and captured state;
/// call [`refresh`](Self::refresh) when that state changes. A failing
/// callback renders a single error-marker line instead of its content.
pub struct CallbackComponent {
    core: ComponentCore,
    callback: RenderCallback,
    collapse: Collapse,
}

impl CallbackComponent {
    pub fn new(callback: impl Fn(u16) -> Result<Text<'static>, RenderError> + 'static) -> Self {
        Self {
            core: ComponentCore::new(),
            callback: Box::new(callback),
            collapse: Collapse::default(),
        }
    }

    pub fn set_callback(
        &mut self,
        callback: impl Fn(u16) -> Result<Text<'static>, RenderError> + 'static,
    ) {
        self.callback = Box::new(callback);
        self.core.mark_dirty();
    }

    /// Re-run the callback at the next paint.
    pub fn refresh(&self) {
        self.core.mark_dirty();
    }
}

fn error_marker(err: &RenderError) -> Text<'static> {
    Text::from(Line::from(Span::styled(
        format!("[{err}]"),
        Style::default().fg(Color::Red).add_modifier(Modifier::DIM),
    )))
}

impl Component for CallbackComponent {
    fn core(&self) -> &ComponentCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ComponentCore {
        &mut self.core
    }

    fn render(&self, width: u16) -> Vec<Line<'static>> {
        let style = self.core.style();
        let inner = width.saturating_sub(style.horizontal_overhead());
        let text = match (self.callback)(inner) {
            Ok(text) => text,
            Err(err) => {
                warn!("component {:?}: {err}", self.core.key());
                error_marker(&err)
            }
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

impl Collapsible for CallbackComponent {
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
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn callback_receives_inner_width() {
        let c = CallbackComponent::new(|w| Ok(Text::from(format!("w={w}"))));
        assert_eq!(plain_lines(&c.render(30)), vec!["w=30"]);
    }

    #[test]
    fn failure_renders_marker() {
        let c = CallbackComponent::new(|_| Err(RenderError::new("boom")));
        let out = plain_lines(&c.render(40));
        assert_eq!(out, vec!["[render failed: boom]"]);
    }

    #[test]
    fn refresh_marks_dirty() {
        let calls = Rc::new(Cell::new(0));
        let seen = calls.clone();
        let c = CallbackComponent::new(move |_| {
            seen.set(seen.get() + 1);
            Ok(Text::from("x"))
        });
        c.core().clear_dirty();
        c.refresh();
        assert!(c.core().is_dirty());
        c.render(10);
        assert_eq!(calls.get(), 1);
    }
}
