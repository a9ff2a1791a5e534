//! A scrolling pick list, used for autocomplete suggestions.
//!
//! At most [`MAX_VISIBLE_ITEMS`] items show at once; the view follows the
//! selection. A dim hint line under the items counts them.

use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span, Text};
use unicode_width::UnicodeWidthStr;

use crate::tui::component::{Component, ComponentCore, ComponentEvent};
use crate::tui::input::{Key, KeyEvent};
use crate::tui::markdown;
use crate::tui::render::render_styled;

pub const MAX_VISIBLE_ITEMS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectItem {
    pub id: String,
    /// Markdown shown for the item.
    pub text: String,
}

impl SelectItem {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

#[derive(Default)]
pub struct SelectListComponent {
    core: ComponentCore,
    items: Vec<SelectItem>,
    selected: usize,
    view_offset: usize,
}

impl SelectListComponent {
    pub fn new(items: Vec<SelectItem>) -> Self {
        Self {
            items,
            ..Self::default()
        }
    }

    pub fn items(&self) -> &[SelectItem] {
        &self.items
    }

    pub fn set_items(&mut self, items: Vec<SelectItem>) {
        self.items = items;
        self.selected = 0;
        self.view_offset = 0;
        self.core.mark_dirty();
    }

    pub fn selected_index(&self) -> Option<usize> {
        (!self.items.is_empty()).then_some(self.selected)
    }

    pub fn selected_item(&self) -> Option<&SelectItem> {
        self.items.get(self.selected)
    }

    /// Select `index`, clamped to the list.
    pub fn set_selected_index(&mut self, index: usize) {
        let Some(last) = self.items.len().checked_sub(1) else {
            return;
        };
        let index = index.min(last);
        if index != self.selected {
            self.selected = index;
            self.sync_view_offset();
            self.core.mark_dirty();
        }
    }

    pub fn move_up(&mut self) {
        if self.selected > 0 {
            self.set_selected_index(self.selected - 1);
        }
    }

    pub fn move_down(&mut self) {
        self.set_selected_index(self.selected + 1);
    }

    fn sync_view_offset(&mut self) {
        let max_offset = self.items.len().saturating_sub(MAX_VISIBLE_ITEMS);
        self.view_offset = self.view_offset.min(max_offset);
        if self.selected < self.view_offset {
            self.view_offset = self.selected;
        } else if self.selected >= self.view_offset + MAX_VISIBLE_ITEMS {
            self.view_offset = self.selected + 1 - MAX_VISIBLE_ITEMS;
        }
    }

    fn hint(&self, visible: usize) -> String {
        match self.items.len() {
            0 => "No items (0)".to_string(),
            1 => "1 item".to_string(),
            n if n <= MAX_VISIBLE_ITEMS => format!("{n} items"),
            n => format!("Showing {visible} of {n} items"),
        }
    }
}

/// Pad a line to `width` columns, in `style` for the padding.
fn pad_line(mut line: Line<'static>, width: u16, style: Style) -> Line<'static> {
    let used: usize = line.spans.iter().map(|s| s.content.width()).sum();
    let pad = (width as usize).saturating_sub(used);
    if pad > 0 {
        line.spans.push(Span::styled(" ".repeat(pad), style));
    }
    line
}

impl Component for SelectListComponent {
    fn core(&self) -> &ComponentCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ComponentCore {
        &mut self.core
    }

    fn render(&self, width: u16) -> Vec<Line<'static>> {
        let style = self.core.style();
        let inner = width.saturating_sub(style.horizontal_overhead());
        let selected = Style::default().add_modifier(Modifier::REVERSED);

        let visible: Vec<(usize, &SelectItem)> = self
            .items
            .iter()
            .enumerate()
            .skip(self.view_offset)
            .take(MAX_VISIBLE_ITEMS)
            .collect();

        let mut lines: Vec<Line<'static>> = Vec::new();
        for &(index, item) in &visible {
            let rendered = markdown::render(&item.text, style.base, inner);
            for line in rendered.lines {
                if index == self.selected {
                    let spans = line
                        .spans
                        .into_iter()
                        .map(|s| {
                            let patched = s.style.patch(selected);
                            s.style(patched)
                        })
                        .collect::<Vec<_>>();
                    lines.push(pad_line(Line::from(spans), inner, selected));
                } else {
                    lines.push(line);
                }
            }
        }
        lines.push(Line::from(Span::styled(
            self.hint(visible.len()),
            Style::default().add_modifier(Modifier::DIM),
        )));

        render_styled(Text::from(lines), style, width, None)
    }

    fn on_key_event(&mut self, event: &KeyEvent) -> Option<ComponentEvent> {
        if !event.is_plain() {
            return None;
        }
        match event.key {
            Key::Up => self.move_up(),
            Key::Down => self.move_down(),
            Key::Enter | Key::Tab => {
                return self.selected_index().map(ComponentEvent::Selected);
            }
            Key::Esc => return Some(ComponentEvent::Cancelled),
            _ => return None,
        }
        Some(ComponentEvent::Consumed)
    }
}
