//! # Composite Component
//!
//! Owns an ordered list of children and renders them top to bottom.
//!
//! ```text
//!   CompositeComponent
//!   ├── child 0   (hidden: contributes no lines)
//!   ├── child 1   ◄── focus (receives keys, paste, mouse, collapse)
//!   └── child 2
//! ```
//!
//! Focus is an index that is either `None` or valid for the current list;
//! removals renumber it.

use ratatui::text::{Line, Text};

use crate::tui::component::{
    Collapsible, Component, ComponentCore, ComponentEvent, ComponentKey, ComponentStyle,
};
use crate::tui::input::{KeyEvent, MouseEvent, PasteEvent};
use crate::tui::render::render_styled;

#[derive(Default)]
pub struct CompositeComponent {
    core: ComponentCore,
    children: Vec<Box<dyn Component>>,
    focus: Option<usize>,
}

impl CompositeComponent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn children(&self) -> &[Box<dyn Component>] {
        &self.children
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    fn contains(&self, child: &dyn Component) -> bool {
        let key = child.core().key();
        let id = child.core().id();
        self.children
            .iter()
            .any(|c| c.core().key() == key || (id.is_some() && c.core().id() == id))
    }

    /// Append a child. A child already present (same key or id) is ignored;
    /// returns whether it was added.
    pub fn add(&mut self, child: Box<dyn Component>) -> bool {
        let index = self.children.len();
        self.insert(index, child)
    }

    /// Insert at `index`, clamped to the end.
    pub fn insert(&mut self, index: usize, child: Box<dyn Component>) -> bool {
        if self.contains(child.as_ref()) {
            return false;
        }
        let index = index.min(self.children.len());
        child.core().attach_to_parent(&self.core);
        self.children.insert(index, child);
        if let Some(focus) = self.focus
            && focus >= index
        {
            self.focus = Some(focus + 1);
        }
        true
    }

    /// Detach and return the child with `key`; `None` if absent.
    pub fn remove(&mut self, key: ComponentKey) -> Option<Box<dyn Component>> {
        let index = self.children.iter().position(|c| c.core().key() == key)?;
        Some(self.remove_at(index))
    }

    pub fn remove_by_id(&mut self, id: &str) -> Option<Box<dyn Component>> {
        let index = self.children.iter().position(|c| c.core().id() == Some(id))?;
        Some(self.remove_at(index))
    }

    fn remove_at(&mut self, index: usize) -> Box<dyn Component> {
        let child = self.children.remove(index);
        child.core().detach();
        self.focus = match self.focus {
            Some(f) if f == index => None,
            Some(f) if f > index => Some(f - 1),
            other => other,
        };
        self.core.mark_dirty();
        child
    }

    pub fn clear(&mut self) {
        for child in self.children.drain(..) {
            child.core().detach();
        }
        self.focus = None;
        self.core.mark_dirty();
    }

    pub fn focus(&self) -> Option<usize> {
        self.focus
    }

    /// Focus the child at `index`, or clear focus with `None`. An index out
    /// of range is rejected.
    pub fn set_focus(&mut self, index: Option<usize>) -> bool {
        match index {
            Some(i) if i >= self.children.len() => false,
            _ => {
                self.focus = index;
                true
            }
        }
    }

    pub fn focus_id(&mut self, id: &str) -> bool {
        let index = self.children.iter().position(|c| c.core().id() == Some(id));
        index.is_some() && self.set_focus(index)
    }

    pub fn focused(&self) -> Option<&(dyn Component + 'static)> {
        self.focus.and_then(|i| self.children.get(i)).map(|c| c.as_ref())
    }

    pub fn focused_mut(&mut self) -> Option<&mut (dyn Component + 'static)> {
        self.focus
            .and_then(|i| self.children.get_mut(i))
            .map(|c| c.as_mut())
    }

    pub fn child(&self, id: &str) -> Option<&(dyn Component + 'static)> {
        self.children
            .iter()
            .find(|c| c.core().id() == Some(id))
            .map(|c| c.as_ref())
    }

    pub fn child_mut(&mut self, id: &str) -> Option<&mut (dyn Component + 'static)> {
        self.children
            .iter_mut()
            .find(|c| c.core().id() == Some(id))
            .map(|c| c.as_mut())
    }
}

impl Component for CompositeComponent {
    fn core(&self) -> &ComponentCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ComponentCore {
        &mut self.core
    }

    fn render(&self, width: u16) -> Vec<Line<'static>> {
        let style = self.core.style();
        let inner = width.saturating_sub(style.horizontal_overhead());
        let lines: Vec<Line<'static>> = self
            .children
            .iter()
            .filter(|c| !c.core().is_hidden())
            .flat_map(|c| c.render(inner))
            .collect();
        if *style == ComponentStyle::default() {
            lines
        } else {
            render_styled(Text::from(lines), style, width, None)
        }
    }

    fn on_key_event(&mut self, event: &KeyEvent) -> Option<ComponentEvent> {
        self.focused_mut()?.on_key_event(event)
    }

    fn on_paste(&mut self, event: &PasteEvent) -> Option<ComponentEvent> {
        self.focused_mut()?.on_paste(event)
    }

    fn on_mouse_event(&mut self, event: &MouseEvent) -> Option<ComponentEvent> {
        self.focused_mut()?.on_mouse_event(event)
    }

    fn as_collapsible(&self) -> Option<&dyn Collapsible> {
        Some(self)
    }

    fn as_collapsible_mut(&mut self) -> Option<&mut dyn Collapsible> {
        Some(self)
    }
}

/// Collapse goes to the focused child; without one it does nothing.
impl Collapsible for CompositeComponent {
    fn is_collapsed(&self) -> bool {
        self.focused()
            .and_then(|c| c.as_collapsible())
            .is_some_and(|c| c.is_collapsed())
    }

    fn set_collapsed(&mut self, collapsed: bool) {
        if let Some(child) = self.focused_mut().and_then(|c| c.as_collapsible_mut()) {
            child.set_collapsed(collapsed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::plain_lines;
    use crate::tui::component::{ComponentExt, downcast_mut};
    use crate::tui::components::TextComponent;

    fn text(id: &str, body: &str) -> Box<dyn Component> {
        TextComponent::new(body.to_string()).with_id(id).boxed()
    }

    #[test]
    fn hidden_children_contribute_no_lines() {
        let mut c = CompositeComponent::new();
        c.add(TextComponent::new("gone").with_id("a").hidden().boxed());
        c.add(text("b", "first"));
        c.add(text("c", "second"));
        assert_eq!(plain_lines(&c.render(20)), vec!["first", "second"]);
    }

    #[test]
    fn add_and_remove_are_idempotent() {
        let mut c = CompositeComponent::new();
        assert!(c.add(text("a", "x")));
        assert!(!c.add(text("a", "y")));
        assert_eq!(c.len(), 1);
        assert!(c.remove_by_id("a").is_some());
        assert!(c.remove_by_id("a").is_none());
        assert!(c.is_empty());
    }

    #[test]
    fn removal_renumbers_focus() {
        let mut c = CompositeComponent::new();
        c.add(text("a", "a"));
        c.add(text("b", "b"));
        c.add(text("c", "c"));
        assert!(c.focus_id("c"));
        c.remove_by_id("a");
        assert_eq!(c.focus(), Some(1));
        c.remove_by_id("c");
        assert_eq!(c.focus(), None);
    }

    #[test]
    fn insert_before_focus_shifts_it() {
        let mut c = CompositeComponent::new();
        c.add(text("a", "a"));
        c.set_focus(Some(0));
        c.insert(0, text("z", "z"));
        assert_eq!(c.focus(), Some(1));
        assert_eq!(c.focused().and_then(|f| f.core().id()), Some("a"));
    }

    #[test]
    fn invalid_focus_rejected() {
        let mut c = CompositeComponent::new();
        assert!(!c.set_focus(Some(0)));
        assert_eq!(c.focus(), None);
    }

    #[test]
    fn collapse_delegates_to_focused_child() {
        let body = (0..12).map(|i| i.to_string()).collect::<Vec<_>>().join("\n");
        let mut c = CompositeComponent::new();
        c.add(text("a", &body));
        c.toggle_collapsed();
        assert!(!c.is_collapsed());
        assert_eq!(c.render(20).len(), 12);

        c.set_focus(Some(0));
        c.toggle_collapsed();
        assert!(c.is_collapsed());
        assert_eq!(c.render(20).len(), 11);
    }

    #[test]
    fn child_mutation_dirties_parent() {
        let mut c = CompositeComponent::new();
        c.add(text("a", "x"));
        c.core().clear_dirty();
        let child = c.child_mut("a").and_then(|a| downcast_mut::<TextComponent>(a));
        if let Some(t) = child {
            t.set_text("changed");
        }
        assert!(c.core().is_dirty());
    }
}
