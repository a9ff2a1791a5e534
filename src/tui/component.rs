//! # Components
//!
//! A component turns its state into styled lines for a given width, and
//! tells the render loop when that output may have changed.
//!
//! ```text
//!   Terminal ──owns──► Box<dyn Component> ──owns──► children (Composite)
//!      ▲                     │ core.link                │ core.link
//!      │                     ▼                          ▼
//!   RenderSignal ◄──weak── Link ◄──────weak parent──── Link
//! ```
//!
//! Ownership only flows downward. Each component carries a [`Link`] holding
//! its dirty flag plus weak back-references to its parent's link and to the
//! terminal's [`RenderSignal`]. `mark_dirty` walks those references upward,
//! so a mutated grandchild dirties every ancestor and schedules a paint.
//! Detaching clears both references.
//!
//! ## Purity
//!
//! `render(&self, width)` must be a pure function of state and width: the
//! terminal caches each component's lines until it is dirtied again.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use ratatui::layout::Alignment;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Padding};

use super::input::{KeyEvent, MouseEvent, PasteEvent};

// ============================================================================
// Identity
// ============================================================================

/// Process-unique handle for a component instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentKey(u64);

impl ComponentKey {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

// ============================================================================
// Dirty propagation
// ============================================================================

/// Paint request flag owned by the terminal.
#[derive(Debug, Default)]
pub struct RenderSignal {
    requested: Cell<bool>,
}

impl RenderSignal {
    pub fn request(&self) {
        self.requested.set(true);
    }

    pub fn is_requested(&self) -> bool {
        self.requested.get()
    }

    /// Clears the request, returning whether one was pending.
    pub fn take(&self) -> bool {
        self.requested.replace(false)
    }
}

#[derive(Debug)]
pub struct Link {
    dirty: Cell<bool>,
    parent: RefCell<Weak<Link>>,
    signal: RefCell<Weak<RenderSignal>>,
}

impl Link {
    fn new() -> Self {
        Self {
            dirty: Cell::new(true),
            parent: RefCell::new(Weak::new()),
            signal: RefCell::new(Weak::new()),
        }
    }

    fn mark_dirty(&self) {
        self.dirty.set(true);
        if let Some(signal) = self.signal.borrow().upgrade() {
            signal.request();
        }
        if let Some(parent) = self.parent.borrow().upgrade() {
            parent.mark_dirty();
        }
    }
}

// ============================================================================
// Style
// ============================================================================

/// Border frame drawn around a component.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Panel {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub border_style: Style,
}

/// Declarative presentation: never changes behavior, only layout.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComponentStyle {
    /// Style applied beneath the content's own span styles.
    pub base: Style,
    pub panel: Option<Panel>,
    pub padding: Padding,
    /// Blank lines appended after the component.
    pub margin_bottom: u16,
}

impl ComponentStyle {
    pub fn base(mut self, style: Style) -> Self {
        self.base = style;
        self
    }

    pub fn panel(mut self, panel: Panel) -> Self {
        self.panel = Some(panel);
        self
    }

    pub fn padding(mut self, padding: Padding) -> Self {
        self.padding = padding;
        self
    }

    pub fn margin_bottom(mut self, lines: u16) -> Self {
        self.margin_bottom = lines;
        self
    }

    /// Columns consumed by borders and padding.
    pub fn horizontal_overhead(&self) -> u16 {
        let border = if self.panel.is_some() { 2 } else { 0 };
        border + self.padding.left + self.padding.right
    }

    /// Rows consumed by borders and padding.
    pub fn vertical_overhead(&self) -> u16 {
        let border = if self.panel.is_some() { 2 } else { 0 };
        border + self.padding.top + self.padding.bottom
    }

    /// The framing block, if this style has any framing at all.
    pub(crate) fn block(&self) -> Option<Block<'static>> {
        let block = match &self.panel {
            Some(panel) => {
                let mut block = Block::bordered()
                    .border_type(BorderType::Rounded)
                    .border_style(panel.border_style)
                    .title_style(panel.border_style);
                if let Some(title) = &panel.title {
                    block = block.title(Line::from(Span::raw(format!(" {title} "))));
                }
                if let Some(subtitle) = &panel.subtitle {
                    block = block.title_bottom(
                        Line::from(Span::raw(format!(" {subtitle} "))).alignment(Alignment::Right),
                    );
                }
                block
            }
            None if self.padding != Padding::ZERO => Block::default(),
            None => return None,
        };
        Some(block.padding(self.padding))
    }
}

// ============================================================================
// Core state shared by every component
// ============================================================================

#[derive(Debug)]
pub struct ComponentCore {
    key: ComponentKey,
    id: Option<String>,
    style: ComponentStyle,
    hidden: bool,
    link: Rc<Link>,
}

impl Default for ComponentCore {
    fn default() -> Self {
        Self::new()
    }
}

impl ComponentCore {
    pub fn new() -> Self {
        Self {
            key: ComponentKey::next(),
            id: None,
            style: ComponentStyle::default(),
            hidden: false,
            link: Rc::new(Link::new()),
        }
    }

    pub fn key(&self) -> ComponentKey {
        self.key
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn style(&self) -> &ComponentStyle {
        &self.style
    }

    pub fn set_style(&mut self, style: ComponentStyle) {
        if self.style != style {
            self.style = style;
            self.mark_dirty();
        }
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Hidden components contribute zero lines.
    pub fn set_hidden(&mut self, hidden: bool) {
        if self.hidden != hidden {
            self.hidden = hidden;
            self.mark_dirty();
        }
    }

    /// Flag this component (and every ancestor) for re-render and, if
    /// attached to a terminal, request a paint.
    pub fn mark_dirty(&self) {
        self.link.mark_dirty();
    }

    pub fn is_dirty(&self) -> bool {
        self.link.dirty.get()
    }

    pub(crate) fn clear_dirty(&self) {
        self.link.dirty.set(false);
    }

    pub fn is_attached(&self) -> bool {
        self.link.signal.borrow().strong_count() > 0 || self.link.parent.borrow().strong_count() > 0
    }

    pub(crate) fn attach_to_terminal(&self, signal: &Rc<RenderSignal>) {
        *self.link.signal.borrow_mut() = Rc::downgrade(signal);
        self.mark_dirty();
    }

    pub(crate) fn attach_to_parent(&self, parent: &ComponentCore) {
        *self.link.parent.borrow_mut() = Rc::downgrade(&parent.link);
        self.mark_dirty();
    }

    pub(crate) fn detach(&self) {
        *self.link.signal.borrow_mut() = Weak::new();
        *self.link.parent.borrow_mut() = Weak::new();
    }
}

// ============================================================================
// Traits
// ============================================================================

/// High-level outcome of handling an input event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComponentEvent {
    /// Handled, nothing further to report.
    Consumed,
    /// The user submitted text.
    Submitted(String),
    /// The editing cursor moved (row, column in characters).
    CursorMoved { row: usize, col: usize },
    /// A list item was chosen.
    Selected(usize),
    /// A list was dismissed without choosing.
    Cancelled,
}

pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A node in the render tree.
pub trait Component: AsAny {
    fn core(&self) -> &ComponentCore;
    fn core_mut(&mut self) -> &mut ComponentCore;

    /// Render to styled lines at `width` columns.
    fn render(&self, width: u16) -> Vec<Line<'static>>;

    /// Returns `None` when the event was not handled.
    fn on_key_event(&mut self, _event: &KeyEvent) -> Option<ComponentEvent> {
        None
    }

    fn on_paste(&mut self, _event: &PasteEvent) -> Option<ComponentEvent> {
        None
    }

    fn on_mouse_event(&mut self, _event: &MouseEvent) -> Option<ComponentEvent> {
        None
    }

    /// Advance one animation frame. Called only while the component is
    /// registered as an animation with its terminal.
    fn on_tick(&mut self) {}

    /// Capability check for collapse support.
    fn as_collapsible(&self) -> Option<&dyn Collapsible> {
        None
    }

    fn as_collapsible_mut(&mut self) -> Option<&mut dyn Collapsible> {
        None
    }
}

/// Components that can show a compacted view of their output.
pub trait Collapsible {
    fn is_collapsed(&self) -> bool;
    fn set_collapsed(&mut self, collapsed: bool);

    fn toggle_collapsed(&mut self) {
        let collapsed = self.is_collapsed();
        self.set_collapsed(!collapsed);
    }
}

/// Builder helpers available on every concrete component.
pub trait ComponentExt: Component + Sized {
    fn with_id(mut self, id: impl Into<String>) -> Self {
        self.core_mut().id = Some(id.into());
        self
    }

    fn with_style(mut self, style: ComponentStyle) -> Self {
        self.core_mut().style = style;
        self
    }

    fn hidden(mut self) -> Self {
        self.core_mut().hidden = true;
        self
    }

    fn boxed(self) -> Box<dyn Component>
    where
        Self: 'static,
    {
        Box::new(self)
    }
}

impl<T: Component + Sized> ComponentExt for T {}

/// Downcast a trait object to its concrete type.
pub fn downcast_ref<'a, T: Component + 'static>(
    component: &'a (dyn Component + 'static),
) -> Option<&'a T> {
    <dyn Component as AsAny>::as_any(component).downcast_ref::<T>()
}

pub fn downcast_mut<'a, T: Component + 'static>(
    component: &'a mut (dyn Component + 'static),
) -> Option<&'a mut T> {
    <dyn Component as AsAny>::as_any_mut(component).downcast_mut::<T>()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Probe {
        core: ComponentCore,
    }

    impl Component for Probe {
        fn core(&self) -> &ComponentCore {
            &self.core
        }
        fn core_mut(&mut self) -> &mut ComponentCore {
            &mut self.core
        }
        fn render(&self, _width: u16) -> Vec<Line<'static>> {
            vec![Line::from("probe")]
        }
    }

    fn probe() -> Probe {
        Probe {
            core: ComponentCore::new(),
        }
    }

    #[test]
    fn keys_are_unique() {
        assert_ne!(probe().core.key(), probe().core.key());
    }

    #[test]
    fn new_component_starts_dirty_and_detached() {
        let p = probe();
        assert!(p.core.is_dirty());
        assert!(!p.core.is_attached());
    }

    #[test]
    fn mark_dirty_reaches_parent_and_signal() {
        let signal = Rc::new(RenderSignal::default());
        let parent = probe();
        let child = probe();
        parent.core.attach_to_terminal(&signal);
        child.core.attach_to_parent(&parent.core);

        parent.core.clear_dirty();
        child.core.clear_dirty();
        signal.take();

        child.core.mark_dirty();
        assert!(child.core.is_dirty());
        assert!(parent.core.is_dirty());
        assert!(signal.take());
    }

    #[test]
    fn detached_component_does_not_signal() {
        let signal = Rc::new(RenderSignal::default());
        let p = probe();
        p.core.attach_to_terminal(&signal);
        p.core.detach();
        signal.take();

        p.core.mark_dirty();
        assert!(!signal.is_requested());
        assert!(!p.core.is_attached());
    }

    #[test]
    fn dropped_terminal_signal_is_harmless() {
        let p = probe();
        {
            let signal = Rc::new(RenderSignal::default());
            p.core.attach_to_terminal(&signal);
        }
        p.core.mark_dirty();
        assert!(p.core.is_dirty());
    }

    #[test]
    fn downcast_through_trait_object() {
        let mut boxed: Box<dyn Component> = probe().with_id("p").boxed();
        assert!(downcast_mut::<Probe>(boxed.as_mut()).is_some());
        assert_eq!(boxed.core().id(), Some("p"));
    }

    #[test]
    fn style_overheads() {
        let style = ComponentStyle::default()
            .panel(Panel::default())
            .padding(Padding::horizontal(1));
        assert_eq!(style.horizontal_overhead(), 4);
        assert_eq!(style.vertical_overhead(), 2);
        assert!(ComponentStyle::default().block().is_none());
    }
}
