//! Full-screen modal views.
//!
//! While any screen is on the terminal's stack, the top one receives every
//! input event and owns the whole (alternate) screen; the component list is
//! suspended underneath.

use ratatui::text::Line;

use super::input::{KeyEvent, MouseEvent, PasteEvent};

/// What the terminal should do after a screen handled an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenAction {
    /// Nothing changed; no repaint.
    Ignored,
    Redraw,
    /// Pop this screen.
    Close,
}

pub trait Screen {
    /// Called before the first paint and on every resize.
    fn set_size(&mut self, width: u16, height: u16);

    /// Exactly the lines to show, at most `height` of them.
    fn render(&self, width: u16, height: u16) -> Vec<Line<'static>>;

    fn on_key_event(&mut self, event: &KeyEvent) -> ScreenAction;

    fn on_paste(&mut self, _event: &PasteEvent) -> ScreenAction {
        ScreenAction::Ignored
    }

    fn on_mouse_event(&mut self, _event: &MouseEvent) -> ScreenAction {
        ScreenAction::Ignored
    }
}
