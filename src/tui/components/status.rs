use ratatui::text::{Line, Span, Text};

use crate::tui::component::{Component, ComponentCore};
use crate::tui::render::render_styled;

/// Braille spinner, one frame per animation tick.
pub const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// One line of status text with a spinner in front while running.
pub struct StatusComponent {
    core: ComponentCore,
    text: String,
    running: bool,
    frame: usize,
}

impl StatusComponent {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            core: ComponentCore::new(),
            text: text.into(),
            running: false,
            frame: 0,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        if self.text != text {
            self.text = text;
            self.core.mark_dirty();
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Returns true when the flag changed. Stopping rewinds the spinner.
    pub fn set_running(&mut self, running: bool) -> bool {
        if self.running == running {
            return false;
        }
        self.running = running;
        self.frame = 0;
        self.core.mark_dirty();
        true
    }

    pub fn frame(&self) -> usize {
        self.frame
    }
}

impl Component for StatusComponent {
    fn core(&self) -> &ComponentCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ComponentCore {
        &mut self.core
    }

    fn render(&self, width: u16) -> Vec<Line<'static>> {
        let mut spans = Vec::new();
        if self.running {
            spans.push(Span::raw(format!("{} ", SPINNER_FRAMES[self.frame])));
        }
        spans.push(Span::raw(self.text.clone()));
        render_styled(Text::from(Line::from(spans)), self.core.style(), width, None)
    }

    fn on_tick(&mut self) {
        if self.running {
            self.frame = (self.frame + 1) % SPINNER_FRAMES.len();
            self.core.mark_dirty();
        }
    }
}
