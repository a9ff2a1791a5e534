//! # Input Component
//!
//! A multi-line text editor with an emacs/readline keymap.
//!
//! ## Keymap
//!
//! | Keys                         | Action                        |
//! |------------------------------|-------------------------------|
//! | left/right, Ctrl+b/f         | character motion              |
//! | Alt+left/right, Alt+b/f      | word motion                   |
//! | home/end, Ctrl+a/e           | line start / end              |
//! | up/down                      | row motion (unhandled at edge) |
//! | backspace, delete, Ctrl+d    | delete character              |
//! | Ctrl+k / Ctrl+u              | kill to line end / start      |
//! | Ctrl+w / Alt+d               | kill word back / forward      |
//! | Alt+u / Alt+l / Alt+c        | upper / lower / capitalize    |
//! | enter                        | submit, or newline when multi-line |
//! | Alt+enter                    | submit                        |
//!
//! Any edit or motion reports [`ComponentEvent::CursorMoved`]; keys the
//! editor cannot act on (up on the first row, Ctrl+d on an empty buffer)
//! return `None` so the owner can claim them.

mod editor;

pub use editor::{TextEditor, WordCase};

use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span, Text};
use unicode_width::UnicodeWidthStr;

use crate::tui::commands::KeyBinding;
use crate::tui::component::{Component, ComponentCore, ComponentEvent};
use crate::tui::input::{Key, KeyEvent, PasteEvent};
use crate::tui::render::render_styled;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Edit {
    Left,
    Right,
    WordLeft,
    WordRight,
    LineStart,
    LineEnd,
    Up,
    Down,
    Backspace,
    Delete,
    DeleteOrEof,
    KillToEnd,
    KillToStart,
    KillWordBack,
    KillWordForward,
    Case(WordCase),
    Enter,
    Submit,
}

const KEYMAP: &[(KeyBinding, Edit)] = &[
    (KeyBinding::new(Key::Left), Edit::Left),
    (KeyBinding::char('b').ctrl(), Edit::Left),
    (KeyBinding::new(Key::Right), Edit::Right),
    (KeyBinding::char('f').ctrl(), Edit::Right),
    (KeyBinding::new(Key::Left).alt(), Edit::WordLeft),
    (KeyBinding::char('b').alt(), Edit::WordLeft),
    (KeyBinding::new(Key::Right).alt(), Edit::WordRight),
    (KeyBinding::char('f').alt(), Edit::WordRight),
    (KeyBinding::new(Key::Home), Edit::LineStart),
    (KeyBinding::char('a').ctrl(), Edit::LineStart),
    (KeyBinding::new(Key::End), Edit::LineEnd),
    (KeyBinding::char('e').ctrl(), Edit::LineEnd),
    (KeyBinding::new(Key::Up), Edit::Up),
    (KeyBinding::char('p').ctrl(), Edit::Up),
    (KeyBinding::new(Key::Down), Edit::Down),
    (KeyBinding::char('n').ctrl(), Edit::Down),
    (KeyBinding::new(Key::Backspace), Edit::Backspace),
    (KeyBinding::new(Key::Delete), Edit::Delete),
    (KeyBinding::char('d').ctrl(), Edit::DeleteOrEof),
    (KeyBinding::char('k').ctrl(), Edit::KillToEnd),
    (KeyBinding::char('u').ctrl(), Edit::KillToStart),
    (KeyBinding::char('w').ctrl(), Edit::KillWordBack),
    (KeyBinding::char('d').alt(), Edit::KillWordForward),
    (KeyBinding::char('u').alt(), Edit::Case(WordCase::Upper)),
    (KeyBinding::char('l').alt(), Edit::Case(WordCase::Lower)),
    (KeyBinding::char('c').alt(), Edit::Case(WordCase::Capitalize)),
    (KeyBinding::new(Key::Enter), Edit::Enter),
    (KeyBinding::new(Key::Enter).alt(), Edit::Submit),
];

fn lookup(event: &KeyEvent) -> Option<Edit> {
    KEYMAP
        .iter()
        .find(|(binding, _)| binding.matches(event))
        .map(|(_, edit)| *edit)
}

pub struct InputComponent {
    core: ComponentCore,
    editor: TextEditor,
    prefix: String,
    single_line: bool,
    show_cursor: bool,
}

impl Default for InputComponent {
    fn default() -> Self {
        Self::new()
    }
}

impl InputComponent {
    /// Multi-line editor: enter inserts a newline, alt+enter submits.
    pub fn new() -> Self {
        Self {
            core: ComponentCore::new(),
            editor: TextEditor::new(),
            prefix: String::new(),
            single_line: false,
            show_cursor: true,
        }
    }

    /// Enter submits.
    pub fn single_line(mut self) -> Self {
        self.single_line = true;
        self
    }

    /// Text drawn before the first row; later rows are indented to match.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn text(&self) -> &str {
        self.editor.text()
    }

    pub fn editor(&self) -> &TextEditor {
        &self.editor
    }

    pub fn set_text(&mut self, text: &str) {
        self.editor.set_text(text);
        self.core.mark_dirty();
    }

    pub fn clear(&mut self) {
        self.editor.clear();
        self.core.mark_dirty();
    }

    pub fn cursor_row(&self) -> usize {
        self.editor.cursor_row()
    }

    pub fn cursor_col(&self) -> usize {
        self.editor.cursor_col()
    }

    pub fn line_count(&self) -> usize {
        self.editor.line_count()
    }

    pub fn set_cursor_position(&mut self, row: usize, col: usize) {
        self.editor.set_cursor_position(row, col);
        self.core.mark_dirty();
    }

    /// Replace the word under the cursor (or `range`, in bytes) with `with`.
    pub fn replace_word(&mut self, with: &str, range: Option<(usize, usize)>) {
        let (start, end) = range.unwrap_or_else(|| self.editor.word_range());
        self.editor.replace_range(start, end, with);
        self.core.mark_dirty();
    }

    pub fn set_cursor_visible(&mut self, visible: bool) {
        if self.show_cursor != visible {
            self.show_cursor = visible;
            self.core.mark_dirty();
        }
    }

    fn cursor_event(&self) -> ComponentEvent {
        ComponentEvent::CursorMoved {
            row: self.editor.cursor_row(),
            col: self.editor.cursor_col(),
        }
    }

    fn apply(&mut self, edit: Edit) -> Option<ComponentEvent> {
        let e = &mut self.editor;
        let changed = match edit {
            Edit::Left => e.move_left(),
            Edit::Right => e.move_right(),
            Edit::WordLeft => e.move_word_left(),
            Edit::WordRight => e.move_word_right(),
            Edit::LineStart => e.move_line_start(),
            Edit::LineEnd => e.move_line_end(),
            Edit::Up => e.move_up(),
            Edit::Down => e.move_down(),
            Edit::Backspace => e.backspace(),
            Edit::Delete => e.delete(),
            Edit::DeleteOrEof => {
                if e.is_empty() {
                    return None;
                }
                e.delete()
            }
            Edit::KillToEnd => e.kill_to_end(),
            Edit::KillToStart => e.kill_to_start(),
            Edit::KillWordBack => e.kill_word_back(),
            Edit::KillWordForward => e.kill_word_forward(),
            Edit::Case(case) => e.change_word_case(case),
            Edit::Enter if self.single_line => {
                return Some(ComponentEvent::Submitted(e.text().to_string()));
            }
            Edit::Enter => e.insert_char('\n'),
            Edit::Submit => return Some(ComponentEvent::Submitted(e.text().to_string())),
        };

        match (edit, changed) {
            (_, true) => {
                self.core.mark_dirty();
                Some(self.cursor_event())
            }
            // Vertical motion at the edge belongs to the owner (history).
            (Edit::Up | Edit::Down, false) => None,
            (_, false) => Some(ComponentEvent::Consumed),
        }
    }

    /// The row containing the cursor, split around a reverse-video cursor cell.
    fn cursor_line(&self, row: &str, col: usize) -> Vec<Span<'static>> {
        let split = row
            .char_indices()
            .nth(col)
            .map(|(i, _)| i)
            .unwrap_or(row.len());
        let (before, rest) = row.split_at(split);
        let mut chars = rest.chars();
        let under = chars.next().map(String::from).unwrap_or_else(|| " ".to_string());
        let after: String = chars.collect();

        let mut spans = vec![Span::raw(before.to_string())];
        spans.push(Span::styled(
            under,
            Style::default().add_modifier(Modifier::REVERSED),
        ));
        if !after.is_empty() {
            spans.push(Span::raw(after));
        }
        spans
    }
}

impl Component for InputComponent {
    fn core(&self) -> &ComponentCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ComponentCore {
        &mut self.core
    }

    fn render(&self, width: u16) -> Vec<Line<'static>> {
        let cursor_row = self.editor.cursor_row();
        let cursor_col = self.editor.cursor_col();
        let indent = " ".repeat(self.prefix.width());

        let lines: Vec<Line<'static>> = self
            .editor
            .lines()
            .into_iter()
            .enumerate()
            .map(|(i, row)| {
                let lead = if i == 0 { self.prefix.clone() } else { indent.clone() };
                let mut spans = vec![Span::raw(lead)];
                if self.show_cursor && i == cursor_row {
                    spans.extend(self.cursor_line(row, cursor_col));
                } else {
                    spans.push(Span::raw(row.to_string()));
                }
                Line::from(spans)
            })
            .collect();

        render_styled(Text::from(lines), self.core.style(), width, None)
    }

    fn on_key_event(&mut self, event: &KeyEvent) -> Option<ComponentEvent> {
        if let Some(edit) = lookup(event) {
            return self.apply(edit);
        }
        let text = event.insertable_text()?;
        if text == '\t' {
            return None;
        }
        self.editor.insert_char(text);
        self.core.mark_dirty();
        Some(self.cursor_event())
    }

    fn on_paste(&mut self, event: &PasteEvent) -> Option<ComponentEvent> {
        let text = if self.single_line {
            event.text.replace(['\r', '\n'], " ")
        } else {
            event.text.replace("\r\n", "\n").replace('\r', "\n")
        };
        if !self.editor.insert_str(&text) {
            return Some(ComponentEvent::Consumed);
        }
        self.core.mark_dirty();
        Some(self.cursor_event())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::plain;

    fn type_str(input: &mut InputComponent, s: &str) {
        for c in s.chars() {
            input.on_key_event(&KeyEvent::char(c));
        }
    }

    #[test]
    fn typing_reports_cursor_moves() {
        let mut input = InputComponent::new();
        let ev = input.on_key_event(&KeyEvent::char('h'));
        assert_eq!(ev, Some(ComponentEvent::CursorMoved { row: 0, col: 1 }));
        type_str(&mut input, "I");
        assert_eq!(input.text(), "hI");
    }

    #[test]
    fn enter_submits_in_single_line_mode() {
        let mut input = InputComponent::new().single_line();
        type_str(&mut input, "go");
        let ev = input.on_key_event(&KeyEvent::new(Key::Enter).with_text('\n'));
        assert_eq!(ev, Some(ComponentEvent::Submitted("go".into())));
        // Owner decides whether to clear.
        assert_eq!(input.text(), "go");
    }

    #[test]
    fn enter_breaks_line_in_multi_line_mode() {
        let mut input = InputComponent::new();
        type_str(&mut input, "a");
        input.on_key_event(&KeyEvent::new(Key::Enter).with_text('\n'));
        type_str(&mut input, "b");
        assert_eq!(input.text(), "a\nb");
        let ev = input.on_key_event(&KeyEvent::new(Key::Enter).with_alt());
        assert_eq!(ev, Some(ComponentEvent::Submitted("a\nb".into())));
    }

    #[test]
    fn vertical_motion_at_edges_is_unhandled() {
        let mut input = InputComponent::new();
        input.set_text("one\ntwo");
        assert_eq!(input.on_key_event(&KeyEvent::new(Key::Down)), None);
        assert!(input.on_key_event(&KeyEvent::new(Key::Up)).is_some());
        assert_eq!(input.on_key_event(&KeyEvent::new(Key::Up)), None);
        assert_eq!(input.on_key_event(&KeyEvent::char('p').with_ctrl()), None);
    }

    #[test]
    fn ctrl_d_on_empty_buffer_is_unhandled() {
        let mut input = InputComponent::new();
        assert_eq!(input.on_key_event(&KeyEvent::char('d').with_ctrl()), None);
        input.set_text("x");
        input.set_cursor_position(0, 0);
        assert!(input.on_key_event(&KeyEvent::char('d').with_ctrl()).is_some());
        assert_eq!(input.text(), "");
    }

    #[test]
    fn unbound_control_keys_fall_through() {
        let mut input = InputComponent::new();
        assert_eq!(input.on_key_event(&KeyEvent::char('x').with_ctrl()), None);
        assert_eq!(input.on_key_event(&KeyEvent::new(Key::Tab).with_text('\t')), None);
        assert_eq!(input.text(), "");
    }

    #[test]
    fn paste_inserts_at_cursor() {
        let mut input = InputComponent::new().single_line();
        input.set_text("ab");
        input.set_cursor_position(0, 1);
        input.on_paste(&PasteEvent {
            text: "x\ny".into(),
        });
        assert_eq!(input.text(), "ax yb");
    }

    #[test]
    fn render_prefixes_and_draws_cursor() {
        let mut input = InputComponent::new().with_prefix("> ");
        input.set_text("hi\nyo");
        let lines = input.render(20);
        assert_eq!(plain(&lines[0]), "> hi");
        // The cursor cell past the end is a visible reverse-video space.
        assert_eq!(plain(&lines[1]), "  yo ");
        let cursor = lines[1].spans.iter().find(|s| s.style.add_modifier.contains(Modifier::REVERSED));
        assert_eq!(cursor.map(|s| s.content.as_ref()), Some(" "));
    }

    #[test]
    fn replace_word_under_cursor() {
        let mut input = InputComponent::new();
        input.set_text("open /he");
        input.replace_word("/help ", None);
        assert_eq!(input.text(), "open /help ");
    }
}
