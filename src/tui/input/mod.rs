//! # Input Events
//!
//! Structured input produced by the [`decoder`] from the raw byte stream.
//!
//! ```text
//!   stdin bytes ──► Decoder::feed ──► [InputEvent] ──► render loop
//!                        ▲
//!                 ESC timeout / flush
//! ```
//!
//! Events are plain values: the loop routes them to the active screen or the
//! focused component, and nothing downstream mutates them.

pub mod decoder;
pub mod reader;

use std::fmt;

pub use decoder::Decoder;

/// Whether a key went down or came back up. POSIX terminals only report
/// presses, so the decoder always emits `Down`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyAction {
    #[default]
    Down,
    Up,
}

/// Logical key name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// A single character. Letters are always lowercase here; the shift flag
    /// on the event carries the case.
    Char(char),
    Enter,
    Tab,
    Backspace,
    Delete,
    Insert,
    Esc,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    F(u8),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Char(' ') => write!(f, "space"),
            Key::Char(c) => write!(f, "{c}"),
            Key::Enter => write!(f, "enter"),
            Key::Tab => write!(f, "tab"),
            Key::Backspace => write!(f, "backspace"),
            Key::Delete => write!(f, "delete"),
            Key::Insert => write!(f, "insert"),
            Key::Esc => write!(f, "esc"),
            Key::Up => write!(f, "up"),
            Key::Down => write!(f, "down"),
            Key::Left => write!(f, "left"),
            Key::Right => write!(f, "right"),
            Key::Home => write!(f, "home"),
            Key::End => write!(f, "end"),
            Key::PageUp => write!(f, "page_up"),
            Key::PageDown => write!(f, "page_down"),
            Key::F(n) => write!(f, "f{n}"),
        }
    }
}

/// A single key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub action: KeyAction,
    pub key: Key,
    /// Literal text the key inserts, if any (`enter` inserts `'\n'`).
    pub text: Option<char>,
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
}

impl KeyEvent {
    /// A bare key press with no text and no modifiers.
    pub fn new(key: Key) -> Self {
        Self {
            action: KeyAction::Down,
            key,
            text: None,
            ctrl: false,
            alt: false,
            shift: false,
        }
    }

    /// A printable character. Uppercase ASCII letters become the lowercase
    /// key with `shift` set; the text keeps the original case.
    pub fn char(c: char) -> Self {
        if c.is_ascii_uppercase() {
            Self::new(Key::Char(c.to_ascii_lowercase()))
                .with_text(c)
                .with_shift()
        } else {
            Self::new(Key::Char(c)).with_text(c)
        }
    }

    pub fn with_text(mut self, text: char) -> Self {
        self.text = Some(text);
        self
    }

    pub fn with_ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn with_alt(mut self) -> Self {
        self.alt = true;
        self
    }

    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }

    /// Applies an xterm modifier parameter (`1 + bitmask`, shift=1 alt=2 ctrl=4).
    pub(crate) fn with_modifier_param(mut self, param: u16) -> Self {
        let bits = param.saturating_sub(1);
        self.shift |= bits & 1 != 0;
        self.alt |= bits & 2 != 0;
        self.ctrl |= bits & 4 != 0;
        self
    }

    /// True when no modifier is held.
    pub fn is_plain(&self) -> bool {
        !(self.ctrl || self.alt || self.shift)
    }

    /// Text this key would insert into an editor: present only when no
    /// ctrl/alt chord is held.
    pub fn insertable_text(&self) -> Option<char> {
        if self.ctrl || self.alt {
            return None;
        }
        self.text
    }
}

/// A bracketed paste, delivered whole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasteEvent {
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseKind {
    Press(MouseButton),
    Release(MouseButton),
    Drag(MouseButton),
    Move,
    ScrollUp,
    ScrollDown,
}

/// An SGR mouse report. Coordinates are zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseEvent {
    pub kind: MouseKind,
    pub column: u16,
    pub row: u16,
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
}

/// Anything the decoder can produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Key(KeyEvent),
    Paste(PasteEvent),
    Mouse(MouseEvent),
}

impl From<KeyEvent> for InputEvent {
    fn from(event: KeyEvent) -> Self {
        InputEvent::Key(event)
    }
}
