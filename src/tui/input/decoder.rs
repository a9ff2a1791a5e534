//! Byte-stream → [`InputEvent`] decoder for POSIX terminals.
//!
//! `feed` may be called with arbitrary fragments: an incomplete escape
//! sequence, UTF-8 code point, or paste marker at the end of a fragment stays
//! buffered until the next call completes it. A lone ESC is ambiguous (the
//! escape key, or the start of a sequence), so it waits for either more bytes
//! or [`Decoder::flush`], which the reader calls after a short quiet period.
//!
//! Unrecognized sequences are dropped whole; the decoder never fails.

use log::{debug, trace};

use super::{InputEvent, Key, KeyEvent, MouseButton, MouseEvent, MouseKind, PasteEvent};

const ESC: u8 = 0x1b;
const PASTE_END: &[u8] = b"\x1b[201~";

/// Result of parsing one unit at the head of the buffer.
#[derive(Debug)]
enum Parsed {
    /// An event, and how many bytes it consumed.
    Event(InputEvent, usize),
    /// `ESC [200~`: everything up to the end marker is paste payload.
    PasteStart(usize),
    /// Bytes to drop without emitting anything.
    Skip(usize),
    /// The head is a prefix of something longer; wait for more input.
    Incomplete,
}

fn key(event: KeyEvent, len: usize) -> Parsed {
    Parsed::Event(InputEvent::Key(event), len)
}

#[derive(Debug, Default)]
pub struct Decoder {
    /// Undecoded tail carried between `feed` calls.
    pending: Vec<u8>,
    /// Payload collected so far while inside a bracketed paste.
    paste: Option<Vec<u8>>,
}

impl Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode as much of `bytes` (plus any buffered tail) as possible.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<InputEvent> {
        self.pending.extend_from_slice(bytes);
        let mut events = Vec::new();
        let consumed = self.decode_pending(&mut events);
        self.pending.drain(..consumed);
        events
    }

    /// True when a non-paste sequence is waiting for more bytes. The reader
    /// uses this to decide whether to arm the ESC timeout.
    pub fn has_pending(&self) -> bool {
        self.paste.is_none() && !self.pending.is_empty()
    }

    /// Force a best-effort interpretation of the buffered tail.
    ///
    /// A lone ESC becomes the `esc` key, `ESC x` becomes alt+x, anything else
    /// incomplete is dropped. An open paste is left alone: paste payloads can
    /// legitimately arrive slowly.
    pub fn flush(&mut self) -> Vec<InputEvent> {
        if self.paste.is_some() {
            return Vec::new();
        }
        let pending = std::mem::take(&mut self.pending);
        match pending.as_slice() {
            [] => Vec::new(),
            [ESC] => vec![InputEvent::Key(KeyEvent::new(Key::Esc))],
            [ESC, b] => match parse_plain(&[*b]) {
                Parsed::Event(InputEvent::Key(event), _) => {
                    vec![InputEvent::Key(event.with_alt())]
                }
                _ => Vec::new(),
            },
            rest => {
                debug!("Dropping {} undecodable bytes on flush", rest.len());
                Vec::new()
            }
        }
    }

    fn decode_pending(&mut self, events: &mut Vec<InputEvent>) -> usize {
        let mut pos = 0;
        loop {
            if let Some(paste) = self.paste.as_mut() {
                let rest = &self.pending[pos..];
                match find(rest, PASTE_END) {
                    Some(end) => {
                        paste.extend_from_slice(&rest[..end]);
                        let text = String::from_utf8_lossy(paste).into_owned();
                        self.paste = None;
                        trace!("Paste complete ({} bytes)", text.len());
                        events.push(InputEvent::Paste(PasteEvent { text }));
                        pos += end + PASTE_END.len();
                        continue;
                    }
                    None => {
                        // Hold back a possible partial end marker.
                        let keep = partial_suffix_len(rest, PASTE_END);
                        let take = rest.len() - keep;
                        paste.extend_from_slice(&rest[..take]);
                        return pos + take;
                    }
                }
            }

            if pos >= self.pending.len() {
                return pos;
            }

            match parse(&self.pending[pos..]) {
                Parsed::Event(event, len) => {
                    events.push(event);
                    pos += len;
                }
                Parsed::PasteStart(len) => {
                    self.paste = Some(Vec::new());
                    pos += len;
                }
                Parsed::Skip(len) => {
                    trace!("Skipping {len} unrecognized bytes");
                    pos += len;
                }
                Parsed::Incomplete => return pos,
            }
        }
    }
}

// ── Parsers ─────────────────────────────────────────────────────────────────

fn parse(buf: &[u8]) -> Parsed {
    if buf[0] == ESC {
        parse_escape(buf)
    } else {
        parse_plain(buf)
    }
}

/// Control bytes and UTF-8 text. `buf[0]` is never ESC here.
fn parse_plain(buf: &[u8]) -> Parsed {
    match buf[0] {
        b'\r' | b'\n' => key(KeyEvent::new(Key::Enter).with_text('\n'), 1),
        b'\t' => key(KeyEvent::new(Key::Tab).with_text('\t'), 1),
        0x7f | 0x08 => key(KeyEvent::new(Key::Backspace), 1),
        0x00 => key(KeyEvent::new(Key::Char(' ')).with_ctrl(), 1),
        b @ 0x01..=0x1a => key(KeyEvent::new(Key::Char((b'a' + b - 1) as char)).with_ctrl(), 1),
        0x1b..=0x1f => Parsed::Skip(1),
        b if b < 0x80 => key(KeyEvent::char(b as char), 1),
        lead => parse_utf8(buf, lead),
    }
}

fn parse_utf8(buf: &[u8], lead: u8) -> Parsed {
    let len = match lead {
        0xc2..=0xdf => 2,
        0xe0..=0xef => 3,
        0xf0..=0xf4 => 4,
        _ => return Parsed::Skip(1),
    };
    let available = buf.len().min(len);
    if buf[1..available].iter().any(|b| b & 0xc0 != 0x80) {
        return Parsed::Skip(1);
    }
    if buf.len() < len {
        return Parsed::Incomplete;
    }
    match std::str::from_utf8(&buf[..len]).ok().and_then(|s| s.chars().next()) {
        Some(c) => key(KeyEvent::char(c), len),
        None => Parsed::Skip(1),
    }
}

fn parse_escape(buf: &[u8]) -> Parsed {
    let Some(&next) = buf.get(1) else {
        return Parsed::Incomplete;
    };
    match next {
        b'[' => parse_csi(buf),
        b'O' => parse_ss3(buf),
        ESC => key(KeyEvent::new(Key::Esc), 1),
        _ => match parse_plain(&buf[1..]) {
            Parsed::Event(InputEvent::Key(event), len) => key(event.with_alt(), len + 1),
            Parsed::Skip(len) => Parsed::Skip(len + 1),
            other => other,
        },
    }
}

/// `ESC O x`: application-mode arrows, home/end, F1–F4.
fn parse_ss3(buf: &[u8]) -> Parsed {
    let Some(&fin) = buf.get(2) else {
        return Parsed::Incomplete;
    };
    match letter_key(fin) {
        Some(k) => key(KeyEvent::new(k), 3),
        None => Parsed::Skip(3),
    }
}

/// `ESC [ params final`.
fn parse_csi(buf: &[u8]) -> Parsed {
    let mut i = 2;
    while i < buf.len() && (0x30..=0x3f).contains(&buf[i]) {
        i += 1;
    }
    while i < buf.len() && (0x20..=0x2f).contains(&buf[i]) {
        i += 1;
    }
    let Some(&fin) = buf.get(i) else {
        return Parsed::Incomplete;
    };
    if !(0x40..=0x7e).contains(&fin) {
        // Not a CSI after all: drop the introducer and what we scanned.
        return Parsed::Skip(i);
    }
    let len = i + 1;
    let Ok(params) = std::str::from_utf8(&buf[2..i]) else {
        return Parsed::Skip(len);
    };

    if let Some(body) = params.strip_prefix('<') {
        return match (fin, parse_sgr_mouse(body, fin == b'M')) {
            (b'M' | b'm', Some(mouse)) => Parsed::Event(InputEvent::Mouse(mouse), len),
            _ => Parsed::Skip(len),
        };
    }
    if fin == b'~' && params == "200" {
        return Parsed::PasteStart(len);
    }
    if fin == b'Z' {
        return key(KeyEvent::new(Key::Tab).with_shift(), len);
    }

    let mut fields = params.split(';');
    let first = fields.next().unwrap_or_default();
    let modifier = fields.next().and_then(|m| m.parse::<u16>().ok());

    let resolved = if fin == b'~' {
        first.parse::<u16>().ok().and_then(tilde_key)
    } else {
        letter_key(fin)
    };

    match resolved {
        Some(k) => {
            let mut event = KeyEvent::new(k);
            if let Some(m) = modifier {
                event = event.with_modifier_param(m);
            }
            key(event, len)
        }
        None => Parsed::Skip(len),
    }
}

fn letter_key(fin: u8) -> Option<Key> {
    Some(match fin {
        b'A' => Key::Up,
        b'B' => Key::Down,
        b'C' => Key::Right,
        b'D' => Key::Left,
        b'H' => Key::Home,
        b'F' => Key::End,
        b'P' => Key::F(1),
        b'Q' => Key::F(2),
        b'R' => Key::F(3),
        b'S' => Key::F(4),
        _ => return None,
    })
}

fn tilde_key(code: u16) -> Option<Key> {
    Some(match code {
        1 | 7 => Key::Home,
        2 => Key::Insert,
        3 => Key::Delete,
        4 | 8 => Key::End,
        5 => Key::PageUp,
        6 => Key::PageDown,
        11..=15 => Key::F((code - 10) as u8),
        17..=21 => Key::F((code - 11) as u8),
        23 | 24 => Key::F((code - 12) as u8),
        _ => return None,
    })
}

/// `b;x;y` from an SGR (1006) mouse report.
fn parse_sgr_mouse(body: &str, pressed: bool) -> Option<MouseEvent> {
    let mut fields = body.split(';').map(|f| f.parse::<u16>().ok());
    let code = fields.next()??;
    let x = fields.next()??;
    let y = fields.next()??;

    let button = match code & 3 {
        0 => Some(MouseButton::Left),
        1 => Some(MouseButton::Middle),
        2 => Some(MouseButton::Right),
        _ => None,
    };
    let kind = if code & 64 != 0 {
        if code & 1 == 0 {
            MouseKind::ScrollUp
        } else {
            MouseKind::ScrollDown
        }
    } else if code & 32 != 0 {
        button.map_or(MouseKind::Move, MouseKind::Drag)
    } else if pressed {
        MouseKind::Press(button?)
    } else {
        MouseKind::Release(button.unwrap_or(MouseButton::Left))
    };

    Some(MouseEvent {
        kind,
        column: x.saturating_sub(1),
        row: y.saturating_sub(1),
        shift: code & 4 != 0,
        alt: code & 8 != 0,
        ctrl: code & 16 != 0,
    })
}

// ── Byte helpers ────────────────────────────────────────────────────────────

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Length of the longest suffix of `data` that is a proper prefix of `marker`.
fn partial_suffix_len(data: &[u8], marker: &[u8]) -> usize {
    (1..marker.len())
        .rev()
        .find(|&n| n <= data.len() && data.ends_with(&marker[..n]))
        .unwrap_or(0)
}
