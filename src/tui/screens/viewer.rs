//! # Viewer Screen
//!
//! A pager over pre-wrapped text with backward search.
//!
//! ```text
//!   ┌──────────────────────────────┐
//!   │ body: lines[offset ..        │  height - FOOTER_LINES rows
//!   │        offset + viewport]    │
//!   ├──────────────────────────────┤
//!   │ ---------------------------- │  separator
//!   │ q: quit  j/k: line ...       │  key help
//!   │ /query  title  12/80 (15%)   │  status
//!   └──────────────────────────────┘
//! ```
//!
//! The offset is always within `[0, max(0, total - viewport)]`. Motion that
//! would leave it unchanged reports [`ScreenAction::Ignored`], so boundary
//! key presses never repaint.
//!
//! Search takes a regular expression. A new query looks backward from the
//! last visible line, inclusive; `n` continues from just above the previous
//! match. It never wraps. An invalid pattern keeps the previous search and
//! only reports itself in the status line.

use ratatui::style::{Modifier, Style};
use regex::Regex;
use ratatui::text::{Line, Span};
use log::debug;
use unicode_width::UnicodeWidthChar;

use crate::tui::input::{Key, KeyEvent, MouseEvent, MouseKind};
use crate::tui::screen::{Screen, ScreenAction};

pub const FOOTER_LINES: u16 = 3;
const MOUSE_SCROLL_LINES: usize = 3;

const HELP: &str = "q: quit  j/k, up/down: line  f/b, pgdn/pgup, space: page  g/G: top/bottom  /: search  n: next";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitialPosition {
    Top,
    Bottom,
}

#[derive(Debug, Default)]
struct Search {
    /// Query being typed, while in search mode.
    input: Option<String>,
    query: Option<String>,
    pattern: Option<Regex>,
    match_line: Option<usize>,
    not_found: bool,
    /// Last rejected pattern text.
    invalid: Option<String>,
}

pub struct Viewer {
    title: String,
    source: Vec<String>,
    lines: Vec<String>,
    wrapped_width: Option<u16>,
    offset: usize,
    height: u16,
    initial: InitialPosition,
    positioned: bool,
    search: Search,
}

impl Viewer {
    pub fn new(title: impl Into<String>, text: &str, initial: InitialPosition) -> Self {
        let source: Vec<String> = text.lines().map(|l| l.replace('\t', "    ")).collect();
        Self {
            title: title.into(),
            lines: source.clone(),
            source,
            wrapped_width: None,
            offset: 0,
            height: 0,
            initial,
            positioned: false,
            search: Search::default(),
        }
    }

    /// Static text, opened at the top.
    pub fn text(title: impl Into<String>, text: &str) -> Self {
        Self::new(title, text, InitialPosition::Top)
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn total_lines(&self) -> usize {
        self.lines.len()
    }

    pub fn match_line(&self) -> Option<usize> {
        self.search.match_line
    }

    pub fn is_searching(&self) -> bool {
        self.search.input.is_some()
    }

    fn viewport(&self) -> usize {
        self.height.saturating_sub(FOOTER_LINES) as usize
    }

    fn max_offset(&self) -> usize {
        self.lines.len().saturating_sub(self.viewport())
    }

    fn rewrap(&mut self, width: u16) {
        let options = textwrap::Options::new(width.max(1) as usize).break_words(true);
        self.lines = self
            .source
            .iter()
            .flat_map(|line| {
                if line.is_empty() {
                    vec![String::new()]
                } else {
                    textwrap::wrap(line, &options)
                        .into_iter()
                        .map(|l| l.into_owned())
                        .collect()
                }
            })
            .collect();
        self.wrapped_width = Some(width);
        // Line numbers changed; an old match no longer points anywhere useful.
        self.search.match_line = None;
    }

    fn scroll_to(&mut self, offset: usize) -> ScreenAction {
        let offset = offset.min(self.max_offset());
        if offset == self.offset {
            return ScreenAction::Ignored;
        }
        self.offset = offset;
        ScreenAction::Redraw
    }

    fn scroll_by(&mut self, delta: isize) -> ScreenAction {
        let target = self.offset.saturating_add_signed(delta);
        self.scroll_to(target)
    }

    fn page(&self) -> isize {
        self.viewport().max(1) as isize
    }

    /// Bring `line` into view, moving as little as possible.
    fn reveal(&mut self, line: usize) {
        let viewport = self.viewport().max(1);
        if line < self.offset {
            self.offset = line;
        } else if line >= self.offset + viewport {
            self.offset = line + 1 - viewport;
        }
        self.offset = self.offset.min(self.max_offset());
    }

    fn find_backward(&self, pattern: &Regex, from: usize) -> Option<usize> {
        if self.lines.is_empty() {
            return None;
        }
        let from = from.min(self.lines.len() - 1);
        (0..=from).rev().find(|&i| pattern.is_match(&self.lines[i]))
    }

    fn run_search(&mut self, query: String) {
        let pattern = match Regex::new(&query) {
            Ok(pattern) => pattern,
            Err(e) => {
                debug!("Rejected search pattern {query:?}: {e}");
                self.search.invalid = Some(query);
                return;
            }
        };
        let last_visible = (self.offset + self.viewport()).saturating_sub(1);
        self.apply_search(&pattern, Some(last_visible));
        self.search.pattern = Some(pattern);
        self.search.query = Some(query);
    }

    fn search_next(&mut self) -> ScreenAction {
        let Some(pattern) = self.search.pattern.clone() else {
            return ScreenAction::Ignored;
        };
        let from = match self.search.match_line {
            Some(line) => line.checked_sub(1),
            None => Some((self.offset + self.viewport()).saturating_sub(1)),
        };
        self.search.invalid = None;
        self.apply_search(&pattern, from);
        ScreenAction::Redraw
    }

    fn apply_search(&mut self, pattern: &Regex, from: Option<usize>) {
        match from.and_then(|f| self.find_backward(pattern, f)) {
            Some(line) => {
                self.search.match_line = Some(line);
                self.search.not_found = false;
                self.reveal(line);
            }
            None => self.search.not_found = true,
        }
    }

    fn on_search_key(&mut self, event: &KeyEvent) -> ScreenAction {
        let Some(input) = self.search.input.as_mut() else {
            return ScreenAction::Ignored;
        };
        match event.key {
            Key::Enter => {
                let query = std::mem::take(input);
                self.search.input = None;
                if !query.is_empty() {
                    self.run_search(query);
                }
            }
            Key::Esc => self.search.input = None,
            Key::Backspace => {
                input.pop();
            }
            _ => match event.insertable_text() {
                Some(c) if c != '\n' && c != '\t' => input.push(c),
                _ => return ScreenAction::Ignored,
            },
        }
        ScreenAction::Redraw
    }

    fn body_line(&self, index: usize) -> Line<'static> {
        let text = &self.lines[index];
        let pattern = self
            .search
            .pattern
            .as_ref()
            .filter(|_| self.search.match_line == Some(index));
        let Some(pattern) = pattern else {
            return Line::from(text.clone());
        };

        let highlight = Style::default().add_modifier(Modifier::REVERSED);
        let mut spans = Vec::new();
        let mut last = 0;
        for m in pattern.find_iter(text).filter(|m| !m.is_empty()) {
            if m.start() > last {
                spans.push(Span::raw(text[last..m.start()].to_string()));
            }
            spans.push(Span::styled(m.as_str().to_string(), highlight));
            last = m.end();
        }
        if last < text.len() {
            spans.push(Span::raw(text[last..].to_string()));
        }
        Line::from(spans)
    }

    fn status(&self) -> String {
        let total = self.lines.len();
        let last = (self.offset + self.viewport()).min(total);
        let percent = if total == 0 { 0 } else { last * 100 / total };
        let mut status = format!("{}  {last}/{total} ({percent}%)", self.title);
        if let Some(input) = &self.search.input {
            status = format!("/{input}  {status}");
        } else if let Some(bad) = &self.search.invalid {
            status.push_str(&format!("  invalid pattern: {bad}"));
        } else if self.search.not_found
            && let Some(query) = &self.search.query
        {
            status.push_str(&format!("  not found: {query}"));
        }
        status
    }
}

fn truncate_to_width(text: &str, width: u16) -> String {
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > width as usize {
            break;
        }
        used += w;
        out.push(c);
    }
    out
}

impl Screen for Viewer {
    fn set_size(&mut self, width: u16, height: u16) {
        self.height = height;
        if self.wrapped_width != Some(width) {
            self.rewrap(width);
        }
        if !self.positioned {
            self.offset = match self.initial {
                InitialPosition::Top => 0,
                InitialPosition::Bottom => self.max_offset(),
            };
            self.positioned = true;
        }
        self.offset = self.offset.min(self.max_offset());
    }

    fn render(&self, width: u16, height: u16) -> Vec<Line<'static>> {
        let dim = Style::default().add_modifier(Modifier::DIM);
        let viewport = height.saturating_sub(FOOTER_LINES) as usize;

        let mut out: Vec<Line<'static>> = (self.offset..self.lines.len())
            .take(viewport)
            .map(|i| self.body_line(i))
            .collect();
        out.resize(viewport, Line::default());

        let footer = [
            Line::from(Span::styled("-".repeat(width as usize), dim)),
            Line::from(Span::styled(truncate_to_width(HELP, width), dim)),
            Line::from(Span::styled(
                truncate_to_width(&self.status(), width),
                Style::default().add_modifier(Modifier::BOLD),
            )),
        ];
        out.extend(footer);
        out.truncate(height as usize);
        out
    }

    fn on_key_event(&mut self, event: &KeyEvent) -> ScreenAction {
        if self.search.input.is_some() {
            return self.on_search_key(event);
        }
        if event.ctrl || event.alt {
            return ScreenAction::Ignored;
        }
        match event.key {
            Key::Char('q') if !event.shift => ScreenAction::Close,
            Key::Char('j') | Key::Down => self.scroll_by(1),
            Key::Char('k') | Key::Up => self.scroll_by(-1),
            Key::Char('f') | Key::Char(' ') | Key::PageDown => self.scroll_by(self.page()),
            Key::Char('b') | Key::PageUp => self.scroll_by(-self.page()),
            Key::Char('g') if event.shift => self.scroll_to(usize::MAX),
            Key::Char('g') | Key::Home => self.scroll_to(0),
            Key::End => self.scroll_to(usize::MAX),
            Key::Char('/') => {
                self.search.input = Some(String::new());
                self.search.not_found = false;
                self.search.invalid = None;
                ScreenAction::Redraw
            }
            Key::Char('n') => self.search_next(),
            _ => ScreenAction::Ignored,
        }
    }

    fn on_mouse_event(&mut self, event: &MouseEvent) -> ScreenAction {
        match event.kind {
            MouseKind::ScrollUp => self.scroll_by(-(MOUSE_SCROLL_LINES as isize)),
            MouseKind::ScrollDown => self.scroll_by(MOUSE_SCROLL_LINES as isize),
            _ => ScreenAction::Ignored,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::plain_lines;

    fn numbered(n: usize) -> String {
        (0..n).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n")
    }

    /// 10 rows: 7 body lines plus the footer.
    fn viewer(n: usize, initial: InitialPosition) -> Viewer {
        let mut v = Viewer::new("t", &numbered(n), initial);
        v.set_size(40, 10);
        v
    }

    fn key(k: Key) -> KeyEvent {
        KeyEvent::new(k)
    }

    #[test]
    fn up_at_top_is_ignored() {
        let mut v = viewer(30, InitialPosition::Top);
        assert_eq!(v.on_key_event(&key(Key::Up)), ScreenAction::Ignored);
        assert_eq!(v.offset(), 0);
    }

    #[test]
    fn bottom_start_and_clamping() {
        let mut v = viewer(30, InitialPosition::Bottom);
        assert_eq!(v.offset(), 23);
        assert_eq!(v.on_key_event(&key(Key::Down)), ScreenAction::Ignored);
        assert_eq!(v.on_key_event(&key(Key::PageUp)), ScreenAction::Redraw);
        assert_eq!(v.offset(), 16);
        assert_eq!(v.on_key_event(&KeyEvent::char('g')), ScreenAction::Redraw);
        assert_eq!(v.offset(), 0);
        assert_eq!(v.on_key_event(&KeyEvent::char('G')), ScreenAction::Redraw);
        assert_eq!(v.offset(), 23);
    }

    #[test]
    fn short_content_never_scrolls() {
        let mut v = viewer(3, InitialPosition::Bottom);
        assert_eq!(v.offset(), 0);
        assert_eq!(v.on_key_event(&key(Key::End)), ScreenAction::Ignored);
    }

    #[test]
    fn render_fills_height_with_footer() {
        let v = viewer(30, InitialPosition::Top);
        let out = plain_lines(&v.render(40, 10));
        assert_eq!(out.len(), 10);
        assert_eq!(out[0], "line 0");
        assert_eq!(out[7], "-".repeat(40));
        assert!(out[9].ends_with("7/30 (23%)"));
    }

    #[test]
    fn q_closes() {
        let mut v = viewer(3, InitialPosition::Top);
        assert_eq!(v.on_key_event(&KeyEvent::char('q')), ScreenAction::Close);
    }

    fn search(v: &mut Viewer, query: &str) {
        v.on_key_event(&KeyEvent::char('/'));
        for c in query.chars() {
            v.on_key_event(&KeyEvent::char(c));
        }
        v.on_key_event(&key(Key::Enter));
    }

    #[test]
    fn search_goes_backward_and_repeats() {
        let mut v = viewer(30, InitialPosition::Bottom);
        search(&mut v, "line 2");
        // Newest match at or above the last visible line (29).
        assert_eq!(v.match_line(), Some(29));
        v.on_key_event(&KeyEvent::char('n'));
        assert_eq!(v.match_line(), Some(28));
        for _ in 0..8 {
            v.on_key_event(&KeyEvent::char('n'));
        }
        assert_eq!(v.match_line(), Some(20));
        v.on_key_event(&KeyEvent::char('n'));
        assert_eq!(v.match_line(), Some(2));
        assert_eq!(v.offset(), 2);
        // No wrap past the first line.
        v.on_key_event(&KeyEvent::char('n'));
        assert_eq!(v.match_line(), Some(2));
        assert!(plain_lines(&v.render(40, 10))[9].contains("not found: line 2"));
    }

    #[test]
    fn search_highlights_match() {
        let mut v = viewer(5, InitialPosition::Top);
        search(&mut v, "ne 3");
        let lines = v.render(40, 10);
        let hit = lines[3]
            .spans
            .iter()
            .find(|s| s.style.add_modifier.contains(Modifier::REVERSED));
        assert_eq!(hit.map(|s| s.content.as_ref()), Some("ne 3"));
    }

    #[test]
    fn search_takes_regular_expressions() {
        let mut v = viewer(30, InitialPosition::Top);
        search(&mut v, r"line 1\d$");
        assert_eq!(v.match_line(), None);
        assert!(plain_lines(&v.render(40, 10))[9].contains(r"not found: line 1\d$"));

        v.on_key_event(&KeyEvent::char('G'));
        search(&mut v, r"line 1\d$");
        assert_eq!(v.match_line(), Some(19));

        let lines = v.render(40, 10);
        let row = 19 - v.offset();
        let hits: Vec<&str> = lines[row]
            .spans
            .iter()
            .filter(|s| s.style.add_modifier.contains(Modifier::REVERSED))
            .map(|s| s.content.as_ref())
            .collect();
        assert_eq!(hits, ["line 19"]);
    }

    #[test]
    fn highlights_every_match_on_the_line() {
        let mut v = Viewer::text("t", "ab ab ab");
        v.set_size(40, 10);
        search(&mut v, "a.");
        let hits = v.render(40, 10)[0]
            .spans
            .iter()
            .filter(|s| s.style.add_modifier.contains(Modifier::REVERSED))
            .count();
        assert_eq!(hits, 3);
    }

    #[test]
    fn invalid_pattern_keeps_previous_search() {
        let mut v = viewer(30, InitialPosition::Bottom);
        search(&mut v, "line 2");
        assert_eq!(v.match_line(), Some(29));
        search(&mut v, "line (");
        assert_eq!(v.match_line(), Some(29));
        assert!(plain_lines(&v.render(40, 10))[9].contains("invalid pattern: line ("));

        v.on_key_event(&KeyEvent::char('n'));
        assert_eq!(v.match_line(), Some(28));
    }

    #[test]
    fn search_input_editing() {
        let mut v = viewer(5, InitialPosition::Top);
        v.on_key_event(&KeyEvent::char('/'));
        v.on_key_event(&KeyEvent::char('x'));
        v.on_key_event(&key(Key::Backspace));
        v.on_key_event(&KeyEvent::char('q'));
        assert!(v.is_searching());
        assert!(plain_lines(&v.render(40, 10))[9].starts_with("/q  t"));
        v.on_key_event(&key(Key::Esc));
        assert!(!v.is_searching());
        assert_eq!(v.match_line(), None);
    }

    #[test]
    fn width_change_rewraps() {
        let mut v = Viewer::text("t", &"word ".repeat(20));
        v.set_size(100, 10);
        assert_eq!(v.total_lines(), 1);
        v.set_size(20, 10);
        assert_eq!(v.total_lines(), 5);
    }
}
