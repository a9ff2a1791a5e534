//! Text buffer and cursor for the input component.
//!
//! The cursor is a byte offset into the buffer, always on a character
//! boundary. Rows and columns are logical (split on `\n`, counted in
//! characters), independent of how the text later wraps on screen.

/// Byte offset of the character boundary before `pos`.
fn prev_char_boundary(text: &str, pos: usize) -> usize {
    text[..pos]
        .char_indices()
        .next_back()
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Byte offset of the character boundary after `pos`.
fn next_char_boundary(text: &str, pos: usize) -> usize {
    text[pos..]
        .char_indices()
        .nth(1)
        .map(|(i, _)| pos + i)
        .unwrap_or(text.len())
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Readline `backward-word`: skip separators, then the word before `pos`.
fn prev_word_boundary(text: &str, pos: usize) -> usize {
    let mut chars = text[..pos].char_indices().rev().peekable();
    while chars.peek().is_some_and(|&(_, c)| !is_word_char(c)) {
        chars.next();
    }
    let mut boundary = 0;
    while let Some(&(i, c)) = chars.peek() {
        if !is_word_char(c) {
            boundary = i + c.len_utf8();
            break;
        }
        boundary = i;
        chars.next();
    }
    boundary
}

/// Readline `forward-word`: skip separators, then the word after `pos`.
fn next_word_boundary(text: &str, pos: usize) -> usize {
    let mut chars = text[pos..].char_indices().peekable();
    while chars.peek().is_some_and(|&(_, c)| !is_word_char(c)) {
        chars.next();
    }
    while chars.peek().is_some_and(|&(_, c)| is_word_char(c)) {
        chars.next();
    }
    match chars.peek() {
        Some(&(i, _)) => pos + i,
        None => text.len(),
    }
}

/// Byte offset of the `col`-th character of `line`, clamped to its end.
fn byte_of_column(line: &str, col: usize) -> usize {
    line.char_indices()
        .nth(col)
        .map(|(i, _)| i)
        .unwrap_or(line.len())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordCase {
    Upper,
    Lower,
    Capitalize,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TextEditor {
    buffer: String,
    pos: usize,
}

impl TextEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.buffer
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Replace the buffer; the cursor goes to the end.
    pub fn set_text(&mut self, text: &str) {
        self.buffer = text.to_string();
        self.pos = self.buffer.len();
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
        self.pos = 0;
    }

    pub fn cursor(&self) -> usize {
        self.pos
    }

    pub fn lines(&self) -> Vec<&str> {
        self.buffer.split('\n').collect()
    }

    pub fn line_count(&self) -> usize {
        self.buffer.matches('\n').count() + 1
    }

    pub fn cursor_row(&self) -> usize {
        self.buffer[..self.pos].matches('\n').count()
    }

    pub fn cursor_col(&self) -> usize {
        self.buffer[self.line_start(self.pos)..self.pos].chars().count()
    }

    /// Place the cursor at a logical position, clamping both coordinates.
    pub fn set_cursor_position(&mut self, row: usize, col: usize) {
        let mut start = 0;
        for (i, line) in self.buffer.split('\n').enumerate() {
            if i == row {
                self.pos = start + byte_of_column(line, col);
                return;
            }
            start += line.len() + 1;
        }
        // Past the last row.
        let last = self.line_start(self.buffer.len());
        self.pos = last + byte_of_column(&self.buffer[last..], col);
    }

    fn line_start(&self, pos: usize) -> usize {
        self.buffer[..pos].rfind('\n').map(|i| i + 1).unwrap_or(0)
    }

    fn line_end(&self, pos: usize) -> usize {
        self.buffer[pos..]
            .find('\n')
            .map(|i| pos + i)
            .unwrap_or(self.buffer.len())
    }

    /// The word (run of non-whitespace) surrounding the cursor, as a byte range.
    pub fn word_range(&self) -> (usize, usize) {
        let start = self.buffer[..self.pos]
            .char_indices()
            .rev()
            .find(|(_, c)| c.is_whitespace())
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(0);
        let end = self.buffer[self.pos..]
            .char_indices()
            .find(|(_, c)| c.is_whitespace())
            .map(|(i, _)| self.pos + i)
            .unwrap_or(self.buffer.len());
        (start, end)
    }

    /// Replace `start..end` (byte offsets, clamped) and put the cursor after
    /// the replacement.
    pub fn replace_range(&mut self, start: usize, end: usize, with: &str) {
        let end = end.min(self.buffer.len());
        let start = start.min(end);
        if !self.buffer.is_char_boundary(start) || !self.buffer.is_char_boundary(end) {
            return;
        }
        self.buffer.replace_range(start..end, with);
        self.pos = start + with.len();
    }

    // -- editing -----------------------------------------------------------

    pub fn insert_str(&mut self, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        self.buffer.insert_str(self.pos, text);
        self.pos += text.len();
        true
    }

    pub fn insert_char(&mut self, c: char) -> bool {
        self.buffer.insert(self.pos, c);
        self.pos += c.len_utf8();
        true
    }

    pub fn backspace(&mut self) -> bool {
        if self.pos == 0 {
            return false;
        }
        let prev = prev_char_boundary(&self.buffer, self.pos);
        self.buffer.drain(prev..self.pos);
        self.pos = prev;
        true
    }

    pub fn delete(&mut self) -> bool {
        if self.pos >= self.buffer.len() {
            return false;
        }
        let next = next_char_boundary(&self.buffer, self.pos);
        self.buffer.drain(self.pos..next);
        true
    }

    /// Kill to end of line; at the end of a line, join with the next.
    pub fn kill_to_end(&mut self) -> bool {
        let end = self.line_end(self.pos);
        if end == self.pos {
            return self.delete();
        }
        self.buffer.drain(self.pos..end);
        true
    }

    pub fn kill_to_start(&mut self) -> bool {
        let start = self.line_start(self.pos);
        if start == self.pos {
            return false;
        }
        self.buffer.drain(start..self.pos);
        self.pos = start;
        true
    }

    pub fn kill_word_back(&mut self) -> bool {
        let start = prev_word_boundary(&self.buffer, self.pos);
        if start == self.pos {
            return false;
        }
        self.buffer.drain(start..self.pos);
        self.pos = start;
        true
    }

    pub fn kill_word_forward(&mut self) -> bool {
        let end = next_word_boundary(&self.buffer, self.pos);
        if end == self.pos {
            return false;
        }
        self.buffer.drain(self.pos..end);
        true
    }

    /// Change the case of the text from the cursor to the end of the next
    /// word, leaving the cursor after it.
    pub fn change_word_case(&mut self, case: WordCase) -> bool {
        let end = next_word_boundary(&self.buffer, self.pos);
        if end == self.pos {
            return false;
        }
        let segment = &self.buffer[self.pos..end];
        let replaced = match case {
            WordCase::Upper => segment.to_uppercase(),
            WordCase::Lower => segment.to_lowercase(),
            WordCase::Capitalize => {
                let mut out = String::with_capacity(segment.len());
                let mut seen_word = false;
                for c in segment.chars() {
                    if is_word_char(c) && !seen_word {
                        out.extend(c.to_uppercase());
                        seen_word = true;
                    } else {
                        out.extend(c.to_lowercase());
                    }
                }
                out
            }
        };
        self.buffer.replace_range(self.pos..end, &replaced);
        self.pos += replaced.len();
        true
    }

    // -- movement ------------------------------------------------------------

    pub fn move_left(&mut self) -> bool {
        if self.pos == 0 {
            return false;
        }
        self.pos = prev_char_boundary(&self.buffer, self.pos);
        true
    }

    pub fn move_right(&mut self) -> bool {
        if self.pos >= self.buffer.len() {
            return false;
        }
        self.pos = next_char_boundary(&self.buffer, self.pos);
        true
    }

    pub fn move_word_left(&mut self) -> bool {
        let target = prev_word_boundary(&self.buffer, self.pos);
        self.move_to(target)
    }

    pub fn move_word_right(&mut self) -> bool {
        let target = next_word_boundary(&self.buffer, self.pos);
        self.move_to(target)
    }

    pub fn move_line_start(&mut self) -> bool {
        self.move_to(self.line_start(self.pos))
    }

    pub fn move_line_end(&mut self) -> bool {
        self.move_to(self.line_end(self.pos))
    }

    /// Returns `false` on the first row.
    pub fn move_up(&mut self) -> bool {
        let row = self.cursor_row();
        if row == 0 {
            return false;
        }
        let col = self.cursor_col();
        self.set_cursor_position(row - 1, col);
        true
    }

    /// Returns `false` on the last row.
    pub fn move_down(&mut self) -> bool {
        let row = self.cursor_row();
        if row + 1 >= self.line_count() {
            return false;
        }
        let col = self.cursor_col();
        self.set_cursor_position(row + 1, col);
        true
    }

    fn move_to(&mut self, pos: usize) -> bool {
        if pos == self.pos {
            return false;
        }
        self.pos = pos;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editor(text: &str) -> TextEditor {
        let mut e = TextEditor::new();
        e.set_text(text);
        e
    }

    #[test]
    fn insert_and_backspace_multibyte() {
        let mut e = TextEditor::new();
        e.insert_char('é');
        e.insert_char('x');
        assert!(e.backspace());
        assert_eq!(e.text(), "é");
        assert!(e.backspace());
        assert!(!e.backspace());
        assert!(e.is_empty());
    }

    #[test]
    fn rows_and_columns_are_logical() {
        let mut e = editor("one\ntwo\nthree");
        assert_eq!((e.cursor_row(), e.cursor_col()), (2, 5));
        e.set_cursor_position(0, 99);
        assert_eq!((e.cursor_row(), e.cursor_col()), (0, 3));
        e.set_cursor_position(9, 1);
        assert_eq!((e.cursor_row(), e.cursor_col()), (2, 1));
    }

    #[test]
    fn vertical_moves_keep_column_and_stop_at_edges() {
        let mut e = editor("abcdef\nxy\nlonger line");
        e.set_cursor_position(0, 4);
        assert!(!e.move_up());
        assert!(e.move_down());
        assert_eq!((e.cursor_row(), e.cursor_col()), (1, 2));
        assert!(e.move_down());
        assert_eq!((e.cursor_row(), e.cursor_col()), (2, 2));
        assert!(!e.move_down());
    }

    #[test]
    fn word_motion_matches_readline() {
        let mut e = editor("hello, big world");
        assert!(e.move_word_left());
        assert_eq!(e.cursor(), 11);
        assert!(e.move_word_left());
        assert_eq!(e.cursor(), 7);
        e.set_cursor_position(0, 0);
        assert!(e.move_word_right());
        assert_eq!(e.cursor(), 5);
    }

    #[test]
    fn kill_commands() {
        let mut e = editor("alpha beta gamma");
        assert!(e.kill_word_back());
        assert_eq!(e.text(), "alpha beta ");
        e.set_cursor_position(0, 5);
        assert!(e.kill_to_end());
        assert_eq!(e.text(), "alpha");
        assert!(e.kill_to_start());
        assert_eq!(e.text(), "");
        assert!(!e.kill_to_start());
    }

    #[test]
    fn kill_to_end_at_line_end_joins_lines() {
        let mut e = editor("a\nb");
        e.set_cursor_position(0, 1);
        assert!(e.kill_to_end());
        assert_eq!(e.text(), "ab");
    }

    #[test]
    fn kill_word_forward_from_start() {
        let mut e = editor("  foo bar");
        e.set_cursor_position(0, 0);
        assert!(e.kill_word_forward());
        assert_eq!(e.text(), " bar");
    }

    #[test]
    fn word_case_changes() {
        let mut e = editor("hello WORLD");
        e.set_cursor_position(0, 0);
        assert!(e.change_word_case(WordCase::Upper));
        assert_eq!(e.text(), "HELLO WORLD");
        assert!(e.change_word_case(WordCase::Capitalize));
        assert_eq!(e.text(), "HELLO World");
        assert!(!e.change_word_case(WordCase::Lower));
    }

    #[test]
    fn word_range_spans_non_whitespace() {
        let mut e = editor("run /he now");
        e.set_cursor_position(0, 6);
        assert_eq!(e.word_range(), (4, 7));
        e.replace_range(4, 7, "/help ");
        assert_eq!(e.text(), "run /help  now");
        assert_eq!(e.cursor(), 10);
    }
}
