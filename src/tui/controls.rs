//! Literal terminal control sequences.
//!
//! Everything the render loop writes besides content goes through these
//! constants, so the byte-level protocol lives in one place.

/// Begin a synchronized update (DEC mode 2026).
pub const SYNC_UPDATE_START: &str = "\x1b[?2026h";
/// End a synchronized update.
pub const SYNC_UPDATE_END: &str = "\x1b[?2026l";

pub const ENTER_ALT_SCREEN: &str = "\x1b[?1049h";
pub const EXIT_ALT_SCREEN: &str = "\x1b[?1049l";

pub const ENABLE_BRACKETED_PASTE: &str = "\x1b[?2004h";
pub const DISABLE_BRACKETED_PASTE: &str = "\x1b[?2004l";

pub const HIDE_CURSOR: &str = "\x1b[?25l";
pub const SHOW_CURSOR: &str = "\x1b[?25h";

pub const CURSOR_HOME: &str = "\x1b[H";
pub const CURSOR_COLUMN_1: &str = "\x1b[1G";

pub const ERASE_LINE_END: &str = "\x1b[K";
pub const ERASE_DOWN: &str = "\x1b[J";
pub const ERASE_SCREEN: &str = "\x1b[2J";
pub const ERASE_SCROLLBACK: &str = "\x1b[3J";

/// Home, erase the visible screen, then drop the scrollback.
pub const FULL_CLEAR: &str = "\x1b[H\x1b[2J\x1b[3J";

/// Line terminator in raw mode (no implicit carriage return).
pub const NEWLINE: &str = "\r\n";

/// Move the cursor to column 1, `n` lines up. `n` must be at least 1;
/// terminals treat a zero count as one.
pub fn cursor_previous_line(n: usize) -> String {
    format!("\x1b[{n}F")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_clear_is_home_then_screen_then_scrollback() {
        assert_eq!(
            FULL_CLEAR,
            format!("{CURSOR_HOME}{ERASE_SCREEN}{ERASE_SCROLLBACK}")
        );
    }

    #[test]
    fn cursor_previous_line_formats_count() {
        assert_eq!(cursor_previous_line(3), "\x1b[3F");
    }
}
