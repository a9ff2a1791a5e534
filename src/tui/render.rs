//! # Styled Line Rendering
//!
//! Two conversions sit between components and the terminal:
//!
//! ```text
//!   Text ──(Paragraph + Block into a Buffer)──► Vec<Line>   render_styled
//!   Line ──(crossterm SGR commands)───────────► bytes        encode_line
//! ```
//!
//! Wrapping and framing are delegated to ratatui: content is laid out by a
//! wrapping `Paragraph` at the inner width, optionally compacted, then framed
//! by the style's `Block`. The resulting buffer is read back row by row into
//! owned lines, which is what the diffing render loop compares.

use std::fmt;
use std::io::{self, Write};

use crossterm::queue;
use crossterm::style::{Attribute, Print, SetAttribute, SetBackgroundColor, SetForegroundColor};
use ratatui::buffer::{Buffer, Cell};
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Paragraph, Widget, Wrap};
use unicode_width::UnicodeWidthStr;

use super::compact::compact_lines;
use super::component::ComponentStyle;

/// A render callback failed. Caught per component; never fatal to a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderError(pub String);

impl RenderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "render failed: {}", self.0)
    }
}

impl std::error::Error for RenderError {}

/// Lay out `text` within `width` columns using `style`'s framing. When
/// `collapse` is set, the wrapped content is compacted before framing so the
/// border stays intact.
pub fn render_styled(
    text: Text<'static>,
    style: &ComponentStyle,
    width: u16,
    collapse: Option<usize>,
) -> Vec<Line<'static>> {
    let inner_width = width.saturating_sub(style.horizontal_overhead());
    if inner_width == 0 {
        return Vec::new();
    }

    let mut lines = wrap_text(text, style.base, inner_width);
    if let Some(max) = collapse {
        lines = compact_lines(lines, max);
    }

    let mut out = match style.block() {
        Some(block) => {
            let height = clamp_height(lines.len() + style.vertical_overhead() as usize);
            let area = Rect::new(0, 0, width, height);
            let mut buf = Buffer::empty(area);
            let inner = block.inner(area);
            block.render(area, &mut buf);
            Paragraph::new(Text::from(lines))
                .style(style.base)
                .render(inner, &mut buf);
            buffer_to_lines(&buf)
        }
        None => lines,
    };

    out.extend((0..style.margin_bottom).map(|_| Line::default()));
    out
}

/// Word-wrap `text` to `width` columns.
pub fn wrap_text(text: Text<'static>, base: Style, width: u16) -> Vec<Line<'static>> {
    if width == 0 {
        return Vec::new();
    }
    let paragraph = Paragraph::new(text)
        .style(base)
        .wrap(Wrap { trim: false });
    let height = clamp_height(paragraph.line_count(width));
    let area = Rect::new(0, 0, width, height);
    let mut buf = Buffer::empty(area);
    paragraph.render(area, &mut buf);
    buffer_to_lines(&buf)
}

fn clamp_height(lines: usize) -> u16 {
    u16::try_from(lines).unwrap_or(u16::MAX)
}

/// Read a buffer back into lines, merging equal-styled cells into spans and
/// dropping trailing blank cells.
pub fn buffer_to_lines(buf: &Buffer) -> Vec<Line<'static>> {
    let area = buf.area;
    (area.top()..area.bottom())
        .map(|y| {
            let mut cells: Vec<(&str, Style)> = Vec::with_capacity(area.width as usize);
            let mut skip = 0usize;
            for x in area.left()..area.right() {
                if skip > 0 {
                    // Trailing half of a wide grapheme.
                    skip -= 1;
                    continue;
                }
                let Some(cell) = buf.cell((x, y)) else {
                    continue;
                };
                let symbol = cell.symbol();
                skip = symbol.width().saturating_sub(1);
                cells.push((symbol, cell_style(cell)));
            }
            while cells
                .last()
                .is_some_and(|(symbol, style)| *symbol == " " && is_invisible(style))
            {
                cells.pop();
            }

            let mut spans: Vec<Span<'static>> = Vec::new();
            for (symbol, style) in cells {
                match spans.last_mut() {
                    Some(span) if span.style == style => span.content.to_mut().push_str(symbol),
                    _ => spans.push(Span::styled(symbol.to_string(), style)),
                }
            }
            Line::from(spans)
        })
        .collect()
}

fn cell_style(cell: &Cell) -> Style {
    let mut style = Style::default().add_modifier(cell.modifier);
    if cell.fg != Color::Reset {
        style = style.fg(cell.fg);
    }
    if cell.bg != Color::Reset {
        style = style.bg(cell.bg);
    }
    style
}

/// A space in this style paints nothing.
fn is_invisible(style: &Style) -> bool {
    style.bg.is_none()
        && !style
            .add_modifier
            .intersects(Modifier::REVERSED | Modifier::UNDERLINED | Modifier::CROSSED_OUT)
}

// ── ANSI encoding ───────────────────────────────────────────────────────────

/// Write one line as SGR-styled text. Every styled span ends with an
/// attribute reset so no style leaks into the next write.
pub fn encode_line(out: &mut impl Write, line: &Line<'_>) -> io::Result<()> {
    for span in &line.spans {
        let style = line.style.patch(span.style);
        let styled = style.fg.is_some() || style.bg.is_some() || !style.add_modifier.is_empty();
        if let Some(fg) = style.fg {
            queue!(out, SetForegroundColor(to_crossterm(fg)))?;
        }
        if let Some(bg) = style.bg {
            queue!(out, SetBackgroundColor(to_crossterm(bg)))?;
        }
        for attribute in attributes(style.add_modifier) {
            queue!(out, SetAttribute(attribute))?;
        }
        queue!(out, Print(&span.content))?;
        if styled {
            queue!(out, SetAttribute(Attribute::Reset))?;
        }
    }
    Ok(())
}

fn attributes(modifier: Modifier) -> Vec<Attribute> {
    [
        (Modifier::BOLD, Attribute::Bold),
        (Modifier::DIM, Attribute::Dim),
        (Modifier::ITALIC, Attribute::Italic),
        (Modifier::UNDERLINED, Attribute::Underlined),
        (Modifier::SLOW_BLINK, Attribute::SlowBlink),
        (Modifier::RAPID_BLINK, Attribute::RapidBlink),
        (Modifier::REVERSED, Attribute::Reverse),
        (Modifier::HIDDEN, Attribute::Hidden),
        (Modifier::CROSSED_OUT, Attribute::CrossedOut),
    ]
    .into_iter()
    .filter(|(m, _)| modifier.contains(*m))
    .map(|(_, a)| a)
    .collect()
}

/// ratatui's named colors follow the ANSI 0–15 numbering, where "Red" is the
/// normal-intensity red that crossterm calls `DarkRed`.
fn to_crossterm(color: Color) -> crossterm::style::Color {
    use crossterm::style::Color as C;
    match color {
        Color::Reset => C::Reset,
        Color::Black => C::Black,
        Color::Red => C::DarkRed,
        Color::Green => C::DarkGreen,
        Color::Yellow => C::DarkYellow,
        Color::Blue => C::DarkBlue,
        Color::Magenta => C::DarkMagenta,
        Color::Cyan => C::DarkCyan,
        Color::Gray => C::Grey,
        Color::DarkGray => C::DarkGrey,
        Color::LightRed => C::Red,
        Color::LightGreen => C::Green,
        Color::LightYellow => C::Yellow,
        Color::LightBlue => C::Blue,
        Color::LightMagenta => C::Magenta,
        Color::LightCyan => C::Cyan,
        Color::White => C::White,
        Color::Rgb(r, g, b) => C::Rgb { r, g, b },
        Color::Indexed(i) => C::AnsiValue(i),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::plain;
    use crate::tui::component::Panel;
    use ratatui::widgets::Padding;

    fn texts(lines: &[Line<'static>]) -> Vec<String> {
        lines.iter().map(plain).collect()
    }

    #[test]
    fn plain_text_wraps_to_width() {
        let lines = render_styled(
            Text::from("aaaa bbbb cccc"),
            &ComponentStyle::default(),
            9,
            None,
        );
        let trimmed: Vec<String> = texts(&lines).iter().map(|l| l.trim().to_string()).collect();
        assert_eq!(trimmed, vec!["aaaa bbbb", "cccc"]);
    }

    #[test]
    fn zero_width_renders_nothing() {
        let lines = render_styled(Text::from("x"), &ComponentStyle::default(), 0, None);
        assert!(lines.is_empty());
    }

    #[test]
    fn panel_frames_content() {
        let style = ComponentStyle::default().panel(Panel::default());
        let lines = render_styled(Text::from("hi"), &style, 6, None);
        let out = texts(&lines);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0], "╭────╮");
        assert_eq!(out[1], "│hi  │");
        assert_eq!(out[2], "╰────╯");
    }

    #[test]
    fn padding_and_margin() {
        let style = ComponentStyle::default()
            .padding(Padding::left(2))
            .margin_bottom(1);
        let lines = render_styled(Text::from("x"), &style, 10, None);
        assert_eq!(texts(&lines), vec!["  x", ""]);
    }

    #[test]
    fn collapse_applies_inside_frame() {
        let content: Vec<Line<'static>> = (0..5).map(|i| Line::from(format!("{i}"))).collect();
        let style = ComponentStyle::default().panel(Panel::default());
        let lines = render_styled(Text::from(content), &style, 30, Some(2));
        let out = texts(&lines);
        assert_eq!(out.len(), 5);
        assert!(out[3].contains("... (3 other lines)"));
        assert!(out[4].starts_with('╰'));
    }

    #[test]
    fn wide_characters_are_not_doubled() {
        let lines = wrap_text(Text::from("日本"), Style::default(), 10);
        assert_eq!(texts(&lines), vec!["日本"]);
    }

    #[test]
    fn styled_spans_survive_the_buffer() {
        let text = Text::from(Line::from(vec![
            Span::raw("a "),
            Span::styled("b", Style::default().fg(Color::Red)),
        ]));
        let lines = wrap_text(text, Style::default(), 10);
        let red = lines[0].spans.iter().find(|s| s.content == "b");
        assert_eq!(red.map(|s| s.style.fg), Some(Some(Color::Red)));
    }

    #[test]
    fn encode_resets_after_styled_span() {
        let mut out = Vec::new();
        let line = Line::from(vec![
            Span::raw("x"),
            Span::styled("y", Style::default().add_modifier(Modifier::BOLD)),
        ]);
        encode_line(&mut out, &line).unwrap();
        let s = String::from_utf8(out).unwrap();
        assert!(s.starts_with('x'));
        assert!(s.contains("\x1b[1my"));
        assert!(s.ends_with("\x1b[0m"));
    }
}
