//! Markdown rendering for message bodies.
//!
//! `render` turns CommonMark (plus strikethrough and task lists) into styled
//! lines. Fenced code sits in a rounded frame and is colored by syntect when
//! the fence names a known language. Raw HTML is kept but dimmed. Lines are
//! not wrapped here; `render::render_styled` does that for the component.

use std::sync::LazyLock;

use pulldown_cmark::{CodeBlockKind, CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use syntect::easy::HighlightLines;
use syntect::highlighting::ThemeSet;
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

static SYNTAX_SET: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);
static THEME_SET: LazyLock<ThemeSet> = LazyLock::new(ThemeSet::load_defaults);

const CODE_THEME: &str = "base16-ocean.dark";
const MAX_RULE_WIDTH: u16 = 40;
const TAB: &str = "    ";

fn chrome() -> Style {
    Style::default().fg(Color::DarkGray)
}

fn link_style() -> Style {
    Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::UNDERLINED)
}

/// Styled lines for `content`. Body text uses `base`; `width` caps the
/// length of horizontal rules.
pub fn render(content: &str, base: Style, width: u16) -> Text<'static> {
    let options = Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS;
    let mut builder = LineBuilder::new(base, width.min(MAX_RULE_WIDTH));
    for event in Parser::new_ext(content, options) {
        builder.event(event);
    }
    builder.out
}

/// Raw markdown, shown as written.
pub fn render_source(content: &str, base: Style) -> Text<'static> {
    content
        .lines()
        .map(|l| Line::from(Span::styled(l.replace('\t', TAB), base)))
        .collect::<Vec<_>>()
        .into()
}

/// How text inside a code fence is emitted.
enum Fence {
    Highlighted(HighlightLines<'static>),
    Plain,
}

struct LineBuilder {
    out: Text<'static>,
    base: Style,
    rule_width: u16,
    /// Each entry already includes the entries below it.
    styles: Vec<Style>,
    /// Gutter spans put in front of every new line, outermost first.
    gutters: Vec<Span<'static>>,
    /// `None` for bullets, otherwise the next ordinal.
    lists: Vec<Option<u64>>,
    fence: Option<Fence>,
    link: Option<String>,
    pending_gap: bool,
}

impl LineBuilder {
    fn new(base: Style, rule_width: u16) -> Self {
        Self {
            out: Text::default(),
            base,
            rule_width,
            styles: Vec::new(),
            gutters: Vec::new(),
            lists: Vec::new(),
            fence: None,
            link: None,
            pending_gap: false,
        }
    }

    fn current(&self) -> Style {
        self.styles.last().copied().unwrap_or(self.base)
    }

    fn enter_style(&mut self, overlay: Style) {
        let style = self.current().patch(overlay);
        self.styles.push(style);
    }

    fn leave_style(&mut self) {
        self.styles.pop();
    }

    fn new_line(&mut self, mut line: Line<'static>) {
        line.spans.splice(0..0, self.gutters.iter().cloned());
        self.out.lines.push(line);
    }

    fn append(&mut self, span: Span<'static>) {
        match self.out.lines.last_mut() {
            Some(line) => line.push_span(span),
            None => self.new_line(Line::from(span)),
        }
    }

    fn gap(&mut self) {
        if std::mem::take(&mut self.pending_gap) {
            self.new_line(Line::default());
        }
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => self.text(text),
            Event::Code(code) => {
                let style = Style::default().fg(Color::White).bg(Color::DarkGray);
                self.append(Span::styled(code.into_string(), style));
            }
            Event::SoftBreak => self.append(Span::raw(" ")),
            Event::HardBreak => self.new_line(Line::default()),
            Event::Rule => {
                self.gap();
                let rule = "─".repeat(usize::from(self.rule_width));
                self.new_line(Line::from(Span::styled(rule, chrome())));
                self.pending_gap = true;
            }
            Event::TaskListMarker(done) => {
                self.append(Span::raw(if done { "[x] " } else { "[ ] " }));
            }
            Event::Html(html) | Event::InlineHtml(html) => {
                let style = self.current().add_modifier(Modifier::DIM);
                for (i, part) in html.lines().enumerate() {
                    if i > 0 {
                        self.new_line(Line::default());
                    }
                    self.append(Span::styled(part.to_owned(), style));
                }
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => {
                self.gap();
                self.new_line(Line::default());
            }
            Tag::Heading { level, .. } => {
                self.gap();
                let style = heading_style(self.base, level);
                let marker = format!("{} ", "#".repeat(heading_depth(level)));
                self.new_line(Line::from(Span::styled(marker, style)));
                self.enter_style(style);
            }
            Tag::BlockQuote(_) => {
                self.gap();
                self.gutters.push(Span::styled("│ ", chrome()));
                self.enter_style(self.base.add_modifier(Modifier::DIM | Modifier::ITALIC));
            }
            Tag::CodeBlock(kind) => self.open_fence(kind),
            Tag::List(first) => {
                if self.lists.is_empty() {
                    self.gap();
                }
                self.lists.push(first);
            }
            Tag::Item => {
                self.new_line(Line::default());
                let indent = "  ".repeat(self.lists.len().saturating_sub(1));
                let marker = match self.lists.last_mut() {
                    Some(Some(n)) => {
                        *n += 1;
                        format!("{indent}{}. ", *n - 1)
                    }
                    Some(None) => format!("{indent}- "),
                    None => return,
                };
                self.append(Span::styled(marker, chrome()));
            }
            Tag::Emphasis => self.enter_style(Style::default().add_modifier(Modifier::ITALIC)),
            Tag::Strong => self.enter_style(Style::default().add_modifier(Modifier::BOLD)),
            Tag::Strikethrough => {
                self.enter_style(Style::default().add_modifier(Modifier::CROSSED_OUT));
            }
            Tag::Link { dest_url, .. } => {
                self.link = Some(dest_url.into_string());
                self.enter_style(link_style());
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => self.pending_gap = true,
            TagEnd::Heading(_) => {
                self.leave_style();
                self.pending_gap = true;
            }
            TagEnd::BlockQuote(_) => {
                self.gutters.pop();
                self.leave_style();
                self.pending_gap = true;
            }
            TagEnd::CodeBlock => {
                self.fence = None;
                self.gutters.pop();
                self.new_line(Line::from(Span::styled("╰──", chrome())));
                self.pending_gap = true;
            }
            TagEnd::List(_) => {
                self.lists.pop();
                self.pending_gap = true;
            }
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough => self.leave_style(),
            TagEnd::Link => {
                self.leave_style();
                if let Some(url) = self.link.take() {
                    self.append(Span::raw(" ("));
                    self.append(Span::styled(url, link_style()));
                    self.append(Span::raw(")"));
                }
            }
            _ => {}
        }
    }

    fn open_fence(&mut self, kind: CodeBlockKind<'_>) {
        if !self.out.lines.is_empty() {
            self.new_line(Line::default());
        }
        let lang = match &kind {
            CodeBlockKind::Fenced(lang) => lang.as_ref(),
            CodeBlockKind::Indented => "",
        };

        let top = if lang.is_empty() {
            Line::from(Span::styled("╭──", chrome()))
        } else {
            Line::from(vec![
                Span::styled("╭── ", chrome()),
                Span::styled(lang.to_owned(), chrome().add_modifier(Modifier::BOLD)),
                Span::styled(" ──", chrome()),
            ])
        };
        self.new_line(top);
        self.gutters.push(Span::styled("│ ", chrome()));

        let highlighter = SYNTAX_SET
            .find_syntax_by_token(lang)
            .filter(|_| !lang.is_empty())
            .zip(THEME_SET.themes.get(CODE_THEME))
            .map(|(syntax, theme)| HighlightLines::new(syntax, theme));
        self.fence = Some(highlighter.map_or(Fence::Plain, Fence::Highlighted));
    }

    fn text(&mut self, text: CowStr<'_>) {
        // ratatui gives tabs no width.
        let text = text.replace('\t', TAB);

        match self.fence.take() {
            Some(Fence::Highlighted(mut highlighter)) => {
                for line in LinesWithEndings::from(&text) {
                    let spans = highlight(&mut highlighter, line);
                    if !spans.is_empty() {
                        self.new_line(Line::from(spans));
                    }
                }
                self.fence = Some(Fence::Highlighted(highlighter));
            }
            Some(Fence::Plain) => {
                let style = Style::default().fg(Color::White);
                for line in text.lines() {
                    self.new_line(Line::from(Span::styled(line.to_owned(), style)));
                }
                self.fence = Some(Fence::Plain);
            }
            None => {
                let style = self.current();
                self.append(Span::styled(text, style));
            }
        }
    }
}

fn highlight(highlighter: &mut HighlightLines<'static>, line: &str) -> Vec<Span<'static>> {
    let Ok(ranges) = highlighter.highlight_line(line, &SYNTAX_SET) else {
        return Vec::new();
    };
    ranges
        .into_iter()
        .filter_map(|(style, fragment)| {
            let content = fragment.trim_end_matches('\n');
            if content.is_empty() {
                return None;
            }
            let fg = style.foreground;
            Some(Span::styled(
                content.to_owned(),
                Style::default().fg(Color::Rgb(fg.r, fg.g, fg.b)),
            ))
        })
        .collect()
}

fn heading_style(base: Style, level: HeadingLevel) -> Style {
    let emphasis = match level {
        HeadingLevel::H1 => Modifier::UNDERLINED,
        HeadingLevel::H2 => Modifier::empty(),
        _ => Modifier::ITALIC,
    };
    base.add_modifier(Modifier::BOLD | emphasis)
}

fn heading_depth(level: HeadingLevel) -> usize {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::plain;

    fn base() -> Style {
        Style::default().fg(Color::Blue)
    }

    fn contents(text: &Text<'static>) -> Vec<String> {
        text.lines.iter().map(plain).collect()
    }

    fn span<'a>(text: &'a Text<'static>, content: &str) -> &'a Span<'static> {
        text.lines
            .iter()
            .flat_map(|l| &l.spans)
            .find(|s| s.content == content)
            .unwrap_or_else(|| panic!("no span {content:?} in {text:?}"))
    }

    #[test]
    fn heading_text_inherits_heading_style() {
        let text = render("## Hello", base(), 80);
        let line = &text.lines[0];
        assert!(line.spans.len() >= 2, "expected >= 2 spans, got {:?}", line);
        assert!(line.spans[0].style.add_modifier.contains(Modifier::BOLD));
        assert!(line.spans[1].style.add_modifier.contains(Modifier::BOLD));
        assert_eq!(line.spans[1].style.fg, Some(Color::Blue));
    }

    #[test]
    fn bold_text_is_bold() {
        let text = render("Some **bold** text", base(), 80);
        assert!(span(&text, "bold").style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn inline_code_styled() {
        let text = render("Use `foo()` here", base(), 80);
        assert_eq!(span(&text, "foo()").style.bg, Some(Color::DarkGray));
    }

    #[test]
    fn ordered_lists_count_from_their_start() {
        let text = render("3. a\n4. b\n\n- c", base(), 80);
        let all = contents(&text);
        assert!(all.contains(&"3. a".to_string()), "{all:?}");
        assert!(all.contains(&"4. b".to_string()), "{all:?}");
        assert!(all.contains(&"- c".to_string()), "{all:?}");
    }

    #[test]
    fn links_show_their_target() {
        let text = render("[docs](https://example.com)", base(), 80);
        assert_eq!(contents(&text), vec!["docs (https://example.com)"]);
        assert!(span(&text, "docs").style.add_modifier.contains(Modifier::UNDERLINED));
    }

    #[test]
    fn code_block_has_border_structure() {
        let text = render("```\nline1\nline2\n```", base(), 80);
        let all = contents(&text);
        assert!(all[0].starts_with('╭'), "expected top border, got {:?}", all[0]);
        assert!(all[1].starts_with("│ ") && all[1].contains("line1"));
        assert!(all[2].starts_with("│ ") && all[2].contains("line2"));
        assert!(all.last().unwrap().starts_with('╰'));
    }

    #[test]
    fn highlighted_code_block_keeps_frame() {
        let text = render("```rust\nfn main() {}\n```", base(), 80);
        let all = contents(&text);
        assert!(all[0].contains("rust"));
        assert!(all[1].starts_with("│ ") && all[1].contains("fn main"));
    }

    #[test]
    fn plain_text_uses_base_style() {
        let text = render("hello", Style::default().fg(Color::Green), 80);
        assert_eq!(text.lines[0].spans[0].style.fg, Some(Color::Green));
    }

    #[test]
    fn rule_is_bounded_by_width() {
        let text = render("a\n\n---\n\nb", base(), 12);
        let rule = contents(&text)
            .into_iter()
            .find(|l| l.starts_with('─'))
            .unwrap();
        assert_eq!(rule.chars().count(), 12);
    }

    #[test]
    fn tabs_expanded_to_spaces() {
        let text = render("```\n\tindented\n```", base(), 80);
        let all = contents(&text);
        assert!(all.iter().any(|l| l.contains("    indented")));
        assert!(!all.iter().any(|l| l.contains('\t')));
    }

    #[test]
    fn source_mode_shows_raw_markdown() {
        let text = render_source("# Title\n**x**", base());
        assert_eq!(contents(&text), vec!["# Title", "**x**"]);
    }
}
