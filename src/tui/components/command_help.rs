use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};

use crate::tui::commands::HelpSection;
use crate::tui::component::{Component, ComponentCore};
use crate::tui::render::render_styled;

/// The hotkey overview shown while command mode is active.
pub struct CommandHelpComponent {
    core: ComponentCore,
    sections: Vec<HelpSection>,
}

impl CommandHelpComponent {
    pub fn new(sections: Vec<HelpSection>) -> Self {
        Self {
            core: ComponentCore::new(),
            sections,
        }
    }

    pub fn set_sections(&mut self, sections: Vec<HelpSection>) {
        if self.sections != sections {
            self.sections = sections;
            self.core.mark_dirty();
        }
    }
}

impl Component for CommandHelpComponent {
    fn core(&self) -> &ComponentCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ComponentCore {
        &mut self.core
    }

    fn render(&self, width: u16) -> Vec<Line<'static>> {
        let bold = Style::default().add_modifier(Modifier::BOLD);
        let mut lines = vec![Line::from(vec![
            Span::styled("Command manager", bold),
            Span::styled("  (Ctrl+x or ESC to close)", Style::default().add_modifier(Modifier::DIM)),
        ])];

        for section in &self.sections {
            lines.push(Line::default());
            lines.push(Line::from(Span::styled(section.category.clone(), bold)));
            for (binding, name) in &section.entries {
                lines.push(Line::from(vec![
                    Span::styled(binding.clone(), Style::default().fg(Color::Green)),
                    Span::raw(" "),
                    Span::raw(name.clone()),
                ]));
            }
        }

        render_styled(Text::from(lines), self.core.style(), width, None)
    }
}
