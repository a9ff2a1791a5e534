//! # UI State
//!
//! The application surface on top of the [`Terminal`]: a fixed layout, step
//! rendering, history recall, hotkeys and autocomplete.
//!
//! ```text
//!   ┌ header ─────────────────┐  markdown title
//!   │ step messages ...       │  upserted by step id
//!   │ command help  (hidden)  │  while command mode is open
//!   │ input         (focused) │
//!   │ autocomplete  (hidden)  │  replaces the toolbar while suggestions show
//!   └ toolbar ────────────────┘  status text
//! ```
//!
//! Everything here runs on the render loop. Results for the caller leave
//! through the [`UiOutput`] channel.

use std::io;
use std::rc::Rc;

use log::{debug, warn};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Text};
use ratatui::widgets::Padding;
use tokio::sync::mpsc::UnboundedSender;

use crate::core::config::ResolvedConfig;
use crate::core::history::HistoryManager;
use crate::core::step::{AutocompleteItem, Role, Step, ToolCallRequest};
use crate::logging::LogStore;

use super::commands::{CommandError, CommandRegistry, Hotkey, KeyBinding};
use super::component::{
    Component, ComponentEvent, ComponentExt, ComponentStyle, Panel, downcast_ref,
};
use super::components::{
    CommandHelpComponent, InputComponent, MarkdownComponent, SelectItem, SelectListComponent,
    StatusComponent, TextComponent, ToolCallComponent,
};
use super::debounce::Debouncer;
use super::formatters::FormatterRegistry;
use super::input::{InputEvent, Key, KeyEvent};
use super::screens::{Viewer, log_viewer};
use super::terminal::{Terminal, TerminalError};

pub const HEADER_ID: &str = "header";
pub const INPUT_ID: &str = "input";
pub const TOOLBAR_ID: &str = "toolbar";
pub const COMMAND_HELP_ID: &str = "command-help";
pub const AUTOCOMPLETE_ID: &str = "autocomplete";

/// Hotkeys active while typing.
pub const GLOBAL_CATEGORY: &str = "global";
/// Hotkeys for the key after `ctrl+x`.
pub const COMMAND_CATEGORY: &str = "command";

const REQUESTS_SUFFIX: &str = ":requests";
const RESPONSES_SUFFIX: &str = ":tools";
const SWEEP_BATCH: usize = 10;

/// Requests from other parts of the program, applied on the render loop.
#[derive(Debug, Clone, PartialEq)]
pub enum UiCommand {
    Step(Step),
    RemoveStep(String),
    SetStatus(String),
    /// Show or stop the toolbar spinner.
    SetRunning(bool),
    Autocomplete(Option<Vec<AutocompleteItem>>),
    ShowText { title: String, text: String },
    ShowLogs,
    Shutdown,
}

/// What the UI reports back to its caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiOutput {
    Submit(String),
    Stop,
    Eof,
    AutocompleteRequest { text: String, row: usize, col: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Normal,
    Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sweep {
    Collapse,
    Expand,
}

pub struct UiState {
    terminal: Terminal,
    history: HistoryManager,
    commands: Rc<CommandRegistry<UiState>>,
    formatters: Rc<FormatterRegistry>,
    debouncer: Option<Debouncer>,
    logs: LogStore,
    output: UnboundedSender<UiOutput>,
    mode: Mode,
    /// Direction and batch count of consecutive collapse/expand commands.
    sweep: Option<(Sweep, usize)>,
    /// Message component ids in paint order.
    messages: Vec<String>,
    suggestions: Vec<AutocompleteItem>,
    compact_lines: usize,
    failure: Option<io::Error>,
}

impl UiState {
    pub fn new(
        terminal: Terminal,
        config: &ResolvedConfig,
        logs: LogStore,
        output: UnboundedSender<UiOutput>,
    ) -> Result<Self, TerminalError> {
        Self::with_formatters(terminal, config, logs, output, FormatterRegistry::default())
    }

    pub fn with_formatters(
        terminal: Terminal,
        config: &ResolvedConfig,
        logs: LogStore,
        output: UnboundedSender<UiOutput>,
        formatters: FormatterRegistry,
    ) -> Result<Self, TerminalError> {
        let commands = match default_commands() {
            Ok(commands) => commands,
            Err(e) => {
                warn!("Builtin hotkeys rejected: {e}");
                CommandRegistry::new()
            }
        };

        let mut state = Self {
            terminal,
            history: HistoryManager::with_max_entries(config.history_max),
            commands: Rc::new(commands),
            formatters: Rc::new(formatters),
            debouncer: None,
            logs,
            output,
            mode: Mode::Normal,
            sweep: None,
            messages: Vec::new(),
            suggestions: Vec::new(),
            compact_lines: config.compact_lines,
            failure: None,
        };
        state.build_layout(&config.title)?;
        Ok(state)
    }

    fn build_layout(&mut self, title: &str) -> Result<(), TerminalError> {
        let dim = Style::default().add_modifier(Modifier::DIM);
        let t = &mut self.terminal;

        t.append_component(
            MarkdownComponent::new(format!("# {title}"))
                .with_id(HEADER_ID)
                .with_style(ComponentStyle::default().margin_bottom(1))
                .boxed(),
        )?;
        t.append_component(
            CommandHelpComponent::new(self.commands.help_sections())
                .with_id(COMMAND_HELP_ID)
                .with_style(ComponentStyle::default().padding(Padding::left(1)))
                .hidden()
                .boxed(),
        )?;
        t.append_component(
            InputComponent::new()
                .with_prefix("> ")
                .with_id(INPUT_ID)
                .with_style(ComponentStyle::default().panel(Panel {
                    title: None,
                    subtitle: Some("alt+enter to send".into()),
                    border_style: Style::default().fg(Color::DarkGray),
                }))
                .boxed(),
        )?;
        t.append_component(
            SelectListComponent::new(Vec::new())
                .with_id(AUTOCOMPLETE_ID)
                .with_style(ComponentStyle::default().padding(Padding::left(1)))
                .hidden()
                .boxed(),
        )?;
        t.append_component(
            StatusComponent::new("")
                .with_id(TOOLBAR_ID)
                .with_style(ComponentStyle::default().base(dim).padding(Padding::left(1)))
                .boxed(),
        )?;
        t.push_focus(INPUT_ID)
    }

    /// Emit debounced autocomplete requests on cursor movement.
    pub fn enable_autocomplete(&mut self, debouncer: Debouncer) {
        self.debouncer = Some(debouncer);
    }

    pub fn terminal(&self) -> &Terminal {
        &self.terminal
    }

    pub fn terminal_mut(&mut self) -> &mut Terminal {
        &mut self.terminal
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn is_command_mode(&self) -> bool {
        self.mode == Mode::Command
    }

    pub fn suggestions(&self) -> &[AutocompleteItem] {
        &self.suggestions
    }

    pub fn input_text(&self) -> String {
        self.input().map(|i| i.text().to_string()).unwrap_or_default()
    }

    fn input(&self) -> Option<&InputComponent> {
        let component = self.terminal.get(INPUT_ID).ok()?;
        downcast_ref::<InputComponent>(component)
    }

    fn input_mut(&mut self) -> Option<&mut InputComponent> {
        self.terminal.get_as::<InputComponent>(INPUT_ID).ok()
    }

    fn emit(&self, output: UiOutput) {
        if self.output.send(output).is_err() {
            debug!("UI output receiver dropped");
        }
    }

    /// Keep the first I/O failure from a hotkey handler; handlers cannot
    /// return one themselves.
    fn record(&mut self, result: io::Result<()>) {
        if let Err(e) = result
            && self.failure.is_none()
        {
            self.failure = Some(e);
        }
    }

    fn take_failure(&mut self) -> io::Result<()> {
        match self.failure.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    // ── Commands from the caller ───────────────────────────────────────────

    pub fn handle_command(&mut self, command: UiCommand) -> Result<(), TerminalError> {
        match command {
            UiCommand::Step(step) => self.handle_step(step),
            UiCommand::RemoveStep(id) => self.remove_step(&id),
            UiCommand::SetStatus(text) => {
                self.terminal.get_as::<StatusComponent>(TOOLBAR_ID)?.set_text(text);
                Ok(())
            }
            UiCommand::SetRunning(running) => {
                let toolbar = self.terminal.get_as::<StatusComponent>(TOOLBAR_ID)?;
                if !toolbar.set_running(running) {
                    return Ok(());
                }
                if running {
                    self.terminal.register_animation(TOOLBAR_ID)
                } else {
                    self.terminal.deregister_animation(TOOLBAR_ID)
                }
            }
            UiCommand::Autocomplete(items) => {
                self.show_suggestions(items.unwrap_or_default());
                Ok(())
            }
            UiCommand::ShowText { title, text } => {
                self.terminal.push_screen(Box::new(Viewer::text(title, &text)))?;
                Ok(())
            }
            UiCommand::ShowLogs => {
                self.open_logs()?;
                Ok(())
            }
            UiCommand::Shutdown => Ok(()),
        }
    }

    /// Render a step, updating components already shown for the same id.
    pub fn handle_step(&mut self, step: Step) -> Result<(), TerminalError> {
        if let Some(text) = step.text {
            match step.role {
                Role::User => {
                    let body = format!("> {text}");
                    let update = body.clone();
                    self.upsert(
                        &step.id,
                        move || TextComponent::new(body).with_style(message_style()),
                        move |c: &mut TextComponent| c.set_text(update),
                    )?;
                }
                role => {
                    let update = text.clone();
                    let style = match role {
                        Role::System => {
                            message_style().base(Style::default().add_modifier(Modifier::DIM))
                        }
                        _ => message_style(),
                    };
                    self.upsert(
                        &step.id,
                        move || MarkdownComponent::new(text).with_style(style),
                        move |c: &mut MarkdownComponent| c.set_markdown(update),
                    )?;
                }
            }
        }

        if !step.tool_call_requests.is_empty() {
            let text = self.format_requests(&step.tool_call_requests);
            let update = text.clone();
            self.upsert(
                &format!("{}{REQUESTS_SUFFIX}", step.id),
                move || TextComponent::new(text).with_style(message_style()),
                move |c: &mut TextComponent| c.set_text(update),
            )?;
        }

        if !step.tool_call_responses.is_empty() {
            let responses = step.tool_call_responses;
            let update = responses.clone();
            let formatters = Rc::clone(&self.formatters);
            let max_lines = self.compact_lines;
            self.upsert(
                &format!("{}{RESPONSES_SUFFIX}", step.id),
                move || {
                    ToolCallComponent::new(responses, formatters)
                        .with_max_lines(max_lines)
                        .with_style(message_style())
                },
                move |c: &mut ToolCallComponent| c.set_responses(update),
            )?;
        }
        Ok(())
    }

    fn format_requests(&self, requests: &[ToolCallRequest]) -> Text<'static> {
        let lines: Vec<Line<'static>> = requests
            .iter()
            .filter_map(|r| self.formatters.format_request(r))
            .flat_map(|t| t.lines)
            .collect();
        Text::from(lines)
    }

    fn upsert<T, F, U>(&mut self, id: &str, create: F, update: U) -> Result<(), TerminalError>
    where
        T: Component + 'static,
        F: FnOnce() -> T,
        U: FnOnce(&mut T),
    {
        match self.terminal.get_as::<T>(id) {
            Ok(existing) => {
                update(existing);
                return Ok(());
            }
            Err(TerminalError::NotFound(_)) | Err(TerminalError::TypeMismatch(_)) => {}
            Err(e) => return Err(e),
        }

        // A role change swaps the component type in place.
        let index = match self.terminal.index_of(id) {
            Some(index) => {
                self.terminal.remove_component(id)?;
                index
            }
            None => {
                self.messages.push(id.to_string());
                self.terminal
                    .index_of(COMMAND_HELP_ID)
                    .unwrap_or(self.terminal.len())
            }
        };
        self.terminal
            .insert_component(index, create().with_id(id).boxed())?;
        Ok(())
    }

    /// Remove everything shown for a step. Unknown ids are not an error.
    pub fn remove_step(&mut self, id: &str) -> Result<(), TerminalError> {
        for component_id in [
            id.to_string(),
            format!("{id}{REQUESTS_SUFFIX}"),
            format!("{id}{RESPONSES_SUFFIX}"),
        ] {
            match self.terminal.remove_component(&component_id) {
                Ok(_) => self.messages.retain(|m| *m != component_id),
                Err(TerminalError::NotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    // ── Input ──────────────────────────────────────────────────────────────

    pub fn handle_input(&mut self, event: InputEvent) -> io::Result<()> {
        if self.terminal.has_screen() {
            self.terminal.dispatch(&event)?;
            return Ok(());
        }
        match event {
            InputEvent::Key(key) => self.handle_key(&key)?,
            InputEvent::Paste(paste) => {
                let result = self.terminal.dispatch_paste(&paste)?;
                self.on_component_event(result);
            }
            InputEvent::Mouse(mouse) => {
                self.terminal.dispatch_mouse(&mouse)?;
            }
        }
        self.take_failure()
    }

    fn handle_key(&mut self, event: &KeyEvent) -> io::Result<()> {
        if self.mode == Mode::Command {
            self.handle_command_key(event);
            return Ok(());
        }
        if !self.suggestions.is_empty() && self.handle_suggestion_key(event) {
            return Ok(());
        }

        let commands = Rc::clone(&self.commands);
        if commands.dispatch(self, GLOBAL_CATEGORY, event) {
            return Ok(());
        }
        self.sweep = None;

        if self.recall_history(event) {
            return Ok(());
        }

        let result = self.terminal.dispatch_key(event)?;
        let eof = KeyBinding::char('d').ctrl();
        if result.is_none() && eof.matches(event) {
            self.emit(UiOutput::Eof);
        }
        self.on_component_event(result);
        Ok(())
    }

    fn on_component_event(&mut self, event: Option<ComponentEvent>) {
        match event {
            Some(ComponentEvent::Submitted(text)) => self.submit(&text),
            Some(ComponentEvent::CursorMoved { .. }) => {
                if let Some(debouncer) = self.debouncer.as_mut() {
                    debouncer.trigger();
                }
            }
            _ => {}
        }
    }

    fn submit(&mut self, text: &str) {
        let text = text.trim().to_string();
        self.history.add(&text);
        if let Some(input) = self.input_mut() {
            input.clear();
        }
        if let Some(debouncer) = self.debouncer.as_mut() {
            debouncer.cancel();
        }
        self.show_suggestions(Vec::new());
        self.emit(UiOutput::Submit(text));
    }

    /// Up/down recall history only at the first/last row of the input, so
    /// they still move the cursor inside multi-line text.
    fn recall_history(&mut self, event: &KeyEvent) -> bool {
        let binding = KeyBinding::from(event);
        let previous =
            binding == KeyBinding::new(Key::Up) || binding == KeyBinding::char('p').ctrl();
        let next =
            binding == KeyBinding::new(Key::Down) || binding == KeyBinding::char('n').ctrl();
        if !previous && !next {
            return false;
        }
        let Ok(input) = self.terminal.get_as::<InputComponent>(INPUT_ID) else {
            return false;
        };

        if previous {
            if input.cursor_row() != 0 {
                return false;
            }
            let Some(text) = self.history.navigate_previous(input.text()) else {
                return false;
            };
            // set_text leaves the cursor at the end.
            input.set_text(&text);
        } else {
            if input.cursor_row() + 1 != input.line_count() {
                return false;
            }
            let Some(text) = self.history.navigate_next() else {
                return false;
            };
            input.set_text(&text);
            input.set_cursor_position(0, 0);
        }
        true
    }

    // ── Command mode ───────────────────────────────────────────────────────

    fn enter_command_mode(&mut self) {
        self.mode = Mode::Command;
        self.sync_footer();
    }

    fn handle_command_key(&mut self, event: &KeyEvent) {
        self.mode = Mode::Normal;
        self.sync_footer();

        let binding = KeyBinding::from(event);
        if binding == KeyBinding::new(Key::Esc) || binding == KeyBinding::char('x').ctrl() {
            return;
        }

        let before = self.sweep;
        let commands = Rc::clone(&self.commands);
        if !commands.dispatch(self, COMMAND_CATEGORY, event) {
            debug!("No command bound to {binding}");
        }
        // Any command other than a sweep ends the sweep.
        if self.sweep == before {
            self.sweep = None;
        }
    }

    /// Collapse or expand the newest `10·k` messages, where `k` counts
    /// consecutive sweeps in the same direction.
    fn sweep(&mut self, direction: Sweep) {
        let batches = match self.sweep {
            Some((d, k)) if d == direction => k + 1,
            _ => 1,
        };
        self.sweep = Some((direction, batches));

        let count = (SWEEP_BATCH * batches).min(self.messages.len());
        let start = self.messages.len() - count;
        let collapsed = direction == Sweep::Collapse;
        for id in &self.messages[start..] {
            if let Ok(component) = self.terminal.get_mut(id)
                && let Some(collapsible) = component.as_collapsible_mut()
            {
                collapsible.set_collapsed(collapsed);
            }
        }
        debug!("{direction:?} sweep over {count} messages");
    }

    fn open_logs(&mut self) -> io::Result<()> {
        let viewer = log_viewer(&self.logs);
        self.terminal.push_screen(Box::new(viewer))
    }

    // ── Autocomplete ───────────────────────────────────────────────────────

    /// Ask the caller for suggestions for the text under the cursor: the
    /// current line up to the end of the word the cursor is in.
    pub fn request_autocomplete(&mut self) {
        let Some(input) = self.input() else {
            return;
        };
        let row = input.cursor_row();
        let col = input.cursor_col();
        let lines = input.editor().lines();
        let Some(line) = lines.get(row) else {
            return;
        };
        let word_end = line
            .chars()
            .skip(col)
            .take_while(|c| !c.is_whitespace())
            .count();
        let text: String = line.chars().take(col + word_end).collect();
        self.emit(UiOutput::AutocompleteRequest { text, row, col });
    }

    fn show_suggestions(&mut self, items: Vec<AutocompleteItem>) {
        let select_items = items
            .iter()
            .enumerate()
            .map(|(i, item)| SelectItem::new(i.to_string(), item.title.clone()))
            .collect();
        self.suggestions = items;
        if let Ok(list) = self.terminal.get_as::<SelectListComponent>(AUTOCOMPLETE_ID) {
            list.set_items(select_items);
        }
        self.sync_footer();
    }

    fn handle_suggestion_key(&mut self, event: &KeyEvent) -> bool {
        if !event.is_plain()
            || !matches!(
                event.key,
                Key::Up | Key::Down | Key::Enter | Key::Tab | Key::Esc
            )
        {
            return false;
        }
        let result = match self.terminal.get_as::<SelectListComponent>(AUTOCOMPLETE_ID) {
            Ok(list) => list.on_key_event(event),
            Err(_) => return false,
        };
        match result {
            Some(ComponentEvent::Selected(index)) => self.apply_suggestion(index),
            Some(ComponentEvent::Cancelled) => self.show_suggestions(Vec::new()),
            _ => {}
        }
        true
    }

    fn apply_suggestion(&mut self, index: usize) {
        let Some(item) = self.suggestions.get(index).cloned() else {
            return;
        };
        if let Some(input) = self.input_mut() {
            let text = input.text();
            let (start, end) = item
                .replace_range
                .unwrap_or_else(|| input.editor().word_range());
            // Caller ranges may be stale or split a character.
            let end = floor_char_boundary(text, end);
            let start = floor_char_boundary(text, start.min(end));
            let line_start = text[..start]
                .rfind('\n')
                .map_or(0, |i| i + 1);

            let mut insertion = item.insertion().to_string();
            // A completed slash command at line start gets its argument space.
            if start == line_start && insertion.starts_with('/') && !insertion.ends_with(' ') {
                insertion.push(' ');
            }
            input.replace_word(&insertion, Some((start, end)));
        }
        self.show_suggestions(Vec::new());
    }

    /// Exactly one of help, suggestions, toolbar shows under the input.
    fn sync_footer(&mut self) {
        let command = self.mode == Mode::Command;
        let suggesting = !command && !self.suggestions.is_empty();
        for (id, visible) in [
            (COMMAND_HELP_ID, command),
            (AUTOCOMPLETE_ID, suggesting),
            (TOOLBAR_ID, !command && !suggesting),
        ] {
            if let Ok(component) = self.terminal.get_mut(id) {
                component.core_mut().set_hidden(!visible);
            }
        }
    }
}

fn floor_char_boundary(text: &str, index: usize) -> usize {
    let mut index = index.min(text.len());
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

fn message_style() -> ComponentStyle {
    ComponentStyle::default().margin_bottom(1)
}

fn default_commands() -> Result<CommandRegistry<UiState>, CommandError> {
    let mut registry = CommandRegistry::new();
    registry.register(Hotkey::new(
        "Stop",
        GLOBAL_CATEGORY,
        KeyBinding::char('c').ctrl(),
        |ui: &mut UiState, _| {
            ui.emit(UiOutput::Stop);
            true
        },
    ))?;
    registry.register(Hotkey::new(
        "Command manager",
        GLOBAL_CATEGORY,
        KeyBinding::char('x').ctrl(),
        |ui: &mut UiState, _| {
            ui.enter_command_mode();
            true
        },
    ))?;
    registry.register(Hotkey::new(
        "Collapse messages",
        COMMAND_CATEGORY,
        KeyBinding::char('c'),
        |ui: &mut UiState, _| {
            ui.sweep(Sweep::Collapse);
            true
        },
    ))?;
    registry.register(Hotkey::new(
        "Expand messages",
        COMMAND_CATEGORY,
        KeyBinding::char('e'),
        |ui: &mut UiState, _| {
            ui.sweep(Sweep::Expand);
            true
        },
    ))?;
    registry.register(Hotkey::new(
        "Logs",
        COMMAND_CATEGORY,
        KeyBinding::char('l'),
        |ui: &mut UiState, _| {
            let result = ui.open_logs();
            ui.record(result);
            true
        },
    ))?;
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::step::ToolCallResponse;
    use crate::test_support::SharedBuffer;
    use crate::tui::input::PasteEvent;
    use serde_json::json;
    use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};

    fn ui() -> (UiState, UnboundedReceiver<UiOutput>) {
        let (tx, rx) = unbounded_channel();
        let terminal = Terminal::new(SharedBuffer::new(), 80, 24);
        let state = UiState::new(terminal, &ResolvedConfig::default(), LogStore::new(10), tx)
            .unwrap();
        (state, rx)
    }

    fn key(ui: &mut UiState, event: KeyEvent) {
        ui.handle_input(InputEvent::Key(event)).unwrap();
    }

    fn type_text(ui: &mut UiState, text: &str) {
        for c in text.chars() {
            key(ui, KeyEvent::char(c));
        }
    }

    fn send(ui: &mut UiState) {
        key(ui, KeyEvent::new(Key::Enter).with_text('\n').with_alt());
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(Key::Char(c)).with_ctrl()
    }

    fn is_hidden(ui: &UiState, id: &str) -> bool {
        ui.terminal().get(id).unwrap().core().is_hidden()
    }

    fn is_collapsed(ui: &UiState, id: &str) -> bool {
        ui.terminal()
            .get(id)
            .unwrap()
            .as_collapsible()
            .is_some_and(|c| c.is_collapsed())
    }

    #[test]
    fn submit_trims_records_and_clears() {
        let (mut ui, mut rx) = ui();
        type_text(&mut ui, " hi ");
        send(&mut ui);
        assert_eq!(rx.try_recv().unwrap(), UiOutput::Submit("hi".into()));
        assert_eq!(ui.input_text(), "");
        assert_eq!(ui.history().entries(), ["hi"]);
    }

    #[test]
    fn history_recall_and_restore() {
        let (mut ui, _rx) = ui();
        for line in ["one", "two"] {
            type_text(&mut ui, line);
            send(&mut ui);
        }
        type_text(&mut ui, "draft");

        key(&mut ui, KeyEvent::new(Key::Up));
        assert_eq!(ui.input_text(), "two");
        key(&mut ui, ctrl('p'));
        assert_eq!(ui.input_text(), "one");
        key(&mut ui, KeyEvent::new(Key::Down));
        assert_eq!(ui.input_text(), "two");
        key(&mut ui, ctrl('n'));
        assert_eq!(ui.input_text(), "draft");
    }

    #[test]
    fn up_inside_multiline_text_moves_cursor() {
        let (mut ui, _rx) = ui();
        type_text(&mut ui, "old");
        send(&mut ui);
        type_text(&mut ui, "a");
        key(&mut ui, KeyEvent::new(Key::Enter).with_text('\n'));
        type_text(&mut ui, "b");

        key(&mut ui, KeyEvent::new(Key::Up));
        assert_eq!(ui.input_text(), "a\nb");
    }

    #[test]
    fn stop_and_eof_signals() {
        let (mut ui, mut rx) = ui();
        key(&mut ui, ctrl('c'));
        assert_eq!(rx.try_recv().unwrap(), UiOutput::Stop);

        key(&mut ui, ctrl('d'));
        assert_eq!(rx.try_recv().unwrap(), UiOutput::Eof);

        // With text, ctrl+d edits instead.
        type_text(&mut ui, "x");
        key(&mut ui, ctrl('d'));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn steps_upsert_in_place_before_input() {
        let (mut ui, _rx) = ui();
        ui.handle_step(Step::text(Role::Assistant, "hello").with_id("s1"))
            .unwrap();
        ui.handle_step(Step::text(Role::Assistant, "bye").with_id("s1"))
            .unwrap();
        assert_eq!(ui.messages(), ["s1"]);
        let markdown = ui.terminal_mut().get_as::<MarkdownComponent>("s1").unwrap();
        assert_eq!(markdown.markdown(), "bye");

        let input_at = ui.terminal().index_of(INPUT_ID).unwrap();
        assert!(ui.terminal().index_of("s1").unwrap() < input_at);
        assert_eq!(ui.terminal().index_of(HEADER_ID), Some(0));
    }

    #[test]
    fn role_change_replaces_component_at_same_position() {
        let (mut ui, _rx) = ui();
        ui.handle_step(Step::text(Role::Assistant, "a").with_id("s1"))
            .unwrap();
        ui.handle_step(Step::text(Role::Assistant, "b").with_id("s2"))
            .unwrap();
        let before = ui.terminal().index_of("s1");
        ui.handle_step(Step::text(Role::User, "mine").with_id("s1"))
            .unwrap();
        assert_eq!(ui.terminal().index_of("s1"), before);
        assert!(ui.terminal_mut().get_as::<TextComponent>("s1").is_ok());
        assert_eq!(ui.messages(), ["s1", "s2"]);
    }

    #[test]
    fn tool_steps_and_removal() {
        let (mut ui, _rx) = ui();
        let step = Step {
            id: "t1".into(),
            role: Role::Assistant,
            text: None,
            tool_call_requests: vec![ToolCallRequest {
                name: "ls".into(),
                arguments: json!({"path": "/"}),
            }],
            tool_call_responses: vec![ToolCallResponse {
                name: "ls".into(),
                result: json!("a\nb"),
            }],
        };
        ui.handle_step(step).unwrap();
        assert_eq!(ui.messages(), ["t1:requests", "t1:tools"]);
        assert!(is_collapsed(&ui, "t1:tools"));

        ui.remove_step("t1").unwrap();
        assert!(ui.messages().is_empty());
        assert!(!ui.terminal().contains("t1:tools"));
        ui.remove_step("never-shown").unwrap();
    }

    #[test]
    fn command_mode_toggles_footer() {
        let (mut ui, _rx) = ui();
        assert!(is_hidden(&ui, COMMAND_HELP_ID));
        key(&mut ui, ctrl('x'));
        assert!(ui.is_command_mode());
        assert!(!is_hidden(&ui, COMMAND_HELP_ID));
        assert!(is_hidden(&ui, TOOLBAR_ID));

        key(&mut ui, KeyEvent::new(Key::Esc));
        assert!(!ui.is_command_mode());
        assert!(is_hidden(&ui, COMMAND_HELP_ID));
        assert!(!is_hidden(&ui, TOOLBAR_ID));
    }

    #[test]
    fn sweeps_grow_and_reset_on_other_keys() {
        let (mut ui, _rx) = ui();
        for i in 0..25 {
            ui.handle_step(Step::text(Role::Assistant, format!("m{i}")).with_id(format!("m{i}")))
                .unwrap();
        }
        let ids: Vec<String> = ui.messages().to_vec();

        key(&mut ui, ctrl('x'));
        key(&mut ui, KeyEvent::char('c'));
        assert!(!ui.is_command_mode());
        assert!(ids[15..].iter().all(|id| is_collapsed(&ui, id)));
        assert!(ids[..15].iter().all(|id| !is_collapsed(&ui, id)));

        key(&mut ui, ctrl('x'));
        key(&mut ui, KeyEvent::char('c'));
        assert!(ids[5..].iter().all(|id| is_collapsed(&ui, id)));

        type_text(&mut ui, "x");
        key(&mut ui, ctrl('x'));
        key(&mut ui, KeyEvent::char('e'));
        assert!(ids[15..].iter().all(|id| !is_collapsed(&ui, id)));
        assert!(ids[5..15].iter().all(|id| is_collapsed(&ui, id)));

        key(&mut ui, ctrl('x'));
        key(&mut ui, KeyEvent::char('e'));
        assert!(ids[5..].iter().all(|id| !is_collapsed(&ui, id)));
    }

    #[test]
    fn logs_hotkey_opens_and_q_closes_viewer() {
        let (mut ui, _rx) = ui();
        key(&mut ui, ctrl('x'));
        key(&mut ui, KeyEvent::char('l'));
        assert!(ui.terminal().has_screen());
        key(&mut ui, KeyEvent::char('q'));
        assert!(!ui.terminal().has_screen());
    }

    #[test]
    fn autocomplete_request_covers_word_under_cursor() {
        let (mut ui, mut rx) = ui();
        type_text(&mut ui, "foo bar");
        ui.input_mut().unwrap().set_cursor_position(0, 5);
        ui.request_autocomplete();
        assert_eq!(
            rx.try_recv().unwrap(),
            UiOutput::AutocompleteRequest {
                text: "foo bar".into(),
                row: 0,
                col: 5
            }
        );
    }

    #[test]
    fn choosing_a_suggestion_replaces_the_word() {
        let (mut ui, _rx) = ui();
        type_text(&mut ui, "/he");
        ui.handle_command(UiCommand::Autocomplete(Some(vec![
            AutocompleteItem::new("/help"),
            AutocompleteItem::new("/hello"),
        ])))
        .unwrap();
        assert!(!is_hidden(&ui, AUTOCOMPLETE_ID));
        assert!(is_hidden(&ui, TOOLBAR_ID));

        key(&mut ui, KeyEvent::new(Key::Tab).with_text('\t'));
        assert_eq!(ui.input_text(), "/help ");
        assert!(ui.suggestions().is_empty());
        assert!(is_hidden(&ui, AUTOCOMPLETE_ID));
    }

    #[test]
    fn suggestion_ranges_snap_to_char_boundaries() {
        let (mut ui, _rx) = ui();
        type_text(&mut ui, "é");
        ui.handle_command(UiCommand::Autocomplete(Some(vec![AutocompleteItem {
            title: "e".into(),
            replace_with: None,
            replace_range: Some((1, 2)),
        }])))
        .unwrap();
        key(&mut ui, KeyEvent::new(Key::Tab).with_text('\t'));
        assert_eq!(ui.input_text(), "e");

        // A range left over from a longer input lands at the end.
        ui.handle_command(UiCommand::Autocomplete(Some(vec![AutocompleteItem {
            title: "x".into(),
            replace_with: None,
            replace_range: Some((10, 20)),
        }])))
        .unwrap();
        key(&mut ui, KeyEvent::new(Key::Tab).with_text('\t'));
        assert_eq!(ui.input_text(), "ex");
    }

    #[test]
    fn escape_dismisses_suggestions() {
        let (mut ui, _rx) = ui();
        type_text(&mut ui, "wo");
        ui.handle_command(UiCommand::Autocomplete(Some(vec![AutocompleteItem::new("word")])))
            .unwrap();
        key(&mut ui, KeyEvent::new(Key::Esc));
        assert!(ui.suggestions().is_empty());
        assert_eq!(ui.input_text(), "wo");

        ui.handle_command(UiCommand::Autocomplete(None)).unwrap();
        assert!(!is_hidden(&ui, TOOLBAR_ID));
    }

    #[test]
    fn paste_goes_to_input_and_show_text_opens_viewer() {
        let (mut ui, _rx) = ui();
        ui.handle_input(InputEvent::Paste(PasteEvent {
            text: "pasted".into(),
        }))
        .unwrap();
        assert_eq!(ui.input_text(), "pasted");

        ui.handle_command(UiCommand::ShowText {
            title: "help".into(),
            text: "body".into(),
        })
        .unwrap();
        assert!(ui.terminal().has_screen());
    }

    #[test]
    fn set_status_updates_toolbar() {
        let (mut ui, _rx) = ui();
        ui.handle_command(UiCommand::SetStatus("busy".into())).unwrap();
        let toolbar = ui.terminal_mut().get_as::<StatusComponent>(TOOLBAR_ID).unwrap();
        assert_eq!(toolbar.text(), "busy");
    }

    #[test]
    fn running_status_registers_toolbar_animation() {
        let (mut ui, _rx) = ui();
        assert!(!ui.terminal().is_animating());

        ui.handle_command(UiCommand::SetRunning(true)).unwrap();
        assert!(ui.terminal().is_animating());
        ui.terminal_mut().tick_animations();
        let toolbar = ui.terminal_mut().get_as::<StatusComponent>(TOOLBAR_ID).unwrap();
        assert!(toolbar.is_running());
        assert_eq!(toolbar.frame(), 1);

        ui.handle_command(UiCommand::SetRunning(false)).unwrap();
        assert!(!ui.terminal().is_animating());
    }
}
