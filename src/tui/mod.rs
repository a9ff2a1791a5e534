//! # TUI Engine
//!
//! Turns terminal bytes into events and a component tree into minimal
//! terminal updates. Nothing here depends on what the content means.
//!
//! ## Tasks
//!
//! ```text
//!   stdin ──► reader task ──┐
//!   SIGWINCH ─► watcher ────┤
//!   debounce timers ────────┼──► mpsc<Message> ──► Session::run (render loop)
//!   UiHandle (any thread) ──┘                          │
//!                                                      └──► UiOutput channel
//! ```
//!
//! The render loop owns every component. They are `Rc`-linked and not
//! `Send`, so all mutation happens on the loop; other code posts
//! [`UiCommand`]s through a [`UiHandle`].
//!
//! ## Paint Scheduling
//!
//! A dirty notification only sets a flag. The loop arms a frame deadline the
//! first time it sees the flag and keeps draining messages until then, so a
//! burst of keystrokes or steps costs one paint.
//!
//! While any component is registered as an animation, a second deadline
//! ticks them every [`ANIMATION_INTERVAL`]. Idle sessions arm no timer.

pub mod commands;
pub mod compact;
pub mod component;
pub mod components;
pub mod controls;
pub mod debounce;
pub mod formatters;
pub mod input;
pub mod markdown;
pub mod render;
pub mod screen;
pub mod screens;
pub mod state;
pub mod terminal;

use std::io::{self, Write};
use std::time::Duration;

use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use log::{debug, info, warn};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};

use crate::core::config::ResolvedConfig;
use crate::core::step::{AutocompleteItem, Step};
use crate::logging::LogStore;

use self::controls::{DISABLE_BRACKETED_PASTE, SHOW_CURSOR};
use self::debounce::Debouncer;
use self::input::InputEvent;

pub use self::state::{UiCommand, UiOutput, UiState};
pub use self::terminal::{Terminal, TerminalError};

/// Spinner frame rate.
pub const ANIMATION_INTERVAL: Duration = Duration::from_millis(80);

/// Everything the render loop reacts to.
#[derive(Debug)]
pub enum Message {
    Input(InputEvent),
    /// The input source hit EOF or failed.
    InputClosed,
    Resize(u16, u16),
    Command(UiCommand),
    /// The autocomplete quiet period elapsed.
    AutocompleteDue,
}

/// Cloneable, `Send` handle for talking to the render loop.
#[derive(Debug, Clone)]
pub struct UiHandle {
    tx: UnboundedSender<Message>,
}

impl UiHandle {
    /// Post any loop message, e.g. input from a source other than stdin.
    /// Returns false once the loop has exited.
    pub fn post(&self, message: Message) -> bool {
        self.tx.send(message).is_ok()
    }

    pub fn send(&self, command: UiCommand) -> bool {
        self.post(Message::Command(command))
    }

    pub fn step(&self, step: Step) -> bool {
        self.send(UiCommand::Step(step))
    }

    pub fn remove_step(&self, id: impl Into<String>) -> bool {
        self.send(UiCommand::RemoveStep(id.into()))
    }

    pub fn set_status(&self, text: impl Into<String>) -> bool {
        self.send(UiCommand::SetStatus(text.into()))
    }

    pub fn autocomplete(&self, items: Option<Vec<AutocompleteItem>>) -> bool {
        self.send(UiCommand::Autocomplete(items))
    }

    pub fn show_text(&self, title: impl Into<String>, text: impl Into<String>) -> bool {
        self.send(UiCommand::ShowText {
            title: title.into(),
            text: text.into(),
        })
    }

    pub fn set_running(&self, running: bool) -> bool {
        self.send(UiCommand::SetRunning(running))
    }

    pub fn show_logs(&self) -> bool {
        self.send(UiCommand::ShowLogs)
    }

    pub fn shutdown(&self) -> bool {
        self.send(UiCommand::Shutdown)
    }
}

/// The loop's message channel: a handle for producers and the receiving end
/// for [`Session`].
pub fn channel() -> (UiHandle, UnboundedReceiver<Message>) {
    let (tx, rx) = unbounded_channel();
    (UiHandle { tx }, rx)
}

/// RAII guard for raw mode. Also re-enables line editing output state
/// (paste brackets, cursor) so an error path never leaves the shell broken.
struct TerminalModeGuard;

impl TerminalModeGuard {
    fn new() -> io::Result<Self> {
        enable_raw_mode()?;
        info!("Raw mode enabled");
        Ok(Self)
    }
}

impl Drop for TerminalModeGuard {
    fn drop(&mut self) {
        let mut out = io::stdout();
        let _ = write!(out, "{DISABLE_BRACKETED_PASTE}{SHOW_CURSOR}");
        let _ = out.flush();
        let _ = disable_raw_mode();
    }
}

fn into_io(e: TerminalError) -> io::Error {
    match e {
        TerminalError::Io(e) => e,
        other => io::Error::other(other),
    }
}

/// One UI session: the render loop plus the tasks feeding it.
pub struct Session {
    state: UiState,
    messages: UnboundedReceiver<Message>,
    frame_interval: Duration,
    tasks: Vec<JoinHandle<()>>,
    _guard: Option<TerminalModeGuard>,
}

impl Session {
    /// Take over the real terminal: raw mode, stdin reader, resize watcher.
    pub fn start(
        config: &ResolvedConfig,
        logs: LogStore,
        output: UnboundedSender<UiOutput>,
    ) -> io::Result<(Self, UiHandle)> {
        let (handle, messages) = channel();
        let guard = TerminalModeGuard::new()?;
        let terminal = Terminal::stdout()?;

        let mut state = UiState::new(terminal, config, logs, output).map_err(into_io)?;
        state.enable_autocomplete(Debouncer::new(
            config.autocomplete_debounce,
            handle.tx.clone(),
        ));

        let mut tasks = vec![input::reader::spawn(
            tokio::io::stdin(),
            config.esc_timeout,
            handle.tx.clone(),
        )];
        tasks.extend(input::reader::spawn_resize_watcher(handle.tx.clone()));

        let session = Self {
            state,
            messages,
            frame_interval: config.frame_interval,
            tasks,
            _guard: Some(guard),
        };
        Ok((session, handle))
    }

    /// A session over caller-supplied state and channel, with no terminal
    /// modes and no background tasks.
    pub fn new(
        state: UiState,
        messages: UnboundedReceiver<Message>,
        frame_interval: Duration,
    ) -> Self {
        Self {
            state,
            messages,
            frame_interval,
            tasks: Vec::new(),
            _guard: None,
        }
    }

    pub fn state(&self) -> &UiState {
        &self.state
    }

    /// Run until shutdown, input EOF, or every handle is gone. Terminal
    /// modes are restored whether or not the loop failed. The UI state, and
    /// with it the output channel, is dropped on return.
    pub async fn run(mut self) -> io::Result<()> {
        let result = self.event_loop().await;
        for task in &self.tasks {
            task.abort();
        }
        let stopped = self.state.terminal_mut().stop();
        info!("Session ended");
        result.and(stopped)
    }

    async fn event_loop(&mut self) -> io::Result<()> {
        self.state.terminal_mut().start()?;
        let mut deadline: Option<Instant> = None;
        let mut tick: Option<Instant> = None;

        loop {
            if deadline.is_none() && self.state.terminal().signal().is_requested() {
                deadline = Some(Instant::now() + self.frame_interval);
            }
            if !self.state.terminal().is_animating() {
                tick = None;
            } else if tick.is_none() {
                tick = Some(Instant::now() + ANIMATION_INTERVAL);
            }

            tokio::select! {
                message = self.messages.recv() => {
                    let Some(message) = message else {
                        debug!("All UI handles dropped");
                        break;
                    };
                    if !self.handle(message)? {
                        break;
                    }
                }
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    deadline = None;
                    self.state.terminal_mut().render_pending()?;
                }
                _ = sleep_until(tick.unwrap_or_else(Instant::now)), if tick.is_some() => {
                    tick = None;
                    self.state.terminal_mut().tick_animations();
                }
            }
        }

        // Final frame, so the last changes are on screen before exit.
        self.state.terminal_mut().render_pending()
    }

    /// Returns false when the loop should end.
    fn handle(&mut self, message: Message) -> io::Result<bool> {
        match message {
            Message::Input(event) => self.state.handle_input(event)?,
            Message::InputClosed => {
                info!("Input closed, ending session");
                return Ok(false);
            }
            Message::Resize(width, height) => self.state.terminal_mut().set_size(width, height)?,
            Message::Command(UiCommand::Shutdown) => {
                info!("Shutdown requested");
                return Ok(false);
            }
            Message::Command(command) => match self.state.handle_command(command) {
                Ok(()) => {}
                Err(TerminalError::Io(e)) => return Err(e),
                Err(e) => warn!("UI command failed: {e}"),
            },
            Message::AutocompleteDue => self.state.request_autocomplete(),
        }
        Ok(true)
    }
}
