//! # Terminal
//!
//! Owns the top-level components, the focus stack, the screen stack and the
//! last painted frame, and turns all of that into control sequences.
//!
//! ## Normal view
//!
//! Components are painted top to bottom into the main screen and allowed to
//! scroll into the terminal's history. After a paint the cursor sits on the
//! row below the last line, so the row holding line `d` is `len - d` rows up.
//!
//! ```text
//!   old frame          new frame
//!   0 header           0 header
//!   1 msg   ◄─ d ─►    1 msg (changed)      up = old_len - d
//!   2 input            2 input
//!   _ cursor           _ cursor
//! ```
//!
//! A pass finds the first differing line `d`. If that row is still on
//! screen (`up < height`), it moves up, erases down and rewrites from `d`.
//! Otherwise the change lives in scrollback, which cannot be addressed, and
//! the whole frame is repainted after a full clear. A width change always
//! repaints in full, since every component re-wraps.
//!
//! ## Screens
//!
//! The first pushed screen switches to the alternate buffer; nested screens
//! share it. While any screen is up, it alone is painted and receives input.
//! Popping the last one returns to the main buffer and repaints in full.
//!
//! Every write is wrapped in a synchronized-update bracket.

use std::collections::HashMap;
use std::fmt;
use std::io::{self, Write};
use std::rc::Rc;

use log::{debug, info};
use ratatui::text::Line;

use super::component::{Component, ComponentEvent, ComponentKey, RenderSignal, downcast_mut};
use super::controls::{
    CURSOR_COLUMN_1, CURSOR_HOME, DISABLE_BRACKETED_PASTE, ENABLE_BRACKETED_PASTE,
    ENTER_ALT_SCREEN, ERASE_DOWN, ERASE_LINE_END, EXIT_ALT_SCREEN, FULL_CLEAR, HIDE_CURSOR,
    NEWLINE, SHOW_CURSOR, SYNC_UPDATE_END, SYNC_UPDATE_START, cursor_previous_line,
};
use super::input::{InputEvent, KeyEvent, MouseEvent, PasteEvent};
use super::render::encode_line;
use super::screen::{Screen, ScreenAction};

#[derive(Debug)]
pub enum TerminalError {
    /// No component with this id is attached.
    NotFound(String),
    DuplicateId(String),
    /// The component exists but is not of the requested type.
    TypeMismatch(String),
    Io(io::Error),
}

impl fmt::Display for TerminalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminalError::NotFound(id) => write!(f, "component not found: {id}"),
            TerminalError::DuplicateId(id) => write!(f, "duplicate component id: {id}"),
            TerminalError::TypeMismatch(id) => write!(f, "component {id} has a different type"),
            TerminalError::Io(e) => write!(f, "terminal I/O error: {e}"),
        }
    }
}

impl std::error::Error for TerminalError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TerminalError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for TerminalError {
    fn from(e: io::Error) -> Self {
        TerminalError::Io(e)
    }
}

pub struct Terminal {
    components: HashMap<ComponentKey, Box<dyn Component>>,
    order: Vec<ComponentKey>,
    ids: HashMap<String, ComponentKey>,
    focus: Vec<ComponentKey>,
    /// Components ticked on the animation interval, in registration order.
    animations: Vec<ComponentKey>,
    screens: Vec<Box<dyn Screen>>,
    screen_dirty: bool,
    /// Rendered lines per component, valid until it is dirtied.
    cache: HashMap<ComponentKey, Vec<Line<'static>>>,
    frame: Vec<Line<'static>>,
    width: u16,
    height: u16,
    frame_width: Option<u16>,
    force_full: bool,
    started: bool,
    signal: Rc<RenderSignal>,
    out: Box<dyn Write>,
}

impl Terminal {
    pub fn new(out: impl Write + 'static, width: u16, height: u16) -> Self {
        Self {
            components: HashMap::new(),
            order: Vec::new(),
            ids: HashMap::new(),
            focus: Vec::new(),
            animations: Vec::new(),
            screens: Vec::new(),
            screen_dirty: false,
            cache: HashMap::new(),
            frame: Vec::new(),
            width,
            height,
            frame_width: None,
            force_full: true,
            started: false,
            signal: Rc::new(RenderSignal::default()),
            out: Box::new(out),
        }
    }

    /// Attached to the real terminal's stdout at its current size.
    pub fn stdout() -> io::Result<Self> {
        let (width, height) = crossterm::terminal::size()?;
        Ok(Self::new(io::stdout(), width, height))
    }

    pub fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    pub fn signal(&self) -> &Rc<RenderSignal> {
        &self.signal
    }

    /// Lines of the last painted normal-view frame.
    pub fn frame(&self) -> &[Line<'static>] {
        &self.frame
    }

    // ── Lifecycle ──────────────────────────────────────────────────────────

    pub fn start(&mut self) -> io::Result<()> {
        if self.started {
            return Ok(());
        }
        self.started = true;
        write!(self.out, "{ENABLE_BRACKETED_PASTE}{HIDE_CURSOR}")?;
        self.out.flush()?;
        self.force_full = true;
        self.signal.request();
        info!("Terminal started at {}x{}", self.width, self.height);
        Ok(())
    }

    pub fn stop(&mut self) -> io::Result<()> {
        if !self.started {
            return Ok(());
        }
        self.started = false;
        if !self.screens.is_empty() {
            self.screens.clear();
            write!(self.out, "{EXIT_ALT_SCREEN}")?;
        }
        write!(self.out, "{DISABLE_BRACKETED_PASTE}{SHOW_CURSOR}")?;
        self.out.flush()?;
        info!("Terminal stopped");
        Ok(())
    }

    pub fn set_size(&mut self, width: u16, height: u16) -> io::Result<()> {
        debug!("Resize to {width}x{height}");
        self.width = width;
        self.height = height;
        self.force_full = true;
        match self.screens.last_mut() {
            Some(screen) => {
                screen.set_size(width, height);
                self.paint_screen()
            }
            None => {
                self.signal.request();
                Ok(())
            }
        }
    }

    // ── Components ─────────────────────────────────────────────────────────

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn append_component(
        &mut self,
        component: Box<dyn Component>,
    ) -> Result<ComponentKey, TerminalError> {
        self.insert_component(self.order.len(), component)
    }

    /// Insert at `index`, clamped to the end.
    pub fn insert_component(
        &mut self,
        index: usize,
        component: Box<dyn Component>,
    ) -> Result<ComponentKey, TerminalError> {
        let key = component.core().key();
        if let Some(id) = component.core().id() {
            if self.ids.contains_key(id) {
                return Err(TerminalError::DuplicateId(id.to_string()));
            }
            self.ids.insert(id.to_string(), key);
        }
        component.core().attach_to_terminal(&self.signal);
        let index = index.min(self.order.len());
        self.order.insert(index, key);
        self.components.insert(key, component);
        Ok(key)
    }

    pub fn remove_component(&mut self, id: &str) -> Result<Box<dyn Component>, TerminalError> {
        let key = self.key_of(id)?;
        self.remove_by_key(key)
            .ok_or_else(|| TerminalError::NotFound(id.to_string()))
    }

    pub fn remove_by_key(&mut self, key: ComponentKey) -> Option<Box<dyn Component>> {
        let component = self.components.remove(&key)?;
        self.order.retain(|k| *k != key);
        self.focus.retain(|k| *k != key);
        self.animations.retain(|k| *k != key);
        self.cache.remove(&key);
        if let Some(id) = component.core().id() {
            self.ids.remove(id);
        }
        component.core().detach();
        self.signal.request();
        Some(component)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains_key(id)
    }

    /// Position of the component in paint order.
    pub fn index_of(&self, id: &str) -> Option<usize> {
        let key = self.ids.get(id)?;
        self.order.iter().position(|k| k == key)
    }

    fn key_of(&self, id: &str) -> Result<ComponentKey, TerminalError> {
        self.ids
            .get(id)
            .copied()
            .ok_or_else(|| TerminalError::NotFound(id.to_string()))
    }

    pub fn get(&self, id: &str) -> Result<&(dyn Component + 'static), TerminalError> {
        let key = self.key_of(id)?;
        self.components
            .get(&key)
            .map(|c| c.as_ref())
            .ok_or_else(|| TerminalError::NotFound(id.to_string()))
    }

    pub fn get_mut(&mut self, id: &str) -> Result<&mut (dyn Component + 'static), TerminalError> {
        let key = self.key_of(id)?;
        self.components
            .get_mut(&key)
            .map(|c| c.as_mut())
            .ok_or_else(|| TerminalError::NotFound(id.to_string()))
    }

    pub fn get_as<T: Component + 'static>(&mut self, id: &str) -> Result<&mut T, TerminalError> {
        let component = self.get_mut(id)?;
        downcast_mut::<T>(component).ok_or_else(|| TerminalError::TypeMismatch(id.to_string()))
    }

    // ── Focus ──────────────────────────────────────────────────────────────

    pub fn push_focus(&mut self, id: &str) -> Result<(), TerminalError> {
        let key = self.key_of(id)?;
        self.focus.retain(|k| *k != key);
        self.focus.push(key);
        Ok(())
    }

    pub fn pop_focus(&mut self) -> Option<ComponentKey> {
        self.focus.pop()
    }

    pub fn focused_key(&self) -> Option<ComponentKey> {
        self.focus.last().copied()
    }

    fn focused_mut(&mut self) -> Option<&mut Box<dyn Component>> {
        let key = self.focus.last()?;
        self.components.get_mut(key)
    }

    // ── Animation ──────────────────────────────────────────────────────────

    /// Tick `id` on every animation interval until deregistered or removed.
    /// Registering twice is a no-op.
    pub fn register_animation(&mut self, id: &str) -> Result<(), TerminalError> {
        let key = self.key_of(id)?;
        if !self.animations.contains(&key) {
            self.animations.push(key);
            debug!("Animation registered for {id}, {} running", self.animations.len());
        }
        Ok(())
    }

    pub fn deregister_animation(&mut self, id: &str) -> Result<(), TerminalError> {
        let key = self.key_of(id)?;
        self.animations.retain(|k| *k != key);
        Ok(())
    }

    /// True while any component wants ticks.
    pub fn is_animating(&self) -> bool {
        !self.animations.is_empty()
    }

    /// Advance every registered animation by one frame. Components dirty
    /// themselves, so the next paint picks the change up.
    pub fn tick_animations(&mut self) {
        for key in &self.animations {
            if let Some(component) = self.components.get_mut(key) {
                component.on_tick();
            }
        }
    }

    // ── Screens ────────────────────────────────────────────────────────────

    pub fn has_screen(&self) -> bool {
        !self.screens.is_empty()
    }

    pub fn screen_count(&self) -> usize {
        self.screens.len()
    }

    pub fn push_screen(&mut self, mut screen: Box<dyn Screen>) -> io::Result<()> {
        screen.set_size(self.width, self.height);
        if self.screens.is_empty() {
            write!(self.out, "{ENTER_ALT_SCREEN}")?;
        }
        self.screens.push(screen);
        debug!("Screen pushed, depth {}", self.screens.len());
        self.paint_screen()
    }

    pub fn pop_screen(&mut self) -> io::Result<Option<Box<dyn Screen>>> {
        let Some(screen) = self.screens.pop() else {
            return Ok(None);
        };
        debug!("Screen popped, depth {}", self.screens.len());
        match self.screens.last_mut() {
            Some(below) => {
                below.set_size(self.width, self.height);
                self.paint_screen()?;
            }
            None => {
                write!(self.out, "{EXIT_ALT_SCREEN}")?;
                self.force_full = true;
                self.paint_components()?;
            }
        }
        Ok(Some(screen))
    }

    fn paint_screen(&mut self) -> io::Result<()> {
        self.screen_dirty = false;
        let Some(screen) = self.screens.last() else {
            return Ok(());
        };
        let lines = screen.render(self.width, self.height);

        write!(self.out, "{SYNC_UPDATE_START}{CURSOR_HOME}")?;
        for (i, line) in lines.iter().enumerate() {
            if i > 0 {
                write!(self.out, "{NEWLINE}")?;
            }
            encode_line(&mut self.out, line)?;
            write!(self.out, "{ERASE_LINE_END}")?;
        }
        write!(self.out, "{ERASE_DOWN}{SYNC_UPDATE_END}")?;
        self.out.flush()
    }

    fn apply_screen_action(&mut self, action: ScreenAction) -> io::Result<()> {
        match action {
            ScreenAction::Ignored => Ok(()),
            ScreenAction::Redraw => {
                self.screen_dirty = true;
                self.signal.request();
                Ok(())
            }
            ScreenAction::Close => self.pop_screen().map(|_| ()),
        }
    }

    // ── Input routing ──────────────────────────────────────────────────────

    /// Route to the top screen if any, else to the focused component. A
    /// screen's outcome is applied here and never surfaces.
    pub fn dispatch(&mut self, event: &InputEvent) -> io::Result<Option<ComponentEvent>> {
        match event {
            InputEvent::Key(key) => self.dispatch_key(key),
            InputEvent::Paste(paste) => self.dispatch_paste(paste),
            InputEvent::Mouse(mouse) => self.dispatch_mouse(mouse),
        }
    }

    pub fn dispatch_key(&mut self, event: &KeyEvent) -> io::Result<Option<ComponentEvent>> {
        if let Some(screen) = self.screens.last_mut() {
            let action = screen.on_key_event(event);
            self.apply_screen_action(action)?;
            return Ok(None);
        }
        Ok(self.focused_mut().and_then(|c| c.on_key_event(event)))
    }

    pub fn dispatch_paste(&mut self, event: &PasteEvent) -> io::Result<Option<ComponentEvent>> {
        if let Some(screen) = self.screens.last_mut() {
            let action = screen.on_paste(event);
            self.apply_screen_action(action)?;
            return Ok(None);
        }
        Ok(self.focused_mut().and_then(|c| c.on_paste(event)))
    }

    pub fn dispatch_mouse(&mut self, event: &MouseEvent) -> io::Result<Option<ComponentEvent>> {
        if let Some(screen) = self.screens.last_mut() {
            let action = screen.on_mouse_event(event);
            self.apply_screen_action(action)?;
            return Ok(None);
        }
        Ok(self.focused_mut().and_then(|c| c.on_mouse_event(event)))
    }

    // ── Painting ───────────────────────────────────────────────────────────

    /// Paint only if something asked for it since the last pass.
    pub fn render_pending(&mut self) -> io::Result<()> {
        if self.signal.take() || self.screen_dirty {
            self.render()?;
        }
        Ok(())
    }

    pub fn render(&mut self) -> io::Result<()> {
        self.signal.take();
        if self.screens.is_empty() {
            self.paint_components()
        } else if self.screen_dirty || self.force_full {
            self.force_full = false;
            self.paint_screen()
        } else {
            Ok(())
        }
    }

    fn build_frame(&mut self) -> Vec<Line<'static>> {
        let width = self.width;
        let rewrap = self.frame_width != Some(width);
        let mut frame = Vec::new();
        for key in &self.order {
            let Some(component) = self.components.get(key) else {
                continue;
            };
            let core = component.core();
            if core.is_hidden() {
                core.clear_dirty();
                continue;
            }
            if rewrap || core.is_dirty() || !self.cache.contains_key(key) {
                self.cache.insert(*key, component.render(width));
                core.clear_dirty();
            }
            if let Some(lines) = self.cache.get(key) {
                frame.extend(lines.iter().cloned());
            }
        }
        frame
    }

    fn paint_components(&mut self) -> io::Result<()> {
        let frame = self.build_frame();
        let full = self.force_full || self.frame_width != Some(self.width);

        let first_diff = self
            .frame
            .iter()
            .zip(&frame)
            .position(|(old, new)| old != new)
            .unwrap_or(self.frame.len().min(frame.len()));
        let unchanged = first_diff == self.frame.len() && first_diff == frame.len();
        if unchanged && !full {
            return Ok(());
        }

        let up = self.frame.len() - first_diff;
        let scrolled_off = up > usize::from(self.height.saturating_sub(1));

        write!(self.out, "{SYNC_UPDATE_START}")?;
        let start = if full || scrolled_off {
            write!(self.out, "{FULL_CLEAR}")?;
            0
        } else {
            write!(self.out, "{CURSOR_COLUMN_1}")?;
            if up > 0 {
                write!(self.out, "{}", cursor_previous_line(up))?;
            }
            write!(self.out, "{ERASE_DOWN}")?;
            first_diff
        };
        for line in &frame[start..] {
            encode_line(&mut self.out, line)?;
            write!(self.out, "{NEWLINE}")?;
        }
        write!(self.out, "{SYNC_UPDATE_END}")?;
        self.out.flush()?;

        self.frame = frame;
        self.frame_width = Some(self.width);
        self.force_full = false;
        Ok(())
    }
}
