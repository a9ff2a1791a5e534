//! # Hotkeys
//!
//! A flat registry mapping `(category, key binding)` to named handlers.
//! Categories double as dispatch scopes (the UI looks up `global` keys in
//! normal mode and `command` keys while the command manager is open) and as
//! the grouping for the help view.
//!
//! Handlers receive the owning context by `&mut`, so the registry itself
//! holds no reference back to the UI.

use std::collections::HashMap;
use std::fmt;

use super::input::{Key, KeyEvent};

// ============================================================================
// Key bindings
// ============================================================================

/// A key plus exact modifier state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyBinding {
    pub key: Key,
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
}

impl KeyBinding {
    pub const fn new(key: Key) -> Self {
        Self {
            key,
            ctrl: false,
            alt: false,
            shift: false,
        }
    }

    pub const fn char(c: char) -> Self {
        Self::new(Key::Char(c))
    }

    pub const fn ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub const fn alt(mut self) -> Self {
        self.alt = true;
        self
    }

    pub const fn shift(mut self) -> Self {
        self.shift = true;
        self
    }

    pub fn matches(&self, event: &KeyEvent) -> bool {
        *self == Self::from(event)
    }
}

impl From<&KeyEvent> for KeyBinding {
    fn from(event: &KeyEvent) -> Self {
        Self {
            key: event.key,
            ctrl: event.ctrl,
            alt: event.alt,
            shift: event.shift,
        }
    }
}

impl fmt::Display for KeyBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_keybinding(self))
    }
}

/// `Ctrl+Alt+Shift+key`. Single letters follow the shift flag's case; named
/// keys use their lowercase names.
pub fn format_keybinding(binding: &KeyBinding) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(4);
    if binding.ctrl {
        parts.push("Ctrl".to_string());
    }
    if binding.alt {
        parts.push("Alt".to_string());
    }
    if binding.shift {
        parts.push("Shift".to_string());
    }
    let key = match binding.key {
        Key::Char(c) if c.is_alphabetic() => {
            if binding.shift {
                c.to_uppercase().to_string()
            } else {
                c.to_lowercase().to_string()
            }
        }
        other => other.to_string(),
    };
    parts.push(key);
    parts.join("+")
}

// ============================================================================
// Registry
// ============================================================================

pub type HotkeyHandler<C> = Box<dyn Fn(&mut C, &KeyEvent) -> bool>;

pub struct Hotkey<C> {
    pub name: String,
    pub category: String,
    pub binding: KeyBinding,
    handler: HotkeyHandler<C>,
}

impl<C> Hotkey<C> {
    pub fn new(
        name: impl Into<String>,
        category: impl Into<String>,
        binding: KeyBinding,
        handler: impl Fn(&mut C, &KeyEvent) -> bool + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            binding,
            handler: Box::new(handler),
        }
    }
}

impl<C> fmt::Debug for Hotkey<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hotkey")
            .field("name", &self.name)
            .field("category", &self.category)
            .field("binding", &self.binding)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    DuplicateBinding { category: String, binding: KeyBinding },
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::DuplicateBinding { category, binding } => {
                write!(f, "{binding} is already bound in category '{category}'")
            }
        }
    }
}

impl std::error::Error for CommandError {}

/// One category of the help view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelpSection {
    pub category: String,
    /// (formatted binding, hotkey name)
    pub entries: Vec<(String, String)>,
}

pub struct CommandRegistry<C> {
    hotkeys: Vec<Hotkey<C>>,
    index: HashMap<(String, KeyBinding), usize>,
}

impl<C> Default for CommandRegistry<C> {
    fn default() -> Self {
        Self {
            hotkeys: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<C> CommandRegistry<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, hotkey: Hotkey<C>) -> Result<(), CommandError> {
        let slot = (hotkey.category.clone(), hotkey.binding);
        if self.index.contains_key(&slot) {
            return Err(CommandError::DuplicateBinding {
                category: hotkey.category,
                binding: hotkey.binding,
            });
        }
        self.index.insert(slot, self.hotkeys.len());
        self.hotkeys.push(hotkey);
        Ok(())
    }

    pub fn lookup(&self, category: &str, binding: &KeyBinding) -> Option<&Hotkey<C>> {
        self.index
            .get(&(category.to_string(), *binding))
            .map(|&i| &self.hotkeys[i])
    }

    /// Run the hotkey bound to `event` in `category`. Returns whether a
    /// handler claimed the event.
    pub fn dispatch(&self, ctx: &mut C, category: &str, event: &KeyEvent) -> bool {
        match self.lookup(category, &KeyBinding::from(event)) {
            Some(hotkey) => (hotkey.handler)(ctx, event),
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.hotkeys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hotkeys.is_empty()
    }

    /// Categories sorted by name; hotkeys within each sorted by name,
    /// case-insensitively.
    pub fn help_sections(&self) -> Vec<HelpSection> {
        let mut grouped: HashMap<&str, Vec<&Hotkey<C>>> = HashMap::new();
        for hotkey in &self.hotkeys {
            grouped.entry(&hotkey.category).or_default().push(hotkey);
        }
        let mut categories: Vec<&str> = grouped.keys().copied().collect();
        categories.sort_unstable();

        categories
            .into_iter()
            .map(|category| {
                let mut hotkeys = grouped.remove(category).unwrap_or_default();
                hotkeys.sort_by_key(|h| h.name.to_lowercase());
                HelpSection {
                    category: category.to_string(),
                    entries: hotkeys
                        .into_iter()
                        .map(|h| (format_keybinding(&h.binding), h.name.clone()))
                        .collect(),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counter {
        hits: Vec<&'static str>,
    }

    fn registry() -> CommandRegistry<Counter> {
        let mut r = CommandRegistry::new();
        r.register(Hotkey::new("Stop", "global", KeyBinding::char('c').ctrl(), |c: &mut Counter, _| {
            c.hits.push("stop");
            true
        }))
        .unwrap();
        r.register(Hotkey::new("collapse", "command", KeyBinding::char('c'), |c: &mut Counter, _| {
            c.hits.push("collapse");
            true
        }))
        .unwrap();
        r.register(Hotkey::new("Expand", "command", KeyBinding::char('e'), |_: &mut Counter, _| false))
            .unwrap();
        r
    }

    // ==========================================================================
    // format_keybinding
    // ==========================================================================

    #[test]
    fn format_orders_modifiers() {
        let b = KeyBinding::char('x').shift().alt().ctrl();
        assert_eq!(format_keybinding(&b), "Ctrl+Alt+Shift+X");
    }

    #[test]
    fn format_letter_case_follows_shift() {
        assert_eq!(format_keybinding(&KeyBinding::char('x').ctrl()), "Ctrl+x");
        assert_eq!(format_keybinding(&KeyBinding::char('g').shift()), "Shift+G");
    }

    #[test]
    fn format_named_keys() {
        assert_eq!(format_keybinding(&KeyBinding::new(Key::Esc)), "esc");
        assert_eq!(format_keybinding(&KeyBinding::new(Key::Up).alt()), "Alt+up");
    }

    // ==========================================================================
    // Registry
    // ==========================================================================

    #[test]
    fn dispatch_is_scoped_by_category() {
        let r = registry();
        let mut ctx = Counter::default();
        let ctrl_c = KeyEvent::char('c').with_ctrl();
        let c = KeyEvent::char('c');

        assert!(r.dispatch(&mut ctx, "global", &ctrl_c));
        assert!(!r.dispatch(&mut ctx, "global", &c));
        assert!(r.dispatch(&mut ctx, "command", &c));
        assert_eq!(ctx.hits, vec!["stop", "collapse"]);
    }

    #[test]
    fn handler_may_decline() {
        let r = registry();
        let mut ctx = Counter::default();
        assert!(!r.dispatch(&mut ctx, "command", &KeyEvent::char('e')));
    }

    #[test]
    fn duplicate_binding_rejected() {
        let mut r = registry();
        let err = r
            .register(Hotkey::new("Other", "global", KeyBinding::char('c').ctrl(), |_: &mut Counter, _| true))
            .unwrap_err();
        assert!(err.to_string().contains("Ctrl+c"));
        assert_eq!(r.len(), 3);
    }

    #[test]
    fn help_sections_sorted() {
        let sections = registry().help_sections();
        let names: Vec<&str> = sections.iter().map(|s| s.category.as_str()).collect();
        assert_eq!(names, vec!["command", "global"]);
        assert_eq!(
            sections[0].entries,
            vec![
                ("c".to_string(), "collapse".to_string()),
                ("e".to_string(), "Expand".to_string()),
            ]
        );
    }
}
