//! # Input History
//!
//! Readline-style recall of previously submitted lines.
//!
//! ```text
//!   entries: [ "one", "two", "three" ]      (oldest … newest)
//!                               ▲
//!   navigate_previous ──────────┘  steps left, stops at the oldest
//!   navigate_next     ─────────►   steps right, then restores the buffer
//! ```
//!
//! Navigation and search keep independent cursors; both reset whenever an
//! entry is added.

/// Bounded log of submitted lines with navigation and reverse search.
#[derive(Debug, Default)]
pub struct HistoryManager {
    entries: Vec<String>,
    max_entries: Option<usize>,
    /// Navigation position, `None` when not navigating.
    index: Option<usize>,
    /// Text that was being edited when navigation started.
    saved_buffer: Option<String>,
    search_query: Option<String>,
    search_index: Option<usize>,
}

impl HistoryManager {
    /// Unbounded history.
    pub fn new() -> Self {
        Self::default()
    }

    /// History that evicts from the oldest end beyond `max_entries`.
    pub fn with_max_entries(max_entries: usize) -> Self {
        Self {
            max_entries: Some(max_entries),
            ..Self::default()
        }
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Record a submitted line. Trailing newlines are trimmed; an empty line or
    /// a repeat of the newest entry only resets navigation.
    pub fn add(&mut self, value: &str) {
        let text = value.trim_end_matches('\n');
        let duplicate = self.entries.last().is_some_and(|last| last == text);
        if !text.is_empty() && !duplicate {
            self.entries.push(text.to_string());
            if let Some(max) = self.max_entries
                && self.entries.len() > max
            {
                let overflow = self.entries.len() - max;
                self.entries.drain(..overflow);
            }
        }
        self.reset_navigation();
    }

    pub fn reset_navigation(&mut self) {
        self.index = None;
        self.saved_buffer = None;
        self.reset_search();
    }

    pub fn reset_search(&mut self) {
        self.search_query = None;
        self.search_index = None;
    }

    /// Step back one entry. The first call of a session captures `current`
    /// for [`navigate_next`](Self::navigate_next) to restore. Returns `None`
    /// at the oldest entry rather than wrapping.
    pub fn navigate_previous(&mut self, current: &str) -> Option<String> {
        if self.entries.is_empty() {
            return None;
        }
        let next = match self.index {
            None => {
                self.saved_buffer = Some(current.to_string());
                self.entries.len() - 1
            }
            Some(0) => return None,
            Some(i) => i - 1,
        };
        self.index = Some(next);
        Some(self.entries[next].clone())
    }

    /// Step forward one entry. Stepping past the newest entry ends the session
    /// and returns the captured buffer; after that, `None` until navigation
    /// starts again.
    pub fn navigate_next(&mut self) -> Option<String> {
        let i = self.index?;
        if i + 1 >= self.entries.len() {
            self.index = None;
            return Some(self.saved_buffer.take().unwrap_or_default());
        }
        self.index = Some(i + 1);
        Some(self.entries[i + 1].clone())
    }

    /// Incremental reverse substring search. Repeating the same query
    /// continues from just before the previous match; a new query restarts
    /// from the newest entry. Never wraps past the oldest entry.
    pub fn search_backward(&mut self, query: &str) -> Option<String> {
        if query.is_empty() || self.entries.is_empty() {
            return None;
        }
        let start = match (self.search_query.as_deref(), self.search_index) {
            (Some(q), Some(i)) if q == query => i.checked_sub(1)?,
            _ => self.entries.len() - 1,
        };
        let found = (0..=start).rev().find(|&i| self.entries[i].contains(query))?;
        self.search_query = Some(query.to_string());
        self.search_index = Some(found);
        Some(self.entries[found].clone())
    }
}
