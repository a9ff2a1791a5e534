//! # Core
//!
//! Everything that is not terminal plumbing: configuration, the submitted
//! line history, the step records the UI renders, and the responder that
//! produces them.
//!
//! ```text
//!   config ──► ResolvedConfig ──► tui::Session
//!                                     │ UiOutput::Submit(line)
//!                                     ▼
//!   history ◄── UiState          Responder ──► Vec<Step> ──► UiHandle
//! ```
//!
//! Nothing here touches the terminal.

pub mod config;
pub mod history;
pub mod responder;
pub mod step;
