//! lumen: a terminal UI rendering and input engine.
//!
//! - [`tui`]: input decoding, components, the diffing render loop, screens
//! - [`core`]: configuration, history, steps, responders
//! - [`logging`]: file plus in-memory log sinks

pub mod core;
pub mod logging;
pub mod tui;

#[cfg(test)]
pub mod test_support;
