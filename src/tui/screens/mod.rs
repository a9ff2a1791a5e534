//! Concrete [`Screen`](super::screen::Screen) implementations.

pub mod log_viewer;
pub mod viewer;

pub use log_viewer::log_viewer;
pub use viewer::{InitialPosition, Viewer};
