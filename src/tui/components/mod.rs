//! # Components
//!
//! Concrete [`Component`](super::component::Component) implementations.
//!
//! | Component              | Content                                  |
//! |------------------------|------------------------------------------|
//! | [`TextComponent`]      | static styled text                       |
//! | [`MarkdownComponent`]  | markdown, or its raw source              |
//! | [`CallbackComponent`]  | whatever a caller's function returns     |
//! | [`CompositeComponent`] | an ordered list of children              |
//! | [`InputComponent`]     | editable text with an emacs keymap       |
//! | [`SelectListComponent`]| a pick list                              |
//! | [`ToolCallComponent`]  | tool-call results via formatters         |
//! | [`CommandHelpComponent`]| the hotkey overview                     |
//! | [`StatusComponent`]    | status text with a running spinner       |

pub mod callback;
pub mod command_help;
pub mod composite;
pub mod input;
pub mod markdown;
pub mod select_list;
pub mod status;
pub mod text;
pub mod tool_call;

pub use callback::CallbackComponent;
pub use command_help::CommandHelpComponent;
pub use composite::CompositeComponent;
pub use input::InputComponent;
pub use markdown::MarkdownComponent;
pub use select_list::{SelectItem, SelectListComponent};
pub use status::StatusComponent;
pub use text::TextComponent;
pub use tool_call::ToolCallComponent;
