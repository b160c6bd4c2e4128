//! Terminal front end: turns typed commands into user actions and views into text.

pub mod command;
pub mod render;

pub use command::{parse_command, CommandError, ConsoleCommand, USAGE};
pub use render::{render_changes, render_notice, render_view};
