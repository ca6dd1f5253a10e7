//! Terminal screens.

pub mod error;
pub mod tui;

pub use error::ErrorScreen;
pub use tui::{Footer, UiCommand, VisualizerTui};
