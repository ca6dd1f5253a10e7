//! Application command handlers for orbitscope.
//!
//! # Commands
//! - `visualize`: Play the track and animate its spectrum (default)
//! - `set`: Change one visualization setting in the config file
//! - `config`: Open configuration file in user's preferred editor
//! - `list_devices`: List available audio output devices
//! - `logs`: Display recent log entries

pub mod config;
pub mod list_devices;
pub mod logs;
pub mod set;
pub mod visualize;

pub use config::handle_config;
pub use list_devices::handle_list_devices;
pub use logs::handle_logs;
pub use set::handle_set;
pub use visualize::{handle_visualize, VisualizeOptions};
