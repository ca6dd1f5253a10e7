//! Change a single visualization setting from the command line.

use anyhow::Context;

use crate::config::{self, SettingChange};

/// Validates `key = value`, writes it to the config file and prints the result.
///
/// A running visualizer picks the change up from the file.
///
/// # Errors
/// - If the key is unknown or the value invalid
/// - If the config file cannot be read or written
pub fn handle_set(key: &str, value: &str) -> anyhow::Result<()> {
    let change = SettingChange::parse(key, value)?;
    let path = config::config_path()?;

    change
        .persist(&path)
        .with_context(|| format!("Failed to update setting '{}'", change.key()))?;

    tracing::info!("Setting changed from the command line: {}", change);
    println!("{change}");
    Ok(())
}
