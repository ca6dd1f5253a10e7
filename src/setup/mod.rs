//! First-run setup: writes the default config file when none exists.

use anyhow::Context;
use std::path::Path;

use crate::config;

/// Embedded default configuration template.
pub const DEFAULT_CONFIG: &str = include_str!("../../environments/orbitscope.toml");

/// Creates the config file from the template if it is missing.
///
/// # Errors
/// Returns an error if the config directory or file cannot be written.
pub fn ensure_config() -> anyhow::Result<()> {
    let config_path = config::config_path()?;
    if write_default_config(&config_path)? {
        tracing::info!("Created default config at {}", config_path.display());
    } else {
        tracing::debug!("Config file present at {}", config_path.display());
    }
    Ok(())
}

/// Writes the template to `path` unless a file is already there.
///
/// Returns whether a file was written.
fn write_default_config(path: &Path) -> anyhow::Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writes_template_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("orbitscope.toml");

        assert!(write_default_config(&path).unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), DEFAULT_CONFIG);

        std::fs::write(&path, "[visual]\nshow_bass = false\n").unwrap();
        assert!(!write_default_config(&path).unwrap());
        assert!(std::fs::read_to_string(&path).unwrap().contains("show_bass = false"));
    }
}
