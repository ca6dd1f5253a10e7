//! Configuration file editor command.
//!
//! Opens the orbitscope configuration file in the user's preferred editor.

use std::process::Command;

/// Opens the orbitscope configuration file in the user's preferred editor.
///
/// The file is created from the template first if missing, and checked after
/// the editor exits.
///
/// # Errors
/// - If no editor can be found or executed
pub fn handle_config() -> anyhow::Result<()> {
    crate::setup::ensure_config()?;
    let config_path = crate::config::config_path()?;

    tracing::info!("Opening config file: {}", config_path.display());

    let editor = find_editor()?;
    let program = editor.join(" ");
    tracing::debug!("Using editor: {}", program);

    let status = Command::new(&editor[0])
        .args(&editor[1..])
        .arg(&config_path)
        .status()
        .map_err(|e| {
            anyhow::anyhow!(
                "Failed to open editor '{program}': {e}. Make sure the editor is installed and accessible."
            )
        })?;

    if !status.success() {
        return Err(anyhow::anyhow!(
            "Editor exited with error code: {}",
            status.code().unwrap_or(-1)
        ));
    }

    // Catch mistakes now rather than on the next visualizer start
    if let Err(e) = crate::config::OrbitConfig::load_from(&config_path) {
        tracing::warn!("Edited config is invalid: {:#}", e);
        eprintln!("Warning: {e:#}");
    }

    tracing::info!("Config file edited successfully");
    Ok(())
}

/// Picks the editor command line: `$VISUAL`, then `$EDITOR`, then nano or vi.
///
/// Variables may carry arguments (`code --wait`), so the result is split on whitespace.
fn find_editor() -> anyhow::Result<Vec<String>> {
    let from_env = ["VISUAL", "EDITOR"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find_map(|value| split_command(&value));
    if let Some(command) = from_env {
        return Ok(command);
    }

    ["nano", "vi"]
        .iter()
        .find(|editor| is_editor_available(editor))
        .map(|editor| vec![editor.to_string()])
        .ok_or_else(|| anyhow::anyhow!("No editor found. Please set the $EDITOR environment variable."))
}

fn split_command(value: &str) -> Option<Vec<String>> {
    let parts: Vec<String> = value.split_whitespace().map(str::to_string).collect();
    (!parts.is_empty()).then_some(parts)
}

/// Checks if an editor is available in the system PATH.
fn is_editor_available(editor: &str) -> bool {
    Command::new("which")
        .arg(editor)
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_command() {
        assert_eq!(split_command("vim"), Some(vec!["vim".to_string()]));
        assert_eq!(
            split_command(" code  --wait "),
            Some(vec!["code".to_string(), "--wait".to_string()])
        );
        assert_eq!(split_command("   "), None);
    }
}
