//! Application orchestration and command routing.
//!
//! Handles command-line argument parsing and delegates to appropriate command handlers.

use crate::commands::{self, VisualizeOptions};
use crate::logging;
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;
use std::process;

/// A terminal audio visualizer: three shapes orbiting to the beat
#[derive(Parser)]
#[command(name = "orbitscope")]
#[command(version)]
#[command(long_about = "A terminal audio visualizer.\n\nPlays a looped track, splits its spectrum into bass, mid and treble,\nand animates a circle, a square and a triangle orbiting the center of\nthe terminal, each sized by its band and trailing one revolution behind.\n\nDEFAULT COMMAND:\n    If no command is specified, 'visualize' is used by default.\n\nEXAMPLES:\n    # Visualize the built-in demo loop\n    $ orbitscope\n\n    # Visualize a WAV file on a specific output device\n    $ orbitscope -f song.wav -d 2\n\n    # Switch the theme of a running instance\n    $ orbitscope set color_theme blue")]
#[command(
    after_help = "CONFIGURATION:\n    Config file:        ~/.config/orbitscope/orbitscope.toml\n    Logs:               ~/.local/state/orbitscope/orbitscope.log.*\n\nKEYS:\n    b m t     toggle bass, mid, treble\n    c         cycle color theme\n    + -       change shape size\n    space p   pause and resume\n    q Esc     quit"
)]
struct Cli {
    #[command(flatten)]
    visualize: VisualizeArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args, Debug, Clone, Default)]
struct VisualizeArgs {
    /// WAV file to loop instead of the configured track
    #[arg(short = 'f', long, value_name = "WAV")]
    track: Option<PathBuf>,

    /// Output device: "default", an ID or a name from list-devices
    #[arg(short, long, value_name = "DEVICE")]
    device: Option<String>,

    /// Do not open any audio stream; shapes stay hidden
    #[arg(long)]
    no_capture: bool,
}

impl From<VisualizeArgs> for VisualizeOptions {
    fn from(args: VisualizeArgs) -> Self {
        VisualizeOptions {
            track: args.track,
            device: args.device,
            no_capture: args.no_capture,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Play the track and animate its spectrum (default)
    ///
    /// Press b/m/t to toggle bands, c to cycle the theme, +/- to resize,
    /// Space to pause and q or Escape to quit.
    #[command(visible_alias = "v")]
    Visualize(VisualizeArgs),

    /// Change a visualization setting
    ///
    /// Writes the setting to the config file; a running visualizer picks it up.
    /// Keys: show_bass, show_mid, show_treble, color_theme, size_scale.
    ///
    /// Examples:
    ///   orbitscope set color_theme green
    ///   orbitscope set size_scale 1.5
    ///   orbitscope set show_treble false
    Set {
        /// Setting name
        key: String,
        /// New value
        value: String,
    },

    /// Open configuration file in your preferred editor
    ///
    /// Uses $VISUAL or $EDITOR, falling back to nano/vi.
    #[command(visible_alias = "c")]
    Config,

    /// List available audio output devices
    ///
    /// Shows device IDs, names, and configurations to help configure
    /// the correct output device in orbitscope.toml.
    #[command(name = "list-devices")]
    ListDevices,

    /// Show recent log entries from the application
    ///
    /// Display the last 50 lines of the most recent log file.
    Logs,

    /// Generate shell completion script
    ///
    /// Examples:
    ///   orbitscope completions bash > orbitscope.bash
    ///   orbitscope completions zsh > _orbitscope
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Runs a command that prints to the terminal, exiting with code 1 on failure.
fn run_printing(result: anyhow::Result<()>) -> anyhow::Result<()> {
    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
    Ok(())
}

/// Runs the main application based on command-line arguments.
///
/// # Exit Codes
/// - 0: Success
/// - 1: General error
/// - 2: Usage error (invalid arguments)
///
/// # Errors
/// - If setup fails
/// - If logging initialization fails
/// - If command execution fails
pub async fn run() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    // Commands that need neither logging nor a config file
    match &cli.command {
        Some(Commands::Completions { shell }) => {
            generate(*shell, &mut Cli::command(), "orbitscope", &mut io::stdout());
            return Ok(());
        }
        Some(Commands::ListDevices) => return run_printing(commands::handle_list_devices()),
        Some(Commands::Logs) => return run_printing(commands::handle_logs()),
        _ => {}
    }

    logging::init_logging()?;
    crate::setup::ensure_config().inspect_err(|e| tracing::error!("Setup failed: {e:#}"))?;

    match cli.command {
        Some(Commands::Visualize(args)) => commands::handle_visualize(args.into()).await?,
        None => commands::handle_visualize(cli.visualize.into()).await?,
        Some(Commands::Set { key, value }) => run_printing(commands::handle_set(&key, &value))?,
        Some(Commands::Config) => commands::handle_config()?,
        Some(Commands::Completions { .. } | Commands::ListDevices | Commands::Logs) => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_default_command_takes_visualize_flags() {
        let cli = Cli::try_parse_from(["orbitscope", "-f", "song.wav", "--no-capture"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.visualize.track, Some(PathBuf::from("song.wav")));
        assert!(cli.visualize.no_capture);
    }

    #[test]
    fn test_set_command() {
        let cli = Cli::try_parse_from(["orbitscope", "set", "size_scale", "2"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Set { ref key, ref value }) if key == "size_scale" && value == "2"
        ));
    }

    #[test]
    fn test_visualize_subcommand_device() {
        let cli = Cli::try_parse_from(["orbitscope", "v", "-d", "2"]).unwrap();
        match cli.command {
            Some(Commands::Visualize(args)) => assert_eq!(args.device.as_deref(), Some("2")),
            _ => panic!("expected visualize"),
        }
    }
}
