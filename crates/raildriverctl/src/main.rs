//! raildriverctl - command-line tool for the RailDriver control panel
//!
//! Lists attached panels, prints live lever and button changes, drives the
//! LED display and speaker, and runs AutoTune calibration sessions.

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::unwrap_used)]

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod commands;
mod config;
mod error;
mod output;

use commands::{CalibrationCommands, DisplayCommands, SpeakerState};
use config::ConfigOverrides;
use error::CliError;

#[derive(Parser)]
#[command(name = "raildriverctl")]
#[command(about = "Monitor and drive a RailDriver control panel")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(flatten)]
    overrides: ConfigOverrides,
}

#[derive(Subcommand)]
enum Commands {
    /// List attached RailDriver panels
    List,

    /// Print input changes as they arrive
    Monitor {
        /// Stop after this many seconds (runs until Ctrl-C otherwise)
        #[arg(short, long)]
        duration: Option<u64>,

        /// Echo the throttle position on the LED display
        #[arg(long)]
        echo: bool,
    },

    /// Drive the LED display
    #[command(subcommand)]
    Display(DisplayCommands),

    /// Switch the speaker on or off
    Speaker {
        #[arg(value_enum)]
        state: SpeakerState,
    },

    /// Sweep every lever through its range and save the widened bounds
    Calibrate {
        /// Length of the session in seconds
        #[arg(short, long, default_value = "30")]
        duration: u64,

        /// Print the result without saving it
        #[arg(long)]
        dry_run: bool,
    },

    /// Inspect or reset the stored calibration
    #[command(subcommand)]
    Calibration(CalibrationCommands),

    /// List the characters the LED display can show
    Chars,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match execute_command(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if cli.json {
                output::print_error_json(&e);
            } else {
                output::print_error_human(&e);
            }
            ExitCode::from(exit_code(&e))
        }
    }
}

/// Installs the stderr subscriber. `RUST_LOG` wins over `-v`.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let default_filter = format!(
        "raildriverctl={level},raildriver_engine={level},raildriver_hid_common={level},raildriver_calibration={level}"
    );

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn execute_command(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::List => commands::device::list(cli.json),
        Commands::Chars => commands::display::chars(cli.json),
        Commands::Monitor { duration, echo } => {
            let config = config::load(&cli.overrides)?;
            commands::monitor::execute(config, *duration, *echo, cli.json)
        }
        Commands::Display(cmd) => {
            let config = config::load(&cli.overrides)?;
            commands::display::execute(cmd, config, cli.json)
        }
        Commands::Speaker { state } => {
            let config = config::load(&cli.overrides)?;
            commands::device::speaker(config, *state, cli.json)
        }
        Commands::Calibrate { duration, dry_run } => {
            let config = config::load(&cli.overrides)?;
            commands::calibration::calibrate(config, *duration, *dry_run, cli.json)
        }
        Commands::Calibration(cmd) => {
            let config = config::load(&cli.overrides)?;
            commands::calibration::execute(cmd, &config, cli.json)
        }
    }
}

fn exit_code(e: &anyhow::Error) -> u8 {
    e.downcast_ref::<CliError>().map_or(1, CliError::exit_code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn parse_list() -> TestResult {
        let cli = Cli::try_parse_from(["raildriverctl", "list"])?;
        assert!(matches!(cli.command, Commands::List));
        assert!(!cli.json);
        assert_eq!(cli.verbose, 0);
        Ok(())
    }

    #[test]
    fn parse_verbosity_counts() -> TestResult {
        let cli = Cli::try_parse_from(["raildriverctl", "-vv", "list"])?;
        assert_eq!(cli.verbose, 2);
        let cli = Cli::try_parse_from(["raildriverctl", "list", "-vvv", "--json"])?;
        assert_eq!(cli.verbose, 3);
        assert!(cli.json);
        Ok(())
    }

    #[test]
    fn parse_monitor_defaults() -> TestResult {
        let cli = Cli::try_parse_from(["raildriverctl", "monitor"])?;
        match cli.command {
            Commands::Monitor { duration, echo } => {
                assert_eq!(duration, None);
                assert!(!echo);
            }
            _ => return Err("expected monitor".into()),
        }
        Ok(())
    }

    #[test]
    fn parse_display_text() -> TestResult {
        let cli = Cli::try_parse_from(["raildriverctl", "display", "text", "hello"])?;
        match cli.command {
            Commands::Display(DisplayCommands::Text { text, hold }) => {
                assert_eq!(text, "hello");
                assert_eq!(hold, 5);
            }
            _ => return Err("expected display text".into()),
        }
        Ok(())
    }

    #[test]
    fn parse_display_number_accepts_negative() -> TestResult {
        let cli = Cli::try_parse_from(["raildriverctl", "display", "number", "--", "-4.5"])?;
        match cli.command {
            Commands::Display(DisplayCommands::Number { value, .. }) => {
                assert!((value + 4.5).abs() < f64::EPSILON);
            }
            _ => return Err("expected display number".into()),
        }
        Ok(())
    }

    #[test]
    fn parse_display_marquee_once() -> TestResult {
        let cli =
            Cli::try_parse_from(["raildriverctl", "display", "marquee", "next stop", "--once"])?;
        match cli.command {
            Commands::Display(DisplayCommands::Marquee { text, once, .. }) => {
                assert_eq!(text, "next stop");
                assert!(once);
            }
            _ => return Err("expected display marquee".into()),
        }
        Ok(())
    }

    #[test]
    fn parse_speaker_state() -> TestResult {
        let cli = Cli::try_parse_from(["raildriverctl", "speaker", "on"])?;
        assert!(matches!(
            cli.command,
            Commands::Speaker {
                state: SpeakerState::On
            }
        ));
        assert!(Cli::try_parse_from(["raildriverctl", "speaker", "loud"]).is_err());
        Ok(())
    }

    #[test]
    fn parse_calibrate_defaults() -> TestResult {
        let cli = Cli::try_parse_from(["raildriverctl", "calibrate"])?;
        match cli.command {
            Commands::Calibrate { duration, dry_run } => {
                assert_eq!(duration, 30);
                assert!(!dry_run);
            }
            _ => return Err("expected calibrate".into()),
        }
        Ok(())
    }

    #[test]
    fn parse_global_overrides() -> TestResult {
        let cli = Cli::try_parse_from([
            "raildriverctl",
            "calibration",
            "show",
            "--calibration-file",
            "/tmp/cal.bin",
            "--scroll-delay",
            "500",
            "--auto-tune",
        ])?;
        assert!(matches!(
            cli.command,
            Commands::Calibration(CalibrationCommands::Show)
        ));
        assert_eq!(
            cli.overrides.calibration_file,
            Some(PathBuf::from("/tmp/cal.bin"))
        );
        assert_eq!(cli.overrides.scroll_delay, Some(500));
        assert!(cli.overrides.auto_tune);
        Ok(())
    }

    #[test]
    fn parse_rejects_unknown_command() {
        assert!(Cli::try_parse_from(["raildriverctl", "derail"]).is_err());
    }

    #[test]
    fn exit_codes_follow_error_kind() {
        let e = anyhow::Error::new(CliError::DeviceNotFound("none".to_string()));
        assert_eq!(exit_code(&e), 2);
        let e = anyhow::Error::new(CliError::InvalidConfiguration("bad".to_string()));
        assert_eq!(exit_code(&e), 3);
        assert_eq!(exit_code(&anyhow::anyhow!("other")), 1);
    }
}
