use clap::{Parser, Subcommand};

use commands::GlobalArgs;

#[derive(Debug, Clone, Copy)]
enum ResponseMode {
    Json,
    Raw(RawOutputMode),
}

#[derive(Debug, Clone, Copy)]
enum RawOutputMode {
    InteractivePassthrough,
}

mod commands;
mod output;
mod tty;

use commands::{config, lint, refactor, replace};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "wildkit")]
#[command(version = VERSION)]
#[command(about = "Maintenance tools for wildcard prompt corpora")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replace stray underscores with spaces outside wildcards and parentheses
    Replace(replace::ReplaceArgs),
    /// Normalize punctuation and whitespace line by line
    Lint(lint::LintArgs),
    /// Find, list and rename wildcards across the corpus
    Refactor(refactor::RefactorArgs),
    /// Manage the corpus wildkit.json
    Config(config::ConfigArgs),
}

fn response_mode(command: &Commands) -> ResponseMode {
    match command {
        Commands::Refactor(args) if refactor::is_interactive(args) => {
            ResponseMode::Raw(RawOutputMode::InteractivePassthrough)
        }
        _ => ResponseMode::Json,
    }
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    let global = GlobalArgs {};

    match response_mode(&cli.command) {
        ResponseMode::Json => {
            let (json_result, exit_code) = commands::run_json(cli.command, &global);
            let _ = output::print_json_result(json_result);
            std::process::ExitCode::from(exit_code_to_u8(exit_code))
        }
        ResponseMode::Raw(RawOutputMode::InteractivePassthrough) => {
            if !tty::require_tty_for_interactive() {
                let err = wildkit::Error::validation_invalid_argument(
                    "tty",
                    "This command requires an interactive TTY",
                    None,
                    None,
                );
                let _ = output::print_result::<serde_json::Value>(Err(err));
                return std::process::ExitCode::from(exit_code_to_u8(2));
            }

            let Commands::Refactor(args) = cli.command else {
                return std::process::ExitCode::from(1);
            };

            match refactor::run_interactive(args) {
                Ok(exit_code) => std::process::ExitCode::from(exit_code_to_u8(exit_code)),
                Err(err) => {
                    let exit_code = output::exit_code_for_error(err.code);
                    let _ = output::print_result::<serde_json::Value>(Err(err));
                    std::process::ExitCode::from(exit_code_to_u8(exit_code))
                }
            }
        }
    }
}

fn exit_code_to_u8(code: i32) -> u8 {
    if code <= 0 {
        0
    } else if code >= 255 {
        255
    } else {
        code as u8
    }
}
