//! Terminal I/O utilities for CLI.
//!
//! Provides TTY detection and user prompting. Prompts and progress go to
//! stderr so stdout stays free for JSON.

use std::io::{self, BufRead, IsTerminal, Write};

pub fn is_stdin_tty() -> bool {
    io::stdin().is_terminal()
}

pub fn require_tty_for_interactive() -> bool {
    is_stdin_tty()
}

pub fn prompt(message: &str) -> wildkit::Result<String> {
    eprint!("{}", message);
    io::stderr().flush().ok();

    let stdin = io::stdin();
    let mut line = String::new();
    let read = stdin.lock().read_line(&mut line).map_err(|e| {
        wildkit::Error::internal_io(e.to_string(), Some("read stdin".to_string()))
    })?;

    if read == 0 {
        return Err(wildkit::Error::internal_io(
            "unexpected end of input",
            Some("read stdin".to_string()),
        ));
    }

    Ok(line.trim().to_string())
}

/// Ask a yes/no question. Only `y` (any case) counts as yes.
pub fn confirm(message: &str) -> wildkit::Result<bool> {
    Ok(prompt(message)?.eq_ignore_ascii_case("y"))
}

/// Print status message to stderr if running in a terminal.
pub fn status(message: &str) {
    if io::stderr().is_terminal() {
        eprintln!("{}", message);
    }
}

// log_status! macro is defined in lib.rs (#[macro_export]) and available crate-wide.
