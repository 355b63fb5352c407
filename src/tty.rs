//! Terminal I/O utilities for CLI.
//!
//! Provides TTY detection and the interactive confirmation gate.

use std::io::{self, BufRead, IsTerminal, Write};

use mtgdb_release::stages::Confirmation;
use mtgdb_release::{Error, Result};

pub fn is_stdin_tty() -> bool {
    io::stdin().is_terminal()
}

/// Prompt on stderr and read one line from stdin.
///
/// Returns `None` when input is closed before a line arrives.
pub fn prompt(message: &str) -> Result<Option<String>> {
    eprint!("{}", message);
    io::stderr().flush().ok();

    let stdin = io::stdin();
    let mut line = String::new();
    let read = stdin.lock().read_line(&mut line).map_err(|e| {
        Error::internal_io(e.to_string(), Some("read confirmation".to_string()))
    })?;

    if read == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Print status message to stderr if running in a terminal.
pub fn status(message: &str) {
    if io::stderr().is_terminal() {
        eprintln!("{}", message);
    }
}

/// Operator confirmation read from the terminal.
///
/// Enter continues; `n`/`no` or end of input cancels. Ctrl+C ends the
/// process directly.
pub struct TtyConfirmation;

impl Confirmation for TtyConfirmation {
    fn confirm(&self, message: &str) -> Result<bool> {
        match prompt(message)? {
            Some(answer) => Ok(!is_decline(&answer)),
            None => Ok(false),
        }
    }
}

fn is_decline(answer: &str) -> bool {
    matches!(answer.to_ascii_lowercase().as_str(), "n" | "no")
}
