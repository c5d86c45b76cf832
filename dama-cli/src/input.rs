//! Parsing of terminal input lines.

use dama_core::Move;
use dama_types::{Position, WireError};

/// One line of user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `r,c r,c`: play a move.
    Move(Move),
    /// `r,c`: click a square (select a piece, or the destination).
    Select(Position),
    /// Print the board again.
    Board,
    /// Start over from the initial layout.
    Reset,
    /// Show the input help.
    Help,
    /// Leave.
    Quit,
}

/// Input that could not be understood.
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    /// Nothing but whitespace.
    #[error("empty input")]
    Empty,
    /// A square did not parse.
    #[error("bad square {text:?}: {source}")]
    BadSquare {
        /// What the user typed.
        text: String,
        /// Why it failed.
        source: WireError,
    },
    /// More than two squares, or an unknown word.
    #[error("unrecognized input {0:?} (type 'help')")]
    Unrecognized(String),
}

/// Help text for the interactive prompt.
pub const HELP: &str = "\
Commands:
  r,c r,c   move a piece (e.g. 2,1 3,2)
  r,c       select a piece, then its destination
  board     print the board
  reset     start over
  help      show this text
  quit      leave";

/// Parse one input line.
pub fn parse(line: &str) -> Result<Command, InputError> {
    let line = line.trim();
    match line.to_ascii_lowercase().as_str() {
        "" => return Err(InputError::Empty),
        "quit" | "q" | "exit" => return Ok(Command::Quit),
        "reset" => return Ok(Command::Reset),
        "board" | "b" => return Ok(Command::Board),
        "help" | "?" => return Ok(Command::Help),
        _ => {}
    }

    let squares = line
        .split_whitespace()
        .map(square)
        .collect::<Result<Vec<_>, _>>()?;
    match squares.as_slice() {
        [pos] => Ok(Command::Select(*pos)),
        [from, to] => Ok(Command::Move(Move::new(*from, *to))),
        _ => Err(InputError::Unrecognized(line.to_string())),
    }
}

fn square(text: &str) -> Result<Position, InputError> {
    if !text.contains(',') {
        return Err(InputError::Unrecognized(text.to_string()));
    }
    text.parse().map_err(|source| InputError::BadSquare {
        text: text.to_string(),
        source,
    })
}
