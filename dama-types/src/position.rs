//! Board coordinates and seat colors.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::WireError;

/// Side length of the board.
pub const BOARD_SIZE: u8 = 8;

/// One of the two seats.
///
/// Dark starts on rows 0-2 and moves toward increasing rows; Light starts
/// on rows 5-7 and moves toward decreasing rows. On the wire the seats keep
/// their original names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Player {
    /// Moves first.
    #[serde(rename = "schwarz")]
    Dark,
    /// Moves second.
    #[serde(rename = "weiss")]
    Light,
}

impl Player {
    /// The other seat.
    pub fn opponent(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dark => f.write_str("dark"),
            Self::Light => f.write_str("light"),
        }
    }
}

/// A square on the 8x8 board.
///
/// Always on the board: construction and deserialization reject anything
/// outside `[0, 8)`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawPosition")]
pub struct Position {
    row: u8,
    col: u8,
}

/// Unchecked shape used for deserialization.
#[derive(Deserialize)]
struct RawPosition {
    row: i64,
    col: i64,
}

impl TryFrom<RawPosition> for Position {
    type Error = WireError;

    fn try_from(raw: RawPosition) -> Result<Self, Self::Error> {
        Position::from_signed(raw.row, raw.col).ok_or(WireError::InvalidPosition {
            row: raw.row,
            col: raw.col,
        })
    }
}

impl Position {
    /// Create a position, or `None` if it is off the board.
    pub const fn new(row: u8, col: u8) -> Option<Self> {
        if row < BOARD_SIZE && col < BOARD_SIZE {
            Some(Self { row, col })
        } else {
            None
        }
    }

    fn from_signed(row: i64, col: i64) -> Option<Self> {
        let row = u8::try_from(row).ok()?;
        let col = u8::try_from(col).ok()?;
        Self::new(row, col)
    }

    /// Row index, 0 at Dark's home edge.
    pub const fn row(self) -> u8 {
        self.row
    }

    /// Column index.
    pub const fn col(self) -> u8 {
        self.col
    }

    /// The square `d_row` rows and `d_col` columns away, if still on the board.
    pub fn offset(self, d_row: i8, d_col: i8) -> Option<Self> {
        Self::from_signed(
            i64::from(self.row) + i64::from(d_row),
            i64::from(self.col) + i64::from(d_col),
        )
    }

    /// Signed row and column distance from `self` to `other`.
    pub fn delta(self, other: Position) -> (i8, i8) {
        (
            other.row as i8 - self.row as i8,
            other.col as i8 - self.col as i8,
        )
    }

    /// Pieces may only stand on squares where `row + col` is odd.
    pub const fn is_dark(self) -> bool {
        (self.row + self.col) % 2 == 1
    }

    /// Every square of the board, row by row.
    pub fn all() -> impl Iterator<Item = Position> {
        (0..BOARD_SIZE).flat_map(|row| (0..BOARD_SIZE).map(move |col| Position { row, col }))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.row, self.col)
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Parses `"row,col"`, the notation the terminal client reads.
impl FromStr for Position {
    type Err = WireError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || WireError::InvalidPosition { row: -1, col: -1 };
        let (row, col) = s.trim().split_once(',').ok_or_else(invalid)?;
        let row: i64 = row.trim().parse().map_err(|_| invalid())?;
        let col: i64 = col.trim().parse().map_err(|_| invalid())?;
        Position::from_signed(row, col).ok_or(WireError::InvalidPosition { row, col })
    }
}
