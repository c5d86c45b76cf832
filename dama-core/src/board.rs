//! Board model for Dama.
//!
//! An 8x8 grid of optional pieces. The board itself performs no rule
//! checks: during play it is mutated only through
//! [`rules::apply_move`](crate::rules::apply_move), which guarantees that
//! pieces stay on dark squares.

use dama_types::{Player, Position, BOARD_SIZE};
use std::fmt;

/// A piece on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    /// Seat that owns the piece.
    pub owner: Player,
    /// Kings move and capture in all four diagonal directions.
    pub is_king: bool,
}

impl Piece {
    /// An unpromoted piece.
    pub const fn man(owner: Player) -> Self {
        Self {
            owner,
            is_king: false,
        }
    }

    /// A promoted piece.
    pub const fn king(owner: Player) -> Self {
        Self {
            owner,
            is_king: true,
        }
    }
}

/// The 8x8 grid of cell contents.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Board {
    cells: [[Option<Piece>; BOARD_SIZE as usize]; BOARD_SIZE as usize],
}

impl Board {
    /// A board with no pieces.
    pub fn empty() -> Self {
        Self {
            cells: [[None; BOARD_SIZE as usize]; BOARD_SIZE as usize],
        }
    }

    /// The starting layout: 12 Dark pieces on rows 0-2 and 12 Light pieces
    /// on rows 5-7, dark squares only.
    pub fn initial() -> Self {
        let mut board = Self::empty();
        for pos in Position::all().filter(|p| p.is_dark()) {
            match pos.row() {
                0..=2 => board.set(pos, Some(Piece::man(Player::Dark))),
                5..=7 => board.set(pos, Some(Piece::man(Player::Light))),
                _ => {}
            }
        }
        board
    }

    /// Contents of a square.
    pub fn get(&self, pos: Position) -> Option<Piece> {
        self.cells[pos.row() as usize][pos.col() as usize]
    }

    /// Overwrite a square.
    pub fn set(&mut self, pos: Position, piece: Option<Piece>) {
        self.cells[pos.row() as usize][pos.col() as usize] = piece;
    }

    /// Move whatever is on `from` to `to` and clear `from`.
    pub fn relocate(&mut self, from: Position, to: Position) {
        let piece = self.get(from);
        self.set(from, None);
        self.set(to, piece);
    }

    /// All occupied squares, row by row.
    pub fn pieces(&self) -> impl Iterator<Item = (Position, Piece)> + '_ {
        Position::all().filter_map(move |pos| self.get(pos).map(|piece| (pos, piece)))
    }

    /// Number of pieces a seat has left.
    pub fn count(&self, player: Player) -> usize {
        self.pieces().filter(|(_, p)| p.owner == player).count()
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::initial()
    }
}

/// Plain-text dump: `d`/`D` for Dark men/kings, `l`/`L` for Light,
/// `.` for empty dark squares.
impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "  ")?;
        for col in 0..BOARD_SIZE {
            write!(f, " {}", col)?;
        }
        writeln!(f)?;
        for row in 0..BOARD_SIZE {
            write!(f, "{} ", row)?;
            for col in 0..BOARD_SIZE {
                let Some(pos) = Position::new(row, col) else {
                    continue;
                };
                let glyph = match self.get(pos) {
                    Some(Piece {
                        owner: Player::Dark,
                        is_king,
                    }) => {
                        if is_king {
                            'D'
                        } else {
                            'd'
                        }
                    }
                    Some(Piece {
                        owner: Player::Light,
                        is_king,
                    }) => {
                        if is_king {
                            'L'
                        } else {
                            'l'
                        }
                    }
                    None if pos.is_dark() => '.',
                    None => ' ',
                };
                write!(f, " {}", glyph)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
