//! Rules engine: move legality, capture chains and promotion.
//!
//! All checks are pure functions over a [`Board`]. [`apply_move`] is the
//! single mutation entry point used during play.

use dama_types::{Player, Position, WireMove};
use std::fmt;

use crate::board::{Board, Piece};

/// The four diagonal unit directions.
const DIAGONALS: [(i8, i8); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];

/// A move from one square to another.
///
/// Whether it is a step or a capture follows from the distance alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    /// Source square.
    pub from: Position,
    /// Destination square.
    pub to: Position,
}

impl Move {
    /// Create a move.
    pub const fn new(from: Position, to: Position) -> Self {
        Self { from, to }
    }

    /// The jumped-over square, if the move spans two diagonal steps.
    pub fn midpoint(&self) -> Option<Position> {
        let (d_row, d_col) = self.from.delta(self.to);
        if d_row.abs() == 2 && d_col.abs() == 2 {
            self.from.offset(d_row / 2, d_col / 2)
        } else {
            None
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}

impl From<WireMove> for Move {
    fn from(mv: WireMove) -> Self {
        Self::new(mv.from, mv.to)
    }
}

impl From<Move> for WireMove {
    fn from(mv: Move) -> Self {
        WireMove {
            from: mv.from,
            to: mv.to,
        }
    }
}

/// How a legal move affects the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveKind {
    /// One diagonal square onto an empty cell.
    Step,
    /// Two diagonal squares over an opposing piece.
    Capture {
        /// Square of the piece that gets removed.
        captured: Position,
    },
}

/// What [`apply_move`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Applied {
    /// The piece as it stands on the destination after the move.
    pub piece: Option<Piece>,
    /// Square and piece removed by a capture.
    pub captured: Option<(Position, Piece)>,
    /// The piece was crowned by this move.
    pub promoted: bool,
}

impl Applied {
    /// Nothing moved (empty source square).
    pub fn nothing() -> Self {
        Self::default()
    }
}

/// Row direction a non-king of `player` moves in.
pub fn forward(player: Player) -> i8 {
    match player {
        Player::Dark => 1,
        Player::Light => -1,
    }
}

/// The far edge where `player`'s pieces are crowned.
pub fn promotion_row(player: Player) -> u8 {
    match player {
        Player::Dark => 7,
        Player::Light => 0,
    }
}

fn direction_allowed(player: Player, is_king: bool, d_row: i8) -> bool {
    is_king || d_row.signum() == forward(player)
}

/// A one-square diagonal move onto an empty square, forward unless king.
pub fn is_legal_step(
    board: &Board,
    from: Position,
    to: Position,
    player: Player,
    is_king: bool,
) -> bool {
    let (d_row, d_col) = from.delta(to);
    d_row.abs() == 1
        && d_col.abs() == 1
        && board.get(to).is_none()
        && direction_allowed(player, is_king, d_row)
}

/// A two-square diagonal jump over an opposing piece onto an empty square,
/// forward unless king.
pub fn is_legal_capture(
    board: &Board,
    from: Position,
    to: Position,
    player: Player,
    is_king: bool,
) -> bool {
    let (d_row, d_col) = from.delta(to);
    if d_row.abs() != 2 || d_col.abs() != 2 {
        return false;
    }
    if board.get(to).is_some() || !direction_allowed(player, is_king, d_row) {
        return false;
    }
    Move::new(from, to)
        .midpoint()
        .and_then(|mid| board.get(mid))
        .is_some_and(|jumped| jumped.owner != player)
}

/// Whether a piece standing on `pos` can capture again.
pub fn has_further_capture(board: &Board, pos: Position, player: Player, is_king: bool) -> bool {
    DIAGONALS
        .iter()
        .filter_map(|&(d_row, d_col)| pos.offset(2 * d_row, 2 * d_col))
        .any(|to| is_legal_capture(board, pos, to, player, is_king))
}

/// Classify a move for the given mover, or `None` if it is illegal.
pub fn classify(board: &Board, mv: Move, player: Player, is_king: bool) -> Option<MoveKind> {
    if is_legal_step(board, mv.from, mv.to, player, is_king) {
        Some(MoveKind::Step)
    } else if is_legal_capture(board, mv.from, mv.to, player, is_king) {
        mv.midpoint().map(|captured| MoveKind::Capture { captured })
    } else {
        None
    }
}

/// Apply a move to the board.
///
/// Relocates the piece, removes the jumped piece when the move spans two
/// squares, and crowns a non-king that lands on its far edge. Legality is
/// the caller's concern; an empty source square leaves the board untouched.
pub fn apply_move(board: &mut Board, mv: Move) -> Applied {
    let Some(mut piece) = board.get(mv.from) else {
        return Applied::nothing();
    };

    board.relocate(mv.from, mv.to);

    let captured = mv.midpoint().and_then(|mid| {
        let jumped = board.get(mid)?;
        board.set(mid, None);
        Some((mid, jumped))
    });

    let promoted = !piece.is_king && mv.to.row() == promotion_row(piece.owner);
    if promoted {
        piece.is_king = true;
        board.set(mv.to, Some(piece));
    }

    Applied {
        piece: Some(piece),
        captured,
        promoted,
    }
}
