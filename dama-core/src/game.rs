//! Match state machine for Dama.
//!
//! A pure, side-effect-free state machine for one match. It takes events
//! (local input, remote moves, timer expiry, relay notifications) and
//! produces the new state plus a list of actions to execute.
//!
//! Sending moves and arming timers is performed by dama-client, not by this
//! module. Time is passed in as an [`Instant`] so tests can drive the clock.

use dama_types::{Player, Position};
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::board::{Board, Piece};
use crate::clock::{TurnClock, DEFAULT_TURN_DURATION};
use crate::rules::{self, Applied, Move, MoveKind};

/// Match-level settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchConfig {
    /// Time a player has for one turn before forfeiting.
    pub turn_duration: Duration,
    /// Check the opponent's moves against the rules before applying them.
    ///
    /// Off by default: remote moves are trusted and only their effects
    /// (capture, promotion, turn passing) are re-derived.
    pub verify_remote_moves: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            turn_duration: DEFAULT_TURN_DURATION,
            verify_remote_moves: false,
        }
    }
}

/// Lifecycle of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No opponent yet (or the opponent left).
    WaitingForOpponent,
    /// Both seats filled; moves are being played.
    InProgress,
    /// Someone won. Terminal until reset.
    Finished,
}

/// Why a match ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    /// The loser has no pieces left.
    NoPiecesLeft,
    /// The loser's turn clock ran out.
    TurnTimeout,
}

/// Reasons a move is refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MoveError {
    /// No match is running.
    #[error("no match in progress")]
    NotInProgress,
    /// It is the other seat's turn.
    #[error("not your turn")]
    NotYourTurn,
    /// Nothing stands on the chosen square.
    #[error("no piece on {0}")]
    EmptySquare(Position),
    /// The piece belongs to the other seat.
    #[error("piece on {0} is not yours")]
    NotYourPiece(Position),
    /// A capture chain is pending and must be continued with this piece.
    #[error("must continue capturing with the piece on {from}")]
    MustContinueCapture {
        /// The piece that just captured.
        from: Position,
    },
    /// The rules do not allow this move.
    #[error("illegal move {from} -> {to}")]
    Illegal {
        /// Source square.
        from: Position,
        /// Destination square.
        to: Position,
    },
}

/// Inputs to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    /// The relay assigned the local seat.
    SeatAssigned(Player),
    /// Both seats are filled.
    MatchStarted,
    /// The local player clicked a square.
    SquareSelected(Position),
    /// The local player submitted a whole move.
    LocalMove(Move),
    /// The opponent's move arrived through the relay.
    RemoteMove(Move),
    /// A turn timer armed earlier went off.
    TurnTimerFired,
    /// The relay reported that the opponent disconnected.
    OpponentLeft,
    /// Start over with the initial layout.
    Reset,
}

/// Instructions for the client. Not side effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Forward a validated local move to the opponent.
    SendMove(Move),
    /// Arm (or re-arm) the turn timer.
    StartTurnTimer {
        /// When the current player forfeits.
        deadline: Instant,
    },
    /// Disarm the turn timer.
    CancelTurnTimer,
    /// Report something to the application.
    Emit(MatchEvent),
}

/// Notifications for the application layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchEvent {
    /// A new match began; Dark to move.
    Started,
    /// A piece is selected and awaits a destination.
    Selected(Position),
    /// The selection was dropped.
    SelectionCleared,
    /// A move changed the board.
    MoveApplied {
        /// The move.
        mv: Move,
        /// Who moved.
        by: Player,
        /// Square of a captured piece.
        captured: Option<Position>,
        /// The piece was crowned.
        promoted: bool,
    },
    /// A local move was refused. Only the acting player sees this.
    MoveRejected(MoveError),
    /// The same piece must capture again before the turn passes.
    ContinueCapture {
        /// Seat that keeps the turn.
        player: Player,
        /// Square of the capturing piece.
        at: Position,
    },
    /// The turn passed.
    TurnChanged(Player),
    /// The match ended.
    MatchOver {
        /// The winning seat.
        winner: Player,
        /// How it ended.
        reason: FinishReason,
    },
    /// A remote move could not be applied and was dropped.
    RemoteMoveIgnored {
        /// The move as received.
        mv: Move,
        /// Why it was dropped.
        reason: MoveError,
    },
    /// A remote payload did not decode to a move.
    UnreadableRemoteMove,
    /// Back to waiting for an opponent.
    WaitingForOpponent,
}

/// Full state of one match as seen by one client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchState {
    config: MatchConfig,
    board: Board,
    phase: Phase,
    current_player: Player,
    selection: Option<Position>,
    pending_capture: Option<Position>,
    winner: Option<Player>,
    local_seat: Option<Player>,
    clock: TurnClock,
}

impl MatchState {
    /// Create a state waiting for an opponent, showing the initial layout.
    pub fn new(config: MatchConfig) -> Self {
        Self {
            config,
            board: Board::initial(),
            phase: Phase::WaitingForOpponent,
            current_player: Player::Dark,
            selection: None,
            pending_capture: None,
            winner: None,
            local_seat: None,
            clock: TurnClock::new(config.turn_duration),
        }
    }

    /// Process an event and return the new state plus actions to execute.
    ///
    /// This is a pure function - no side effects. The caller (dama-client)
    /// is responsible for executing the returned actions.
    pub fn on_event(mut self, event: GameEvent, now: Instant) -> (Self, Vec<Action>) {
        let mut actions = Vec::new();

        match event {
            GameEvent::SeatAssigned(seat) => self.local_seat = Some(seat),
            GameEvent::MatchStarted => self.start(now, &mut actions),
            GameEvent::SquareSelected(pos) => self.select(pos, now, &mut actions),
            GameEvent::LocalMove(mv) => {
                if let Err(e) = self.play_local(mv, now, &mut actions) {
                    actions.push(Action::Emit(MatchEvent::MoveRejected(e)));
                }
            }
            GameEvent::RemoteMove(mv) => self.play_remote(mv, now, &mut actions),
            GameEvent::TurnTimerFired => {
                if self.phase == Phase::InProgress && self.clock.is_expired(now) {
                    let loser = self.current_player;
                    self.finish(loser.opponent(), FinishReason::TurnTimeout, &mut actions);
                }
            }
            GameEvent::OpponentLeft => {
                if self.phase != Phase::Finished {
                    self.phase = Phase::WaitingForOpponent;
                    self.selection = None;
                    self.pending_capture = None;
                    self.clock.cancel();
                    actions.push(Action::CancelTurnTimer);
                    actions.push(Action::Emit(MatchEvent::WaitingForOpponent));
                }
            }
            GameEvent::Reset => {
                let seat = self.local_seat;
                self = Self::new(self.config);
                self.local_seat = seat;
                actions.push(Action::CancelTurnTimer);
                actions.push(Action::Emit(MatchEvent::WaitingForOpponent));
            }
        }

        (self, actions)
    }

    fn start(&mut self, now: Instant, actions: &mut Vec<Action>) {
        self.board = Board::initial();
        self.phase = Phase::InProgress;
        self.current_player = Player::Dark;
        self.selection = None;
        self.pending_capture = None;
        self.winner = None;
        let deadline = self.clock.start(now);

        actions.push(Action::Emit(MatchEvent::Started));
        actions.push(Action::StartTurnTimer { deadline });
    }

    /// Two-click input: first click picks a piece, second click is the
    /// destination.
    fn select(&mut self, pos: Position, now: Instant, actions: &mut Vec<Action>) {
        if let Err(e) = self.check_local_turn() {
            actions.push(Action::Emit(MatchEvent::MoveRejected(e)));
            return;
        }

        let Some(from) = self.selection else {
            match self.board.get(pos) {
                None => reject(actions, MoveError::EmptySquare(pos)),
                Some(piece) if piece.owner != self.current_player => {
                    reject(actions, MoveError::NotYourPiece(pos))
                }
                Some(_) => match self.pending_capture {
                    Some(chain) if chain != pos => {
                        reject(actions, MoveError::MustContinueCapture { from: chain })
                    }
                    _ => {
                        self.selection = Some(pos);
                        actions.push(Action::Emit(MatchEvent::Selected(pos)));
                    }
                },
            }
            return;
        };

        if let Err(e) = self.play_local(Move::new(from, pos), now, actions) {
            reject(actions, e);
            // During a capture chain the selection stays on the capturing piece.
            if self.pending_capture.is_none() {
                self.selection = None;
                actions.push(Action::Emit(MatchEvent::SelectionCleared));
            }
        }
    }

    fn check_local_turn(&self) -> Result<(), MoveError> {
        if self.phase != Phase::InProgress {
            return Err(MoveError::NotInProgress);
        }
        match self.local_seat {
            Some(seat) if seat != self.current_player => Err(MoveError::NotYourTurn),
            _ => Ok(()),
        }
    }

    /// Validate a move for the side to move. Does not mutate.
    fn validate(&self, mv: Move) -> Result<Piece, MoveError> {
        let piece = self
            .board
            .get(mv.from)
            .ok_or(MoveError::EmptySquare(mv.from))?;
        if piece.owner != self.current_player {
            return Err(MoveError::NotYourPiece(mv.from));
        }
        if let Some(chain) = self.pending_capture {
            if mv.from != chain {
                return Err(MoveError::MustContinueCapture { from: chain });
            }
        }
        let kind = rules::classify(&self.board, mv, piece.owner, piece.is_king).ok_or(
            MoveError::Illegal {
                from: mv.from,
                to: mv.to,
            },
        )?;
        if let (Some(chain), MoveKind::Step) = (self.pending_capture, kind) {
            return Err(MoveError::MustContinueCapture { from: chain });
        }
        Ok(piece)
    }

    fn play_local(
        &mut self,
        mv: Move,
        now: Instant,
        actions: &mut Vec<Action>,
    ) -> Result<(), MoveError> {
        self.check_local_turn()?;
        let piece = self.validate(mv)?;

        let applied = rules::apply_move(&mut self.board, mv);
        actions.push(Action::SendMove(mv));
        self.advance(mv, piece, applied, true, now, actions);
        Ok(())
    }

    fn play_remote(&mut self, mv: Move, now: Instant, actions: &mut Vec<Action>) {
        let checked = if self.phase != Phase::InProgress {
            Err(MoveError::NotInProgress)
        } else if self.config.verify_remote_moves {
            match self.local_seat {
                Some(seat) if seat == self.current_player => Err(MoveError::NotYourTurn),
                _ => self.validate(mv),
            }
        } else {
            self.board
                .get(mv.from)
                .ok_or(MoveError::EmptySquare(mv.from))
        };

        match checked {
            Ok(piece) => {
                let applied = rules::apply_move(&mut self.board, mv);
                self.advance(mv, piece, applied, false, now, actions);
            }
            Err(reason) => {
                actions.push(Action::Emit(MatchEvent::RemoteMoveIgnored { mv, reason }));
            }
        }
    }

    /// Turn bookkeeping shared by local and remote moves: termination,
    /// mandatory continuation, turn passing.
    fn advance(
        &mut self,
        mv: Move,
        mover: Piece,
        applied: Applied,
        local: bool,
        now: Instant,
        actions: &mut Vec<Action>,
    ) {
        actions.push(Action::Emit(MatchEvent::MoveApplied {
            mv,
            by: mover.owner,
            captured: applied.captured.map(|(square, _)| square),
            promoted: applied.promoted,
        }));

        for side in [mover.owner.opponent(), mover.owner] {
            if self.board.count(side) == 0 {
                self.finish(side.opponent(), FinishReason::NoPiecesLeft, actions);
                return;
            }
        }

        // King status before the move decides the continuation.
        let must_continue = applied.captured.is_some()
            && rules::has_further_capture(&self.board, mv.to, mover.owner, mover.is_king);

        if must_continue {
            self.current_player = mover.owner;
            self.pending_capture = Some(mv.to);
            self.selection = local.then_some(mv.to);
            actions.push(Action::Emit(MatchEvent::ContinueCapture {
                player: mover.owner,
                at: mv.to,
            }));
        } else {
            self.current_player = mover.owner.opponent();
            self.pending_capture = None;
            self.selection = None;
            actions.push(Action::Emit(MatchEvent::TurnChanged(self.current_player)));
        }

        let deadline = self.clock.start(now);
        actions.push(Action::StartTurnTimer { deadline });
    }

    fn finish(&mut self, winner: Player, reason: FinishReason, actions: &mut Vec<Action>) {
        self.phase = Phase::Finished;
        self.winner = Some(winner);
        self.selection = None;
        self.pending_capture = None;
        self.clock.cancel();
        actions.push(Action::CancelTurnTimer);
        actions.push(Action::Emit(MatchEvent::MatchOver { winner, reason }));
    }

    /// The board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Match lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Seat to move.
    pub fn current_player(&self) -> Player {
        self.current_player
    }

    /// Selected square awaiting a destination.
    pub fn selection(&self) -> Option<Position> {
        self.selection
    }

    /// Piece that must keep capturing before the turn passes.
    pub fn pending_capture(&self) -> Option<Position> {
        self.pending_capture
    }

    /// Winner once finished.
    pub fn winner(&self) -> Option<Player> {
        self.winner
    }

    /// Seat played on this client; `None` when both seats are local.
    pub fn local_seat(&self) -> Option<Player> {
        self.local_seat
    }

    /// When the current player forfeits.
    pub fn turn_deadline(&self) -> Option<Instant> {
        self.clock.deadline()
    }

    /// Time left on the turn clock.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.clock.remaining(now)
    }

    /// Whether the local player may act now.
    pub fn is_local_turn(&self) -> bool {
        self.check_local_turn().is_ok()
    }

    /// Match settings.
    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Start mid-game from an arbitrary position with both seats local.
    pub fn from_board(config: MatchConfig, board: Board, to_move: Player, now: Instant) -> Self {
        let mut state = Self::new(config);
        state.board = board;
        state.phase = Phase::InProgress;
        state.current_player = to_move;
        state.clock.start(now);
        state
    }
}

impl Default for MatchState {
    fn default() -> Self {
        Self::new(MatchConfig::default())
    }
}

fn reject(actions: &mut Vec<Action>, error: MoveError) {
    actions.push(Action::Emit(MatchEvent::MoveRejected(error)));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(row: u8, col: u8) -> Position {
        Position::new(row, col).unwrap()
    }

    fn mv(from: (u8, u8), to: (u8, u8)) -> Move {
        Move::new(pos(from.0, from.1), pos(to.0, to.1))
    }

    fn started(seat: Option<Player>, now: Instant) -> MatchState {
        let mut state = MatchState::default();
        if let Some(seat) = seat {
            state = state.on_event(GameEvent::SeatAssigned(seat), now).0;
        }
        state.on_event(GameEvent::MatchStarted, now).0
    }

    fn emitted(actions: &[Action]) -> Vec<MatchEvent> {
        actions
            .iter()
            .filter_map(|a| match a {
                Action::Emit(e) => Some(*e),
                _ => None,
            })
            .collect()
    }

    fn rejected(actions: &[Action]) -> Option<MoveError> {
        emitted(actions).into_iter().find_map(|e| match e {
            MatchEvent::MoveRejected(err) => Some(err),
            _ => None,
        })
    }

    /// Dark man on (2,1) with Light men on (3,2) and (5,4): a two-hop chain.
    fn chain_board() -> Board {
        let mut board = Board::empty();
        board.set(pos(2, 1), Some(Piece::man(Player::Dark)));
        board.set(pos(3, 2), Some(Piece::man(Player::Light)));
        board.set(pos(5, 4), Some(Piece::man(Player::Light)));
        board.set(pos(7, 0), Some(Piece::man(Player::Light)));
        board
    }

    #[test]
    fn starts_waiting_with_initial_layout() {
        let state = MatchState::default();
        assert_eq!(state.phase(), Phase::WaitingForOpponent);
        assert_eq!(state.board(), &Board::initial());
        assert_eq!(state.turn_deadline(), None);
    }

    #[test]
    fn match_start_arms_timer_with_dark_to_move() {
        let now = Instant::now();
        let (state, actions) = MatchState::default().on_event(GameEvent::MatchStarted, now);

        assert_eq!(state.phase(), Phase::InProgress);
        assert_eq!(state.current_player(), Player::Dark);
        assert!(actions.contains(&Action::StartTurnTimer {
            deadline: now + DEFAULT_TURN_DURATION
        }));
        assert!(emitted(&actions).contains(&MatchEvent::Started));
    }

    #[test]
    fn moves_rejected_before_match_starts() {
        let now = Instant::now();
        let (state, actions) =
            MatchState::default().on_event(GameEvent::LocalMove(mv((2, 3), (3, 4))), now);
        assert_eq!(rejected(&actions), Some(MoveError::NotInProgress));
        assert_eq!(state.board(), &Board::initial());
        assert!(!actions.iter().any(|a| matches!(a, Action::SendMove(_))));
    }

    #[test]
    fn legal_local_move_is_sent_and_turn_passes() {
        let now = Instant::now();
        let state = started(Some(Player::Dark), now);
        let (state, actions) = state.on_event(GameEvent::LocalMove(mv((2, 3), (3, 4))), now);

        assert!(actions.contains(&Action::SendMove(mv((2, 3), (3, 4)))));
        assert_eq!(state.current_player(), Player::Light);
        assert!(emitted(&actions).contains(&MatchEvent::TurnChanged(Player::Light)));
        assert_eq!(
            state.board().get(pos(3, 4)),
            Some(Piece::man(Player::Dark))
        );
    }

    #[test]
    fn illegal_local_move_has_no_effect() {
        let now = Instant::now();
        let before = started(Some(Player::Dark), now);
        let (after, actions) = before
            .clone()
            .on_event(GameEvent::LocalMove(mv((1, 2), (2, 3))), now);

        assert_eq!(
            rejected(&actions),
            Some(MoveError::Illegal {
                from: pos(1, 2),
                to: pos(2, 3)
            })
        );
        assert_eq!(after, before);
        assert!(!actions.iter().any(|a| matches!(a, Action::SendMove(_))));
    }

    #[test]
    fn cannot_move_out_of_turn() {
        let now = Instant::now();
        let state = started(Some(Player::Light), now);
        let (_, actions) = state.on_event(GameEvent::LocalMove(mv((5, 0), (4, 1))), now);
        assert_eq!(rejected(&actions), Some(MoveError::NotYourTurn));
    }

    #[test]
    fn cannot_move_opponent_piece() {
        let now = Instant::now();
        let state = started(None, now);
        let (_, actions) = state.on_event(GameEvent::LocalMove(mv((5, 0), (4, 1))), now);
        assert_eq!(rejected(&actions), Some(MoveError::NotYourPiece(pos(5, 0))));
    }

    #[test]
    fn replaying_a_move_is_prevented_by_turn_state() {
        let now = Instant::now();
        let state = started(Some(Player::Dark), now);
        let (state, _) = state.on_event(GameEvent::LocalMove(mv((2, 3), (3, 4))), now);
        let (_, actions) = state.on_event(GameEvent::LocalMove(mv((2, 3), (3, 4))), now);
        assert_eq!(rejected(&actions), Some(MoveError::NotYourTurn));
    }

    #[test]
    fn two_click_selection() {
        let now = Instant::now();
        let state = started(Some(Player::Dark), now);

        let (state, actions) = state.on_event(GameEvent::SquareSelected(pos(2, 3)), now);
        assert_eq!(state.selection(), Some(pos(2, 3)));
        assert!(emitted(&actions).contains(&MatchEvent::Selected(pos(2, 3))));

        let (state, actions) = state.on_event(GameEvent::SquareSelected(pos(3, 2)), now);
        assert!(actions.contains(&Action::SendMove(mv((2, 3), (3, 2)))));
        assert_eq!(state.selection(), None);
        assert_eq!(state.current_player(), Player::Light);
    }

    #[test]
    fn selecting_empty_or_foreign_square_is_refused() {
        let now = Instant::now();
        let state = started(Some(Player::Dark), now);

        let (state, actions) = state.on_event(GameEvent::SquareSelected(pos(4, 3)), now);
        assert_eq!(rejected(&actions), Some(MoveError::EmptySquare(pos(4, 3))));
        assert_eq!(state.selection(), None);

        let (state, actions) = state.on_event(GameEvent::SquareSelected(pos(5, 2)), now);
        assert_eq!(rejected(&actions), Some(MoveError::NotYourPiece(pos(5, 2))));
        assert_eq!(state.selection(), None);
    }

    #[test]
    fn bad_destination_clears_selection() {
        let now = Instant::now();
        let state = started(Some(Player::Dark), now);
        let (state, _) = state.on_event(GameEvent::SquareSelected(pos(2, 3)), now);
        let (state, actions) = state.on_event(GameEvent::SquareSelected(pos(4, 5)), now);

        assert!(rejected(&actions).is_some());
        assert!(emitted(&actions).contains(&MatchEvent::SelectionCleared));
        assert_eq!(state.selection(), None);
        assert_eq!(state.current_player(), Player::Dark);
    }

    #[test]
    fn capture_chain_keeps_turn_and_selection() {
        let now = Instant::now();
        let state = MatchState::from_board(MatchConfig::default(), chain_board(), Player::Dark, now);

        let (state, actions) = state.on_event(GameEvent::LocalMove(mv((2, 1), (4, 3))), now);
        assert_eq!(state.current_player(), Player::Dark);
        assert_eq!(state.pending_capture(), Some(pos(4, 3)));
        assert_eq!(state.selection(), Some(pos(4, 3)));
        assert!(emitted(&actions).contains(&MatchEvent::ContinueCapture {
            player: Player::Dark,
            at: pos(4, 3)
        }));
        assert_eq!(state.board().get(pos(3, 2)), None);

        // A plain step is not allowed while the chain is pending.
        let (state, actions) = state.on_event(GameEvent::LocalMove(mv((4, 3), (5, 2))), now);
        assert_eq!(
            rejected(&actions),
            Some(MoveError::MustContinueCapture { from: pos(4, 3) })
        );
        assert_eq!(state.selection(), Some(pos(4, 3)));

        // Finish the chain; now the turn passes.
        let (state, _) = state.on_event(GameEvent::SquareSelected(pos(6, 5)), now);
        assert_eq!(state.current_player(), Player::Light);
        assert_eq!(state.pending_capture(), None);
        assert_eq!(state.board().get(pos(5, 4)), None);
    }

    #[test]
    fn bad_click_during_chain_keeps_selection() {
        let now = Instant::now();
        let state = MatchState::from_board(MatchConfig::default(), chain_board(), Player::Dark, now);
        let (state, _) = state.on_event(GameEvent::LocalMove(mv((2, 1), (4, 3))), now);

        let (state, actions) = state.on_event(GameEvent::SquareSelected(pos(0, 0)), now);
        assert!(rejected(&actions).is_some());
        assert_eq!(state.selection(), Some(pos(4, 3)));
        assert!(!emitted(&actions).contains(&MatchEvent::SelectionCleared));
    }

    #[test]
    fn capturing_last_piece_finishes_match() {
        let now = Instant::now();
        let mut board = Board::empty();
        board.set(pos(2, 1), Some(Piece::man(Player::Dark)));
        board.set(pos(3, 2), Some(Piece::man(Player::Light)));
        let state = MatchState::from_board(MatchConfig::default(), board, Player::Dark, now);

        let (state, actions) = state.on_event(GameEvent::LocalMove(mv((2, 1), (4, 3))), now);
        assert_eq!(state.phase(), Phase::Finished);
        assert_eq!(state.winner(), Some(Player::Dark));
        assert!(actions.contains(&Action::CancelTurnTimer));
        assert!(emitted(&actions).contains(&MatchEvent::MatchOver {
            winner: Player::Dark,
            reason: FinishReason::NoPiecesLeft
        }));

        // Finished is terminal.
        let (_, actions) = state.on_event(GameEvent::LocalMove(mv((4, 3), (5, 4))), now);
        assert_eq!(rejected(&actions), Some(MoveError::NotInProgress));
    }

    #[test]
    fn timeout_forfeits_current_player() {
        let now = Instant::now();
        let state = started(Some(Player::Light), now);

        // Early firing (stale timer) is ignored.
        let (state, actions) =
            state.on_event(GameEvent::TurnTimerFired, now + Duration::from_secs(30));
        assert_eq!(state.phase(), Phase::InProgress);
        assert!(actions.is_empty());

        let (state, actions) =
            state.on_event(GameEvent::TurnTimerFired, now + Duration::from_secs(60));
        assert_eq!(state.phase(), Phase::Finished);
        assert_eq!(state.winner(), Some(Player::Light));
        assert!(emitted(&actions).contains(&MatchEvent::MatchOver {
            winner: Player::Light,
            reason: FinishReason::TurnTimeout
        }));
    }

    #[test]
    fn move_restarts_the_clock() {
        let now = Instant::now();
        let later = now + Duration::from_secs(50);
        let state = started(None, now);
        let (state, actions) = state.on_event(GameEvent::LocalMove(mv((2, 3), (3, 4))), later);

        assert_eq!(state.turn_deadline(), Some(later + DEFAULT_TURN_DURATION));
        assert!(actions.contains(&Action::StartTurnTimer {
            deadline: later + DEFAULT_TURN_DURATION
        }));
        let (state, _) = state.on_event(GameEvent::TurnTimerFired, now + Duration::from_secs(61));
        assert_eq!(state.phase(), Phase::InProgress);
    }

    #[test]
    fn remote_move_applies_and_flips_turn() {
        let now = Instant::now();
        let state = started(Some(Player::Light), now);
        let (state, actions) = state.on_event(GameEvent::RemoteMove(mv((2, 3), (3, 4))), now);

        assert_eq!(state.current_player(), Player::Light);
        assert!(state.is_local_turn());
        assert!(!actions.iter().any(|a| matches!(a, Action::SendMove(_))));
    }

    #[test]
    fn remote_capture_chain_keeps_remote_turn() {
        let now = Instant::now();
        let mut state =
            MatchState::from_board(MatchConfig::default(), chain_board(), Player::Dark, now);
        state = state.on_event(GameEvent::SeatAssigned(Player::Light), now).0;

        let (state, _) = state.on_event(GameEvent::RemoteMove(mv((2, 1), (4, 3))), now);
        assert_eq!(state.current_player(), Player::Dark);
        assert_eq!(state.selection(), None);
        assert_eq!(state.pending_capture(), Some(pos(4, 3)));

        let (state, _) = state.on_event(GameEvent::RemoteMove(mv((4, 3), (6, 5))), now);
        assert_eq!(state.current_player(), Player::Light);
    }

    #[test]
    fn remote_move_from_empty_square_is_ignored() {
        let now = Instant::now();
        let before = started(Some(Player::Light), now);
        let (after, actions) = before
            .clone()
            .on_event(GameEvent::RemoteMove(mv((3, 2), (4, 3))), now);

        assert_eq!(after, before);
        assert!(matches!(
            emitted(&actions)[..],
            [MatchEvent::RemoteMoveIgnored {
                reason: MoveError::EmptySquare(_),
                ..
            }]
        ));
    }

    #[test]
    fn remote_moves_are_trusted_by_default() {
        let now = Instant::now();
        let state = started(Some(Player::Light), now);
        // Not a legal move, but it still lands.
        let (state, _) = state.on_event(GameEvent::RemoteMove(mv((2, 3), (4, 3))), now);
        assert_eq!(
            state.board().get(pos(4, 3)),
            Some(Piece::man(Player::Dark))
        );
    }

    #[test]
    fn verified_remote_moves_reject_illegal_input() {
        let now = Instant::now();
        let config = MatchConfig {
            verify_remote_moves: true,
            ..MatchConfig::default()
        };
        let state = MatchState::new(config)
            .on_event(GameEvent::SeatAssigned(Player::Light), now)
            .0
            .on_event(GameEvent::MatchStarted, now)
            .0;

        let (after, actions) = state
            .clone()
            .on_event(GameEvent::RemoteMove(mv((2, 3), (4, 3))), now);
        assert_eq!(after, state);
        assert!(matches!(
            emitted(&actions)[..],
            [MatchEvent::RemoteMoveIgnored {
                reason: MoveError::Illegal { .. },
                ..
            }]
        ));

        let (after, _) = state.on_event(GameEvent::RemoteMove(mv((2, 3), (3, 4))), now);
        assert_eq!(after.current_player(), Player::Light);
    }

    #[test]
    fn opponent_leaving_returns_to_waiting() {
        let now = Instant::now();
        let state = started(Some(Player::Dark), now);
        let (state, actions) = state.on_event(GameEvent::OpponentLeft, now);

        assert_eq!(state.phase(), Phase::WaitingForOpponent);
        assert_eq!(state.turn_deadline(), None);
        assert!(actions.contains(&Action::CancelTurnTimer));
    }

    #[test]
    fn reset_restores_initial_layout_and_keeps_seat() {
        let now = Instant::now();
        let state = started(Some(Player::Dark), now);
        let (state, _) = state.on_event(GameEvent::LocalMove(mv((2, 3), (3, 4))), now);
        let (state, _) = state.on_event(GameEvent::Reset, now);

        assert_eq!(state.phase(), Phase::WaitingForOpponent);
        assert_eq!(state.board(), &Board::initial());
        assert_eq!(state.local_seat(), Some(Player::Dark));
        assert_eq!(state.current_player(), Player::Dark);
    }

    #[test]
    fn promotion_during_capture_ends_the_chain() {
        let now = Instant::now();
        let mut board = Board::empty();
        board.set(pos(5, 2), Some(Piece::man(Player::Dark)));
        board.set(pos(6, 3), Some(Piece::man(Player::Light)));
        // Only reachable backwards from (7,4), which a fresh king may not use yet.
        board.set(pos(6, 5), Some(Piece::man(Player::Light)));
        let state = MatchState::from_board(MatchConfig::default(), board, Player::Dark, now);

        let (state, actions) = state.on_event(GameEvent::LocalMove(mv((5, 2), (7, 4))), now);
        assert!(emitted(&actions).iter().any(|e| matches!(
            e,
            MatchEvent::MoveApplied { promoted: true, .. }
        )));
        assert_eq!(state.board().get(pos(7, 4)), Some(Piece::king(Player::Dark)));
        assert_eq!(state.current_player(), Player::Light);
    }
}
