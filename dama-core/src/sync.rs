//! Peer sync: moves in and out of the relay.
//!
//! Each client holds a full replica of the match. Only moves travel; both
//! sides derive captures, promotion and turn passing from them through the
//! same [`MatchState`] path, so replicas that saw the same moves agree.

use dama_types::{ClientMessage, MovePayload, WireError, WireMove};
use std::time::Instant;
use thiserror::Error;

use crate::game::{Action, GameEvent, MatchConfig, MatchEvent, MatchState, MoveError};
use crate::rules::Move;

/// Errors from [`replay`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("move #{index} ({mv}) rejected: {source}")]
pub struct ReplayError {
    /// Zero-based position in the move list.
    pub index: usize,
    /// The offending move.
    pub mv: Move,
    /// Why it was rejected.
    #[source]
    pub source: MoveError,
}

/// Wrap a locally applied move as a `zug` event.
pub fn emit_move(mv: Move) -> Result<ClientMessage, WireError> {
    let payload = MovePayload::from_move(&WireMove::from(mv))?;
    Ok(ClientMessage::Move(payload))
}

/// Decode an opponent's `gegnerZug` payload.
pub fn decode_remote(payload: &MovePayload) -> Result<Move, WireError> {
    payload.decode().map(Move::from)
}

/// Feed an opponent's move into the local replica.
///
/// A payload that does not decode to a move leaves the state untouched and
/// emits [`MatchEvent::UnreadableRemoteMove`].
pub fn on_remote_move(
    state: MatchState,
    payload: &MovePayload,
    now: Instant,
) -> (MatchState, Vec<Action>) {
    match decode_remote(payload) {
        Ok(mv) => state.on_event(GameEvent::RemoteMove(mv), now),
        Err(_) => (
            state,
            vec![Action::Emit(MatchEvent::UnreadableRemoteMove)],
        ),
    }
}

/// Play a move list from the initial layout with both seats local.
///
/// Every move is checked against the rules. Replaying the same list always
/// yields the same board.
pub fn replay<I>(config: MatchConfig, moves: I, now: Instant) -> Result<MatchState, ReplayError>
where
    I: IntoIterator<Item = Move>,
{
    let (mut state, _) = MatchState::new(config).on_event(GameEvent::MatchStarted, now);

    for (index, mv) in moves.into_iter().enumerate() {
        let (next, actions) = state.on_event(GameEvent::LocalMove(mv), now);
        if let Some(source) = actions.iter().find_map(|action| match action {
            Action::Emit(MatchEvent::MoveRejected(e)) => Some(*e),
            _ => None,
        }) {
            return Err(ReplayError { index, mv, source });
        }
        state = next;
    }

    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Board, Piece};
    use crate::game::Phase;
    use dama_types::{Player, Position};
    use serde_json::json;

    fn pos(row: u8, col: u8) -> Position {
        Position::new(row, col).unwrap()
    }

    fn mv(from: (u8, u8), to: (u8, u8)) -> Move {
        Move::new(pos(from.0, from.1), pos(to.0, to.1))
    }

    #[test]
    fn emitted_move_uses_wire_names() {
        let msg = emit_move(mv((2, 3), (3, 4))).unwrap();
        let value: serde_json::Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();
        assert_eq!(value["event"], "zug");
        assert_eq!(value["data"]["von"], json!({"row": 2, "col": 3}));
        assert_eq!(value["data"]["nach"], json!({"row": 3, "col": 4}));
    }

    #[test]
    fn emitted_move_decodes_on_the_other_side() {
        let ClientMessage::Move(payload) = emit_move(mv((5, 0), (4, 1))).unwrap() else {
            panic!("expected a zug event");
        };
        assert_eq!(decode_remote(&payload).unwrap(), mv((5, 0), (4, 1)));
    }

    #[test]
    fn unreadable_payload_leaves_state_untouched() {
        let now = Instant::now();
        let state = MatchState::default().on_event(GameEvent::MatchStarted, now).0;
        let payload = MovePayload::from_value(json!({"von": "a1"}));

        let (after, actions) = on_remote_move(state.clone(), &payload, now);
        assert_eq!(after, state);
        assert_eq!(
            actions,
            vec![Action::Emit(MatchEvent::UnreadableRemoteMove)]
        );
    }

    #[test]
    fn remote_move_reaches_the_board() {
        let now = Instant::now();
        let state = MatchState::default()
            .on_event(GameEvent::SeatAssigned(Player::Light), now)
            .0
            .on_event(GameEvent::MatchStarted, now)
            .0;
        let payload = MovePayload::from_value(json!({
            "von": {"row": 2, "col": 5},
            "nach": {"row": 3, "col": 6}
        }));

        let (state, _) = on_remote_move(state, &payload, now);
        assert_eq!(state.board().get(pos(3, 6)), Some(Piece::man(Player::Dark)));
        assert_eq!(state.current_player(), Player::Light);
    }

    #[test]
    fn replay_opening() {
        let now = Instant::now();
        let state = replay(
            MatchConfig::default(),
            [mv((2, 1), (3, 2)), mv((5, 4), (4, 3)), mv((3, 2), (4, 1))],
            now,
        )
        .unwrap();

        assert_eq!(state.phase(), Phase::InProgress);
        assert_eq!(state.current_player(), Player::Light);
        let mut expected = Board::initial();
        expected.relocate(pos(2, 1), pos(4, 1));
        expected.relocate(pos(5, 4), pos(4, 3));
        assert_eq!(state.board(), &expected);
    }

    #[test]
    fn replay_reports_first_bad_move() {
        let err = replay(
            MatchConfig::default(),
            [mv((2, 1), (3, 2)), mv((2, 3), (3, 4))],
            Instant::now(),
        )
        .unwrap_err();

        assert_eq!(err.index, 1);
        assert_eq!(err.source, MoveError::NotYourPiece(pos(2, 3)));
    }

    #[test]
    fn replay_of_nothing_is_the_opening_position() {
        let state = replay(MatchConfig::default(), [], Instant::now()).unwrap();
        assert_eq!(state.board(), &Board::initial());
        assert_eq!(state.current_player(), Player::Dark);
    }
}
