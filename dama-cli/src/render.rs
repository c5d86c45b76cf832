//! Text output for the terminal client.

use dama_client::ClientEvent;
use dama_core::{FinishReason, MatchEvent, MatchState, Phase};
use dama_types::Player;
use std::time::Instant;

/// Seat names as shown to the user.
pub fn seat(player: Player) -> &'static str {
    match player {
        Player::Dark => "Dark (d)",
        Player::Light => "Light (l)",
    }
}

/// One-line summary of the match.
pub fn status(state: &MatchState, now: Instant) -> String {
    match state.phase() {
        Phase::WaitingForOpponent => "Waiting for an opponent".to_string(),
        Phase::Finished => match state.winner() {
            Some(winner) => format!("Match over: {} wins", seat(winner)),
            None => "Match over".to_string(),
        },
        Phase::InProgress => {
            let mut line = format!("{} to move", seat(state.current_player()));
            if state.local_seat().is_some() {
                line.push_str(if state.is_local_turn() {
                    " (you)"
                } else {
                    " (opponent)"
                });
            }
            if let Some(at) = state.pending_capture() {
                line.push_str(&format!(", must keep capturing from {}", at));
            }
            if let Some(left) = state.remaining(now) {
                line.push_str(&format!(", {}s left", left.as_secs()));
            }
            line
        }
    }
}

/// Describe a match event.
pub fn describe(event: &MatchEvent) -> String {
    match event {
        MatchEvent::Started => "Match started, Dark moves first".to_string(),
        MatchEvent::Selected(pos) => format!("Selected {}", pos),
        MatchEvent::SelectionCleared => "Selection cleared".to_string(),
        MatchEvent::MoveApplied {
            mv,
            by,
            captured,
            promoted,
        } => {
            let mut line = format!("{} played {}", seat(*by), mv);
            if let Some(at) = captured {
                line.push_str(&format!(", captured {}", at));
            }
            if *promoted {
                line.push_str(", crowned");
            }
            line
        }
        MatchEvent::MoveRejected(e) => format!("Rejected: {}", e),
        MatchEvent::ContinueCapture { player, at } => {
            format!("{} must capture again from {}", seat(*player), at)
        }
        MatchEvent::TurnChanged(player) => format!("{} to move", seat(*player)),
        MatchEvent::MatchOver { winner, reason } => {
            let why = match reason {
                FinishReason::NoPiecesLeft => "no pieces left",
                FinishReason::TurnTimeout => "turn clock ran out",
            };
            format!("{} wins ({})", seat(*winner), why)
        }
        MatchEvent::RemoteMoveIgnored { mv, reason } => {
            format!("Ignored opponent move {}: {}", mv, reason)
        }
        MatchEvent::UnreadableRemoteMove => "Ignored unreadable opponent move".to_string(),
        MatchEvent::WaitingForOpponent => "Waiting for an opponent".to_string(),
    }
}

/// Describe a client event.
pub fn describe_client(event: &ClientEvent) -> String {
    match event {
        ClientEvent::SeatAssigned(player) => format!("You play {}", seat(*player)),
        ClientEvent::RoomCreated(code) => format!("Room code: {} (share it)", code),
        ClientEvent::RelayError(message) => format!("Relay: {}", message),
        ClientEvent::Match(event) => describe(event),
        ClientEvent::Disconnected => "Disconnected from relay".to_string(),
    }
}

/// Whether the event changed what the board shows.
pub fn needs_redraw(event: &MatchEvent) -> bool {
    matches!(
        event,
        MatchEvent::Started
            | MatchEvent::MoveApplied { .. }
            | MatchEvent::MatchOver { .. }
            | MatchEvent::WaitingForOpponent
    )
}
