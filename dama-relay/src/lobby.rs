//! Matchmaking slot, private rooms and active pairings.
//!
//! The lobby is plain synchronous state. Every operation returns the
//! messages it wants delivered; the caller owns the sockets. The relay keeps
//! one `Lobby` behind a single async mutex so lobby events are serialized.

use dama_types::{ConnectionId, MovePayload, Player, RelayMessage, RoomCode};
use rand::Rng;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Reply to a join with an unknown or malformed code.
pub const ERR_ROOM_NOT_FOUND: &str = "Raum existiert nicht";
/// Reply to a join that cannot take another player.
pub const ERR_ROOM_FULL: &str = "Raum ist bereits voll";
/// Reply to a room request while the room table is at capacity.
pub const ERR_TOO_MANY_ROOMS: &str = "Zu viele offene Räume";

/// Attempts at finding an unused room code before giving up.
const CODE_ATTEMPTS: usize = 32;

/// A message addressed to one connection.
#[derive(Debug, Clone, PartialEq)]
pub struct Outbound {
    /// Recipient.
    pub to: ConnectionId,
    /// Message to deliver.
    pub message: RelayMessage,
}

impl Outbound {
    fn new(to: ConnectionId, message: RelayMessage) -> Self {
        Self { to, message }
    }

    fn error(to: ConnectionId, text: &str) -> Self {
        Self::new(to, RelayMessage::Error(text.to_string()))
    }
}

#[derive(Debug, Clone)]
struct Room {
    creator: ConnectionId,
    created_at: Instant,
}

/// Lobby state.
#[derive(Debug)]
pub struct Lobby {
    waiting: Option<ConnectionId>,
    rooms: HashMap<RoomCode, Room>,
    /// Symmetric: both directions of every pairing are stored.
    pairs: HashMap<ConnectionId, ConnectionId>,
    max_open_rooms: usize,
}

impl Lobby {
    /// Create an empty lobby.
    pub fn new(max_open_rooms: usize) -> Self {
        Self {
            waiting: None,
            rooms: HashMap::new(),
            pairs: HashMap::new(),
            max_open_rooms,
        }
    }

    /// Enter open matchmaking. A paired connection leaves its match first.
    pub fn seek(&mut self, conn: ConnectionId) -> Vec<Outbound> {
        let mut out = self.leave_match(conn);

        match self.waiting {
            Some(waiting) if waiting == conn => {
                tracing::debug!("{:?} is already waiting, ignoring repeat seek", conn);
            }
            Some(waiting) => {
                tracing::info!("Matched {:?} (dark) with {:?} (light)", waiting, conn);
                out.extend(self.start_match(waiting, conn));
            }
            None => {
                tracing::debug!("{:?} is waiting for an opponent", conn);
                self.waiting = Some(conn);
            }
        }
        out
    }

    /// Open a private room owned by `conn`.
    pub fn create_room<R: Rng + ?Sized>(
        &mut self,
        conn: ConnectionId,
        rng: &mut R,
        now: Instant,
    ) -> Vec<Outbound> {
        let mut out = self.leave_match(conn);
        if self.rooms.len() >= self.max_open_rooms {
            tracing::warn!("Room table full ({}), refusing {:?}", self.rooms.len(), conn);
            out.push(Outbound::error(conn, ERR_TOO_MANY_ROOMS));
            return out;
        }

        let Some(code) = (0..CODE_ATTEMPTS)
            .map(|_| RoomCode::generate(rng))
            .find(|code| !self.rooms.contains_key(code))
        else {
            tracing::warn!("No free room code after {} attempts", CODE_ATTEMPTS);
            out.push(Outbound::error(conn, ERR_TOO_MANY_ROOMS));
            return out;
        };

        self.rooms.insert(
            code.clone(),
            Room {
                creator: conn,
                created_at: now,
            },
        );
        tracing::info!("Room {} opened by {:?}", code, conn);
        out.push(Outbound::new(conn, RelayMessage::RoomCreated(code)));
        out
    }

    /// Join a private room by the code as the user typed it. A paired
    /// connection leaves its match first.
    pub fn join(&mut self, conn: ConnectionId, raw_code: &str) -> Vec<Outbound> {
        let mut out = self.leave_match(conn);

        let Ok(code) = RoomCode::parse(raw_code) else {
            tracing::debug!("{:?} sent malformed room code {:?}", conn, raw_code);
            out.push(Outbound::error(conn, ERR_ROOM_NOT_FOUND));
            return out;
        };
        let Some(room) = self.rooms.get(&code) else {
            out.push(Outbound::error(conn, ERR_ROOM_NOT_FOUND));
            return out;
        };
        if room.creator == conn {
            // the creator already occupies the room
            out.push(Outbound::error(conn, ERR_ROOM_FULL));
            return out;
        }

        let creator = room.creator;
        self.rooms.remove(&code);
        tracing::info!(
            "Room {}: {:?} (dark) vs {:?} (light)",
            code,
            creator,
            conn
        );
        out.extend(self.start_match(creator, conn));
        out
    }

    /// Forward a move payload to the sender's partner.
    pub fn relay_move(&self, conn: ConnectionId, payload: MovePayload) -> Vec<Outbound> {
        match self.pairs.get(&conn) {
            Some(&partner) => vec![Outbound::new(partner, RelayMessage::OpponentMove(payload))],
            None => {
                tracing::debug!("Dropping move from unpaired {:?}", conn);
                Vec::new()
            }
        }
    }

    /// Forget everything about a closed connection.
    pub fn disconnect(&mut self, conn: ConnectionId) -> Vec<Outbound> {
        if self.waiting == Some(conn) {
            self.waiting = None;
        }

        let before = self.rooms.len();
        self.rooms.retain(|_, room| room.creator != conn);
        let removed = before - self.rooms.len();
        if removed > 0 {
            tracing::debug!("Deleted {} room(s) of {:?}", removed, conn);
        }

        self.leave_match(conn)
    }

    /// Delete rooms older than `ttl`. Returns how many were deleted.
    pub fn expire_rooms(&mut self, now: Instant, ttl: Duration) -> usize {
        let before = self.rooms.len();
        self.rooms
            .retain(|_, room| now.saturating_duration_since(room.created_at) < ttl);
        before - self.rooms.len()
    }

    /// Number of connections in the matchmaking slot (0 or 1).
    pub fn waiting_players(&self) -> usize {
        usize::from(self.waiting.is_some())
    }

    /// Number of rooms waiting for a second player.
    pub fn open_rooms(&self) -> usize {
        self.rooms.len()
    }

    /// Number of paired matches.
    pub fn active_matches(&self) -> usize {
        self.pairs.len() / 2
    }

    /// The partner of `conn`, if paired.
    pub fn partner_of(&self, conn: ConnectionId) -> Option<ConnectionId> {
        self.pairs.get(&conn).copied()
    }

    /// Dissolve the pairing of `conn`, if any, and tell the partner.
    fn leave_match(&mut self, conn: ConnectionId) -> Vec<Outbound> {
        match self.pairs.remove(&conn) {
            Some(partner) => {
                self.pairs.remove(&partner);
                tracing::info!("{:?} left its match, notifying {:?}", conn, partner);
                vec![Outbound::new(partner, RelayMessage::OpponentLeft)]
            }
            None => Vec::new(),
        }
    }

    fn start_match(&mut self, dark: ConnectionId, light: ConnectionId) -> Vec<Outbound> {
        if self.waiting == Some(dark) || self.waiting == Some(light) {
            self.waiting = None;
        }
        self.rooms
            .retain(|_, room| room.creator != dark && room.creator != light);
        self.pairs.insert(dark, light);
        self.pairs.insert(light, dark);

        vec![
            Outbound::new(dark, RelayMessage::PlayerAssigned(Player::Dark)),
            Outbound::new(light, RelayMessage::PlayerAssigned(Player::Light)),
            Outbound::new(dark, RelayMessage::GameStarted),
            Outbound::new(light, RelayMessage::GameStarted),
        ]
    }
}
