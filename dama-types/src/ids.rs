//! Identity types for relay connections and private rooms.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::WireError;

/// Length of a room code.
pub const ROOM_CODE_LEN: usize = 6;

const ROOM_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// A unique identifier for one WebSocket connection to the relay.
///
/// UUID v4 format (16 bytes).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(uuid::Uuid);

impl ConnectionId {
    /// Create a new random ConnectionId.
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConnectionId({})", &self.to_string()[..8])
    }
}

/// A private room code: six uppercase ASCII letters or digits.
///
/// Parsing normalizes to uppercase, so `"ab12cd"` and `"AB12CD"` name the
/// same room.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomCode(String);

impl RoomCode {
    /// Generate a random code.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let code = (0..ROOM_CODE_LEN)
            .map(|_| ROOM_CODE_ALPHABET[rng.gen_range(0..ROOM_CODE_ALPHABET.len())] as char)
            .collect();
        Self(code)
    }

    /// Parse and normalize a user-supplied code.
    pub fn parse(raw: &str) -> Result<Self, WireError> {
        let code = raw.trim().to_ascii_uppercase();
        if code.len() == ROOM_CODE_LEN && code.bytes().all(|b| b.is_ascii_alphanumeric()) {
            Ok(Self(code))
        } else {
            Err(WireError::InvalidRoomCode(raw.to_string()))
        }
    }

    /// The code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RoomCode {
    type Error = WireError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RoomCode> for String {
    fn from(code: RoomCode) -> Self {
        code.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RoomCode({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn connection_ids_are_unique() {
        assert_ne!(ConnectionId::random(), ConnectionId::random());
    }

    #[test]
    fn connection_id_debug_is_short() {
        let id = ConnectionId::random();
        let debug = format!("{:?}", id);
        assert!(debug.starts_with("ConnectionId("));
        assert_eq!(debug.len(), "ConnectionId(".len() + 8 + 1);
    }

    #[test]
    fn generated_codes_are_well_formed() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..100 {
            let code = RoomCode::generate(&mut rng);
            assert_eq!(code.as_str().len(), ROOM_CODE_LEN);
            assert!(code
                .as_str()
                .bytes()
                .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit()));
            assert_eq!(RoomCode::parse(code.as_str()).unwrap(), code);
        }
    }

    #[test]
    fn parse_normalizes_case() {
        let code = RoomCode::parse("ab12cd").unwrap();
        assert_eq!(code.as_str(), "AB12CD");
        assert_eq!(code, RoomCode::parse(" AB12CD ").unwrap());
    }

    #[test]
    fn parse_rejects_bad_codes() {
        assert!(RoomCode::parse("ABC").is_err());
        assert!(RoomCode::parse("ABCDEFG").is_err());
        assert!(RoomCode::parse("AB-12C").is_err());
        assert!(RoomCode::parse("").is_err());
    }

    #[test]
    fn room_code_is_a_json_string() {
        let code = RoomCode::parse("XY98ZZ").unwrap();
        assert_eq!(serde_json::to_string(&code).unwrap(), r#""XY98ZZ""#);
        let back: RoomCode = serde_json::from_str(r#""xy98zz""#).unwrap();
        assert_eq!(back, code);
        assert!(serde_json::from_str::<RoomCode>(r#""nope""#).is_err());
    }
}
