//! Session service request/response bodies.
//!
//! One struct per operation side, mirroring the server's JSON contract:
//! `start`, `guess`, `history`, `end`. Optional request fields are omitted
//! from the body entirely rather than sent as `null`, which is what the
//! server expects.
//!
//! # Invariants
//!
//! - Unknown response fields are ignored on deserialization. The `guess`
//!   response in particular carries extra fields the engine does not consume;
//!   the authoritative turn update arrives via the notification channel.

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Participant identity as assigned at game start (the player's chosen name).
pub type PlayerId = String;

/// Server-side pairing context hosting exactly two participants.
pub type RoomId = String;

/// Identifier of one game within a room.
pub type GameId = String;

/// Room lifecycle status.
///
/// Ordered: transitions are monotonic forward, and nothing regresses from
/// `Completed`. The derived `Ord` follows lifecycle order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoomStatus {
    /// Room created, first participant waiting for an opponent.
    WaitingForPlayer,
    /// Both participants present, guesses being exchanged.
    InProgress,
    /// Game over. Terminal.
    Completed,
}

/// Game mode selected at start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameMode {
    /// Two participants sharing a room.
    Multiplayer,
    /// Solo play against the server.
    Single,
}

/// Difficulty tier fixing the digit count of secrets and guesses.
///
/// The level table is fixed and not externally configurable:
/// level 1 maps to 2 digits, level 2 to 3, level 3 to 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Level {
    /// 2-digit numbers.
    One,
    /// 3-digit numbers.
    Two,
    /// 4-digit numbers.
    Three,
}

impl Level {
    /// Digit count of secrets and guesses at this level.
    pub fn digits(self) -> usize {
        match self {
            Level::One => 2,
            Level::Two => 3,
            Level::Three => 4,
        }
    }
}

/// Error for out-of-range level numbers on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid level {0}, expected 1..=3")]
pub struct LevelError(pub u8);

impl TryFrom<u8> for Level {
    type Error = LevelError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Level::One),
            2 => Ok(Level::Two),
            3 => Ok(Level::Three),
            other => Err(LevelError(other)),
        }
    }
}

impl From<Level> for u8 {
    fn from(level: Level) -> Self {
        match level {
            Level::One => 1,
            Level::Two => 2,
            Level::Three => 3,
        }
    }
}

/// One guess and its outcome, as recorded by the server.
///
/// Immutable once created. The pair (`player_id`, `guess_number`) is the
/// dedup identity: guessed values legitimately repeat across turns, the
/// per-room sequence number does not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuessRecord {
    /// Who guessed.
    pub player_id: PlayerId,
    /// The guessed digit string.
    #[serde(deserialize_with = "digit_string")]
    pub guessed_number: String,
    /// How many digits matched.
    pub correct_digits: u8,
    /// Monotonic per-room sequence number.
    pub guess_number: u32,
}

/// Request body for `start`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRequest {
    /// Multiplayer or solo.
    pub game_mode: GameMode,
    /// The local participant's chosen identity.
    pub player_id: PlayerId,
    /// Difficulty tier.
    pub level: Level,
    /// Whether the server should cap the number of guesses.
    pub limit_attempts: bool,
    /// Join this existing room instead of creating a new one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_id: Option<RoomId>,
    /// Caller-chosen secret number; server generates one when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_number: Option<u64>,
}

/// Response body for `start`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartResponse {
    /// Identifier of the created or joined game.
    pub game_id: GameId,
    /// Room hosting this game; fresh when no `room_id` was requested.
    pub room_id: RoomId,
    /// Echo of the local participant's identity.
    pub player_id: PlayerId,
    /// Turn holder, when the server already knows one (joining player path).
    #[serde(default)]
    pub current_player_id: Option<PlayerId>,
    /// Room lifecycle status after this start.
    pub room_status: RoomStatus,
    /// The secret the local participant is defending.
    #[serde(deserialize_with = "digit_string")]
    pub secret_number: String,
    /// Difficulty tier, echoed.
    pub level: Level,
}

/// Request body for `guess`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuessRequest {
    /// Game being played.
    pub game_id: GameId,
    /// Who is guessing.
    pub player_id: PlayerId,
    /// The guessed digit string.
    pub guess: String,
}

/// Response body for `guess`.
///
/// Only `status` is consumed; the authoritative turn handoff and the guess
/// outcome arrive via the notification channel.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuessResponse {
    /// Room lifecycle status after the guess.
    pub status: RoomStatus,
}

/// Request body for `history`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRequest {
    /// Room whose guess history to fetch.
    pub room_id: RoomId,
}

/// Request body for `end`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndRequest {
    /// Game being ended.
    pub game_id: GameId,
    /// The departing participant.
    pub player_id: PlayerId,
}

/// Acknowledgement body for `end`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndResponse {
    /// Optional human-readable acknowledgement.
    #[serde(default)]
    pub message: Option<String>,
}

/// Accept a digit value sent either as a JSON string or a JSON number.
///
/// Servers have been observed sending both forms for guessed numbers and
/// secrets; normalize to the string form.
pub(crate) fn digit_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(u64),
        Str(String),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Num(n) => n.to_string(),
        Raw::Str(s) => s,
    })
}
