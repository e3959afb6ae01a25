//! Notification payload classification.
//!
//! The channel delivers raw JSON objects whose shape is not tagged; the three
//! event kinds are discriminated by which fields are present. Because a
//! payload may satisfy more than one shape, [`classify`] checks in a fixed
//! precedence order, first match wins:
//!
//! 1. `status == "COMPLETED"` → [`GameCompleted`]
//! 2. `joinedPlayerId` present → [`PlayerJoined`]
//! 3. `guessedNumber` present (including the literal `0`) → [`TurnOutcome`]
//! 4. otherwise → [`ClassificationError::UnknownShape`]
//!
//! The ordering is load-bearing: a completion message must preempt any
//! join or turn interpretation even when it incidentally carries their
//! fields.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::session::{PlayerId, RoomStatus, digit_string};

/// Another participant joined the room.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerJoined {
    /// Identity of the participant who joined.
    pub joined_player_id: PlayerId,
    /// Room status after the join.
    pub status: RoomStatus,
    /// Human-readable announcement.
    #[serde(default)]
    pub message: String,
}

/// A guess was adjudicated and the turn may have moved.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnOutcome {
    /// Who guessed.
    pub player_id: PlayerId,
    /// The guessed digit string.
    #[serde(deserialize_with = "digit_string")]
    pub guessed_number: String,
    /// How many digits matched.
    pub correct_digits: u8,
    /// Monotonic per-room sequence number; the dedup key.
    pub guess_number: u32,
    /// Next turn holder, when the server includes one.
    #[serde(default)]
    pub current_player_id: Option<PlayerId>,
    /// Guesses the acting player has left, when attempts are limited.
    #[serde(default)]
    pub remaining_attempts: Option<u32>,
    /// Human-readable announcement.
    #[serde(default)]
    pub message: String,
}

/// The game reached its terminal state.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameCompleted {
    /// Human-readable game-over announcement.
    #[serde(default)]
    pub message: String,
}

/// A classified room notification.
///
/// Ephemeral: exists only for the duration of dispatch, then is either
/// discarded or folded into durable state by the reconciler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationEvent {
    /// Another participant joined.
    PlayerJoined(PlayerJoined),
    /// A guess was adjudicated.
    TurnOutcome(TurnOutcome),
    /// The game is over.
    GameCompleted(GameCompleted),
}

/// Why a payload could not be classified.
///
/// Never fatal and never surfaced to the presentation layer; callers log
/// and drop.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassificationError {
    /// Payload matched none of the three event shapes.
    #[error("notification payload matches no known shape")]
    UnknownShape,

    /// Payload matched a shape but its fields failed to parse.
    #[error("malformed {shape} notification: {reason}")]
    Malformed {
        /// Which shape was selected by the precedence check.
        shape: &'static str,
        /// Parse failure detail.
        reason: String,
    },
}

/// Classify a raw notification payload into one of the three event kinds.
pub fn classify(payload: &Value) -> Result<NotificationEvent, ClassificationError> {
    let object = payload.as_object().ok_or(ClassificationError::UnknownShape)?;

    if object.get("status").and_then(Value::as_str) == Some("COMPLETED") {
        return parse("GameCompleted", payload).map(NotificationEvent::GameCompleted);
    }
    if object.contains_key("joinedPlayerId") {
        return parse("PlayerJoined", payload).map(NotificationEvent::PlayerJoined);
    }
    if object.contains_key("guessedNumber") {
        return parse("TurnOutcome", payload).map(NotificationEvent::TurnOutcome);
    }

    Err(ClassificationError::UnknownShape)
}

fn parse<T: for<'de> Deserialize<'de>>(
    shape: &'static str,
    payload: &Value,
) -> Result<T, ClassificationError> {
    serde_json::from_value(payload.clone())
        .map_err(|e| ClassificationError::Malformed { shape, reason: e.to_string() })
}
