//! Wire types for the digitduel session service and notification channel.
//!
//! The session service speaks request/response JSON; the notification channel
//! delivers room-scoped JSON payloads with no ordering or exactly-once
//! guarantee. Both use the same camelCase field names as the server, so all
//! structs here carry `serde(rename_all = "camelCase")`.
//!
//! Notification payloads are not self-describing: the three event shapes are
//! discriminated structurally by which fields are present. That logic lives in
//! [`notify::classify`] and its precedence order is load-bearing (see module
//! docs).

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod notify;
pub mod session;

pub use notify::{ClassificationError, GameCompleted, NotificationEvent, PlayerJoined, TurnOutcome, classify};
pub use session::{
    EndRequest, EndResponse, GameId, GameMode, GuessRecord, GuessRequest, GuessResponse,
    HistoryRequest, Level, LevelError, PlayerId, RoomId, RoomStatus, StartRequest, StartResponse,
};
