//! Session service boundary.
//!
//! The engine never opens HTTP connections itself; callers supply an
//! implementation of [`SessionService`]. Errors carry the server-provided
//! message verbatim when one exists, falling back to a fixed default string
//! per operation, and that message is what the presentation layer shows.

use async_trait::async_trait;
use digitduel_proto::{
    EndRequest, EndResponse, GuessRecord, GuessRequest, GuessResponse, HistoryRequest,
    StartRequest, StartResponse,
};
use thiserror::Error;

/// The four session service operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceOp {
    /// Create or join a room.
    Start,
    /// Submit a guess.
    Guess,
    /// Fetch a room's guess history.
    History,
    /// Signal departure.
    End,
}

impl ServiceOp {
    /// Fixed fallback message shown when the server supplies none.
    pub fn fallback_message(self) -> &'static str {
        match self {
            ServiceOp::Start => "Failed to start game",
            ServiceOp::Guess => "Failed to submit guess",
            ServiceOp::History => "Failed to get guess history",
            ServiceOp::End => "Failed to end game",
        }
    }
}

/// A failed session service call.
///
/// Recoverable: the operation may be retried by the user. Displays the
/// server's message verbatim, or the operation's fixed fallback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ServiceError {
    /// Which operation failed.
    pub op: ServiceOp,
    /// Message surfaced to the presentation layer.
    pub message: String,
}

impl ServiceError {
    /// Build from an optional server-provided message.
    pub fn new(op: ServiceOp, message: Option<String>) -> Self {
        let message = message
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| op.fallback_message().to_owned());
        Self { op, message }
    }
}

/// Request/response operations against the game server.
///
/// Implementations perform the actual transport (HTTP in production,
/// in-memory fakes in tests). All four operations fail with a
/// message-bearing [`ServiceError`] on non-success.
#[async_trait]
pub trait SessionService: Send + Sync {
    /// Create a new room or join an existing one.
    async fn start(&self, request: StartRequest) -> Result<StartResponse, ServiceError>;

    /// Submit a guess. The authoritative outcome arrives via notification.
    async fn guess(&self, request: GuessRequest) -> Result<GuessResponse, ServiceError>;

    /// Fetch the ordered guess history of a room.
    async fn history(&self, request: HistoryRequest) -> Result<Vec<GuessRecord>, ServiceError>;

    /// Signal that the local participant is leaving.
    async fn end(&self, request: EndRequest) -> Result<EndResponse, ServiceError>;
}
