//! Observable session state.
//!
//! The snapshot is the "view model" handed to the presentation layer: the
//! subset of reconciled state needed for rendering, with the local player's
//! history already partitioned from the opponent's.

use digitduel_client::Notice;
use digitduel_proto::{GuessRecord, PlayerId, RoomStatus};

/// One consistent view of the session, produced by
/// [`GameSession::snapshot`](crate::GameSession::snapshot).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Room lifecycle status.
    pub room_status: RoomStatus,
    /// Whether the local participant may submit a guess right now.
    /// Always false once the room is completed.
    pub my_turn: bool,
    /// Current turn holder, when known.
    pub current_player_id: Option<PlayerId>,
    /// The local participant's guesses, in arrival order.
    pub mine: Vec<GuessRecord>,
    /// The opponent's guesses, in arrival order.
    pub theirs: Vec<GuessRecord>,
    /// Unexpired transient notice, if any.
    pub notice: Option<Notice>,
    /// Digit count guesses must have at this session's level.
    pub expected_digits: usize,
    /// Still waiting for an opponent to join.
    pub waiting_for_opponent: bool,
    /// Live notifications are unavailable; state only advances via
    /// request/response calls. The UI should indicate this.
    pub degraded: bool,
}
