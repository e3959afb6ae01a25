//! Room lifecycle and turn ownership.
//!
//! The arbiter is the single source of truth for "whose turn is it" and the
//! room's lifecycle status. It is mutated only by the reconciler; a stale
//! history fetch can never reach it.
//!
//! # Invariants
//!
//! - Status moves forward only; nothing regresses, and `Completed` is final.
//! - When `InProgress` with a holder set, exactly one of the two
//!   participants holds the turn.

use digitduel_proto::{PlayerId, RoomStatus};

/// Turn and lifecycle state for one room.
///
/// Construction *is* initialization: an arbiter only exists once a start
/// response has been received, which makes "read turn ownership before
/// initialize" unrepresentable rather than a runtime error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnArbiter {
    status: RoomStatus,
    current_player: Option<PlayerId>,
}

impl TurnArbiter {
    /// Initialize from the start/join response.
    pub fn new(status: RoomStatus, current_player: Option<PlayerId>) -> Self {
        Self { status, current_player }
    }

    /// Apply a player-joined announcement.
    ///
    /// When the join moves the room to `InProgress`, no turn holder is set
    /// yet, and the joiner is the *other* participant, the local participant
    /// takes the first turn (the room creator moves first). A second delivery
    /// of the same join is a no-op for turn ownership.
    pub fn apply_join(&mut self, joined_player_id: &str, new_status: RoomStatus, local_player_id: &str) {
        if self.status == RoomStatus::Completed {
            return;
        }
        if new_status > self.status {
            self.status = new_status;
        }
        if self.status == RoomStatus::InProgress
            && self.current_player.is_none()
            && joined_player_id != local_player_id
        {
            self.current_player = Some(local_player_id.to_owned());
        }
    }

    /// Apply the server's turn handoff. The server is authoritative: when a
    /// next holder is present it overwrites unconditionally.
    pub fn apply_turn_outcome(&mut self, next_player_id: Option<PlayerId>) {
        if self.status == RoomStatus::Completed {
            return;
        }
        if let Some(next) = next_player_id {
            self.current_player = Some(next);
        }
    }

    /// Move to `Completed`. Final; all later mutator calls are no-ops.
    pub fn complete(&mut self) {
        self.status = RoomStatus::Completed;
    }

    /// Current lifecycle status.
    pub fn status(&self) -> RoomStatus {
        self.status
    }

    /// Current turn holder, when known.
    pub fn current_player(&self) -> Option<&str> {
        self.current_player.as_deref()
    }

    /// Whether the given participant may submit a guess right now.
    ///
    /// True if and only if the room is `InProgress` and the holder matches.
    pub fn is_turn(&self, player_id: &str) -> bool {
        self.status == RoomStatus::InProgress && self.current_player.as_deref() == Some(player_id)
    }
}
