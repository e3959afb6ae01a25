//! At-most-once departure signaling.
//!
//! The "participant is leaving" signal fires from two places: the explicit
//! leave action, and a best-effort hook when the hosting process is about to
//! terminate. Both paths share one guard so the signal fires at most once per
//! session and never after the room has completed.

use digitduel_proto::{EndRequest, GameId, PlayerId};

use crate::service::{ServiceError, SessionService};

/// Guard flag for the participant-departure signal.
#[derive(Debug, Default)]
pub struct DepartureGuard {
    fired: bool,
}

impl DepartureGuard {
    /// Create an unarmed guard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the signal has already fired.
    pub fn has_fired(&self) -> bool {
        self.fired
    }

    /// Fire the departure signal if it has not fired and the room is not
    /// completed. Returns whether the signal was actually sent.
    ///
    /// Best-effort: a service failure is logged, and the guard still latches
    /// so terminate-time hooks cannot retry into a double send.
    pub async fn fire<S: SessionService>(
        &mut self,
        service: &S,
        game_id: &GameId,
        player_id: &PlayerId,
        completed: bool,
    ) -> bool {
        if self.fired || completed {
            return false;
        }
        self.fired = true;

        let request = EndRequest { game_id: game_id.clone(), player_id: player_id.clone() };
        match service.end(request).await {
            Ok(_) => true,
            Err(ServiceError { message, .. }) => {
                tracing::warn!(%message, "departure signal failed");
                true
            },
        }
    }
}
