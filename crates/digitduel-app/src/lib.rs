//! Session facade for digitduel presentation layers.
//!
//! [`GameSession`] is the one component a UI talks to: it starts the game,
//! attaches live notifications, pumps queued payloads through the
//! reconciler, exposes the two user actions (submit guess, leave), and
//! produces [`Snapshot`]s of the reconciled state for rendering.
//!
//! The facade never mutates game state optimistically: a submitted guess
//! reaches the ledger and moves the turn only when the server's
//! turn-outcome notification arrives.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod session;
mod snapshot;

pub use session::{GameSession, SessionInfo, StartConfig, SubmitError};
pub use snapshot::Snapshot;
