//! Pure domain state for digitduel.
//!
//! Everything here is sans-IO and single-threaded by design: the engine's
//! concurrency model is cooperative, so these types are mutated only from
//! interleaved handlers on one logical thread and need no locks.
//!
//! # Components
//!
//! - [`validate`]: guess validation against level-derived digit constraints
//! - [`HistoryLedger`]: append-only, deduplicated guess history
//! - [`TurnArbiter`]: room lifecycle and turn ownership
//! - [`Environment`]: time abstraction for deterministic tests

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod env;
mod history;
mod turn;
mod validate;

pub use env::{Environment, SystemEnv};
pub use history::HistoryLedger;
pub use turn::TurnArbiter;
pub use validate::{ValidationError, validate};
