//! Client-side reconciliation engine for digitduel sessions.
//!
//! Authoritative game state lives on the server and reaches the client over
//! two independent, unordered channels: request/response calls to the session
//! service and room-scoped push notifications. The [`Reconciler`] merges both
//! into one consistent view of turn ownership, room lifecycle, and guess
//! history, despite duplicates, reordering, and reconnect replays.
//!
//! # Components
//!
//! - [`Reconciler`]: sans-IO state machine; consumes [`ReconcilerEvent`]s and
//!   produces [`ReconcilerEffect`]s for the caller to execute
//! - [`SessionService`]: request/response boundary trait
//! - [`NotificationChannel`] + [`ChannelManager`]: pub/sub boundary with a
//!   reference-counted handle and delivery-time-guarded subscriptions
//! - [`DepartureGuard`]: at-most-once best-effort leave signal

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod channel;
mod departure;
mod reconciler;
mod service;

pub use channel::{ChannelManager, NotificationChannel, Subscription, SubscriptionId, TransportError};
pub use departure::DepartureGuard;
pub use reconciler::{
    NOTICE_TTL, Notice, NoticeKind, Reconciler, ReconcilerEffect, ReconcilerEvent,
};
pub use service::{ServiceError, ServiceOp, SessionService};
