//! Notification channel lifecycle.
//!
//! One channel handle exists per process and is shared by whoever needs it.
//! [`ChannelManager`] reference-counts logical connects so overlapping
//! sessions can request and release the handle without tearing down a channel
//! still in use; double-disconnect is a safe no-op.
//!
//! Subscriptions are cancelled with a guard flag checked at delivery time,
//! not by the transport unsubscribe alone: payloads already queued when the
//! subscription is cancelled never reach the reconciler.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use digitduel_proto::RoomId;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;

/// Transport-level channel failures.
///
/// Never fatal: a session continues without live notifications in a degraded
/// state, and the presentation layer indicates it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Channel connection failed.
    #[error("notification channel connection failed: {0}")]
    Connect(String),

    /// Room subscription failed.
    #[error("room subscription failed: {0}")]
    Subscribe(String),
}

/// Identifier for one transport-level subscription.
pub type SubscriptionId = u64;

/// Publish/subscribe transport delivering room-scoped JSON payloads.
///
/// Implementations own the socket; the engine only sees payloads pushed into
/// the `mpsc` sink handed to [`subscribe`](NotificationChannel::subscribe).
/// Delivery is assumed neither ordered nor exactly-once.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Establish the underlying channel. Idempotent at the transport's
    /// discretion; [`ChannelManager`] already guarantees it is called once
    /// per physical connection.
    async fn connect(&self) -> Result<(), TransportError>;

    /// Subscribe to a room's topic, pushing each payload into `sink`.
    async fn subscribe(
        &self,
        room_id: &RoomId,
        sink: mpsc::UnboundedSender<Value>,
    ) -> Result<SubscriptionId, TransportError>;

    /// Best-effort transport unsubscribe. Queued payloads may still arrive;
    /// the [`Subscription`] guard flag is what stops delivery.
    async fn unsubscribe(&self, id: SubscriptionId);

    /// Tear down the underlying channel. Safe when already disconnected.
    async fn disconnect(&self);
}

/// A live room subscription with delivery-time cancellation.
///
/// Receiving checks the cancellation flag first, so a payload queued before
/// [`cancel`](Subscription::cancel) can never be observed afterwards.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,
    rx: mpsc::UnboundedReceiver<Value>,
    active: bool,
}

impl Subscription {
    /// Transport-level identifier of this subscription.
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Pop the next queued payload without waiting. `None` when the queue is
    /// empty or the subscription has been cancelled.
    pub fn try_recv(&mut self) -> Option<Value> {
        if !self.active {
            return None;
        }
        self.rx.try_recv().ok()
    }

    /// Wait for the next payload. `None` once cancelled or the sender side
    /// is gone.
    pub async fn recv(&mut self) -> Option<Value> {
        if !self.active {
            return None;
        }
        self.rx.recv().await
    }

    /// Stop delivery immediately. Safe to call any number of times.
    pub fn cancel(&mut self) {
        self.active = false;
        self.rx.close();
    }
}

/// Process-wide owner of the shared channel handle.
///
/// Counts logical connects: the transport connects on 0→1 and disconnects on
/// 1→0. A second `connect` while connected resolves immediately, and extra
/// `disconnect` calls saturate at zero.
pub struct ChannelManager<C: NotificationChannel> {
    channel: C,
    users: AtomicUsize,
}

impl<C: NotificationChannel> ChannelManager<C> {
    /// Wrap a transport in a manager. No connection is made yet.
    pub fn new(channel: C) -> Self {
        Self { channel, users: AtomicUsize::new(0) }
    }

    /// Acquire the shared channel, connecting the transport on first use.
    pub async fn connect(&self) -> Result<(), TransportError> {
        if self.users.fetch_add(1, Ordering::SeqCst) > 0 {
            return Ok(());
        }
        match self.channel.connect().await {
            Ok(()) => Ok(()),
            Err(e) => {
                // Failed first connect releases the slot it claimed.
                self.users.fetch_sub(1, Ordering::SeqCst);
                Err(e)
            },
        }
    }

    /// Subscribe to a room's topic.
    pub async fn subscribe(&self, room_id: &RoomId) -> Result<Subscription, TransportError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.channel.subscribe(room_id, tx).await?;
        Ok(Subscription { id, rx, active: true })
    }

    /// Cancel a subscription: guard flag first, then best-effort transport
    /// unsubscribe. Safe to call repeatedly.
    pub async fn unsubscribe(&self, subscription: &mut Subscription) {
        subscription.cancel();
        self.channel.unsubscribe(subscription.id).await;
    }

    /// Release the shared channel, tearing down the transport when the last
    /// user leaves. A disconnect without a matching connect is a no-op.
    pub async fn disconnect(&self) {
        let released = self
            .users
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok_and(|previous| previous == 1);
        if released {
            self.channel.disconnect().await;
        } else {
            tracing::debug!("channel disconnect with remaining users or none connected");
        }
    }

    /// Number of logical users currently holding the channel.
    pub fn user_count(&self) -> usize {
        self.users.load(Ordering::SeqCst)
    }
}
