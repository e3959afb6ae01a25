//! The game session facade.

use std::sync::Arc;

use digitduel_client::{
    ChannelManager, DepartureGuard, NotificationChannel, Reconciler, ReconcilerEffect,
    ReconcilerEvent, ServiceError, SessionService, Subscription, TransportError,
};
use digitduel_core::{Environment, ValidationError, validate};
use digitduel_proto::{
    GameId, GameMode, GuessRequest, HistoryRequest, Level, PlayerId, RoomId, RoomStatus,
    StartRequest, classify,
};
use thiserror::Error;

use crate::Snapshot;

/// Caller-supplied configuration for starting a game.
#[derive(Debug, Clone)]
pub struct StartConfig {
    /// The local participant's chosen identity.
    pub player_id: PlayerId,
    /// Difficulty tier.
    pub level: Level,
    /// Multiplayer or solo.
    pub game_mode: GameMode,
    /// Whether the server should cap the number of guesses.
    pub limit_attempts: bool,
    /// Join this existing room; `None` creates a fresh one.
    pub room_id: Option<RoomId>,
    /// Caller-chosen secret; `None` lets the server generate one.
    pub secret_number: Option<u64>,
}

/// Immutable identity of a running session, fixed at game start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    /// Identifier of the game.
    pub game_id: GameId,
    /// Room hosting the game.
    pub room_id: RoomId,
    /// The local participant's identity.
    pub player_id: PlayerId,
    /// Difficulty tier.
    pub level: Level,
    /// Mode the session was started in.
    pub game_mode: GameMode,
    /// Whether attempts are capped.
    pub limit_attempts: bool,
    /// The secret the local participant is defending.
    pub secret_number: String,
}

/// Why a guess submission was rejected.
///
/// Every variant except `Service` is raised locally, before any network
/// call is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    /// Input failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// It is not the local participant's turn.
    #[error("it's not your turn")]
    NotYourTurn,

    /// The game is already over.
    #[error("the game is over")]
    Completed,

    /// A previous submission is still in flight.
    #[error("a guess is already being submitted")]
    AlreadySubmitting,

    /// The session service rejected the guess.
    #[error(transparent)]
    Service(#[from] ServiceError),
}

/// The component the presentation layer talks to.
///
/// Owns the immutable [`SessionInfo`], the reconciler, and the channel
/// subscription. All state mutation flows through [`pump`](Self::pump); the
/// UI renders [`Snapshot`]s and calls the two actions.
pub struct GameSession<S, C, E>
where
    S: SessionService,
    C: NotificationChannel,
    E: Environment,
{
    info: SessionInfo,
    service: S,
    env: E,
    reconciler: Reconciler<E::Instant>,
    channel: Option<Arc<ChannelManager<C>>>,
    subscription: Option<Subscription>,
    departure: DepartureGuard,
    degraded: bool,
    submitting: bool,
}

impl<S, C, E> GameSession<S, C, E>
where
    S: SessionService,
    C: NotificationChannel,
    E: Environment,
{
    /// Start a game: call the session service, fix the session identity,
    /// and seed the reconciler from the response.
    pub async fn start(service: S, env: E, config: StartConfig) -> Result<Self, ServiceError> {
        let request = StartRequest {
            game_mode: config.game_mode,
            player_id: config.player_id,
            level: config.level,
            limit_attempts: config.limit_attempts,
            room_id: config.room_id,
            secret_number: config.secret_number,
        };
        let response = service.start(request).await?;

        let info = SessionInfo {
            game_id: response.game_id,
            room_id: response.room_id,
            player_id: response.player_id,
            level: response.level,
            game_mode: config.game_mode,
            limit_attempts: config.limit_attempts,
            secret_number: response.secret_number,
        };
        tracing::info!(room_id = %info.room_id, player_id = %info.player_id, "game started");

        let mut reconciler = Reconciler::new(info.player_id.clone());
        let effects = reconciler.handle(ReconcilerEvent::GameStarted {
            status: response.room_status,
            current_player_id: response.current_player_id,
            game_mode: config.game_mode,
        });

        let mut session = Self {
            info,
            service,
            env,
            reconciler,
            channel: None,
            subscription: None,
            departure: DepartureGuard::new(),
            degraded: false,
            submitting: false,
        };
        session.run_effects(effects).await;
        Ok(session)
    }

    /// Attach live notifications through the shared channel manager.
    ///
    /// Only multiplayer sessions subscribe. Transport failure is not fatal:
    /// the session continues degraded, advancing only via request/response
    /// calls, and the snapshot reports it.
    pub async fn attach_notifications(&mut self, channel: Arc<ChannelManager<C>>) {
        if self.info.game_mode != GameMode::Multiplayer {
            return;
        }
        match Self::open_subscription(&channel, &self.info.room_id).await {
            Ok(subscription) => {
                self.subscription = Some(subscription);
                self.channel = Some(channel);
                self.degraded = false;
            },
            Err(error) => {
                tracing::warn!(%error, "continuing without live notifications");
                self.degraded = true;
            },
        }
    }

    async fn open_subscription(
        channel: &ChannelManager<C>,
        room_id: &RoomId,
    ) -> Result<Subscription, TransportError> {
        channel.connect().await?;
        match channel.subscribe(room_id).await {
            Ok(subscription) => Ok(subscription),
            Err(error) => {
                // Release the connect slot we claimed.
                channel.disconnect().await;
                Err(error)
            },
        }
    }

    /// Drain queued notifications through the reconciler and advance timers.
    ///
    /// Call once per UI frame or poll interval. Unclassifiable payloads are
    /// dropped and logged, never surfaced.
    pub async fn pump(&mut self) {
        let mut effects = Vec::new();
        while let Some(payload) = self.subscription.as_mut().and_then(Subscription::try_recv) {
            match classify(&payload) {
                Ok(event) => {
                    let now = self.env.now();
                    effects.extend(self.reconciler.handle(ReconcilerEvent::Notification {
                        event,
                        now,
                    }));
                },
                Err(error) => {
                    tracing::debug!(%error, "dropping unclassifiable notification");
                },
            }
        }
        self.run_effects(effects).await;

        let now = self.env.now();
        self.reconciler.handle(ReconcilerEvent::Tick { now });
    }

    async fn run_effects(&mut self, effects: Vec<ReconcilerEffect>) {
        for effect in effects {
            match effect {
                ReconcilerEffect::FetchHistory => {
                    let request = HistoryRequest { room_id: self.info.room_id.clone() };
                    match self.service.history(request).await {
                        Ok(records) => {
                            self.reconciler.handle(ReconcilerEvent::HistoryFetched(records));
                        },
                        Err(error) => {
                            // Backfill is best-effort; notifications plus the
                            // idempotent merge will converge regardless.
                            tracing::warn!(%error, "history backfill failed");
                        },
                    }
                },
            }
        }
    }

    /// Submit a guess.
    ///
    /// Validates locally, checks turn ownership, then calls the session
    /// service. Deliberately does NOT mutate the arbiter or ledger: the
    /// authoritative update arrives via the turn-outcome notification.
    pub async fn submit_guess(&mut self, input: &str) -> Result<(), SubmitError> {
        if self.submitting {
            return Err(SubmitError::AlreadySubmitting);
        }
        let guess = validate(input, self.info.level.digits())?;
        if self.reconciler.status() == Some(RoomStatus::Completed) {
            return Err(SubmitError::Completed);
        }
        if !self.reconciler.my_turn() {
            return Err(SubmitError::NotYourTurn);
        }

        let request = GuessRequest {
            game_id: self.info.game_id.clone(),
            player_id: self.info.player_id.clone(),
            guess: guess.to_owned(),
        };
        self.submitting = true;
        let result = self.service.guess(request).await;
        self.submitting = false;

        // Response fields beyond success are ignored; the turn switches when
        // the notification lands.
        result?;
        Ok(())
    }

    /// Leave the game explicitly: fire the departure signal, then release
    /// the subscription and the shared channel.
    pub async fn leave(&mut self) {
        self.signal_departure().await;
        self.detach().await;
    }

    /// Best-effort departure signal for process-termination hooks.
    ///
    /// Shares the at-most-once guard with [`leave`](Self::leave) and is
    /// suppressed once the room has completed.
    pub async fn signal_departure(&mut self) {
        let completed = self.reconciler.status() == Some(RoomStatus::Completed);
        self.departure
            .fire(&self.service, &self.info.game_id, &self.info.player_id, completed)
            .await;
    }

    async fn detach(&mut self) {
        if let Some(channel) = self.channel.take() {
            if let Some(mut subscription) = self.subscription.take() {
                channel.unsubscribe(&mut subscription).await;
            }
            channel.disconnect().await;
        }
    }

    /// One consistent view of the session for rendering.
    pub fn snapshot(&self) -> Snapshot {
        let ledger = self.reconciler.ledger();
        let mine = ledger.all_for(&self.info.player_id).cloned().collect();
        let theirs = ledger
            .records()
            .iter()
            .filter(|r| r.player_id != self.info.player_id)
            .cloned()
            .collect();

        Snapshot {
            room_status: self.reconciler.status().unwrap_or(RoomStatus::WaitingForPlayer),
            my_turn: self.reconciler.my_turn(),
            current_player_id: self.reconciler.current_player().map(str::to_owned),
            mine,
            theirs,
            notice: self.reconciler.notice().cloned(),
            expected_digits: self.info.level.digits(),
            waiting_for_opponent: self.reconciler.waiting_for_opponent(),
            degraded: self.degraded,
        }
    }

    /// The immutable session identity.
    pub fn info(&self) -> &SessionInfo {
        &self.info
    }
}
