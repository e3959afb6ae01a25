//! The reconciliation state machine.
//!
//! Merges session service responses and classified notifications into the
//! turn arbiter and history ledger. This is a pure state machine in the
//! action pattern: it consumes [`ReconcilerEvent`]s, mutates its owned state,
//! and returns [`ReconcilerEffect`]s for the caller to execute. Time is
//! passed in as an instant parameter, never read from a clock, so the
//! machine runs identically under virtual time.
//!
//! # Invariants
//!
//! - Only `GameStarted` and `Notification` events move turn ownership; a
//!   history fetch is a monotone union into the ledger and can never
//!   overwrite the arbiter.
//! - Duplicate notification delivery (reconnect replay) never duplicates
//!   history: inserts are idempotent on (`player_id`, `guess_number`).
//! - Once the room is `Completed`, every handler entry short-circuits: no
//!   state mutation of any kind afterwards.

use std::{ops::Sub, time::Duration};

use digitduel_core::{HistoryLedger, TurnArbiter};
use digitduel_proto::{
    GameCompleted, GameMode, GuessRecord, NotificationEvent, PlayerId, RoomStatus, TurnOutcome,
};

/// How long a transient notice stays visible. Fixed, not configurable, and
/// independent of network timing.
pub const NOTICE_TTL: Duration = Duration::from_secs(5);

/// What a transient notice announces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoticeKind {
    /// The opponent joined the room.
    PlayerJoined,
    /// A guess was adjudicated.
    TurnOutcome {
        /// The guessed digit string.
        guessed_number: String,
        /// How many digits matched.
        correct_digits: u8,
        /// Remaining attempts of the acting player, when limited.
        remaining_attempts: Option<u32>,
    },
    /// Terminal game-over announcement. Never expires.
    GameOver,
}

/// UI-facing echo of the most recent notification.
///
/// Presentation-only: never persisted and never deduplicated against
/// history. Expires [`NOTICE_TTL`] after posting, except [`NoticeKind::GameOver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// What happened.
    pub kind: NoticeKind,
    /// Human-readable announcement from the server.
    pub message: String,
}

/// A posted notice plus its posting time. `posted_at == None` marks the
/// terminal notice, which never expires.
#[derive(Debug, Clone)]
struct PostedNotice<I> {
    notice: Notice,
    posted_at: Option<I>,
}

/// Inputs to the reconciler.
#[derive(Debug, Clone)]
pub enum ReconcilerEvent<I> {
    /// The session service's start/join response arrived. Sent exactly once,
    /// before any notification is fed in.
    GameStarted {
        /// Room status from the response.
        status: RoomStatus,
        /// Turn holder from the response, when the server knows one.
        current_player_id: Option<PlayerId>,
        /// Mode the session was started in.
        game_mode: GameMode,
    },

    /// A classified room notification was delivered.
    Notification {
        /// The classified event.
        event: NotificationEvent,
        /// Delivery time, used to timestamp transient notices.
        now: I,
    },

    /// A history backfill response arrived.
    HistoryFetched(Vec<GuessRecord>),

    /// Time tick for notice expiry.
    Tick {
        /// Current time from the environment.
        now: I,
    },
}

/// Effects the caller must execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcilerEffect {
    /// Fetch the room's guess history and feed it back as
    /// [`ReconcilerEvent::HistoryFetched`]. Emitted exactly when the local
    /// view transitions into `InProgress`, to backfill guesses made before
    /// the subscription existed.
    FetchHistory,
}

/// Client-side reconciliation state machine for one session.
///
/// Owns the turn arbiter, the history ledger, and the transient-notice slot.
/// No other component mutates them.
#[derive(Debug, Clone)]
pub struct Reconciler<I> {
    player_id: PlayerId,
    arbiter: Option<TurnArbiter>,
    ledger: HistoryLedger,
    notice: Option<PostedNotice<I>>,
    waiting_for_opponent: bool,
}

impl<I: Copy + Ord + Sub<Output = Duration>> Reconciler<I> {
    /// Create a reconciler for the local participant.
    pub fn new(player_id: PlayerId) -> Self {
        Self {
            player_id,
            arbiter: None,
            ledger: HistoryLedger::new(),
            notice: None,
            waiting_for_opponent: false,
        }
    }

    /// Process one event and return effects for the caller to execute.
    pub fn handle(&mut self, event: ReconcilerEvent<I>) -> Vec<ReconcilerEffect> {
        match event {
            ReconcilerEvent::GameStarted { status, current_player_id, game_mode } => {
                self.on_game_started(status, current_player_id, game_mode)
            },
            ReconcilerEvent::Notification { event, now } => self.on_notification(event, now),
            ReconcilerEvent::HistoryFetched(records) => self.on_history_fetched(records),
            ReconcilerEvent::Tick { now } => {
                self.expire_notice(now);
                vec![]
            },
        }
    }

    fn on_game_started(
        &mut self,
        status: RoomStatus,
        current_player_id: Option<PlayerId>,
        game_mode: GameMode,
    ) -> Vec<ReconcilerEffect> {
        self.arbiter = Some(TurnArbiter::new(status, current_player_id));
        self.waiting_for_opponent =
            game_mode == GameMode::Multiplayer && status == RoomStatus::WaitingForPlayer;

        // A joining player's start response is already InProgress: that is
        // the local transition into the active game, so backfill runs here.
        if status == RoomStatus::InProgress {
            vec![ReconcilerEffect::FetchHistory]
        } else {
            vec![]
        }
    }

    fn on_notification(&mut self, event: NotificationEvent, now: I) -> Vec<ReconcilerEffect> {
        if self.is_completed() {
            tracing::debug!("dropping notification for completed room");
            return vec![];
        }
        let Some(arbiter) = self.arbiter.as_mut() else {
            // Callers must feed GameStarted before subscribing.
            debug_assert!(false, "notification before GameStarted");
            tracing::error!("dropping notification delivered before GameStarted");
            return vec![];
        };

        match event {
            NotificationEvent::PlayerJoined(joined) => {
                let was_in_progress = arbiter.status() == RoomStatus::InProgress;
                arbiter.apply_join(&joined.joined_player_id, joined.status, &self.player_id);
                self.waiting_for_opponent = false;
                self.post_notice(Notice { kind: NoticeKind::PlayerJoined, message: joined.message }, now);

                if !was_in_progress && self.status() == Some(RoomStatus::InProgress) {
                    vec![ReconcilerEffect::FetchHistory]
                } else {
                    vec![]
                }
            },
            NotificationEvent::TurnOutcome(outcome) => {
                self.apply_turn_outcome(outcome, now);
                vec![]
            },
            NotificationEvent::GameCompleted(GameCompleted { message }) => {
                arbiter.complete();
                self.waiting_for_opponent = false;
                // Terminal notice: posted without a timestamp, never expires.
                self.notice = Some(PostedNotice {
                    notice: Notice { kind: NoticeKind::GameOver, message },
                    posted_at: None,
                });
                vec![]
            },
        }
    }

    fn apply_turn_outcome(&mut self, outcome: TurnOutcome, now: I) {
        let TurnOutcome {
            player_id,
            guessed_number,
            correct_digits,
            guess_number,
            current_player_id,
            remaining_attempts,
            message,
        } = outcome;

        let record = GuessRecord {
            player_id,
            guessed_number: guessed_number.clone(),
            correct_digits,
            guess_number,
        };
        if !self.ledger.append(record) {
            tracing::debug!(guess_number, "duplicate turn outcome suppressed");
        }

        if let Some(arbiter) = self.arbiter.as_mut() {
            arbiter.apply_turn_outcome(current_player_id);
        }

        self.post_notice(
            Notice {
                kind: NoticeKind::TurnOutcome { guessed_number, correct_digits, remaining_attempts },
                message,
            },
            now,
        );
    }

    fn on_history_fetched(&mut self, records: Vec<GuessRecord>) -> Vec<ReconcilerEffect> {
        if self.is_completed() {
            tracing::debug!("dropping history backfill for completed room");
            return vec![];
        }
        // Monotone merge: union into the ledger, never replace, and never
        // touch the arbiter. A stale fetch cannot move turn ownership.
        for record in records {
            self.ledger.append(record);
        }
        vec![]
    }

    fn post_notice(&mut self, notice: Notice, now: I) {
        self.notice = Some(PostedNotice { notice, posted_at: Some(now) });
    }

    fn expire_notice(&mut self, now: I) {
        // Ticks carry delivery-time instants and may arrive with a timestamp
        // older than the notice; subtracting would underflow.
        let expired = self
            .notice
            .as_ref()
            .and_then(|posted| posted.posted_at)
            .is_some_and(|posted_at| now >= posted_at && now - posted_at >= NOTICE_TTL);
        if expired {
            self.notice = None;
        }
    }

    fn is_completed(&self) -> bool {
        self.status() == Some(RoomStatus::Completed)
    }

    /// Local participant's identity.
    pub fn player_id(&self) -> &str {
        &self.player_id
    }

    /// Room lifecycle status. `None` before `GameStarted` has been fed.
    pub fn status(&self) -> Option<RoomStatus> {
        self.arbiter.as_ref().map(TurnArbiter::status)
    }

    /// Current turn holder, when known.
    pub fn current_player(&self) -> Option<&str> {
        self.arbiter.as_ref().and_then(TurnArbiter::current_player)
    }

    /// Whether the local participant may submit a guess right now.
    pub fn my_turn(&self) -> bool {
        self.arbiter.as_ref().is_some_and(|a| a.is_turn(&self.player_id))
    }

    /// The deduplicated guess history.
    pub fn ledger(&self) -> &HistoryLedger {
        &self.ledger
    }

    /// The unexpired transient notice, if any.
    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref().map(|posted| &posted.notice)
    }

    /// Whether the session is still waiting for an opponent to join.
    pub fn waiting_for_opponent(&self) -> bool {
        self.waiting_for_opponent
    }
}
