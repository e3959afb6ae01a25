//! End-to-end facade tests against in-memory fakes.
//!
//! The fake service and fake channel stand in for the real transports; the
//! tests drive the same start → join → guess → notify flow a UI would, and
//! check the reconciled snapshots.

use std::{
    ops::Sub,
    sync::{
        Arc, Mutex,
        atomic::{AtomicU64, AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use digitduel_app::{GameSession, StartConfig, SubmitError};
use digitduel_client::{
    ChannelManager, NotificationChannel, ServiceError, ServiceOp, SessionService, SubscriptionId,
    TransportError,
};
use digitduel_core::{Environment, ValidationError};
use digitduel_proto::{
    EndRequest, EndResponse, GameMode, GuessRecord, GuessRequest, GuessResponse, HistoryRequest,
    Level, RoomId, RoomStatus, StartRequest, StartResponse,
};
use serde_json::{Value, json};
use tokio::sync::mpsc;

/// Virtual instant in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct At(u64);

impl Sub for At {
    type Output = Duration;

    fn sub(self, rhs: Self) -> Duration {
        Duration::from_millis(self.0 - rhs.0)
    }
}

/// Test environment with a manually advanced clock.
#[derive(Clone, Default)]
struct TestEnv {
    clock: Arc<AtomicU64>,
}

impl TestEnv {
    fn advance(&self, millis: u64) {
        self.clock.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Environment for TestEnv {
    type Instant = At;

    fn now(&self) -> At {
        At(self.clock.load(Ordering::SeqCst))
    }
}

/// Scripted session service with call counters.
#[derive(Default)]
struct FakeService {
    start_response: Mutex<Option<StartResponse>>,
    history: Mutex<Vec<GuessRecord>>,
    guess_calls: AtomicUsize,
    history_calls: AtomicUsize,
    end_calls: AtomicUsize,
}

/// Shared handle to the fake service; tests keep the inner [`Arc`] to
/// inspect counters after handing the handle to the session.
#[derive(Clone)]
struct Svc(Arc<FakeService>);

#[async_trait]
impl SessionService for Svc {
    async fn start(&self, _request: StartRequest) -> Result<StartResponse, ServiceError> {
        self.0
            .start_response
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| ServiceError::new(ServiceOp::Start, None))
    }

    async fn guess(&self, _request: GuessRequest) -> Result<GuessResponse, ServiceError> {
        self.0.guess_calls.fetch_add(1, Ordering::SeqCst);
        Ok(GuessResponse { status: RoomStatus::InProgress })
    }

    async fn history(&self, _request: HistoryRequest) -> Result<Vec<GuessRecord>, ServiceError> {
        self.0.history_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.0.history.lock().unwrap().clone())
    }

    async fn end(&self, _request: EndRequest) -> Result<EndResponse, ServiceError> {
        self.0.end_calls.fetch_add(1, Ordering::SeqCst);
        Ok(EndResponse::default())
    }
}

/// In-memory pub/sub transport.
#[derive(Default)]
struct ChannelInner {
    sinks: Mutex<Vec<mpsc::UnboundedSender<Value>>>,
    connects: AtomicUsize,
    disconnects: AtomicUsize,
    fail_connect: std::sync::atomic::AtomicBool,
}

impl ChannelInner {
    fn publish(&self, payload: Value) {
        for sink in self.sinks.lock().unwrap().iter() {
            let _ = sink.send(payload.clone());
        }
    }
}

#[derive(Clone, Default)]
struct FakeChannel(Arc<ChannelInner>);

#[async_trait]
impl NotificationChannel for FakeChannel {
    async fn connect(&self) -> Result<(), TransportError> {
        if self.0.fail_connect.load(Ordering::SeqCst) {
            return Err(TransportError::Connect("refused".into()));
        }
        self.0.connects.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn subscribe(
        &self,
        _room_id: &RoomId,
        sink: mpsc::UnboundedSender<Value>,
    ) -> Result<SubscriptionId, TransportError> {
        let mut sinks = self.0.sinks.lock().unwrap();
        sinks.push(sink);
        Ok(sinks.len() as SubscriptionId)
    }

    async fn unsubscribe(&self, _id: SubscriptionId) {}

    async fn disconnect(&self) {
        self.0.disconnects.fetch_add(1, Ordering::SeqCst);
    }
}

fn alice_start_response() -> StartResponse {
    StartResponse {
        game_id: "g1".into(),
        room_id: "r1".into(),
        player_id: "Alice".into(),
        current_player_id: None,
        room_status: RoomStatus::WaitingForPlayer,
        secret_number: "42".into(),
        level: Level::One,
    }
}

fn config(player: &str) -> StartConfig {
    StartConfig {
        player_id: player.into(),
        level: Level::One,
        game_mode: GameMode::Multiplayer,
        limit_attempts: true,
        room_id: None,
        secret_number: None,
    }
}

type Session = GameSession<Svc, FakeChannel, TestEnv>;

async fn alice_session(service: Arc<FakeService>) -> (Session, TestEnv) {
    *service.start_response.lock().unwrap() = Some(alice_start_response());
    let env = TestEnv::default();
    let session = GameSession::start(Svc(service), env.clone(), config("Alice")).await.unwrap();
    (session, env)
}

async fn attached(service: Arc<FakeService>) -> (Session, TestEnv, Arc<ChannelInner>) {
    let (mut session, env) = alice_session(service).await;
    let inner = Arc::new(ChannelInner::default());
    let manager = Arc::new(ChannelManager::new(FakeChannel(inner.clone())));
    session.attach_notifications(manager).await;
    (session, env, inner)
}

#[tokio::test]
async fn start_produces_waiting_snapshot() {
    let (session, _env) = alice_session(Arc::new(FakeService::default())).await;
    let snap = session.snapshot();

    assert_eq!(snap.room_status, RoomStatus::WaitingForPlayer);
    assert!(snap.waiting_for_opponent);
    assert!(!snap.my_turn);
    assert_eq!(snap.expected_digits, 2);
    assert_eq!(session.info().room_id, "r1");
    assert_eq!(session.info().secret_number, "42");
}

#[tokio::test]
async fn opponent_join_grants_alice_the_turn() {
    let service = Arc::new(FakeService::default());
    let (mut session, _env, channel) = attached(service).await;

    channel.publish(json!({
        "joinedPlayerId": "Bob",
        "status": "IN_PROGRESS",
        "message": "Bob joined the room",
    }));
    session.pump().await;

    let snap = session.snapshot();
    assert_eq!(snap.room_status, RoomStatus::InProgress);
    assert!(snap.my_turn);
    assert!(!snap.waiting_for_opponent);
    assert!(snap.notice.is_some());
}

#[tokio::test]
async fn submit_then_notification_advances_state() {
    let service = Arc::new(FakeService::default());
    let (mut session, _env, channel) = attached(service.clone()).await;

    channel.publish(json!({"joinedPlayerId": "Bob", "status": "IN_PROGRESS"}));
    session.pump().await;

    session.submit_guess("42").await.unwrap();
    assert_eq!(service.guess_calls.load(Ordering::SeqCst), 1);

    // Submission alone mutates nothing; the notification is authoritative.
    let snap = session.snapshot();
    assert!(snap.mine.is_empty());
    assert!(snap.my_turn);

    let outcome = json!({
        "playerId": "Alice",
        "guessedNumber": "42",
        "correctDigits": 1,
        "guessNumber": 1,
        "currentPlayerId": "Bob",
        "message": "Alice guessed 42",
    });
    channel.publish(outcome.clone());
    session.pump().await;

    let snap = session.snapshot();
    assert_eq!(snap.mine.len(), 1);
    assert_eq!(snap.mine[0].guessed_number, "42");
    assert!(!snap.my_turn);
    assert_eq!(snap.current_player_id.as_deref(), Some("Bob"));

    // Reconnect replay of the same notification must not duplicate history.
    channel.publish(outcome);
    session.pump().await;
    assert_eq!(session.snapshot().mine.len(), 1);
}

#[tokio::test]
async fn submit_is_blocked_locally_before_any_network_call() {
    let service = Arc::new(FakeService::default());
    let (mut session, _env, channel) = attached(service.clone()).await;

    // Still waiting for an opponent: not Alice's turn.
    assert_eq!(session.submit_guess("42").await, Err(SubmitError::NotYourTurn));

    channel.publish(json!({"joinedPlayerId": "Bob", "status": "IN_PROGRESS"}));
    session.pump().await;

    assert_eq!(
        session.submit_guess("4").await,
        Err(SubmitError::Validation(ValidationError::WrongLength { expected: 2 }))
    );
    assert_eq!(
        session.submit_guess("4a").await,
        Err(SubmitError::Validation(ValidationError::NotNumeric))
    );
    assert_eq!(
        session.submit_guess("").await,
        Err(SubmitError::Validation(ValidationError::Empty))
    );

    assert_eq!(service.guess_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn joining_player_backfills_history() {
    let service = Arc::new(FakeService::default());
    *service.history.lock().unwrap() = vec![GuessRecord {
        player_id: "Alice".into(),
        guessed_number: "17".into(),
        correct_digits: 0,
        guess_number: 1,
    }];
    *service.start_response.lock().unwrap() = Some(StartResponse {
        player_id: "Bob".into(),
        current_player_id: Some("Alice".into()),
        room_status: RoomStatus::InProgress,
        ..alice_start_response()
    });

    let env = TestEnv::default();
    let session: Session =
        GameSession::start(Svc(service.clone()), env, config("Bob")).await.unwrap();

    assert_eq!(service.history_calls.load(Ordering::SeqCst), 1);
    let snap = session.snapshot();
    assert_eq!(snap.theirs.len(), 1);
    assert!(snap.mine.is_empty());
    assert!(!snap.my_turn);
}

#[tokio::test]
async fn completion_pins_notice_and_blocks_guessing() {
    let service = Arc::new(FakeService::default());
    let (mut session, env, channel) = attached(service).await;

    channel.publish(json!({"joinedPlayerId": "Bob", "status": "IN_PROGRESS"}));
    channel.publish(json!({"status": "COMPLETED", "message": "Alice wins!"}));
    session.pump().await;

    let snap = session.snapshot();
    assert_eq!(snap.room_status, RoomStatus::Completed);
    assert!(!snap.my_turn);
    assert_eq!(snap.notice.as_ref().map(|n| n.message.as_str()), Some("Alice wins!"));

    assert_eq!(session.submit_guess("42").await, Err(SubmitError::Completed));

    // The game-over notice outlives the transient TTL.
    env.advance(60_000);
    session.pump().await;
    assert!(session.snapshot().notice.is_some());
}

#[tokio::test]
async fn transient_notice_expires_after_five_seconds() {
    let service = Arc::new(FakeService::default());
    let (mut session, env, channel) = attached(service).await;

    channel.publish(json!({"joinedPlayerId": "Bob", "status": "IN_PROGRESS"}));
    session.pump().await;
    assert!(session.snapshot().notice.is_some());

    env.advance(4_999);
    session.pump().await;
    assert!(session.snapshot().notice.is_some());

    env.advance(1);
    session.pump().await;
    assert!(session.snapshot().notice.is_none());
}

#[tokio::test]
async fn connect_failure_degrades_instead_of_failing() {
    let service = Arc::new(FakeService::default());
    let (mut session, _env) = alice_session(service).await;

    let inner = Arc::new(ChannelInner::default());
    inner.fail_connect.store(true, Ordering::SeqCst);
    let manager = Arc::new(ChannelManager::new(FakeChannel(inner.clone())));
    session.attach_notifications(manager.clone()).await;

    assert!(session.snapshot().degraded);
    assert_eq!(manager.user_count(), 0);
}

#[tokio::test]
async fn leave_fires_departure_once_and_releases_channel() {
    let service = Arc::new(FakeService::default());
    let (mut session, _env, channel) = attached(service.clone()).await;

    session.leave().await;
    session.leave().await;

    assert_eq!(service.end_calls.load(Ordering::SeqCst), 1);
    assert_eq!(channel.disconnects.load(Ordering::SeqCst), 1);

    // Payloads published after leaving never reach the reconciler.
    channel.publish(json!({"joinedPlayerId": "Bob", "status": "IN_PROGRESS"}));
    session.pump().await;
    assert!(!session.snapshot().my_turn);
}

#[tokio::test]
async fn departure_suppressed_after_completion() {
    let service = Arc::new(FakeService::default());
    let (mut session, _env, channel) = attached(service.clone()).await;

    channel.publish(json!({"status": "COMPLETED", "message": "done"}));
    session.pump().await;

    session.leave().await;
    assert_eq!(service.end_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unknown_payload_shapes_are_dropped() {
    let service = Arc::new(FakeService::default());
    let (mut session, _env, channel) = attached(service).await;

    channel.publish(json!({"ping": true}));
    channel.publish(json!({"joinedPlayerId": "Bob", "status": "IN_PROGRESS"}));
    session.pump().await;

    // The garbage payload is skipped; the join still lands.
    assert!(session.snapshot().my_turn);
}
