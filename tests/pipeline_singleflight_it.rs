// std
use std::{
	sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	},
	time::Duration as StdDuration,
};
// crates.io
use parking_lot::Mutex;
use time::Duration;
use tokio::sync::Barrier;
// self
use reauth_pipeline::{
	auth::{Credential, TokenSecret},
	config::PipelineConfig,
	coordinator::CoordinatorState,
	error::{Error, TransportError},
	http::{AUTHORIZATION, ExecuteFuture, RequestDescriptor, RequestExecutor, RequestOutcome},
	pipeline::{Pipeline, SessionEndReason, SessionEvent},
	store::{
		ACCESS_TOKEN_KEY, CredentialPersistence, CredentialStore, MemoryPersistence,
		REFRESH_TOKEN_KEY,
	},
	url::Url,
};

const DATA_PATH: &str = "/portfolio-groups";
const REFRESH_PATH: &str = "/auth/refresh";
const LOGIN_PATH: &str = "/auth/login";
const FRESH_BEARER: &str = "Bearer access-new";

#[derive(Clone, Copy)]
enum DataReply {
	/// 200 for the renewed token, 401 for anything else.
	AcceptFresh,
	AlwaysUnauthorized,
	Status(u16),
	Unreachable,
}

#[derive(Clone, Copy)]
enum RefreshReply {
	Grant,
	/// Grant whose user identity uses spaces and free-form permission labels.
	FreeFormIdentity,
	Reject(u16),
	/// 200 without a usable grant.
	Malformed,
	Unreachable,
	Hang,
}

struct ScriptedBackend {
	data: DataReply,
	refresh: RefreshReply,
	/// Holds every stale-token call until this many have arrived.
	stale_gate: Option<Barrier>,
	/// Simulates a concurrent refresh that lands while a stale call is in flight.
	renew_before_reject: Option<Arc<CredentialStore>>,
	refresh_delay: StdDuration,
	data_calls: AtomicUsize,
	refresh_calls: AtomicUsize,
	authorizations: Mutex<Vec<Option<String>>>,
}
impl ScriptedBackend {
	fn new(data: DataReply, refresh: RefreshReply) -> Self {
		Self {
			data,
			refresh,
			stale_gate: None,
			renew_before_reject: None,
			refresh_delay: StdDuration::from_millis(30),
			data_calls: AtomicUsize::new(0),
			refresh_calls: AtomicUsize::new(0),
			authorizations: Mutex::new(Vec::new()),
		}
	}

	fn with_stale_gate(mut self, callers: usize) -> Self {
		self.stale_gate = Some(Barrier::new(callers));

		self
	}

	fn with_refresh_delay(mut self, millis: u64) -> Self {
		self.refresh_delay = StdDuration::from_millis(millis);

		self
	}

	fn bearer_count(&self, bearer: &str) -> usize {
		self.authorizations.lock().iter().filter(|value| value.as_deref() == Some(bearer)).count()
	}

	fn refresh_calls(&self) -> usize {
		self.refresh_calls.load(Ordering::SeqCst)
	}

	fn data_calls(&self) -> usize {
		self.data_calls.load(Ordering::SeqCst)
	}

	async fn answer(&self, request: &RequestDescriptor) -> Result<RequestOutcome, TransportError> {
		match request.path.as_str() {
			REFRESH_PATH => {
				self.refresh_calls.fetch_add(1, Ordering::SeqCst);

				assert_eq!(request.header(AUTHORIZATION), None, "Refresh must not carry a bearer.");
				assert_eq!(
					request.body,
					Some(serde_json::json!({ "refresh_token": "refresh-old" })),
					"Refresh must send the stored refresh token."
				);

				tokio::time::sleep(self.refresh_delay).await;

				match self.refresh {
					RefreshReply::Grant => Ok(grant("access-new", "refresh-new")),
					RefreshReply::FreeFormIdentity => Ok(grant_for(
						"access-new",
						"refresh-new",
						serde_json::json!({
							"id": "user 42",
							"username": "Jane Trader",
							"permissions": ["view portfolios", "trade", "view portfolios"],
						}),
					)),
					RefreshReply::Reject(status) => Ok(RequestOutcome::from_parts(status, Vec::new())),
					RefreshReply::Malformed =>
						Ok(RequestOutcome::from_parts(200, br#"{"detail":"ok"}"#.to_vec())),
					RefreshReply::Unreachable =>
						Err(TransportError::network(std::io::Error::other("connection reset"))),
					RefreshReply::Hang => {
						tokio::time::sleep(StdDuration::from_secs(60)).await;

						Ok(grant("access-late", "refresh-late"))
					},
				}
			},
			LOGIN_PATH => {
				assert_eq!(request.header(AUTHORIZATION), None, "Login must not carry a bearer.");

				Ok(grant("access-login", "refresh-login"))
			},
			_ => {
				self.data_calls.fetch_add(1, Ordering::SeqCst);

				let authorization = request.header(AUTHORIZATION).map(str::to_owned);

				self.authorizations.lock().push(authorization.clone());

				match self.data {
					DataReply::Unreachable => Err(TransportError::network(std::io::Error::other(
						"connection refused",
					))),
					DataReply::Status(status) => Ok(RequestOutcome::from_parts(status, Vec::new())),
					DataReply::AlwaysUnauthorized => Ok(unauthorized()),
					DataReply::AcceptFresh if authorization.as_deref() == Some(FRESH_BEARER) =>
						Ok(RequestOutcome::from_parts(200, br#"{"portfolio_groups":[]}"#.to_vec())),
					DataReply::AcceptFresh => {
						if let Some(gate) = &self.stale_gate {
							gate.wait().await;
						}
						if let Some(store) = &self.renew_before_reject {
							store.replace(Credential::new(
								"access-new",
								Some("refresh-new".into()),
								None,
							));
						}

						Ok(unauthorized())
					},
				}
			},
		}
	}
}
impl RequestExecutor for ScriptedBackend {
	fn execute<'a>(&'a self, request: &'a RequestDescriptor) -> ExecuteFuture<'a> {
		Box::pin(async move {
			match request.timeout {
				Some(timeout) => {
					let timeout = StdDuration::try_from(timeout)
						.expect("Scripted timeouts should be positive.");

					tokio::time::timeout(timeout, self.answer(request))
						.await
						.map_err(|_| TransportError::Timeout)?
				},
				None => self.answer(request).await,
			}
		})
	}
}

fn grant(access: &str, refresh: &str) -> RequestOutcome {
	grant_for(
		access,
		refresh,
		serde_json::json!({ "id": "123", "username": "testuser", "permissions": ["trade"] }),
	)
}

fn grant_for(access: &str, refresh: &str, user: serde_json::Value) -> RequestOutcome {
	let body =
		serde_json::json!({ "access_token": access, "refresh_token": refresh, "user": user });

	RequestOutcome::from_parts(
		200,
		serde_json::to_vec(&body).expect("Grant fixture should serialize."),
	)
}

fn unauthorized() -> RequestOutcome {
	RequestOutcome::from_parts(401, br#"{"detail":"token expired"}"#.to_vec())
}

fn config(refresh_timeout: Option<Duration>) -> PipelineConfig {
	PipelineConfig::builder(
		Url::parse("http://backend.test/v1").expect("Backend fixture URL should parse."),
	)
	.refresh_timeout(refresh_timeout)
	.build()
	.expect("Backend fixture configuration should build.")
}

fn seeded_store(refresh: Option<&str>) -> (Arc<CredentialStore>, MemoryPersistence) {
	let persistence = MemoryPersistence::default();
	let store = CredentialStore::open(Arc::new(persistence.clone()))
		.expect("Empty in-memory store should open.");

	store.replace(Credential::new("access-old", refresh.map(str::to_owned), None));

	(Arc::new(store), persistence)
}

fn build_pipeline(
	backend: ScriptedBackend,
	refresh: Option<&str>,
) -> (Pipeline<ScriptedBackend>, Arc<ScriptedBackend>) {
	let (store, _) = seeded_store(refresh);
	let backend = Arc::new(backend);
	let pipeline = Pipeline::<ScriptedBackend>::with_executor(
		config(Some(Duration::seconds(5))),
		store,
		backend.clone(),
	);

	(pipeline, backend)
}

fn recording_observer(
	pipeline: Pipeline<ScriptedBackend>,
) -> (Pipeline<ScriptedBackend>, Arc<Mutex<Vec<SessionEvent>>>) {
	let events = Arc::new(Mutex::new(Vec::new()));
	let sink = events.clone();
	let pipeline = pipeline.with_session_observer(Arc::new(move |event: &SessionEvent| {
		sink.lock().push(event.clone())
	}));

	(pipeline, events)
}

async fn fan_out(
	pipeline: &Pipeline<ScriptedBackend>,
	callers: usize,
) -> Vec<Result<RequestOutcome, Error>> {
	let handles = (0..callers)
		.map(|_| {
			let pipeline = pipeline.clone();

			tokio::spawn(async move { pipeline.execute(RequestDescriptor::get(DATA_PATH)).await })
		})
		.collect::<Vec<_>>();
	let mut results = Vec::with_capacity(callers);

	for handle in handles {
		results.push(handle.await.expect("Caller task should not panic."));
	}

	results
}

async fn until_refreshing(pipeline: &Pipeline<ScriptedBackend>) {
	tokio::time::timeout(StdDuration::from_secs(5), async {
		while pipeline.coordinator_state() != CoordinatorState::Refreshing {
			tokio::time::sleep(StdDuration::from_millis(1)).await;
		}
	})
	.await
	.expect("A refresh should start.");
}

async fn assert_failed_refresh_expires_everyone(reply: RefreshReply, expected: SessionEndReason) {
	const CALLERS: usize = 5;

	let (store, persistence) = seeded_store(Some("refresh-old"));
	let backend = Arc::new(
		ScriptedBackend::new(DataReply::AcceptFresh, reply).with_stale_gate(CALLERS),
	);
	let pipeline = Pipeline::<ScriptedBackend>::with_executor(
		config(Some(Duration::seconds(5))),
		store,
		backend.clone(),
	);
	let (pipeline, events) = recording_observer(pipeline);
	let mut leaders = 0;

	for result in fan_out(&pipeline, CALLERS).await {
		match result.expect_err("Every caller should see the expired session.") {
			Error::SessionExpired { reason } if reason == expected => leaders += 1,
			Error::SessionExpired { reason: SessionEndReason::CredentialCleared } => {},
			other => panic!("Unexpected error: {other:?}"),
		}
	}

	assert_eq!(leaders, 1, "Only the leader reports {expected:?}.");
	assert_eq!(backend.refresh_calls(), 1);
	assert_eq!(backend.data_calls(), CALLERS);
	assert!(pipeline.store.read().is_none());
	assert!(persistence.is_empty());
	assert_eq!(pipeline.coordinator_state(), CoordinatorState::Idle);
	assert!(matches!(
		events.lock().as_slice(),
		[SessionEvent::Ended { reason, .. }] if *reason == expected
	));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_unauthorized_calls_share_one_refresh() {
	const CALLERS: usize = 8;

	let (pipeline, backend) = build_pipeline(
		ScriptedBackend::new(DataReply::AcceptFresh, RefreshReply::Grant).with_stale_gate(CALLERS),
		Some("refresh-old"),
	);
	let (pipeline, events) = recording_observer(pipeline);
	let results = fan_out(&pipeline, CALLERS).await;

	for result in results {
		let outcome = result.expect("Every caller should succeed after the shared refresh.");

		assert_eq!(outcome.status(), 200);
	}

	assert_eq!(backend.refresh_calls(), 1);
	assert_eq!(backend.data_calls(), CALLERS * 2);

	assert_eq!(backend.bearer_count(FRESH_BEARER), CALLERS);

	let credential = pipeline.store.read().expect("Renewed credential should be installed.");

	assert_eq!(credential.access_token.as_ref().map(TokenSecret::expose), Some("access-new"));
	assert_eq!(credential.refresh_token.as_ref().map(TokenSecret::expose), Some("refresh-new"));
	assert_eq!(
		pipeline.current_user().map(|user| user.username.as_ref().to_owned()),
		Some("testuser".into())
	);
	assert_eq!(pipeline.coordinator_state(), CoordinatorState::Idle);

	let metrics = pipeline.coordinator.metrics();

	assert_eq!(metrics.attempts(), 1);
	assert_eq!(metrics.successes(), 1);
	assert_eq!(metrics.failures(), 0);
	assert!(matches!(events.lock().as_slice(), [SessionEvent::Renewed { .. }]));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn refresh_failure_expires_every_waiting_caller() {
	const CALLERS: usize = 6;

	let (pipeline, backend) = build_pipeline(
		ScriptedBackend::new(DataReply::AcceptFresh, RefreshReply::Reject(401))
			.with_stale_gate(CALLERS),
		Some("refresh-old"),
	);
	let (pipeline, events) = recording_observer(pipeline);
	let results = fan_out(&pipeline, CALLERS).await;
	let mut rejected = 0;

	for result in results {
		match result.expect_err("Every caller should see the expired session.") {
			Error::SessionExpired { reason: SessionEndReason::RefreshRejected { status } } => {
				assert_eq!(status, 401);

				rejected += 1;
			},
			Error::SessionExpired { reason: SessionEndReason::CredentialCleared } => {},
			other => panic!("Unexpected error: {other:?}"),
		}
	}

	assert_eq!(rejected, 1, "Only the leader reports the refresh rejection.");
	assert_eq!(backend.refresh_calls(), 1);
	assert_eq!(backend.data_calls(), CALLERS, "Nobody replays against an empty store.");
	assert!(!pipeline.is_authenticated());
	assert_eq!(pipeline.coordinator_state(), CoordinatorState::Idle);
	assert_eq!(pipeline.coordinator.metrics().failures(), 1);

	let events = events.lock();

	assert_eq!(events.len(), 1);
	assert!(matches!(
		events[0],
		SessionEvent::Ended { reason: SessionEndReason::RefreshRejected { status: 401 }, .. }
	));
}

#[tokio::test]
async fn missing_refresh_token_ends_the_session_without_a_refresh_call() {
	let (pipeline, backend) =
		build_pipeline(ScriptedBackend::new(DataReply::AcceptFresh, RefreshReply::Grant), None);
	let err = pipeline
		.execute(RequestDescriptor::get(DATA_PATH))
		.await
		.expect_err("A 401 without a refresh token should end the session.");

	assert!(matches!(
		err,
		Error::SessionExpired { reason: SessionEndReason::MissingRefreshToken }
	));
	assert_eq!(backend.refresh_calls(), 0);
	assert!(pipeline.store.read().is_none());
}

#[tokio::test]
async fn unauthenticated_call_with_empty_store_expires() {
	let backend = Arc::new(ScriptedBackend::new(DataReply::AcceptFresh, RefreshReply::Grant));
	let pipeline = Pipeline::<ScriptedBackend>::with_executor(
		config(None),
		Arc::new(CredentialStore::in_memory()),
		backend.clone(),
	);
	let err = pipeline
		.execute(RequestDescriptor::get(DATA_PATH))
		.await
		.expect_err("An anonymous 401 should end the session.");

	assert!(err.is_session_expired());
	assert_eq!(backend.authorizations.lock().as_slice(), &[None]);
	assert_eq!(backend.refresh_calls(), 0);
}

#[tokio::test]
async fn second_unauthorized_is_returned_instead_of_looping() {
	let (pipeline, backend) = build_pipeline(
		ScriptedBackend::new(DataReply::AlwaysUnauthorized, RefreshReply::Grant),
		Some("refresh-old"),
	);
	let outcome = pipeline
		.execute(RequestDescriptor::get(DATA_PATH))
		.await
		.expect("The replayed 401 should be returned as an outcome.");

	assert!(outcome.is_unauthorized());
	assert_eq!(backend.refresh_calls(), 1);
	assert_eq!(backend.data_calls(), 2);
	assert!(pipeline.is_authenticated(), "The renewed credential stays installed.");
}

#[tokio::test]
async fn non_unauthorized_outcomes_bypass_the_coordinator() {
	let (pipeline, backend) = build_pipeline(
		ScriptedBackend::new(DataReply::Status(500), RefreshReply::Grant),
		Some("refresh-old"),
	);
	let outcome = pipeline
		.execute(RequestDescriptor::get(DATA_PATH))
		.await
		.expect("Server errors are returned as outcomes.");

	assert_eq!(outcome.status(), 500);
	assert_eq!(backend.refresh_calls(), 0);
	assert_eq!(pipeline.coordinator.metrics().leaderships(), 0);
	assert_eq!(pipeline.coordinator.metrics().waits(), 0);

	let (pipeline, backend) = build_pipeline(
		ScriptedBackend::new(DataReply::Unreachable, RefreshReply::Grant),
		Some("refresh-old"),
	);
	let err = pipeline
		.execute(RequestDescriptor::get(DATA_PATH))
		.await
		.expect_err("Transport failures surface to the caller.");

	assert!(matches!(err, Error::Transport(TransportError::Network { .. })));
	assert_eq!(backend.data_calls(), 1);
	assert_eq!(backend.refresh_calls(), 0);
	assert!(pipeline.is_authenticated());
}

#[tokio::test]
async fn stale_unauthorized_replays_without_refreshing() {
	let (store, _) = seeded_store(Some("refresh-old"));
	let mut backend = ScriptedBackend::new(DataReply::AcceptFresh, RefreshReply::Grant);

	backend.renew_before_reject = Some(store.clone());

	let backend = Arc::new(backend);
	let pipeline =
		Pipeline::<ScriptedBackend>::with_executor(config(None), store, backend.clone());
	let outcome = pipeline
		.execute(RequestDescriptor::get(DATA_PATH))
		.await
		.expect("The replay with the already renewed token should succeed.");

	assert_eq!(outcome.status(), 200);
	assert_eq!(backend.refresh_calls(), 0);
	assert_eq!(pipeline.coordinator.metrics().stale_skips(), 1);
	assert_eq!(
		backend.authorizations.lock().as_slice(),
		&[Some("Bearer access-old".to_owned()), Some(FRESH_BEARER.to_owned())]
	);
}

#[tokio::test]
async fn refresh_timeout_counts_as_refresh_failure() {
	let (store, persistence) = seeded_store(Some("refresh-old"));
	let backend = Arc::new(ScriptedBackend::new(DataReply::AcceptFresh, RefreshReply::Hang));
	let pipeline = Pipeline::<ScriptedBackend>::with_executor(
		config(Some(Duration::milliseconds(100))),
		store,
		backend.clone(),
	);
	let err = pipeline
		.execute(RequestDescriptor::get(DATA_PATH))
		.await
		.expect_err("A hung refresh should end the session.");

	assert!(matches!(err, Error::SessionExpired { reason: SessionEndReason::RefreshTimeout }));
	assert_eq!(backend.refresh_calls(), 1);
	assert_eq!(pipeline.coordinator_state(), CoordinatorState::Idle);
	assert!(!pipeline.is_authenticated());
	assert!(persistence.is_empty());
}

#[tokio::test]
async fn login_and_logout_drive_the_session_lifecycle() {
	let backend = Arc::new(ScriptedBackend::new(DataReply::Status(200), RefreshReply::Grant));
	let persistence = MemoryPersistence::default();
	let store = CredentialStore::open(Arc::new(persistence.clone()))
		.expect("Empty in-memory store should open.");
	let pipeline = Pipeline::<ScriptedBackend>::with_executor(
		config(None),
		Arc::new(store),
		backend.clone(),
	);
	let (pipeline, events) = recording_observer(pipeline);

	assert!(!pipeline.is_authenticated());

	let credential =
		pipeline.login("testuser", "password123").await.expect("Login should succeed.");

	assert_eq!(credential.access_token.as_ref().map(TokenSecret::expose), Some("access-login"));
	assert!(pipeline.is_authenticated());
	assert_eq!(persistence.get(REFRESH_TOKEN_KEY), Ok(Some("refresh-login".into())));

	let user = pipeline.current_user().expect("Login should install the user identity.");

	assert_eq!(user.id.as_ref(), "123");
	assert!(user.permissions.contains("trade"));

	pipeline
		.execute(RequestDescriptor::get(DATA_PATH))
		.await
		.expect("Authenticated call should succeed.");

	assert_eq!(
		backend.authorizations.lock().as_slice(),
		&[Some("Bearer access-login".to_owned())]
	);

	pipeline.logout();

	assert!(!pipeline.is_authenticated());
	assert!(persistence.is_empty());

	let events = events.lock();

	assert!(matches!(
		events.as_slice(),
		[
			SessionEvent::Started { .. },
			SessionEvent::Ended { reason: SessionEndReason::Logout, .. }
		]
	));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn calls_started_during_a_refresh_wait_and_use_the_new_token() {
	const CALLERS: usize = 4;
	const LATE: usize = 6;

	let (pipeline, backend) = build_pipeline(
		ScriptedBackend::new(DataReply::AcceptFresh, RefreshReply::Grant)
			.with_stale_gate(CALLERS)
			.with_refresh_delay(250),
		Some("refresh-old"),
	);
	let early = {
		let pipeline = pipeline.clone();

		tokio::spawn(async move { fan_out(&pipeline, CALLERS).await })
	};

	until_refreshing(&pipeline).await;

	let late = fan_out(&pipeline, LATE).await;

	for result in early.await.expect("Early callers should not panic.").into_iter().chain(late) {
		assert_eq!(result.expect("Every call should succeed.").status(), 200);
	}

	assert_eq!(backend.refresh_calls(), 1);
	assert_eq!(backend.data_calls(), CALLERS * 2 + LATE);
	assert_eq!(
		backend.bearer_count("Bearer access-old"),
		CALLERS,
		"Late calls never send the old token."
	);
	assert_eq!(backend.bearer_count(FRESH_BEARER), CALLERS + LATE);
	assert_eq!(pipeline.coordinator.metrics().attempts(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn refresh_transport_failure_expires_every_waiting_caller() {
	assert_failed_refresh_expires_everyone(
		RefreshReply::Unreachable,
		SessionEndReason::RefreshTransport,
	)
	.await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn malformed_refresh_grant_expires_every_waiting_caller() {
	assert_failed_refresh_expires_everyone(
		RefreshReply::Malformed,
		SessionEndReason::RefreshMalformed,
	)
	.await;
}

#[tokio::test]
async fn free_form_user_identity_renews_the_session() {
	let (pipeline, backend) = build_pipeline(
		ScriptedBackend::new(DataReply::AcceptFresh, RefreshReply::FreeFormIdentity),
		Some("refresh-old"),
	);
	let (pipeline, events) = recording_observer(pipeline);
	let outcome = pipeline
		.execute(RequestDescriptor::get(DATA_PATH))
		.await
		.expect("A 2xx refresh with any string identity should renew the session.");

	assert_eq!(outcome.status(), 200);
	assert_eq!(backend.refresh_calls(), 1);
	assert!(pipeline.is_authenticated());

	let user = pipeline.current_user().expect("The renewed credential should carry the user.");

	assert_eq!(user.id.as_ref(), "user 42");
	assert_eq!(user.username.as_ref(), "Jane Trader");
	assert_eq!(user.permissions.iter().collect::<Vec<_>>(), vec!["trade", "view portfolios"]);
	assert!(matches!(events.lock().as_slice(), [SessionEvent::Renewed { .. }]));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn logout_during_a_refresh_is_not_undone() {
	let (store, persistence) = seeded_store(Some("refresh-old"));
	let backend = Arc::new(
		ScriptedBackend::new(DataReply::AcceptFresh, RefreshReply::Grant).with_refresh_delay(200),
	);
	let pipeline = Pipeline::<ScriptedBackend>::with_executor(config(None), store, backend.clone());
	let (pipeline, events) = recording_observer(pipeline);
	let call = {
		let pipeline = pipeline.clone();

		tokio::spawn(async move { pipeline.execute(RequestDescriptor::get(DATA_PATH)).await })
	};

	until_refreshing(&pipeline).await;
	pipeline.logout();

	let err = call
		.await
		.expect("Caller task should not panic.")
		.expect_err("The call should not outlive the logout.");

	assert!(matches!(err, Error::SessionExpired { reason: SessionEndReason::CredentialCleared }));
	assert_eq!(backend.refresh_calls(), 1);
	assert_eq!(backend.data_calls(), 1, "Nothing is replayed against a logged-out store.");
	assert!(pipeline.store.read().is_none(), "The late grant must not be installed.");
	assert!(persistence.is_empty());
	assert_eq!(pipeline.coordinator_state(), CoordinatorState::Idle);
	assert!(matches!(
		events.lock().as_slice(),
		[SessionEvent::Ended { reason: SessionEndReason::Logout, .. }]
	));
}

#[tokio::test]
async fn persisted_refresh_token_alone_recovers_the_session() {
	let persistence = MemoryPersistence::default();

	persistence.set(REFRESH_TOKEN_KEY, "refresh-old").expect("Seed should succeed.");

	let store = CredentialStore::open(Arc::new(persistence.clone()))
		.expect("Seeded in-memory store should open.");
	let backend = Arc::new(ScriptedBackend::new(DataReply::AcceptFresh, RefreshReply::Grant));
	let pipeline =
		Pipeline::<ScriptedBackend>::with_executor(config(None), Arc::new(store), backend.clone());

	assert!(!pipeline.is_authenticated());

	let outcome = pipeline
		.execute(RequestDescriptor::get(DATA_PATH))
		.await
		.expect("The restored refresh token should renew the session.");

	assert_eq!(outcome.status(), 200);
	assert_eq!(backend.refresh_calls(), 1);
	assert_eq!(
		backend.authorizations.lock().as_slice(),
		&[None, Some(FRESH_BEARER.to_owned())]
	);
	assert!(pipeline.is_authenticated());
	assert_eq!(persistence.get(ACCESS_TOKEN_KEY), Ok(Some("access-new".into())));
}
