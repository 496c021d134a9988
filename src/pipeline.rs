//! The authenticated request pipeline.
//!
//! [`Pipeline::execute`] attaches the current access token to a request, and when the backend
//! answers `401` it coordinates exactly one refresh exchange across every request that hit the
//! same expiry, then replays each of them once with the renewed token. Any other outcome
//! (success, non-401 error statuses, transport failures) is returned untouched.
//!
//! Each attempt remembers the credential generation it was sent with. A `401` for a generation
//! that is no longer current means some other caller already renewed (or cleared) the
//! credential, so the request is replayed without a second refresh.

mod refresh;
mod session;

pub use session::*;

// self
use crate::{
	_prelude::*,
	auth::{TokenSecret, UserIdentity},
	config::PipelineConfig,
	coordinator::{CoordinatorState, Leadership, RefreshCoordinator},
	http::{RequestDescriptor, RequestExecutor, RequestOutcome},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	store::{CredentialSnapshot, CredentialStore},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestExecutor;

#[cfg(feature = "reqwest")]
/// Pipeline specialized for the crate's default reqwest executor.
pub type ReqwestPipeline = Pipeline<ReqwestExecutor>;

/// Entry point for authenticated calls of one session.
///
/// Clones share the executor, credential store, coordinator, and observers, so a clone can be
/// handed to every task that talks to the backend. Independent sessions (for example in tests)
/// are simply independent pipelines.
pub struct Pipeline<E>
where
	E: ?Sized + RequestExecutor,
{
	/// Executor used for every outbound call, including refresh and login exchanges.
	pub executor: Arc<E>,
	/// Shared credential of the session.
	pub store: Arc<CredentialStore>,
	/// Single-flight refresh guard.
	pub coordinator: Arc<RefreshCoordinator>,
	/// Endpoint and timeout configuration.
	pub config: PipelineConfig,
	observers: Arc<Vec<Arc<dyn SessionObserver>>>,
}
impl<E> Pipeline<E>
where
	E: ?Sized + RequestExecutor,
{
	/// Creates a pipeline around a caller-provided executor.
	pub fn with_executor(
		config: PipelineConfig,
		store: Arc<CredentialStore>,
		executor: impl Into<Arc<E>>,
	) -> Self {
		Self {
			executor: executor.into(),
			store,
			coordinator: Default::default(),
			config,
			observers: Default::default(),
		}
	}

	/// Registers an observer for session lifecycle events.
	pub fn with_session_observer(mut self, observer: Arc<dyn SessionObserver>) -> Self {
		Arc::make_mut(&mut self.observers).push(observer);

		self
	}

	/// Returns true while a credential is installed.
	pub fn is_authenticated(&self) -> bool {
		self.store.is_authenticated()
	}

	/// Identity attached to the current credential, if known.
	pub fn current_user(&self) -> Option<UserIdentity> {
		self.store.read().and_then(|credential| credential.user.clone())
	}

	/// Current refresh coordination state.
	pub fn coordinator_state(&self) -> CoordinatorState {
		self.coordinator.state()
	}

	/// Performs an authenticated call, refreshing the credential transparently on `401`.
	///
	/// Returns the backend's outcome (possibly from the replayed attempt) or
	/// [`Error::SessionExpired`] when the session could not be renewed. Transport failures of
	/// the request itself surface as [`Error::Transport`] and are never retried.
	pub async fn execute(&self, request: RequestDescriptor) -> Result<RequestOutcome> {
		let span = FlowSpan::new(FlowKind::Request, "execute");
		let result = span.instrument(self.execute_inner(&request)).await;

		span.finish(flow_outcome(&result));

		result
	}

	async fn execute_inner(&self, request: &RequestDescriptor) -> Result<RequestOutcome> {
		// A token that is being replaced would only earn a guaranteed 401.
		self.coordinator.wait_if_refreshing().await;

		let attempted = self.store.snapshot();
		let outcome = self.dispatch(request, &attempted).await?;

		if !outcome.is_unauthorized() {
			return Ok(outcome);
		}

		self.recover(request, attempted.generation).await
	}

	async fn recover(&self, request: &RequestDescriptor, attempted: u64) -> Result<RequestOutcome> {
		loop {
			match self.coordinator.acquire_leadership() {
				Leadership::Granted(lease) => {
					let current = self.store.snapshot();

					if current.generation != attempted {
						obs::trace_step("stale_unauthorized", current.generation);
						self.coordinator.metrics().record_stale_skip();
						drop(lease);

						return self.replay(request, current).await;
					}

					obs::trace_step("leader", current.generation);

					return self.lead_refresh(lease, request, current).await;
				},
				Leadership::MustWait => {
					obs::trace_step("waiting", attempted);
					self.coordinator.wait_for_idle().await;

					let current = self.store.snapshot();

					if current.generation != attempted {
						return self.replay(request, current).await;
					}

					// The holder released without touching the credential; compete again.
					obs::trace_step("rejoin", attempted);
				},
			}
		}
	}

	/// Sends the single retry a request is entitled to after a `401`.
	async fn replay(
		&self,
		request: &RequestDescriptor,
		current: CredentialSnapshot,
	) -> Result<RequestOutcome> {
		if current.credential.is_none() {
			return Err(Error::SessionExpired { reason: SessionEndReason::CredentialCleared });
		}

		self.dispatch(request, &current).await
	}

	async fn dispatch(
		&self,
		request: &RequestDescriptor,
		snapshot: &CredentialSnapshot,
	) -> Result<RequestOutcome> {
		let token =
			snapshot.credential.as_deref().and_then(|credential| credential.access_token.as_ref());

		obs::trace_attempt(token.map(TokenSecret::fingerprint).as_deref(), snapshot.generation);

		let authorized = request.authorized(token);

		Ok(self.executor.execute(&authorized).await?)
	}

	fn notify(&self, event: SessionEvent) {
		for observer in self.observers.iter() {
			observer.on_session_event(&event);
		}
	}
}
#[cfg(feature = "reqwest")]
impl Pipeline<ReqwestExecutor> {
	/// Creates a pipeline with a reqwest executor pointed at `config.base_url`.
	pub fn new(config: PipelineConfig, store: Arc<CredentialStore>) -> Result<Self> {
		let executor = ReqwestExecutor::new(config.base_url.clone())?;

		Ok(Self::with_executor(config, store, executor))
	}
}
impl<E> Clone for Pipeline<E>
where
	E: ?Sized + RequestExecutor,
{
	fn clone(&self) -> Self {
		Self {
			executor: self.executor.clone(),
			store: self.store.clone(),
			coordinator: self.coordinator.clone(),
			config: self.config.clone(),
			observers: self.observers.clone(),
		}
	}
}
impl<E> Debug for Pipeline<E>
where
	E: ?Sized + RequestExecutor,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Pipeline")
			.field("config", &self.config)
			.field("store", &self.store)
			.field("coordinator_state", &self.coordinator.state())
			.field("observers", &self.observers.len())
			.finish()
	}
}

fn flow_outcome<T>(result: &Result<T>) -> FlowOutcome {
	match result {
		Ok(_) => FlowOutcome::Success,
		Err(e) if e.is_session_expired() => FlowOutcome::SessionExpired,
		Err(_) => FlowOutcome::Failure,
	}
}
