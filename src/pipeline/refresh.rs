//! Leader-side refresh exchange.

// self
use crate::{
	_prelude::*,
	auth::SessionGrant,
	coordinator::RefreshLease,
	error::TransportError,
	http::{RequestDescriptor, RequestExecutor, RequestOutcome},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	pipeline::{Pipeline, SessionEndReason, SessionEvent},
	store::CredentialSnapshot,
};

#[derive(Serialize)]
struct RefreshRequest<'a> {
	refresh_token: &'a str,
}

impl<E> Pipeline<E>
where
	E: ?Sized + RequestExecutor,
{
	/// Runs the refresh exchange while holding `lease`, commits its result to the store, releases
	/// leadership, and then replays `request` once.
	///
	/// Commits are conditional on the generation the exchange started from. When a logout or
	/// login moved the store on in the meantime, the leader neither installs nor clears anything
	/// and replays against whatever the store holds now.
	pub(super) async fn lead_refresh(
		&self,
		lease: RefreshLease<'_>,
		request: &RequestDescriptor,
		current: CredentialSnapshot,
	) -> Result<RequestOutcome> {
		match self.refresh_session(&current).await {
			Ok(()) => {
				let renewed = self.store.snapshot();

				drop(lease);
				self.notify(SessionEvent::Renewed { at: OffsetDateTime::now_utc() });

				self.replay(request, renewed).await
			},
			Err(reason) => {
				let ended = reason != SessionEndReason::CredentialCleared
					&& self.store.clear_if(current.generation);

				if ended {
					drop(lease);

					return Err(self.end_session(reason));
				}

				let superseded = self.store.snapshot();

				obs::trace_step("superseded", superseded.generation);
				drop(lease);

				self.replay(request, superseded).await
			},
		}
	}

	/// Exchanges the stored refresh token for a new credential and installs it, provided the
	/// store is still at the generation of `current`.
	///
	/// A store that moved on during the exchange yields [`SessionEndReason::CredentialCleared`].
	async fn refresh_session(&self, current: &CredentialSnapshot) -> Result<(), SessionEndReason> {
		let span = FlowSpan::new(FlowKind::Refresh, "refresh_session");
		let started = OffsetDateTime::now_utc();
		let result = span
			.instrument(async move {
				let (credential, refresh_token) = current
					.credential
					.as_deref()
					.and_then(|credential| {
						credential.refresh_token.as_ref().map(|token| (credential, token))
					})
					.ok_or(SessionEndReason::MissingRefreshToken)?;

				self.coordinator.metrics().record_attempt();

				let mut exchange = RequestDescriptor::post(&self.config.refresh_path)
					.json(&RefreshRequest { refresh_token: refresh_token.expose() })
					.map_err(|_| SessionEndReason::RefreshMalformed)?;

				if let Some(timeout) = self.config.refresh_timeout {
					exchange = exchange.with_timeout(timeout);
				}

				let outcome = self.executor.execute(&exchange).await.map_err(|e| match e {
					TransportError::Timeout => SessionEndReason::RefreshTimeout,
					_ => SessionEndReason::RefreshTransport,
				})?;

				if !outcome.is_success() {
					return Err(SessionEndReason::RefreshRejected { status: outcome.status() });
				}

				let grant = outcome
					.json::<SessionGrant>()
					.map_err(|_| SessionEndReason::RefreshMalformed)?;

				self.store
					.replace_if(current.generation, credential.renewed(grant))
					.ok_or(SessionEndReason::CredentialCleared)?;

				Ok::<_, SessionEndReason>(())
			})
			.await;

		obs::record_refresh_latency(OffsetDateTime::now_utc() - started);

		match &result {
			Ok(()) => {
				self.coordinator.metrics().record_success();
				span.finish(FlowOutcome::Success);
			},
			Err(_) => {
				self.coordinator.metrics().record_failure();
				span.finish(FlowOutcome::SessionExpired);
			},
		}

		result
	}
}
