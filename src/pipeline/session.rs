//! Session lifecycle: login, logout, and the events observers receive.

// self
use crate::{
	_prelude::*,
	auth::{Credential, SessionGrant},
	http::{RequestDescriptor, RequestExecutor},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	pipeline::Pipeline,
};

/// Why a session ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SessionEndReason {
	/// The application logged the user out.
	Logout,
	/// A `401` arrived while no refresh token was stored.
	MissingRefreshToken,
	/// The refresh endpoint answered with a non-2xx status.
	RefreshRejected {
		/// HTTP status of the refresh response.
		status: u16,
	},
	/// The refresh exchange failed before a response arrived.
	RefreshTransport,
	/// The refresh exchange exceeded the configured timeout.
	RefreshTimeout,
	/// The refresh endpoint answered 2xx without a usable grant.
	RefreshMalformed,
	/// The credential was cleared (by another caller's failed refresh or a logout) while this
	/// call waited or refreshed.
	CredentialCleared,
}
impl SessionEndReason {
	/// Stable label used for metrics.
	pub const fn as_label(self) -> &'static str {
		match self {
			Self::Logout => "logout",
			Self::MissingRefreshToken => "missing_refresh_token",
			Self::RefreshRejected { .. } => "refresh_rejected",
			Self::RefreshTransport => "refresh_transport",
			Self::RefreshTimeout => "refresh_timeout",
			Self::RefreshMalformed => "refresh_malformed",
			Self::CredentialCleared => "credential_cleared",
		}
	}
}
impl Display for SessionEndReason {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::Logout => f.write_str("the user logged out"),
			Self::MissingRefreshToken => f.write_str("no refresh token is stored"),
			Self::RefreshRejected { status } =>
				write!(f, "the refresh endpoint answered HTTP {status}"),
			Self::RefreshTransport => f.write_str("the refresh exchange failed in transit"),
			Self::RefreshTimeout => f.write_str("the refresh exchange timed out"),
			Self::RefreshMalformed => f.write_str("the refresh response carried no usable grant"),
			Self::CredentialCleared => f.write_str("the credential was cleared by another caller"),
		}
	}
}

/// Lifecycle notifications emitted by a pipeline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
	/// A login installed a new credential.
	Started {
		/// When the event was raised.
		at: OffsetDateTime,
	},
	/// A refresh exchange installed a renewed credential.
	Renewed {
		/// When the event was raised.
		at: OffsetDateTime,
	},
	/// The credential was cleared; the user has to authenticate again.
	Ended {
		/// Why the session ended.
		reason: SessionEndReason,
		/// When the event was raised.
		at: OffsetDateTime,
	},
}

/// Receives [`SessionEvent`]s, e.g. to route the user back to the login screen.
///
/// Observers run inline on the task that triggered the event and must not block.
pub trait SessionObserver
where
	Self: Send + Sync,
{
	/// Handles one event.
	fn on_session_event(&self, event: &SessionEvent);
}
impl<F> SessionObserver for F
where
	F: Send + Sync + Fn(&SessionEvent),
{
	fn on_session_event(&self, event: &SessionEvent) {
		self(event)
	}
}

#[derive(Serialize)]
struct LoginRequest<'a> {
	username: &'a str,
	password: &'a str,
}

impl<E> Pipeline<E>
where
	E: ?Sized + RequestExecutor,
{
	/// Authenticates with username and password and installs the returned credential.
	///
	/// The login call is never authorized or refreshed; a non-2xx answer yields
	/// [`Error::LoginRejected`].
	pub async fn login(&self, username: &str, password: &str) -> Result<Arc<Credential>> {
		let span = FlowSpan::new(FlowKind::Login, "login");
		let result = span
			.instrument(async move {
				let request = RequestDescriptor::post(&self.config.login_path)
					.json(&LoginRequest { username, password })?;

				self.coordinator.wait_if_refreshing().await;

				let outcome = self.executor.execute(&request).await?;

				if !outcome.is_success() {
					return Err(Error::LoginRejected { status: outcome.status() });
				}

				let grant = outcome.json::<SessionGrant>()?;
				let credential = self.store.replace(grant.into());

				self.notify(SessionEvent::Started { at: OffsetDateTime::now_utc() });

				Ok::<_, Error>(credential)
			})
			.await;

		span.finish(if result.is_ok() { FlowOutcome::Success } else { FlowOutcome::Failure });

		result
	}

	/// Clears the credential and announces the end of the session.
	///
	/// A refresh that is in flight at this point is discarded when it completes.
	pub fn logout(&self) {
		self.store.clear();
		self.announce_session_end(SessionEndReason::Logout);
	}

	/// Announces a terminal session end and returns the matching error.
	pub(super) fn end_session(&self, reason: SessionEndReason) -> Error {
		self.announce_session_end(reason);

		Error::SessionExpired { reason }
	}

	fn announce_session_end(&self, reason: SessionEndReason) {
		obs::warn_session_ended(reason);
		self.notify(SessionEvent::Ended { reason, at: OffsetDateTime::now_utc() });
	}
}
