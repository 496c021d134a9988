//! Pipeline-level error types shared across the executor, store, and session flows.

// self
use crate::{_prelude::*, pipeline::SessionEndReason};

/// Pipeline-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical pipeline error exposed by public APIs.
///
/// Callers only ever need to tell two things apart: the request's own outcome (returned as
/// `Ok` even for non-2xx statuses, or as [`Error::Transport`]) and [`Error::SessionExpired`],
/// which means the user has to authenticate again.
#[derive(Debug, ThisError)]
pub enum Error {
	/// The session ended and the credential store has been cleared.
	#[error("Session expired: {reason}.")]
	SessionExpired {
		/// Why the session could not be renewed.
		reason: SessionEndReason,
	},
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS, timeout).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// Response body could not be decoded into the requested type.
	#[error("Response body with HTTP {status} could not be decoded.")]
	Decode {
		/// HTTP status of the decoded response.
		status: u16,
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Backend refused the supplied login credentials.
	#[error("Login was rejected with HTTP {status}.")]
	LoginRejected {
		/// HTTP status returned by the login endpoint.
		status: u16,
	},
}
impl Error {
	/// Returns true when the caller must route the user back to authentication.
	pub fn is_session_expired(&self) -> bool {
		matches!(self, Self::SessionExpired { .. })
	}
}

/// Configuration and validation failures raised while building the pipeline.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Base URL cannot be parsed.
	#[error("Base URL is invalid.")]
	InvalidBaseUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Base URL uses a scheme other than http(s) or carries a query/fragment.
	#[error("Base URL `{url}` must be a plain http(s) URL without query or fragment.")]
	UnsupportedBaseUrl {
		/// Offending URL.
		url: String,
	},
	/// Endpoint path does not start with `/`.
	#[error("The {endpoint} path `{path}` must start with `/`.")]
	InvalidPath {
		/// Endpoint label.
		endpoint: &'static str,
		/// Offending path.
		path: String,
	},
	/// Request path could not be joined onto the base URL.
	#[error("Request path `{path}` does not form a valid URL.")]
	InvalidRequestUrl {
		/// Offending path.
		path: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Refresh timeout must be strictly positive.
	#[error("The refresh timeout must be positive.")]
	NonPositiveTimeout,
	/// Request body could not be serialized.
	#[error("Request body could not be serialized.")]
	BodySerialize(#[from] serde_json::Error),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO, timeout) reported by request executors.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the backend.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// The request did not complete within its timeout.
	#[error("Request to the backend timed out.")]
	Timeout,
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the backend.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() { Self::Timeout } else { Self::network(e) }
	}
}
