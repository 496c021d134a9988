//! Transport primitives: request descriptors, outcomes, and the executor contract.
//!
//! [`RequestExecutor`] is the pipeline's only dependency on an HTTP stack. An executor performs
//! exactly one outbound call for a fully formed [`RequestDescriptor`] and reports either a
//! [`RequestOutcome`] (any HTTP status, including errors) or a [`TransportError`] when no
//! response was received. Executors are stateless; authorization and retries live in the
//! pipeline.

// crates.io
#[cfg(feature = "reqwest")] use reqwest::header::{CONTENT_TYPE, HeaderName, HeaderValue};
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	error::{ConfigError, TransportError},
};

/// Boxed future returned by [`RequestExecutor::execute`].
pub type ExecuteFuture<'a> =
	Pin<Box<dyn Future<Output = Result<RequestOutcome, TransportError>> + 'a + Send>>;

/// Name of the header carrying the bearer credential.
pub const AUTHORIZATION: &str = "authorization";

/// Performs single outbound calls on behalf of the pipeline.
///
/// Implementations must be `Send + Sync + 'static` so one executor can be shared by every
/// clone of a pipeline, and the futures they return must be `Send`.
pub trait RequestExecutor
where
	Self: 'static + Send + Sync,
{
	/// Sends `request` and resolves with whatever the backend answered.
	fn execute<'a>(&'a self, request: &'a RequestDescriptor) -> ExecuteFuture<'a>;
}

/// HTTP methods used against the backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
	/// `GET`
	Get,
	/// `POST`
	Post,
	/// `PUT`
	Put,
	/// `PATCH`
	Patch,
	/// `DELETE`
	Delete,
}
impl Method {
	/// Returns the canonical method token.
	pub const fn as_str(self) -> &'static str {
		match self {
			Method::Get => "GET",
			Method::Post => "POST",
			Method::Put => "PUT",
			Method::Patch => "PATCH",
			Method::Delete => "DELETE",
		}
	}
}
impl Display for Method {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Value description of one outbound call.
///
/// The pipeline never alters a caller's descriptor; it sends an authorized copy instead.
/// Header names are stored lower-cased so replacing a header is case-insensitive.
#[derive(Clone, PartialEq)]
pub struct RequestDescriptor {
	/// HTTP method.
	pub method: Method,
	/// Path (and optional query) appended to the executor's base URL.
	pub path: String,
	/// Optional JSON body.
	pub body: Option<serde_json::Value>,
	/// Extra headers, keyed by lower-case name.
	pub headers: BTreeMap<String, String>,
	/// Per-request timeout, when the executor supports one.
	pub timeout: Option<Duration>,
}
impl RequestDescriptor {
	/// Creates a descriptor without body or headers.
	pub fn new(method: Method, path: impl Into<String>) -> Self {
		Self { method, path: path.into(), body: None, headers: BTreeMap::new(), timeout: None }
	}

	/// Shorthand for a `GET` descriptor.
	pub fn get(path: impl Into<String>) -> Self {
		Self::new(Method::Get, path)
	}

	/// Shorthand for a `POST` descriptor.
	pub fn post(path: impl Into<String>) -> Self {
		Self::new(Method::Post, path)
	}

	/// Shorthand for a `PUT` descriptor.
	pub fn put(path: impl Into<String>) -> Self {
		Self::new(Method::Put, path)
	}

	/// Shorthand for a `DELETE` descriptor.
	pub fn delete(path: impl Into<String>) -> Self {
		Self::new(Method::Delete, path)
	}

	/// Attaches a raw JSON body.
	pub fn with_body(mut self, body: serde_json::Value) -> Self {
		self.body = Some(body);

		self
	}

	/// Serializes `body` as the JSON request body.
	pub fn json<T>(self, body: &T) -> Result<Self, ConfigError>
	where
		T: ?Sized + Serialize,
	{
		Ok(self.with_body(serde_json::to_value(body)?))
	}

	/// Sets (or replaces) a header.
	pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
		self.headers.insert(name.as_ref().to_ascii_lowercase(), value.into());

		self
	}

	/// Bounds how long the executor may wait for this call.
	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = Some(timeout);

		self
	}

	/// Returns a header value by case-insensitive name.
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
	}

	/// Returns a copy carrying `Authorization: Bearer <token>`, or the unchanged copy when no
	/// token is available.
	pub fn authorized(&self, token: Option<&TokenSecret>) -> Self {
		let copy = self.clone();

		match token {
			Some(token) => copy.with_header(AUTHORIZATION, token.bearer()),
			None => copy,
		}
	}
}
impl Debug for RequestDescriptor {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let headers = self
			.headers
			.iter()
			.map(|(name, value)| {
				(name.as_str(), if name == AUTHORIZATION { "<redacted>" } else { value.as_str() })
			})
			.collect::<BTreeMap<_, _>>();

		f.debug_struct("RequestDescriptor")
			.field("method", &self.method)
			.field("path", &self.path)
			.field("body_set", &self.body.is_some())
			.field("headers", &headers)
			.field("timeout", &self.timeout)
			.finish()
	}
}

/// Result of one outbound call that produced an HTTP response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RequestOutcome {
	/// 2xx response.
	Success {
		/// HTTP status.
		status: u16,
		/// Raw response body.
		body: Vec<u8>,
	},
	/// Any other response; passed through to callers untouched.
	Failure {
		/// HTTP status.
		status: u16,
		/// Raw response body.
		body: Vec<u8>,
	},
}
impl RequestOutcome {
	/// HTTP status recognised as an authorization failure.
	pub const UNAUTHORIZED: u16 = 401;

	/// Classifies a response by status.
	pub fn from_parts(status: u16, body: Vec<u8>) -> Self {
		if (200..300).contains(&status) {
			Self::Success { status, body }
		} else {
			Self::Failure { status, body }
		}
	}

	/// HTTP status of the response.
	pub fn status(&self) -> u16 {
		match self {
			Self::Success { status, .. } | Self::Failure { status, .. } => *status,
		}
	}

	/// Raw response body.
	pub fn body(&self) -> &[u8] {
		match self {
			Self::Success { body, .. } | Self::Failure { body, .. } => body,
		}
	}

	/// Returns true for 2xx responses.
	pub fn is_success(&self) -> bool {
		matches!(self, Self::Success { .. })
	}

	/// Returns true when the backend rejected the access credential.
	pub fn is_unauthorized(&self) -> bool {
		matches!(self, Self::Failure { status: Self::UNAUTHORIZED, .. })
	}

	/// Decodes the body as JSON, reporting the failing path on error.
	pub fn json<T>(&self) -> Result<T>
	where
		T: serde::de::DeserializeOwned,
	{
		let mut deserializer = serde_json::Deserializer::from_slice(self.body());

		serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| Error::Decode { status: self.status(), source })
	}
}

/// Appends `path` to `base` verbatim, so a base of `http://host/v1` keeps its `/v1` prefix.
pub fn resolve_url(base: &Url, path: &str) -> Result<Url, ConfigError> {
	let joined = format!("{}{}", base.as_str().trim_end_matches('/'), path);

	Url::parse(&joined)
		.map_err(|source| ConfigError::InvalidRequestUrl { path: path.to_owned(), source })
}

/// [`RequestExecutor`] backed by a shared [`ReqwestClient`].
///
/// Descriptor timeouts map onto reqwest's per-request timeout and surface as
/// [`TransportError::Timeout`].
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestExecutor {
	client: ReqwestClient,
	base_url: Url,
}
#[cfg(feature = "reqwest")]
impl ReqwestExecutor {
	/// Creates an executor with a freshly built client.
	///
	/// Fails with [`ConfigError::HttpClientBuild`] when reqwest cannot initialise its client
	/// (for example a TLS backend that fails to load).
	pub fn new(base_url: Url) -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder().build()?;

		Ok(Self::with_client(client, base_url))
	}

	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient, base_url: Url) -> Self {
		Self { client, base_url }
	}

	/// Base URL requests are resolved against.
	pub fn base_url(&self) -> &Url {
		&self.base_url
	}

	fn build(&self, request: &RequestDescriptor) -> Result<reqwest::Request, TransportError> {
		let url = resolve_url(&self.base_url, &request.path).map_err(TransportError::network)?;
		let method = reqwest::Method::from_bytes(request.method.as_str().as_bytes())
			.map_err(TransportError::network)?;
		let mut builder = self.client.request(method, url);

		for (name, value) in &request.headers {
			let name = HeaderName::from_bytes(name.as_bytes()).map_err(TransportError::network)?;
			let value = HeaderValue::from_str(value).map_err(TransportError::network)?;

			builder = builder.header(name, value);
		}
		if let Some(body) = &request.body {
			let bytes = serde_json::to_vec(body).map_err(TransportError::network)?;

			builder = builder.header(CONTENT_TYPE, "application/json").body(bytes);
		}
		if let Some(timeout) = request.timeout.and_then(|t| std::time::Duration::try_from(t).ok())
		{
			builder = builder.timeout(timeout);
		}

		Ok(builder.build()?)
	}
}
#[cfg(feature = "reqwest")]
impl RequestExecutor for ReqwestExecutor {
	fn execute<'a>(&'a self, request: &'a RequestDescriptor) -> ExecuteFuture<'a> {
		Box::pin(async move {
			let prepared = self.build(request)?;
			let response = self.client.execute(prepared).await?;
			let status = response.status().as_u16();
			let body = response.bytes().await?.to_vec();

			Ok(RequestOutcome::from_parts(status, body))
		})
	}
}
