//! Pipeline configuration: backend location, auth endpoints, and refresh timeout.

// std
use std::env;
// self
use crate::{_prelude::*, error::ConfigError};

/// Environment variable consulted by [`PipelineConfig::from_env`].
pub const BASE_URL_ENV: &str = "REAUTH_API_URL";
/// Backend base URL used when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/v1";
/// Default path of the token refresh endpoint.
pub const DEFAULT_REFRESH_PATH: &str = "/auth/refresh";
/// Default path of the login endpoint.
pub const DEFAULT_LOGIN_PATH: &str = "/auth/login";
/// Default bound on a refresh exchange.
pub const DEFAULT_REFRESH_TIMEOUT: Duration = Duration::seconds(30);

/// Immutable configuration shared by every clone of a pipeline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipelineConfig {
	/// Base URL that request paths are appended to.
	pub base_url: Url,
	/// Path of the refresh endpoint (`POST`, body `{ "refresh_token": ... }`).
	pub refresh_path: String,
	/// Path of the login endpoint (`POST`, body `{ "username": ..., "password": ... }`).
	pub login_path: String,
	/// Upper bound for a refresh exchange; a timeout counts as a refresh failure.
	pub refresh_timeout: Option<Duration>,
}
impl PipelineConfig {
	/// Starts a builder for the provided base URL.
	pub fn builder(base_url: Url) -> PipelineConfigBuilder {
		PipelineConfigBuilder::new(base_url)
	}

	/// Reads the base URL from `REAUTH_API_URL`, falling back to [`DEFAULT_BASE_URL`].
	pub fn from_env() -> Result<Self, ConfigError> {
		let raw = env::var(BASE_URL_ENV).unwrap_or_else(|_| DEFAULT_BASE_URL.to_owned());
		let base_url =
			Url::parse(raw.trim()).map_err(|source| ConfigError::InvalidBaseUrl { source })?;

		Self::builder(base_url).build()
	}
}

/// Validating builder for [`PipelineConfig`].
#[derive(Clone, Debug)]
pub struct PipelineConfigBuilder {
	config: PipelineConfig,
}
impl PipelineConfigBuilder {
	fn new(base_url: Url) -> Self {
		Self {
			config: PipelineConfig {
				base_url,
				refresh_path: DEFAULT_REFRESH_PATH.into(),
				login_path: DEFAULT_LOGIN_PATH.into(),
				refresh_timeout: Some(DEFAULT_REFRESH_TIMEOUT),
			},
		}
	}

	/// Overrides the refresh endpoint path.
	pub fn refresh_path(mut self, path: impl Into<String>) -> Self {
		self.config.refresh_path = path.into();

		self
	}

	/// Overrides the login endpoint path.
	pub fn login_path(mut self, path: impl Into<String>) -> Self {
		self.config.login_path = path.into();

		self
	}

	/// Overrides the refresh timeout; `None` lets a refresh wait indefinitely.
	pub fn refresh_timeout(mut self, timeout: Option<Duration>) -> Self {
		self.config.refresh_timeout = timeout;

		self
	}

	/// Validates and returns the configuration.
	pub fn build(self) -> Result<PipelineConfig, ConfigError> {
		let config = self.config;
		let base = &config.base_url;

		if !matches!(base.scheme(), "http" | "https")
			|| base.query().is_some()
			|| base.fragment().is_some()
		{
			return Err(ConfigError::UnsupportedBaseUrl { url: base.to_string() });
		}

		validate_path("refresh", &config.refresh_path)?;
		validate_path("login", &config.login_path)?;

		if config.refresh_timeout.is_some_and(|timeout| !timeout.is_positive()) {
			return Err(ConfigError::NonPositiveTimeout);
		}

		Ok(config)
	}
}

fn validate_path(endpoint: &'static str, path: &str) -> Result<(), ConfigError> {
	if path.starts_with('/') {
		Ok(())
	} else {
		Err(ConfigError::InvalidPath { endpoint, path: path.to_owned() })
	}
}
