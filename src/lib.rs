//! Bearer-token request pipeline with single-flight refresh. Every call carries the current
//! access token, and an expired token costs exactly one refresh exchange no matter how many
//! requests hit it at once.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod http;
pub mod obs;
pub mod pipeline;
pub mod store;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		config::PipelineConfig,
		http::ReqwestExecutor,
		pipeline::ReqwestPipeline,
		store::{CredentialStore, MemoryPersistence},
	};

	/// Builds a reqwest executor for a mock backend, ignoring proxy settings of the host.
	pub fn test_reqwest_executor(base_url: &str) -> ReqwestExecutor {
		let client = ReqwestClient::builder()
			.no_proxy()
			.build()
			.expect("Failed to build Reqwest client for tests.");
		let base_url = Url::parse(base_url).expect("Mock backend URL should parse.");

		ReqwestExecutor::with_client(client, base_url)
	}

	/// Constructs a [`ReqwestPipeline`] over an in-memory credential store pointed at a mock
	/// backend, returning the persistence backend for inspection.
	pub fn build_reqwest_test_pipeline(base_url: &str) -> (ReqwestPipeline, MemoryPersistence) {
		let persistence = MemoryPersistence::default();
		let store = CredentialStore::open(Arc::new(persistence.clone()))
			.expect("Empty in-memory store should open.");
		let config = PipelineConfig::builder(
			Url::parse(base_url).expect("Mock backend URL should parse."),
		)
		.build()
		.expect("Mock backend configuration should build.");
		let executor = test_reqwest_executor(base_url);
		let pipeline = ReqwestPipeline::with_executor(config, Arc::new(store), executor);

		(pipeline, persistence)
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use {color_eyre as _, httpmock as _};
