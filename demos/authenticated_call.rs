//! Demonstrates a login, an access token expiring mid-session, and the transparent refresh that
//! lets the call succeed, with the token pair persisted to a JSON file.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use url::Url;
// self
use reauth_pipeline::{
	auth::TokenSecret,
	config::PipelineConfig,
	http::RequestDescriptor,
	pipeline::{Pipeline, SessionEvent},
	store::{CredentialStore, FilePersistence},
};

const GRANT: &str = r#"{"access_token":"demo-access-2","refresh_token":"demo-refresh-2","user":{"id":"123","username":"testuser","permissions":["view_portfolios"]}}"#;

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let login = server
		.mock_async(|when, then| {
			when.method(POST).path("/v1/auth/login");
			then.status(200).header("content-type", "application/json").body(
				r#"{"access_token":"demo-access-1","refresh_token":"demo-refresh-1","user":{"id":"123","username":"testuser"}}"#,
			);
		})
		.await;

	server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/v1/portfolio-groups")
				.header("authorization", "Bearer demo-access-1");
			then.status(401).body(r#"{"detail":"Token expired"}"#);
		})
		.await;

	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/v1/auth/refresh");
			then.status(200).header("content-type", "application/json").body(GRANT);
		})
		.await;

	server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/v1/portfolio-groups")
				.header("authorization", "Bearer demo-access-2");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"portfolio_groups":[{"id":"growth","name":"Growth"}]}"#);
		})
		.await;

	let persistence = FilePersistence::open(std::env::temp_dir().join("reauth-pipeline-demo.json"))?;
	let store = Arc::new(CredentialStore::open(Arc::new(persistence.clone()))?);
	let config = PipelineConfig::builder(Url::parse(&server.url("/v1"))?).build()?;
	let pipeline = Pipeline::new(config, store)?.with_session_observer(Arc::new(
		|event: &SessionEvent| println!("Session event: {event:?}."),
	));
	let credential = pipeline.login("testuser", "password123").await?;

	println!(
		"Logged in with token {}.",
		credential.access_token.as_ref().map(TokenSecret::fingerprint).unwrap_or_default()
	);

	let outcome = pipeline.execute(RequestDescriptor::get("/portfolio-groups")).await?;

	println!(
		"Portfolio groups (HTTP {}): {}.",
		outcome.status(),
		String::from_utf8_lossy(outcome.body())
	);
	println!("Token pair persisted at {}.", persistence.path().display());

	login.assert_async().await;
	refresh.assert_async().await;
	pipeline.logout();

	Ok(())
}
