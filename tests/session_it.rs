#![cfg(feature = "reqwest")]

// crates.io
use httpmock::prelude::*;
// self
use bearer_session::{_preludet::*, store::CredentialVault};

const IDENTITY_BODY: &str =
	"{\"id\":\"u-1\",\"username\":\"admin\",\"email\":\"admin@example.com\",\"is_active\":true}";

#[tokio::test]
async fn login_stores_credential_and_identity() {
	let server = MockServer::start_async().await;
	let (client, _vault) = build_reqwest_test_client(&server.base_url()).await;
	let login_mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/auth/login")
				.json_body(serde_json::json!({ "principal": "admin", "secret": "hunter2" }));
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"issued-token\"}");
		})
		.await;
	let me_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/auth/me").header("authorization", "Bearer issued-token");
			then.status(200).header("content-type", "application/json").body(IDENTITY_BODY);
		})
		.await;
	let identity = client.login("admin", "hunter2").await.expect("Login should succeed.");

	login_mock.assert_async().await;
	me_mock.assert_async().await;

	assert_eq!(identity.username, "admin");
	assert!(client.is_authenticated());
	assert_eq!(
		client.store.get().map(|credential| credential.expose().to_owned()),
		Some("issued-token".into()),
	);
}

#[tokio::test]
async fn rejected_login_surfaces_the_backend_message() {
	let server = MockServer::start_async().await;
	let (client, _vault) = build_reqwest_test_client(&server.base_url()).await;
	let _login_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/login");
			then.status(401)
				.header("content-type", "application/json")
				.body("{\"detail\":\"Incorrect username or password\"}");
		})
		.await;
	let err = client
		.login("admin", "wrong")
		.await
		.expect_err("Rejected credentials should fail the login.");

	assert!(matches!(
		err,
		Error::Authentication { ref reason } if reason == "Incorrect username or password"
	));
	assert!(client.store.get().is_none());
	assert!(!client.is_authenticated());
}

#[tokio::test]
async fn failed_identity_fetch_rolls_back_the_login() {
	let server = MockServer::start_async().await;
	let (client, _vault) = build_reqwest_test_client(&server.base_url()).await;
	let _login_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/login");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"issued-token\"}");
		})
		.await;
	// Identity lookup fails outright; the refresh fallback is rejected too.
	let _me_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/auth/me");
			then.status(401);
		})
		.await;
	let _refresh_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh");
			then.status(401);
		})
		.await;
	let err = client
		.login("admin", "hunter2")
		.await
		.expect_err("Login should fail when the identity fetch fails.");

	assert!(matches!(err, Error::Authentication { .. }));
	assert!(
		client.store.get().is_none(),
		"No credential may remain after a rolled-back login.",
	);
	assert!(client.session.identity().is_none());
}

#[tokio::test]
async fn bootstrap_validates_a_stored_credential() {
	let server = MockServer::start_async().await;
	let (client, _vault) = build_seeded_test_client(&server.base_url(), "stored-token").await;
	let me_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/auth/me").header("authorization", "Bearer stored-token");
			then.status(200).header("content-type", "application/json").body(IDENTITY_BODY);
		})
		.await;

	assert!(client.session.is_loading());

	let snapshot = client.bootstrap().await;

	me_mock.assert_async().await;

	assert!(snapshot.authenticated);
	assert!(!snapshot.loading);
	assert_eq!(snapshot.identity.map(|identity| identity.username), Some("admin".into()));
}

#[tokio::test]
async fn bootstrap_with_rejected_credential_resolves_logged_out() {
	let server = MockServer::start_async().await;
	let (client, _vault) = build_seeded_test_client(&server.base_url(), "revoked-token").await;
	let _me_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/auth/me");
			then.status(401);
		})
		.await;
	let _refresh_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh");
			then.status(401);
		})
		.await;

	assert!(client.session.is_loading());

	let snapshot = client.bootstrap().await;

	assert!(!snapshot.authenticated);
	assert!(!snapshot.loading);
	assert!(snapshot.identity.is_none());
	assert!(client.store.get().is_none(), "Rejected stored credential must be removed.");
	assert!(
		!client.session.finish_loading(),
		"The loading latch must have flipped exactly once during bootstrap.",
	);
}

#[tokio::test]
async fn bootstrap_without_credential_skips_the_backend() {
	let server = MockServer::start_async().await;
	let (client, _vault) = build_reqwest_test_client(&server.base_url()).await;
	let me_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/auth/me");
			then.status(200).header("content-type", "application/json").body(IDENTITY_BODY);
		})
		.await;
	let snapshot = client.bootstrap().await;

	me_mock.assert_calls_async(0).await;

	assert!(!snapshot.authenticated);
	assert!(!snapshot.loading);
}

#[tokio::test]
async fn logout_is_idempotent() {
	let server = MockServer::start_async().await;
	let (client, vault) = build_seeded_test_client(&server.base_url(), "stored-token").await;
	let me_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/auth/me");
			then.status(200).header("content-type", "application/json").body(IDENTITY_BODY);
		})
		.await;

	client.bootstrap().await;

	me_mock.assert_async().await;
	assert!(client.is_authenticated());

	client.logout().await;

	assert!(!client.is_authenticated());
	assert!(client.store.get().is_none());

	client.logout().await;

	assert!(!client.is_authenticated());
	assert!(client.store.get().is_none());
	assert!(
		vault
			.load()
			.await
			.expect("Vault load should succeed after logout.")
			.is_none(),
		"Durable storage must be cleared by logout.",
	);
}
