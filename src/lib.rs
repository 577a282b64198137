//! Bearer-token session layer for REST clients: durable credential stores, single-flight
//! refresh, and transparent 401 retry in one crate.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod authenticator;
pub mod client;
pub mod error;
pub mod http;
pub mod obs;
pub mod refresh;
pub mod session;
pub mod store;
#[cfg(feature = "reqwest")]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests, available whenever the
	//! default reqwest transport is enabled.

	pub use crate::_prelude::*;

	// self
	use crate::{
		auth::Credential,
		client::SessionClient,
		http::ReqwestHttpClient,
		store::{CredentialVault, MemoryVault},
	};

	/// Client type alias used by reqwest-backed integration tests.
	pub type ReqwestTestClient = SessionClient<ReqwestHttpClient>;

	/// Constructs a [`SessionClient`] backed by an in-memory vault and the default reqwest
	/// transport used across integration tests.
	pub async fn build_reqwest_test_client(base_url: &str) -> (ReqwestTestClient, Arc<MemoryVault>) {
		let vault_backend = Arc::new(MemoryVault::default());
		let vault: Arc<dyn CredentialVault> = vault_backend.clone();
		let client = SessionClient::new(base_url, vault)
			.await
			.expect("Failed to build reqwest session client for tests.");

		(client, vault_backend)
	}

	/// Constructs a test client whose store is pre-seeded with the provided access token.
	pub async fn build_seeded_test_client(
		base_url: &str,
		token: &str,
	) -> (ReqwestTestClient, Arc<MemoryVault>) {
		let (client, vault) = build_reqwest_test_client(base_url).await;

		client.store.set(Credential::new(token)).await;

		(client, vault)
	}
}

mod _prelude {
	pub use std::{
		collections::BTreeMap,
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
	pub use serde::{Deserialize, Serialize, de::DeserializeOwned};
	pub use thiserror::Error as ThisError;
	pub use time::OffsetDateTime;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use {color_eyre as _, httpmock as _};
