//! Per-request bearer header injection sourced from the credential store at dispatch
//! time, instead of a process-wide default header on the HTTP client.

// self
use crate::{_prelude::*, auth::Credential, http::PreparedRequest, store::CredentialStore};

/// Attaches the current credential to outgoing requests. Reads the store, never mutates
/// it, and cannot fail: an absent credential simply produces an unauthenticated request.
#[derive(Clone, Debug)]
pub struct RequestAuthenticator {
	store: CredentialStore,
}
impl RequestAuthenticator {
	/// Creates an authenticator over the provided store.
	pub fn new(store: CredentialStore) -> Self {
		Self { store }
	}

	/// Sets the `Authorization` header from the store's current credential, if any, and
	/// returns the credential that was attached.
	pub fn attach(&self, request: &mut PreparedRequest) -> Option<Credential> {
		let credential = self.store.get();

		if let Some(credential) = &credential {
			request.set_bearer(credential);
		}

		credential
	}

	/// Sets the `Authorization` header from an explicit credential; used by the retry
	/// path after a refresh settles.
	pub fn attach_credential(request: &mut PreparedRequest, credential: &Credential) {
		request.set_bearer(credential);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{
		http::Method,
		store::{CredentialVault, MemoryVault},
	};

	async fn store_over(vault: Arc<dyn CredentialVault>) -> CredentialStore {
		CredentialStore::open(vault).await
	}

	#[tokio::test]
	async fn attach_is_a_no_op_without_a_credential() {
		let store = store_over(Arc::new(MemoryVault::default())).await;
		let authenticator = RequestAuthenticator::new(store);
		let url = Url::parse("https://api.example.com/widgets")
			.expect("Fixture URL should parse successfully.");
		let mut request = PreparedRequest::new(Method::Get, url);

		assert!(authenticator.attach(&mut request).is_none());
		assert!(!request.headers.contains_key("authorization"));
	}

	#[tokio::test]
	async fn attach_uses_the_current_credential() {
		let store = store_over(Arc::new(MemoryVault::default())).await;

		store.set(Credential::new("live-token")).await;

		let authenticator = RequestAuthenticator::new(store);
		let url = Url::parse("https://api.example.com/widgets")
			.expect("Fixture URL should parse successfully.");
		let mut request = PreparedRequest::new(Method::Get, url);

		authenticator.attach(&mut request);

		assert_eq!(
			request.headers.get("authorization").map(String::as_str),
			Some("Bearer live-token"),
		);
	}
}
