//! Credential persistence: the durable vault contract, built-in backends, and the
//! in-process [`CredentialStore`] that is the single source of truth for "is a
//! credential present".

pub mod file;
pub mod memory;

pub use file::FileVault;
pub use memory::MemoryVault;

// self
use crate::{_prelude::*, auth::Credential, obs};

/// Boxed future returned by [`CredentialVault`] operations.
pub type VaultFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Durable storage contract for the current bearer credential.
///
/// A vault holds at most one credential; absence means logged-out. Vault durability is
/// best-effort: the [`CredentialStore`] swallows write failures and keeps its in-memory
/// value authoritative.
pub trait CredentialVault
where
	Self: Send + Sync,
{
	/// Reads the persisted credential, if any.
	fn load(&self) -> VaultFuture<'_, Option<Credential>>;

	/// Persists or replaces the credential.
	fn store(&self, credential: Credential) -> VaultFuture<'_, ()>;

	/// Removes the persisted credential.
	fn clear(&self) -> VaultFuture<'_, ()>;
}

/// Error type produced by [`CredentialVault`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// Process-wide holder of the current bearer credential.
///
/// The in-memory value is authoritative; the vault only exists so the credential
/// survives process restarts. Reads never fail and never touch the vault.
#[derive(Clone)]
pub struct CredentialStore {
	current: Arc<RwLock<Option<Credential>>>,
	vault: Arc<dyn CredentialVault>,
}
impl CredentialStore {
	/// Opens a store over the provided vault, eagerly loading any persisted credential.
	///
	/// A vault read failure degrades to an empty store instead of propagating.
	pub async fn open(vault: Arc<dyn CredentialVault>) -> Self {
		let current = match vault.load().await {
			Ok(credential) => credential,
			Err(err) => {
				obs::record_store_failure("load", &err);

				None
			},
		};

		Self { current: Arc::new(RwLock::new(current)), vault }
	}

	/// Returns the current credential, if any.
	pub fn get(&self) -> Option<Credential> {
		self.current.read().clone()
	}

	/// Replaces the credential in memory, then persists it best-effort.
	///
	/// The in-memory value is swapped first so every subsequent request observes the new
	/// credential even when the vault write fails.
	pub async fn set(&self, credential: Credential) {
		*self.current.write() = Some(credential.clone());

		if let Err(err) = self.vault.store(credential).await {
			obs::record_store_failure("store", &err);
		}
	}

	/// Removes the credential from memory and, best-effort, from the vault.
	pub async fn clear(&self) {
		*self.current.write() = None;

		if let Err(err) = self.vault.clear().await {
			obs::record_store_failure("clear", &err);
		}
	}
}
impl Debug for CredentialStore {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredentialStore")
			.field("credential_present", &self.current.read().is_some())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	struct FailingVault;
	impl CredentialVault for FailingVault {
		fn load(&self) -> VaultFuture<'_, Option<Credential>> {
			Box::pin(async { Err(StoreError::Backend { message: "unavailable".into() }) })
		}

		fn store(&self, _credential: Credential) -> VaultFuture<'_, ()> {
			Box::pin(async { Err(StoreError::Backend { message: "unavailable".into() }) })
		}

		fn clear(&self) -> VaultFuture<'_, ()> {
			Box::pin(async { Err(StoreError::Backend { message: "unavailable".into() }) })
		}
	}

	#[tokio::test]
	async fn vault_failures_are_swallowed() {
		let store = CredentialStore::open(Arc::new(FailingVault)).await;

		assert!(store.get().is_none());

		store.set(Credential::new("in-memory-only")).await;

		assert_eq!(store.get().map(|c| c.expose().to_owned()), Some("in-memory-only".into()));

		store.clear().await;

		assert!(store.get().is_none());
	}

	#[tokio::test]
	async fn open_loads_persisted_credential() {
		let vault = Arc::new(MemoryVault::default());

		vault
			.store(Credential::new("persisted"))
			.await
			.expect("Memory vault store should succeed.");

		let store = CredentialStore::open(vault).await;

		assert_eq!(store.get().map(|c| c.expose().to_owned()), Some("persisted".into()));
	}
}
