//! Thread-safe in-memory [`CredentialVault`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	auth::Credential,
	store::{CredentialVault, StoreError, VaultFuture},
};

type Slot = Arc<RwLock<Option<Credential>>>;

/// Vault backend that keeps the credential in-process for tests and demos.
#[derive(Clone, Debug, Default)]
pub struct MemoryVault(Slot);
impl MemoryVault {
	fn load_now(slot: Slot) -> Option<Credential> {
		slot.read().clone()
	}

	fn store_now(slot: Slot, credential: Credential) -> Result<(), StoreError> {
		*slot.write() = Some(credential);

		Ok(())
	}

	fn clear_now(slot: Slot) -> Result<(), StoreError> {
		*slot.write() = None;

		Ok(())
	}
}
impl CredentialVault for MemoryVault {
	fn load(&self) -> VaultFuture<'_, Option<Credential>> {
		let slot = self.0.clone();

		Box::pin(async move { Ok(Self::load_now(slot)) })
	}

	fn store(&self, credential: Credential) -> VaultFuture<'_, ()> {
		let slot = self.0.clone();

		Box::pin(async move { Self::store_now(slot, credential) })
	}

	fn clear(&self) -> VaultFuture<'_, ()> {
		let slot = self.0.clone();

		Box::pin(async move { Self::clear_now(slot) })
	}
}
