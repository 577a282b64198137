//! Auth-domain models: the bearer credential, the backend identity record, and the token
//! issuance wire shape.

pub mod credential;
pub mod identity;

pub use credential::*;
pub use identity::*;

// self
use crate::_prelude::*;

/// Wire representation of a token issuance response from the login or refresh endpoint.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenGrant {
	/// Opaque bearer token issued by the backend.
	pub access_token: String,
}
