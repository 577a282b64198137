//! Identity record returned by the backend's "who am I" endpoint.

// self
use crate::_prelude::*;

/// Authenticated principal as reported by `GET /auth/me`.
///
/// An identity is only ever populated from a response produced by a valid credential;
/// the session layer never fabricates one locally.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
	/// Stable backend identifier.
	pub id: String,
	/// Display username.
	pub username: String,
	/// Contact email address.
	pub email: String,
	/// Whether the account is active server-side.
	pub is_active: bool,
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn identity_deserializes_from_backend_shape() {
		let identity: Identity = serde_json::from_str(
			"{\"id\":\"u-1\",\"username\":\"admin\",\"email\":\"admin@example.com\",\"is_active\":true}",
		)
		.expect("Identity should deserialize from the backend response shape.");

		assert_eq!(identity.username, "admin");
		assert!(identity.is_active);
	}
}
