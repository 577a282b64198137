//! Session-level error types shared across the client, coordinator, and stores.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical session error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Store(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS, malformed payload).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// Backend rejected the login credentials; never retried automatically.
	#[error("Authentication failed: {reason}.")]
	Authentication {
		/// Backend-supplied message, usually the `detail` field of the error body.
		reason: String,
	},
	/// A request retried with a fresh credential was rejected again; terminal for the caller.
	#[error("Request was rejected with an authorization failure (HTTP {status}).")]
	AuthorizationExpired {
		/// HTTP status returned by the retried request.
		status: u16,
	},
	/// The refresh call itself failed; the session has been terminated.
	#[error("Credential refresh failed; the session has been terminated.")]
	RefreshFailed {
		/// HTTP status returned by the refresh endpoint, when one was observed.
		status: Option<u16>,
	},
	/// Generic non-2xx response unrelated to authorization (404/500-class).
	#[error("Backend returned HTTP {status}: {message}.")]
	Api {
		/// HTTP status code of the response.
		status: u16,
		/// Backend-supplied message, or a generic status line.
		message: String,
	},
}

/// Configuration and validation failures raised by the session client.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Base URL cannot be parsed.
	#[error("Base URL is invalid.")]
	InvalidBaseUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Request path cannot be resolved against the base URL.
	#[error("Request path is invalid.")]
	InvalidPath {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Request body cannot be serialized to JSON.
	#[error("Request body could not be serialized.")]
	InvalidBody(#[from] serde_json::Error),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO, undecodable payloads).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the backend.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the backend.")]
	Io(#[from] std::io::Error),
	/// Response body could not be decoded as the expected JSON shape.
	#[error("Backend returned a malformed JSON body.")]
	Decode {
		/// Structured parsing failure with the offending path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code of the response, when available.
		status: Option<u16>,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::store::StoreError;

	#[test]
	fn store_error_converts_into_session_error_with_source() {
		let store_error = StoreError::Backend { message: "disk full".into() };
		let session_error: Error = store_error.clone().into();

		assert!(matches!(session_error, Error::Store(_)));
		assert!(session_error.to_string().contains("disk full"));

		let source = StdError::source(&session_error)
			.expect("Session error should expose the original store error as its source.");

		assert_eq!(source.to_string(), store_error.to_string());
	}

	#[test]
	fn refresh_failed_mentions_termination() {
		let err = Error::RefreshFailed { status: Some(401) };

		assert!(err.to_string().contains("terminated"));
	}
}
