//! Authenticated REST client orchestrating the credential store, authenticator, refresh
//! coordinator, and session lifecycle.

// self
use crate::{
	_prelude::*,
	auth::{Credential, Identity, TokenGrant},
	authenticator::RequestAuthenticator,
	error::{ConfigError, TransportError},
	http::{ApiRequest, ApiResponse, PreparedRequest, SessionHttpClient},
	obs::{self, FlowKind, FlowOutcome},
	refresh::{RefreshCoordinator, RefreshMetrics},
	session::{SessionHandle, SessionObserver, SessionSnapshot},
	store::{CredentialStore, CredentialVault},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

/// Backend paths assumed by the session layer, relative to the base URL.
pub mod endpoints {
	/// Login exchange; body `{principal, secret}`.
	pub const LOGIN: &str = "auth/login";
	/// Credential refresh; no body.
	pub const REFRESH: &str = "auth/refresh";
	/// Identity lookup for the current credential.
	pub const ME: &str = "auth/me";
}

#[cfg(feature = "reqwest")]
/// Session client specialized for the crate's default reqwest transport.
pub type ReqwestSessionClient = SessionClient<ReqwestHttpClient>;

/// Shape of backend error bodies carrying a human-readable message.
#[derive(Debug, Deserialize)]
struct ErrorBody {
	detail: Option<String>,
}

/// Authenticated REST client with transparent single-flight credential refresh.
///
/// The client owns the credential store, the request authenticator, the refresh
/// coordinator, and the session handle, so callers interact with one object: dispatch
/// resource requests, log in and out, and read the session snapshot. Authorization
/// handling is invisible to callers except when a refresh episode fails terminally.
#[derive(Clone)]
pub struct SessionClient<C>
where
	C: ?Sized + SessionHttpClient,
{
	/// Transport used for every outbound request.
	pub http_client: Arc<C>,
	/// Normalized base URL all request paths resolve against.
	pub base_url: Url,
	/// Authoritative credential holder.
	pub store: CredentialStore,
	/// Shared session state handle.
	pub session: SessionHandle,
	/// Counters for refresh episode outcomes.
	pub refresh_metrics: Arc<RefreshMetrics>,
	authenticator: RequestAuthenticator,
	refresh: RefreshCoordinator<C>,
}
impl<C> SessionClient<C>
where
	C: ?Sized + SessionHttpClient,
{
	/// Creates a client that reuses the caller-provided transport.
	///
	/// Loads any persisted credential from the vault before returning; the session
	/// starts in the loading phase until [`SessionClient::bootstrap`] settles.
	pub async fn with_http_client(
		base_url: impl AsRef<str>,
		vault: Arc<dyn CredentialVault>,
		http_client: impl Into<Arc<C>>,
	) -> Result<Self> {
		let base_url = normalize_base_url(base_url.as_ref())?;
		let http_client = http_client.into();
		let store = CredentialStore::open(vault).await;
		let session = SessionHandle::new();
		let refresh_metrics = Arc::new(RefreshMetrics::default());
		let refresh_url = base_url
			.join(endpoints::REFRESH)
			.map_err(|source| ConfigError::InvalidPath { source })?;
		let refresh = RefreshCoordinator::new(
			http_client.clone(),
			refresh_url,
			store.clone(),
			session.clone(),
			refresh_metrics.clone(),
		);
		let authenticator = RequestAuthenticator::new(store.clone());

		Ok(Self { http_client, base_url, store, session, refresh_metrics, authenticator, refresh })
	}

	/// Registers a presentation-layer observer for API errors and forced logouts.
	pub fn subscribe(&self, observer: Arc<dyn SessionObserver>) {
		self.session.subscribe(observer);
	}

	/// Dispatches a request through the full pipeline: bearer injection, authorization
	/// failure recovery, and a single transparent retry.
	///
	/// A request is retried at most once; a second authorization failure surfaces
	/// [`Error::AuthorizationExpired`] instead of re-entering the coordinator.
	pub async fn dispatch(&self, request: ApiRequest) -> Result<ApiResponse> {
		obs::observe(FlowKind::Request, "dispatch", obs::classify_result, async move {
			let prepared = self.prepare(&request)?;
			// The epoch must be captured before the credential is attached; see
			// `RefreshCoordinator::epoch`.
			let epoch = self.refresh.epoch();
			let mut first_try = prepared.clone();

			self.authenticator.attach(&mut first_try);

			let response = self.transport(first_try).await?;

			if !is_authorization_failure(response.status) {
				return self.unwrap_response(response);
			}

			let refreshed = self.refresh.recover(epoch).await?;
			let mut retry = prepared;

			RequestAuthenticator::attach_credential(&mut retry, &refreshed);

			let retried = self.transport(retry).await?;

			if is_authorization_failure(retried.status) {
				return Err(Error::AuthorizationExpired { status: retried.status });
			}

			self.unwrap_response(retried)
		})
		.await
	}

	/// Dispatches a GET request and decodes the JSON response body.
	pub async fn get_json<T>(&self, path: &str) -> Result<T>
	where
		T: DeserializeOwned,
	{
		self.dispatch(ApiRequest::get(path)).await?.json()
	}

	/// Dispatches a POST request with a JSON body and decodes the JSON response body.
	pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
	where
		B: Serialize,
		T: DeserializeOwned,
	{
		let value = serde_json::to_value(body).map_err(ConfigError::InvalidBody)?;

		self.dispatch(ApiRequest::post(path).json(value)).await?.json()
	}

	/// Dispatches a PUT request with a JSON body and decodes the JSON response body.
	pub async fn put_json<B, T>(&self, path: &str, body: &B) -> Result<T>
	where
		B: Serialize,
		T: DeserializeOwned,
	{
		let value = serde_json::to_value(body).map_err(ConfigError::InvalidBody)?;

		self.dispatch(ApiRequest::put(path).json(value)).await?.json()
	}

	/// Dispatches a DELETE request, discarding the response body.
	pub async fn delete(&self, path: &str) -> Result<()> {
		self.dispatch(ApiRequest::delete(path)).await?;

		Ok(())
	}

	/// Validates a persisted credential on startup and populates the identity.
	///
	/// Any failure resolves to a logged-out state with the stored credential cleared;
	/// the loading latch flips exactly once regardless of outcome. The identity call
	/// runs through the full dispatch pipeline, so an expired-but-refreshable credential
	/// still bootstraps an active session.
	pub async fn bootstrap(&self) -> SessionSnapshot {
		let classify = |authenticated: &bool| {
			if *authenticated { FlowOutcome::Success } else { FlowOutcome::Failure }
		};

		obs::observe(FlowKind::Bootstrap, "bootstrap", classify, async move {
			if self.store.get().is_none() {
				return false;
			}

			match self.fetch_identity().await {
				Ok(identity) => {
					self.session.set_identity(Some(identity));

					true
				},
				Err(_) => {
					self.store.clear().await;
					self.session.set_identity(None);

					false
				},
			}
		})
		.await;

		self.session.finish_loading();

		self.session_snapshot()
	}

	/// Exchanges credentials for a bearer token and populates the identity.
	///
	/// Fails with [`Error::Authentication`] carrying the backend's message when either
	/// the login exchange or the identity fetch fails; on failure no partial state is
	/// retained.
	pub async fn login(&self, principal: &str, secret: &str) -> Result<Identity> {
		obs::observe(FlowKind::Login, "login", obs::classify_result, async move {
			let body = serde_json::json!({ "principal": principal, "secret": secret });
			let request = self.prepare(&ApiRequest::post(endpoints::LOGIN).json(body))?;
			// The login exchange is unauthenticated and never engages the coordinator.
			let response = self
				.transport(request)
				.await
				.map_err(|err| Error::Authentication { reason: err.to_string() })?;

			if !response.is_success() {
				return Err(Error::Authentication { reason: error_message(&response) });
			}

			let grant: TokenGrant = response
				.json()
				.map_err(|err| Error::Authentication { reason: err.to_string() })?;

			self.store.set(Credential::new(grant.access_token)).await;

			match self.fetch_identity().await {
				Ok(identity) => {
					self.session.set_identity(Some(identity.clone()));

					Ok(identity)
				},
				Err(err) => {
					// Roll back so no credential outlives a failed identity fetch.
					self.store.clear().await;
					self.session.set_identity(None);

					Err(Error::Authentication { reason: err.to_string() })
				},
			}
		})
		.await
	}

	/// Clears the credential and identity. Idempotent, with no failure mode.
	pub async fn logout(&self) {
		self.store.clear().await;
		self.session.set_identity(None);
	}

	/// Returns the current session view.
	pub fn session_snapshot(&self) -> SessionSnapshot {
		let identity = self.session.identity();
		let authenticated = identity.is_some() && self.store.get().is_some();

		SessionSnapshot { identity, authenticated, loading: self.session.is_loading() }
	}

	/// Returns `true` iff both an identity and a credential are present.
	pub fn is_authenticated(&self) -> bool {
		self.session_snapshot().authenticated
	}

	async fn fetch_identity(&self) -> Result<Identity> {
		self.get_json(endpoints::ME).await
	}

	fn prepare(&self, request: &ApiRequest) -> Result<PreparedRequest> {
		let url = self
			.base_url
			.join(request.path.trim_start_matches('/'))
			.map_err(|source| ConfigError::InvalidPath { source })?;
		let body = match &request.body {
			Some(value) => Some(serde_json::to_vec(value).map_err(ConfigError::InvalidBody)?),
			None => None,
		};

		Ok(PreparedRequest { method: request.method, url, headers: request.headers.clone(), body })
	}

	async fn transport(&self, request: PreparedRequest) -> Result<ApiResponse> {
		self.http_client
			.execute(request)
			.await
			.map_err(|err| TransportError::network(err).into())
	}

	fn unwrap_response(&self, response: ApiResponse) -> Result<ApiResponse> {
		if response.is_success() {
			return Ok(response);
		}

		let status = response.status;
		let message = error_message(&response);

		self.session.notify_api_error(status);

		Err(Error::Api { status, message })
	}
}
#[cfg(feature = "reqwest")]
impl SessionClient<ReqwestHttpClient> {
	/// Creates a client with the crate's default reqwest transport.
	pub async fn new(base_url: impl AsRef<str>, vault: Arc<dyn CredentialVault>) -> Result<Self> {
		Self::with_http_client(base_url, vault, ReqwestHttpClient::default()).await
	}
}
impl<C> Debug for SessionClient<C>
where
	C: ?Sized + SessionHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SessionClient")
			.field("base_url", &self.base_url.as_str())
			.field("store", &self.store)
			.finish()
	}
}

/// Returns `true` for statuses that must route through the refresh coordinator.
const fn is_authorization_failure(status: u16) -> bool {
	matches!(status, 401 | 403)
}

/// Extracts the backend's `detail` message, falling back to a generic status line.
fn error_message(response: &ApiResponse) -> String {
	serde_json::from_slice::<ErrorBody>(&response.body)
		.ok()
		.and_then(|body| body.detail)
		.unwrap_or_else(|| format!("HTTP {}", response.status))
}

/// Parses and normalizes the base URL so relative path joins behave predictably.
fn normalize_base_url(raw: &str) -> Result<Url> {
	let mut url = Url::parse(raw).map_err(|source| ConfigError::InvalidBaseUrl { source })?;

	if !url.path().ends_with('/') {
		let path = format!("{}/", url.path());

		url.set_path(&path);
	}

	Ok(url)
}
