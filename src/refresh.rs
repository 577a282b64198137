//! Single-flight credential refresh coordination.
//!
//! The coordinator guarantees that for any number of requests failing with an
//! authorization error while no refresh is in flight, exactly one call reaches the
//! refresh endpoint, and every failed request settles from that single outcome. The
//! Idle/Refreshing flag and waiting list of the classic formulation are realized as an
//! async flight guard plus a monotonically increasing episode serial: waiters queue on
//! the guard, and a serial mismatch after acquisition means an episode already settled,
//! so the waiter coalesces onto the stored outcome instead of rotating again. A failed
//! episode is terminal: the credential is cleared, the session terminates, and no backoff
//! retry is attempted, since an expired or revoked refresh credential will not self-heal.

mod metrics;

pub use metrics::RefreshMetrics;

// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::{
	_prelude::*,
	auth::{Credential, TokenGrant},
	http::{Method, PreparedRequest, SessionHttpClient},
	obs::{self, FlowKind},
	session::SessionHandle,
	store::CredentialStore,
};

/// Opaque marker for the refresh episode a request was authenticated under.
///
/// Captured before the credential is attached and handed back to
/// [`RefreshCoordinator::recover`] when the request fails with an authorization error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RefreshEpoch(u64);

/// Serializes credential refresh episodes across concurrent request failures.
#[derive(Clone)]
pub struct RefreshCoordinator<C>
where
	C: ?Sized + SessionHttpClient,
{
	http_client: Arc<C>,
	refresh_url: Url,
	store: CredentialStore,
	session: SessionHandle,
	metrics: Arc<RefreshMetrics>,
	flight: Arc<AsyncMutex<()>>,
	settled: Arc<AtomicU64>,
	last_failure: Arc<Mutex<Option<u16>>>,
}
impl<C> RefreshCoordinator<C>
where
	C: ?Sized + SessionHttpClient,
{
	/// Creates a coordinator over the shared transport, store, and session handle.
	pub fn new(
		http_client: Arc<C>,
		refresh_url: Url,
		store: CredentialStore,
		session: SessionHandle,
		metrics: Arc<RefreshMetrics>,
	) -> Self {
		Self {
			http_client,
			refresh_url,
			store,
			session,
			metrics,
			flight: Arc::new(AsyncMutex::new(())),
			settled: Arc::new(AtomicU64::new(0)),
			last_failure: Arc::new(Mutex::new(None)),
		}
	}

	/// Returns the current episode serial.
	///
	/// Callers must read the epoch before reading the credential they attach: a refresh
	/// settling between the two reads then coalesces instead of rotating a second time.
	pub fn epoch(&self) -> RefreshEpoch {
		RefreshEpoch(self.settled.load(Ordering::Acquire))
	}

	/// Resolves an authorization failure observed under `observed` into a usable
	/// credential, refreshing at most once per episode.
	///
	/// Returns the refreshed (or already-rotated) credential to retry with, or
	/// [`Error::RefreshFailed`] when the episode failed; in that case the store has been
	/// cleared and the session terminated.
	pub async fn recover(&self, observed: RefreshEpoch) -> Result<Credential> {
		obs::observe(FlowKind::Refresh, "recover", obs::classify_result, async move {
			self.metrics.record_attempt();

			let _flight = self.flight.lock().await;

			if self.settled.load(Ordering::Acquire) != observed.0 {
				// An episode settled while this request was waiting; share its outcome.
				self.metrics.record_coalesced();

				return self
					.store
					.get()
					.ok_or(Error::RefreshFailed { status: *self.last_failure.lock() });
			}

			let outcome = self.rotate().await;

			// The serial is bumped before the guard drops so every queued waiter
			// observes a settled episode.
			self.settled.fetch_add(1, Ordering::Release);

			match outcome {
				Ok(credential) => {
					*self.last_failure.lock() = None;
					self.metrics.record_rotation();

					Ok(credential)
				},
				Err((status, err)) => {
					*self.last_failure.lock() = status;
					self.store.clear().await;
					self.session.terminate();
					self.metrics.record_failure();

					Err(err)
				},
			}
		})
		.await
	}

	/// Performs the single refresh call and persists the rotated credential.
	///
	/// The refresh credential itself travels out of band (cookie or transport-level
	/// header), so the request carries no body and no bearer header.
	async fn rotate(&self) -> Result<Credential, (Option<u16>, Error)> {
		let request = PreparedRequest::new(Method::Post, self.refresh_url.clone());
		let response = self
			.http_client
			.execute(request)
			.await
			.map_err(|_| (None, Error::RefreshFailed { status: None }))?;

		if !response.is_success() {
			return Err((
				Some(response.status),
				Error::RefreshFailed { status: Some(response.status) },
			));
		}

		let grant: TokenGrant = response.json().map_err(|_| {
			(Some(response.status), Error::RefreshFailed { status: Some(response.status) })
		})?;
		let credential = Credential::new(grant.access_token);

		self.store.set(credential.clone()).await;

		Ok(credential)
	}
}
impl<C> Debug for RefreshCoordinator<C>
where
	C: ?Sized + SessionHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RefreshCoordinator")
			.field("refresh_url", &self.refresh_url.as_str())
			.field("settled_episodes", &self.settled.load(Ordering::Relaxed))
			.finish()
	}
}
