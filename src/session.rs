//! Shared session state: the identity record, the loading latch, and the observer hooks
//! that decouple the core from the presentation layer.

// std
use std::sync::atomic::{AtomicBool, Ordering};
// self
use crate::{_prelude::*, auth::Identity};

/// Presentation-layer hook for events the core cannot handle itself.
///
/// All methods default to no-ops so observers implement only what they care about.
pub trait SessionObserver
where
	Self: Send + Sync,
{
	/// An unrecoverable, non-authorization request failure occurred (404/500-class).
	fn api_error(&self, status: u16) {
		let _ = status;
	}

	/// The session was terminated because a refresh episode failed.
	fn session_terminated(&self) {}
}

/// Point-in-time view of the session exposed to the rest of the application.
#[derive(Clone, Debug)]
pub struct SessionSnapshot {
	/// Identity fetched from the backend, if the session is active.
	pub identity: Option<Identity>,
	/// `true` iff both an identity and a credential are present.
	pub authenticated: bool,
	/// `true` while the startup bootstrap is still outstanding.
	pub loading: bool,
}

#[derive(Debug)]
struct SessionShared {
	identity: RwLock<Option<Identity>>,
	loading: AtomicBool,
	observers: Mutex<Vec<Arc<dyn SessionObserver>>>,
}
impl Debug for dyn SessionObserver {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("SessionObserver(..)")
	}
}

/// Cheaply cloneable handle over the shared session state.
///
/// The handle starts in the loading phase; [`SessionHandle::finish_loading`] flips the
/// latch exactly once, when the startup bootstrap settles.
#[derive(Clone, Debug)]
pub struct SessionHandle(Arc<SessionShared>);
impl SessionHandle {
	/// Creates a fresh handle in the loading phase with no identity.
	pub fn new() -> Self {
		Self(Arc::new(SessionShared {
			identity: RwLock::new(None),
			loading: AtomicBool::new(true),
			observers: Mutex::new(Vec::new()),
		}))
	}

	/// Returns the current identity, if any.
	pub fn identity(&self) -> Option<Identity> {
		self.0.identity.read().clone()
	}

	/// Replaces the current identity.
	pub fn set_identity(&self, identity: Option<Identity>) {
		*self.0.identity.write() = identity;
	}

	/// Returns `true` while the startup bootstrap is outstanding.
	pub fn is_loading(&self) -> bool {
		self.0.loading.load(Ordering::Acquire)
	}

	/// Ends the loading phase; returns `true` only for the call that flipped the latch.
	pub fn finish_loading(&self) -> bool {
		self.0.loading.swap(false, Ordering::AcqRel)
	}

	/// Registers an observer for presentation-layer events.
	pub fn subscribe(&self, observer: Arc<dyn SessionObserver>) {
		self.0.observers.lock().push(observer);
	}

	/// Notifies observers of an unrecoverable request failure.
	pub fn notify_api_error(&self, status: u16) {
		for observer in self.observers() {
			observer.api_error(status);
		}
	}

	/// Drops the identity and notifies observers of the forced logout.
	pub fn terminate(&self) {
		self.set_identity(None);

		for observer in self.observers() {
			observer.session_terminated();
		}
	}

	// Observers are cloned out so notifications run without holding the lock.
	fn observers(&self) -> Vec<Arc<dyn SessionObserver>> {
		self.0.observers.lock().clone()
	}
}
impl Default for SessionHandle {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::atomic::AtomicU32;
	// self
	use super::*;

	#[derive(Default)]
	struct CountingObserver {
		api_errors: AtomicU32,
		terminations: AtomicU32,
	}
	impl SessionObserver for CountingObserver {
		fn api_error(&self, _status: u16) {
			self.api_errors.fetch_add(1, Ordering::Relaxed);
		}

		fn session_terminated(&self) {
			self.terminations.fetch_add(1, Ordering::Relaxed);
		}
	}

	fn identity_fixture() -> Identity {
		Identity {
			id: "u-1".into(),
			username: "admin".into(),
			email: "admin@example.com".into(),
			is_active: true,
		}
	}

	#[test]
	fn loading_latch_flips_exactly_once() {
		let handle = SessionHandle::new();

		assert!(handle.is_loading());
		assert!(handle.finish_loading());
		assert!(!handle.is_loading());
		assert!(!handle.finish_loading(), "Second call must observe an already-flipped latch.");
	}

	#[test]
	fn terminate_drops_identity_and_notifies() {
		let handle = SessionHandle::new();
		let observer = Arc::new(CountingObserver::default());

		handle.subscribe(observer.clone());
		handle.set_identity(Some(identity_fixture()));
		handle.terminate();

		assert!(handle.identity().is_none());
		assert_eq!(observer.terminations.load(Ordering::Relaxed), 1);
	}

	#[test]
	fn api_errors_reach_every_observer() {
		let handle = SessionHandle::new();
		let first = Arc::new(CountingObserver::default());
		let second = Arc::new(CountingObserver::default());

		handle.subscribe(first.clone());
		handle.subscribe(second.clone());
		handle.notify_api_error(500);

		assert_eq!(first.api_errors.load(Ordering::Relaxed), 1);
		assert_eq!(second.api_errors.load(Ordering::Relaxed), 1);
	}
}
