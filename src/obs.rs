//! Optional observability helpers for session flows.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to run every session flow inside a `bearer_session.flow` span
//!   carrying the `flow` (operation) and `stage` (call site) fields, and to emit a
//!   warning whenever a vault error is swallowed.
//! - Enable `metrics` to increment the `bearer_session_flow_total` counter for every
//!   attempt/success/failure, labeled by `flow` + `outcome`.

// self
use crate::_prelude::*;

/// Session flow kinds observed by the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Startup credential validation.
	Bootstrap,
	/// Interactive login exchange.
	Login,
	/// Single-flight credential refresh episode.
	Refresh,
	/// Authenticated resource dispatch.
	Request,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::Bootstrap => "bootstrap",
			FlowKind::Login => "login",
			FlowKind::Refresh => "refresh",
			FlowKind::Request => "request",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to a session flow.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Records a flow outcome via the global metrics recorder (when enabled).
pub fn record_flow_outcome(kind: FlowKind, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"bearer_session_flow_total",
			"flow" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

// Runs a session flow inside an instrumented span, recording an attempt on entry and
// the classified outcome on exit. Degrades to a plain await when tracing is disabled.
pub(crate) async fn observe<O, Fut>(
	kind: FlowKind,
	stage: &'static str,
	classify: fn(&O) -> FlowOutcome,
	fut: Fut,
) -> O
where
	Fut: Future<Output = O>,
{
	record_flow_outcome(kind, FlowOutcome::Attempt);

	#[cfg(feature = "tracing")]
	let output = {
		use tracing::Instrument;

		fut.instrument(tracing::info_span!("bearer_session.flow", flow = kind.as_str(), stage))
			.await
	};
	#[cfg(not(feature = "tracing"))]
	let output = {
		let _ = stage;

		fut.await
	};

	record_flow_outcome(kind, classify(&output));

	output
}

// Outcome classifier for result-shaped flows.
pub(crate) fn classify_result<T>(result: &Result<T>) -> FlowOutcome {
	if result.is_ok() { FlowOutcome::Success } else { FlowOutcome::Failure }
}

// Notes a swallowed vault failure; durability is best-effort so these never propagate.
pub(crate) fn record_store_failure(stage: &'static str, err: &crate::store::StoreError) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(stage, error = %err, "Credential vault operation failed; continuing with in-memory state.");
	}

	#[cfg(not(feature = "tracing"))]
	{
		let _ = (stage, err);
	}
}
