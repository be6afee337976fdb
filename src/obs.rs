//! Optional observability helpers for engine operations.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `oauth_relay.flow` with the `flow`
//!   (operation) and `stage` (call site) fields, plus the signing transport's debug dumps.
//! - Enable `metrics` to increment the `oauth_relay_flow_total` counter for every
//!   attempt/success/failure, labeled by `flow`, `stage`, and `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Engine operations observed by the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Redirect URL construction (and the OAuth 1.0a temporary-credential handshake).
	Authorize,
	/// Callback correlation and code/verifier exchange.
	Exchange,
	/// Authorization-code or verifier token request.
	AccessToken,
	/// Resource-owner password grant.
	PasswordToken,
	/// Client Credentials grant.
	ClientCredentials,
	/// Refresh grant.
	Refresh,
	/// Token revocation.
	Revoke,
	/// Signed API call normalized through the response pipeline.
	Response,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::Authorize => "authorize",
			FlowKind::Exchange => "exchange",
			FlowKind::AccessToken => "access_token",
			FlowKind::PasswordToken => "password",
			FlowKind::ClientCredentials => "client_credentials",
			FlowKind::Refresh => "refresh",
			FlowKind::Revoke => "revoke",
			FlowKind::Response => "response",
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
	/// Entry to an engine operation.
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

/// Runs `fut` inside a flow span and records attempt plus success/failure outcomes.
pub(crate) async fn observe<T, Fut>(kind: FlowKind, stage: &'static str, fut: Fut) -> Result<T>
where
	Fut: Future<Output = Result<T>>,
{
	let span = FlowSpan::new(kind, stage);

	record_flow_outcome(kind, stage, FlowOutcome::Attempt);

	let result = span.instrument(fut).await;

	match &result {
		Ok(_) => record_flow_outcome(kind, stage, FlowOutcome::Success),
		Err(_e) => {
			#[cfg(feature = "tracing")]
			::tracing::debug!(
				flow = kind.as_str(),
				status = _e.status(),
				access_failure = _e.is_access_failure(),
				error = %_e,
				"flow failed"
			);

			record_flow_outcome(kind, stage, FlowOutcome::Failure);
		},
	}

	result
}
