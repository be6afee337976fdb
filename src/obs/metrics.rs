// self
use crate::obs::{FlowKind, FlowOutcome};

/// Increments `oauth_relay_flow_total` for one engine operation.
///
/// `stage` names the engine entry point (`oauth2.refresh`, `oauth1.exchange`, ...), so the
/// counter separates the two protocol versions without a provider label.
pub fn record_flow_outcome(kind: FlowKind, stage: &'static str, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	metrics::counter!(
		"oauth_relay_flow_total",
		"flow" => kind.as_str(),
		"stage" => stage,
		"outcome" => outcome.as_str()
	)
	.increment(1);

	#[cfg(not(feature = "metrics"))]
	let _ = (kind, stage, outcome);
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn counters_are_noops_without_a_recorder() {
		let stages = [
			(FlowKind::Authorize, "oauth1.authorize"),
			(FlowKind::Exchange, "oauth2.exchange"),
			(FlowKind::Response, "response"),
		];

		for (kind, stage) in stages {
			for outcome in [FlowOutcome::Attempt, FlowOutcome::Success, FlowOutcome::Failure] {
				record_flow_outcome(kind, stage, outcome);
			}
		}
	}
}
