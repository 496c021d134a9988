// self
use crate::{
	_prelude::*,
	obs::{FlowKind, FlowOutcome},
	pipeline::SessionEndReason,
};

/// Counts one flow outcome.
pub fn record_flow_outcome(kind: FlowKind, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"reauth_pipeline_flow_total",
			"flow" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}
	#[cfg(not(feature = "metrics"))]
	let _ = (kind, outcome);
}

/// Counts a terminal session end by reason.
pub fn record_session_end(reason: SessionEndReason) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("reauth_pipeline_session_ended_total", "reason" => reason.as_label())
			.increment(1);
	}
	#[cfg(not(feature = "metrics"))]
	let _ = reason;
}

/// Records how long a refresh exchange took, successful or not.
pub fn record_refresh_latency(elapsed: Duration) {
	#[cfg(feature = "metrics")]
	{
		metrics::histogram!("reauth_pipeline_refresh_seconds").record(elapsed.as_seconds_f64());
	}
	#[cfg(not(feature = "metrics"))]
	let _ = elapsed;
}
