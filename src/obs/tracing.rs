// self
use crate::{
	_prelude::*,
	obs::{FlowKind, FlowOutcome},
	store::StoreError,
};

#[cfg(feature = "tracing")]
/// Future returned by [`FlowSpan::instrument`] when tracing is enabled.
pub type InstrumentedFlow<F> = tracing::instrument::Instrumented<F>;
#[cfg(not(feature = "tracing"))]
/// Future returned by [`FlowSpan::instrument`]; the input future itself without tracing.
pub type InstrumentedFlow<F> = F;

/// Span around one pipeline flow.
///
/// The `outcome` field starts empty and is filled by [`FlowSpan::finish`], so a flow that is
/// cancelled mid-way shows up without an outcome.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	kind: FlowKind,
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FlowSpan {
	/// Opens a span for `kind` at call site `stage` and counts the attempt.
	pub fn new(kind: FlowKind, stage: &'static str) -> Self {
		super::record_flow_outcome(kind, FlowOutcome::Attempt);

		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!(
				"reauth_pipeline.flow",
				flow = kind.as_str(),
				stage,
				outcome = tracing::field::Empty,
			);

			Self { kind, span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = stage;

			Self { kind }
		}
	}

	/// Runs `fut` inside the span without holding an entered guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedFlow<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}

	/// Stamps the outcome onto the span and counts it.
	pub fn finish(&self, outcome: FlowOutcome) {
		#[cfg(feature = "tracing")]
		self.span.record("outcome", outcome.as_str());

		super::record_flow_outcome(self.kind, outcome);
	}
}

/// Logs a coordination step (leader, waiting, rejoin, stale skip).
pub(crate) fn trace_step(step: &'static str, generation: u64) {
	#[cfg(feature = "tracing")]
	tracing::debug!(step, generation, "refresh coordination");
	#[cfg(not(feature = "tracing"))]
	let _ = (step, generation);
}

/// Logs which credential an attempt carries, by fingerprint only.
pub(crate) fn trace_attempt(fingerprint: Option<&str>, generation: u64) {
	#[cfg(feature = "tracing")]
	tracing::debug!(token = fingerprint.unwrap_or("none"), generation, "dispatching request");
	#[cfg(not(feature = "tracing"))]
	let _ = (fingerprint, generation);
}

/// Logs and counts a terminal session end.
pub(crate) fn warn_session_ended(reason: crate::pipeline::SessionEndReason) {
	#[cfg(feature = "tracing")]
	tracing::warn!(%reason, "session ended");

	super::record_session_end(reason);
}

/// Logs a persistence failure that the credential store absorbed.
pub(crate) fn log_store_failure(operation: &'static str, error: &StoreError) {
	#[cfg(feature = "tracing")]
	tracing::warn!(operation, %error, "credential persistence failed");
	#[cfg(not(feature = "tracing"))]
	let _ = (operation, error);
}
