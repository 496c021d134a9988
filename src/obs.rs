//! Optional observability hooks for the pipeline.
//!
//! # Feature Flags
//!
//! - `tracing`: every `execute`, refresh exchange, and login runs inside a `reauth_pipeline.flow`
//!   span carrying `flow`, `stage`, and (once known) `outcome`. Leadership hand-offs, token
//!   fingerprints, session ends, and absorbed persistence failures are logged as events.
//! - `metrics`: `reauth_pipeline_flow_total{flow,outcome}` counts flow outcomes,
//!   `reauth_pipeline_session_ended_total{reason}` counts terminal session ends, and
//!   `reauth_pipeline_refresh_seconds` records refresh exchange latency.
//!
//! Without either feature every hook compiles down to nothing.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

macro_rules! label_enum {
	(
		$(#[$meta:meta])*
		pub enum $name:ident {
			$($(#[$vmeta:meta])* $variant:ident => $label:literal,)+
		}
	) => {
		$(#[$meta])*
		#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
		pub enum $name {
			$($(#[$vmeta])* $variant,)+
		}
		impl $name {
			/// Stable label used for span fields and metric labels.
			pub const fn as_str(self) -> &'static str {
				match self {
					$(Self::$variant => $label,)+
				}
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(self.as_str())
			}
		}
	};
}

label_enum! {
	/// Flows the pipeline reports on.
	pub enum FlowKind {
		/// A call made through [`Pipeline::execute`](crate::pipeline::Pipeline::execute).
		Request => "request",
		/// The leader's refresh exchange.
		Refresh => "refresh",
		/// A login exchange.
		Login => "login",
	}
}

label_enum! {
	/// How a flow ended.
	pub enum FlowOutcome {
		/// The flow started.
		Attempt => "attempt",
		/// The flow completed.
		Success => "success",
		/// The flow failed without touching the session.
		Failure => "failure",
		/// The flow ended the session.
		SessionExpired => "session_expired",
	}
}
