//! Spans and diagnostic events, compiled to no-ops without the `tracing` feature.
//!
//! Events never carry secrets: tokens, client secrets, codes, and verifiers stay out of every
//! field.

// self
use crate::{_prelude::*, obs::FlowKind};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedFlow<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedFlow<F> = F;

/// A span builder used by grant exchanges.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FlowSpan {
	/// Creates a new span tagged with the provided flow kind + stage.
	pub fn new(kind: FlowKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span =
				tracing::info_span!("oauth2_grant_control.flow", flow = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
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
}

/// Reports a callback whose `state` is not in the expected set.
pub fn log_state_mismatch(callback: &Url, returned: &str, expected: &[String]) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(
			callback_path = callback.path(),
			returned,
			?expected,
			"Corrupted answer, the state doesn't match."
		);
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (callback, returned, expected);
	}
}

/// Reports a refresh skipped because the stored token carries no refresh token.
pub fn log_missing_refresh_token(kind: FlowKind) {
	#[cfg(feature = "tracing")]
	{
		tracing::error!(flow = kind.as_str(), "Refresh token is required.");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = kind;
	}
}

/// Reports an outbound token request.
pub fn log_exchange(endpoint: &Url, grant_type: &str) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(endpoint = endpoint.as_str(), grant_type, "Requesting a token.");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (endpoint, grant_type);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn events_never_panic_without_a_subscriber() {
		let url = Url::parse("https://app.example.com/cb?state=x").expect("Fixture should parse.");

		log_state_mismatch(&url, "x", &["y".into()]);
		log_missing_refresh_token(FlowKind::Password);
		log_exchange(&url, "password");
	}

	#[tokio::test]
	async fn instrument_wraps_future() {
		let span = FlowSpan::new(FlowKind::Refresh, "instrument_wraps_future");
		let value = span.instrument(async { 42 }).await;

		assert_eq!(value, 42);
	}
}
