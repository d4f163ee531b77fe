// self
use crate::{_prelude::*, obs::Operation};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedOp<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedOp<F> = F;

/// A span builder used by fetch loops and the PIN flow.
#[derive(Clone, Debug)]
pub struct OpSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl OpSpan {
	/// Creates a new span tagged with the provided operation + stage.
	pub fn new(op: Operation, stage: &str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("tweetvac.op", op = op.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (op, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedOp<Fut>
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

/// Emits a `debug` event describing one received batch.
pub fn batch_received(request: usize, received: usize, retained: usize, remaining: Option<u32>) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(request, received, retained, remaining, "batch received");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (request, received, retained, remaining);
	}
}

/// Emits a `warn` event when the request budget stops a fetch early.
pub fn rate_limit_hit(request: usize, retry_after: Option<Duration>) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(
			request,
			retry_after_secs = retry_after.map(|wait| wait.whole_seconds()),
			"rate limit reached; returning partial results"
		);
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (request, retry_after);
	}
}

/// Emits a `debug` event when a fetch loop ends.
pub fn fetch_stopped(reason: &'static str, requests: usize, items: usize) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(reason, requests, items, "fetch stopped");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (reason, requests, items);
	}
}
