//! Optional observability helpers for fetch loops and the PIN flow.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `tweetvac.op` with the `op` and `stage`
//!   fields, a `debug` event per batch, and a `warn` event when the rate limit stops a fetch.
//! - Enable `metrics` to increment the `tweetvac_op_total` counter for every
//!   attempt/success/rate-limit/failure, labeled by `op` + `outcome`, and the
//!   `tweetvac_items_total` counter with every retained batch.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Operations observed by the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
	/// Paginated fetch loop.
	Fetch,
	/// Request-token leg of the PIN flow.
	RequestToken,
	/// Access-token leg of the PIN flow.
	AccessToken,
}
impl Operation {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Operation::Fetch => "fetch",
			Operation::RequestToken => "request_token",
			Operation::AccessToken => "access_token",
		}
	}
}
impl Display for Operation {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Outcome {
	/// Entry to an operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Completed early because the request budget ran out.
	RateLimited,
	/// Failure propagated back to the caller.
	Failure,
}
impl Outcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Outcome::Attempt => "attempt",
			Outcome::Success => "success",
			Outcome::RateLimited => "rate_limited",
			Outcome::Failure => "failure",
		}
	}
}
impl Display for Outcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
