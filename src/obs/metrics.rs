// self
use crate::obs::{Operation, Outcome};

/// Records an operation outcome via the global metrics recorder (when enabled).
pub fn record_outcome(op: Operation, outcome: Outcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"tweetvac_op_total",
			"op" => op.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (op, outcome);
	}
}

/// Records how many items a fetch retained from one batch (when enabled).
pub fn record_items(endpoint: &str, count: usize) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("tweetvac_items_total", "endpoint" => endpoint.to_owned())
			.increment(count as u64);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (endpoint, count);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn recorders_noop_without_metrics() {
		record_outcome(Operation::Fetch, Outcome::RateLimited);
		record_items("statuses/user_timeline", 3);
	}
}
