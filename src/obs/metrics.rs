// self
use crate::{obs::ExchangeOutcome, provider::ProviderKind};

/// Records an exchange outcome via the global metrics recorder (when enabled).
pub fn record_exchange_outcome(provider: ProviderKind, outcome: ExchangeOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"registry_auth_exchange_total",
			"provider" => provider.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (provider, outcome);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn record_exchange_outcome_noop_without_metrics() {
		record_exchange_outcome(ProviderKind::GitHub, ExchangeOutcome::Failure);
	}
}
