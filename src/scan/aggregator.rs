//! Merges per-provider results into one aggregated result

use std::collections::BTreeSet;

use crate::types::{AggregatedResult, ProviderResult, ScanTarget};

pub struct Aggregator;

impl Aggregator {
    /// Counts and categories come from succeeded providers only; failed ones
    /// stay in `provider_results` for diagnostics.
    pub fn aggregate(target: ScanTarget, provider_results: Vec<ProviderResult>) -> AggregatedResult {
        let mut positives = 0u32;
        let mut total = 0u32;
        let mut records = Vec::new();
        let mut categories = BTreeSet::new();

        for result in provider_results.iter().filter(|r| r.succeeded) {
            positives = positives.saturating_add(result.positives);
            total = total.saturating_add(result.total);
            records.extend(result.records.iter().cloned());
            categories.extend(result.categories.iter().copied());
        }

        AggregatedResult {
            target,
            positives,
            total,
            records,
            categories,
            provider_results,
        }
    }
}
