//! 风险分类
//!
//! Category signals first, then per-kind count cutoffs. Pure: no I/O and no
//! state beyond the thresholds it was built with.

use crate::config::{CountThresholds, ThresholdConfig};
use crate::types::{AggregatedResult, Category, RiskLevel, ScoredVerdict};

#[derive(Debug, Clone, Default)]
pub struct RiskClassifier {
    thresholds: ThresholdConfig,
}

impl RiskClassifier {
    pub fn new(thresholds: ThresholdConfig) -> Self {
        Self { thresholds }
    }

    pub fn classify(&self, aggregated: &AggregatedResult) -> ScoredVerdict {
        if aggregated.total == 0 {
            return ScoredVerdict::safe();
        }

        let score = score(aggregated.positives, aggregated.total);
        let risk_level = if aggregated.has_category(Category::Malware)
            || aggregated.has_category(Category::Malicious)
        {
            RiskLevel::Malicious
        } else if aggregated.has_category(Category::Phishing) {
            RiskLevel::Phishing
        } else if aggregated.has_category(Category::Suspicious) {
            RiskLevel::Suspicious
        } else {
            by_count(
                aggregated.positives,
                self.thresholds.for_kind(aggregated.target.kind()),
            )
        };

        ScoredVerdict { risk_level, score }
    }
}

/// `round(positives / total * 100)` clamped to 0..=100; 0 when `total` is 0.
pub fn score(positives: u32, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    let ratio = f64::from(positives) / f64::from(total) * 100.0;
    ratio.round().clamp(0.0, 100.0) as u8
}

fn by_count(positives: u32, cutoffs: &CountThresholds) -> RiskLevel {
    let reaches = |cutoff: Option<u32>| cutoff.map_or(false, |c| positives >= c);
    if reaches(cutoffs.malicious) {
        RiskLevel::Malicious
    } else if reaches(cutoffs.phishing) {
        RiskLevel::Phishing
    } else if reaches(cutoffs.suspicious) {
        RiskLevel::Suspicious
    } else {
        RiskLevel::Safe
    }
}
