//! Aggregated scan data and the final verdict

use super::detection::{Category, DetectionRecord, ProviderResult};
use super::target::ScanTarget;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// 多个检测服务合并后的结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedResult {
    pub target: ScanTarget,
    pub positives: u32,
    pub total: u32,
    pub records: Vec<DetectionRecord>,
    pub categories: BTreeSet<Category>,
    pub provider_results: Vec<ProviderResult>,
}

impl AggregatedResult {
    pub fn has_category(&self, category: Category) -> bool {
        self.categories.contains(&category)
    }

    pub fn failed_providers(&self) -> impl Iterator<Item = &ProviderResult> {
        self.provider_results.iter().filter(|p| !p.succeeded)
    }

    pub fn all_succeeded(&self) -> bool {
        self.provider_results.iter().all(|p| p.succeeded)
    }
}

/// 风险级别，按严重程度排序
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Safe,
    Suspicious,
    Phishing,
    Malicious,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Safe => "safe",
            RiskLevel::Suspicious => "suspicious",
            RiskLevel::Phishing => "phishing",
            RiskLevel::Malicious => "malicious",
        }
    }

    /// Malicious and phishing verdicts count as detected threats.
    pub fn is_threat(&self) -> bool {
        matches!(self, RiskLevel::Malicious | RiskLevel::Phishing)
    }

    /// 转换为 emoji 表示
    pub fn to_emoji(&self) -> &'static str {
        match self {
            RiskLevel::Safe => "🟢",
            RiskLevel::Suspicious => "🟡",
            RiskLevel::Phishing => "🔴",
            RiskLevel::Malicious => "🔴",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 最终结论：风险级别 + 0-100 分数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredVerdict {
    pub risk_level: RiskLevel,
    pub score: u8,
}

impl ScoredVerdict {
    pub fn safe() -> Self {
        Self {
            risk_level: RiskLevel::Safe,
            score: 0,
        }
    }
}
