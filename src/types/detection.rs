//! Detection records and per-provider results
//!
//! Every provider adapter normalises its native payload into these types;
//! nothing provider specific is visible past this boundary.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// 威胁类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Clean,
    Suspicious,
    Phishing,
    Malware,
    Malicious,
}

const MALWARE_TERMS: &[&str] = &[
    "malware", "trojan", "virus", "worm", "ransom", "backdoor", "rootkit", "spyware", "miner",
    "botnet", "exploit", "keylogger", "stealer", "dropper",
];
const SUSPICIOUS_TERMS: &[&str] = &[
    "suspicious", "pup", "pua", "adware", "heur", "riskware", "unwanted", "grayware", "spam",
];

impl Category {
    /// Infers a category from a free-form verdict label such as
    /// `"Trojan.GenericKD"` or `"Phishing site"`.
    pub fn infer(label: &str) -> Category {
        let lower = label.to_ascii_lowercase();
        if lower.contains("phish") {
            Category::Phishing
        } else if MALWARE_TERMS.iter().any(|t| lower.contains(t)) {
            Category::Malware
        } else if lower.contains("malicious") {
            Category::Malicious
        } else if SUSPICIOUS_TERMS.iter().any(|t| lower.contains(t)) {
            Category::Suspicious
        } else {
            Category::Clean
        }
    }

    /// `Clean` is a record-level value only and never enters a category set.
    pub fn is_threat(&self) -> bool {
        !matches!(self, Category::Clean)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Clean => "clean",
            Category::Suspicious => "suspicious",
            Category::Phishing => "phishing",
            Category::Malware => "malware",
            Category::Malicious => "malicious",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 单个引擎的检测结论
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionRecord {
    pub engine_name: String,
    pub detected: bool,
    pub result_label: String,
    pub category: Category,
}

impl DetectionRecord {
    pub fn new(
        engine_name: impl Into<String>,
        detected: bool,
        result_label: impl Into<String>,
        category: Category,
    ) -> Self {
        Self {
            engine_name: engine_name.into(),
            detected,
            result_label: result_label.into(),
            category,
        }
    }

    pub fn clean(engine_name: impl Into<String>) -> Self {
        Self::new(engine_name, false, "Clean", Category::Clean)
    }
}

/// 单个检测服务的结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderResult {
    pub provider_name: String,
    pub positives: u32,
    pub total: u32,
    pub records: Vec<DetectionRecord>,
    pub categories: BTreeSet<Category>,
    pub succeeded: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
    /// 是否由合成回退生成
    #[serde(default)]
    pub synthetic: bool,
}

impl ProviderResult {
    /// Successful result whose counts are taken from the records themselves.
    pub fn from_records(
        provider_name: impl Into<String>,
        records: Vec<DetectionRecord>,
        categories: impl IntoIterator<Item = Category>,
    ) -> Self {
        let positives = records.iter().filter(|r| r.detected).count() as u32;
        let total = records.len() as u32;
        Self::with_counts(provider_name, positives, total, records, categories)
    }

    /// Successful result with service-reported counts (multi-engine services
    /// report aggregate statistics that can differ from the listed engines).
    pub fn with_counts(
        provider_name: impl Into<String>,
        positives: u32,
        total: u32,
        records: Vec<DetectionRecord>,
        categories: impl IntoIterator<Item = Category>,
    ) -> Self {
        Self {
            provider_name: provider_name.into(),
            positives,
            total,
            records,
            categories: categories.into_iter().filter(Category::is_threat).collect(),
            succeeded: true,
            error: None,
            synthetic: false,
        }
    }

    /// Successful result for a target the service has no data about.
    pub fn empty(provider_name: impl Into<String>) -> Self {
        Self::with_counts(provider_name, 0, 0, Vec::new(), [])
    }

    /// Failed provider: contributes 0/0 but stays visible for diagnostics.
    pub fn failed(provider_name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            provider_name: provider_name.into(),
            positives: 0,
            total: 0,
            records: Vec::new(),
            categories: BTreeSet::new(),
            succeeded: false,
            error: Some(error.into()),
            synthetic: false,
        }
    }

    pub fn mark_synthetic(mut self) -> Self {
        self.synthetic = true;
        self
    }

    /// Checks the count invariants; a violation means the provider returned
    /// malformed data.
    pub fn validate(&self) -> Result<(), String> {
        if self.positives > self.total {
            return Err(format!(
                "malformed result: {} positives exceed {} engines",
                self.positives, self.total
            ));
        }
        if self.total == 0 && !self.records.is_empty() {
            return Err(format!(
                "malformed result: {} records reported with zero engines",
                self.records.len()
            ));
        }
        Ok(())
    }

    /// Returns the result unchanged when valid, otherwise a failed result
    /// carrying the validation message.
    pub fn validated(self) -> Self {
        if !self.succeeded {
            return self;
        }
        match self.validate() {
            Ok(()) => self,
            Err(reason) => ProviderResult::failed(self.provider_name, reason),
        }
    }
}
