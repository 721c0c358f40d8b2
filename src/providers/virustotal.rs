//! VirusTotal v3 适配器（多引擎）

use std::collections::BTreeSet;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use sha2::{Digest, Sha256};

use super::{AdapterCore, ProviderAdapter};
use crate::config::ProviderConfig;
use crate::errors::ProviderError;
use crate::synthetic::{SyntheticFallback, SyntheticProfile};
use crate::types::{Category, DetectionRecord, ProviderResult, ScanTarget, TargetKind};

pub const NAME: &str = "VirusTotal";

pub struct VirusTotalAdapter {
    core: AdapterCore,
}

impl VirusTotalAdapter {
    pub fn new(config: ProviderConfig, offline: bool) -> Result<Self, ProviderError> {
        let fallback = SyntheticFallback::new(NAME, SyntheticProfile::MultiEngine);
        Ok(Self {
            core: AdapterCore::new(NAME, config, offline, fallback)?,
        })
    }

    fn report_url(&self, target: &ScanTarget) -> String {
        match target {
            ScanTarget::File(file) => format!("{}/files/{}", self.core.base_url(), file.content_hash),
            // v3 accepts the SHA-256 of the URL as its identifier
            ScanTarget::Url(url) => format!(
                "{}/urls/{}",
                self.core.base_url(),
                hex::encode(Sha256::digest(url.url.as_bytes()))
            ),
        }
    }

    async fn fetch(&self, target: &ScanTarget) -> Result<ProviderResult, ProviderError> {
        let url = self.report_url(target);
        let api_key = self.core.api_key();
        let body = self
            .core
            .http
            .send_with_retry(|client| client.get(&url).header("x-apikey", api_key))
            .await?;

        match body {
            Some(json) => parse_report(&json, target.kind()),
            None => Ok(ProviderResult::empty(NAME)),
        }
    }
}

#[async_trait]
impl ProviderAdapter for VirusTotalAdapter {
    fn name(&self) -> &str {
        NAME
    }

    fn supports_kind(&self, _kind: TargetKind) -> bool {
        true
    }

    fn is_configured(&self) -> bool {
        self.core.is_configured()
    }

    fn timeout(&self) -> Option<Duration> {
        self.core.timeout()
    }

    async fn query(&self, target: &ScanTarget) -> ProviderResult {
        self.core.run(target, self.fetch(target)).await
    }
}

/// Normalises a v3 `files/{id}` or `urls/{id}` object.
pub fn parse_report(json: &Value, kind: TargetKind) -> Result<ProviderResult, ProviderError> {
    let attributes = &json["data"]["attributes"];
    if !attributes.is_object() {
        return Err(ProviderError::UnexpectedResponseStructure(
            "missing data.attributes".to_string(),
        ));
    }

    let stats = &attributes["last_analysis_stats"];
    let count = |key: &str| {
        stats[key]
            .as_u64()
            .map_or(0, |n| u32::try_from(n).unwrap_or(u32::MAX))
    };
    let positives = count("malicious").saturating_add(count("suspicious"));
    let total = positives
        .saturating_add(count("undetected"))
        .saturating_add(count("harmless"));

    let mut records = Vec::new();
    if let Some(results) = attributes["last_analysis_results"].as_object() {
        for (engine, result) in results {
            let verdict = result["category"].as_str().unwrap_or("undetected");
            let detected = matches!(verdict, "malicious" | "suspicious");
            let label = result["result"].as_str().unwrap_or(if detected { verdict } else { "Clean" });
            let category = if detected {
                match Category::infer(label) {
                    Category::Clean => Category::infer(verdict),
                    inferred => inferred,
                }
            } else {
                Category::Clean
            };
            records.push(DetectionRecord::new(engine.as_str(), detected, label, category));
        }
    }
    records.sort_by(|a, b| a.engine_name.cmp(&b.engine_name));

    let categories = match kind {
        TargetKind::Url => url_categories(attributes),
        TargetKind::File => file_categories(attributes),
    };

    Ok(ProviderResult::with_counts(NAME, positives, total, records, categories).validated())
}

/// Vendor site classifications, e.g. `{"Forcepoint ThreatSeeker": "phishing and other frauds"}`.
fn url_categories(attributes: &Value) -> BTreeSet<Category> {
    let mut categories = BTreeSet::new();
    if let Some(vendors) = attributes["categories"].as_object() {
        for label in vendors.values().filter_map(Value::as_str) {
            let lower = label.to_ascii_lowercase();
            if lower.contains("phish") {
                categories.insert(Category::Phishing);
            } else if lower.contains("malware") || lower.contains("malicious") {
                categories.insert(Category::Malware);
            }
        }
    }
    categories
}

/// `popular_threat_classification.popular_threat_category[].value`
fn file_categories(attributes: &Value) -> BTreeSet<Category> {
    let mut categories = BTreeSet::new();
    if let Some(entries) =
        attributes["popular_threat_classification"]["popular_threat_category"].as_array()
    {
        for value in entries.iter().filter_map(|e| e["value"].as_str()) {
            let category = match value.to_ascii_lowercase().as_str() {
                "pua" | "adware" | "hacktool" | "riskware" => Category::Suspicious,
                "phishing" => Category::Phishing,
                _ => Category::Malware,
            };
            categories.insert(category);
        }
    }
    categories
}
