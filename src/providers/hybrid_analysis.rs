//! Hybrid Analysis 适配器（单一威胁评分）

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::{AdapterCore, ProviderAdapter};
use crate::config::ProviderConfig;
use crate::errors::ProviderError;
use crate::synthetic::{SyntheticFallback, SyntheticProfile};
use crate::types::{Category, DetectionRecord, ProviderResult, ScanTarget, TargetKind};

pub const NAME: &str = "Hybrid-Analysis";

/// 评分换算后的引擎数
const SCORE_SCALE: u32 = 10;
const DETECTION_SCORE: u32 = 50;
const MALWARE_SCORE: u32 = 80;

pub struct HybridAnalysisAdapter {
    core: AdapterCore,
}

impl HybridAnalysisAdapter {
    pub fn new(config: ProviderConfig, offline: bool) -> Result<Self, ProviderError> {
        let fallback = SyntheticFallback::new(NAME, SyntheticProfile::ThreatScore);
        Ok(Self {
            core: AdapterCore::new(NAME, config, offline, fallback)?,
        })
    }

    async fn fetch(&self, target: &ScanTarget) -> Result<ProviderResult, ProviderError> {
        let base = self.core.base_url();
        let api_key = self.core.api_key();

        let body = match target {
            ScanTarget::File(file) => {
                let endpoint = format!("{}/search/hash", base);
                let form = [("hash", file.content_hash.as_str())];
                self.core
                    .http
                    .send_with_retry(|client| {
                        client
                            .post(&endpoint)
                            .header("api-key", api_key)
                            .header("User-Agent", "Falcon Sandbox")
                            .form(&form)
                    })
                    .await?
            }
            ScanTarget::Url(url) => {
                let endpoint = format!("{}/quick-scan/url", base);
                let form = [("scan_type", "all"), ("url", url.url.as_str())];
                self.core
                    .http
                    .send_with_retry(|client| {
                        client
                            .post(&endpoint)
                            .header("api-key", api_key)
                            .header("User-Agent", "Falcon Sandbox")
                            .form(&form)
                    })
                    .await?
            }
        };

        match body {
            Some(json) => parse_response(&json),
            None => Ok(ProviderResult::empty(NAME)),
        }
    }
}

#[async_trait]
impl ProviderAdapter for HybridAnalysisAdapter {
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

/// Accepts either a bare report array (hash search) or an object with a
/// `result` array. The first report carries the verdict.
pub fn parse_response(json: &Value) -> Result<ProviderResult, ProviderError> {
    let reports = match json {
        Value::Array(items) => items.as_slice(),
        Value::Object(map) => match map.get("result") {
            Some(Value::Array(items)) => items.as_slice(),
            Some(_) => {
                return Err(ProviderError::UnexpectedResponseStructure(
                    "'result' is not an array".to_string(),
                ))
            }
            // quick-scan 直接返回单个报告
            None if map.contains_key("threat_score") => std::slice::from_ref(json),
            None => &[],
        },
        _ => {
            return Err(ProviderError::UnexpectedResponseStructure(
                "expected an array or object".to_string(),
            ))
        }
    };

    let Some(report) = reports.first() else {
        return Ok(ProviderResult::empty(NAME));
    };

    let score = match &report["threat_score"] {
        Value::Null => 0,
        value => value
            .as_u64()
            .ok_or_else(|| ProviderError::Parse(format!("threat_score is not a number: {}", value)))?
            as u32,
    };
    let verdict = report["verdict"].as_str().or_else(|| report["threat_level_human"].as_str());

    Ok(threat_score_result(NAME, score, verdict))
}

/// Maps a 0-100 threat score onto a one-record result scaled to 10 engines.
/// Shared by real responses and the synthetic threat-score profile.
pub fn threat_score_result(provider_name: &str, score: u32, verdict: Option<&str>) -> ProviderResult {
    let score = score.min(100);
    let detected = score > DETECTION_SCORE;
    let positives = if detected { score / SCORE_SCALE } else { 0 };

    let verdict_lower = verdict.map(str::to_ascii_lowercase).unwrap_or_default();
    let category = if verdict_lower.contains("phish") {
        Some(Category::Phishing)
    } else if score > MALWARE_SCORE || verdict_lower.contains("malicious") {
        Some(Category::Malware)
    } else if detected {
        Some(Category::Suspicious)
    } else {
        None
    };

    let label = match verdict {
        Some(v) if !v.trim().is_empty() => v.to_string(),
        _ if detected => format!("Threat score {}", score),
        _ => "Clean".to_string(),
    };
    let record_category = match category {
        Some(c) if detected => c,
        _ => Category::Clean,
    };

    let record = DetectionRecord::new(NAME, detected, label, record_category);
    ProviderResult::with_counts(provider_name, positives, SCORE_SCALE, vec![record], category)
}
