//! URLVoid / APIVoid 域名黑名单适配器（仅 URL）

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::{AdapterCore, ProviderAdapter};
use crate::config::ProviderConfig;
use crate::errors::ProviderError;
use crate::synthetic::{SyntheticFallback, SyntheticProfile};
use crate::types::{Category, DetectionRecord, ProviderResult, ScanTarget, TargetKind};

pub const NAME: &str = "URLVoid";

/// Listings at or above this count mark the domain malicious.
const MALICIOUS_LISTINGS: u32 = 3;

pub struct UrlVoidAdapter {
    core: AdapterCore,
}

impl UrlVoidAdapter {
    pub fn new(config: ProviderConfig, offline: bool) -> Result<Self, ProviderError> {
        let fallback = SyntheticFallback::new(NAME, SyntheticProfile::Blocklist);
        Ok(Self {
            core: AdapterCore::new(NAME, config, offline, fallback)?,
        })
    }

    async fn fetch(&self, target: &ScanTarget) -> Result<ProviderResult, ProviderError> {
        let ScanTarget::Url(url) = target else {
            return Err(ProviderError::UnexpectedResponseStructure(
                "URLVoid only checks URLs".to_string(),
            ));
        };

        let endpoint = format!("{}/domainbl/v1/pay-as-you-go/", self.core.base_url());
        let query = [("key", self.core.api_key()), ("host", url.domain.as_str())];
        let body = self
            .core
            .http
            .send_with_retry(|client| client.get(&endpoint).query(&query))
            .await?;

        match body {
            Some(json) => parse_response(&json),
            None => Ok(ProviderResult::empty(NAME)),
        }
    }
}

#[async_trait]
impl ProviderAdapter for UrlVoidAdapter {
    fn name(&self) -> &str {
        NAME
    }

    fn supports_kind(&self, kind: TargetKind) -> bool {
        kind == TargetKind::Url
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

/// Normalises `data.report.blacklists.engines`, which the service returns as
/// either an index-keyed object or an array.
pub fn parse_response(json: &Value) -> Result<ProviderResult, ProviderError> {
    if let Some(message) = json["error"].as_str() {
        let lower = message.to_ascii_lowercase();
        if lower.contains("key") {
            return Err(ProviderError::Authentication);
        }
        return Err(ProviderError::UnexpectedResponseStructure(message.to_string()));
    }

    let blacklists = &json["data"]["report"]["blacklists"];
    let engines: Vec<&Value> = match &blacklists["engines"] {
        Value::Object(map) => map.values().collect(),
        Value::Array(items) => items.iter().collect(),
        Value::Null => {
            return Err(ProviderError::UnexpectedResponseStructure(
                "missing data.report.blacklists.engines".to_string(),
            ))
        }
        other => {
            return Err(ProviderError::Parse(format!(
                "engines is neither object nor array: {}",
                other
            )))
        }
    };

    let records: Vec<DetectionRecord> = engines
        .into_iter()
        .filter_map(|engine| {
            let name = engine["engine"].as_str()?;
            let detected = engine["detected"].as_bool().unwrap_or(false);
            let engine_name = format!("URLVoid-{}", name);
            Some(if detected {
                let category = match Category::infer(name) {
                    Category::Clean => Category::Malicious,
                    inferred => inferred,
                };
                DetectionRecord::new(engine_name, true, "Listed", category)
            } else {
                DetectionRecord::clean(engine_name)
            })
        })
        .collect();

    let listed = records.iter().filter(|r| r.detected).count() as u32;
    Ok(ProviderResult::from_records(NAME, records, listing_category(listed)))
}

fn listing_category(listed: u32) -> Option<Category> {
    match listed {
        0 => None,
        n if n < MALICIOUS_LISTINGS => Some(Category::Suspicious),
        _ => Some(Category::Malicious),
    }
}
