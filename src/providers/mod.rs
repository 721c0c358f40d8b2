//! 检测服务适配器
//!
//! One adapter per external detection service. An adapter never fails past
//! its own boundary: network and parse errors become a failed
//! `ProviderResult`, and a missing credential routes to the synthetic
//! fallback instead of the network.

pub mod http;
pub mod hybrid_analysis;
pub mod urlvoid;
pub mod virustotal;

#[cfg(all(test, feature = "network"))]
mod adapter_tests;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::{AppConfig, ProviderConfig};
use crate::errors::ProviderError;
use crate::synthetic::SyntheticFallback;
use crate::types::{ProviderResult, ScanTarget, TargetKind};

pub use hybrid_analysis::HybridAnalysisAdapter;
pub use urlvoid::UrlVoidAdapter;
pub use virustotal::VirusTotalAdapter;

/// 检测服务适配器接口
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// 服务名称，用于结果和日志
    fn name(&self) -> &str;

    /// 是否支持该类型的目标
    fn supports_kind(&self, kind: TargetKind) -> bool;

    /// Whether this provider should be asked about `target` at all.
    fn accepts(&self, target: &ScanTarget) -> bool {
        self.supports_kind(target.kind())
    }

    /// 是否有可用的凭据
    fn is_configured(&self) -> bool;

    /// Per-call ceiling. `None` for adapters that only compute locally.
    fn timeout(&self) -> Option<Duration>;

    async fn query(&self, target: &ScanTarget) -> ProviderResult;
}

/// Shared state of the network-backed adapters.
#[derive(Debug, Clone)]
pub(crate) struct AdapterCore {
    pub name: &'static str,
    pub config: ProviderConfig,
    pub offline: bool,
    pub http: http::HttpClient,
    pub fallback: SyntheticFallback,
}

impl AdapterCore {
    pub fn new(
        name: &'static str,
        config: ProviderConfig,
        offline: bool,
        fallback: SyntheticFallback,
    ) -> Result<Self, ProviderError> {
        let http = http::HttpClient::new(&config)?;
        Ok(Self {
            name,
            config,
            offline,
            http,
            fallback,
        })
    }

    pub fn is_configured(&self) -> bool {
        cfg!(feature = "network") && !self.offline && self.config.has_credentials()
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.is_configured().then(|| self.config.timeout())
    }

    pub fn api_key(&self) -> &str {
        self.config.api_key.as_deref().unwrap_or_default()
    }

    pub fn base_url(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    /// Runs `fetch` when credentials exist, otherwise synthesizes. Errors are
    /// folded into a failed result here so no adapter can leak one.
    pub async fn run<F>(&self, target: &ScanTarget, fetch: F) -> ProviderResult
    where
        F: std::future::Future<Output = Result<ProviderResult, ProviderError>>,
    {
        if !self.is_configured() {
            log::debug!(
                "{} 未配置，使用合成结果: {}",
                self.name,
                target.display_name()
            );
            return self.fallback.synthesize(target);
        }

        match fetch.await {
            Ok(result) => result,
            Err(e) => {
                log::warn!("⚠️ {} 查询失败: {}", self.name, e);
                ProviderResult::failed(self.name, e.to_string())
            }
        }
    }
}

/// Builds the standard ordered provider set: VirusTotal, Hybrid-Analysis,
/// URLVoid. Providers disabled in the configuration are left out.
pub fn default_providers(config: &AppConfig) -> Result<Vec<Arc<dyn ProviderAdapter>>, ProviderError> {
    let offline = config.scan.offline;
    let providers = &config.providers;
    let mut adapters: Vec<Arc<dyn ProviderAdapter>> = Vec::new();

    if providers.virustotal.enabled {
        adapters.push(Arc::new(VirusTotalAdapter::new(
            providers.virustotal.clone(),
            offline,
        )?));
    }
    if providers.hybrid_analysis.enabled {
        adapters.push(Arc::new(HybridAnalysisAdapter::new(
            providers.hybrid_analysis.clone(),
            offline,
        )?));
    }
    if providers.urlvoid.enabled {
        adapters.push(Arc::new(UrlVoidAdapter::new(providers.urlvoid.clone(), offline)?));
    }

    Ok(adapters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::provider_config::PartialProviderConfig;
    use crate::config::provider_config::PartialProvidersConfig;
    use std::collections::HashMap;

    #[test]
    fn test_default_provider_order() {
        let providers = default_providers(&AppConfig::default()).unwrap();
        let names: Vec<&str> = providers.iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["VirusTotal", "Hybrid-Analysis", "URLVoid"]);
        // 没有凭据时全部走本地合成，不设超时
        assert!(providers.iter().all(|p| !p.is_configured()));
        assert!(providers.iter().all(|p| p.timeout().is_none()));
    }

    #[test]
    fn test_disabled_provider_is_skipped() {
        let partial = PartialProvidersConfig {
            urlvoid: Some(PartialProviderConfig {
                enabled: Some(false),
                ..Default::default()
            }),
            ..Default::default()
        };
        let config = AppConfig {
            providers: crate::config::ProvidersConfig::from_env_or_file(Some(partial), &HashMap::new()),
            ..AppConfig::default()
        };
        let providers = default_providers(&config).unwrap();
        assert_eq!(providers.len(), 2);
    }

    #[test]
    fn test_offline_overrides_credentials() {
        let mut config = AppConfig::default();
        config.providers.virustotal.api_key = Some("real-key".to_string());

        let online = VirusTotalAdapter::new(config.providers.virustotal.clone(), false).unwrap();
        assert_eq!(online.is_configured(), cfg!(feature = "network"));

        let offline = VirusTotalAdapter::new(config.providers.virustotal.clone(), true).unwrap();
        assert!(!offline.is_configured());
        assert!(offline.timeout().is_none());
    }

    #[test]
    fn test_url_only_provider_rejects_files() {
        let adapter = UrlVoidAdapter::new(AppConfig::default().providers.urlvoid, false).unwrap();
        let file = ScanTarget::from_bytes(b"data", "", None);
        let url = ScanTarget::url("https://example.com").unwrap();
        assert!(!adapter.accepts(&file));
        assert!(adapter.accepts(&url));
    }
}
