use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

pub const VIRUSTOTAL_API_KEY_ENV: &str = "VIRUSTOTAL_API_KEY";
pub const HYBRID_ANALYSIS_API_KEY_ENV: &str = "HYBRID_ANALYSIS_API_KEY";
pub const URLVOID_API_KEY_ENV: &str = "URLVOID_API_KEY";

/// 单个检测服务的配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub enabled: bool,
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout_secs: u64,
    /// 额外的重试次数（不含首次请求）
    pub retries: u32,
}

impl ProviderConfig {
    fn with_base_url(base_url: &str) -> Self {
        Self {
            enabled: true,
            api_key: None,
            base_url: base_url.to_string(),
            timeout_secs: default_timeout_secs(),
            retries: default_retries(),
        }
    }

    /// 是否有可用的凭据
    pub fn has_credentials(&self) -> bool {
        self.api_key.as_deref().map(is_usable_key).unwrap_or(false)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    fn resolve(
        partial: Option<PartialProviderConfig>,
        env_key: &str,
        default_base_url: &str,
        env_map: &HashMap<String, String>,
    ) -> Self {
        let partial = partial.unwrap_or_default();

        // 环境变量优先于配置文件
        let api_key = env_map
            .get(env_key)
            .filter(|k| is_usable_key(k))
            .cloned()
            .or_else(|| partial.api_key.filter(|k| is_usable_key(k)));

        Self {
            enabled: partial.enabled.unwrap_or(true),
            api_key,
            base_url: partial
                .base_url
                .unwrap_or_else(|| default_base_url.to_string()),
            timeout_secs: partial.timeout_secs.unwrap_or_else(default_timeout_secs),
            retries: partial.retries.unwrap_or_else(default_retries),
        }
    }
}

/// Empty strings and template placeholders like `your_virustotal_api_key_here`
/// do not count as credentials.
pub fn is_usable_key(key: &str) -> bool {
    let key = key.trim();
    if key.is_empty() {
        return false;
    }
    let lower = key.to_ascii_lowercase();
    !(lower.starts_with("your_") && lower.ends_with("_here"))
}

/// 所有检测服务的配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvidersConfig {
    pub virustotal: ProviderConfig,
    pub hybrid_analysis: ProviderConfig,
    pub urlvoid: ProviderConfig,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            virustotal: ProviderConfig::with_base_url(DEFAULT_VIRUSTOTAL_URL),
            hybrid_analysis: ProviderConfig::with_base_url(DEFAULT_HYBRID_ANALYSIS_URL),
            urlvoid: ProviderConfig::with_base_url(DEFAULT_URLVOID_URL),
        }
    }
}

impl ProvidersConfig {
    /// Create ProvidersConfig from environment variables and file config
    pub fn from_env_or_file(
        partial: Option<PartialProvidersConfig>,
        env_map: &HashMap<String, String>,
    ) -> Self {
        let partial = partial.unwrap_or_default();
        Self {
            virustotal: ProviderConfig::resolve(
                partial.virustotal,
                VIRUSTOTAL_API_KEY_ENV,
                DEFAULT_VIRUSTOTAL_URL,
                env_map,
            ),
            hybrid_analysis: ProviderConfig::resolve(
                partial.hybrid_analysis,
                HYBRID_ANALYSIS_API_KEY_ENV,
                DEFAULT_HYBRID_ANALYSIS_URL,
                env_map,
            ),
            urlvoid: ProviderConfig::resolve(
                partial.urlvoid,
                URLVOID_API_KEY_ENV,
                DEFAULT_URLVOID_URL,
                env_map,
            ),
        }
    }

    /// (配置节名, 配置) 列表，用于统一校验
    pub fn named(&self) -> [(&'static str, &ProviderConfig); 3] {
        [
            ("providers.virustotal", &self.virustotal),
            ("providers.hybrid_analysis", &self.hybrid_analysis),
            ("providers.urlvoid", &self.urlvoid),
        ]
    }
}

/// Partial provider configuration for loading from files
#[derive(Deserialize, Debug, Default)]
pub struct PartialProviderConfig {
    pub enabled: Option<bool>,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub retries: Option<u32>,
}

#[derive(Deserialize, Debug, Default)]
pub struct PartialProvidersConfig {
    pub virustotal: Option<PartialProviderConfig>,
    pub hybrid_analysis: Option<PartialProviderConfig>,
    pub urlvoid: Option<PartialProviderConfig>,
}

const DEFAULT_VIRUSTOTAL_URL: &str = "https://www.virustotal.com/api/v3";
const DEFAULT_HYBRID_ANALYSIS_URL: &str = "https://www.hybrid-analysis.com/api/v2";
const DEFAULT_URLVOID_URL: &str = "https://endpoint.apivoid.com";

// Default functions
fn default_timeout_secs() -> u64 {
    15
}

fn default_retries() -> u32 {
    1
}
