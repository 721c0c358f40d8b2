use serde::Deserialize;
use std::time::Duration;

use crate::errors::{invalid_value, ConfigError};
use crate::types::TargetKind;

/// 扫描流程配置
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    /// 整体扫描截止时间（秒）
    #[serde(default = "default_outer_deadline_secs")]
    pub outer_deadline_secs: u64,
    /// 检测表最多显示的行数
    #[serde(default = "default_display_limit")]
    pub display_limit: usize,
    /// 离线模式：所有 provider 视为未配置
    #[serde(default)]
    pub offline: bool,
    /// 结论缓存容量，0 表示禁用
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self::from_partial(None)
    }
}

/// Positive-count cutoffs for one target kind. `None` disables that rung.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountThresholds {
    pub malicious: Option<u32>,
    pub phishing: Option<u32>,
    pub suspicious: Option<u32>,
}

impl CountThresholds {
    pub fn file_defaults() -> Self {
        Self {
            malicious: Some(5),
            phishing: None,
            suspicious: Some(2),
        }
    }

    pub fn url_defaults() -> Self {
        Self {
            malicious: Some(15),
            phishing: Some(8),
            suspicious: Some(2),
        }
    }

    fn from_partial(partial: Option<PartialCountThresholds>, defaults: Self) -> Self {
        let Some(partial) = partial else {
            return defaults;
        };
        // 0 在配置文件中表示关闭该档位
        let pick = |value: Option<u32>, fallback: Option<u32>| match value {
            Some(0) => None,
            Some(v) => Some(v),
            None => fallback,
        };
        Self {
            malicious: pick(partial.malicious, defaults.malicious),
            phishing: pick(partial.phishing, defaults.phishing),
            suspicious: pick(partial.suspicious, defaults.suspicious),
        }
    }

    fn validate(&self, field: &str) -> Result<(), ConfigError> {
        let rungs = [self.malicious, self.phishing, self.suspicious];
        let present: Vec<u32> = rungs.iter().flatten().copied().collect();
        if present.windows(2).any(|pair| pair[0] < pair[1]) {
            return Err(invalid_value(
                field,
                format!(
                    "cutoffs must be ordered malicious >= phishing >= suspicious, got {:?}",
                    rungs
                ),
            ));
        }
        Ok(())
    }
}

/// 按目标类型区分的阈值
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdConfig {
    pub file: CountThresholds,
    pub url: CountThresholds,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            file: CountThresholds::file_defaults(),
            url: CountThresholds::url_defaults(),
        }
    }
}

impl ThresholdConfig {
    pub fn from_partial(partial: Option<PartialThresholdConfig>) -> Self {
        let partial = partial.unwrap_or_default();
        Self {
            file: CountThresholds::from_partial(partial.file, CountThresholds::file_defaults()),
            url: CountThresholds::from_partial(partial.url, CountThresholds::url_defaults()),
        }
    }

    pub fn for_kind(&self, kind: TargetKind) -> &CountThresholds {
        match kind {
            TargetKind::File => &self.file,
            TargetKind::Url => &self.url,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.file.validate("thresholds.file")?;
        self.url.validate("thresholds.url")
    }
}

/// Partial configurations for loading from files
#[derive(Deserialize, Debug, Default)]
pub struct PartialScanConfig {
    pub outer_deadline_secs: Option<u64>,
    pub display_limit: Option<usize>,
    pub offline: Option<bool>,
    pub cache_capacity: Option<usize>,
    pub cache_ttl_secs: Option<u64>,
}

#[derive(Deserialize, Debug, Default)]
pub struct PartialThresholdConfig {
    pub file: Option<PartialCountThresholds>,
    pub url: Option<PartialCountThresholds>,
}

#[derive(Deserialize, Debug, Default)]
pub struct PartialCountThresholds {
    pub malicious: Option<u32>,
    pub phishing: Option<u32>,
    pub suspicious: Option<u32>,
}

impl ScanConfig {
    /// Create ScanConfig from partial config with defaults
    pub fn from_partial(partial: Option<PartialScanConfig>) -> Self {
        let partial = partial.unwrap_or_default();
        Self {
            outer_deadline_secs: partial
                .outer_deadline_secs
                .unwrap_or_else(default_outer_deadline_secs),
            display_limit: partial.display_limit.unwrap_or_else(default_display_limit),
            offline: partial.offline.unwrap_or(false),
            cache_capacity: partial.cache_capacity.unwrap_or_else(default_cache_capacity),
            cache_ttl_secs: partial.cache_ttl_secs.unwrap_or_else(default_cache_ttl_secs),
        }
    }

    pub fn outer_deadline(&self) -> Duration {
        Duration::from_secs(self.outer_deadline_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.outer_deadline_secs == 0 {
            return Err(invalid_value("scan.outer_deadline_secs", "must be greater than zero"));
        }
        if self.display_limit == 0 {
            return Err(invalid_value("scan.display_limit", "must be greater than zero"));
        }
        Ok(())
    }
}

// Default functions
fn default_outer_deadline_secs() -> u64 {
    30
}

fn default_display_limit() -> usize {
    20
}

fn default_cache_capacity() -> usize {
    256
}

fn default_cache_ttl_secs() -> u64 {
    3600 // 1 hour
}
