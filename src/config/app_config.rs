use serde::Deserialize;
use std::{collections::HashMap, path::PathBuf};

use crate::errors::{invalid_value, ConfigError};

use super::{
    loader::ConfigLoader,
    provider_config::{PartialProvidersConfig, ProvidersConfig},
    scan_config::{PartialScanConfig, PartialThresholdConfig, ScanConfig, ThresholdConfig},
};

// Configuration location constants
pub const USER_CONFIG_PATH: &str = "~/.config/cysafe";
pub const CONFIG_FILE_NAME: &str = "config.toml";

pub const OFFLINE_ENV: &str = "CYSAFE_OFFLINE";
pub const LOG_LEVEL_ENV: &str = "CYSAFE_LOG_LEVEL";

const LOG_FORMATS: &[&str] = &["pretty", "compact", "json"];

/// 日志相关设置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub level: String,
    pub format: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

#[derive(Deserialize, Debug, Default)]
pub struct PartialLogSettings {
    pub level: Option<String>,
    pub format: Option<String>,
}

/// Main Application Configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppConfig {
    pub scan: ScanConfig,
    pub thresholds: ThresholdConfig,
    pub providers: ProvidersConfig,
    pub logging: LogSettings,
}

/// Partial Application Configuration for loading from files
#[derive(Deserialize, Debug, Default)]
pub struct PartialAppConfig {
    pub scan: Option<PartialScanConfig>,
    pub thresholds: Option<PartialThresholdConfig>,
    pub providers: Option<PartialProvidersConfig>,
    pub logging: Option<PartialLogSettings>,
}

impl AppConfig {
    /// Load configuration with custom base path (for testing)
    pub fn load_with_base_path(base_path: PathBuf) -> Result<Self, ConfigError> {
        ConfigLoader::with_base_path(base_path).load_config()
    }

    /// Create AppConfig from partial config and environment
    pub fn from_partial_and_env(
        partial: Option<PartialAppConfig>,
        env_map: HashMap<String, String>,
    ) -> Result<Self, ConfigError> {
        let partial = partial.unwrap_or_default();

        let mut scan = ScanConfig::from_partial(partial.scan);
        if let Some(raw) = env_map.get(OFFLINE_ENV) {
            scan.offline = parse_flag(raw).ok_or_else(|| {
                invalid_value(OFFLINE_ENV, format!("expected a boolean, got '{}'", raw))
            })?;
        }

        let thresholds = ThresholdConfig::from_partial(partial.thresholds);
        let providers = ProvidersConfig::from_env_or_file(partial.providers, &env_map);

        let file_logging = partial.logging.unwrap_or_default();
        let logging = LogSettings {
            level: env_map
                .get(LOG_LEVEL_ENV)
                .cloned()
                .or(file_logging.level)
                .unwrap_or_else(default_log_level),
            format: file_logging.format.unwrap_or_else(default_log_format),
        };

        Ok(AppConfig {
            scan,
            thresholds,
            providers,
            logging,
        })
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.scan.validate()?;
        self.thresholds.validate()?;

        for (section, provider) in self.providers.named() {
            if provider.timeout_secs == 0 {
                return Err(invalid_value(
                    format!("{}.timeout_secs", section),
                    "must be greater than zero",
                ));
            }
            // 单个 provider 的超时不能超过整体截止时间
            if provider.timeout_secs > self.scan.outer_deadline_secs {
                return Err(invalid_value(
                    format!("{}.timeout_secs", section),
                    format!(
                        "{}s exceeds scan.outer_deadline_secs ({}s)",
                        provider.timeout_secs, self.scan.outer_deadline_secs
                    ),
                ));
            }
        }

        if !LOG_FORMATS.contains(&self.logging.format.as_str()) {
            return Err(invalid_value(
                "logging.format",
                format!("expected one of {:?}, got '{}'", LOG_FORMATS, self.logging.format),
            ));
        }

        Ok(())
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}
