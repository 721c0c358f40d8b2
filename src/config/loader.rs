use std::{
    collections::HashMap,
    env, fs,
    path::{Path, PathBuf},
};

use crate::errors::ConfigError;

use super::{
    app_config::{
        AppConfig, PartialAppConfig, CONFIG_FILE_NAME, LOG_LEVEL_ENV, OFFLINE_ENV,
        USER_CONFIG_PATH,
    },
    provider_config::{HYBRID_ANALYSIS_API_KEY_ENV, URLVOID_API_KEY_ENV, VIRUSTOTAL_API_KEY_ENV},
};

/// Configuration loader responsible for loading config from files and environment
pub struct ConfigLoader {
    base_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new config loader with default paths
    pub fn new() -> Self {
        Self { base_path: None }
    }

    /// Create a config loader with custom base path (for testing)
    pub fn with_base_path(base_path: PathBuf) -> Self {
        Self {
            base_path: Some(base_path),
        }
    }

    /// Load complete application configuration from the user config file.
    /// A missing file is not an error: defaults plus environment apply.
    pub fn load_config(&self) -> Result<AppConfig, ConfigError> {
        let config_path = self.config_path();
        self.load_from_path(&config_path, false)
    }

    /// Load configuration from an explicit file, which must exist.
    pub fn load_from_file(&self, path: &Path) -> Result<AppConfig, ConfigError> {
        let expanded = PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).as_ref());
        self.load_from_path(&expanded, true)
    }

    fn load_from_path(&self, path: &Path, required: bool) -> Result<AppConfig, ConfigError> {
        if required && !path.exists() {
            return Err(ConfigError::FileRead(
                path.to_string_lossy().to_string(),
                std::io::Error::new(std::io::ErrorKind::NotFound, "config file not found"),
            ));
        }

        let partial_config = self.load_partial_config(path)?;
        let env_map = self.collect_env_vars();

        let config = AppConfig::from_partial_and_env(partial_config, env_map)?;
        config.validate()?;
        Ok(config)
    }

    /// Path of the user configuration file
    pub fn config_path(&self) -> PathBuf {
        self.extract_file_path(USER_CONFIG_PATH, CONFIG_FILE_NAME)
    }

    /// Extract file path with tilde expansion and base path override
    fn extract_file_path(&self, base_dir: &str, file_name: &str) -> PathBuf {
        let expanded_base = if let Some(base_path) = &self.base_path {
            // For testing: use custom base path
            base_path.join(base_dir.trim_start_matches("~/"))
        } else {
            // Normal operation: expand tilde
            let expanded = shellexpand::tilde(base_dir);
            PathBuf::from(expanded.as_ref())
        };

        expanded_base.join(file_name)
    }

    /// Load partial configuration from TOML file
    fn load_partial_config(&self, config_path: &Path) -> Result<Option<PartialAppConfig>, ConfigError> {
        if !config_path.exists() {
            tracing::debug!("配置文件 {:?} 不存在，使用默认配置", config_path);
            return Ok(None);
        }

        let content = fs::read_to_string(config_path)
            .map_err(|e| ConfigError::FileRead(config_path.to_string_lossy().to_string(), e))?;

        let partial_config: PartialAppConfig = toml::from_str(&content)
            .map_err(|e| ConfigError::TomlParse(config_path.to_string_lossy().to_string(), e))?;

        tracing::info!("已加载配置文件: {:?}", config_path);
        Ok(Some(partial_config))
    }

    /// Collect relevant environment variables
    fn collect_env_vars(&self) -> HashMap<String, String> {
        let env_keys = [
            // Provider credentials
            VIRUSTOTAL_API_KEY_ENV,
            HYBRID_ANALYSIS_API_KEY_ENV,
            URLVOID_API_KEY_ENV,
            // Runtime switches
            OFFLINE_ENV,
            LOG_LEVEL_ENV,
        ];

        let mut env_map = HashMap::new();
        for key in &env_keys {
            if let Ok(value) = env::var(key) {
                env_map.insert(key.to_string(), value);
            }
        }
        env_map
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
