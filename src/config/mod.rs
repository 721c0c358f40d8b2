pub mod app_config;
pub mod loader;
pub mod provider_config;
pub mod scan_config;

// Re-export commonly used types
pub use app_config::{AppConfig, LogSettings};
pub use loader::ConfigLoader;
pub use provider_config::{ProviderConfig, ProvidersConfig};
pub use scan_config::{CountThresholds, ScanConfig, ThresholdConfig};

// Re-export constants
pub use app_config::{CONFIG_FILE_NAME, USER_CONFIG_PATH};
