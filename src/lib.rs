pub mod args;
pub mod config;
pub mod errors;
pub mod logging;
pub mod providers;
pub mod scan;
pub mod synthetic;
pub mod types;

// Re-export commonly used items for convenience
pub use config::AppConfig;
pub use errors::AppError;
pub use providers::ProviderAdapter;
pub use scan::Scanner;
pub use types::{Report, RiskLevel, ScanTarget};
