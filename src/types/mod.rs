//! 扫描核心的共享数据类型

pub mod detection;
pub mod report;
pub mod target;
pub mod verdict;

pub use detection::{Category, DetectionRecord, ProviderResult};
pub use report::{
    DetectionRow, FileInfo, ProviderStatus, Report, ReportSummary, RiskIndicators,
    ScanStatsDelta, TechnicalDetails, UrlInfo, UserScanStats,
};
pub use target::{FileTarget, ScanTarget, TargetKind, UrlTarget};
pub use verdict::{AggregatedResult, RiskLevel, ScoredVerdict};
