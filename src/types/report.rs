//! Report payload handed to rendering, persistence and narrative layers

use super::detection::Category;
use super::target::ScanTarget;
use super::verdict::{RiskLevel, ScoredVerdict};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub report_id: String,
    pub timestamp: DateTime<Utc>,
    pub target: ScanTarget,
    pub scored_verdict: ScoredVerdict,
    pub summary: ReportSummary,
    pub detection_table: Vec<DetectionRow>,
    pub risk_indicators: RiskIndicators,
    pub recommendations: Vec<String>,
    pub technical_details: TechnicalDetails,
    pub provider_status: Vec<ProviderStatus>,
}

impl Report {
    pub fn risk_level(&self) -> RiskLevel {
        self.scored_verdict.risk_level
    }

    /// The counter increment the persistence layer applies for this scan.
    pub fn stats_delta(&self) -> ScanStatsDelta {
        ScanStatsDelta::for_risk(self.risk_level())
    }
}

/// 扫描摘要
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub total_detections: u32,
    pub total_engines: u32,
    pub risk_score: u8,
    pub threat_categories: Vec<Category>,
    pub reputation: String,
    pub scan_kind: String,
    pub providers_queried: usize,
    pub providers_failed: usize,
    /// 因显示上限被隐藏的检测行数
    pub hidden_rows: usize,
}

/// 检测表中的一行
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionRow {
    pub engine: String,
    pub status: String,
    pub result: String,
    pub category: Category,
    pub confidence: String,
    pub provider: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskIndicators {
    pub overall_risk: String,
    pub detection_rate: String,
    pub risk_symbol: String,
    pub confidence_level: String,
    pub threat_level: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicalDetails {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub sha256: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub md5: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub file_info: Option<FileInfo>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub url_info: Option<UrlInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    pub size: u64,
    pub mime_type: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlInfo {
    pub domain: String,
    pub protocol: String,
    pub path: String,
}

/// 单个检测服务的运行状态
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderStatus {
    pub name: String,
    pub succeeded: bool,
    pub synthetic: bool,
    pub positives: u32,
    pub total: u32,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
}

/// One scan's contribution to a user's lifetime counters.
///
/// Applied by the persistence collaborator as a single atomic increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanStatsDelta {
    pub scan_count: u64,
    pub safe_scans: u64,
    pub threats_detected: u64,
}

impl ScanStatsDelta {
    pub fn for_risk(level: RiskLevel) -> Self {
        Self {
            scan_count: 1,
            safe_scans: u64::from(level == RiskLevel::Safe),
            threats_detected: u64::from(level.is_threat()),
        }
    }
}

/// 用户累计扫描统计
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserScanStats {
    pub total_scans: u64,
    pub safe: u64,
    pub threats: u64,
}

impl UserScanStats {
    pub fn apply(&mut self, delta: ScanStatsDelta) {
        self.total_scans += delta.scan_count;
        self.safe += delta.safe_scans;
        self.threats += delta.threats_detected;
    }
}
