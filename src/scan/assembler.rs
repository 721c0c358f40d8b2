//! 报告组装
//!
//! Last pure-data step: turns the aggregated result and its verdict into the
//! `Report` handed to rendering, persistence and narrative layers.

use chrono::{DateTime, Utc};

use crate::types::{
    AggregatedResult, DetectionRow, FileInfo, ProviderStatus, Report, ReportSummary,
    RiskIndicators, RiskLevel, ScanTarget, ScoredVerdict, TechnicalDetails, UrlInfo,
};

const BASE_RECOMMENDATIONS: &[&str] = &[
    "🔍 Regular security scans recommended",
    "🛡️ Keep antivirus software updated",
    "📧 Be cautious with email attachments",
    "🔒 Use strong, unique passwords",
];

const ESCALATION: &str = "🚨 IMMEDIATE ACTION REQUIRED";

pub struct ReportAssembler {
    display_limit: usize,
}

impl ReportAssembler {
    pub fn new(display_limit: usize) -> Self {
        Self { display_limit }
    }

    pub fn assemble(&self, aggregated: &AggregatedResult, verdict: ScoredVerdict) -> Report {
        self.assemble_at(aggregated, verdict, new_report_id(), Utc::now())
    }

    /// Deterministic variant with a caller supplied id and timestamp.
    pub fn assemble_at(
        &self,
        aggregated: &AggregatedResult,
        verdict: ScoredVerdict,
        report_id: String,
        timestamp: DateTime<Utc>,
    ) -> Report {
        let (detection_table, hidden_rows) = self.detection_table(aggregated);

        let summary = ReportSummary {
            total_detections: aggregated.positives,
            total_engines: aggregated.total,
            risk_score: verdict.score,
            threat_categories: aggregated.categories.iter().copied().collect(),
            reputation: reputation(aggregated.positives).to_string(),
            scan_kind: scan_kind(&aggregated.target).to_string(),
            providers_queried: aggregated.provider_results.len(),
            providers_failed: aggregated.failed_providers().count(),
            hidden_rows,
        };

        Report {
            report_id,
            timestamp,
            target: aggregated.target.clone(),
            scored_verdict: verdict,
            summary,
            detection_table,
            risk_indicators: risk_indicators(aggregated, verdict),
            recommendations: recommendations(verdict.risk_level),
            technical_details: technical_details(&aggregated.target),
            provider_status: provider_status(aggregated),
        }
    }

    /// Detected rows first (stable), then truncated. Returns the number of
    /// rows left out.
    fn detection_table(&self, aggregated: &AggregatedResult) -> (Vec<DetectionRow>, usize) {
        let mut rows: Vec<DetectionRow> = aggregated
            .provider_results
            .iter()
            .filter(|p| p.succeeded)
            .flat_map(|p| {
                p.records.iter().map(move |record| DetectionRow {
                    engine: record.engine_name.clone(),
                    status: if record.detected {
                        "🔴 DETECTED".to_string()
                    } else {
                        "✅ CLEAN".to_string()
                    },
                    result: record.result_label.clone(),
                    category: record.category,
                    confidence: if record.detected { "High" } else { "Low" }.to_string(),
                    provider: p.provider_name.clone(),
                })
            })
            .collect();

        rows.sort_by_key(|row| row.status.starts_with('✅'));
        let hidden = rows.len().saturating_sub(self.display_limit);
        rows.truncate(self.display_limit);
        (rows, hidden)
    }
}

/// `RPT-` + simple UUID v4
pub fn new_report_id() -> String {
    format!("RPT-{}", uuid::Uuid::new_v4().simple())
}

fn reputation(positives: u32) -> &'static str {
    match positives {
        0 => "Good",
        1..=4 => "Questionable",
        5..=14 => "Suspicious",
        _ => "Malicious",
    }
}

fn scan_kind(target: &ScanTarget) -> &'static str {
    match target {
        ScanTarget::File(file) if file.is_apk() => "apk",
        ScanTarget::File(_) => "file",
        ScanTarget::Url(_) => "url",
    }
}

fn risk_indicators(aggregated: &AggregatedResult, verdict: ScoredVerdict) -> RiskIndicators {
    let score = verdict.score;
    let risk_symbol = if score > 70 {
        "🔴"
    } else if score > 30 {
        "🟡"
    } else {
        "🟢"
    };
    let overall_risk = if score > 70 {
        "🔴 HIGH RISK"
    } else if score > 30 {
        "🟡 MEDIUM RISK"
    } else {
        "🟢 LOW RISK"
    };
    let confidence_level = match score {
        81..=u8::MAX => "Very High",
        51..=80 => "High",
        21..=50 => "Medium",
        _ => "Low",
    };

    RiskIndicators {
        overall_risk: overall_risk.to_string(),
        detection_rate: format!("{}/{} engines", aggregated.positives, aggregated.total),
        risk_symbol: risk_symbol.to_string(),
        confidence_level: confidence_level.to_string(),
        threat_level: verdict.risk_level.as_str().to_ascii_uppercase(),
    }
}

/// Static per-level template; every list ends with the shared hygiene items.
pub fn recommendations(level: RiskLevel) -> Vec<String> {
    let specific: &[&str] = match level {
        RiskLevel::Malicious => &[
            ESCALATION,
            "❌ Do not execute or open this file/URL",
            "🔥 Quarantine or delete immediately",
            "🔍 Scan entire system for infections",
            "📞 Contact IT security team",
        ],
        RiskLevel::Phishing => &[
            ESCALATION,
            "🎣 Do not enter credentials or personal data on this site",
            "🚫 Close the page and block the domain",
            "🔑 Change any password already entered here",
            "📞 Report the page to your IT security team",
        ],
        RiskLevel::Suspicious => &[
            "⚠️ Exercise extreme caution",
            "🔍 Additional verification recommended",
            "🛡️ Scan with multiple engines",
            "📋 Monitor system behavior",
        ],
        RiskLevel::Safe => &["✅ File/URL appears safe", "🔍 Continue regular monitoring"],
    };

    specific
        .iter()
        .chain(BASE_RECOMMENDATIONS)
        .map(|s| s.to_string())
        .collect()
}

fn technical_details(target: &ScanTarget) -> TechnicalDetails {
    match target {
        ScanTarget::File(file) => TechnicalDetails {
            sha256: (file.content_hash.len() == 64).then(|| file.content_hash.clone()),
            md5: file
                .md5
                .clone()
                .or_else(|| (file.content_hash.len() == 32).then(|| file.content_hash.clone())),
            file_info: Some(FileInfo {
                size: file.size,
                mime_type: file.mime_type.clone(),
                name: file.file_name.clone(),
            }),
            url_info: None,
        },
        ScanTarget::Url(url) => TechnicalDetails {
            url_info: Some(UrlInfo {
                domain: url.domain.clone(),
                protocol: url.protocol.clone(),
                path: url.path.clone(),
            }),
            ..TechnicalDetails::default()
        },
    }
}

fn provider_status(aggregated: &AggregatedResult) -> Vec<ProviderStatus> {
    aggregated
        .provider_results
        .iter()
        .map(|p| ProviderStatus {
            name: p.provider_name.clone(),
            succeeded: p.succeeded,
            synthetic: p.synthetic,
            positives: p.positives,
            total: p.total,
            error: p.error.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::aggregator::Aggregator;
    use crate::types::{Category, DetectionRecord, ProviderResult};
    use chrono::TimeZone;

    fn many_records(count: usize, detected_every: usize) -> Vec<DetectionRecord> {
        (0..count)
            .map(|i| {
                if i % detected_every == 0 {
                    DetectionRecord::new(format!("Engine{:02}", i), true, "Trojan.Agent", Category::Malware)
                } else {
                    DetectionRecord::clean(format!("Engine{:02}", i))
                }
            })
            .collect()
    }

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_detection_table_is_capped_and_detected_first() {
        let target = ScanTarget::url("https://example.com/").unwrap();
        let records = many_records(30, 5); // 6 detected
        let result = ProviderResult::from_records("VirusTotal", records, [Category::Malware]);
        let agg = Aggregator::aggregate(target, vec![result]);

        let report = ReportAssembler::new(20).assemble_at(
            &agg,
            ScoredVerdict { risk_level: RiskLevel::Malicious, score: 20 },
            "RPT-test".to_string(),
            fixed_time(),
        );

        assert_eq!(report.detection_table.len(), 20);
        assert_eq!(report.summary.hidden_rows, 10);
        assert!(report.detection_table[..6].iter().all(|r| r.status == "🔴 DETECTED"));
        assert!(report.detection_table[6..].iter().all(|r| r.status == "✅ CLEAN"));
        // 稳定排序：检测到的行保持原顺序
        assert_eq!(report.detection_table[0].engine, "Engine00");
        assert_eq!(report.detection_table[1].engine, "Engine05");
        assert_eq!(report.detection_table[0].provider, "VirusTotal");
        assert_eq!(report.detection_table[0].confidence, "High");
        // 评分使用全部数据
        assert_eq!(report.summary.total_engines, 30);
        assert_eq!(report.summary.total_detections, 6);
    }

    #[test]
    fn test_recommendations_per_level() {
        for level in [RiskLevel::Malicious, RiskLevel::Phishing] {
            let recs = recommendations(level);
            assert_eq!(recs[0], ESCALATION);
            assert!(recs.ends_with(&BASE_RECOMMENDATIONS.iter().map(|s| s.to_string()).collect::<Vec<_>>()));
        }
        for level in [RiskLevel::Suspicious, RiskLevel::Safe] {
            let recs = recommendations(level);
            assert_ne!(recs[0], ESCALATION);
            assert_eq!(recs.last().map(String::as_str), BASE_RECOMMENDATIONS.last().copied());
        }
    }

    #[test]
    fn test_risk_indicators() {
        let target = ScanTarget::url("https://example.com/").unwrap();
        let agg = Aggregator::aggregate(
            target,
            vec![ProviderResult::with_counts("A", 8, 12, Vec::new(), [Category::Malware])],
        );
        let report = ReportAssembler::new(20).assemble(
            &agg,
            ScoredVerdict { risk_level: RiskLevel::Malicious, score: 67 },
        );
        let indicators = &report.risk_indicators;
        assert_eq!(indicators.overall_risk, "🟡 MEDIUM RISK");
        assert_eq!(indicators.risk_symbol, "🟡");
        assert_eq!(indicators.confidence_level, "High");
        assert_eq!(indicators.detection_rate, "8/12 engines");
        assert_eq!(indicators.threat_level, "MALICIOUS");
        assert!(report.report_id.starts_with("RPT-"));
        assert_eq!(report.report_id.len(), 4 + 32);
        assert_eq!(report.summary.reputation, "Suspicious");
    }

    #[test]
    fn test_reputation_bands() {
        assert_eq!(reputation(0), "Good");
        assert_eq!(reputation(4), "Questionable");
        assert_eq!(reputation(5), "Suspicious");
        assert_eq!(reputation(15), "Malicious");
    }

    #[test]
    fn test_apk_and_file_details() {
        let apk = ScanTarget::from_bytes(b"PK\x03\x04", "application/vnd.android.package-archive", Some("app.apk".into()));
        let agg = Aggregator::aggregate(apk, vec![ProviderResult::failed("VirusTotal", "timeout")]);
        let report = ReportAssembler::new(20).assemble(&agg, ScoredVerdict::safe());

        assert_eq!(report.summary.scan_kind, "apk");
        assert_eq!(report.summary.providers_failed, 1);
        assert!(report.technical_details.sha256.is_some());
        assert!(report.technical_details.md5.is_some());
        assert_eq!(
            report.technical_details.file_info.as_ref().and_then(|f| f.name.as_deref()),
            Some("app.apk")
        );
        assert_eq!(report.provider_status[0].error.as_deref(), Some("timeout"));
        assert!(report.detection_table.is_empty());
    }

    #[test]
    fn test_report_json_field_names() {
        let target = ScanTarget::url("https://example.com/path").unwrap();
        let agg = Aggregator::aggregate(target, Vec::new());
        let report = ReportAssembler::new(20).assemble_at(
            &agg,
            ScoredVerdict::safe(),
            "RPT-fixed".to_string(),
            fixed_time(),
        );
        let json = serde_json::to_value(&report).unwrap();
        for field in [
            "reportId",
            "timestamp",
            "target",
            "scoredVerdict",
            "summary",
            "detectionTable",
            "riskIndicators",
            "recommendations",
        ] {
            assert!(json.get(field).is_some(), "missing {}", field);
        }
        assert_eq!(json["scoredVerdict"]["riskLevel"], "safe");
        assert_eq!(json["technicalDetails"]["urlInfo"]["path"], "/path");
    }
}
