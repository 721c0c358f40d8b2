//! Shapes of synthetic results, one per kind of detection service

use super::ThreatBand;
use crate::providers::hybrid_analysis::threat_score_result;
use crate::types::{DetectionRecord, ProviderResult, TargetKind};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use std::ops::RangeInclusive;

/// 文件扫描引擎目录
pub const FILE_ENGINES: &[&str] = &[
    "Avast",
    "AVG",
    "Bitdefender",
    "ClamAV",
    "ESET",
    "Kaspersky",
    "McAfee",
    "Norton",
    "Sophos",
    "Trend Micro",
    "Windows Defender",
    "F-Secure",
];

/// URL 扫描引擎目录
pub const URL_ENGINES: &[&str] = &[
    "Avast",
    "AVG",
    "Bitdefender",
    "ClamAV",
    "ESET",
    "Kaspersky",
    "McAfee",
    "Norton",
    "Sophos",
    "Trend Micro",
    "Windows Defender",
    "F-Secure",
    "Malwarebytes",
    "Panda",
    "Webroot",
];

/// 黑名单目录
pub const BLOCKLISTS: &[&str] = &[
    "Spamhaus",
    "SURBL",
    "PhishTank",
    "OpenPhish",
    "URLhaus",
    "SpamCop",
    "Google Safe Browsing",
    "Malware Domain List",
];

const MALWARE_LABELS: &[&str] = &[
    "Trojan.GenericKD",
    "Win32.Malware.Gen",
    "Backdoor.Agent",
    "Malicious (High Confidence)",
];
const SUSPICIOUS_LABELS: &[&str] = &["Suspicious", "Heuristic.Suspect", "PUP.Optional"];
const PHISHING_LABELS: &[&str] = &["Phishing site", "Phishing.Generic"];

/// How a given provider's synthetic answer is shaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntheticProfile {
    /// Many engines, each with its own verdict.
    MultiEngine,
    /// One 0-100 threat score.
    ThreatScore,
    /// Listed / not listed on a set of domain blacklists.
    Blocklist,
}

impl SyntheticProfile {
    pub fn generate(
        &self,
        provider_name: &str,
        kind: TargetKind,
        band: ThreatBand,
        rng: &mut StdRng,
    ) -> ProviderResult {
        match self {
            SyntheticProfile::MultiEngine => multi_engine(provider_name, kind, band, rng),
            SyntheticProfile::ThreatScore => threat_score(provider_name, band, rng),
            SyntheticProfile::Blocklist => blocklist(provider_name, band, rng),
        }
    }
}

fn multi_engine(provider_name: &str, kind: TargetKind, band: ThreatBand, rng: &mut StdRng) -> ProviderResult {
    let catalog = match kind {
        TargetKind::File => FILE_ENGINES,
        TargetKind::Url => URL_ENGINES,
    };
    let positives = rng.gen_range(multi_engine_range(kind, band)).min(catalog.len());

    let mut order: Vec<usize> = (0..catalog.len()).collect();
    order.shuffle(rng);
    let mut detected = vec![false; catalog.len()];
    for &idx in order.iter().take(positives) {
        detected[idx] = true;
    }

    let records = catalog
        .iter()
        .zip(detected)
        .map(|(engine, hit)| {
            if hit {
                let label = pick_label(band, rng);
                DetectionRecord::new(*engine, true, label, band.record_category())
            } else {
                DetectionRecord::clean(*engine)
            }
        })
        .collect();

    ProviderResult::from_records(provider_name, records, band.categories())
}

fn multi_engine_range(kind: TargetKind, band: ThreatBand) -> RangeInclusive<usize> {
    match (kind, band) {
        (TargetKind::File, ThreatBand::Clean) => 0..=1,
        (TargetKind::File, ThreatBand::Suspicious | ThreatBand::Phishing) => 2..=4,
        (TargetKind::File, ThreatBand::Malicious) => 6..=11,
        (TargetKind::Url, ThreatBand::Clean) => 0..=0,
        (TargetKind::Url, ThreatBand::Suspicious) => 3..=8,
        (TargetKind::Url, ThreatBand::Phishing) => 8..=12,
        (TargetKind::Url, ThreatBand::Malicious) => 11..=15,
    }
}

fn pick_label(band: ThreatBand, rng: &mut StdRng) -> &'static str {
    let labels = match band {
        ThreatBand::Malicious => MALWARE_LABELS,
        ThreatBand::Phishing => PHISHING_LABELS,
        ThreatBand::Suspicious | ThreatBand::Clean => SUSPICIOUS_LABELS,
    };
    labels.choose(rng).copied().unwrap_or("Suspicious")
}

fn threat_score(provider_name: &str, band: ThreatBand, rng: &mut StdRng) -> ProviderResult {
    let (range, verdict) = match band {
        ThreatBand::Clean => (0..=24, "no specific threat"),
        ThreatBand::Suspicious => (35..=59, "suspicious"),
        ThreatBand::Phishing => (65..=84, "phishing"),
        ThreatBand::Malicious => (85..=99, "malicious"),
    };
    let score: u32 = rng.gen_range(range);

    let mut result = threat_score_result(provider_name, score, Some(verdict));
    // 类别与档位保持一致，计数仍由真实响应的归一化规则决定
    result.categories = band.categories().into_iter().collect();
    result
}

fn blocklist(provider_name: &str, band: ThreatBand, rng: &mut StdRng) -> ProviderResult {
    let range = match band {
        ThreatBand::Clean => 0..=0,
        ThreatBand::Suspicious => 1..=2,
        ThreatBand::Phishing => 2..=4,
        ThreatBand::Malicious => 3..=6,
    };
    let listed = rng.gen_range(range).min(BLOCKLISTS.len());

    let mut order: Vec<usize> = (0..BLOCKLISTS.len()).collect();
    order.shuffle(rng);
    let hits: Vec<usize> = order.into_iter().take(listed).collect();

    let records = BLOCKLISTS
        .iter()
        .enumerate()
        .map(|(idx, list)| {
            let engine = format!("URLVoid-{}", list);
            if hits.contains(&idx) {
                DetectionRecord::new(engine, true, "Listed", band.record_category())
            } else {
                DetectionRecord::clean(engine)
            }
        })
        .collect();

    ProviderResult::from_records(provider_name, records, band.categories())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic::jitter_rng;
    use crate::types::Category;

    fn rng(tag: &str) -> StdRng {
        jitter_rng(tag, "test")
    }

    #[test]
    fn test_multi_engine_ranges() {
        for i in 0..50 {
            let tag = format!("target-{}", i);
            let url_mal = multi_engine("VT", TargetKind::Url, ThreatBand::Malicious, &mut rng(&tag));
            assert_eq!(url_mal.total, 15);
            assert!((11..=15).contains(&url_mal.positives));

            let url_clean = multi_engine("VT", TargetKind::Url, ThreatBand::Clean, &mut rng(&tag));
            assert_eq!(url_clean.positives, 0);
            assert!(url_clean.categories.is_empty());

            let file_sus = multi_engine("VT", TargetKind::File, ThreatBand::Suspicious, &mut rng(&tag));
            assert_eq!(file_sus.total, 12);
            assert!((2..=4).contains(&file_sus.positives));
            assert_eq!(
                file_sus.categories.iter().copied().collect::<Vec<_>>(),
                vec![Category::Suspicious]
            );
        }
    }

    #[test]
    fn test_multi_engine_uses_catalog_names() {
        let result = multi_engine("VT", TargetKind::File, ThreatBand::Malicious, &mut rng("x"));
        let names: Vec<&str> = result.records.iter().map(|r| r.engine_name.as_str()).collect();
        assert_eq!(names, FILE_ENGINES.to_vec());
        assert_eq!(
            result.records.iter().filter(|r| r.detected).count() as u32,
            result.positives
        );
    }

    #[test]
    fn test_threat_score_profile() {
        for i in 0..50 {
            let tag = format!("target-{}", i);
            let mal = threat_score("HA", ThreatBand::Malicious, &mut rng(&tag));
            assert_eq!(mal.total, 10);
            assert!((8..=9).contains(&mal.positives));
            assert_eq!(mal.records.len(), 1);
            assert!(mal.records[0].detected);

            let clean = threat_score("HA", ThreatBand::Clean, &mut rng(&tag));
            assert_eq!(clean.positives, 0);
            assert!(!clean.records[0].detected);
            assert!(clean.categories.is_empty());

            let phish = threat_score("HA", ThreatBand::Phishing, &mut rng(&tag));
            assert!(phish.categories.contains(&Category::Phishing));
            assert!(!phish.categories.contains(&Category::Malware));
        }
    }

    #[test]
    fn test_blocklist_profile() {
        for i in 0..50 {
            let tag = format!("target-{}", i);
            let result = blocklist("URLVoid", ThreatBand::Phishing, &mut rng(&tag));
            assert_eq!(result.total, 8);
            assert!((2..=4).contains(&result.positives));
            assert!(result.records.iter().all(|r| r.engine_name.starts_with("URLVoid-")));
        }
        let clean = blocklist("URLVoid", ThreatBand::Clean, &mut rng("clean"));
        assert_eq!(clean.positives, 0);
    }
}
