//! 合成回退
//!
//! When a provider has no credentials (or the scanner runs offline) its
//! adapter answers with a synthetic result instead of calling the network.
//! Everything here is a pure function of the target identity: the same
//! target always yields the same band, the same counts and the same engine
//! table, so repeat scans agree and the rest of the pipeline behaves exactly
//! as it does against live services.

pub mod profiles;

pub use profiles::SyntheticProfile;

use crate::types::{Category, ProviderResult, ScanTarget};
use rand::rngs::StdRng;
use rand::SeedableRng;
use sha2::{Digest, Sha256};

/// Terms that mark a URL as outright malicious.
const MALICIOUS_URL_TERMS: &[&str] = &[
    "malware", "virus", "trojan", "scam", "fraud", "steal", "hack", "exploit", "ransomware",
    "botnet", "spam", "suspicious-site", "malicious-url", "dangerous-link", "threat", "badsite",
    "evilurl", "harmfullink", "unsafesite", "malicious", "dangerous",
];

/// Brands and credential words commonly impersonated by phishing pages.
const IMPERSONATION_TERMS: &[&str] = &[
    "paypal", "amazon", "microsoft", "google", "apple", "netflix", "facebook", "instagram",
    "twitter", "linkedin", "github", "login", "signin", "verify", "update", "secure", "account",
];

/// Shorteners and bait words.
const LURE_TERMS: &[&str] = &[
    "bit.ly", "tinyurl", "short", "redirect", "click", "promo", "offer", "deal", "win", "prize",
    "lottery",
];

/// Ad markers only count as whole tokens: as substrings they hit "download",
/// "admin", "read" and most other URLs.
const AD_TOKENS: &[&str] = &["ad", "ads"];

/// 合成结果的风险档位
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ThreatBand {
    Clean,
    Suspicious,
    Phishing,
    Malicious,
}

impl ThreatBand {
    /// Provider-level categories a synthetic result in this band carries.
    pub fn categories(&self) -> Vec<Category> {
        match self {
            ThreatBand::Clean => Vec::new(),
            ThreatBand::Suspicious => vec![Category::Suspicious],
            ThreatBand::Phishing => vec![Category::Phishing],
            ThreatBand::Malicious => vec![Category::Malware, Category::Malicious],
        }
    }

    /// Category stamped on detected synthetic records.
    pub fn record_category(&self) -> Category {
        match self {
            ThreatBand::Clean => Category::Suspicious,
            ThreatBand::Suspicious => Category::Suspicious,
            ThreatBand::Phishing => Category::Phishing,
            ThreatBand::Malicious => Category::Malware,
        }
    }
}

/// First four bytes of SHA-256(identity), big-endian.
pub fn seed_for(identity: &str) -> u32 {
    let digest = Sha256::digest(identity.as_bytes());
    u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]])
}

/// Per-provider jitter source. Seeded from the target identity and the
/// provider name, so two providers disagree on details but each one is
/// stable across calls.
pub fn jitter_rng(identity: &str, provider_name: &str) -> StdRng {
    let mut hasher = Sha256::new();
    hasher.update(identity.as_bytes());
    hasher.update([0u8]);
    hasher.update(provider_name.as_bytes());
    let seed: [u8; 32] = hasher.finalize().into();
    StdRng::from_seed(seed)
}

/// Band for a target. Depends on the target only, never on the provider.
pub fn threat_band(target: &ScanTarget) -> ThreatBand {
    let seed = seed_for(target.identity());
    match target {
        ScanTarget::Url(url) => url_band(&url.url, seed),
        ScanTarget::File(_) => file_band(seed),
    }
}

fn url_band(url: &str, seed: u32) -> ThreatBand {
    let lower = url.to_ascii_lowercase();
    let has_any = |terms: &[&str]| terms.iter().any(|t| lower.contains(t));

    // 关键词优先于哈希分桶
    if has_any(MALICIOUS_URL_TERMS) {
        return ThreatBand::Malicious;
    }
    if lower.contains("phish")
        || (has_any(IMPERSONATION_TERMS)
            && (lower.contains("fake") || lower.contains("secure") || seed % 3 == 0))
    {
        return ThreatBand::Phishing;
    }
    if has_any(LURE_TERMS) || has_ad_token(&lower) {
        return ThreatBand::Suspicious;
    }

    if seed % 8 == 0 {
        ThreatBand::Malicious
    } else if seed % 6 == 0 {
        ThreatBand::Phishing
    } else if seed % 4 == 0 {
        ThreatBand::Suspicious
    } else {
        ThreatBand::Clean
    }
}

fn has_ad_token(lower: &str) -> bool {
    lower
        .split(|c: char| !c.is_ascii_alphanumeric())
        .any(|token| AD_TOKENS.contains(&token))
}

fn file_band(seed: u32) -> ThreatBand {
    match seed % 100 {
        0..=14 => ThreatBand::Malicious,
        15..=34 => ThreatBand::Suspicious,
        _ => ThreatBand::Clean,
    }
}

/// Stand-in for one named provider.
#[derive(Debug, Clone)]
pub struct SyntheticFallback {
    provider_name: String,
    profile: SyntheticProfile,
}

impl SyntheticFallback {
    pub fn new(provider_name: impl Into<String>, profile: SyntheticProfile) -> Self {
        Self {
            provider_name: provider_name.into(),
            profile,
        }
    }

    pub fn provider_name(&self) -> &str {
        &self.provider_name
    }

    pub fn synthesize(&self, target: &ScanTarget) -> ProviderResult {
        let band = threat_band(target);
        let mut rng = jitter_rng(target.identity(), &self.provider_name);
        self.profile
            .generate(&self.provider_name, target.kind(), band, &mut rng)
            .mark_synthetic()
    }
}
