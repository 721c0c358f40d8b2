//! 配置加载集成测试

use std::fs;
use std::path::PathBuf;

use cysafe::config::{AppConfig, ConfigLoader, CountThresholds};
use cysafe::errors::ConfigError;
use cysafe::scan::RiskClassifier;
use cysafe::types::{AggregatedResult, RiskLevel, ScanTarget};
use tempfile::TempDir;

fn write_config(dir: &TempDir, contents: &str) -> PathBuf {
    let path = dir.path().join("cysafe.toml");
    fs::write(&path, contents).unwrap();
    path
}

/// 测试从文件加载完整配置
#[test]
fn test_load_explicit_file() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[scan]
outer_deadline_secs = 45
display_limit = 10
offline = true
cache_capacity = 0

[thresholds.url]
malicious = 12
phishing = 0
suspicious = 3

[providers.hybrid_analysis]
enabled = false
timeout_secs = 20

[logging]
level = "debug"
format = "compact"
"#,
    );

    let config = ConfigLoader::new().load_from_file(&path).unwrap();

    assert_eq!(config.scan.outer_deadline_secs, 45);
    assert_eq!(config.scan.display_limit, 10);
    assert_eq!(config.scan.cache_capacity, 0);
    assert!(!config.providers.hybrid_analysis.enabled);
    assert_eq!(config.providers.hybrid_analysis.timeout_secs, 20);
    assert!(config.providers.virustotal.enabled);
    assert_eq!(config.logging.format, "compact");

    // 0 关闭 phishing 档位，未写的 file 阈值保持默认
    assert_eq!(
        config.thresholds.url,
        CountThresholds {
            malicious: Some(12),
            phishing: None,
            suspicious: Some(3),
        }
    );
    assert_eq!(config.thresholds.file, CountThresholds::file_defaults());

    println!("✅ 配置文件加载测试通过");
}

/// 自定义阈值改变分类结果
#[test]
fn test_thresholds_drive_classification() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[thresholds.url]
malicious = 4
phishing = 0
suspicious = 1
"#,
    );
    let config = ConfigLoader::new().load_from_file(&path).unwrap();
    let classifier = RiskClassifier::new(config.thresholds);

    let aggregated = |positives: u32| AggregatedResult {
        target: ScanTarget::url("https://example.com/").unwrap(),
        positives,
        total: 30,
        records: Vec::new(),
        categories: Default::default(),
        provider_results: Vec::new(),
    };

    assert_eq!(classifier.classify(&aggregated(0)).risk_level, RiskLevel::Safe);
    assert_eq!(classifier.classify(&aggregated(2)).risk_level, RiskLevel::Suspicious);
    assert_eq!(classifier.classify(&aggregated(4)).risk_level, RiskLevel::Malicious);

    let defaults = RiskClassifier::default();
    assert_eq!(defaults.classify(&aggregated(4)).risk_level, RiskLevel::Suspicious);

    println!("✅ 阈值分类测试通过");
}

/// 测试非法配置被拒绝
#[test]
fn test_invalid_config_rejected() {
    let dir = TempDir::new().unwrap();
    let loader = ConfigLoader::new();

    let unordered = write_config(
        &dir,
        r#"
[thresholds.file]
malicious = 2
suspicious = 5
"#,
    );
    assert!(matches!(
        loader.load_from_file(&unordered),
        Err(ConfigError::InvalidValue { .. })
    ));

    let slow_provider = write_config(
        &dir,
        r#"
[scan]
outer_deadline_secs = 10

[providers.virustotal]
timeout_secs = 30
"#,
    );
    match loader.load_from_file(&slow_provider) {
        Err(ConfigError::InvalidValue { field, .. }) => {
            assert_eq!(field, "providers.virustotal.timeout_secs");
        }
        other => panic!("expected InvalidValue, got {:?}", other.map(|_| ())),
    }

    let bad_format = write_config(
        &dir,
        r#"
[logging]
format = "xml"
"#,
    );
    assert!(loader.load_from_file(&bad_format).is_err());

    let broken = write_config(&dir, "[scan\ndisplay_limit = ");
    assert!(matches!(
        loader.load_from_file(&broken),
        Err(ConfigError::TomlParse(_, _))
    ));

    println!("✅ 非法配置测试通过");
}

/// 用户目录下没有配置文件时使用默认值
#[test]
fn test_missing_user_config_falls_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    let config = AppConfig::load_with_base_path(dir.path().to_path_buf()).unwrap();
    let defaults = AppConfig::default();

    assert_eq!(config.scan.outer_deadline_secs, defaults.scan.outer_deadline_secs);
    assert_eq!(config.thresholds, defaults.thresholds);

    println!("✅ 默认配置测试通过");
}

/// 用户目录下的配置文件被自动读取
#[test]
fn test_user_config_in_base_path() {
    let dir = TempDir::new().unwrap();
    let loader = ConfigLoader::with_base_path(dir.path().to_path_buf());
    let path = loader.config_path();
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, "[scan]\ndisplay_limit = 5\n").unwrap();

    let config = loader.load_config().unwrap();
    assert_eq!(config.scan.display_limit, 5);

    println!("✅ 用户配置目录测试通过");
}
