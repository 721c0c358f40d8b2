use std::sync::Arc;

use super::assembler::ReportAssembler;
use super::cache::VerdictCache;
use super::classifier::RiskClassifier;
use super::dispatcher::Dispatcher;
use crate::config::AppConfig;
use crate::errors::AppError;
use crate::logging::OperationTimer;
use crate::providers::{default_providers, ProviderAdapter};
use crate::types::{AggregatedResult, Report, ScanTarget};

/// 扫描服务：调度 → 聚合 → 分类 → 组装报告
pub struct Scanner {
    providers: Vec<Arc<dyn ProviderAdapter>>,
    dispatcher: Dispatcher,
    classifier: RiskClassifier,
    assembler: ReportAssembler,
    cache: Option<Arc<VerdictCache>>,
}

impl Scanner {
    /// Standard provider set, plus a verdict cache when the configured
    /// capacity is non-zero.
    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        let providers = default_providers(config)?;
        let scanner = Self::new(providers, config);
        let cache = VerdictCache::new(config.scan.cache_capacity, config.scan.cache_ttl());
        Ok(match cache {
            Some(cache) => scanner.with_cache(Arc::new(cache)),
            None => scanner,
        })
    }

    pub fn new(providers: Vec<Arc<dyn ProviderAdapter>>, config: &AppConfig) -> Self {
        Self {
            providers,
            dispatcher: Dispatcher::new(Some(config.scan.outer_deadline())),
            classifier: RiskClassifier::new(config.thresholds),
            assembler: ReportAssembler::new(config.scan.display_limit),
            cache: None,
        }
    }

    /// Shares a verdict cache owned by the caller.
    pub fn with_cache(mut self, cache: Arc<VerdictCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Validates a raw URL and scans it.
    pub async fn scan_url(&self, raw: &str) -> Result<Report, AppError> {
        let target = ScanTarget::url(raw)?;
        Ok(self.scan(&target).await)
    }

    /// Hashes uploaded bytes and scans them.
    pub async fn scan_bytes(
        &self,
        bytes: &[u8],
        mime_type: &str,
        file_name: Option<String>,
    ) -> Result<Report, AppError> {
        let target = ScanTarget::from_bytes(bytes, mime_type, file_name);
        Ok(self.scan(&target).await)
    }

    /// Never fails: in the worst case every provider failed and the report
    /// is an all-safe, zero-score one with the failures listed.
    pub async fn scan(&self, target: &ScanTarget) -> Report {
        let timer = OperationTimer::new("scan")
            .with_metadata("target_kind", target.kind())
            .with_metadata("providers", self.providers.len());

        if let Some((cached, verdict)) = self.cache.as_ref().and_then(|c| c.get(target)) {
            // 缓存只按内容命中，报告必须描述本次请求的目标
            let aggregated = AggregatedResult {
                target: target.clone(),
                ..cached
            };
            tracing::info!(
                target_kind = %target.kind(),
                risk_level = %verdict.risk_level,
                score = verdict.score,
                "♻️ 使用缓存的扫描结论"
            );
            timer.with_metadata("cached", true).finish();
            return self.assembler.assemble(&aggregated, verdict);
        }

        tracing::info!(
            target_kind = %target.kind(),
            target = %target.display_name(),
            "🔍 开始扫描"
        );

        let aggregated = self.dispatcher.dispatch(target, &self.providers).await;
        let verdict = self.classifier.classify(&aggregated);

        tracing::info!(
            target_kind = %target.kind(),
            positives = aggregated.positives,
            total = aggregated.total,
            risk_level = %verdict.risk_level,
            score = verdict.score,
            failed = aggregated.failed_providers().count(),
            "{} 扫描完成",
            verdict.risk_level.to_emoji()
        );

        let report = self.assembler.assemble(&aggregated, verdict);

        // 只缓存所有 provider 都成功的结果
        if let Some(cache) = &self.cache {
            if aggregated.all_succeeded() {
                cache.insert(aggregated, verdict);
            }
        }

        timer.finish();
        report
    }
}
