//! 并发调度
//!
//! Fans a target out to every provider that accepts it and fans the results
//! back into fixed slots, so output order always equals input order.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use tokio::task::JoinSet;

use super::aggregator::Aggregator;
use crate::providers::ProviderAdapter;
use crate::types::{AggregatedResult, ProviderResult, ScanTarget};

pub const TIMEOUT_ERROR: &str = "timeout";

/// Stateless apart from its outer deadline; one instance can serve many
/// concurrent scans.
#[derive(Debug, Clone, Copy)]
pub struct Dispatcher {
    outer_deadline: Option<Duration>,
}

impl Dispatcher {
    pub fn new(outer_deadline: Option<Duration>) -> Self {
        Self { outer_deadline }
    }

    pub async fn dispatch(
        &self,
        target: &ScanTarget,
        providers: &[Arc<dyn ProviderAdapter>],
    ) -> AggregatedResult {
        let results = self.collect(target, providers).await;
        Aggregator::aggregate(target.clone(), results)
    }

    /// One result per accepting provider, in the order given. Never fails:
    /// timeouts, errors, panics and malformed data all become
    /// `succeeded = false` entries.
    pub async fn collect(
        &self,
        target: &ScanTarget,
        providers: &[Arc<dyn ProviderAdapter>],
    ) -> Vec<ProviderResult> {
        let selected: Vec<Arc<dyn ProviderAdapter>> = providers
            .iter()
            .filter(|p| p.accepts(target))
            .cloned()
            .collect();
        let names: Vec<String> = selected.iter().map(|p| p.name().to_string()).collect();

        let mut slots: Vec<Option<ProviderResult>> = vec![None; selected.len()];
        let mut tasks = JoinSet::new();

        for (idx, provider) in selected.into_iter().enumerate() {
            let target = target.clone();
            tasks.spawn(async move { (idx, run_provider(provider, target).await) });
        }

        let deadline = async {
            match self.outer_deadline {
                Some(limit) => tokio::time::sleep(limit).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(deadline);

        let mut deadline_hit = false;
        loop {
            tokio::select! {
                joined = tasks.join_next() => match joined {
                    Some(Ok((idx, result))) => slots[idx] = Some(result),
                    Some(Err(e)) => log::error!("provider task ended abnormally: {}", e),
                    None => break,
                },
                _ = &mut deadline => {
                    deadline_hit = true;
                    tasks.abort_all();
                    break;
                }
            }
        }

        let missing_reason = if deadline_hit {
            TIMEOUT_ERROR
        } else {
            "provider task aborted"
        };

        slots
            .into_iter()
            .zip(names)
            .map(|(slot, name)| {
                slot.unwrap_or_else(|| {
                    log::warn!("⏱️ {} 未在截止时间内完成: {}", name, missing_reason);
                    ProviderResult::failed(name, missing_reason)
                })
            })
            .collect()
    }
}

/// Runs one provider under its own timeout, catching panics.
async fn run_provider(provider: Arc<dyn ProviderAdapter>, target: ScanTarget) -> ProviderResult {
    let name = provider.name().to_string();
    let call = AssertUnwindSafe(provider.query(&target)).catch_unwind();

    let outcome = match provider.timeout() {
        Some(limit) => match tokio::time::timeout(limit, call).await {
            Ok(outcome) => outcome,
            Err(_) => {
                log::warn!("⏱️ {} 超时 ({:?})", name, limit);
                return ProviderResult::failed(name, TIMEOUT_ERROR);
            }
        },
        None => call.await,
    };

    match outcome {
        Ok(result) => {
            let result = result.validated();
            if let Some(error) = &result.error {
                log::warn!("⚠️ {} 返回失败结果: {}", name, error);
            }
            result
        }
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            log::error!("💥 {} panicked: {}", name, message);
            ProviderResult::failed(name, format!("provider panicked: {}", message))
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
