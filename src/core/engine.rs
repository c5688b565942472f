use crate::adapters::HttpFetcher;
use crate::config::toml_config::{EngineConfig, StatusConfig};
use crate::core::cache::ResultCache;
use crate::core::coordinator::FetchCoordinator;
use crate::core::policy::policy_for;
use crate::domain::model::{DispatchMode, ResolutionResult, SourceDescriptor};
use crate::domain::ports::{Fetcher, ResolutionPolicy};
use crate::utils::error::Result;
use crate::utils::validation::Validate;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::Mutex;

/// 狀態解析引擎：快取 → 抓取 → 分類 → 決策
pub struct StatusEngine {
    aliases: Vec<String>,
    sources: Vec<SourceDescriptor>,
    dispatch_mode: DispatchMode,
    coordinator: FetchCoordinator,
    policy: Box<dyn ResolutionPolicy>,
    cache: ResultCache,
    // 同一時間最多一個解析週期
    in_flight: Mutex<()>,
}

impl StatusEngine {
    pub fn new(
        config: &EngineConfig,
        sources: Vec<SourceDescriptor>,
        fetcher: Arc<dyn Fetcher>,
    ) -> Self {
        Self {
            aliases: config.entity.all_names(),
            sources,
            dispatch_mode: config.dispatch_mode,
            coordinator: FetchCoordinator::new(fetcher, config.default_timeout()),
            policy: policy_for(config.resolution_strategy, config.all_failed_status),
            cache: ResultCache::new(config.cache_ttl()),
            in_flight: Mutex::new(()),
        }
    }

    /// 驗證配置並使用 reqwest 作為抓取實作
    pub fn from_config(config: &StatusConfig) -> Result<Self> {
        config.validate()?;
        let fetcher = Arc::new(HttpFetcher::new()?);

        tracing::info!(
            "🔧 {} sources for '{}', dispatch {:?}, policy {:?}, cache ttl {}s",
            config.sources.len(),
            config.engine.entity.name,
            config.engine.dispatch_mode,
            config.engine.resolution_strategy,
            config.engine.cache_ttl_seconds
        );

        Ok(Self::new(&config.engine, config.sources.clone(), fetcher))
    }

    pub fn sources(&self) -> &[SourceDescriptor] {
        &self.sources
    }

    /// 對外的讀取操作。快取未命中時，並行的呼叫者共用同一個解析週期
    pub async fn current_status(&self, bypass_cache: bool) -> ResolutionResult {
        // 命中判斷與週期編號必須來自同一次讀取，否則可能錯過剛完成的週期
        let seen_cycle = if bypass_cache {
            self.cache.cycle()
        } else {
            match self.cache.lookup() {
                Ok(hit) => {
                    tracing::debug!("Serving cached status {} from {}", hit.status, hit.timestamp);
                    return hit;
                }
                Err(cycle) => cycle,
            }
        };

        let _guard = self.in_flight.lock().await;

        // 等待期間已經有其他呼叫者完成一個週期
        if let Some(shared) = self.cache.newer_than(seen_cycle) {
            tracing::debug!("Sharing status {} from a cycle resolved while waiting", shared.status);
            return shared;
        }

        let result = self.resolve_cycle().await;
        self.cache.put(result.clone());
        result
    }

    /// 不經快取跑一次完整的解析週期
    pub async fn resolve_cycle(&self) -> ResolutionResult {
        let verdicts = self
            .coordinator
            .fetch_all(&self.sources, &self.aliases, self.dispatch_mode)
            .await;

        let decision = self.policy.decide(&verdicts);
        let result = ResolutionResult::from_decision(decision, &verdicts, Utc::now());

        match &result.error {
            Some(error) => tracing::warn!(
                "⚠️ All sources failed, reporting {} ({})",
                result.status,
                error
            ),
            None => tracing::info!(
                "✅ Resolved {} via {} ({} of {} sources consulted, {})",
                result.status,
                result.source,
                verdicts.len(),
                self.sources.len(),
                self.policy.name()
            ),
        }

        result
    }
}
