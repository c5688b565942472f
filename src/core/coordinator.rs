use crate::core::extractor::Extractor;
use crate::domain::model::{DispatchMode, SourceDescriptor, SourceVerdict, Verdict};
use crate::domain::ports::Fetcher;
use crate::utils::error::FetchError;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// 對每個來源發出一次有時限的抓取，失敗只影響該來源本身
pub struct FetchCoordinator {
    fetcher: Arc<dyn Fetcher>,
    default_timeout: Duration,
}

impl FetchCoordinator {
    pub fn new(fetcher: Arc<dyn Fetcher>, default_timeout: Duration) -> Self {
        Self {
            fetcher,
            default_timeout,
        }
    }

    pub async fn fetch_all(
        &self,
        sources: &[SourceDescriptor],
        aliases: &[String],
        mode: DispatchMode,
    ) -> Vec<SourceVerdict> {
        match mode {
            DispatchMode::Parallel => self.fetch_parallel(sources, aliases).await,
            DispatchMode::SequentialPriority => self.fetch_sequential(sources, aliases).await,
        }
    }

    /// 同時發出所有請求並等待全部完成；輸出順序與註冊順序相同
    pub async fn fetch_parallel(
        &self,
        sources: &[SourceDescriptor],
        aliases: &[String],
    ) -> Vec<SourceVerdict> {
        join_all(sources.iter().map(|source| self.fetch_one(source, aliases))).await
    }

    /// 依優先權逐一查詢，遇到第一個非 `ERROR` 的判定即停止
    pub async fn fetch_sequential(
        &self,
        sources: &[SourceDescriptor],
        aliases: &[String],
    ) -> Vec<SourceVerdict> {
        let mut verdicts = Vec::new();

        for source in by_priority(sources) {
            let verdict = self.fetch_one(source, aliases).await;
            let decisive = verdict.verdict.is_decisive();
            verdicts.push(verdict);

            if decisive {
                break;
            }
        }

        verdicts
    }

    pub async fn fetch_one(&self, source: &SourceDescriptor, aliases: &[String]) -> SourceVerdict {
        let started = Instant::now();
        let outcome = self.fetch_with_retries(source).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(body) => {
                let verdict = Extractor::new(source).extract(&body, aliases);
                tracing::debug!(
                    "📡 {}: {} ({} bytes, {}ms)",
                    source.name,
                    verdict,
                    body.len(),
                    elapsed_ms
                );
                SourceVerdict {
                    name: source.name.clone(),
                    priority: source.priority,
                    verdict,
                    error: None,
                    elapsed_ms,
                }
            }
            Err(e) => {
                tracing::warn!("📡 {}: unreachable ({}) after {}ms", source.name, e, elapsed_ms);
                SourceVerdict {
                    name: source.name.clone(),
                    priority: source.priority,
                    verdict: Verdict::Error,
                    error: Some(e.to_string()),
                    elapsed_ms,
                }
            }
        }
    }

    fn timeout_for(&self, source: &SourceDescriptor) -> Duration {
        source
            .timeout_ms
            .map(Duration::from_millis)
            .unwrap_or(self.default_timeout)
    }

    async fn fetch_with_retries(&self, source: &SourceDescriptor) -> Result<String, FetchError> {
        let timeout = self.timeout_for(source);
        let mut attempt = 0;

        loop {
            // Fetcher 應自行遵守 timeout，這裡再包一層確保不會超過
            let result = match tokio::time::timeout(
                timeout,
                self.fetcher.fetch(&source.url, timeout, &source.headers),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(FetchError::Timeout(timeout)),
            };

            match result {
                Ok(body) => return Ok(body),
                Err(e) if attempt < source.retry_attempts => {
                    attempt += 1;
                    tracing::debug!(
                        "📡 {}: attempt {} failed ({}), retrying",
                        source.name,
                        attempt,
                        e
                    );
                    if source.retry_delay_ms > 0 {
                        tokio::time::sleep(Duration::from_millis(source.retry_delay_ms)).await;
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// 依優先權排序，同優先權保留註冊順序
pub fn by_priority(sources: &[SourceDescriptor]) -> Vec<&SourceDescriptor> {
    let mut ordered: Vec<&SourceDescriptor> = sources.iter().collect();
    ordered.sort_by_key(|s| s.priority);
    ordered
}
