use crate::domain::model::{Decision, SourceVerdict};
use crate::utils::error::FetchError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

/// 取得遠端文件的能力。實作不需要自行處理重試
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(
        &self,
        url: &str,
        timeout: Duration,
        headers: &HashMap<String, String>,
    ) -> Result<String, FetchError>;
}

/// 將每個來源的判定合併成單一結果。必須是判定序列的純函數
pub trait ResolutionPolicy: Send + Sync {
    fn name(&self) -> &'static str;

    fn decide(&self, verdicts: &[SourceVerdict]) -> Decision;
}
