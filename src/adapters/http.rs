use crate::domain::ports::Fetcher;
use crate::utils::error::{FetchError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;

const DEFAULT_USER_AGENT: &str = concat!("status-resolver/", env!("CARGO_PKG_VERSION"));

/// reqwest 實作的 `Fetcher`
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder().user_agent(DEFAULT_USER_AGENT).build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(
        &self,
        url: &str,
        timeout: Duration,
        headers: &HashMap<String, String>,
    ) -> std::result::Result<String, FetchError> {
        let mut request = self.client.get(url).timeout(timeout);

        // 部分來源會拒絕預設 client，需要自訂標頭（例如瀏覽器 User-Agent）
        for (key, value) in headers {
            request = request.header(key, value);
        }

        let response = request.send().await.map_err(|e| map_error(e, timeout))?;
        tracing::debug!("GET {} -> {}", url, response.status());

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        response.text().await.map_err(|e| map_error(e, timeout))
    }
}

fn map_error(e: reqwest::Error, timeout: Duration) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout(timeout)
    } else {
        FetchError::from(e)
    }
}
