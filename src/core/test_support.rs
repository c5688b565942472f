use crate::domain::ports::Fetcher;
use crate::utils::error::FetchError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// 依 URL 回傳預先排好的回應；同一 URL 的第 N 次呼叫取第 N 個回應，用完後重複最後一個
pub(crate) struct ScriptedFetcher {
    responses: HashMap<String, Vec<Scripted>>,
    latency: Duration,
    calls: Mutex<HashMap<String, usize>>,
}

#[derive(Clone)]
pub(crate) enum Scripted {
    Body(String),
    Fail(FetchError),
    Hang,
}

impl ScriptedFetcher {
    pub(crate) fn new() -> Self {
        Self {
            responses: HashMap::new(),
            latency: Duration::ZERO,
            calls: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) fn body(mut self, url: &str, body: &str) -> Self {
        self.responses
            .entry(url.to_string())
            .or_default()
            .push(Scripted::Body(body.to_string()));
        self
    }

    pub(crate) fn fail(mut self, url: &str, error: FetchError) -> Self {
        self.responses
            .entry(url.to_string())
            .or_default()
            .push(Scripted::Fail(error));
        self
    }

    pub(crate) fn hang(mut self, url: &str) -> Self {
        self.responses
            .entry(url.to_string())
            .or_default()
            .push(Scripted::Hang);
        self
    }

    pub(crate) fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub(crate) fn calls(&self, url: &str) -> usize {
        self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(
        &self,
        url: &str,
        _timeout: Duration,
        _headers: &HashMap<String, String>,
    ) -> Result<String, FetchError> {
        let call_index = {
            let mut calls = self.calls.lock().unwrap();
            let count = calls.entry(url.to_string()).or_insert(0);
            *count += 1;
            *count - 1
        };

        let scripted = self
            .responses
            .get(url)
            .and_then(|list| list.get(call_index).or_else(|| list.last()))
            .cloned()
            .unwrap_or_else(|| Scripted::Fail(FetchError::Status(404)));

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        match scripted {
            Scripted::Body(body) => Ok(body),
            Scripted::Fail(error) => Err(error),
            Scripted::Hang => std::future::pending().await,
        }
    }
}
