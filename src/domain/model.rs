use crate::utils::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// 單一來源在一次解析週期中的判定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Open,
    Closed,
    Delayed,
    Error,
}

impl Verdict {
    /// `ERROR` 以外的判定都算有結論
    pub fn is_decisive(self) -> bool {
        !matches!(self, Verdict::Error)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Verdict::Open => "OPEN",
            Verdict::Closed => "CLOSED",
            Verdict::Delayed => "DELAYED",
            Verdict::Error => "ERROR",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CanonicalStatus {
    #[serde(rename = "OPEN", alias = "open")]
    Open,
    #[serde(rename = "CLOSED", alias = "closed")]
    Closed,
    #[serde(rename = "DELAYED", alias = "delayed")]
    Delayed,
    #[default]
    #[serde(rename = "UNKNOWN", alias = "unknown")]
    Unknown,
    #[serde(rename = "NO REPORT / UNKNOWN", alias = "no_report")]
    NoReport,
}

impl CanonicalStatus {
    pub fn from_verdict(verdict: Verdict) -> Option<Self> {
        match verdict {
            Verdict::Open => Some(CanonicalStatus::Open),
            Verdict::Closed => Some(CanonicalStatus::Closed),
            Verdict::Delayed => Some(CanonicalStatus::Delayed),
            Verdict::Error => None,
        }
    }
}

impl fmt::Display for CanonicalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CanonicalStatus::Open => "OPEN",
            CanonicalStatus::Closed => "CLOSED",
            CanonicalStatus::Delayed => "DELAYED",
            CanonicalStatus::Unknown => "UNKNOWN",
            CanonicalStatus::NoReport => "NO REPORT / UNKNOWN",
        };
        f.write_str(label)
    }
}

/// 從文件中取出判定文字的方式
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExtractionStrategy {
    /// 只要文件中出現實體名稱，就掃描整份文件
    WholeDocument,
    /// 只掃描實體名稱之後 `window` 個字元，以及之前 `before` 個字元
    Windowed {
        window: usize,
        #[serde(default)]
        before: usize,
    },
    /// 先用 CSS selector 縮小範圍（例如警示橫幅），找不到時退回整份文件
    Selector {
        selector: String,
        #[serde(default)]
        window: Option<usize>,
        #[serde(default)]
        before: usize,
    },
}

/// 實體名稱出現處前後要掃描的字元數
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextWindow {
    pub before: usize,
    pub after: usize,
}

impl ExtractionStrategy {
    pub fn windowed(window: usize) -> Self {
        ExtractionStrategy::Windowed { window, before: 0 }
    }

    pub fn selector(selector: impl Into<String>, window: Option<usize>) -> Self {
        ExtractionStrategy::Selector {
            selector: selector.into(),
            window,
            before: 0,
        }
    }

    /// 同時往前看 `before` 個字元，用於關鍵字寫在實體名稱前面的來源
    pub fn looking_back(self, chars: usize) -> Self {
        match self {
            ExtractionStrategy::Windowed { window, .. } => ExtractionStrategy::Windowed {
                window,
                before: chars,
            },
            ExtractionStrategy::Selector {
                selector, window, ..
            } => ExtractionStrategy::Selector {
                selector,
                window,
                before: chars,
            },
            other => other,
        }
    }

    pub fn context_window(&self) -> Option<ContextWindow> {
        match self {
            ExtractionStrategy::WholeDocument => None,
            ExtractionStrategy::Windowed { window, before } => Some(ContextWindow {
                before: *before,
                after: *window,
            }),
            ExtractionStrategy::Selector { window, before, .. } => {
                window.map(|after| ContextWindow {
                    before: *before,
                    after,
                })
            }
        }
    }

    pub fn selector_query(&self) -> Option<&str> {
        match self {
            ExtractionStrategy::Selector { selector, .. } => Some(selector),
            _ => None,
        }
    }
}

impl Default for ExtractionStrategy {
    fn default() -> Self {
        ExtractionStrategy::WholeDocument
    }
}

/// 關鍵字族群，關閉永遠優先於延遲
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordRules {
    #[serde(default = "default_closed_keywords")]
    pub closed: Vec<String>,
    #[serde(default = "default_delayed_keywords")]
    pub delayed: Vec<String>,
}

fn default_closed_keywords() -> Vec<String> {
    ["CLOSED", "CLOSURE"].iter().map(|s| s.to_string()).collect()
}

fn default_delayed_keywords() -> Vec<String> {
    ["DELAY", "DELAYED", "TWO-HOUR", "2-HOUR"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for KeywordRules {
    fn default() -> Self {
        Self {
            closed: default_closed_keywords(),
            delayed: default_delayed_keywords(),
        }
    }
}

fn default_true() -> bool {
    true
}

/// 靜態的來源設定，啟動時建立後唯讀共用
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    pub name: String,
    pub url: String,
    /// 數字越小優先權越高
    #[serde(default)]
    pub priority: u32,
    #[serde(default)]
    pub strategy: ExtractionStrategy,
    #[serde(default)]
    pub keywords: KeywordRules,
    #[serde(default = "default_true")]
    pub match_entity: bool,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub retry_attempts: u32,
    #[serde(default)]
    pub retry_delay_ms: u64,
}

impl SourceDescriptor {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            priority: 0,
            strategy: ExtractionStrategy::default(),
            keywords: KeywordRules::default(),
            match_entity: true,
            timeout_ms: None,
            headers: HashMap::new(),
            retry_attempts: 0,
            retry_delay_ms: 0,
        }
    }

    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_strategy(mut self, strategy: ExtractionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn with_retries(mut self, attempts: u32, delay_ms: u64) -> Self {
        self.retry_attempts = attempts;
        self.retry_delay_ms = delay_ms;
        self
    }

    pub fn without_entity_match(mut self) -> Self {
        self.match_entity = false;
        self
    }
}

/// 實體名稱及其別名（完整名稱、簡稱等）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl Entity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// 名稱加上別名，去除空白項
    pub fn all_names(&self) -> Vec<String> {
        std::iter::once(&self.name)
            .chain(self.aliases.iter())
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceVerdict {
    pub name: String,
    pub priority: u32,
    pub verdict: Verdict,
    pub error: Option<String>,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSummary {
    pub name: String,
    pub status: Verdict,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&SourceVerdict> for SourceSummary {
    fn from(v: &SourceVerdict) -> Self {
        Self {
            name: v.name.clone(),
            status: v.verdict,
            error: v.error.clone(),
        }
    }
}

/// 決策策略的輸出，不含時間戳與稽核紀錄
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub status: CanonicalStatus,
    pub source: String,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionResult {
    pub status: CanonicalStatus,
    pub timestamp: DateTime<Utc>,
    pub source: String,
    pub results_summary: Vec<SourceSummary>,
    pub cached: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResolutionResult {
    /// 每一種策略都經過這裡，確保每個來源的原始判定都留在摘要中
    pub fn from_decision(
        decision: Decision,
        verdicts: &[SourceVerdict],
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            status: decision.status,
            timestamp,
            source: decision.source,
            results_summary: verdicts.iter().map(SourceSummary::from).collect(),
            cached: false,
            error: decision.error,
        }
    }

    pub fn served_from_cache(mut self) -> Self {
        self.cached = true;
        self
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchMode {
    #[default]
    Parallel,
    SequentialPriority,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStrategy {
    PriorityFallback,
    #[default]
    SeverityOverride,
    MajorityVote,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_shape() {
        let verdicts = vec![
            SourceVerdict {
                name: "A".to_string(),
                priority: 1,
                verdict: Verdict::Closed,
                error: None,
                elapsed_ms: 12,
            },
            SourceVerdict {
                name: "B".to_string(),
                priority: 2,
                verdict: Verdict::Error,
                error: Some("HTTP status 503".to_string()),
                elapsed_ms: 40,
            },
        ];
        let decision = Decision {
            status: CanonicalStatus::Closed,
            source: "A".to_string(),
            error: None,
        };
        let result = ResolutionResult::from_decision(decision, &verdicts, Utc::now());
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["status"], "CLOSED");
        assert_eq!(json["source"], "A");
        assert_eq!(json["cached"], false);
        assert!(json.get("error").is_none());
        assert_eq!(json["results_summary"][0]["status"], "CLOSED");
        assert!(json["results_summary"][0].get("error").is_none());
        assert_eq!(json["results_summary"][1]["error"], "HTTP status 503");

        let pretty = result.to_json_pretty().unwrap();
        assert!(pretty.contains("\"status\": \"CLOSED\""));
    }

    #[test]
    fn test_no_report_label() {
        let json = serde_json::to_value(CanonicalStatus::NoReport).unwrap();
        assert_eq!(json, "NO REPORT / UNKNOWN");
    }

    #[test]
    fn test_strategy_from_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            strategy: ExtractionStrategy,
        }

        let w: Wrapper = toml::from_str(r#"strategy = { kind = "windowed", window = 120 }"#).unwrap();
        assert_eq!(w.strategy, ExtractionStrategy::windowed(120));

        let w: Wrapper =
            toml::from_str(r#"strategy = { kind = "windowed", window = 60, before = 40 }"#).unwrap();
        assert_eq!(
            w.strategy.context_window(),
            Some(ContextWindow { before: 40, after: 60 })
        );

        let w: Wrapper =
            toml::from_str(r#"strategy = { kind = "selector", selector = "div.alert" }"#).unwrap();
        assert_eq!(w.strategy.selector_query(), Some("div.alert"));
        assert_eq!(w.strategy.context_window(), None);
    }

    #[test]
    fn test_entity_names_skip_blank_aliases() {
        let entity = Entity::new("Example County Schools")
            .with_alias("ECS")
            .with_alias("  ");
        assert_eq!(entity.all_names(), vec!["Example County Schools", "ECS"]);
    }
}
