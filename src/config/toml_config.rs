use crate::adapters::document::validate_selector;
use crate::domain::model::{
    CanonicalStatus, DispatchMode, Entity, ExtractionStrategy, ResolutionStrategy, SourceDescriptor,
};
use crate::utils::error::{Result, StatusError};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusConfig {
    pub engine: EngineConfig,
    pub sources: Vec<SourceDescriptor>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub entity: Entity,
    #[serde(default)]
    pub dispatch_mode: DispatchMode,
    #[serde(default)]
    pub resolution_strategy: ResolutionStrategy,
    #[serde(default = "default_cache_ttl_seconds")]
    pub cache_ttl_seconds: u64,
    #[serde(default = "default_timeout_ms")]
    pub default_timeout_ms: u64,
    /// 所有來源都失敗時回報的狀態
    #[serde(default)]
    pub all_failed_status: CanonicalStatus,
}

fn default_cache_ttl_seconds() -> u64 {
    60
}

fn default_timeout_ms() -> u64 {
    5000
}

impl EngineConfig {
    pub fn new(entity: Entity) -> Self {
        Self {
            entity,
            dispatch_mode: DispatchMode::default(),
            resolution_strategy: ResolutionStrategy::default(),
            cache_ttl_seconds: default_cache_ttl_seconds(),
            default_timeout_ms: default_timeout_ms(),
            all_failed_status: CanonicalStatus::default(),
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }

    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms)
    }
}

impl StatusConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(StatusError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| StatusError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${USER_AGENT})，找不到的變數保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| StatusError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 驗證配置的合理性，任何錯誤都應該讓程式在啟動時結束
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_non_empty_string("engine.entity.name", &self.engine.entity.name)?;
        validation::validate_positive_number(
            "engine.default_timeout_ms",
            self.engine.default_timeout_ms,
            1,
        )?;

        validation::validate_non_empty_list("sources", &self.sources)?;
        validation::validate_unique_names(
            "sources.name",
            self.sources.iter().map(|s| s.name.as_str()),
        )?;

        for source in &self.sources {
            validation::validate_non_empty_string("sources.name", &source.name)?;
            validation::validate_url(&format!("sources.{}.url", source.name), &source.url)?;

            if let Some(timeout_ms) = source.timeout_ms {
                validation::validate_positive_number(
                    &format!("sources.{}.timeout_ms", source.name),
                    timeout_ms,
                    1,
                )?;
            }

            match &source.strategy {
                ExtractionStrategy::WholeDocument => {}
                ExtractionStrategy::Windowed { window, .. } => {
                    validation::validate_positive_number(
                        &format!("sources.{}.strategy.window", source.name),
                        *window as u64,
                        1,
                    )?;
                }
                ExtractionStrategy::Selector { selector, window, .. } => {
                    validate_selector(&format!("sources.{}.strategy.selector", source.name), selector)?;
                    if let Some(window) = window {
                        validation::validate_positive_number(
                            &format!("sources.{}.strategy.window", source.name),
                            *window as u64,
                            1,
                        )?;
                    }
                }
            }

            // window 是以實體名稱為中心，沒有比對名稱時就沒有意義
            if !source.match_entity && source.strategy.context_window().is_some() {
                return Err(StatusError::ConfigValidationError {
                    field: format!("sources.{}.strategy.window", source.name),
                    message: "a context window requires match_entity = true".to_string(),
                });
            }

            if source.keywords.closed.is_empty() && source.keywords.delayed.is_empty() {
                return Err(StatusError::ConfigValidationError {
                    field: format!("sources.{}.keywords", source.name),
                    message: "at least one keyword family must be non-empty".to_string(),
                });
            }
        }

        if self.engine.dispatch_mode == DispatchMode::SequentialPriority
            && self.engine.resolution_strategy != ResolutionStrategy::PriorityFallback
        {
            tracing::warn!(
                "⚠️ sequential_priority dispatch stops at the first decisive source; {:?} will see at most one decisive verdict",
                self.engine.resolution_strategy
            );
        }

        Ok(())
    }
}

impl Validate for StatusConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
