pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::HttpFetcher;
pub use config::toml_config::{EngineConfig, StatusConfig};
pub use crate::core::engine::StatusEngine;
pub use domain::model::{
    CanonicalStatus, ContextWindow, DispatchMode, Entity, ExtractionStrategy, ResolutionResult,
    ResolutionStrategy, SourceDescriptor, Verdict,
};
pub use utils::error::{Result, StatusError};
