pub mod cache;
pub mod coordinator;
pub mod engine;
pub mod extractor;
pub mod policy;

#[cfg(test)]
pub(crate) mod test_support;

pub use crate::domain::model::{
    CanonicalStatus, Decision, ResolutionResult, SourceDescriptor, SourceVerdict, Verdict,
};
pub use crate::domain::ports::{Fetcher, ResolutionPolicy};
pub use crate::utils::error::Result;
