//! Resolution policies: turn a cycle's per-source verdicts into one canonical status.
//!
//! Every policy is a pure function of the verdict sequence it is handed.
//! The audit trail (per-source summary) is attached by
//! [`ResolutionResult::from_decision`](crate::domain::model::ResolutionResult::from_decision),
//! so no policy can drop it.

use crate::domain::model::{CanonicalStatus, Decision, ResolutionStrategy, SourceVerdict, Verdict};
use crate::domain::ports::ResolutionPolicy;

pub fn policy_for(
    strategy: ResolutionStrategy,
    all_failed_status: CanonicalStatus,
) -> Box<dyn ResolutionPolicy> {
    match strategy {
        ResolutionStrategy::PriorityFallback => Box::new(PriorityFallback::new(all_failed_status)),
        ResolutionStrategy::SeverityOverride => Box::new(SeverityOverride::new(all_failed_status)),
        ResolutionStrategy::MajorityVote => Box::new(MajorityVote::new(all_failed_status)),
    }
}

/// 第一個（依優先權）有結論的來源直接勝出
#[derive(Debug, Clone)]
pub struct PriorityFallback {
    all_failed_status: CanonicalStatus,
}

impl PriorityFallback {
    pub fn new(all_failed_status: CanonicalStatus) -> Self {
        Self { all_failed_status }
    }
}

impl ResolutionPolicy for PriorityFallback {
    fn name(&self) -> &'static str {
        "priority_fallback"
    }

    fn decide(&self, verdicts: &[SourceVerdict]) -> Decision {
        let mut ordered: Vec<&SourceVerdict> = verdicts.iter().collect();
        ordered.sort_by_key(|v| v.priority);

        ordered
            .into_iter()
            .find_map(|v| {
                CanonicalStatus::from_verdict(v.verdict).map(|status| Decision {
                    status,
                    source: v.name.clone(),
                    error: None,
                })
            })
            .unwrap_or_else(|| all_failed(verdicts, self.all_failed_status))
    }
}

/// 任何一個來源回報壞消息就採用：CLOSED > DELAYED > OPEN
#[derive(Debug, Clone)]
pub struct SeverityOverride {
    all_failed_status: CanonicalStatus,
}

impl SeverityOverride {
    pub fn new(all_failed_status: CanonicalStatus) -> Self {
        Self { all_failed_status }
    }
}

impl ResolutionPolicy for SeverityOverride {
    fn name(&self) -> &'static str {
        "severity_override"
    }

    fn decide(&self, verdicts: &[SourceVerdict]) -> Decision {
        for (kind, status) in [
            (Verdict::Closed, CanonicalStatus::Closed),
            (Verdict::Delayed, CanonicalStatus::Delayed),
        ] {
            if let Some(v) = verdicts.iter().find(|v| v.verdict == kind) {
                return Decision {
                    status,
                    source: v.name.clone(),
                    error: None,
                };
            }
        }

        let open = count(verdicts, Verdict::Open);
        if open > 0 {
            return Decision {
                status: CanonicalStatus::Open,
                source: format!("consensus of {} sources", open),
                error: None,
            };
        }

        all_failed(verdicts, self.all_failed_status)
    }
}

/// 在有結論的來源中多數決
#[derive(Debug, Clone)]
pub struct MajorityVote {
    all_failed_status: CanonicalStatus,
}

impl MajorityVote {
    pub fn new(all_failed_status: CanonicalStatus) -> Self {
        Self { all_failed_status }
    }
}

impl ResolutionPolicy for MajorityVote {
    fn name(&self) -> &'static str {
        "majority_vote"
    }

    fn decide(&self, verdicts: &[SourceVerdict]) -> Decision {
        let closed = count(verdicts, Verdict::Closed);
        let delayed = count(verdicts, Verdict::Delayed);
        let open = count(verdicts, Verdict::Open);

        // 平手時 CLOSED 勝過 DELAYED，但兩者都必須嚴格多於 OPEN
        let winner = if closed > open && closed >= delayed {
            Some((Verdict::Closed, closed))
        } else if delayed > open && delayed > closed {
            Some((Verdict::Delayed, delayed))
        } else if open > 0 {
            Some((Verdict::Open, open))
        } else {
            None
        };

        match winner {
            Some((kind, votes)) => {
                let first = verdicts
                    .iter()
                    .find(|v| v.verdict == kind)
                    .map(|v| v.name.as_str())
                    .unwrap_or_default();
                Decision {
                    status: CanonicalStatus::from_verdict(kind).unwrap_or(self.all_failed_status),
                    source: format!("{} (majority of {} sources)", first, votes),
                    error: None,
                }
            }
            None => all_failed(verdicts, self.all_failed_status),
        }
    }
}

fn count(verdicts: &[SourceVerdict], kind: Verdict) -> usize {
    verdicts.iter().filter(|v| v.verdict == kind).count()
}

fn all_failed(verdicts: &[SourceVerdict], status: CanonicalStatus) -> Decision {
    let first_error = verdicts.iter().find(|v| v.verdict == Verdict::Error);

    let error = match first_error {
        Some(v) => format!(
            "all {} sources failed; first error from {}: {}",
            verdicts.len(),
            v.name,
            v.error.as_deref().unwrap_or("unknown error")
        ),
        None => "no sources were consulted".to_string(),
    };

    Decision {
        status,
        source: format!("none ({} sources failed)", verdicts.len()),
        error: Some(error),
    }
}
