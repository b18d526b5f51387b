//! Gate between feedback ingestion and hyperedge learning.
//!
//! A trajectory is eligible for learning only when its response is present
//! and fully populated. Everything else (reconstructed trajectories, partial
//! responses) is skipped. The check never fails.

use super::event_factory::INCOMPLETE_RESPONSE;
use crate::domain::models::{CausalInference, Pattern, Trajectory};

/// Why a trajectory was not learned from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipKind {
    IncompleteResponse,
}

impl SkipKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IncompleteResponse => INCOMPLETE_RESPONSE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkipReason {
    pub reason: SkipKind,
    /// A response existed but was missing one of its parts
    pub had_response_field: bool,
}

/// A trajectory proven to carry a complete response.
///
/// Only [`DegradationGuard::check_eligible`] constructs this, so holding one is
/// proof the check ran.
#[derive(Debug, Clone, Copy)]
pub struct EligibleTrajectory<'a> {
    trajectory: &'a Trajectory,
    patterns: &'a [Pattern],
    causal_inferences: &'a [CausalInference],
}

impl<'a> EligibleTrajectory<'a> {
    pub fn trajectory(&self) -> &'a Trajectory {
        self.trajectory
    }

    pub fn patterns(&self) -> &'a [Pattern] {
        self.patterns
    }

    pub fn causal_inferences(&self) -> &'a [CausalInference] {
        self.causal_inferences
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Eligibility<'a> {
    Eligible(EligibleTrajectory<'a>),
    Skip(SkipReason),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DegradationGuard;

impl DegradationGuard {
    pub fn new() -> Self {
        Self
    }

    pub fn check_eligible<'a>(&self, trajectory: &'a Trajectory) -> Eligibility<'a> {
        let Some(response) = trajectory.response_data() else {
            return Eligibility::Skip(SkipReason {
                reason: SkipKind::IncompleteResponse,
                had_response_field: false,
            });
        };

        match (&response.patterns, &response.causal_inferences) {
            (Some(patterns), Some(causal_inferences)) => Eligibility::Eligible(EligibleTrajectory {
                trajectory,
                patterns,
                causal_inferences,
            }),
            _ => Eligibility::Skip(SkipReason {
                reason: SkipKind::IncompleteResponse,
                had_response_field: true,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{ResponseData, Route, TrajectoryMetadata};

    fn skip_of(trajectory: &Trajectory) -> SkipReason {
        match DegradationGuard::new().check_eligible(trajectory) {
            Eligibility::Skip(reason) => reason,
            Eligibility::Eligible(_) => panic!("expected skip"),
        }
    }

    #[test]
    fn test_complete_response_is_eligible() {
        let trajectory = Trajectory::new(Route::CausalChain).with_response(
            vec![Pattern::new("p1", "cache warmup")],
            vec![CausalInference::new("c1", "cold cache", "slow start")],
        );

        match DegradationGuard::new().check_eligible(&trajectory) {
            Eligibility::Eligible(eligible) => {
                assert_eq!(eligible.trajectory().id, trajectory.id);
                assert_eq!(eligible.patterns().len(), 1);
                assert_eq!(eligible.causal_inferences()[0].effect, "slow start");
            }
            Eligibility::Skip(reason) => panic!("unexpected skip: {reason:?}"),
        }
    }

    #[test]
    fn test_empty_but_present_sequences_are_eligible() {
        let trajectory = Trajectory::new(Route::Direct).with_response(vec![], vec![]);
        assert!(matches!(
            DegradationGuard::new().check_eligible(&trajectory),
            Eligibility::Eligible(_)
        ));
    }

    #[test]
    fn test_missing_response_is_skipped() {
        let reconstructed = Trajectory::from_metadata(TrajectoryMetadata {
            id: crate::domain::models::TrajectoryId::new(),
            route: Route::PatternMatch,
            matched_patterns: vec![],
            context: vec![],
            created_at: chrono::Utc::now(),
        });

        let reason = skip_of(&reconstructed);
        assert_eq!(reason.reason, SkipKind::IncompleteResponse);
        assert!(!reason.had_response_field);
    }

    #[test]
    fn test_partial_responses_are_skipped() {
        let only_patterns = Trajectory::new(Route::Hybrid).with_response_data(ResponseData {
            patterns: Some(vec![Pattern::new("p1", "x")]),
            causal_inferences: None,
        });
        let only_inferences = Trajectory::new(Route::Hybrid).with_response_data(ResponseData {
            patterns: None,
            causal_inferences: Some(vec![]),
        });
        let empty_shell =
            Trajectory::new(Route::Hybrid).with_response_data(ResponseData::default());

        for trajectory in [&only_patterns, &only_inferences, &empty_shell] {
            let reason = skip_of(trajectory);
            assert!(reason.had_response_field);
            assert_eq!(reason.reason.as_str(), "incomplete-response");
        }
    }
}
