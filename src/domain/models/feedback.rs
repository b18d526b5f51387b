//! Feedback domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Judgment about a trajectory's outcome.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FeedbackSignal {
    Positive,
    Negative,
    Neutral,
    /// Graded judgment in `[-1.0, 1.0]`
    Score(f64),
}

impl FeedbackSignal {
    /// Numeric contribution to a hyperedge's signed sum.
    pub fn as_weight(&self) -> f64 {
        match self {
            Self::Positive => 1.0,
            Self::Negative => -1.0,
            Self::Neutral => 0.0,
            Self::Score(score) => *score,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if let Self::Score(score) = self {
            if !score.is_finite() {
                return Err(format!("feedback score must be finite, got {score}"));
            }
            if !(-1.0..=1.0).contains(score) {
                return Err(format!("feedback score must be within [-1.0, 1.0], got {score}"));
            }
        }
        Ok(())
    }
}

impl std::fmt::Display for FeedbackSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Positive => write!(f, "positive"),
            Self::Negative => write!(f, "negative"),
            Self::Neutral => write!(f, "neutral"),
            Self::Score(score) => write!(f, "score({score})"),
        }
    }
}

/// A signal about a trajectory's outcome. Immutable once recorded.
///
/// `trajectory_id` is kept as the caller supplied it; the feedback processor
/// validates it before anything else happens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub id: Uuid,
    pub trajectory_id: String,
    pub signal: FeedbackSignal,
    pub received_at: DateTime<Utc>,
}

impl Feedback {
    pub fn new(trajectory_id: impl Into<String>, signal: FeedbackSignal) -> Self {
        Self {
            id: Uuid::new_v4(),
            trajectory_id: trajectory_id.into(),
            signal,
            received_at: Utc::now(),
        }
    }

    pub fn positive(trajectory_id: impl Into<String>) -> Self {
        Self::new(trajectory_id, FeedbackSignal::Positive)
    }

    pub fn negative(trajectory_id: impl Into<String>) -> Self {
        Self::new(trajectory_id, FeedbackSignal::Negative)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_weights() {
        assert!((FeedbackSignal::Positive.as_weight() - 1.0).abs() < f64::EPSILON);
        assert!((FeedbackSignal::Negative.as_weight() + 1.0).abs() < f64::EPSILON);
        assert!(FeedbackSignal::Neutral.as_weight().abs() < f64::EPSILON);
        assert!((FeedbackSignal::Score(0.25).as_weight() - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_signal_validation() {
        assert!(FeedbackSignal::Positive.validate().is_ok());
        assert!(FeedbackSignal::Score(-1.0).validate().is_ok());
        assert!(FeedbackSignal::Score(1.0).validate().is_ok());
        assert!(FeedbackSignal::Score(1.5).validate().is_err());
        assert!(FeedbackSignal::Score(f64::NAN).validate().is_err());
        assert!(FeedbackSignal::Score(f64::NEG_INFINITY).validate().is_err());
    }

    #[test]
    fn test_signal_serde_shape() {
        let json = serde_json::to_value(FeedbackSignal::Score(0.5)).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "score", "value": 0.5}));

        let json = serde_json::to_value(FeedbackSignal::Negative).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "negative"}));
    }
}
