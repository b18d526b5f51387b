//! Trajectory domain model.
//!
//! A trajectory is one completed agent decision path. Trajectories recorded by
//! this process carry the full response (patterns used and causal inferences
//! drawn). Trajectories reconstructed from the durable store carry only the
//! metadata projection and have no response at all.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};

/// Unique identifier of a trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrajectoryId(pub Uuid);

impl TrajectoryId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a caller-supplied trajectory reference.
    pub fn parse(raw: &str) -> DomainResult<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DomainError::InvalidTrajectoryId("empty identifier".to_string()));
        }
        Uuid::parse_str(trimmed)
            .map(Self)
            .map_err(|e| DomainError::InvalidTrajectoryId(format!("{raw}: {e}")))
    }
}

impl Default for TrajectoryId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TrajectoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Decision path an agent took while producing a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    /// Answered directly without consulting stored knowledge
    Direct,
    /// Answered by applying previously learned patterns
    PatternMatch,
    /// Answered by following a chain of causal inferences
    CausalChain,
    /// Answered from recalled context items
    ContextRecall,
    /// Combination of pattern matching and causal reasoning
    Hybrid,
    /// Handed off to a human or a more capable agent
    Escalation,
}

impl Route {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::PatternMatch => "pattern_match",
            Self::CausalChain => "causal_chain",
            Self::ContextRecall => "context_recall",
            Self::Hybrid => "hybrid",
            Self::Escalation => "escalation",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "direct" => Some(Self::Direct),
            "pattern_match" => Some(Self::PatternMatch),
            "causal_chain" => Some(Self::CausalChain),
            "context_recall" => Some(Self::ContextRecall),
            "hybrid" => Some(Self::Hybrid),
            "escalation" => Some(Self::Escalation),
            _ => None,
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to a reusable decision fragment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatternId(String);

impl PatternId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PatternId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reference to a causal inference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InferenceId(String);

impl InferenceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for InferenceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A pattern actually used to produce a response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    pub id: PatternId,
    pub name: String,
    /// Match confidence (0.0 - 1.0)
    pub confidence: f64,
}

impl Pattern {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: PatternId::new(id),
            name: name.into(),
            confidence: 1.0,
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }
}

/// A hypothesized cause → effect link the agent relied on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CausalInference {
    pub id: InferenceId,
    pub cause: String,
    pub effect: String,
    /// Strength of belief in the link (0.0 - 1.0)
    pub confidence: f64,
}

impl CausalInference {
    pub fn new(id: impl Into<String>, cause: impl Into<String>, effect: impl Into<String>) -> Self {
        Self {
            id: InferenceId::new(id),
            cause: cause.into(),
            effect: effect.into(),
            confidence: 1.0,
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }
}

/// Response substructure as handed over by the agent pipeline.
///
/// Both fields are optional on the wire so that a malformed, half-populated
/// response can be represented and rejected. Only a response where both are
/// present counts as complete.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseData {
    #[serde(default)]
    pub patterns: Option<Vec<Pattern>>,
    #[serde(default)]
    pub causal_inferences: Option<Vec<CausalInference>>,
}

impl ResponseData {
    /// A fully populated response.
    pub fn complete(patterns: Vec<Pattern>, causal_inferences: Vec<CausalInference>) -> Self {
        Self {
            patterns: Some(patterns),
            causal_inferences: Some(causal_inferences),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.patterns.is_some() && self.causal_inferences.is_some()
    }
}

/// Durable projection of a trajectory. Never includes the response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryMetadata {
    pub id: TrajectoryId,
    pub route: Route,
    pub matched_patterns: Vec<PatternId>,
    pub context: Vec<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// One completed agent decision path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    pub id: TrajectoryId,
    pub route: Route,
    /// Candidate patterns considered while routing
    #[serde(default)]
    pub matched_patterns: Vec<PatternId>,
    /// Opaque context items captured at creation
    #[serde(default)]
    pub context: Vec<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    response: Option<ResponseData>,
}

impl Trajectory {
    /// Start a new trajectory for the given route with no response attached.
    pub fn new(route: Route) -> Self {
        Self {
            id: TrajectoryId::new(),
            route,
            matched_patterns: Vec::new(),
            context: Vec::new(),
            created_at: Utc::now(),
            response: None,
        }
    }

    /// Rebuild a trajectory from its durable projection. The result never has
    /// a response.
    pub fn from_metadata(metadata: TrajectoryMetadata) -> Self {
        Self {
            id: metadata.id,
            route: metadata.route,
            matched_patterns: metadata.matched_patterns,
            context: metadata.context,
            created_at: metadata.created_at,
            response: None,
        }
    }

    pub fn with_id(mut self, id: TrajectoryId) -> Self {
        self.id = id;
        self
    }

    pub fn with_matched_patterns(mut self, patterns: Vec<PatternId>) -> Self {
        self.matched_patterns = patterns;
        self
    }

    pub fn with_context(mut self, context: Vec<serde_json::Value>) -> Self {
        self.context = context;
        self
    }

    /// Attach a complete response.
    pub fn with_response(
        self,
        patterns: Vec<Pattern>,
        causal_inferences: Vec<CausalInference>,
    ) -> Self {
        self.with_response_data(ResponseData::complete(patterns, causal_inferences))
    }

    /// Attach a response exactly as received, complete or not.
    pub fn with_response_data(mut self, response: ResponseData) -> Self {
        self.response = Some(response);
        self
    }

    /// Whether a response field exists at all, regardless of completeness.
    pub fn has_response_field(&self) -> bool {
        self.response.is_some()
    }

    /// Raw response access, reserved for the degradation guard.
    pub(crate) fn response_data(&self) -> Option<&ResponseData> {
        self.response.as_ref()
    }

    pub fn metadata(&self) -> TrajectoryMetadata {
        TrajectoryMetadata {
            id: self.id,
            route: self.route,
            matched_patterns: self.matched_patterns.clone(),
            context: self.context.clone(),
            created_at: self.created_at,
        }
    }
}
