//! Causal hyperedge domain model.
//!
//! A hyperedge connects a route with the set of patterns and causal
//! inferences that produced a response. Its identity is derived from that
//! content, so the same content always maps to the same hyperedge.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::feedback::FeedbackSignal;
use super::trajectory::{InferenceId, PatternId, Route};

/// Content-derived hyperedge identity (hex SHA-256).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HyperedgeId(String);

impl HyperedgeId {
    /// Wrap an id read back from storage.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for HyperedgeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The participants of a hyperedge. Sets are ordered, which makes the
/// canonical encoding independent of input order and duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HyperedgeNodes {
    pub route: Route,
    pub patterns: BTreeSet<PatternId>,
    pub inferences: BTreeSet<InferenceId>,
}

impl HyperedgeNodes {
    pub fn new(
        route: Route,
        patterns: impl IntoIterator<Item = PatternId>,
        inferences: impl IntoIterator<Item = InferenceId>,
    ) -> Self {
        Self {
            route,
            patterns: patterns.into_iter().collect(),
            inferences: inferences.into_iter().collect(),
        }
    }

    /// Canonical JSON form hashed into the id.
    fn canonical(&self) -> String {
        serde_json::json!({
            "route": self.route.as_str(),
            "patterns": self.patterns.iter().map(PatternId::as_str).collect::<Vec<_>>(),
            "inferences": self.inferences.iter().map(InferenceId::as_str).collect::<Vec<_>>(),
        })
        .to_string()
    }

    pub fn id(&self) -> HyperedgeId {
        HyperedgeId(format!("{:x}", Sha256::digest(self.canonical().as_bytes())))
    }

    /// True when only the route participates.
    pub fn is_route_only(&self) -> bool {
        self.patterns.is_empty() && self.inferences.is_empty()
    }
}

/// Running aggregate of feedback on a hyperedge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HyperedgeWeight {
    pub count: u64,
    pub signed_sum: f64,
}

impl HyperedgeWeight {
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.signed_sum / self.count as f64
        }
    }
}

/// Multi-way relation between a route, patterns and causal inferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CausalHyperedge {
    pub id: HyperedgeId,
    pub nodes: HyperedgeNodes,
    pub weight: HyperedgeWeight,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
}

impl CausalHyperedge {
    /// A fresh hyperedge with an empty accumulator.
    pub fn new(nodes: HyperedgeNodes) -> Self {
        let now = Utc::now();
        Self {
            id: nodes.id(),
            nodes,
            weight: HyperedgeWeight::default(),
            created_at: now,
            last_updated_at: now,
        }
    }

    /// Fold one feedback signal into the accumulator.
    pub fn accumulate(&mut self, signal: FeedbackSignal, at: DateTime<Utc>) {
        self.weight.count += 1;
        self.weight.signed_sum += signal.as_weight();
        self.last_updated_at = at;
    }
}
