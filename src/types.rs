//! Core types for the strategic decision reasoning engine
//!
//! The model mirrors the lifecycle of a decision:
//! - Inputs (MissionObjective, DecisionContext) are read-only
//! - Candidates (DecisionOption) are rebuilt, never mutated in place
//! - The aggregate (StrategicDecision) only changes through status
//!   transitions owned by the engine

use crate::heuristics::Heuristic;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Opaque key-value bag. The engine stores and serializes it, never reads it.
pub type Metadata = Map<String, Value>;

/// What the mission is trying to achieve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionObjective {
    pub id: String,
    pub mission_id: String,
    pub objective: String,
    /// 0-100, higher is more pressing
    pub priority: i32,
    #[serde(default)]
    pub target_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub constraints: Vec<String>,
    #[serde(default)]
    pub success_criteria: Vec<String>,
}

/// Resources on hand for the mission. Absent fields are "unknown", not zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AvailableResources {
    #[serde(default)]
    pub personnel: Option<u32>,
    #[serde(default)]
    pub budget: Option<f64>,
    #[serde(default)]
    pub equipment: Option<Vec<String>>,
    /// Time budget in hours
    #[serde(default)]
    pub time: Option<f64>,
}

impl AvailableResources {
    pub fn is_empty(&self) -> bool {
        self.personnel.is_none()
            && self.budget.is_none()
            && self.equipment.is_none()
            && self.time.is_none()
    }
}

/// Summary of how similar decisions played out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalPerformance {
    pub similar_decisions: u32,
    /// 0.0-1.0
    pub success_rate: f64,
    /// Hours
    pub average_completion_time: f64,
}

/// Snapshot handed to one `analyze_and_decide` call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionContext {
    pub mission_id: String,
    pub objective: MissionObjective,
    #[serde(default)]
    pub current_state: Metadata,
    #[serde(default)]
    pub available_resources: AvailableResources,
    #[serde(default)]
    pub historical_data: Option<HistoricalPerformance>,
    #[serde(default)]
    pub environmental_factors: Option<Metadata>,
}

/// Projected outcome of following an option
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectedOutcome {
    /// 0-100
    pub success_probability: f64,
    /// Hours
    pub estimated_duration: f64,
    /// 0-100
    pub resource_utilization: f64,
    /// 0-100
    pub risk_level: f64,
    pub cost_estimate: Option<f64>,
    /// 0-100
    pub quality_score: Option<f64>,
    /// 0-100
    pub safety_score: Option<f64>,
}

/// Clamp a percentage into [0, 100]
pub fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 100.0)
}

impl ExpectedOutcome {
    /// Bring every bounded field back into range
    pub fn clamped(self) -> Self {
        Self {
            success_probability: clamp_percent(self.success_probability),
            estimated_duration: self.estimated_duration.max(0.0),
            resource_utilization: clamp_percent(self.resource_utilization),
            risk_level: clamp_percent(self.risk_level),
            cost_estimate: self.cost_estimate.map(|c| c.max(0.0)),
            quality_score: self.quality_score.map(clamp_percent),
            safety_score: self.safety_score.map(clamp_percent),
        }
    }
}

/// A candidate strategy, one per heuristic considered
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionOption {
    pub id: String,
    pub name: String,
    pub description: String,
    pub heuristics: Vec<Heuristic>,
    pub expected_outcome: ExpectedOutcome,
    pub reasoning: String,
    pub pros: Vec<String>,
    pub cons: Vec<String>,
    /// 0-100, static per archetype
    pub confidence: f64,
    /// 0-100, adjusted during evaluation
    pub recommendation_score: f64,
}

impl DecisionOption {
    /// Selection key: score discounted by how sure we are about it
    pub fn weighted_score(&self) -> f64 {
        self.recommendation_score * (self.confidence / 100.0)
    }

    pub fn embodies(&self, heuristic: Heuristic) -> bool {
        self.heuristics.contains(&heuristic)
    }
}

/// One immutable entry in the audit trail of a pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionChainStep {
    /// Starts at 1, strictly increasing
    pub step: u32,
    pub phase: String,
    pub description: String,
    pub inputs: Value,
    pub outputs: Value,
    pub reasoning: String,
    pub timestamp: DateTime<Utc>,
    /// Milliseconds since the pipeline started
    pub duration_ms: u64,
}

/// Coarse urgency classification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DecisionType {
    Tactical,
    Operational,
    Strategic,
}

impl DecisionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionType::Tactical => "tactical",
            DecisionType::Operational => "operational",
            DecisionType::Strategic => "strategic",
        }
    }
}

/// Lifecycle status of a decision
///
/// ```text
/// analyzing -> proposed -> approved | rejected -> executing -> completed | failed
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DecisionStatus {
    Analyzing,
    Proposed,
    Approved,
    Rejected,
    Executing,
    Completed,
    Failed,
}

impl DecisionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionStatus::Analyzing => "analyzing",
            DecisionStatus::Proposed => "proposed",
            DecisionStatus::Approved => "approved",
            DecisionStatus::Rejected => "rejected",
            DecisionStatus::Executing => "executing",
            DecisionStatus::Completed => "completed",
            DecisionStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "analyzing" => Some(DecisionStatus::Analyzing),
            "proposed" => Some(DecisionStatus::Proposed),
            "approved" => Some(DecisionStatus::Approved),
            "rejected" => Some(DecisionStatus::Rejected),
            "executing" => Some(DecisionStatus::Executing),
            "completed" => Some(DecisionStatus::Completed),
            "failed" => Some(DecisionStatus::Failed),
            _ => None,
        }
    }

    /// Whether `next` follows the lifecycle diagram. Advisory only:
    /// status updates are never refused on this basis.
    pub fn follows_lifecycle(&self, next: DecisionStatus) -> bool {
        use DecisionStatus::*;
        matches!(
            (self, next),
            (Analyzing, Proposed)
                | (Proposed, Approved)
                | (Proposed, Rejected)
                | (Approved, Executing)
                | (Executing, Completed)
                | (Executing, Failed)
        ) || *self == next
    }
}

/// Provenance information for the audit trail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvenanceInfo {
    pub content_hash: String,
    pub previous_hash: Option<String>,
    pub signature: String,
    pub agent_pubkey: String,
}

/// The aggregate root: one full analysis and its lifecycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategicDecision {
    pub id: String,
    pub mission_id: String,
    pub objective_id: String,
    pub decision_type: DecisionType,
    pub context: DecisionContext,
    pub options: Vec<DecisionOption>,
    pub recommended_option: DecisionOption,
    /// Rendered explanation
    pub reasoning: String,
    pub decision_chain: Vec<DecisionChainStep>,
    pub status: DecisionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub metadata: Option<Metadata>,
    #[serde(default)]
    pub provenance: Option<ProvenanceInfo>,
}

impl StrategicDecision {
    /// Advisory check for callers deciding whether to auto-approve
    pub fn meets_confidence_threshold(&self, threshold: f64) -> bool {
        self.recommended_option.confidence >= threshold
    }

    /// Total pipeline latency, taken from the last chain step
    pub fn pipeline_duration_ms(&self) -> u64 {
        crate::chain::elapsed_ms(&self.decision_chain)
    }
}

/// What actually happened once the decision was carried out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActualOutcome {
    pub success: bool,
    /// Hours
    pub duration: f64,
    /// 0-100
    pub resource_usage: f64,
    #[serde(default)]
    pub quality: Option<f64>,
}

/// Actual minus expected, per measured dimension
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeVariance {
    pub duration: f64,
    pub resource_usage: f64,
    pub quality: Option<f64>,
}

/// Real-world result folded back into a decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionFeedback {
    pub decision_id: String,
    pub actual_outcome: ActualOutcome,
    pub variance: OutcomeVariance,
    pub lessons_learned: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

/// Whether a store write went through. Kept separate from `Err` so callers
/// can tell "analysis failed" apart from "computed but not saved".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PersistenceStatus {
    Saved,
    NotSaved { reason: String },
}

impl PersistenceStatus {
    pub fn is_saved(&self) -> bool {
        matches!(self, PersistenceStatus::Saved)
    }
}
