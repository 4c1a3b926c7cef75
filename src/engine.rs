//! Decision lifecycle: orchestrates the pipeline and owns decision history
//!
//! ```text
//! assess -> generate -> evaluate -> select -> explain -> classify -> persist
//! ```
//!
//! Steps up to selection are fatal on error. Store failures never are: the
//! caller gets the decision back with `PersistenceStatus::NotSaved`.
//!
//! History is an in-memory index shared by concurrent calls. It is filled by
//! `analyze_and_decide`, `save_decision` and a bounded preload on `open`.

use crate::assess::{self, days_until, ContextAssessment};
use crate::chain::ChainRecorder;
use crate::config::ReasoningConfig;
use crate::error::{EngineError, EngineResult, StoreError};
use crate::evaluate::{self, URGENT_PRIORITY_THRESHOLD};
use crate::explain;
use crate::generate;
use crate::outcome::{self, LearningStats};
use crate::provenance::{self, AuditReport, ChainVerification, Provenance};
use crate::select;
use crate::store::DecisionStore;
use crate::types::{
    ActualOutcome, DecisionContext, DecisionFeedback, DecisionStatus, DecisionType,
    HistoricalPerformance, MissionObjective, PersistenceStatus, StrategicDecision,
};
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// A decision plus whether the store accepted it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionOutcome {
    pub decision: StrategicDecision,
    pub persistence: PersistenceStatus,
}

/// Result of folding real-world feedback into a decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackOutcome {
    pub decision: StrategicDecision,
    pub feedback: DecisionFeedback,
    pub persistence: PersistenceStatus,
}

#[derive(Debug, Default)]
struct History {
    decisions: HashMap<String, StrategicDecision>,
    feedback: HashMap<String, Vec<DecisionFeedback>>,
    /// Content hash of the most recently sealed decision
    last_hash: Option<String>,
}

impl History {
    fn index(&mut self, decision: StrategicDecision) {
        self.decisions.insert(decision.id.clone(), decision);
    }
}

/// The reasoning engine. Cheap to share behind an `Arc`.
pub struct ReasoningEngine {
    store: Arc<dyn DecisionStore>,
    config: ReasoningConfig,
    provenance: Option<Provenance>,
    history: RwLock<History>,
}

impl ReasoningEngine {
    /// Engine with empty history
    pub fn new(store: Arc<dyn DecisionStore>, config: ReasoningConfig) -> Self {
        Self {
            store,
            config,
            provenance: None,
            history: RwLock::new(History::default()),
        }
    }

    /// Engine with history preloaded from the store's most recent decisions.
    /// A failed preload is logged and leaves history empty.
    pub async fn open(store: Arc<dyn DecisionStore>, config: ReasoningConfig) -> Self {
        let engine = Self::new(store, config);
        let limit = engine.config.history_preload_limit;
        let store = Arc::clone(&engine.store);

        match engine.bounded(store.recent_decisions(limit)).await {
            Ok(decisions) => {
                let mut history = engine.history.write().await;
                // Newest first: the first sealed one is the chain head
                history.last_hash = decisions
                    .iter()
                    .find_map(|d| d.provenance.as_ref().map(|p| p.content_hash.clone()));
                let count = decisions.len();
                for decision in decisions {
                    history.index(decision);
                }
                info!(count, limit, "Preloaded decision history");
            }
            Err(e) => {
                warn!(event = "history_preload_failure", error = %e, "Could not preload decision history");
            }
        }

        engine
    }

    /// Seal every new decision with this key
    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = Some(provenance);
        self
    }

    pub fn config(&self) -> &ReasoningConfig {
        &self.config
    }

    // ========================================================================
    // Pipeline
    // ========================================================================

    /// Run the full pipeline for one context and persist the result
    pub async fn analyze_and_decide(&self, context: DecisionContext) -> EngineResult<DecisionOutcome> {
        validate_context(&context)?;

        let mut chain = ChainRecorder::new();
        debug!(mission_id = %context.mission_id, objective_id = %context.objective.id, "Analyzing");

        let assessment = assess::assess(&context);
        chain.record(
            "Context Analysis",
            "Assess resources, constraints and time pressure",
            &json!({
                "objective": context.objective.objective,
                "priority": context.objective.priority,
                "constraints": context.objective.constraints.len(),
            }),
            &assessment,
            assessment_summary(&assessment),
        );

        let generated = generate::generate(
            &context,
            &assessment,
            &self.config.heuristics,
            self.config.max_options_to_generate,
        );
        chain.record(
            "Option Generation",
            "Generate one candidate strategy per heuristic",
            &json!({
                "heuristics": self.config.heuristics,
                "limit": self.config.max_options_to_generate,
            }),
            &option_summaries(&generated),
            format!("Generated {} strategic options", generated.len()),
        );

        let options = evaluate::evaluate(&generated, &context);
        chain.record(
            "Option Evaluation",
            "Adjust scores for priority, resource scarcity and track record",
            &option_summaries(&generated),
            &option_summaries(&options),
            "Applied contextual modifiers to recommendation scores",
        );

        let recommended = select::select(&options)?.clone();
        chain.record(
            "Option Selection",
            "Select the option with the highest confidence-weighted score",
            &json!({ "candidates": options.len() }),
            &json!({
                "id": recommended.id,
                "name": recommended.name,
                "weighted_score": recommended.weighted_score(),
            }),
            format!(
                "Selected {} (score {:.1}, confidence {:.0}%)",
                recommended.name, recommended.recommendation_score, recommended.confidence
            ),
        );

        let reasoning = explain::build(&context, &options, &recommended, chain.steps());
        let decision_type = determine_decision_type(&context.objective, Utc::now());
        let decision_chain = chain.into_steps();

        let now = now_micros();
        let decision = StrategicDecision {
            id: uuid::Uuid::new_v4().to_string(),
            mission_id: context.mission_id.clone(),
            objective_id: context.objective.id.clone(),
            decision_type,
            context,
            options,
            recommended_option: recommended,
            reasoning,
            decision_chain,
            status: DecisionStatus::Proposed,
            created_at: now,
            updated_at: now,
            metadata: None,
            provenance: None,
        };

        let decision = self.seal_and_index(decision).await?;
        let persistence = self.persist_new(&decision).await;

        info!(
            decision_id = %decision.id,
            mission_id = %decision.mission_id,
            recommended = %decision.recommended_option.id,
            decision_type = decision.decision_type.as_str(),
            saved = persistence.is_saved(),
            "Decision proposed"
        );

        Ok(DecisionOutcome {
            decision,
            persistence,
        })
    }

    /// Persist and index a decision assembled outside the pipeline. Ids
    /// already in history are rejected, never overwritten.
    pub async fn save_decision(&self, decision: StrategicDecision) -> EngineResult<DecisionOutcome> {
        validate_context(&decision.context)?;
        if !decision
            .options
            .iter()
            .any(|o| o.id == decision.recommended_option.id)
        {
            return Err(EngineError::invalid(
                "recommended_option.id",
                format!("{} is not among the options", decision.recommended_option.id),
            ));
        }

        let decision = self.seal_and_index(decision).await?;
        let persistence = self.persist_new(&decision).await;
        info!(decision_id = %decision.id, saved = persistence.is_saved(), "Decision saved");

        Ok(DecisionOutcome {
            decision,
            persistence,
        })
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Set a decision's status. Any transition is accepted.
    pub async fn update_status(
        &self,
        decision_id: &str,
        status: DecisionStatus,
    ) -> EngineResult<DecisionOutcome> {
        let now = now_micros();
        let (decision, previous) = {
            let mut history = self.history.write().await;
            let decision = history
                .decisions
                .get_mut(decision_id)
                .ok_or_else(|| EngineError::unknown_decision(decision_id))?;
            let previous = decision.status;
            decision.status = status;
            decision.updated_at = now;
            (decision.clone(), previous)
        };

        if !previous.follows_lifecycle(status) {
            warn!(
                decision_id,
                from = previous.as_str(),
                to = status.as_str(),
                "Status change does not follow the decision lifecycle"
            );
        }

        let result = self
            .bounded(self.store.update_status(decision_id, status, now))
            .await;
        let persistence = report(result, "update_status", decision_id);
        debug!(decision_id, status = status.as_str(), "Status updated");

        Ok(DecisionOutcome {
            decision,
            persistence,
        })
    }

    /// Record what actually happened. Moves the decision to `completed` or
    /// `failed` depending on `actual.success`.
    pub async fn record_feedback(
        &self,
        decision_id: &str,
        actual: ActualOutcome,
        lessons_learned: Vec<String>,
    ) -> EngineResult<FeedbackOutcome> {
        let now = now_micros();
        let status = if actual.success {
            DecisionStatus::Completed
        } else {
            DecisionStatus::Failed
        };

        let (decision, feedback) = {
            let mut history = self.history.write().await;
            let decision = history
                .decisions
                .get_mut(decision_id)
                .ok_or_else(|| EngineError::unknown_decision(decision_id))?;
            decision.status = status;
            decision.updated_at = now;
            let decision = decision.clone();

            let feedback = outcome::build_feedback(&decision, actual, lessons_learned, now);
            history
                .feedback
                .entry(decision_id.to_string())
                .or_default()
                .push(feedback.clone());
            (decision, feedback)
        };

        let mut failures = Vec::new();
        if let PersistenceStatus::NotSaved { reason } = report(
            self.bounded(self.store.insert_feedback(&feedback)).await,
            "insert_feedback",
            decision_id,
        ) {
            failures.push(reason);
        }
        if let PersistenceStatus::NotSaved { reason } = report(
            self.bounded(self.store.update_status(decision_id, status, now))
                .await,
            "update_status",
            decision_id,
        ) {
            failures.push(reason);
        }

        let persistence = if failures.is_empty() {
            PersistenceStatus::Saved
        } else {
            PersistenceStatus::NotSaved {
                reason: failures.join("; "),
            }
        };

        info!(
            decision_id,
            success = feedback.actual_outcome.success,
            duration_variance = feedback.variance.duration,
            "Feedback recorded"
        );

        Ok(FeedbackOutcome {
            decision,
            feedback,
            persistence,
        })
    }

    // ========================================================================
    // History queries
    // ========================================================================

    pub async fn get_decision(&self, decision_id: &str) -> Option<StrategicDecision> {
        self.history.read().await.decisions.get(decision_id).cloned()
    }

    /// Decisions for one mission, newest first
    pub async fn decisions_for_mission(&self, mission_id: &str) -> Vec<StrategicDecision> {
        let history = self.history.read().await;
        let mut decisions: Vec<_> = history
            .decisions
            .values()
            .filter(|d| d.mission_id == mission_id)
            .cloned()
            .collect();
        decisions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        decisions
    }

    /// Most recent decisions across all missions, newest first
    pub async fn recent_decisions(&self, limit: usize) -> Vec<StrategicDecision> {
        let history = self.history.read().await;
        let mut decisions: Vec<_> = history.decisions.values().cloned().collect();
        decisions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        decisions.truncate(limit);
        decisions
    }

    /// Feedback recorded for a decision in this process, oldest first
    pub async fn feedback_for(&self, decision_id: &str) -> Vec<DecisionFeedback> {
        self.history
            .read()
            .await
            .feedback
            .get(decision_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Track record of a mission's past decisions, ready to drop into the
    /// next `DecisionContext::historical_data`
    pub async fn historical_performance(&self, mission_id: &str) -> Option<HistoricalPerformance> {
        let history = self.history.read().await;
        let feedback = history
            .decisions
            .values()
            .filter(|d| d.mission_id == mission_id)
            .filter_map(|d| history.feedback.get(&d.id))
            .flatten();
        outcome::historical_performance(feedback)
    }

    pub async fn learning_stats(&self) -> LearningStats {
        let history = self.history.read().await;
        outcome::learning_stats(
            history
                .feedback
                .iter()
                .flat_map(|(id, entries)| {
                    let decision = history.decisions.get(id);
                    entries.iter().map(move |fb| (fb, decision))
                }),
        )
    }

    // ========================================================================
    // Provenance
    // ========================================================================

    /// Verify one decision's hash and signature
    pub async fn audit(&self, decision_id: &str) -> EngineResult<AuditReport> {
        let decision = self
            .get_decision(decision_id)
            .await
            .ok_or_else(|| EngineError::unknown_decision(decision_id))?;
        Ok(provenance::audit(&decision))
    }

    /// Verify hashes, signatures and links across every sealed decision in
    /// history, oldest first
    pub async fn verify_chain(&self) -> ChainVerification {
        let history = self.history.read().await;
        let mut sealed: Vec<_> = history
            .decisions
            .values()
            .filter(|d| d.provenance.is_some())
            .cloned()
            .collect();
        sealed.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        provenance::verify_chain(&sealed)
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// Seal (when keyed) and index under one lock so the hash chain stays
    /// linear across concurrent calls
    async fn seal_and_index(&self, mut decision: StrategicDecision) -> EngineResult<StrategicDecision> {
        let mut history = self.history.write().await;

        if history.decisions.contains_key(&decision.id) {
            return Err(EngineError::invalid(
                "id",
                format!("decision {} already exists", decision.id),
            ));
        }

        if let (Some(prov), None) = (&self.provenance, &decision.provenance) {
            match prov.seal(&decision, history.last_hash.clone()) {
                Ok(info) => {
                    history.last_hash = Some(info.content_hash.clone());
                    decision.provenance = Some(info);
                }
                Err(e) => {
                    warn!(decision_id = %decision.id, error = %e, "Could not seal decision");
                }
            }
        }

        history.index(decision.clone());
        Ok(decision)
    }

    /// Insert a decision and, when enabled, its chain log. Status reflects
    /// the decision row; chain log failures are only logged.
    async fn persist_new(&self, decision: &StrategicDecision) -> PersistenceStatus {
        let status = report(
            self.bounded(self.store.insert_decision(decision)).await,
            "insert_decision",
            &decision.id,
        );

        if status.is_saved() && self.config.log_decision_chain {
            report(
                self.bounded(
                    self.store
                        .insert_chain_steps(&decision.id, &decision.decision_chain),
                )
                .await,
                "insert_chain_steps",
                &decision.id,
            );
        }

        status
    }

    /// Apply the configured timeout to a store call
    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, StoreError> {
        match tokio::time::timeout(self.config.persistence_timeout(), call).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout(self.config.persistence_timeout_ms)),
        }
    }
}

/// Turn a store result into a `PersistenceStatus`, logging failures
fn report(result: Result<(), StoreError>, operation: &str, decision_id: &str) -> PersistenceStatus {
    match result {
        Ok(()) => PersistenceStatus::Saved,
        Err(e) => {
            warn!(
                event = "persistence_failure",
                operation,
                decision_id,
                error = %e,
                "Store write failed"
            );
            PersistenceStatus::NotSaved {
                reason: format!("{}: {}", operation, e),
            }
        }
    }
}

/// Microsecond precision, matching what the store keeps
fn now_micros() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Urgency class from priority and deadline
pub fn determine_decision_type(objective: &MissionObjective, now: DateTime<Utc>) -> DecisionType {
    if objective.priority > URGENT_PRIORITY_THRESHOLD {
        return DecisionType::Tactical;
    }

    match objective.target_date.map(|t| days_until(t, now)) {
        Some(days) if days < 7.0 => DecisionType::Tactical,
        Some(days) if days < 30.0 => DecisionType::Operational,
        _ => DecisionType::Strategic,
    }
}

/// Reject malformed input before the pipeline runs
pub fn validate_context(context: &DecisionContext) -> EngineResult<()> {
    let objective = &context.objective;

    if context.mission_id.trim().is_empty() {
        return Err(EngineError::invalid("mission_id", "must not be empty"));
    }
    if objective.id.trim().is_empty() {
        return Err(EngineError::invalid("objective.id", "must not be empty"));
    }
    if objective.objective.trim().is_empty() {
        return Err(EngineError::invalid("objective.objective", "must not be empty"));
    }
    if !(0..=100).contains(&objective.priority) {
        return Err(EngineError::invalid(
            "objective.priority",
            format!("must be within 0-100, got {}", objective.priority),
        ));
    }

    let resources = &context.available_resources;
    if let Some(budget) = resources.budget {
        if !budget.is_finite() || budget < 0.0 {
            return Err(EngineError::invalid(
                "available_resources.budget",
                format!("must be a non-negative number, got {}", budget),
            ));
        }
    }
    if let Some(time) = resources.time {
        if !time.is_finite() || time < 0.0 {
            return Err(EngineError::invalid(
                "available_resources.time",
                format!("must be a non-negative number of hours, got {}", time),
            ));
        }
    }

    if let Some(history) = &context.historical_data {
        if !(0.0..=1.0).contains(&history.success_rate) {
            return Err(EngineError::invalid(
                "historical_data.success_rate",
                format!("must be within 0.0-1.0, got {}", history.success_rate),
            ));
        }
        if !history.average_completion_time.is_finite() || history.average_completion_time < 0.0 {
            return Err(EngineError::invalid(
                "historical_data.average_completion_time",
                format!("must be non-negative, got {}", history.average_completion_time),
            ));
        }
    }

    Ok(())
}

fn assessment_summary(assessment: &ContextAssessment) -> String {
    let mut summary = format!(
        "Resource availability {:.0}%, constraint severity {:.0}%, time urgency {:.0}%",
        assessment.resource_availability * 100.0,
        assessment.constraint_severity * 100.0,
        assessment.time_urgency * 100.0
    );
    if !assessment.risk_factors.is_empty() {
        summary.push_str(&format!("; risks: {}", assessment.risk_factors.join(", ")));
    }
    summary
}

/// Id/name/score triples, to keep chain logs small
fn option_summaries(options: &[crate::types::DecisionOption]) -> Vec<serde_json::Value> {
    options
        .iter()
        .map(|o| {
            json!({
                "id": o.id,
                "name": o.name,
                "score": o.recommendation_score,
            })
        })
        .collect()
}
