//! Persistence port for decisions, chain logs and feedback
//!
//! The engine writes all three stores but only ever reads decisions back
//! (to preload history). Chain logs and feedback exist for external audit.

use crate::error::StoreError;
use crate::types::{DecisionChainStep, DecisionFeedback, DecisionStatus, StrategicDecision};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

/// Storage collaborator used by the decision lifecycle
#[async_trait]
pub trait DecisionStore: Send + Sync {
    /// Insert a new decision row
    async fn insert_decision(&self, decision: &StrategicDecision) -> Result<(), StoreError>;

    /// Field-level update of `status` and `updated_at`
    async fn update_status(
        &self,
        decision_id: &str,
        status: DecisionStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// One row per chain step, keyed to the decision
    async fn insert_chain_steps(
        &self,
        decision_id: &str,
        steps: &[DecisionChainStep],
    ) -> Result<(), StoreError>;

    async fn insert_feedback(&self, feedback: &DecisionFeedback) -> Result<(), StoreError>;

    /// Most recent decisions first, at most `limit`
    async fn recent_decisions(&self, limit: usize) -> Result<Vec<StrategicDecision>, StoreError>;
}

#[derive(Debug, Default)]
struct MemoryTables {
    decisions: HashMap<String, StrategicDecision>,
    chain_logs: Vec<(String, DecisionChainStep)>,
    feedback: Vec<DecisionFeedback>,
}

/// In-process store for embedding the engine without a database
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<MemoryTables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, MemoryTables>, StoreError> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
    }

    pub fn decision(&self, id: &str) -> Option<StrategicDecision> {
        self.lock().ok()?.decisions.get(id).cloned()
    }

    pub fn decision_count(&self) -> usize {
        self.lock().map(|t| t.decisions.len()).unwrap_or(0)
    }

    pub fn chain_logs(&self, decision_id: &str) -> Vec<DecisionChainStep> {
        self.lock()
            .map(|t| {
                t.chain_logs
                    .iter()
                    .filter(|(id, _)| id == decision_id)
                    .map(|(_, step)| step.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn feedback(&self) -> Vec<DecisionFeedback> {
        self.lock().map(|t| t.feedback.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl DecisionStore for MemoryStore {
    async fn insert_decision(&self, decision: &StrategicDecision) -> Result<(), StoreError> {
        let mut tables = self.lock()?;
        // Same contract as a primary key: never overwrite
        if tables.decisions.contains_key(&decision.id) {
            return Err(StoreError::Duplicate(decision.id.clone()));
        }
        tables
            .decisions
            .insert(decision.id.clone(), decision.clone());
        Ok(())
    }

    async fn update_status(
        &self,
        decision_id: &str,
        status: DecisionStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        // Like an UPDATE with no matching row: nothing happens
        if let Some(decision) = self.lock()?.decisions.get_mut(decision_id) {
            decision.status = status;
            decision.updated_at = updated_at;
        }
        Ok(())
    }

    async fn insert_chain_steps(
        &self,
        decision_id: &str,
        steps: &[DecisionChainStep],
    ) -> Result<(), StoreError> {
        let mut tables = self.lock()?;
        for step in steps {
            tables.chain_logs.push((decision_id.to_string(), step.clone()));
        }
        Ok(())
    }

    async fn insert_feedback(&self, feedback: &DecisionFeedback) -> Result<(), StoreError> {
        self.lock()?.feedback.push(feedback.clone());
        Ok(())
    }

    async fn recent_decisions(&self, limit: usize) -> Result<Vec<StrategicDecision>, StoreError> {
        let mut decisions: Vec<StrategicDecision> =
            self.lock()?.decisions.values().cloned().collect();
        decisions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        decisions.truncate(limit);
        Ok(decisions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ActualOutcome, OutcomeVariance};
    use tokio_test::block_on;

    fn feedback(id: &str) -> DecisionFeedback {
        DecisionFeedback {
            decision_id: id.to_string(),
            actual_outcome: ActualOutcome {
                success: true,
                duration: 12.0,
                resource_usage: 40.0,
                quality: None,
            },
            variance: OutcomeVariance {
                duration: -2.0,
                resource_usage: 5.0,
                quality: None,
            },
            lessons_learned: vec![],
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_duplicate_insert_rejected() {
        let store = MemoryStore::new();
        let context: crate::types::DecisionContext = serde_json::from_value(serde_json::json!({
            "mission_id": "m",
            "objective": {"id": "o", "mission_id": "m", "objective": "Hold the pass", "priority": 40}
        }))
        .unwrap();
        let scratch = crate::engine::ReasoningEngine::new(
            std::sync::Arc::new(MemoryStore::new()),
            crate::config::ReasoningConfig::default(),
        );
        let mut decision = block_on(scratch.analyze_and_decide(context)).unwrap().decision;
        decision.id = "dup".to_string();

        block_on(store.insert_decision(&decision)).unwrap();
        let mut changed = decision.clone();
        changed.status = DecisionStatus::Failed;
        assert!(matches!(
            block_on(store.insert_decision(&changed)),
            Err(StoreError::Duplicate(ref id)) if id == "dup"
        ));
        assert_eq!(store.decision("dup").unwrap().status, DecisionStatus::Proposed);
    }

    #[test]
    fn test_update_unknown_is_noop() {
        let store = MemoryStore::new();
        block_on(store.update_status("ghost", DecisionStatus::Approved, Utc::now())).unwrap();
        assert_eq!(store.decision_count(), 0);
        assert!(store.decision("ghost").is_none());
    }

    #[test]
    fn test_chain_logs_filtered_by_decision() {
        let store = MemoryStore::new();
        let mut chain = crate::chain::ChainRecorder::new();
        chain.record("Context Analysis", "", &(), &(), "");
        chain.record("Option Generation", "", &(), &(), "");
        let steps = chain.into_steps();

        block_on(store.insert_chain_steps("a", &steps)).unwrap();
        block_on(store.insert_chain_steps("b", &steps[..1])).unwrap();

        assert_eq!(store.chain_logs("a").len(), 2);
        assert_eq!(store.chain_logs("b").len(), 1);
        assert!(store.chain_logs("c").is_empty());
    }

    #[test]
    fn test_feedback_appended() {
        let store = MemoryStore::new();
        block_on(store.insert_feedback(&feedback("a"))).unwrap();
        block_on(store.insert_feedback(&feedback("a"))).unwrap();
        assert_eq!(store.feedback().len(), 2);
        assert!(block_on(store.recent_decisions(10)).unwrap().is_empty());
    }
}
