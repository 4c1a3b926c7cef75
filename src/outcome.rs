//! Outcome recording - closing the loop
//!
//! Feedback compares what happened against what the recommended option
//! projected. Aggregated feedback becomes the historical performance that
//! feeds the next analysis of the same mission.

use crate::heuristics::Heuristic;
use crate::types::{
    ActualOutcome, DecisionFeedback, ExpectedOutcome, HistoricalPerformance, OutcomeVariance,
    StrategicDecision,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Actual minus expected for each measured dimension
pub fn compute_variance(expected: &ExpectedOutcome, actual: &ActualOutcome) -> OutcomeVariance {
    OutcomeVariance {
        duration: actual.duration - expected.estimated_duration,
        resource_usage: actual.resource_usage - expected.resource_utilization,
        quality: match (actual.quality, expected.quality_score) {
            (Some(a), Some(e)) => Some(a - e),
            _ => None,
        },
    }
}

/// Build feedback for a decision against its recommended option
pub fn build_feedback(
    decision: &StrategicDecision,
    actual: ActualOutcome,
    lessons_learned: Vec<String>,
    timestamp: DateTime<Utc>,
) -> DecisionFeedback {
    DecisionFeedback {
        decision_id: decision.id.clone(),
        variance: compute_variance(&decision.recommended_option.expected_outcome, &actual),
        actual_outcome: actual,
        lessons_learned,
        timestamp,
    }
}

/// Summarize feedback into the shape a `DecisionContext` expects.
/// None when there is nothing to learn from yet.
pub fn historical_performance<'a>(
    feedback: impl IntoIterator<Item = &'a DecisionFeedback>,
) -> Option<HistoricalPerformance> {
    let mut count = 0u32;
    let mut successes = 0u32;
    let mut total_duration = 0.0;

    for fb in feedback {
        count += 1;
        if fb.actual_outcome.success {
            successes += 1;
        }
        total_duration += fb.actual_outcome.duration;
    }

    if count == 0 {
        return None;
    }

    Some(HistoricalPerformance {
        similar_decisions: count,
        success_rate: successes as f64 / count as f64,
        average_completion_time: total_duration / count as f64,
    })
}

/// Per-heuristic track record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeuristicStats {
    pub outcomes: u32,
    pub successes: u32,
    pub success_rate: f64,
}

/// Aggregate learning statistics over recorded feedback
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LearningStats {
    pub total_feedback: u32,
    pub successes: u32,
    pub success_rate: f64,
    /// Keyed by the recommended option's primary heuristic
    pub by_heuristic: BTreeMap<String, HeuristicStats>,
    /// Positive means slower than projected
    pub mean_duration_variance: f64,
    /// Positive means heavier than projected
    pub mean_resource_variance: f64,
}

/// Aggregate feedback, attributing each entry to the heuristic behind the
/// recommendation when the decision is known
pub fn learning_stats<'a>(
    entries: impl IntoIterator<Item = (&'a DecisionFeedback, Option<&'a StrategicDecision>)>,
) -> LearningStats {
    let mut stats = LearningStats::default();
    let mut duration_sum = 0.0;
    let mut resource_sum = 0.0;

    for (fb, decision) in entries {
        stats.total_feedback += 1;
        let success = fb.actual_outcome.success;
        if success {
            stats.successes += 1;
        }
        duration_sum += fb.variance.duration;
        resource_sum += fb.variance.resource_usage;

        let heuristic = decision
            .and_then(|d| d.recommended_option.heuristics.first().copied())
            .unwrap_or(Heuristic::Balanced);
        let entry = stats
            .by_heuristic
            .entry(heuristic.as_str().to_string())
            .or_default();
        entry.outcomes += 1;
        if success {
            entry.successes += 1;
        }
    }

    if stats.total_feedback > 0 {
        let n = stats.total_feedback as f64;
        stats.success_rate = stats.successes as f64 / n;
        stats.mean_duration_variance = duration_sum / n;
        stats.mean_resource_variance = resource_sum / n;
    }
    for entry in stats.by_heuristic.values_mut() {
        entry.success_rate = entry.successes as f64 / entry.outcomes as f64;
    }

    stats
}
