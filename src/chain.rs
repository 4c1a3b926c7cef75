//! Decision chain: append-only audit trail of one pipeline run

use crate::types::DecisionChainStep;
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use std::time::Instant;

/// Records pipeline steps with monotonic elapsed times
#[derive(Debug)]
pub struct ChainRecorder {
    started: Instant,
    steps: Vec<DecisionChainStep>,
}

impl Default for ChainRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl ChainRecorder {
    /// Start the clock for a new run
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            steps: Vec::new(),
        }
    }

    /// Append a step. Inputs and outputs are snapshotted as JSON; anything
    /// that fails to serialize is recorded as null.
    pub fn record<I: Serialize, O: Serialize>(
        &mut self,
        phase: &str,
        description: &str,
        inputs: &I,
        outputs: &O,
        reasoning: impl Into<String>,
    ) -> &DecisionChainStep {
        let step = DecisionChainStep {
            step: self.steps.len() as u32 + 1,
            phase: phase.to_string(),
            description: description.to_string(),
            inputs: serde_json::to_value(inputs).unwrap_or(Value::Null),
            outputs: serde_json::to_value(outputs).unwrap_or(Value::Null),
            reasoning: reasoning.into(),
            timestamp: Utc::now(),
            duration_ms: self.started.elapsed().as_millis() as u64,
        };
        self.steps.push(step);
        &self.steps[self.steps.len() - 1]
    }

    pub fn steps(&self) -> &[DecisionChainStep] {
        &self.steps
    }

    pub fn into_steps(self) -> Vec<DecisionChainStep> {
        self.steps
    }
}

/// Elapsed time of a run, read off its last step
pub fn elapsed_ms(steps: &[DecisionChainStep]) -> u64 {
    steps.last().map(|s| s.duration_ms).unwrap_or(0)
}

/// Check that step numbers run 1..=n and durations never decrease
pub fn is_well_ordered(steps: &[DecisionChainStep]) -> bool {
    steps.iter().enumerate().all(|(i, s)| s.step as usize == i + 1)
        && steps.windows(2).all(|w| w[0].duration_ms <= w[1].duration_ms)
}
