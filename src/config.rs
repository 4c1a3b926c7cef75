//! Engine configuration

use crate::generate::DEFAULT_OPTION_LIMIT;
use crate::heuristics::Heuristic;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Configuration for the reasoning engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReasoningConfig {
    /// Descriptive only: the explanation is always built
    pub enable_explainability: bool,
    /// Write chain steps to the chain-log store
    pub log_decision_chain: bool,
    /// Reserved for wiring external context sources
    pub context_integration: bool,
    /// Reserved
    pub prediction_engine_enabled: bool,
    /// Advisory 0-100. Not enforced by the engine; callers apply it when
    /// deciding whether to auto-approve.
    pub min_confidence_threshold: f64,
    /// Cap on generated options
    pub max_options_to_generate: usize,
    /// Heuristics to draw from. Drawn in priority order, not list order.
    pub heuristics: Vec<Heuristic>,
    /// Most-recent-N decisions loaded into history on open
    pub history_preload_limit: usize,
    /// Upper bound on each store call
    pub persistence_timeout_ms: u64,
}

impl Default for ReasoningConfig {
    fn default() -> Self {
        Self {
            enable_explainability: true,
            log_decision_chain: true,
            context_integration: true,
            prediction_engine_enabled: false,
            min_confidence_threshold: 70.0,
            max_options_to_generate: DEFAULT_OPTION_LIMIT,
            heuristics: Heuristic::PRIORITY_ORDER.to_vec(),
            history_preload_limit: 100,
            persistence_timeout_ms: 5_000,
        }
    }
}

impl ReasoningConfig {
    /// Load from a JSON file. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid config JSON in {:?}", path))?;
        Ok(config)
    }

    pub fn persistence_timeout(&self) -> Duration {
        Duration::from_millis(self.persistence_timeout_ms)
    }
}
