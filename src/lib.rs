//! strategos - Strategic Decision Reasoning Engine
//!
//! Turns a mission objective plus its situational context into a ranked set
//! of candidate strategies, picks one, and explains why, with an auditable
//! step-by-step trail.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use strategos::{ReasoningConfig, ReasoningEngine, SqliteStore, Provenance};
//!
//! let store = Arc::new(SqliteStore::open(&db_path)?);
//! let engine = ReasoningEngine::open(store, ReasoningConfig::default())
//!     .await
//!     .with_provenance(Provenance::init(&key_path)?);
//!
//! // Analyze
//! let outcome = engine.analyze_and_decide(context).await?;
//! if !outcome.persistence.is_saved() {
//!     // computed but not saved
//! }
//!
//! // Drive the lifecycle, then close the loop
//! engine.update_status(&outcome.decision.id, DecisionStatus::Approved).await?;
//! engine.record_feedback(&outcome.decision.id, actual, lessons).await?;
//! ```
//!
//! # Architecture
//!
//! ```text
//! DecisionContext
//!       │
//!       ▼
//! assess ──► generate ──► evaluate ──► select ──► explain
//!   │           │            │           │
//!   └───────────┴── decision chain ──────┘
//!                          │
//!                          ▼
//!        StrategicDecision (proposed) ──► DecisionStore
//! ```

pub mod assess;
pub mod chain;
pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod evaluate;
pub mod explain;
pub mod generate;
pub mod heuristics;
pub mod outcome;
pub mod provenance;
pub mod select;
pub mod store;
pub mod types;

// Core types
pub use config::ReasoningConfig;
pub use engine::{DecisionOutcome, FeedbackOutcome, ReasoningEngine};
pub use error::{EngineError, EngineResult, StoreError};
pub use heuristics::Heuristic;
pub use provenance::Provenance;
pub use types::*;

// Persistence
pub use db::{init_db, SqliteStore};
pub use store::{DecisionStore, MemoryStore};

// Outcome learning
pub use outcome::{HeuristicStats, LearningStats};
