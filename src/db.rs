//! SQLite storage for decisions, chain logs and feedback
//!
//! Single file, zero network dependencies. Structured parts of a decision
//! are stored as JSON columns; timestamps as RFC 3339 strings.

use crate::error::StoreError;
use crate::store::DecisionStore;
use crate::types::{
    ActualOutcome, DecisionChainStep, DecisionFeedback, DecisionStatus, StrategicDecision,
};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// Open (or create) a database file and apply the schema
pub fn init_db(path: &Path) -> Result<Connection, StoreError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Unavailable(format!("{:?}: {}", parent, e)))?;
        }
    }
    let conn = Connection::open(path)?;
    conn.execute_batch(SCHEMA)?;
    Ok(conn)
}

const SCHEMA: &str = r#"
PRAGMA foreign_keys = ON;

-- Decisions: one row per analysis run
CREATE TABLE IF NOT EXISTS strategic_decisions (
    id TEXT PRIMARY KEY,
    mission_id TEXT NOT NULL,
    objective_id TEXT NOT NULL,
    decision_type TEXT NOT NULL,       -- tactical | operational | strategic
    status TEXT NOT NULL,
    context_json TEXT NOT NULL,
    options_json TEXT NOT NULL,
    recommended_option_json TEXT NOT NULL,
    reasoning TEXT NOT NULL,
    decision_chain_json TEXT NOT NULL,
    metadata_json TEXT,

    -- Provenance chain
    content_hash TEXT,
    previous_hash TEXT,
    signature TEXT,
    agent_pubkey TEXT,

    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_decisions_mission ON strategic_decisions(mission_id);
CREATE INDEX IF NOT EXISTS idx_decisions_created ON strategic_decisions(created_at);

-- Chain logs: audit/analytics only, never read back by the engine
CREATE TABLE IF NOT EXISTS decision_chain_logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    decision_id TEXT NOT NULL REFERENCES strategic_decisions(id),
    step_number INTEGER NOT NULL,
    phase TEXT NOT NULL,
    description TEXT NOT NULL,
    inputs_json TEXT NOT NULL,
    outputs_json TEXT NOT NULL,
    reasoning TEXT NOT NULL,
    timestamp TEXT NOT NULL,
    duration_ms INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_chain_logs_decision ON decision_chain_logs(decision_id);

-- Feedback: real-world outcomes
CREATE TABLE IF NOT EXISTS decision_feedback (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    decision_id TEXT NOT NULL REFERENCES strategic_decisions(id),
    success INTEGER NOT NULL,
    actual_duration REAL NOT NULL,
    actual_resource_usage REAL NOT NULL,
    actual_quality REAL,
    variance_json TEXT NOT NULL,
    lessons_json TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_feedback_decision ON decision_feedback(decision_id);
"#;

fn timestamp(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Decode a bare string column through serde (enums, timestamps)
fn from_text<T: DeserializeOwned>(s: String) -> Result<T, StoreError> {
    Ok(serde_json::from_value(Value::String(s))?)
}

struct DecisionRow {
    id: String,
    mission_id: String,
    objective_id: String,
    decision_type: String,
    status: String,
    context_json: String,
    options_json: String,
    recommended_option_json: String,
    reasoning: String,
    decision_chain_json: String,
    metadata_json: Option<String>,
    content_hash: Option<String>,
    previous_hash: Option<String>,
    signature: Option<String>,
    agent_pubkey: Option<String>,
    created_at: String,
    updated_at: String,
}

impl DecisionRow {
    fn into_decision(self) -> Result<StrategicDecision, StoreError> {
        let provenance = match (self.content_hash, self.signature, self.agent_pubkey) {
            (Some(content_hash), Some(signature), Some(agent_pubkey)) => {
                Some(crate::types::ProvenanceInfo {
                    content_hash,
                    previous_hash: self.previous_hash,
                    signature,
                    agent_pubkey,
                })
            }
            _ => None,
        };

        Ok(StrategicDecision {
            id: self.id,
            mission_id: self.mission_id,
            objective_id: self.objective_id,
            decision_type: from_text(self.decision_type)?,
            context: serde_json::from_str(&self.context_json)?,
            options: serde_json::from_str(&self.options_json)?,
            recommended_option: serde_json::from_str(&self.recommended_option_json)?,
            reasoning: self.reasoning,
            decision_chain: serde_json::from_str(&self.decision_chain_json)?,
            status: from_text(self.status)?,
            created_at: from_text(self.created_at)?,
            updated_at: from_text(self.updated_at)?,
            metadata: self
                .metadata_json
                .map(|m| serde_json::from_str(&m))
                .transpose()?,
            provenance,
        })
    }
}

/// SQLite-backed `DecisionStore`. Trait calls run on the blocking pool so
/// a locked or slow database never stalls the async runtime.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        Ok(Self::from_connection(init_db(path)?))
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self::from_connection(conn))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        lock_conn(&self.conn)
    }

    /// Run `f` against the connection on tokio's blocking pool
    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = lock_conn(&conn)?;
            f(&mut guard)
        })
        .await
        .map_err(|e| StoreError::Unavailable(format!("spawn_blocking failed: {}", e)))?
    }

    /// Load one decision by id
    pub fn decision(&self, id: &str) -> Result<Option<StrategicDecision>, StoreError> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                &format!("{} WHERE id = ?1", SELECT_DECISION),
                [id],
                map_decision_row,
            )
            .optional()?;
        row.map(DecisionRow::into_decision).transpose()
    }

    /// Chain log rows for a decision, in step order
    pub fn chain_log(&self, decision_id: &str) -> Result<Vec<DecisionChainStep>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT step_number, phase, description, inputs_json, outputs_json,
                   reasoning, timestamp, duration_ms
            FROM decision_chain_logs
            WHERE decision_id = ?1
            ORDER BY step_number
            "#,
        )?;

        let rows = stmt
            .query_map([decision_id], |row| {
                Ok((
                    row.get::<_, u32>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, String>(6)?,
                    row.get::<_, i64>(7)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(
                |(step, phase, description, inputs, outputs, reasoning, ts, duration)| {
                    Ok(DecisionChainStep {
                        step,
                        phase,
                        description,
                        inputs: serde_json::from_str(&inputs)?,
                        outputs: serde_json::from_str(&outputs)?,
                        reasoning,
                        timestamp: from_text(ts)?,
                        duration_ms: duration.max(0) as u64,
                    })
                },
            )
            .collect()
    }

    /// All recorded feedback, oldest first. Used for offline learning stats.
    pub fn all_feedback(&self) -> Result<Vec<DecisionFeedback>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT decision_id, success, actual_duration, actual_resource_usage,
                   actual_quality, variance_json, lessons_json, created_at
            FROM decision_feedback
            ORDER BY id
            "#,
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i32>(1)?,
                    row.get::<_, f64>(2)?,
                    row.get::<_, f64>(3)?,
                    row.get::<_, Option<f64>>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, String>(6)?,
                    row.get::<_, String>(7)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(
                |(decision_id, success, duration, resource_usage, quality, variance, lessons, ts)| {
                    Ok(DecisionFeedback {
                        decision_id,
                        actual_outcome: ActualOutcome {
                            success: success != 0,
                            duration,
                            resource_usage,
                            quality,
                        },
                        variance: serde_json::from_str(&variance)?,
                        lessons_learned: serde_json::from_str(&lessons)?,
                        timestamp: from_text(ts)?,
                    })
                },
            )
            .collect()
    }
}

fn lock_conn(conn: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>, StoreError> {
    conn.lock()
        .map_err(|_| StoreError::Unavailable("sqlite connection lock poisoned".to_string()))
}

const SELECT_DECISION: &str = r#"
    SELECT id, mission_id, objective_id, decision_type, status, context_json,
           options_json, recommended_option_json, reasoning, decision_chain_json,
           metadata_json, content_hash, previous_hash, signature, agent_pubkey,
           created_at, updated_at
    FROM strategic_decisions
"#;

fn map_decision_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<DecisionRow> {
    Ok(DecisionRow {
        id: row.get(0)?,
        mission_id: row.get(1)?,
        objective_id: row.get(2)?,
        decision_type: row.get(3)?,
        status: row.get(4)?,
        context_json: row.get(5)?,
        options_json: row.get(6)?,
        recommended_option_json: row.get(7)?,
        reasoning: row.get(8)?,
        decision_chain_json: row.get(9)?,
        metadata_json: row.get(10)?,
        content_hash: row.get(11)?,
        previous_hash: row.get(12)?,
        signature: row.get(13)?,
        agent_pubkey: row.get(14)?,
        created_at: row.get(15)?,
        updated_at: row.get(16)?,
    })
}

#[async_trait]
impl DecisionStore for SqliteStore {
    async fn insert_decision(&self, decision: &StrategicDecision) -> Result<(), StoreError> {
        let context_json = serde_json::to_string(&decision.context)?;
        let options_json = serde_json::to_string(&decision.options)?;
        let recommended_json = serde_json::to_string(&decision.recommended_option)?;
        let chain_json = serde_json::to_string(&decision.decision_chain)?;
        let metadata_json = decision
            .metadata
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let provenance = decision.provenance.clone();
        let id = decision.id.clone();
        let mission_id = decision.mission_id.clone();
        let objective_id = decision.objective_id.clone();
        let decision_type = decision.decision_type.as_str();
        let status = decision.status.as_str();
        let reasoning = decision.reasoning.clone();
        let created_at = timestamp(&decision.created_at);
        let updated_at = timestamp(&decision.updated_at);

        self.with_conn(move |conn| {
            let provenance = provenance.as_ref();
            conn.execute(
                r#"
                INSERT INTO strategic_decisions (
                    id, mission_id, objective_id, decision_type, status, context_json,
                    options_json, recommended_option_json, reasoning, decision_chain_json,
                    metadata_json, content_hash, previous_hash, signature, agent_pubkey,
                    created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
                "#,
                params![
                    id,
                    mission_id,
                    objective_id,
                    decision_type,
                    status,
                    context_json,
                    options_json,
                    recommended_json,
                    reasoning,
                    chain_json,
                    metadata_json,
                    provenance.map(|p| p.content_hash.as_str()),
                    provenance.and_then(|p| p.previous_hash.as_deref()),
                    provenance.map(|p| p.signature.as_str()),
                    provenance.map(|p| p.agent_pubkey.as_str()),
                    created_at,
                    updated_at,
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn update_status(
        &self,
        decision_id: &str,
        status: DecisionStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let decision_id = decision_id.to_string();
        let updated_at = timestamp(&updated_at);

        self.with_conn(move |conn| {
            conn.execute(
                "UPDATE strategic_decisions SET status = ?2, updated_at = ?3 WHERE id = ?1",
                params![decision_id, status.as_str(), updated_at],
            )?;
            Ok(())
        })
        .await
    }

    async fn insert_chain_steps(
        &self,
        decision_id: &str,
        steps: &[DecisionChainStep],
    ) -> Result<(), StoreError> {
        let decision_id = decision_id.to_string();
        let rows = steps
            .iter()
            .map(|step| {
                Ok((
                    step.step,
                    step.phase.clone(),
                    step.description.clone(),
                    serde_json::to_string(&step.inputs)?,
                    serde_json::to_string(&step.outputs)?,
                    step.reasoning.clone(),
                    timestamp(&step.timestamp),
                    step.duration_ms as i64,
                ))
            })
            .collect::<Result<Vec<_>, StoreError>>()?;

        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare(
                    r#"
                    INSERT INTO decision_chain_logs (
                        decision_id, step_number, phase, description, inputs_json,
                        outputs_json, reasoning, timestamp, duration_ms
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                    "#,
                )?;
                for (step, phase, description, inputs, outputs, reasoning, ts, duration) in &rows {
                    stmt.execute(params![
                        decision_id,
                        step,
                        phase,
                        description,
                        inputs,
                        outputs,
                        reasoning,
                        ts,
                        duration,
                    ])?;
                }
            }
            tx.commit()?;
            Ok(())
        })
        .await
    }

    async fn insert_feedback(&self, feedback: &DecisionFeedback) -> Result<(), StoreError> {
        let variance_json = serde_json::to_string(&feedback.variance)?;
        let lessons_json = serde_json::to_string(&feedback.lessons_learned)?;
        let decision_id = feedback.decision_id.clone();
        let actual = feedback.actual_outcome.clone();
        let created_at = timestamp(&feedback.timestamp);

        self.with_conn(move |conn| {
            conn.execute(
                r#"
                INSERT INTO decision_feedback (
                    decision_id, success, actual_duration, actual_resource_usage,
                    actual_quality, variance_json, lessons_json, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
                params![
                    decision_id,
                    actual.success as i32,
                    actual.duration,
                    actual.resource_usage,
                    actual.quality,
                    variance_json,
                    lessons_json,
                    created_at,
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn recent_decisions(&self, limit: usize) -> Result<Vec<StrategicDecision>, StoreError> {
        let rows = self
            .with_conn(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "{} ORDER BY created_at DESC LIMIT ?1",
                    SELECT_DECISION
                ))?;
                let rows = stmt
                    .query_map([limit as i64], map_decision_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await?;

        rows.into_iter().map(DecisionRow::into_decision).collect()
    }
}
