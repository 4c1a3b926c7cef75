//! strategos - strategic decision reasoning from the command line
//!
//! Run with: strategos analyze context.json
//!
//! Decisions, chain logs and feedback live in a SQLite file under the user
//! data dir. Set STRATEGOS_LOG (e.g. `info`, `strategos=debug`) for logs.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use strategos::{
    db::SqliteStore,
    outcome,
    provenance::Provenance,
    types::*,
    DecisionOutcome, ReasoningConfig, ReasoningEngine,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let mut args: Vec<String> = std::env::args().collect();
    let config = take_config(&mut args)?;

    if args.len() < 2 {
        print_usage();
        return Ok(());
    }

    match args[1].as_str() {
        "analyze" => {
            // analyze <context.json> [--json]
            let Some(path) = args.get(2).filter(|a| !a.starts_with("--")) else {
                bail!("Usage: strategos analyze <context.json> [--json]");
            };
            let json_output = args.iter().any(|a| a == "--json");
            run_analyze(Path::new(path), json_output, config).await
        }
        "status" => {
            // status <decision-id> <status>
            let (Some(id), Some(status)) = (args.get(2), args.get(3)) else {
                bail!("Usage: strategos status <decision-id> <proposed|approved|rejected|executing|completed|failed>");
            };
            let Some(status) = DecisionStatus::parse(status) else {
                bail!("Unknown status: {}", status);
            };
            run_status(id, status, config).await
        }
        "feedback" => run_feedback(&args[2..], config).await,
        "history" => {
            // history [mission-id] [--limit=N]
            let mission = args.get(2).filter(|a| !a.starts_with("--")).cloned();
            let limit = args
                .iter()
                .find_map(|a| a.strip_prefix("--limit="))
                .and_then(|n| n.parse().ok())
                .unwrap_or(20);
            run_history(mission.as_deref(), limit, config).await
        }
        "show" => {
            let Some(id) = args.get(2) else {
                bail!("Usage: strategos show <decision-id>");
            };
            run_show(id)
        }
        "audit" => run_audit(args.get(2).map(|s| s.as_str()), config).await,
        "--stats" => run_stats(),
        "--config-defaults" => {
            println!("{}", serde_json::to_string_pretty(&ReasoningConfig::default())?);
            Ok(())
        }
        "--help" | "-h" | "help" => {
            print_usage();
            Ok(())
        }
        other => bail!("Unknown command: {}. Try --help", other),
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_env("STRATEGOS_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Pull `--config <path>` (or `--config=<path>`) out of the argument list
fn take_config(args: &mut Vec<String>) -> Result<ReasoningConfig> {
    let mut path: Option<String> = None;

    if let Some(i) = args.iter().position(|a| a == "--config") {
        if i + 1 >= args.len() {
            bail!("--config needs a path");
        }
        path = Some(args.remove(i + 1));
        args.remove(i);
    } else if let Some(i) = args.iter().position(|a| a.starts_with("--config=")) {
        path = args.remove(i).strip_prefix("--config=").map(|s| s.to_string());
    }

    match path {
        Some(p) => ReasoningConfig::from_file(Path::new(&p)),
        None => Ok(ReasoningConfig::default()),
    }
}

fn get_data_dir() -> Result<PathBuf> {
    // XDG data dir on Linux, ~/Library/Application Support on macOS
    let base = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
    Ok(base.join("strategos"))
}

fn open_store() -> Result<Arc<SqliteStore>> {
    let data_dir = get_data_dir()?;
    std::fs::create_dir_all(&data_dir)?;
    let db_path = data_dir.join("decisions.db");
    let store = SqliteStore::open(&db_path)
        .with_context(|| format!("Failed to open database at {:?}", db_path))?;
    tracing::info!(path = ?db_path, "Database opened");
    Ok(Arc::new(store))
}

async fn open_engine(config: ReasoningConfig) -> Result<ReasoningEngine> {
    let store = open_store()?;
    let key_path = get_data_dir()?.join("agent.key");
    let provenance = Provenance::init(&key_path)?;
    tracing::info!(pubkey = %provenance.public_key_hex(), "Provenance initialized");

    Ok(ReasoningEngine::open(store, config)
        .await
        .with_provenance(provenance))
}

async fn run_analyze(path: &Path, json_output: bool, config: ReasoningConfig) -> Result<()> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read context from {:?}", path))?;
    let context: DecisionContext =
        serde_json::from_str(&raw).with_context(|| format!("Invalid context JSON in {:?}", path))?;

    let threshold = config.min_confidence_threshold;
    let engine = open_engine(config).await?;
    let outcome = engine.analyze_and_decide(context).await?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    print_decision_outcome(&outcome, threshold);
    Ok(())
}

fn print_decision_outcome(outcome: &DecisionOutcome, threshold: f64) {
    let decision = &outcome.decision;

    println!("{}", decision.reasoning);
    println!("────────────────────────────────────────");
    println!("Decision:  {}", decision.id);
    println!("Type:      {}", decision.decision_type.as_str());
    println!("Status:    {}", decision.status.as_str());
    if !decision.meets_confidence_threshold(threshold) {
        println!(
            "Note:      confidence {:.0}% is below the {:.0}% threshold, review before approving",
            decision.recommended_option.confidence, threshold
        );
    }
    print_persistence(&outcome.persistence);
}

fn print_persistence(persistence: &PersistenceStatus) {
    match persistence {
        PersistenceStatus::Saved => println!("Saved:     yes"),
        PersistenceStatus::NotSaved { reason } => {
            println!("Saved:     NO (computed but not saved: {})", reason)
        }
    }
}

async fn run_status(id: &str, status: DecisionStatus, config: ReasoningConfig) -> Result<()> {
    let engine = open_engine(config).await?;
    let outcome = engine.update_status(id, status).await?;
    println!(
        "Decision {} is now {}",
        outcome.decision.id,
        outcome.decision.status.as_str()
    );
    print_persistence(&outcome.persistence);
    Ok(())
}

async fn run_feedback(args: &[String], config: ReasoningConfig) -> Result<()> {
    if args.is_empty() {
        println!("Usage: strategos feedback <decision-id> --success|--failed --duration <hours> --resources <pct> [--quality <pct>] [--lesson \"...\"]...\n");
        println!("Examples:");
        println!("  strategos feedback 1b4e... --success --duration 52 --resources 68 --quality 85");
        println!("  strategos feedback 1b4e... --failed --duration 90 --resources 95 --lesson \"Fuel estimate too low\"");
        return Ok(());
    }

    let decision_id = &args[0];
    let mut success: Option<bool> = None;
    let mut duration: Option<f64> = None;
    let mut resources: Option<f64> = None;
    let mut quality: Option<f64> = None;
    let mut lessons: Vec<String> = vec![];

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--success" => success = Some(true),
            "--failed" | "--failure" => success = Some(false),
            "--duration" | "--resources" | "--quality" | "--lesson" => {
                let Some(value) = args.get(i + 1) else {
                    bail!("{} needs a value", args[i]);
                };
                match args[i].as_str() {
                    "--duration" => duration = Some(parse_number("--duration", value)?),
                    "--resources" => resources = Some(parse_number("--resources", value)?),
                    "--quality" => quality = Some(parse_number("--quality", value)?),
                    _ => lessons.push(value.clone()),
                }
                i += 1;
            }
            other => bail!("Unknown feedback option: {}", other),
        }
        i += 1;
    }

    let (Some(success), Some(duration), Some(resource_usage)) = (success, duration, resources)
    else {
        bail!("feedback needs --success|--failed, --duration and --resources");
    };

    let engine = open_engine(config).await?;
    let outcome = engine
        .record_feedback(
            decision_id,
            ActualOutcome {
                success,
                duration,
                resource_usage,
                quality,
            },
            lessons,
        )
        .await?;

    let variance = &outcome.feedback.variance;
    println!(
        "Decision {} marked {}",
        outcome.decision.id,
        outcome.decision.status.as_str()
    );
    println!("Duration variance:  {:+.1}h", variance.duration);
    println!("Resource variance:  {:+.1}%", variance.resource_usage);
    if let Some(q) = variance.quality {
        println!("Quality variance:   {:+.1}%", q);
    }
    print_persistence(&outcome.persistence);
    Ok(())
}

fn parse_number(flag: &str, value: &str) -> Result<f64> {
    value
        .parse()
        .with_context(|| format!("{} expects a number, got {:?}", flag, value))
}

async fn run_history(mission: Option<&str>, limit: usize, config: ReasoningConfig) -> Result<()> {
    let engine = open_engine(config).await?;
    let decisions = match mission {
        Some(m) => {
            let mut d = engine.decisions_for_mission(m).await;
            d.truncate(limit);
            d
        }
        None => engine.recent_decisions(limit).await,
    };

    if decisions.is_empty() {
        println!("No decisions recorded.");
        return Ok(());
    }

    for d in &decisions {
        println!(
            "{}  {}  {:<11} {:<9} {} ({:.1})",
            d.created_at.format("%Y-%m-%d %H:%M"),
            d.id,
            d.decision_type.as_str(),
            d.status.as_str(),
            d.recommended_option.name,
            d.recommended_option.recommendation_score,
        );
    }

    if let Some(m) = mission {
        if let Some(perf) = engine.historical_performance(m).await {
            println!(
                "\nTrack record: {} outcomes, {:.0}% success, {:.1}h average",
                perf.similar_decisions,
                perf.success_rate * 100.0,
                perf.average_completion_time
            );
        }
    }
    Ok(())
}

fn run_show(id: &str) -> Result<()> {
    let store = open_store()?;
    let Some(decision) = store.decision(id)? else {
        bail!("Unknown decision: {}", id);
    };

    println!("{}", decision.reasoning);
    println!(
        "### Decision Chain ({}, {}ms)",
        decision.status.as_str(),
        decision.pipeline_duration_ms()
    );
    for step in store.chain_log(id)? {
        println!(
            "{}. [{}ms] {}: {}",
            step.step, step.duration_ms, step.phase, step.reasoning
        );
    }
    Ok(())
}

async fn run_audit(id: Option<&str>, config: ReasoningConfig) -> Result<()> {
    let engine = open_engine(config).await?;

    match id {
        Some(id) => {
            let report = engine.audit(id).await?;
            if report.valid {
                println!("✓ Decision {} is intact", report.decision_id);
            } else {
                println!("✗ Decision {} failed audit:", report.decision_id);
                for e in &report.errors {
                    println!("  - {}", e);
                }
            }
        }
        None => {
            let result = engine.verify_chain().await;
            if result.valid {
                println!("✓ Provenance chain intact ({} decisions)", result.chain_length);
            } else {
                println!("✗ Provenance chain broken:");
                for e in &result.errors {
                    println!("  - {}", e);
                }
            }
        }
    }
    Ok(())
}

fn run_stats() -> Result<()> {
    let store = open_store()?;
    let feedback = store.all_feedback()?;

    let mut decisions = std::collections::HashMap::new();
    for fb in &feedback {
        if !decisions.contains_key(&fb.decision_id) {
            if let Some(d) = store.decision(&fb.decision_id)? {
                decisions.insert(fb.decision_id.clone(), d);
            }
        }
    }

    let stats =
        outcome::learning_stats(feedback.iter().map(|fb| (fb, decisions.get(&fb.decision_id))));

    println!("Feedback recorded:   {}", stats.total_feedback);
    if stats.total_feedback == 0 {
        return Ok(());
    }
    println!("Success rate:        {:.0}%", stats.success_rate * 100.0);
    println!("Duration variance:   {:+.1}h (mean)", stats.mean_duration_variance);
    println!("Resource variance:   {:+.1}% (mean)", stats.mean_resource_variance);
    println!("\nBy recommended heuristic:");
    for (heuristic, s) in &stats.by_heuristic {
        println!(
            "  {:<22} {:>3} outcomes, {:.0}% success",
            heuristic,
            s.outcomes,
            s.success_rate * 100.0
        );
    }
    Ok(())
}

fn print_usage() {
    println!("strategos - strategic decision reasoning\n");
    println!("Usage:");
    println!("  strategos analyze <context.json> [--json]   Analyze a mission context");
    println!("  strategos status <id> <status>              Move a decision through its lifecycle");
    println!("  strategos feedback <id> --success|--failed --duration <h> --resources <pct>");
    println!("  strategos history [mission-id] [--limit=N]  List recent decisions");
    println!("  strategos show <id>                         Explanation and chain log");
    println!("  strategos audit [id]                        Verify provenance");
    println!("  strategos --stats                           Learning statistics");
    println!("  strategos --config-defaults                 Print the default config");
    println!("\nOptions:");
    println!("  --config <path>   JSON config file (missing keys keep defaults)");
}
