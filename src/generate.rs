//! Option generation: one candidate strategy per heuristic
//!
//! Options are projected from the assessed baseline plus the archetype's
//! fixed deltas. Cost estimates scale off the available budget.

use crate::assess::ContextAssessment;
use crate::heuristics::Heuristic;
use crate::types::{DecisionContext, DecisionOption, ExpectedOutcome};

/// Default cap on generated options
pub const DEFAULT_OPTION_LIMIT: usize = 5;

/// Planning horizon used when neither a time budget nor history is known
pub const DEFAULT_BASE_DURATION_HOURS: f64 = 48.0;

/// Generate one option per heuristic, taking at most `limit` heuristics in
/// priority order regardless of how they were listed
pub fn generate(
    context: &DecisionContext,
    assessment: &ContextAssessment,
    heuristics: &[Heuristic],
    limit: usize,
) -> Vec<DecisionOption> {
    let baseline = Baseline::from_context(context, assessment);

    let mut ordered = heuristics.to_vec();
    ordered.sort_by_key(Heuristic::priority_rank);

    ordered
        .iter()
        .take(limit)
        .enumerate()
        .map(|(index, heuristic)| build_option(index, *heuristic, context, assessment, &baseline))
        .collect()
}

/// Situation-derived starting point shared by every archetype
#[derive(Debug, Clone, PartialEq)]
struct Baseline {
    success_probability: f64,
    risk_level: f64,
    duration_hours: f64,
    budget: Option<f64>,
}

impl Baseline {
    fn from_context(context: &DecisionContext, assessment: &ContextAssessment) -> Self {
        let mut success_probability = 70.0 + 20.0 * (assessment.resource_availability - 0.5)
            - 10.0 * assessment.constraint_severity;

        // Track record pulls the baseline toward what actually happened
        if let Some(history) = &context.historical_data {
            success_probability = success_probability * 0.7 + history.success_rate * 100.0 * 0.3;
        }

        let risk_level = 30.0
            + 10.0 * assessment.risk_factors.len() as f64
            + 10.0 * assessment.constraint_severity;

        let duration_hours = context
            .available_resources
            .time
            .filter(|t| *t > 0.0)
            .or_else(|| {
                context
                    .historical_data
                    .as_ref()
                    .map(|h| h.average_completion_time)
                    .filter(|t| *t > 0.0)
            })
            .unwrap_or(DEFAULT_BASE_DURATION_HOURS);

        Self {
            success_probability,
            risk_level,
            duration_hours,
            budget: context.available_resources.budget.filter(|b| *b > 0.0),
        }
    }
}

fn build_option(
    index: usize,
    heuristic: Heuristic,
    context: &DecisionContext,
    assessment: &ContextAssessment,
    baseline: &Baseline,
) -> DecisionOption {
    let archetype = heuristic.archetype();

    let expected_outcome = ExpectedOutcome {
        success_probability: baseline.success_probability + archetype.success_delta,
        estimated_duration: baseline.duration_hours * archetype.duration_factor,
        resource_utilization: archetype.resource_utilization,
        risk_level: baseline.risk_level + archetype.risk_delta,
        cost_estimate: baseline.budget.map(|b| b * archetype.budget_share),
        quality_score: archetype.quality_score,
        safety_score: archetype.safety_score,
    }
    .clamped();

    DecisionOption {
        id: format!("option-{}-{}", index + 1, heuristic.as_str()),
        name: archetype.name.to_string(),
        description: archetype.description.to_string(),
        heuristics: archetype.heuristics.to_vec(),
        reasoning: compose_reasoning(heuristic, context, assessment, &expected_outcome),
        expected_outcome,
        pros: archetype.pros.iter().map(|s| s.to_string()).collect(),
        cons: archetype.cons.iter().map(|s| s.to_string()).collect(),
        confidence: archetype.confidence,
        recommendation_score: archetype.base_score,
    }
}

fn compose_reasoning(
    heuristic: Heuristic,
    context: &DecisionContext,
    assessment: &ContextAssessment,
    outcome: &ExpectedOutcome,
) -> String {
    let archetype = heuristic.archetype();
    let mut reasoning = format!(
        "{} Built on the {} heuristic for \"{}\". \
        Resource availability {:.0}%, constraint severity {:.0}%, time urgency {:.0}%. \
        Projected success {:.0}% at risk level {:.0}% over {:.1} hours.",
        archetype.description,
        heuristic.as_str(),
        context.objective.objective,
        assessment.resource_availability * 100.0,
        assessment.constraint_severity * 100.0,
        assessment.time_urgency * 100.0,
        outcome.success_probability,
        outcome.risk_level,
        outcome.estimated_duration,
    );

    if !assessment.risk_factors.is_empty() {
        reasoning.push_str(&format!(
            " Identified risks: {}.",
            assessment.risk_factors.join("; ")
        ));
    }

    reasoning
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assess::assess;
    use crate::types::{AvailableResources, HistoricalPerformance, MissionObjective};

    fn context(resources: AvailableResources) -> DecisionContext {
        DecisionContext {
            mission_id: "mission-7".to_string(),
            objective: MissionObjective {
                id: "obj-7".to_string(),
                mission_id: "mission-7".to_string(),
                objective: "Clear harbour approach".to_string(),
                priority: 60,
                target_date: None,
                constraints: vec!["No night operations".to_string()],
                success_criteria: vec![],
            },
            current_state: Default::default(),
            available_resources: resources,
            historical_data: None,
            environmental_factors: None,
        }
    }

    #[test]
    fn test_one_option_per_heuristic_up_to_limit() {
        let ctx = context(AvailableResources::default());
        let assessment = assess(&ctx);

        let options = generate(&ctx, &assessment, &Heuristic::PRIORITY_ORDER, DEFAULT_OPTION_LIMIT);
        assert_eq!(options.len(), 5);
        assert_eq!(options[0].heuristics[0], Heuristic::RiskMinimization);
        assert_eq!(options[4].heuristics[0], Heuristic::QualityMaximization);

        let all = generate(&ctx, &assessment, &Heuristic::PRIORITY_ORDER, 10);
        assert_eq!(all.len(), 6);

        let none = generate(&ctx, &assessment, &Heuristic::PRIORITY_ORDER, 0);
        assert!(none.is_empty());
    }

    #[test]
    fn test_option_ids_unique_and_deterministic() {
        let ctx = context(AvailableResources::default());
        let assessment = assess(&ctx);
        let a = generate(&ctx, &assessment, &Heuristic::PRIORITY_ORDER, 6);
        let b = generate(&ctx, &assessment, &Heuristic::PRIORITY_ORDER, 6);

        let ids: Vec<_> = a.iter().map(|o| o.id.clone()).collect();
        let mut unique = ids.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(ids.len(), unique.len());
        assert_eq!(a, b);
        assert_eq!(a[2].id, "option-3-time_efficiency");
    }

    #[test]
    fn test_cost_scales_with_budget() {
        let ctx = context(AvailableResources {
            budget: Some(100_000.0),
            ..Default::default()
        });
        let assessment = assess(&ctx);
        let options = generate(&ctx, &assessment, &Heuristic::PRIORITY_ORDER, 6);

        let resource = options.iter().find(|o| o.heuristics[0] == Heuristic::ResourceOptimization).unwrap();
        let cost = options.iter().find(|o| o.heuristics[0] == Heuristic::CostReduction).unwrap();
        assert!((resource.expected_outcome.cost_estimate.unwrap() - 70_000.0).abs() < 1e-6);
        assert!((cost.expected_outcome.cost_estimate.unwrap() - 60_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_no_budget_means_no_cost_estimate() {
        let ctx = context(AvailableResources::default());
        let assessment = assess(&ctx);
        let options = generate(&ctx, &assessment, &Heuristic::PRIORITY_ORDER, 6);
        assert!(options.iter().all(|o| o.expected_outcome.cost_estimate.is_none()));
    }

    #[test]
    fn test_unrecognized_heuristic_becomes_balanced_option() {
        let ctx = context(AvailableResources::default());
        let assessment = assess(&ctx);
        let heuristics = vec![Heuristic::parse_lenient("innovation"), Heuristic::TimeEfficiency];
        let options = generate(&ctx, &assessment, &heuristics, 5);

        assert_eq!(options.len(), 2);
        assert_eq!(options[0].name, "Rapid Execution Plan");
        assert_eq!(options[1].name, "Balanced Strategy");
        assert_eq!(options[1].recommendation_score, 60.0);
    }

    #[test]
    fn test_limit_draws_in_priority_order() {
        let ctx = context(AvailableResources::default());
        let assessment = assess(&ctx);
        let listed = [
            Heuristic::SafetyPriority,
            Heuristic::TimeEfficiency,
            Heuristic::RiskMinimization,
        ];
        let options = generate(&ctx, &assessment, &listed, 2);

        let names: Vec<_> = options.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["Risk-Averse Approach", "Rapid Execution Plan"]);
    }

    #[test]
    fn test_archetype_scores_carried_over() {
        let ctx = context(AvailableResources::default());
        let assessment = assess(&ctx);
        let options = generate(&ctx, &assessment, &[Heuristic::TimeEfficiency], 5);
        assert_eq!(options[0].recommendation_score, 68.0);
        assert_eq!(options[0].confidence, 70.0);
        assert_eq!(options[0].heuristics, vec![Heuristic::TimeEfficiency]);
    }

    #[test]
    fn test_duration_uses_time_budget_then_history() {
        let ctx = context(AvailableResources {
            time: Some(100.0),
            ..Default::default()
        });
        let options = generate(&ctx, &assess(&ctx), &[Heuristic::TimeEfficiency], 1);
        assert!((options[0].expected_outcome.estimated_duration - 70.0).abs() < 1e-9);

        let mut ctx = context(AvailableResources::default());
        ctx.historical_data = Some(HistoricalPerformance {
            similar_decisions: 3,
            success_rate: 0.9,
            average_completion_time: 20.0,
        });
        let options = generate(&ctx, &assess(&ctx), &[Heuristic::Balanced], 1);
        assert!((options[0].expected_outcome.estimated_duration - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_outcomes_stay_in_range_under_pressure() {
        let mut ctx = context(AvailableResources {
            personnel: Some(0),
            budget: Some(0.0),
            equipment: Some(vec![]),
            time: Some(0.0),
        });
        ctx.objective.constraints = (0..10).map(|i| i.to_string()).collect();
        ctx.historical_data = Some(HistoricalPerformance {
            similar_decisions: 1,
            success_rate: 0.0,
            average_completion_time: 0.0,
        });
        let options = generate(&ctx, &assess(&ctx), &Heuristic::PRIORITY_ORDER, 6);
        for o in options {
            let e = &o.expected_outcome;
            assert!((0.0..=100.0).contains(&e.success_probability));
            assert!((0.0..=100.0).contains(&e.risk_level));
            assert!((0.0..=100.0).contains(&e.resource_utilization));
        }
    }
}
