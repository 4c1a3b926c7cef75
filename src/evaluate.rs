//! Option evaluation: contextual score adjustment
//!
//! All modifiers are additive and independent, followed by one clamp, so
//! their order does not matter. Expected outcomes are never touched.

use crate::assess::assess_resource_availability;
use crate::heuristics::Heuristic;
use crate::types::{clamp_percent, DecisionContext, DecisionOption};

pub const URGENT_PRIORITY_THRESHOLD: i32 = 80;
pub const URGENT_TIME_BONUS: f64 = 10.0;
pub const SCARCITY_UTILIZATION_THRESHOLD: f64 = 80.0;
pub const SCARCITY_PENALTY: f64 = -15.0;
pub const STRONG_HISTORY_THRESHOLD: f64 = 0.8;
pub const STRONG_HISTORY_BONUS: f64 = 5.0;

/// Return re-scored copies of `options`
pub fn evaluate(options: &[DecisionOption], context: &DecisionContext) -> Vec<DecisionOption> {
    let resource_availability = assess_resource_availability(&context.available_resources);

    options
        .iter()
        .map(|option| {
            let adjustment = score_adjustment(option, context, resource_availability);
            DecisionOption {
                recommendation_score: clamp_percent(option.recommendation_score + adjustment),
                ..option.clone()
            }
        })
        .collect()
}

/// Sum of the contextual modifiers that apply to one option
pub fn score_adjustment(
    option: &DecisionOption,
    context: &DecisionContext,
    resource_availability: f64,
) -> f64 {
    let mut adjustment = 0.0;

    if context.objective.priority > URGENT_PRIORITY_THRESHOLD
        && option.embodies(Heuristic::TimeEfficiency)
    {
        adjustment += URGENT_TIME_BONUS;
    }

    if resource_availability < 0.5
        && option.expected_outcome.resource_utilization > SCARCITY_UTILIZATION_THRESHOLD
    {
        adjustment += SCARCITY_PENALTY;
    }

    if let Some(history) = &context.historical_data {
        if history.success_rate > STRONG_HISTORY_THRESHOLD {
            adjustment += STRONG_HISTORY_BONUS;
        }
    }

    adjustment
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assess::assess;
    use crate::generate::generate;
    use crate::types::{AvailableResources, HistoricalPerformance, MissionObjective};

    fn context(priority: i32, resources: AvailableResources) -> DecisionContext {
        DecisionContext {
            mission_id: "mission-3".to_string(),
            objective: MissionObjective {
                id: "obj-3".to_string(),
                mission_id: "mission-3".to_string(),
                objective: "Escort convoy through strait".to_string(),
                priority,
                target_date: None,
                constraints: vec![],
                success_criteria: vec![],
            },
            current_state: Default::default(),
            available_resources: resources,
            historical_data: None,
            environmental_factors: None,
        }
    }

    fn options_for(ctx: &DecisionContext) -> Vec<DecisionOption> {
        generate(ctx, &assess(ctx), &Heuristic::PRIORITY_ORDER, 6)
    }

    #[test]
    fn test_high_priority_boosts_time_efficiency() {
        let ctx = context(
            90,
            AvailableResources {
                budget: Some(100_000.0),
                ..Default::default()
            },
        );
        let generated = options_for(&ctx);
        let evaluated = evaluate(&generated, &ctx);

        for (before, after) in generated.iter().zip(&evaluated) {
            if before.embodies(Heuristic::TimeEfficiency) {
                assert_eq!(before.recommendation_score, 68.0);
                assert_eq!(after.recommendation_score, 78.0);
            } else {
                assert_eq!(after.recommendation_score, before.recommendation_score);
            }
        }
    }

    #[test]
    fn test_priority_80_is_not_urgent() {
        let ctx = context(80, AvailableResources::default());
        let generated = options_for(&ctx);
        let evaluated = evaluate(&generated, &ctx);
        assert_eq!(generated, evaluated);
    }

    #[test]
    fn test_scarcity_penalizes_heavy_utilization() {
        let ctx = context(
            50,
            AvailableResources {
                personnel: Some(0),
                ..Default::default()
            },
        );
        let generated = options_for(&ctx);
        let evaluated = evaluate(&generated, &ctx);

        for (before, after) in generated.iter().zip(&evaluated) {
            if before.expected_outcome.resource_utilization > 80.0 {
                assert_eq!(after.recommendation_score, before.recommendation_score - 15.0);
            } else {
                assert_eq!(after.recommendation_score, before.recommendation_score);
            }
        }
    }

    #[test]
    fn test_strong_history_is_flat_bonus() {
        let mut ctx = context(50, AvailableResources::default());
        ctx.historical_data = Some(HistoricalPerformance {
            similar_decisions: 10,
            success_rate: 0.85,
            average_completion_time: 12.0,
        });
        let generated = options_for(&ctx);
        let evaluated = evaluate(&generated, &ctx);
        for (before, after) in generated.iter().zip(&evaluated) {
            assert_eq!(after.recommendation_score, before.recommendation_score + 5.0);
        }
    }

    #[test]
    fn test_modifiers_accumulate_then_clamp() {
        let mut ctx = context(95, AvailableResources::default());
        ctx.historical_data = Some(HistoricalPerformance {
            similar_decisions: 10,
            success_rate: 0.95,
            average_completion_time: 12.0,
        });
        let mut option = options_for(&ctx)
            .into_iter()
            .find(|o| o.embodies(Heuristic::TimeEfficiency))
            .unwrap();
        option.recommendation_score = 97.0;

        let evaluated = evaluate(&[option.clone()], &ctx);
        assert_eq!(evaluated[0].recommendation_score, 100.0);

        option.recommendation_score = 2.0;
        ctx.objective.priority = 10;
        ctx.historical_data = None;
        ctx.available_resources.personnel = Some(0);
        let evaluated = evaluate(&[option], &ctx);
        assert_eq!(evaluated[0].recommendation_score, 0.0);
    }

    #[test]
    fn test_expected_outcome_untouched() {
        let ctx = context(
            95,
            AvailableResources {
                personnel: Some(0),
                ..Default::default()
            },
        );
        let generated = options_for(&ctx);
        let evaluated = evaluate(&generated, &ctx);
        for (before, after) in generated.iter().zip(&evaluated) {
            assert_eq!(before.expected_outcome, after.expected_outcome);
            assert_eq!(before.id, after.id);
            assert_eq!(before.confidence, after.confidence);
        }
    }
}
