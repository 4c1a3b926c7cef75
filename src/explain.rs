//! Explanation builder: auditable narrative of a pipeline run
//!
//! Pure text composition. Identical inputs produce byte-identical output,
//! which is what makes audit replay and golden files work.

use crate::types::{DecisionChainStep, DecisionContext, DecisionOption, ExpectedOutcome};
use std::fmt::{self, Write};

/// How many non-recommended options are described
pub const MAX_ALTERNATIVES: usize = 2;

const NOT_AVAILABLE: &str = "N/A";

/// Render the full explanation for a recommendation
pub fn build(
    context: &DecisionContext,
    options: &[DecisionOption],
    recommended: &DecisionOption,
    chain: &[DecisionChainStep],
) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail
    let _ = render(&mut out, context, options, recommended, chain);
    out
}

fn render(
    out: &mut String,
    context: &DecisionContext,
    options: &[DecisionOption],
    recommended: &DecisionOption,
    chain: &[DecisionChainStep],
) -> fmt::Result {
    let objective = &context.objective;

    writeln!(out, "## Strategic Decision Analysis")?;
    writeln!(out)?;

    writeln!(out, "### Objective")?;
    writeln!(out, "{}", objective.objective)?;
    writeln!(out, "Priority: {}/100", objective.priority)?;
    if objective.constraints.is_empty() {
        writeln!(out, "Constraints: None")?;
    } else {
        writeln!(out, "Constraints: {}", objective.constraints.join(", "))?;
    }
    writeln!(out)?;

    let total_ms = crate::chain::elapsed_ms(chain);
    writeln!(out, "### Analysis Process")?;
    writeln!(
        out,
        "Evaluated {} strategic options through a {}-step reasoning chain.",
        options.len(),
        chain.len()
    )?;
    writeln!(out, "Total analysis time: {}ms", total_ms)?;
    writeln!(out)?;

    writeln!(out, "### Recommended Strategy: {}", recommended.name)?;
    writeln!(out, "Confidence: {:.0}%", recommended.confidence)?;
    writeln!(
        out,
        "Recommendation Score: {:.1}/100",
        recommended.recommendation_score
    )?;
    writeln!(out)?;
    writeln!(out, "{}", recommended.reasoning)?;
    writeln!(out)?;

    write_expected_outcome(out, &recommended.expected_outcome)?;

    writeln!(out, "### Advantages")?;
    for pro in &recommended.pros {
        writeln!(out, "- {}", pro)?;
    }
    writeln!(out)?;

    writeln!(out, "### Considerations")?;
    for con in &recommended.cons {
        writeln!(out, "- {}", con)?;
    }

    let alternatives: Vec<&DecisionOption> = options
        .iter()
        .filter(|o| o.id != recommended.id)
        .take(MAX_ALTERNATIVES)
        .collect();

    if !alternatives.is_empty() {
        writeln!(out)?;
        writeln!(out, "### Alternative Options")?;
        for (i, alt) in alternatives.iter().enumerate() {
            writeln!(
                out,
                "{}. {} (Score: {:.1}/100, Confidence: {:.0}%)",
                i + 1,
                alt.name,
                alt.recommendation_score,
                alt.confidence
            )?;
            writeln!(out, "   {}", alt.reasoning)?;
        }
    }

    Ok(())
}

fn write_expected_outcome(out: &mut String, outcome: &ExpectedOutcome) -> fmt::Result {
    writeln!(out, "### Expected Outcomes")?;
    writeln!(
        out,
        "- Success Probability: {:.0}%",
        outcome.success_probability
    )?;
    writeln!(
        out,
        "- Estimated Duration: {:.1} hours",
        outcome.estimated_duration
    )?;
    writeln!(
        out,
        "- Resource Utilization: {:.0}%",
        outcome.resource_utilization
    )?;
    writeln!(out, "- Risk Level: {:.0}%", outcome.risk_level)?;
    writeln!(
        out,
        "- Cost Estimate: {}",
        outcome
            .cost_estimate
            .map(|c| format!("{:.2}", c))
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    )?;
    writeln!(out, "- Quality Score: {}", percent_or_na(outcome.quality_score))?;
    writeln!(out, "- Safety Score: {}", percent_or_na(outcome.safety_score))?;
    writeln!(out)
}

fn percent_or_na(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.0}%", v),
        None => NOT_AVAILABLE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assess::assess;
    use crate::chain::ChainRecorder;
    use crate::generate::generate;
    use crate::heuristics::Heuristic;
    use crate::types::{AvailableResources, MissionObjective};
    use serde_json::json;

    fn context(constraints: Vec<&str>, budget: Option<f64>) -> DecisionContext {
        DecisionContext {
            mission_id: "mission-9".to_string(),
            objective: MissionObjective {
                id: "obj-9".to_string(),
                mission_id: "mission-9".to_string(),
                objective: "Recover drifting buoy array".to_string(),
                priority: 70,
                target_date: None,
                constraints: constraints.into_iter().map(String::from).collect(),
                success_criteria: vec![],
            },
            current_state: Default::default(),
            available_resources: AvailableResources {
                budget,
                ..Default::default()
            },
            historical_data: None,
            environmental_factors: None,
        }
    }

    fn fixed_chain(n: usize, last_ms: u64) -> Vec<crate::types::DecisionChainStep> {
        let mut chain = ChainRecorder::new();
        for i in 0..n {
            chain.record("phase", "step", &json!(i), &json!(i), "");
        }
        let mut steps = chain.into_steps();
        if let Some(last) = steps.last_mut() {
            last.duration_ms = last_ms;
        }
        steps
    }

    #[test]
    fn test_sections_present() {
        let ctx = context(vec!["Daylight only", "Max 3 vessels"], Some(50_000.0));
        let options = generate(&ctx, &assess(&ctx), &Heuristic::PRIORITY_ORDER, 5);
        let chain = fixed_chain(4, 17);
        let text = build(&ctx, &options, &options[0], &chain);

        assert!(text.contains("Recover drifting buoy array"));
        assert!(text.contains("Priority: 70/100"));
        assert!(text.contains("Constraints: Daylight only, Max 3 vessels"));
        assert!(text.contains("Evaluated 5 strategic options through a 4-step reasoning chain."));
        assert!(text.contains("Total analysis time: 17ms"));
        assert!(text.contains("### Recommended Strategy: Risk-Averse Approach"));
        assert!(text.contains("Confidence: 85%"));
        assert!(text.contains("Recommendation Score: 75.0/100"));
        assert!(text.contains("- Cost Estimate: 45000.00"));
        assert!(text.contains("### Advantages"));
        assert!(text.contains("### Considerations"));
    }

    #[test]
    fn test_missing_optionals_render_na() {
        let ctx = context(vec![], None);
        let options = generate(&ctx, &assess(&ctx), &[Heuristic::TimeEfficiency], 1);
        let text = build(&ctx, &options, &options[0], &[]);

        assert!(text.contains("Constraints: None"));
        assert!(text.contains("- Cost Estimate: N/A"));
        assert!(text.contains("- Safety Score: N/A"));
        assert!(text.contains("- Quality Score: 70%"));
        assert!(text.contains("Total analysis time: 0ms"));
        assert!(!text.contains("### Alternative Options"));
    }

    #[test]
    fn test_at_most_two_alternatives_excluding_recommended() {
        let ctx = context(vec![], None);
        let options = generate(&ctx, &assess(&ctx), &Heuristic::PRIORITY_ORDER, 5);
        let recommended = &options[1];
        let text = build(&ctx, &options, recommended, &fixed_chain(4, 3));

        let alt_section = text.split("### Alternative Options").nth(1).unwrap();
        assert!(alt_section.contains("1. Risk-Averse Approach"));
        assert!(alt_section.contains("2. Rapid Execution Plan"));
        assert!(!alt_section.contains("Cost-Minimal Strategy"));
        assert!(!alt_section.contains(&recommended.name));
    }

    #[test]
    fn test_build_is_byte_identical() {
        let ctx = context(vec!["Fuel cap"], Some(12_345.0));
        let options = generate(&ctx, &assess(&ctx), &Heuristic::PRIORITY_ORDER, 5);
        let chain = fixed_chain(4, 9);

        let first = build(&ctx, &options, &options[2], &chain);
        for _ in 0..5 {
            assert_eq!(build(&ctx, &options, &options[2], &chain), first);
        }
    }

    #[test]
    fn test_full_layout() {
        let ctx = context(vec![], None);
        let option = DecisionOption {
            id: "opt".to_string(),
            name: "Direct Tow".to_string(),
            description: String::new(),
            heuristics: vec![Heuristic::TimeEfficiency],
            expected_outcome: ExpectedOutcome {
                success_probability: 72.0,
                estimated_duration: 6.5,
                resource_utilization: 40.0,
                risk_level: 30.0,
                cost_estimate: Some(900.0),
                quality_score: None,
                safety_score: Some(88.0),
            },
            reasoning: "Shortest path to the array.".to_string(),
            pros: vec!["Fast".to_string()],
            cons: vec!["Weather exposure".to_string()],
            confidence: 65.0,
            recommendation_score: 70.5,
        };
        let text = build(&ctx, &[option.clone()], &option, &fixed_chain(2, 5));

        let expected = "\
## Strategic Decision Analysis

### Objective
Recover drifting buoy array
Priority: 70/100
Constraints: None

### Analysis Process
Evaluated 1 strategic options through a 2-step reasoning chain.
Total analysis time: 5ms

### Recommended Strategy: Direct Tow
Confidence: 65%
Recommendation Score: 70.5/100

Shortest path to the array.

### Expected Outcomes
- Success Probability: 72%
- Estimated Duration: 6.5 hours
- Resource Utilization: 40%
- Risk Level: 30%
- Cost Estimate: 900.00
- Quality Score: N/A
- Safety Score: 88%

### Advantages
- Fast

### Considerations
- Weather exposure
";
        assert_eq!(text, expected);
    }
}
