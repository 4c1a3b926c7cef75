//! Confidence-weighted selection

use crate::error::{EngineError, EngineResult};
use crate::types::DecisionOption;

/// Pick the option maximizing `score * confidence / 100`.
/// Ties keep the earliest option in list order.
pub fn select(options: &[DecisionOption]) -> EngineResult<&DecisionOption> {
    let mut iter = options.iter();
    let mut best = iter.next().ok_or(EngineError::EmptyOptionSet)?;
    let mut best_key = best.weighted_score();

    for option in iter {
        let key = option.weighted_score();
        // Strictly greater: an equal key never displaces an earlier option
        if key > best_key {
            best = option;
            best_key = key;
        }
    }

    Ok(best)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heuristics::Heuristic;
    use crate::types::ExpectedOutcome;

    fn option(id: &str, score: f64, confidence: f64) -> DecisionOption {
        DecisionOption {
            id: id.to_string(),
            name: id.to_string(),
            description: String::new(),
            heuristics: vec![Heuristic::Balanced],
            expected_outcome: ExpectedOutcome {
                success_probability: 50.0,
                estimated_duration: 10.0,
                resource_utilization: 50.0,
                risk_level: 50.0,
                cost_estimate: None,
                quality_score: None,
                safety_score: None,
            },
            reasoning: String::new(),
            pros: vec![],
            cons: vec![],
            confidence,
            recommendation_score: score,
        }
    }

    #[test]
    fn test_empty_is_an_error() {
        assert!(matches!(select(&[]), Err(EngineError::EmptyOptionSet)));
    }

    #[test]
    fn test_confidence_weighting_beats_raw_score() {
        // 90 * 0.5 = 45 vs 70 * 0.8 = 56
        let options = vec![option("bold", 90.0, 50.0), option("steady", 70.0, 80.0)];
        assert_eq!(select(&options).unwrap().id, "steady");
    }

    #[test]
    fn test_tie_keeps_first() {
        // 80 * 0.5 == 40 * 1.0
        let options = vec![
            option("a", 80.0, 50.0),
            option("b", 40.0, 100.0),
            option("c", 10.0, 10.0),
        ];
        assert_eq!(select(&options).unwrap().id, "a");
    }

    #[test]
    fn test_selection_is_deterministic() {
        let options = vec![
            option("x", 60.0, 70.0),
            option("y", 75.0, 85.0),
            option("z", 75.0, 85.0),
        ];
        let first = select(&options).unwrap().id.clone();
        for _ in 0..10 {
            assert_eq!(select(&options).unwrap().id, first);
        }
        assert_eq!(first, "y");
    }

    #[test]
    fn test_single_option() {
        let options = vec![option("only", 0.0, 0.0)];
        assert_eq!(select(&options).unwrap().id, "only");
    }
}
