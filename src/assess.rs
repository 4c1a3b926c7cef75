//! Context assessment: raw mission context to normalized signals
//!
//! Pure and infallible. Missing inputs resolve to neutral values.

use crate::types::{AvailableResources, DecisionContext};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const RISK_LIMITED_RESOURCES: &str = "Limited resource availability";
pub const RISK_TIME_PRESSURE: &str = "High time pressure";
pub const RISK_MANY_CONSTRAINTS: &str = "Multiple constraints to satisfy";
pub const RISK_WEAK_TRACK_RECORD: &str = "Below-average historical success rate";

/// Normalized situational signals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextAssessment {
    /// 0.0-1.0
    pub resource_availability: f64,
    /// 0.0-1.0
    pub constraint_severity: f64,
    /// 0.0-1.0
    pub time_urgency: f64,
    pub risk_factors: Vec<String>,
}

/// Assess a context against the current wall clock
pub fn assess(context: &DecisionContext) -> ContextAssessment {
    assess_at(context, Utc::now())
}

/// Assess a context as of `now`
pub fn assess_at(context: &DecisionContext, now: DateTime<Utc>) -> ContextAssessment {
    let resource_availability = assess_resource_availability(&context.available_resources);
    let constraint_count = context.objective.constraints.len();
    let constraint_severity = assess_constraint_severity(constraint_count);
    let time_urgency = assess_time_urgency(context.objective.target_date, now);

    let mut risk_factors = Vec::new();
    if resource_availability < 0.5 {
        risk_factors.push(RISK_LIMITED_RESOURCES.to_string());
    }
    if time_urgency > 0.7 {
        risk_factors.push(RISK_TIME_PRESSURE.to_string());
    }
    if constraint_count > 3 {
        risk_factors.push(RISK_MANY_CONSTRAINTS.to_string());
    }
    if let Some(history) = &context.historical_data {
        if history.success_rate < 0.7 {
            risk_factors.push(RISK_WEAK_TRACK_RECORD.to_string());
        }
    }

    ContextAssessment {
        resource_availability,
        constraint_severity,
        time_urgency,
        risk_factors,
    }
}

/// Fraction of the known resource fields that are actually available.
/// 0.5 when nothing is known.
pub fn assess_resource_availability(resources: &AvailableResources) -> f64 {
    if resources.is_empty() {
        return 0.5;
    }

    let mut indicators: Vec<f64> = Vec::with_capacity(4);

    if let Some(personnel) = resources.personnel {
        indicators.push(if personnel > 0 { 1.0 } else { 0.0 });
    }
    if let Some(budget) = resources.budget {
        indicators.push(if budget > 0.0 { 1.0 } else { 0.0 });
    }
    if let Some(equipment) = &resources.equipment {
        indicators.push(if equipment.is_empty() { 0.0 } else { 1.0 });
    }
    if let Some(time) = resources.time {
        indicators.push(if time > 0.0 { 1.0 } else { 0.0 });
    }

    indicators.iter().sum::<f64>() / indicators.len() as f64
}

pub fn assess_constraint_severity(constraint_count: usize) -> f64 {
    (constraint_count as f64 / 5.0).min(1.0)
}

/// Staircase on days remaining. 0.5 without a target date.
pub fn assess_time_urgency(target_date: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
    let Some(target) = target_date else {
        return 0.5;
    };

    let days = days_until(target, now);
    if days < 1.0 {
        1.0
    } else if days < 7.0 {
        0.8
    } else if days < 30.0 {
        0.5
    } else {
        0.2
    }
}

/// Fractional days from `now` to `target`, negative when overdue
pub fn days_until(target: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    (target - now).num_milliseconds() as f64 / 86_400_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{HistoricalPerformance, MissionObjective};
    use chrono::Duration;

    fn context(constraints: usize) -> DecisionContext {
        DecisionContext {
            mission_id: "mission-1".to_string(),
            objective: MissionObjective {
                id: "obj-1".to_string(),
                mission_id: "mission-1".to_string(),
                objective: "Reposition survey vessel".to_string(),
                priority: 50,
                target_date: None,
                constraints: (0..constraints).map(|i| format!("constraint {}", i)).collect(),
                success_criteria: vec![],
            },
            current_state: Default::default(),
            available_resources: AvailableResources::default(),
            historical_data: None,
            environmental_factors: None,
        }
    }

    // =========================================================================
    // resource availability
    // =========================================================================

    #[test]
    fn test_resource_availability_empty_is_neutral() {
        assert_eq!(assess_resource_availability(&AvailableResources::default()), 0.5);
    }

    #[test]
    fn test_resource_availability_all_present() {
        let resources = AvailableResources {
            personnel: Some(12),
            budget: Some(50_000.0),
            equipment: Some(vec!["ROV".to_string()]),
            time: Some(72.0),
        };
        assert_eq!(assess_resource_availability(&resources), 1.0);
    }

    #[test]
    fn test_resource_availability_only_counts_present_fields() {
        let resources = AvailableResources {
            personnel: Some(0),
            budget: Some(1000.0),
            equipment: None,
            time: None,
        };
        assert_eq!(assess_resource_availability(&resources), 0.5);

        let resources = AvailableResources {
            personnel: Some(0),
            budget: Some(0.0),
            equipment: Some(vec![]),
            time: Some(10.0),
        };
        assert_eq!(assess_resource_availability(&resources), 0.25);
    }

    // =========================================================================
    // constraints and urgency
    // =========================================================================

    #[test]
    fn test_constraint_severity_caps_at_one() {
        assert_eq!(assess_constraint_severity(0), 0.0);
        assert_eq!(assess_constraint_severity(2), 0.4);
        assert_eq!(assess_constraint_severity(5), 1.0);
        assert_eq!(assess_constraint_severity(9), 1.0);
    }

    #[test]
    fn test_time_urgency_staircase() {
        let now = Utc::now();
        assert_eq!(assess_time_urgency(None, now), 0.5);
        assert_eq!(assess_time_urgency(Some(now + Duration::hours(12)), now), 1.0);
        assert_eq!(assess_time_urgency(Some(now - Duration::days(2)), now), 1.0);
        assert_eq!(assess_time_urgency(Some(now + Duration::days(3)), now), 0.8);
        assert_eq!(assess_time_urgency(Some(now + Duration::days(14)), now), 0.5);
        assert_eq!(assess_time_urgency(Some(now + Duration::days(90)), now), 0.2);
    }

    // =========================================================================
    // risk factors
    // =========================================================================

    #[test]
    fn test_risk_factors_neutral_context() {
        let assessment = assess(&context(0));
        assert!(assessment.risk_factors.is_empty());
        assert_eq!(assessment.time_urgency, 0.5);
        assert_eq!(assessment.resource_availability, 0.5);
    }

    #[test]
    fn test_risk_factors_all_triggered() {
        let now = Utc::now();
        let mut ctx = context(4);
        ctx.objective.target_date = Some(now + Duration::hours(6));
        ctx.available_resources.personnel = Some(0);
        ctx.historical_data = Some(HistoricalPerformance {
            similar_decisions: 8,
            success_rate: 0.5,
            average_completion_time: 30.0,
        });

        let assessment = assess_at(&ctx, now);
        assert_eq!(
            assessment.risk_factors,
            vec![
                RISK_LIMITED_RESOURCES.to_string(),
                RISK_TIME_PRESSURE.to_string(),
                RISK_MANY_CONSTRAINTS.to_string(),
                RISK_WEAK_TRACK_RECORD.to_string(),
            ]
        );
    }

    #[test]
    fn test_three_constraints_is_not_a_risk() {
        let assessment = assess(&context(3));
        assert!(!assessment
            .risk_factors
            .contains(&RISK_MANY_CONSTRAINTS.to_string()));
        assert!((assessment.constraint_severity - 0.6).abs() < 1e-9);
    }
}
