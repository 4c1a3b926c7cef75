//! Decision heuristics and their strategy archetypes
//!
//! Each heuristic maps to one fixed archetype: a named strategy with
//! baseline outcome deltas, pros/cons, a confidence and a base score.
//! Generation is a table lookup, not a search.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A named strategy template used to generate one candidate option
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Heuristic {
    RiskMinimization,
    ResourceOptimization,
    TimeEfficiency,
    CostReduction,
    QualityMaximization,
    SafetyPriority,
    /// Fallback for anything not recognized above
    #[serde(other)]
    Balanced,
}

impl Heuristic {
    /// Order in which heuristics are drawn when the option count is capped
    pub const PRIORITY_ORDER: [Heuristic; 6] = [
        Heuristic::RiskMinimization,
        Heuristic::ResourceOptimization,
        Heuristic::TimeEfficiency,
        Heuristic::CostReduction,
        Heuristic::QualityMaximization,
        Heuristic::SafetyPriority,
    ];

    /// Position in `PRIORITY_ORDER`; `Balanced` ranks after all six
    pub fn priority_rank(&self) -> usize {
        Self::PRIORITY_ORDER
            .iter()
            .position(|h| h == self)
            .unwrap_or(Self::PRIORITY_ORDER.len())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Heuristic::RiskMinimization => "risk_minimization",
            Heuristic::ResourceOptimization => "resource_optimization",
            Heuristic::TimeEfficiency => "time_efficiency",
            Heuristic::CostReduction => "cost_reduction",
            Heuristic::QualityMaximization => "quality_maximization",
            Heuristic::SafetyPriority => "safety_priority",
            Heuristic::Balanced => "balanced",
        }
    }

    /// Parse a heuristic name. Unknown names become `Balanced` rather than
    /// an error so no requested heuristic is dropped.
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "risk_minimization" => Heuristic::RiskMinimization,
            "resource_optimization" => Heuristic::ResourceOptimization,
            "time_efficiency" => Heuristic::TimeEfficiency,
            "cost_reduction" => Heuristic::CostReduction,
            "quality_maximization" => Heuristic::QualityMaximization,
            "safety_priority" => Heuristic::SafetyPriority,
            _ => Heuristic::Balanced,
        }
    }

    pub fn archetype(&self) -> &'static Archetype {
        match self {
            Heuristic::RiskMinimization => &RISK_AVERSE,
            Heuristic::ResourceOptimization => &RESOURCE_EFFICIENT,
            Heuristic::TimeEfficiency => &RAPID_EXECUTION,
            Heuristic::CostReduction => &COST_MINIMAL,
            Heuristic::QualityMaximization => &QUALITY_FIRST,
            Heuristic::SafetyPriority => &SAFETY_FIRST,
            Heuristic::Balanced => &BALANCED,
        }
    }
}

impl fmt::Display for Heuristic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Heuristic {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse_lenient(s))
    }
}

/// Fixed strategy template behind a heuristic
#[derive(Debug)]
pub struct Archetype {
    pub name: &'static str,
    pub description: &'static str,
    /// Heuristics the generated option embodies, primary first
    pub heuristics: &'static [Heuristic],
    /// Added to the assessed baseline success probability
    pub success_delta: f64,
    /// Multiplier on the baseline duration
    pub duration_factor: f64,
    pub resource_utilization: f64,
    /// Added to the assessed baseline risk
    pub risk_delta: f64,
    /// Share of the available budget spent, when a budget is known
    pub budget_share: f64,
    pub quality_score: Option<f64>,
    pub safety_score: Option<f64>,
    pub pros: &'static [&'static str],
    pub cons: &'static [&'static str],
    pub confidence: f64,
    pub base_score: f64,
}

pub static RISK_AVERSE: Archetype = Archetype {
    name: "Risk-Averse Approach",
    description: "Stage the mission conservatively with verification gates and fallback positions at every phase",
    heuristics: &[Heuristic::RiskMinimization, Heuristic::SafetyPriority],
    success_delta: 10.0,
    duration_factor: 1.2,
    resource_utilization: 70.0,
    risk_delta: -25.0,
    budget_share: 0.9,
    quality_score: Some(80.0),
    safety_score: Some(90.0),
    pros: &[
        "Lowest exposure to operational failure",
        "Contingencies prepared before commitment",
        "Predictable execution",
    ],
    cons: &[
        "Slower than aggressive alternatives",
        "Reserves held back may go unused",
    ],
    confidence: 85.0,
    base_score: 75.0,
};

pub static RESOURCE_EFFICIENT: Archetype = Archetype {
    name: "Resource-Efficient Strategy",
    description: "Match crew, vessels and equipment tightly to the task and pool shared assets across phases",
    heuristics: &[Heuristic::ResourceOptimization, Heuristic::CostReduction],
    success_delta: 0.0,
    duration_factor: 1.1,
    resource_utilization: 60.0,
    risk_delta: -5.0,
    budget_share: 0.7,
    quality_score: Some(75.0),
    safety_score: None,
    pros: &[
        "Frees capacity for parallel missions",
        "Lower spend than baseline",
        "Sustainable under prolonged operations",
    ],
    cons: &[
        "Little slack if conditions change",
        "Requires tight coordination",
    ],
    confidence: 80.0,
    base_score: 72.0,
};

pub static RAPID_EXECUTION: Archetype = Archetype {
    name: "Rapid Execution Plan",
    description: "Commit all available assets at once and run phases in parallel to reach the objective fastest",
    heuristics: &[Heuristic::TimeEfficiency],
    success_delta: -10.0,
    duration_factor: 0.7,
    resource_utilization: 90.0,
    risk_delta: 15.0,
    budget_share: 1.0,
    quality_score: Some(70.0),
    safety_score: None,
    pros: &[
        "Shortest time to objective",
        "Captures time-sensitive opportunities",
    ],
    cons: &[
        "High resource load",
        "Elevated risk from parallel phases",
        "Less room to correct course",
    ],
    confidence: 70.0,
    base_score: 68.0,
};

pub static COST_MINIMAL: Archetype = Archetype {
    name: "Cost-Minimal Strategy",
    description: "Defer non-essential work and favour existing assets over new procurement",
    heuristics: &[Heuristic::CostReduction, Heuristic::ResourceOptimization],
    success_delta: -5.0,
    duration_factor: 1.3,
    resource_utilization: 65.0,
    risk_delta: 5.0,
    budget_share: 0.6,
    quality_score: Some(65.0),
    safety_score: None,
    pros: &[
        "Lowest projected spend",
        "Preserves budget for contingencies",
    ],
    cons: &[
        "Longer timeline",
        "Reduced quality margin",
    ],
    confidence: 75.0,
    base_score: 65.0,
};

pub static QUALITY_FIRST: Archetype = Archetype {
    name: "Quality-First Approach",
    description: "Invest in thorough preparation, inspection and skilled crews to maximise the standard of the result",
    heuristics: &[Heuristic::QualityMaximization, Heuristic::RiskMinimization],
    success_delta: 5.0,
    duration_factor: 1.4,
    resource_utilization: 85.0,
    risk_delta: -10.0,
    budget_share: 1.1,
    quality_score: Some(95.0),
    safety_score: Some(85.0),
    pros: &[
        "Highest quality of outcome",
        "Fewer follow-up corrections",
        "Strong compliance posture",
    ],
    cons: &[
        "Highest spend",
        "Longest preparation time",
    ],
    confidence: 78.0,
    base_score: 70.0,
};

pub static SAFETY_FIRST: Archetype = Archetype {
    name: "Safety-First Protocol",
    description: "Put crew and vessel safety ahead of schedule with full protocol compliance and standby support",
    heuristics: &[Heuristic::SafetyPriority, Heuristic::RiskMinimization],
    success_delta: 8.0,
    duration_factor: 1.25,
    resource_utilization: 75.0,
    risk_delta: -20.0,
    budget_share: 0.95,
    quality_score: Some(80.0),
    safety_score: Some(98.0),
    pros: &[
        "Maximum personnel safety",
        "Full regulatory compliance",
        "Low incident probability",
    ],
    cons: &[
        "Schedule slack required",
        "Standby assets add cost",
    ],
    confidence: 88.0,
    base_score: 73.0,
};

pub static BALANCED: Archetype = Archetype {
    name: "Balanced Strategy",
    description: "Weigh time, cost, risk and quality evenly without favouring any single dimension",
    heuristics: &[Heuristic::Balanced],
    success_delta: 0.0,
    duration_factor: 1.0,
    resource_utilization: 70.0,
    risk_delta: 0.0,
    budget_share: 0.8,
    quality_score: Some(75.0),
    safety_score: Some(75.0),
    pros: &["Even trade-off across criteria", "Few extreme failure modes"],
    cons: &["Excels at nothing in particular"],
    confidence: 60.0,
    base_score: 60.0,
};
