use crate::model::TestCase;
use serde::{Deserialize, Serialize};

/// Everything a scorer may look at. Scorers are pure functions of this input.
#[derive(Debug, Clone, Copy)]
pub struct MetricInput<'a> {
    pub letter: &'a str,
    pub case: &'a TestCase,
}

impl<'a> MetricInput<'a> {
    pub fn new(letter: &'a str, case: &'a TestCase) -> Self {
        Self { letter, case }
    }

    pub fn criteria(&self) -> &'a str {
        self.case.policy_criteria.as_deref().unwrap_or("")
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Coverage,
    Accuracy,
    Format,
    Completeness,
}

impl MetricKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Coverage => "coverage",
            MetricKind::Accuracy => "accuracy",
            MetricKind::Format => "format",
            MetricKind::Completeness => "completeness",
        }
    }
}

/// Evidence behind a score. Kept alongside the result for auditing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Evidence {
    Coverage {
        addressed: Vec<String>,
        missed: Vec<String>,
    },
    Accuracy {
        found: Vec<String>,
        missing: Vec<String>,
        fabricated: Vec<String>,
    },
    Format {
        present: Vec<String>,
        missing: Vec<String>,
    },
    Completeness {
        placeholders: Vec<String>,
        has_salutation: bool,
        has_closing: bool,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricResult {
    pub kind: MetricKind,
    pub score: f64,
    pub evidence: Evidence,
}

impl MetricResult {
    pub fn new(kind: MetricKind, score: f64, evidence: Evidence) -> Self {
        Self {
            kind,
            score: clamp_unit(score),
            evidence,
        }
    }
}

pub fn clamp_unit(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 1.0)
    }
}

pub trait Metric: Send + Sync {
    fn kind(&self) -> MetricKind;

    /// Must be deterministic and never fail; degraded inputs map to a neutral score.
    fn evaluate(&self, input: &MetricInput<'_>) -> MetricResult;
}
