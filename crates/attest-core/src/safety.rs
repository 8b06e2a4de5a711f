use crate::metrics_api::MetricInput;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum FindingKind {
    HallucinatedDiagnosis,
    HallucinatedProcedure,
    FabricatedCitation,
    UnverifiedCitation,
    OffLabelProcedure,
    MissingRequestedProcedure,
}

impl FindingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FindingKind::HallucinatedDiagnosis => "hallucinated-diagnosis",
            FindingKind::HallucinatedProcedure => "hallucinated-procedure",
            FindingKind::FabricatedCitation => "fabricated-citation",
            FindingKind::UnverifiedCitation => "unverified-citation",
            FindingKind::OffLabelProcedure => "off-label-procedure",
            FindingKind::MissingRequestedProcedure => "missing-requested-procedure",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            FindingKind::HallucinatedDiagnosis
            | FindingKind::HallucinatedProcedure
            | FindingKind::FabricatedCitation
            | FindingKind::OffLabelProcedure => Severity::Critical,
            FindingKind::UnverifiedCitation | FindingKind::MissingRequestedProcedure => {
                Severity::Warning
            }
        }
    }
}

/// Ordered so that `max` picks the worst level.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Safe,
    Warning,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Safe => "safe",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SafetyFinding {
    pub kind: FindingKind,
    pub value: String,
    pub explanation: String,
}

impl SafetyFinding {
    pub fn new(kind: FindingKind, value: impl Into<String>, explanation: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
            explanation: explanation.into(),
        }
    }
}

/// Result of a single detector.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckOutcome {
    pub passed: bool,
    pub findings: Vec<SafetyFinding>,
}

impl CheckOutcome {
    pub fn pass() -> Self {
        Self {
            passed: true,
            findings: vec![],
        }
    }
}

pub trait SafetyCheck: Send + Sync {
    fn name(&self) -> &'static str;
    fn check(&self, input: &MetricInput<'_>, known_sources: &[String]) -> CheckOutcome;
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SafetyReport {
    pub passed: bool,
    pub severity: Severity,
    pub findings: Vec<SafetyFinding>,
}

impl Default for SafetyReport {
    fn default() -> Self {
        Self {
            passed: true,
            severity: Severity::Safe,
            findings: vec![],
        }
    }
}

impl SafetyReport {
    pub fn aggregate(outcomes: impl IntoIterator<Item = CheckOutcome>) -> Self {
        let mut passed = true;
        let mut findings = Vec::new();
        for o in outcomes {
            passed &= o.passed;
            findings.extend(o.findings);
        }
        let severity = findings
            .iter()
            .map(|f| f.kind.severity())
            .max()
            .unwrap_or(Severity::Safe);
        Self {
            passed,
            severity,
            findings,
        }
    }

    pub fn critical_count(&self) -> usize {
        self.findings
            .iter()
            .filter(|f| f.kind.severity() == Severity::Critical)
            .count()
    }
}

/// Runs every detector against one letter and merges the outcomes.
pub fn run_checks(
    checks: &[std::sync::Arc<dyn SafetyCheck>],
    input: &MetricInput<'_>,
    known_sources: &[String],
) -> SafetyReport {
    SafetyReport::aggregate(checks.iter().map(|c| {
        let outcome = c.check(input, known_sources);
        tracing::debug!(
            check = c.name(),
            passed = outcome.passed,
            findings = outcome.findings.len(),
            "safety check"
        );
        outcome
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(kind: FindingKind) -> SafetyFinding {
        SafetyFinding::new(kind, "x", "test")
    }

    #[test]
    fn test_no_findings_is_safe() {
        let r = SafetyReport::aggregate(vec![CheckOutcome::pass(), CheckOutcome::pass()]);
        assert!(r.passed);
        assert_eq!(r.severity, Severity::Safe);
    }

    #[test]
    fn test_critical_dominates_warnings() {
        let warnings = CheckOutcome {
            passed: true,
            findings: vec![
                finding(FindingKind::UnverifiedCitation),
                finding(FindingKind::MissingRequestedProcedure),
                finding(FindingKind::UnverifiedCitation),
            ],
        };
        let critical = CheckOutcome {
            passed: false,
            findings: vec![finding(FindingKind::OffLabelProcedure)],
        };
        let r = SafetyReport::aggregate(vec![warnings, critical]);
        assert!(!r.passed);
        assert_eq!(r.severity, Severity::Critical);
        assert_eq!(r.critical_count(), 1);
    }

    #[test]
    fn test_warning_only_keeps_pass() {
        let r = SafetyReport::aggregate(vec![CheckOutcome {
            passed: true,
            findings: vec![finding(FindingKind::UnverifiedCitation)],
        }]);
        assert!(r.passed);
        assert_eq!(r.severity, Severity::Warning);
    }

    #[test]
    fn test_kind_wire_names() {
        let json = serde_json::to_string(&FindingKind::OffLabelProcedure).unwrap();
        assert_eq!(json, "\"off-label-procedure\"");
    }
}
