use crate::codes::extract_codes;
use attest_core::metrics_api::{Evidence, Metric, MetricInput, MetricKind, MetricResult};

pub const FABRICATED_PENALTY: f64 = 0.1;
/// Penalty per fabricated code when the profile expects no codes at all.
pub const UNEXPECTED_PENALTY: f64 = 0.2;

pub struct ClinicalAccuracyMetric;

impl Metric for ClinicalAccuracyMetric {
    fn kind(&self) -> MetricKind {
        MetricKind::Accuracy
    }

    fn evaluate(&self, input: &MetricInput<'_>) -> MetricResult {
        clinical_accuracy(input.letter, &input.case.expected_codes())
    }
}

/// `expected` must already be normalized (trimmed, upper-case).
pub fn clinical_accuracy(letter: &str, expected: &[String]) -> MetricResult {
    let extracted = extract_codes(letter);

    let mut found = Vec::new();
    let mut fabricated = Vec::new();
    for code in extracted.all() {
        if expected.contains(code) {
            found.push(code.clone());
        } else {
            fabricated.push(code.clone());
        }
    }
    let missing: Vec<String> = expected
        .iter()
        .filter(|c| !found.contains(c))
        .cloned()
        .collect();

    let score = if expected.is_empty() {
        1.0 - UNEXPECTED_PENALTY * fabricated.len() as f64
    } else {
        found.len() as f64 / expected.len() as f64 - FABRICATED_PENALTY * fabricated.len() as f64
    };

    MetricResult::new(
        MetricKind::Accuracy,
        score,
        Evidence::Accuracy {
            found,
            missing,
            fabricated,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn codes(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_all_expected_found() {
        let r = clinical_accuracy("Dx M51.16, CPT 63047.", &codes(&["M51.16", "63047"]));
        assert_eq!(r.score, 1.0);
    }

    #[test]
    fn test_fabricated_code_is_penalized() {
        let r = clinical_accuracy("Dx M51.16, CPT 63047 and 99999.", &codes(&["M51.16", "63047"]));
        assert!((r.score - 0.9).abs() < 1e-9);
        match r.evidence {
            Evidence::Accuracy { fabricated, missing, .. } => {
                assert_eq!(fabricated, vec!["99999"]);
                assert!(missing.is_empty());
            }
            other => panic!("unexpected evidence {:?}", other),
        }
    }

    #[test]
    fn test_missing_expected() {
        let r = clinical_accuracy("CPT 63047 only", &codes(&["M51.16", "63047"]));
        assert!((r.score - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_nothing_expected() {
        assert_eq!(clinical_accuracy("no codes here", &[]).score, 1.0);
        let r = clinical_accuracy("M51.16 and 63047", &[]);
        assert!((r.score - 0.6).abs() < 1e-9);
        let r = clinical_accuracy("11111 22222 33333 44444 55555 66666", &[]);
        assert_eq!(r.score, 0.0);
    }

    proptest! {
        #[test]
        fn prop_monotone_in_fabricated(extra in 0usize..15) {
            let expected = codes(&["M51.16", "63047"]);
            let base = "Dx M51.16 CPT 63047";
            let mut prev = f64::INFINITY;
            for n in 0..=extra {
                let fake: Vec<String> = (0..n).map(|i| format!("{}", 20000 + i)).collect();
                let letter = format!("{} {}", base, fake.join(" "));
                let s = clinical_accuracy(&letter, &expected).score;
                prop_assert!((0.0..=1.0).contains(&s));
                prop_assert!(s <= prev);
                prev = s;
            }
        }
    }
}
