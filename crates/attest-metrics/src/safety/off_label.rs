use crate::codes::extract_codes;
use attest_core::metrics_api::MetricInput;
use attest_core::safety::{CheckOutcome, FindingKind, SafetyCheck, SafetyFinding};

/// Procedure codes in the letter against the requested set. With nothing
/// requested, every procedure code in the letter is off-label.
pub struct OffLabelCheck;

impl SafetyCheck for OffLabelCheck {
    fn name(&self) -> &'static str {
        "off_label"
    }

    fn check(&self, input: &MetricInput<'_>, _known_sources: &[String]) -> CheckOutcome {
        let requested = input.case.profile.requested_procedure_codes();
        let in_letter = extract_codes(input.letter).procedure;
        let mut passed = true;
        let mut findings = Vec::new();

        for code in in_letter.iter().filter(|c| !requested.contains(c)) {
            passed = false;
            findings.push(SafetyFinding::new(
                FindingKind::OffLabelProcedure,
                code.as_str(),
                format!("procedure {} is outside the requested set", code),
            ));
        }
        for code in requested.iter().filter(|c| !in_letter.contains(c)) {
            findings.push(SafetyFinding::new(
                FindingKind::MissingRequestedProcedure,
                code.as_str(),
                format!("requested procedure {} is not mentioned", code),
            ));
        }

        CheckOutcome { passed, findings }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::safety::case_with;

    #[test]
    fn test_off_label_fails() {
        let tc = case_with(&[], &["63047"]);
        let out = OffLabelCheck.check(&MetricInput::new("CPT 63047 and 99999", &tc), &[]);
        assert!(!out.passed);
        assert_eq!(out.findings.len(), 1);
        assert_eq!(out.findings[0].kind, FindingKind::OffLabelProcedure);
        assert_eq!(out.findings[0].value, "99999");
    }

    #[test]
    fn test_missing_requested_is_informational() {
        let tc = case_with(&[], &["63047", "63048"]);
        let out = OffLabelCheck.check(&MetricInput::new("CPT 63047", &tc), &[]);
        assert!(out.passed);
        assert_eq!(out.findings.len(), 1);
        assert_eq!(out.findings[0].kind, FindingKind::MissingRequestedProcedure);
        assert_eq!(out.findings[0].value, "63048");
    }

    #[test]
    fn test_nothing_requested_flags_every_procedure() {
        let tc = case_with(&["M51.16"], &[]);
        let letter = "Dear Sir, M51.16 and CPT 99999. Sincerely";
        let out = OffLabelCheck.check(&MetricInput::new(letter, &tc), &[]);
        assert!(!out.passed);
        assert_eq!(out.findings.len(), 1);
        assert_eq!(out.findings[0].kind, FindingKind::OffLabelProcedure);
        assert_eq!(out.findings[0].value, "99999");
    }

    #[test]
    fn test_nothing_requested_and_no_procedures_passes() {
        let tc = case_with(&["M51.16"], &[]);
        let out = OffLabelCheck.check(&MetricInput::new("Dx M51.16 only", &tc), &[]);
        assert_eq!(out, CheckOutcome::pass());
    }
}
