use crate::codes::extract_codes;
use attest_core::metrics_api::MetricInput;
use attest_core::safety::{CheckOutcome, FindingKind, SafetyCheck, SafetyFinding};

/// Codes in the letter that the patient profile does not support.
pub struct HallucinationCheck;

impl SafetyCheck for HallucinationCheck {
    fn name(&self) -> &'static str {
        "hallucination"
    }

    fn check(&self, input: &MetricInput<'_>, _known_sources: &[String]) -> CheckOutcome {
        let extracted = extract_codes(input.letter);
        let profile = &input.case.profile;
        let mut findings = Vec::new();

        let known_dx = profile.known_diagnosis_codes();
        if !known_dx.is_empty() {
            for code in extracted.diagnosis.iter().filter(|c| !known_dx.contains(c)) {
                findings.push(SafetyFinding::new(
                    FindingKind::HallucinatedDiagnosis,
                    code.as_str(),
                    format!("diagnosis code {} is not on the patient's problem list", code),
                ));
            }
        }

        let requested = profile.requested_procedure_codes();
        if !requested.is_empty() {
            for code in extracted.procedure.iter().filter(|c| !requested.contains(c)) {
                findings.push(SafetyFinding::new(
                    FindingKind::HallucinatedProcedure,
                    code.as_str(),
                    format!("procedure code {} was not requested", code),
                ));
            }
        }

        CheckOutcome {
            passed: findings.is_empty(),
            findings,
        }
    }
}
