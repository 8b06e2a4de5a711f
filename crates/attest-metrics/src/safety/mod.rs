//! Pure fabrication detectors. Each one reports its own pass/fail; the
//! aggregate lives in `attest_core::safety::SafetyReport`.

pub mod citations;
pub mod hallucination;
pub mod off_label;

pub use citations::CitationCheck;
pub use hallucination::HallucinationCheck;
pub use off_label::OffLabelCheck;

#[cfg(test)]
pub(crate) fn case_with(diagnoses: &[&str], procedures: &[&str]) -> attest_core::model::TestCase {
    let mut tc = attest_core::model::TestCase {
        id: "case".into(),
        active: true,
        ..Default::default()
    };
    tc.profile.diagnosis_codes = diagnoses.iter().map(|s| s.to_string()).collect();
    tc.profile.procedure_codes = procedures.iter().map(|s| s.to_string()).collect();
    tc
}
