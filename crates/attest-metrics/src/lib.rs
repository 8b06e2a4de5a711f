use std::sync::Arc;

use attest_core::metrics_api::Metric;
use attest_core::safety::SafetyCheck;

mod codes;
mod text;

pub mod accuracy;
pub mod completeness;
pub mod coverage;
pub mod format;
pub mod safety;

pub use codes::{extract_codes, ExtractedCodes};

pub fn default_metrics() -> Vec<Arc<dyn Metric>> {
    vec![
        Arc::new(coverage::CriteriaCoverageMetric),
        Arc::new(accuracy::ClinicalAccuracyMetric),
        Arc::new(format::FormatComplianceMetric),
        Arc::new(completeness::CompletenessMetric),
    ]
}

pub fn default_safety_checks() -> Vec<Arc<dyn SafetyCheck>> {
    vec![
        Arc::new(safety::HallucinationCheck),
        Arc::new(safety::CitationCheck),
        Arc::new(safety::OffLabelCheck),
    ]
}
