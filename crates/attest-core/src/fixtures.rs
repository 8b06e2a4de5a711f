use crate::errors::ConfigError;
use crate::model::TestCase;
use crate::storage::Store;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct FixtureFile {
    test_cases: Vec<TestCase>,
}

pub fn parse_fixtures(raw: &str) -> Result<Vec<TestCase>, ConfigError> {
    let file: FixtureFile = serde_yaml::from_str(raw)
        .map_err(|e| ConfigError(format!("failed to parse fixtures: {}", e)))?;

    let mut seen = HashSet::new();
    for tc in &file.test_cases {
        if tc.id.trim().is_empty() {
            return Err(ConfigError("fixture with empty id".into()));
        }
        if !seen.insert(tc.id.as_str()) {
            return Err(ConfigError(format!("duplicate fixture id '{}'", tc.id)));
        }
    }
    Ok(file.test_cases)
}

pub fn load_fixtures(path: &Path) -> Result<Vec<TestCase>, ConfigError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| ConfigError(format!("failed to read fixtures {}: {}", path.display(), e)))?;
    parse_fixtures(&raw)
}

/// Upserts every fixture; returns how many were written.
pub fn seed(store: &Store, cases: &[TestCase]) -> anyhow::Result<usize> {
    for tc in cases {
        store.upsert_test_case(tc)?;
        tracing::debug!(case = %tc.id, active = tc.active, "seeded test case");
    }
    Ok(cases.len())
}

pub const SAMPLE_FIXTURES: &str = r#"test_cases:
  - id: lumbar-decompression-001
    label: "Lumbar laminectomy after failed conservative care"
    payer_id: bcbs-commercial
    profile:
      patient_name: "Sample Patient"
      mrn: "000000"
      problem_list:
        - code: M51.16
          description: "Intervertebral disc disorder with radiculopathy, lumbar region"
      therapy_history:
        - "Physical therapy, 8 weeks, 2024-01 to 2024-03, minimal improvement"
      imaging:
        - "MRI lumbar spine 2024-04: L4-L5 disc extrusion with L5 nerve root compression"
      medication_trials:
        - "Gabapentin 300 mg TID, 10 weeks"
        - "Meloxicam 15 mg daily, 6 weeks"
      coverage: "Commercial PPO"
      procedure_codes: ["63047"]
      diagnosis_codes: ["M51.16"]
    policy_criteria: |
      1. Six weeks of conservative therapy including physical therapy
      2. Imaging correlation with clinical findings
      3. Documented neurological deficit or radicular pain
    expected_sections:
      - "Clinical History"
      - "Conservative Treatment"
      - "Imaging Findings"
      - "Medical Necessity"
    known_sources:
      - "North American Spine Society"
    active: true
"#;

pub fn write_sample_fixtures(path: &Path) -> Result<(), ConfigError> {
    std::fs::write(path, SAMPLE_FIXTURES)
        .map_err(|e| ConfigError(format!("failed to write sample fixtures: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_fixtures_parse() {
        let cases = parse_fixtures(SAMPLE_FIXTURES).unwrap();
        assert_eq!(cases.len(), 1);
        let tc = &cases[0];
        assert!(tc.active);
        assert_eq!(tc.expected_codes(), vec!["M51.16", "63047"]);
        assert_eq!(tc.expected_sections.len(), 4);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let raw = r#"test_cases:
  - { id: a, label: A, payer_id: p, profile: {} }
  - { id: a, label: B, payer_id: p, profile: {} }
"#;
        let err = parse_fixtures(raw).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }
}
