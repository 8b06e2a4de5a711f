use serde::{Deserialize, Serialize};

use crate::metrics_api::MetricResult;
use crate::safety::SafetyReport;

/// Golden fixture driving one letter generation. Read-only for the harness.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TestCase {
    pub id: String,
    pub label: String,
    pub payer_id: String,
    pub profile: PatientProfile,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_criteria: Option<String>,
    #[serde(default)]
    pub expected_sections: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub known_sources: Vec<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl TestCase {
    /// Diagnosis and procedure codes the letter is expected to carry.
    pub fn expected_codes(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for c in self
            .profile
            .diagnosis_codes
            .iter()
            .chain(self.profile.procedure_codes.iter())
        {
            let c = normalize_code(c);
            if !c.is_empty() && !out.contains(&c) {
                out.push(c);
            }
        }
        out
    }
}

pub fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PatientProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mrn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,

    #[serde(default)]
    pub problem_list: Vec<Problem>,
    #[serde(default)]
    pub therapy_history: Vec<String>,
    #[serde(default)]
    pub imaging: Vec<String>,
    #[serde(default)]
    pub medication_trials: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coverage: Option<String>,
    #[serde(default)]
    pub procedure_codes: Vec<String>,
    #[serde(default)]
    pub diagnosis_codes: Vec<String>,
}

impl PatientProfile {
    /// Diagnosis codes the patient is known to carry: problem-list codes plus
    /// the explicit diagnosis list.
    pub fn known_diagnosis_codes(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        let problem_codes = self.problem_list.iter().filter_map(|p| p.code.as_deref());
        for c in problem_codes.chain(self.diagnosis_codes.iter().map(String::as_str)) {
            let c = normalize_code(c);
            if !c.is_empty() && !out.contains(&c) {
                out.push(c);
            }
        }
        out
    }

    pub fn requested_procedure_codes(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for c in &self.procedure_codes {
            let c = normalize_code(c);
            if !c.is_empty() && !out.contains(&c) {
                out.push(c);
            }
        }
        out
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Problem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub description: String,
}

/// The clinical subset of a profile sent to the generation endpoint.
/// Free-text identifiers (name, MRN, date of birth) never appear here.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ClinicalPacket<'a> {
    pub payer_id: &'a str,
    pub problem_list: &'a [Problem],
    pub therapy_history: &'a [String],
    pub imaging: &'a [String],
    pub medication_trials: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coverage: Option<&'a str>,
    pub procedure_codes: &'a [String],
    pub diagnosis_codes: &'a [String],
}

impl<'a> ClinicalPacket<'a> {
    pub fn from_case(tc: &'a TestCase) -> Self {
        let p = &tc.profile;
        Self {
            payer_id: &tc.payer_id,
            problem_list: &p.problem_list,
            therapy_history: &p.therapy_history,
            imaging: &p.imaging,
            medication_trials: &p.medication_trials,
            coverage: p.coverage.as_deref(),
            procedure_codes: &p.procedure_codes,
            diagnosis_codes: &p.diagnosis_codes,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum RunKind {
    #[default]
    Automated,
    Manual,
}

impl RunKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunKind::Automated => "automated",
            RunKind::Manual => "manual",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "automated" => Some(RunKind::Automated),
            "manual" => Some(RunKind::Manual),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Completed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "completed" => RunStatus::Completed,
            _ => RunStatus::Running,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConfigSnapshot {
    pub endpoint: String,
    pub model: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvalRun {
    pub id: i64,
    pub name: String,
    pub kind: RunKind,
    pub model: String,
    pub config_snapshot: ConfigSnapshot,
    pub status: RunStatus,
    #[serde(default)]
    pub summary: Option<RunSummary>,
    pub created_at: String,
    #[serde(default)]
    pub completed_at: Option<String>,
}

/// Fields needed to open a run; the store assigns id, status and timestamps.
#[derive(Debug, Clone)]
pub struct NewRun {
    pub name: String,
    pub kind: RunKind,
    pub model: String,
    pub config_snapshot: ConfigSnapshot,
}

/// One scored outcome for one (run, test case) pair. Written once.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EvalResult {
    #[serde(default)]
    pub id: Option<i64>,
    pub run_id: i64,
    pub test_case_id: String,
    pub generated_text: String,
    pub latency_ms: Option<u64>,
    pub coverage: Option<f64>,
    pub accuracy: Option<f64>,
    pub format: Option<f64>,
    pub completeness: Option<f64>,
    pub judge_score: Option<u8>,
    #[serde(default)]
    pub judge_rationale: Option<String>,
    #[serde(default)]
    pub judge_model: Option<String>,
    #[serde(default)]
    pub safety: Option<SafetyReport>,
    #[serde(default)]
    pub breakdown: Vec<MetricResult>,
}

pub const ERROR_MARKER: &str = "ERROR:";

impl EvalResult {
    pub fn error_row(run_id: i64, test_case_id: &str, error: &str) -> Self {
        Self {
            run_id,
            test_case_id: test_case_id.to_string(),
            generated_text: format!("{} {}", ERROR_MARKER, error),
            ..Default::default()
        }
    }

    pub fn is_error(&self) -> bool {
        self.generated_text.starts_with(ERROR_MARKER)
            && self.coverage.is_none()
            && self.accuracy.is_none()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RunSummary {
    pub total_cases: usize,
    pub completed_cases: usize,
    pub failed_cases: usize,
    #[serde(default)]
    pub lost_cases: usize,
    pub avg_coverage: f64,
    pub avg_accuracy: f64,
    pub avg_format: f64,
    pub avg_completeness: f64,
    pub avg_judge: f64,
    #[serde(default)]
    pub safety_failures: usize,
    #[serde(default)]
    pub critical_findings: usize,
}

/// Text returned by a generation or judge call, already normalized.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmResponse {
    pub text: String,
    pub provider: String,
    pub model: String,
    #[serde(default)]
    pub meta: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".into(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SamplingOptions {
    pub temperature: f32,
    pub num_predict: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub options: SamplingOptions,
    pub stream: bool,
}
