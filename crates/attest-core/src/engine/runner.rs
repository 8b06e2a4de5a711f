use crate::config::HarnessConfig;
use crate::engine::prompt::build_generation_request;
use crate::errors::CaseError;
use crate::judge::JudgeService;
use crate::metrics_api::{Metric, MetricInput, MetricKind, MetricResult};
use crate::model::{
    ConfigSnapshot, EvalResult, NewRun, RunKind, RunSummary, SamplingOptions, TestCase,
};
use crate::providers::llm::LlmClient;
use crate::safety::{run_checks, SafetyCheck, SafetyReport};
use crate::storage::EvalStore;
use anyhow::Context;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;

/// Generation settings snapshotted from the harness config.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub endpoint: String,
    pub model: String,
    pub generation_timeout: Duration,
    pub temperature: f32,
    pub max_tokens: u32,
    pub known_sources: Vec<String>,
}

impl RunSettings {
    pub fn from_config(cfg: &HarnessConfig) -> Self {
        Self {
            endpoint: cfg.endpoint.clone(),
            model: cfg.model.clone(),
            generation_timeout: Duration::from_secs(cfg.generation.timeout_seconds),
            temperature: cfg.generation.temperature,
            max_tokens: cfg.generation.max_tokens,
            known_sources: cfg.known_sources.clone(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunRequest {
    pub name: Option<String>,
    pub kind: RunKind,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct RunArtifacts {
    pub run_id: i64,
    pub name: String,
    pub summary: RunSummary,
    pub results: Vec<EvalResult>,
}

#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// No active test cases; no run was created.
    NoTestCases,
    Completed(RunArtifacts),
}

pub struct Runner {
    pub store: Arc<dyn EvalStore>,
    pub client: Arc<dyn LlmClient>,
    pub metrics: Vec<Arc<dyn Metric>>,
    pub safety: Vec<Arc<dyn SafetyCheck>>,
    pub judge: Option<JudgeService>,
    pub settings: RunSettings,
}

impl Runner {
    /// Evaluates every active test case in id order, one at a time.
    ///
    /// A case that fails to generate is stored as an error row and the run
    /// goes on. A result row that fails to persist is logged and counted as
    /// lost. Failing to write the final summary is returned to the caller.
    pub async fn run(&self, request: &RunRequest) -> anyhow::Result<RunOutcome> {
        let cases = self
            .store
            .active_test_cases()
            .context("failed to load active test cases")?;

        if cases.is_empty() {
            tracing::info!("no active test cases; nothing to run");
            return Ok(RunOutcome::NoTestCases);
        }

        let name = request
            .name
            .clone()
            .unwrap_or_else(|| default_run_name(chrono::Local::now().date_naive(), &self.settings.model));

        let run_id = self.store.create_run(&NewRun {
            name: name.clone(),
            kind: request.kind,
            model: self.settings.model.clone(),
            config_snapshot: ConfigSnapshot {
                endpoint: self.settings.endpoint.clone(),
                model: self.settings.model.clone(),
                timestamp: chrono::Utc::now().to_rfc3339(),
            },
        })?;

        tracing::info!(run_id, name = %name, cases = cases.len(), "run started");

        let mut stored: Vec<EvalResult> = Vec::with_capacity(cases.len());
        let mut lost = 0usize;

        for (i, tc) in cases.iter().enumerate() {
            let mut row = match self.evaluate_case(tc, run_id).await {
                Ok(row) => row,
                Err(e) => {
                    tracing::warn!(run_id, case = %tc.id, error = %e, "case failed");
                    EvalResult::error_row(run_id, &tc.id, &e.to_string())
                }
            };

            match self.store.insert_result(&row) {
                Ok(id) => {
                    row.id = Some(id);
                    tracing::info!(
                        run_id,
                        case = %tc.id,
                        n = i + 1,
                        of = cases.len(),
                        coverage = ?row.coverage,
                        accuracy = ?row.accuracy,
                        judge = ?row.judge_score,
                        "case stored"
                    );
                    stored.push(row);
                }
                Err(e) => {
                    tracing::warn!(run_id, case = %tc.id, error = %e, "failed to persist result; case lost");
                    lost += 1;
                }
            }
        }

        let summary = summarize(cases.len(), &stored, lost);
        self.store
            .complete_run(run_id, &summary)
            .with_context(|| format!("failed to write summary for run {}", run_id))?;

        tracing::info!(run_id, completed = summary.completed_cases, failed = summary.failed_cases, "run completed");

        Ok(RunOutcome::Completed(RunArtifacts {
            run_id,
            name,
            summary,
            results: stored,
        }))
    }

    /// Generation, scoring, safety and judge for one case.
    pub async fn evaluate_case(&self, tc: &TestCase, run_id: i64) -> Result<EvalResult, CaseError> {
        let request = build_generation_request(
            tc,
            &self.settings.model,
            SamplingOptions {
                temperature: self.settings.temperature,
                num_predict: self.settings.max_tokens,
            },
        )
        .map_err(CaseError::Generation)?;

        let start = Instant::now();
        let resp = match timeout(self.settings.generation_timeout, self.client.chat(&request)).await {
            Ok(Ok(resp)) => resp,
            Ok(Err(e)) => return Err(CaseError::Generation(e)),
            Err(_) => return Err(CaseError::Timeout(self.settings.generation_timeout)),
        };
        let latency_ms = start.elapsed().as_millis() as u64;

        if resp.text.trim().is_empty() {
            return Err(CaseError::EmptyResponse);
        }

        let (breakdown, safety) = self.score_letter(&resp.text, tc);

        let verdict = match &self.judge {
            Some(judge) => Some(judge.evaluate(&resp.text, tc.policy_criteria.as_deref()).await),
            None => None,
        };

        let score_of = |kind: MetricKind| breakdown.iter().find(|m| m.kind == kind).map(|m| m.score);

        Ok(EvalResult {
            id: None,
            run_id,
            test_case_id: tc.id.clone(),
            latency_ms: Some(latency_ms),
            coverage: score_of(MetricKind::Coverage),
            accuracy: score_of(MetricKind::Accuracy),
            format: score_of(MetricKind::Format),
            completeness: score_of(MetricKind::Completeness),
            judge_score: verdict.as_ref().and_then(|v| v.persisted_score()),
            judge_rationale: verdict.as_ref().map(|v| v.rationale.clone()),
            judge_model: verdict.map(|v| v.model),
            safety: Some(safety),
            breakdown,
            generated_text: resp.text,
        })
    }

    /// Pure part of the pipeline: metrics plus safety for one letter.
    pub fn score_letter(&self, letter: &str, tc: &TestCase) -> (Vec<MetricResult>, SafetyReport) {
        let input = MetricInput::new(letter, tc);
        let breakdown = self.metrics.iter().map(|m| m.evaluate(&input)).collect();

        let mut known_sources = self.settings.known_sources.clone();
        known_sources.extend(tc.known_sources.iter().cloned());
        let safety = run_checks(&self.safety, &input, &known_sources);

        (breakdown, safety)
    }
}

pub fn default_run_name(date: chrono::NaiveDate, model: &str) -> String {
    format!("{} {}", date.format("%Y-%m-%d"), model)
}

/// Averages each score column over the rows where it is present. An empty
/// column averages to 0.
pub fn summarize(total_cases: usize, rows: &[EvalResult], lost_cases: usize) -> RunSummary {
    fn mean(values: impl Iterator<Item = f64>) -> f64 {
        let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
        sum / n.max(1) as f64
    }

    RunSummary {
        total_cases,
        completed_cases: rows.len(),
        failed_cases: rows.iter().filter(|r| r.is_error()).count(),
        lost_cases,
        avg_coverage: mean(rows.iter().filter_map(|r| r.coverage)),
        avg_accuracy: mean(rows.iter().filter_map(|r| r.accuracy)),
        avg_format: mean(rows.iter().filter_map(|r| r.format)),
        avg_completeness: mean(rows.iter().filter_map(|r| r.completeness)),
        avg_judge: mean(rows.iter().filter_map(|r| r.judge_score).map(f64::from)),
        safety_failures: rows
            .iter()
            .filter(|r| r.safety.as_ref().is_some_and(|s| !s.passed))
            .count(),
        critical_findings: rows
            .iter()
            .filter_map(|r| r.safety.as_ref())
            .map(SafetyReport::critical_count)
            .sum(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(run_id: i64, id: &str, v: f64, judge: Option<u8>) -> EvalResult {
        EvalResult {
            run_id,
            test_case_id: id.into(),
            generated_text: "Dear".into(),
            coverage: Some(v),
            accuracy: Some(v),
            format: Some(v),
            completeness: Some(v),
            judge_score: judge,
            ..Default::default()
        }
    }

    #[test]
    fn test_summary_skips_error_rows_in_means() {
        let rows = vec![
            scored(1, "a", 1.0, Some(8)),
            EvalResult::error_row(1, "b", "generation failed: boom"),
            scored(1, "c", 0.5, None),
        ];
        let s = summarize(3, &rows, 0);
        assert_eq!(s.completed_cases, 3);
        assert_eq!(s.failed_cases, 1);
        assert!((s.avg_coverage - 0.75).abs() < 1e-9);
        assert!((s.avg_judge - 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_summary_of_nothing_is_zero() {
        let s = summarize(2, &[], 2);
        assert_eq!(s.completed_cases, 0);
        assert_eq!(s.lost_cases, 2);
        assert_eq!(s.avg_accuracy, 0.0);
        assert_eq!(s.avg_judge, 0.0);
    }

    #[test]
    fn test_default_run_name() {
        let d = chrono::NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        assert_eq!(default_run_name(d, "llama3.1:8b"), "2026-10-16 llama3.1:8b");
    }
}
