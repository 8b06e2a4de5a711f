//! End-to-end scoring with the real scorers and safety detectors behind a
//! scripted generation endpoint.

use std::sync::Arc;
use std::time::Duration;

use attest_core::engine::{RunOutcome, RunRequest, RunSettings, Runner};
use attest_core::fixtures::{parse_fixtures, seed, SAMPLE_FIXTURES};
use attest_core::judge::{JudgeRuntimeConfig, JudgeService};
use attest_core::metrics_api::{Evidence, MetricKind};
use attest_core::providers::llm::FakeClient;
use attest_core::safety::{FindingKind, Severity};
use attest_core::storage::Store;

const LETTER: &str = "Dear Medical Director,

Re: Request for CPT 63047

Clinical History
The patient has lumbar disc disorder with radiculopathy (M51.16) and documented radicular pain
with a neurological deficit in the L5 distribution.

Conservative Treatment
Eight weeks of physical therapy and conservative therapy with medication trials did not help.

Imaging Findings
MRI shows an L4-L5 disc extrusion; imaging correlation with clinical findings is clear.

Medical Necessity
According to the North American Spine Society guidelines, decompression (CPT 63047) is indicated.

Sincerely,
Dr. Example";

fn store() -> Arc<Store> {
    let store = Store::memory("eval").unwrap();
    store.init_schema().unwrap();
    let cases = parse_fixtures(SAMPLE_FIXTURES).unwrap();
    seed(&store, &cases).unwrap();
    Arc::new(store)
}

fn runner(store: Arc<Store>, letter: &str, judge_reply: &str) -> Runner {
    let judge = JudgeService::new(
        JudgeRuntimeConfig {
            model: "judge".into(),
            timeout: Duration::from_secs(5),
            temperature: 0.0,
            max_tokens: 256,
        },
        Arc::new(FakeClient::texts([judge_reply])),
    );
    Runner {
        store,
        client: Arc::new(FakeClient::texts([letter])),
        metrics: attest_metrics::default_metrics(),
        safety: attest_metrics::default_safety_checks(),
        judge: Some(judge),
        settings: RunSettings {
            endpoint: "http://localhost:11434/api/chat".into(),
            model: "llama3.1:8b".into(),
            generation_timeout: Duration::from_secs(5),
            temperature: 0.2,
            max_tokens: 2048,
            known_sources: vec!["American College of Radiology".into()],
        },
    }
}

#[tokio::test]
async fn test_faithful_letter_scores_perfectly() {
    let store = store();
    let outcome = runner(
        store.clone(),
        LETTER,
        "```json\n{\"score\": 9, \"reasoning\": \"strong letter\"}\n```",
    )
    .run(&RunRequest::default())
    .await
    .unwrap();

    let RunOutcome::Completed(artifacts) = outcome else {
        panic!("expected a completed run");
    };
    let row = &artifacts.results[0];
    assert_eq!(row.coverage, Some(1.0));
    assert_eq!(row.accuracy, Some(1.0));
    assert_eq!(row.format, Some(1.0));
    assert_eq!(row.completeness, Some(1.0));
    assert_eq!(row.judge_score, Some(9));

    let safety = row.safety.as_ref().unwrap();
    assert!(safety.passed, "{:?}", safety.findings);
    assert_eq!(safety.severity, Severity::Safe);

    let summary = &artifacts.summary;
    assert_eq!(summary.total_cases, 1);
    assert_eq!(summary.safety_failures, 0);
    assert!((summary.avg_judge - 9.0).abs() < 1e-9);

    let stored = store.results_for_run(artifacts.run_id).unwrap();
    assert_eq!(stored[0].breakdown.len(), 4);
}

#[tokio::test]
async fn test_unrequested_code_is_fabricated_and_critical() {
    let letter = LETTER.replace("(CPT 63047) is indicated", "(CPT 63047) and 99999 are indicated");
    let outcome = runner(store(), &letter, "Score: 4/10 - adds an unrequested procedure")
        .run(&RunRequest::default())
        .await
        .unwrap();

    let RunOutcome::Completed(artifacts) = outcome else {
        panic!("expected a completed run");
    };
    let row = &artifacts.results[0];
    assert!((row.accuracy.unwrap() - 0.9).abs() < 1e-9);
    let accuracy = row
        .breakdown
        .iter()
        .find(|m| m.kind == MetricKind::Accuracy)
        .unwrap();
    match &accuracy.evidence {
        Evidence::Accuracy { fabricated, .. } => assert_eq!(fabricated, &vec!["99999".to_string()]),
        other => panic!("unexpected evidence {:?}", other),
    }

    let safety = row.safety.as_ref().unwrap();
    assert!(!safety.passed);
    assert_eq!(safety.severity, Severity::Critical);
    assert!(safety
        .findings
        .iter()
        .any(|f| f.kind == FindingKind::OffLabelProcedure && f.value == "99999"));

    assert_eq!(row.judge_score, Some(4));
    assert_eq!(artifacts.summary.safety_failures, 1);
    assert!(artifacts.summary.critical_findings >= 1);
}
