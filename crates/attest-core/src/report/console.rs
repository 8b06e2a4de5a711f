use crate::engine::RunArtifacts;
use crate::model::{EvalResult, EvalRun, RunSummary};
use crate::safety::Severity;

pub fn print_no_cases() {
    eprintln!("No active test cases found (0 cases).");
    eprintln!("hint: seed the golden fixtures first: attest seed --fixtures fixtures.yaml");
}

pub fn print_summary(artifacts: &RunArtifacts) {
    for r in &artifacts.results {
        print_result_line(r);
    }
    eprintln!();
    eprintln!("Run #{} \"{}\"", artifacts.run_id, artifacts.name);
    print_summary_block(&artifacts.summary);
}

pub fn print_summary_block(s: &RunSummary) {
    eprintln!(
        "Cases: total={} completed={} failed={} lost={}",
        s.total_cases, s.completed_cases, s.failed_cases, s.lost_cases
    );
    eprintln!(
        "Means: coverage={:.3} accuracy={:.3} format={:.3} completeness={:.3} judge={:.2}",
        s.avg_coverage, s.avg_accuracy, s.avg_format, s.avg_completeness, s.avg_judge
    );
    eprintln!(
        "Safety: failing_letters={} critical_findings={}",
        s.safety_failures, s.critical_findings
    );
}

pub fn print_result_line(r: &EvalResult) {
    if r.is_error() {
        eprintln!("ERROR [{}]: {}", r.test_case_id, r.generated_text);
        return;
    }

    let severity = r
        .safety
        .as_ref()
        .map(|s| s.severity)
        .unwrap_or(Severity::Safe);
    let tag = match severity {
        Severity::Safe => "OK",
        Severity::Warning => "WARN",
        Severity::Critical => "CRITICAL",
    };

    eprintln!(
        "{} [{}]: coverage={} accuracy={} format={} completeness={} judge={} ({})",
        tag,
        r.test_case_id,
        fmt_score(r.coverage),
        fmt_score(r.accuracy),
        fmt_score(r.format),
        fmt_score(r.completeness),
        r.judge_score
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".into()),
        fmt_latency(r.latency_ms),
    );

    if let Some(safety) = &r.safety {
        for f in &safety.findings {
            eprintln!("    {} {}: {}", f.kind.as_str(), f.value, f.explanation);
        }
    }
}

pub fn print_runs(runs: &[EvalRun]) {
    if runs.is_empty() {
        eprintln!("No runs recorded yet.");
        return;
    }
    for run in runs {
        let means = run
            .summary
            .as_ref()
            .map(|s| {
                format!(
                    "cases={} cov={:.2} acc={:.2} fmt={:.2} cmp={:.2} judge={:.1}",
                    s.completed_cases,
                    s.avg_coverage,
                    s.avg_accuracy,
                    s.avg_format,
                    s.avg_completeness,
                    s.avg_judge
                )
            })
            .unwrap_or_default();
        println!(
            "#{:<4} {:<10} {:<9} {:<32} {}",
            run.id,
            run.status.as_str(),
            run.kind.as_str(),
            run.name,
            means
        );
    }
}

fn fmt_score(v: Option<f64>) -> String {
    v.map(|v| format!("{:.2}", v)).unwrap_or_else(|| "-".into())
}

fn fmt_latency(ms: Option<u64>) -> String {
    match ms {
        Some(ms) => format!("{:.1}s", ms as f64 / 1000.0),
        None => "-".into(),
    }
}
