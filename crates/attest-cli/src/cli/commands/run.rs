use super::exit_codes;
use super::{open_store, resolve_config};
use crate::cli::args::RunArgs;
use attest_core::engine::{RunOutcome, RunRequest, RunSettings, Runner};
use attest_core::judge::{JudgeRuntimeConfig, JudgeService};
use attest_core::providers::llm::{HttpChatClient, LlmClient};
use attest_core::report;
use std::sync::Arc;

pub async fn cmd_run(args: RunArgs) -> anyhow::Result<i32> {
    let mut cfg = resolve_config(&args.cfg)?;
    if let Some(endpoint) = &args.endpoint {
        cfg.endpoint = endpoint.clone();
    }
    if let Some(model) = &args.model {
        cfg.model = model.clone();
    }
    cfg.validate()?;

    let store = open_store(&cfg)?;
    let client: Arc<dyn LlmClient> = Arc::new(HttpChatClient::from_config(&cfg));

    let judge = if cfg.judge.enabled && !args.no_judge {
        Some(JudgeService::new(
            JudgeRuntimeConfig::from_config(&cfg),
            client.clone(),
        ))
    } else {
        tracing::info!("judge disabled for this run");
        None
    };

    let runner = Runner {
        store: Arc::new(store),
        client,
        metrics: attest_metrics::default_metrics(),
        safety: attest_metrics::default_safety_checks(),
        judge,
        settings: RunSettings::from_config(&cfg),
    };

    let request = RunRequest {
        name: args.name.clone(),
        kind: args.kind,
    };

    match runner.run(&request).await? {
        RunOutcome::NoTestCases => {
            report::console::print_no_cases();
        }
        RunOutcome::Completed(artifacts) => {
            report::console::print_summary(&artifacts);
            if let Some(path) = &args.json {
                report::json::write_json(&artifacts, path)?;
                eprintln!("wrote {}", path.display());
            }
        }
    }
    Ok(exit_codes::OK)
}
