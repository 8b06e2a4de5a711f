use super::exit_codes;
use super::{open_store, resolve_config};
use crate::cli::args::{RunsArgs, ShowArgs};
use attest_core::report::console;

pub fn cmd_runs(args: RunsArgs) -> anyhow::Result<i32> {
    let cfg = resolve_config(&args.cfg)?;
    let store = open_store(&cfg)?;
    let runs = store.list_runs(args.limit)?;
    console::print_runs(&runs);
    Ok(exit_codes::OK)
}

pub fn cmd_show(args: ShowArgs) -> anyhow::Result<i32> {
    let cfg = resolve_config(&args.cfg)?;
    let store = open_store(&cfg)?;
    let Some(run) = store.get_run(args.run_id)? else {
        anyhow::bail!("run {} not found", args.run_id);
    };

    let results = store.results_for_run(run.id)?;
    for r in &results {
        console::print_result_line(r);
    }
    eprintln!();
    eprintln!(
        "Run #{} \"{}\" [{} / {}] model={} created={}",
        run.id,
        run.name,
        run.kind.as_str(),
        run.status.as_str(),
        run.model,
        run.created_at
    );
    match &run.summary {
        Some(s) => console::print_summary_block(s),
        None => eprintln!("(run has no summary; it did not complete)"),
    }
    Ok(exit_codes::OK)
}
