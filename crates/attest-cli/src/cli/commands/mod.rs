use super::args::*;
use attest_core::config::{load_config, HarnessConfig};
use attest_core::storage::Store;
use std::path::Path;

pub mod history;
pub mod run;

pub mod exit_codes {
    pub const OK: i32 = 0;
    pub const FATAL: i32 = 2;
}

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Init(args) => cmd_init(args),
        Command::Seed(args) => cmd_seed(args),
        Command::Run(args) => run::cmd_run(args).await,
        Command::Runs(args) => history::cmd_runs(args),
        Command::Show(args) => history::cmd_show(args),
        Command::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(exit_codes::OK)
        }
    }
}

/// Config file, then `--db`/`--schema` (or their env vars) on top.
pub(crate) fn resolve_config(args: &ConfigArgs) -> anyhow::Result<HarnessConfig> {
    let mut cfg = load_config(&args.config, args.strict_config)?;
    if let Some(db) = &args.db {
        cfg.db = db.clone();
    }
    if let Some(schema) = &args.schema {
        cfg.schema = schema.clone();
    }
    Ok(cfg)
}

pub(crate) fn open_store(cfg: &HarnessConfig) -> anyhow::Result<Store> {
    ensure_parent_dir(&cfg.db)?;
    let store = Store::open(&cfg.db, &cfg.schema)?;
    store.init_schema()?;
    Ok(store)
}

fn cmd_init(args: InitArgs) -> anyhow::Result<i32> {
    if !args.config.exists() {
        ensure_parent_dir(&args.config)?;
        attest_core::config::write_sample_config(&args.config)?;
        eprintln!("created {}", args.config.display());
    } else {
        eprintln!("note: {} already exists (skipped)", args.config.display());
    }
    if !args.fixtures.exists() {
        ensure_parent_dir(&args.fixtures)?;
        attest_core::fixtures::write_sample_fixtures(&args.fixtures)?;
        eprintln!("created {}", args.fixtures.display());
    } else {
        eprintln!("note: {} already exists (skipped)", args.fixtures.display());
    }
    if args.gitignore {
        write_file_if_missing(Path::new(".gitignore"), crate::templates::GITIGNORE)?;
    }
    Ok(exit_codes::OK)
}

fn cmd_seed(args: SeedArgs) -> anyhow::Result<i32> {
    let cfg = resolve_config(&args.cfg)?;
    cfg.validate()?;
    let cases = attest_core::fixtures::load_fixtures(&args.fixtures)?;
    let store = open_store(&cfg)?;
    let n = attest_core::fixtures::seed(&store, &cases)?;
    let (total, active) = store.count_test_cases()?;
    eprintln!(
        "seeded {} test cases from {} ({} total, {} active)",
        n,
        args.fixtures.display(),
        total,
        active
    );
    Ok(exit_codes::OK)
}

fn write_file_if_missing(path: &Path, content: &str) -> anyhow::Result<()> {
    ensure_parent_dir(path)?;
    if !path.exists() {
        std::fs::write(path, content)?;
        eprintln!("created {}", path.display());
    } else {
        eprintln!("note: {} already exists (skipped)", path.display());
    }
    Ok(())
}

fn ensure_parent_dir(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
