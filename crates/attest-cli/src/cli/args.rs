use attest_core::config::DEFAULT_CONFIG_FILE;
use attest_core::model::RunKind;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "attest",
    version,
    about = "Evaluation and safety scoring for generated prior-authorization letters"
)]
pub struct Cli {
    /// emit logs as JSON lines on stderr (level via ATTEST_LOG)
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// write a sample attest.yaml and fixtures file
    Init(InitArgs),
    /// load golden test cases into the database
    Seed(SeedArgs),
    /// generate and score a letter for every active test case
    Run(RunArgs),
    /// list recent runs
    Runs(RunsArgs),
    /// show the stored results of one run
    Show(ShowArgs),
    Version,
}

/// Settings shared by every command that touches the database.
#[derive(Args, Clone, Debug)]
pub struct ConfigArgs {
    #[arg(long, default_value = DEFAULT_CONFIG_FILE, env = "ATTEST_CONFIG")]
    pub config: PathBuf,

    /// reject unknown keys in the config file
    #[arg(long)]
    pub strict_config: bool,

    #[arg(long, env = "ATTEST_DB")]
    pub db: Option<PathBuf>,

    /// database schema holding the harness tables
    #[arg(long, env = "ATTEST_SCHEMA")]
    pub schema: Option<String>,
}

#[derive(Parser, Clone)]
pub struct InitArgs {
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    #[arg(long, default_value = "fixtures.yaml")]
    pub fixtures: PathBuf,

    /// generate .gitignore for the database directory
    #[arg(long)]
    pub gitignore: bool,
}

#[derive(Parser, Clone)]
pub struct SeedArgs {
    #[command(flatten)]
    pub cfg: ConfigArgs,

    #[arg(long)]
    pub fixtures: PathBuf,
}

#[derive(Parser, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub cfg: ConfigArgs,

    /// generation endpoint (chat API URL)
    #[arg(long, env = "ATTEST_ENDPOINT")]
    pub endpoint: Option<String>,

    #[arg(long, env = "ATTEST_MODEL")]
    pub model: Option<String>,

    /// run name (default: "<date> <model>")
    #[arg(long)]
    pub name: Option<String>,

    /// automated|manual
    #[arg(long, default_value = "automated", value_parser = parse_kind)]
    pub kind: RunKind,

    /// skip the second-opinion judge
    #[arg(long)]
    pub no_judge: bool,

    /// also write the run (summary and rows) as JSON
    #[arg(long)]
    pub json: Option<PathBuf>,
}

#[derive(Parser, Clone)]
pub struct RunsArgs {
    #[command(flatten)]
    pub cfg: ConfigArgs,

    #[arg(long, default_value_t = 20)]
    pub limit: u32,
}

#[derive(Parser, Clone)]
pub struct ShowArgs {
    #[command(flatten)]
    pub cfg: ConfigArgs,

    #[arg(long)]
    pub run_id: i64,
}

fn parse_kind(s: &str) -> Result<RunKind, String> {
    RunKind::parse(s).ok_or_else(|| format!("unknown run kind '{}' (expected automated|manual)", s))
}
