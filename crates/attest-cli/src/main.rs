use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

mod cli;
mod templates;

use cli::args::Cli;
use cli::commands::{dispatch, exit_codes};

fn init_logging(log_json: bool) {
    let level = std::env::var("ATTEST_LOG").unwrap_or_else(|_| "info".to_string());
    let filter = EnvFilter::try_new(&level).unwrap_or_else(|_| EnvFilter::new("info"));

    if log_json {
        fmt()
            .with_env_filter(filter)
            .json()
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .with_target(true)
            .with_current_span(false)
            .with_span_list(false)
            .with_writer(std::io::stderr)
            .init();
    } else {
        fmt()
            .with_env_filter(filter)
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }
}

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_json);
    let code = match dispatch(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("fatal: {e:?}");
            exit_codes::FATAL
        }
    };
    std::process::exit(code);
}
