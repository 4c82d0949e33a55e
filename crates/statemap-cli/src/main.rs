use clap::Parser;
use statemap_cli::cli::output::Styled;
use statemap_cli::Cli;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        "debug"
    } else if cli.quiet || cli.json {
        "warn"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("statemap={level},statemap_cli={level}"))),
        )
        .with_writer(std::io::stderr)
        .init();

    match statemap_cli::run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("  {} {e:#}", Styled::new().fail_sym());
            ExitCode::FAILURE
        }
    }
}
