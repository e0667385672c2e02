//! chatroute CLI binary entry point.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use chatroute::cli::Cli;

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = chatroute::cli::run(cli).await {
        eprintln!("Error: {}", e.user_message());
        tracing::debug!(error = %e, "Command failed");
        std::process::exit(1);
    }
}
