use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use ctl2mctl::config::{Cli, Config};
use ctl2mctl::error::RuntimeError;

#[tokio::main]
async fn main() {
    // Logs go to stderr; stdout carries motor frames (set RUST_LOG=debug for more)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(&Cli::parse()).await {
        error!("Runtime error: {}", e);
        std::process::exit(1);
    }

    // A pending blocking stdin read would otherwise hold up runtime shutdown
    std::process::exit(0);
}

async fn run(cli: &Cli) -> Result<(), RuntimeError> {
    let config = Config::load(cli)?;
    ctl2mctl::runtime::run(config).await
}
