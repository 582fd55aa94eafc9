use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use picoclaw_runtime::Runtime;
use tracing::{error, info};

#[derive(Debug, Parser)]
#[command(name = "picoclawd")]
#[command(about = "PicoClaw verified core: framed JSON-RPC over stdio")]
struct Cli {
    /// Tracing filter for stderr diagnostics (stdout carries the protocol).
    #[arg(long, default_value = "info")]
    log_filter: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(cli.log_filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    info!(version = picoclaw_runtime::CORE_VERSION, "core starting");

    let runtime = Runtime::new();
    match runtime.serve(tokio::io::stdin(), tokio::io::stdout()).await {
        Ok(()) => {
            info!("clean shutdown");
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            error!(error = %err, "fatal transport failure");
            Ok(ExitCode::FAILURE)
        }
    }
}
