use anyhow::Result;
use clap::{Parser, Subcommand};
use todo_api::{
    app,
    config::{CheckConfig, ServerConfig},
    suite,
};
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "todo-api", about = "Todo REST API reference server and conformance check")]
struct Cli {
    /// Log level (error, warn, info, debug, trace).
    #[arg(long, env = "TODO_LOG_LEVEL", default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the reference Todo server.
    Serve(ServerConfig),
    /// Run the conformance groups against a running server.
    Check(CheckConfig),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    // initialize tracing
    todo_api::init_logging(&cli.log_level);

    match cli.command {
        Command::Serve(config) => app::serve(config).await,
        Command::Check(config) => check(config).await,
    }
}

async fn check(config: CheckConfig) -> Result<()> {
    info!(url = %config.url, "checking todo api");
    let report = suite::check(&config).await?;
    println!("{report}");
    report.ensure_success()
}
