//! slp-gs: command-line client for SLP graph search
//!
//! Runs the same background graph search and trusted validation queues the
//! wallet uses, against any gs++ server.
//!
//! ## Example Usage
//!
//! ```bash
//! # Fetch the full token ancestry of a transaction
//! slp-gs search 4a5e1e4baab89f3a32518a88c31bc87f618f76673e2cc77ab2127b7afdeda33b
//!
//! # Same, as JSON, against a self-hosted server
//! slp-gs --host http://localhost:50051 --json search <TXID>
//!
//! # Ask the server whether transactions are valid SLP
//! slp-gs validate <TXID> <TXID>...
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};

mod gs_cli;

use gs_cli::{search::SearchCmd, validate::ValidateCmd};

#[derive(Parser)]
#[command(
    name = "slp-gs",
    author,
    version,
    about = "SLP graph search client",
    long_about = "Fetch SLP token transaction ancestry from a gs++ server in one request,\n\
                  or ask it for trusted validity results."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// gs++ host (default: $SLP_GS_HOST or https://gs.fountainhead.cash)
    #[arg(long, global = true)]
    host: Option<String>,

    /// Output as JSON instead of human-readable format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (debug logging)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Download the ancestry graph of a root transaction
    Search(SearchCmd),

    /// Query trusted validity for one or more transactions
    Validate(ValidateCmd),
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("slp_graph_search=debug,slp_transport=debug,slp_gs=debug,info")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("slp_graph_search=info,warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let Cli {
        command,
        host,
        json,
        verbose,
    } = Cli::parse();
    init_logging(verbose);

    let config = gs_cli::load_config(host.as_deref());

    match command {
        Commands::Search(cmd) => cmd.execute(config, json, verbose).await,
        Commands::Validate(cmd) => cmd.execute(config, json).await,
    }
}
