//! Command-line interface for the Health Gateway.
//!
//! This CLI tool provides commands for:
//! - notes: List, create and delete a patient's notes
//! - communications: List and publish communications
//! - agents: Search, provision and remove administrative agents
//! - report: Render a report and save the document
//!
//! Configuration via environment:
//! - GATEWAY_URL: Base URL of the gateway server (default: http://localhost:3000)
//! - GATEWAY_TOKEN: JWT Bearer token for authentication
//! - GATEWAY_HDID: Development identity, sent as `X-Hdid` when no token is set

mod commands;

use clap::{Parser, Subcommand};

use commands::{
    agents::AgentsArgs, communications::CommunicationsArgs, notes::NotesArgs, report::ReportArgs,
};

/// Health Gateway CLI
///
/// Talk to a gateway server from the command line. Output is JSON by
/// default; --human prints formatted text.
#[derive(Parser)]
#[command(name = "gateway")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Output human-readable formatted text instead of JSON
    #[arg(long, global = true)]
    human: bool,

    /// Gateway server URL
    #[arg(
        long,
        env = "GATEWAY_URL",
        default_value = "http://localhost:3000",
        global = true
    )]
    url: String,

    /// JWT Bearer token for authentication
    #[arg(long, env = "GATEWAY_TOKEN", global = true)]
    token: Option<String>,

    /// Development identity for servers that accept `X-Hdid`
    #[arg(long, env = "GATEWAY_HDID", global = true)]
    hdid: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage a patient's notes
    Notes(NotesArgs),

    /// Manage communications
    Communications(CommunicationsArgs),

    /// Manage administrative agents
    Agents(AgentsArgs),

    /// Render a report
    Report(ReportArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let client = match commands::build_client(cli.token.as_deref(), cli.hdid.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Notes(args) => commands::notes::execute(&client, &cli.url, cli.human, args).await,
        Commands::Communications(args) => {
            commands::communications::execute(&client, &cli.url, cli.human, args).await
        }
        Commands::Agents(args) => {
            commands::agents::execute(&client, &cli.url, cli.human, args).await
        }
        Commands::Report(args) => {
            commands::report::execute(&client, &cli.url, cli.human, args).await
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
