pub mod commands;

use anyhow::Context;
use clap::{Parser, Subcommand};

use crate::config::AppConfig;

#[derive(Parser)]
#[command(name = "council-api")]
#[command(about = "Council beneficiary management API server")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP server (default)")]
    Serve,

    #[command(about = "Mint a signed session token for a staff member")]
    IssueToken {
        #[arg(long, help = "Subject identifier placed in the token")]
        subject: String,
        #[arg(long, help = "Role: admin, manager, data-entry or auditor")]
        role: String,
        #[arg(long, help = "Lifetime in hours (defaults to SECURITY_JWT_EXPIRY_HOURS)")]
        hours: Option<u64>,
    },
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("invalid configuration")?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => commands::serve::handle(config).await,
        Commands::IssueToken { subject, role, hours } => commands::token::handle(&config, &subject, &role, hours),
    }
}
