//! AGENTS command - Search, provision and remove administrative agents.
//!
//! All subcommands require the AdminUser role.

use std::collections::BTreeSet;

use anyhow::Result;
use clap::{Args, Subcommand, ValueEnum};
use colored::Colorize;
use gateway_core::{AdminAgent, IdentityAccessRole, KeycloakIdentityProvider};
use serde::Serialize;
use uuid::Uuid;

use super::{HumanReadable, make_request, output};

/// Arguments for the agents command.
#[derive(Args)]
pub struct AgentsArgs {
    #[command(subcommand)]
    pub command: AgentsCommand,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum Provider {
    Idir,
    PhsaAzure,
}

impl From<Provider> for KeycloakIdentityProvider {
    fn from(provider: Provider) -> Self {
        match provider {
            Provider::Idir => Self::Idir,
            Provider::PhsaAzure => Self::PhsaAzure,
        }
    }
}

#[derive(Subcommand)]
pub enum AgentsCommand {
    /// Search agents by username
    List {
        /// Username fragment
        query: String,
    },

    /// Give a user access to the administration site
    Provision {
        /// Username without the identity provider suffix
        username: String,
        #[arg(long, value_enum, default_value = "idir")]
        provider: Provider,
        /// Role to grant (repeatable): AdminUser, AdminReviewer, AdminAnalyst, SupportUser
        #[arg(long = "role", required = true)]
        roles: Vec<IdentityAccessRole>,
    },

    /// Remove an agent
    Remove {
        /// Agent ID
        id: Uuid,
    },
}

#[derive(Debug, Serialize)]
pub struct AgentList(pub Vec<AdminAgent>);

fn print_agent(agent: &AdminAgent) {
    let roles: Vec<&str> = agent.roles.iter().map(|r| r.as_str()).collect();
    println!(
        "  {} {}",
        agent.username.bold(),
        format!("({:?})", agent.identity_provider).dimmed()
    );
    println!("    {} {}", "ID:".cyan(), agent.id);
    println!("    {} {}", "Roles:".cyan(), roles.join(", "));
    println!();
}

impl HumanReadable for AgentList {
    fn print_human(&self) {
        println!("{}", "Agents".green().bold());
        println!("{}", "=".repeat(80));
        println!();

        if self.0.is_empty() {
            println!("  {}", "(No matching agents)".dimmed());
            return;
        }
        self.0.iter().for_each(print_agent);
        println!("  {} {}", "Total:".cyan(), self.0.len());
    }
}

impl HumanReadable for AdminAgent {
    fn print_human(&self) {
        println!("{}", "Agent provisioned".green().bold());
        print_agent(self);
    }
}

#[derive(Debug, Serialize)]
pub struct RemovedAgent {
    pub id: Uuid,
    pub removed: bool,
}

impl HumanReadable for RemovedAgent {
    fn print_human(&self) {
        println!("{} {}", "Removed agent".green().bold(), self.id);
    }
}

/// Execute the agents command.
pub async fn execute(
    client: &reqwest::Client,
    base_url: &str,
    human: bool,
    args: AgentsArgs,
) -> Result<()> {
    let url = format!("{}/api/admin/agents", base_url);

    match args.command {
        AgentsCommand::List { query } => {
            let agents: Vec<AdminAgent> =
                make_request(client.get(&url).query(&[("query", query)])).await?;
            output(&AgentList(agents), human)
        }
        AgentsCommand::Provision {
            username,
            provider,
            roles,
        } => {
            let agent = AdminAgent {
                id: Uuid::nil(),
                username,
                identity_provider: provider.into(),
                roles: roles.into_iter().collect::<BTreeSet<_>>(),
            };
            let created: AdminAgent = make_request(client.post(&url).json(&agent)).await?;
            output(&created, human)
        }
        AgentsCommand::Remove { id } => {
            let response = client.delete(format!("{}/{}", url, id)).send().await?;
            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                anyhow::bail!("Server error ({}): {}", status.as_u16(), body);
            }
            output(&RemovedAgent { id, removed: true }, human)
        }
    }
}
