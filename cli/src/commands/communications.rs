//! COMMUNICATIONS command - List and publish communications.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use clap::{Args, Subcommand, ValueEnum};
use colored::Colorize;
use gateway_core::{Communication, CommunicationStatus, CommunicationType, RequestResult};
use uuid::Uuid;

use super::{HumanReadable, format_timestamp, output, request_result, truncate};

/// Arguments for the communications command.
#[derive(Args)]
pub struct CommunicationsArgs {
    #[command(subcommand)]
    pub command: CommunicationsCommand,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum Channel {
    Banner,
    InApp,
    Email,
}

impl From<Channel> for CommunicationType {
    fn from(channel: Channel) -> Self {
        match channel {
            Channel::Banner => Self::Banner,
            Channel::InApp => Self::InApp,
            Channel::Email => Self::Email,
        }
    }
}

#[derive(Subcommand)]
pub enum CommunicationsCommand {
    /// List every communication (requires AdminUser)
    List,

    /// Show the banner active right now
    Active,

    /// Publish a communication (requires AdminUser)
    Create {
        #[arg(long)]
        subject: String,
        #[arg(long)]
        text: String,
        #[arg(long, value_enum, default_value = "banner")]
        channel: Channel,
        #[arg(long, default_value_t = 0)]
        priority: i32,
        /// Start of the display window (RFC 3339), now when omitted
        #[arg(long)]
        effective: Option<DateTime<Utc>>,
        /// End of the display window (RFC 3339), a week after the start when omitted
        #[arg(long)]
        expiry: Option<DateTime<Utc>>,
    },
}

fn print_communication(communication: &Communication) {
    println!(
        "  [{}] {}",
        communication.communication_type.as_str().yellow(),
        communication.subject.bold()
    );
    println!("    {} {}", "ID:".cyan(), communication.id);
    println!("    {}", truncate(&communication.text, 72).dimmed());
    println!(
        "    {} {} - {}",
        "Window:".cyan(),
        format_timestamp(&communication.effective_date_time),
        format_timestamp(&communication.expiry_date_time)
    );
    println!(
        "    {} {}  {} {}",
        "Status:".cyan(),
        communication.communication_status.as_str(),
        "Priority:".cyan(),
        communication.priority
    );
    println!();
}

impl HumanReadable for RequestResult<Vec<Communication>> {
    fn print_human(&self) {
        let communications = self.resource_payload.as_deref().unwrap_or_default();

        println!("{}", "Communications".green().bold());
        println!("{}", "=".repeat(80));
        println!();

        if communications.is_empty() {
            println!("  {}", "(No communications)".dimmed());
            return;
        }
        communications.iter().for_each(print_communication);
        println!("  {} {}", "Total:".cyan(), communications.len());
    }
}

impl HumanReadable for RequestResult<Communication> {
    fn print_human(&self) {
        match &self.resource_payload {
            Some(communication) => print_communication(communication),
            None => println!("  {}", "(No active communication)".dimmed()),
        }
    }
}

/// Execute the communications command.
pub async fn execute(
    client: &reqwest::Client,
    base_url: &str,
    human: bool,
    args: CommunicationsArgs,
) -> Result<()> {
    match args.command {
        CommunicationsCommand::List => {
            let url = format!("{}/api/admin/communications", base_url);
            let result: RequestResult<Vec<Communication>> =
                request_result(client.get(&url)).await?;
            output(&result, human)
        }
        CommunicationsCommand::Active => {
            let url = format!("{}/api/communications/active", base_url);
            let result: RequestResult<Communication> = request_result(client.get(&url)).await?;
            output(&result, human)
        }
        CommunicationsCommand::Create {
            subject,
            text,
            channel,
            priority,
            effective,
            expiry,
        } => {
            let effective = effective.unwrap_or_else(Utc::now);
            let communication = Communication {
                id: Uuid::new_v4(),
                subject,
                text,
                communication_type: channel.into(),
                communication_status: CommunicationStatus::New,
                priority,
                effective_date_time: effective,
                expiry_date_time: expiry.unwrap_or(effective + Duration::days(7)),
                version: 0,
            };

            let url = format!("{}/api/admin/communications", base_url);
            let result: RequestResult<Communication> =
                request_result(client.post(&url).json(&communication)).await?;
            output(&result, human)
        }
    }
}
