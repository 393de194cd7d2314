//! NOTES command - List, create and delete a patient's notes.

use anyhow::{Result, bail};
use chrono::{NaiveDate, Utc};
use clap::{Args, Subcommand};
use colored::Colorize;
use gateway_core::{Hdid, RequestResult, UserNote};
use uuid::Uuid;

use super::{HumanReadable, format_timestamp, output, request_result, truncate};

/// Arguments for the notes command.
#[derive(Args)]
pub struct NotesArgs {
    #[command(subcommand)]
    pub command: NotesCommand,
}

#[derive(Subcommand)]
pub enum NotesCommand {
    /// List notes, newest first
    List {
        /// Patient HDID
        hdid: String,
        /// Zero-based page
        #[arg(long, default_value_t = 0)]
        page: i64,
        /// Notes per page
        #[arg(long)]
        page_size: Option<i64>,
    },

    /// Create a note
    Create {
        /// Patient HDID
        hdid: String,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        text: String,
        /// Journal date (YYYY-MM-DD), today when omitted
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Delete a note
    Delete {
        /// Patient HDID
        hdid: String,
        /// Note ID
        id: Uuid,
    },
}

impl HumanReadable for RequestResult<Vec<UserNote>> {
    fn print_human(&self) {
        let notes = self.resource_payload.as_deref().unwrap_or_default();

        println!("{}", "Notes".green().bold());
        println!("{}", "=".repeat(80));
        println!();

        if notes.is_empty() {
            println!("  {}", "(No notes)".dimmed());
            return;
        }

        for note in notes {
            println!(
                "  {} {}",
                note.journal_date.to_string().cyan(),
                truncate(note.title.as_deref().unwrap_or_default(), 60).bold()
            );
            println!("    {} {}", "ID:".cyan(), note.id);
            if let Some(text) = note.text.as_deref().filter(|t| !t.is_empty()) {
                println!("    {}", truncate(text, 72).dimmed());
            }
            println!(
                "    {} {}",
                "Updated:".cyan(),
                format_timestamp(&note.updated_date_time)
            );
            println!();
        }

        println!(
            "  {} {} (page {})",
            "Total:".cyan(),
            self.total_result_count.unwrap_or(notes.len() as i64),
            self.page_index.unwrap_or_default()
        );
    }
}

impl HumanReadable for RequestResult<UserNote> {
    fn print_human(&self) {
        match &self.resource_payload {
            Some(note) => {
                println!("{} {}", "Note:".green().bold(), note.id);
                println!(
                    "  {} {}",
                    "Title:".cyan(),
                    note.title.as_deref().unwrap_or_default()
                );
                println!("  {} {}", "Date:".cyan(), note.journal_date);
                println!("  {} {}", "Version:".cyan(), note.version);
            }
            None => println!("{}", "(No note returned)".dimmed()),
        }
    }
}

async fn list_notes(
    client: &reqwest::Client,
    base_url: &str,
    hdid: &str,
    page: i64,
    page_size: Option<i64>,
) -> Result<RequestResult<Vec<UserNote>>> {
    let url = format!("{}/api/notes/{}", base_url, hdid);
    let mut query = vec![("page", page.to_string())];
    if let Some(page_size) = page_size {
        query.push(("pageSize", page_size.to_string()));
    }
    Ok(request_result(client.get(&url).query(&query)).await?)
}

/// Execute the notes command.
pub async fn execute(
    client: &reqwest::Client,
    base_url: &str,
    human: bool,
    args: NotesArgs,
) -> Result<()> {
    match args.command {
        NotesCommand::List {
            hdid,
            page,
            page_size,
        } => {
            let result = list_notes(client, base_url, &hdid, page, page_size).await?;
            output(&result, human)
        }
        NotesCommand::Create {
            hdid,
            title,
            text,
            date,
        } => {
            let now = Utc::now();
            let note = UserNote {
                id: Uuid::new_v4(),
                hd_id: Hdid::from(hdid.as_str()),
                title: Some(title),
                text: Some(text),
                journal_date: date.unwrap_or_else(|| now.date_naive()),
                version: 0,
                created_date_time: now,
                updated_date_time: now,
            };

            let url = format!("{}/api/notes/{}", base_url, hdid);
            let result: RequestResult<UserNote> =
                request_result(client.post(&url).json(&note)).await?;
            output(&result, human)
        }
        NotesCommand::Delete { hdid, id } => {
            // The server needs the current version, so look the note up first
            let notes = list_notes(client, base_url, &hdid, 0, None).await?;
            let Some(note) = notes
                .resource_payload
                .unwrap_or_default()
                .into_iter()
                .find(|n| n.id == id)
            else {
                bail!("Note {} not found", id);
            };

            let url = format!("{}/api/notes/{}", base_url, hdid);
            let result: RequestResult<UserNote> =
                request_result(client.delete(&url).json(&note)).await?;
            output(&result, human)
        }
    }
}
