//! REPORT command - Render a report and save the document.

use std::path::PathBuf;

use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use clap::{Args, ValueEnum};
use colored::Colorize;
use gateway_core::RequestResult;
use gateway_core::health::{ReportFormatType, ReportModel, ReportRequest, ReportTemplate};
use serde::Serialize;

use super::{HumanReadable, output, print_action_required, request_result};

#[derive(Clone, Copy, ValueEnum)]
pub enum Template {
    Medication,
    Immunization,
    Laboratory,
    Encounter,
    Notes,
    DependentImmunization,
}

impl From<Template> for ReportTemplate {
    fn from(template: Template) -> Self {
        match template {
            Template::Medication => Self::Medication,
            Template::Immunization => Self::Immunization,
            Template::Laboratory => Self::Laboratory,
            Template::Encounter => Self::Encounter,
            Template::Notes => Self::Notes,
            Template::DependentImmunization => Self::DependentImmunization,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum Format {
    Pdf,
    Csv,
    Xlsx,
}

impl From<Format> for ReportFormatType {
    fn from(format: Format) -> Self {
        match format {
            Format::Pdf => Self::Pdf,
            Format::Csv => Self::Csv,
            Format::Xlsx => Self::Xlsx,
        }
    }
}

/// Arguments for the report command.
#[derive(Args)]
pub struct ReportArgs {
    #[arg(long, value_enum)]
    pub template: Template,

    #[arg(long, value_enum, default_value = "pdf")]
    pub format: Format,

    /// JSON file holding the report data
    #[arg(long)]
    pub data: PathBuf,

    /// Directory to write the document to
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,
}

/// Outcome of a saved report.
#[derive(Debug, Serialize)]
pub struct SavedReport {
    pub file_name: String,
    pub path: PathBuf,
    pub bytes: usize,
}

impl HumanReadable for SavedReport {
    fn print_human(&self) {
        println!("{} {}", "Report saved:".green().bold(), self.path.display());
        println!("  {} {} bytes", "Size:".cyan(), self.bytes);
    }
}

/// Execute the report command.
pub async fn execute(
    client: &reqwest::Client,
    base_url: &str,
    human: bool,
    args: ReportArgs,
) -> Result<()> {
    let raw = tokio::fs::read_to_string(&args.data)
        .await
        .with_context(|| format!("Failed to read {}", args.data.display()))?;
    let data: serde_json::Value = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not valid JSON", args.data.display()))?;

    let request = ReportRequest {
        data,
        template: args.template.into(),
        format: args.format.into(),
    };

    let url = format!("{}/api/reports", base_url);
    let result: RequestResult<ReportModel> =
        request_result(client.post(&url).json(&request)).await?;
    if human {
        print_action_required(&result);
    }
    let report = result
        .resource_payload
        .context("Server returned no report document")?;

    let document = STANDARD
        .decode(report.data.as_bytes())
        .context("Report document is not valid base64")?;
    let path = args.out_dir.join(&report.file_name);
    tokio::fs::write(&path, &document)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;

    output(
        &SavedReport {
            file_name: report.file_name,
            path,
            bytes: document.len(),
        },
        human,
    )
}
