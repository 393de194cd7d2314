//! Command implementations for the gateway CLI.
//!
//! Each command module provides:
//! - Args struct for clap argument parsing
//! - execute() function that performs the command
//! - Human-readable and JSON output formatting

pub mod agents;
pub mod communications;
pub mod notes;
pub mod report;

use anyhow::Result;
use colored::Colorize;
use gateway_core::{RequestResult, ResultType};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Common error type for HTTP requests.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Request failed [{code}]: {message}")]
    Result { code: String, message: String },
}

/// Build an HTTP client with a Bearer token or a development identity.
pub fn build_client(token: Option<&str>, hdid: Option<&str>) -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();

    if let Some(token) = token {
        let value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|e| anyhow::anyhow!("Invalid token value: {}", e))?;
        headers.insert(AUTHORIZATION, value);
    } else if let Some(hdid) = hdid {
        let value = HeaderValue::from_str(hdid)
            .map_err(|e| anyhow::anyhow!("Invalid hdid value: {}", e))?;
        headers.insert(HeaderName::from_static("x-hdid"), value);
    }

    Ok(reqwest::Client::builder().default_headers(headers).build()?)
}

/// Print output in JSON or human-readable format.
pub fn output<T: Serialize + HumanReadable>(value: &T, human: bool) -> Result<()> {
    if human {
        value.print_human();
    } else {
        println!("{}", serde_json::to_string_pretty(value)?);
    }
    Ok(())
}

/// Trait for types that can be printed in human-readable format.
pub trait HumanReadable {
    fn print_human(&self);
}

/// Send a request and decode the JSON body of a successful response.
pub async fn make_request<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
) -> Result<T, CliError> {
    let response = request.send().await?;
    let status = response.status();

    if status.is_success() {
        return Ok(response.json::<T>().await?);
    }

    let body = response.text().await.unwrap_or_default();

    // Server errors look like {"error": {"code": ..., "message": ...}}
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|json| {
            json.pointer("/error/message")
                .and_then(|v| v.as_str())
                .map(str::to_string)
        })
        .unwrap_or(body);

    Err(CliError::Server {
        status: status.as_u16(),
        message,
    })
}

/// Send a request answered with a result envelope and fail on an `Error` status.
pub async fn request_result<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
) -> Result<RequestResult<T>, CliError> {
    let result: RequestResult<T> = make_request(request).await?;
    if result.result_status == ResultType::Error {
        let (code, message) = result
            .result_error
            .map(|e| (e.error_code, e.result_message))
            .unwrap_or_default();
        return Err(CliError::Result { code, message });
    }
    Ok(result)
}

/// Format a timestamp for human display.
pub fn format_timestamp(ts: &chrono::DateTime<chrono::Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Truncate a string for display, adding ellipsis if needed.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Print the action a caller must take before retrying, if any.
pub fn print_action_required<T>(result: &RequestResult<T>) {
    if result.result_status == ResultType::ActionRequired {
        if let Some(error) = &result.result_error {
            println!("{} {}", "Action required:".yellow().bold(), error.result_message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a long note title", 10), "a long ...");
        assert_eq!(truncate("ééééé", 4), "é...");
    }

    #[test]
    fn test_build_client_rejects_invalid_token() {
        assert!(build_client(Some("bad\ntoken"), None).is_err());
        assert!(build_client(None, Some("HDID-1")).is_ok());
        assert!(build_client(None, None).is_ok());
    }
}
