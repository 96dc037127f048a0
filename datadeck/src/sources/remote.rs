//! Importing spreadsheets from public URLs.
//!
//! One GET per import: no retries, a request timeout and a ceiling on the body
//! size. Failures go back to the caller, who may simply try again.

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::{info, instrument};
use url::Url;

use super::{ingest_bytes, DecodeOptions, SheetFormat};
use crate::config::DeckConfig;
use crate::error::{DeckError, Result};
use crate::logging::{truncate_field, DEFAULT_MAX_FIELD_LENGTH};
use crate::table::RowSet;

/// Limits applied to a single fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
    pub timeout: Duration,
    pub max_bytes: u64,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self::from_config(&DeckConfig::default())
    }
}

impl FetchOptions {
    pub fn from_config(config: &DeckConfig) -> Self {
        Self {
            timeout: config.fetch_timeout(),
            max_bytes: config.remote.max_download_bytes,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }
}

/// The raw result of a fetch.
#[derive(Debug, Clone)]
pub struct FetchedSheet {
    pub url: String,
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
    /// Last path segment of the URL, when there is one
    pub file_name: Option<String>,
}

impl FetchedSheet {
    /// Format from the URL's file name, then the content type, then the bytes.
    pub fn format(&self) -> SheetFormat {
        SheetFormat::detect(
            self.file_name.as_deref(),
            self.content_type.as_deref(),
            &self.bytes,
        )
    }
}

/// Parse a URL and accept only `http` and `https`.
pub fn validate_url(url: &str) -> Result<Url> {
    let parsed = Url::parse(url)?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(DeckError::InvalidUrl(format!(
            "unsupported scheme '{other}', only http and https are allowed"
        ))),
    }
}

/// Download a spreadsheet.
#[instrument(skip(url, options), fields(url = %truncate_field(url, DEFAULT_MAX_FIELD_LENGTH)))]
pub async fn fetch_sheet(url: &str, options: &FetchOptions) -> Result<FetchedSheet> {
    let parsed = validate_url(url)?;

    let client = Client::builder()
        .timeout(options.timeout)
        .build()
        .map_err(|e| DeckError::Configuration(format!("Failed to create HTTP client: {e}")))?;

    let mut response = client.get(parsed.clone()).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(DeckError::fetch(url, format!("server responded with {status}")));
    }

    if let Some(length) = response.content_length() {
        if length > options.max_bytes {
            return Err(too_large(url, options.max_bytes));
        }
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let mut bytes = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        if (bytes.len() + chunk.len()) as u64 > options.max_bytes {
            return Err(too_large(url, options.max_bytes));
        }
        bytes.extend_from_slice(&chunk);
    }

    let file_name = parsed
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|segment| !segment.is_empty())
        .map(str::to_string);

    Ok(FetchedSheet {
        url: url.to_string(),
        bytes,
        content_type,
        file_name,
    })
}

/// Download and decode a spreadsheet in one step.
pub async fn import_url(
    url: &str,
    fetch: &FetchOptions,
    decode: &DecodeOptions,
) -> Result<RowSet> {
    let sheet = fetch_sheet(url, fetch).await?;
    let format = sheet.format();
    let rows = ingest_bytes(&sheet.bytes, format, decode)?;
    info!(
        url = %truncate_field(url, DEFAULT_MAX_FIELD_LENGTH),
        format = format.name(),
        rows = rows.len(),
        "Imported spreadsheet from URL"
    );
    Ok(rows)
}

fn too_large(url: &str, max_bytes: u64) -> DeckError {
    DeckError::fetch(url, format!("response exceeds the {max_bytes} byte limit"))
}
