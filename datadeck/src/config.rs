//! Library configuration.
//!
//! [`DeckConfig`] gathers every tunable in one serde structure. All fields
//! have defaults, so a partial JSON document is enough:
//!
//! ```rust
//! use datadeck::config::DeckConfig;
//!
//! let config = DeckConfig::from_json_str(r#"{ "profiler": { "topCategories": 10 } }"#).unwrap();
//! assert_eq!(config.profiler.top_categories, 10);
//! assert_eq!(config.aggregation.grouped_record_limit, 500);
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::analyzers::aggregation::{
    AggregationConfig, DEFAULT_GROUPED_RECORD_LIMIT, DEFAULT_RAW_RECORD_LIMIT,
};
use crate::analyzers::profiler::{ProfilerConfig, DEFAULT_TOP_CATEGORIES};
use crate::error::{DeckError, ErrorContext, Result};
use crate::sources::DecodeOptions;

/// Default timeout for a URL import, in milliseconds.
pub const DEFAULT_FETCH_TIMEOUT_MS: u64 = 30_000;
/// Default ceiling on the size of a downloaded spreadsheet.
pub const DEFAULT_MAX_DOWNLOAD_BYTES: u64 = 50 * 1024 * 1024;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DeckConfig {
    pub profiler: ProfilerSettings,
    pub aggregation: AggregationSettings,
    pub decoder: DecoderSettings,
    pub remote: RemoteSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProfilerSettings {
    /// Entries kept in categorical frequency tables
    pub top_categories: usize,
}

impl Default for ProfilerSettings {
    fn default() -> Self {
        Self {
            top_categories: DEFAULT_TOP_CATEGORIES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AggregationSettings {
    /// Cap for raw passthrough and plain count output
    pub raw_record_limit: usize,
    /// Cap for grouped sum/avg/count output
    pub grouped_record_limit: usize,
}

impl Default for AggregationSettings {
    fn default() -> Self {
        Self {
            raw_record_limit: DEFAULT_RAW_RECORD_LIMIT,
            grouped_record_limit: DEFAULT_GROUPED_RECORD_LIMIT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DecoderSettings {
    /// Whether the first non-blank row holds column names
    pub header_mode: bool,
    /// CSV field delimiter; must be ASCII
    pub delimiter: char,
}

impl Default for DecoderSettings {
    fn default() -> Self {
        Self {
            header_mode: true,
            delimiter: ',',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RemoteSettings {
    pub timeout_ms: u64,
    pub max_download_bytes: u64,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_FETCH_TIMEOUT_MS,
            max_download_bytes: DEFAULT_MAX_DOWNLOAD_BYTES,
        }
    }
}

impl DeckConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: DeckConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_json_str(&json)
    }

    /// Reject settings no engine can work with.
    pub fn validate(&self) -> Result<()> {
        if self.profiler.top_categories == 0 {
            return Err(DeckError::Configuration(
                "profiler.topCategories must be greater than 0".to_string(),
            ));
        }
        if self.aggregation.raw_record_limit == 0 || self.aggregation.grouped_record_limit == 0 {
            return Err(DeckError::Configuration(
                "aggregation record limits must be greater than 0".to_string(),
            ));
        }
        if !self.decoder.delimiter.is_ascii() {
            return Err(DeckError::Configuration(format!(
                "decoder.delimiter must be an ASCII character, got '{}'",
                self.decoder.delimiter
            )));
        }
        if self.remote.timeout_ms == 0 || self.remote.max_download_bytes == 0 {
            return Err(DeckError::Configuration(
                "remote timeout and download limit must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn with_top_categories(mut self, limit: usize) -> Self {
        self.profiler.top_categories = limit;
        self
    }

    pub fn with_raw_record_limit(mut self, limit: usize) -> Self {
        self.aggregation.raw_record_limit = limit;
        self
    }

    pub fn with_grouped_record_limit(mut self, limit: usize) -> Self {
        self.aggregation.grouped_record_limit = limit;
        self
    }

    pub fn with_header_mode(mut self, header_mode: bool) -> Self {
        self.decoder.header_mode = header_mode;
        self
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.decoder.delimiter = delimiter;
        self
    }

    /// Sub-millisecond timeouts round up to one millisecond. A zero timeout
    /// is kept and rejected by [`validate`](Self::validate).
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        let millis = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self.remote.timeout_ms = if millis == 0 && !timeout.is_zero() { 1 } else { millis };
        self
    }

    pub fn with_max_download_bytes(mut self, bytes: u64) -> Self {
        self.remote.max_download_bytes = bytes;
        self
    }

    pub fn profiler_config(&self) -> ProfilerConfig {
        ProfilerConfig {
            top_categories: self.profiler.top_categories,
        }
    }

    pub fn aggregation_config(&self) -> AggregationConfig {
        AggregationConfig::new()
            .with_raw_record_limit(self.aggregation.raw_record_limit)
            .with_grouped_record_limit(self.aggregation.grouped_record_limit)
    }

    /// Decoder defaults. A non-ASCII delimiter falls back to a comma.
    pub fn decode_options(&self) -> DecodeOptions {
        let delimiter = if self.decoder.delimiter.is_ascii() {
            self.decoder.delimiter as u8
        } else {
            b','
        };
        DecodeOptions::new()
            .header_mode(self.decoder.header_mode)
            .delimiter(delimiter)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.remote.timeout_ms)
    }
}
