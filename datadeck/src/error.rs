//! Error types for the datadeck library.
//!
//! Everything fallible in the crate returns [`DeckError`]. The profiling,
//! filtering and aggregation engines are infallible by construction; errors
//! come from the edges (decoding, fetching, persistence) and from edits that
//! reference things that do not exist.

use thiserror::Error;

/// The main error type for the datadeck library.
#[derive(Error, Debug)]
pub enum DeckError {
    /// The bytes could not be decoded as a spreadsheet.
    #[error("Failed to decode {format} data: {message}")]
    Decode {
        /// Format that was being decoded (e.g., "CSV", "XLSX")
        format: String,
        /// Detailed error message
        message: String,
        /// Optional underlying error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A remote spreadsheet could not be fetched.
    #[error("Failed to fetch '{url}': {message}")]
    Fetch {
        /// The requested URL
        url: String,
        /// Detailed error message
        message: String,
    },

    /// A URL was rejected before any request was made.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Error from I/O operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error from serialization/deserialization operations.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Error related to configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// An edit referenced a column that is not in the row set.
    #[error("Column '{column}' not found in dataset")]
    ColumnNotFound { column: String },

    /// An edit would produce two columns with the same name.
    #[error("Column '{column}' already exists")]
    DuplicateColumn { column: String },

    /// An edit referenced a row past the end of the row set.
    #[error("Row {index} is out of bounds for a row set of {len} rows")]
    RowOutOfBounds { index: usize, len: usize },

    /// No project with the given id exists in the store.
    #[error("Project '{id}' not found")]
    ProjectNotFound { id: String },

    /// No chart with the given id exists in the project.
    #[error("Chart '{id}' not found")]
    ChartNotFound { id: String },

    /// Generic internal error for unexpected conditions.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A type alias for `Result<T, DeckError>`.
///
/// # Examples
///
/// ```rust
/// use datadeck::error::Result;
///
/// fn load_something() -> Result<()> {
///     Ok(())
/// }
/// # load_something().unwrap();
/// ```
pub type Result<T> = std::result::Result<T, DeckError>;

impl DeckError {
    /// Creates a new decode error.
    pub fn decode(format: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            format: format.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new decode error with a source error.
    pub fn decode_with_source(
        format: impl Into<String>,
        message: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::Decode {
            format: format.into(),
            message: message.into(),
            source: Some(source),
        }
    }

    /// Creates a new fetch error.
    pub fn fetch(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Fetch {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Creates a column-not-found error.
    pub fn column_not_found(column: impl Into<String>) -> Self {
        Self::ColumnNotFound {
            column: column.into(),
        }
    }
}

impl From<serde_json::Error> for DeckError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<csv::Error> for DeckError {
    fn from(err: csv::Error) -> Self {
        let message = err.to_string();
        Self::decode_with_source("CSV", message, Box::new(err))
    }
}

impl From<calamine::XlsxError> for DeckError {
    fn from(err: calamine::XlsxError) -> Self {
        Self::decode("XLSX", err.to_string())
    }
}

#[cfg(feature = "remote")]
impl From<url::ParseError> for DeckError {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidUrl(err.to_string())
    }
}

#[cfg(feature = "remote")]
impl From<reqwest::Error> for DeckError {
    fn from(err: reqwest::Error) -> Self {
        let url = err
            .url()
            .map(|u| u.to_string())
            .unwrap_or_else(|| "<unknown>".to_string());
        Self::fetch(url, err.to_string())
    }
}

/// Extension trait for adding context to errors.
pub trait ErrorContext<T> {
    /// Adds context to an error.
    fn context(self, msg: &str) -> Result<T>;

    /// Adds context with a lazy message.
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<DeckError>,
{
    fn context(self, msg: &str) -> Result<T> {
        self.map_err(|e| match e.into() {
            DeckError::Internal(inner) => DeckError::Internal(format!("{msg}: {inner}")),
            other => DeckError::Internal(format!("{msg}: {other}")),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let msg = f();
            match e.into() {
                DeckError::Internal(inner) => DeckError::Internal(format!("{msg}: {inner}")),
                other => DeckError::Internal(format!("{msg}: {other}")),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_decode_error() {
        let err = DeckError::decode("CSV", "unterminated quote");
        assert_eq!(err.to_string(), "Failed to decode CSV data: unterminated quote");
    }

    #[test]
    fn test_decode_error_with_source() {
        let source = std::io::Error::new(std::io::ErrorKind::InvalidData, "bad zip");
        let err = DeckError::decode_with_source("XLSX", "not a workbook", Box::new(source));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_column_not_found() {
        let err = DeckError::column_not_found("revenue");
        assert_eq!(err.to_string(), "Column 'revenue' not found in dataset");
    }

    #[test]
    fn test_row_out_of_bounds() {
        let err = DeckError::RowOutOfBounds { index: 7, len: 3 };
        assert_eq!(
            err.to_string(),
            "Row 7 is out of bounds for a row set of 3 rows"
        );
    }

    #[test]
    fn test_serde_json_conversion() {
        let parse: std::result::Result<serde_json::Value, _> = serde_json::from_str("{");
        let err: DeckError = parse.unwrap_err().into();
        assert!(matches!(err, DeckError::Serialization(_)));
    }

    #[test]
    fn test_error_context() {
        fn failing_operation() -> Result<()> {
            Err(DeckError::Internal("disk full".to_string()))
        }

        let err = failing_operation()
            .context("While saving project")
            .unwrap_err();
        assert_eq!(err.to_string(), "Internal error: While saving project: disk full");
    }

    #[test]
    fn test_error_with_lazy_context() {
        let io: std::result::Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "missing",
        ));
        let err = io.with_context(|| "reading p1.json".to_string()).unwrap_err();
        assert!(err.to_string().contains("reading p1.json"));
        assert!(err.to_string().contains("missing"));
    }
}
