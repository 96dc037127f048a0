//! Logging configuration and helpers for datadeck.
//!
//! The library only emits `tracing` events; installing a subscriber is up to
//! the application. [`setup::init_logging`] is a convenience for binaries and
//! tests that want the usual `fmt` output with an env filter.

use tracing::Level;

/// Default cap on the length of logged field values.
pub const DEFAULT_MAX_FIELD_LENGTH: usize = 256;

/// Controls how chatty the pipeline is about its inputs.
///
/// Filter specs and URLs can be large or user-supplied, so they are only
/// logged when asked for and always truncated.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Base log level for datadeck components
    pub base_level: Level,
    /// Whether to log the filter specs and aggregation specs being applied
    pub log_spec_details: bool,
    /// Maximum length for logged field values
    pub max_field_length: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            base_level: Level::INFO,
            log_spec_details: false,
            max_field_length: DEFAULT_MAX_FIELD_LENGTH,
        }
    }
}

impl LogConfig {
    /// Everything on, long fields.
    pub fn verbose() -> Self {
        Self {
            base_level: Level::DEBUG,
            log_spec_details: true,
            max_field_length: 1024,
        }
    }

    /// Warnings only.
    pub fn production() -> Self {
        Self {
            base_level: Level::WARN,
            log_spec_details: false,
            max_field_length: 128,
        }
    }

    /// Truncate a value to this config's field length.
    pub fn field(&self, value: &str) -> String {
        truncate_field(value, self.max_field_length)
    }

    /// Subscriber settings matching this config: `base_level` for datadeck,
    /// warnings for everything else.
    pub fn subscriber_config(&self) -> setup::LoggingConfig {
        setup::LoggingConfig::default()
            .with_level(Level::WARN)
            .with_deck_level(self.base_level)
    }
}

/// Debug-log spec details only when the config asks for them.
#[macro_export]
macro_rules! log_spec {
    ($config:expr, $($arg:tt)*) => {
        if $config.log_spec_details {
            tracing::debug!($($arg)*);
        }
    };
}

/// Truncates a string to at most `max_length` bytes, on a char boundary.
pub fn truncate_field(value: &str, max_length: usize) -> String {
    if value.len() <= max_length {
        return value.to_string();
    }
    let mut end = max_length;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...(truncated)", &value[..end])
}

/// Subscriber setup for applications embedding datadeck.
pub mod setup {
    use tracing::Level;

    /// Subscriber configuration.
    #[derive(Debug, Clone)]
    pub struct LoggingConfig {
        /// Log level for everything else
        pub level: Level,
        /// Log level for the `datadeck` target
        pub deck_level: Level,
        /// Whether to use JSON output format
        pub json_format: bool,
        /// Environment filter override
        pub env_filter: Option<String>,
    }

    impl Default for LoggingConfig {
        fn default() -> Self {
            Self {
                level: Level::INFO,
                deck_level: Level::DEBUG,
                json_format: false,
                env_filter: None,
            }
        }
    }

    impl LoggingConfig {
        /// JSON output, quiet dependencies.
        pub fn production() -> Self {
            Self {
                level: Level::WARN,
                deck_level: Level::INFO,
                json_format: true,
                env_filter: None,
            }
        }

        pub fn development() -> Self {
            Self {
                level: Level::DEBUG,
                deck_level: Level::DEBUG,
                json_format: false,
                env_filter: None,
            }
        }

        pub fn with_level(mut self, level: Level) -> Self {
            self.level = level;
            self
        }

        pub fn with_deck_level(mut self, level: Level) -> Self {
            self.deck_level = level;
            self
        }

        pub fn with_json_format(mut self, enabled: bool) -> Self {
            self.json_format = enabled;
            self
        }

        pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
            self.env_filter = Some(filter.into());
            self
        }

        /// Builds the environment filter directive string.
        pub fn env_filter(&self) -> String {
            match &self.env_filter {
                Some(filter) => filter.clone(),
                None => format!(
                    "{},datadeck={}",
                    self.level.as_str().to_lowercase(),
                    self.deck_level.as_str().to_lowercase()
                ),
            }
        }
    }

    /// Installs a global `fmt` subscriber.
    ///
    /// `RUST_LOG` takes precedence over the configured filter. Fails if a
    /// global subscriber is already installed.
    ///
    /// ```rust,no_run
    /// use datadeck::logging::setup::{init_logging, LoggingConfig};
    ///
    /// init_logging(LoggingConfig::development().with_json_format(true)).unwrap();
    /// ```
    pub fn init_logging(config: LoggingConfig) -> crate::error::Result<()> {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.env_filter()));

        let fmt_layer = if config.json_format {
            tracing_subscriber::fmt::layer().json().boxed()
        } else {
            tracing_subscriber::fmt::layer().boxed()
        };

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .map_err(|e| crate::error::DeckError::Configuration(e.to_string()))
    }
}
