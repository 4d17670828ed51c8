//! Logging setup for service-container
//!
//! Every container event is emitted through `tracing` under the
//! `service_container` target: registrations at `debug`, per-resolution details
//! at `trace`. This module installs a `tracing-subscriber` for applications that
//! do not bring their own.
//!
//! # Features
//!
//! - `logging` - Emit container events (default)
//! - `logging-json` - JSON subscriber output (production)
//! - `logging-pretty` - Human-readable subscriber output (development)
//!
//! Without either subscriber feature the `init*` helpers do nothing.
//!
//! # Example
//!
//! ```rust,ignore
//! use service_container::logging;
//!
//! logging::init();
//!
//! // Or trace resolution details of the container only
//! logging::builder()
//!     .trace()
//!     .container_only()
//!     .pretty()
//!     .init();
//! ```

use tracing::Level;

/// Target every container event is logged under
pub const TARGET: &str = "service_container";

/// Subscriber output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// JSON lines
    #[default]
    Json,
    /// Multi-line, colored
    Pretty,
    /// Single line per event
    Compact,
}

/// Builder for the subscriber installed by [`LoggingBuilder::init`].
#[derive(Debug, Clone)]
pub struct LoggingBuilder {
    level: Level,
    format: LogFormat,
    target: Option<&'static str>,
    with_file: bool,
    with_line_number: bool,
    with_thread_ids: bool,
    with_thread_names: bool,
}

impl Default for LoggingBuilder {
    fn default() -> Self {
        Self {
            level: Level::DEBUG,
            format: LogFormat::Json,
            target: None,
            with_file: false,
            with_line_number: false,
            with_thread_ids: false,
            with_thread_names: false,
        }
    }
}

impl LoggingBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the minimum level
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Show per-resolution events (instance hits, explicit parameters, fallbacks)
    pub fn trace(self) -> Self {
        self.with_level(Level::TRACE)
    }

    /// Show registrations, rebinds and cache writes
    pub fn debug(self) -> Self {
        self.with_level(Level::DEBUG)
    }

    pub fn info(self) -> Self {
        self.with_level(Level::INFO)
    }

    pub fn warn(self) -> Self {
        self.with_level(Level::WARN)
    }

    pub fn error(self) -> Self {
        self.with_level(Level::ERROR)
    }

    /// Only show events whose target starts with `target`
    pub fn with_target_filter(mut self, target: &'static str) -> Self {
        self.target = Some(target);
        self
    }

    /// Only show container events
    pub fn container_only(self) -> Self {
        self.with_target_filter(TARGET)
    }

    pub fn with_file(mut self) -> Self {
        self.with_file = true;
        self
    }

    pub fn with_line_number(mut self) -> Self {
        self.with_line_number = true;
        self
    }

    pub fn with_thread_ids(mut self) -> Self {
        self.with_thread_ids = true;
        self
    }

    pub fn with_thread_names(mut self) -> Self {
        self.with_thread_names = true;
        self
    }

    pub fn json(mut self) -> Self {
        self.format = LogFormat::Json;
        self
    }

    pub fn pretty(mut self) -> Self {
        self.format = LogFormat::Pretty;
        self
    }

    pub fn compact(mut self) -> Self {
        self.format = LogFormat::Compact;
        self
    }

    /// Filter directives handed to `EnvFilter`
    fn directives(&self) -> String {
        match self.target {
            Some(target) => format!("{}={}", target, self.level),
            None => self.level.to_string(),
        }
    }

    /// Install the subscriber as the global default.
    ///
    /// Returns `false` when a global subscriber was already installed.
    #[cfg(any(feature = "logging-json", feature = "logging-pretty"))]
    pub fn init(self) -> bool {
        use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, prelude::*};

        let filter = EnvFilter::new(self.directives());

        let layer = fmt::layer()
            .with_file(self.with_file)
            .with_line_number(self.with_line_number)
            .with_thread_ids(self.with_thread_ids)
            .with_thread_names(self.with_thread_names)
            .with_target(true);

        let layer: Box<dyn Layer<Registry> + Send + Sync> = match self.format {
            #[cfg(feature = "logging-json")]
            LogFormat::Json => layer.json().boxed(),
            // JSON output needs `logging-json`; use the default formatter otherwise
            #[cfg(not(feature = "logging-json"))]
            LogFormat::Json => layer.boxed(),
            LogFormat::Pretty => layer.pretty().boxed(),
            LogFormat::Compact => layer.compact().boxed(),
        };

        tracing_subscriber::registry()
            .with(layer)
            .with(filter)
            .try_init()
            .is_ok()
    }

    /// No subscriber feature enabled: nothing to install.
    #[cfg(not(any(feature = "logging-json", feature = "logging-pretty")))]
    pub fn init(self) -> bool {
        false
    }
}

/// Create a new logging builder
pub fn builder() -> LoggingBuilder {
    LoggingBuilder::new()
}

/// Initialize logging with default settings.
///
/// JSON when `logging-json` is enabled, pretty output otherwise.
pub fn init() -> bool {
    if cfg!(feature = "logging-json") {
        init_json()
    } else {
        init_pretty()
    }
}

/// JSON lines at `debug`, for log aggregation.
///
/// ```json
/// {"timestamp":"2026-01-01T00:00:00.000Z","level":"DEBUG","fields":{"message":"Registering binding","service":"cache","shared":true},"target":"service_container"}
/// ```
pub fn init_json() -> bool {
    builder().json().debug().init()
}

/// Human-readable output at `debug`.
pub fn init_pretty() -> bool {
    builder().pretty().debug().init()
}

/// Container events only, at `trace`.
pub fn init_container_only() -> bool {
    builder().container_only().trace().init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let builder = LoggingBuilder::default();
        assert_eq!(builder.level, Level::DEBUG);
        assert_eq!(builder.format, LogFormat::Json);
        assert!(builder.target.is_none());
        assert_eq!(builder.directives(), "DEBUG");
    }

    #[test]
    fn test_builder_chain() {
        let builder = LoggingBuilder::new()
            .trace()
            .pretty()
            .with_file()
            .with_line_number()
            .container_only();

        assert_eq!(builder.level, Level::TRACE);
        assert_eq!(builder.format, LogFormat::Pretty);
        assert!(builder.with_file);
        assert!(builder.with_line_number);
        assert_eq!(builder.target, Some(TARGET));
        assert_eq!(builder.directives(), "service_container=TRACE");
    }

    #[test]
    fn test_container_events_are_emitted() {
        // Runs without a global subscriber; exercises every log call site
        let container = crate::Container::new();
        container.bind("a", Some(crate::Concrete::of("b")), true).unwrap();
        container.alias("a", "alias").unwrap();
        assert!(container.make("alias").is_err());
    }
}
