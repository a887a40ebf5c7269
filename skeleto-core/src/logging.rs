//! Logging for the Skeleto container
//!
//! The pipeline logs through `tracing`: extraction, ordering and every
//! instantiation step emit `debug!`/`trace!` events with the component name
//! as a structured field, and non-fatal diagnostics go out at `warn!`.
//! Installing a subscriber is left to the application; [`LogConfig`] offers a
//! ready-made one.
//!
//! # Examples
//!
//! ```no_run
//! use skeleto_core::logging::*;
//!
//! let _guard = LogConfig::new()
//!     .level(LogLevel::Debug)
//!     .format(LogFormat::Pretty)
//!     .output(LogOutput::Stderr)
//!     .init();
//!
//! info!("Container logging configured");
//! ```

use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io;
use tracing::Level;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    fmt::{
        self,
        format::{DefaultFields, FmtSpan, Format, Full},
        time::FormatTime,
    },
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

pub use tracing::{debug, error, info, trace, warn};

/// Log level for filtering messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

static LEVELS: [(LogLevel, &str, Level); 5] = [
    (LogLevel::Trace, "trace", Level::TRACE),
    (LogLevel::Debug, "debug", Level::DEBUG),
    (LogLevel::Info, "info", Level::INFO),
    (LogLevel::Warn, "warn", Level::WARN),
    (LogLevel::Error, "error", Level::ERROR),
];

impl LogLevel {
    /// Case-insensitive; `warning` is accepted for `warn`.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        let s = s.to_ascii_lowercase();
        let s = if s == "warning" { "warn" } else { s.as_str() };
        LEVELS.iter().find(|(_, name, _)| *name == s).map(|(level, _, _)| *level)
    }

    pub fn to_tracing_level(&self) -> Level {
        self.entry().2
    }

    pub fn as_str(&self) -> &'static str {
        self.entry().1
    }

    fn entry(&self) -> &'static (LogLevel, &'static str, Level) {
        match self {
            LogLevel::Trace => &LEVELS[0],
            LogLevel::Debug => &LEVELS[1],
            LogLevel::Info => &LEVELS[2],
            LogLevel::Warn => &LEVELS[3],
            LogLevel::Error => &LEVELS[4],
        }
    }
}

/// Output format for log messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Structured, machine-readable (default)
    Json,
    Plain,
    /// Multi-line, for development
    Pretty,
    Compact,
}

impl LogFormat {
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        serde_json::from_value(serde_json::Value::String(s.to_ascii_lowercase())).ok()
    }
}

/// Output destination for logs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogOutput {
    Stdout,
    Stderr,
    /// Append to a single file
    File(String),
    /// Daily rotated files under `directory`
    RollingFile { directory: String, prefix: String },
}

/// Subscriber configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: LogLevel,
    pub format: LogFormat,
    pub output: LogOutput,
    pub timestamps: bool,
    pub thread_ids: bool,
    pub targets: bool,
    pub file_line: bool,
    pub spans: bool,
    pub colors: bool,
    /// Overrides `level` when set, e.g. `"skeleto_core=trace"`
    pub env_filter: Option<String>,
}

impl LogConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn output(mut self, output: LogOutput) -> Self {
        self.output = output;
        self
    }

    pub fn with_timestamps(mut self, enable: bool) -> Self {
        self.timestamps = enable;
        self
    }

    pub fn with_thread_ids(mut self, enable: bool) -> Self {
        self.thread_ids = enable;
        self
    }

    pub fn with_targets(mut self, enable: bool) -> Self {
        self.targets = enable;
        self
    }

    pub fn with_file_line(mut self, enable: bool) -> Self {
        self.file_line = enable;
        self
    }

    pub fn with_spans(mut self, enable: bool) -> Self {
        self.spans = enable;
        self
    }

    pub fn with_colors(mut self, enable: bool) -> Self {
        self.colors = enable;
        self
    }

    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Install the global subscriber.
    ///
    /// Returns the writer guard, which must be kept alive to flush logs.
    /// Returns `None` when the output cannot be opened or a global subscriber
    /// is already installed.
    pub fn init(self) -> Option<WorkerGuard> {
        let (writer, guard) = self.writer()?;
        let layer = self.layer(writer);

        tracing_subscriber::registry()
            .with(layer)
            .with(self.filter())
            .try_init()
            .ok()
            .map(|_| guard)
    }

    fn writer(&self) -> Option<(NonBlocking, WorkerGuard)> {
        let pair = match &self.output {
            LogOutput::Stdout => tracing_appender::non_blocking(io::stdout()),
            LogOutput::Stderr => tracing_appender::non_blocking(io::stderr()),
            LogOutput::File(path) => {
                let file = OpenOptions::new().create(true).append(true).open(path).ok()?;
                tracing_appender::non_blocking(file)
            }
            LogOutput::RollingFile { directory, prefix } => {
                tracing_appender::non_blocking(tracing_appender::rolling::daily(directory, prefix))
            }
        };
        Some(pair)
    }

    fn layer(&self, writer: NonBlocking) -> BoxedLayer {
        let span_events = if self.spans { FmtSpan::CLOSE } else { FmtSpan::NONE };
        let base = fmt::layer()
            .with_writer(writer)
            .with_target(self.targets)
            .with_thread_ids(self.thread_ids)
            .with_file(self.file_line)
            .with_line_number(self.file_line)
            .with_span_events(span_events);

        if self.timestamps {
            self.styled(base)
        } else {
            self.styled(base.without_time())
        }
    }

    fn styled<T>(&self, base: fmt::Layer<Registry, DefaultFields, Format<Full, T>, NonBlocking>) -> BoxedLayer
    where
        T: FormatTime + Send + Sync + 'static,
    {
        match self.format {
            // JSON never carries ANSI escapes
            LogFormat::Json => base.json().with_current_span(self.spans).boxed(),
            LogFormat::Plain => base.with_ansi(self.colors).boxed(),
            LogFormat::Pretty => base.pretty().with_ansi(self.colors).boxed(),
            LogFormat::Compact => base.compact().with_ansi(self.colors).boxed(),
        }
    }

    /// Explicit directives win, then `RUST_LOG`, then the configured level.
    fn filter(&self) -> EnvFilter {
        let fallback = || EnvFilter::new(self.level.as_str());
        match &self.env_filter {
            Some(directives) => EnvFilter::try_new(directives).unwrap_or_else(|_| fallback()),
            None => EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback()),
        }
    }
}

impl Default for LogConfig {
    /// JSON to STDOUT at INFO level
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Json,
            output: LogOutput::Stdout,
            timestamps: true,
            thread_ids: false,
            targets: true,
            file_line: false,
            spans: false,
            colors: false,
            env_filter: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_names_and_tracing_levels() {
        assert_eq!(LogLevel::Trace.to_tracing_level(), Level::TRACE);
        assert_eq!(LogLevel::Error.as_str(), "error");
        assert_eq!(LogLevel::Warn.to_tracing_level(), Level::WARN);
        assert_eq!(LogLevel::from_str("WARNING"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::from_str("verbose"), None);
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!(LogFormat::from_str("pretty"), Some(LogFormat::Pretty));
        assert_eq!(LogFormat::from_str("JSON"), Some(LogFormat::Json));
        assert_eq!(LogFormat::from_str("xml"), None);
    }

    #[test]
    fn test_defaults_are_json_on_stdout() {
        let config = LogConfig::default();
        assert_eq!(config.level, LogLevel::Info);
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.output, LogOutput::Stdout);
        assert!(config.timestamps);
        assert!(!config.thread_ids);
        assert!(config.targets);
    }

    #[test]
    fn test_builder_overrides() {
        let config = LogConfig::new()
            .level(LogLevel::Debug)
            .format(LogFormat::Compact)
            .with_colors(true)
            .with_timestamps(false)
            .with_thread_ids(true)
            .with_env_filter("skeleto_core=trace");

        assert_eq!(config.level, LogLevel::Debug);
        assert_eq!(config.format, LogFormat::Compact);
        assert!(config.colors);
        assert!(!config.timestamps);
        assert!(config.thread_ids);
        assert_eq!(config.env_filter.as_deref(), Some("skeleto_core=trace"));
    }

    #[test]
    fn test_unopenable_file_yields_no_guard() {
        let path = std::env::temp_dir().join("skeleto-missing-dir").join("nested").join("app.log");
        let guard = LogConfig::new().output(LogOutput::File(path.display().to_string())).init();
        assert!(guard.is_none());
    }

    #[test]
    fn test_layer_builds_for_every_format_and_clock() {
        for format in [LogFormat::Json, LogFormat::Plain, LogFormat::Pretty, LogFormat::Compact] {
            for timestamps in [true, false] {
                let (writer, _guard) = tracing_appender::non_blocking(io::sink());
                let config = LogConfig::new()
                    .format(format)
                    .with_timestamps(timestamps)
                    .with_thread_ids(!timestamps);
                let _layer = config.layer(writer);
            }
        }
    }
}
