// Configuration loading for the Skeleto container
//
// Settings are layered: built-in defaults, then configuration files in the
// order they are added, then `SKELETO_*` environment variables.

pub mod env;
pub mod error;
pub mod loader;
pub mod validation;

pub use env::{DEFAULT_PREFIX, EnvLoader};
pub use error::{ConfigError, Result};
pub use loader::{ConfigLoader, FileFormat};
pub use validation::{ConfigValidator, Validate};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use skeleto_core::logging::{LogConfig, LogFormat, LogLevel, LogOutput};
use skeleto_core::options::{ContainerOptions, DuplicatePolicy, TieBreak};
use std::collections::HashMap;
use std::path::Path;

/// Logging settings as they appear in configuration files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub level: LogLevel,
    pub format: LogFormat,
    /// Append to this file instead of stdout
    pub file: Option<String>,
    /// Write daily rotated files to this directory; wins over `file`
    pub rolling_directory: Option<String>,
    pub rolling_prefix: String,
    pub timestamps: bool,
    pub thread_ids: bool,
    pub targets: bool,
    pub file_line: bool,
    pub spans: bool,
    pub colors: bool,
    /// Filter directives such as `skeleto_core=trace`
    pub filter: Option<String>,
}

impl Default for LogSettings {
    fn default() -> Self {
        let log = LogConfig::default();
        Self {
            level: log.level,
            format: log.format,
            file: None,
            rolling_directory: None,
            rolling_prefix: "skeleto.log".to_string(),
            timestamps: log.timestamps,
            thread_ids: log.thread_ids,
            targets: log.targets,
            file_line: log.file_line,
            spans: log.spans,
            colors: log.colors,
            filter: None,
        }
    }
}

impl LogSettings {
    pub fn to_log_config(&self) -> LogConfig {
        let output = match (&self.rolling_directory, &self.file) {
            (Some(directory), _) => LogOutput::RollingFile {
                directory: directory.clone(),
                prefix: self.rolling_prefix.clone(),
            },
            (None, Some(file)) => LogOutput::File(file.clone()),
            (None, None) => LogOutput::Stdout,
        };

        let config = LogConfig::new()
            .level(self.level)
            .format(self.format)
            .output(output)
            .with_timestamps(self.timestamps)
            .with_thread_ids(self.thread_ids)
            .with_targets(self.targets)
            .with_file_line(self.file_line)
            .with_spans(self.spans)
            .with_colors(self.colors);

        match &self.filter {
            Some(filter) => config.with_env_filter(filter.clone()),
            None => config,
        }
    }
}

/// Complete configuration of a container process.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkeletoConfig {
    pub container: ContainerOptions,
    pub log: LogSettings,
}

impl SkeletoConfig {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// Apply environment overrides, keyed without prefix (`log_level`, ...).
    pub fn apply_env(&mut self, vars: &HashMap<String, String>) -> Result<()> {
        for (key, value) in vars {
            match key.as_str() {
                "duplicates" => {
                    self.container.duplicates = DuplicatePolicy::from_str(value).ok_or_else(|| invalid(key, value))?;
                }
                "tie_break" => {
                    self.container.tie_break = TieBreak::from_str(value).ok_or_else(|| invalid(key, value))?;
                }
                "log_level" => {
                    self.log.level = LogLevel::from_str(value).ok_or_else(|| invalid(key, value))?;
                }
                "log_format" => {
                    self.log.format = LogFormat::from_str(value).ok_or_else(|| invalid(key, value))?;
                }
                "log_file" => self.log.file = Some(value.clone()),
                "log_filter" => self.log.filter = Some(value.clone()),
                _ => {}
            }
        }
        Ok(())
    }
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}

impl Validate for SkeletoConfig {
    fn validate(&self) -> Result<()> {
        self.container.validate()?;
        ConfigValidator::not_empty_if_set(self.log.file.as_deref(), "log.file")?;
        ConfigValidator::not_empty_if_set(self.log.rolling_directory.as_deref(), "log.rolling_directory")?;
        ConfigValidator::not_empty(&self.log.rolling_prefix, "log.rolling_prefix")?;
        Ok(())
    }
}

/// Builds a [`SkeletoConfig`] from layered sources.
///
/// ```
/// use skeleto_config::{ConfigBuilder, FileFormat};
/// use skeleto_core::options::TieBreak;
///
/// let config = ConfigBuilder::new()
///     .source(FileFormat::Toml, "[container]\ntie_break = \"scan-order\"")
///     .unwrap()
///     .env_vars([("SKELETO_LOG_LEVEL", "debug")])
///     .build()
///     .unwrap();
///
/// assert_eq!(config.container.tie_break, TieBreak::ScanOrder);
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    layers: Vec<Value>,
    env: EnvLoader,
    vars: Vec<(String, String)>,
    process_env: bool,
}

impl ConfigBuilder {
    /// Builder reading no environment until asked to.
    pub fn new() -> Self {
        Self {
            layers: Vec::new(),
            env: EnvLoader::default(),
            vars: Vec::new(),
            process_env: false,
        }
    }

    /// Add a configuration file; its format follows the file name.
    pub fn file(mut self, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let loader = ConfigLoader::auto(path)?;
        let value = loader.load_file(path)?;
        self.push(loader.format(), value);
        Ok(self)
    }

    /// Add a configuration file if it exists.
    pub fn optional_file(self, path: impl AsRef<Path>) -> Result<Self> {
        if path.as_ref().exists() {
            self.file(path)
        } else {
            Ok(self)
        }
    }

    /// Add configuration text in the given format.
    pub fn source(mut self, format: FileFormat, content: &str) -> Result<Self> {
        let value = ConfigLoader::new(format).parse(content)?;
        self.push(format, value);
        Ok(self)
    }

    /// Load a `.env` file into the process environment and read it.
    ///
    /// Without a path, a missing `.env` in the working directory is ignored.
    pub fn dotenv(mut self, path: Option<&str>) -> Result<Self> {
        match path {
            Some(path) => {
                dotenvy::from_path(path).map_err(|e| ConfigError::LoadError(e.to_string()))?;
            }
            None => {
                dotenvy::dotenv().ok();
            }
        }
        self.process_env = true;
        Ok(self)
    }

    /// Read prefixed variables from the process environment.
    pub fn with_process_env(mut self) -> Self {
        self.process_env = true;
        self
    }

    /// Use a prefix other than `SKELETO`.
    pub fn env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env = EnvLoader::new(Some(prefix.into()));
        self
    }

    /// Add environment-style variables, applied after the process environment.
    pub fn env_vars<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.vars
            .extend(vars.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn build(self) -> Result<SkeletoConfig> {
        let mut merged =
            serde_json::to_value(SkeletoConfig::default()).map_err(|e| ConfigError::SerializationError(e.to_string()))?;
        for layer in self.layers {
            merge(&mut merged, layer);
        }

        let mut config: SkeletoConfig =
            serde_json::from_value(merged).map_err(|e| ConfigError::DeserializationError(e.to_string()))?;

        if self.process_env {
            config.apply_env(&self.env.load())?;
        }
        config.apply_env(&self.env.load_from(self.vars))?;

        config.validate()?;
        Ok(config)
    }

    fn push(&mut self, format: FileFormat, value: Value) {
        match format {
            // KEY=value files hold environment overrides, not structured settings
            FileFormat::Env => {
                if let Value::Object(map) = value {
                    self.vars.extend(
                        map.into_iter()
                            .filter_map(|(k, v)| v.as_str().map(|s| (k, s.to_string()))),
                    );
                }
            }
            _ => self.layers.push(value),
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Deep-merge `overlay` into `base`; objects merge key by key, anything else replaces.
pub fn merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let config = ConfigBuilder::new().build().unwrap();
        assert_eq!(config, SkeletoConfig::default());
        assert_eq!(config.container.tags.handler, "Handler");
        assert_eq!(config.log.level, LogLevel::Info);
    }

    #[test]
    fn test_merge_is_deep() {
        let mut base = json!({"container": {"tags": {"factory": "Factory", "handler": "Handler"}}});
        merge(&mut base, json!({"container": {"tags": {"factory": "Provider"}}}));
        assert_eq!(base, json!({"container": {"tags": {"factory": "Provider", "handler": "Handler"}}}));
    }

    #[test]
    fn test_later_layers_win() {
        let config = ConfigBuilder::new()
            .source(FileFormat::Json, r#"{"container": {"duplicates": "fail", "tie_break": "scan-order"}}"#)
            .unwrap()
            .source(FileFormat::Toml, "[container]\nduplicates = \"warn\"")
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(config.container.duplicates, DuplicatePolicy::Warn);
        assert_eq!(config.container.tie_break, TieBreak::ScanOrder);
    }

    #[test]
    fn test_env_overrides_files() {
        let config = ConfigBuilder::new()
            .source(FileFormat::Json, r#"{"log": {"level": "warn", "format": "pretty"}}"#)
            .unwrap()
            .env_vars([("SKELETO_LOG_LEVEL", "trace"), ("SKELETO_DUPLICATES", "fail")])
            .build()
            .unwrap();

        assert_eq!(config.log.level, LogLevel::Trace);
        assert_eq!(config.log.format, LogFormat::Pretty);
        assert_eq!(config.container.duplicates, DuplicatePolicy::Fail);
    }

    #[test]
    fn test_env_file_source() {
        let config = ConfigBuilder::new()
            .source(FileFormat::Env, "SKELETO_TIE_BREAK=scan-order\nSKELETO_LOG_FORMAT=compact")
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(config.container.tie_break, TieBreak::ScanOrder);
        assert_eq!(config.log.format, LogFormat::Compact);
    }

    #[test]
    fn test_invalid_env_value() {
        let err = ConfigBuilder::new()
            .env_vars([("SKELETO_TIE_BREAK", "random")])
            .build()
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid value for tie_break: random");
    }

    #[test]
    fn test_colliding_tags_fail_validation() {
        let err = ConfigBuilder::new()
            .source(FileFormat::Json, r#"{"container": {"tags": {"factory": "Handler"}}}"#)
            .unwrap()
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::Container(_)));
    }

    #[test]
    fn test_log_settings_to_log_config() {
        let settings = LogSettings {
            rolling_directory: Some("/var/log/skeleto".into()),
            file: Some("ignored.log".into()),
            filter: Some("skeleto_core=debug".into()),
            ..LogSettings::default()
        };
        let log = settings.to_log_config();
        assert_eq!(
            log.output,
            LogOutput::RollingFile {
                directory: "/var/log/skeleto".into(),
                prefix: "skeleto.log".into(),
            }
        );
        assert_eq!(log.env_filter.as_deref(), Some("skeleto_core=debug"));

        let file = LogSettings {
            file: Some("app.log".into()),
            ..LogSettings::default()
        };
        assert_eq!(file.to_log_config().output, LogOutput::File("app.log".into()));
        assert_eq!(LogSettings::default().to_log_config().output, LogOutput::Stdout);
    }

    #[test]
    fn test_timestamp_and_thread_switches_from_file() {
        let config = ConfigBuilder::new()
            .source(
                FileFormat::Toml,
                r#"
                [log]
                timestamps = false
                thread_ids = true
                "#,
            )
            .unwrap()
            .build()
            .unwrap();

        assert!(!config.log.timestamps);
        assert!(config.log.thread_ids);

        let log = config.log.to_log_config();
        assert!(!log.timestamps);
        assert!(log.thread_ids);
        assert!(LogSettings::default().to_log_config().timestamps);
    }
}
