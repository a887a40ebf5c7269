// Environment variable loading

use crate::{ConfigError, Result};
use std::collections::HashMap;
use std::env;

/// Prefix of every variable the container reads.
pub const DEFAULT_PREFIX: &str = "SKELETO";

/// Reads prefixed environment variables.
///
/// With prefix `SKELETO`, `SKELETO_LOG_LEVEL=debug` is reported as
/// `log_level = "debug"`.
#[derive(Debug, Clone)]
pub struct EnvLoader {
    prefix: Option<String>,
}

impl EnvLoader {
    pub fn new(prefix: Option<String>) -> Self {
        Self { prefix }
    }

    /// Load matching variables from the process environment.
    pub fn load(&self) -> HashMap<String, String> {
        self.load_from(env::vars())
    }

    /// Load matching variables from the given pairs.
    pub fn load_from<I, K, V>(&self, vars: I) -> HashMap<String, String>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        vars.into_iter()
            .filter_map(|(key, value)| self.strip(key.as_ref()).map(|k| (k.to_lowercase(), value.into())))
            .collect()
    }

    /// Load a single variable, e.g. `load_var("log_level")` reads `SKELETO_LOG_LEVEL`.
    pub fn load_var(&self, key: &str) -> Result<String> {
        env::var(self.full_key(key)).map_err(ConfigError::EnvError)
    }

    pub fn load_var_or(&self, key: &str, default: &str) -> String {
        self.load_var(key).unwrap_or_else(|_| default.to_string())
    }

    pub fn full_key(&self, key: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}_{}", prefix, key.to_uppercase()),
            None => key.to_uppercase(),
        }
    }

    fn strip<'a>(&self, key: &'a str) -> Option<&'a str> {
        match &self.prefix {
            Some(prefix) => key
                .strip_prefix(prefix.as_str())
                .and_then(|rest| rest.strip_prefix('_'))
                .filter(|rest| !rest.is_empty()),
            None => Some(key),
        }
    }
}

impl Default for EnvLoader {
    fn default() -> Self {
        Self::new(Some(DEFAULT_PREFIX.to_string()))
    }
}
