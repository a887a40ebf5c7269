// Configuration validation

use crate::{ConfigError, Result};

/// Trait for validating configuration
pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// Reusable validation rules
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate that a value is not blank
    pub fn not_empty(value: &str, field: &str) -> Result<()> {
        if value.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!("{} cannot be empty", field)));
        }
        Ok(())
    }

    /// Validate an optional value only when present
    pub fn not_empty_if_set(value: Option<&str>, field: &str) -> Result<()> {
        match value {
            Some(v) => Self::not_empty(v, field),
            None => Ok(()),
        }
    }
}
