//! Container options: reserved annotation names and resolution policies.
//!
//! The kind tags and contract keys are part of the public contract surface.
//! User-defined annotations must not reuse them, and [`ContainerOptions::validate`]
//! rejects option sets where the reserved names collide with each other.

use crate::{Error, Kind, Result};
use serde::{Deserialize, Serialize};

/// Annotation tags that mark a declaration as injectable and fix its kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KindTags {
    pub factory: String,
    pub interceptor: String,
    pub handler: String,
}

impl Default for KindTags {
    fn default() -> Self {
        Self {
            factory: "Factory".to_string(),
            interceptor: "Interceptor".to_string(),
            handler: "Handler".to_string(),
        }
    }
}

impl KindTags {
    /// Map an annotation name to the kind it reserves.
    pub fn kind_of(&self, tag: &str) -> Option<Kind> {
        if tag == self.factory {
            Some(Kind::Factory)
        } else if tag == self.interceptor {
            Some(Kind::Interceptor)
        } else if tag == self.handler {
            Some(Kind::Handler)
        } else {
            None
        }
    }

    /// Tag used for the given kind.
    pub fn tag_for(&self, kind: Kind) -> &str {
        match kind {
            Kind::Factory => &self.factory,
            Kind::Interceptor => &self.interceptor,
            Kind::Handler => &self.handler,
        }
    }
}

/// Keys read from the data of the kind annotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractKeys {
    /// Interceptor chain placement, e.g. `@Interceptor {"ordinal": 2}`
    pub ordinal: String,
    /// Handler contract introspection flag, e.g. `@Handler {"readContract": true}`
    pub read_contract: String,
}

impl Default for ContractKeys {
    fn default() -> Self {
        Self {
            ordinal: "ordinal".to_string(),
            read_contract: "readContract".to_string(),
        }
    }
}

/// What to do when two declarations produce the same identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Keep the first declaration and record a warning for the second.
    #[default]
    Warn,
    /// Abort extraction.
    Fail,
}

impl DuplicatePolicy {
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "warn" | "keep-first" => Some(DuplicatePolicy::Warn),
            "fail" | "error" => Some(DuplicatePolicy::Fail),
            _ => None,
        }
    }
}

/// Ordering among components that become ready at the same time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TieBreak {
    /// Ascending reference count, ties kept in queue order.
    #[default]
    Popularity,
    /// Ascending scan order.
    ScanOrder,
}

impl TieBreak {
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "popularity" => Some(TieBreak::Popularity),
            "scan-order" | "scan_order" | "insertion" => Some(TieBreak::ScanOrder),
            _ => None,
        }
    }
}

/// Options for a single container run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerOptions {
    pub tags: KindTags,
    pub keys: ContractKeys,
    pub duplicates: DuplicatePolicy,
    pub tie_break: TieBreak,
}

impl ContainerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tags(mut self, tags: KindTags) -> Self {
        self.tags = tags;
        self
    }

    pub fn keys(mut self, keys: ContractKeys) -> Self {
        self.keys = keys;
        self
    }

    pub fn duplicates(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicates = policy;
        self
    }

    pub fn tie_break(mut self, tie_break: TieBreak) -> Self {
        self.tie_break = tie_break;
        self
    }

    /// Check that reserved names are non-empty and pairwise distinct.
    pub fn validate(&self) -> Result<()> {
        let reserved = [
            ("tags.factory", &self.tags.factory),
            ("tags.interceptor", &self.tags.interceptor),
            ("tags.handler", &self.tags.handler),
            ("keys.ordinal", &self.keys.ordinal),
            ("keys.read_contract", &self.keys.read_contract),
        ];

        for (i, (field, name)) in reserved.iter().enumerate() {
            if name.trim().is_empty() {
                return Err(Error::InvalidOptions(format!("{} cannot be empty", field)));
            }
            if let Some((other, _)) = reserved[..i].iter().find(|(_, n)| n == name) {
                return Err(Error::InvalidOptions(format!(
                    "{} and {} both use the name {}",
                    other, field, name
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tags() {
        let tags = KindTags::default();
        assert_eq!(tags.kind_of("Factory"), Some(Kind::Factory));
        assert_eq!(tags.kind_of("Interceptor"), Some(Kind::Interceptor));
        assert_eq!(tags.kind_of("Handler"), Some(Kind::Handler));
        assert_eq!(tags.kind_of("Controller"), None);
        assert_eq!(tags.tag_for(Kind::Handler), "Handler");
    }

    #[test]
    fn test_defaults_validate() {
        assert!(ContainerOptions::default().validate().is_ok());
    }

    #[test]
    fn test_colliding_names_rejected() {
        let options = ContainerOptions::new().tags(KindTags {
            factory: "Config".into(),
            interceptor: "Config".into(),
            handler: "Action".into(),
        });
        let err = options.validate().unwrap_err();
        assert!(err.to_string().contains("tags.interceptor"));

        let options = ContainerOptions::new().keys(ContractKeys {
            ordinal: "Handler".into(),
            read_contract: "readContract".into(),
        });
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_empty_name_rejected() {
        let options = ContainerOptions::new().keys(ContractKeys {
            ordinal: " ".into(),
            read_contract: "readContract".into(),
        });
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!(DuplicatePolicy::from_str("FAIL"), Some(DuplicatePolicy::Fail));
        assert_eq!(DuplicatePolicy::from_str("warn"), Some(DuplicatePolicy::Warn));
        assert_eq!(DuplicatePolicy::from_str("ignore"), None);
        assert_eq!(TieBreak::from_str("scan-order"), Some(TieBreak::ScanOrder));
        assert_eq!(TieBreak::from_str("popularity"), Some(TieBreak::Popularity));
    }

    #[test]
    fn test_deserialize_partial() {
        let options: ContainerOptions =
            serde_json::from_str(r#"{"tags": {"factory": "Config"}, "tie_break": "scan-order"}"#)
                .unwrap();
        assert_eq!(options.tags.factory, "Config");
        assert_eq!(options.tags.handler, "Handler");
        assert_eq!(options.tie_break, TieBreak::ScanOrder);
        assert_eq!(options.duplicates, DuplicatePolicy::Warn);
    }
}
