//! Annotation parsing for documentation blocks.
//!
//! Annotations are `@Tag` markers written inside the documentation of a
//! declaration, optionally followed by data on the same line and on any
//! following lines up to the next tag:
//!
//! ```text
//! @Handler {"readContract": true}
//! @Controller {
//!   "method": "post",
//!   "path": "/person"
//! }
//! @Transaction
//! ```
//!
//! Data that begins with `{` is decoded as JSON. Everything else is kept as
//! trimmed text, and a tag without data carries no value. A JSON decode failure
//! is not fatal: the raw text is kept and a [`Warning::AnnotationDecode`] is
//! reported for the owning declaration.
//!
//! # Examples
//!
//! ```
//! use skeleto_core::annotation::parse_annotations;
//! use serde_json::json;
//!
//! let parsed = parse_annotations("function implFoo", [
//!     r#"@Handler {"readContract": true}"#,
//!     "@Tag person",
//! ]);
//!
//! assert_eq!(parsed.annotations[0].name, "Handler");
//! assert_eq!(parsed.annotations[0].data, Some(json!({"readContract": true})));
//! assert_eq!(parsed.annotations[1].text(), Some("person"));
//! assert!(parsed.warnings.is_empty());
//! ```

use crate::Warning;
use crate::logging::{trace, warn};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::LazyLock;

static TAG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@(\w+)\s*(.*)").expect("annotation pattern is valid"));

/// A `(name, data)` pair attached to a declaration, type or field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl Annotation {
    pub fn new(name: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    /// Annotation without data, e.g. `@Transaction`.
    pub fn marker(name: impl Into<String>) -> Self {
        Self::new(name, None)
    }

    /// Annotation carrying plain text, e.g. `@Part body`.
    pub fn text_value(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(name, Some(Value::String(text.into())))
    }

    /// Data as text, when it is a string.
    pub fn text(&self) -> Option<&str> {
        self.data.as_ref().and_then(Value::as_str)
    }

    /// Field of object data, e.g. `ordinal` in `@Interceptor {"ordinal": 2}`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.as_ref().and_then(|data| data.get(key))
    }
}

/// First annotation with the given name. Later duplicates are ignored.
pub fn find<'a>(annotations: &'a [Annotation], name: &str) -> Option<&'a Annotation> {
    annotations.iter().find(|a| a.name == name)
}

/// Result of parsing one declaration's documentation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedAnnotations {
    pub annotations: Vec<Annotation>,
    pub warnings: Vec<Warning>,
}

/// Parse documentation lines into ordered annotations.
///
/// `owner` identifies the declaration in diagnostics. Lines may come from
/// several documentation blocks; they are treated as one sequence.
pub fn parse_annotations<I, S>(owner: &str, lines: I) -> ParsedAnnotations
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut parser = AnnotationParser::new(owner);
    for line in lines {
        parser.feed(line.as_ref());
    }
    parser.finish()
}

/// Parse whole documentation blocks, splitting each on line breaks.
pub fn parse_blocks(owner: &str, blocks: &[String]) -> ParsedAnnotations {
    parse_annotations(owner, blocks.iter().flat_map(|block| block.lines()))
}

/// Line-driven annotation state machine.
pub struct AnnotationParser<'a> {
    owner: &'a str,
    current: Option<(String, String)>,
    output: ParsedAnnotations,
}

impl<'a> AnnotationParser<'a> {
    pub fn new(owner: &'a str) -> Self {
        Self {
            owner,
            current: None,
            output: ParsedAnnotations::default(),
        }
    }

    /// Consume one line of documentation.
    pub fn feed(&mut self, line: &str) {
        if let Some(captures) = TAG_PATTERN.captures(line) {
            self.flush();
            let name = captures[1].to_string();
            let data = captures.get(2).map(|m| m.as_str()).unwrap_or("").to_string();
            self.current = Some((name, data));
            return;
        }

        // Continuation lines belong to the open annotation, if any
        if let Some((_, data)) = self.current.as_mut() {
            let text = line.trim();
            if !text.is_empty() {
                data.push(' ');
                data.push_str(text);
            }
        }
    }

    /// Flush the open annotation and return everything parsed so far.
    pub fn finish(mut self) -> ParsedAnnotations {
        self.flush();
        self.output
    }

    fn flush(&mut self) {
        let Some((name, data)) = self.current.take() else {
            return;
        };

        let trimmed = data.trim();
        let value = if trimmed.starts_with('{') {
            match serde_json::from_str::<Value>(trimmed) {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!(owner = self.owner, tag = %name, error = %e, "Annotation has invalid JSON, keeping raw text");
                    self.output.warnings.push(Warning::AnnotationDecode {
                        owner: self.owner.to_string(),
                        tag: name.clone(),
                        reason: e.to_string(),
                    });
                    Some(Value::String(data.clone()))
                }
            }
        } else if trimmed.is_empty() {
            None
        } else {
            Some(Value::String(trimmed.to_string()))
        };

        trace!(owner = self.owner, tag = %name, "Parsed annotation");
        self.output.annotations.push(Annotation::new(name, value));
    }
}
