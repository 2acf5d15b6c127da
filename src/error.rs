//! Aggregated validation errors.
//!
//! Every validation pass in this crate collects *all* violations it finds
//! before failing, so callers always see the complete picture instead of
//! the first failure. Violations are keyed by a path-like string
//! (`"sample"`, `"tables[main]"`, `"fields[amount]"`, `"options[filters][amount]"`)
//! mapped to one or more human-readable messages.

use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// A bag of violations keyed by a path-like string.
///
/// Keys are kept in sorted order so rendering and test assertions are
/// deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorBag {
    entries: BTreeMap<String, Vec<String>>,
}

impl ErrorBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message under `key`, creating the entry on first use.
    pub fn push(&mut self, key: impl Into<String>, message: impl Into<String>) {
        self.entries
            .entry(key.into())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of distinct paths with at least one violation.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn messages(&self, key: &str) -> Option<&[String]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(key, messages)| (key.as_str(), messages.as_slice()))
    }

    /// Fold another bag into this one, preserving both sides' messages.
    pub fn merge(&mut self, other: ErrorBag) {
        for (key, messages) in other.entries {
            self.entries.entry(key).or_default().extend(messages);
        }
    }
}

impl fmt::Display for ErrorBag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (key, messages) in &self.entries {
            if !first {
                writeln!(f)?;
            }
            write!(f, "{}: {}", key, messages.join("; "))?;
            first = false;
        }
        Ok(())
    }
}

/// Errors surfaced by schema assembly, validation and composition.
///
/// Each variant carries the full set of violations found in one pass;
/// validation never partially succeeds and composition produces no partial
/// SQL on failure.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// The raw schema dictionary is malformed, an element attribute fails a
    /// cross-field invariant, or a field references an undeclared table.
    #[error("schema validation failed\n{0}")]
    Schema(ErrorBag),

    /// A runtime request references unknown fields, disallowed operators,
    /// wrong operand shapes, or fields not eligible for the requested role.
    #[error("options validation failed\n{0}")]
    Options(ErrorBag),

    /// A supplied parameter value is missing or has the wrong runtime type.
    #[error("parameter validation failed\n{0}")]
    Params(ErrorBag),
}

impl Error {
    /// The violations carried by this error, regardless of kind.
    pub fn errors(&self) -> &ErrorBag {
        match self {
            Error::Schema(bag) | Error::Options(bag) | Error::Params(bag) => bag,
        }
    }
}
