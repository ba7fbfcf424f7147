//! Load-time errors
//!
//!     Everything that can go wrong before a scan starts. These are fatal: a grammar that
//!     fails to load never produces a [Repository](super::Repository), so a scanner can
//!     only ever run over a grammar whose references all resolve and whose regexes compile.

use std::fmt;
use thiserror::Error;

/// A rule name that is not in the repository.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown rule `{name}`")]
pub struct UnknownRuleError {
    pub name: String,
}

/// A single schema violation, located by a JSON pointer into the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    pub path: String,
    pub message: String,
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = if self.path.is_empty() { "/" } else { &self.path };
        write!(f, "{}: {}", path, self.message)
    }
}

/// Every violation found in one validation pass.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct SchemaErrors {
    pub violations: Vec<SchemaViolation>,
}

impl fmt::Display for SchemaErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "grammar failed schema validation with {} violation(s)",
            self.violations.len()
        )?;
        for violation in &self.violations {
            write!(f, "\n  {}", violation)?;
        }
        Ok(())
    }
}

/// A pattern the regex engine refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid regex `{pattern}`: {message}")]
pub struct PatternError {
    pub pattern: String,
    pub message: String,
}

/// Anything that stops a grammar from loading.
#[derive(Debug, Error)]
pub enum GrammarError {
    #[error("failed to read grammar: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse JSON grammar: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to parse YAML grammar: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Schema(#[from] SchemaErrors),

    #[error(transparent)]
    Pattern(#[from] PatternError),

    #[error(transparent)]
    UnknownRule(#[from] UnknownRuleError),
}
