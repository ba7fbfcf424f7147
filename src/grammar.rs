//! Grammar loading
//!
//!     A grammar travels through three shapes:
//!
//!         document (serde_json::Value) -> validated RawGrammar -> compiled Repository
//!
//!     Documents come from JSON or YAML files or from the built-in [clove](crate::clove)
//!     definition. Validation always runs on the untyped document so every violation is
//!     reported at once; see [schema].

pub mod error;
pub mod pattern;
pub mod raw;
pub mod repository;
pub mod schema;

pub use error::{GrammarError, PatternError, SchemaErrors, SchemaViolation, UnknownRuleError};
pub use pattern::{EndTemplate, Groups, Pattern};
pub use raw::{RawCapture, RawGrammar, RawRule};
pub use repository::{
    Capture, CaptureMap, EndPattern, Region, Repository, Rule, RuleId, RuleKind, RuleRef,
};

use serde_json::Value;
use std::fs;
use std::path::Path;

/// Parse a JSON grammar document without validating it.
pub fn parse_json(source: &str) -> Result<Value, GrammarError> {
    Ok(serde_json::from_str(source)?)
}

/// Parse a YAML grammar document without validating it.
pub fn parse_yaml(source: &str) -> Result<Value, GrammarError> {
    Ok(serde_yaml::from_str(source)?)
}

/// Read a grammar document, picking the format from the file extension.
pub fn read_document(path: &Path) -> Result<Value, GrammarError> {
    let source = fs::read_to_string(path)?;
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml") | Some("yml") => parse_yaml(&source),
        _ => parse_json(&source),
    }
}

/// Read, validate and deserialize a grammar document.
pub fn load(path: impl AsRef<Path>, backtrack_limit: usize) -> Result<RawGrammar, GrammarError> {
    let document = read_document(path.as_ref())?;
    validated(document, backtrack_limit)
}

/// Validate an untyped document and convert it to the raw model.
pub fn validated(document: Value, backtrack_limit: usize) -> Result<RawGrammar, GrammarError> {
    schema::validate(&document, backtrack_limit)?;
    Ok(serde_json::from_value(document)?)
}
