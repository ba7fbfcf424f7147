//! Raw grammar document
//!
//!     The serde model of a grammar as it travels on the wire: a TextMate-shaped document
//!     with a top-level pattern list and a repository of named rules. This is the shape the
//!     generator emits and the shape hand-written JSON or YAML grammars are read from.
//!
//!     Order is semantically load-bearing. Pattern lists are `Vec`s and every map is an
//!     `IndexMap`, so a document survives a load/emit round trip with its declaration order
//!     intact. Empty fields are skipped on output so generated JSON stays close to what a
//!     person would write by hand.
//!
//!     The builder methods on [RawRule] exist so grammars can be declared in Rust (see the
//!     [clove](crate::clove) module) without spelling out struct literals.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A complete grammar document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawGrammar {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub file_types: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_line_match: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folding_start_marker: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folding_stop_marker: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_equivalent: Option<String>,
    #[serde(default)]
    pub repository: IndexMap<String, RawRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(default)]
    pub patterns: Vec<RawRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub scope_name: String,
}

/// One rule, either inline in a pattern list or as a repository entry.
///
/// Which kind of rule this is depends on which keys are set: `match` makes a simple rule,
/// `begin`/`end` a region, `include` a reference, and a bare `patterns` list a group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include: Option<String>,
    #[serde(rename = "match", default, skip_serializing_if = "Option::is_none")]
    pub match_: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub begin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_name: Option<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub captures: IndexMap<String, RawCapture>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub begin_captures: IndexMap<String, RawCapture>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub end_captures: IndexMap<String, RawCapture>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub patterns: Vec<RawRule>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub apply_end_pattern_last: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// What a capture group maps to: a scope, a nested rule list, or both.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawCapture {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub patterns: Vec<RawRule>,
}

impl RawCapture {
    pub fn scope(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            patterns: Vec::new(),
        }
    }
}

impl RawGrammar {
    /// Create an empty grammar for the given root scope.
    pub fn new(scope_name: impl Into<String>) -> Self {
        Self {
            scope_name: scope_name.into(),
            ..Self::default()
        }
    }

    /// Append a rule to the top-level pattern list.
    pub fn pattern(mut self, rule: RawRule) -> Self {
        self.patterns.push(rule);
        self
    }

    /// Add (or replace) a named repository entry.
    pub fn rule(mut self, key: impl Into<String>, rule: RawRule) -> Self {
        self.repository.insert(key.into(), rule);
        self
    }

    /// Parse a JSON document without validating it.
    pub fn from_json(source: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(source)
    }

    /// Serialize to the compact wire form.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to indented JSON.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl RawRule {
    /// A simple rule: one regex.
    pub fn matching(pattern: impl Into<String>) -> Self {
        Self {
            match_: Some(pattern.into()),
            ..Self::default()
        }
    }

    /// A region rule delimited by `begin` and `end`.
    pub fn region(begin: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            begin: Some(begin.into()),
            end: Some(end.into()),
            ..Self::default()
        }
    }

    /// A reference such as `#code` or `$self`.
    pub fn include(reference: impl Into<String>) -> Self {
        Self {
            include: Some(reference.into()),
            ..Self::default()
        }
    }

    /// A pure pattern list.
    pub fn group(patterns: Vec<RawRule>) -> Self {
        Self {
            patterns,
            ..Self::default()
        }
    }

    pub fn scope(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn content_scope(mut self, name: impl Into<String>) -> Self {
        self.content_name = Some(name.into());
        self
    }

    pub fn capture(mut self, group: usize, name: impl Into<String>) -> Self {
        self.captures
            .insert(group.to_string(), RawCapture::scope(name));
        self
    }

    pub fn begin_capture(mut self, group: usize, name: impl Into<String>) -> Self {
        self.begin_captures
            .insert(group.to_string(), RawCapture::scope(name));
        self
    }

    pub fn end_capture(mut self, group: usize, name: impl Into<String>) -> Self {
        self.end_captures
            .insert(group.to_string(), RawCapture::scope(name));
        self
    }

    /// Map a capture group to a nested rule list, re-entering the scanner inside it.
    pub fn capture_patterns(mut self, group: usize, patterns: Vec<RawRule>) -> Self {
        self.captures
            .entry(group.to_string())
            .or_default()
            .patterns = patterns;
        self
    }

    pub fn pattern(mut self, rule: RawRule) -> Self {
        self.patterns.push(rule);
        self
    }

    pub fn end_last(mut self) -> Self {
        self.apply_end_pattern_last = true;
        self
    }

    pub fn comment(mut self, text: impl Into<String>) -> Self {
        self.comment = Some(text.into());
        self
    }
}
