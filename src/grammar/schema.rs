//! Grammar schema validation
//!
//!     Validation runs over the untyped JSON value, before any typed deserialization, so that
//!     one pass can report every problem in the document rather than stopping at the first
//!     field serde trips over. Each violation carries a JSON pointer to the offending node.
//!
//!     Beyond shape and types the validator also checks the things a loader would otherwise
//!     only discover at scan time: every regex compiles, every `include` resolves to a
//!     repository entry, and key combinations make sense for the kind of rule they describe.

use super::error::{SchemaErrors, SchemaViolation};
use super::pattern::{EndTemplate, Pattern};
use serde_json::{Map, Value};
use std::collections::HashSet;

const GRAMMAR_KEYS: &[&str] = &[
    "fileTypes",
    "firstLineMatch",
    "foldingStartMarker",
    "foldingStopMarker",
    "keyEquivalent",
    "repository",
    "uuid",
    "patterns",
    "name",
    "scopeName",
];

const RULE_KEYS: &[&str] = &[
    "include",
    "match",
    "begin",
    "end",
    "name",
    "contentName",
    "captures",
    "beginCaptures",
    "endCaptures",
    "patterns",
    "applyEndPatternLast",
    "comment",
];

const CAPTURE_KEYS: &[&str] = &["name", "patterns"];

/// Check a grammar document, collecting every violation.
pub fn validate(document: &Value, backtrack_limit: usize) -> Result<(), SchemaErrors> {
    let mut validator = Validator {
        violations: Vec::new(),
        repository: HashSet::new(),
        backtrack_limit,
    };
    validator.grammar(document);

    if validator.violations.is_empty() {
        Ok(())
    } else {
        Err(SchemaErrors {
            violations: validator.violations,
        })
    }
}

struct Validator<'a> {
    violations: Vec<SchemaViolation>,
    repository: HashSet<&'a str>,
    backtrack_limit: usize,
}

impl<'a> Validator<'a> {
    fn report(&mut self, path: &str, message: impl Into<String>) {
        self.violations.push(SchemaViolation {
            path: path.to_string(),
            message: message.into(),
        });
    }

    fn grammar(&mut self, document: &'a Value) {
        let Some(object) = document.as_object() else {
            self.report("", "grammar must be an object");
            return;
        };
        self.unknown_keys("", object, GRAMMAR_KEYS);

        // Collect repository names first: includes may point forward.
        let repository = match object.get("repository") {
            None => None,
            Some(Value::Object(entries)) => {
                self.repository.extend(entries.keys().map(String::as_str));
                Some(entries)
            }
            Some(_) => {
                self.report("/repository", "must be an object");
                None
            }
        };

        match object.get("scopeName") {
            Some(Value::String(scope)) if !scope.trim().is_empty() => {}
            Some(Value::String(_)) => self.report("/scopeName", "must not be empty"),
            Some(_) => self.report("/scopeName", "must be a string"),
            None => self.report("", "missing required key `scopeName`"),
        }

        for key in [
            "name",
            "uuid",
            "keyEquivalent",
            "foldingStartMarker",
            "foldingStopMarker",
        ] {
            self.optional_string(&format!("/{}", key), object.get(key));
        }
        if let Some(source) = self.optional_string("/firstLineMatch", object.get("firstLineMatch")) {
            self.regex("/firstLineMatch", source);
        }

        match object.get("fileTypes") {
            None => {}
            Some(Value::Array(items)) => {
                for (i, item) in items.iter().enumerate() {
                    if !item.is_string() {
                        self.report(&format!("/fileTypes/{}", i), "must be a string");
                    }
                }
            }
            Some(_) => self.report("/fileTypes", "must be an array of strings"),
        }

        match object.get("patterns") {
            Some(patterns) => self.rule_list("/patterns", patterns),
            None => self.report("", "missing required key `patterns`"),
        }

        if let Some(entries) = repository {
            for (key, rule) in entries {
                self.rule(&format!("/repository/{}", escape_pointer(key)), rule);
            }
        }
    }

    fn rule_list(&mut self, path: &str, value: &'a Value) {
        let Some(items) = value.as_array() else {
            self.report(path, "must be an array of rules");
            return;
        };
        for (i, item) in items.iter().enumerate() {
            self.rule(&format!("{}/{}", path, i), item);
        }
    }

    fn rule(&mut self, path: &str, value: &'a Value) {
        let Some(rule) = value.as_object() else {
            self.report(path, "rule must be an object");
            return;
        };
        self.unknown_keys(path, rule, RULE_KEYS);

        let has = |key: &str| rule.contains_key(key);

        for key in ["name", "contentName", "comment"] {
            self.optional_string(&format!("{}/{}", path, key), rule.get(key));
        }

        if has("include") {
            for other in ["match", "begin", "end", "patterns"] {
                if has(other) {
                    self.report(path, format!("`include` cannot be combined with `{}`", other));
                }
            }
            if let Some(reference) = self.optional_string(&format!("{}/include", path), rule.get("include")) {
                self.reference(&format!("{}/include", path), reference);
            }
        }

        if has("match") && (has("begin") || has("end")) {
            self.report(path, "`match` cannot be combined with `begin`/`end`");
        }
        if has("begin") && !has("end") {
            self.report(path, "`begin` requires `end`");
        }
        if has("end") && !has("begin") {
            self.report(path, "`end` requires `begin`");
        }

        let is_region = has("begin");
        for key in ["beginCaptures", "endCaptures", "contentName", "applyEndPatternLast"] {
            if has(key) && !is_region {
                self.report(path, format!("`{}` is only valid on a `begin`/`end` rule", key));
            }
        }
        if has("captures") && !(has("match") || is_region) {
            self.report(path, "`captures` is only valid on a `match` or `begin`/`end` rule");
        }

        let empty_patterns = match rule.get("patterns") {
            None => true,
            Some(Value::Array(items)) => items.is_empty(),
            Some(_) => false,
        };
        if !has("include") && !has("match") && !is_region && empty_patterns {
            self.report(path, "rule has nothing to match");
        }

        for key in ["match", "begin"] {
            let key_path = format!("{}/{}", path, key);
            if let Some(source) = self.optional_string(&key_path, rule.get(key)) {
                self.regex(&key_path, source);
            }
        }
        let end_path = format!("{}/end", path);
        if let Some(source) = self.optional_string(&end_path, rule.get("end")) {
            match EndTemplate::parse(source) {
                Some(template) => {
                    let probe = template.instantiate(&[]);
                    self.regex(&end_path, &probe);
                }
                None => self.regex(&end_path, source),
            }
        }

        match rule.get("applyEndPatternLast") {
            None | Some(Value::Bool(_)) => {}
            Some(_) => self.report(&format!("{}/applyEndPatternLast", path), "must be a boolean"),
        }

        for key in ["captures", "beginCaptures", "endCaptures"] {
            if let Some(captures) = rule.get(key) {
                self.captures(&format!("{}/{}", path, key), captures);
            }
        }

        if let Some(patterns) = rule.get("patterns") {
            self.rule_list(&format!("{}/patterns", path), patterns);
        }
    }

    fn captures(&mut self, path: &str, value: &'a Value) {
        let Some(entries) = value.as_object() else {
            self.report(path, "must be an object");
            return;
        };
        for (key, capture) in entries {
            let capture_path = format!("{}/{}", path, escape_pointer(key));
            if key.is_empty() || !key.bytes().all(|b| b.is_ascii_digit()) {
                self.report(&capture_path, "capture key must be a group number");
            }
            let Some(capture) = capture.as_object() else {
                self.report(&capture_path, "capture must be an object");
                continue;
            };
            self.unknown_keys(&capture_path, capture, CAPTURE_KEYS);
            self.optional_string(&format!("{}/name", capture_path), capture.get("name"));
            if let Some(patterns) = capture.get("patterns") {
                self.rule_list(&format!("{}/patterns", capture_path), patterns);
            }
        }
    }

    fn reference(&mut self, path: &str, reference: &str) {
        match reference {
            "$self" | "$base" => {}
            _ => match reference.strip_prefix('#') {
                Some(name) if self.repository.contains(name) => {}
                Some(name) => self.report(path, format!("unknown rule `{}`", name)),
                None => self.report(
                    path,
                    format!("references to external grammars are not supported: `{}`", reference),
                ),
            },
        }
    }

    fn regex(&mut self, path: &str, source: &str) {
        if let Err(err) = Pattern::new(source, self.backtrack_limit) {
            self.report(path, err.to_string());
        }
    }

    fn optional_string(&mut self, path: &str, value: Option<&'a Value>) -> Option<&'a str> {
        match value {
            None => None,
            Some(Value::String(s)) => Some(s.as_str()),
            Some(_) => {
                self.report(path, "must be a string");
                None
            }
        }
    }

    fn unknown_keys(&mut self, path: &str, object: &Map<String, Value>, allowed: &[&str]) {
        for key in object.keys() {
            if !allowed.contains(&key.as_str()) {
                self.report(path, format!("unknown key `{}`", key));
            }
        }
    }
}

fn escape_pointer(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}
