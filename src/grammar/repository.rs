//! Rule repository
//!
//!     The compiled, immutable form of a grammar. Rules live in an arena indexed by [RuleId];
//!     inline rules are reached through their parent, repository entries through their name.
//!
//!     References between rules (`include`) are stored as names and only looked up when the
//!     scanner needs them. Grammars are full of cycles ("code" includes "strings" includes
//!     "string-interpolation" includes "code"), and keeping references symbolic means building
//!     the repository never has to follow one. Validation still proves up front that every
//!     name resolves, so a lookup failing mid-scan indicates a bug rather than a bad grammar.
//!
//!     Once built a repository is never mutated; it is `Send + Sync` and can back any number
//!     of concurrent scanner sessions.

use super::error::{GrammarError, UnknownRuleError};
use super::pattern::{EndTemplate, Pattern};
use super::raw::{RawCapture, RawGrammar, RawRule};
use super::schema;
use indexmap::IndexMap;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

/// Index of a rule in the repository arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleId(usize);

impl RuleId {
    #[cfg(test)]
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

/// A reference from a pattern list to a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleRef {
    /// `#name`: a repository entry, looked up at use time.
    Named(String),
    /// `$self` / `$base`: the grammar's top-level pattern list.
    Root,
    /// A rule written inline in the list.
    Inline(RuleId),
}

/// What a capture group maps to.
#[derive(Debug, Clone, Default)]
pub struct Capture {
    pub scopes: Vec<String>,
    /// A group rule to re-enter the scanner with, restricted to the capture's span.
    pub rule: Option<RuleId>,
}

/// Captures by group number, in ascending order.
pub type CaptureMap = BTreeMap<usize, Capture>;

/// The end of a region, fixed or parameterized by the begin match.
#[derive(Debug, Clone)]
pub enum EndPattern {
    Fixed(Arc<Pattern>),
    Template(EndTemplate),
}

impl EndPattern {
    pub fn source(&self) -> &str {
        match self {
            EndPattern::Fixed(pattern) => pattern.source(),
            EndPattern::Template(template) => template.source(),
        }
    }
}

#[derive(Debug)]
pub struct Region {
    pub begin: Pattern,
    pub end: EndPattern,
    pub begin_captures: CaptureMap,
    pub end_captures: CaptureMap,
    pub patterns: Vec<RuleRef>,
    pub content_scopes: Vec<String>,
    pub apply_end_last: bool,
}

#[derive(Debug)]
pub enum RuleKind {
    Match {
        pattern: Pattern,
        captures: CaptureMap,
    },
    Region(Region),
    Group {
        patterns: Vec<RuleRef>,
    },
    Include(RuleRef),
}

#[derive(Debug)]
pub struct Rule {
    pub id: RuleId,
    /// The repository key, for entries reached by name.
    pub key: Option<String>,
    /// Scopes contributed by the rule's `name`, in order.
    pub scopes: Vec<String>,
    pub kind: RuleKind,
}

impl Rule {
    /// A human-readable label for diagnostics.
    pub fn label(&self) -> String {
        match (&self.key, self.scopes.first()) {
            (Some(key), _) => key.clone(),
            (None, Some(scope)) => scope.clone(),
            (None, None) => format!("rule#{}", self.id.0),
        }
    }

    /// The nested rule list valid while this rule is the innermost frame.
    pub fn patterns(&self) -> &[RuleRef] {
        match &self.kind {
            RuleKind::Region(region) => &region.patterns,
            RuleKind::Group { patterns } => patterns,
            RuleKind::Match { .. } | RuleKind::Include(_) => &[],
        }
    }
}

/// The compiled grammar.
#[derive(Debug)]
pub struct Repository {
    rules: Vec<Rule>,
    names: HashMap<String, RuleId>,
    root: RuleId,
    scope_name: String,
    file_types: Vec<String>,
    first_line_match: Option<Pattern>,
    backtrack_limit: usize,
}

impl Repository {
    /// Validate and compile a grammar.
    pub fn new(grammar: &RawGrammar, backtrack_limit: usize) -> Result<Self, GrammarError> {
        let document = serde_json::to_value(grammar)?;
        schema::validate(&document, backtrack_limit)?;
        Self::compile(grammar, backtrack_limit)
    }

    /// Validate an untyped document, then compile it.
    pub fn from_value(
        document: &serde_json::Value,
        backtrack_limit: usize,
    ) -> Result<Self, GrammarError> {
        schema::validate(document, backtrack_limit)?;
        let grammar: RawGrammar = serde_json::from_value(document.clone())?;
        Self::compile(&grammar, backtrack_limit)
    }

    /// Load a JSON or YAML grammar file, chosen by extension.
    pub fn from_path(path: impl AsRef<Path>, backtrack_limit: usize) -> Result<Self, GrammarError> {
        let document = super::read_document(path.as_ref())?;
        Self::from_value(&document, backtrack_limit)
    }

    fn compile(grammar: &RawGrammar, backtrack_limit: usize) -> Result<Self, GrammarError> {
        let mut builder = Builder {
            rules: Vec::new(),
            backtrack_limit,
        };

        let mut names = HashMap::new();
        for (key, raw) in &grammar.repository {
            let id = builder.rule(raw, Some(key.clone()))?;
            names.insert(key.clone(), id);
        }

        let patterns = builder.rule_list(&grammar.patterns)?;
        let root = builder.push(None, split_scopes(Some(&grammar.scope_name)), RuleKind::Group { patterns });

        let first_line_match = grammar
            .first_line_match
            .as_deref()
            .map(|source| Pattern::new(source, backtrack_limit))
            .transpose()?;

        tracing::debug!(
            scope = %grammar.scope_name,
            rules = builder.rules.len(),
            "compiled grammar repository"
        );

        Ok(Self {
            rules: builder.rules,
            names,
            root,
            scope_name: grammar.scope_name.clone(),
            file_types: grammar.file_types.clone(),
            first_line_match,
            backtrack_limit,
        })
    }

    /// Look up a repository entry by name.
    pub fn resolve(&self, name: &str) -> Result<&Rule, UnknownRuleError> {
        self.names
            .get(name)
            .map(|id| self.rule(*id))
            .ok_or_else(|| UnknownRuleError {
                name: name.to_string(),
            })
    }

    /// Follow a reference to its rule.
    pub fn lookup(&self, reference: &RuleRef) -> Result<&Rule, UnknownRuleError> {
        match reference {
            RuleRef::Named(name) => self.resolve(name),
            RuleRef::Root => Ok(self.rule(self.root)),
            RuleRef::Inline(id) => Ok(self.rule(*id)),
        }
    }

    pub fn rule(&self, id: RuleId) -> &Rule {
        &self.rules[id.0]
    }

    /// The rule standing for the grammar's top-level pattern list.
    pub fn root(&self) -> RuleId {
        self.root
    }

    pub fn scope_name(&self) -> &str {
        &self.scope_name
    }

    pub fn backtrack_limit(&self) -> usize {
        self.backtrack_limit
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Whether a file looks like it belongs to this grammar, by extension or first line.
    pub fn accepts(&self, path: &Path, first_line: &str) -> bool {
        let by_type = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(|name| {
                self.file_types
                    .iter()
                    .any(|ext| name == ext || name.ends_with(&format!(".{}", ext)))
            })
            .unwrap_or(false);
        let by_line = self
            .first_line_match
            .as_ref()
            .and_then(|pattern| pattern.find_at(first_line, 0, false).ok().flatten())
            .is_some();
        by_type || by_line
    }
}

struct Builder {
    rules: Vec<Rule>,
    backtrack_limit: usize,
}

impl Builder {
    fn push(&mut self, key: Option<String>, scopes: Vec<String>, kind: RuleKind) -> RuleId {
        let id = RuleId(self.rules.len());
        self.rules.push(Rule {
            id,
            key,
            scopes,
            kind,
        });
        id
    }

    fn pattern(&self, source: &str) -> Result<Pattern, GrammarError> {
        Ok(Pattern::new(source, self.backtrack_limit)?)
    }

    fn rule(&mut self, raw: &RawRule, key: Option<String>) -> Result<RuleId, GrammarError> {
        let scopes = split_scopes(raw.name.as_deref());

        let kind = if let Some(reference) = &raw.include {
            RuleKind::Include(parse_reference(reference))
        } else if let Some(source) = &raw.match_ {
            RuleKind::Match {
                pattern: self.pattern(source)?,
                captures: self.captures(&raw.captures)?,
            }
        } else if let (Some(begin), Some(end)) = (&raw.begin, &raw.end) {
            let end = match EndTemplate::parse(end) {
                Some(template) => EndPattern::Template(template),
                None => EndPattern::Fixed(Arc::new(self.pattern(end)?)),
            };
            let begin_captures = if raw.begin_captures.is_empty() {
                &raw.captures
            } else {
                &raw.begin_captures
            };
            let end_captures = if raw.end_captures.is_empty() {
                &raw.captures
            } else {
                &raw.end_captures
            };
            RuleKind::Region(Region {
                begin: self.pattern(begin)?,
                end,
                begin_captures: self.captures(begin_captures)?,
                end_captures: self.captures(end_captures)?,
                patterns: self.rule_list(&raw.patterns)?,
                content_scopes: split_scopes(raw.content_name.as_deref()),
                apply_end_last: raw.apply_end_pattern_last,
            })
        } else {
            RuleKind::Group {
                patterns: self.rule_list(&raw.patterns)?,
            }
        };

        Ok(self.push(key, scopes, kind))
    }

    fn rule_list(&mut self, raws: &[RawRule]) -> Result<Vec<RuleRef>, GrammarError> {
        raws.iter()
            .map(|raw| match &raw.include {
                // A bare include needs no arena slot of its own.
                Some(reference) if raw.name.is_none() => Ok(parse_reference(reference)),
                _ => self.rule(raw, None).map(RuleRef::Inline),
            })
            .collect()
    }

    fn captures(&mut self, raws: &IndexMap<String, RawCapture>) -> Result<CaptureMap, GrammarError> {
        let mut captures = CaptureMap::new();
        for (key, raw) in raws {
            // Schema validation guarantees numeric keys.
            let Ok(group) = key.parse::<usize>() else {
                continue;
            };
            let rule = if raw.patterns.is_empty() {
                None
            } else {
                let patterns = self.rule_list(&raw.patterns)?;
                Some(self.push(None, Vec::new(), RuleKind::Group { patterns }))
            };
            captures.insert(
                group,
                Capture {
                    scopes: split_scopes(raw.name.as_deref()),
                    rule,
                },
            );
        }
        Ok(captures)
    }
}

fn parse_reference(reference: &str) -> RuleRef {
    match reference {
        "$self" | "$base" => RuleRef::Root,
        _ => RuleRef::Named(reference.trim_start_matches('#').to_string()),
    }
}

fn split_scopes(name: Option<&str>) -> Vec<String> {
    name.map(|name| name.split_whitespace().map(String::from).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMIT: usize = 1_000_000;

    fn cyclic_grammar() -> RawGrammar {
        RawGrammar::new("source.t")
            .pattern(RawRule::include("#code"))
            .rule(
                "code",
                RawRule::group(vec![RawRule::include("#strings"), RawRule::matching("x")]),
            )
            .rule(
                "strings",
                RawRule::region("\"", "\"")
                    .scope("string")
                    .pattern(RawRule::include("#interpolation")),
            )
            .rule(
                "interpolation",
                RawRule::region(r"\$\{", r"\}").pattern(RawRule::include("#code")),
            )
    }

    #[test]
    fn test_builds_cyclic_grammar() {
        let repository = Repository::new(&cyclic_grammar(), LIMIT).unwrap();

        let code = repository.resolve("code").unwrap();
        assert_eq!(code.patterns()[0], RuleRef::Named("strings".to_string()));

        let interpolation = repository.resolve("interpolation").unwrap();
        assert_eq!(interpolation.patterns()[0], RuleRef::Named("code".to_string()));
    }

    #[test]
    fn test_resolve_unknown_name() {
        let repository = Repository::new(&cyclic_grammar(), LIMIT).unwrap();
        let err = repository.resolve("nope").unwrap_err();
        assert_eq!(err.name, "nope");
    }

    #[test]
    fn test_unknown_include_is_rejected_at_load() {
        let grammar = RawGrammar::new("source.t").pattern(RawRule::include("#ghost"));
        let err = Repository::new(&grammar, LIMIT).unwrap_err();
        assert!(matches!(err, GrammarError::Schema(_)));
    }

    #[test]
    fn test_root_carries_scope_name() {
        let repository = Repository::new(&cyclic_grammar(), LIMIT).unwrap();
        let root = repository.rule(repository.root());
        assert_eq!(root.scopes, vec!["source.t"]);
        assert_eq!(root.patterns(), &[RuleRef::Named("code".to_string())]);
        assert_eq!(
            repository.lookup(&RuleRef::Root).unwrap().id,
            repository.root()
        );
    }

    #[test]
    fn test_region_captures_fall_back_to_shared_map() {
        let grammar = RawGrammar::new("source.t").pattern(
            RawRule::region("<", ">")
                .capture(0, "punct")
                .end_capture(0, "punct.end"),
        );
        let repository = Repository::new(&grammar, LIMIT).unwrap();
        let RuleRef::Inline(id) = &repository.rule(repository.root()).patterns()[0] else {
            panic!("expected inline rule");
        };
        let RuleKind::Region(region) = &repository.rule(*id).kind else {
            panic!("expected region");
        };
        assert_eq!(region.begin_captures[&0].scopes, vec!["punct"]);
        assert_eq!(region.end_captures[&0].scopes, vec!["punct.end"]);
    }

    #[test]
    fn test_multi_scope_names_split() {
        let grammar = RawGrammar::new("source.t")
            .rule("s", RawRule::matching("a").scope("string.quoted  punctuation.begin"))
            .pattern(RawRule::include("#s"));
        let repository = Repository::new(&grammar, LIMIT).unwrap();
        assert_eq!(
            repository.resolve("s").unwrap().scopes,
            vec!["string.quoted", "punctuation.begin"]
        );
    }

    #[test]
    fn test_end_template_kept_symbolic() {
        let grammar = RawGrammar::new("source.t").rule(
            "tag",
            RawRule::region(r"<(\w+)>", r"</\1>"),
        ).pattern(RawRule::include("#tag"));
        let repository = Repository::new(&grammar, LIMIT).unwrap();
        let RuleKind::Region(region) = &repository.resolve("tag").unwrap().kind else {
            panic!("expected region");
        };
        assert!(matches!(region.end, EndPattern::Template(_)));
        assert_eq!(region.end.source(), r"</\1>");
    }

    #[test]
    fn test_accepts_by_extension_and_first_line() {
        let mut grammar = cyclic_grammar();
        grammar.file_types = vec!["t".to_string()];
        grammar.first_line_match = Some(r"^#!.*\bt\b".to_string());
        let repository = Repository::new(&grammar, LIMIT).unwrap();

        assert!(repository.accepts(Path::new("a/b.t"), ""));
        assert!(repository.accepts(Path::new("script"), "#!/usr/bin/env t"));
        assert!(!repository.accepts(Path::new("b.rs"), "fn main() {}"));
    }
}
