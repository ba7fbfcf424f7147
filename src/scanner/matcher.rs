//! Pattern matcher
//!
//!     Picks the winner among competing alternatives: the one whose match starts earliest,
//!     with ties going to whichever alternative comes first. Length plays no part, so a
//!     short keyword listed before a long identifier rule wins at the same offset.
//!
//!     Candidates for a frame are its end pattern plus every `match` and `begin` pattern
//!     reachable from its rule list. Includes and groups are flattened depth-first in
//!     declaration order; a container seen twice during one flattening is skipped, which is
//!     what keeps `code -> strings -> interpolation -> code` from looping. Flattened lists
//!     are cached per rule for the life of the session.

use crate::grammar::{Groups, Pattern, Repository, RuleId, RuleKind, RuleRef};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Which alternative produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// The end pattern of the innermost frame.
    End,
    /// A `match` or region rule.
    Rule(RuleId),
}

/// One alternative offered to [find_next].
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'p> {
    pub target: Target,
    pub pattern: &'p Pattern,
}

/// The winning alternative with its capture spans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchCandidate {
    pub target: Target,
    pub groups: Groups,
}

/// Find the leftmost match at or after `from`; ties go to the earlier candidate.
pub fn find_next(
    candidates: &[Candidate<'_>],
    line: &str,
    from: usize,
    at_anchor: bool,
) -> Option<MatchCandidate> {
    let mut best: Option<MatchCandidate> = None;

    for candidate in candidates {
        let groups = match candidate.pattern.find_at(line, from, at_anchor) {
            Ok(Some(groups)) => groups,
            Ok(None) => continue,
            Err(err) => {
                tracing::warn!(
                    pattern = candidate.pattern.source(),
                    error = %err,
                    "pattern failed at runtime, treating as no match"
                );
                continue;
            }
        };

        let start = groups.whole().start;
        let better = best
            .as_ref()
            .map_or(true, |current| start < current.groups.whole().start);
        if better {
            best = Some(MatchCandidate {
                target: candidate.target,
                groups,
            });
            if start == from {
                // Nothing later in the list can start earlier.
                break;
            }
        }
    }

    best
}

/// Per-session cache of flattened rule lists.
#[derive(Debug, Default)]
pub struct Flattener {
    cache: HashMap<RuleId, Arc<[RuleId]>>,
}

impl Flattener {
    pub fn new() -> Self {
        Self::default()
    }

    /// The `match` and region rules reachable from `rule`'s pattern list, in priority order.
    pub fn rules(&mut self, repository: &Repository, rule: RuleId) -> Arc<[RuleId]> {
        if let Some(rules) = self.cache.get(&rule) {
            return Arc::clone(rules);
        }

        let mut out = Vec::new();
        let mut visited = HashSet::from([rule]);
        flatten(
            repository,
            repository.rule(rule).patterns(),
            &mut visited,
            &mut out,
        );

        let rules: Arc<[RuleId]> = out.into();
        self.cache.insert(rule, Arc::clone(&rules));
        rules
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

fn flatten(
    repository: &Repository,
    patterns: &[RuleRef],
    visited: &mut HashSet<RuleId>,
    out: &mut Vec<RuleId>,
) {
    for reference in patterns {
        let rule = match repository.lookup(reference) {
            Ok(rule) => rule,
            Err(err) => {
                // Validation rules this out; skip rather than abort a scan.
                tracing::warn!(error = %err, "skipping unresolved include");
                continue;
            }
        };
        match &rule.kind {
            RuleKind::Match { .. } | RuleKind::Region(_) => out.push(rule.id),
            RuleKind::Group { patterns } => {
                if visited.insert(rule.id) {
                    flatten(repository, patterns, visited, out);
                }
            }
            RuleKind::Include(target) => {
                if visited.insert(rule.id) {
                    flatten(repository, std::slice::from_ref(target), visited, out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{RawGrammar, RawRule};

    const LIMIT: usize = 1_000_000;

    fn pattern(source: &str) -> Pattern {
        Pattern::new(source, LIMIT).unwrap()
    }

    #[test]
    fn test_earliest_start_wins_over_order() {
        let late = pattern("b");
        let early = pattern("a");
        let candidates = [
            Candidate { target: Target::End, pattern: &late },
            Candidate { target: Target::Rule(RuleId::new(0)), pattern: &early },
        ];
        let found = find_next(&candidates, "xab", 0, false).unwrap();
        assert_eq!(found.groups.whole(), 1..2);
        assert_ne!(found.target, Target::End);
    }

    #[test]
    fn test_tie_goes_to_first_candidate_not_longest() {
        let short = pattern("if");
        let long = pattern(r"\w+");
        let candidates = [
            Candidate { target: Target::End, pattern: &short },
            Candidate { target: Target::Rule(RuleId::new(0)), pattern: &long },
        ];
        let found = find_next(&candidates, "iffy", 0, false).unwrap();
        assert_eq!(found.target, Target::End);
        assert_eq!(found.groups.whole(), 0..2);
    }

    #[test]
    fn test_no_match_in_rest_of_line() {
        let p = pattern("z");
        let candidates = [Candidate { target: Target::End, pattern: &p }];
        assert_eq!(find_next(&candidates, "zab", 1, false), None);
    }

    #[test]
    fn test_flattens_cycles_in_declaration_order() {
        let grammar = RawGrammar::new("source.t")
            .pattern(RawRule::include("#code"))
            .rule(
                "code",
                RawRule::group(vec![
                    RawRule::include("#kw"),
                    RawRule::include("#code"),
                    RawRule::include("$self"),
                    RawRule::include("#str"),
                ]),
            )
            .rule("kw", RawRule::matching("if"))
            .rule("str", RawRule::region("\"", "\"").pattern(RawRule::include("#code")));
        let repository = Repository::new(&grammar, LIMIT).unwrap();

        let mut flattener = Flattener::new();
        let rules = flattener.rules(&repository, repository.root());
        let ids: Vec<_> = rules.iter().copied().collect();
        assert_eq!(
            ids,
            vec![
                repository.resolve("kw").unwrap().id,
                repository.resolve("str").unwrap().id,
            ]
        );

        // Inside the string, the cycle back to `code` is followed once.
        let inner = flattener.rules(&repository, repository.resolve("str").unwrap().id);
        assert_eq!(inner.len(), 2);
        assert_eq!(flattener.len(), 2);
    }
}
