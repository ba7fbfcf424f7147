//! Scanner driver
//!
//!     A [Scanner] is one tokenizing session over a shared [Repository]. It walks the buffer
//!     line by line. On each line it asks the matcher for the best alternative among the
//!     innermost frame's end pattern and its nested rules, emits the text before the match
//!     with the frame's scopes, and then either emits a simple match, pushes a region or pops
//!     one.
//!
//!     Lines
//!
//!         Lines keep their terminator, so `$` and lookbehinds on `\n` see what they expect.
//!         A last line without one is matched as if it ended in `\n`; tokens are clipped to
//!         the real buffer. Tokens never span lines, which makes scanning `a\n` then resuming
//!         on `b\n` produce exactly the tokens of scanning `a\nb\n` in one call.
//!
//!     Termination
//!
//!         Zero-width begins and ends are legal and used in practice (lookahead begins,
//!         lookbehind ends), so the cursor can legitimately stand still for an iteration. The
//!         driver bounds how long it may do so: an empty region that is opened and closed at
//!         one position, a zero-width simple match, or more than `stall_limit` iterations in
//!         a row without progress each force one character out with the current scopes.
//!         A zero-width begin of a rule already opened at the same position is refused; in
//!         that case, and when the stall limit trips, the regions opened since the cursor last
//!         moved are dropped first so the stack cannot grow with the input.
//!
//!     Diagnostics
//!
//!         Nothing that happens during a scan is an error. Input no rule matched and regions
//!         still open at the end of the buffer are reported as [Diagnostic]s alongside the
//!         tokens; the open regions also stay on the returned stack so a later call can pick
//!         them up.

pub mod captures;
pub mod matcher;
pub mod state;
pub mod token;

pub use matcher::{find_next, Candidate, Flattener, MatchCandidate, Target};
pub use state::{Frame, ScopeStack};
pub use token::{Token, TokenSink};

use crate::config::ScannerConfig;
use crate::grammar::{CaptureMap, EndPattern, Groups, Pattern, Repository, RuleKind};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

static NO_CAPTURES: CaptureMap = BTreeMap::new();

/// A recoverable condition met during a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// No rule matched from `offset` to the end of its line.
    UnmatchedInput { offset: usize, length: usize },
    /// A region was still open when the buffer ended.
    UnterminatedRegion {
        rule: String,
        scopes: Vec<String>,
        /// Offset of the begin match in the buffer of the call that opened the region. For a
        /// region carried over in a resumed stack this is not an offset into the current buffer.
        start: usize,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UnmatchedInput { offset, length } => {
                write!(f, "unmatched input at {}..{}", offset, offset + length)
            }
            Diagnostic::UnterminatedRegion { rule, start, .. } => {
                write!(f, "region `{}` opened at {} is not terminated", rule, start)
            }
        }
    }
}

/// Everything a scan produces.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanOutput {
    pub tokens: Vec<Token>,
    /// Pass to the next call to continue where this one stopped.
    pub end_state: ScopeStack,
    pub diagnostics: Vec<Diagnostic>,
}

/// One tokenizing session.
#[derive(Debug)]
pub struct Scanner<'g> {
    repository: &'g Repository,
    config: ScannerConfig,
    flattener: Flattener,
    /// Instantiated end templates by source; `None` marks one that failed to compile.
    ends: HashMap<String, Option<Arc<Pattern>>>,
}

/// Per-line bookkeeping shared by the driver and capture re-entry.
pub(crate) struct LineScan<'a> {
    pub line: &'a str,
    /// Buffer offset of the line.
    pub offset: usize,
    pub sink: &'a mut TokenSink,
    pub diagnostics: &'a mut Vec<Diagnostic>,
    /// How many captures deep this scan is nested.
    pub depth: usize,
}

impl<'g> Scanner<'g> {
    pub fn new(repository: &'g Repository) -> Self {
        Self::with_config(repository, ScannerConfig::default())
    }

    pub fn with_config(repository: &'g Repository, config: ScannerConfig) -> Self {
        Self {
            repository,
            config,
            flattener: Flattener::new(),
            ends: HashMap::new(),
        }
    }

    pub fn repository(&self) -> &'g Repository {
        self.repository
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// Tokenize `text`, starting from `state` or from a fresh stack.
    pub fn scan(&mut self, text: &str, state: Option<ScopeStack>) -> ScanOutput {
        let mut stack = state.unwrap_or_else(|| ScopeStack::new(self.repository));
        let mut sink = TokenSink::new(self.config.merge_tokens);
        let mut diagnostics = Vec::new();

        let mut offset = 0;
        for line in text.split_inclusive('\n') {
            let visible = line.len();
            let terminated;
            let line = if line.ends_with('\n') {
                line
            } else {
                terminated = format!("{}\n", line);
                terminated.as_str()
            };

            sink.begin_line(offset, visible);
            stack.clear_anchors();
            let anchor = stack.top().begin_captured_eol.then_some(0);

            let mut scan = LineScan {
                line,
                offset,
                sink: &mut sink,
                diagnostics: &mut diagnostics,
                depth: 0,
            };
            self.scan_line(&mut scan, 0, anchor, &mut stack);
            offset += visible;
        }

        for frame in stack.open_regions() {
            let rule = self.repository.rule(frame.rule).label();
            tracing::debug!(rule = %rule, start = frame.start, "region not terminated");
            diagnostics.push(Diagnostic::UnterminatedRegion {
                rule,
                scopes: frame.name_scopes.clone(),
                start: frame.start,
            });
        }

        let tokens = sink.into_tokens();
        tracing::debug!(
            bytes = text.len(),
            tokens = tokens.len(),
            diagnostics = diagnostics.len(),
            depth = stack.depth(),
            "scan finished"
        );

        ScanOutput {
            tokens,
            end_state: stack,
            diagnostics,
        }
    }

    /// Scan `scan.line` from `from` to its end against `stack`.
    pub(crate) fn scan_line(
        &mut self,
        scan: &mut LineScan<'_>,
        from: usize,
        anchor: Option<usize>,
        stack: &mut ScopeStack,
    ) {
        let repository = self.repository;
        let line = scan.line;
        let mut cursor = from;
        let mut anchor = anchor;
        let mut stall = 0usize;
        // Depth and position of the last zero-width push.
        let mut empty_push: Option<(usize, usize)> = None;
        // Lowest depth since the cursor last moved; frames above it were opened at the cursor.
        let mut settled = stack.depth();

        while cursor < line.len() {
            let found = {
                let top = stack.top();
                let rules = self.flattener.rules(repository, top.rule);
                let mut candidates: Vec<Candidate<'_>> = rules
                    .iter()
                    .filter_map(|id| {
                        let pattern = match &repository.rule(*id).kind {
                            RuleKind::Match { pattern, .. } => pattern,
                            RuleKind::Region(region) => &region.begin,
                            RuleKind::Group { .. } | RuleKind::Include(_) => return None,
                        };
                        Some(Candidate {
                            target: Target::Rule(*id),
                            pattern,
                        })
                    })
                    .collect();

                if let Some(end) = top.end.as_deref() {
                    let end = Candidate {
                        target: Target::End,
                        pattern: end,
                    };
                    let end_last = matches!(
                        &repository.rule(top.rule).kind,
                        RuleKind::Region(region) if region.apply_end_last
                    );
                    if end_last {
                        candidates.push(end);
                    } else {
                        candidates.insert(0, end);
                    }
                }

                find_next(&candidates, line, cursor, anchor == Some(cursor))
            };

            let Some(found) = found else {
                self.unmatched(scan, cursor, stack);
                break;
            };

            let span = found.groups.whole();
            scan.sink.produce(span.start, &stack.scopes());

            let mut forced = false;
            let mut unwind = false;
            match found.target {
                Target::End => {
                    let captures = match &repository.rule(stack.top().rule).kind {
                        RuleKind::Region(region) => &region.end_captures,
                        _ => &NO_CAPTURES,
                    };
                    let scopes = stack.delimiter_scopes();
                    self.resolve_captures(scan, &found.groups, captures, &scopes);

                    let empty_region = span.is_empty() && empty_push == Some((stack.depth(), span.start));
                    if let Some(frame) = stack.pop() {
                        tracing::trace!(
                            rule = %repository.rule(frame.rule).label(),
                            at = scan.offset + span.end,
                            "pop"
                        );
                        anchor = frame.parent_anchor;
                    }
                    settled = settled.min(stack.depth());
                    forced = empty_region;
                }
                Target::Rule(id) => {
                    let rule = repository.rule(id);
                    match &rule.kind {
                        RuleKind::Match { captures, .. } => {
                            let mut scopes = stack.scopes();
                            scopes.extend(rule.scopes.iter().cloned());
                            self.resolve_captures(scan, &found.groups, captures, &scopes);
                            forced = span.is_empty();
                        }
                        RuleKind::Region(region) => {
                            let repeat = span.is_empty()
                                && stack
                                    .opened_at(scan.offset + span.start)
                                    .any(|frame| frame.rule == id);
                            if repeat {
                                forced = true;
                                unwind = true;
                            } else {
                                let mut scopes = stack.scopes();
                                scopes.extend(rule.scopes.iter().cloned());
                                self.resolve_captures(scan, &found.groups, &region.begin_captures, &scopes);

                                let end = self.instantiate_end(&region.end, &found.groups, line);
                                tracing::trace!(
                                    rule = %rule.label(),
                                    at = scan.offset + span.start,
                                    end = end.as_deref().map(Pattern::source),
                                    "push"
                                );
                                stack.push(Frame {
                                    rule: id,
                                    name_scopes: rule.scopes.clone(),
                                    content_scopes: region.content_scopes.clone(),
                                    end,
                                    start: scan.offset + span.start,
                                    begin_captured_eol: span.end == line.len(),
                                    parent_anchor: anchor,
                                });
                                anchor = Some(span.end);
                                empty_push = span.is_empty().then(|| (stack.depth(), span.start));
                            }
                        }
                        RuleKind::Group { .. } | RuleKind::Include(_) => {}
                    }
                }
            }

            if span.end > cursor {
                cursor = span.end;
                stall = 0;
                settled = stack.depth();
                if !forced {
                    continue;
                }
            } else {
                stall += 1;
            }

            let stalled = stall > self.config.stall_limit;
            if forced || stalled {
                tracing::trace!(at = scan.offset + cursor, "no progress, forcing one character");
                if unwind || stalled {
                    while stack.depth() > settled {
                        if let Some(frame) = stack.pop() {
                            anchor = frame.parent_anchor;
                        }
                    }
                }
                cursor = self.force_step(scan, cursor, stack);
                stall = 0;
                settled = stack.depth();
                empty_push = None;
            }
        }
    }

    /// Emit one character with the current scopes; returns the new cursor.
    fn force_step(&self, scan: &mut LineScan<'_>, cursor: usize, stack: &ScopeStack) -> usize {
        let next = scan.line[cursor..]
            .chars()
            .next()
            .map_or(scan.line.len(), |c| cursor + c.len_utf8());
        scan.sink.produce(next, &stack.scopes());
        next
    }

    /// Cover the rest of the line with the current scopes.
    fn unmatched(&self, scan: &mut LineScan<'_>, cursor: usize, stack: &ScopeStack) {
        let rest = scan.line[cursor..].trim_end_matches(['\n', '\r']);
        if rest.chars().any(|c| !c.is_whitespace()) {
            scan.diagnostics.push(Diagnostic::UnmatchedInput {
                offset: scan.offset + cursor,
                length: rest.len(),
            });
        }
        scan.sink.produce(scan.line.len(), &stack.scopes());
    }

    fn instantiate_end(
        &mut self,
        end: &EndPattern,
        groups: &Groups,
        line: &str,
    ) -> Option<Arc<Pattern>> {
        let template = match end {
            EndPattern::Fixed(pattern) => return Some(Arc::clone(pattern)),
            EndPattern::Template(template) => template,
        };
        let source = template.instantiate(&groups.texts(line));
        if let Some(cached) = self.ends.get(&source) {
            return cached.clone();
        }

        let compiled = match Pattern::new(&source, self.repository.backtrack_limit()) {
            Ok(pattern) => Some(Arc::new(pattern)),
            Err(err) => {
                tracing::warn!(error = %err, "end pattern failed to compile, region only ends with the buffer");
                None
            }
        };
        self.ends.insert(source, compiled.clone());
        compiled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{RawGrammar, RawRule};

    fn repository(grammar: RawGrammar) -> Repository {
        Repository::new(&grammar, 1_000_000).unwrap()
    }

    fn spans(output: &ScanOutput, text: &str) -> Vec<(String, Vec<String>)> {
        output
            .tokens
            .iter()
            .map(|t| (t.text(text).to_string(), t.scopes.clone()))
            .collect()
    }

    #[test]
    fn test_empty_buffer() {
        let repo = repository(RawGrammar::new("source.t").pattern(RawRule::matching("a")));
        let output = Scanner::new(&repo).scan("", None);
        assert!(output.tokens.is_empty());
        assert!(output.diagnostics.is_empty());
        assert!(output.end_state.is_bottom());
    }

    #[test]
    fn test_virtual_newline_lets_dollar_match() {
        let repo = repository(
            RawGrammar::new("source.t").pattern(RawRule::matching("b$").scope("end")),
        );
        let text = "ab";
        let output = Scanner::new(&repo).scan(text, None);
        assert_eq!(
            spans(&output, text),
            vec![
                ("a".to_string(), vec!["source.t".to_string()]),
                ("b".to_string(), vec!["source.t".to_string(), "end".to_string()]),
            ]
        );
        assert_eq!(output.tokens.last().unwrap().end(), 2);
    }

    #[test]
    fn test_unmatched_text_is_reported_once_per_line() {
        let repo = repository(RawGrammar::new("source.t").pattern(RawRule::matching("a")));
        let output = Scanner::new(&repo).scan("a xyz\n  \n", None);
        assert_eq!(
            output.diagnostics,
            vec![Diagnostic::UnmatchedInput { offset: 1, length: 4 }]
        );
    }

    #[test]
    fn test_zero_width_match_is_forced_forward() {
        let repo = repository(
            RawGrammar::new("source.t").pattern(RawRule::matching("(?=x)").scope("never")),
        );
        let text = "xx";
        let output = Scanner::new(&repo).scan(text, None);
        assert_eq!(output.tokens.len(), 1);
        assert_eq!(output.tokens[0].span(), 0..2);
        assert_eq!(output.tokens[0].scopes, vec!["source.t"]);
    }

    #[test]
    fn test_empty_region_loop_terminates() {
        let repo = repository(
            RawGrammar::new("source.t").pattern(RawRule::region("(?=x)", "(?=x)").scope("r")),
        );
        let text = "xxx\n";
        let output = Scanner::new(&repo).scan(text, None);
        let covered: usize = output.tokens.iter().map(|t| t.length).sum();
        assert_eq!(covered, text.len());
    }

    #[test]
    fn test_end_template_cache_is_shared_by_frames() {
        let repo = repository(
            RawGrammar::new("source.t").pattern(RawRule::region(r"<(\w+)>", r"</\1>").scope("tag")),
        );
        let mut scanner = Scanner::new(&repo);
        scanner.scan("<a></a><a></a><b></b>", None);
        assert_eq!(scanner.ends.len(), 2);
    }

    #[test]
    fn test_diagnostic_display() {
        let unmatched = Diagnostic::UnmatchedInput { offset: 3, length: 2 };
        assert_eq!(unmatched.to_string(), "unmatched input at 3..5");
        let json = serde_json::to_string(&unmatched).unwrap();
        assert_eq!(json, r#"{"kind":"unmatched_input","offset":3,"length":2}"#);
    }
}
