//! Compiled patterns
//!
//!     Grammar regexes are written in the Oniguruma dialect TextMate grammars use: lookbehind,
//!     backreferences, atomic groups and the `\G` anchor all show up in practice. They are
//!     compiled with `fancy-regex`, which covers everything except `\G`.
//!
//!     `\G` Handling
//!
//!         `\G` asserts "the position where the enclosing region's begin match ended". Each
//!         pattern containing it is compiled twice: once with `\G` rewritten to the empty
//!         string, used when the search starts at the anchor, and once with `\G` rewritten to
//!         a character that never occurs in source text, used everywhere else.
//!
//!     End Templates
//!
//!         In an end pattern, `\1`..`\9` refer to the groups of the begin match that opened
//!         the region, not to groups of the end pattern itself. Such an end pattern is kept as
//!         an [EndTemplate] and only compiled once a frame is pushed and the begin text is
//!         known. Named backreferences (`\k<name>`) are untouched and keep referring to the
//!         end match's own groups.

use super::error::PatternError;
use fancy_regex::RegexBuilder;
use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;
use std::fmt;
use std::ops::Range;

/// Matches one backslash escape. Because matches never overlap, `\\1` is read as an escaped
/// backslash followed by a literal `1`, not as a backreference.
static ESCAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\\(.)").expect("escape scanner is a valid regex"));

/// Stands in for `\G` when the search does not start at the anchor.
const NEVER: &str = r"\x{FFFF}";

/// Spans of every group of one match, group 0 first. Offsets are relative to the line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Groups(Vec<Option<Range<usize>>>);

impl Groups {
    pub fn whole(&self) -> Range<usize> {
        self.0.first().cloned().flatten().unwrap_or(0..0)
    }

    pub fn get(&self, index: usize) -> Option<Range<usize>> {
        self.0.get(index).cloned().flatten()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The text of every group, for instantiating end templates.
    pub fn texts<'t>(&self, line: &'t str) -> Vec<Option<&'t str>> {
        self.0
            .iter()
            .map(|span| span.clone().and_then(|span| line.get(span)))
            .collect()
    }
}

/// A compiled grammar regex.
pub struct Pattern {
    source: String,
    regex: fancy_regex::Regex,
    anchored: Option<fancy_regex::Regex>,
}

impl Pattern {
    pub fn new(source: &str, backtrack_limit: usize) -> Result<Self, PatternError> {
        let mut has_anchor = false;
        let detached = rewrite_escapes(source, |c| {
            (c == 'G').then(|| {
                has_anchor = true;
                NEVER.to_string()
            })
        });
        let regex = build(source, &detached, backtrack_limit)?;

        let anchored = if has_anchor {
            let attached = rewrite_escapes(source, |c| (c == 'G').then(String::new));
            Some(build(source, &attached, backtrack_limit)?)
        } else {
            None
        };

        Ok(Self {
            source: source.to_string(),
            regex,
            anchored,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn has_anchor(&self) -> bool {
        self.anchored.is_some()
    }

    /// Leftmost match at or after `from`. Text before `from` stays visible to lookbehind.
    ///
    /// With `at_anchor` set, `\G` holds at `from` and nowhere else: the anchored variant is
    /// only accepted for a match starting exactly at `from`, and the search otherwise resumes
    /// one character later with `\G` failing.
    pub fn find_at(
        &self,
        line: &str,
        from: usize,
        at_anchor: bool,
    ) -> Result<Option<Groups>, fancy_regex::Error> {
        let Some(anchored) = self.anchored.as_ref().filter(|_| at_anchor) else {
            return captures(&self.regex, line, from);
        };
        if let Some(groups) = captures(anchored, line, from)? {
            if groups.whole().start == from {
                return Ok(Some(groups));
            }
        }
        match line.get(from..).and_then(|rest| rest.chars().next()) {
            Some(c) => captures(&self.regex, line, from + c.len_utf8()),
            None => Ok(None),
        }
    }
}

fn captures(
    regex: &fancy_regex::Regex,
    line: &str,
    from: usize,
) -> Result<Option<Groups>, fancy_regex::Error> {
    let Some(caps) = regex.captures_from_pos(line, from)? else {
        return Ok(None);
    };
    let groups = (0..caps.len())
        .map(|i| caps.get(i).map(|m| m.start()..m.end()))
        .collect();
    Ok(Some(Groups(groups)))
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pattern").field(&self.source).finish()
    }
}

/// An end pattern whose text depends on the begin match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndTemplate {
    source: String,
}

impl EndTemplate {
    /// Returns a template if `source` contains begin backreferences.
    pub fn parse(source: &str) -> Option<Self> {
        let mut found = false;
        let _ = rewrite_escapes(source, |c| {
            found |= ('1'..='9').contains(&c);
            None
        });
        found.then(|| Self {
            source: source.to_string(),
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Substitute the escaped begin texts. A group that did not participate becomes empty.
    pub fn instantiate(&self, begin: &[Option<&str>]) -> String {
        rewrite_escapes(&self.source, |c| {
            let index = c.to_digit(10).filter(|d| *d > 0)? as usize;
            let text = begin.get(index).copied().flatten().unwrap_or("");
            Some(fancy_regex::escape(text).into_owned())
        })
        .into_owned()
    }
}

fn rewrite_escapes(source: &str, mut replace: impl FnMut(char) -> Option<String>) -> Cow<'_, str> {
    ESCAPE.replace_all(source, |caps: &regex::Captures<'_>| {
        let escaped = caps[1].chars().next().unwrap_or('\\');
        replace(escaped).unwrap_or_else(|| caps[0].to_string())
    })
}

fn build(
    original: &str,
    source: &str,
    backtrack_limit: usize,
) -> Result<fancy_regex::Regex, PatternError> {
    // Oniguruma treats ^ and $ as line anchors.
    RegexBuilder::new(&format!("(?m){}", source))
        .backtrack_limit(backtrack_limit)
        .build()
        .map_err(|e| PatternError {
            pattern: original.to_string(),
            message: e.to_string(),
        })
}
