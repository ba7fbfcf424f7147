//! Tokens and the token sink
//!
//!     The driver never builds tokens directly. It tells a [TokenSink] "everything up to here
//!     carries these scopes", and the sink turns that into contiguous tokens. Because every
//!     call starts where the previous one ended, the output partitions the input by
//!     construction: there is no way to produce a gap or an overlap.

use serde::Serialize;
use std::ops::Range;

/// A scope-labeled span of the input. Offsets are bytes into the scanned buffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub start: usize,
    pub length: usize,
    /// Outermost scope first.
    pub scopes: Vec<String>,
}

impl Token {
    pub fn end(&self) -> usize {
        self.start + self.length
    }

    pub fn span(&self) -> Range<usize> {
        self.start..self.end()
    }

    /// The token's text in the buffer it was scanned from.
    pub fn text<'a>(&self, buffer: &'a str) -> &'a str {
        &buffer[self.span()]
    }

    /// The innermost scope, if any.
    pub fn innermost(&self) -> Option<&str> {
        self.scopes.last().map(String::as_str)
    }
}

/// Collects tokens for one scan, one line at a time.
#[derive(Debug)]
pub struct TokenSink {
    tokens: Vec<Token>,
    merge: bool,
    /// Buffer offset of the current line.
    line_start: usize,
    /// Length of the current line that exists in the buffer.
    line_visible: usize,
    /// Index of the current line's first token; tokens never merge across lines.
    line_first_token: usize,
    /// Line-relative position up to which tokens have been produced.
    position: usize,
}

impl TokenSink {
    pub fn new(merge: bool) -> Self {
        Self {
            tokens: Vec::new(),
            merge,
            line_start: 0,
            line_visible: 0,
            line_first_token: 0,
            position: 0,
        }
    }

    /// Start a new line. `visible` excludes a virtual terminator added by the driver.
    pub fn begin_line(&mut self, line_start: usize, visible: usize) {
        self.line_start = line_start;
        self.line_visible = visible;
        self.line_first_token = self.tokens.len();
        self.position = 0;
    }

    /// Line-relative position up to which input has been covered.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Cover the input up to `end` (line-relative) with `scopes`. Positions at or before the
    /// current one are ignored.
    pub fn produce(&mut self, end: usize, scopes: &[String]) {
        if end <= self.position {
            return;
        }
        let from = self.position.min(self.line_visible);
        let to = end.min(self.line_visible);
        self.position = end;
        if to <= from {
            return;
        }

        let start = self.line_start + from;
        if self.merge && self.tokens.len() > self.line_first_token {
            if let Some(last) = self.tokens.last_mut() {
                if last.end() == start && last.scopes == scopes {
                    last.length += to - from;
                    return;
                }
            }
        }
        self.tokens.push(Token {
            start,
            length: to - from,
            scopes: scopes.to_vec(),
        });
    }

    pub fn into_tokens(self) -> Vec<Token> {
        self.tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scopes(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_produce_is_contiguous_and_merges() {
        let mut sink = TokenSink::new(true);
        sink.begin_line(0, 6);
        sink.produce(2, &scopes(&["a"]));
        sink.produce(2, &scopes(&["ignored"]));
        sink.produce(4, &scopes(&["a"]));
        sink.produce(6, &scopes(&["b"]));

        let tokens = sink.into_tokens();
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].span(), 0..4);
        assert_eq!(tokens[1].span(), 4..6);
        assert_eq!(tokens[1].innermost(), Some("b"));
    }

    #[test]
    fn test_no_merge_across_lines() {
        let mut sink = TokenSink::new(true);
        sink.begin_line(0, 3);
        sink.produce(3, &scopes(&["a"]));
        sink.begin_line(3, 2);
        sink.produce(2, &scopes(&["a"]));
        assert_eq!(sink.into_tokens().len(), 2);
    }

    #[test]
    fn test_clips_virtual_terminator() {
        let mut sink = TokenSink::new(false);
        sink.begin_line(10, 3);
        sink.produce(2, &scopes(&["a"]));
        sink.produce(4, &scopes(&["b"]));
        let tokens = sink.into_tokens();
        assert_eq!(tokens[1].span(), 12..13);
        assert_eq!(sink_text(&tokens), vec![10..12, 12..13]);
    }

    fn sink_text(tokens: &[Token]) -> Vec<Range<usize>> {
        tokens.iter().map(Token::span).collect()
    }
}
