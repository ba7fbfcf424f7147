//! Fluent assertions over scan output
//!
//!     Checking tokens one field at a time gets long quickly. These helpers walk the token
//!     list with the source text at hand, so tests read in terms of text and scopes:
//!
//!     ```rust,ignore
//!     use clove_syntax::testing::assert_tokens;
//!
//!     let output = scanner.scan(source, None);
//!     assert_tokens(&output, source)
//!         .no_diagnostics()
//!         .token(0, |t| t.text("if").innermost("keyword.control.flow.clove"))
//!         .find("\"", |t| t.has_scope("punctuation.definition.string.begin.clove"));
//!     ```

use crate::scanner::{Diagnostic, ScanOutput, Token};

// ============================================================================
// Entry Point
// ============================================================================

/// Create an assertion builder over the tokens of one scan.
pub fn assert_tokens<'a>(output: &'a ScanOutput, source: &'a str) -> TokensAssertion<'a> {
    TokensAssertion { output, source }
}

// ============================================================================
// Token List Assertions
// ============================================================================

pub struct TokensAssertion<'a> {
    output: &'a ScanOutput,
    source: &'a str,
}

impl<'a> TokensAssertion<'a> {
    /// Assert the number of tokens
    pub fn count(self, expected: usize) -> Self {
        assert_eq!(
            self.output.tokens.len(),
            expected,
            "Expected {} tokens, found {}: [{}]",
            expected,
            self.output.tokens.len(),
            self.summary()
        );
        self
    }

    /// Assert the tokens cover the whole source, in order, without gaps or overlap.
    pub fn covers_source(self) -> Self {
        let mut position = 0;
        for token in &self.output.tokens {
            assert_eq!(
                token.start,
                position,
                "Gap or overlap before {:?}: [{}]",
                token.text(self.source),
                self.summary()
            );
            assert!(token.length > 0, "Empty token at {}", token.start);
            position = token.end();
        }
        assert_eq!(position, self.source.len(), "Tokens stop short of the end");
        self
    }

    /// Assert on the token at `index`
    pub fn token<F>(self, index: usize, assertion: F) -> Self
    where
        F: FnOnce(TokenAssertion<'a>) -> TokenAssertion<'a>,
    {
        let Some(token) = self.output.tokens.get(index) else {
            panic!(
                "Token index {} out of bounds ({} tokens): [{}]",
                index,
                self.output.tokens.len(),
                self.summary()
            );
        };
        assertion(TokenAssertion::new(token, self.source, format!("tokens[{}]", index)));
        self
    }

    /// Assert on the first token whose text is exactly `text`
    pub fn find<F>(self, text: &str, assertion: F) -> Self
    where
        F: FnOnce(TokenAssertion<'a>) -> TokenAssertion<'a>,
    {
        let Some(token) = self
            .output
            .tokens
            .iter()
            .find(|token| token.text(self.source) == text)
        else {
            panic!("No token with text {:?}: [{}]", text, self.summary());
        };
        assertion(TokenAssertion::new(token, self.source, format!("{:?}", text)));
        self
    }

    /// Assert the scan reported nothing
    pub fn no_diagnostics(self) -> Self {
        assert!(
            self.output.diagnostics.is_empty(),
            "Expected no diagnostics, found {:?}",
            self.output.diagnostics
        );
        self
    }

    /// Assert the scan reported exactly `expected`
    pub fn diagnostics(self, expected: &[Diagnostic]) -> Self {
        assert_eq!(self.output.diagnostics, expected);
        self
    }

    /// Assert the number of regions still open at the end
    pub fn open_regions(self, expected: usize) -> Self {
        assert_eq!(
            self.output.end_state.open_regions().len(),
            expected,
            "Expected {} open regions at the end of the buffer",
            expected
        );
        self
    }

    fn summary(&self) -> String {
        self.output
            .tokens
            .iter()
            .map(|token| format!("{:?}", token.text(self.source)))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

// ============================================================================
// Single Token Assertions
// ============================================================================

pub struct TokenAssertion<'a> {
    token: &'a Token,
    source: &'a str,
    context: String,
}

impl<'a> TokenAssertion<'a> {
    fn new(token: &'a Token, source: &'a str, context: String) -> Self {
        Self {
            token,
            source,
            context,
        }
    }

    pub fn text(self, expected: &str) -> Self {
        assert_eq!(
            self.token.text(self.source),
            expected,
            "{}: unexpected text",
            self.context
        );
        self
    }

    pub fn starts_at(self, expected: usize) -> Self {
        assert_eq!(self.token.start, expected, "{}: unexpected start", self.context);
        self
    }

    /// The full scope list, outermost first.
    pub fn scopes(self, expected: &[&str]) -> Self {
        assert_eq!(self.token.scopes, expected, "{}: unexpected scopes", self.context);
        self
    }

    pub fn innermost(self, expected: &str) -> Self {
        assert_eq!(
            self.token.innermost(),
            Some(expected),
            "{}: unexpected innermost scope in {:?}",
            self.context,
            self.token.scopes
        );
        self
    }

    pub fn has_scope(self, expected: &str) -> Self {
        assert!(
            self.token.scopes.iter().any(|scope| scope == expected),
            "{}: {:?} lacks {}",
            self.context,
            self.token.scopes,
            expected
        );
        self
    }

    pub fn lacks_scope(self, unexpected: &str) -> Self {
        assert!(
            !self.token.scopes.iter().any(|scope| scope == unexpected),
            "{}: {:?} should not carry {}",
            self.context,
            self.token.scopes,
            unexpected
        );
        self
    }
}
