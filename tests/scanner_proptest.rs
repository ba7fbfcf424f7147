//! Property-based tests for the scanner over the clove grammar
//!
//! Arbitrary input drawn from the characters the clove rules care about (quotes, braces,
//! comment markers, interpolation, xml brackets) must always be tokenized completely, the
//! same way every time, and identically whether scanned in one call or resumed line by line.

use clove_syntax::clove;
use clove_syntax::grammar::Repository;
use clove_syntax::scanner::{Scanner, Token};
use once_cell::sync::Lazy;
use proptest::prelude::*;

static REPOSITORY: Lazy<Repository> =
    Lazy::new(|| clove::repository(1_000_000).expect("clove grammar to compile"));

fn clove_text() -> impl Strategy<Value = String> {
    prop::string::string_regex(r#"[a-zA-Z0-9 \t"'$\{\}\(\)\[\]<>/*=:;.,\\\n]{0,80}"#)
        .expect("valid strategy regex")
}

proptest! {
    #[test]
    fn test_tokens_cover_input_exactly(text in clove_text()) {
        let output = Scanner::new(&REPOSITORY).scan(&text, None);

        let mut position = 0;
        for token in &output.tokens {
            prop_assert_eq!(token.start, position);
            prop_assert!(token.length > 0);
            prop_assert!(text.is_char_boundary(token.end()));
            position = token.end();
        }
        prop_assert_eq!(position, text.len());
    }

    #[test]
    fn test_scanning_is_deterministic(text in clove_text()) {
        let first = Scanner::new(&REPOSITORY).scan(&text, None);
        let second = Scanner::new(&REPOSITORY).scan(&text, None);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn test_line_by_line_resumption_matches_full_scan(text in clove_text()) {
        let full = Scanner::new(&REPOSITORY).scan(&text, None);

        let mut scanner = Scanner::new(&REPOSITORY);
        let mut state = None;
        let mut offset = 0;
        let mut resumed: Vec<Token> = Vec::new();
        for line in text.split_inclusive('\n') {
            let output = scanner.scan(line, state.take());
            resumed.extend(output.tokens.into_iter().map(|token| Token {
                start: token.start + offset,
                ..token
            }));
            state = Some(output.end_state);
            offset += line.len();
        }

        prop_assert_eq!(resumed, full.tokens);
    }
}
