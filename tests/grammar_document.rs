//! Generating, loading and validating grammar documents

use clove_syntax::clove;
use clove_syntax::grammar::{self, GrammarError, RawGrammar, Repository};
use clove_syntax::scanner::Scanner;
use clove_syntax::testing::assert_tokens;
use rstest::rstest;
use std::fs;

const LIMIT: usize = 1_000_000;

#[rstest]
#[case::compact(false)]
#[case::pretty(true)]
fn test_generated_json_passes_validation(#[case] pretty: bool) {
    let grammar = clove::grammar();
    let json = if pretty {
        grammar.to_json_pretty().unwrap()
    } else {
        grammar.to_json().unwrap()
    };

    let document = grammar::parse_json(&json).unwrap();
    let loaded = grammar::validated(document, LIMIT).unwrap();
    assert_eq!(loaded, grammar);

    let keys: Vec<_> = loaded.repository.keys().cloned().collect();
    let expected: Vec<_> = grammar.repository.keys().cloned().collect();
    assert_eq!(keys, expected);
}

#[test]
fn test_yaml_grammar_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mini.tmLanguage.yaml");
    fs::write(
        &path,
        r##"
scopeName: source.mini
fileTypes: [mini]
patterns:
  - include: "#keywords"
  - begin: "<(\\w+)>"
    end: "</\\1>"
    name: tag
    patterns:
      - include: $self
repository:
  keywords:
    match: \b(let|in)\b
    name: keyword.mini
"##,
    )
    .unwrap();

    let repository = Repository::from_path(&path, LIMIT).unwrap();
    assert!(repository.accepts(&dir.path().join("a.mini"), ""));

    let source = "let <p>in</p>";
    let output = Scanner::new(&repository).scan(source, None);
    assert_tokens(&output, source)
        .covers_source()
        .no_diagnostics()
        .token(0, |t| t.text("let").scopes(&["source.mini", "keyword.mini"]))
        .find("<p>", |t| t.scopes(&["source.mini", "tag"]))
        .find("in", |t| t.scopes(&["source.mini", "tag", "keyword.mini"]));
}

#[test]
fn test_invalid_document_lists_every_violation() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    fs::write(
        &path,
        r##"{ "patterns": [ { "begin": "a" }, { "include": "#nowhere" } ] }"##,
    )
    .unwrap();

    let Err(GrammarError::Schema(errors)) = grammar::load(&path, LIMIT) else {
        panic!("expected schema violations");
    };
    let messages: Vec<_> = errors.violations.iter().map(|v| v.to_string()).collect();
    assert_eq!(
        messages,
        vec![
            "/: missing required key `scopeName`",
            "/patterns/0: `begin` requires `end`",
            "/patterns/1/include: unknown rule `nowhere`",
        ]
    );
}

#[test]
fn test_unreadable_documents_are_grammar_errors() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.json");
    assert!(matches!(
        grammar::load(&missing, LIMIT),
        Err(GrammarError::Io(_))
    ));

    let garbled = dir.path().join("garbled.json");
    fs::write(&garbled, "{ not json").unwrap();
    assert!(matches!(
        grammar::load(&garbled, LIMIT),
        Err(GrammarError::Json(_))
    ));
}

#[test]
fn test_builder_grammar_compiles_directly() {
    let grammar = RawGrammar::new("source.t").pattern(clove_syntax::RawRule::matching("x").scope("x"));
    let repository = Repository::new(&grammar, LIMIT).unwrap();
    assert_eq!(repository.scope_name(), "source.t");
}
