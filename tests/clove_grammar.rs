//! Token-level tests for the built-in clove grammar

use clove_syntax::clove;
use clove_syntax::grammar::Repository;
use clove_syntax::scanner::{ScanOutput, Scanner};
use clove_syntax::testing::assert_tokens;
use once_cell::sync::Lazy;

static REPOSITORY: Lazy<Repository> = Lazy::new(|| clove::repository(1_000_000).unwrap());

const SRC: &str = "source.clove";

fn scan(source: &str) -> ScanOutput {
    Scanner::new(&REPOSITORY).scan(source, None)
}

#[test]
fn test_val_declaration() {
    let source = "val x = 1";
    let output = scan(source);

    assert_tokens(&output, source)
        .count(7)
        .covers_source()
        .no_diagnostics()
        .token(0, |t| t.text("val").scopes(&[SRC, "keyword.declaration.stable.clove"]))
        .token(1, |t| t.text(" ").scopes(&[SRC]))
        .token(2, |t| t.text("x").scopes(&[SRC, "variable.other.declaration.clove"]))
        .token(4, |t| t.text("=").scopes(&[SRC, "keyword.operator.comparison.clove"]))
        .token(6, |t| t.text("1").scopes(&[SRC, "constant.numeric.clove"]));
}

#[test]
fn test_interpolated_string_reenters_code() {
    let source = r#"s"a $b ${c}""#;
    let output = scan(source);

    assert_tokens(&output, source)
        .count(10)
        .covers_source()
        .no_diagnostics()
        .open_regions(0)
        .token(0, |t| t.text("s").scopes(&[SRC, "keyword.interpolation.clove"]))
        .token(1, |t| {
            t.text("\"").scopes(&[
                SRC,
                "string.quoted.double.interpolated.clove",
                "punctuation.definition.string.begin.clove",
            ])
        })
        .token(2, |t| t.text("a ").scopes(&[SRC, "string.quoted.double.interpolated.clove"]))
        .token(3, |t| {
            t.text("$").scopes(&[
                SRC,
                "meta.template.expression.clove",
                "punctuation.definition.template-expression.begin.clove",
            ])
        })
        .token(4, |t| t.text("b").scopes(&[SRC, "meta.template.expression.clove"]))
        .token(6, |t| {
            t.text("${")
                .innermost("punctuation.definition.template-expression.begin.clove")
        })
        .token(7, |t| {
            t.text("c").scopes(&[
                SRC,
                "meta.template.expression.clove",
                "meta.embedded.line.clove",
            ])
        })
        .token(8, |t| {
            t.text("}").scopes(&[
                SRC,
                "meta.template.expression.clove",
                "punctuation.definition.template-expression.end.clove",
            ])
        })
        .token(9, |t| t.text("\"").innermost("punctuation.definition.string.end.clove"));
}

#[test]
fn test_line_comment_after_leading_whitespace() {
    let source = "  // hi\n1";
    let output = scan(source);

    assert_tokens(&output, source)
        .count(4)
        .covers_source()
        .no_diagnostics()
        .open_regions(0)
        .token(0, |t| {
            t.text("  ")
                .scopes(&[SRC, "punctuation.whitespace.comment.leading.clove"])
        })
        .token(1, |t| {
            t.text("//").scopes(&[
                SRC,
                "comment.line.double-slash.clove",
                "punctuation.definition.comment.clove",
            ])
        })
        .token(2, |t| t.text(" hi\n").scopes(&[SRC, "comment.line.double-slash.clove"]))
        .token(3, |t| t.text("1").innermost("constant.numeric.clove"));
}

#[test]
fn test_block_comments_nest() {
    let source = "/* a /* b */ c */";
    let output = scan(source);
    let outer = "comment.block.clove";
    let delimiter = "punctuation.definition.comment.clove";

    assert_tokens(&output, source)
        .count(7)
        .covers_source()
        .no_diagnostics()
        .token(0, |t| t.text("/*").scopes(&[SRC, outer, delimiter]))
        .token(2, |t| t.text("/*").scopes(&[SRC, outer, outer, delimiter]))
        .token(3, |t| t.text(" b ").scopes(&[SRC, outer, outer]))
        .token(4, |t| t.text("*/").scopes(&[SRC, outer, outer, delimiter]))
        .token(5, |t| t.text(" c ").scopes(&[SRC, outer]))
        .token(6, |t| t.text("*/").scopes(&[SRC, outer, delimiter]));
}

#[test]
fn test_triple_quoted_string_spans_lines() {
    let source = "\"\"\"a\nb\"\"\"";
    let output = scan(source);
    let string = "string.quoted.triple.clove";

    assert_tokens(&output, source)
        .count(4)
        .covers_source()
        .open_regions(0)
        .token(0, |t| {
            t.text("\"\"\"")
                .scopes(&[SRC, string, "punctuation.definition.string.begin.clove"])
        })
        .token(1, |t| t.text("a\n").scopes(&[SRC, string]))
        .token(2, |t| t.text("b").scopes(&[SRC, string]))
        .token(3, |t| t.text("\"\"\"").innermost("punctuation.definition.string.end.clove"));
}

#[test]
fn test_char_literal() {
    let source = "'a'";
    let output = scan(source);
    let literal = "constant.character.literal.clove";

    assert_tokens(&output, source)
        .count(3)
        .no_diagnostics()
        .token(0, |t| {
            t.text("'").scopes(&[
                SRC,
                "string.quoted.other",
                literal,
                "punctuation.definition.character.begin.clove",
            ])
        })
        .token(1, |t| t.text("a").scopes(&[SRC, "string.quoted.other", literal]))
        .token(2, |t| t.text("'").innermost("punctuation.definition.character.end.clove"));
}

#[test]
fn test_import_region_ends_at_newline() {
    let source = "import a.b\n";
    let output = scan(source);
    let import = "meta.import.clove";

    assert_tokens(&output, source)
        .count(6)
        .covers_source()
        .no_diagnostics()
        .open_regions(0)
        .token(0, |t| t.text("import").scopes(&[SRC, import, "keyword.other.import.clove"]))
        .token(1, |t| t.text(" ").scopes(&[SRC, import]))
        .token(2, |t| t.text("a").scopes(&[SRC, import, "entity.name.import.clove"]))
        .token(3, |t| t.text(".").innermost("punctuation.definition.import"))
        .token(4, |t| t.text("b").innermost("entity.name.import.clove"))
        .token(5, |t| t.text("\n").scopes(&[SRC, import]));
}

#[test]
fn test_xml_pair_without_content() {
    let source = "<a></a>";
    let output = scan(source);
    let region = "meta.tag.no-content.xml";
    let tag = "punctuation.definition.tag.xml";

    assert_tokens(&output, source)
        .count(7)
        .covers_source()
        .no_diagnostics()
        .token(0, |t| t.text("<").scopes(&[SRC, region, tag]))
        .token(1, |t| {
            t.text("a")
                .scopes(&[SRC, region, "entity.name.tag.localname.xml"])
        })
        .token(2, |t| t.text(">").scopes(&[SRC, region, tag]))
        .token(3, |t| {
            t.text("<")
                .scopes(&[SRC, region, tag, "meta.scope.between-tag-pair.xml"])
        })
        .token(4, |t| t.text("/").scopes(&[SRC, region]))
        .token(5, |t| {
            t.text("a")
                .scopes(&[SRC, region, "entity.name.tag.localname.xml"])
        })
        .token(6, |t| t.text(">").scopes(&[SRC, region, tag]));
}

#[test]
fn test_namespaced_xml_pair_without_content() {
    let source = "<x:a></x:a>";
    let output = scan(source);
    let region = "meta.tag.no-content.xml";
    let tag = "punctuation.definition.tag.xml";
    let namespace = "entity.name.tag.namespace.xml";
    let separator = "punctuation.separator.namespace.xml";
    let local_name = "entity.name.tag.localname.xml";

    assert_tokens(&output, source)
        .count(11)
        .covers_source()
        .no_diagnostics()
        .token(0, |t| t.text("<").scopes(&[SRC, region, tag]))
        .token(1, |t| t.text("x").scopes(&[SRC, region, namespace]))
        .token(2, |t| {
            t.text(":")
                .scopes(&[SRC, region, "entity.name.tag.xml", separator])
        })
        .token(3, |t| t.text("a").scopes(&[SRC, region, local_name]))
        .token(4, |t| t.text(">").scopes(&[SRC, region, tag]))
        .token(6, |t| t.text("/").scopes(&[SRC, region]))
        .token(7, |t| t.text("x").scopes(&[SRC, region, namespace]))
        .token(8, |t| {
            t.text(":")
                .scopes(&[SRC, region, "entity.name.tag.xml", separator])
        })
        .token(9, |t| t.text("a").scopes(&[SRC, region, local_name]))
        .token(10, |t| t.text(">").scopes(&[SRC, region, tag]));
}

#[test]
fn test_keyword_beats_longer_identifier_only_on_word_boundary() {
    let source = "if (x) return y";
    let output = scan(source);

    assert_tokens(&output, source)
        .covers_source()
        .find("if", |t| t.innermost("keyword.control.flow.clove"))
        .find("return", |t| t.innermost("keyword.control.flow.jump.clove"));
}
