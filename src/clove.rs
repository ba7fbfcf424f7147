//! The clove grammar
//!
//!     The built-in grammar for clove source, declared with the [RawRule] builders. Identifier
//!     and operator fragments are composed once from character-class building blocks and
//!     shared by every rule that needs them.
//!
//!     Order inside each pattern list decides which rule wins when two match at the same
//!     offset, so the lists below are not sorted and must not be.
//!
//!     Some patterns are spelled differently from the published clove grammar while matching
//!     the same text under Oniguruma: a literal `{` is escaped, `#` inside classes is escaped
//!     and `/` is not, `\:` is written `:`, and the nested class `[[...]]` is flattened to
//!     `[...]`. These spellings are what fancy-regex accepts, so the emitted JSON differs
//!     from the published file at the text level only.

use crate::grammar::{GrammarError, RawGrammar, RawRule, Repository};
use once_cell::sync::Lazy;

pub const SCOPE_NAME: &str = "source.clove";

const UPPER_LETTER_CHARS: &str = r"A-Z\p{Lt}\p{Lu}";
const LOWER_LETTER_CHARS: &str = r"_a-z\$\p{Lo}\p{Nl}\p{Ll}";
/// `#` is escaped so the class survives `(?x)` patterns.
const OPCHAR: &str = r"[!\#%&*+\-/:<>=?@^|~\p{Sm}\p{So}]";
const BACK_QUOTED_ID: &str = "`[^`]+`";

/// Identifier fragments shared by the rules.
struct Identifiers {
    alpha_id: String,
    simple_interpolated_variable: String,
    id_upper: String,
    id_lower: String,
    plain_id: String,
}

static IDS: Lazy<Identifiers> = Lazy::new(|| {
    let letter_chars = format!("{}{}", UPPER_LETTER_CHARS, LOWER_LETTER_CHARS);
    let letter = format!("[{}]", letter_chars);
    let letter_or_digit = format!("[{}0-9]", letter_chars);
    let letter_or_digit_no_dollar = format!(
        "[{}{}0-9]",
        UPPER_LETTER_CHARS,
        LOWER_LETTER_CHARS.replacen(r"\$", "", 1)
    );
    // A trailing operator run is only part of an identifier after an underscore.
    let op_suffix = format!("(?:(?<=_){}+)?", OPCHAR);
    let idrest = format!("{}{}*{}", letter, letter_or_digit, op_suffix);

    Identifiers {
        alpha_id: format!("{}+", letter),
        simple_interpolated_variable: format!("{}{}*", letter, letter_or_digit_no_dollar),
        id_upper: format!("[{}]{}*{}", UPPER_LETTER_CHARS, letter_or_digit, op_suffix),
        id_lower: format!("[{}]{}*{}", LOWER_LETTER_CHARS, letter_or_digit, op_suffix),
        plain_id: format!("(?:{}|{}+)", idrest, OPCHAR),
    }
});

/// `backquoted | plain` identifier alternation, ungrouped.
fn any_id() -> String {
    format!("{}|{}", BACK_QUOTED_ID, IDS.plain_id)
}

/// The complete clove grammar document.
pub fn grammar() -> RawGrammar {
    let mut grammar = RawGrammar::new(SCOPE_NAME);
    grammar.name = Some("clove".to_string());
    grammar.file_types = vec!["clove".to_string()];
    grammar.first_line_match = Some(r"^#!/.*\b\w*clove\b".to_string());
    grammar.folding_start_marker = Some(r"/\*\*|\{\s*$".to_string());
    grammar.folding_stop_marker = Some(r"\*\*/|^\s*\}".to_string());
    grammar.key_equivalent = Some("^~S".to_string());
    grammar.uuid = Some("158C0929-299A-40C8-8D89-316BE0C446E8".to_string());

    grammar
        .pattern(RawRule::include("#code"))
        .rule("empty-parentheses", empty_parentheses())
        .rule("imports", imports())
        .rule("constants", constants())
        .rule("script-header", script_header())
        .rule("code", code())
        .rule("strings", strings())
        .rule("string-interpolation", string_interpolation())
        .rule("xml-entity", xml_entity())
        .rule("xml-singlequotedString", xml_string("'", "string.quoted.single.xml"))
        .rule("meta-colons", meta_colons())
        .rule("keywords", keywords())
        .rule("clove-quoted", clove_quoted())
        .rule("xml-doublequotedString", xml_string("\"", "string.quoted.double.xml"))
        .rule("declarations", declarations())
        .rule("char-literal", char_literal())
        .rule("initialization", initialization())
        .rule("clove-symbol", clove_symbol())
        .rule("curly-braces", curly_braces())
        .rule("meta-brackets", meta_brackets())
        .rule("qualifiedClassName", qualified_class_name())
        .rule("backQuotedVariable", RawRule::matching(BACK_QUOTED_ID))
        .rule("storage-modifiers", storage_modifiers())
        .rule("meta-bounds", meta_bounds())
        .rule("comments", comments())
        .rule("block-comments", block_comments())
        .rule("xml-embedded-content", xml_embedded_content())
        .rule("inheritance", inheritance())
        .rule("parameter-list", parameter_list())
        .rule("xml-literal", xml_literal())
}

/// Validate and compile the clove grammar.
pub fn repository(backtrack_limit: usize) -> Result<Repository, GrammarError> {
    Repository::new(&grammar(), backtrack_limit)
}

fn code() -> RawRule {
    RawRule::group(
        [
            "#script-header",
            "#storage-modifiers",
            "#declarations",
            "#inheritance",
            "#imports",
            "#comments",
            "#strings",
            "#initialization",
            "#xml-literal",
            "#keywords",
            "#constants",
            "#clove-symbol",
            "#clove-quoted",
            "#char-literal",
            "#empty-parentheses",
            "#parameter-list",
            "#qualifiedClassName",
            "#backQuotedVariable",
            "#curly-braces",
            "#meta-brackets",
            "#meta-bounds",
            "#meta-colons",
        ]
        .into_iter()
        .map(RawRule::include)
        .collect(),
    )
}

fn empty_parentheses() -> RawRule {
    RawRule::matching(r"(\(\))")
        .capture(1, "meta.bracket.clove")
        .scope("meta.parentheses.clove")
}

fn imports() -> RawRule {
    let selector = RawRule::region(r"\{", r"\}")
        .begin_capture(0, "meta.bracket.clove")
        .pattern(
            RawRule::matching(format!(
                r"(?x)\s*({ids})\s*(=>)\s*({ids})\s*",
                ids = any_id()
            ))
            .capture(1, "entity.name.import.renamed-from.clove")
            .capture(2, "keyword.other.arrow.clove")
            .capture(3, "entity.name.import.renamed-to.clove"),
        )
        .pattern(
            RawRule::matching([r"(given)(\s+", IDS.plain_id.as_str(), r")?(?=\s*[,}])"].concat())
                .capture(1, "keyword.given.import.clove")
                .capture(2, "entity.name.type.import.clove"),
        )
        .pattern(RawRule::matching(r"([^\s.,}]+)").scope("entity.name.import.clove"))
        .end_capture(0, "meta.bracket.clove")
        .scope("meta.import.selector.clove");

    RawRule::region(r"\b(import)\s+", r"(?<=[\n;])")
        .begin_capture(1, "keyword.other.import.clove")
        .pattern(RawRule::include("#comments"))
        .pattern(RawRule::matching(r"(given)(?=\s)").scope("keyword.given.import.clove"))
        .pattern(RawRule::matching(format!("({})", any_id())).scope("entity.name.import.clove"))
        .pattern(RawRule::matching(r"\.").scope("punctuation.definition.import"))
        .pattern(selector)
        .scope("meta.import.clove")
}

fn constants() -> RawRule {
    RawRule::group(vec![
        RawRule::matching(r"\b(false|null|true)\b").scope("constant.language.clove"),
        RawRule::matching(
            r"\b((0(x|X)[0-9a-fA-F]*)|(([0-9]+\.[0-9]+)|(\.[0-9]+))((e|E)(\+|-)?[0-9]+)?|[0-9]+)([LlFfDd]|UL|ul)?\b",
        )
        .scope("constant.numeric.clove"),
        RawRule::matching(r"\b(this|super)\b").scope("variable.language.clove"),
    ])
}

fn script_header() -> RawRule {
    RawRule::matching(r"^#!(.*)$")
        .capture(1, "string.unquoted.shebang.clove")
        .scope("comment.block.shebang.clove")
}

const STRING_ESCAPE: &str = r#"\\(?:[btnfr\\"']|[0-7]{1,3}|u[0-9A-Fa-f]{4})"#;
const TRIPLE_ESCAPE: &str = r"\\\\|\\u[0-9A-Fa-f]{4}";
const TRIPLE_QUOTE: &str = "\"\"\"";
const TRIPLE_QUOTE_END: &str = "\"\"\"(?!\")";

fn escape() -> RawRule {
    RawRule::matching(STRING_ESCAPE).scope("constant.character.escape.clove")
}

fn strings() -> RawRule {
    let triple = RawRule::region(TRIPLE_QUOTE, TRIPLE_QUOTE_END)
        .begin_capture(0, "punctuation.definition.string.begin.clove")
        .pattern(RawRule::matching(TRIPLE_ESCAPE).scope("constant.character.escape.clove"))
        .end_capture(0, "punctuation.definition.string.end.clove")
        .scope("string.quoted.triple.clove");

    let interpolated_triple = RawRule::region(
        [r"\b(", IDS.alpha_id.as_str(), ")(", TRIPLE_QUOTE, ")"].concat(),
        TRIPLE_QUOTE_END,
    )
    .begin_capture(1, "keyword.interpolation.clove")
    .begin_capture(
        2,
        "string.quoted.triple.interpolated.clove punctuation.definition.string.begin.clove",
    )
    .pattern(RawRule::include("#string-interpolation"))
    .pattern(RawRule::matching(TRIPLE_ESCAPE).scope("constant.character.escape.clove"))
    .pattern(RawRule::matching(".").scope("string.quoted.triple.interpolated.clove"))
    .end_capture(
        0,
        "string.quoted.triple.interpolated.clove punctuation.definition.string.end.clove",
    );

    let double = RawRule::region("\"", "\"")
        .begin_capture(0, "punctuation.definition.string.begin.clove")
        .pattern(escape())
        .pattern(
            RawRule::matching(r"\\.").scope("invalid.illegal.unrecognized-string-escape.clove"),
        )
        .end_capture(0, "punctuation.definition.string.end.clove")
        .scope("string.quoted.double.clove");

    let interpolated_double = RawRule::region([r"\b(", IDS.alpha_id.as_str(), ")(\")"].concat(), "\"")
        .begin_capture(1, "keyword.interpolation.clove")
        .begin_capture(
            2,
            "string.quoted.double.interpolated.clove punctuation.definition.string.begin.clove",
        )
        .pattern(RawRule::include("#string-interpolation"))
        .pattern(escape())
        .pattern(
            RawRule::matching(r"\\.").scope("invalid.illegal.unrecognized-string-escape.clove"),
        )
        .pattern(RawRule::matching(".").scope("string.quoted.double.interpolated.clove"))
        .end_capture(
            0,
            "string.quoted.double.interpolated.clove punctuation.definition.string.end.clove",
        );

    RawRule::group(vec![triple, interpolated_triple, double, interpolated_double])
}

fn string_interpolation() -> RawRule {
    RawRule::group(vec![
        RawRule::matching(r"\$\$").scope("constant.character.escape.interpolation.clove"),
        RawRule::matching(format!(r"(\$)({})", IDS.simple_interpolated_variable))
            .capture(1, "punctuation.definition.template-expression.begin.clove")
            .scope("meta.template.expression.clove"),
        RawRule::region(r"\$\{", r"\}")
            .scope("meta.template.expression.clove")
            .begin_capture(0, "punctuation.definition.template-expression.begin.clove")
            .end_capture(0, "punctuation.definition.template-expression.end.clove")
            .pattern(RawRule::include("#code"))
            .content_scope("meta.embedded.line.clove"),
    ])
}

fn xml_entity() -> RawRule {
    RawRule::matching(r"(&)([a-zA-Z_:][a-zA-Z0-9_.:-]*|#[0-9]+|#x[0-9a-fA-F]+)(;)")
        .capture(1, "punctuation.definition.constant.xml")
        .capture(3, "punctuation.definition.constant.xml")
        .scope("constant.character.entity.xml")
}

fn xml_string(quote: &str, scope: &str) -> RawRule {
    RawRule::region(quote, quote)
        .begin_capture(0, "punctuation.definition.string.begin.xml")
        .pattern(RawRule::include("#xml-entity"))
        .end_capture(0, "punctuation.definition.string.end.xml")
        .scope(scope)
}

fn meta_colons() -> RawRule {
    RawRule::group(vec![RawRule::matching("(?<!:):(?!:)").scope("meta.colon.clove")])
        .comment("For themes: Matching type colons")
}

fn keywords() -> RawRule {
    let block_end = [
        r"^\s*end(?=\s+(if|while|for|match|",
        IDS.plain_id.as_str(),
        r")\s*(//.*|/\*(?!.*\*/\s*\S.*).*)?$)",
    ]
    .concat();

    RawRule::group(vec![
        RawRule::matching(r"\b(return|throw)\b").scope("keyword.control.flow.jump.clove"),
        RawRule::matching(r"\b(classOf|isInstanceOf|asInstanceOf)\b")
            .scope("support.function.type-of.clove"),
        RawRule::matching(r"\b(else|if|then|do|while|for|yield|match|case)\b")
            .scope("keyword.control.flow.clove"),
        RawRule::matching(block_end).scope("keyword.control.flow.end.clove"),
        RawRule::matching(r"\b(catch|finally|try)\b").scope("keyword.control.exception.clove"),
        RawRule::matching("(==?|!=|<=|>=|<>|<|>)").scope("keyword.operator.comparison.clove"),
        RawRule::matching(r"(\-|\+|\*|/(?![/*])|%|~)").scope("keyword.operator.arithmetic.clove"),
        RawRule::matching(r"(!|&&|\|\|)").scope("keyword.operator.logical.clove"),
        RawRule::matching(r"(<-|←|->|→|=>|⇒|\?|:+|@|\|)+").scope("keyword.operator.clove"),
    ])
}

fn clove_quoted() -> RawRule {
    RawRule::matching(r"('\{|'\[)(?!')").scope("constant.other.quoted.clove")
}

fn declarations() -> RawRule {
    let package = RawRule::region(r"\b(package)\s+", r"(?<=[\n;])")
        .begin_capture(1, "keyword.other.import.clove")
        .pattern(RawRule::include("#comments"))
        .pattern(RawRule::matching(format!("({})", any_id())).scope("entity.name.package.clove"))
        .pattern(RawRule::matching(r"\.").scope("punctuation.definition.package"))
        .scope("meta.package.clove");

    RawRule::group(vec![
        RawRule::matching(format!(r"(?x)\b(def)\s+({})", any_id()))
            .capture(1, "keyword.declaration.clove")
            .capture(2, "entity.name.function.declaration"),
        RawRule::matching(r"\b(trait)\s+([^\s\{\(\[]+)")
            .capture(1, "keyword.declaration.clove")
            .capture(2, "entity.name.class.declaration"),
        RawRule::matching(r"\b(?:(case)\s+)?(class|object)\s+([^\s\{\(\[]+)")
            .capture(1, "keyword.declaration.clove")
            .capture(2, "keyword.declaration.clove")
            .capture(3, "entity.name.class.declaration"),
        RawRule::matching(format!(r"\b(type)\s+({})", any_id()))
            .capture(1, "keyword.declaration.clove")
            .capture(2, "entity.name.type.declaration"),
        RawRule::matching(format!(
            r"\b(val)\s+({upper}(\s*,\s*{upper})*)\b",
            upper = IDS.id_upper
        ))
        .capture(1, "keyword.declaration.stable.clove")
        .capture(2, "constant.other.declaration.clove"),
        RawRule::matching(format!(r"\b(?:(val)|(var))\s+(?:({})|(?=\())", any_id()))
            .capture(1, "keyword.declaration.stable.clove")
            .capture(2, "keyword.declaration.volatile.clove")
            .capture(3, "variable.other.declaration.clove"),
        RawRule::matching(r"\b(package)\s+(object)\s+([^\s\{\(\[]+)")
            .capture(1, "keyword.other.scoping.clove")
            .capture(2, "keyword.declaration.clove")
            .capture(3, "entity.name.class.declaration"),
        package,
    ])
}

fn char_literal() -> RawRule {
    RawRule::region("'", "'|$")
        .begin_capture(0, "punctuation.definition.character.begin.clove")
        .pattern(escape())
        .pattern(
            RawRule::matching(r"\\.").scope("invalid.illegal.unrecognized-character-escape.clove"),
        )
        .pattern(RawRule::matching("[^']{2,}").scope("invalid.illegal.character-literal-too-long"))
        .pattern(RawRule::matching("(?<!')[^']").scope("invalid.illegal.character-literal-too-long"))
        .end_capture(0, "punctuation.definition.character.end.clove")
        .scope("string.quoted.other constant.character.literal.clove")
}

fn initialization() -> RawRule {
    RawRule::matching(r"\b(new)\s+([^\s,\{\}\(\)\[\]]+)")
        .capture(1, "keyword.declaration.clove")
        .capture(2, "entity.name.class")
}

fn clove_symbol() -> RawRule {
    RawRule::matching(format!("(?>'{})(?!')", IDS.plain_id)).scope("constant.other.symbol.clove")
}

fn curly_braces() -> RawRule {
    RawRule::region(r"\{", r"\}")
        .begin_capture(0, "punctuation.section.block.begin.clove")
        .end_capture(0, "punctuation.section.block.end.clove")
        .pattern(RawRule::include("#code"))
}

fn meta_brackets() -> RawRule {
    RawRule::group(vec![
        RawRule::matching(r"\{")
            .comment("The punctuation.section.*.begin is needed for return snippet in source bundle")
            .scope("punctuation.section.block.begin.clove"),
        RawRule::matching(r"\}")
            .comment("The punctuation.section.*.end is needed for return snippet in source bundle")
            .scope("punctuation.section.block.end.clove"),
        RawRule::matching(r"\{|\}|\(|\)|\[|\]").scope("meta.bracket.clove"),
    ])
    .comment("For themes: Brackets look nice when colored.")
}

fn qualified_class_name() -> RawRule {
    RawRule::matching(r"(\b([A-Z][\w]*))").capture(1, "entity.name.class")
}

fn storage_modifiers() -> RawRule {
    RawRule::group(vec![
        RawRule::matching(r"\b(private\[\S+\]|protected\[\S+\]|private|protected)\b")
            .scope("storage.modifier.access"),
        RawRule::matching(
            r"\b(synchronized|@volatile|abstract|final|lazy|sealed|implicit|given|enum|inline |opaque |override|@transient|@native)\b",
        )
        .scope("storage.modifier.other"),
    ])
}

fn meta_bounds() -> RawRule {
    RawRule::matching("<%|=:=|<:<|<%<|>:|<:")
        .comment("For themes: Matching view bounds")
        .scope("meta.bounds.clove")
}

fn comments() -> RawRule {
    let line = RawRule::region("//", r"\n")
        .begin_capture(0, "punctuation.definition.comment.clove")
        .scope("comment.line.double-slash.clove");

    RawRule::group(vec![
        RawRule::include("#block-comments"),
        // Zero-width unless there is leading whitespace; closes right after the comment.
        RawRule::region(r"(^[ \t]+)?(?=//)", r"(?!\G)")
            .begin_capture(1, "punctuation.whitespace.comment.leading.clove")
            .pattern(line),
    ])
}

fn block_comments() -> RawRule {
    let doc_tag = "keyword.other.documentation.clovedoc.clove";
    let doc_link = "punctuation.definition.documentation.link.clove";

    let documentation = RawRule::region(r"^\s*(/\*\*)(?!/)", r"\*/")
        .begin_capture(1, "punctuation.definition.comment.clove")
        .pattern(
            RawRule::matching(r"(@param)\s+(\S+)")
                .capture(1, doc_tag)
                .capture(2, "variable.parameter.clove"),
        )
        .pattern(
            RawRule::matching(r"(@(?:tparam|throws))\s+(\S+)")
                .capture(1, doc_tag)
                .capture(2, "entity.name.class"),
        )
        .pattern(
            RawRule::matching(
                r"@(return|see|note|example|constructor|usecase|author|version|since|todo|deprecated|migration|define|inheritdoc)\b",
            )
            .scope(doc_tag),
        )
        .pattern(
            RawRule::matching(r"(\[\[)([^\]]+)(\]\])")
                .capture(1, doc_link)
                .capture(2, "string.other.link.title.markdown")
                .capture(3, doc_link),
        )
        .pattern(RawRule::include("#block-comments"))
        .end_capture(0, "punctuation.definition.comment.clove")
        .scope("comment.block.documentation.clove");

    RawRule::group(vec![
        RawRule::matching(r"/\*\*/")
            .capture(0, "punctuation.definition.comment.clove")
            .scope("comment.block.empty.clove"),
        documentation,
        RawRule::region(r"/\*", r"\*/")
            .capture(0, "punctuation.definition.comment.clove")
            .pattern(RawRule::include("#block-comments"))
            .scope("comment.block.clove"),
    ])
}

fn xml_embedded_content() -> RawRule {
    RawRule::group(vec![
        RawRule::region(r"\{", r"\}")
            .pattern(RawRule::include("#code"))
            .capture(0, "meta.bracket.clove")
            .scope("meta.source.embedded.clove"),
        RawRule::matching(" (?:([-_a-zA-Z0-9]+)((:)))?([_a-zA-Z-]+)=")
            .capture(1, "entity.other.attribute-name.namespace.xml")
            .capture(2, "entity.other.attribute-name.xml")
            .capture(3, "punctuation.separator.namespace.xml")
            .capture(4, "entity.other.attribute-name.localname.xml"),
        RawRule::include("#xml-doublequotedString"),
        RawRule::include("#xml-singlequotedString"),
    ])
}

fn inheritance() -> RawRule {
    RawRule::group(vec![RawRule::matching(r"(extends|with|derives)\s+([^\s\{\[\]]+)")
        .capture(1, "keyword.declaration.clove")
        .capture(2, "entity.other.inherited-class.clove")])
}

fn parameter_list() -> RawRule {
    RawRule::group(vec![RawRule::matching(format!(
        r"(?<=[^\._$a-zA-Z0-9])({}|{})\s*(:)\s+",
        BACK_QUOTED_ID, IDS.id_lower
    ))
    .capture(1, "variable.parameter.clove")
    .capture(2, "meta.colon.clove")])
}

fn xml_literal() -> RawRule {
    let tag = "punctuation.definition.tag.xml";
    let namespace = "entity.name.tag.namespace.xml";
    let separator = "punctuation.separator.namespace.xml";
    let local_name = "entity.name.tag.localname.xml";

    let no_content = RawRule::region(
        r"(<)((?:([_a-zA-Z0-9][_a-zA-Z0-9]*)((:)))?([_a-zA-Z0-9][-_a-zA-Z0-9:]*))(?=(\s[^>]*)?></\2>)",
        r"(>(<))/(?:([-_a-zA-Z0-9]+)((:)))?([-_a-zA-Z0-9:]*[_a-zA-Z0-9])(>)",
    )
    .begin_capture(1, tag)
    .begin_capture(3, namespace)
    .begin_capture(4, "entity.name.tag.xml")
    .begin_capture(5, separator)
    .begin_capture(6, local_name)
    .pattern(RawRule::include("#xml-embedded-content"))
    .comment(
        "We do not allow a tag name to start with a - since this would likely conflict with the <- operator. \
         This is not very common for tag names anyway.  Also code such as -- if (val <val2 || val> val3) will \
         falsly be recognized as an xml tag.  The solution is to put a space on either side of the comparison operator",
    )
    .end_capture(1, tag)
    .end_capture(2, "meta.scope.between-tag-pair.xml")
    .end_capture(3, namespace)
    .end_capture(4, "entity.name.tag.xml")
    .end_capture(5, separator)
    .end_capture(6, local_name)
    .end_capture(7, tag)
    .scope("meta.tag.no-content.xml");

    let tag_region = RawRule::region(
        r"(</?)(?:([_a-zA-Z0-9][-_a-zA-Z0-9]*)((:)))?([_a-zA-Z0-9][-_a-zA-Z0-9:]*)(?=[^>]*?>)",
        r"(/?>)",
    )
    .pattern(RawRule::include("#xml-embedded-content"))
    .capture(1, tag)
    .capture(2, namespace)
    .capture(3, "entity.name.tag.xml")
    .capture(4, separator)
    .capture(5, local_name)
    .scope("meta.tag.xml");

    RawRule::group(vec![no_content, tag_region, RawRule::include("#xml-entity")])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grammar_compiles() {
        let repository = repository(1_000_000).unwrap();
        assert_eq!(repository.scope_name(), SCOPE_NAME);
        for name in ["code", "strings", "string-interpolation", "xml-literal", "comments"] {
            assert!(repository.resolve(name).is_ok(), "missing {}", name);
        }
    }

    #[test]
    fn test_repository_keeps_declaration_order() {
        let grammar = grammar();
        let keys: Vec<_> = grammar.repository.keys().map(String::as_str).collect();
        assert_eq!(keys.first(), Some(&"empty-parentheses"));
        assert_eq!(keys.last(), Some(&"xml-literal"));
        assert_eq!(keys.len(), 29);
    }

    #[test]
    fn test_identifier_fragments() {
        let plain = fancy_regex::Regex::new(&format!("^{}$", IDS.plain_id)).unwrap();
        assert!(plain.is_match("foo_+").unwrap());
        assert!(plain.is_match("+=").unwrap());
        assert!(!plain.is_match("foo+").unwrap());

        let interpolated =
            fancy_regex::Regex::new(&format!("^{}$", IDS.simple_interpolated_variable)).unwrap();
        assert!(interpolated.is_match("name1").unwrap());
        assert!(!interpolated.is_match("a$b").unwrap());
    }

    #[test]
    fn test_recognizes_clove_files() {
        let repository = repository(1_000_000).unwrap();
        assert!(repository.accepts(std::path::Path::new("Main.clove"), ""));
        assert!(repository.accepts(std::path::Path::new("run"), "#!/usr/bin/env clove"));
    }
}
