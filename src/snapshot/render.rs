//! Snapshot rendering
//!
//!     Every source line is written as `>` followed by the line. Under it, each token on the
//!     line gets its own row: `#`, spaces up to the token's column, one `^` per character and
//!     then the token's scopes separated by spaces. The `#` sits under the `>`, so carets line
//!     up with the characters they mark. Line terminators are never marked.

use crate::scanner::Token;

/// Render tokens of `source` in snapshot form. Columns count characters, not bytes.
pub fn render(source: &str, tokens: &[Token]) -> String {
    let mut out = String::new();
    let mut next = 0;
    let mut line_start = 0;

    for raw in source.split_inclusive('\n') {
        let line = raw.trim_end_matches(['\n', '\r']);
        let line_end = line_start + line.len();

        out.push('>');
        out.push_str(line);
        out.push('\n');

        while next < tokens.len() && tokens[next].start < line_start + raw.len() {
            let token = &tokens[next];
            next += 1;

            let start = token.start.max(line_start);
            let end = token.end().min(line_end);
            if start >= end || token.scopes.is_empty() {
                continue;
            }
            let column = line[..start - line_start].chars().count();
            let width = line[start - line_start..end - line_start].chars().count();

            out.push('#');
            out.push_str(&" ".repeat(column));
            out.push_str(&"^".repeat(width));
            out.push(' ');
            out.push_str(&token.scopes.join(" "));
            out.push('\n');
        }

        line_start += raw.len();
    }

    out
}
