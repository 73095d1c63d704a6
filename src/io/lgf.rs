//! A subset of the lemon graph format: `@nodes`, `@arcs` and `@attributes`
//! sections of whitespace separated, optionally quoted tokens.

use crate::error::{HostError, Result};
use std::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    Nodes,
    Arcs,
    Attributes,
    Skipped,
}

/// One data row with its 1-based line number.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub line: usize,
    pub tokens: Vec<String>,
}

/// The sections of a graph file, headers separated from rows.
#[derive(Debug, Default)]
pub struct Document {
    pub node_columns: Vec<String>,
    pub nodes: Vec<Row>,
    pub arc_columns: Vec<String>,
    pub arcs: Vec<Row>,
    pub attributes: Vec<Row>,
}

impl Document {
    pub fn parse(text: &str, origin: &str) -> Result<Self> {
        let mut doc = Document::default();
        let mut section = Section::None;
        let mut expect_header = false;

        for (i, raw) in text.lines().enumerate() {
            let line = i + 1;
            let tokens = tokenize(raw).map_err(|msg| HostError::Parse { path: origin.to_string(), line, msg })?;
            let Some(first) = tokens.first() else { continue };

            if let Some(name) = first.strip_prefix('@') {
                section = match name {
                    "nodes" => Section::Nodes,
                    "arcs" | "edges" => Section::Arcs,
                    "attributes" => Section::Attributes,
                    _ => Section::Skipped,
                };
                expect_header = matches!(section, Section::Nodes | Section::Arcs);
                continue;
            }

            let row = Row { line, tokens };
            match (section, expect_header) {
                (Section::Nodes, true) => doc.node_columns = row.tokens,
                (Section::Arcs, true) => doc.arc_columns = row.tokens,
                (Section::Nodes, false) => doc.nodes.push(row),
                (Section::Arcs, false) => doc.arcs.push(row),
                (Section::Attributes, _) => doc.attributes.push(row),
                (Section::Skipped, _) => {}
                (Section::None, _) => {
                    return Err(HostError::Parse {
                        path: origin.to_string(),
                        line,
                        msg: "data outside of a section".into(),
                    })
                }
            }
            expect_header = false;
        }

        Ok(doc)
    }
}

/// Splits a line into tokens. `#` starts a comment outside of quotes; quoted
/// tokens may contain whitespace and the escapes `\"` and `\\`.
pub fn tokenize(line: &str) -> std::result::Result<Vec<String>, String> {
    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();

    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        match chars.peek() {
            None | Some('#') => break,
            Some('"') => {
                chars.next();
                let mut token = String::new();
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(c @ ('"' | '\\')) => token.push(c),
                            Some('t') => token.push('\t'),
                            Some('n') => token.push('\n'),
                            Some(c) => return Err(format!("unknown escape '\\{}'", c)),
                            None => return Err("unterminated quoted token".into()),
                        },
                        Some(c) => token.push(c),
                        None => return Err("unterminated quoted token".into()),
                    }
                }
                tokens.push(token);
            }
            Some(_) => {
                let mut token = String::new();
                while let Some(c) = chars.next_if(|c| !c.is_whitespace()) {
                    token.push(c);
                }
                tokens.push(token);
            }
        }
    }

    Ok(tokens)
}

/// Writes `token` so that `tokenize` reads it back unchanged.
pub fn write_token(out: &mut String, token: &str) {
    let plain = !token.is_empty()
        && !token.starts_with('@')
        && !token.chars().any(|c| c.is_whitespace() || c == '"' || c == '#' || c == '\\');
    if plain {
        out.push_str(token);
        return;
    }
    out.push('"');
    for c in token.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            c => out.push(c),
        }
    }
    out.push('"');
}

/// Writes one tab separated row.
pub fn write_row<'t>(out: &mut String, tokens: impl IntoIterator<Item = &'t str>) {
    for (i, token) in tokens.into_iter().enumerate() {
        if i > 0 {
            out.push('\t');
        }
        write_token(out, token);
    }
    let _ = writeln!(out);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("0\t1 a  0.5 0", &["0", "1", "a", "0.5", "0"])]
    #[case("  # only a comment", &[])]
    #[case("x \"two words\" y # trailing", &["x", "two words", "y"])]
    #[case(r#""say \"hi\"" "" "a\\b""#, &["say \"hi\"", "", "a\\b"])]
    fn splits_lines_into_tokens(#[case] line: &str, #[case] expected: &[&str]) {
        assert_eq!(tokenize(line).unwrap(), expected);
    }

    #[test]
    fn rejects_unterminated_quotes() {
        assert!(tokenize("a \"b").is_err());
    }

    #[test]
    fn written_tokens_read_back() {
        let tokens = ["plain", "", "with space", "quote\"d", "#hash", "@at", "back\\slash"];
        let mut out = String::new();
        write_row(&mut out, tokens.iter().copied());
        assert_eq!(tokenize(out.trim_end_matches('\n')).unwrap(), tokens);
    }

    #[test]
    fn separates_headers_from_rows() {
        let text = "\
# a comment
@nodes
label
0
1
@arcs
\t\tlabel\tweight
0\t1\ta\t0.5
@attributes
root 0
@unknown
whatever goes here
";
        let doc = Document::parse(text, "inline").unwrap();
        assert_eq!(doc.node_columns, vec!["label"]);
        assert_eq!(doc.nodes.len(), 2);
        assert_eq!(doc.arc_columns, vec!["label", "weight"]);
        assert_eq!(doc.arcs, vec![Row { line: 8, tokens: vec!["0".into(), "1".into(), "a".into(), "0.5".into()] }]);
        assert_eq!(doc.attributes[0].tokens, vec!["root", "0"]);
    }

    #[test]
    fn data_before_any_section_is_an_error() {
        let err = Document::parse("0 1\n", "inline").unwrap_err();
        assert!(matches!(err, HostError::Parse { line: 1, .. }));
    }
}
