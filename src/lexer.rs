/*
Copyright 2026 The rv32asm Authors

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/

//! Splits a source `Line` into tokens. `string` directives are a
//! special case (the remainder of the line is taken verbatim and
//! escape-decoded rather than tokenized); every other line is comment-
//! stripped, paren-padded, and split on whitespace/commas/quotes.

use std::sync::OnceLock;

use regex::Regex;

use crate::errors::AssemblerError;
use crate::line::Line;

/// One lexed line: the originating `Line` plus its non-empty tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineTokens {
    pub line: Line,
    pub tokens: Vec<String>,
}

fn splitter() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"[\s,'"]+"#).expect("static regex"))
}

/// Lexes a single line. Returns `None` for a line that tokenizes to nothing
/// (e.g. one that was only a comment) — callers should skip these, not
/// treat them as an error.
pub fn lex_tokens(line: &Line) -> Result<Option<LineTokens>, AssemblerError> {
    let trimmed = line.contents.trim();

    if let Some(rest) = trimmed.strip_prefix("string ").or_else(|| trimmed.strip_prefix("string\t")) {
        let decoded = unescape(rest, line)?;
        return Ok(Some(LineTokens {
            line: line.clone(),
            tokens: vec!["string".to_string(), decoded],
        }));
    }

    let without_comment = strip_comment(trimmed);
    let padded = without_comment.replace('(', " ( ").replace(')', " ) ");
    let tokens: Vec<String> = splitter()
        .split(&padded)
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string())
        .collect();

    if tokens.is_empty() {
        Ok(None)
    } else {
        Ok(Some(LineTokens { line: line.clone(), tokens }))
    }
}

fn strip_comment(text: &str) -> &str {
    match text.find('#') {
        Some(idx) => &text[..idx],
        None => text,
    }
}

/// Decodes standard backslash escapes (`\n`, `\t`, `\r`, `\0`, `\\`, `\'`,
/// `\"`, `\xHH`) in a `string` directive's raw remainder.
fn unescape(text: &str, line: &Line) -> Result<String, AssemblerError> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('\\') => out.push('\\'),
            Some('\'') => out.push('\''),
            Some('"') => out.push('"'),
            Some('x') => {
                let hi = chars.next();
                let lo = chars.next();
                let (Some(hi), Some(lo)) = (hi, lo) else {
                    return Err(AssemblerError::Syntax { line: line.clone(), reason: "truncated \\x escape".to_string() });
                };
                let byte = u8::from_str_radix(&format!("{hi}{lo}"), 16).map_err(|_| AssemblerError::Syntax {
                    line: line.clone(),
                    reason: format!("invalid \\x escape: \\x{hi}{lo}"),
                })?;
                out.push(byte as char);
            }
            Some(other) => {
                return Err(AssemblerError::Syntax { line: line.clone(), reason: format!("unknown escape sequence: \\{other}") });
            }
            None => {
                return Err(AssemblerError::Syntax { line: line.clone(), reason: "trailing backslash in string literal".to_string() });
            }
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(text: &str) -> Line {
        Line::synthetic(text)
    }

    #[test]
    fn splits_basic_instruction() {
        let lt = lex_tokens(&line("addi t0, t1, 4")).unwrap().unwrap();
        assert_eq!(lt.tokens, vec!["addi", "t0", "t1", "4"]);
    }

    #[test]
    fn strips_trailing_comment() {
        let lt = lex_tokens(&line("nop # do nothing")).unwrap().unwrap();
        assert_eq!(lt.tokens, vec!["nop"]);
    }

    #[test]
    fn pads_parens_for_base_offset_syntax() {
        let lt = lex_tokens(&line("lw t0, 4(sp)")).unwrap().unwrap();
        assert_eq!(lt.tokens, vec!["lw", "t0", "4", "(", "sp", ")"]);
    }

    #[test]
    fn comment_only_line_is_empty() {
        assert!(lex_tokens(&line("# just a comment")).unwrap().is_none());
    }

    #[test]
    fn string_directive_is_verbatim_and_escaped() {
        let lt = lex_tokens(&line(r#"string hello\nworld"#)).unwrap().unwrap();
        assert_eq!(lt.tokens, vec!["string".to_string(), "hello\nworld".to_string()]);
    }

    #[test]
    fn string_directive_ignores_hash() {
        let lt = lex_tokens(&line("string not # a comment")).unwrap().unwrap();
        assert_eq!(lt.tokens[1], "not # a comment");
    }
}
