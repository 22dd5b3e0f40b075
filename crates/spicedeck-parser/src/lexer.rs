//! SPICE netlist lexer.
//!
//! Line-oriented: `*` opens a whole-line comment, `;` and `$` open
//! rest-of-line comments, and a leading `+` continues the previous logical
//! line. Numeric literals fold their engineering suffix at lex time.

use spicedeck_core::units::parse_value;

use crate::error::LexError;
use crate::token::{Token, TokenKind};

/// Lexer configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LexerOptions {
    /// Consume the first non-blank line as the title, regardless of content.
    pub has_title: bool,
    /// Match dot-command words (`.END`, `.ENDS`) exactly when set.
    pub dot_case_sensitive: bool,
}

impl Default for LexerOptions {
    fn default() -> Self {
        Self {
            has_title: true,
            dot_case_sensitive: false,
        }
    }
}

/// Tokenize a netlist. Never drops characters: anything unrecognized is a
/// [`LexError`].
pub fn tokenize(text: &str, options: &LexerOptions) -> Result<Vec<Token>, LexError> {
    let mut tokens: Vec<Token> = Vec::new();
    let mut title_pending = options.has_title;
    let mut last_line = 0;

    for (idx, raw_line) in text.lines().enumerate() {
        let line_no = idx + 1;
        last_line = line_no;
        let trimmed = raw_line.trim();

        if title_pending {
            if trimmed.is_empty() {
                continue;
            }
            tokens.push(Token::new(TokenKind::Title, trimmed, line_no));
            tokens.push(Token::new(TokenKind::Newline, "\n", line_no));
            title_pending = false;
            continue;
        }

        if trimmed.starts_with('*') {
            tokens.push(Token::new(TokenKind::Comment, trimmed, line_no));
            tokens.push(Token::new(TokenKind::Newline, "\n", line_no));
            continue;
        }

        let mut body = trimmed;
        if let Some(rest) = trimmed.strip_prefix('+') {
            // Continuation: fuse with the previous logical line
            if tokens.last().map(|t| t.kind) == Some(TokenKind::Newline) {
                tokens.pop();
            }
            body = rest.trim_start();
        }

        lex_line(body, line_no, options, &mut tokens)?;
        tokens.push(Token::new(TokenKind::Newline, "\n", line_no));
    }

    tokens.push(Token::new(TokenKind::Eof, "", last_line + 1));
    Ok(tokens)
}

/// Characters that end a bare word/value run.
fn is_delimiter(c: char) -> bool {
    c.is_whitespace()
        || matches!(c, '(' | ')' | ',' | '=' | ';' | '$' | '{' | '}' | '\'' | '"' | '@')
}

fn lex_line(
    s: &str,
    line: usize,
    options: &LexerOptions,
    tokens: &mut Vec<Token>,
) -> Result<(), LexError> {
    let chars: Vec<char> = s.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == ' ' || c == '\t' || c == '\r' {
            i += 1;
            continue;
        }

        match c {
            ';' | '$' => break,
            '(' => {
                tokens.push(Token::new(TokenKind::LParen, "(", line));
                i += 1;
            }
            ')' => {
                tokens.push(Token::new(TokenKind::RParen, ")", line));
                i += 1;
            }
            ',' => {
                tokens.push(Token::new(TokenKind::Comma, ",", line));
                i += 1;
            }
            '=' => {
                tokens.push(Token::new(TokenKind::Equal, "=", line));
                i += 1;
            }
            '{' => {
                let mut depth = 1;
                let mut j = i + 1;
                while j < chars.len() && depth > 0 {
                    match chars[j] {
                        '{' => depth += 1,
                        '}' => depth -= 1,
                        _ => {}
                    }
                    j += 1;
                }
                if depth > 0 {
                    return Err(LexError::Unterminated {
                        what: "'{' expression",
                        line,
                    });
                }
                let body: String = chars[i + 1..j - 1].iter().collect();
                tokens.push(Token::new(TokenKind::Expression, body.trim(), line));
                i = j;
            }
            '\'' => {
                let j = find_char(&chars, i + 1, '\'').ok_or(LexError::Unterminated {
                    what: "quoted expression",
                    line,
                })?;
                let body: String = chars[i + 1..j].iter().collect();
                tokens.push(Token::new(TokenKind::Expression, body.trim(), line));
                i = j + 1;
            }
            '"' => {
                let j = find_char(&chars, i + 1, '"').ok_or(LexError::Unterminated {
                    what: "string",
                    line,
                })?;
                let body: String = chars[i + 1..j].iter().collect();
                tokens.push(Token::new(TokenKind::Str, body, line));
                i = j + 1;
            }
            '@' => {
                let close = find_char(&chars, i + 1, ']').ok_or(LexError::Unterminated {
                    what: "property reference",
                    line,
                })?;
                let lexeme: String = chars[i..=close].iter().collect();
                let token = Token::new(TokenKind::Reference, lexeme, line);
                if token.reference_parts().is_none() {
                    return Err(LexError::Unterminated {
                        what: "property reference",
                        line,
                    });
                }
                tokens.push(token);
                i = close + 1;
            }
            '.' if i + 1 < chars.len() && chars[i + 1].is_alphabetic() => {
                let mut j = i + 1;
                while j < chars.len() && (chars[j].is_alphanumeric() || chars[j] == '_') {
                    j += 1;
                }
                let word: String = chars[i + 1..j].iter().collect();
                let matches_kw = |kw: &str| {
                    if options.dot_case_sensitive {
                        word == kw
                    } else {
                        word.eq_ignore_ascii_case(kw)
                    }
                };
                if matches_kw("END") {
                    tokens.push(Token::new(TokenKind::End, format!(".{}", word), line));
                } else if matches_kw("ENDS") {
                    tokens.push(Token::new(TokenKind::Ends, format!(".{}", word), line));
                } else {
                    tokens.push(Token::new(TokenKind::Dot, ".", line));
                    tokens.push(Token::new(TokenKind::Word, word, line));
                }
                i = j;
            }
            _ => {
                let start = i;
                while i < chars.len() && !is_delimiter(chars[i]) {
                    i += 1;
                }
                if i == start {
                    return Err(LexError::UnexpectedChar { ch: c, line });
                }
                let run: String = chars[start..i].iter().collect();
                tokens.push(classify_bare(run, line)?);
            }
        }
    }

    Ok(())
}

fn find_char(chars: &[char], from: usize, needle: char) -> Option<usize> {
    chars[from..].iter().position(|&c| c == needle).map(|p| from + p)
}

/// Classify a bare token run as a word, a folded value, or an identifier.
///
/// A run that looks purely numeric but fails to parse (`1.2.3`, `1e+`) is a
/// malformed literal, not an identifier.
fn classify_bare(run: String, line: usize) -> Result<Token, LexError> {
    let first = run.chars().next().unwrap_or(' ');

    if first.is_alphabetic() || first == '_' {
        return Ok(Token::new(TokenKind::Word, run, line));
    }

    if let Some(value) = parse_value(&run) {
        return Ok(Token::value(TokenKind::Value, run, value, line));
    }

    let numeric_chars_only = run
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | '+' | '-' | 'e' | 'E'));
    if numeric_chars_only {
        return Err(LexError::MalformedNumber { lexeme: run, line });
    }

    Ok(Token::new(TokenKind::Identifier, run, line))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(input: &str) -> Vec<Token> {
        tokenize(input, &LexerOptions::default()).unwrap()
    }

    fn lex_untitled(input: &str) -> Vec<Token> {
        let options = LexerOptions {
            has_title: false,
            ..Default::default()
        };
        tokenize(input, &options).unwrap()
    }

    fn kinds(tokens: &[Token]) -> Vec<TokenKind> {
        tokens.iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_title_consumed_verbatim() {
        let tokens = lex("My Circuit *not a comment\nR1 1 0 1k\n");
        assert_eq!(tokens[0].kind, TokenKind::Title);
        assert_eq!(tokens[0].lexeme, "My Circuit *not a comment");
        assert_eq!(tokens[0].line, 1);
    }

    #[test]
    fn test_simple_resistor() {
        let tokens = lex_untitled("R1 1 0 1k");
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::Word,
                TokenKind::Value,
                TokenKind::Value,
                TokenKind::Value,
                TokenKind::Newline,
                TokenKind::Eof,
            ]
        );
        assert_eq!(tokens[0].lexeme, "R1");
        assert_eq!(tokens[3].value, Some(1000.0));
    }

    #[test]
    fn test_comment_line_preserved() {
        let tokens = lex_untitled("* a note\nR1 1 0 1k");
        assert_eq!(tokens[0].kind, TokenKind::Comment);
        assert_eq!(tokens[0].lexeme, "* a note");
    }

    #[test]
    fn test_inline_comment_dropped() {
        let tokens = lex_untitled("R1 1 0 1k ; trailing\nC1 1 0 1u $ also trailing");
        assert!(!tokens.iter().any(|t| t.lexeme.contains("trailing")));
        assert!(tokens.iter().any(|t| t.lexeme == "C1"));
    }

    #[test]
    fn test_continuation_fuses_lines() {
        let tokens = lex_untitled("R1 1\n+ 0 1k");
        let newline_count = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Newline)
            .count();
        assert_eq!(newline_count, 1);
        // Continuation tokens keep their physical line number
        assert_eq!(tokens[2].lexeme, "0");
        assert_eq!(tokens[2].line, 2);
    }

    #[test]
    fn test_dot_command_splits() {
        let tokens = lex_untitled(".model DMOD D");
        assert_eq!(tokens[0].kind, TokenKind::Dot);
        assert_eq!(tokens[1].kind, TokenKind::Word);
        assert_eq!(tokens[1].lexeme, "model");
    }

    #[test]
    fn test_end_and_ends_tokens() {
        let tokens = lex_untitled(".ends\n.end");
        assert_eq!(tokens[0].kind, TokenKind::Ends);
        assert_eq!(tokens[2].kind, TokenKind::End);
    }

    #[test]
    fn test_dot_case_sensitivity() {
        let options = LexerOptions {
            has_title: false,
            dot_case_sensitive: true,
        };
        let tokens = tokenize(".end\n.END", &options).unwrap();
        // Lowercase no longer matches the keyword
        assert_eq!(tokens[0].kind, TokenKind::Dot);
        assert_eq!(tokens[1].lexeme, "end");
        assert_eq!(tokens[3].kind, TokenKind::End);
    }

    #[test]
    fn test_value_suffixes() {
        let tokens = lex_untitled("C1 1 0 4.7u");
        let folded = tokens[3].value.unwrap();
        assert!((folded - 4.7e-6).abs() < 1e-16);
        let tokens = lex_untitled("V1 1 0 -5");
        assert_eq!(tokens[3].value, Some(-5.0));
        let tokens = lex_untitled("X1 1 0 1e-12");
        assert_eq!(tokens[3].value, Some(1e-12));
    }

    #[test]
    fn test_model_name_is_identifier() {
        let tokens = lex_untitled("D1 1 0 1N4148");
        assert_eq!(tokens[3].kind, TokenKind::Identifier);
        assert_eq!(tokens[3].lexeme, "1N4148");
    }

    #[test]
    fn test_malformed_number_is_error() {
        let options = LexerOptions {
            has_title: false,
            ..Default::default()
        };
        let err = tokenize("R1 1 0 1.2.3", &options).unwrap_err();
        assert!(matches!(err, LexError::MalformedNumber { .. }));
    }

    #[test]
    fn test_curly_expression_verbatim() {
        let tokens = lex_untitled("R1 1 0 {2*R + V(out)}");
        let expr = tokens
            .iter()
            .find(|t| t.kind == TokenKind::Expression)
            .unwrap();
        assert_eq!(expr.lexeme, "2*R + V(out)");
    }

    #[test]
    fn test_quoted_expression_and_string() {
        let tokens = lex_untitled("R1 1 0 'R/2'\n.lib \"models.lib\"");
        assert!(tokens
            .iter()
            .any(|t| t.kind == TokenKind::Expression && t.lexeme == "R/2"));
        assert!(tokens
            .iter()
            .any(|t| t.kind == TokenKind::Str && t.lexeme == "models.lib"));
    }

    #[test]
    fn test_unterminated_expression() {
        let options = LexerOptions {
            has_title: false,
            ..Default::default()
        };
        let err = tokenize("R1 1 0 {2*R", &options).unwrap_err();
        assert!(matches!(err, LexError::Unterminated { .. }));
    }

    #[test]
    fn test_reference_token() {
        let tokens = lex_untitled(".save @m1[id]");
        let reference = tokens
            .iter()
            .find(|t| t.kind == TokenKind::Reference)
            .unwrap();
        assert_eq!(reference.reference_parts(), Some(("m1", "id")));
    }

    #[test]
    fn test_line_numbers_are_physical() {
        let tokens = lex("Title\nR1 1 0 10\nV1 1 0 150");
        let r1 = tokens.iter().find(|t| t.lexeme == "R1").unwrap();
        let v1 = tokens.iter().find(|t| t.lexeme == "V1").unwrap();
        assert_eq!(r1.line, 2);
        assert_eq!(v1.line, 3);
    }
}
