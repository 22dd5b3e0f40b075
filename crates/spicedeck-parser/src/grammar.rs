//! Grammar-driven netlist parser.
//!
//! The parser keeps one explicit stack of pending tree nodes and one cursor
//! into the token array. Popping a non-terminal dispatches on its symbol,
//! inspects at most the next couple of tokens to pick an alternative, and
//! pushes that alternative's children in reverse so the leftmost is handled
//! first. Popping a terminal asserts the cursor token matches and binds it.
//! Nesting depth therefore never consumes call stack.

use crate::error::{ParseError, Result};
use crate::token::{Token, TokenKind};
use crate::tree::{ParseNode, ParseTree, Symbol};

/// Parser configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserOptions {
    /// The first non-blank line is the title.
    pub has_title: bool,
    /// Reject input without a `.END` statement.
    pub require_end: bool,
    /// Match dot-command keywords exactly.
    pub dot_case_sensitive: bool,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            has_title: true,
            require_end: false,
            dot_case_sensitive: false,
        }
    }
}

/// Token kinds that can stand alone as a single parameter.
const SINGLE: &[TokenKind] = &[
    TokenKind::Word,
    TokenKind::Value,
    TokenKind::Identifier,
    TokenKind::Str,
    TokenKind::Expression,
    TokenKind::Reference,
];

/// Token kinds acceptable as a statement or model name.
const NAME: &[TokenKind] = &[TokenKind::Word, TokenKind::Identifier];

/// Parse a token stream into a parse tree.
pub fn parse(tokens: &[Token], options: &ParserOptions) -> Result<ParseTree> {
    // A required .END missing at end-of-file is its own condition, checked
    // before any tree construction begins.
    if options.require_end && !tokens.iter().any(|t| t.kind == TokenKind::End) {
        return Err(ParseError::MissingEnd);
    }

    if tokens.is_empty() {
        return Err(ParseError::UnexpectedEnd {
            expected: "a netlist".to_string(),
            line: 0,
        });
    }

    let mut parser = GrammarParser {
        tokens,
        cursor: 0,
        nodes: Vec::new(),
        pending: Vec::new(),
        options: *options,
    };

    let root_symbol = if options.has_title {
        Symbol::Netlist
    } else {
        Symbol::NetlistWithoutTitle
    };
    let root = parser.alloc_nt(root_symbol);
    parser.pending.push(root);

    while let Some(id) = parser.pending.pop() {
        match &parser.nodes[id] {
            ParseNode::NonTerminal { symbol, .. } => {
                let symbol = *symbol;
                parser.produce(id, symbol)?;
            }
            ParseNode::Terminal { .. } => {
                parser.match_terminal(id)?;
            }
        }
    }

    Ok(ParseTree::new(parser.nodes, root))
}

struct GrammarParser<'t> {
    tokens: &'t [Token],
    cursor: usize,
    nodes: Vec<ParseNode>,
    /// Pending node indices; the top is processed next.
    pending: Vec<usize>,
    options: ParserOptions,
}

impl<'t> GrammarParser<'t> {
    fn peek(&self, offset: usize) -> &Token {
        // tokens is checked non-empty before construction
        self.tokens
            .get(self.cursor + offset)
            .unwrap_or(&self.tokens[self.tokens.len() - 1])
    }

    fn alloc_nt(&mut self, symbol: Symbol) -> usize {
        self.nodes.push(ParseNode::NonTerminal {
            symbol,
            children: Vec::new(),
        });
        self.nodes.len() - 1
    }

    fn alloc_term(&mut self, expected: &'static [TokenKind]) -> usize {
        self.nodes.push(ParseNode::Terminal {
            expected,
            expected_lexeme: None,
            token: None,
        });
        self.nodes.len() - 1
    }

    fn alloc_term_bound(&mut self, expected: &'static [TokenKind], lexeme: String) -> usize {
        self.nodes.push(ParseNode::Terminal {
            expected,
            expected_lexeme: Some(lexeme),
            token: None,
        });
        self.nodes.len() - 1
    }

    /// Record `children` on `parent` and push them pending in reverse, so
    /// the leftmost child is processed first.
    fn attach(&mut self, parent: usize, children: Vec<usize>) {
        for &child in children.iter().rev() {
            self.pending.push(child);
        }
        if let ParseNode::NonTerminal {
            children: slot, ..
        } = &mut self.nodes[parent]
        {
            *slot = children;
        }
    }

    /// Dispatch a non-terminal to its production rule.
    fn produce(&mut self, id: usize, symbol: Symbol) -> Result<()> {
        match symbol {
            Symbol::Netlist => {
                let children = vec![
                    self.alloc_term(&[TokenKind::Title]),
                    self.alloc_term(&[TokenKind::Newline]),
                    self.alloc_nt(Symbol::Statements),
                    self.alloc_nt(Symbol::NetlistEnding),
                ];
                self.attach(id, children);
            }
            Symbol::NetlistWithoutTitle => {
                let children = vec![
                    self.alloc_nt(Symbol::Statements),
                    self.alloc_nt(Symbol::NetlistEnding),
                ];
                self.attach(id, children);
            }
            Symbol::NetlistEnding => self.produce_netlist_ending(id)?,
            Symbol::Statements => self.produce_statements(id),
            Symbol::Statement => self.produce_statement(id)?,
            Symbol::CommentLine => {
                let children = vec![
                    self.alloc_term(&[TokenKind::Comment]),
                    self.alloc_term(&[TokenKind::Newline]),
                ];
                self.attach(id, children);
            }
            Symbol::Component => {
                let children = vec![
                    self.alloc_term(&[TokenKind::Word]),
                    self.alloc_nt(Symbol::Parameters),
                    self.alloc_term(&[TokenKind::Newline]),
                ];
                self.attach(id, children);
            }
            Symbol::Control => {
                let children = vec![
                    self.alloc_term(&[TokenKind::Dot]),
                    self.alloc_term(&[TokenKind::Word]),
                    self.alloc_nt(Symbol::Parameters),
                    self.alloc_term(&[TokenKind::Newline]),
                ];
                self.attach(id, children);
            }
            Symbol::Model => {
                let keyword = self.peek(1).lexeme.clone();
                let children = vec![
                    self.alloc_term(&[TokenKind::Dot]),
                    self.alloc_term_bound(&[TokenKind::Word], keyword),
                    self.alloc_term(NAME),
                    self.alloc_term(NAME),
                    self.alloc_nt(Symbol::Parameters),
                    self.alloc_term(&[TokenKind::Newline]),
                ];
                self.attach(id, children);
            }
            Symbol::Subckt => {
                let keyword = self.peek(1).lexeme.clone();
                let children = vec![
                    self.alloc_term(&[TokenKind::Dot]),
                    self.alloc_term_bound(&[TokenKind::Word], keyword),
                    self.alloc_term(NAME),
                    self.alloc_nt(Symbol::Parameters),
                    self.alloc_term(&[TokenKind::Newline]),
                    self.alloc_nt(Symbol::Statements),
                    self.alloc_nt(Symbol::SubcktEnding),
                ];
                self.attach(id, children);
            }
            Symbol::SubcktEnding => {
                let named = matches!(
                    self.peek(1).kind,
                    TokenKind::Word | TokenKind::Identifier
                );
                let mut children = vec![self.alloc_term(&[TokenKind::Ends])];
                if named {
                    children.push(self.alloc_term(NAME));
                }
                children.push(self.alloc_term(&[TokenKind::Newline]));
                self.attach(id, children);
            }
            Symbol::Parameters => self.produce_parameters(id),
            Symbol::Parameter => self.produce_parameter(id),
            Symbol::Vector => {
                let children = vec![
                    self.alloc_term(SINGLE),
                    self.alloc_term(&[TokenKind::Comma]),
                    self.alloc_term(SINGLE),
                    self.alloc_nt(Symbol::VectorContinue),
                ];
                self.attach(id, children);
            }
            Symbol::VectorContinue => {
                if self.peek(0).kind == TokenKind::Comma {
                    let children = vec![
                        self.alloc_term(&[TokenKind::Comma]),
                        self.alloc_term(SINGLE),
                        self.alloc_nt(Symbol::VectorContinue),
                    ];
                    self.attach(id, children);
                }
            }
            Symbol::ParameterBracket => {
                let children = vec![
                    self.alloc_term(NAME),
                    self.alloc_term(&[TokenKind::LParen]),
                    self.alloc_nt(Symbol::ParameterBracketContent),
                    self.alloc_term(&[TokenKind::RParen]),
                ];
                self.attach(id, children);
            }
            Symbol::ParameterBracketContent => {
                let children = vec![self.alloc_nt(Symbol::Parameters)];
                self.attach(id, children);
            }
            Symbol::ParameterEqual => {
                let bracketed = self.peek(1).kind == TokenKind::LParen;
                let children = if bracketed {
                    vec![
                        self.alloc_term(NAME),
                        self.alloc_term(&[TokenKind::LParen]),
                        self.alloc_nt(Symbol::Parameters),
                        self.alloc_term(&[TokenKind::RParen]),
                        self.alloc_term(&[TokenKind::Equal]),
                        self.alloc_nt(Symbol::ParameterEqualSingle),
                    ]
                } else {
                    vec![
                        self.alloc_term(NAME),
                        self.alloc_term(&[TokenKind::Equal]),
                        self.alloc_nt(Symbol::ParameterEqualSingle),
                    ]
                };
                self.attach(id, children);
            }
            Symbol::ParameterEqualSingle => {
                if self.peek(1).kind == TokenKind::Comma {
                    let children = vec![self.alloc_nt(Symbol::Vector)];
                    self.attach(id, children);
                } else {
                    let children = vec![self.alloc_term(SINGLE)];
                    self.attach(id, children);
                }
            }
        }
        Ok(())
    }

    /// Statements: zero or more statements, blank lines tolerated.
    fn produce_statements(&mut self, id: usize) {
        match self.peek(0).kind {
            TokenKind::End | TokenKind::Ends | TokenKind::Eof => {
                // empty alternative
            }
            TokenKind::Newline => {
                let children = vec![
                    self.alloc_term(&[TokenKind::Newline]),
                    self.alloc_nt(Symbol::Statements),
                ];
                self.attach(id, children);
            }
            _ => {
                let children = vec![
                    self.alloc_nt(Symbol::Statement),
                    self.alloc_nt(Symbol::Statements),
                ];
                self.attach(id, children);
            }
        }
    }

    /// Statement: dispatch on the leading token, and for dot statements on
    /// the command word.
    fn produce_statement(&mut self, id: usize) -> Result<()> {
        let t0 = self.peek(0);
        let alternative = match t0.kind {
            TokenKind::Comment => Symbol::CommentLine,
            TokenKind::Word => Symbol::Component,
            TokenKind::Dot => {
                let keyword = &self.peek(1).lexeme;
                if self.keyword_eq(keyword, "SUBCKT") {
                    Symbol::Subckt
                } else if self.keyword_eq(keyword, "MODEL") {
                    Symbol::Model
                } else {
                    Symbol::Control
                }
            }
            _ => {
                return Err(self.unexpected(t0, "a statement"));
            }
        };
        let children = vec![self.alloc_nt(alternative)];
        self.attach(id, children);
        Ok(())
    }

    /// NetlistEnding: optional `.END`, trailing newlines, then end of input.
    fn produce_netlist_ending(&mut self, id: usize) -> Result<()> {
        let t0 = self.peek(0);
        let children = match t0.kind {
            TokenKind::End => vec![
                self.alloc_term(&[TokenKind::End]),
                self.alloc_nt(Symbol::NetlistEnding),
            ],
            TokenKind::Newline => vec![
                self.alloc_term(&[TokenKind::Newline]),
                self.alloc_nt(Symbol::NetlistEnding),
            ],
            TokenKind::Eof => vec![self.alloc_term(&[TokenKind::Eof])],
            _ => {
                return Err(self.unexpected(t0, ".END or end of input"));
            }
        };
        self.attach(id, children);
        Ok(())
    }

    /// Parameters: zero or more, with bare parenthesized groups flattened
    /// (as in `.MODEL DMOD D (IS=1e-12)`).
    fn produce_parameters(&mut self, id: usize) {
        match self.peek(0).kind {
            TokenKind::Newline
            | TokenKind::Eof
            | TokenKind::RParen
            | TokenKind::End
            | TokenKind::Ends => {
                // empty alternative
            }
            TokenKind::LParen => {
                let children = vec![
                    self.alloc_term(&[TokenKind::LParen]),
                    self.alloc_nt(Symbol::Parameters),
                    self.alloc_term(&[TokenKind::RParen]),
                    self.alloc_nt(Symbol::Parameters),
                ];
                self.attach(id, children);
            }
            _ => {
                let children = vec![
                    self.alloc_nt(Symbol::Parameter),
                    self.alloc_nt(Symbol::Parameters),
                ];
                self.attach(id, children);
            }
        }
    }

    /// Parameter: disambiguate Single vs Vector vs Bracket vs Assignment by
    /// looking at the next token, or scanning across one balanced `(...)`
    /// group for a trailing `=`.
    fn produce_parameter(&mut self, id: usize) {
        let t0 = self.peek(0);
        let t1 = self.peek(1);

        let alternative = if matches!(t0.kind, TokenKind::Word | TokenKind::Identifier)
            && t1.kind == TokenKind::LParen
        {
            if self.bracket_then_equal() {
                Symbol::ParameterEqual
            } else {
                Symbol::ParameterBracket
            }
        } else if matches!(t0.kind, TokenKind::Word | TokenKind::Identifier)
            && t1.kind == TokenKind::Equal
        {
            Symbol::ParameterEqual
        } else if t1.kind == TokenKind::Comma {
            Symbol::Vector
        } else {
            let children = vec![self.alloc_term(SINGLE)];
            self.attach(id, children);
            return;
        };

        let children = vec![self.alloc_nt(alternative)];
        self.attach(id, children);
    }

    /// From `name (`, scan across the balanced parenthesis group and report
    /// whether an `=` follows it (the `v(out)=5` assignment form).
    fn bracket_then_equal(&self) -> bool {
        let mut offset = 1; // at the LParen
        let mut depth = 0;
        loop {
            let t = self.peek(offset);
            match t.kind {
                TokenKind::LParen => depth += 1,
                TokenKind::RParen => {
                    depth -= 1;
                    if depth == 0 {
                        return self.peek(offset + 1).kind == TokenKind::Equal;
                    }
                }
                TokenKind::Newline | TokenKind::Eof => return false,
                _ => {}
            }
            offset += 1;
        }
    }

    /// Match the cursor token against a terminal expectation and bind it.
    fn match_terminal(&mut self, id: usize) -> Result<()> {
        let (expected, expected_lexeme) = match &self.nodes[id] {
            ParseNode::Terminal {
                expected,
                expected_lexeme,
                ..
            } => (*expected, expected_lexeme.clone()),
            ParseNode::NonTerminal { .. } => unreachable!("terminal ids only"),
        };

        let t = self.peek(0).clone();
        if !expected.contains(&t.kind) {
            return Err(self.mismatch(&t, expected));
        }
        if let Some(lexeme) = &expected_lexeme {
            if t.lexeme != *lexeme {
                return Err(ParseError::UnexpectedToken {
                    found: t.kind.to_string(),
                    lexeme: t.lexeme.clone(),
                    expected: format!("'{}'", lexeme),
                    line: t.line,
                });
            }
        }

        if let ParseNode::Terminal { token, .. } = &mut self.nodes[id] {
            *token = Some(t);
        }
        if self.cursor < self.tokens.len() {
            self.cursor += 1;
        }
        Ok(())
    }

    fn keyword_eq(&self, word: &str, keyword: &str) -> bool {
        if self.options.dot_case_sensitive {
            word == keyword
        } else {
            word.eq_ignore_ascii_case(keyword)
        }
    }

    fn unexpected(&self, t: &Token, expected: &str) -> ParseError {
        if t.kind == TokenKind::Eof {
            ParseError::UnexpectedEnd {
                expected: expected.to_string(),
                line: t.line,
            }
        } else {
            ParseError::UnexpectedToken {
                found: t.kind.to_string(),
                lexeme: t.lexeme.clone(),
                expected: expected.to_string(),
                line: t.line,
            }
        }
    }

    fn mismatch(&self, t: &Token, expected: &'static [TokenKind]) -> ParseError {
        let expected = expected
            .iter()
            .map(|k| k.to_string())
            .collect::<Vec<_>>()
            .join(" or ");
        if t.kind == TokenKind::Eof {
            ParseError::UnexpectedEnd {
                expected,
                line: t.line,
            }
        } else {
            ParseError::UnexpectedToken {
                found: t.kind.to_string(),
                lexeme: t.lexeme.clone(),
                expected,
                line: t.line,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::{tokenize, LexerOptions};

    fn parse_text(input: &str, options: &ParserOptions) -> Result<ParseTree> {
        let lexer_options = LexerOptions {
            has_title: options.has_title,
            dot_case_sensitive: options.dot_case_sensitive,
        };
        let tokens = tokenize(input, &lexer_options)?;
        parse(&tokens, options)
    }

    #[test]
    fn test_parse_simple_netlist() {
        let options = ParserOptions::default();
        let tree = parse_text("Title\nR1 1 0 1k\n.OP\n.END\n", &options).unwrap();
        assert!(tree.len() > 0);
    }

    #[test]
    fn test_missing_end_is_checked_up_front() {
        let options = ParserOptions {
            require_end: true,
            ..Default::default()
        };
        let err = parse_text("Title\nR1 1 0 1k\n", &options).unwrap_err();
        assert_eq!(err, ParseError::MissingEnd);
    }

    #[test]
    fn test_end_optional_by_default() {
        let options = ParserOptions::default();
        assert!(parse_text("Title\nR1 1 0 1k\n", &options).is_ok());
    }

    #[test]
    fn test_unexpected_token_reports_line() {
        let options = ParserOptions {
            has_title: false,
            ..Default::default()
        };
        // An equals sign cannot open a statement
        let err = parse_text("R1 1 0 1k\n= 2\n", &options).unwrap_err();
        match err {
            ParseError::UnexpectedToken { line, .. } => assert_eq!(line, 2),
            other => panic!("expected UnexpectedToken, got {:?}", other),
        }
    }

    #[test]
    fn test_unterminated_subcircuit() {
        let options = ParserOptions {
            has_title: false,
            ..Default::default()
        };
        let err = parse_text(".SUBCKT VDIV in out\nR1 in out 1k\n", &options).unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedEnd { .. }));
    }

    #[test]
    fn test_deeply_nested_subcircuits_do_not_recurse() {
        // 600 nested .SUBCKT blocks would overflow a recursive-descent
        // parser's stack; the explicit node stack handles them.
        let options = ParserOptions {
            has_title: false,
            ..Default::default()
        };
        let mut input = String::new();
        for i in 0..600 {
            input.push_str(&format!(".SUBCKT S{} a b\n", i));
        }
        input.push_str("R1 a b 1k\n");
        for _ in 0..600 {
            input.push_str(".ENDS\n");
        }
        assert!(parse_text(&input, &options).is_ok());
    }

    #[test]
    fn test_trailing_blank_lines_tolerated() {
        let options = ParserOptions::default();
        assert!(parse_text("Title\nR1 1 0 1k\n.END\n\n\n", &options).is_ok());
    }
}
