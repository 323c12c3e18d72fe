// ABOUTME: Lexical scanner turning Lyra source text into a token sequence

use crate::error::SyntaxError;

/// Token categories. `Eq` is the single `=` assignment token; `==` and the
/// other multi-character operators are `Op`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    End,
    Number,
    String,
    Ident,
    Keyword,
    Op,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Semi,
    Colon,
    Comma,
    Eq,
    Dot,
}

/// One lexical token: kind, the exact source slice, and its 1-based line.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub line: usize,
}

impl Token {
    fn new(kind: TokenKind, lexeme: impl Into<String>, line: usize) -> Self {
        Token {
            kind,
            lexeme: lexeme.into(),
            line,
        }
    }
}

const KEYWORDS: &[&str] = &[
    "var", "let", "proc", "if", "else", "while", "for", "return", "true", "false", "print",
    "println", "break", "continue", "in", "input", "try", "catch", "switch", "case", "default",
    "do",
];

/// Multi-character operators, tried before their one-character prefixes.
const MULTI_OPS: &[&str] = &[
    "==", "!=", "<=", ">=", "&&", "||", "->", "+=", "-=", "*=", "/=", "..",
];

const SINGLE_OPS: &[char] = &['+', '-', '*', '/', '%', '<', '>', '!'];

/// Hand-written scanner over the full source string. In strict mode (the
/// default) unknown characters and unterminated strings are faults; with
/// `lenient` they are skipped / accepted, matching the historical behavior.
pub struct Scanner {
    src: Vec<char>,
    pos: usize,
    line: usize,
    lenient: bool,
}

impl Scanner {
    pub fn new(source: &str) -> Self {
        Scanner {
            src: source.chars().collect(),
            pos: 0,
            line: 1,
            lenient: false,
        }
    }

    pub fn lenient(source: &str) -> Self {
        Scanner {
            lenient: true,
            ..Scanner::new(source)
        }
    }

    fn peek(&self) -> Option<char> {
        self.src.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.src.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn matches(&self, text: &str) -> bool {
        text.chars()
            .enumerate()
            .all(|(i, c)| self.peek_at(i) == Some(c))
    }

    /// Produce the full token sequence, terminated by a single END token.
    pub fn scan(mut self) -> Result<Vec<Token>, SyntaxError> {
        let mut tokens = Vec::new();
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.advance();
                continue;
            }
            if c == '#' || self.matches("//") {
                self.skip_line();
                continue;
            }
            if c.is_ascii_digit() {
                tokens.push(self.number());
                continue;
            }
            if c == '"' || c == '\'' {
                tokens.push(self.string(c)?);
                continue;
            }
            if c.is_alphabetic() || c == '_' {
                tokens.push(self.identifier());
                continue;
            }
            if let Some(op) = MULTI_OPS.iter().find(|op| self.matches(op)) {
                let line = self.line;
                for _ in 0..op.len() {
                    self.advance();
                }
                tokens.push(Token::new(TokenKind::Op, *op, line));
                continue;
            }
            let line = self.line;
            let kind = match c {
                '(' => Some(TokenKind::LParen),
                ')' => Some(TokenKind::RParen),
                '{' => Some(TokenKind::LBrace),
                '}' => Some(TokenKind::RBrace),
                '[' => Some(TokenKind::LBracket),
                ']' => Some(TokenKind::RBracket),
                ';' => Some(TokenKind::Semi),
                ':' => Some(TokenKind::Colon),
                ',' => Some(TokenKind::Comma),
                '=' => Some(TokenKind::Eq),
                '.' => Some(TokenKind::Dot),
                c if SINGLE_OPS.contains(&c) => Some(TokenKind::Op),
                _ => None,
            };
            match kind {
                Some(kind) => {
                    self.advance();
                    tokens.push(Token::new(kind, c.to_string(), line));
                }
                None if self.lenient => {
                    self.advance();
                }
                None => return Err(SyntaxError::UnexpectedChar { ch: c, line }),
            }
        }
        tokens.push(Token::new(TokenKind::End, "", self.line));
        Ok(tokens)
    }

    fn skip_line(&mut self) {
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.advance();
        }
    }

    /// A contiguous run of digits and dots. The run stops before a `..`
    /// sequence so range expressions like `0..10` lex as three tokens; a
    /// literal with more than one remaining dot is tokenized as-is and
    /// rejected later, when it is converted.
    fn number(&mut self) -> Token {
        let line = self.line;
        let mut lexeme = String::new();
        while let Some(c) = self.peek() {
            if c == '.' && self.peek_at(1) == Some('.') {
                break;
            }
            if c.is_ascii_digit() || c == '.' {
                lexeme.push(c);
                self.advance();
            } else {
                break;
            }
        }
        Token::new(TokenKind::Number, lexeme, line)
    }

    /// String literal delimited by `"` or `'`. `\n` and `\t` are the named
    /// escapes; any other `\c` yields `c` verbatim.
    fn string(&mut self, quote: char) -> Result<Token, SyntaxError> {
        let line = self.line;
        self.advance();
        let mut text = String::new();
        loop {
            match self.advance() {
                Some(c) if c == quote => break,
                Some('\\') => match self.advance() {
                    Some('n') => text.push('\n'),
                    Some('t') => text.push('\t'),
                    Some(c) => text.push(c),
                    None if self.lenient => break,
                    None => return Err(SyntaxError::UnterminatedString { line }),
                },
                Some(c) => text.push(c),
                None if self.lenient => break,
                None => return Err(SyntaxError::UnterminatedString { line }),
            }
        }
        Ok(Token::new(TokenKind::String, text, line))
    }

    fn identifier(&mut self) -> Token {
        let line = self.line;
        let mut lexeme = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                lexeme.push(c);
                self.advance();
            } else {
                break;
            }
        }
        let kind = if KEYWORDS.contains(&lexeme.as_str()) {
            TokenKind::Keyword
        } else {
            TokenKind::Ident
        };
        Token::new(kind, lexeme, line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(source: &str) -> Vec<Token> {
        Scanner::new(source).scan().unwrap()
    }

    fn kinds(source: &str) -> Vec<TokenKind> {
        scan(source).iter().map(|t| t.kind).collect()
    }

    fn lexemes(source: &str) -> Vec<String> {
        let mut out: Vec<String> = scan(source).iter().map(|t| t.lexeme.clone()).collect();
        out.pop(); // drop the END sentinel
        out
    }

    #[test]
    fn test_always_ends_with_end() {
        for source in ["", "   ", "x", "// only a comment", "1 + 2"] {
            let tokens = scan(source);
            assert_eq!(tokens.last().unwrap().kind, TokenKind::End);
            assert_eq!(
                tokens.iter().filter(|t| t.kind == TokenKind::End).count(),
                1
            );
        }
    }

    #[test]
    fn test_keywords_vs_identifiers() {
        let tokens = scan("var variant while whiled");
        assert_eq!(tokens[0].kind, TokenKind::Keyword);
        assert_eq!(tokens[1].kind, TokenKind::Ident);
        assert_eq!(tokens[2].kind, TokenKind::Keyword);
        assert_eq!(tokens[3].kind, TokenKind::Ident);
    }

    #[test]
    fn test_maximal_munch_operators() {
        assert_eq!(lexemes("== = != ! <= < -> - += +"), vec![
            "==", "=", "!=", "!", "<=", "<", "->", "-", "+=", "+"
        ]);
        // '=' alone is the assignment token, '==' is an operator
        let tokens = scan("= ==");
        assert_eq!(tokens[0].kind, TokenKind::Eq);
        assert_eq!(tokens[1].kind, TokenKind::Op);
    }

    #[test]
    fn test_range_splits_number() {
        assert_eq!(lexemes("0..10"), vec!["0", "..", "10"]);
        let tokens = scan("1.5..2");
        assert_eq!(tokens[0].lexeme, "1.5");
        assert_eq!(tokens[1].lexeme, "..");
    }

    #[test]
    fn test_malformed_number_tokenized_as_is() {
        let tokens = scan("1.2.3");
        assert_eq!(tokens[0].kind, TokenKind::Number);
        assert_eq!(tokens[0].lexeme, "1.2.3");
    }

    #[test]
    fn test_comments_both_forms() {
        assert_eq!(kinds("1 // rest\n2"), vec![
            TokenKind::Number,
            TokenKind::Number,
            TokenKind::End
        ]);
        assert_eq!(kinds("1 # rest\n2"), vec![
            TokenKind::Number,
            TokenKind::Number,
            TokenKind::End
        ]);
    }

    #[test]
    fn test_string_escapes() {
        let tokens = scan(r#""a\nb\tc\\d\qe""#);
        // \q is not a named escape, so it yields 'q' verbatim
        assert_eq!(tokens[0].lexeme, "a\nb\tc\\dqe");
    }

    #[test]
    fn test_both_string_delimiters() {
        let tokens = scan(r#"'single' "double""#);
        assert_eq!(tokens[0].lexeme, "single");
        assert_eq!(tokens[1].lexeme, "double");
    }

    #[test]
    fn test_line_numbers_non_decreasing() {
        let tokens = scan("a\nb b\n\nc \"x\ny\" d");
        let lines: Vec<usize> = tokens.iter().map(|t| t.line).collect();
        assert!(lines.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(tokens[0].line, 1);
        assert_eq!(tokens[1].line, 2);
        assert_eq!(tokens[3].line, 4);
    }

    #[test]
    fn test_unterminated_string_strict_vs_lenient() {
        assert_eq!(
            Scanner::new("\"abc").scan(),
            Err(SyntaxError::UnterminatedString { line: 1 })
        );
        let tokens = Scanner::lenient("\"abc").scan().unwrap();
        assert_eq!(tokens[0].lexeme, "abc");
    }

    #[test]
    fn test_unknown_char_strict_vs_lenient() {
        assert_eq!(
            Scanner::new("a @ b").scan(),
            Err(SyntaxError::UnexpectedChar { ch: '@', line: 1 })
        );
        let tokens = Scanner::lenient("a @ b").scan().unwrap();
        assert_eq!(tokens.len(), 3); // a, b, END
    }
}
