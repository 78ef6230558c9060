//! WLP4 Scanner
//! 
//! Tokenizes WLP4 source text into a stream of tokens using maximal munch.
//! Handles keywords, operators, numbers, identifiers, and `//` comments.

pub mod token;

pub use token::{Token, TokenKind};

use log::trace;
use thiserror::Error;
use wlp4_common::CompilerError;

/// Largest value a NUM token may carry
const MAX_NUM: i64 = i32::MAX as i64;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexError {
    #[error("unrecognized character '{ch}' on line {line}")]
    UnexpectedChar { ch: char, line: u32 },

    #[error("numeric literal {lexeme} out of range on line {line}")]
    NumberOutOfRange { lexeme: String, line: u32 },

    #[error("numeric literal {lexeme} has a leading zero on line {line}")]
    LeadingZero { lexeme: String, line: u32 },

    #[error("expected '=' after '!' on line {line}")]
    BareBang { line: u32 },
}

impl From<LexError> for CompilerError {
    fn from(err: LexError) -> Self {
        CompilerError::scanning_failure(err.to_string())
    }
}

/// WLP4 Lexer
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: u32,
}

impl Lexer {
    /// Create a new lexer
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            line: 1,
        }
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.current_char()?;
        self.position += 1;
        if ch == '\n' {
            self.line += 1;
        }
        Some(ch)
    }

    /// Skip whitespace and line comments
    fn skip_trivia(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch.is_ascii_whitespace() {
                self.advance();
            } else if ch == '/' && self.peek_char(1) == Some('/') {
                while let Some(c) = self.current_char() {
                    if c == '\n' {
                        break;
                    }
                    self.advance();
                }
            } else {
                break;
            }
        }
    }

    /// Tokenize the whole input
    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            self.skip_trivia();
            let Some(ch) = self.current_char() else {
                break;
            };
            let token = if ch.is_ascii_alphabetic() {
                self.tokenize_word()
            } else if ch.is_ascii_digit() {
                self.tokenize_number()?
            } else {
                self.tokenize_operator(ch)?
            };
            trace!("scanned {}", token);
            tokens.push(token);
        }
        Ok(tokens)
    }

    fn tokenize_word(&mut self) -> Token {
        let line = self.line;
        let mut word = String::new();
        while let Some(ch) = self.current_char() {
            if ch.is_ascii_alphanumeric() {
                word.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        let kind = TokenKind::keyword(&word).unwrap_or(TokenKind::Id);
        Token::new(kind, word, line)
    }

    fn tokenize_number(&mut self) -> Result<Token, LexError> {
        let line = self.line;
        let mut digits = String::new();
        while let Some(ch) = self.current_char() {
            if ch.is_ascii_digit() {
                digits.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        if digits.len() > 1 && digits.starts_with('0') {
            return Err(LexError::LeadingZero { lexeme: digits, line });
        }

        // Anything longer than 10 digits is out of range regardless of value
        let in_range = digits.len() <= 10
            && digits.parse::<i64>().map(|v| v <= MAX_NUM).unwrap_or(false);
        if !in_range {
            return Err(LexError::NumberOutOfRange { lexeme: digits, line });
        }

        Ok(Token::new(TokenKind::Num, digits, line))
    }

    fn tokenize_operator(&mut self, ch: char) -> Result<Token, LexError> {
        let line = self.line;
        let next = self.peek_char(1);

        let (kind, len) = match (ch, next) {
            ('=', Some('=')) => (TokenKind::Eq, 2),
            ('!', Some('=')) => (TokenKind::Ne, 2),
            ('<', Some('=')) => (TokenKind::Le, 2),
            ('>', Some('=')) => (TokenKind::Ge, 2),
            ('!', _) => return Err(LexError::BareBang { line }),
            ('=', _) => (TokenKind::Becomes, 1),
            ('<', _) => (TokenKind::Lt, 1),
            ('>', _) => (TokenKind::Gt, 1),
            ('(', _) => (TokenKind::LParen, 1),
            (')', _) => (TokenKind::RParen, 1),
            ('{', _) => (TokenKind::LBrace, 1),
            ('}', _) => (TokenKind::RBrace, 1),
            ('[', _) => (TokenKind::LBrack, 1),
            (']', _) => (TokenKind::RBrack, 1),
            ('+', _) => (TokenKind::Plus, 1),
            ('-', _) => (TokenKind::Minus, 1),
            ('*', _) => (TokenKind::Star, 1),
            ('/', _) => (TokenKind::Slash, 1),
            ('%', _) => (TokenKind::Pct, 1),
            (',', _) => (TokenKind::Comma, 1),
            (';', _) => (TokenKind::Semi, 1),
            ('&', _) => (TokenKind::Amp, 1),
            _ => return Err(LexError::UnexpectedChar { ch, line }),
        };

        let mut lexeme = String::new();
        for _ in 0..len {
            if let Some(c) = self.advance() {
                lexeme.push(c);
            }
        }
        Ok(Token::new(kind, lexeme, line))
    }
}

/// Render tokens in the scanner's output format, one `KIND lexeme` per line
pub fn format_tokens(tokens: &[Token]) -> String {
    let mut out = String::new();
    for token in tokens {
        out.push_str(&token.to_string());
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_keywords_and_identifiers() {
        assert_eq!(
            kinds("int wain returned NULL null"),
            vec![
                TokenKind::Int,
                TokenKind::Wain,
                TokenKind::Id,
                TokenKind::Null,
                TokenKind::Id
            ]
        );
    }

    #[test]
    fn test_two_char_operators_use_maximal_munch() {
        assert_eq!(
            kinds("a==b!=c<=d>=e=f<g>h"),
            vec![
                TokenKind::Id,
                TokenKind::Eq,
                TokenKind::Id,
                TokenKind::Ne,
                TokenKind::Id,
                TokenKind::Le,
                TokenKind::Id,
                TokenKind::Ge,
                TokenKind::Id,
                TokenKind::Becomes,
                TokenKind::Id,
                TokenKind::Lt,
                TokenKind::Id,
                TokenKind::Gt,
                TokenKind::Id
            ]
        );
    }

    #[test]
    fn test_comments_are_skipped() {
        let tokens = Lexer::new("x // comment = 3\ny").tokenize().unwrap();
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[1].lexeme, "y");
        assert_eq!(tokens[1].line, 2);
    }

    #[test]
    fn test_number_limits() {
        assert!(Lexer::new("2147483647").tokenize().is_ok());
        assert!(matches!(
            Lexer::new("2147483648").tokenize(),
            Err(LexError::NumberOutOfRange { .. })
        ));
        assert!(matches!(
            Lexer::new("007").tokenize(),
            Err(LexError::LeadingZero { .. })
        ));
        assert_eq!(kinds("0"), vec![TokenKind::Num]);
    }

    #[test]
    fn test_invalid_characters() {
        assert!(matches!(
            Lexer::new("a $ b").tokenize(),
            Err(LexError::UnexpectedChar { ch: '$', .. })
        ));
        assert!(matches!(
            Lexer::new("!a").tokenize(),
            Err(LexError::BareBang { .. })
        ));
    }

    #[test]
    fn test_output_format() {
        let tokens = Lexer::new("new int[5];").tokenize().unwrap();
        assert_eq!(
            format_tokens(&tokens),
            "NEW new\nINT int\nLBRACK [\nNUM 5\nRBRACK ]\nSEMI ;\n"
        );
    }
}
