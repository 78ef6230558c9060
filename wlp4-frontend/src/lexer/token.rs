//! Token definitions for the WLP4 scanner
//! 
//! This module defines token kinds and the Token struct.

use crate::tree::Terminal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// WLP4 token kinds. The names double as grammar terminal symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    Id,
    Num,
    LParen,
    RParen,
    LBrace,
    RBrace,
    Return,
    If,
    Else,
    While,
    Println,
    Wain,
    Becomes,
    Int,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    Plus,
    Minus,
    Star,
    Slash,
    Pct,
    Comma,
    Semi,
    New,
    Delete,
    LBrack,
    RBrack,
    Amp,
    Null,
}

impl TokenKind {
    /// Terminal symbol name as it appears in the grammar
    pub fn name(&self) -> &'static str {
        match self {
            TokenKind::Id => "ID",
            TokenKind::Num => "NUM",
            TokenKind::LParen => "LPAREN",
            TokenKind::RParen => "RPAREN",
            TokenKind::LBrace => "LBRACE",
            TokenKind::RBrace => "RBRACE",
            TokenKind::Return => "RETURN",
            TokenKind::If => "IF",
            TokenKind::Else => "ELSE",
            TokenKind::While => "WHILE",
            TokenKind::Println => "PRINTLN",
            TokenKind::Wain => "WAIN",
            TokenKind::Becomes => "BECOMES",
            TokenKind::Int => "INT",
            TokenKind::Eq => "EQ",
            TokenKind::Ne => "NE",
            TokenKind::Lt => "LT",
            TokenKind::Gt => "GT",
            TokenKind::Le => "LE",
            TokenKind::Ge => "GE",
            TokenKind::Plus => "PLUS",
            TokenKind::Minus => "MINUS",
            TokenKind::Star => "STAR",
            TokenKind::Slash => "SLASH",
            TokenKind::Pct => "PCT",
            TokenKind::Comma => "COMMA",
            TokenKind::Semi => "SEMI",
            TokenKind::New => "NEW",
            TokenKind::Delete => "DELETE",
            TokenKind::LBrack => "LBRACK",
            TokenKind::RBrack => "RBRACK",
            TokenKind::Amp => "AMP",
            TokenKind::Null => "NULL",
        }
    }

    /// Keyword lookup for a scanned word
    pub fn keyword(word: &str) -> Option<Self> {
        match word {
            "return" => Some(TokenKind::Return),
            "if" => Some(TokenKind::If),
            "else" => Some(TokenKind::Else),
            "while" => Some(TokenKind::While),
            "println" => Some(TokenKind::Println),
            "wain" => Some(TokenKind::Wain),
            "int" => Some(TokenKind::Int),
            "new" => Some(TokenKind::New),
            "delete" => Some(TokenKind::Delete),
            "NULL" => Some(TokenKind::Null),
            _ => None,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A scanned token with its source line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub line: u32,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, line: u32) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            line,
        }
    }

    /// The (symbol, lexeme) pair the parser consumes
    pub fn to_terminal(&self) -> Terminal {
        Terminal::new(self.kind.name(), self.lexeme.clone())
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.lexeme)
    }
}
