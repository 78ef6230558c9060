//! Concrete syntax tree shared by the parser, the checker and the tools
//!
//! The tree is a plain owned value: each internal node owns its children and
//! teardown is structural. The interchange format is a pre-order listing with
//! one node per line.

use crate::grammar::{Grammar, GrammarError};
use std::fmt;

/// A terminal symbol together with its source lexeme
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Terminal {
    pub symbol: String,
    pub lexeme: String,
}

impl Terminal {
    pub fn new(symbol: impl Into<String>, lexeme: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            lexeme: lexeme.into(),
        }
    }

    /// Parse one `SYMBOL lexeme` record
    pub fn parse_line(line: &str) -> Option<Self> {
        let mut words = line.split_whitespace();
        let symbol = words.next()?;
        let lexeme = words.next()?;
        if words.next().is_some() {
            return None;
        }
        Some(Self::new(symbol, lexeme))
    }

    /// Begin-of-file marker
    pub fn bof() -> Self {
        Self::new("BOF", "BOF")
    }

    /// End-of-file marker
    pub fn eof() -> Self {
        Self::new("EOF", "EOF")
    }
}

impl fmt::Display for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.symbol, self.lexeme)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxTree {
    Leaf(Terminal),
    Internal {
        symbol: String,
        children: Vec<SyntaxTree>,
    },
}

impl SyntaxTree {
    pub fn symbol(&self) -> &str {
        match self {
            SyntaxTree::Leaf(t) => &t.symbol,
            SyntaxTree::Internal { symbol, .. } => symbol,
        }
    }

    pub fn children(&self) -> &[SyntaxTree] {
        match self {
            SyntaxTree::Leaf(_) => &[],
            SyntaxTree::Internal { children, .. } => children,
        }
    }

    pub fn lexeme(&self) -> Option<&str> {
        match self {
            SyntaxTree::Leaf(t) => Some(&t.lexeme),
            SyntaxTree::Internal { .. } => None,
        }
    }

    /// Child symbols of an internal node, in order
    pub fn child_symbols(&self) -> Vec<&str> {
        self.children().iter().map(|c| c.symbol()).collect()
    }

    /// The line this node contributes to the pre-order listing
    pub fn line(&self) -> String {
        match self {
            SyntaxTree::Leaf(t) => t.to_string(),
            SyntaxTree::Internal { symbol, children } => {
                let mut line = symbol.clone();
                for child in children {
                    line.push(' ');
                    line.push_str(child.symbol());
                }
                line
            }
        }
    }

    /// Pre-order listing, one node per line
    pub fn write_preorder(&self) -> String {
        let mut out = String::new();
        self.write_into(&mut out);
        out
    }

    fn write_into(&self, out: &mut String) {
        out.push_str(&self.line());
        out.push('\n');
        for child in self.children() {
            child.write_into(out);
        }
    }

    /// Productions applied at each internal node, in pre-order
    pub fn productions(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_productions(&mut out);
        out
    }

    fn collect_productions(&self, out: &mut Vec<String>) {
        if let SyntaxTree::Internal { children, .. } = self {
            out.push(self.line());
            for child in children {
                child.collect_productions(out);
            }
        }
    }

    /// Rebuild a tree from its pre-order listing
    pub fn read_preorder(text: &str, grammar: &Grammar) -> Result<Self, GrammarError> {
        let mut lines = text
            .lines()
            .enumerate()
            .filter(|(_, l)| !l.trim().is_empty());
        let tree = Self::read_node(&mut lines, grammar, None)?;
        if let Some((number, line)) = lines.next() {
            return Err(GrammarError::Malformed {
                line: number + 1,
                message: format!("trailing input '{}'", line.trim()),
            });
        }
        Ok(tree)
    }

    fn read_node<'a, I>(
        lines: &mut I,
        grammar: &Grammar,
        expected: Option<&str>,
    ) -> Result<Self, GrammarError>
    where
        I: Iterator<Item = (usize, &'a str)>,
    {
        let (index, line) = lines.next().ok_or_else(|| GrammarError::UnexpectedEof {
            context: expected.unwrap_or("tree root").to_string(),
        })?;
        let number = index + 1;
        let mut words = line.split_whitespace();
        let symbol = words.next().unwrap_or_default();

        if let Some(want) = expected {
            if want != symbol {
                return Err(GrammarError::Malformed {
                    line: number,
                    message: format!("expected {want}, found {symbol}"),
                });
            }
        }

        if grammar.is_terminal(symbol) {
            let lexeme = words.collect::<Vec<_>>().join(" ");
            return Ok(SyntaxTree::Leaf(Terminal::new(symbol, lexeme)));
        }
        if !grammar.is_nonterminal(symbol) {
            return Err(GrammarError::UnknownSymbol(symbol.to_string()));
        }

        let child_symbols: Vec<&str> = words.collect();
        let mut children = Vec::with_capacity(child_symbols.len());
        for child in child_symbols {
            children.push(Self::read_node(lines, grammar, Some(child))?);
        }
        Ok(SyntaxTree::Internal {
            symbol: symbol.to_string(),
            children,
        })
    }
}

impl fmt::Display for SyntaxTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.write_preorder())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(symbol: &str, lexeme: &str) -> SyntaxTree {
        SyntaxTree::Leaf(Terminal::new(symbol, lexeme))
    }

    fn node(symbol: &str, children: Vec<SyntaxTree>) -> SyntaxTree {
        SyntaxTree::Internal {
            symbol: symbol.to_string(),
            children,
        }
    }

    #[test]
    fn test_terminal_line_parsing() {
        assert_eq!(Terminal::parse_line("ID x"), Some(Terminal::new("ID", "x")));
        assert_eq!(Terminal::parse_line("ID"), None);
        assert_eq!(Terminal::parse_line("ID x y"), None);
    }

    #[test]
    fn test_preorder_listing() {
        let tree = node(
            "type",
            vec![leaf("INT", "int"), leaf("STAR", "*")],
        );
        assert_eq!(tree.write_preorder(), "type INT STAR\nINT int\nSTAR *\n");
        assert_eq!(tree.productions(), vec!["type INT STAR".to_string()]);
    }

    #[test]
    fn test_empty_production_line() {
        let tree = node("params", vec![]);
        assert_eq!(tree.write_preorder(), "params\n");
        assert!(tree.children().is_empty());
    }
}
