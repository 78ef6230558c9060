//! WLP4 Compiler - Frontend
//!
//! This crate provides the frontend components of the WLP4 compiler:
//! - Lexer: tokenizes WLP4 source code
//! - Grammar: LR(1) table loading, writing and LALR(1) construction
//! - Parser: table-driven shift-reduce engine producing a syntax tree
//! - AST: per-production program model
//! - Semantic analysis: symbol tables and type checking

pub mod ast;
pub mod grammar;
pub mod lexer;
pub mod parser;
pub mod semantic;
pub mod tree;

pub use ast::{convert_program, Program};
pub use grammar::{Action, Grammar, GrammarError, Production};
pub use lexer::{format_tokens, LexError, Lexer, Token, TokenKind};
pub use parser::{read_terminals, with_markers, ParseError, Parser};
pub use semantic::{CheckedProgram, SemanticError, SymbolTable, TypeChecker};
pub use tree::{SyntaxTree, Terminal};

use log::debug;
use wlp4_common::CompilerError;

/// High-level frontend interface
pub struct Frontend;

impl Frontend {
    /// Tokenize WLP4 source code
    pub fn scan(source: &str) -> Result<Vec<Token>, CompilerError> {
        let tokens = Lexer::new(source).tokenize()?;
        debug!("scanned {} tokens", tokens.len());
        Ok(tokens)
    }

    /// Parse an unwrapped terminal sequence; BOF/EOF are added here
    pub fn parse_terminals(
        terminals: Vec<Terminal>,
        grammar: &Grammar,
    ) -> Result<SyntaxTree, CompilerError> {
        let tree = Parser::new(grammar).parse(with_markers(terminals))?;
        Ok(tree)
    }

    /// Scan and parse source code into a syntax tree
    pub fn parse_source(source: &str, grammar: &Grammar) -> Result<SyntaxTree, CompilerError> {
        let tokens = Self::scan(source)?;
        Self::parse_terminals(tokens.iter().map(Token::to_terminal).collect(), grammar)
    }

    /// Scan, parse and convert source code into the program model
    pub fn parse_program(source: &str, grammar: &Grammar) -> Result<Program, CompilerError> {
        let tree = Self::parse_source(source, grammar)?;
        Ok(convert_program(&tree)?)
    }

    /// Convert and type check a syntax tree
    pub fn check_tree(tree: &SyntaxTree) -> Result<CheckedProgram, CompilerError> {
        let program = convert_program(tree)?;
        let checked = TypeChecker::new().check(program)?;
        Ok(checked)
    }

    /// Run the whole frontend on source code
    pub fn analyze(source: &str, grammar: &Grammar) -> Result<CheckedProgram, CompilerError> {
        let tree = Self::parse_source(source, grammar)?;
        Self::check_tree(&tree)
    }
}
