//! Table-driven LR(1) shift-reduce engine
//!
//! The engine keeps parallel state and tree stacks and consults the grammar's
//! action table for every step. It never checks the table for conflicts. Once
//! the input is exhausted, rule 0 is reduced without consulting the table.

use crate::grammar::{Action, Grammar};
use crate::tree::{SyntaxTree, Terminal};
use log::trace;
use thiserror::Error;
use wlp4_common::CompilerError;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    /// The token at `position` (BOF counted as 0) has no shift
    #[error("ERROR at {position}")]
    Reject { position: usize },

    #[error("no goto from state {state} on {symbol}")]
    MissingGoto { state: usize, symbol: String },

    #[error("table refers to missing rule {0}")]
    MissingRule(usize),

    #[error("line {line}: expected 'SYMBOL lexeme', found '{text}'")]
    MalformedToken { line: usize, text: String },
}

impl From<ParseError> for CompilerError {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::Reject { position } => CompilerError::SyntaxReject { position },
            other => CompilerError::grammar(other.to_string()),
        }
    }
}

/// Wrap a token sequence in the BOF/EOF markers the grammar expects
pub fn with_markers(tokens: impl IntoIterator<Item = Terminal>) -> Vec<Terminal> {
    let mut sequence = vec![Terminal::bof()];
    sequence.extend(tokens);
    sequence.push(Terminal::eof());
    sequence
}

/// Read a scanner listing, one `SYMBOL lexeme` pair per line
pub fn read_terminals(text: &str) -> Result<Vec<Terminal>, ParseError> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            Terminal::parse_line(line).ok_or_else(|| ParseError::MalformedToken {
                line: index + 1,
                text: line.to_string(),
            })
        })
        .collect()
}

pub struct Parser<'g> {
    grammar: &'g Grammar,
    states: Vec<usize>,
    nodes: Vec<SyntaxTree>,
}

impl<'g> Parser<'g> {
    pub fn new(grammar: &'g Grammar) -> Self {
        Self {
            grammar,
            states: vec![0],
            nodes: Vec::new(),
        }
    }

    /// Parse a marker-wrapped token sequence into a tree rooted at the start symbol
    pub fn parse(mut self, sequence: Vec<Terminal>) -> Result<SyntaxTree, ParseError> {
        let total = sequence.len();
        for (position, token) in sequence.into_iter().enumerate() {
            while let Some(Action::Reduce(rule)) = self.grammar.action(self.top(), &token.symbol) {
                trace!("{} {} reduce {}", self.top(), token.symbol, rule);
                self.reduce(rule)?;
            }

            match self.grammar.action(self.top(), &token.symbol) {
                Some(Action::Shift(next)) => {
                    trace!("{} {} shift {}", self.top(), token.symbol, next);
                    self.states.push(next);
                    self.nodes.push(SyntaxTree::Leaf(token));
                }
                _ => {
                    // Dropping self releases the partial tree stack and the
                    // iterator releases every unconsumed token
                    return Err(ParseError::Reject { position });
                }
            }
        }

        let grammar = self.grammar;
        let rule = grammar.rule(0).ok_or(ParseError::MissingRule(0))?;
        if self.nodes.len() < rule.rhs.len() {
            return Err(ParseError::Reject { position: total });
        }
        let children = self.nodes.split_off(self.nodes.len() - rule.rhs.len());
        Ok(SyntaxTree::Internal {
            symbol: rule.lhs.clone(),
            children,
        })
    }

    fn top(&self) -> usize {
        self.states.last().copied().unwrap_or_default()
    }

    fn reduce(&mut self, index: usize) -> Result<(), ParseError> {
        let grammar = self.grammar;
        let rule = grammar.rule(index).ok_or(ParseError::MissingRule(index))?;
        let arity = rule.rhs.len();
        if self.nodes.len() < arity {
            return Err(ParseError::MissingRule(index));
        }

        let children = self.nodes.split_off(self.nodes.len() - arity);
        self.states.truncate(self.states.len() - arity);
        self.nodes.push(SyntaxTree::Internal {
            symbol: rule.lhs.clone(),
            children,
        });

        match grammar.action(self.top(), &rule.lhs) {
            Some(Action::Shift(next)) => {
                self.states.push(next);
                Ok(())
            }
            _ => Err(ParseError::MissingGoto {
                state: self.top(),
                symbol: rule.lhs.clone(),
            }),
        }
    }
}
