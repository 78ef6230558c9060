//! Grammar model and LR(1) action table
//!
//! A [`Grammar`] is either loaded from a `.lr1` table description or built
//! from a bare context-free grammar by the LALR(1) constructor in [`lalr`].
//! It is constructed once and passed by reference to everything that needs it.

pub mod lalr;
mod wlp4;

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::Lines;
use thiserror::Error;
use wlp4_common::CompilerError;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GrammarError {
    #[error("unexpected end of input while reading {context}")]
    UnexpectedEof { context: String },

    #[error("line {line}: {message}")]
    Malformed { line: usize, message: String },

    #[error("unknown symbol {0}")]
    UnknownSymbol(String),

    #[error("conflict in state {state} on {symbol}: {existing} vs {incoming}")]
    Conflict {
        state: usize,
        symbol: String,
        existing: Action,
        incoming: Action,
    },
}

impl From<GrammarError> for CompilerError {
    fn from(err: GrammarError) -> Self {
        CompilerError::grammar(err.to_string())
    }
}

/// A production `lhs -> rhs...`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Production {
    pub lhs: String,
    pub rhs: Vec<String>,
}

impl Production {
    pub fn new(lhs: impl Into<String>, rhs: &[&str]) -> Self {
        Self {
            lhs: lhs.into(),
            rhs: rhs.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl fmt::Display for Production {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.lhs)?;
        for symbol in &self.rhs {
            write!(f, " {}", symbol)?;
        }
        Ok(())
    }
}

/// Table entry. Non-terminal gotos are stored as shifts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Shift(usize),
    Reduce(usize),
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Shift(state) => write!(f, "shift {}", state),
            Action::Reduce(rule) => write!(f, "reduce {}", rule),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Grammar {
    terminals: Vec<String>,
    nonterminals: Vec<String>,
    terminal_set: HashSet<String>,
    nonterminal_set: HashSet<String>,
    start: String,
    rules: Vec<Production>,
    /// Indexed by state
    actions: Vec<BTreeMap<String, Action>>,
}

impl Grammar {
    /// Assemble a grammar from its parts, validating symbol and index references
    pub fn new(
        terminals: Vec<String>,
        nonterminals: Vec<String>,
        start: String,
        rules: Vec<Production>,
        actions: Vec<BTreeMap<String, Action>>,
    ) -> Result<Self, GrammarError> {
        let grammar = Self {
            terminal_set: terminals.iter().cloned().collect(),
            nonterminal_set: nonterminals.iter().cloned().collect(),
            terminals,
            nonterminals,
            start,
            rules,
            actions,
        };
        grammar.validate()?;
        Ok(grammar)
    }

    fn validate(&self) -> Result<(), GrammarError> {
        if !self.is_nonterminal(&self.start) {
            return Err(GrammarError::UnknownSymbol(self.start.clone()));
        }
        match self.rules.first() {
            Some(rule) if rule.lhs == self.start => {}
            _ => {
                return Err(GrammarError::Malformed {
                    line: 0,
                    message: format!("rule 0 must derive the start symbol {}", self.start),
                })
            }
        }
        for rule in &self.rules {
            if !self.is_nonterminal(&rule.lhs) {
                return Err(GrammarError::UnknownSymbol(rule.lhs.clone()));
            }
            if let Some(bad) = rule.rhs.iter().find(|s| !self.is_symbol(s)) {
                return Err(GrammarError::UnknownSymbol(bad.clone()));
            }
        }
        for (state, row) in self.actions.iter().enumerate() {
            for (symbol, action) in row {
                if !self.is_symbol(symbol) {
                    return Err(GrammarError::UnknownSymbol(symbol.clone()));
                }
                let in_range = match *action {
                    Action::Shift(target) => target < self.actions.len(),
                    Action::Reduce(rule) => rule < self.rules.len(),
                };
                if !in_range {
                    return Err(GrammarError::Malformed {
                        line: 0,
                        message: format!("state {state} on {symbol}: {action} out of range"),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn terminals(&self) -> &[String] {
        &self.terminals
    }

    pub fn nonterminals(&self) -> &[String] {
        &self.nonterminals
    }

    pub fn start(&self) -> &str {
        &self.start
    }

    pub fn rules(&self) -> &[Production] {
        &self.rules
    }

    pub fn rule(&self, index: usize) -> Option<&Production> {
        self.rules.get(index)
    }

    pub fn state_count(&self) -> usize {
        self.actions.len()
    }

    pub fn action(&self, state: usize, symbol: &str) -> Option<Action> {
        self.actions.get(state)?.get(symbol).copied()
    }

    pub fn is_terminal(&self, symbol: &str) -> bool {
        self.terminal_set.contains(symbol)
    }

    pub fn is_nonterminal(&self, symbol: &str) -> bool {
        self.nonterminal_set.contains(symbol)
    }

    fn is_symbol(&self, symbol: &str) -> bool {
        self.is_terminal(symbol) || self.is_nonterminal(symbol)
    }

    /// Load a grammar with a precomputed action table (`.lr1` format)
    pub fn from_lr1(text: &str) -> Result<Self, GrammarError> {
        let mut reader = Reader::new(text);
        let (terminals, nonterminals, start, rules) = reader.read_cfg()?;

        let state_count = reader.count("state count")?;
        let action_count = reader.count("action count")?;
        let mut actions = vec![BTreeMap::new(); state_count];
        for _ in 0..action_count {
            let (line, text) = reader.line("action")?;
            let words: Vec<&str> = text.split_whitespace().collect();
            let [state, symbol, kind, target] = words.as_slice() else {
                return Err(GrammarError::Malformed {
                    line,
                    message: format!("expected 'state symbol shift|reduce n', found '{text}'"),
                });
            };
            let state = parse_number(state, line)?;
            let target = parse_number(target, line)?;
            let action = match *kind {
                "shift" => Action::Shift(target),
                "reduce" => Action::Reduce(target),
                other => {
                    return Err(GrammarError::Malformed {
                        line,
                        message: format!("unknown action kind '{other}'"),
                    })
                }
            };
            let row = actions.get_mut(state).ok_or_else(|| GrammarError::Malformed {
                line,
                message: format!("state {state} exceeds state count {state_count}"),
            })?;
            row.insert(symbol.to_string(), action);
        }

        Self::new(terminals, nonterminals, start, rules, actions)
    }

    /// Build a grammar from a bare context-free description, computing the
    /// action table with the LALR(1) construction
    pub fn from_cfg(text: &str) -> Result<Self, GrammarError> {
        let mut reader = Reader::new(text);
        let (terminals, nonterminals, start, rules) = reader.read_cfg()?;
        let skeleton = Self::new(terminals, nonterminals, start, rules, Vec::new())?;
        let actions = lalr::build_table(&skeleton)?;
        Ok(Self { actions, ..skeleton })
    }

    /// The standard WLP4 grammar with its generated table
    pub fn wlp4() -> Result<Self, GrammarError> {
        Self::from_cfg(wlp4::WLP4_CFG)
    }

    /// Render in `.lr1` format
    pub fn to_lr1(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("{}\n", self.terminals.len()));
        for t in &self.terminals {
            out.push_str(&format!("{t}\n"));
        }
        out.push_str(&format!("{}\n", self.nonterminals.len()));
        for n in &self.nonterminals {
            out.push_str(&format!("{n}\n"));
        }
        out.push_str(&format!("{}\n", self.start));
        out.push_str(&format!("{}\n", self.rules.len()));
        for rule in &self.rules {
            out.push_str(&format!("{rule}\n"));
        }
        out.push_str(&format!("{}\n", self.actions.len()));
        let action_count: usize = self.actions.iter().map(|row| row.len()).sum();
        out.push_str(&format!("{action_count}\n"));
        for (state, row) in self.actions.iter().enumerate() {
            for (symbol, action) in row {
                out.push_str(&format!("{state} {symbol} {action}\n"));
            }
        }
        out
    }
}

fn parse_number(word: &str, line: usize) -> Result<usize, GrammarError> {
    word.parse().map_err(|_| GrammarError::Malformed {
        line,
        message: format!("expected a number, found '{word}'"),
    })
}

/// Line reader over the table formats. Blank lines are ignored.
struct Reader<'a> {
    lines: std::iter::Enumerate<Lines<'a>>,
}

type CfgParts = (Vec<String>, Vec<String>, String, Vec<Production>);

impl<'a> Reader<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines().enumerate(),
        }
    }

    fn line(&mut self, context: &str) -> Result<(usize, &'a str), GrammarError> {
        for (index, text) in self.lines.by_ref() {
            if !text.trim().is_empty() {
                return Ok((index + 1, text.trim()));
            }
        }
        Err(GrammarError::UnexpectedEof {
            context: context.to_string(),
        })
    }

    fn word(&mut self, context: &str) -> Result<String, GrammarError> {
        let (line, text) = self.line(context)?;
        let mut words = text.split_whitespace();
        match (words.next(), words.next()) {
            (Some(word), None) => Ok(word.to_string()),
            _ => Err(GrammarError::Malformed {
                line,
                message: format!("expected a single {context}, found '{text}'"),
            }),
        }
    }

    fn count(&mut self, context: &str) -> Result<usize, GrammarError> {
        let (line, text) = self.line(context)?;
        parse_number(text, line)
    }

    fn read_cfg(&mut self) -> Result<CfgParts, GrammarError> {
        let terminal_count = self.count("terminal count")?;
        let terminals = (0..terminal_count)
            .map(|_| self.word("terminal"))
            .collect::<Result<Vec<_>, _>>()?;

        let nonterminal_count = self.count("non-terminal count")?;
        let nonterminals = (0..nonterminal_count)
            .map(|_| self.word("non-terminal"))
            .collect::<Result<Vec<_>, _>>()?;

        let start = self.word("start symbol")?;

        let rule_count = self.count("rule count")?;
        let mut rules = Vec::with_capacity(rule_count);
        for _ in 0..rule_count {
            let (_, text) = self.line("rule")?;
            let mut words = text.split_whitespace();
            let lhs = words.next().unwrap_or_default().to_string();
            rules.push(Production {
                lhs,
                rhs: words.map(str::to_string).collect(),
            });
        }

        Ok((terminals, nonterminals, start, rules))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TINY_LR1: &str = "\
3
BOF
EOF
x
2
S
A
S
3
S BOF A EOF
A x
A
5
6
0 BOF shift 1
1 A shift 2
1 x shift 3
1 EOF reduce 2
2 EOF shift 4
3 EOF reduce 1
";

    #[test]
    fn test_load_lr1() {
        let grammar = Grammar::from_lr1(TINY_LR1).unwrap();
        assert_eq!(grammar.start(), "S");
        assert_eq!(grammar.rules().len(), 3);
        assert!(grammar.rules()[2].rhs.is_empty());
        assert_eq!(grammar.action(0, "BOF"), Some(Action::Shift(1)));
        assert_eq!(grammar.action(3, "EOF"), Some(Action::Reduce(1)));
        assert_eq!(grammar.action(0, "x"), None);
        assert!(grammar.is_terminal("x"));
        assert!(grammar.is_nonterminal("A"));
    }

    #[test]
    fn test_lr1_write_then_read() {
        let grammar = Grammar::from_lr1(TINY_LR1).unwrap();
        let again = Grammar::from_lr1(&grammar.to_lr1()).unwrap();
        assert_eq!(grammar, again);
    }

    #[test]
    fn test_malformed_tables() {
        let bad_kind = TINY_LR1.replace("0 BOF shift 1", "0 BOF jump 1");
        assert!(matches!(
            Grammar::from_lr1(&bad_kind),
            Err(GrammarError::Malformed { .. })
        ));

        let bad_target = TINY_LR1.replace("3 EOF reduce 1", "3 EOF reduce 9");
        assert!(matches!(
            Grammar::from_lr1(&bad_target),
            Err(GrammarError::Malformed { .. })
        ));

        let truncated = TINY_LR1.replace("3 EOF reduce 1\n", "");
        assert!(matches!(
            Grammar::from_lr1(&truncated),
            Err(GrammarError::UnexpectedEof { .. })
        ));

        let unknown = TINY_LR1.replace("A x", "A y");
        assert_eq!(
            Grammar::from_lr1(&unknown),
            Err(GrammarError::UnknownSymbol("y".to_string()))
        );
    }

    #[test]
    fn test_wlp4_grammar_builds() {
        let grammar = Grammar::wlp4().unwrap();
        assert_eq!(grammar.start(), "start");
        assert_eq!(grammar.rules()[0].to_string(), "start BOF procedures EOF");
        assert_eq!(grammar.action(0, "BOF"), Some(Action::Shift(1)));
        assert!(grammar.state_count() > 50);
    }
}
