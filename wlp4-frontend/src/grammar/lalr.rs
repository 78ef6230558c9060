//! LALR(1) action table construction
//!
//! States are LR(1) kernels merged by core: whenever a goto produces a kernel
//! whose core already exists, the lookaheads are unioned into the existing
//! state and that state is reprocessed until nothing changes. The accepting
//! reduction of rule 0 is left out of the table; the engine performs it
//! unconditionally once input is exhausted.

use super::{Action, Grammar, GrammarError};
use log::{debug, trace};
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

/// `(rule, dot)`
type Item = (usize, usize);
type Lookaheads = BTreeSet<usize>;
type ItemSet = BTreeMap<Item, Lookaheads>;

/// Build the action table for `grammar`, one row per state
pub fn build_table(grammar: &Grammar) -> Result<Vec<BTreeMap<String, Action>>, GrammarError> {
    let builder = Builder::new(grammar);
    let (kernels, transitions) = builder.collection();
    debug!("LALR(1) automaton has {} states", kernels.len());
    builder.table(&kernels, &transitions)
}

struct Builder<'g> {
    names: Vec<&'g str>,
    is_terminal: Vec<bool>,
    /// `(lhs, rhs)` as symbol ids
    rules: Vec<(usize, Vec<usize>)>,
    by_lhs: HashMap<usize, Vec<usize>>,
    nullable: Vec<bool>,
    first: Vec<Lookaheads>,
    /// Pseudo-terminal following the augmented start rule
    end: usize,
}

impl<'g> Builder<'g> {
    fn new(grammar: &'g Grammar) -> Self {
        let mut names: Vec<&'g str> = Vec::new();
        let mut is_terminal = Vec::new();
        for t in grammar.terminals() {
            names.push(t.as_str());
            is_terminal.push(true);
        }
        for n in grammar.nonterminals() {
            names.push(n.as_str());
            is_terminal.push(false);
        }
        let ids: HashMap<&str, usize> = names.iter().enumerate().map(|(i, n)| (*n, i)).collect();

        // Grammar::new has already checked every symbol is declared
        let id = |symbol: &str| ids.get(symbol).copied().unwrap_or_default();
        let rules: Vec<(usize, Vec<usize>)> = grammar
            .rules()
            .iter()
            .map(|rule| (id(rule.lhs.as_str()), rule.rhs.iter().map(|s| id(s.as_str())).collect()))
            .collect();

        let mut by_lhs: HashMap<usize, Vec<usize>> = HashMap::new();
        for (index, (lhs, _)) in rules.iter().enumerate() {
            by_lhs.entry(*lhs).or_default().push(index);
        }

        let end = names.len();
        let mut builder = Self {
            nullable: vec![false; names.len()],
            first: vec![Lookaheads::new(); names.len()],
            names,
            is_terminal,
            rules,
            by_lhs,
            end,
        };
        builder.compute_first();
        builder
    }

    fn compute_first(&mut self) {
        for (symbol, terminal) in self.is_terminal.iter().enumerate() {
            if *terminal {
                self.first[symbol].insert(symbol);
            }
        }

        let mut changed = true;
        while changed {
            changed = false;
            for (lhs, rhs) in &self.rules {
                let mut all_nullable = true;
                for &symbol in rhs {
                    let additions: Vec<usize> = self.first[symbol]
                        .difference(&self.first[*lhs])
                        .copied()
                        .collect();
                    if !additions.is_empty() {
                        self.first[*lhs].extend(additions);
                        changed = true;
                    }
                    if !self.nullable[symbol] {
                        all_nullable = false;
                        break;
                    }
                }
                if all_nullable && !self.nullable[*lhs] {
                    self.nullable[*lhs] = true;
                    changed = true;
                }
            }
        }
    }

    /// FIRST of `sequence` followed by any of `follow`
    fn first_of(&self, sequence: &[usize], follow: &Lookaheads) -> Lookaheads {
        let mut out = Lookaheads::new();
        for &symbol in sequence {
            out.extend(self.first[symbol].iter().copied());
            if !self.nullable[symbol] {
                return out;
            }
        }
        out.extend(follow.iter().copied());
        out
    }

    fn closure(&self, kernel: &ItemSet) -> ItemSet {
        let mut items = kernel.clone();
        let mut work: Vec<Item> = items.keys().copied().collect();

        while let Some((rule, dot)) = work.pop() {
            let rhs = &self.rules[rule].1;
            let Some(&next) = rhs.get(dot) else {
                continue;
            };
            if self.is_terminal[next] {
                continue;
            }
            let lookaheads = match items.get(&(rule, dot)) {
                Some(follow) => self.first_of(&rhs[dot + 1..], follow),
                None => continue,
            };
            for &production in self.by_lhs.get(&next).into_iter().flatten() {
                let is_new = !items.contains_key(&(production, 0));
                let entry = items.entry((production, 0)).or_default();
                let before = entry.len();
                entry.extend(lookaheads.iter().copied());
                if is_new || entry.len() != before {
                    work.push((production, 0));
                }
            }
        }
        items
    }

    /// Kernels of every state and the symbol transitions out of each
    fn collection(&self) -> (Vec<ItemSet>, Vec<BTreeMap<usize, usize>>) {
        let mut start = ItemSet::new();
        start.insert((0, 0), Lookaheads::from([self.end]));

        let mut kernels = vec![start];
        let mut transitions = vec![BTreeMap::new()];
        let mut by_core: HashMap<Vec<Item>, usize> = HashMap::new();
        by_core.insert(vec![(0, 0)], 0);

        let mut queue = VecDeque::from([0usize]);
        while let Some(state) = queue.pop_front() {
            let closure = self.closure(&kernels[state]);

            let mut gotos: BTreeMap<usize, ItemSet> = BTreeMap::new();
            for (&(rule, dot), lookaheads) in &closure {
                if let Some(&symbol) = self.rules[rule].1.get(dot) {
                    gotos
                        .entry(symbol)
                        .or_default()
                        .entry((rule, dot + 1))
                        .or_default()
                        .extend(lookaheads.iter().copied());
                }
            }

            for (symbol, kernel) in gotos {
                let core: Vec<Item> = kernel.keys().copied().collect();
                let target = match by_core.get(&core) {
                    Some(&existing) => {
                        if merge(&mut kernels[existing], kernel) {
                            queue.push_back(existing);
                        }
                        existing
                    }
                    None => {
                        let fresh = kernels.len();
                        kernels.push(kernel);
                        transitions.push(BTreeMap::new());
                        by_core.insert(core, fresh);
                        queue.push_back(fresh);
                        fresh
                    }
                };
                trace!("state {} on {} -> {}", state, self.names[symbol], target);
                transitions[state].insert(symbol, target);
            }
        }
        (kernels, transitions)
    }

    fn table(
        &self,
        kernels: &[ItemSet],
        transitions: &[BTreeMap<usize, usize>],
    ) -> Result<Vec<BTreeMap<String, Action>>, GrammarError> {
        let mut table = Vec::with_capacity(kernels.len());
        for (state, kernel) in kernels.iter().enumerate() {
            let mut row: BTreeMap<String, Action> = BTreeMap::new();
            for (&symbol, &target) in &transitions[state] {
                row.insert(self.names[symbol].to_string(), Action::Shift(target));
            }

            for (&(rule, dot), lookaheads) in &self.closure(kernel) {
                if rule == 0 || dot < self.rules[rule].1.len() {
                    continue;
                }
                let incoming = Action::Reduce(rule);
                for &lookahead in lookaheads {
                    if lookahead == self.end {
                        continue;
                    }
                    let symbol = self.names[lookahead];
                    match row.get(symbol) {
                        Some(&existing) if existing != incoming => {
                            return Err(GrammarError::Conflict {
                                state,
                                symbol: symbol.to_string(),
                                existing,
                                incoming,
                            });
                        }
                        _ => {
                            row.insert(symbol.to_string(), incoming);
                        }
                    }
                }
            }
            table.push(row);
        }
        Ok(table)
    }
}

/// Union `incoming` lookaheads into `kernel`, reporting whether anything changed
fn merge(kernel: &mut ItemSet, incoming: ItemSet) -> bool {
    let mut changed = false;
    for (item, lookaheads) in incoming {
        let entry = kernel.entry(item).or_default();
        let before = entry.len();
        entry.extend(lookaheads);
        changed |= entry.len() != before;
    }
    changed
}
