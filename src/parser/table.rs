//! The parsing automaton, built once from the fixed grammar.
//!
//! The driver only ever sees the finished artifact: an initial state, an
//! `action(state, lookahead)` lookup and a `goto(state, nonterminal)`
//! lookup. The construction here is a plain SLR(1): FOLLOW sets over the
//! grammar, canonical LR(0) item sets, then one action/goto row per state.

use crate::lexer::TokenKind;
use itertools::Itertools;
use lazy_static::lazy_static;
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NonTerminal {
    Goal,
    Program,
    StmtList,
    Stmt,
    Decl,
    Expr,
    Term,
    Factor,
}

impl fmt::Display for NonTerminal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Self::Goal => "Goal",
            Self::Program => "Program",
            Self::StmtList => "StmtList",
            Self::Stmt => "Stmt",
            Self::Decl => "Decl",
            Self::Expr => "Expr",
            Self::Term => "Term",
            Self::Factor => "Factor",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GrammarSymbol {
    Terminal(TokenKind),
    NonTerminal(NonTerminal),
}

impl fmt::Display for GrammarSymbol {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Terminal(t) => t.fmt(f),
            Self::NonTerminal(n) => n.fmt(f),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Production {
    pub index: usize,
    pub head: NonTerminal,
    pub body: Vec<GrammarSymbol>,
}

impl fmt::Display for Production {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} -> {}", self.head, self.body.iter().join(" "))
    }
}

/// Opaque position in the automaton.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct State(pub usize);

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Shift(State),
    /// Reduce by the production with this index.
    Reduce(usize),
    Accept,
}

/// The grammar of the source language. Production indices are part of the
/// artifact's contract: the reduce-action tables in the observers dispatch
/// on them.
fn grammar() -> Vec<Production> {
    use GrammarSymbol::NonTerminal as N;
    use GrammarSymbol::Terminal as T;
    use NonTerminal::*;
    use TokenKind::*;
    let rules: Vec<(NonTerminal, Vec<GrammarSymbol>)> = vec![
        (Goal, vec![N(Program)]),
        (Program, vec![N(StmtList)]),
        (StmtList, vec![N(Stmt), T(Semicolon), N(StmtList)]),
        (StmtList, vec![N(Stmt), T(Semicolon)]),
        (Stmt, vec![N(Decl), T(Identifier)]),
        (Decl, vec![T(Int)]),
        (Stmt, vec![T(Identifier), T(Assign), N(Expr)]),
        (Stmt, vec![T(Return), N(Expr)]),
        (Expr, vec![N(Expr), T(Plus), N(Term)]),
        (Expr, vec![N(Expr), T(Minus), N(Term)]),
        (Expr, vec![N(Term)]),
        (Term, vec![N(Term), T(Star), N(Factor)]),
        (Term, vec![N(Factor)]),
        (Factor, vec![T(OpenParen), N(Expr), T(CloseParen)]),
        (Factor, vec![T(Identifier)]),
        (Factor, vec![T(IntConst)]),
    ];
    rules
        .into_iter()
        .enumerate()
        .map(|(index, (head, body))| Production { index, head, body })
        .collect()
}

lazy_static! {
    /// The prebuilt parsing tables for the fixed grammar.
    pub static ref LR_TABLE: LrTable = LrTable::slr(grammar());
}

#[derive(Debug)]
pub struct LrTable {
    productions: Vec<Production>,
    actions: Vec<HashMap<TokenKind, Action>>,
    gotos: Vec<HashMap<NonTerminal, State>>,
}

/// LR(0) item: production index plus dot position.
type Item = (usize, usize);

impl LrTable {
    /// Initial state of the automaton. The construction seeds state 0 with
    /// the closure of the augmented start item, so this is always 0.
    pub const fn init(&self) -> State {
        State(0)
    }

    pub fn action(&self, state: State, lookahead: TokenKind) -> Option<Action> {
        self.actions[state.0].get(&lookahead).copied()
    }

    pub fn goto(&self, state: State, head: NonTerminal) -> Option<State> {
        self.gotos[state.0].get(&head).copied()
    }

    pub fn production(&self, index: usize) -> &Production {
        &self.productions[index]
    }

    /// SLR(1) construction. The grammar is fixed and known conflict-free;
    /// a conflict therefore means the grammar table above was edited badly
    /// and is reported by panicking, not through a `Result`.
    pub fn slr(productions: Vec<Production>) -> Self {
        let first = first_sets(&productions);
        let follow = follow_sets(&productions, &first);

        // canonical LR(0) collection. BTreeSets keep state discovery (and
        // therefore state numbering) deterministic.
        let start: BTreeSet<Item> = closure(&productions, std::iter::once((0, 0)).collect());
        let mut states: Vec<BTreeSet<Item>> = vec![start.clone()];
        let mut index_of: HashMap<BTreeSet<Item>, usize> =
            std::iter::once((start, 0)).collect();
        let mut transitions: HashMap<(usize, GrammarSymbol), usize> = HashMap::new();
        let mut pending: VecDeque<usize> = VecDeque::from(vec![0]);

        while let Some(state) = pending.pop_front() {
            let symbols: BTreeSet<GrammarSymbol> = states[state]
                .iter()
                .filter_map(|&(prod, dot)| productions[prod].body.get(dot).copied())
                .collect();
            for symbol in symbols {
                let target_items = goto_items(&productions, &states[state], symbol);
                let target = match index_of.get(&target_items) {
                    Some(&existing) => existing,
                    None => {
                        states.push(target_items.clone());
                        index_of.insert(target_items, states.len() - 1);
                        pending.push_back(states.len() - 1);
                        states.len() - 1
                    }
                };
                transitions.insert((state, symbol), target);
            }
        }

        let mut actions: Vec<HashMap<TokenKind, Action>> = vec![HashMap::new(); states.len()];
        let mut gotos: Vec<HashMap<NonTerminal, State>> = vec![HashMap::new(); states.len()];
        for (index, items) in states.iter().enumerate() {
            for &(prod, dot) in items {
                match productions[prod].body.get(dot).copied() {
                    Some(GrammarSymbol::Terminal(t)) => {
                        let target = State(transitions[&(index, GrammarSymbol::Terminal(t))]);
                        insert_action(&mut actions[index], t, Action::Shift(target));
                    }
                    Some(GrammarSymbol::NonTerminal(n)) => {
                        let target = State(transitions[&(index, GrammarSymbol::NonTerminal(n))]);
                        gotos[index].insert(n, target);
                    }
                    None if prod == 0 => {
                        insert_action(&mut actions[index], TokenKind::Eof, Action::Accept)
                    }
                    None => {
                        for &t in follow.get(&productions[prod].head).into_iter().flatten() {
                            insert_action(&mut actions[index], t, Action::Reduce(prod));
                        }
                    }
                }
            }
        }

        tracing::debug!(target: "table", "built SLR table with {} states", states.len());
        Self {
            productions,
            actions,
            gotos,
        }
    }
}

fn insert_action(row: &mut HashMap<TokenKind, Action>, token: TokenKind, action: Action) {
    if let Some(existing) = row.insert(token, action) {
        assert_eq!(existing, action, "parse table conflict on {}", token);
    }
}

fn closure(productions: &[Production], mut items: BTreeSet<Item>) -> BTreeSet<Item> {
    let mut queue: VecDeque<Item> = items.iter().copied().collect();
    while let Some((prod, dot)) = queue.pop_front() {
        if let Some(GrammarSymbol::NonTerminal(head)) = productions[prod].body.get(dot).copied() {
            for candidate in productions.iter().filter(|p| p.head == head) {
                if items.insert((candidate.index, 0)) {
                    queue.push_back((candidate.index, 0));
                }
            }
        }
    }
    items
}

fn goto_items(
    productions: &[Production],
    items: &BTreeSet<Item>,
    symbol: GrammarSymbol,
) -> BTreeSet<Item> {
    closure(
        productions,
        items
            .iter()
            .filter(|&&(prod, dot)| productions[prod].body.get(dot).copied() == Some(symbol))
            .map(|&(prod, dot)| (prod, dot + 1))
            .collect(),
    )
}

fn first_sets(productions: &[Production]) -> HashMap<NonTerminal, BTreeSet<TokenKind>> {
    let mut first: HashMap<NonTerminal, BTreeSet<TokenKind>> = HashMap::new();
    loop {
        let mut changed = false;
        for prod in productions {
            // no production has an empty body, so FIRST of the head comes
            // from the leading body symbol alone
            let additions: BTreeSet<TokenKind> = match prod.body[0] {
                GrammarSymbol::Terminal(t) => std::iter::once(t).collect(),
                GrammarSymbol::NonTerminal(n) => first.get(&n).cloned().unwrap_or_default(),
            };
            let entry = first.entry(prod.head).or_default();
            for t in additions {
                changed |= entry.insert(t);
            }
        }
        if !changed {
            break first;
        }
    }
}

fn follow_sets(
    productions: &[Production],
    first: &HashMap<NonTerminal, BTreeSet<TokenKind>>,
) -> HashMap<NonTerminal, BTreeSet<TokenKind>> {
    let mut follow: HashMap<NonTerminal, BTreeSet<TokenKind>> = HashMap::new();
    follow
        .entry(productions[0].head)
        .or_default()
        .insert(TokenKind::Eof);
    loop {
        let mut changed = false;
        for prod in productions {
            for (i, symbol) in prod.body.iter().enumerate() {
                let GrammarSymbol::NonTerminal(n) = *symbol else {
                    continue;
                };
                let additions: BTreeSet<TokenKind> = match prod.body.get(i + 1) {
                    Some(GrammarSymbol::Terminal(t)) => std::iter::once(*t).collect(),
                    Some(GrammarSymbol::NonTerminal(m)) => {
                        first.get(m).cloned().unwrap_or_default()
                    }
                    None => follow.get(&prod.head).cloned().unwrap_or_default(),
                };
                let entry = follow.entry(n).or_default();
                for t in additions {
                    changed |= entry.insert(t);
                }
            }
        }
        if !changed {
            break follow;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_without_conflicts() {
        // the construction asserts on conflicts, so finishing is the test
        assert!(LR_TABLE.production(6).body.len() == 3);
    }

    #[test]
    fn initial_state_shifts_statement_starters() {
        for kind in [TokenKind::Int, TokenKind::Return, TokenKind::Identifier] {
            assert!(
                matches!(LR_TABLE.action(LR_TABLE.init(), kind), Some(Action::Shift(_))),
                "expected a shift on {}",
                kind
            );
        }
    }

    #[test]
    fn initial_state_rejects_stray_punctuation() {
        assert_eq!(LR_TABLE.action(LR_TABLE.init(), TokenKind::Semicolon), None);
        assert_eq!(LR_TABLE.action(LR_TABLE.init(), TokenKind::Plus), None);
    }

    #[test]
    fn accept_follows_the_goal_goto() {
        let after_program = LR_TABLE
            .goto(LR_TABLE.init(), NonTerminal::Program)
            .expect("initial state must have a goto on Program");
        assert_eq!(
            LR_TABLE.action(after_program, TokenKind::Eof),
            Some(Action::Accept)
        );
    }

    #[test]
    fn construction_is_deterministic() {
        let a = LrTable::slr(grammar());
        let b = LrTable::slr(grammar());
        assert_eq!(a.actions, b.actions);
        assert_eq!(a.gotos, b.gotos);
    }
}
