//! Earley parsing with Scott's SPPF construction.
//!
//! Columns are worklists: items appended to the column being processed are
//! visited in the same pass. Items waiting on a terminal that the next token
//! matches go into a separate queue, which the scanner drains into the next
//! column once the current one is exhausted. Nonterminals completed without
//! consuming input are remembered per column, so a later prediction of the
//! same nonterminal can step over it immediately.

use std::collections::{HashMap, HashSet};
use std::fmt;

use tracing::{debug, trace};

use crate::error::{GrammarError, ParseError};
use crate::forest::Forest;
use crate::grammar::Grammar;
use crate::rules::{NtId, ProdId, Symbol, TermId};
use crate::sppf::{Children, Family, Label, NodeArena, NodeCache, NodeIdx};
use crate::token::Matcher;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Item {
  pub prod: ProdId,
  pub dot: usize,
  pub origin: usize,
  /// Forest node for the symbols before the dot; None until something is recognized
  pub node: Option<NodeIdx>,
}

impl Item {
  fn predicted(prod: ProdId, origin: usize) -> Self {
    Self {
      prod,
      dot: 0,
      origin,
      node: None,
    }
  }

  fn advanced(&self, node: NodeIdx) -> Self {
    Self {
      prod: self.prod,
      dot: self.dot + 1,
      origin: self.origin,
      node: Some(node),
    }
  }
}

#[derive(Debug, Default)]
struct Column {
  items: Vec<Item>,
  seen: HashSet<Item>,
}

impl Column {
  fn len(&self) -> usize {
    self.items.len()
  }

  fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  fn add(&mut self, item: Item) -> bool {
    if self.seen.insert(item) {
      self.items.push(item);
      true
    } else {
      false
    }
  }

  /// Get an owned item so that passing around &mut columns is more ergonomic
  fn get(&self, idx: usize) -> Item {
    self.items[idx]
  }
}

/// Limits on how much work one parse may do
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct ParseLimits {
  /// Give up once this many Earley items exist across all columns
  pub max_items: Option<usize>,
}

/// Memo of token/terminal matches for the token being scanned next
struct MatchCache(Vec<Option<bool>>);

impl MatchCache {
  fn new(terminals: usize) -> Self {
    Self(vec![None; terminals])
  }

  fn reset(&mut self) {
    self.0.iter_mut().for_each(|m| *m = None);
  }

  fn matches<T: Matcher>(&mut self, g: &Grammar, token: &T, terminal: TermId) -> bool {
    let slot = &mut self.0[terminal.index()];
    *slot.get_or_insert_with(|| token.matches(g.terminal(terminal)))
  }
}

/// Everything one parse owns: the columns, the forest being built and the
/// per-column bookkeeping
struct State<'g, 't, T> {
  grammar: &'g Grammar,
  tokens: &'t [T],
  columns: Vec<Column>,
  arena: NodeArena,
  /// Node cache, cleared when the scanner starts building the next column
  cache: NodeCache,
  /// Nonterminals completed in the current column with origin in the same column
  completed: HashMap<NtId, NodeIdx>,
  /// Items waiting on a terminal the next token matches
  queue: Vec<Item>,
  matches: MatchCache,
  total_items: usize,
}

impl fmt::Display for Item {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "#{}・{} @{}", self.prod.0, self.dot, self.origin)
  }
}

/// An Earley-Scott parser over a validated grammar. Cheap to create, and the
/// grammar is only ever read, so any number of parsers may share one.
#[derive(Debug, Clone, Copy)]
pub struct Parser<'g> {
  grammar: &'g Grammar,
  limits: ParseLimits,
}

impl<'g> Parser<'g> {
  /// Validates the grammar: an invalid grammar never gets parsed with
  pub fn new(grammar: &'g Grammar) -> Result<Self, GrammarError> {
    grammar.validate()?;
    Ok(Self {
      grammar,
      limits: ParseLimits::default(),
    })
  }

  pub fn with_limits(mut self, limits: ParseLimits) -> Self {
    self.limits = limits;
    self
  }

  pub fn grammar(&self) -> &'g Grammar {
    self.grammar
  }

  /// Parse from the grammar's root
  pub fn parse<T: Matcher>(&self, tokens: &[T]) -> Result<Forest<'g>, ParseError> {
    match self.grammar.root() {
      Some(root) => self.parse_from(root, tokens),
      None => Err(ParseError::NoParse),
    }
  }

  /// Parse from any nonterminal of the grammar. An id the grammar doesn't
  /// know gives `NoParse`.
  pub fn parse_from<T: Matcher>(&self, root: NtId, tokens: &[T]) -> Result<Forest<'g>, ParseError> {
    if root.index() >= self.grammar.nonterminals().len() {
      debug!(root = root.index(), "parse failed: unknown root");
      return Err(ParseError::NoParse);
    }

    let mut state = State {
      grammar: self.grammar,
      tokens,
      columns: (0..=tokens.len()).map(|_| Column::default()).collect(),
      arena: NodeArena::new(),
      cache: NodeCache::new(),
      completed: HashMap::new(),
      queue: Vec::new(),
      matches: MatchCache::new(self.grammar.terminals().len()),
      total_items: 0,
    };

    for prod in self.grammar.productions_of(root) {
      state.columns[0].add(Item::predicted(*prod, 0));
    }

    for k in 0..state.columns.len() {
      if state.columns[k].is_empty() {
        return Err(match k {
          0 => ParseError::NoParse,
          _ => {
            let text = tokens[k - 1].text().to_string();
            debug!(index = k, token = %text, "parse failed: dead end");
            ParseError::DeadEnd { index: k, text }
          }
        });
      }

      state.process_column(k);

      state.total_items += state.columns[k].len();
      trace!(column = k, items = state.columns[k].len(), queued = state.queue.len(), "column done");
      if let Some(max) = self.limits.max_items {
        if state.total_items > max {
          debug!(column = k, items = state.total_items, "parse over budget");
          return Err(ParseError::TooComplex {
            index: k,
            items: state.total_items,
          });
        }
      }

      if k < tokens.len() {
        state.scan(k);
      }
    }

    match state.accept(root) {
      Some(node) => {
        debug!(tokens = tokens.len(), nodes = state.arena.len(), "parse succeeded");
        Ok(Forest::new(self.grammar, state.arena, node))
      }
      None => {
        debug!(tokens = tokens.len(), "parse failed: no complete parse");
        Err(ParseError::NoParse)
      }
    }
  }
}

impl<T: Matcher> State<'_, '_, T> {
  fn process_column(&mut self, k: usize) {
    self.completed.clear();
    self.queue.clear();
    self.matches.reset();

    let g = self.grammar;
    // need to use while loop because the number of items at k can expand during the loop
    let mut idx = 0;
    while idx < self.columns[k].len() {
      let item = self.columns[k].get(idx);
      idx += 1;

      match g.production(item.prod).get(item.dot).copied() {
        None => self.completer(k, item),
        Some(Symbol::Nonterminal(nt)) => self.predictor(k, item, nt),
        Some(Symbol::Terminal(t)) => {
          if k < self.tokens.len() && self.matches.matches(g, &self.tokens[k], t) {
            self.queue.push(item);
          }
        }
      }
    }
  }

  fn predictor(&mut self, k: usize, item: Item, needed: NtId) {
    let g = self.grammar;
    // hypothesize that any production of the needed nonterminal may succeed here
    for prod in g.productions_of(needed) {
      self.columns[k].add(Item::predicted(*prod, k));
    }

    // if it has already been completed here without consuming input, step over it now,
    // since the completer for it has already run
    if let Some(done) = self.completed.get(&needed).copied() {
      let node = self.make_node(item, k, done);
      self.columns[k].add(item.advanced(node));
    }
  }

  fn completer(&mut self, k: usize, item: Item) {
    let g = self.grammar;
    let lhs = g.production(item.prod).lhs;
    let node = match item.node {
      Some(node) => node,
      None => {
        // only an empty production completes without a node
        let node = self
          .arena
          .node_for(&mut self.cache, Label::Nonterminal(lhs), k, k);
        self.arena.add_family(
          node,
          Family {
            prod: item.prod,
            children: Children::Empty,
          },
        );
        node
      }
    };

    if item.origin == k {
      self.completed.entry(lhs).or_insert(node);
    }

    // look for items in the origin column waiting on this nonterminal, and advance them
    // into *this* column
    let mut idx = 0;
    while idx < self.columns[item.origin].len() {
      let waiting = self.columns[item.origin].get(idx);
      idx += 1;

      if g.production(waiting.prod).get(waiting.dot) == Some(&Symbol::Nonterminal(lhs)) {
        let advanced = self.make_node(waiting, k, node);
        self.columns[k].add(waiting.advanced(advanced));
      }
    }
  }

  fn scan(&mut self, k: usize) {
    let g = self.grammar;
    self.cache.clear();

    let queue = std::mem::take(&mut self.queue);
    for item in queue.iter() {
      let Some(terminal) = g.production(item.prod).get(item.dot).and_then(Symbol::terminal) else {
        continue;
      };
      let leaf = self.arena.node_for(
        &mut self.cache,
        Label::Token { terminal, index: k },
        k,
        k + 1,
      );
      let node = self.make_node(*item, k + 1, leaf);
      self.columns[k + 1].add(item.advanced(node));
    }
    self.queue = queue;
  }

  /// Build (or reuse) the node for `item` advanced over `child`, which ends at `end`.
  /// The first symbol of a longer production needs no node of its own: the child
  /// stands in for it.
  fn make_node(&mut self, item: Item, end: usize, child: NodeIdx) -> NodeIdx {
    let g = self.grammar;
    let prod = g.production(item.prod);
    let dot = item.dot + 1;
    if dot == 1 && prod.len() >= 2 {
      return child;
    }

    let label = if dot == prod.len() {
      Label::Nonterminal(prod.lhs)
    } else {
      Label::Partial {
        nt: prod.lhs,
        prod: item.prod,
        dot,
      }
    };
    let node = self.arena.node_for(&mut self.cache, label, item.origin, end);
    let children = match item.node {
      None => Children::Single(child),
      Some(left) => Children::Pair(left, child),
    };
    self.arena.add_family(
      node,
      Family {
        prod: item.prod,
        children,
      },
    );
    node
  }

  /// The root's node over the whole input, if a complete root item made it to the end
  fn accept(&mut self, root: NtId) -> Option<NodeIdx> {
    let g = self.grammar;
    let n = self.tokens.len();
    let item = self.columns[n].items.iter().copied().find(|item| {
      let prod = g.production(item.prod);
      prod.lhs == root && item.dot == prod.len() && item.origin == 0
    })?;

    match item.node {
      Some(node) => Some(node),
      // an empty production of the root on empty input; the completer made its node
      None => Some(
        self
          .arena
          .node_for(&mut self.cache, Label::Nonterminal(root), 0, 0),
      ),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::token::SimpleToken;

  fn parse_with<'a>(g: &'a Grammar, input: &str) -> Result<Forest<'a>, ParseError> {
    Parser::new(g).unwrap().parse(&SimpleToken::tokenize(input))
  }

  fn arithmetic() -> Grammar {
    let mut g = Grammar::new();
    g.add_rule("E", &["E", "\"+\"", "T"]).unwrap();
    g.add_rule("E", &["T"]).unwrap();
    g.add_rule("T", &["T", "\"*\"", "P"]).unwrap();
    g.add_rule("T", &["P"]).unwrap();
    g.add_rule("P", &["ident"]).unwrap();
    g
  }

  #[test]
  fn test_unambiguous_arithmetic() {
    let g = arithmetic();
    let forest = parse_with(&g, "ident * ident + ident * ident + ident").unwrap();
    assert_eq!(forest.num_combinations(), 1);

    let trees = forest.trees();
    assert_eq!(trees.len(), 1);
    assert_eq!(
      trees[0].bracketed(),
      r#"(E (E (E (T (T (P ident)) "*" (P ident))) "+" (T (T (P ident)) "*" (P ident))) "+" (T (P ident)))"#
    );
    let root = forest.arena().get(forest.root());
    assert_eq!(root.span(), (0, 9));
    assert!(!root.is_ambiguous());
  }

  #[test]
  fn test_ambiguous_expression() {
    let mut g = Grammar::new();
    g.add_rule("E", &["E", "\"+\"", "E"]).unwrap();
    g.add_rule("E", &["E", "\"*\"", "E"]).unwrap();
    g.add_rule("E", &["num"]).unwrap();

    let forest = parse_with(&g, "num:1 + num:2 * num:3").unwrap();
    // the root packs both groupings
    assert!(forest.arena().get(forest.root()).is_ambiguous());
    assert_eq!(forest.arena().get(forest.root()).families().len(), 2);
    assert_eq!(forest.num_combinations(), 2);
    forest.assert_licensed();

    let mut trees = forest.trees().iter().map(|t| t.bracketed()).collect::<Vec<_>>();
    trees.sort();
    assert_eq!(
      trees,
      vec![
        r#"(E (E (E num) "+" (E num)) "*" (E num))"#.to_string(),
        r#"(E (E num) "+" (E (E num) "*" (E num)))"#.to_string(),
      ]
    );
  }

  #[test]
  fn test_catalan_ambiguity_stays_packed() {
    let mut g = Grammar::new();
    g.add_rule("S", &["S", "S"]).unwrap();
    g.add_rule("S", &["x"]).unwrap();

    // binary bracketings of 8 leaves: the 7th Catalan number
    let forest = parse_with(&g, "x x x x x x x x").unwrap();
    assert_eq!(forest.num_combinations(), 429);
    forest.assert_licensed();
    assert_eq!(forest.trees().len(), 429);

    let forest = parse_with(&g, "x x x").unwrap();
    assert_eq!(forest.num_combinations(), 2);
  }

  #[test]
  fn test_epsilon() {
    let mut g = Grammar::new();
    g.add_rule("S", &["A", "x", "A"]).unwrap();
    g.add_rule("A", &["a"]).unwrap();
    g.add_rule("A", &[]).unwrap();

    let forest = parse_with(&g, "x").unwrap();
    forest.assert_licensed();
    assert_eq!(forest.trees()[0].bracketed(), "(S (A) x (A))");
    assert_eq!(parse_with(&g, "a x").unwrap().trees()[0].bracketed(), "(S (A a) x (A))");
    assert_eq!(parse_with(&g, "a x a").unwrap().num_combinations(), 1);
  }

  #[test]
  fn test_nullable_chain() {
    let mut g = Grammar::new();
    g.add_rule("S", &["A", "B", "y"]).unwrap();
    g.add_rule("A", &["B", "B"]).unwrap();
    g.add_rule("B", &["b"]).unwrap();
    g.add_rule("B", &[]).unwrap();

    assert_eq!(parse_with(&g, "y").unwrap().num_combinations(), 1);
    // one b: it can be either B under A, or the B after A
    let forest = parse_with(&g, "b y").unwrap();
    assert_eq!(forest.num_combinations(), 3);
    forest.assert_licensed();
    assert!(parse_with(&g, "b b b b y").is_err());
  }

  #[test]
  fn test_empty_input() {
    let mut g = Grammar::new();
    g.add_rule("S", &["x"]).unwrap();
    g.add_rule("S", &[]).unwrap();
    let forest = parse_with(&g, "").unwrap();
    let root = forest.arena().get(forest.root());
    assert_eq!(root.span(), (0, 0));
    assert_eq!(root.families()[0].children, Children::Empty);

    let mut g = Grammar::new();
    g.add_rule("S", &["x"]).unwrap();
    assert_eq!(parse_with(&g, "").unwrap_err(), ParseError::NoParse);
  }

  #[test]
  fn test_dead_end() {
    let g = arithmetic();
    assert_eq!(
      parse_with(&g, "ident + + ident").unwrap_err(),
      ParseError::DeadEnd {
        index: 3,
        text: "+".to_string()
      }
    );
    assert_eq!(
      parse_with(&g, "bogus").unwrap_err(),
      ParseError::DeadEnd {
        index: 1,
        text: "bogus".to_string()
      }
    );
  }

  #[test]
  fn test_incomplete_input() {
    let g = arithmetic();
    assert_eq!(parse_with(&g, "ident +").unwrap_err(), ParseError::NoParse);
  }

  #[test]
  fn test_parse_from_other_root() {
    let g = arithmetic();
    let t = g.find_nonterminal("T").unwrap();
    let parser = Parser::new(&g).unwrap();
    let tokens = SimpleToken::tokenize("ident * ident");
    let forest = parser.parse_from(t, &tokens).unwrap();
    assert_eq!(forest.trees()[0].bracketed(), r#"(T (T (P ident)) "*" (P ident))"#);
    assert!(parser.parse_from(t, &SimpleToken::tokenize("ident + ident")).is_err());
  }

  #[test]
  fn test_parse_from_unknown_root() {
    let g = arithmetic();
    let parser = Parser::new(&g).unwrap();
    let tokens = SimpleToken::tokenize("ident");
    assert_eq!(parser.parse_from(NtId(99), &tokens).unwrap_err(), ParseError::NoParse);
    let last = NtId(g.nonterminals().len() as u32);
    assert_eq!(parser.parse_from(last, &tokens).unwrap_err(), ParseError::NoParse);
  }

  #[test]
  fn test_invalid_grammar_rejected() {
    let mut g = Grammar::new();
    g.add_rule("S", &["A"]).unwrap();
    assert!(Parser::new(&g).is_err());
  }

  #[test]
  fn test_budget() {
    let mut g = Grammar::new();
    g.add_rule("S", &["S", "S"]).unwrap();
    g.add_rule("S", &["x"]).unwrap();
    let parser = Parser::new(&g).unwrap().with_limits(ParseLimits { max_items: Some(20) });
    let err = parser.parse(&SimpleToken::tokenize("x x x x x x")).unwrap_err();
    assert!(matches!(err, ParseError::TooComplex { .. }));
  }

  #[test]
  fn test_deterministic() {
    let mut g = Grammar::new();
    g.add_rule("S", &["S", "S"]).unwrap();
    g.add_rule("S", &["x"]).unwrap();
    let a = parse_with(&g, "x x x x").unwrap().to_string();
    let b = parse_with(&g, "x x x x").unwrap().to_string();
    assert_eq!(a, b);
  }
}
