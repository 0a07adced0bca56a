use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;

use tracing::debug;

use crate::error::GrammarError;
use crate::rules::{Nonterminal, NtId, ProdId, Production, Symbol, TermId};
use crate::terminal::Terminal;

/// An in-memory context-free grammar. Built once, validated, and then shared
/// read-only by any number of parses.
#[derive(Debug, Default, Clone)]
pub struct Grammar {
  root: Option<NtId>,
  nonterminals: Vec<Nonterminal>,
  nt_index: HashMap<String, NtId>,
  terminals: Vec<Terminal>,
  term_index: HashMap<String, TermId>,
  productions: Vec<Production>,
  /// nonterminal -> its productions, in insertion order
  by_lhs: Vec<Vec<ProdId>>,
}

impl fmt::Display for Grammar {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if let Some(root) = self.root {
      writeln!(f, "# root: {}", self.nonterminal(root))?;
    }
    for (idx, nt) in self.nonterminals.iter().enumerate() {
      let prods = &self.by_lhs[idx];
      if prods.is_empty() {
        continue;
      }
      write!(f, "{} ->", nt)?;
      for (n, prod) in prods.iter().enumerate() {
        if n > 0 {
          write!(f, "\n  |")?;
        }
        write!(f, " {}", self.display_production(*prod))?;
      }
      writeln!(f)?;
    }
    Ok(())
  }
}

impl Grammar {
  pub fn new() -> Self {
    Default::default()
  }

  /// Look up a nonterminal by name, registering it (unreferenced and undefined)
  /// if it hasn't been seen before
  pub fn nonterminal_id(&mut self, name: &str) -> NtId {
    if let Some(id) = self.nt_index.get(name) {
      return *id;
    }
    let id = NtId(self.nonterminals.len() as u32);
    self.nonterminals.push(Nonterminal::new(name.to_string()));
    self.by_lhs.push(Vec::new());
    self.nt_index.insert(name.to_string(), id);
    id
  }

  /// Register a nonterminal as defined here. The first nonterminal ever defined
  /// becomes the root.
  pub fn define(&mut self, name: &str) -> NtId {
    self.define_at(name, None, None)
  }

  pub fn define_at(&mut self, name: &str, file: Option<&str>, line: Option<usize>) -> NtId {
    let id = self.nonterminal_id(name);
    let nt = &mut self.nonterminals[id.index()];
    if !nt.defined {
      nt.defined = true;
      nt.file = file.map(str::to_owned);
      nt.line = line;
    }
    if self.root.is_none() {
      self.root = Some(id);
    }
    id
  }

  /// Intern a terminal by its spec string, so identical specs share one instance
  pub fn terminal_id(&mut self, spec: &str) -> Result<TermId, GrammarError> {
    if let Some(id) = self.term_index.get(spec) {
      return Ok(*id);
    }
    let terminal = Terminal::from_spec(spec)?;
    let id = TermId(self.terminals.len() as u32);
    self.terminals.push(terminal);
    self.term_index.insert(spec.to_string(), id);
    Ok(id)
  }

  /// Resolve a symbol name the way the grammar notation does: an initial
  /// uppercase letter is a nonterminal, anything else (including quoted
  /// literals) is a terminal
  pub fn symbol(&mut self, name: &str) -> Result<Symbol, GrammarError> {
    match name.chars().next() {
      None => Err(GrammarError::new("empty symbol name")),
      Some(c) if c.is_uppercase() => Ok(Symbol::Nonterminal(self.nonterminal_id(name))),
      Some(_) => Ok(Symbol::Terminal(self.terminal_id(name)?)),
    }
  }

  /// Append a production to `nt`. A second empty production for the same
  /// nonterminal is dropped, and the existing one's id returned.
  pub fn add_production(&mut self, nt: NtId, symbols: Vec<Symbol>) -> Result<ProdId, GrammarError> {
    if nt.index() >= self.nonterminals.len() {
      return Err(GrammarError::new(format!("unknown nonterminal id {}", nt.0)));
    }
    for sym in symbols.iter() {
      let known = match sym {
        Symbol::Nonterminal(id) => id.index() < self.nonterminals.len(),
        Symbol::Terminal(id) => id.index() < self.terminals.len(),
      };
      if !known {
        return Err(self.error_at(
          nt,
          format!("production for {} uses an unregistered symbol", self.nonterminal(nt)),
        ));
      }
    }

    if symbols.is_empty() {
      if let Some(existing) = self.by_lhs[nt.index()]
        .iter()
        .find(|p| self.productions[p.index()].is_empty())
      {
        return Ok(*existing);
      }
    }

    for id in symbols.iter().filter_map(Symbol::nonterminal) {
      self.nonterminals[id.index()].referenced = true;
    }

    let id = ProdId(self.productions.len() as u32);
    self.productions.push(Production { id, lhs: nt, symbols });
    self.by_lhs[nt.index()].push(id);
    Ok(id)
  }

  /// Convenience for building grammars in code: `g.add_rule("E", &["E", "\"+\"", "T"])`
  pub fn add_rule(&mut self, lhs: &str, rhs: &[&str]) -> Result<ProdId, GrammarError> {
    let nt = self.define(lhs);
    let symbols = rhs
      .iter()
      .map(|s| self.symbol(s))
      .collect::<Result<Vec<_>, _>>()?;
    self.add_production(nt, symbols)
  }

  pub fn root(&self) -> Option<NtId> {
    self.root
  }

  pub fn nonterminal(&self, id: NtId) -> &Nonterminal {
    &self.nonterminals[id.index()]
  }

  pub fn nonterminals(&self) -> &[Nonterminal] {
    &self.nonterminals
  }

  pub fn find_nonterminal(&self, name: &str) -> Option<NtId> {
    self.nt_index.get(name).copied()
  }

  pub fn terminal(&self, id: TermId) -> &Terminal {
    &self.terminals[id.index()]
  }

  pub fn terminals(&self) -> &[Terminal] {
    &self.terminals
  }

  pub fn find_terminal(&self, spec: &str) -> Option<TermId> {
    self.term_index.get(spec).copied()
  }

  pub fn production(&self, id: ProdId) -> &Production {
    &self.productions[id.index()]
  }

  pub fn productions(&self) -> &[Production] {
    &self.productions
  }

  pub fn productions_of(&self, nt: NtId) -> &[ProdId] {
    &self.by_lhs[nt.index()]
  }

  /// Read-only view of the nonterminal -> productions map, in definition order
  pub fn grammar_map(&self) -> impl Iterator<Item = (&Nonterminal, Vec<&Production>)> + '_ {
    self
      .nonterminals
      .iter()
      .zip(self.by_lhs.iter())
      .map(|(nt, prods)| (nt, prods.iter().map(|p| self.production(*p)).collect()))
  }

  pub fn symbol_name(&self, sym: &Symbol) -> &str {
    match sym {
      Symbol::Nonterminal(nt) => &self.nonterminal(*nt).name,
      Symbol::Terminal(t) => &self.terminal(*t).name,
    }
  }

  /// Right-hand side of a production as text, `0` for epsilon
  pub fn display_production(&self, id: ProdId) -> String {
    let prod = self.production(id);
    if prod.is_empty() {
      return "0".to_string();
    }
    prod
      .symbols
      .iter()
      .map(|s| self.symbol_name(s))
      .collect::<Vec<_>>()
      .join(" ")
  }

  fn error_at(&self, nt: NtId, message: String) -> GrammarError {
    let nt = self.nonterminal(nt);
    GrammarError::at(message, nt.file.as_deref(), nt.line)
  }

  /// Check the grammar is well formed. Runs every check in a fixed order over
  /// nonterminals in definition order, so the same grammar always fails with
  /// the same message. Doesn't modify anything: validating twice is harmless.
  pub fn validate(&self) -> Result<(), GrammarError> {
    let root = self
      .root
      .ok_or_else(|| GrammarError::new("grammar defines no nonterminals"))?;

    for (idx, nt) in self.nonterminals.iter().enumerate() {
      if !nt.referenced && NtId(idx as u32) != root {
        return Err(self.error_at(
          NtId(idx as u32),
          format!("nonterminal {} is never referenced", nt),
        ));
      }
    }

    for (idx, nt) in self.nonterminals.iter().enumerate() {
      if self.by_lhs[idx].is_empty() {
        return Err(self.error_at(
          NtId(idx as u32),
          format!("nonterminal {} has no productions", nt),
        ));
      }
    }

    for (idx, prods) in self.by_lhs.iter().enumerate() {
      if prods.iter().any(|p| self.production(*p).is_self_reference()) {
        return Err(self.error_at(
          NtId(idx as u32),
          format!("nonterminal {} derives itself", self.nonterminals[idx]),
        ));
      }
    }

    let productive = self.find_productive();
    for (idx, nt) in self.nonterminals.iter().enumerate() {
      if !productive.contains(&NtId(idx as u32)) {
        return Err(self.error_at(
          NtId(idx as u32),
          format!("nonterminal {} cannot derive any terminal string", nt),
        ));
      }
    }

    let reachable = self.find_reachable(root);
    for (idx, nt) in self.nonterminals.iter().enumerate() {
      if !reachable.contains(&NtId(idx as u32)) {
        return Err(self.error_at(
          NtId(idx as u32),
          format!("nonterminal {} is unreachable from {}", nt, self.nonterminal(root)),
        ));
      }
    }

    debug!(
      nonterminals = self.nonterminals.len(),
      terminals = self.terminals.len(),
      productions = self.productions.len(),
      "grammar validated"
    );
    Ok(())
  }

  fn production_is_productive(productive: &HashSet<NtId>, prod: &Production) -> bool {
    prod.symbols.iter().all(|s| match s {
      Symbol::Terminal(_) => true,
      Symbol::Nonterminal(nt) => productive.contains(nt),
    })
  }

  /// Fixpoint: a nonterminal is productive once one of its productions consists
  /// only of terminals and productive nonterminals
  fn find_productive(&self) -> HashSet<NtId> {
    let mut productive: HashSet<NtId> = HashSet::new();

    let mut last_length = usize::MAX;
    while last_length != productive.len() {
      last_length = productive.len();
      for p in self.productions.iter() {
        if !productive.contains(&p.lhs) && Self::production_is_productive(&productive, p) {
          productive.insert(p.lhs);
        }
      }
    }

    productive
  }

  fn find_reachable(&self, root: NtId) -> HashSet<NtId> {
    let mut reachable = HashSet::new();
    let mut queue = VecDeque::new();
    reachable.insert(root);
    queue.push_back(root);

    while let Some(nt) = queue.pop_front() {
      for p in self.productions_of(nt) {
        for next in self.production(*p).symbols.iter().filter_map(Symbol::nonterminal) {
          if reachable.insert(next) {
            queue.push_back(next);
          }
        }
      }
    }

    reachable
  }
}

#[cfg(test)]
mod tests {
  use super::*;

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
  fn test_build_and_accessors() {
    let g = arithmetic();
    let e = g.find_nonterminal("E").unwrap();
    assert_eq!(g.root(), Some(e));
    assert_eq!(g.productions_of(e).len(), 2);
    assert_eq!(g.terminals().len(), 3);
    assert_eq!(g.display_production(g.productions_of(e)[0]), "E \"+\" T");
    assert!(g.validate().is_ok());
    // idempotent
    assert!(g.validate().is_ok());
    assert_eq!(g.grammar_map().count(), 3);
  }

  #[test]
  fn test_terminals_are_interned() {
    let mut g = Grammar::new();
    let a = g.terminal_id("no_et").unwrap();
    let b = g.terminal_id("no_et").unwrap();
    assert_eq!(a, b);
    assert_eq!(g.terminals().len(), 1);
  }

  #[test]
  fn test_epsilon_deduplicated() {
    let mut g = Grammar::new();
    let first = g.add_rule("S", &[]).unwrap();
    let second = g.add_rule("S", &[]).unwrap();
    assert_eq!(first, second);
    assert_eq!(g.productions_of(g.root().unwrap()).len(), 1);
  }

  #[test]
  fn test_rejects_unknown_symbol() {
    let mut g = Grammar::new();
    let s = g.define("S");
    assert!(g.add_production(s, vec![Symbol::Terminal(TermId(7))]).is_err());
  }

  #[test]
  fn test_unreferenced() {
    let mut g = arithmetic();
    g.define_at("Q", Some("test.grammar"), Some(12));
    g.add_rule("Q", &["ident"]).unwrap();
    let err = g.validate().unwrap_err();
    assert_eq!(err.message, "nonterminal Q is never referenced");
    assert_eq!(err.file.as_deref(), Some("test.grammar"));
    assert_eq!(err.line, Some(12));
  }

  #[test]
  fn test_no_productions() {
    let mut g = Grammar::new();
    g.add_rule("S", &["A"]).unwrap();
    let err = g.validate().unwrap_err();
    assert_eq!(err.message, "nonterminal A has no productions");
  }

  #[test]
  fn test_self_reference() {
    let mut g = Grammar::new();
    g.add_rule("S", &["x"]).unwrap();
    g.add_rule("S", &["S"]).unwrap();
    let err = g.validate().unwrap_err();
    assert_eq!(err.message, "nonterminal S derives itself");
  }

  #[test]
  fn test_recursion_is_fine() {
    let mut g = Grammar::new();
    g.add_rule("S", &["S", "x"]).unwrap();
    g.add_rule("S", &[]).unwrap();
    assert!(g.validate().is_ok());
  }

  #[test]
  fn test_unproductive() {
    let mut g = Grammar::new();
    g.add_rule("S", &["A"]).unwrap();
    g.add_rule("S", &["x"]).unwrap();
    g.add_rule("A", &["A", "x"]).unwrap();
    let err = g.validate().unwrap_err();
    assert_eq!(err.message, "nonterminal A cannot derive any terminal string");
  }

  #[test]
  fn test_unreachable_is_deterministic() {
    let build = || {
      let mut g = Grammar::new();
      g.add_rule("S", &["x"]).unwrap();
      // B and C reference each other, but nothing reachable references them
      g.add_rule("B", &["C", "y"]).unwrap();
      g.add_rule("C", &["B", "z"]).unwrap();
      g.add_rule("C", &["z"]).unwrap();
      g
    };
    let g = build();
    let first = g.validate().unwrap_err();
    let second = g.validate().unwrap_err();
    assert_eq!(first, second);
    assert_eq!(first.message, "nonterminal B is unreachable from S");
    assert_eq!(build().validate().unwrap_err(), first);
  }

  #[test]
  fn test_empty_grammar() {
    assert!(Grammar::new().validate().is_err());
  }
}
