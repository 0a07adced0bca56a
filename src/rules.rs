use std::fmt;

/// Index of a nonterminal in its grammar
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NtId(pub u32);

/// Index of an interned terminal in its grammar
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TermId(pub u32);

/// Index of a production in its grammar's production arena. This is the
/// production's identity: two textually identical right-hand sides in different
/// rules are still different productions.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProdId(pub u32);

impl NtId {
  pub fn index(self) -> usize {
    self.0 as usize
  }
}

impl TermId {
  pub fn index(self) -> usize {
    self.0 as usize
  }
}

impl ProdId {
  pub fn index(self) -> usize {
    self.0 as usize
  }
}

/// A grammar symbol on the right-hand side of a production
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Symbol {
  Terminal(TermId),
  Nonterminal(NtId),
}

impl Symbol {
  pub fn nonterminal(&self) -> Option<NtId> {
    match self {
      Self::Nonterminal(nt) => Some(*nt),
      Self::Terminal(_) => None,
    }
  }

  pub fn terminal(&self) -> Option<TermId> {
    match self {
      Self::Terminal(t) => Some(*t),
      Self::Nonterminal(_) => None,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nonterminal {
  pub name: String,
  /// Where the nonterminal was defined, for diagnostics only
  pub file: Option<String>,
  pub line: Option<usize>,
  /// Set once the nonterminal shows up on some right-hand side
  pub referenced: bool,
  /// Set by `Grammar::define`, as opposed to only being referenced so far
  pub defined: bool,
}

impl Nonterminal {
  pub fn new(name: String) -> Self {
    Self {
      name,
      file: None,
      line: None,
      referenced: false,
      defined: false,
    }
  }
}

impl fmt::Display for Nonterminal {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.name)
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Production {
  pub id: ProdId,
  pub lhs: NtId,
  pub symbols: Vec<Symbol>,
}

impl Production {
  pub fn len(&self) -> usize {
    self.symbols.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn get(&self, dot: usize) -> Option<&Symbol> {
    self.symbols.get(dot)
  }

  /// A production like `A -> A`, which derives nothing but itself
  pub fn is_self_reference(&self) -> bool {
    self.symbols.len() == 1 && self.symbols[0] == Symbol::Nonterminal(self.lhs)
  }
}
