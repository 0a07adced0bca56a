//! Shared packed parse forest storage.
//!
//! Every node built during one parse lives in that parse's `NodeArena` and is
//! referred to by `NodeIdx`. Nodes never own each other: a node reachable from
//! several parents is just an index stored in several families, and the whole
//! forest goes away with the arena.

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::grammar::Grammar;
use crate::rules::{NtId, ProdId, TermId};

/// Index type for the node arena
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIdx(pub u32);

/// What a node stands for. Together with its span this is the node's identity.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Label {
  /// A completed nonterminal
  Nonterminal(NtId),
  /// A production in progress, with `dot` symbols recognized. These are the
  /// binarization nodes of the forest and are skipped when reading trees off it.
  Partial { nt: NtId, prod: ProdId, dot: usize },
  /// The token at `index`, scanned as `terminal`
  Token { terminal: TermId, index: usize },
}

/// Key for hash-consing nodes: label and span
pub type NodeKey = (Label, usize, usize);

/// Column-scoped node cache, so there's only ever one node per label and span
pub type NodeCache = HashMap<NodeKey, NodeIdx>;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Children {
  /// Derived by an empty production
  Empty,
  Single(NodeIdx),
  /// Left is the partial node for the symbols before, right the latest symbol
  Pair(NodeIdx, NodeIdx),
}

/// One way of deriving a node
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Family {
  pub prod: ProdId,
  pub children: Children,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
  pub label: Label,
  pub start: usize,
  pub end: usize,
  families: Vec<Family>,
}

impl Node {
  pub fn span(&self) -> (usize, usize) {
    (self.start, self.end)
  }

  pub fn families(&self) -> &[Family] {
    &self.families
  }

  /// More than one family: a genuine branch point in the forest
  pub fn is_ambiguous(&self) -> bool {
    self.families.len() > 1
  }

  /// Partial nodes don't correspond to anything in a concrete tree
  pub fn is_transparent(&self) -> bool {
    matches!(self.label, Label::Partial { .. })
  }

  pub fn is_token(&self) -> bool {
    matches!(self.label, Label::Token { .. })
  }

  pub fn nonterminal(&self) -> Option<NtId> {
    match self.label {
      Label::Nonterminal(nt) | Label::Partial { nt, .. } => Some(nt),
      Label::Token { .. } => None,
    }
  }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct NodeArena {
  nodes: Vec<Node>,
}

impl NodeArena {
  pub fn new() -> Self {
    Default::default()
  }

  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }

  fn alloc(&mut self, label: Label, start: usize, end: usize) -> NodeIdx {
    let idx = self.nodes.len() as u32;
    self.nodes.push(Node {
      label,
      start,
      end,
      families: Vec::new(),
    });
    NodeIdx(idx)
  }

  /// The node for `label` over `start..end`, reusing it if the cache has one
  pub fn node_for(&mut self, cache: &mut NodeCache, label: Label, start: usize, end: usize) -> NodeIdx {
    if let Some(idx) = cache.get(&(label, start, end)) {
      return *idx;
    }
    let idx = self.alloc(label, start, end);
    cache.insert((label, start, end), idx);
    idx
  }

  /// Add a family unless the node already has an identical one
  pub fn add_family(&mut self, idx: NodeIdx, family: Family) {
    let node = self.get_mut(idx);
    if !node.families.contains(&family) {
      node.families.push(family);
    }
  }

  /// Get an idx. Assumes valid, panics on OOB
  pub fn get(&self, idx: NodeIdx) -> &Node {
    self.nodes.get(idx.0 as usize).expect("Invalid NodeIdx")
  }

  fn get_mut(&mut self, idx: NodeIdx) -> &mut Node {
    self.nodes.get_mut(idx.0 as usize).expect("Invalid NodeIdx")
  }

  pub fn iter(&self) -> impl Iterator<Item = (NodeIdx, &Node)> {
    self
      .nodes
      .iter()
      .enumerate()
      .map(|(idx, node)| (NodeIdx(idx as u32), node))
  }

  pub fn display<'a>(&'a self, grammar: &'a Grammar, idx: NodeIdx) -> NodeDisplay<'a> {
    NodeDisplay {
      arena: self,
      grammar,
      idx,
    }
  }

  pub fn label_string(&self, grammar: &Grammar, idx: NodeIdx) -> String {
    match self.get(idx).label {
      Label::Nonterminal(nt) => grammar.nonterminal(nt).name.clone(),
      Label::Token { terminal, .. } => grammar.terminal(terminal).name.clone(),
      Label::Partial { nt, prod, dot } => {
        let p = grammar.production(prod);
        let mut s = format!("{} ->", grammar.nonterminal(nt));
        for (i, sym) in p.symbols.iter().enumerate() {
          if i == dot {
            s.push_str(" ・");
          }
          s.push(' ');
          s.push_str(grammar.symbol_name(sym));
        }
        if dot >= p.len() {
          s.push_str(" ・");
        }
        s
      }
    }
  }
}

/// Helper struct for printing the forest under a node
#[derive(Clone)]
pub struct NodeDisplay<'a> {
  pub arena: &'a NodeArena,
  pub grammar: &'a Grammar,
  pub idx: NodeIdx,
}

impl fmt::Display for NodeDisplay<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut path = HashSet::new();
    format_node(self, self.idx, 0, &mut path, f)
  }
}

// for fmt::Display impl
fn format_node(
  nd: &NodeDisplay,
  idx: NodeIdx,
  indent: usize,
  path: &mut HashSet<NodeIdx>,
  f: &mut fmt::Formatter<'_>,
) -> fmt::Result {
  let node = nd.arena.get(idx);

  if !path.insert(idx) {
    return writeln!(f, "{:indent$}(cycle)", "", indent = indent);
  }

  let child_indent = if node.is_transparent() {
    indent
  } else {
    writeln!(
      f,
      "{:indent$}{} {}..{}",
      "",
      nd.arena.label_string(nd.grammar, idx),
      node.start,
      node.end,
      indent = indent
    )?;
    indent + 2
  };

  if node.is_ambiguous() {
    for (k, family) in node.families.iter().enumerate() {
      writeln!(f, "{:indent$}Option {}:", "", k + 1, indent = child_indent)?;
      format_family(nd, family, child_indent + 2, path, f)?;
    }
  } else if let Some(family) = node.families.first() {
    format_family(nd, family, child_indent, path, f)?;
  }

  path.remove(&idx);
  Ok(())
}

fn format_family(
  nd: &NodeDisplay,
  family: &Family,
  indent: usize,
  path: &mut HashSet<NodeIdx>,
  f: &mut fmt::Formatter<'_>,
) -> fmt::Result {
  match family.children {
    Children::Empty => writeln!(f, "{:indent$}(empty)", "", indent = indent),
    Children::Single(child) => format_node(nd, child, indent, path, f),
    Children::Pair(left, right) => {
      format_node(nd, left, indent, path, f)?;
      format_node(nd, right, indent, path, f)
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_node_cache_dedups() {
    let mut arena = NodeArena::new();
    let mut cache = NodeCache::new();
    let a = arena.node_for(&mut cache, Label::Nonterminal(NtId(0)), 0, 1);
    let b = arena.node_for(&mut cache, Label::Nonterminal(NtId(0)), 0, 1);
    let c = arena.node_for(&mut cache, Label::Nonterminal(NtId(0)), 0, 2);
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(arena.len(), 2);

    cache.clear();
    let d = arena.node_for(&mut cache, Label::Nonterminal(NtId(0)), 0, 1);
    assert_ne!(a, d);
  }

  #[test]
  fn test_families() {
    let mut arena = NodeArena::new();
    let mut cache = NodeCache::new();
    let leaf = arena.node_for(
      &mut cache,
      Label::Token {
        terminal: TermId(0),
        index: 0,
      },
      0,
      1,
    );
    let parent = arena.node_for(&mut cache, Label::Nonterminal(NtId(0)), 0, 1);
    let fam = Family {
      prod: ProdId(0),
      children: Children::Single(leaf),
    };
    arena.add_family(parent, fam);
    arena.add_family(parent, fam);
    assert_eq!(arena.get(parent).families().len(), 1);
    assert!(!arena.get(parent).is_ambiguous());
    arena.add_family(
      parent,
      Family {
        prod: ProdId(1),
        children: Children::Single(leaf),
      },
    );
    assert!(arena.get(parent).is_ambiguous());
    assert!(arena.get(leaf).is_token());
    assert_eq!(arena.get(parent).nonterminal(), Some(NtId(0)));
  }

  #[test]
  fn test_display() {
    let mut g = Grammar::new();
    g.add_rule("S", &["x"]).unwrap();
    g.add_rule("S", &[]).unwrap();
    let s = g.root().unwrap();
    let x = g.find_terminal("x").unwrap();
    let prods = g.productions_of(s).to_vec();

    let mut arena = NodeArena::new();
    let mut cache = NodeCache::new();
    let leaf = arena.node_for(&mut cache, Label::Token { terminal: x, index: 0 }, 0, 1);
    let root = arena.node_for(&mut cache, Label::Nonterminal(s), 0, 1);
    arena.add_family(
      root,
      Family {
        prod: prods[0],
        children: Children::Single(leaf),
      },
    );
    arena.add_family(
      root,
      Family {
        prod: prods[1],
        children: Children::Empty,
      },
    );

    assert_eq!(
      arena.display(&g, root).to_string(),
      "S 0..1\n  Option 1:\n    x 0..1\n  Option 2:\n    (empty)\n"
    );
  }
}
