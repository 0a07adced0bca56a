//! The result of a successful parse, and ways of reading trees off it.

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::grammar::Grammar;
use crate::sppf::{Children, Label, Node, NodeArena, NodeIdx};
#[cfg(test)]
use crate::sppf::Family;
use crate::syntree::{Constituent, SynTree, Word};
use crate::utils::combinations;

/// Branches are valued by nonterminal name, leaves by terminal name
pub type ParseTree = SynTree<String, String>;

/// All parses of a sentence, packed. Owns every node the parse built; the
/// grammar is borrowed for names.
#[derive(Debug, Clone)]
pub struct Forest<'g> {
  grammar: &'g Grammar,
  arena: NodeArena,
  root: NodeIdx,
}

impl<'g> Forest<'g> {
  pub fn new(grammar: &'g Grammar, arena: NodeArena, root: NodeIdx) -> Self {
    Self {
      grammar,
      arena,
      root,
    }
  }

  pub fn grammar(&self) -> &'g Grammar {
    self.grammar
  }

  pub fn arena(&self) -> &NodeArena {
    &self.arena
  }

  pub fn root(&self) -> NodeIdx {
    self.root
  }

  pub fn root_node(&self) -> &Node {
    self.arena.get(self.root)
  }

  pub fn get(&self, idx: NodeIdx) -> &Node {
    self.arena.get(idx)
  }

  /// Number of distinct trees in the forest. Derivations that can only be
  /// finished by going around a cycle of the forest aren't counted.
  pub fn num_combinations(&self) -> u64 {
    let mut memo = HashMap::new();
    let mut path = HashSet::new();
    self.count(self.root, &mut memo, &mut path).0
  }

  pub fn is_ambiguous(&self) -> bool {
    self.num_combinations() > 1
  }

  /// Count for one node, and whether a cycle was cut somewhere below it. A
  /// count taken under a cut depends on the path, so it isn't memoized.
  fn count(&self, idx: NodeIdx, memo: &mut HashMap<NodeIdx, u64>, path: &mut HashSet<NodeIdx>) -> (u64, bool) {
    if let Some(n) = memo.get(&idx) {
      return (*n, false);
    }
    let node = self.arena.get(idx);
    if node.is_token() {
      return (1, false);
    }
    if !path.insert(idx) {
      return (0, true);
    }

    let mut total: u64 = 0;
    let mut cut = false;
    for family in node.families() {
      let n = match family.children {
        Children::Empty => 1,
        Children::Single(child) => {
          let (n, c) = self.count(child, memo, path);
          cut |= c;
          n
        }
        Children::Pair(left, right) => {
          let (l, lc) = self.count(left, memo, path);
          cut |= lc;
          match l {
            0 => 0,
            _ => {
              let (r, rc) = self.count(right, memo, path);
              cut |= rc;
              l.saturating_mul(r)
            }
          }
        }
      };
      total = total.saturating_add(n);
    }

    path.remove(&idx);
    if !cut {
      memo.insert(idx, total);
    }
    (total, cut)
  }

  /// Every tree in the forest, in a stable order. This is exponential in the
  /// worst case; check `num_combinations` first on ambiguous input.
  pub fn trees(&self) -> Vec<ParseTree> {
    let mut path = HashSet::new();
    self.node_trees(self.root, &mut path)
  }

  fn node_trees(&self, idx: NodeIdx, path: &mut HashSet<NodeIdx>) -> Vec<ParseTree> {
    let node = self.arena.get(idx);
    match node.label {
      Label::Token { terminal, .. } => vec![SynTree::Leaf(Word {
        value: self.grammar.terminal(terminal).name.clone(),
        span: node.span(),
      })],
      Label::Nonterminal(nt) => {
        let name = &self.grammar.nonterminal(nt).name;
        self
          .child_sequences(idx, path)
          .into_iter()
          .map(|children| {
            SynTree::Branch(
              Constituent {
                value: name.clone(),
                span: node.span(),
              },
              children,
            )
          })
          .collect()
      }
      // only reachable when the root itself is partial, which the parser never returns
      Label::Partial { .. } => Vec::new(),
    }
  }

  /// The possible child lists of a node, one per derivation. Partial nodes
  /// contribute their children in place.
  fn child_sequences(&self, idx: NodeIdx, path: &mut HashSet<NodeIdx>) -> Vec<Vec<ParseTree>> {
    if !path.insert(idx) {
      return Vec::new();
    }

    let mut out = Vec::new();
    for family in self.arena.get(idx).families() {
      match family.children {
        Children::Empty => out.push(Vec::new()),
        Children::Single(child) => out.extend(self.sequences(child, path)),
        Children::Pair(left, right) => {
          let sides = [self.sequences(left, path), self.sequences(right, path)];
          out.extend(combinations(&sides).into_iter().map(|pair| pair.concat()));
        }
      }
    }

    path.remove(&idx);
    out
  }

  fn sequences(&self, idx: NodeIdx, path: &mut HashSet<NodeIdx>) -> Vec<Vec<ParseTree>> {
    if self.arena.get(idx).is_transparent() {
      self.child_sequences(idx, path)
    } else {
      self
        .node_trees(idx, path)
        .into_iter()
        .map(|t| vec![t])
        .collect()
    }
  }
}

#[cfg(test)]
impl Forest<'_> {
  /// Panics unless every family in the arena is a step of its production:
  /// the children, with partial nodes spliced in, spell out the production's
  /// right-hand side (up to the dot) over contiguous spans.
  pub(crate) fn assert_licensed(&self) {
    for (idx, node) in self.arena.iter() {
      for family in node.families() {
        let prod = self.grammar.production(family.prod);
        let (nt, dot) = match node.label {
          Label::Nonterminal(nt) => (nt, prod.len()),
          Label::Partial { nt, prod: p, dot } => {
            assert_eq!(p, family.prod, "partial {:?} packs another production", idx);
            (nt, dot)
          }
          Label::Token { .. } => panic!("token {:?} has a family", idx),
        };
        assert_eq!(prod.lhs, nt, "{:?} derived by a production of another nonterminal", idx);

        for children in self.spliced(family) {
          assert_eq!(children.len(), dot, "{:?} has the wrong number of children", idx);
          let mut at = node.start;
          for (child, symbol) in children.iter().zip(prod.symbols.iter()) {
            let c = self.arena.get(*child);
            match c.label {
              Label::Token { terminal, index } => {
                assert_eq!(symbol.terminal(), Some(terminal), "{:?} scanned under the wrong terminal", child);
                assert_eq!(c.span(), (index, index + 1));
              }
              Label::Nonterminal(child_nt) => {
                assert_eq!(symbol.nonterminal(), Some(child_nt), "{:?} is the wrong nonterminal", child)
              }
              Label::Partial { .. } => panic!("partial {:?} left after splicing", child),
            }
            assert_eq!(c.start, at, "gap or overlap before {:?}", child);
            at = c.end;
          }
          assert_eq!(at, node.end, "children of {:?} don't reach its end", idx);
        }
      }
    }
  }

  /// Child lists of one family, partial nodes replaced by their own children
  fn spliced(&self, family: &Family) -> Vec<Vec<NodeIdx>> {
    match family.children {
      Children::Empty => vec![Vec::new()],
      Children::Single(child) => self.splice(child),
      Children::Pair(left, right) => {
        let sides = [self.splice(left), self.splice(right)];
        combinations(&sides).into_iter().map(|pair| pair.concat()).collect()
      }
    }
  }

  fn splice(&self, idx: NodeIdx) -> Vec<Vec<NodeIdx>> {
    let node = self.arena.get(idx);
    if node.is_transparent() {
      node.families().iter().flat_map(|f| self.spliced(f)).collect()
    } else {
      vec![vec![idx]]
    }
  }
}

impl fmt::Display for Forest<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.arena.display(self.grammar, self.root))
  }
}
