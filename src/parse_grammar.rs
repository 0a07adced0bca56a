//! Loader for the line-oriented grammar notation:
//!
//! ```text
//! # comments run to the end of the line, unless inside quotes
//! S -> NP VP "."
//! NP -> no_nf | person_nf
//! VP -> so_0
//!     | so_1_þf NP
//!     | 'vera:so' Adv? lo_nf
//! Adv -> ao
//! ```
//!
//! A name starting with an uppercase letter is a nonterminal, anything else a
//! terminal. `0` alone is the empty production. A `?`, `*` or `+` after a symbol
//! stands for a synthesized nonterminal (`X?`, `X*`, `X+`) matching zero or one,
//! any number, or at least one `X`.

use std::fs;
use std::str::FromStr;

use regex::Regex;
use tracing::debug;

use crate::error::GrammarError;
use crate::grammar::Grammar;
use crate::rules::{NtId, Symbol};

/// helper macro for initializing a regex with lazy_static!
macro_rules! regex_static {
  ($name:ident, $pattern:expr) => {
    lazy_static! {
      static ref $name: Regex = Regex::new($pattern).unwrap();
    }
  };
}

type Infallible<'a, T> = (T, &'a str);
type ParseResult<'a, T> = Result<(T, &'a str), String>;

/// A symbol as written, before it's resolved against the grammar
type RawSymbol<'a> = (&'a str, Option<char>);

/// Try to consume a regex at the start of `s`, returning None if it doesn't match there
fn optional_re<'a>(re: &'static Regex, s: &'a str) -> Infallible<'a, Option<&'a str>> {
  match re.find(s) {
    Some(m) if m.start() == 0 => (Some(m.as_str()), &s[m.end()..]),
    _ => (None, s),
  }
}

/// Try to consume a regex, failing if it doesn't match
fn needed_re<'a>(re: &'static Regex, s: &'a str, what: &str) -> ParseResult<'a, &'a str> {
  match optional_re(re, s) {
    (Some(m), rest) => Ok((m, rest)),
    (None, _) => Err(format!("expected {} at {:?}", what, s)),
  }
}

/// Try to consume a char, returning None if it doesn't match
fn optional_char(c: char, s: &str) -> Infallible<'_, Option<char>> {
  match s.strip_prefix(c) {
    Some(rest) => (Some(c), rest),
    None => (None, s),
  }
}

/// Cut a line at the first `#` that isn't inside a quoted literal
fn strip_comment(line: &str) -> &str {
  let mut quote = None;
  for (idx, c) in line.char_indices() {
    match (quote, c) {
      (None, '#') => return &line[..idx],
      (None, '"' | '\'') => quote = Some(c),
      (Some(q), _) if q == c => quote = None,
      _ => {}
    }
  }
  line
}

/// A quoted literal or a bare name, with an optional repetition suffix
fn parse_symbol(s: &str) -> ParseResult<'_, RawSymbol<'_>> {
  regex_static!(QUOTED, r#"("[^"]+"|'[^']+')"#);
  regex_static!(NAME, r"[\p{L}\p{N}_\-]+");

  let (name, s) = match optional_re(&*QUOTED, s) {
    (Some(quoted), rest) => (quoted, rest),
    (None, _) => needed_re(&*NAME, s, "a symbol")?,
  };
  let (repeat, s) = match s.chars().next() {
    Some(c @ ('?' | '*' | '+')) => (Some(c), &s[1..]),
    _ => (None, s),
  };
  Ok(((name, repeat), s))
}

/// Symbols up to the next `|` or the end of the line
fn parse_alternative(s: &str) -> ParseResult<'_, Vec<RawSymbol<'_>>> {
  let mut symbols = Vec::new();
  let mut rem = s;
  loop {
    rem = rem.trim_start();
    if rem.is_empty() || rem.starts_with('|') {
      return Ok((symbols, rem));
    }
    let (symbol, s) = parse_symbol(rem)?;
    symbols.push(symbol);
    rem = s;
  }
}

fn parse_alternatives(s: &str) -> Result<Vec<Vec<RawSymbol<'_>>>, String> {
  let mut alternatives = Vec::new();
  let mut rem = s;
  loop {
    let (alt, s) = parse_alternative(rem)?;
    if alt.is_empty() {
      return Err("empty alternative, write 0 for an empty production".to_string());
    }
    alternatives.push(alt);
    match optional_char('|', s) {
      (Some(_), s) => rem = s,
      (None, _) => return Ok(alternatives),
    }
  }
}

/// Builds a grammar one source line at a time
struct Loader<'f> {
  grammar: Grammar,
  file: Option<&'f str>,
  /// Rule that `|` continuation lines add to
  current: Option<NtId>,
}

impl<'f> Loader<'f> {
  fn new(file: Option<&'f str>) -> Self {
    Self {
      grammar: Grammar::new(),
      file,
      current: None,
    }
  }

  fn error(&self, message: impl Into<String>, line: usize) -> GrammarError {
    GrammarError::at(message, self.file, Some(line))
  }

  fn line(&mut self, line_no: usize, raw: &str) -> Result<(), GrammarError> {
    regex_static!(HEAD, r"^(\p{Lu}[\p{L}\p{N}_\-]*)\s*->");

    let line = strip_comment(raw).trim();
    if line.is_empty() {
      return Ok(());
    }

    let (nt, rhs) = if let (Some(_), rhs) = optional_char('|', line) {
      match self.current {
        Some(nt) => (nt, rhs),
        None => return Err(self.error("continuation line outside of a rule", line_no)),
      }
    } else if let Some(caps) = HEAD.captures(line) {
      let name = &caps[1];
      let already = self
        .grammar
        .find_nonterminal(name)
        .filter(|id| self.grammar.nonterminal(*id).defined);
      if let Some(id) = already {
        let prev = self.grammar.nonterminal(id).line;
        return Err(self.error(
          match prev {
            Some(prev) => format!("nonterminal {} is already defined on line {}", name, prev),
            None => format!("nonterminal {} is already defined", name),
          },
          line_no,
        ));
      }
      let nt = self.grammar.define_at(name, self.file, Some(line_no));
      self.current = Some(nt);
      (nt, &line[caps[0].len()..])
    } else {
      return Err(self.error(format!("expected `Name ->` or `|` at {:?}", line), line_no));
    };

    // a header may leave all its alternatives to continuation lines
    if rhs.trim().is_empty() {
      return Ok(());
    }

    let alternatives = parse_alternatives(rhs).map_err(|e| self.error(e, line_no))?;
    for alt in alternatives {
      self.add_alternative(nt, &alt, line_no)?;
    }
    Ok(())
  }

  fn add_alternative(&mut self, nt: NtId, alt: &[RawSymbol], line_no: usize) -> Result<(), GrammarError> {
    if let [("0", None)] = alt {
      self.grammar.add_production(nt, Vec::new())?;
      return Ok(());
    }

    let mut symbols = Vec::with_capacity(alt.len());
    for (name, repeat) in alt.iter() {
      if *name == "0" {
        return Err(self.error("0 marks an empty production and must stand alone", line_no));
      }
      let symbol = match repeat {
        None => self.resolve(name, line_no)?,
        Some(op) => Symbol::Nonterminal(self.repeated(name, *op, line_no)?),
      };
      symbols.push(symbol);
    }
    self
      .grammar
      .add_production(nt, symbols)
      .map_err(|e| self.error(e.message, line_no))?;
    Ok(())
  }

  fn resolve(&mut self, name: &str, line_no: usize) -> Result<Symbol, GrammarError> {
    self
      .grammar
      .symbol(name)
      .map_err(|e| GrammarError::at(e.message, self.file, Some(line_no)))
  }

  /// The synthesized nonterminal for `name` followed by `op`, created on first use
  fn repeated(&mut self, name: &str, op: char, line_no: usize) -> Result<NtId, GrammarError> {
    let rep_name = format!("{}{}", name, op);
    if let Some(id) = self.grammar.find_nonterminal(&rep_name) {
      return Ok(id);
    }

    let base = self.resolve(name, line_no)?;
    let id = self.grammar.define_at(&rep_name, self.file, Some(line_no));
    let rep = Symbol::Nonterminal(id);
    let (first, second) = match op {
      '?' => (vec![base], Vec::new()),
      '*' => (vec![rep, base], Vec::new()),
      _ => (vec![rep, base], vec![base]),
    };
    self.grammar.add_production(id, first)?;
    self.grammar.add_production(id, second)?;
    Ok(id)
  }
}

/// Load a grammar from source text and validate it
fn load(src: &str, file: Option<&str>) -> Result<Grammar, GrammarError> {
  let mut loader = Loader::new(file);
  for (idx, line) in src.lines().enumerate() {
    loader.line(idx + 1, line)?;
  }

  let grammar = loader.grammar;
  grammar.validate()?;
  debug!(
    file = file.unwrap_or("<string>"),
    nonterminals = grammar.nonterminals().len(),
    productions = grammar.productions().len(),
    "grammar loaded"
  );
  Ok(grammar)
}

impl FromStr for Grammar {
  type Err = GrammarError;

  /// Parses and validates a grammar. The first rule's nonterminal is the root.
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    load(s, None)
  }
}

impl Grammar {
  pub fn read_from_file(filename: &str) -> Result<Self, GrammarError> {
    let src = fs::read_to_string(filename)
      .map_err(|e| GrammarError::at(format!("couldn't read grammar: {}", e), Some(filename), None))?;
    load(&src, Some(filename))
  }
}
