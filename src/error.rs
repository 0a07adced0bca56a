use thiserror::Error;

/// Everything that can go wrong while building, loading or validating a grammar
/// (or the lexicon that goes with it). Always fatal: a grammar that produced one
/// of these never reaches the parser.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}{message}", location_prefix(.file, .line))]
pub struct GrammarError {
  pub message: String,
  pub file: Option<String>,
  pub line: Option<usize>,
}

fn location_prefix(file: &Option<String>, line: &Option<usize>) -> String {
  match (file, line) {
    (Some(file), Some(line)) => format!("{}:{}: ", file, line),
    (Some(file), None) => format!("{}: ", file),
    (None, Some(line)) => format!("line {}: ", line),
    (None, None) => String::new(),
  }
}

impl GrammarError {
  pub fn new(message: impl Into<String>) -> Self {
    Self {
      message: message.into(),
      file: None,
      line: None,
    }
  }

  pub fn at(message: impl Into<String>, file: Option<&str>, line: Option<usize>) -> Self {
    Self {
      message: message.into(),
      file: file.map(str::to_owned),
      line,
    }
  }

  /// Fill in the file name if the error doesn't carry one yet
  pub fn in_file(mut self, file: &str) -> Self {
    if self.file.is_none() {
      self.file = Some(file.to_owned());
    }
    self
  }
}

/// Outcome of a failed parse. None of these are retried: ambiguity lives inside
/// the forest, so a failure means the whole sentence is unparsable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
  /// A column ended up empty: no item survived the token at `index` (1-based)
  #[error("no parse available at token {index} ({text:?})")]
  DeadEnd { index: usize, text: String },
  /// All tokens were consumed but nothing spans the input from the root
  #[error("no parse available")]
  NoParse,
  /// The parse was abandoned after creating more items than the configured budget
  #[error("parse abandoned at token {index}: {items} items exceeds budget")]
  TooComplex { index: usize, items: usize },
}

impl ParseError {
  /// 1-based index of the token the parser choked on, if there is one
  pub fn token_index(&self) -> Option<usize> {
    match self {
      Self::DeadEnd { index, .. } | Self::TooComplex { index, .. } => Some(*index),
      Self::NoParse => None,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_grammar_error_display() {
    assert_eq!(GrammarError::new("bad").to_string(), "bad");
    assert_eq!(
      GrammarError::at("bad", Some("g.grammar"), Some(3)).to_string(),
      "g.grammar:3: bad"
    );
    assert_eq!(
      GrammarError::at("bad", None, Some(3)).in_file("x").to_string(),
      "x:3: bad"
    );
  }

  #[test]
  fn test_parse_error_display() {
    let e = ParseError::DeadEnd {
      index: 2,
      text: "foo".to_string(),
    };
    assert_eq!(e.to_string(), "no parse available at token 2 (\"foo\")");
    assert_eq!(e.token_index(), Some(2));
    assert_eq!(ParseError::NoParse.token_index(), None);
  }
}
