use std::fmt;

use crate::terminal::{Case, Gender, Terminal};

/// Anything the parser can scan: it only needs to know whether the token fits a
/// terminal, and some text to put in error messages
pub trait Matcher {
  fn matches(&self, terminal: &Terminal) -> bool;

  fn text(&self) -> &str;
}

/// One lexical reading of a word form, as attached by the morphology lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Meaning {
  pub lemma: String,
  pub id: u32,
  /// Word class: `kk`/`kvk`/`hk` for nouns (by gender), `so`, `lo`, `fs`, ...
  pub word_class: String,
  /// Subcategory, e.g. a proper noun type
  pub category: String,
  pub form: String,
  /// Inflection tag such as `NFET` or `GM-FH-NT-3P-ET`; `-` if uninflected
  pub tag: String,
}

impl Meaning {
  pub fn new(lemma: &str, word_class: &str, form: &str, tag: &str) -> Self {
    Self {
      lemma: lemma.to_string(),
      id: 0,
      word_class: word_class.to_string(),
      category: String::new(),
      form: form.to_string(),
      tag: tag.to_string(),
    }
  }

  /// Noun genders all collapse to `no`
  pub fn normalized_class(&self) -> &str {
    match self.word_class.as_str() {
      "kk" | "kvk" | "hk" => "no",
      other => other,
    }
  }

  /// Nouns carry their gender as their word class
  pub fn gender(&self) -> Option<Gender> {
    Gender::from_name(&self.word_class)
  }

  pub fn is_uninflected(&self) -> bool {
    self.tag == "-"
  }
}

/// A possible reading of a person-name token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonName {
  pub name: String,
  pub gender: Option<Gender>,
  pub case: Option<Case>,
}

/// What the tokenizer found, with the data matching needs for each kind
#[derive(Debug, Clone, PartialEq)]
pub enum TokenValue {
  Word(Vec<Meaning>),
  Punctuation,
  Person(Vec<PersonName>),
  Currency {
    iso: String,
    /// Cases the token may stand in; None means any
    cases: Option<Vec<Case>>,
  },
  Amount {
    quantity: f64,
    iso: String,
    cases: Option<Vec<Case>>,
    gender: Option<Gender>,
  },
  Number {
    value: f64,
    cases: Option<Vec<Case>>,
    gender: Option<Gender>,
  },
  Percent {
    value: f64,
    cases: Option<Vec<Case>>,
  },
  Date,
  Ordinal(u32),
}

impl TokenValue {
  /// Kind name, for diagnostics
  pub fn kind(&self) -> &'static str {
    match self {
      Self::Word(_) => "word",
      Self::Punctuation => "punctuation",
      Self::Person(_) => "person",
      Self::Currency { .. } => "currency",
      Self::Amount { .. } => "amount",
      Self::Number { .. } => "number",
      Self::Percent { .. } => "percent",
      Self::Date => "date",
      Self::Ordinal(_) => "ordinal",
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
  pub text: String,
  pub value: TokenValue,
}

impl Token {
  pub fn new(text: &str, value: TokenValue) -> Self {
    Self {
      text: text.to_string(),
      value,
    }
  }

  pub fn word(text: &str, meanings: Vec<Meaning>) -> Self {
    Self::new(text, TokenValue::Word(meanings))
  }

  pub fn punctuation(text: &str) -> Self {
    Self::new(text, TokenValue::Punctuation)
  }

  pub fn kind(&self) -> &'static str {
    self.value.kind()
  }
}

impl fmt::Display for Token {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.text)
  }
}

/// A token that only has a kind and a text, matched with the terminals'
/// base-form predicate. Handy for grammars that aren't about Icelandic at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleToken {
  pub kind: String,
  pub text: String,
}

impl SimpleToken {
  pub fn new(kind: &str, text: &str) -> Self {
    Self {
      kind: kind.to_string(),
      text: text.to_string(),
    }
  }

  /// Parses `kind:text`, or a bare `text` that is its own kind
  pub fn parse(s: &str) -> Self {
    match s.split_once(':') {
      Some((kind, text)) if !kind.is_empty() && !text.is_empty() => Self::new(kind, text),
      _ => Self::new(s, s),
    }
  }

  /// Whitespace separated tokens, see `parse`
  pub fn tokenize(sentence: &str) -> Vec<Self> {
    sentence.split_whitespace().map(Self::parse).collect()
  }
}

impl Matcher for SimpleToken {
  fn matches(&self, terminal: &Terminal) -> bool {
    terminal.matches_base(&self.kind, &self.text)
  }

  fn text(&self) -> &str {
    &self.text
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_simple_token() {
    let toks = SimpleToken::tokenize("ident:x + :");
    assert_eq!(toks[0], SimpleToken::new("ident", "x"));
    assert_eq!(toks[1], SimpleToken::new("+", "+"));
    assert_eq!(toks[2], SimpleToken::new(":", ":"));

    let ident = Terminal::from_spec("ident").unwrap();
    let plus = Terminal::from_spec("\"+\"").unwrap();
    assert!(toks[0].matches(&ident));
    assert!(!toks[0].matches(&plus));
    assert!(toks[1].matches(&plus));
  }

  #[test]
  fn test_meaning_classes() {
    let m = Meaning::new("hestur", "kk", "hestur", "NFET");
    assert_eq!(m.normalized_class(), "no");
    assert_eq!(m.gender(), Some(Gender::Masc));
    let m = Meaning::new("fara", "so", "fer", "GM-FH-NT-3P-ET");
    assert_eq!(m.normalized_class(), "so");
    assert_eq!(m.gender(), None);
    assert!(!m.is_uninflected());
  }

  #[test]
  fn test_token_kind() {
    assert_eq!(Token::punctuation(".").kind(), "punctuation");
    assert_eq!(Token::word("hestur", Vec::new()).kind(), "word");
    assert_eq!(Token::new("3.", TokenValue::Ordinal(3)).kind(), "ordinal");
  }
}
