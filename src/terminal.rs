//! Terminals and their variants.
//!
//! A category terminal is written `cat_v1_v2...`, e.g. `no_et_kk_nf` is a noun
//! (`no`) in the singular (`et`), masculine (`kk`), nominative (`nf`). The
//! variants are parsed once, when the terminal is interned, so matching never
//! has to look at the terminal's name again.
//!
//! A literal terminal is quoted: `"og"` matches the surface form, `'vera:so'`
//! matches any meaning with lemma `vera` and word class `so`.

use std::fmt;
use std::str::FromStr;

use crate::error::GrammarError;

/// Grammatical case
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Case {
  Nom,
  Acc,
  Dat,
  Gen,
}

impl Case {
  pub const ALL: [Case; 4] = [Case::Nom, Case::Acc, Case::Dat, Case::Gen];

  /// Name as used in terminal variants and config files
  pub fn name(self) -> &'static str {
    match self {
      Self::Nom => "nf",
      Self::Acc => "þf",
      Self::Dat => "þgf",
      Self::Gen => "ef",
    }
  }

  /// Fragment marking this case in an inflection tag
  pub fn tag(self) -> &'static str {
    match self {
      Self::Nom => "NF",
      Self::Acc => "ÞF",
      Self::Dat => "ÞGF",
      Self::Gen => "EF",
    }
  }
}

impl FromStr for Case {
  type Err = GrammarError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::ALL
      .iter()
      .copied()
      .find(|c| c.name() == s)
      .ok_or_else(|| GrammarError::new(format!("unknown case {:?}", s)))
  }
}

impl fmt::Display for Case {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.name())
  }
}

/// Grammatical gender. Nouns carry their gender as their word class.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Gender {
  Masc,
  Fem,
  Neut,
}

impl Gender {
  pub const ALL: [Gender; 3] = [Gender::Masc, Gender::Fem, Gender::Neut];

  pub fn name(self) -> &'static str {
    match self {
      Self::Masc => "kk",
      Self::Fem => "kvk",
      Self::Neut => "hk",
    }
  }

  pub fn tag(self) -> &'static str {
    match self {
      Self::Masc => "KK",
      Self::Fem => "KVK",
      Self::Neut => "HK",
    }
  }

  pub fn from_name(s: &str) -> Option<Self> {
    Self::ALL.iter().copied().find(|g| g.name() == s)
  }
}

impl fmt::Display for Gender {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.name())
  }
}

/// One `_`-separated variant of a category terminal
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Variant {
  Case(Case),
  Gender(Gender),
  Singular,
  Plural,
  /// `p1`, `p2`, `p3`
  Person(u8),
  /// A leading `0`, `1` or `2` on a verb terminal: how many objects it takes
  ArgCount(u8),
  Infinitive,
  Subjunctive,
  Indicative,
  Imperative,
  PresentParticiple,
  PastParticiple,
  Supine,
  Present,
  Past,
  Active,
  Mediopassive,
  Strong,
  Weak,
  Article,
  /// Uninflected abbreviation
  Abbrev,
  /// Verb with a non-nominative subject
  Subj,
  /// Anything else; matched as its uppercased self inside the inflection tag
  Other { name: String, tag: String },
}

impl Variant {
  pub fn parse(s: &str) -> Self {
    if let Ok(case) = s.parse::<Case>() {
      return Self::Case(case);
    }
    if let Some(gender) = Gender::from_name(s) {
      return Self::Gender(gender);
    }
    match s {
      "et" => Self::Singular,
      "ft" => Self::Plural,
      "p1" => Self::Person(1),
      "p2" => Self::Person(2),
      "p3" => Self::Person(3),
      "0" => Self::ArgCount(0),
      "1" => Self::ArgCount(1),
      "2" => Self::ArgCount(2),
      "nh" => Self::Infinitive,
      "vh" => Self::Subjunctive,
      "fh" => Self::Indicative,
      "bh" => Self::Imperative,
      "lh" => Self::PresentParticiple,
      "lhþt" => Self::PastParticiple,
      "sagnb" => Self::Supine,
      "nt" => Self::Present,
      "þt" => Self::Past,
      "gm" => Self::Active,
      "mm" => Self::Mediopassive,
      "sb" => Self::Strong,
      "vb" => Self::Weak,
      "gr" => Self::Article,
      "abbrev" => Self::Abbrev,
      "subj" => Self::Subj,
      other => Self::Other {
        name: other.to_string(),
        tag: other.to_uppercase(),
      },
    }
  }

  /// Fragment that must occur in an inflection tag for this variant to agree,
  /// or None for variants that aren't expressed in the tag
  pub fn tag(&self) -> Option<&str> {
    match self {
      Self::Case(c) => Some(c.tag()),
      Self::Gender(g) => Some(g.tag()),
      Self::Singular => Some("ET"),
      Self::Plural => Some("FT"),
      Self::Person(1) => Some("1P"),
      Self::Person(2) => Some("2P"),
      Self::Person(_) => Some("3P"),
      Self::Infinitive => Some("NH"),
      Self::Subjunctive => Some("VH"),
      Self::Indicative => Some("FH"),
      Self::Imperative => Some("BH"),
      Self::PresentParticiple => Some("LH"),
      Self::PastParticiple => Some("LHÞT"),
      Self::Supine => Some("SAGNB"),
      Self::Present => Some("NT"),
      Self::Past => Some("ÞT"),
      Self::Active => Some("GM"),
      Self::Mediopassive => Some("MM"),
      Self::Strong => Some("SB"),
      Self::Weak => Some("VB"),
      Self::Article => Some("gr"),
      Self::Other { tag, .. } => Some(tag),
      Self::ArgCount(_) | Self::Abbrev | Self::Subj => None,
    }
  }

  pub fn case(&self) -> Option<Case> {
    match self {
      Self::Case(c) => Some(*c),
      _ => None,
    }
  }

  pub fn gender(&self) -> Option<Gender> {
    match self {
      Self::Gender(g) => Some(*g),
      _ => None,
    }
  }
}

impl fmt::Display for Variant {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Case(c) => write!(f, "{}", c),
      Self::Gender(g) => write!(f, "{}", g),
      Self::Singular => write!(f, "et"),
      Self::Plural => write!(f, "ft"),
      Self::Person(p) => write!(f, "p{}", p),
      Self::ArgCount(n) => write!(f, "{}", n),
      Self::Infinitive => write!(f, "nh"),
      Self::Subjunctive => write!(f, "vh"),
      Self::Indicative => write!(f, "fh"),
      Self::Imperative => write!(f, "bh"),
      Self::PresentParticiple => write!(f, "lh"),
      Self::PastParticiple => write!(f, "lhþt"),
      Self::Supine => write!(f, "sagnb"),
      Self::Present => write!(f, "nt"),
      Self::Past => write!(f, "þt"),
      Self::Active => write!(f, "gm"),
      Self::Mediopassive => write!(f, "mm"),
      Self::Strong => write!(f, "sb"),
      Self::Weak => write!(f, "vb"),
      Self::Article => write!(f, "gr"),
      Self::Abbrev => write!(f, "abbrev"),
      Self::Subj => write!(f, "subj"),
      Self::Other { name, .. } => write!(f, "{}", name),
    }
  }
}

/// The base category of a category terminal. The named categories are the ones
/// token matching treats specially; everything else (adjectives, pronouns,
/// adverbs, ...) is `Other` and matched by word class.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Category {
  /// `no`
  Noun,
  /// `so`
  Verb,
  /// `fs`
  Preposition,
  /// `person`
  Person,
  /// `töl`, a number written as a word
  NumeralWord,
  /// `tala`
  Number,
  /// `prósenta`
  Percent,
  /// `dags`
  Date,
  /// `raðnr`
  Ordinal,
  /// `grm`
  Punctuation,
  Other(String),
}

impl Category {
  pub fn parse(s: &str) -> Self {
    match s {
      "no" => Self::Noun,
      "so" => Self::Verb,
      "fs" => Self::Preposition,
      "person" => Self::Person,
      "töl" => Self::NumeralWord,
      "tala" => Self::Number,
      "prósenta" => Self::Percent,
      "dags" => Self::Date,
      "raðnr" => Self::Ordinal,
      "grm" => Self::Punctuation,
      other => Self::Other(other.to_string()),
    }
  }

  pub fn name(&self) -> &str {
    match self {
      Self::Noun => "no",
      Self::Verb => "so",
      Self::Preposition => "fs",
      Self::Person => "person",
      Self::NumeralWord => "töl",
      Self::Number => "tala",
      Self::Percent => "prósenta",
      Self::Date => "dags",
      Self::Ordinal => "raðnr",
      Self::Punctuation => "grm",
      Self::Other(s) => s,
    }
  }
}

impl fmt::Display for Category {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.name())
  }
}

/// A quoted terminal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Literal {
  /// Payload between the quotes, minus any `:cat` suffix, lowercased
  pub text: String,
  /// Word class required in addition to the text, from a `:cat` suffix
  pub category: Option<String>,
  /// `'single quotes'` match the lemma, `"double quotes"` the surface form
  pub by_lemma: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalKind {
  Category {
    category: Category,
    variants: Vec<Variant>,
  },
  Literal(Literal),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Terminal {
  /// The spec string this terminal was interned under
  pub name: String,
  pub kind: TerminalKind,
}

impl Terminal {
  /// Parse a terminal spec: a bare `cat_variants` name or a quoted literal
  pub fn from_spec(spec: &str) -> Result<Self, GrammarError> {
    let kind = if let Some(quote) = spec.chars().next().filter(|c| *c == '"' || *c == '\'') {
      if spec.len() < 3 || !spec.ends_with(quote) {
        return Err(GrammarError::new(format!("malformed literal terminal {}", spec)));
      }
      let inner = &spec[1..spec.len() - 1];
      // a lone ":" is a literal colon, not a category separator
      let (text, category) = match inner.rfind(':') {
        Some(idx) if idx > 0 && idx + 1 < inner.len() => {
          (&inner[..idx], Some(inner[idx + 1..].to_string()))
        }
        _ => (inner, None),
      };
      TerminalKind::Literal(Literal {
        text: text.to_lowercase(),
        category,
        by_lemma: quote == '\'',
      })
    } else {
      let mut parts = spec.split('_');
      let category = match parts.next() {
        Some(c) if !c.is_empty() => Category::parse(c),
        _ => return Err(GrammarError::new(format!("malformed terminal {:?}", spec))),
      };
      let variants = parts.map(Variant::parse).collect();
      TerminalKind::Category { category, variants }
    };

    Ok(Self {
      name: spec.to_string(),
      kind,
    })
  }

  pub fn category(&self) -> Option<&Category> {
    match &self.kind {
      TerminalKind::Category { category, .. } => Some(category),
      TerminalKind::Literal(_) => None,
    }
  }

  pub fn literal(&self) -> Option<&Literal> {
    match &self.kind {
      TerminalKind::Literal(lit) => Some(lit),
      TerminalKind::Category { .. } => None,
    }
  }

  pub fn variants(&self) -> &[Variant] {
    match &self.kind {
      TerminalKind::Category { variants, .. } => variants,
      TerminalKind::Literal(_) => &[],
    }
  }

  pub fn is_category(&self, category: &Category) -> bool {
    self.category() == Some(category)
  }

  pub fn has_variant(&self, v: &Variant) -> bool {
    self.variants().contains(v)
  }

  pub fn variant(&self, idx: usize) -> Option<&Variant> {
    self.variants().get(idx)
  }

  pub fn last_variant(&self) -> Option<&Variant> {
    self.variants().last()
  }

  pub fn is_singular(&self) -> bool {
    self.has_variant(&Variant::Singular)
  }

  pub fn is_plural(&self) -> bool {
    self.has_variant(&Variant::Plural)
  }

  pub fn is_abbrev(&self) -> bool {
    self.has_variant(&Variant::Abbrev)
  }

  pub fn case(&self) -> Option<Case> {
    self.variants().iter().find_map(Variant::case)
  }

  pub fn gender(&self) -> Option<Gender> {
    self.variants().iter().find_map(Variant::gender)
  }

  /// Base-form match against a token kind and its text. Category terminals match
  /// on the kind, literals on the text (and the kind, if they name one).
  pub fn matches_base(&self, kind: &str, text: &str) -> bool {
    match &self.kind {
      TerminalKind::Category { category, .. } => category.name() == kind,
      TerminalKind::Literal(lit) => {
        Self::text_eq(&lit.text, text) && lit.category.as_deref().is_none_or(|c| c == kind)
      }
    }
  }

  /// Match against one lexical meaning: its normalized word class, its lemma and
  /// the token's surface text
  pub fn matches_first(&self, word_class: &str, lemma: &str, text: &str) -> bool {
    match &self.kind {
      TerminalKind::Category { category, .. } => category.name() == word_class,
      TerminalKind::Literal(lit) => {
        let payload = if lit.by_lemma { lemma } else { text };
        Self::text_eq(&lit.text, payload)
          && lit.category.as_deref().is_none_or(|c| c == word_class)
      }
    }
  }

  /// `lowered` is already lowercase; avoid allocating when `s` is too
  fn text_eq(lowered: &str, s: &str) -> bool {
    lowered == s || (s.chars().any(char::is_uppercase) && lowered == s.to_lowercase())
  }
}

impl fmt::Display for Terminal {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.name)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_category_terminal() {
    let t = Terminal::from_spec("no_et_kk_nf").unwrap();
    assert_eq!(t.category(), Some(&Category::Noun));
    assert_eq!(
      t.variants(),
      &[Variant::Singular, Variant::Gender(Gender::Masc), Variant::Case(Case::Nom)]
    );
    assert!(t.is_singular());
    assert!(!t.is_plural());
    assert_eq!(t.gender(), Some(Gender::Masc));
    assert_eq!(t.case(), Some(Case::Nom));
    assert!(t.matches_base("no", "hestur"));
    assert!(!t.matches_base("so", "hestur"));
  }

  #[test]
  fn test_verb_terminal_variants() {
    let t = Terminal::from_spec("so_1_þf_et_p3").unwrap();
    assert_eq!(t.variant(0), Some(&Variant::ArgCount(1)));
    assert_eq!(t.variant(1), Some(&Variant::Case(Case::Acc)));
    assert_eq!(t.variant(3).and_then(Variant::tag), Some("3P"));
  }

  #[test]
  fn test_unknown_variant_matches_uppercased() {
    let t = Terminal::from_spec("lo_mst").unwrap();
    assert_eq!(t.category(), Some(&Category::Other("lo".to_string())));
    assert_eq!(t.variant(0).and_then(Variant::tag), Some("MST"));
  }

  #[test]
  fn test_literal_terminals() {
    let t = Terminal::from_spec("\"Og\"").unwrap();
    assert_eq!(
      t.literal(),
      Some(&Literal {
        text: "og".to_string(),
        category: None,
        by_lemma: false
      })
    );
    assert!(t.matches_base("word", "og"));
    assert!(t.matches_base("word", "OG"));
    assert!(!t.matches_base("word", "eða"));

    let colon = Terminal::from_spec("\":\"").unwrap();
    assert!(colon.matches_base("punctuation", ":"));

    let lemma = Terminal::from_spec("'vera:so'").unwrap();
    assert!(lemma.matches_first("so", "vera", "er"));
    assert!(!lemma.matches_first("no", "vera", "veru"));
    assert!(!lemma.matches_first("so", "verða", "varð"));
  }

  #[test]
  fn test_malformed_terminals() {
    assert!(Terminal::from_spec("\"\"").is_err());
    assert!(Terminal::from_spec("'abc").is_err());
    assert!(Terminal::from_spec("_et").is_err());
  }
}
