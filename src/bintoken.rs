//! Matching of Icelandic tokens against grammar terminals.
//!
//! A `BinToken` wraps a tokenizer `Token` together with the `Lexicon` it should
//! consult, and decides whether the token can fill a terminal slot. Word tokens
//! match if any one of their meanings does. Missing lexical data never aborts a
//! parse, it just makes the rule that needed it fail to match (or, for verb
//! valency, match permissively).

use crate::lexicon::Lexicon;
use crate::terminal::{Case, Category, Gender, Terminal, TerminalKind, Variant};
use crate::token::{Matcher, Meaning, PersonName, Token, TokenValue};

impl Variant {
  /// Variants that a verb form must carry in its tag whenever the terminal asks
  /// for them
  fn is_verb_agreement(&self) -> bool {
    matches!(
      self,
      Self::Person(_)
        | Self::Infinitive
        | Self::Subjunctive
        | Self::Indicative
        | Self::Imperative
        | Self::PresentParticiple
        | Self::PastParticiple
        | Self::Supine
        | Self::Present
        | Self::Past
        | Self::Gender(_)
        | Self::Strong
        | Self::Weak
        | Self::Active
        | Self::Mediopassive
    )
  }
}

/// Verb forms that only match terminals that ask for them explicitly
const RESTRICTIVE: [Variant; 2] = [Variant::Supine, Variant::PastParticiple];

#[derive(Debug, Clone)]
pub struct BinToken<'a> {
  token: Token,
  lower: String,
  lexicon: &'a Lexicon,
}

impl<'a> BinToken<'a> {
  pub fn new(token: Token, lexicon: &'a Lexicon) -> Self {
    let lower = token.text.to_lowercase();
    Self {
      token,
      lower,
      lexicon,
    }
  }

  pub fn wrap_all(tokens: Vec<Token>, lexicon: &'a Lexicon) -> Vec<Self> {
    tokens.into_iter().map(|t| Self::new(t, lexicon)).collect()
  }

  pub fn token(&self) -> &Token {
    &self.token
  }

  fn matches_punctuation(&self, terminal: &Terminal) -> bool {
    match &terminal.kind {
      TerminalKind::Literal(lit) => {
        lit.text == self.lower && lit.category.as_deref().is_none_or(|c| c == "grm")
      }
      TerminalKind::Category { category, .. } => *category == Category::Punctuation,
    }
  }

  fn matches_person(terminal: &Terminal, names: &[PersonName]) -> bool {
    if !terminal.is_category(&Category::Person) {
      return false;
    }
    let case = terminal.case();
    let gender = terminal.gender();
    names.iter().any(|n| {
      case.is_none_or(|c| n.case.is_none_or(|nc| nc == c))
        && gender.is_none_or(|g| n.gender.is_none_or(|ng| ng == g))
    })
  }

  /// A token without case restrictions fits any case
  fn case_agrees(terminal: &Terminal, cases: Option<&[Case]>) -> bool {
    match (cases, terminal.case()) {
      (Some(cases), Some(case)) => cases.contains(&case),
      _ => true,
    }
  }

  fn gender_agrees(terminal: &Terminal, gender: Option<Gender>) -> bool {
    match (gender, terminal.gender()) {
      (Some(g), Some(tg)) => g == tg,
      _ => true,
    }
  }

  /// Singular only for exactly one, plural for anything else
  fn number_agrees(terminal: &Terminal, quantity: f64) -> bool {
    let one = quantity == 1.0;
    !(terminal.is_singular() && !one) && !(terminal.is_plural() && one)
  }

  fn matches_currency(terminal: &Terminal, cases: Option<&[Case]>) -> bool {
    terminal.is_category(&Category::Noun)
      && !terminal.is_abbrev()
      && Self::case_agrees(terminal, cases)
  }

  fn matches_amount(
    terminal: &Terminal,
    quantity: f64,
    cases: Option<&[Case]>,
    gender: Option<Gender>,
  ) -> bool {
    Self::matches_currency(terminal, cases)
      && Self::number_agrees(terminal, quantity)
      && Self::gender_agrees(terminal, gender)
  }

  fn matches_number(
    terminal: &Terminal,
    value: f64,
    cases: Option<&[Case]>,
    gender: Option<Gender>,
  ) -> bool {
    match terminal.category() {
      Some(Category::NumeralWord) => Self::gender_agrees(terminal, gender),
      Some(Category::Number) => true,
      _ => Self::matches_amount(terminal, value, cases, gender),
    }
  }

  fn matches_percent(terminal: &Terminal, value: f64, cases: Option<&[Case]>) -> bool {
    match terminal.category() {
      Some(Category::NumeralWord) => true,
      // percentages are neuter, so a noun terminal asking for a gender can't have one
      Some(Category::Noun) => {
        !terminal.is_abbrev()
          && Self::number_agrees(terminal, value)
          && terminal.gender().is_none()
          && Self::case_agrees(terminal, cases)
      }
      _ => false,
    }
  }

  fn matches_word(&self, terminal: &Terminal, meanings: &[Meaning]) -> bool {
    if let TerminalKind::Literal(lit) = &terminal.kind {
      if !lit.by_lemma && lit.category.is_none() {
        // plain surface literals match unknown words too
        return lit.text == self.lower;
      }
      return meanings
        .iter()
        .any(|m| terminal.matches_first(m.normalized_class(), &m.lemma, &self.lower));
    }
    meanings.iter().any(|m| self.meaning_matches(terminal, m))
  }

  fn meaning_matches(&self, terminal: &Terminal, m: &Meaning) -> bool {
    match terminal.category() {
      Some(Category::Verb) => m.word_class == "so" && self.verb_matches(&m.lemma, terminal, &m.tag),
      Some(Category::Preposition) if !terminal.variants().is_empty() => {
        m.word_class == "fs"
          && terminal
            .variant(0)
            .and_then(Variant::case)
            .is_some_and(|case| self.lexicon.preposition_cases(&self.lower).contains(&case))
      }
      Some(Category::Noun) => Self::noun_matches(terminal, m),
      _ => self.other_matches(terminal, m),
    }
  }

  fn noun_matches(terminal: &Terminal, m: &Meaning) -> bool {
    if m.normalized_class() != "no" {
      return false;
    }
    if terminal.is_abbrev() {
      return m.is_uninflected();
    }
    terminal.variants().iter().all(|v| match v {
      Variant::Gender(g) => m.gender() == Some(*g),
      other => match other.tag() {
        Some(frag) => m.is_uninflected() || m.tag.contains(frag),
        None => true,
      },
    })
  }

  fn other_matches(&self, terminal: &Terminal, m: &Meaning) -> bool {
    if !m.is_uninflected()
      && !terminal
        .variants()
        .iter()
        .filter_map(Variant::tag)
        .all(|frag| m.tag.contains(frag))
    {
      return false;
    }
    terminal.matches_first(m.normalized_class(), &m.lemma, &self.lower)
  }

  /// Does the verb `lemma`, in the form described by `tag`, fit `terminal`?
  pub fn verb_matches(&self, lemma: &str, terminal: &Terminal, tag: &str) -> bool {
    if terminal.has_variant(&Variant::Subj) {
      return self.verb_subject_matches(lemma, terminal, tag);
    }

    if terminal.is_singular() && tag.contains("FT") {
      return false;
    }
    if terminal.is_plural() && tag.contains("ET") {
      return false;
    }
    for v in terminal.variants().iter().filter(|v| v.is_verb_agreement()) {
      if let Some(frag) = v.tag() {
        if !tag.contains(frag) {
          return false;
        }
      }
    }

    for v in RESTRICTIVE.iter() {
      if let Some(frag) = v.tag() {
        if tag.contains(frag) && !terminal.has_variant(v) {
          return false;
        }
      }
    }

    // past participles only in the strong declension
    if terminal.has_variant(&Variant::PastParticiple) && tag.contains("VB") {
      return false;
    }

    self.verb_args_match(lemma, terminal)
  }

  /// Verbs with an oblique subject: the lexicon decides which case that is
  fn verb_subject_matches(&self, lemma: &str, terminal: &Terminal, tag: &str) -> bool {
    if terminal.has_variant(&Variant::Infinitive) && !tag.contains("NH") {
      return false;
    }
    if terminal.has_variant(&Variant::Mediopassive) {
      return tag.contains("MM");
    }
    if terminal.is_singular() && tag.contains("FT") {
      return false;
    }
    if terminal.is_plural() && tag.contains("ET") {
      return false;
    }
    match (
      self.lexicon.subject_case(lemma),
      terminal.last_variant().and_then(Variant::case),
    ) {
      (Some(wanted), Some(slot)) => wanted == slot,
      _ => false,
    }
  }

  fn verb_args_match(&self, lemma: &str, terminal: &Terminal) -> bool {
    let nargs = match terminal.variant(0) {
      Some(Variant::ArgCount(n)) => *n as usize,
      _ => return true,
    };

    match self.lexicon.verb_patterns(lemma, nargs) {
      Some(_) if nargs == 0 => true,
      Some(patterns) => {
        let wanted = || {
          terminal
            .variants()
            .iter()
            .skip(1)
            .take(nargs)
            .map_while(Variant::case)
        };
        if wanted().next().is_none() {
          return true;
        }
        patterns
          .iter()
          .any(|p| wanted().zip(p.iter()).all(|(w, c)| w == *c))
      }
      // a verb known to take fewer objects can't fill this slot, an unknown one can
      None => !(0..nargs).any(|k| self.lexicon.verb_patterns(lemma, k).is_some()),
    }
  }
}

impl Matcher for BinToken<'_> {
  fn matches(&self, terminal: &Terminal) -> bool {
    match &self.token.value {
      TokenValue::Punctuation => self.matches_punctuation(terminal),
      TokenValue::Person(names) => Self::matches_person(terminal, names),
      TokenValue::Currency { cases, .. } => Self::matches_currency(terminal, cases.as_deref()),
      TokenValue::Amount {
        quantity,
        cases,
        gender,
        ..
      } => Self::matches_amount(terminal, *quantity, cases.as_deref(), *gender),
      TokenValue::Number {
        value,
        cases,
        gender,
      } => Self::matches_number(terminal, *value, cases.as_deref(), *gender),
      TokenValue::Percent { value, cases } => {
        Self::matches_percent(terminal, *value, cases.as_deref())
      }
      TokenValue::Date => terminal.is_category(&Category::Date),
      TokenValue::Ordinal(_) => terminal.is_category(&Category::Ordinal),
      TokenValue::Word(meanings) => self.matches_word(terminal, meanings),
    }
  }

  fn text(&self) -> &str {
    &self.token.text
  }
}
