//! Lexical tables consulted by token matching: verb valency (how many objects a
//! verb takes, and in which cases), verbs with non-nominative subjects, and the
//! cases each preposition governs.
//!
//! These are plain data. Build a `Lexicon` once, either in code or from a config
//! file, and hand references to it to the tokens being parsed:
//!
//! ```text
//! # verbs: lemma followed by the case of each object
//! [verbs]
//! sofa
//! elska þf
//! gefa þgf þf
//!
//! [subjects]
//! langa þf
//!
//! [prepositions]
//! á þf þgf
//! ```

use std::collections::HashMap;
use std::fs;
use std::str::FromStr;

use regex::Regex;
use tracing::warn;

use crate::error::GrammarError;
use crate::terminal::Case;

/// Highest object count a verb terminal can ask for
pub const MAX_ARGS: usize = 2;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Lexicon {
  /// Indexed by object count: lemma -> every case pattern the verb allows
  verbs: [HashMap<String, Vec<Vec<Case>>>; MAX_ARGS + 1],
  subjects: HashMap<String, Case>,
  prepositions: HashMap<String, Vec<Case>>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Section {
  Verbs,
  Subjects,
  Prepositions,
}

impl Lexicon {
  pub fn new() -> Self {
    Default::default()
  }

  /// Register `lemma` as taking objects in the given cases. Call it again with
  /// another pattern to allow that too.
  pub fn add_verb(&mut self, lemma: &str, objects: &[Case]) -> Result<(), GrammarError> {
    if objects.len() > MAX_ARGS {
      return Err(GrammarError::new(format!(
        "verb {} takes {} objects, at most {} are supported",
        lemma,
        objects.len(),
        MAX_ARGS
      )));
    }
    let patterns = self.verbs[objects.len()]
      .entry(lemma.to_string())
      .or_default();
    if patterns.iter().any(|p| p == objects) {
      warn!(lemma, "duplicate verb pattern ignored");
    } else {
      patterns.push(objects.to_vec());
    }
    Ok(())
  }

  pub fn add_subject(&mut self, lemma: &str, case: Case) {
    if let Some(old) = self.subjects.insert(lemma.to_string(), case) {
      if old != case {
        warn!(lemma, %old, new = %case, "subject case redefined");
      }
    }
  }

  pub fn add_preposition(&mut self, word: &str, cases: &[Case]) {
    let entry = self.prepositions.entry(word.to_lowercase()).or_default();
    for case in cases {
      if !entry.contains(case) {
        entry.push(*case);
      }
    }
  }

  /// Case patterns for `lemma` with `nargs` objects, if it's registered with that many
  pub fn verb_patterns(&self, lemma: &str, nargs: usize) -> Option<&[Vec<Case>]> {
    self
      .verbs
      .get(nargs)
      .and_then(|m| m.get(lemma))
      .map(Vec::as_slice)
  }

  pub fn subject_case(&self, lemma: &str) -> Option<Case> {
    self.subjects.get(lemma).copied()
  }

  /// Cases governed by a preposition, looked up by its lowercased form
  pub fn preposition_cases(&self, word: &str) -> &[Case] {
    self
      .prepositions
      .get(word)
      .map(Vec::as_slice)
      .unwrap_or(&[])
  }

  pub fn read_from_file(filename: &str) -> Result<Self, GrammarError> {
    let src = fs::read_to_string(filename)
      .map_err(|e| GrammarError::at(format!("couldn't read lexicon: {}", e), Some(filename), None))?;
    src.parse::<Self>().map_err(|e| e.in_file(filename))
  }

  fn parse_cases<'a>(
    words: impl Iterator<Item = &'a str>,
    line: usize,
  ) -> Result<Vec<Case>, GrammarError> {
    words
      .map(|w| w.parse::<Case>().map_err(|e| GrammarError::at(e.message, None, Some(line))))
      .collect()
  }
}

impl FromStr for Lexicon {
  type Err = GrammarError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    lazy_static! {
      static ref SECTION: Regex = Regex::new(r"^\[\s*([a-z]+)\s*\]$").unwrap();
    }

    let mut lexicon = Self::new();
    let mut section = None;

    for (idx, raw) in s.lines().enumerate() {
      let line_no = idx + 1;
      let line = raw.split('#').next().unwrap_or("").trim();
      if line.is_empty() {
        continue;
      }

      if let Some(caps) = SECTION.captures(line) {
        section = Some(match &caps[1] {
          "verbs" => Section::Verbs,
          "subjects" => Section::Subjects,
          "prepositions" => Section::Prepositions,
          other => {
            return Err(GrammarError::at(
              format!("unknown lexicon section [{}]", other),
              None,
              Some(line_no),
            ));
          }
        });
        continue;
      }

      let mut words = line.split_whitespace();
      let head = words.next().unwrap_or("");
      match section {
        None => {
          return Err(GrammarError::at(
            "lexicon entry before any section header",
            None,
            Some(line_no),
          ));
        }
        Some(Section::Verbs) => {
          let cases = Self::parse_cases(words, line_no)?;
          lexicon
            .add_verb(head, &cases)
            .map_err(|e| GrammarError::at(e.message, None, Some(line_no)))?;
        }
        Some(Section::Subjects) => {
          let cases = Self::parse_cases(words, line_no)?;
          match cases.as_slice() {
            [case] => lexicon.add_subject(head, *case),
            _ => {
              return Err(GrammarError::at(
                format!("subject entry for {} needs exactly one case", head),
                None,
                Some(line_no),
              ));
            }
          }
        }
        Some(Section::Prepositions) => {
          let cases = Self::parse_cases(words, line_no)?;
          if cases.is_empty() {
            return Err(GrammarError::at(
              format!("preposition {} governs no case", head),
              None,
              Some(line_no),
            ));
          }
          lexicon.add_preposition(head, &cases);
        }
      }
    }

    Ok(lexicon)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const SRC: &str = r#"
    # test lexicon
    [verbs]
    sofa
    elska þf
    gefa þgf þf
    gefa þf        # also "gefa eitthvað"

    [subjects]
    langa þf

    [prepositions]
    á þf þgf
    til ef
  "#;

  #[test]
  fn test_parse_lexicon() {
    let lex: Lexicon = SRC.parse().unwrap();
    assert_eq!(lex.verb_patterns("sofa", 0), Some(&[vec![]][..]));
    assert_eq!(lex.verb_patterns("elska", 1), Some(&[vec![Case::Acc]][..]));
    assert_eq!(lex.verb_patterns("gefa", 1), Some(&[vec![Case::Acc]][..]));
    assert_eq!(
      lex.verb_patterns("gefa", 2),
      Some(&[vec![Case::Dat, Case::Acc]][..])
    );
    assert_eq!(lex.verb_patterns("elska", 2), None);
    assert_eq!(lex.verb_patterns("hlaupa", 0), None);
    assert_eq!(lex.subject_case("langa"), Some(Case::Acc));
    assert_eq!(lex.preposition_cases("á"), &[Case::Acc, Case::Dat]);
    assert!(lex.preposition_cases("undir").is_empty());
  }

  #[test]
  fn test_lexicon_errors() {
    let err = "[verbs]\nfoo xx\n".parse::<Lexicon>().unwrap_err();
    assert_eq!(err.line, Some(2));

    let err = "elska þf\n".parse::<Lexicon>().unwrap_err();
    assert_eq!(err.line, Some(1));

    let err = "[nouns]\n".parse::<Lexicon>().unwrap_err();
    assert_eq!(err.message, "unknown lexicon section [nouns]");

    let err = "[verbs]\ngefa þf þgf þf\n".parse::<Lexicon>().unwrap_err();
    assert_eq!(err.line, Some(2));

    assert!("[subjects]\nlanga\n".parse::<Lexicon>().is_err());
    assert!("[prepositions]\ná\n".parse::<Lexicon>().is_err());
  }
}
