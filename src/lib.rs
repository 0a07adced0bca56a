//! Earley-Scott parsing into shared packed parse forests, for hand-written
//! natural language grammars.
//!
//! Grammars are context-free, written in a small line-oriented notation (see
//! `parse_grammar`) or built in code with `Grammar::add_rule`. Tokens decide for
//! themselves whether they fit a terminal through the `Matcher` trait, which
//! keeps the parser ignorant of morphology: `SimpleToken` matches by kind, and
//! `BinToken` implements the Icelandic matching rules on top of a `Lexicon`.
//!
//! ```
//! use thicket::{Grammar, Parser, SimpleToken};
//!
//! let g: Grammar = r#"
//!   E -> E "+" E | num
//! "#.parse().unwrap();
//!
//! let parser = Parser::new(&g).unwrap();
//! let forest = parser.parse(&SimpleToken::tokenize("num:1 + num:2 + num:3")).unwrap();
//! assert_eq!(forest.num_combinations(), 2);
//! ```

#[macro_use]
extern crate lazy_static;

pub mod bintoken;
pub mod earley;
pub mod error;
pub mod forest;
pub mod grammar;
pub mod lexicon;
pub mod parse_grammar;
pub mod rules;
pub mod sppf;
pub mod syntree;
pub mod terminal;
pub mod token;
pub mod utils;

pub use crate::bintoken::BinToken;
pub use crate::earley::{ParseLimits, Parser};
pub use crate::error::{GrammarError, ParseError};
pub use crate::forest::{Forest, ParseTree};
pub use crate::grammar::Grammar;
pub use crate::lexicon::Lexicon;
pub use crate::syntree::{Constituent, SynTree, Word};
pub use crate::terminal::{Case, Category, Gender, Terminal, Variant};
pub use crate::token::{Matcher, Meaning, PersonName, SimpleToken, Token, TokenValue};
pub use crate::utils::Err;

#[cfg(test)]
mod tests {
  use super::*;

  const ARITHMETIC: &str = include_str!("../grammars/arithmetic.grammar");
  const SENTENCE: &str = include_str!("../grammars/sentence.grammar");
  const LEXICON: &str = include_str!("../grammars/lexicon.conf");

  #[test]
  fn test_bundled_grammars_load() {
    for src in [ARITHMETIC, SENTENCE] {
      let g: Grammar = src.parse().unwrap();
      assert!(Parser::new(&g).is_ok());
    }
    assert!(LEXICON.parse::<Lexicon>().is_ok());
  }

  #[test]
  fn test_arithmetic_file() {
    let g: Grammar = ARITHMETIC.parse().unwrap();
    let parser = Parser::new(&g).unwrap();
    let forest = parser
      .parse(&SimpleToken::tokenize("( ident:a + num:2 ) * ident:b - num:1"))
      .unwrap();
    assert_eq!(forest.num_combinations(), 1);
    assert_eq!(
      forest.trees()[0].bracketed(),
      r#"(Expr (Expr (Term (Term (Factor "(" (Expr (Expr (Term (Factor ident))) "+" (Term (Factor num))) ")")) "*" (Factor ident))) "-" (Term (Factor num)))"#
    );
  }

  fn person(name: &str, gender: Gender, cases: &[Case]) -> Token {
    let names = cases
      .iter()
      .map(|c| PersonName {
        name: name.to_string(),
        gender: Some(gender),
        case: Some(*c),
      })
      .collect();
    Token::new(name, TokenValue::Person(names))
  }

  fn word(text: &str, lemma: &str, class: &str, tags: &[&str]) -> Token {
    let meanings = tags
      .iter()
      .map(|tag| Meaning::new(lemma, class, text, tag))
      .collect();
    Token::word(text, meanings)
  }

  fn jon() -> Token {
    person("Jón", Gender::Masc, &[Case::Nom])
  }

  fn mariu() -> Token {
    person("Maríu", Gender::Fem, &[Case::Acc, Case::Dat, Case::Gen])
  }

  fn period() -> Token {
    Token::punctuation(".")
  }

  #[test]
  fn test_icelandic_sentences() {
    let g: Grammar = SENTENCE.parse().unwrap();
    let lexicon: Lexicon = LEXICON.parse().unwrap();
    let parser = Parser::new(&g).unwrap();
    let parse = |tokens: Vec<Token>| parser.parse(&BinToken::wrap_all(tokens, &lexicon));

    // gefa takes a dative and an accusative object
    let bok = word("bók", "bók", "kvk", &["NFET", "ÞFET", "ÞGFET"]);
    let gefur = word("gefur", "gefa", "so", &["GM-FH-NT-3P-ET"]);
    let forest = parse(vec![jon(), gefur, mariu(), bok, period()]).unwrap();
    assert_eq!(forest.num_combinations(), 1);
    forest.assert_licensed();
    assert_eq!(
      forest.trees()[0].bracketed(),
      r#"(Málsgrein (Setning (NlNf person_nf) (Sagnliður so_2_þgf_þf (NlÞgf person_þgf) (NlÞf (lo_þf?) no_þf) (Fsliður*))) (Lokatákn "."))"#
    );

    // Maríu could be accusative or dative; the lexicon only allows elska with
    // an accusative object
    let elskar = word("elskar", "elska", "so", &["GM-FH-NT-3P-ET"]);
    let forest = parse(vec![jon(), elskar, mariu(), period()]).unwrap();
    assert_eq!(forest.num_combinations(), 1);
    forest.assert_licensed();
    assert!(forest.trees()[0].bracketed().contains("so_1_þf"));

    let hjalpar = word("hjálpar", "hjálpa", "so", &["GM-FH-NT-3P-ET"]);
    let forest = parse(vec![jon(), hjalpar, mariu(), period()]).unwrap();
    assert!(forest.trees()[0].bracketed().contains("so_1_þgf"));

    // oblique subject
    let mig = word("Mig", "ég", "pfn", &["ÞFET"]);
    let langar = word("langar", "langa", "so", &["OP-GM-FH-NT-3P-ET"]);
    let forest = parse(vec![mig, langar, period()]).unwrap();
    forest.assert_licensed();
    assert!(forest.trees()[0].bracketed().starts_with("(Málsgrein (Setning (NlÞf pfn_þf) so_subj_þf"));
  }

  #[test]
  fn test_icelandic_prepositions() {
    let g: Grammar = SENTENCE.parse().unwrap();
    let lexicon: Lexicon = LEXICON.parse().unwrap();
    let parser = Parser::new(&g).unwrap();
    let parse = |tokens: Vec<Token>| parser.parse(&BinToken::wrap_all(tokens, &lexicon));

    let sefur = word("sefur", "sofa", "so", &["GM-FH-NT-3P-ET"]);
    let a = word("á", "á", "fs", &["-"]);
    let husinu = word("húsinu", "hús", "hk", &["ÞGFETgr"]);
    let forest = parse(vec![jon(), sefur.clone(), a.clone(), husinu, period()]).unwrap();
    assert_eq!(forest.num_combinations(), 1);
    forest.assert_licensed();
    assert!(forest.trees()[0].bracketed().contains("(Fsliður fs_þgf (NlÞgf (lo_þgf?) no_þgf))"));

    // til governs the genitive only
    let til = word("til", "til", "fs", &["-"]);
    let err = parse(vec![jon(), sefur, til, period()]).unwrap_err();
    assert_eq!(
      err,
      ParseError::DeadEnd {
        index: 4,
        text: ".".to_string()
      }
    );
  }
}
