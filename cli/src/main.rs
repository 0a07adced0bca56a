use std::env;
use std::io;
use std::io::Write;
use std::process;

use thicket::{
  BinToken, Case, Err, Forest, Gender, Grammar, Lexicon, Meaning, ParseError, Parser, PersonName,
  SimpleToken, Token, TokenValue,
};

fn usage(prog_name: &str) -> String {
  format!(
    r"Usage: {} GRAMMAR [options]

Reads one sentence per line from stdin and parses it.

Options:
  -h, --help            Print this message
  -l, --lexicon FILE    Match Icelandic tokens against this lexicon
  -f, --forest          Print the packed forest
  -t, --trees           Print every tree (defaults to only counting them)

Without a lexicon, tokens are `kind:text`, or a bare `text` of its own kind.
With one, tokens are `form/lemma/class/TAG,TAG...` words, `form/person/GENDER/CASE,CASE...`
names, or bare punctuation. Set RUST_LOG=thicket=trace to watch the parser.",
    prog_name
  )
}

struct Args {
  filename: String,
  lexicon: Option<String>,
  print_forest: bool,
  print_trees: bool,
}

impl Args {
  fn make_error_message(msg: &str, prog_name: impl AsRef<str>) -> String {
    format!("argument error: {}.\n\n{}", msg, usage(prog_name.as_ref()))
  }

  fn parse(v: Vec<String>) -> Result<Self, String> {
    let mut iter = v.into_iter();
    let prog_name = match iter.next() {
      Some(name) => name,
      None => return Err(Self::make_error_message("bad argument vector", "cli")),
    };

    let mut filename: Option<String> = None;
    let mut lexicon: Option<String> = None;
    let mut print_forest = false;
    let mut print_trees = false;

    while let Some(o) = iter.next() {
      if o == "-h" || o == "--help" {
        println!("{}", usage(&prog_name));
        process::exit(0);
      } else if o == "-f" || o == "--forest" {
        print_forest = true;
      } else if o == "-t" || o == "--trees" {
        print_trees = true;
      } else if o == "-l" || o == "--lexicon" {
        match iter.next() {
          Some(file) => lexicon = Some(file),
          None => return Err(Self::make_error_message("--lexicon needs a file", prog_name)),
        }
      } else if filename.is_none() {
        filename = Some(o);
      } else {
        return Err(Self::make_error_message("invalid arguments", prog_name));
      }
    }

    match filename {
      Some(filename) => Ok(Self {
        filename,
        lexicon,
        print_forest,
        print_trees,
      }),
      None => Err(Self::make_error_message("missing grammar file", prog_name)),
    }
  }
}

/// One token of the lexicon-mode input syntax
fn read_token(s: &str) -> Result<Token, Err> {
  let parts = s.split('/').collect::<Vec<_>>();
  match parts.as_slice() {
    [form] if form.chars().all(|c| !c.is_alphanumeric()) => Ok(Token::punctuation(form)),
    [form] => Ok(Token::word(form, Vec::new())),
    [form, "person", gender, cases] => {
      let gender = Gender::from_name(gender).ok_or_else(|| format!("unknown gender in {}", s))?;
      let names = cases
        .split(',')
        .map(|c| -> Result<PersonName, Err> {
          Ok(PersonName {
            name: form.to_string(),
            gender: Some(gender),
            case: Some(c.parse::<Case>()?),
          })
        })
        .collect::<Result<Vec<_>, _>>()?;
      Ok(Token::new(form, TokenValue::Person(names)))
    }
    [form, lemma, class, tags] => {
      let meanings = tags
        .split(',')
        .map(|tag| Meaning::new(lemma, class, form, tag))
        .collect();
      Ok(Token::word(form, meanings))
    }
    _ => Err(format!("can't read token {:?}", s).into()),
  }
}

fn report(forest: Result<Forest<'_>, ParseError>, print_forest: bool, print_trees: bool) {
  let forest = match forest {
    Ok(forest) => forest,
    Err(e) => {
      println!("{}", e);
      return;
    }
  };

  let n = forest.num_combinations();
  println!("Parsed {} tree{}", n, if n == 1 { "" } else { "s" });

  if print_forest {
    println!("{}", forest);
  }
  if print_trees {
    for t in forest.trees() {
      println!("{}", t.bracketed());
    }
    println!();
  }
}

fn parse(
  parser: &Parser,
  lexicon: Option<&Lexicon>,
  sentence: &str,
  opts: &Args,
) -> Result<(), Err> {
  let forest = match lexicon {
    Some(lexicon) => {
      let tokens = sentence
        .split_whitespace()
        .map(read_token)
        .collect::<Result<Vec<_>, _>>()?;
      for token in tokens.iter() {
        tracing::debug!(text = %token.text, kind = token.kind(), "token");
      }
      parser.parse(&BinToken::wrap_all(tokens, lexicon))
    }
    None => parser.parse(&SimpleToken::tokenize(sentence)),
  };
  report(forest, opts.print_forest, opts.print_trees);
  Ok(())
}

fn main() -> Result<(), Err> {
  tracing_subscriber::fmt()
    .with_env_filter(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
    )
    .with_writer(io::stderr)
    .init();

  let opts = match Args::parse(env::args().collect()) {
    Ok(opts) => opts,
    Err(msg) => {
      eprintln!("{}", msg);
      process::exit(255);
    }
  };

  let g = Grammar::read_from_file(&opts.filename)?;
  let lexicon = match &opts.lexicon {
    Some(file) => Some(Lexicon::read_from_file(file)?),
    None => None,
  };
  let parser = Parser::new(&g)?;
  tracing::info!(grammar = %opts.filename, "ready");

  let mut input = String::new();
  loop {
    print!("> ");
    io::stdout().flush()?;

    match io::stdin().read_line(&mut input) {
      Ok(_) => {
        if input.is_empty() {
          // ctrl+d
          return Ok(());
        }
        if let Err(e) = parse(&parser, lexicon.as_ref(), input.trim(), &opts) {
          println!("{}", e);
        }
        input.clear();
      }
      Err(error) => return Err(error.into()),
    }
  }
}
