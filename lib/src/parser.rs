//! A parser for the textual fact syntax.
//!
//! It reads facts `pred(arg,...).` and answer sets `{pred(arg,...), ...}` as printed by logic-program
//! solvers. Arguments are plain tokens (letters, digits, `_`, `.`, `+`, `-`) or double-quoted strings,
//! in which `\"` and `\\` stand for a quote and a backslash.
//! Whitespace and `%` line comments may appear between facts.
//!
//! ```
//! use dd_merge::parser::FactParser;
//! let parser = FactParser::default();
//! parser.parse()("innernode(r). leafnode(l,\"yes\").\nroot(r).").expect("valid facts");
//! assert_eq!(parser.facts().len(), 3);
//! ```
use std::cell::RefCell;

use nom::{
    branch::alt,
    bytes::complete::{escaped_transform, is_not, tag, take_while1},
    character::complete::{multispace0, multispace1, not_line_ending},
    combinator::{map, opt, recognize, value},
    multi::{many0, separated_list0},
    sequence::{delimited, pair, preceded, terminated},
    IResult,
};

use crate::{
    error::{DiagramError, Result},
    facts::Atom,
};

/// A parser for facts and answer sets.
/// Parsed facts and answer sets are collected and can be taken afterwards.
#[derive(Debug, Default)]
pub struct FactParser {
    facts: RefCell<Vec<Atom>>,
    answer_sets: RefCell<Vec<Vec<Atom>>>,
}

impl<'a> FactParser {
    /// Parses a sequence of facts and answer sets.
    pub fn parse(&'a self) -> impl FnMut(&'a str) -> IResult<&'a str, ()> {
        move |input| {
            let (rem, _) = preceded(
                FactParser::skip,
                many0(alt((self.parse_fact(), self.parse_answer_set()))),
            )(input)?;
            Ok((rem, ()))
        }
    }

    fn parse_fact(&'a self) -> impl FnMut(&'a str) -> IResult<&'a str, ()> {
        move |input| {
            let (remain, atom) = terminated(
                FactParser::atom,
                terminated(preceded(multispace0, tag(".")), FactParser::skip),
            )(input)?;
            self.facts.borrow_mut().push(atom);
            Ok((remain, ()))
        }
    }

    fn parse_answer_set(&'a self) -> impl FnMut(&'a str) -> IResult<&'a str, ()> {
        move |input| {
            let (remain, atoms) = terminated(FactParser::answer_set, FactParser::skip)(input)?;
            self.answer_sets.borrow_mut().push(atoms);
            Ok((remain, ()))
        }
    }

    /// All facts parsed so far.
    pub fn facts(&self) -> Vec<Atom> {
        self.facts.borrow().clone()
    }

    /// All answer sets parsed so far.
    pub fn answer_sets(&self) -> Vec<Vec<Atom>> {
        self.answer_sets.borrow().clone()
    }
}

impl FactParser {
    fn skip(input: &str) -> IResult<&str, ()> {
        map(
            many0(alt((
                multispace1,
                recognize(pair(tag("%"), not_line_ending)),
            ))),
            |_| (),
        )(input)
    }

    fn answer_set(input: &str) -> IResult<&str, Vec<Atom>> {
        delimited(
            terminated(tag("{"), multispace0),
            separated_list0(
                delimited(multispace0, tag(","), multispace0),
                FactParser::atom,
            ),
            preceded(multispace0, tag("}")),
        )(input)
    }

    fn atom(input: &str) -> IResult<&str, Atom> {
        let (remain, predicate) =
            take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_')(input)?;
        let (remain, args) = opt(delimited(
            terminated(tag("("), multispace0),
            separated_list0(
                delimited(multispace0, tag(","), multispace0),
                FactParser::term,
            ),
            preceded(multispace0, tag(")")),
        ))(remain)?;
        Ok((remain, Atom::new(predicate, args.unwrap_or_default())))
    }

    fn term(input: &str) -> IResult<&str, String> {
        alt((
            delimited(tag("\""), FactParser::quoted_text, tag("\"")),
            map(
                take_while1(|c: char| c.is_ascii_alphanumeric() || "_.+-".contains(c)),
                String::from,
            ),
        ))(input)
    }

    fn quoted_text(input: &str) -> IResult<&str, String> {
        map(
            opt(escaped_transform(
                is_not("\"\\"),
                '\\',
                alt((value("\\", tag("\\")), value("\"", tag("\"")))),
            )),
            Option::unwrap_or_default,
        )(input)
    }
}

fn syntax_error(input: &str, remain: &str) -> DiagramError {
    let consumed = &input[..input.len() - remain.len()];
    let line = consumed.matches('\n').count() + 1;
    let context: String = remain.chars().take(20).collect();
    DiagramError::Parse(format!("unexpected input in line {}: '{}'", line, context))
}

fn parse_all(input: &str) -> Result<FactParser> {
    let parser = FactParser::default();
    let remain = match parser.parse()(input) {
        Ok((remain, _)) => remain,
        Err(err) => return Err(DiagramError::Parse(err.to_string())),
    };
    if !remain.is_empty() {
        return Err(syntax_error(input, remain));
    }
    Ok(parser)
}

/// Parses a fact file; answer sets are not allowed.
pub fn parse_facts(input: &str) -> Result<Vec<Atom>> {
    let parser = parse_all(input)?;
    if !parser.answer_sets.borrow().is_empty() {
        return Err(DiagramError::Parse(
            "expected facts, found an answer set".to_string(),
        ));
    }
    Ok(parser.facts())
}

/// Parses solver output, i.e. a sequence of answer sets.
/// Facts outside of answer sets are not allowed.
pub fn parse_answer_sets(input: &str) -> Result<Vec<Vec<Atom>>> {
    let parser = parse_all(input)?;
    if !parser.facts.borrow().is_empty() {
        return Err(DiagramError::Parse(
            "expected answer sets, found a fact".to_string(),
        ));
    }
    Ok(parser.answer_sets())
}
