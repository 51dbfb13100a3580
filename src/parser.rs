//! Recursive-descent parser for the reaction-network language.
//!
//! ```text
//! data          := initialtime finaltime reaction+ assignment+
//! initialtime   := INITIALTIME EQUAL number
//! finaltime     := FINALTIME EQUAL number
//! reaction      := NAME COLON species_list ARROW species_list SEMICOLON NAME
//! species_list  := species (PLUS species)*
//! species       := [INTEGER] NAME
//! assignment    := NAME EQUAL number
//! number        := INTEGER | FLOAT
//! ```
//!
//! Grammar actions write into a [`NetworkDocument`] owned by the parse call.
//! Repeated keys overwrite earlier values in place: a redeclared reaction keeps
//! the position of its first declaration, a repeated species inside one list
//! keeps its first position with the last coefficient, and a repeated
//! assignment keeps the last value.

use std::collections::HashMap;

use crate::error::{CrnError, ParseError};
use crate::lexer::{Spanned, Token, lex};

/// Species terms of one side of a reaction, in first-seen order.
pub type SpeciesTerms = Vec<(String, u64)>;

#[derive(Clone, Debug, PartialEq)]
pub struct ReactionDecl {
    pub name: String,
    pub reactants: SpeciesTerms,
    pub products: SpeciesTerms,
    /// Name of the rate constant, looked up in the assignment table.
    pub rate: String,
}

/// Name to value table shared by rate constants and initial concentrations.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Assignments {
    entries: Vec<(String, f64)>,
    index: HashMap<String, usize>,
}

impl Assignments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites `name`; an overwritten entry keeps its position.
    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        let name = name.into();
        match self.index.get(&name) {
            Some(&idx) => self.entries[idx].1 = value,
            None => {
                self.index.insert(name.clone(), self.entries.len());
                self.entries.push((name, value));
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.index.get(name).map(|&idx| self.entries[idx].1)
    }

    pub fn get_or(&self, name: &str, default: f64) -> f64 {
        self.get(name).unwrap_or(default)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), *value))
    }
}

/// Everything a reaction-network text declares, before model building.
#[derive(Clone, Debug, PartialEq)]
pub struct NetworkDocument {
    pub initial_time: f64,
    pub final_time: f64,
    pub reactions: Vec<ReactionDecl>,
    pub assignments: Assignments,
}

impl NetworkDocument {
    fn insert_reaction(&mut self, decl: ReactionDecl) {
        match self.reactions.iter_mut().find(|r| r.name == decl.name) {
            Some(slot) => *slot = decl,
            None => self.reactions.push(decl),
        }
    }
}

fn insert_term(terms: &mut SpeciesTerms, name: String, coefficient: u64) {
    match terms.iter_mut().find(|(existing, _)| *existing == name) {
        Some(slot) => slot.1 = coefficient,
        None => terms.push((name, coefficient)),
    }
}

struct Parser<'a> {
    tokens: &'a [Spanned],
    pos: usize,
    eof: (usize, usize),
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Spanned], eof: (usize, usize)) -> Self {
        Self {
            tokens,
            pos: 0,
            eof,
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn peek_nth(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.pos + n).map(|s| &s.token)
    }

    fn advance(&mut self) -> Option<&'a Spanned> {
        let tok = self.tokens.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn err(&self, expected: impl Into<String>) -> ParseError {
        let (found, (line, column)) = match self.tokens.get(self.pos) {
            Some(s) => (s.token.to_string(), (s.line, s.column)),
            None => ("end of input".to_owned(), self.eof),
        };
        ParseError {
            found,
            expected: expected.into(),
            line,
            column,
        }
    }

    fn expect(&mut self, token: Token, expected: &str) -> Result<(), ParseError> {
        if self.peek() == Some(&token) {
            self.advance();
            Ok(())
        } else {
            Err(self.err(expected))
        }
    }

    fn take_name(&mut self, expected: &str) -> Result<String, ParseError> {
        if let Some(Token::Name(name)) = self.peek() {
            let name = name.clone();
            self.advance();
            Ok(name)
        } else {
            Err(self.err(expected))
        }
    }

    fn number(&mut self) -> Result<f64, ParseError> {
        match self.peek() {
            Some(&Token::Integer(n)) => {
                self.advance();
                Ok(n as f64)
            }
            Some(&Token::Float(x)) => {
                self.advance();
                Ok(x)
            }
            _ => Err(self.err("a number")),
        }
    }

    fn time_header(&mut self, keyword: Token, what: &str) -> Result<f64, ParseError> {
        self.expect(keyword, what)?;
        self.expect(Token::Equal, "'='")?;
        self.number()
    }

    fn species(&mut self) -> Result<(String, u64), ParseError> {
        let coefficient = match self.peek() {
            Some(&Token::Integer(n)) => {
                self.advance();
                n
            }
            Some(Token::Float(_)) => {
                return Err(self.err(format!(
                    "an integer coefficient no larger than {}",
                    u64::MAX
                )));
            }
            _ => 1,
        };
        let name = self.take_name("a species name")?;
        Ok((name, coefficient))
    }

    fn species_list(&mut self) -> Result<SpeciesTerms, ParseError> {
        let mut terms = SpeciesTerms::new();
        let (name, coefficient) = self.species()?;
        insert_term(&mut terms, name, coefficient);
        while self.peek() == Some(&Token::Plus) {
            self.advance();
            let (name, coefficient) = self.species()?;
            insert_term(&mut terms, name, coefficient);
        }
        Ok(terms)
    }

    fn reaction(&mut self) -> Result<ReactionDecl, ParseError> {
        let name = self.take_name("a reaction name")?;
        self.expect(Token::Colon, "':'")?;
        let reactants = self.species_list()?;
        self.expect(Token::Arrow, "'+' or '->'")?;
        let products = self.species_list()?;
        self.expect(Token::Semicolon, "'+' or ';'")?;
        let rate = self.take_name("a rate constant name")?;
        Ok(ReactionDecl {
            name,
            reactants,
            products,
            rate,
        })
    }

    fn assignment(&mut self, table: &mut Assignments) -> Result<(), ParseError> {
        let name = self.take_name("a name")?;
        self.expect(Token::Equal, "'='")?;
        let value = self.number()?;
        table.insert(name, value);
        Ok(())
    }

    fn document(&mut self) -> Result<NetworkDocument, ParseError> {
        let initial_time = self.time_header(Token::InitialTime, "'initial_time'")?;
        let final_time = self.time_header(Token::FinalTime, "'final_time'")?;
        let mut doc = NetworkDocument {
            initial_time,
            final_time,
            reactions: Vec::new(),
            assignments: Assignments::new(),
        };

        let decl = self.reaction()?;
        doc.insert_reaction(decl);
        while matches!(self.peek_nth(1), Some(Token::Colon)) {
            let decl = self.reaction()?;
            doc.insert_reaction(decl);
        }

        // at least one assignment must follow the reactions
        self.assignment(&mut doc.assignments)?;
        while self.peek().is_some() {
            self.assignment(&mut doc.assignments)?;
        }
        Ok(doc)
    }
}

fn end_position(text: &str) -> (usize, usize) {
    let line = text.matches('\n').count() + 1;
    let last_line = text.rsplit('\n').next().unwrap_or("");
    (line, last_line.chars().count() + 1)
}

/// Lexes and parses `text` into a [`NetworkDocument`].
pub fn parse_document(text: &str) -> Result<NetworkDocument, CrnError> {
    let tokens = lex(text)?;
    let mut parser = Parser::new(&tokens, end_position(text));
    Ok(parser.document()?)
}
