use std::fmt;

use crate::error::{LexError, LexErrors};

#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    /// Bare digit sequence. Digits that overflow `u64` lex as [`Token::Float`]
    /// so they stay usable as assignment values.
    Integer(u64),
    Float(f64),
    Name(String),
    Plus,
    Arrow,
    Equal,
    Semicolon,
    Colon,
    InitialTime,
    FinalTime,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Integer(n) => write!(f, "integer {n}"),
            Token::Float(x) => write!(f, "float {x}"),
            Token::Name(name) => write!(f, "name '{name}'"),
            Token::Plus => f.write_str("'+'"),
            Token::Arrow => f.write_str("'->'"),
            Token::Equal => f.write_str("'='"),
            Token::Semicolon => f.write_str("';'"),
            Token::Colon => f.write_str("':'"),
            Token::InitialTime => f.write_str("'initial_time'"),
            Token::FinalTime => f.write_str("'final_time'"),
        }
    }
}

/// A token with the 1-based line and column of its first character.
#[derive(Clone, Debug, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub line: usize,
    pub column: usize,
}

/// Streaming lexer over reaction-network text.
///
/// An illegal character yields one `Err` item and lexing resumes with the
/// next character, so a single pass reports every bad character.
pub struct Lexer<'src> {
    rest: &'src str,
    offset: usize,
    line: usize,
    column: usize,
}

impl<'src> Lexer<'src> {
    pub fn new(input: &'src str) -> Self {
        Self {
            rest: input,
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    fn bump(&mut self, len: usize) -> &'src str {
        let (taken, rest) = self.rest.split_at(len);
        self.rest = rest;
        self.offset += len;
        for ch in taken.chars() {
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        taken
    }

    fn skip_trivia(&mut self) {
        loop {
            let ws = self
                .rest
                .find(|c: char| !matches!(c, ' ' | '\t' | '\r' | '\n'))
                .unwrap_or(self.rest.len());
            if ws > 0 {
                self.bump(ws);
                continue;
            }
            if self.rest.starts_with('#') {
                let end = self.rest.find('\n').unwrap_or(self.rest.len());
                self.bump(end);
                continue;
            }
            break;
        }
    }

    fn lex_number(&mut self) -> Token {
        let digits = leading(self.rest, |c| c.is_ascii_digit());
        let after = &self.rest[digits..];
        if let Some(frac) = after.strip_prefix('.') {
            let frac_digits = leading(frac, |c| c.is_ascii_digit());
            if frac_digits > 0 {
                let text = self.bump(digits + 1 + frac_digits);
                // digits '.' digits always parses
                return Token::Float(text.parse().unwrap_or_default());
            }
        }
        let text = self.bump(digits);
        match text.parse::<u64>() {
            Ok(n) => Token::Integer(n),
            Err(_) => Token::Float(text.parse().unwrap_or(f64::INFINITY)),
        }
    }

    fn lex_name(&mut self) -> Token {
        let len = leading(self.rest, |c| c.is_ascii_alphanumeric() || c == '_');
        match self.bump(len) {
            "initial_time" => Token::InitialTime,
            "final_time" => Token::FinalTime,
            name => Token::Name(name.to_owned()),
        }
    }
}

fn leading(s: &str, pred: impl Fn(char) -> bool) -> usize {
    s.find(|c: char| !pred(c)).unwrap_or(s.len())
}

impl Iterator for Lexer<'_> {
    type Item = Result<Spanned, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.skip_trivia();
        let c = self.rest.chars().next()?;
        let (line, column) = (self.line, self.column);

        let token = match c {
            '+' => {
                self.bump(1);
                Token::Plus
            }
            '=' => {
                self.bump(1);
                Token::Equal
            }
            ';' => {
                self.bump(1);
                Token::Semicolon
            }
            ':' => {
                self.bump(1);
                Token::Colon
            }
            '-' if self.rest.starts_with("->") => {
                self.bump(2);
                Token::Arrow
            }
            '0'..='9' => self.lex_number(),
            'a'..='z' | 'A'..='Z' | '_' => self.lex_name(),
            other => {
                let offset = self.offset;
                self.bump(other.len_utf8());
                return Some(Err(LexError {
                    character: other,
                    line,
                    column,
                    offset,
                }));
            }
        };
        Some(Ok(Spanned {
            token,
            line,
            column,
        }))
    }
}

/// Tokenizes `input`, collecting every lexing error before failing.
pub fn lex(input: &str) -> Result<Vec<Spanned>, LexErrors> {
    let mut tokens = Vec::new();
    let mut errors = Vec::new();
    for item in Lexer::new(input) {
        match item {
            Ok(tok) => tokens.push(tok),
            Err(err) => errors.push(err),
        }
    }
    if errors.is_empty() {
        Ok(tokens)
    } else {
        Err(LexErrors(errors))
    }
}
