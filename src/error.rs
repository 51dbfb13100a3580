use std::fmt;

use thiserror::Error;

/// An input character that matches no token pattern.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("illegal character {character:?} at line {line}, column {column}")]
pub struct LexError {
    pub character: char,
    pub line: usize,
    pub column: usize,
    /// Byte offset into the source text.
    pub offset: usize,
}

/// Every illegal character found in one lexing pass, in source order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LexErrors(pub Vec<LexError>);

impl LexErrors {
    pub fn iter(&self) -> std::slice::Iter<'_, LexError> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for LexErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, err) in self.0.iter().enumerate() {
            if idx > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for LexErrors {}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("syntax error at line {line}, column {column}: expected {expected}, found {found}")]
pub struct ParseError {
    /// Description of the offending token, or "end of input".
    pub found: String,
    pub expected: String,
    pub line: usize,
    pub column: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReferenceKind {
    RateConstant,
    InitialConcentration,
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceKind::RateConstant => f.write_str("rate constant"),
            ReferenceKind::InitialConcentration => f.write_str("initial concentration"),
        }
    }
}

#[derive(Debug, Error)]
pub enum CrnError {
    #[error("lex error: {0}")]
    Lex(#[from] LexErrors),
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("unresolved {kind} '{name}'")]
    Unresolved { kind: ReferenceKind, name: String },
    #[error("reaction '{reaction}' cannot be written back as text: {reason}")]
    NotRepresentable {
        reaction: String,
        reason: &'static str,
    },
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("thread pool error: {0}")]
    ThreadPool(String),
}
