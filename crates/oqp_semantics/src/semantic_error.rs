// Copyright contributors to the openpulse-compiler project
// SPDX-License-Identifier: Apache-2.0

// Fatal errors raised by the analysis and transformation passes.
// All of them abort the compile at first occurrence.

use crate::symbols::{ScopeKind, SymbolError};
use crate::types::Type;
use crate::TextRange;
use oqp_source_file::ErrorTrait;
use std::fmt;
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Error)]
pub enum SemanticErrorKind {
    #[error("undeclared identifier `{0}`")]
    UndeclaredIdentifier(String),
    #[error("`{0}` is already declared in this scope")]
    DuplicateDeclaration(String),
    #[error("`{statement}` is not allowed in {scope:?} scope")]
    IllegalScopeForStatement {
        statement: &'static str,
        scope: ScopeKind,
    },
    #[error("attempt to leave the global scope")]
    ScopeUnderflow,
    #[error("`{name}` takes {expected} argument(s) but {found} were supplied")]
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,
    },
    #[error("`{0}` is not callable")]
    NotCallable(String),
    #[error("mismatched types for `{name}`: expected `{expected}`, found `{found}`")]
    TypeMismatch {
        name: String,
        expected: Type,
        found: Type,
    },
    #[error("duration cannot be determined statically: {0}")]
    UnresolvedDuration(String),
    #[error("command table is full: more than {capacity} distinct waveforms")]
    CommandTableCapacityExceeded { capacity: usize },
    #[error("no core in the setup for `{0}`")]
    MissingSetupMapping(String),
    #[error("include failed: {0}")]
    IncludeError(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("split program for {core} does not reproduce the barrier timeline")]
    SplitTimingMismatch { core: String },
    #[error("{0} warning(s) treated as errors")]
    WarningsPromoted(usize),
}

impl SemanticErrorKind {
    /// Translate a scope table failure for `name`.
    pub fn from_symbol_error(error: SymbolError, name: &str) -> SemanticErrorKind {
        match error {
            SymbolError::MissingBinding => SemanticErrorKind::UndeclaredIdentifier(name.to_string()),
            SymbolError::AlreadyBound => SemanticErrorKind::DuplicateDeclaration(name.to_string()),
            SymbolError::ScopeUnderflow => SemanticErrorKind::ScopeUnderflow,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SemanticError {
    error_kind: SemanticErrorKind,
    range: TextRange,
}

pub type SemanticResult<T> = Result<T, SemanticError>;

impl SemanticError {
    pub fn new(error_kind: SemanticErrorKind, range: TextRange) -> Self {
        Self { error_kind, range }
    }

    pub fn range(&self) -> TextRange {
        self.range
    }

    pub fn kind(&self) -> &SemanticErrorKind {
        &self.error_kind
    }

    pub fn message(&self) -> String {
        self.error_kind.to_string()
    }
}

impl ErrorTrait for SemanticError {
    fn message(&self) -> String {
        self.message()
    }

    fn range(&self) -> TextRange {
        self.range()
    }
}

impl fmt::Display for SemanticError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {:?}", self.error_kind, self.range)
    }
}

impl std::error::Error for SemanticError {}
