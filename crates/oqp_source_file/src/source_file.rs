// Copyright contributors to the openpulse-compiler project
// SPDX-License-Identifier: Apache-2.0

use crate::api::inner_print_compiler_errors;
use rowan::TextRange;
use std::io;
use std::path::{Path, PathBuf};

/// Whether a diagnostic aborts compilation or is only reported.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
}

pub trait ErrorTrait {
    /// Return a message describing the error.
    fn message(&self) -> String;

    /// Return the character range in the source associated with the error.
    fn range(&self) -> TextRange;

    fn severity(&self) -> Severity {
        Severity::Error
    }
}

/// `TextRange` comes from the crate text-size (re-exported by rowan).
/// `ariadne` wants a `Range<usize>`, and requires a non-empty range to draw a label.
pub fn range_to_span(range: &TextRange) -> std::ops::Range<usize> {
    let r1: usize = range.start().into();
    let r2: usize = range.end().into();
    if r2 > r1 {
        r1..r2
    } else {
        r1..(r1 + 1)
    }
}

/// Program text that did not (necessarily) come from a file.
/// `file_path` is only used to label diagnostics.
#[derive(Clone, Debug)]
pub struct SourceString {
    source: String,
    file_path: PathBuf,
}

impl SourceString {
    pub fn new<T: ToString>(source: T, fake_file_path: Option<&str>) -> SourceString {
        SourceString {
            source: source.to_string(),
            file_path: PathBuf::from(fake_file_path.unwrap_or("no file")),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Render `errors` against this source on stderr.
    pub fn print_errors<T: ErrorTrait>(&self, errors: &[T]) -> io::Result<()> {
        if errors.is_empty() {
            return Ok(());
        }
        inner_print_compiler_errors(errors, &self.file_path, &self.source)
    }
}
