// Copyright contributors to the openpulse-compiler project
// SPDX-License-Identifier: Apache-2.0

use oqp_passes::TimingWarning;
use oqp_semantics::semantic_error::SemanticError;
use oqp_source_file::{print_compiler_errors, SourceString};
use std::io;
use std::path::Path;

/// Errors and warnings of one compilation.
/// Compilation stops at the first error, so there is at most one.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Diagnostics {
    pub errors: Vec<SemanticError>,
    pub warnings: Vec<TimingWarning>,
}

impl Diagnostics {
    pub fn any_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn any_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        !self.any_errors() && !self.any_warnings()
    }

    /// Render against the program text in `source`.
    pub fn print(&self, source: &SourceString) -> io::Result<()> {
        source.print_errors(&self.errors)?;
        source.print_errors(&self.warnings)
    }

    /// Render against the program file at `file_path`.
    pub fn print_for_file(&self, file_path: &Path) -> io::Result<()> {
        print_compiler_errors(&self.errors, file_path)?;
        print_compiler_errors(&self.warnings, file_path)
    }
}
