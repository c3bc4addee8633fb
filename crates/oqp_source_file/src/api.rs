// Copyright contributors to the openpulse-compiler project
// SPDX-License-Identifier: Apache-2.0

use ariadne::Config;
use ariadne::{ColorGenerator, Label, Report, ReportKind, Source};
use std::fs;
use std::io;
use std::ops::Range;
use std::path::Path;

use crate::source_file::{range_to_span, ErrorTrait, Severity};

/// Print compiler diagnostics. Diagnostics include text taken from `source`.
/// The file `info_file_path` is only used for labelling. In particular,
/// it does not need to correspond to an existing file.
pub fn inner_print_compiler_errors<T: ErrorTrait>(
    errors: &[T],
    info_file_path: &Path,
    source: &str,
) -> io::Result<()> {
    let file_path_str = info_file_path.to_string_lossy();
    for err in errors.iter() {
        let kind = match err.severity() {
            Severity::Error => ReportKind::Error,
            Severity::Warning => ReportKind::Warning,
        };
        let err_span = range_to_span(&err.range());
        report_error(kind, &err.message(), &err_span, &file_path_str, source)?;
        eprintln!();
    }
    Ok(())
}

/// Read `file_path` and print `errors` against its contents.
pub fn print_compiler_errors<T: ErrorTrait>(errors: &[T], file_path: &Path) -> io::Result<()> {
    // If there are no errors, don't even try to read the file.
    if errors.is_empty() {
        return Ok(());
    }
    let source = fs::read_to_string(file_path)?;
    inner_print_compiler_errors(errors, file_path, &source)
}

pub fn report_error(
    kind: ReportKind,
    message: &str,
    span: &Range<usize>,
    file_path: &str,
    source: &str,
) -> io::Result<()> {
    let mut colors = ColorGenerator::new();
    let a = colors.next();
    // `span` holds zero-indexed character offsets from the beginning of the file.
    Report::build(kind, (file_path, span.clone()))
        .with_message(message)
        .with_config(Config::default().with_compact(true))
        .with_label(
            Label::new((file_path, span.clone()))
                .with_message("Near this point")
                .with_color(a),
        )
        .finish()
        .eprint((file_path, Source::from(source)))
}
