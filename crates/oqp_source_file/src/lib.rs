// Copyright contributors to the openpulse-compiler project
// SPDX-License-Identifier: Apache-2.0

//! Source text and diagnostic rendering for the OpenPulse compiler.
//!
//! Parsing happens outside of this workspace, so a `SourceString` only pairs
//! program text with the path used when printing. Nodes of the semantic tree carry
//! `TextRange`s into that text, and anything implementing `ErrorTrait` can be
//! rendered against it with the external crate `ariadne`.

mod api;
mod source_file;

pub use rowan::{TextRange, TextSize};

pub use source_file::{range_to_span, ErrorTrait, Severity, SourceString};

pub use api::{inner_print_compiler_errors, print_compiler_errors, report_error};
