// Copyright contributors to the openpulse-compiler project
// SPDX-License-Identifier: Apache-2.0

//! Abstract Semantic Graph (ASG) for OpenPulse programs, and the semantic analyzer.
//!
//! Programs are built with the constructors in [`asg`], typically by an external parser.
//! [`analyzer::analyze`] then resolves every identifier to a scoped symbol, numbers
//! the statements, and checks statement placement and call signatures.
//! After analysis, later passes read the annotations on the tree and never
//! consult the symbol table again.

// Organization of API
// asg.rs holds the tree and is all a consumer of analyzed programs needs.
// symbols.rs and context.rs are the machinery of the traversal in analyzer.rs.

pub mod analyzer;
pub mod asg;
pub mod builtins;
pub mod context;
pub mod inputs;
pub mod mangle;
pub mod semantic_error;
pub mod symbols;
pub mod types;

mod display;

pub use rowan::{TextRange, TextSize};
