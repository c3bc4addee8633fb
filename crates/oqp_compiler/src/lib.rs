// Copyright contributors to the openpulse-compiler project
// SPDX-License-Identifier: Apache-2.0

//! Driver for the OpenPulse multi-core compiler.
//!
//! A [`Compiler`] takes a program built with the constructors in `oqp_semantics::asg`,
//! substitutes the supplied inputs, analyzes it, resolves the duration of every statement,
//! checks the hardware timing constraints and splits the program into one program per
//! instrument core. Each core's program is then pruned and given a command table.
//!
//! ```ignore
//! let compiler = Compiler::new(CompilerConfig::default());
//! let compilation = compiler.compile(program, &setup, &Inputs::new());
//! if compilation.any_errors() {
//!     compilation.diagnostics.print(&source)?;
//! }
//! ```

mod cache;
mod compiler;
mod config;
mod diagnostics;

pub use cache::{CacheKey, CompileCache};
pub use compiler::{Compilation, Compiler, CoreProgram};
pub use config::{inputs_from_json, CompilerConfig, ConfigError};
pub use diagnostics::Diagnostics;
