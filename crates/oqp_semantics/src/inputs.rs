// Copyright contributors to the openpulse-compiler project
// SPDX-License-Identifier: Apache-2.0

// Substitution of caller-supplied values for `input` declarations.
//
// An `input` with a supplied value becomes an initialized declaration of the declared type.
// An `input` with no supplied value is left alone; it stays a run-time value, and any
// duration that depends on it cannot be resolved statically.

use crate::asg::{DeclareClassical, DurationLiteral, Expr, Literal, Program, StmtKind, TimeUnit};
use crate::semantic_error::SemanticErrorKind::InvalidInput;
use crate::semantic_error::{SemanticError, SemanticResult};
use crate::types::Type;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A value supplied for an `input` declaration.
/// Durations are given in seconds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InputValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Bits(Vec<i64>),
}

// Ordered so that the compile cache can hash it deterministically.
pub type Inputs = BTreeMap<String, InputValue>;

/// Replace `input` declarations at the top level of `program` by initialized declarations.
/// Returns the names of the inputs that were substituted.
pub fn resolve_inputs(program: &mut Program, inputs: &Inputs) -> SemanticResult<Vec<String>> {
    let mut resolved = Vec::new();
    for stmt in program.stmts_mut().iter_mut() {
        let range = stmt.range();
        let replacement = match stmt.kind() {
            StmtKind::OutputDeclaration(decl) => {
                return Err(SemanticError::new(
                    InvalidInput(format!(
                        "output declarations are not supported: `{}`",
                        decl.name.name()
                    )),
                    range,
                ));
            }
            StmtKind::InputDeclaration(decl) => match inputs.get(decl.name.name()) {
                Some(value) => {
                    let init = input_literal(&decl.ty, value).ok_or_else(|| {
                        SemanticError::new(
                            InvalidInput(format!(
                                "value {value:?} does not fit `input {} {}`",
                                decl.ty,
                                decl.name.name()
                            )),
                            range,
                        )
                    })?;
                    log::debug!("input `{}` = {:?}", decl.name.name(), value);
                    resolved.push(decl.name.name().to_string());
                    DeclareClassical::new(decl.name.clone(), decl.ty.clone(), Some(init))
                }
                None => {
                    log::debug!("input `{}` has no value and stays dynamic", decl.name.name());
                    continue;
                }
            },
            _ => continue,
        };
        *stmt = stmt.with_kind(StmtKind::DeclareClassical(Box::new(replacement)));
    }
    Ok(resolved)
}

fn input_literal(ty: &Type, value: &InputValue) -> Option<Expr> {
    let literal = match (ty, value) {
        (Type::Bool(_), InputValue::Bool(b)) => Literal::Bool(*b),
        (Type::Int(..) | Type::UInt(..) | Type::Bit(_), InputValue::Int(i)) => Literal::Int(*i),
        (Type::Float(..) | Type::Angle(..), InputValue::Float(x)) => Literal::Float(*x),
        (Type::Float(..) | Type::Angle(..), InputValue::Int(i)) => Literal::Float(*i as f64),
        (Type::Duration(_), InputValue::Float(seconds)) => {
            Literal::Duration(DurationLiteral::new(seconds * 1e9, TimeUnit::NanoSecond))
        }
        (Type::Duration(_), InputValue::Int(seconds)) => Literal::Duration(
            DurationLiteral::new(*seconds as f64 * 1e9, TimeUnit::NanoSecond),
        ),
        (Type::Array(elem, n), InputValue::Bits(bits)) if bits.len() == *n => {
            let elements = bits
                .iter()
                .map(|bit| input_literal(elem, &InputValue::Int(*bit)))
                .collect::<Option<Vec<_>>>()?;
            return Some(Expr::ArrayLiteral(elements));
        }
        _ => return None,
    };
    Some(Expr::Literal(literal))
}
