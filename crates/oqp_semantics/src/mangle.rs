// Copyright contributors to the openpulse-compiler project
// SPDX-License-Identifier: Apache-2.0

// Defcals may be overloaded on their qubits, e.g. `defcal measure $0` and `defcal measure $1`.
// Each overload is bound in the global scope under a mangled name that encodes the
// name, the number of parameters and the qubits:
//
//   defcal x $0        -> _ZN1x_PN0_QN1_$0_R
//   defcal rz(a) q     -> _ZN2rz_PN1_QN1_q_R

use crate::asg::QubitOperand;

pub fn mangle_defcal(name: &str, num_params: usize, qubits: &[QubitOperand]) -> String {
    let mut mangled = format!("_ZN{}{}_PN{}_QN{}", name.len(), name, num_params, qubits.len());
    for qubit in qubits {
        mangled.push('_');
        mangled.push_str(&qubit.to_string());
    }
    mangled.push_str("_R");
    mangled
}

/// Score how well a call on `call_qubits` matches an overload defined on `defcal_qubits`.
/// `None` in `defcal_qubits` is a wildcard qubit; `None` in `call_qubits` is a named qubit.
/// A hardware qubit matches exactly (score 2) or through a wildcard (score 1).
/// Returns `None` if the overload cannot be used for the call.
pub fn match_score(defcal_qubits: &[Option<u32>], call_qubits: &[Option<u32>]) -> Option<u32> {
    if defcal_qubits.len() != call_qubits.len() {
        return None;
    }
    let mut score = 0;
    for (defined, called) in defcal_qubits.iter().zip(call_qubits) {
        match (defined, called) {
            (Some(d), Some(c)) if d == c => score += 2,
            (Some(_), _) => return None,
            (None, _) => score += 1,
        }
    }
    Some(score)
}
