// Copyright contributors to the openpulse-compiler project
// SPDX-License-Identifier: Apache-2.0

// Types used to annotate declarations and to check call arguments.
// Only as much of the OpenQASM type system as the pulse pipeline needs is modelled:
// there is no implicit-cast insertion here, just a compatibility relation.

use boolenum::BoolEnum;
use std::fmt;

#[derive(BoolEnum, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IsConst {
    True,
    False,
}

/// Bit width of primitive classical types
type Width = Option<u32>;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Type {
    // Scalar types
    Bool(IsConst),
    Bit(IsConst),
    Int(Width, IsConst),
    UInt(Width, IsConst),
    Float(Width, IsConst),
    Angle(Width, IsConst),
    Complex(Width, IsConst), // width is for one component.
    Duration(IsConst),
    // Fixed length one-dimensional arrays, e.g. `array[int, 4] n_steps`.
    Array(Box<Type>, usize),

    // OpenPulse types
    Port,
    Frame,
    Waveform,
    Qubit,

    Void,
    // Undefined means a type that is erroneously non-existent. This is not the same as unknown.
    // The prototypical application is an expression referring to an unbound identifier.
    Undefined,
}

impl Type {
    pub fn is_const(&self) -> bool {
        use Type::*;
        match self {
            Bool(c) | Bit(c) | Duration(c) => (*c).into(),
            Int(_, c) | UInt(_, c) | Float(_, c) | Angle(_, c) | Complex(_, c) => (*c).into(),
            _ => false,
        }
    }

    /// Return true for the types whose values take part in arithmetic.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Type::Bool(..)
                | Type::Bit(..)
                | Type::Int(..)
                | Type::UInt(..)
                | Type::Float(..)
                | Type::Angle(..)
                | Type::Complex(..)
        )
    }

    /// Return the same type with `IsConst::False`, or the type itself if it has no
    /// constness.
    pub fn without_const(&self) -> Type {
        use Type::*;
        match self {
            Bool(_) => Bool(IsConst::False),
            Bit(_) => Bit(IsConst::False),
            Duration(_) => Duration(IsConst::False),
            Int(w, _) => Int(*w, IsConst::False),
            UInt(w, _) => UInt(*w, IsConst::False),
            Float(w, _) => Float(*w, IsConst::False),
            Angle(w, _) => Angle(*w, IsConst::False),
            Complex(w, _) => Complex(*w, IsConst::False),
            other => other.clone(),
        }
    }

    /// Return true if a value of type `self` may be passed where `target` is declared.
    /// Constness and widths are ignored. `Undefined` is compatible with everything so
    /// that a single error is not reported twice.
    pub fn is_assignable_to(&self, target: &Type) -> bool {
        use Type::*;
        match (self, target) {
            (Undefined, _) | (_, Undefined) => true,
            (Duration(_), Duration(_)) => true,
            (Port, Port) | (Frame, Frame) | (Waveform, Waveform) | (Qubit, Qubit) => true,
            // Sample arrays are waveforms.
            (Array(elem, _), Waveform) => elem.is_numeric(),
            (Array(a, n), Array(b, m)) => n == m && a.is_assignable_to(b),
            (Complex(..), Complex(..)) => true,
            (Complex(..), _) => false,
            (x, y) if x.is_numeric() && y.is_numeric() => true,
            (Void, Void) => true,
            _ => false,
        }
    }

    /// The type of an arithmetic result with operands of type `self` and `other`.
    pub fn promote(&self, other: &Type) -> Type {
        use Type::*;
        let is_const = IsConst::from(self.is_const() && other.is_const());
        match (self, other) {
            (Undefined, _) | (_, Undefined) => Undefined,
            (Duration(_), _) | (_, Duration(_)) => Duration(is_const),
            (Complex(..), _) | (_, Complex(..)) => Complex(None, is_const),
            (Float(..), _) | (_, Float(..)) => Float(None, is_const),
            (Angle(..), _) | (_, Angle(..)) => Angle(None, is_const),
            (UInt(..), UInt(..)) => UInt(None, is_const),
            (x, y) if x.is_numeric() && y.is_numeric() => Int(None, is_const),
            (Waveform, _) | (_, Waveform) => Waveform,
            _ => Undefined,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = if self.is_const() { "const " } else { "" };
        match self {
            Type::Bool(_) => write!(f, "{prefix}bool"),
            Type::Bit(_) => write!(f, "{prefix}bit"),
            Type::Int(w, _) => write_width(f, prefix, "int", w),
            Type::UInt(w, _) => write_width(f, prefix, "uint", w),
            Type::Float(w, _) => write_width(f, prefix, "float", w),
            Type::Angle(w, _) => write_width(f, prefix, "angle", w),
            Type::Complex(w, _) => write_width(f, prefix, "complex", w),
            Type::Duration(_) => write!(f, "{prefix}duration"),
            Type::Array(elem, n) => write!(f, "array[{elem}, {n}]"),
            Type::Port => write!(f, "port"),
            Type::Frame => write!(f, "frame"),
            Type::Waveform => write!(f, "waveform"),
            Type::Qubit => write!(f, "qubit"),
            Type::Void => write!(f, "void"),
            Type::Undefined => write!(f, "undefined"),
        }
    }
}

fn write_width(f: &mut fmt::Formatter<'_>, prefix: &str, name: &str, width: &Width) -> fmt::Result {
    match width {
        Some(w) => write!(f, "{prefix}{name}[{w}]"),
        None => write!(f, "{prefix}{name}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_types_are_interchangeable() {
        let int = Type::Int(Some(32), IsConst::True);
        let float = Type::Float(None, IsConst::False);
        assert!(int.is_assignable_to(&float));
        assert!(float.is_assignable_to(&int));
        assert!(!Type::Duration(IsConst::False).is_assignable_to(&int));
        assert!(!Type::Frame.is_assignable_to(&Type::Port));
    }

    #[test]
    fn promotion_keeps_constness_only_when_both_const() {
        let a = Type::Int(None, IsConst::True);
        let b = Type::Float(None, IsConst::False);
        assert_eq!(a.promote(&b), Type::Float(None, IsConst::False));
        assert_eq!(a.promote(&a), Type::Int(None, IsConst::True));
        assert_eq!(
            Type::Duration(IsConst::True).promote(&a),
            Type::Duration(IsConst::True)
        );
    }

    #[test]
    fn display() {
        assert_eq!(Type::Int(Some(32), IsConst::True).to_string(), "const int[32]");
        assert_eq!(
            Type::Array(Box::new(Type::Int(None, IsConst::False)), 4).to_string(),
            "array[int, 4]"
        );
    }
}
