// Copyright contributors to the openpulse-compiler project
// SPDX-License-Identifier: Apache-2.0

//! Compile-time evaluation of expressions.
//!
//! Only what is needed to time a program is folded: arithmetic on numbers and durations,
//! comparisons, builtin constants and waveform generator calls. Anything that depends on a
//! value not known before run time evaluates to [`EvalError::Dynamic`].

use crate::waveform::{WaveformInfo, WaveformKey};
use hashbrown::HashMap;
use oqp_semantics::asg::{
    ArithOp, BinaryExpr, BinaryOp, BoolOp, Call, CmpOp, Expr, Literal, UnaryExpr, UnaryOp,
};
use oqp_semantics::builtins::{GeneratorRegistry, SAMPLES_PARAM};
use oqp_semantics::symbols::{builtin_value, SymbolId};
use std::fmt;

// Rounding a converted duration by less than this is not reported.
const ROUNDING_TOLERANCE: f64 = 1e-6;

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Complex(f64, f64),
    /// A duration in samples, before rounding.
    Duration(f64),
    Array(Vec<Value>),
    Waveform(WaveformInfo),
}

impl Value {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Int(n) => Some(*n as f64),
            Value::Float(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Bool(b) => Some(i64::from(*b)),
            Value::Int(n) => Some(*n),
            Value::Float(x) if x.fract() == 0.0 && x.is_finite() => Some(*x as i64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::Int(n) => Some(*n != 0),
            _ => None,
        }
    }

    /// Sample arrays are waveforms too.
    pub fn as_waveform(&self) -> Option<WaveformInfo> {
        match self {
            Value::Waveform(info) => Some(info.clone()),
            Value::Array(values) => {
                let samples: Option<Vec<String>> = values
                    .iter()
                    .map(|v| match v {
                        Value::Bool(_) | Value::Int(_) | Value::Float(_) | Value::Complex(..) => {
                            Some(v.key_fragment())
                        }
                        _ => None,
                    })
                    .collect();
                let samples = samples?;
                Some(WaveformInfo::new(
                    WaveformKey::samples(&samples),
                    samples.len() as u64,
                ))
            }
            _ => None,
        }
    }

    /// Canonical rendering used in waveform keys. Integers and floats with the same value
    /// render identically.
    pub fn key_fragment(&self) -> String {
        match self {
            Value::Bool(b) => b.to_string(),
            Value::Int(n) => format!("{:?}", *n as f64),
            Value::Float(x) => format!("{x:?}"),
            Value::Complex(re, im) => format!("{re:?}+{im:?}im"),
            Value::Duration(samples) => format!("{samples:?}dt"),
            Value::Array(values) => {
                let parts: Vec<String> = values.iter().map(Value::key_fragment).collect();
                format!("[{}]", parts.join(", "))
            }
            Value::Waveform(info) => info.key.to_string(),
        }
    }

    fn to_complex(&self) -> Option<(f64, f64)> {
        match self {
            Value::Complex(re, im) => Some((*re, *im)),
            other => other.as_f64().map(|x| (x, 0.0)),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum EvalError {
    /// The value depends on something only known at run time.
    Dynamic(String),
    /// The operation is not defined on its operands.
    Invalid(String),
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalError::Dynamic(what) => write!(f, "{what} is not known at compile time"),
            EvalError::Invalid(what) => f.write_str(what),
        }
    }
}

/// Values of the symbols seen so far. `None` marks a symbol whose value is dynamic.
pub type ConstEnv = HashMap<SymbolId, Option<Value>>;

/// Round a duration in samples to a whole number of samples.
/// Returns the rounded value and whether rounding changed it noticeably.
pub fn round_samples(samples: f64) -> Result<(u64, bool), EvalError> {
    if !samples.is_finite() {
        return Err(EvalError::Invalid("duration is not finite".to_string()));
    }
    let rounded = samples.round();
    if rounded < 0.0 {
        return Err(EvalError::Invalid(format!("negative duration {samples} dt")));
    }
    if rounded >= u64::MAX as f64 {
        return Err(EvalError::Invalid(format!("duration {samples} dt is too long")));
    }
    Ok((rounded as u64, (samples - rounded).abs() > ROUNDING_TOLERANCE))
}

pub struct Evaluator<'a> {
    registry: &'a GeneratorRegistry,
    sample_rate: f64,
}

impl<'a> Evaluator<'a> {
    pub fn new(registry: &'a GeneratorRegistry, sample_rate: f64) -> Evaluator<'a> {
        Evaluator {
            registry,
            sample_rate,
        }
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn eval(&self, expr: &Expr, env: &ConstEnv) -> Result<Value, EvalError> {
        match expr {
            Expr::Literal(literal) => Ok(self.literal(literal)),
            Expr::Identifier(ident) => match ident.symbol().and_then(|symbol| env.get(&symbol)) {
                Some(Some(value)) => Ok(value.clone()),
                Some(None) => Err(EvalError::Dynamic(format!("`{}`", ident.name()))),
                None => builtin_value(ident.name())
                    .map(Value::Float)
                    .ok_or_else(|| EvalError::Dynamic(format!("`{}`", ident.name()))),
            },
            Expr::BinaryExpr(binary) => self.binary(binary, env),
            Expr::UnaryExpr(unary) => self.unary(unary, env),
            Expr::Call(call) => self.call(call, env),
            Expr::ArrayLiteral(elements) => elements
                .iter()
                .map(|element| self.eval(element, env))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
        }
    }

    /// Evaluate a duration expression to whole samples.
    /// The flag is set when the value had to be rounded.
    pub fn duration_samples(&self, expr: &Expr, env: &ConstEnv) -> Result<(u64, bool), EvalError> {
        match self.eval(expr, env)? {
            Value::Duration(samples) => round_samples(samples),
            other => Err(EvalError::Invalid(format!(
                "expected a duration, found {}",
                other.key_fragment()
            ))),
        }
    }

    pub fn waveform(&self, expr: &Expr, env: &ConstEnv) -> Result<WaveformInfo, EvalError> {
        let value = self.eval(expr, env)?;
        value.as_waveform().ok_or_else(|| {
            EvalError::Invalid(format!("expected a waveform, found {}", value.key_fragment()))
        })
    }

    fn literal(&self, literal: &Literal) -> Value {
        match literal {
            Literal::Bool(b) => Value::Bool(*b),
            Literal::Int(n) => Value::Int(*n),
            Literal::Float(x) => Value::Float(*x),
            Literal::Imaginary(im) => Value::Complex(0.0, *im),
            Literal::Duration(duration) => match duration.unit.per_second() {
                None => Value::Duration(duration.value),
                Some(per_second) => Value::Duration(duration.value * self.sample_rate / per_second),
            },
        }
    }

    fn unary(&self, unary: &UnaryExpr, env: &ConstEnv) -> Result<Value, EvalError> {
        let operand = self.eval(&unary.operand, env)?;
        match (unary.op, operand) {
            (UnaryOp::Minus, Value::Int(n)) => n
                .checked_neg()
                .map(Value::Int)
                .ok_or_else(|| EvalError::Invalid("integer overflow".to_string())),
            (UnaryOp::Minus, Value::Float(x)) => Ok(Value::Float(-x)),
            (UnaryOp::Minus, Value::Duration(x)) => Ok(Value::Duration(-x)),
            (UnaryOp::Minus, Value::Complex(re, im)) => Ok(Value::Complex(-re, -im)),
            (UnaryOp::Not, value) => value
                .as_bool()
                .map(|b| Value::Bool(!b))
                .ok_or_else(|| invalid_operand("!", &value)),
            (UnaryOp::Minus, value) => Err(invalid_operand("-", &value)),
        }
    }

    fn binary(&self, binary: &BinaryExpr, env: &ConstEnv) -> Result<Value, EvalError> {
        let left = self.eval(&binary.left, env)?;
        let right = self.eval(&binary.right, env)?;
        match binary.op {
            BinaryOp::ArithOp(op) => arith(op, left, right),
            BinaryOp::CmpOp(op) => compare(op, &left, &right),
            BinaryOp::BoolOp(op) => {
                let (Some(l), Some(r)) = (left.as_bool(), right.as_bool()) else {
                    return Err(EvalError::Invalid("boolean operator on non-boolean".to_string()));
                };
                Ok(Value::Bool(match op {
                    BoolOp::And => l && r,
                    BoolOp::Or => l || r,
                }))
            }
            BinaryOp::ConcatenationOp => match (left.as_waveform(), right.as_waveform()) {
                (Some(l), Some(r)) => Ok(Value::Waveform(l.concat(&r))),
                _ => Err(EvalError::Invalid("`++` on non-waveforms".to_string())),
            },
        }
    }

    fn call(&self, call: &Call, env: &ConstEnv) -> Result<Value, EvalError> {
        let name = call.name.name();
        let Some(generator) = self.registry.get(name) else {
            return Err(EvalError::Dynamic(format!("result of `{name}`")));
        };
        let args = call
            .args
            .iter()
            .map(|arg| self.eval(arg, env))
            .collect::<Result<Vec<_>, _>>()?;
        let samples_at = generator
            .signature()
            .param_index(SAMPLES_PARAM)
            .unwrap_or(0);
        let samples = args
            .get(samples_at)
            .and_then(Value::as_i64)
            .filter(|n| *n >= 0)
            .ok_or_else(|| {
                EvalError::Invalid(format!(
                    "`{name}` needs a non-negative integer number of samples"
                ))
            })?;
        let fragments: Vec<String> = args.iter().map(Value::key_fragment).collect();
        Ok(Value::Waveform(WaveformInfo::new(
            WaveformKey::generated(name, &fragments),
            samples as u64,
        )))
    }
}

fn invalid_operand(op: &str, value: &Value) -> EvalError {
    EvalError::Invalid(format!("`{op}` is not defined for {}", value.key_fragment()))
}

fn arith(op: ArithOp, left: Value, right: Value) -> Result<Value, EvalError> {
    use Value::*;
    let invalid = || EvalError::Invalid(format!("{op:?} is not defined on these operands"));
    match (&left, &right) {
        (Duration(a), Duration(b)) => match op {
            ArithOp::Add => Ok(Duration(a + b)),
            ArithOp::Sub => Ok(Duration(a - b)),
            ArithOp::Div if *b != 0.0 => Ok(Float(a / b)),
            _ => Err(invalid()),
        },
        (Duration(a), scalar) => {
            let x = scalar.as_f64().ok_or_else(invalid)?;
            match op {
                ArithOp::Mul => Ok(Duration(a * x)),
                ArithOp::Div if x != 0.0 => Ok(Duration(a / x)),
                _ => Err(invalid()),
            }
        }
        (scalar, Duration(b)) => {
            let x = scalar.as_f64().ok_or_else(invalid)?;
            match op {
                ArithOp::Mul => Ok(Duration(x * b)),
                _ => Err(invalid()),
            }
        }
        (Complex(..), _) | (_, Complex(..)) => {
            let (a, b) = left.to_complex().ok_or_else(invalid)?;
            let (c, d) = right.to_complex().ok_or_else(invalid)?;
            match op {
                ArithOp::Add => Ok(Complex(a + c, b + d)),
                ArithOp::Sub => Ok(Complex(a - c, b - d)),
                ArithOp::Mul => Ok(Complex(a * c - b * d, a * d + b * c)),
                ArithOp::Div => {
                    let norm = c * c + d * d;
                    if norm == 0.0 {
                        return Err(invalid());
                    }
                    Ok(Complex((a * c + b * d) / norm, (b * c - a * d) / norm))
                }
                _ => Err(invalid()),
            }
        }
        (Int(a), Int(b)) => {
            let (a, b) = (*a, *b);
            let overflow = || EvalError::Invalid("integer overflow".to_string());
            match op {
                ArithOp::Add => a.checked_add(b).map(Int).ok_or_else(overflow),
                ArithOp::Sub => a.checked_sub(b).map(Int).ok_or_else(overflow),
                ArithOp::Mul => a.checked_mul(b).map(Int).ok_or_else(overflow),
                ArithOp::Div if b == 0 => Err(invalid()),
                ArithOp::Div => match (a.checked_rem(b), a.checked_div(b)) {
                    (Some(0), Some(quotient)) => Ok(Int(quotient)),
                    _ => Ok(Float(a as f64 / b as f64)),
                },
                ArithOp::Mod if b == 0 => Err(invalid()),
                ArithOp::Mod => a.checked_rem(b).map(Int).ok_or_else(overflow),
                ArithOp::Pow => match u32::try_from(b) {
                    Ok(exp) => a.checked_pow(exp).map(Int).ok_or_else(overflow),
                    Err(_) => Ok(Float((a as f64).powf(b as f64))),
                },
            }
        }
        _ => {
            let a = left.as_f64().ok_or_else(invalid)?;
            let b = right.as_f64().ok_or_else(invalid)?;
            match op {
                ArithOp::Add => Ok(Float(a + b)),
                ArithOp::Sub => Ok(Float(a - b)),
                ArithOp::Mul => Ok(Float(a * b)),
                ArithOp::Div if b != 0.0 => Ok(Float(a / b)),
                ArithOp::Mod if b != 0.0 => Ok(Float(a % b)),
                ArithOp::Pow => Ok(Float(a.powf(b))),
                _ => Err(invalid()),
            }
        }
    }
}

fn compare(op: CmpOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    let (a, b) = match (left, right) {
        (Value::Duration(a), Value::Duration(b)) => (*a, *b),
        _ => match (left.as_f64(), right.as_f64()) {
            (Some(a), Some(b)) => (a, b),
            _ => return Err(EvalError::Invalid(format!("cannot compare with {op:?}"))),
        },
    };
    Ok(Value::Bool(match op {
        CmpOp::Eq => a == b,
        CmpOp::Neq => a != b,
        CmpOp::Lt => a < b,
        CmpOp::Gt => a > b,
        CmpOp::LtEq => a <= b,
        CmpOp::GtEq => a >= b,
    }))
}
