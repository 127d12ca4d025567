// File: src/interpreter/operators.rs
//
// Operator dispatch for binary and unary expressions.
//
// Operands are first coerced (Int <-> Bool, depending on the operator
// family), then the handler is looked up by the left operand's type tag and
// the operator. Equality is total across types; every other operator needs
// both operands to share a type that supports it.

use super::value::{Type, Value};
use crate::ast::{BinaryOp, UnaryOp};
use crate::errors::{BrewinError, BrewinResult};

type IntOp = fn(i64, i64) -> BrewinResult<Value>;
type BoolOp = fn(bool, bool) -> Value;
type StrOp = fn(&str, &str) -> Value;

/// Entry in the dispatch table
#[derive(Clone, Copy)]
enum Handler {
    Int(IntOp),
    Bool(BoolOp),
    /// Bool operands evaluated through their integer values
    BoolAsInt(IntOp),
    Str(StrOp),
    /// `==` (true) or `!=` (false), defined for every type
    Equality(bool),
}

fn handler_for(ty: Type, op: BinaryOp) -> Option<Handler> {
    use BinaryOp::*;

    match op {
        Eq => return Some(Handler::Equality(true)),
        Ne => return Some(Handler::Equality(false)),
        _ => {}
    }

    match ty {
        Type::Int => match op {
            Add => Some(Handler::Int(int_add)),
            Sub => Some(Handler::Int(int_sub)),
            Mul => Some(Handler::Int(int_mul)),
            Div => Some(Handler::Int(int_div)),
            Mod => Some(Handler::Int(int_rem)),
            Lt => Some(Handler::Int(|a, b| Ok(Value::Bool(a < b)))),
            Le => Some(Handler::Int(|a, b| Ok(Value::Bool(a <= b)))),
            Gt => Some(Handler::Int(|a, b| Ok(Value::Bool(a > b)))),
            Ge => Some(Handler::Int(|a, b| Ok(Value::Bool(a >= b)))),
            And => Some(Handler::Int(|a, b| Ok(Value::Bool(a != 0 && b != 0)))),
            Or => Some(Handler::Int(|a, b| Ok(Value::Bool(a != 0 || b != 0)))),
            Eq | Ne => None,
        },
        Type::Bool => match op {
            And => Some(Handler::Bool(|a, b| Value::Bool(a && b))),
            Or => Some(Handler::Bool(|a, b| Value::Bool(a || b))),
            Add => Some(Handler::BoolAsInt(int_add)),
            Sub => Some(Handler::BoolAsInt(int_sub)),
            Mul => Some(Handler::BoolAsInt(int_mul)),
            Div => Some(Handler::BoolAsInt(int_div)),
            Mod => Some(Handler::BoolAsInt(int_rem)),
            Lt => Some(Handler::BoolAsInt(|a, b| Ok(Value::Bool(a < b)))),
            Le => Some(Handler::BoolAsInt(|a, b| Ok(Value::Bool(a <= b)))),
            Gt => Some(Handler::BoolAsInt(|a, b| Ok(Value::Bool(a > b)))),
            Ge => Some(Handler::BoolAsInt(|a, b| Ok(Value::Bool(a >= b)))),
            Eq | Ne => None,
        },
        Type::String => match op {
            Add => Some(Handler::Str(|a, b| Value::Str(format!("{}{}", a, b).into()))),
            _ => None,
        },
        Type::Nil | Type::Function | Type::Closure | Type::Object => None,
    }
}

fn overflow(op: &str) -> Box<BrewinError> {
    Box::new(BrewinError::fault(format!("Integer overflow in {} operation", op)))
}

fn int_add(a: i64, b: i64) -> BrewinResult<Value> {
    a.checked_add(b).map(Value::Int).ok_or_else(|| overflow("+"))
}

fn int_sub(a: i64, b: i64) -> BrewinResult<Value> {
    a.checked_sub(b).map(Value::Int).ok_or_else(|| overflow("-"))
}

fn int_mul(a: i64, b: i64) -> BrewinResult<Value> {
    a.checked_mul(b).map(Value::Int).ok_or_else(|| overflow("*"))
}

/// Truncating division, the host `i64` semantics: `-7 / 2 == -3`
fn int_div(a: i64, b: i64) -> BrewinResult<Value> {
    if b == 0 {
        return Err(Box::new(BrewinError::fault("Division by zero")));
    }
    a.checked_div(b).map(Value::Int).ok_or_else(|| overflow("/"))
}

/// Remainder with the sign of the dividend: `-7 % 2 == -1`
fn int_rem(a: i64, b: i64) -> BrewinResult<Value> {
    if b == 0 {
        return Err(Box::new(BrewinError::fault("Division by zero")));
    }
    a.checked_rem(b).map(Value::Int).ok_or_else(|| overflow("%"))
}

fn bool_to_int(b: bool) -> i64 {
    i64::from(b)
}

fn int_to_bool(n: i64) -> bool {
    n != 0
}

/// Implicit Int/Bool conversions applied before dispatch
fn coerce(op: BinaryOp, left: Value, right: Value) -> (Value, Value) {
    if op.is_boolean_context() {
        match (&left, &right) {
            (Value::Int(n), Value::Bool(_)) => return (Value::Bool(int_to_bool(*n)), right),
            (Value::Bool(_), Value::Int(n)) => return (left, Value::Bool(int_to_bool(*n))),
            _ => {}
        }
    } else if op.is_arithmetic() {
        match (&left, &right) {
            (Value::Bool(b), Value::Int(_)) => return (Value::Int(bool_to_int(*b)), right),
            (Value::Int(_), Value::Bool(b)) => return (left, Value::Int(bool_to_int(*b))),
            _ => {}
        }
    }
    (left, right)
}

/// Evaluate `left op right`
pub fn binary(op: BinaryOp, left: Value, right: Value) -> BrewinResult<Value> {
    let (left, right) = coerce(op, left, right);
    let (left_ty, right_ty) = (left.type_of(), right.type_of());

    let incompatible = || {
        Box::new(BrewinError::type_error(format!("Incompatible types for {} operation", op)))
    };

    let handler = handler_for(left_ty, op).ok_or_else(|| {
        Box::new(BrewinError::type_error(format!(
            "Incompatible operator {} for type {}",
            op, left_ty
        )))
    })?;

    match handler {
        Handler::Equality(want_equal) => Ok(Value::Bool(left.same_as(&right) == want_equal)),
        _ if left_ty != right_ty => Err(incompatible()),
        Handler::Int(f) => match (&left, &right) {
            (Value::Int(a), Value::Int(b)) => f(*a, *b),
            _ => Err(incompatible()),
        },
        Handler::BoolAsInt(f) => match (&left, &right) {
            (Value::Bool(a), Value::Bool(b)) => f(bool_to_int(*a), bool_to_int(*b)),
            _ => Err(incompatible()),
        },
        Handler::Bool(f) => match (&left, &right) {
            (Value::Bool(a), Value::Bool(b)) => Ok(f(*a, *b)),
            _ => Err(incompatible()),
        },
        Handler::Str(f) => match (&left, &right) {
            (Value::Str(a), Value::Str(b)) => Ok(f(a, b)),
            _ => Err(incompatible()),
        },
    }
}

/// Evaluate `op operand`
pub fn unary(op: UnaryOp, operand: Value) -> BrewinResult<Value> {
    match (op, operand) {
        (UnaryOp::Neg, Value::Int(n)) => n.checked_neg().map(Value::Int).ok_or_else(|| overflow("-")),
        (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
        (UnaryOp::Not, Value::Int(n)) => Ok(Value::Bool(!int_to_bool(n))),
        (op, operand) => Err(Box::new(BrewinError::type_error(format!(
            "Incompatible type {} for {} operation",
            operand.type_of(),
            op
        )))),
    }
}

/// Interpret an `if`/`while` condition: Bool as is, Int as nonzero
pub fn condition(value: &Value, construct: &str) -> BrewinResult<bool> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Int(n) => Ok(int_to_bool(*n)),
        other => Err(Box::new(BrewinError::type_error(format!(
            "Incompatible type {} for {} condition",
            other.type_of(),
            construct
        )))),
    }
}
