//! Numeric builtins: abs, floor, ceil, round, sqrt, pow, min, max

use super::{check_arity, number_arg, BuiltinTable};
use crate::error::RuntimeError;
use crate::value::Value;

pub fn builtin_abs(args: &[Value]) -> Result<Value, RuntimeError> {
    check_arity("abs", args, 1)?;
    Ok(Value::Number(number_arg("abs", args, 0)?.abs()))
}

pub fn builtin_floor(args: &[Value]) -> Result<Value, RuntimeError> {
    check_arity("floor", args, 1)?;
    Ok(Value::Number(number_arg("floor", args, 0)?.floor()))
}

pub fn builtin_ceil(args: &[Value]) -> Result<Value, RuntimeError> {
    check_arity("ceil", args, 1)?;
    Ok(Value::Number(number_arg("ceil", args, 0)?.ceil()))
}

pub fn builtin_round(args: &[Value]) -> Result<Value, RuntimeError> {
    check_arity("round", args, 1)?;
    Ok(Value::Number(number_arg("round", args, 0)?.round()))
}

/// Square root; negatives yield 0 rather than NaN.
pub fn builtin_sqrt(args: &[Value]) -> Result<Value, RuntimeError> {
    check_arity("sqrt", args, 1)?;
    let n = number_arg("sqrt", args, 0)?;
    Ok(Value::Number(if n < 0.0 { 0.0 } else { n.sqrt() }))
}

pub fn builtin_pow(args: &[Value]) -> Result<Value, RuntimeError> {
    check_arity("pow", args, 2)?;
    let base = number_arg("pow", args, 0)?;
    let exp = number_arg("pow", args, 1)?;
    Ok(Value::Number(base.powf(exp)))
}

pub fn builtin_min(args: &[Value]) -> Result<Value, RuntimeError> {
    check_arity("min", args, 2)?;
    let a = number_arg("min", args, 0)?;
    let b = number_arg("min", args, 1)?;
    Ok(Value::Number(a.min(b)))
}

pub fn builtin_max(args: &[Value]) -> Result<Value, RuntimeError> {
    check_arity("max", args, 2)?;
    let a = number_arg("max", args, 0)?;
    let b = number_arg("max", args, 1)?;
    Ok(Value::Number(a.max(b)))
}

pub fn register(table: &mut BuiltinTable) {
    table.insert("abs", builtin_abs);
    table.insert("floor", builtin_floor);
    table.insert("ceil", builtin_ceil);
    table.insert("round", builtin_round);
    table.insert("sqrt", builtin_sqrt);
    table.insert("pow", builtin_pow);
    table.insert("min", builtin_min);
    table.insert("max", builtin_max);
}
