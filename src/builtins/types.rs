//! Conversion and measurement builtins: int, float, string/str/toString, len/length

use super::{check_arity, BuiltinTable};
use crate::error::RuntimeError;
use crate::value::Value;

fn numeric_value(function: &str, arg: &Value) -> Result<f64, RuntimeError> {
    match arg {
        Value::Number(n) => Ok(*n),
        Value::Absent => Ok(0.0),
        Value::Str(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| RuntimeError::type_error(function, "numeric string", format!("\"{}\"", s))),
        other => Err(RuntimeError::type_error(
            function,
            "number or string",
            other.type_name(),
        )),
    }
}

/// Truncate to an integer-valued number.
pub fn builtin_int(args: &[Value]) -> Result<Value, RuntimeError> {
    check_arity("int", args, 1)?;
    Ok(Value::Number(numeric_value("int", &args[0])?.trunc()))
}

pub fn builtin_float(args: &[Value]) -> Result<Value, RuntimeError> {
    check_arity("float", args, 1)?;
    Ok(Value::Number(numeric_value("float", &args[0])?))
}

/// Stringify any value, the way `print` renders it.
pub fn builtin_string(args: &[Value]) -> Result<Value, RuntimeError> {
    check_arity("string", args, 1)?;
    Ok(Value::Str(args[0].stringify()))
}

/// Element count of an array, or character count of a string.
pub fn builtin_len(args: &[Value]) -> Result<Value, RuntimeError> {
    check_arity("len", args, 1)?;
    match &args[0] {
        Value::Str(s) => Ok(Value::Number(s.chars().count() as f64)),
        Value::Array(a) => Ok(Value::Number(a.borrow().len() as f64)),
        other => Err(RuntimeError::type_error(
            "len",
            "string or array",
            other.type_name(),
        )),
    }
}

pub fn register(table: &mut BuiltinTable) {
    table.insert("int", builtin_int);
    table.insert("float", builtin_float);
    table.insert("string", builtin_string);
    table.insert("str", builtin_string);
    table.insert("toString", builtin_string);
    table.insert("len", builtin_len);
    table.insert("length", builtin_len);
}
