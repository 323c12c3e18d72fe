//! # Built-in Functions
//!
//! The builtin function registry shared by both backends, organized into
//! three categories:
//!
//! - **[math]** (8): abs, floor, ceil, round, sqrt, pow, min, max
//! - **[strings]** (9): substring, toUpperCase, toLowerCase, startsWith,
//!   endsWith, contains, indexOf, split, join
//! - **[types]** (7): int, float, string, str, toString, len, length
//!
//! `print`, `println`, and `input` are not in the registry: they need the
//! executing backend's I/O handles and are dispatched there.
//!
//! Builtins are strict in both run modes: a bad operand kind is a type
//! fault rather than a silent zero.

use crate::error::RuntimeError;
use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

pub mod math;
pub mod strings;
pub mod types;

pub type BuiltinFn = fn(&[Value]) -> Result<Value, RuntimeError>;
pub type BuiltinTable = HashMap<&'static str, BuiltinFn>;

/// Build the full registry.
pub fn register_builtins() -> BuiltinTable {
    let mut table = BuiltinTable::new();
    math::register(&mut table);
    strings::register(&mut table);
    types::register(&mut table);
    table
}

// ============================================================================
// Shared argument helpers
// ============================================================================

pub(crate) fn check_arity(
    function: &str,
    args: &[Value],
    expected: usize,
) -> Result<(), RuntimeError> {
    if args.len() != expected {
        return Err(RuntimeError::arity(function, expected, args.len()));
    }
    Ok(())
}

pub(crate) fn number_arg(function: &str, args: &[Value], index: usize) -> Result<f64, RuntimeError> {
    args[index]
        .as_number()
        .ok_or_else(|| RuntimeError::type_error(function, "number", args[index].type_name()))
}

pub(crate) fn string_arg<'a>(
    function: &str,
    args: &'a [Value],
    index: usize,
) -> Result<&'a str, RuntimeError> {
    match &args[index] {
        Value::Str(s) => Ok(s),
        other => Err(RuntimeError::type_error(
            function,
            "string",
            other.type_name(),
        )),
    }
}

pub(crate) fn array_arg(
    function: &str,
    args: &[Value],
    index: usize,
) -> Result<Rc<RefCell<Vec<Value>>>, RuntimeError> {
    match &args[index] {
        Value::Array(a) => Ok(a.clone()),
        other => Err(RuntimeError::type_error(
            function,
            "array",
            other.type_name(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_covers_every_builtin() {
        let table = register_builtins();
        for name in [
            "abs",
            "floor",
            "ceil",
            "round",
            "sqrt",
            "pow",
            "min",
            "max",
            "substring",
            "toUpperCase",
            "toLowerCase",
            "startsWith",
            "endsWith",
            "contains",
            "indexOf",
            "split",
            "join",
            "int",
            "float",
            "string",
            "str",
            "toString",
            "len",
            "length",
        ] {
            assert!(table.contains_key(name), "missing builtin {}", name);
        }
        // I/O builtins are dispatched by the backends, not the registry
        assert!(!table.contains_key("print"));
        assert!(!table.contains_key("input"));
    }
}
