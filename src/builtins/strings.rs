//! String builtins: substring, case conversion, predicates, search, split/join
//!
//! All index arithmetic is in characters, not bytes, so multi-byte input
//! behaves the way a script author expects.

use super::{array_arg, check_arity, number_arg, string_arg, BuiltinTable};
use crate::error::RuntimeError;
use crate::value::Value;

/// `substring(s, start, end?)` — characters from `start` (inclusive) to
/// `end` (exclusive, default: end of string). Indices are clamped to the
/// string, and an empty slice is returned when start >= end.
pub fn builtin_substring(args: &[Value]) -> Result<Value, RuntimeError> {
    if args.len() != 2 && args.len() != 3 {
        return Err(RuntimeError::arity("substring", 2, args.len()));
    }
    let chars: Vec<char> = string_arg("substring", args, 0)?.chars().collect();
    let start = number_arg("substring", args, 1)?.trunc().max(0.0) as usize;
    let end = if args.len() == 3 {
        number_arg("substring", args, 2)?.trunc().max(0.0) as usize
    } else {
        chars.len()
    };
    let start = start.min(chars.len());
    let end = end.min(chars.len());
    if start >= end {
        return Ok(Value::Str(String::new()));
    }
    Ok(Value::Str(chars[start..end].iter().collect()))
}

pub fn builtin_to_upper_case(args: &[Value]) -> Result<Value, RuntimeError> {
    check_arity("toUpperCase", args, 1)?;
    Ok(Value::Str(string_arg("toUpperCase", args, 0)?.to_uppercase()))
}

pub fn builtin_to_lower_case(args: &[Value]) -> Result<Value, RuntimeError> {
    check_arity("toLowerCase", args, 1)?;
    Ok(Value::Str(string_arg("toLowerCase", args, 0)?.to_lowercase()))
}

pub fn builtin_starts_with(args: &[Value]) -> Result<Value, RuntimeError> {
    check_arity("startsWith", args, 2)?;
    let s = string_arg("startsWith", args, 0)?;
    let prefix = string_arg("startsWith", args, 1)?;
    Ok(Value::bool(s.starts_with(prefix)))
}

pub fn builtin_ends_with(args: &[Value]) -> Result<Value, RuntimeError> {
    check_arity("endsWith", args, 2)?;
    let s = string_arg("endsWith", args, 0)?;
    let suffix = string_arg("endsWith", args, 1)?;
    Ok(Value::bool(s.ends_with(suffix)))
}

pub fn builtin_contains(args: &[Value]) -> Result<Value, RuntimeError> {
    check_arity("contains", args, 2)?;
    let s = string_arg("contains", args, 0)?;
    let needle = string_arg("contains", args, 1)?;
    Ok(Value::bool(s.contains(needle)))
}

/// Character index of the first occurrence, or -1.
pub fn builtin_index_of(args: &[Value]) -> Result<Value, RuntimeError> {
    check_arity("indexOf", args, 2)?;
    let s = string_arg("indexOf", args, 0)?;
    let needle = string_arg("indexOf", args, 1)?;
    match s.find(needle) {
        Some(byte_ix) => Ok(Value::Number(s[..byte_ix].chars().count() as f64)),
        None => Ok(Value::Number(-1.0)),
    }
}

/// `split(s, sep)` — array of pieces; an empty separator splits into
/// individual characters.
pub fn builtin_split(args: &[Value]) -> Result<Value, RuntimeError> {
    check_arity("split", args, 2)?;
    let s = string_arg("split", args, 0)?;
    let sep = string_arg("split", args, 1)?;
    let parts: Vec<Value> = if sep.is_empty() {
        s.chars().map(|c| Value::Str(c.to_string())).collect()
    } else {
        s.split(sep).map(|p| Value::Str(p.to_string())).collect()
    };
    Ok(Value::array(parts))
}

/// `join(array, sep)` — stringify each element and glue with `sep`.
pub fn builtin_join(args: &[Value]) -> Result<Value, RuntimeError> {
    check_arity("join", args, 2)?;
    let elements = array_arg("join", args, 0)?;
    let sep = string_arg("join", args, 1)?;
    let joined = elements
        .borrow()
        .iter()
        .map(Value::stringify)
        .collect::<Vec<_>>()
        .join(sep);
    Ok(Value::Str(joined))
}

pub fn register(table: &mut BuiltinTable) {
    table.insert("substring", builtin_substring);
    table.insert("toUpperCase", builtin_to_upper_case);
    table.insert("toLowerCase", builtin_to_lower_case);
    table.insert("startsWith", builtin_starts_with);
    table.insert("endsWith", builtin_ends_with);
    table.insert("contains", builtin_contains);
    table.insert("indexOf", builtin_index_of);
    table.insert("split", builtin_split);
    table.insert("join", builtin_join);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(text: &str) -> Value {
        Value::Str(text.to_string())
    }

    #[test]
    fn test_substring_two_and_three_args() {
        assert_eq!(
            builtin_substring(&[s("hello"), Value::Number(1.0), Value::Number(3.0)]).unwrap(),
            s("el")
        );
        assert_eq!(
            builtin_substring(&[s("hello"), Value::Number(2.0)]).unwrap(),
            s("llo")
        );
    }

    #[test]
    fn test_substring_clamps_out_of_range() {
        assert_eq!(
            builtin_substring(&[s("abc"), Value::Number(1.0), Value::Number(99.0)]).unwrap(),
            s("bc")
        );
        assert_eq!(
            builtin_substring(&[s("abc"), Value::Number(3.0), Value::Number(1.0)]).unwrap(),
            s("")
        );
    }

    #[test]
    fn test_predicates_return_numeric_bools() {
        assert_eq!(
            builtin_starts_with(&[s("hello"), s("he")]).unwrap(),
            Value::Number(1.0)
        );
        assert_eq!(
            builtin_ends_with(&[s("hello"), s("xx")]).unwrap(),
            Value::Number(0.0)
        );
        assert_eq!(
            builtin_contains(&[s("hello"), s("ell")]).unwrap(),
            Value::Number(1.0)
        );
    }

    #[test]
    fn test_index_of_miss_is_minus_one() {
        assert_eq!(
            builtin_index_of(&[s("hello"), s("lo")]).unwrap(),
            Value::Number(3.0)
        );
        assert_eq!(
            builtin_index_of(&[s("hello"), s("z")]).unwrap(),
            Value::Number(-1.0)
        );
    }

    #[test]
    fn test_split_and_join_round() {
        let parts = builtin_split(&[s("a,b,c"), s(",")]).unwrap();
        assert_eq!(
            builtin_join(&[parts, s("-")]).unwrap(),
            s("a-b-c")
        );
    }

    #[test]
    fn test_split_empty_separator_is_chars() {
        let parts = builtin_split(&[s("ab"), s("")]).unwrap();
        assert!(parts.loose_eq(&Value::array(vec![s("a"), s("b")])));
    }

    #[test]
    fn test_join_stringifies_numbers() {
        let arr = Value::array(vec![Value::Number(1.0), Value::Number(2.0)]);
        assert_eq!(builtin_join(&[arr, s(", ")]).unwrap(), s("1, 2"));
    }

    #[test]
    fn test_case_conversion() {
        assert_eq!(builtin_to_upper_case(&[s("aBc")]).unwrap(), s("ABC"));
        assert_eq!(builtin_to_lower_case(&[s("aBc")]).unwrap(), s("abc"));
    }
}
