// ABOUTME: Runtime value type shared by the evaluator and the VM

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// A Lyra runtime value. Booleans are encoded as the numbers 1 and 0;
/// `Absent` is the implicit zero produced by uninitialized declarations and
/// functions without an explicit return. Arrays are shared by reference:
/// every alias of an array sees mutations made through any other alias.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Str(String),
    Array(Rc<RefCell<Vec<Value>>>),
    Absent,
}

impl Value {
    /// Wrap element values in a fresh shared array.
    pub fn array(elements: Vec<Value>) -> Value {
        Value::Array(Rc::new(RefCell::new(elements)))
    }

    /// Encode a condition result as 1.0 / 0.0.
    pub fn bool(b: bool) -> Value {
        Value::Number(if b { 1.0 } else { 0.0 })
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::Array(_) => "array",
            Value::Absent => "absent",
        }
    }

    /// Truthiness: non-zero numbers, non-empty strings, and non-empty
    /// arrays are true. `Absent` is false.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Number(n) => *n != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::Array(a) => !a.borrow().is_empty(),
            Value::Absent => false,
        }
    }

    /// Numeric view of the value, if it has one. `Absent` reads as zero.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Absent => Some(0.0),
            _ => None,
        }
    }

    /// Equality for the `==` / `!=` operators and switch-case matching.
    /// `Absent` compares as the number zero; arrays compare by contents.
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Absent, b) => Value::Number(0.0).loose_eq(b),
            (a, Value::Absent) => a.loose_eq(&Value::Number(0.0)),
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => {
                let a = a.borrow();
                let b = b.borrow();
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.loose_eq(y))
            }
            _ => false,
        }
    }

    /// Render the value the way `print` and string concatenation do:
    /// strings appear without quotes.
    pub fn stringify(&self) -> String {
        match self {
            Value::Str(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => {
                // Whole numbers display without a trailing ".0"
                if n.fract() == 0.0 && n.is_finite() {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            Value::Str(s) => write!(f, "\"{}\"", s),
            Value::Array(elements) => {
                write!(f, "[")?;
                for (i, element) in elements.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", element)?;
                }
                write!(f, "]")
            }
            Value::Absent => write!(f, "0"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_display() {
        assert_eq!(Value::Number(42.0).to_string(), "42");
        assert_eq!(Value::Number(-2.5).to_string(), "-2.5");
        assert_eq!(Value::Number(0.0).to_string(), "0");
    }

    #[test]
    fn test_array_display() {
        let arr = Value::array(vec![
            Value::Number(1.0),
            Value::Str("a".to_string()),
            Value::array(vec![Value::Number(2.0)]),
        ]);
        assert_eq!(arr.to_string(), "[1, \"a\", [2]]");
    }

    #[test]
    fn test_stringify_strips_quotes() {
        assert_eq!(Value::Str("hi".to_string()).stringify(), "hi");
        assert_eq!(Value::Number(3.0).stringify(), "3");
        assert_eq!(Value::Absent.stringify(), "0");
    }

    #[test]
    fn test_truthiness() {
        assert!(Value::Number(1.0).is_truthy());
        assert!(!Value::Number(0.0).is_truthy());
        assert!(Value::Str("x".to_string()).is_truthy());
        assert!(!Value::Str(String::new()).is_truthy());
        assert!(!Value::array(vec![]).is_truthy());
        assert!(Value::array(vec![Value::Number(0.0)]).is_truthy());
        assert!(!Value::Absent.is_truthy());
    }

    #[test]
    fn test_loose_eq_absent_is_zero() {
        assert!(Value::Absent.loose_eq(&Value::Number(0.0)));
        assert!(!Value::Absent.loose_eq(&Value::Number(1.0)));
        assert!(!Value::Absent.loose_eq(&Value::Str(String::new())));
    }

    #[test]
    fn test_array_aliasing() {
        let backing = Value::array(vec![Value::Number(1.0)]);
        let alias = backing.clone();
        if let Value::Array(cell) = &backing {
            cell.borrow_mut()[0] = Value::Number(9.0);
        }
        assert!(alias.loose_eq(&Value::array(vec![Value::Number(9.0)])));
    }
}
