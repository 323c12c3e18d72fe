// ABOUTME: Variable environment (globals + activation records) and the function table

use crate::ast::Block;
use crate::value::Value;
use std::collections::HashMap;
use std::rc::Rc;

/// Variable bindings: one globals map plus a stack of call frames. A
/// frame holds only the callee's parameters and locally declared names;
/// lookups fall through the innermost frame straight to globals, so caller
/// locals are invisible inside a call.
#[derive(Debug, Default)]
pub struct Environment {
    globals: HashMap<String, Value>,
    frames: Vec<HashMap<String, Value>>,
}

impl Environment {
    pub fn new() -> Self {
        Environment::default()
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(frame) = self.frames.last() {
            if let Some(value) = frame.get(name) {
                return Some(value.clone());
            }
        }
        self.globals.get(name).cloned()
    }

    /// Bind a name in the current scope: the innermost frame during a
    /// call, the globals otherwise.
    pub fn declare(&mut self, name: String, value: Value) {
        match self.frames.last_mut() {
            Some(frame) => {
                frame.insert(name, value);
            }
            None => {
                self.globals.insert(name, value);
            }
        }
    }

    /// Update an existing binding (innermost frame first, then globals);
    /// unknown names are declared in the current scope.
    pub fn assign(&mut self, name: &str, value: Value) {
        if let Some(frame) = self.frames.last_mut() {
            if frame.contains_key(name) {
                frame.insert(name.to_string(), value);
                return;
            }
        }
        if self.globals.contains_key(name) {
            self.globals.insert(name.to_string(), value);
            return;
        }
        self.declare(name.to_string(), value);
    }

    pub fn push_frame(&mut self) {
        self.frames.push(HashMap::new());
    }

    pub fn pop_frame(&mut self) {
        self.frames.pop();
    }
}

/// A user-defined function as registered by a `proc` definition.
#[derive(Debug, Clone)]
pub struct Function {
    pub params: Vec<String>,
    pub body: Rc<Block>,
}

/// Name → function mapping. Definitions are registered as they are
/// encountered and stay available for the rest of the run; redefinition
/// replaces the earlier body.
#[derive(Debug, Default)]
pub struct FunctionTable {
    entries: HashMap<String, Rc<Function>>,
}

impl FunctionTable {
    pub fn new() -> Self {
        FunctionTable::default()
    }

    pub fn define(&mut self, name: String, function: Function) {
        self.entries.insert(name, Rc::new(function));
    }

    pub fn get(&self, name: &str) -> Option<Rc<Function>> {
        self.entries.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declare_and_get() {
        let mut env = Environment::new();
        env.declare("x".to_string(), Value::Number(42.0));
        assert_eq!(env.get("x"), Some(Value::Number(42.0)));
        assert_eq!(env.get("missing"), None);
    }

    #[test]
    fn test_frame_hides_caller_locals() {
        let mut env = Environment::new();
        env.push_frame();
        env.declare("local".to_string(), Value::Number(1.0));
        env.push_frame();
        assert_eq!(env.get("local"), None);
        env.pop_frame();
        assert_eq!(env.get("local"), Some(Value::Number(1.0)));
    }

    #[test]
    fn test_globals_visible_through_frame() {
        let mut env = Environment::new();
        env.declare("g".to_string(), Value::Number(10.0));
        env.push_frame();
        assert_eq!(env.get("g"), Some(Value::Number(10.0)));
    }

    #[test]
    fn test_frame_shadows_global() {
        let mut env = Environment::new();
        env.declare("x".to_string(), Value::Number(1.0));
        env.push_frame();
        env.declare("x".to_string(), Value::Number(2.0));
        assert_eq!(env.get("x"), Some(Value::Number(2.0)));
        env.pop_frame();
        assert_eq!(env.get("x"), Some(Value::Number(1.0)));
    }

    #[test]
    fn test_assign_reaches_global_from_frame() {
        let mut env = Environment::new();
        env.declare("g".to_string(), Value::Number(1.0));
        env.push_frame();
        env.assign("g", Value::Number(2.0));
        env.pop_frame();
        assert_eq!(env.get("g"), Some(Value::Number(2.0)));
    }

    #[test]
    fn test_assign_unknown_creates_in_current_scope() {
        let mut env = Environment::new();
        env.push_frame();
        env.assign("tmp", Value::Number(5.0));
        assert_eq!(env.get("tmp"), Some(Value::Number(5.0)));
        env.pop_frame();
        assert_eq!(env.get("tmp"), None);
    }

    #[test]
    fn test_function_table_redefinition_wins() {
        let mut table = FunctionTable::new();
        table.define(
            "f".to_string(),
            Function {
                params: vec!["a".to_string()],
                body: Rc::new(vec![]),
            },
        );
        table.define(
            "f".to_string(),
            Function {
                params: vec!["a".to_string(), "b".to_string()],
                body: Rc::new(vec![]),
            },
        );
        assert_eq!(table.get("f").unwrap().params.len(), 2);
        assert!(table.get("missing").is_none());
    }
}
