// ABOUTME: Tree-walking evaluator executing the AST with sentinel-based control flow

use crate::ast::{AssignTarget, BinOp, Block, Expr, Program, Stmt, UnOp};
use crate::builtins::{register_builtins, BuiltinTable};
use crate::env::{Environment, Function, FunctionTable};
use crate::error::{Diagnostic, Reporter, RuntimeError, StderrReporter};
use crate::value::Value;
use std::io::{self, BufRead, Write};
use std::rc::Rc;

/// Result of executing one statement. `Return` unwinds to the enclosing
/// function call (or the top-level run); `Break` and `Continue` are
/// consumed by the nearest enclosing loop.
#[derive(Debug)]
enum Flow {
    Normal,
    Return(Value),
    Break,
    Continue,
}

/// The tree-walking backend. Owns the variable environment, the function
/// table, and the I/O handles used by `print`/`println`/`input`.
pub struct Interpreter {
    env: Environment,
    funcs: FunctionTable,
    builtins: BuiltinTable,
    lenient: bool,
    out: Box<dyn Write>,
    input: Box<dyn BufRead>,
    reporter: Box<dyn Reporter>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Interpreter::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Interpreter {
            env: Environment::new(),
            funcs: FunctionTable::new(),
            builtins: register_builtins(),
            lenient: false,
            out: Box::new(io::stdout()),
            input: Box::new(io::BufReader::new(io::stdin())),
            reporter: Box::new(StderrReporter),
        }
    }

    pub fn lenient() -> Self {
        Interpreter {
            lenient: true,
            ..Interpreter::new()
        }
    }

    pub fn with_output(mut self, out: Box<dyn Write>) -> Self {
        self.out = out;
        self
    }

    pub fn with_input(mut self, input: Box<dyn BufRead>) -> Self {
        self.input = input;
        self
    }

    pub fn with_reporter(mut self, reporter: Box<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Execute a program. A top-level `return` yields its value.
    pub fn run(&mut self, program: &Program) -> Result<Option<Value>, RuntimeError> {
        for stmt in &program.stmts {
            match self.exec_stmt(stmt)? {
                Flow::Return(value) => return Ok(Some(value)),
                // break/continue outside a loop have nothing to unwind
                Flow::Break | Flow::Continue | Flow::Normal => {}
            }
        }
        Ok(None)
    }

    /// Evaluate a single expression against the current environment. Used
    /// by the REPL to echo results.
    pub fn eval_expr(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        self.eval(expr)
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn exec_block(&mut self, block: &Block) -> Result<Flow, RuntimeError> {
        for stmt in block {
            match self.exec_stmt(stmt)? {
                Flow::Normal => {}
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_stmt(&mut self, stmt: &Stmt) -> Result<Flow, RuntimeError> {
        match stmt {
            Stmt::VarDecl { name, init, .. } => {
                let value = match init {
                    Some(expr) => self.eval(expr)?,
                    None => Value::Absent,
                };
                self.env.declare(name.clone(), value);
                Ok(Flow::Normal)
            }
            Stmt::Assign { target, value } => {
                let value = self.eval(value)?;
                match target {
                    AssignTarget::Name(name) => self.env.assign(name, value),
                    AssignTarget::Index { array, index } => {
                        self.assign_element(array, index, value)?;
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::FuncDef {
                name, params, body, ..
            } => {
                let function = Function {
                    params: params.iter().map(|p| p.name.clone()).collect(),
                    body: Rc::new(body.clone()),
                };
                self.funcs.define(name.clone(), function);
                Ok(Flow::Normal)
            }
            Stmt::If {
                cond,
                then_block,
                else_block,
            } => {
                if self.eval(cond)?.is_truthy() {
                    self.exec_block(then_block)
                } else if let Some(block) = else_block {
                    self.exec_block(block)
                } else {
                    Ok(Flow::Normal)
                }
            }
            Stmt::While { cond, body } => {
                while self.eval(cond)?.is_truthy() {
                    match self.exec_block(body)? {
                        Flow::Break => break,
                        Flow::Continue | Flow::Normal => {}
                        flow @ Flow::Return(_) => return Ok(flow),
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::For {
                var,
                iterable,
                body,
            } => self.exec_for(var, iterable, body),
            Stmt::Return(expr) => {
                let value = match expr {
                    Some(expr) => self.eval(expr)?,
                    None => Value::Absent,
                };
                Ok(Flow::Return(value))
            }
            Stmt::Break => Ok(Flow::Break),
            Stmt::Continue => Ok(Flow::Continue),
            Stmt::Try {
                body,
                catch_var,
                catch_block,
            } => match self.exec_block(body) {
                Ok(flow) => Ok(flow),
                Err(err) => {
                    let message = err.to_string();
                    self.reporter
                        .report(&Diagnostic::new(err.kind(), message.clone(), None));
                    if let Some(var) = catch_var {
                        self.env.declare(var.clone(), Value::Str(message));
                    }
                    self.exec_block(catch_block)
                }
            },
            Stmt::Switch {
                scrutinee,
                cases,
                default,
            } => self.exec_switch(scrutinee, cases, default.as_ref()),
            Stmt::Expr(expr) => {
                self.eval(expr)?;
                Ok(Flow::Normal)
            }
        }
    }

    /// Iterate an array's elements, or the integers `0..n` for a numeric
    /// iterable.
    fn exec_for(&mut self, var: &str, iterable: &Expr, body: &Block) -> Result<Flow, RuntimeError> {
        let iterated = self.eval(iterable)?;
        match iterated {
            Value::Array(cell) => {
                let mut i = 0;
                loop {
                    // Live view: mutations during iteration are observable
                    let element = {
                        let elements = cell.borrow();
                        if i >= elements.len() {
                            break;
                        }
                        elements[i].clone()
                    };
                    self.env.assign(var, element);
                    match self.exec_block(body)? {
                        Flow::Break => break,
                        Flow::Continue | Flow::Normal => {}
                        flow @ Flow::Return(_) => return Ok(flow),
                    }
                    i += 1;
                }
                Ok(Flow::Normal)
            }
            other => {
                let count = other.as_number().ok_or_else(|| {
                    RuntimeError::type_error("for", "array or number", other.type_name())
                })?;
                let limit = count.trunc() as i64;
                for i in 0..limit {
                    self.env.assign(var, Value::Number(i as f64));
                    match self.exec_block(body)? {
                        Flow::Break => break,
                        Flow::Continue | Flow::Normal => {}
                        flow @ Flow::Return(_) => return Ok(flow),
                    }
                }
                Ok(Flow::Normal)
            }
        }
    }

    /// C-style switch: the scrutinee is evaluated once, the first matching
    /// case starts execution, and control falls through subsequent case
    /// groups (and the default) until a `break`.
    fn exec_switch(
        &mut self,
        scrutinee: &Expr,
        cases: &[(Expr, Block)],
        default: Option<&Block>,
    ) -> Result<Flow, RuntimeError> {
        let value = self.eval(scrutinee)?;
        let mut matched = None;
        for (i, (label, _)) in cases.iter().enumerate() {
            if value.loose_eq(&self.eval(label)?) {
                matched = Some(i);
                break;
            }
        }
        let groups: Vec<&Block> = match matched {
            Some(i) => cases[i..]
                .iter()
                .map(|(_, block)| block)
                .chain(default)
                .collect(),
            None => default.into_iter().collect(),
        };
        for block in groups {
            match self.exec_block(block)? {
                Flow::Break => return Ok(Flow::Normal),
                Flow::Normal => {}
                // return unwinds further; continue belongs to the loop
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    fn assign_element(
        &mut self,
        array: &Expr,
        index: &Expr,
        value: Value,
    ) -> Result<(), RuntimeError> {
        let target = self.eval(array)?;
        let index = self.eval(index)?;
        match target {
            Value::Array(cell) => {
                let ix = self.array_index(&index, cell.borrow().len())?;
                cell.borrow_mut()[ix] = value;
                Ok(())
            }
            other => Err(RuntimeError::type_error(
                "index assignment",
                "array",
                other.type_name(),
            )),
        }
    }

    fn array_index(&self, index: &Value, len: usize) -> Result<usize, RuntimeError> {
        let n = index
            .as_number()
            .ok_or_else(|| RuntimeError::type_error("index", "number", index.type_name()))?;
        let ix = n.trunc() as i64;
        if ix < 0 || ix as usize >= len {
            return Err(RuntimeError::IndexOutOfBounds { index: ix, len });
        }
        Ok(ix as usize)
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    fn eval(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Number(n) => Ok(Value::Number(*n)),
            Expr::Str(s) => Ok(Value::Str(s.clone())),
            Expr::Ident(name) => match self.env.get(name) {
                Some(value) => Ok(value),
                None if self.lenient => Ok(Value::Number(0.0)),
                None => Err(RuntimeError::UndefinedVariable(name.clone())),
            },
            Expr::Array(elements) => {
                let mut values = Vec::with_capacity(elements.len());
                for element in elements {
                    values.push(self.eval(element)?);
                }
                Ok(Value::array(values))
            }
            Expr::Binary { lhs, op, rhs } => self.eval_binary(lhs, *op, rhs),
            Expr::Unary { op, operand } => {
                let value = self.eval(operand)?;
                match op {
                    UnOp::Not => Ok(Value::bool(!value.is_truthy())),
                    UnOp::Neg => {
                        let n = value.as_number().ok_or_else(|| {
                            RuntimeError::type_error("unary '-'", "number", value.type_name())
                        })?;
                        Ok(Value::Number(-n))
                    }
                }
            }
            Expr::Call { name, args } => self.eval_call(name, args),
            Expr::Index { array, index } => {
                let target = self.eval(array)?;
                let index = self.eval(index)?;
                match target {
                    Value::Array(cell) => {
                        let elements = cell.borrow();
                        let ix = self.array_index(&index, elements.len())?;
                        Ok(elements[ix].clone())
                    }
                    other => Err(RuntimeError::type_error(
                        "index",
                        "array",
                        other.type_name(),
                    )),
                }
            }
            Expr::Member { object, name } => {
                let value = self.eval(object)?;
                match (&value, name.as_str()) {
                    (Value::Array(cell), "length") => {
                        Ok(Value::Number(cell.borrow().len() as f64))
                    }
                    _ if self.lenient => Ok(Value::Number(0.0)),
                    (Value::Array(_), _) => Err(RuntimeError::type_error(
                        "member access",
                        "'length'",
                        format!("'{}'", name),
                    )),
                    _ => Err(RuntimeError::type_error(
                        &format!(".{}", name),
                        "array",
                        value.type_name(),
                    )),
                }
            }
        }
    }

    fn eval_binary(&mut self, lhs: &Expr, op: BinOp, rhs: &Expr) -> Result<Value, RuntimeError> {
        // Logical operators short-circuit; everything else is eager
        match op {
            BinOp::And => {
                if !self.eval(lhs)?.is_truthy() {
                    return Ok(Value::bool(false));
                }
                let rhs = self.eval(rhs)?;
                return Ok(Value::bool(rhs.is_truthy()));
            }
            BinOp::Or => {
                if self.eval(lhs)?.is_truthy() {
                    return Ok(Value::bool(true));
                }
                let rhs = self.eval(rhs)?;
                return Ok(Value::bool(rhs.is_truthy()));
            }
            _ => {}
        }
        let left = self.eval(lhs)?;
        let right = self.eval(rhs)?;
        match op {
            BinOp::Add => match left {
                // String on the left concatenates, stringifying the right
                Value::Str(s) => Ok(Value::Str(s + &right.stringify())),
                _ => {
                    let (a, b) = self.numeric_operands("+", &left, &right)?;
                    Ok(Value::Number(a + b))
                }
            },
            BinOp::Sub => {
                let (a, b) = self.numeric_operands("-", &left, &right)?;
                Ok(Value::Number(a - b))
            }
            BinOp::Mul => {
                let (a, b) = self.numeric_operands("*", &left, &right)?;
                Ok(Value::Number(a * b))
            }
            BinOp::Div => {
                let (a, b) = self.numeric_operands("/", &left, &right)?;
                if b == 0.0 {
                    return Err(RuntimeError::DivisionByZero);
                }
                Ok(Value::Number(a / b))
            }
            BinOp::Mod => {
                let (a, b) = self.numeric_operands("%", &left, &right)?;
                let (a, b) = (a.trunc() as i64, b.trunc() as i64);
                if b == 0 {
                    return Err(RuntimeError::ModuloByZero);
                }
                Ok(Value::Number((a % b) as f64))
            }
            BinOp::Eq => Ok(Value::bool(left.loose_eq(&right))),
            BinOp::Ne => Ok(Value::bool(!left.loose_eq(&right))),
            BinOp::Lt | BinOp::Gt | BinOp::Le | BinOp::Ge => self.compare(op, &left, &right),
            BinOp::Range => {
                let (lo, hi) = self.numeric_operands("..", &left, &right)?;
                let (lo, hi) = (lo.trunc() as i64, hi.trunc() as i64);
                let elements = (lo..hi).map(|i| Value::Number(i as f64)).collect();
                Ok(Value::array(elements))
            }
            BinOp::And | BinOp::Or => unreachable!("handled above"),
        }
    }

    fn numeric_operands(
        &self,
        op: &str,
        left: &Value,
        right: &Value,
    ) -> Result<(f64, f64), RuntimeError> {
        let context = format!("operator '{}'", op);
        let a = left
            .as_number()
            .ok_or_else(|| RuntimeError::type_error(&context, "number", left.type_name()))?;
        let b = right
            .as_number()
            .ok_or_else(|| RuntimeError::type_error(&context, "number", right.type_name()))?;
        Ok((a, b))
    }

    fn compare(&self, op: BinOp, left: &Value, right: &Value) -> Result<Value, RuntimeError> {
        let ordering = match (left, right) {
            (Value::Str(a), Value::Str(b)) => a.partial_cmp(b),
            _ => {
                let a = left.as_number();
                let b = right.as_number();
                match (a, b) {
                    (Some(a), Some(b)) => a.partial_cmp(&b),
                    _ if self.lenient => None,
                    _ => {
                        return Err(RuntimeError::type_error(
                            &format!("operator '{}'", op.symbol()),
                            "two numbers or two strings",
                            format!("{} and {}", left.type_name(), right.type_name()),
                        ))
                    }
                }
            }
        };
        let result = match (op, ordering) {
            (_, None) => false,
            (BinOp::Lt, Some(o)) => o.is_lt(),
            (BinOp::Gt, Some(o)) => o.is_gt(),
            (BinOp::Le, Some(o)) => o.is_le(),
            (BinOp::Ge, Some(o)) => o.is_ge(),
            _ => unreachable!("compare called with non-relational operator"),
        };
        Ok(Value::bool(result))
    }

    // ------------------------------------------------------------------
    // Calls
    // ------------------------------------------------------------------

    fn eval_call(&mut self, name: &str, args: &[Expr]) -> Result<Value, RuntimeError> {
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.eval(arg)?);
        }
        match name {
            // I/O builtins need the interpreter's handles
            "print" | "println" => {
                self.print_line(&values);
                Ok(Value::Absent)
            }
            "input" => {
                if !values.is_empty() {
                    return Err(RuntimeError::arity("input", 0, values.len()));
                }
                self.read_line()
            }
            _ => {
                if let Some(builtin) = self.builtins.get(name) {
                    return builtin(&values);
                }
                self.call_user_function(name, values)
            }
        }
    }

    fn call_user_function(&mut self, name: &str, args: Vec<Value>) -> Result<Value, RuntimeError> {
        let function = self
            .funcs
            .get(name)
            .ok_or_else(|| RuntimeError::UndefinedFunction(name.to_string()))?;
        if args.len() != function.params.len() {
            return Err(RuntimeError::arity(name, function.params.len(), args.len()));
        }
        self.env.push_frame();
        for (param, value) in function.params.iter().zip(args) {
            self.env.declare(param.clone(), value);
        }
        let flow = self.exec_block(&function.body);
        self.env.pop_frame();
        match flow? {
            Flow::Return(value) => Ok(value),
            _ => Ok(Value::Absent),
        }
    }

    /// Stringify the arguments, join with spaces, and emit one line.
    fn print_line(&mut self, args: &[Value]) {
        let text = args.iter().map(Value::stringify).collect::<Vec<_>>().join(" ");
        let _ = writeln!(self.out, "{}", text);
    }

    fn read_line(&mut self) -> Result<Value, RuntimeError> {
        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .map_err(|_| RuntimeError::InputExhausted)?;
        if read == 0 {
            return Err(RuntimeError::InputExhausted);
        }
        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        Ok(Value::Str(line))
    }
}
