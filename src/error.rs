// ABOUTME: Error types for scanning, parsing, evaluation, compilation, and the VM

use thiserror::Error;

/// Faults raised while turning source text into an AST. These are fatal to
/// the run: there is no recovery past the first one.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SyntaxError {
    #[error("line {line}: unexpected character '{ch}'")]
    UnexpectedChar { ch: char, line: usize },

    #[error("line {line}: unterminated string literal")]
    UnterminatedString { line: usize },

    #[error("line {line}: malformed number '{lexeme}'")]
    MalformedNumber { lexeme: String, line: usize },

    #[error("line {line}: unexpected token '{found}', expected {expected}")]
    UnexpectedToken {
        found: String,
        expected: String,
        line: usize,
    },

    #[error("line {line}: unexpected end of input, expected {expected}")]
    UnexpectedEnd { expected: String, line: usize },
}

impl SyntaxError {
    /// The fault category: scan-level for character faults, parse-level
    /// for token faults.
    pub fn kind(&self) -> FaultKind {
        match self {
            SyntaxError::UnexpectedChar { .. }
            | SyntaxError::UnterminatedString { .. }
            | SyntaxError::MalformedNumber { .. } => FaultKind::Scan,
            SyntaxError::UnexpectedToken { .. } | SyntaxError::UnexpectedEnd { .. } => {
                FaultKind::Parse
            }
        }
    }

    pub fn line(&self) -> usize {
        match self {
            SyntaxError::UnexpectedChar { line, .. }
            | SyntaxError::UnterminatedString { line }
            | SyntaxError::MalformedNumber { line, .. }
            | SyntaxError::UnexpectedToken { line, .. }
            | SyntaxError::UnexpectedEnd { line, .. } => *line,
        }
    }
}

/// Faults raised while executing a program. Inside a `try` block these are
/// captured and handed to the catch clause; outside one they propagate to
/// the host.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuntimeError {
    #[error("undefined variable '{0}'")]
    UndefinedVariable(String),

    #[error("undefined function '{0}'")]
    UndefinedFunction(String),

    /// Operator or builtin applied to operand kinds it does not accept.
    #[error("{context}: expected {expected}, got {actual}")]
    TypeMismatch {
        context: String,
        expected: String,
        actual: String,
    },

    #[error("division by zero")]
    DivisionByZero,

    #[error("modulo by zero")]
    ModuloByZero,

    #[error("index {index} out of bounds for array of length {len}")]
    IndexOutOfBounds { index: i64, len: usize },

    #[error("{function}: expected {expected} argument{}, got {actual}", if *.expected == 1 { "" } else { "s" })]
    Arity {
        function: String,
        expected: usize,
        actual: usize,
    },

    #[error("input: end of input stream")]
    InputExhausted,
}

impl RuntimeError {
    /// Create a type mismatch fault with context (operator or builtin name).
    pub fn type_error(context: &str, expected: &str, actual: impl Into<String>) -> Self {
        RuntimeError::TypeMismatch {
            context: context.to_string(),
            expected: expected.to_string(),
            actual: actual.into(),
        }
    }

    pub fn arity(function: &str, expected: usize, actual: usize) -> Self {
        RuntimeError::Arity {
            function: function.to_string(),
            expected,
            actual,
        }
    }

    /// The fault category, for diagnostics.
    pub fn kind(&self) -> FaultKind {
        match self {
            RuntimeError::UndefinedVariable(_) | RuntimeError::UndefinedFunction(_) => {
                FaultKind::Name
            }
            RuntimeError::TypeMismatch { .. } => FaultKind::Type,
            RuntimeError::DivisionByZero | RuntimeError::ModuloByZero => FaultKind::Arithmetic,
            RuntimeError::IndexOutOfBounds { .. } => FaultKind::Bounds,
            RuntimeError::Arity { .. } => FaultKind::Arity,
            RuntimeError::InputExhausted => FaultKind::Io,
        }
    }
}

/// Constructs the bytecode backend does not cover. The tree-walking
/// evaluator remains the complete reference implementation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error("the bytecode backend does not support {0}")]
    Unsupported(&'static str),
}

/// Faults raised by the VM. `Runtime` variants follow the §7 taxonomy and
/// exit with code 1; the remaining variants are internal invariant
/// violations (the panic condition) and exit with code 2.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VmError {
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error("vm: stack underflow at instruction {pc}")]
    StackUnderflow { pc: usize },

    #[error("vm: jump to {target} outside program of {len} instructions")]
    BadJump { target: usize, len: usize },

    #[error("vm: constant index {0} out of range")]
    BadConstant(usize),

    #[error("vm: variable slot {0} out of range")]
    BadSlot(usize),
}

impl VmError {
    /// True for core-internal invariant violations (exit code 2).
    pub fn is_internal(&self) -> bool {
        !matches!(self, VmError::Runtime(_))
    }
}

// ============================================================================
// Diagnostic channel
// ============================================================================

/// Abstract fault categories, independent of the concrete error type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    Scan,
    Parse,
    Name,
    Type,
    Arithmetic,
    Bounds,
    Arity,
    Io,
}

impl FaultKind {
    pub fn label(self) -> &'static str {
        match self {
            FaultKind::Scan => "scan error",
            FaultKind::Parse => "syntax error",
            FaultKind::Name => "name error",
            FaultKind::Type => "type error",
            FaultKind::Arithmetic => "arithmetic error",
            FaultKind::Bounds => "bounds error",
            FaultKind::Arity => "arity error",
            FaultKind::Io => "io error",
        }
    }
}

/// One reported fault: category, message, and source line when known.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub kind: FaultKind,
    pub message: String,
    pub line: Option<usize>,
}

impl Diagnostic {
    pub fn new(kind: FaultKind, message: impl Into<String>, line: Option<usize>) -> Self {
        Diagnostic {
            kind,
            message: message.into(),
            line,
        }
    }
}

/// Collaborator that receives one call per reported fault.
pub trait Reporter {
    fn report(&mut self, diagnostic: &Diagnostic);
}

/// Formats each diagnostic on standard error.
#[derive(Debug, Default)]
pub struct StderrReporter;

impl Reporter for StderrReporter {
    fn report(&mut self, diagnostic: &Diagnostic) {
        match diagnostic.line {
            Some(line) => eprintln!(
                "[{} at line {}] {}",
                diagnostic.kind.label(),
                line,
                diagnostic.message
            ),
            None => eprintln!("[{}] {}", diagnostic.kind.label(), diagnostic.message),
        }
    }
}

/// Discards every diagnostic. Used where the caller only cares about the
/// returned error value.
#[derive(Debug, Default)]
pub struct SilentReporter;

impl Reporter for SilentReporter {
    fn report(&mut self, _diagnostic: &Diagnostic) {}
}
