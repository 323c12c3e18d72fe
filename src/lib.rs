// ABOUTME: Library module exposing the Lyra core pipeline to hosts and tests

pub mod ast;
pub mod builtins;
pub mod bytecode;
pub mod config;
pub mod env;
pub mod error;
pub mod eval;
pub mod parser;
pub mod scanner;
pub mod value;
pub mod vm;

use ast::Program;
use bytecode::Chunk;
use error::{CompileError, RuntimeError, SyntaxError, VmError};
use scanner::Token;
use value::Value;

/// Tokenize source text (strict mode).
pub fn scan(source: &str) -> Result<Vec<Token>, SyntaxError> {
    scanner::Scanner::new(source).scan()
}

/// Parse a token sequence into a program (strict mode).
pub fn parse(tokens: Vec<Token>) -> Result<Program, SyntaxError> {
    parser::Parser::new(tokens).parse()
}

/// Execute a program on the tree-walking backend, writing to standard
/// output. A top-level `return` yields its value.
pub fn interpret(program: &Program) -> Result<Option<Value>, RuntimeError> {
    eval::Interpreter::new().run(program)
}

/// Compile a program to bytecode.
pub fn compile(program: &Program) -> Result<Chunk, CompileError> {
    bytecode::compile(program)
}

/// Execute a compiled chunk on the VM backend.
pub fn run(chunk: &Chunk) -> Result<(), VmError> {
    vm::Vm::new().run(chunk).map(|_| ())
}
