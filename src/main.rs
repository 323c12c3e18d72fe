// ABOUTME: Command-line front-end: file execution, backend selection, and the REPL

use clap::Parser as ClapParser;
use lyra::ast::{Expr, Program, Stmt};
use lyra::bytecode;
use lyra::config::{self, Backend, RunConfig};
use lyra::error::{Diagnostic, Reporter, StderrReporter, SyntaxError, VmError};
use lyra::eval::Interpreter;
use lyra::parser::Parser;
use lyra::scanner::Scanner;
use lyra::vm::Vm;
use rustyline::error::ReadlineError;
use rustyline::{Config, DefaultEditor};
use std::path::{Path, PathBuf};
use std::process;
use std::time::Instant;

/// The Lyra programming language
#[derive(ClapParser, Debug)]
#[command(name = "lyra")]
#[command(version = config::VERSION)]
#[command(about = "Run Lyra programs on the tree-walking or bytecode backend")]
struct CliArgs {
    /// Source file to execute (omit to start the REPL)
    #[arg(value_name = "FILE")]
    script: Option<PathBuf>,

    /// Start the interactive REPL
    #[arg(long)]
    repl: bool,

    /// Dump the token stream and AST before executing
    #[arg(long)]
    debug: bool,

    /// Report pipeline stage timings on stderr
    #[arg(long)]
    profile: bool,

    /// Execute on the bytecode VM instead of the tree-walker
    #[arg(long)]
    bytecode: bool,

    /// Bytecode VM with the peephole pass
    #[arg(long)]
    optimize: bool,

    /// Lenient lexing and evaluation: silent zeros instead of faults
    #[arg(long)]
    lenient: bool,
}

fn main() {
    let args = CliArgs::parse();
    let config = build_run_config(&args);

    let code = if args.repl || args.script.is_none() {
        repl(&config)
    } else {
        run_file(args.script.as_deref().expect("script checked above"), &config)
    };
    process::exit(code);
}

/// Build run configuration from CLI arguments. `--optimize` implies the
/// bytecode backend.
fn build_run_config(args: &CliArgs) -> RunConfig {
    RunConfig {
        lenient: args.lenient,
        backend: if args.bytecode || args.optimize {
            Backend::Bytecode
        } else {
            Backend::TreeWalking
        },
        optimize: args.optimize,
        debug: args.debug,
        profile: args.profile,
    }
}

fn run_file(path: &Path, config: &RunConfig) -> i32 {
    let source = match std::fs::read_to_string(path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("lyra: cannot read {}: {}", path.display(), err);
            return 1;
        }
    };
    execute(&source, config)
}

/// Run one source text through the full pipeline. Returns the process
/// exit code: 0 on success, 1 on reported faults, 2 on internal VM faults.
fn execute(source: &str, config: &RunConfig) -> i32 {
    let mut reporter = StderrReporter;

    let scan_start = Instant::now();
    let scanner = if config.lenient {
        Scanner::lenient(source)
    } else {
        Scanner::new(source)
    };
    let tokens = match scanner.scan() {
        Ok(tokens) => tokens,
        Err(err) => return report_syntax(&mut reporter, &err),
    };
    let scan_time = scan_start.elapsed();

    if config.debug {
        for token in &tokens {
            eprintln!("{:?}", token);
        }
    }

    let parse_start = Instant::now();
    let parser = if config.lenient {
        Parser::lenient(tokens)
    } else {
        Parser::new(tokens)
    };
    let program = match parser.parse() {
        Ok(program) => program,
        Err(err) => return report_syntax(&mut reporter, &err),
    };
    let parse_time = parse_start.elapsed();

    if config.debug {
        match serde_json::to_string_pretty(&program) {
            Ok(json) => eprintln!("{}", json),
            Err(err) => eprintln!("lyra: cannot render AST: {}", err),
        }
    }

    let exec_start = Instant::now();
    let code = match config.backend {
        Backend::TreeWalking => {
            let mut interp = if config.lenient {
                Interpreter::lenient()
            } else {
                Interpreter::new()
            };
            match interp.run(&program) {
                Ok(_) => 0,
                Err(err) => {
                    reporter.report(&Diagnostic::new(err.kind(), err.to_string(), None));
                    1
                }
            }
        }
        Backend::Bytecode => run_bytecode(&program, config, &mut reporter),
    };

    if config.profile {
        eprintln!(
            "[profile] scan {:.3}ms | parse {:.3}ms | exec {:.3}ms",
            scan_time.as_secs_f64() * 1000.0,
            parse_time.as_secs_f64() * 1000.0,
            exec_start.elapsed().as_secs_f64() * 1000.0,
        );
    }
    code
}

fn run_bytecode(program: &Program, config: &RunConfig, reporter: &mut StderrReporter) -> i32 {
    let chunk = match bytecode::compile(program) {
        Ok(chunk) => chunk,
        Err(err) => {
            eprintln!("lyra: {}", err);
            return 1;
        }
    };
    let chunk = if config.optimize {
        bytecode::optimize(&chunk)
    } else {
        chunk
    };
    if config.debug {
        eprint!("{}", bytecode::disassemble(&chunk));
    }
    match Vm::new().run(&chunk) {
        Ok(_) => 0,
        Err(VmError::Runtime(err)) => {
            reporter.report(&Diagnostic::new(err.kind(), err.to_string(), None));
            1
        }
        Err(err) => {
            eprintln!("lyra: internal fault: {}", err);
            2
        }
    }
}

fn report_syntax(reporter: &mut StderrReporter, err: &SyntaxError) -> i32 {
    reporter.report(&Diagnostic::new(err.kind(), err.to_string(), Some(err.line())));
    1
}

// ============================================================================
// REPL
// ============================================================================

fn repl(config: &RunConfig) -> i32 {
    let editor_config = Config::builder().auto_add_history(true).build();
    let mut rl = match DefaultEditor::with_config(editor_config) {
        Ok(editor) => editor,
        Err(err) => {
            eprintln!("lyra: cannot start REPL: {}", err);
            return 1;
        }
    };
    let history_file = ".lyra_history";
    let _ = rl.load_history(history_file);

    println!("{}", config::WELCOME_MESSAGE);
    println!("{}", config::WELCOME_SUBTITLE);
    println!("{}", config::WELCOME_FOOTER);

    // One interpreter for the whole session, so definitions persist
    let mut interp = if config.lenient {
        Interpreter::lenient()
    } else {
        Interpreter::new()
    };

    loop {
        match rl.readline("lyra> ") {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                eval_line(&line, config, &mut interp);
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("Goodbye!");
                break;
            }
            Err(err) => {
                eprintln!("lyra: readline error: {}", err);
                break;
            }
        }
    }

    let _ = rl.save_history(history_file);
    0
}

fn eval_line(line: &str, config: &RunConfig, interp: &mut Interpreter) {
    let scanner = if config.lenient {
        Scanner::lenient(line)
    } else {
        Scanner::new(line)
    };
    let tokens = match scanner.scan() {
        Ok(tokens) => tokens,
        Err(err) => {
            eprintln!("Error: {}", err);
            return;
        }
    };
    let parser = if config.lenient {
        Parser::lenient(tokens)
    } else {
        Parser::new(tokens)
    };
    let program = match parser.parse() {
        Ok(program) => program,
        Err(err) => {
            eprintln!("Error: {}", err);
            return;
        }
    };

    if let Some(expr) = echo_candidate(&program) {
        match interp.eval_expr(expr) {
            Ok(value) => println!("=> {}", value),
            Err(err) => eprintln!("Error: {}", err),
        }
        return;
    }
    if let Err(err) = interp.run(&program) {
        eprintln!("Error: {}", err);
    }
}

/// The expression whose value the REPL should echo: a line consisting of
/// a single bare expression statement. `print`/`println` calls and
/// multi-statement lines run as-is with no echo.
fn echo_candidate(program: &Program) -> Option<&Expr> {
    match program.stmts.as_slice() {
        [Stmt::Expr(expr)] => match expr {
            Expr::Call { name, .. } if name == "print" || name == "println" => None,
            expr => Some(expr),
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lyra::value::Value;
    use std::cell::RefCell;
    use std::io::{self, Write};
    use std::rc::Rc;

    fn cli_args() -> CliArgs {
        CliArgs {
            script: None,
            repl: false,
            debug: false,
            profile: false,
            bytecode: false,
            optimize: false,
            lenient: false,
        }
    }

    fn parse_line(line: &str) -> Program {
        let tokens = Scanner::new(line).scan().unwrap();
        Parser::new(tokens).parse().unwrap()
    }

    /// Cloneable writer so a test can keep a handle on captured output.
    #[derive(Clone, Default)]
    struct SharedBuf(Rc<RefCell<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuf {
        fn text(&self) -> String {
            String::from_utf8(self.0.borrow().clone()).unwrap()
        }
    }

    // ========================================================================
    // Run configuration from CLI arguments
    // ========================================================================

    #[test]
    fn test_build_run_config_defaults_to_tree_walking() {
        let config = build_run_config(&cli_args());
        assert_eq!(config.backend, Backend::TreeWalking);
        assert!(!config.lenient);
        assert!(!config.optimize);
        assert!(!config.debug);
        assert!(!config.profile);
    }

    #[test]
    fn test_build_run_config_bytecode_flag() {
        let args = CliArgs {
            bytecode: true,
            ..cli_args()
        };
        let config = build_run_config(&args);
        assert_eq!(config.backend, Backend::Bytecode);
        assert!(!config.optimize);
    }

    #[test]
    fn test_build_run_config_optimize_implies_bytecode() {
        let args = CliArgs {
            optimize: true,
            ..cli_args()
        };
        let config = build_run_config(&args);
        assert_eq!(config.backend, Backend::Bytecode);
        assert!(config.optimize);
    }

    #[test]
    fn test_build_run_config_threads_lenient() {
        let args = CliArgs {
            lenient: true,
            ..cli_args()
        };
        let config = build_run_config(&args);
        assert!(config.lenient);
        // Lenient mode does not change the backend
        assert_eq!(config.backend, Backend::TreeWalking);
    }

    #[test]
    fn test_build_run_config_debug_and_profile_are_independent() {
        let args = CliArgs {
            debug: true,
            profile: true,
            ..cli_args()
        };
        let config = build_run_config(&args);
        assert!(config.debug);
        assert!(config.profile);
        assert_eq!(config.backend, Backend::TreeWalking);
        assert!(!config.optimize);
    }

    // ========================================================================
    // REPL echo heuristic
    // ========================================================================

    #[test]
    fn test_echo_candidate_bare_expression() {
        let program = parse_line("1 + 2");
        let expr = echo_candidate(&program).expect("bare expression should echo");

        let mut interp = Interpreter::new().with_output(Box::new(SharedBuf::default()));
        let value = interp.eval_expr(expr).unwrap();
        assert_eq!(value, Value::Number(3.0));
        assert_eq!(format!("=> {}", value), "=> 3");
    }

    #[test]
    fn test_echo_candidate_skips_print_calls() {
        assert!(echo_candidate(&parse_line("print(1)")).is_none());
        assert!(echo_candidate(&parse_line("println(\"hi\", 2)")).is_none());
    }

    #[test]
    fn test_echo_candidate_skips_multi_statement_lines() {
        let program = parse_line("var x: i32 = 1 print(x)");
        assert!(echo_candidate(&program).is_none());

        // The line still runs normally through the interpreter
        let buf = SharedBuf::default();
        let mut interp = Interpreter::new().with_output(Box::new(buf.clone()));
        interp.run(&program).unwrap();
        assert_eq!(buf.text(), "1\n");
    }

    #[test]
    fn test_echo_candidate_skips_non_expression_statements() {
        assert!(echo_candidate(&parse_line("var x: i32 = 5")).is_none());
        assert!(echo_candidate(&parse_line("proc f() { }")).is_none());
    }

    #[test]
    fn test_echo_candidate_allows_non_print_calls() {
        let program = parse_line("max(2, 7)");
        let expr = echo_candidate(&program).expect("builtin call should echo");

        let mut interp = Interpreter::new().with_output(Box::new(SharedBuf::default()));
        assert_eq!(interp.eval_expr(expr).unwrap(), Value::Number(7.0));
    }
}
