// ABOUTME: End-to-end language tests running full source programs through the tree-walker

use lyra::error::{RuntimeError, SilentReporter};
use lyra::eval::Interpreter;
use lyra::parser::Parser;
use lyra::scanner::Scanner;
use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

/// Cloneable writer so tests can keep a handle on captured output.
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

/// Run a source program and capture its stdout.
fn run(source: &str) -> Result<String, RuntimeError> {
    let tokens = Scanner::new(source).scan().expect("scan failed");
    let program = Parser::new(tokens).parse().expect("parse failed");
    let buf = SharedBuf::default();
    let mut interp = Interpreter::new()
        .with_output(Box::new(buf.clone()))
        .with_reporter(Box::new(SilentReporter));
    interp.run(&program)?;
    Ok(buf.text())
}

fn run_ok(source: &str) -> String {
    run(source).expect("program faulted")
}

// ============================================================================
// The end-to-end scenarios
// ============================================================================

#[test]
fn test_scenario_variables_and_print() {
    assert_eq!(
        run_ok("var x: i32 = 10 var y: i32 = 20 print(\"Result:\", x + y)"),
        "Result: 30\n"
    );
}

#[test]
fn test_scenario_while_loop() {
    assert_eq!(
        run_ok("var s: i32 = 0 var i: i32 = 0 while i < 5 { s = s + i; i = i + 1 } print(s)"),
        "10\n"
    );
}

#[test]
fn test_scenario_function_definition() {
    assert_eq!(
        run_ok("proc add(a, b) -> i32 { return a + b } print(add(3, 4))"),
        "7\n"
    );
}

#[test]
fn test_scenario_arrays_and_length() {
    assert_eq!(
        run_ok("var a: [i32] = [10, 20, 30] print(a[1], a.length)"),
        "20 3\n"
    );
}

#[test]
fn test_scenario_try_catch() {
    assert_eq!(
        run_ok("try { var z: i32 = 1 / 0 print(z) } catch (e) { print(\"caught\") }"),
        "caught\n"
    );
}

#[test]
fn test_scenario_switch_fall_through() {
    let source = "
        switch 2 {
            case 1: print(\"one\")
            case 2: print(\"two\")
            case 3: print(\"three\") break
            default: print(\"other\")
        }
    ";
    assert_eq!(run_ok(source), "two\nthree\n");
}

// ============================================================================
// Control flow invariants
// ============================================================================

#[test]
fn test_break_only_exits_innermost_loop() {
    let source = "
        var log: string = \"\"
        var i: i32 = 0
        while i < 3 {
            var j: i32 = 0
            while j < 3 {
                if j == 1 { break }
                log = log + i + \",\"
                j = j + 1
            }
            i = i + 1
        }
        print(log)
    ";
    assert_eq!(run_ok(source), "0,1,2,\n");
}

#[test]
fn test_continue_only_advances_innermost_loop() {
    let source = "
        var total: i32 = 0
        for i in 3 {
            for j in 3 {
                if j == 0 { continue }
                total = total + 1
            }
        }
        print(total)
    ";
    assert_eq!(run_ok(source), "6\n");
}

#[test]
fn test_return_unwinds_from_nested_blocks() {
    let source = "
        proc classify(n) -> string {
            if n > 0 {
                for i in 10 {
                    if i == n {
                        return \"small\"
                    }
                }
                return \"large\"
            }
            return \"non-positive\"
        }
        print(classify(3), classify(50), classify(-1))
    ";
    assert_eq!(run_ok(source), "small large non-positive\n");
}

#[test]
fn test_switch_without_break_falls_into_default() {
    let source = "
        switch 3 {
            case 3: print(\"three\")
            default: print(\"default-too\")
        }
    ";
    assert_eq!(run_ok(source), "three\ndefault-too\n");
}

// ============================================================================
// Fault localization
// ============================================================================

#[test]
fn test_division_fault_outside_try_propagates() {
    let err = run("var z: i32 = 1 / 0 print(z)").unwrap_err();
    assert_eq!(err, RuntimeError::DivisionByZero);
}

#[test]
fn test_catch_variable_carries_message() {
    assert_eq!(
        run_ok("try { var a: [i32] = [1] print(a[9]) } catch (e) { print(e) }"),
        "index 9 out of bounds for array of length 1\n"
    );
}

#[test]
fn test_side_effects_before_fault_are_kept() {
    let source = "
        print(\"first\")
        try { print(1 / 0) } catch { print(\"second\") }
    ";
    assert_eq!(run_ok(source), "first\nsecond\n");
}

// ============================================================================
// Programs mixing the pieces
// ============================================================================

#[test]
fn test_fizzbuzz_fragment() {
    let source = "
        var out: string = \"\"
        for i in 1..6 {
            if i % 3 == 0 {
                out = out + \"fizz \"
            } else {
                out = out + i + \" \"
            }
        }
        print(out)
    ";
    assert_eq!(run_ok(source), "1 2 fizz 4 5 \n");
}

#[test]
fn test_array_pipeline_with_builtins() {
    let source = "
        var words: [string] = split(\"lyra is small\", \" \")
        var shouted: [string] = [\"\", \"\", \"\"]
        for i in words.length {
            shouted[i] = toUpperCase(words[i])
        }
        print(join(shouted, \"!\"))
    ";
    assert_eq!(run_ok(source), "LYRA!IS!SMALL\n");
}

#[test]
fn test_functions_compose_with_globals() {
    let source = "
        var calls: i32 = 0
        proc double(n) -> i32 {
            calls = calls + 1
            return n * 2
        }
        print(double(double(double(1))), calls)
    ";
    assert_eq!(run_ok(source), "8 3\n");
}

#[test]
fn test_string_number_concatenation() {
    assert_eq!(
        run_ok("var score: i32 = 95 print(\"score: \" + score + \"%\")"),
        "score: 95%\n"
    );
}
