// ABOUTME: Version info, REPL banner text, and run configuration for Lyra

pub const VERSION: &str = "1.0.3";
pub const WELCOME_MESSAGE: &str = "Lyra v1.0.3";
pub const WELCOME_SUBTITLE: &str = "A small language with tree-walking and bytecode backends";
pub const WELCOME_FOOTER: &str = "Type an expression, or Ctrl-D to exit.";

/// Which execution engine consumes the AST.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    /// Walk the AST directly (the default).
    #[default]
    TreeWalking,
    /// Compile to bytecode and run it on the stack VM.
    Bytecode,
}

/// Settings shared by the scanner, evaluator, and host front-end.
#[derive(Debug, Clone, Default)]
pub struct RunConfig {
    /// Restore the historical silent behavior: unknown characters are
    /// skipped, unterminated strings accepted, missing names read as 0.
    pub lenient: bool,
    pub backend: Backend,
    /// Apply the peephole pass before running the VM.
    pub optimize: bool,
    /// Dump tokens and the AST before executing.
    pub debug: bool,
    /// Report wall-clock timings for each pipeline stage on stderr.
    pub profile: bool,
}
