//! The whole pipeline behind one call
//!
//! [compile_and_run_with] runs lexing, parsing, analysis, lowering, optimization and execution
//! in order. Each phase's artifact is kept in the [CompilationResult], so a caller can show
//! how far a failing program got.

use std::collections::BTreeMap;
use std::fmt;

use miette::Diagnostic;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::ast::{self, Ident};
use crate::parsing::{self, LexError, SyntaxError, Token};
use crate::runtime::interpreter::Interpreter;
use crate::runtime::vm::Vm;
use crate::runtime::{Environment, RuntimeError, Value};
use crate::semantic::{self, SemanticError, Symbol};
use crate::{ir, lowering, optimizer, Position};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    Lexing,
    Parsing,
    Analysis,
    Lowering,
    Optimization,
    Execution,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Phase::Lexing => "lexing",
            Phase::Parsing => "parsing",
            Phase::Analysis => "semantic analysis",
            Phase::Lowering => "lowering",
            Phase::Optimization => "optimization",
            Phase::Execution => "execution",
        })
    }
}

/// Which executor runs the program
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    /// Walk the AST
    #[default]
    Tree,

    /// Execute the optimized IR
    Ir,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    pub backend: Backend,
    /// The last phase to run, the pipeline succeeds once it is done
    pub stop_after: Phase,
    pub step_limit: Option<u64>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            backend: Backend::Tree,
            stop_after: Phase::Execution,
            step_limit: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error, Diagnostic)]
pub enum CompileError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Lexical(#[from] LexError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Syntax(#[from] SyntaxError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Semantic(#[from] SemanticError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Runtime(#[from] RuntimeError),
}

impl CompileError {
    /// The phase that raised the error
    pub fn phase(&self) -> Phase {
        match self {
            CompileError::Lexical(_) => Phase::Lexing,
            CompileError::Syntax(_) => Phase::Parsing,
            CompileError::Semantic(_) => Phase::Analysis,
            CompileError::Runtime(_) => Phase::Execution,
        }
    }

    pub fn position(&self) -> Option<Position> {
        match self {
            CompileError::Lexical(err) => Some(err.span().start),
            CompileError::Syntax(err) => Some(err.span().start),
            CompileError::Semantic(err) => Some(err.span().start),
            CompileError::Runtime(err) => err.span.map(|span| span.start),
        }
    }
}

/// A flat summary of one error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    pub phase: Phase,
    pub message: String,
    pub position: Option<Position>,
}

impl ErrorInfo {
    pub fn line(&self) -> Option<u32> {
        self.position.map(|position| position.line)
    }

    pub fn column(&self) -> Option<u32> {
        self.position.map(|position| position.column)
    }
}

impl From<&CompileError> for ErrorInfo {
    fn from(err: &CompileError) -> Self {
        Self {
            phase: err.phase(),
            message: err.to_string(),
            position: err.position(),
        }
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.position {
            Some(position) => write!(f, "{} error at {position}: {}", self.phase, self.message),
            None => write!(f, "{} error: {}", self.phase, self.message),
        }
    }
}

/// Everything one run produced
///
/// Artifacts of phases that did not run stay empty.
#[derive(Debug, Clone, Default)]
pub struct CompilationResult {
    pub success: bool,
    pub tokens: Vec<Token>,
    pub ast: Option<ast::Program>,
    pub symbols: Vec<Symbol>,
    pub ir: Option<ir::Program>,
    pub optimized_ir: Option<ir::Program>,
    /// Printed lines, also those printed before a runtime error
    pub output: Vec<String>,
    /// Variable values after execution
    pub bindings: BTreeMap<Ident, Value>,
    /// Summary of the first diagnostic
    pub error: Option<ErrorInfo>,
    pub diagnostics: Vec<CompileError>,
}

/// Compile and run `source` with the default [Options]
pub fn compile_and_run(source: &str) -> CompilationResult {
    compile_and_run_with(source, &Options::default())
}

pub fn compile_and_run_with(source: &str, options: &Options) -> CompilationResult {
    let mut result = CompilationResult::default();

    match drive(source, options, &mut result) {
        Ok(()) => result.success = true,
        Err(errs) => {
            result.error = errs.first().map(ErrorInfo::from);
            if let Some(info) = &result.error {
                warn!(phase = %info.phase, "{}", info.message);
            }
            result.diagnostics = errs;
        }
    }

    result
}

fn drive(
    source: &str,
    options: &Options,
    result: &mut CompilationResult,
) -> Result<(), Vec<CompileError>> {
    let fail = |err: CompileError| vec![err];

    result.tokens = parsing::tokenize(source).map_err(|err| fail(err.into()))?;
    debug!(tokens = result.tokens.len(), "lexing successful");
    if options.stop_after == Phase::Lexing {
        return Ok(());
    }

    let program = parsing::parse(&result.tokens).map_err(|err| fail(err.into()))?;
    debug!(statements = program.statements.len(), "parsing successful");
    if options.stop_after == Phase::Parsing {
        result.ast = Some(program);
        return Ok(());
    }

    let analysis = semantic::analyze(program);
    result.symbols = analysis.symbols.symbols().to_vec();
    let ast = result.ast.insert(analysis.program);
    if !analysis.diagnostics.is_empty() {
        return Err(analysis.diagnostics.into_iter().map(Into::into).collect());
    }
    if options.stop_after == Phase::Analysis {
        return Ok(());
    }

    let ir = result.ir.insert(lowering::lower(ast));
    if options.stop_after == Phase::Lowering {
        return Ok(());
    }

    let optimized = result.optimized_ir.insert(optimizer::optimize(ir.clone()));
    if options.stop_after == Phase::Optimization {
        return Ok(());
    }

    let mut env = Environment::new();
    let execution = match options.backend {
        Backend::Tree => Interpreter::new(&mut env)
            .with_step_limit(options.step_limit)
            .run(ast),
        Backend::Ir => Vm::new(&mut env)
            .with_step_limit(options.step_limit)
            .run(optimized),
    };
    info!(backend = ?options.backend, lines = execution.output.len(), "execution finished");

    result.output = execution.output;
    result.bindings = env.into_bindings();
    execution.outcome.map_err(|err| fail(err.into()))
}
