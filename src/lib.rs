//! MEL compiler and interpreter
//!
//! The pipeline runs lexing and parsing ([parsing]), then [semantic] analysis, lowering to
//! [ir] ([lowering]), the [optimizer], and finally execution ([runtime]). The usual entry
//! point is [compile_and_run].

pub mod ast;
mod common;
pub mod ir;
pub mod lowering;
pub mod optimizer;
pub mod parsing;
mod pipeline;
pub mod runtime;
pub mod semantic;

pub use common::{Label, Position, Span, Temp};
pub use pipeline::{
    compile_and_run, compile_and_run_with, Backend, CompilationResult, CompileError, ErrorInfo,
    Options, Phase,
};
