#![allow(dead_code)]

use melc::{compile_and_run_with, Backend, CompilationResult, Options};

/// Run `src` through every phase and fail the test on any error
pub fn run_pipeline(src: &str) -> CompilationResult {
    run_with_backend(src, Backend::Tree)
}

pub fn run_with_backend(src: &str, backend: Backend) -> CompilationResult {
    let options = Options {
        backend,
        ..Options::default()
    };
    let result = compile_and_run_with(src, &options);
    if let Some(error) = &result.error {
        panic!("{error}");
    }
    result
}

/// Run `src` on both backends, expecting the same output from each
pub fn output_of(src: &str) -> Vec<String> {
    let tree = run_with_backend(src, Backend::Tree);
    let ir = run_with_backend(src, Backend::Ir);
    assert_eq!(tree.output, ir.output, "backends disagree");
    assert_eq!(tree.bindings, ir.bindings, "backends leave different variables");
    tree.output
}
