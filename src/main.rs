use std::fs;

use clap::Parser;
use miette::{bail, Diagnostic, IntoDiagnostic, NamedSource, Result};

use thiserror::Error;
use tracing::info;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use melc::{compile_and_run_with, CompilationResult, CompileError, Options};

mod cli;

use cli::{Args, Mode};

#[derive(Debug, Error, Diagnostic)]
#[error("Oops, something went wrong")]
struct AppError {
    #[related]
    errs: Vec<CompileError>,

    #[source_code]
    code: NamedSource<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .from_env_lossy(),
        )
        .init();

    let args = Args::parse();

    if !args.input_file.is_file() {
        bail!("No proper input file: {:?}", args.input_file);
    }

    let source = fs::read_to_string(&args.input_file).into_diagnostic()?;
    let options = Options {
        backend: args.backend.into(),
        stop_after: args.mode.last_phase(),
        step_limit: args.max_steps,
    };

    let result = compile_and_run_with(&source, &options);

    // output printed before a runtime error is still shown
    if args.mode == Mode::Run {
        for line in &result.output {
            println!("{line}");
        }
    }

    if !result.success {
        return Err(AppError {
            errs: result.diagnostics,
            code: NamedSource::new(args.input_file.display().to_string(), source),
        }
        .into());
    }

    info!("Pipeline finished after {}", args.mode.last_phase());
    show(args.mode, &result)
}

/// Print the artifact `mode` asks for
fn show(mode: Mode, result: &CompilationResult) -> Result<()> {
    match mode {
        Mode::Tokens => {
            for token in &result.tokens {
                println!("{token}");
            }
        }
        Mode::Parse => {
            if let Some(program) = &result.ast {
                program.pretty_print().into_diagnostic()?;
            }
        }
        Mode::Symbols => {
            for symbol in &result.symbols {
                println!("{symbol}");
            }
        }
        Mode::Ir => {
            if let Some(program) = &result.ir {
                print!("{program}");
            }
        }
        Mode::Optimize => {
            if let (Some(before), Some(after)) = (&result.ir, &result.optimized_ir) {
                println!("# {} instructions, {} before optimization", after.len(), before.len());
                print!("{after}");
            }
        }
        Mode::Run => {}
    }

    Ok(())
}
