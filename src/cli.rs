use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use melc::Phase;

#[derive(Debug, Parser)]
#[command(version, about = None, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Source code input file
    pub input_file: PathBuf,

    /// What to show
    #[arg(value_enum)]
    #[arg(short, long)]
    #[arg(default_value_t = Mode::Run)]
    pub mode: Mode,

    /// Which executor runs the program
    #[arg(value_enum)]
    #[arg(short, long)]
    #[arg(default_value_t = Backend::Tree)]
    pub backend: Backend,

    /// Abort execution after this many steps
    #[arg(long)]
    pub max_steps: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// List the tokens of the source code
    Tokens,

    /// Inspect the AST of the parsed source code
    Parse,

    /// List the declared variables
    Symbols,

    /// Inspect the IR of the lowered AST
    Ir,

    /// Inspect the optimized IR
    Optimize,

    /// Run the program and print its output
    Run,
}

impl Mode {
    /// The last pipeline phase this mode needs
    pub fn last_phase(self) -> Phase {
        match self {
            Mode::Tokens => Phase::Lexing,
            Mode::Parse => Phase::Parsing,
            Mode::Symbols => Phase::Analysis,
            Mode::Ir => Phase::Lowering,
            Mode::Optimize => Phase::Optimization,
            Mode::Run => Phase::Execution,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// Walk the syntax tree
    Tree,

    /// Execute the optimized IR
    Ir,
}

impl From<Backend> for melc::Backend {
    fn from(backend: Backend) -> Self {
        match backend {
            Backend::Tree => melc::Backend::Tree,
            Backend::Ir => melc::Backend::Ir,
        }
    }
}
