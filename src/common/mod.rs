//! Common types
//!
//! Small types used throughout the crate.

mod names;
mod span;

pub use names::{Label, Temp};
pub use span::{Position, Span};
