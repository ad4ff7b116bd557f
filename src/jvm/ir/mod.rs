//! Typed, statement-level method bodies
//!
//! Bodies are built with [`BodyBuilder`], checked by [`crate::jvm::verifier`], and then attached
//! to their method in the class graph.

mod body;
mod label;
mod stmt;

pub use body::*;
pub use label::*;
pub use stmt::*;
