//! A small evaluator for a Lisp-family expression language.
//!
//! Text is split into tokens by [`parser::tokenize`], assembled into an
//! [`Expression`] tree by [`parser::Reader`] and reduced to a value by
//! [`Expression::eval`] against a chain of [`interpreter::Context`] frames.

pub mod config;
pub mod error;
pub mod functions;
pub mod interpreter;
pub mod logger;
pub mod number;
pub mod parser;
pub mod repl;
pub mod syntax;

pub use config::{CaseFold, Config};
pub use error::{LispError, LispResult};
pub use interpreter::{Context, ContextRef, Interpreter};
pub use syntax::Expression;
