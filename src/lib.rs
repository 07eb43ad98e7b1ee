//! A tree‑walking interpreter for the Lox language.
//!
//! Source text flows through [`scanner`] → [`parser`] → [`resolver`] →
//! [`interpreter`]. [`run`] drives the whole pipeline for one chunk of
//! source against a long‑lived [`Interpreter`](interpreter::Interpreter).

pub mod ast;
pub mod ast_printer;
pub mod environment;
pub mod error;
pub mod interpreter;
pub mod output;
pub mod parser;
pub mod resolver;
pub mod scanner;
pub mod token;
pub mod value;

use log::{debug, info};

use error::LoxError;
use interpreter::Interpreter;
use parser::Parser;
use resolver::Resolver;

/// Scan, parse, resolve and interpret `source`, returning every diagnostic.
///
/// Lexical errors are reported but do not stop the pipeline. Syntax or
/// resolver errors skip evaluation. A runtime error ends evaluation; with
/// `catch_runtime_errors` it is instead written to the interpreter's output
/// sink and not returned.
pub fn run(interpreter: &mut Interpreter, source: &str, catch_runtime_errors: bool) -> Vec<LoxError> {
    info!("Running {} byte(s) of source", source.len());

    let (tokens, mut diagnostics) = scanner::scan(source);

    let mut parser = Parser::new(&tokens);
    let statements = match parser.parse(true) {
        Ok((statements, 0)) => statements,
        Ok(_) => {
            diagnostics.extend(parser.into_errors());
            debug!("Syntax errors present, skipping evaluation");
            return diagnostics;
        }
        Err(e) => {
            diagnostics.push(e);
            return diagnostics;
        }
    };

    if let Err(errors) = Resolver::new(interpreter).resolve(&statements) {
        diagnostics.extend(errors);
        debug!("Resolver errors present, skipping evaluation");
        return diagnostics;
    }

    if let Err(e) = interpreter.interpret(&statements, catch_runtime_errors) {
        diagnostics.push(e);
    }

    diagnostics
}
