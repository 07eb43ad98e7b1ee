#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use tree_lox as lox;

use lox::error::LoxError;
use lox::interpreter::Interpreter;
use lox::output::Output;

/// An output sink that keeps every printed line; clones share one buffer.
#[derive(Clone, Default)]
pub struct Capture(Rc<RefCell<Vec<String>>>);

impl Capture {
    pub fn lines(&self) -> Vec<String> {
        self.0.borrow().clone()
    }
}

impl Output for Capture {
    fn write_line(&mut self, line: &str) {
        self.0.borrow_mut().push(line.to_string());
    }
}

/// A fresh interpreter printing into the returned capture.
pub fn interpreter() -> (Interpreter, Capture) {
    let capture = Capture::default();
    let interpreter = Interpreter::with_output(Box::new(capture.clone()));
    (interpreter, capture)
}

/// Runs `source` in batch mode, returning printed lines and diagnostics.
pub fn run(source: &str) -> (Vec<String>, Vec<LoxError>) {
    let (mut interpreter, capture) = interpreter();
    let errors = lox::run(&mut interpreter, source, false);
    (capture.lines(), errors)
}

/// Runs `source` and asserts it produced no diagnostics.
pub fn run_ok(source: &str) -> Vec<String> {
    let (lines, errors) = run(source);
    let rendered: Vec<String> = errors.iter().map(ToString::to_string).collect();
    assert!(rendered.is_empty(), "unexpected diagnostics: {:?}", rendered);
    lines
}

/// Runs `source` and returns the rendered diagnostics, asserting there is one at least.
pub fn run_err(source: &str) -> Vec<String> {
    let (_, errors) = run(source);
    assert!(!errors.is_empty(), "expected diagnostics for {:?}", source);
    errors.iter().map(ToString::to_string).collect()
}
