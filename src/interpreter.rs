//! API to run whole programs.

use crate::closure::Closure;
use crate::evaluator::{self, Unwind};
use crate::lexer::{Lexer, LexerError};
use crate::object::{Context, RuntimeError};
use crate::parser::{ParseError, Parser};
use custom_error::custom_error;
use std::io::{Read, Write};

custom_error! {
    pub MiniPyError
    Lex{source: LexerError} = "lex error: {source}",
    Parse{source: ParseError} = "parse error: {source}",
    Runtime{source: RuntimeError} = "runtime error: {source}",
}

/// Lexes, parses and evaluates a program against a fresh global scope,
/// writing `print` output to `output`.
///
/// # Example
///
/// ```
/// let mut output = Vec::new();
/// minipy::run("print 2 + 2".as_bytes(), &mut output).expect("interpreter error");
/// assert_eq!(output, b"4\n");
/// ```
pub fn run(source: impl Read, output: &mut dyn Write) -> Result<(), MiniPyError> {
    let lexer = Lexer::new(source)?;
    let program = Parser::new(lexer).parse_program()?;
    let mut globals = Closure::new();
    let mut ctx = Context::new(output);
    match evaluator::eval(&program, &mut globals, &mut ctx) {
        Ok(_) => Ok(()),
        Err(Unwind::Error(e)) => Err(e.into()),
        Err(Unwind::Return(_)) => Err(RuntimeError::ReturnOutsideMethod.into()),
    }
}
