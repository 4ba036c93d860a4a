//! A tree-walking interpreter for a small dynamically-typed,
//! indentation-structured object-oriented scripting language.
//!
//! The language has 32-bit integers, strings, booleans, `None`,
//! single-inheritance classes with dunder special methods (`__init__`,
//! `__str__`, `__eq__`, `__lt__`, `__add__`), `if`/`else`, and a `print`
//! statement. Blocks are two-spaces-per-level indentation, reified by the
//! lexer into `Indent`/`Dedent` tokens.
//!
//! A program flows bytes → [`Lexer`] → tokens → [`Parser`] → statement tree
//! → [`evaluator::eval`] → values plus `print` side effects on a
//! caller-supplied sink. [`interpreter::run`] ties the stages together.
//!
//! # Example
//!
//! ```
//! let program = r#"
//! class Greeter:
//!   def __init__(name):
//!     self.name = name
//!   def __str__():
//!     return 'hello, ' + self.name
//!
//! print Greeter('world')
//! "#;
//!
//! let mut output = Vec::new();
//! minipy::run(program.as_bytes(), &mut output).expect("interpreter error");
//! assert_eq!(output, b"hello, world\n");
//! ```

pub mod ast;
pub mod closure;
pub mod evaluator;
pub mod interpreter;
pub mod lexer;
pub mod object;
pub mod parser;
pub mod token;

pub use interpreter::{run, MiniPyError};
pub use lexer::Lexer;
pub use parser::Parser;
