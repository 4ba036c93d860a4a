//! Command-line interpreter.
//!
//! Interprets the file named by the first argument, or the program fed to
//! stdin when no argument is given. Program output goes to stdout,
//! diagnostics to stderr.

use anyhow::Context as _;
use std::env;
use std::fs::File;
use std::io::{self, Read};

fn main() -> Result<(), anyhow::Error> {
    let mut stdout = io::stdout();
    match env::args().nth(1) {
        Some(path) => {
            let file = File::open(&path).with_context(|| format!("failed to open {}", path))?;
            minipy::run(file, &mut stdout)?;
        }
        None => {
            let mut source = String::new();
            io::stdin().read_to_string(&mut source)?;
            minipy::run(source.as_bytes(), &mut stdout)?;
        }
    }
    Ok(())
}
