use crate::token::Token;
use custom_error::custom_error;
use std::io::{self, Read};

custom_error! {
    pub LexerError
    LeadingSpace = "space at the beginning of the input",
    IndentBeforeToken = "indentation before any token",
    OddIndent = "odd number of spaces in indentation",
    OverIndent = "indented more than one level at once",
    UnterminatedString = "string literal is not terminated",
    UnknownEscape{escape: char} = "unrecognized escape sequence \\{escape}",
    NumberOutOfRange{literal: String} = "number literal out of range: {literal}",
    InvalidUtf8 = "string literal is not valid UTF-8",
    Io{source: io::Error} = "failed to read source: {source}",
}

fn is_letter(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_'
}

/// Tokenizes a whole program up front and exposes a cursor over the result.
///
/// Block structure is reified into the stream: a change in leading-space
/// width produces `Indent`/`Dedent` tokens, line ends produce `Newline`, and
/// the stream always ends with a `Newline` (unless the input was empty),
/// enough `Dedent`s to return to level zero, and a terminal `Eof`.
pub struct Lexer {
    input: Vec<u8>,
    read_position: usize,
    ch: u8,

    tokens: Vec<Token>,
    cursor: usize,
    indent_level: usize,
    at_line_start: bool,
}

impl Lexer {
    pub fn new(mut input: impl Read) -> Result<Self, LexerError> {
        let mut bytes = Vec::new();
        input.read_to_end(&mut bytes)?;

        let mut lexer = Self {
            input: bytes,
            read_position: 0,
            ch: 0,
            tokens: Vec::new(),
            cursor: 0,
            indent_level: 0,
            at_line_start: true,
        };
        lexer.read_char();
        lexer.tokenize()?;
        Ok(lexer)
    }

    pub fn current(&self) -> &Token {
        &self.tokens[self.cursor]
    }

    /// Moves the cursor one token forward and returns the new current token.
    /// Once the cursor reaches `Eof` it stays there.
    pub fn advance(&mut self) -> &Token {
        if self.cursor + 1 < self.tokens.len() {
            self.cursor += 1;
        }
        &self.tokens[self.cursor]
    }

    fn read_char(&mut self) {
        self.ch = *self.input.get(self.read_position).unwrap_or(&0);
        self.read_position += 1;
    }

    fn peek_char(&self) -> u8 {
        *self.input.get(self.read_position).unwrap_or(&0)
    }

    fn push(&mut self, token: Token) {
        self.tokens.push(token);
    }

    fn tokenize(&mut self) -> Result<(), LexerError> {
        if self.ch == b' ' {
            return Err(LexerError::LeadingSpace);
        }
        while self.ch != 0 {
            if self.at_line_start {
                self.start_line()?;
                continue;
            }
            match self.ch {
                b'\n' => {
                    self.push(Token::Newline);
                    self.at_line_start = true;
                    self.read_char();
                }
                b' ' => self.read_char(),
                b'#' => self.skip_comment(),
                b'\'' | b'"' => self.read_string()?,
                b'=' => self.read_digraph(Token::Eq),
                b'<' => self.read_digraph(Token::LessOrEq),
                b'>' => self.read_digraph(Token::GreaterOrEq),
                b'!' => {
                    // A lone "!" is not part of the grammar and is skipped.
                    if self.peek_char() == b'=' {
                        self.read_char();
                        self.push(Token::NotEq);
                    }
                    self.read_char();
                }
                c if c.is_ascii_digit() => self.read_number()?,
                c if is_letter(c) => self.read_word(),
                c => {
                    // Anything else, punctuation included, is left for the
                    // parser to accept or reject.
                    self.push(Token::Char(c));
                    self.read_char();
                }
            }
        }
        self.finish();
        Ok(())
    }

    /// Consumes leading spaces of a physical line. Blank and comment-only
    /// lines produce no tokens and leave the indentation level untouched;
    /// anything else fixes the line's indentation before normal scanning
    /// resumes.
    fn start_line(&mut self) -> Result<(), LexerError> {
        let mut spaces = 0;
        while self.ch == b' ' {
            spaces += 1;
            self.read_char();
        }
        match self.ch {
            0 => Ok(()),
            b'\n' => {
                self.read_char();
                Ok(())
            }
            b'#' => {
                self.skip_comment();
                if self.ch == b'\n' {
                    self.read_char();
                }
                Ok(())
            }
            _ => {
                if spaces > 0 && self.tokens.is_empty() {
                    return Err(LexerError::IndentBeforeToken);
                }
                self.adjust_indent(spaces)?;
                self.at_line_start = false;
                Ok(())
            }
        }
    }

    fn adjust_indent(&mut self, spaces: usize) -> Result<(), LexerError> {
        if spaces % 2 != 0 {
            return Err(LexerError::OddIndent);
        }
        let target = spaces / 2;
        if target > self.indent_level + 1 {
            return Err(LexerError::OverIndent);
        }
        if target == self.indent_level + 1 {
            self.indent_level = target;
            self.push(Token::Indent);
        } else {
            while self.indent_level > target {
                self.indent_level -= 1;
                self.push(Token::Dedent);
            }
        }
        Ok(())
    }

    /// Consumes up to, but not including, the line terminator.
    fn skip_comment(&mut self) {
        while self.ch != 0 && self.ch != b'\n' {
            self.read_char();
        }
    }

    /// `==`, `<=`, `>=` against their single-character fallbacks.
    fn read_digraph(&mut self, double: Token) {
        if self.peek_char() == b'=' {
            self.read_char();
            self.push(double);
        } else {
            self.push(Token::Char(self.ch));
        }
        self.read_char();
    }

    fn read_number(&mut self) -> Result<(), LexerError> {
        let mut literal = String::new();
        if self.ch == b'0' {
            // A leading zero stands alone; following digits start a new token.
            literal.push('0');
            self.read_char();
        } else {
            while self.ch.is_ascii_digit() {
                literal.push(self.ch as char);
                self.read_char();
            }
        }
        match literal.parse::<i32>() {
            Ok(value) => {
                self.push(Token::Number(value));
                Ok(())
            }
            Err(_) => Err(LexerError::NumberOutOfRange { literal }),
        }
    }

    fn read_word(&mut self) {
        let mut word = String::new();
        while is_letter(self.ch) || self.ch.is_ascii_digit() {
            word.push(self.ch as char);
            self.read_char();
        }
        self.push(Token::lookup_word(&word));
    }

    fn read_string(&mut self) -> Result<(), LexerError> {
        let quote = self.ch;
        self.read_char();
        let mut bytes = Vec::new();
        loop {
            match self.ch {
                0 => return Err(LexerError::UnterminatedString),
                c if c == quote => {
                    self.read_char();
                    break;
                }
                b'\\' => {
                    self.read_char();
                    let escaped = match self.ch {
                        b'n' => b'\n',
                        b't' => b'\t',
                        b'r' => b'\r',
                        b'"' => b'"',
                        b'\'' => b'\'',
                        b'\\' => b'\\',
                        0 => return Err(LexerError::UnterminatedString),
                        c => {
                            return Err(LexerError::UnknownEscape {
                                escape: c as char,
                            })
                        }
                    };
                    bytes.push(escaped);
                    self.read_char();
                }
                c => {
                    bytes.push(c);
                    self.read_char();
                }
            }
        }
        match String::from_utf8(bytes) {
            Ok(text) => {
                self.push(Token::String(text));
                Ok(())
            }
            Err(_) => Err(LexerError::InvalidUtf8),
        }
    }

    /// Terminator: a closing `Newline` if the last real token was not one,
    /// `Dedent`s back to level zero, then `Eof`.
    fn finish(&mut self) {
        match self.tokens.last() {
            Some(Token::Newline) | None => {}
            Some(_) => self.tokens.push(Token::Newline),
        }
        while self.indent_level > 0 {
            self.indent_level -= 1;
            self.tokens.push(Token::Dedent);
        }
        self.tokens.push(Token::Eof);
    }
}
