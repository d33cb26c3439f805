//! Source text to [`Block`]
//!
//! Statements end with `;`. Variables are written `.name` (current scope),
//! `global.name` or as a bare lowercase word. Keywords and built-ins take
//! their arguments either in call form, `max(1, 2)`, or juxtaposed,
//! `max 1 2`; block arguments are always braced.

mod lexer;
mod parser;

pub use lexer::{tokenize, Token, TokenKind};

use crate::ast::Block;
use crate::error::ScriptError;

/// Lex and parse a whole program.
pub fn parse(source: &str) -> Result<Block, ScriptError> {
    let tokens = tokenize(source)?;
    parser::Parser::new(tokens).parse_program()
}
