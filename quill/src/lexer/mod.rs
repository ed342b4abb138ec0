//! Lexer implementation using logos

mod token;

pub use token::{LexError, Token};

use crate::ast::{LineIndex, Span};
use crate::error::{CompileError, Result};
use logos::Logos;

/// Tokenize source code
pub fn tokenize(source: &str) -> Result<Vec<(Token, Span)>> {
    let index = LineIndex::new(source);
    let mut tokens = Vec::new();
    let mut lexer = Token::lexer(source);

    while let Some(result) = lexer.next() {
        let span = index.span(source, lexer.span());
        match result {
            Ok(token) => tokens.push((token, span)),
            Err(err) => {
                let message = match err {
                    LexError::IntegerOutOfRange => {
                        format!("Integer literal {} out of range", lexer.slice())
                    }
                    LexError::UnexpectedCharacter => {
                        format!("Unexpected character {:?}", lexer.slice())
                    }
                };
                return Err(CompileError::lexer(message, span));
            }
        }
    }

    Ok(tokens)
}
