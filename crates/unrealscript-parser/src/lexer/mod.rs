//! Lexical analysis for UnrealScript.

mod cursor;
#[allow(clippy::module_inception)]
mod lexer;
mod token;

pub use cursor::{SourcePos, is_ident_continue, is_ident_start};
pub use lexer::{LexCheckpoint, Lexer};
pub use token::{DIGRAPHS, Token, TokenKind};
