//! UnrealScript Parser crate.
//!
//! Provides the backtracking tokenizer the compiler passes are written
//! against. There is no syntax tree: both compiler passes read tokens
//! directly and rewind with checkpoints when an interpretation fails.
//!
//! # Example
//!
//! ```
//! use unrealscript_parser::Lexer;
//!
//! let mut lexer = Lexer::new("var int Health;");
//! let token = lexer.get_token(true).unwrap();
//! assert!(token.matches_identifier("var"));
//! ```

pub mod lexer;

pub use lexer::{LexCheckpoint, Lexer, SourcePos, Token, TokenKind};
