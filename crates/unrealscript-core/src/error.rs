//! Unified error types for UnrealScript compilation.
//!
//! ## Error Hierarchy
//!
//! ```text
//! UnrealScriptError (top-level wrapper)
//! ├── LexError      - tokenizer errors, always fatal to the current class
//! ├── RegistrationError - duplicate or conflicting reflection objects
//! ├── CompileError  - declaration, type and internal errors raised by a pass
//! └── BuildError    - orchestration failures in the batch driver
//! ```
//!
//! Lexical errors convert into [`CompileError`] so `?` works across the
//! tokenizer/compiler seam. A `CompileError` unwinds to the per-class compile
//! boundary; a `BuildError` is what the driver reports for the batch.

use std::path::PathBuf;

use thiserror::Error;

use crate::Span;

// ============================================================================
// Lexer Errors
// ============================================================================

/// Errors that occur while reading tokens from script text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    /// A `/* */` comment ran to end of file.
    #[error("End of file encountered in comment")]
    UnterminatedComment { span: Span },

    /// A string literal ran to end of line or end of file.
    #[error("Unterminated string constant")]
    UnterminatedString { span: Span },

    /// A name literal ran to end of line or end of file.
    #[error("Unterminated name constant")]
    UnterminatedName { span: Span },

    /// An identifier exceeded the maximum length.
    #[error("Identifier length exceeds maximum of {max}")]
    IdentifierTooLong { span: Span, max: usize },

    /// A string literal exceeded the maximum length.
    #[error("String constant is too long (maximum {max})")]
    StringTooLong { span: Span, max: usize },

    /// A name literal exceeded the maximum length.
    #[error("Name constant is too long (maximum {max})")]
    NameTooLong { span: Span, max: usize },

    /// A name literal contained characters that are not valid in a name.
    #[error("Invalid character in name constant '{text}'")]
    InvalidName { span: Span, text: String },

    /// A numeric literal could not be parsed.
    #[error("Bad numeric constant '{text}'")]
    InvalidNumber { span: Span, text: String },

    /// End of file in the middle of a construct that needs more text.
    #[error("Unexpected end of file in {context}")]
    UnexpectedEof { span: Span, context: &'static str },
}

impl LexError {
    /// Get the span where this error occurred.
    pub fn span(&self) -> Span {
        match self {
            LexError::UnterminatedComment { span }
            | LexError::UnterminatedString { span }
            | LexError::UnterminatedName { span }
            | LexError::IdentifierTooLong { span, .. }
            | LexError::StringTooLong { span, .. }
            | LexError::NameTooLong { span, .. }
            | LexError::InvalidName { span, .. }
            | LexError::InvalidNumber { span, .. }
            | LexError::UnexpectedEof { span, .. } => *span,
        }
    }
}

// ============================================================================
// Registration Errors
// ============================================================================

/// Errors raised when adding objects to the reflection graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// A class with this name already exists.
    #[error("Class '{0}' already exists")]
    DuplicateClass(String),

    /// A struct with this name already exists.
    #[error("Struct '{0}' conflicts with an existing struct")]
    DuplicateStruct(String),

    /// An enum with this name already exists.
    #[error("Enum '{0}' conflicts with an existing enum")]
    DuplicateEnum(String),

    /// A field with this name already exists in the same scope.
    #[error("'{name}' conflicts with an existing {kind} in '{scope}'")]
    DuplicateField {
        name: String,
        kind: &'static str,
        scope: String,
    },
}

// ============================================================================
// Compile Errors
// ============================================================================

/// Categories of compile errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompileErrorKind {
    /// Malformed literal, unterminated comment, over-long identifier.
    Lexical,
    /// Duplicate symbol, illegal modifier combination, unresolved type.
    Declaration,
    /// Missing expression, type mismatch, ambiguous operator, bad lvalue.
    Type,
    /// Broken compiler invariant (missing metadata, unbalanced nest).
    Internal,
}

impl CompileErrorKind {
    /// Human-readable name for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            CompileErrorKind::Lexical => "lexical error",
            CompileErrorKind::Declaration => "declaration error",
            CompileErrorKind::Type => "type error",
            CompileErrorKind::Internal => "internal error",
        }
    }
}

impl std::fmt::Display for CompileErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error that aborts compilation of the current class.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CompileError {
    /// Formatted message shown to the user.
    pub message: String,
    /// Source line (1-indexed), or 0 when unknown.
    pub line: u32,
    /// Source column (1-indexed), or 0 when unknown.
    pub column: u32,
    /// Which family of error this is.
    pub kind: CompileErrorKind,
}

impl CompileError {
    /// Create an error of the given kind at a span.
    pub fn new(kind: CompileErrorKind, message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            line: span.line,
            column: span.col,
            kind,
        }
    }

    /// A declaration error.
    pub fn declaration(message: impl Into<String>, span: Span) -> Self {
        Self::new(CompileErrorKind::Declaration, message, span)
    }

    /// A type error.
    pub fn type_error(message: impl Into<String>, span: Span) -> Self {
        Self::new(CompileErrorKind::Type, message, span)
    }

    /// An internal consistency failure.
    pub fn internal(message: impl Into<String>, span: Span) -> Self {
        Self::new(CompileErrorKind::Internal, message, span)
    }

    /// The location of this error.
    pub fn span(&self) -> Span {
        Span::point(self.line, self.column)
    }

    /// Render as a `File(Line) : Error, message` log line.
    pub fn log_line(&self, file: &str) -> String {
        format!("{}({}) : Error, {}", file, self.line, self.message)
    }
}

impl From<LexError> for CompileError {
    fn from(err: LexError) -> Self {
        let span = err.span();
        Self::new(CompileErrorKind::Lexical, err.to_string(), span)
    }
}

/// Severity of a non-fatal diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    /// Informational note.
    Info,
    /// Warning, does not fail the build.
    Warning,
    /// Error, fails the build.
    Error,
}

// ============================================================================
// Build Errors
// ============================================================================

/// Orchestration failures reported by the batch driver.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Classes depend on each other through `DependsOn`.
    #[error("Circular dependency detected between classes: {}", classes.join(", "))]
    CircularDependency { classes: Vec<String> },

    /// A `DependsOn` entry names a class that does not exist.
    #[error("Unknown class '{dependency}' in DependsOn of '{class}'")]
    UnresolvedDependency { class: String, dependency: String },

    /// A class was not compiled because a class it needs failed.
    #[error("'{class}' was not compiled because '{dependency}' failed")]
    DependencyFailed { class: String, dependency: String },

    /// A class extends a class that was never declared.
    #[error("Superclass '{super_name}' of class '{class}' not found")]
    MissingSuper { class: String, super_name: String },

    /// The default-properties fixed point made no progress. Each entry names
    /// a stuck class and the class it is waiting on.
    #[error("Failed to import default properties, no progress for: {}", classes.join(", "))]
    DefaultsStalled { classes: Vec<String> },

    /// A class failed while bootstrapping, which aborts the batch.
    #[error("Bootstrap compile of '{class}' failed: {source}")]
    Bootstrap {
        class: String,
        #[source]
        source: CompileError,
    },

    /// One or more classes failed; see the log for details.
    #[error("{count} class(es) failed to compile")]
    ClassesFailed { count: usize },

    /// Configuration was malformed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// File system failure.
    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl BuildError {
    /// Wrap an io error with the path it concerns.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BuildError::Io {
            path: path.into(),
            source,
        }
    }
}

// ============================================================================
// Unified Error
// ============================================================================

/// Top-level error wrapping every phase.
#[derive(Debug, Error)]
pub enum UnrealScriptError {
    /// Tokenizer error.
    #[error(transparent)]
    Lex(#[from] LexError),

    /// Class compile error.
    #[error(transparent)]
    Compile(#[from] CompileError),

    /// Reflection graph error.
    #[error(transparent)]
    Registration(#[from] RegistrationError),

    /// Driver error.
    #[error(transparent)]
    Build(#[from] BuildError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lex_error_converts_to_lexical_compile_error() {
        let lex = LexError::UnterminatedString {
            span: Span::new(12, 4, 1),
        };
        let err: CompileError = lex.into();
        assert_eq!(err.kind, CompileErrorKind::Lexical);
        assert_eq!(err.line, 12);
        assert_eq!(err.column, 4);
        assert_eq!(err.message, "Unterminated string constant");
    }

    #[test]
    fn compile_error_log_line() {
        let err = CompileError::type_error("Type mismatch in '='", Span::new(40, 9, 1));
        assert_eq!(
            err.log_line("Pawn.uc"),
            "Pawn.uc(40) : Error, Type mismatch in '='"
        );
    }

    #[test]
    fn build_error_messages() {
        let err = BuildError::CircularDependency {
            classes: vec!["A".into(), "B".into()],
        };
        assert_eq!(
            err.to_string(),
            "Circular dependency detected between classes: A, B"
        );
        let wrapped: UnrealScriptError = err.into();
        assert!(matches!(wrapped, UnrealScriptError::Build(_)));
    }
}
