//! The per-class compiler.
//!
//! A [`ScriptCompiler`] owns the tokenizer over one class's source and
//! borrows the batch's [`CompilationSession`] and [`Registry`]. The same
//! value runs either pass:
//!
//! - [`compile_declarations`](ScriptCompiler::compile_declarations) builds
//!   the class's reflection objects and records where code lives.
//! - [`compile_code`](ScriptCompiler::compile_code) emits bytecode for every
//!   function body, state and replication block.
//!
//! The work is split across `impl ScriptCompiler` blocks: `declare` for the
//! declaration pass, `expr` and `stmt` for code, `body` for per-function
//! driving and `replication` for the replication block.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use unrealscript_core::{
    ClassId, CompileError, FunctionFlags, FunctionId, Name, PropertyBase,
    PropertyFlags, PropertyId, Span, StateId,
};
use unrealscript_parser::{Lexer, Token};
use unrealscript_registry::{ClassEntry, Registry};

use crate::bytecode::ScriptBuffer;
use crate::expr_info::{ExprInfo, LocalRef};
use crate::metadata::ClassMetaData;
use crate::nest::{AllowFlags, NestStack};
use crate::session::CompilationSession;

/// Result type for compiler operations.
pub type Result<T> = std::result::Result<T, CompileError>;

/// Which pass a compile runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompilePass {
    /// Declarations only; bodies are skipped and their positions recorded.
    Declarations,
    /// Bytecode for bodies, state code and replication conditions.
    Code,
}

impl CompilePass {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompilePass::Declarations => "declarations",
            CompilePass::Code => "code",
        }
    }
}

/// How a local variable has been used so far in the current function.
#[derive(Debug, Clone, Default)]
pub(crate) struct LocalUsage {
    pub reads: u32,
    pub assigned: bool,
    /// Lines of reads seen before any assignment.
    pub unassigned_reads: Vec<u32>,
    pub declared_line: u32,
}

/// Compiles one class.
pub struct ScriptCompiler<'a> {
    pub(crate) session: &'a mut CompilationSession,
    pub(crate) registry: &'a mut Registry,
    pub(crate) lexer: Lexer,
    pub(crate) file: String,
    pub(crate) class: ClassId,
    pub(crate) nests: NestStack,
    pub(crate) buffer: ScriptBuffer,
    pub(crate) pass: CompilePass,
    /// Function whose body is being compiled.
    pub(crate) function: Option<FunctionId>,
    /// State whose code or function is being compiled.
    pub(crate) state: Option<StateId>,
    pub(crate) locals: FxHashMap<PropertyId, LocalUsage>,
    pub(crate) statement_line: u32,
    /// Set while compiling the head of a `foreach`.
    pub(crate) allow_iterator: bool,
    /// Set while the head of a `foreach` may name a bare dynamic array.
    pub(crate) foreach_array: bool,
    /// Set while fixed arrays may be referenced without an index.
    pub(crate) whole_arrays: bool,
    /// Whether the current function has compiled a `return` with a value.
    pub(crate) saw_return: bool,
}

impl<'a> ScriptCompiler<'a> {
    /// Create a compiler for `class` over its source text.
    pub fn new(
        session: &'a mut CompilationSession,
        registry: &'a mut Registry,
        class: ClassId,
        source: impl Into<Arc<str>>,
        file: impl Into<String>,
    ) -> Self {
        Self {
            session,
            registry,
            lexer: Lexer::new(source),
            file: file.into(),
            class,
            nests: NestStack::new(),
            buffer: ScriptBuffer::new(),
            pass: CompilePass::Declarations,
            function: None,
            state: None,
            locals: FxHashMap::default(),
            statement_line: 0,
            allow_iterator: false,
            foreach_array: false,
            whole_arrays: false,
            saw_return: false,
        }
    }

    /// Run one pass over the class.
    pub fn compile(&mut self, pass: CompilePass) -> Result<()> {
        tracing::debug!(file = %self.file, pass = pass.as_str(), "compiling class");
        self.pass = pass;
        let result = match pass {
            CompilePass::Declarations => self.compile_declarations(),
            CompilePass::Code => self.compile_code(),
        };
        if result.is_err() {
            self.nests.clear();
            self.function = None;
            self.state = None;
        }
        result
    }

    /// The class being compiled.
    pub fn class(&self) -> ClassId {
        self.class
    }

    /// Source file name used in messages.
    pub fn file(&self) -> &str {
        &self.file
    }

    // =========================================================================
    // Tokens
    // =========================================================================

    /// Next token, with literal keywords read as constants.
    pub(crate) fn get_token(&mut self) -> Result<Token> {
        Ok(self.lexer.get_token(false)?)
    }

    /// Next token, with every word read as an identifier.
    pub(crate) fn get_word(&mut self) -> Result<Token> {
        Ok(self.lexer.get_token(true)?)
    }

    pub(crate) fn peek(&mut self) -> Result<Token> {
        Ok(self.lexer.peek_token()?)
    }

    pub(crate) fn match_symbol(&mut self, symbol: &str) -> Result<bool> {
        Ok(self.lexer.match_symbol(symbol)?)
    }

    pub(crate) fn match_identifier(&mut self, name: &str) -> Result<bool> {
        Ok(self.lexer.match_identifier(name)?)
    }

    pub(crate) fn peek_symbol(&mut self, symbol: &str) -> Result<bool> {
        Ok(self.lexer.peek_symbol(symbol)?)
    }

    /// Consume `symbol` or fail with "Missing 'symbol' in context".
    pub(crate) fn require_symbol(&mut self, symbol: &str, context: &str) -> Result<()> {
        if self.match_symbol(symbol)? {
            Ok(())
        } else {
            Err(self.declaration_error(format!("Missing '{}' in {}", symbol, context)))
        }
    }

    /// Consume the keyword `name` or fail.
    pub(crate) fn require_identifier(&mut self, name: &str, context: &str) -> Result<()> {
        if self.match_identifier(name)? {
            Ok(())
        } else {
            Err(self.declaration_error(format!("Missing '{}' in {}", name, context)))
        }
    }

    /// Read an identifier, failing with "Missing what".
    pub(crate) fn expect_name(&mut self, what: &str) -> Result<Token> {
        let token = self.get_word()?;
        if token.is_identifier() {
            Ok(token)
        } else {
            Err(CompileError::declaration(format!("Missing {}", what), token.span))
        }
    }

    /// Require the `;` that ends a statement or declaration.
    pub(crate) fn require_semicolon(&mut self, context: &str) -> Result<()> {
        self.require_symbol(";", context)
    }

    // =========================================================================
    // Errors and warnings
    // =========================================================================

    pub(crate) fn here(&self) -> Span {
        self.lexer.here()
    }

    pub(crate) fn declaration_error(&self, message: impl Into<String>) -> CompileError {
        CompileError::declaration(message, self.here())
    }

    pub(crate) fn type_error(&self, message: impl Into<String>) -> CompileError {
        CompileError::type_error(message, self.here())
    }

    pub(crate) fn internal_error(&self, message: impl Into<String>) -> CompileError {
        CompileError::internal(message, self.here())
    }

    pub(crate) fn warn(&mut self, message: impl Into<String>) {
        let line = self.lexer.line();
        self.session.diagnostics.warn(&self.file, line, message);
    }

    pub(crate) fn warn_at(&mut self, line: u32, message: impl Into<String>) {
        self.session.diagnostics.warn(&self.file, line, message);
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    pub(crate) fn class_entry(&self) -> &ClassEntry {
        self.registry.class(self.class)
    }

    /// Metadata of the class being compiled.
    pub(crate) fn class_meta_mut(&mut self) -> Result<&mut ClassMetaData> {
        let here = self.here();
        self.session
            .metadata
            .find_class_data_mut(self.class)
            .ok_or_else(|| CompileError::internal("Missing class metadata", here))
    }

    pub(crate) fn class_name(&self) -> Name {
        self.registry.class(self.class).name.clone()
    }

    /// Bytecode index of a name.
    pub(crate) fn name_index(&mut self, name: &Name) -> u32 {
        self.session.names.index_of(name)
    }

    /// What the innermost nest allows.
    pub(crate) fn allows(&self, flags: AllowFlags) -> bool {
        self.nests.allow().contains(flags)
    }

    /// Whether code is compiling inside a static function.
    pub(crate) fn in_static_function(&self) -> bool {
        self.function
            .is_some_and(|f| self.registry.function(f).flags.contains(FunctionFlags::STATIC))
    }

    // =========================================================================
    // Local variable usage
    // =========================================================================

    /// Record a read of `property` if it is a tracked local.
    pub(crate) fn note_local_read(&mut self, property: PropertyId) -> Option<LocalRef> {
        let line = self.lexer.line();
        let usage = self.locals.get_mut(&property)?;
        usage.reads += 1;
        let unassigned_read = !usage.assigned;
        if unassigned_read {
            usage.unassigned_reads.push(line);
        }
        Some(LocalRef {
            property,
            unassigned_read,
        })
    }

    /// Turn the read recorded for an expression's root local into a write.
    pub(crate) fn note_assigned(&mut self, info: &ExprInfo) {
        for site in &info.struct_mods {
            self.buffer.set_struct_modified(*site);
        }
        if let Some(local) = info.local
            && let Some(usage) = self.locals.get_mut(&local.property)
        {
            usage.reads = usage.reads.saturating_sub(1);
            usage.assigned = true;
            if local.unassigned_read {
                usage.unassigned_reads.pop();
            }
        }
    }

    /// Warn about locals of the finished function.
    pub(crate) fn report_local_usage(&mut self) {
        let mut locals: Vec<(PropertyId, LocalUsage)> = self.locals.drain().collect();
        locals.sort_by_key(|(id, _)| *id);
        for (id, usage) in locals {
            let name = self.registry.property(id).name.clone();
            if usage.reads == 0 && !usage.assigned {
                self.warn_at(
                    usage.declared_line,
                    format!("Unreferenced local variable '{}'", name),
                );
            } else if usage.reads == 0 {
                self.warn_at(
                    usage.declared_line,
                    format!("Local variable '{}' is assigned but never used", name),
                );
            } else if let Some(line) = usage.unassigned_reads.first() {
                self.warn_at(
                    *line,
                    format!("Local variable '{}' used before assigned", name),
                );
            }
        }
    }
}

/// A declaration error at a token.
pub(crate) fn token_error(token: &Token, message: impl Into<String>) -> CompileError {
    CompileError::declaration(message, token.span)
}

/// A type shape with only the flags that matter as a conversion target.
pub(crate) fn value_type(base: &PropertyBase) -> PropertyBase {
    PropertyBase {
        ty: base.ty.clone(),
        array_dim: base.array_dim,
        flags: PropertyFlags::empty(),
    }
}

/// A parameter's shape as a conversion target: out-ness is kept.
pub(crate) fn parameter_type(base: &PropertyBase) -> PropertyBase {
    PropertyBase {
        ty: base.ty.clone(),
        array_dim: base.array_dim,
        flags: base.flags & PropertyFlags::OUT_PARM,
    }
}
