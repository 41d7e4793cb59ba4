//! Statement compilation.
//!
//! - `control`: `if`, `while`, `do`, `for`, `foreach`, `switch` and `case`
//! - `jump`: `break`, `continue`, `return`, `goto`, `assert` and `stop`
//!
//! Everything else is a label, a `local` declaration or an expression
//! statement compiled by [`compile_affector`](ScriptCompiler::compile_affector).

mod control;
mod jump;

use unrealscript_core::{FieldOwner, Name, ObjectRef, PropertyFlags, PropertyId, PropertyType};
use unrealscript_parser::Token;

use crate::bytecode::ExprToken;
use crate::compiler::{Result, ScriptCompiler, token_error, value_type};
use crate::nest::{AllowFlags, NestKind};

/// Returns larger than this are destroyed by the caller when discarded.
const EAT_RETURN_VALUE_SIZE: u32 = 64;

impl<'a> ScriptCompiler<'a> {
    /// Compile one statement.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub(crate) fn compile_statement(&mut self) -> Result<()> {
        self.statement_line = self.lexer.line();
        let token = self.get_word()?;
        if token.is_eof() {
            return Err(self.declaration_error("Unexpected end of file"));
        }

        if token.matches_symbol("{") {
            return self.compile_block();
        }
        if token.matches_symbol(";") {
            return Ok(());
        }

        if token.is_identifier() {
            let keyword = token.text.to_ascii_lowercase();
            match keyword.as_str() {
                "local" => {
                    let Some(function) = self.function.filter(|_| self.allows(AllowFlags::VAR_DECL)) else {
                        return Err(token_error(&token, "'local' is not allowed here"));
                    };
                    self.compile_variable_declaration(FieldOwner::Function(function))?;
                    return Ok(());
                }
                "else" => return Err(token_error(&token, "'else' without 'if'")),
                "case" => return self.compile_case(&token),
                "default" if self.peek_symbol(":")? => return self.compile_default_case(&token),
                _ => {}
            }

            if self.peek_symbol(":")? {
                return self.compile_label(&token);
            }

            self.emit_debug_info(&token);
            match keyword.as_str() {
                "if" => return self.compile_if(),
                "while" => return self.compile_while(),
                "do" => return self.compile_do(),
                "for" => return self.compile_for(),
                "foreach" => return self.compile_foreach(),
                "switch" => return self.compile_switch(),
                "break" => return self.compile_break(&token),
                "continue" => return self.compile_continue(&token),
                "return" => return self.compile_return(&token),
                "goto" => return self.compile_goto(&token),
                "assert" => return self.compile_assert(&token),
                "stop" => return self.compile_stop(&token),
                _ => {}
            }
        } else {
            self.emit_debug_info(&token);
        }

        self.lexer.unget_token(&token);
        self.compile_affector()?;
        self.require_semicolon("statement")
    }

    /// Statements up to the `}` closing a block, the `{` consumed.
    fn compile_block(&mut self) -> Result<()> {
        loop {
            if self.match_symbol("}")? {
                return Ok(());
            }
            if self.peek()?.is_eof() {
                return Err(self.declaration_error("Missing '}' at end of block"));
            }
            self.compile_statement()?;
        }
    }

    /// `Name:` in a function or in state code.
    fn compile_label(&mut self, token: &Token) -> Result<()> {
        self.require_symbol(":", "label")?;
        if !self.allows(AllowFlags::LABEL) {
            return Err(token_error(token, format!("Label '{}' is not allowed here", token.text)));
        }
        let index = self
            .nests
            .find_kind(&[NestKind::Function, NestKind::State])
            .ok_or_else(|| self.internal_error("Label outside a function or state"))?;
        let span = token.span;
        self.nests
            .add_label(&mut self.buffer, index, Name::new(&token.text), span)?;
        Ok(())
    }

    /// Line information in front of a statement, when debug info is on.
    fn emit_debug_info(&mut self, token: &Token) {
        if !self.session.options.debug_info {
            return;
        }
        self.buffer.emit_token(ExprToken::DebugInfo);
        self.buffer.emit_i32(100);
        self.buffer.emit_i32(token.span.line as i32);
        self.buffer.emit_i32(token.span.col as i32);
        self.buffer.emit_u8(0);
    }

    /// An expression statement: an assignment or an expression with a side
    /// effect, such as a call.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub(crate) fn compile_affector(&mut self) -> Result<()> {
        let info = self
            .compile_expr(None)?
            .ok_or_else(|| self.type_error("Bad or missing expression"))?;

        if self.match_symbol("=")? {
            if !info.lvalue {
                return Err(self.type_error("The left side of '=' can't be assigned to"));
            }
            if info.ty.is_const() {
                return Err(self.type_error(format!(
                    "Can't assign to a const '{}'",
                    self.describe_type(&info.ty)
                )));
            }
            if let Some(property) = info.property {
                self.check_write_access(property)?;
            }
            self.note_assigned(&info);
            let token = match info.ty.ty {
                PropertyType::Bool => ExprToken::LetBool,
                PropertyType::Delegate { .. } => ExprToken::LetDelegate,
                _ => ExprToken::Let,
            };
            self.buffer.insert(info.start, &[token.byte()]);
            self.require_expr(&value_type(&info.ty), "assignment")?;
            return Ok(());
        }

        if !info.side_effect {
            return Err(self.type_error("Expression has no effect"));
        }
        if let Some(function) = info.call
            && let Some(ret) = self.registry.function(function).return_param
        {
            let needs_destroy = self.registry.property(ret).ty.needs_ctor_link()
                || self.registry.property_size(ret) > EAT_RETURN_VALUE_SIZE;
            if needs_destroy {
                let mut header = vec![ExprToken::EatReturnValue.byte()];
                header.extend_from_slice(&ObjectRef::from(ret).raw().to_le_bytes());
                self.buffer.insert(info.start, &header);
            }
        }
        Ok(())
    }

    /// `private` and `protected` write restrictions of member variables.
    fn check_write_access(&self, property: PropertyId) -> Result<()> {
        let entry = self.registry.property(property);
        if matches!(entry.owner, FieldOwner::Function(_)) {
            return Ok(());
        }
        let owner = self.registry.property_class(property);
        let denied = (entry.flags.contains(PropertyFlags::PRIVATE_WRITE) && owner != self.class)
            || (entry.flags.contains(PropertyFlags::PROTECTED_WRITE)
                && !self.registry.is_child_of(self.class, owner));
        if denied {
            return Err(self.type_error(format!(
                "'{}' can't be written outside of '{}'",
                entry.name,
                self.registry.class(owner).name
            )));
        }
        Ok(())
    }
}
