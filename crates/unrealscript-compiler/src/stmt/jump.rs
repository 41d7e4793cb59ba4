//! Statements that leave the straight line: `break`, `continue`, `return`,
//! `goto`, plus `assert` and `stop`.

use unrealscript_core::{Name, ObjectRef, PropertyBase, PropertyType};
use unrealscript_parser::Token;

use crate::bytecode::ExprToken;
use crate::compiler::{Result, ScriptCompiler, token_error, value_type};
use crate::nest::{AllowFlags, FixupKind, NestKind};

impl<'a> ScriptCompiler<'a> {
    pub(crate) fn compile_break(&mut self, token: &Token) -> Result<()> {
        self.require_allowed(token, AllowFlags::BREAK)?;
        let index = self
            .nests
            .find(|n| n.kind.is_breakable())
            .ok_or_else(|| token_error(token, "'break' outside a loop or switch"))?;
        let kind = match self.nests.get(index).kind {
            NestKind::For => FixupKind::ForEnd,
            NestKind::ForEach => FixupKind::IteratorEnd,
            NestKind::Switch => FixupKind::SwitchEnd,
            _ => FixupKind::LoopEnd,
        };
        self.buffer.emit_token(ExprToken::Jump);
        self.emit_fixup(index, kind);
        self.require_semicolon("'break'")
    }

    pub(crate) fn compile_continue(&mut self, token: &Token) -> Result<()> {
        self.require_allowed(token, AllowFlags::CONTINUE)?;
        let index = self
            .nests
            .find(|n| n.kind.is_loop())
            .ok_or_else(|| token_error(token, "'continue' outside a loop"))?;
        self.buffer.emit_token(ExprToken::Jump);
        self.emit_fixup(index, FixupKind::ContinueLoop);
        self.require_semicolon("'continue'")
    }

    /// `return [value];`. Every open `foreach` between here and the function
    /// is popped first.
    pub(crate) fn compile_return(&mut self, token: &Token) -> Result<()> {
        self.require_allowed(token, AllowFlags::RETURN)?;
        let open_iterators = self
            .nests
            .iter_inner()
            .take_while(|n| n.kind != NestKind::Function)
            .filter(|n| n.iterator)
            .count();
        for _ in 0..open_iterators {
            self.buffer.emit_token(ExprToken::IteratorPop);
        }
        self.buffer.emit_token(ExprToken::Return);

        let return_param = self
            .function
            .and_then(|f| self.registry.function(f).return_param);
        match return_param {
            Some(ret) => {
                if self.match_symbol(";")? {
                    self.warn("Return value expected");
                    self.buffer.emit_token(ExprToken::ReturnNothing);
                    self.buffer.emit_object(ObjectRef::from(ret));
                    return Ok(());
                }
                let ty = value_type(&self.registry.property(ret).base());
                self.require_expr(&ty, "'return'")?;
                self.saw_return = true;
            }
            None => {
                if !self.peek_symbol(";")? {
                    return Err(token_error(token, "Function has no return value"));
                }
                self.buffer.emit_token(ExprToken::Nothing);
            }
        }
        self.require_semicolon("'return'")
    }

    /// `goto Label;`. In state code the label is a name expression resolved
    /// when the jump runs; in a function it must be a label of that function.
    pub(crate) fn compile_goto(&mut self, token: &Token) -> Result<()> {
        if self.function.is_none() && self.allows(AllowFlags::STATE_CODE) {
            self.buffer.emit_token(ExprToken::GotoLabel);
            self.require_expr(&PropertyBase::new(PropertyType::Name), "'goto'")?;
            return self.require_semicolon("'goto'");
        }
        let label = self.expect_name("label after 'goto'")?;
        let index = self
            .nests
            .find_kind(&[NestKind::Function])
            .ok_or_else(|| token_error(token, "'goto' is not allowed here"))?;
        self.buffer.emit_token(ExprToken::Jump);
        self.nests.emit_address_to_fixup_later(
            &mut self.buffer,
            index,
            FixupKind::Label,
            Some(Name::new(&label.text)),
            label.span,
        );
        self.require_semicolon("'goto'")
    }

    /// `assert(cond);`, tagged with its source line.
    pub(crate) fn compile_assert(&mut self, token: &Token) -> Result<()> {
        self.require_symbol("(", "'assert'")?;
        self.buffer.emit_token(ExprToken::Assert);
        self.buffer.emit_u16(token.span.line as u16);
        self.buffer.emit_u8(u8::from(self.session.options.debug_info));
        self.require_expr(&Self::bool_type(), "'assert'")?;
        self.require_symbol(")", "'assert'")?;
        self.require_semicolon("'assert'")
    }

    pub(crate) fn compile_stop(&mut self, token: &Token) -> Result<()> {
        self.require_allowed(token, AllowFlags::STATE_CODE)?;
        if self.function.is_some() {
            return Err(token_error(token, "'stop' is only allowed in state code"));
        }
        self.buffer.emit_token(ExprToken::Stop);
        self.require_semicolon("'stop'")
    }
}
