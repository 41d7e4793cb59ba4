//! Conditionals, loops and `switch`.

use unrealscript_core::{FunctionFlags, ObjectRef, PropertyBase, PropertyType};
use unrealscript_parser::Token;

use crate::bytecode::ExprToken;
use crate::compiler::{Result, ScriptCompiler, token_error, value_type};
use crate::conversion::same_type;
use crate::nest::{AllowFlags, FixupKind, NestKind, NestNode, SwitchNest};

impl<'a> ScriptCompiler<'a> {
    /// Emit a jump operand resolved when nest `index` closes.
    pub(crate) fn emit_fixup(&mut self, index: usize, kind: FixupKind) {
        let span = self.here();
        self.nests
            .emit_address_to_fixup_later(&mut self.buffer, index, kind, None, span);
    }

    /// `JumpIfNot` to `kind` of nest `index`, then the parenthesized
    /// condition.
    fn compile_condition_jump(&mut self, index: usize, kind: FixupKind, what: &str) -> Result<()> {
        self.require_symbol("(", what)?;
        self.buffer.emit_token(ExprToken::JumpIfNot);
        self.emit_fixup(index, kind);
        self.require_expr(&Self::bool_type(), what)?;
        self.require_symbol(")", what)
    }

    /// `if (cond) stmt [else stmt]`, after `if`.
    pub(crate) fn compile_if(&mut self) -> Result<()> {
        let index = self.push_nest(NestKind::If, NestNode::None)?;
        self.compile_condition_jump(index, FixupKind::IfEnd, "'if'")?;
        self.compile_statement()?;
        if self.match_identifier("else")? {
            self.buffer.emit_token(ExprToken::Jump);
            self.emit_fixup(index, FixupKind::ElseEnd);
            self.nests.set_fixup(&mut self.buffer, index, FixupKind::IfEnd);
            self.compile_statement()?;
            self.nests.set_fixup(&mut self.buffer, index, FixupKind::ElseEnd);
        } else {
            self.nests.set_fixup(&mut self.buffer, index, FixupKind::IfEnd);
        }
        self.pop_nest(NestKind::If)?;
        Ok(())
    }

    /// `while (cond) stmt`, after `while`. `continue` re-tests the condition.
    pub(crate) fn compile_while(&mut self) -> Result<()> {
        let index = self.push_nest(NestKind::Loop, NestNode::None)?;
        let top = self.nests.set_fixup(&mut self.buffer, index, FixupKind::LoopStart);
        self.nests.set_fixup_at(index, FixupKind::ContinueLoop, top);
        self.compile_condition_jump(index, FixupKind::LoopEnd, "'while'")?;
        self.compile_statement()?;
        self.buffer.emit_token(ExprToken::Jump);
        self.emit_fixup(index, FixupKind::LoopStart);
        self.nests.set_fixup(&mut self.buffer, index, FixupKind::LoopEnd);
        self.pop_nest(NestKind::Loop)?;
        Ok(())
    }

    /// `do stmt until (cond);`, after `do`.
    pub(crate) fn compile_do(&mut self) -> Result<()> {
        let index = self.push_nest(NestKind::Loop, NestNode::None)?;
        self.nests.set_fixup(&mut self.buffer, index, FixupKind::LoopStart);
        self.compile_statement()?;
        self.require_identifier("until", "'do' loop")?;
        self.nests.set_fixup(&mut self.buffer, index, FixupKind::ContinueLoop);
        self.compile_condition_jump(index, FixupKind::LoopStart, "'until'")?;
        self.match_symbol(";")?;
        self.nests.set_fixup(&mut self.buffer, index, FixupKind::LoopEnd);
        self.pop_nest(NestKind::Loop)?;
        Ok(())
    }

    /// `for (init; cond; step) stmt`, after `for`.
    ///
    /// The step is compiled where it is written and moved behind the body
    /// once the body is done; `continue` lands on it.
    pub(crate) fn compile_for(&mut self) -> Result<()> {
        let index = self.push_nest(NestKind::For, NestNode::None)?;
        self.require_symbol("(", "'for'")?;
        if !self.peek_symbol(";")? {
            self.compile_affector()?;
        }
        self.require_semicolon("'for' initializer")?;

        self.nests.set_fixup(&mut self.buffer, index, FixupKind::ForStart);
        self.buffer.emit_token(ExprToken::JumpIfNot);
        self.emit_fixup(index, FixupKind::ForEnd);
        self.require_expr(&Self::bool_type(), "'for' condition")?;
        self.require_semicolon("'for' condition")?;

        let step_start = self.buffer.len();
        if !self.peek_symbol(")")? {
            self.compile_affector()?;
        }
        let step_end = self.buffer.len();
        self.require_symbol(")", "'for'")?;
        if step_end > step_start {
            let step = self.buffer.marker_at(step_start);
            self.nests.set_fixup_at(index, FixupKind::ContinueLoop, step);
        }

        self.compile_statement()?;
        if step_end > step_start {
            let end = self.buffer.len();
            self.buffer.splice(step_start..step_end, end);
        } else {
            self.nests.set_fixup(&mut self.buffer, index, FixupKind::ContinueLoop);
        }

        self.buffer.emit_token(ExprToken::Jump);
        self.emit_fixup(index, FixupKind::ForStart);
        self.nests.set_fixup(&mut self.buffer, index, FixupKind::ForEnd);
        self.pop_nest(NestKind::For)?;
        Ok(())
    }

    /// `foreach Iterator(args) stmt` or `foreach Array(Item [, Index]) stmt`,
    /// after `foreach`.
    pub(crate) fn compile_foreach(&mut self) -> Result<()> {
        let index = self.push_nest(NestKind::ForEach, NestNode::None)?;
        self.allow_iterator = true;
        self.foreach_array = true;
        let head = self.compile_expr(None);
        self.allow_iterator = false;
        self.foreach_array = false;
        let head = head?.ok_or_else(|| self.type_error("Missing iterator in 'foreach'"))?;

        let is_iterator = head
            .call
            .is_some_and(|f| self.registry.function(f).flags.contains(FunctionFlags::ITERATOR));
        if is_iterator {
            self.buffer.insert(head.start, &[ExprToken::Iterator.byte()]);
        } else if head.ty.is_dynamic_array() {
            self.buffer.insert(head.start, &[ExprToken::DynArrayIterator.byte()]);
            self.require_symbol("(", "'foreach' over an array")?;
            let element = value_type(&head.ty.element());
            let item = self.require_value(Some(&element), "'foreach' item")?;
            if !item.is_assignable() || !same_type(&element, &item.ty) {
                return Err(self.type_error(format!(
                    "'foreach' item must be a writable '{}' variable",
                    self.describe_type(&element)
                )));
            }
            self.note_assigned(&item);
            if self.match_symbol(",")? {
                self.buffer.emit_u8(1);
                let position = self.require_value(Some(&Self::int_type()), "'foreach' index")?;
                if !position.is_assignable() || !same_type(&Self::int_type(), &position.ty) {
                    return Err(self.type_error("'foreach' index must be a writable int variable"));
                }
                self.note_assigned(&position);
            } else {
                self.buffer.emit_u8(0);
            }
            self.require_symbol(")", "'foreach' over an array")?;
        } else {
            return Err(self.type_error(
                "'foreach' needs an iterator function or a dynamic array",
            ));
        }
        self.emit_fixup(index, FixupKind::IteratorEnd);
        self.nests.get_mut(index).iterator = true;

        self.compile_statement()?;

        self.nests.set_fixup(&mut self.buffer, index, FixupKind::ContinueLoop);
        self.buffer.emit_token(ExprToken::IteratorNext);
        self.nests.set_fixup(&mut self.buffer, index, FixupKind::IteratorEnd);
        self.buffer.emit_token(ExprToken::IteratorPop);
        self.pop_nest(NestKind::ForEach)?;
        Ok(())
    }

    /// `switch (expr) { ... }`, after `switch`.
    pub(crate) fn compile_switch(&mut self) -> Result<()> {
        let index = self.push_nest(NestKind::Switch, NestNode::None)?;
        self.require_symbol("(", "'switch'")?;
        let value = self.require_any_expr("'switch'")?;
        self.require_symbol(")", "'switch'")?;

        let switchable = matches!(
            value.ty.ty,
            PropertyType::Byte { .. }
                | PropertyType::Int
                | PropertyType::Bool
                | PropertyType::Float
                | PropertyType::Name
                | PropertyType::String
                | PropertyType::Object { .. }
                | PropertyType::Interface(_)
        );
        let (size, _) = self.registry.type_layout(&value.ty.ty);
        let size = u8::try_from(size)
            .ok()
            .filter(|_| switchable && !value.ty.is_fixed_array())
            .ok_or_else(|| {
                self.type_error(format!(
                    "Can't switch on a value of type '{}'",
                    self.describe_type(&value.ty)
                ))
            })?;
        let mut header = vec![ExprToken::Switch.byte()];
        let property = value.property.map(ObjectRef::from).unwrap_or(ObjectRef::NONE);
        header.extend_from_slice(&property.raw().to_le_bytes());
        header.push(size);
        self.buffer.insert(value.start, &header);

        self.nests.get_mut(index).switch = Some(SwitchNest {
            ty: value_type(&value.ty),
            chain: None,
            has_default: false,
        });

        self.require_symbol("{", "'switch'")?;
        loop {
            if self.match_symbol("}")? {
                break;
            }
            if self.peek()?.is_eof() {
                return Err(self.declaration_error("Missing '}' at end of 'switch'"));
            }
            self.compile_statement()?;
        }
        self.nests.resolve_chain(&mut self.buffer, index);
        self.nests.set_fixup(&mut self.buffer, index, FixupKind::SwitchEnd);
        self.pop_nest(NestKind::Switch)?;
        Ok(())
    }

    /// The innermost nest, which must be a `switch` allowing `allow`.
    fn switch_index(&self, token: &Token, allow: AllowFlags) -> Result<usize> {
        match self.nests.top_index() {
            Some(index)
                if self.allows(allow) && self.nests.get(index).kind == NestKind::Switch =>
            {
                Ok(index)
            }
            _ => Err(token_error(
                token,
                format!("'{}' is not allowed here", token.text),
            )),
        }
    }

    /// `case value:`, after `case`.
    pub(crate) fn compile_case(&mut self, token: &Token) -> Result<()> {
        let index = self.switch_index(token, AllowFlags::CASE)?;
        let ty = match &self.nests.get(index).switch {
            Some(switch) if switch.has_default => {
                return Err(token_error(token, "'case' after 'default'"));
            }
            Some(switch) => switch.ty.clone(),
            None => return Err(self.internal_error("Switch nest without switch data")),
        };
        self.nests.resolve_chain(&mut self.buffer, index);
        self.buffer.emit_token(ExprToken::Case);
        let span = self.here();
        self.nests
            .emit_address_to_chain_later(&mut self.buffer, index, span)?;
        self.compile_case_value(&ty)?;
        self.require_symbol(":", "'case'")
    }

    fn compile_case_value(&mut self, ty: &PropertyBase) -> Result<()> {
        let value = self.require_expr(ty, "'case'")?;
        if value.const_value.is_none() && value.side_effect {
            self.warn("'case' value has side effects");
        }
        Ok(())
    }

    /// `default:`, after `default`.
    pub(crate) fn compile_default_case(&mut self, token: &Token) -> Result<()> {
        self.require_symbol(":", "'default'")?;
        let index = self.switch_index(token, AllowFlags::DEFAULT_CASE)?;
        let already = self
            .nests
            .get(index)
            .switch
            .as_ref()
            .is_some_and(|s| s.has_default);
        if already {
            return Err(token_error(token, "Duplicate 'default' in 'switch'"));
        }
        self.nests.resolve_chain(&mut self.buffer, index);
        self.buffer.emit_token(ExprToken::Case);
        self.buffer.emit_u16(u16::MAX);
        if let Some(switch) = self.nests.get_mut(index).switch.as_mut() {
            switch.has_default = true;
        }
        Ok(())
    }
}
