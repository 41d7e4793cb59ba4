//! `state` blocks and `ignores` lists.

use unrealscript_core::{FieldOwner, FunctionFlags, Name, StateFlags, StateId};
use unrealscript_registry::{FunctionEntry, PropertyEntry};

use super::is_function_specifier;
use crate::bytecode::ExprToken;
use crate::compiler::{Result, ScriptCompiler, token_error};
use crate::metadata::{StateData, TokenData};
use crate::nest::{AllowFlags, NestKind, NestNode};

impl<'a> ScriptCompiler<'a> {
    /// `[auto] [simulated] state[()] Name [extends Parent] { ... }`
    pub(crate) fn compile_state(&mut self) -> Result<StateId> {
        let mut flags = StateFlags::empty();
        loop {
            let token = self.get_word()?;
            if token.matches_identifier("auto") {
                flags |= StateFlags::AUTO;
            } else if token.matches_identifier("simulated") {
                flags |= StateFlags::SIMULATED;
            } else if token.matches_identifier("state") {
                break;
            } else {
                return Err(token_error(&token, format!("Missing 'state', found '{}'", token.text)));
            }
        }
        if self.match_symbol("(")? {
            self.require_symbol(")", "editable state")?;
            flags |= StateFlags::EDITABLE;
        }

        let name_token = self.expect_name("state name")?;
        let name = Name::new(&name_token.text);
        let duplicate = self
            .class_entry()
            .states
            .iter()
            .any(|s| self.registry.state(*s).name == name);
        if duplicate {
            return Err(token_error(&name_token, format!("Duplicate state '{}'", name)));
        }
        if flags.contains(StateFlags::AUTO) {
            let has_auto = self
                .class_entry()
                .states
                .iter()
                .any(|s| self.registry.state(*s).flags.contains(StateFlags::AUTO));
            if has_auto {
                return Err(token_error(&name_token, "Only one auto state is allowed"));
            }
        }

        let super_state = if self.match_identifier("extends")? {
            let parent = self.expect_name("parent state name")?;
            let id = self.registry.find_state(self.class, &parent.text).ok_or_else(|| {
                token_error(&parent, format!("Parent state '{}' not found", parent.text))
            })?;
            Some(id)
        } else {
            self.class_entry()
                .super_class
                .and_then(|parent| self.registry.find_state(parent, name.as_str()))
        };

        let state = self.registry.add_state(self.class, name.clone());
        {
            let entry = self.registry.state_mut(state);
            entry.flags = flags;
            entry.super_state = super_state;
        }

        self.require_symbol("{", "state")?;
        self.state = Some(state);
        self.push_nest(NestKind::State, NestNode::State(state))?;
        let mut data = StateData {
            code: None,
            declared_line: name_token.span.line,
        };

        loop {
            let token = self.get_word()?;
            if token.matches_symbol("}") {
                break;
            }
            if token.is_eof() {
                return Err(token_error(&token, format!("Missing '}}' at end of state '{}'", name)));
            }
            if token.matches_symbol(";") {
                continue;
            }
            if token.matches_identifier("ignores") {
                self.compile_ignores(state)?;
            } else if is_function_specifier(&token) {
                self.lexer.unget_token(&token);
                self.compile_function_declaration()?;
            } else {
                // Labels and statements: the rest of the block is state code.
                data.code = Some(token.start);
                self.lexer.skip_braces()?;
                break;
            }
            self.lexer.clear_comment();
        }

        self.pop_nest(NestKind::State)?;
        self.state = None;
        self.session.metadata.add_state(self.class, state, data);
        self.match_symbol(";")?;
        tracing::trace!(state = %name, "state declared");
        Ok(state)
    }

    /// `ignores A, B;` inside a state: each function becomes a stub that
    /// returns at once.
    fn compile_ignores(&mut self, state: StateId) -> Result<()> {
        if !self.allows(AllowFlags::IGNORES) {
            return Err(self.declaration_error("'ignores' is only allowed in states"));
        }
        loop {
            let token = self.expect_name("function name in 'ignores'")?;
            let super_state = self.registry.state(state).super_state;
            let target = self
                .registry
                .find_function(self.class, super_state, &token.text)
                .or_else(|| {
                    let parent = self.class_entry().super_class?;
                    self.registry.find_class_function(parent, &token.text)
                })
                .ok_or_else(|| {
                    token_error(&token, format!("'{}' is not a function", token.text))
                })?;
            let parent = self.registry.function(target).clone();
            if parent.flags.contains(FunctionFlags::FINAL) {
                return Err(token_error(
                    &token,
                    format!("'{}' is final and can't be ignored", token.text),
                ));
            }

            let mut stub = FunctionEntry::new(parent.name.clone(), FieldOwner::State(state));
            stub.friendly_name = parent.friendly_name.clone();
            stub.flags = (parent.flags - FunctionFlags::NATIVE) | FunctionFlags::DEFINED;
            stub.super_function = Some(target);
            stub.script = vec![
                ExprToken::Return.byte(),
                ExprToken::Nothing.byte(),
                ExprToken::EndOfScript.byte(),
            ];
            let function = self.registry.add_function(stub);
            for param in parent.params.iter().chain(parent.return_param.iter()) {
                let source = self.registry.property(*param).clone();
                let mut copy = PropertyEntry::new(source.name, FieldOwner::Function(function), source.ty);
                copy.array_dim = source.array_dim;
                copy.flags = source.flags;
                let id = self.registry.add_property(copy);
                self.session.metadata.add_property(self.class, id, TokenData::default());
            }
            self.registry.link_function(function);
            self.registry.state_mut(state).ignores.push(parent.name);

            if self.match_symbol(",")? {
                continue;
            }
            self.require_semicolon("'ignores' list")?;
            return Ok(());
        }
    }
}
