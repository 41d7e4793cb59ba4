//! Code pass drivers.
//!
//! Walks the class a second time through the positions recorded by the
//! declaration pass: the replication block, every function body, every state's
//! functions and code. Each body gets a fresh [`ScriptBuffer`] that is stored
//! on the reflection object once its nest closes.

use unrealscript_core::limits::MAX_SCRIPT_SIZE;
use unrealscript_core::{
    ClassFlags, FunctionFlags, FunctionId, ObjectRef, PropertyFlags, PropertyId, StateId,
};

use crate::bytecode::{ExprToken, ScriptBuffer};
use crate::compiler::{Result, ScriptCompiler, value_type};
use crate::metadata::DefaultValueText;
use crate::nest::{Nest, NestKind, NestNode};

impl<'a> ScriptCompiler<'a> {
    /// Open a nest at the current source position.
    pub(crate) fn push_nest(&mut self, kind: NestKind, node: NestNode) -> Result<usize> {
        let span = self.here();
        self.nests.push(kind, node, span)
    }

    /// Close the innermost nest, resolving its jumps into the current buffer.
    pub(crate) fn pop_nest(&mut self, kind: NestKind) -> Result<Nest> {
        let span = self.here();
        self.nests.pop(&mut self.buffer, kind, span)
    }

    #[cfg_attr(feature = "profiling", profiling::function)]
    pub(crate) fn compile_code(&mut self) -> Result<()> {
        let kind = if self.class_entry().is_interface() {
            NestKind::Interface
        } else {
            NestKind::Class
        };
        self.push_nest(kind, NestNode::Class(self.class))?;

        self.buffer = ScriptBuffer::new();
        let replication = self
            .session
            .metadata
            .find_class_data(self.class)
            .and_then(|m| m.replication);
        if let Some(pos) = replication {
            self.compile_replication(pos)?;
            self.buffer.emit_token(ExprToken::EndOfScript);
        }
        let script = std::mem::take(&mut self.buffer).into_bytes();
        self.check_script_size(script.len(), "replication conditions")?;
        self.registry.class_mut(self.class).script = script;

        for function in self.class_entry().functions.clone() {
            self.compile_function_code(function)?;
        }

        for state in self.class_entry().states.clone() {
            self.state = Some(state);
            self.push_nest(NestKind::State, NestNode::State(state))?;
            for function in self.registry.state(state).functions.clone() {
                self.compile_function_code(function)?;
            }
            self.compile_state_code(state)?;
            self.state = None;
        }

        self.buffer = ScriptBuffer::new();
        self.pop_nest(kind)?;
        self.registry.class_mut(self.class).flags |= ClassFlags::COMPILED;
        tracing::debug!(class = %self.class_name(), "code complete");
        Ok(())
    }

    /// Compile one function body, if it has one.
    pub(crate) fn compile_function_code(&mut self, function: FunctionId) -> Result<()> {
        let Some(body) = self
            .session
            .metadata
            .find_class_data(self.class)
            .and_then(|m| m.function(function))
            .and_then(|d| d.body)
        else {
            return Ok(());
        };

        self.function = Some(function);
        self.saw_return = false;
        self.locals.clear();
        self.buffer = ScriptBuffer::new();
        self.push_nest(NestKind::Function, NestNode::Function(function))?;

        let entry = self.registry.function(function);
        let params = entry.params.clone();
        let return_param = entry.return_param;
        let name = entry.name.clone();
        if entry.flags.contains(FunctionFlags::HAS_OPTIONAL_PARMS) {
            for param in params {
                if !self.registry.property(param).flags.contains(PropertyFlags::OPTIONAL_PARM) {
                    continue;
                }
                let default = self
                    .session
                    .metadata
                    .find_class_data(self.class)
                    .and_then(|m| m.property(param))
                    .and_then(|d| d.default_value.clone());
                match default {
                    Some(default) => self.compile_parameter_value(param, &default)?,
                    None => self.buffer.emit_token(ExprToken::Nothing),
                }
            }
        }

        self.lexer.seek(body);
        self.compile_block_body(&format!("function '{}'", name))?;

        if let Some(ret) = return_param {
            if !self.saw_return {
                self.warn(format!("Function '{}' does not return a value", name));
            }
            self.buffer.emit_token(ExprToken::Return);
            self.buffer.emit_token(ExprToken::ReturnNothing);
            self.buffer.emit_object(ObjectRef::from(ret));
        } else {
            self.buffer.emit_token(ExprToken::Return);
            self.buffer.emit_token(ExprToken::Nothing);
        }
        self.buffer.emit_token(ExprToken::EndOfScript);
        self.pop_nest(NestKind::Function)?;

        self.registry.link_function(function);
        self.report_local_usage();

        let script = std::mem::take(&mut self.buffer).into_bytes();
        self.check_script_size(script.len(), name.as_str())?;
        tracing::trace!(function = %name, size = script.len(), "function compiled");
        self.registry.function_mut(function).script = script;
        self.function = None;
        Ok(())
    }

    /// The default value of an optional parameter: `DefaultParmValue`, the
    /// length of the value's code, the value, `EndParmValue`. A caller that
    /// passes the argument skips the value.
    pub(crate) fn compile_parameter_value(
        &mut self,
        param: PropertyId,
        default: &DefaultValueText,
    ) -> Result<()> {
        let resume = self.lexer.checkpoint();
        let target = self.registry.property(param).base();
        let context = format!("default value of '{}'", self.registry.property(param).name);

        self.buffer.emit_token(ExprToken::DefaultParmValue);
        let skip = self.buffer.emit_skip();
        self.lexer.seek(default.pos);
        self.require_expr(&value_type(&target), &context)?;
        self.buffer.emit_token(ExprToken::EndParmValue);
        self.buffer.finish_skip(skip);

        let next = self.peek()?;
        if !(next.matches_symbol(",") || next.matches_symbol(")")) {
            return Err(self.type_error(format!("Bad {}: '{}'", context, default.text)));
        }
        self.lexer.restore(resume);
        Ok(())
    }

    /// Statements up to the closing `}` of a function or state.
    fn compile_block_body(&mut self, what: &str) -> Result<()> {
        loop {
            let token = self.peek()?;
            if token.matches_symbol("}") {
                self.get_word()?;
                return Ok(());
            }
            if token.is_eof() {
                return Err(self.declaration_error(format!("Missing '}}' at end of {}", what)));
            }
            self.compile_statement()?;
        }
    }

    /// State code after the state's functions, ended by `Stop` and followed by
    /// the label table.
    fn compile_state_code(&mut self, state: StateId) -> Result<()> {
        let code = self
            .session
            .metadata
            .find_class_data(self.class)
            .and_then(|m| m.state(state))
            .and_then(|d| d.code);

        self.buffer = ScriptBuffer::new();
        let name = self.registry.state(state).name.clone();
        if let Some(pos) = code {
            self.lexer.seek(pos);
            self.locals.clear();
            self.compile_block_body(&format!("state '{}'", name))?;
            self.buffer.emit_token(ExprToken::Stop);

            let index = self
                .nests
                .find_kind(&[NestKind::State])
                .ok_or_else(|| self.internal_error("State code outside a state"))?;
            let labels = self.nests.get(index).labels.clone();
            if !labels.is_empty() {
                let table = self.buffer.len();
                self.buffer.emit_token(ExprToken::LabelTable);
                for (label, site) in labels {
                    let name_index = self.name_index(&label);
                    let target = self.buffer.site_pos(site) as u32;
                    self.buffer.emit_u32(name_index);
                    self.buffer.emit_u32(target);
                }
                self.buffer.emit_u32(0);
                self.buffer.emit_u32(0);
                self.registry.state_mut(state).label_table_offset = Some(table as u16);
            }
        }
        self.pop_nest(NestKind::State)?;

        let script = std::mem::take(&mut self.buffer).into_bytes();
        self.check_script_size(script.len(), name.as_str())?;
        self.registry.state_mut(state).script = script;
        Ok(())
    }

    fn check_script_size(&self, len: usize, what: &str) -> Result<()> {
        if len > MAX_SCRIPT_SIZE {
            return Err(self.declaration_error(format!(
                "Script for '{}' is too large ({} bytes, at most {})",
                what, len, MAX_SCRIPT_SIZE
            )));
        }
        Ok(())
    }
}
