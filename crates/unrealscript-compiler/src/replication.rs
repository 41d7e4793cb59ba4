//! The `replication { ... }` block.
//!
//! Each `if (cond)` becomes `Return <cond>` in the class script; the offset of
//! that code is stored on every property the condition lists.

use unrealscript_core::{FieldOwner, PropertyFlags};
use unrealscript_parser::SourcePos;

use crate::bytecode::ExprToken;
use crate::compiler::{Result, ScriptCompiler, token_error};

impl<'a> ScriptCompiler<'a> {
    /// Compile the replication block whose body starts at `pos`.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub(crate) fn compile_replication(&mut self, pos: SourcePos) -> Result<()> {
        let resume = self.lexer.checkpoint();
        self.lexer.seek(pos);
        loop {
            let token = self.get_word()?;
            if token.matches_symbol("}") {
                break;
            }
            if token.is_eof() {
                return Err(self.declaration_error("Missing '}' at end of replication block"));
            }
            let token = if token.matches_identifier("reliable") || token.matches_identifier("unreliable") {
                self.get_word()?
            } else {
                token
            };
            if !token.matches_identifier("if") {
                return Err(token_error(
                    &token,
                    format!("Missing 'if' in replication block, found '{}'", token.text),
                ));
            }
            self.compile_replication_condition()?;
        }
        self.lexer.restore(resume);
        Ok(())
    }

    /// `(cond) Name, Name, ...;` after `if`.
    fn compile_replication_condition(&mut self) -> Result<()> {
        self.require_symbol("(", "replication condition")?;
        let offset = self.buffer.len();
        let offset = u16::try_from(offset)
            .map_err(|_| self.declaration_error("Replication conditions are too large"))?;
        self.buffer.emit_token(ExprToken::Return);
        self.require_expr(&Self::bool_type(), "replication condition")?;
        self.require_symbol(")", "replication condition")?;

        loop {
            let name = self.expect_name("variable name in replication definition")?;
            let property = self
                .registry
                .find_own_property(FieldOwner::Class(self.class), &name.text)
                .ok_or_else(|| {
                    token_error(
                        &name,
                        format!(
                            "'{}' is not a variable declared in '{}'",
                            name.text,
                            self.class_name()
                        ),
                    )
                })?;
            let entry = self.registry.property_mut(property);
            if entry.rep_offset.is_some() {
                return Err(token_error(
                    &name,
                    format!("'{}' already has a replication definition", name.text),
                ));
            }
            entry.flags |= PropertyFlags::NET;
            entry.rep_offset = Some(offset);
            tracing::trace!(property = %name.text, offset, "replicated");

            if self.match_symbol(",")? {
                continue;
            }
            return self.require_semicolon("replication definition");
        }
    }
}
