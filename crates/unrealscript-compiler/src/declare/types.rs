//! `enum`, `struct` and `const` declarations.

use ordered_float::OrderedFloat;
use unrealscript_core::limits::MAX_ENUM_ENTRIES;
use unrealscript_core::{
    ConstValue, EnumId, FieldOwner, Name, StructFlags, StructId,
};
use unrealscript_parser::Lexer;
use unrealscript_registry::ConstEntry;

use crate::compiler::{Result, ScriptCompiler, token_error};
use crate::metadata::StructData;

const STRUCT_MODIFIERS: &[(&str, StructFlags)] = &[
    ("native", StructFlags::NATIVE),
    ("export", StructFlags::EXPORT),
    ("transient", StructFlags::TRANSIENT),
    ("atomic", StructFlags::ATOMIC),
    ("immutable", StructFlags::IMMUTABLE),
    ("strictconfig", StructFlags::STRICT_CONFIG),
    ("immutablewhencooked", StructFlags::IMMUTABLE_WHEN_COOKED),
    ("atomicwhencooked", StructFlags::ATOMIC_WHEN_COOKED),
];

/// Evaluate the text of a constant: a literal, a negated number or the
/// name of another constant.
pub(crate) fn parse_const_text(
    text: &str,
    lookup: impl Fn(&str) -> Option<ConstValue>,
) -> Option<ConstValue> {
    let mut lexer = Lexer::new(text);
    let token = lexer.get_token(false).ok()?;
    let value = if token.matches_symbol("-") {
        let number = lexer.get_token(false).ok()?;
        match number.value? {
            ConstValue::Int(v) => ConstValue::Int(v.wrapping_neg()),
            ConstValue::Byte(v) => ConstValue::Int(-(v as i32)),
            ConstValue::Float(v) => ConstValue::Float(OrderedFloat(-v.0)),
            _ => return None,
        }
    } else if token.is_const() {
        token.value?
    } else if token.is_identifier() {
        lookup(&token.text)?
    } else {
        return None;
    };
    lexer.get_token(true).ok()?.is_eof().then_some(value)
}

impl<'a> ScriptCompiler<'a> {
    /// `enum Name { A, B<Meta>, C }`, after the `enum` keyword.
    pub(crate) fn compile_enum(&mut self) -> Result<EnumId> {
        self.lexer.clear_comment();
        let name_token = self.expect_name("enum name")?;
        let name = Name::new(&name_token.text);
        self.require_symbol("{", "enum")?;

        let max_tag = format!("{}_MAX", name);
        let mut tags: Vec<Name> = Vec::new();
        loop {
            let token = self.get_word()?;
            if token.matches_symbol("}") {
                break;
            }
            if token.matches_symbol(",") {
                continue;
            }
            if !token.is_identifier() {
                return Err(token_error(
                    &token,
                    format!("Missing enum tag in '{}', found '{}'", name, token.text),
                ));
            }
            self.compile_metadata()?;
            let tag = Name::new(&token.text);
            if tag.matches(&max_tag) {
                return Err(token_error(
                    &token,
                    format!("'{}' is reserved for the enum count", token.text),
                ));
            }
            if tags.contains(&tag) {
                return Err(token_error(
                    &token,
                    format!("Duplicate enum tag '{}'", token.text),
                ));
            }
            tags.push(tag);
            if tags.len() >= MAX_ENUM_ENTRIES {
                return Err(token_error(
                    &token,
                    format!("Enum '{}' has too many tags (at most {})", name, MAX_ENUM_ENTRIES - 1),
                ));
            }
        }
        tags.push(Name::new(&max_tag));
        self.registry
            .add_enum(self.class, name, tags)
            .map_err(|e| token_error(&name_token, e.to_string()))
    }

    /// `struct [modifiers] Name [extends Parent] { ... }`, after the
    /// `struct` keyword.
    pub(crate) fn compile_struct(&mut self) -> Result<StructId> {
        let tooltip = self.lexer.take_comment();
        let mut flags = StructFlags::empty();
        loop {
            let token = self.peek()?;
            let Some((_, flag)) = STRUCT_MODIFIERS
                .iter()
                .find(|(w, _)| token.matches_identifier(w))
            else {
                break;
            };
            flags |= *flag;
            self.get_word()?;
        }
        if flags.contains(StructFlags::NATIVE) && !self.class_entry().is_native() {
            return Err(self.declaration_error("Native structs are only allowed in native classes"));
        }

        let name_token = self.expect_name("struct name")?;
        let id = self
            .registry
            .add_struct(self.class, Name::new(&name_token.text))
            .map_err(|e| token_error(&name_token, e.to_string()))?;

        if self.match_identifier("extends")? {
            let parent_token = self.expect_name("parent struct name")?;
            let parent = self.registry.find_struct(&parent_token.text).ok_or_else(|| {
                token_error(
                    &parent_token,
                    format!("Parent struct '{}' not found", parent_token.text),
                )
            })?;
            if parent == id {
                return Err(token_error(&parent_token, "A struct can't extend itself"));
            }
            flags |= self.registry.script_struct(parent).flags & StructFlags::INHERIT;
            self.registry.script_struct_mut(id).super_struct = Some(parent);
        }
        self.registry.script_struct_mut(id).flags = flags;

        let mut data = StructData {
            declared_line: name_token.span.line,
            metadata: self.compile_metadata()?,
        };
        if let Some(text) = tooltip {
            data.metadata.insert("ToolTip".into(), text);
        }

        self.require_symbol("{", "struct")?;
        self.compile_struct_body(id)?;
        self.registry.link_struct(id);
        self.session.metadata.add_struct(self.class, id, data);
        tracing::trace!(name = %name_token.text, "struct declared");
        Ok(id)
    }

    fn compile_struct_body(&mut self, id: StructId) -> Result<()> {
        let owner = FieldOwner::Struct(id);
        loop {
            let token = self.get_word()?;
            if token.matches_symbol("}") {
                return Ok(());
            }
            if token.is_eof() {
                return Err(token_error(&token, "Missing '}' at end of struct"));
            }
            let word = token.text.to_ascii_lowercase();
            match word.as_str() {
                ";" => {}
                "var" => {
                    self.compile_variable_declaration(owner)?;
                }
                "struct" => {
                    self.compile_struct()?;
                    self.match_symbol(";")?;
                }
                "enum" => {
                    self.compile_enum()?;
                    self.match_symbol(";")?;
                }
                "const" => self.compile_const(owner)?,
                "structcpptext" | "cppstruct" => {
                    self.require_symbol("{", &token.text)?;
                    let text = self.lexer.skip_braces()?;
                    self.registry.script_struct_mut(id).cpp_text = Some(text);
                }
                "structdefaultproperties" => {
                    self.require_symbol("{", "structdefaultproperties")?;
                    let text = self.lexer.skip_braces()?;
                    self.registry.script_struct_mut(id).default_properties_text = Some(text);
                }
                _ => {
                    return Err(token_error(
                        &token,
                        format!("'{}' is not allowed in a struct", token.text),
                    ));
                }
            }
            self.lexer.clear_comment();
        }
    }

    /// `const Name = Value;`, after the `const` keyword.
    pub(crate) fn compile_const(&mut self, owner: FieldOwner) -> Result<()> {
        let name_token = self.expect_name("constant name")?;
        self.require_symbol("=", "constant declaration")?;
        let text = self.lexer.read_raw_until(&[';'])?;
        self.require_semicolon("constant declaration")?;

        let name = Name::new(&name_token.text);
        let duplicate = self
            .class_entry()
            .consts
            .iter()
            .any(|k| self.registry.constant(*k).name == name);
        if duplicate {
            return Err(token_error(
                &name_token,
                format!("Constant '{}' conflicts with a previously defined constant", name),
            ));
        }

        let registry = &*self.registry;
        let class = self.class;
        let value = parse_const_text(&text, |other| {
            registry
                .find_const(Some(class), other)
                .map(|k| registry.constant(k).value.clone())
        })
        .ok_or_else(|| {
            token_error(
                &name_token,
                format!("Bad constant value for '{}': {}", name, text),
            )
        })?;

        self.registry.add_const(ConstEntry {
            name,
            owner,
            value_text: text,
            value,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_lookup(_: &str) -> Option<ConstValue> {
        None
    }

    #[test]
    fn literal_constants() {
        assert_eq!(parse_const_text("42", no_lookup), Some(ConstValue::Int(42)));
        assert_eq!(parse_const_text("-7", no_lookup), Some(ConstValue::Int(-7)));
        assert_eq!(
            parse_const_text("\"Hello\"", no_lookup),
            Some(ConstValue::String("Hello".into()))
        );
        assert_eq!(
            parse_const_text("-0.5", no_lookup),
            Some(ConstValue::Float(OrderedFloat(-0.5)))
        );
    }

    #[test]
    fn constant_referencing_constant() {
        let value = parse_const_text("MaxPlayers", |name| {
            (name == "MaxPlayers").then_some(ConstValue::Int(16))
        });
        assert_eq!(value, Some(ConstValue::Int(16)));
    }

    #[test]
    fn trailing_tokens_are_rejected() {
        assert_eq!(parse_const_text("1 + 2", no_lookup), None);
        assert_eq!(parse_const_text("Unknown", no_lookup), None);
    }
}
