//! Variable declarations and type references.
//!
//! `var` declares class and struct members, `local` declares function
//! locals; both share the declarator grammar here. [`get_var_type`] is also
//! used for parameters and return types.
//!
//! [`get_var_type`]: ScriptCompiler::get_var_type

use std::collections::BTreeMap;

use unrealscript_core::limits::MAX_ARRAY_DIM;
use unrealscript_core::{
    ClassFlags, ConstValue, FieldOwner, FunctionId, Name, PropertyFlags, PropertyId,
    PropertyType,
};
use unrealscript_parser::Token;
use unrealscript_registry::PropertyEntry;

use crate::compiler::{LocalUsage, Result, ScriptCompiler, token_error};
use crate::metadata::TokenData;

/// Property modifiers that map directly onto flags.
const VARIABLE_MODIFIERS: &[(&str, PropertyFlags)] = &[
    ("const", PropertyFlags::CONST),
    ("config", PropertyFlags::CONFIG),
    ("localized", PropertyFlags::LOCALIZED),
    ("transient", PropertyFlags::TRANSIENT),
    ("duplicatetransient", PropertyFlags::DUPLICATE_TRANSIENT),
    ("native", PropertyFlags::NATIVE),
    ("noexport", PropertyFlags::NO_EXPORT),
    ("noimport", PropertyFlags::NO_IMPORT),
    ("noclear", PropertyFlags::NO_CLEAR),
    ("editconst", PropertyFlags::EDIT_CONST),
    ("edithide", PropertyFlags::EDIT_HIDE),
    ("edittextbox", PropertyFlags::EDIT_TEXT_BOX),
    ("editfixedsize", PropertyFlags::EDIT_FIXED_SIZE),
    ("editoronly", PropertyFlags::EDITOR_ONLY),
    ("notforconsole", PropertyFlags::NOT_FOR_CONSOLE),
    ("input", PropertyFlags::INPUT),
    ("export", PropertyFlags::EXPORT_OBJECT),
    ("editinline", PropertyFlags::EDIT_INLINE),
    ("editinlineuse", PropertyFlags::EDIT_INLINE_USE),
    ("deprecated", PropertyFlags::DEPRECATED),
    ("repnotify", PropertyFlags::REP_NOTIFY),
    ("repretry", PropertyFlags::REP_RETRY),
    ("nontransactional", PropertyFlags::NON_TRANSACTIONAL),
    ("archetype", PropertyFlags::ARCHETYPE_PROPERTY),
    ("crosslevelpassive", PropertyFlags::CROSS_LEVEL_PASSIVE),
    ("crosslevelactive", PropertyFlags::CROSS_LEVEL_ACTIVE),
    ("serializetext", PropertyFlags::SERIALIZE_TEXT),
    ("databinding", PropertyFlags::DATA_BINDING),
    ("private", PropertyFlags::PRIVATE),
    ("protected", PropertyFlags::PROTECTED),
    ("privatewrite", PropertyFlags::PRIVATE_WRITE),
    ("protectedwrite", PropertyFlags::PROTECTED_WRITE),
];

/// Split `Key=Value|Key2` metadata text into pairs.
pub(crate) fn parse_metadata(text: &str) -> BTreeMap<String, String> {
    text.split('|')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| match entry.split_once('=') {
            Some((key, value)) => (key.trim().to_string(), value.trim().to_string()),
            None => (entry.to_string(), String::new()),
        })
        .collect()
}

impl<'a> ScriptCompiler<'a> {
    /// Read `<...>` metadata if it follows.
    pub(crate) fn compile_metadata(&mut self) -> Result<BTreeMap<String, String>> {
        if !self.match_symbol("<")? {
            return Ok(BTreeMap::new());
        }
        let text = self.lexer.read_raw_until(&['>'])?;
        if !self.lexer.match_closing_angle()? {
            return Err(self.declaration_error("Missing '>' after metadata"));
        }
        Ok(parse_metadata(&text))
    }

    /// The rest of a `var` or `local` statement. Locals are recognized by a
    /// function owner.
    pub(crate) fn compile_variable_declaration(&mut self, owner: FieldOwner) -> Result<Vec<PropertyId>> {
        let comment = self.lexer.take_comment();
        let is_local = matches!(owner, FieldOwner::Function(_));
        let mut flags = PropertyFlags::empty();
        let mut category = Name::none();

        if !is_local && self.match_symbol("(")? {
            flags |= PropertyFlags::EDIT;
            if !self.match_symbol(")")? {
                let name = self.expect_name("category name")?;
                category = Name::new(&name.text);
                self.require_symbol(")", "variable category")?;
            }
            if category.is_none() {
                category = match owner {
                    FieldOwner::Struct(s) => self.registry.script_struct(s).name.clone(),
                    _ => self.class_name(),
                };
            }
        }

        if !is_local {
            flags |= self.compile_variable_modifiers()?;
        } else if self.match_identifier("const")? {
            return Err(self.declaration_error("Local variables can't be const"));
        }

        if flags.intersects(PropertyFlags::NATIVE_ONLY) && !self.class_entry().is_native() {
            return Err(self.declaration_error(
                "Native variables are only allowed in native classes",
            ));
        }

        let ty = self.get_var_type(owner, flags, "variable declaration")?;
        if flags.contains(PropertyFlags::EXPORT_OBJECT) && !ty.is_object_reference() {
            let inner_is_object = ty.inner().is_some_and(PropertyType::is_object_reference);
            if !inner_is_object {
                return Err(self.declaration_error("Only object references can be instanced or exported"));
            }
        }
        if ty.needs_ctor_link() {
            flags |= PropertyFlags::NEED_CTOR_LINK;
        }

        let mut declared = Vec::new();
        loop {
            let id = self.compile_declarator(owner, &ty, flags, &category)?;
            declared.push(id);
            if self.match_symbol(",")? {
                continue;
            }
            self.require_semicolon(if is_local { "local declaration" } else { "variable declaration" })?;
            break;
        }

        let tooltip = comment.or_else(|| {
            if flags.contains(PropertyFlags::EDIT) {
                self.lexer.trailing_comment()
            } else {
                None
            }
        });
        if let Some(text) = tooltip {
            for id in &declared {
                if let Some(data) = self.session.metadata.find_class_data_mut(self.class)
                    && let Some(token) = data.property_mut(*id)
                {
                    token.metadata.entry("ToolTip".to_string()).or_insert_with(|| text.clone());
                }
            }
        }
        Ok(declared)
    }

    fn compile_variable_modifiers(&mut self) -> Result<PropertyFlags> {
        let mut flags = PropertyFlags::empty();
        loop {
            let token = self.peek()?;
            if !token.is_identifier() {
                break;
            }
            let word = token.text.to_ascii_lowercase();
            if let Some((_, flag)) = VARIABLE_MODIFIERS.iter().find(|(w, _)| *w == word) {
                flags |= *flag;
            } else {
                match word.as_str() {
                    "globalconfig" => flags |= PropertyFlags::GLOBAL_CONFIG | PropertyFlags::CONFIG,
                    "instanced" => {
                        flags |= PropertyFlags::EXPORT_OBJECT | PropertyFlags::EDIT_INLINE;
                        self.registry.class_mut(self.class).flags |= ClassFlags::HAS_INSTANCED_PROPS;
                    }
                    "interp" => flags |= PropertyFlags::INTERP | PropertyFlags::EDIT,
                    "public" => {}
                    _ => break,
                }
            }
            self.get_word()?;
        }
        if flags.contains(PropertyFlags::PRIVATE) && flags.contains(PropertyFlags::PROTECTED) {
            return Err(self.declaration_error("Variables can't be both private and protected"));
        }
        Ok(flags)
    }

    /// One `Name[Dim]{Export}<Meta>` declarator.
    fn compile_declarator(
        &mut self,
        owner: FieldOwner,
        ty: &PropertyType,
        flags: PropertyFlags,
        category: &Name,
    ) -> Result<PropertyId> {
        let name_token = self.expect_name("variable name")?;
        let name = Name::new(&name_token.text);
        self.check_variable_name(owner, &name_token)?;

        let mut array_dim = 1;
        if self.match_symbol("[")? {
            array_dim = self.compile_array_dim()?;
            self.require_symbol("]", "array dimension")?;
            if matches!(ty, PropertyType::Array(_)) {
                return Err(token_error(
                    &name_token,
                    "Static arrays of dynamic arrays are not allowed",
                ));
            }
            if matches!(ty, PropertyType::Bool) {
                return Err(token_error(&name_token, "Bool arrays are not allowed"));
            }
        }

        let mut data = TokenData {
            declared_line: name_token.span.line,
            ..TokenData::default()
        };
        if self.match_symbol("{")? {
            let text = self.lexer.skip_braces()?;
            data.export_text = Some(text.trim().to_string());
        }
        data.metadata = self.compile_metadata()?;

        let mut entry = PropertyEntry::new(name, owner, ty.clone());
        entry.array_dim = array_dim;
        entry.flags = flags;
        entry.category = category.clone();
        let id = self.registry.add_property(entry);
        self.session.metadata.add_property(self.class, id, data);

        if let FieldOwner::Function(_) = owner {
            self.locals.insert(
                id,
                LocalUsage {
                    declared_line: name_token.span.line,
                    ..LocalUsage::default()
                },
            );
        }
        Ok(id)
    }

    /// Reject names that collide with fields of the same scope.
    fn check_variable_name(&mut self, owner: FieldOwner, token: &Token) -> Result<()> {
        if self.registry.find_own_property(owner, &token.text).is_some() {
            return Err(token_error(
                token,
                format!("'{}' conflicts with a previously defined field", token.text),
            ));
        }
        match owner {
            FieldOwner::Function(_) => {
                if self.registry.find_class_property(self.class, &token.text).is_some() {
                    self.warn_at(
                        token.span.line,
                        format!("Local variable '{}' obscures a member variable", token.text),
                    );
                }
            }
            FieldOwner::Class(class) => {
                let parent = self.registry.class(class).super_class;
                if let Some(parent) = parent
                    && let Some(existing) = self.registry.find_class_property(parent, &token.text)
                {
                    let defined_in = self.registry.property_class(existing);
                    return Err(token_error(
                        token,
                        format!(
                            "'{}' obscures '{}' defined in superclass '{}'",
                            token.text,
                            token.text,
                            self.registry.class(defined_in).name
                        ),
                    ));
                }
            }
            FieldOwner::Struct(s) => {
                let parent = self.registry.script_struct(s).super_struct;
                if let Some(parent) = parent
                    && self.registry.find_struct_member(parent, &token.text).is_some()
                {
                    return Err(token_error(
                        token,
                        format!("'{}' obscures a member of the parent struct", token.text),
                    ));
                }
            }
            FieldOwner::State(_) => {}
        }
        Ok(())
    }

    /// The dimension inside `[...]`: an integer, a constant or an enum whose
    /// declared tag count becomes the dimension.
    pub(crate) fn compile_array_dim(&mut self) -> Result<u32> {
        let token = self.get_token()?;
        let value = if let Some(v) = token.int_value() {
            Some(v)
        } else if token.is_identifier() {
            if let Some(id) = self.registry.find_const(Some(self.class), &token.text) {
                match &self.registry.constant(id).value {
                    ConstValue::Int(v) => Some(*v),
                    ConstValue::Byte(v) => Some(*v as i32),
                    _ => None,
                }
            } else {
                self.registry
                    .find_enum(&token.text)
                    .map(|e| self.registry.enumeration(e).declared_tags().len() as i32)
            }
        } else {
            None
        };
        let Some(value) = value else {
            return Err(token_error(
                &token,
                format!("Bad array dimension '{}'", token.text),
            ));
        };
        if value < 1 || value as u32 > MAX_ARRAY_DIM {
            return Err(token_error(
                &token,
                format!("Array dimension {} out of range (1 to {})", value, MAX_ARRAY_DIM),
            ));
        }
        Ok(value as u32)
    }

    /// Read a type reference.
    ///
    /// `owner` scopes inline `enum` and `struct` declarations; `flags` are
    /// the modifiers already read, which decide whether native-only types
    /// are allowed.
    pub(crate) fn get_var_type(
        &mut self,
        owner: FieldOwner,
        flags: PropertyFlags,
        context: &str,
    ) -> Result<PropertyType> {
        let token = self.get_word()?;
        if !token.is_identifier() {
            return Err(token_error(
                &token,
                format!("Missing type in {}, found '{}'", context, token.text),
            ));
        }
        let word = token.text.to_ascii_lowercase();
        let ty = match word.as_str() {
            "byte" => PropertyType::byte(),
            "int" => PropertyType::Int,
            "bool" => PropertyType::Bool,
            "float" => PropertyType::Float,
            "name" => PropertyType::Name,
            "string" => PropertyType::String,
            "array" => {
                self.require_symbol("<", "array type")?;
                let inner = self.get_var_type(owner, flags, "array type")?;
                if matches!(inner, PropertyType::Array(_)) {
                    return Err(token_error(&token, "Arrays within arrays are not supported"));
                }
                if !self.lexer.match_closing_angle()? {
                    return Err(token_error(&token, "Missing '>' in array type"));
                }
                PropertyType::Array(Box::new(inner))
            }
            "map" => {
                if !flags.intersects(PropertyFlags::NATIVE | PropertyFlags::TRANSIENT) {
                    return Err(token_error(&token, "Maps must be declared native or transient"));
                }
                self.require_symbol("{", "map type")?;
                let text = self.lexer.skip_braces()?;
                PropertyType::Map {
                    export_text: text.trim().to_string(),
                }
            }
            "class" => {
                let meta = if self.match_symbol("<")? {
                    let limitor = self.expect_name("class limitor")?;
                    let id = self.registry.find_class(&limitor.text).ok_or_else(|| {
                        token_error(&limitor, format!("Limitor class '{}' not found", limitor.text))
                    })?;
                    if !self.lexer.match_closing_angle()? {
                        return Err(token_error(&limitor, "Missing '>' in class type"));
                    }
                    Some(id)
                } else {
                    self.registry.object_class()
                };
                PropertyType::Object {
                    class: Some(self.registry.class_class()),
                    meta,
                }
            }
            "delegate" => {
                self.require_symbol("<", "delegate type")?;
                let target = self.compile_delegate_target()?;
                if !self.lexer.match_closing_angle()? {
                    return Err(token_error(&token, "Missing '>' in delegate type"));
                }
                PropertyType::Delegate {
                    function: Some(target),
                }
            }
            "enum" => {
                let id = self.compile_enum()?;
                PropertyType::Byte { enum_: Some(id) }
            }
            "struct" if !matches!(owner, FieldOwner::Function(_)) => {
                let id = self.compile_struct()?;
                PropertyType::Struct(id)
            }
            _ => {
                self.lexer.unget_token(&token);
                self.compile_named_type(context)?
            }
        };
        Ok(ty)
    }

    /// `Name` or `Class.Name` naming an enum, struct, class or interface.
    fn compile_named_type(&mut self, context: &str) -> Result<PropertyType> {
        let first = self.expect_name("type name")?;
        let token = if self.match_symbol(".")? {
            if self.registry.find_class(&first.text).is_none() {
                return Err(token_error(
                    &first,
                    format!("Unknown class '{}' in {}", first.text, context),
                ));
            }
            self.expect_name("type name")?
        } else {
            first
        };
        let name = token.text.as_str();
        if let Some(id) = self.registry.find_enum(name) {
            return Ok(PropertyType::Byte { enum_: Some(id) });
        }
        if let Some(id) = self.registry.find_struct(name) {
            return Ok(PropertyType::Struct(id));
        }
        if let Some(id) = self.registry.find_class(name) {
            if self.registry.class(id).is_interface() {
                return Ok(PropertyType::Interface(id));
            }
            return Ok(PropertyType::object(id));
        }
        Err(token_error(&token, format!("Unrecognized type '{}'", token.text)))
    }

    /// `Func` or `Class.Func` naming a delegate.
    fn compile_delegate_target(&mut self) -> Result<FunctionId> {
        let first = self.expect_name("delegate name")?;
        let (class, token) = if self.match_symbol(".")? {
            let class = self.registry.find_class(&first.text).ok_or_else(|| {
                token_error(&first, format!("Unknown class '{}'", first.text))
            })?;
            (class, self.expect_name("delegate name")?)
        } else {
            (self.class, first)
        };
        let function = self
            .registry
            .find_function(class, self.state, &token.text)
            .filter(|f| self.registry.function(*f).is_delegate())
            .ok_or_else(|| {
                token_error(&token, format!("Delegate '{}' not found", token.text))
            })?;
        Ok(function)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_pairs() {
        let meta = parse_metadata("ToolTip=Speed in uu/s | ClampMin=0|Hidden");
        assert_eq!(meta.get("ToolTip").map(String::as_str), Some("Speed in uu/s"));
        assert_eq!(meta.get("ClampMin").map(String::as_str), Some("0"));
        assert_eq!(meta.get("Hidden").map(String::as_str), Some(""));
    }

    #[test]
    fn empty_metadata() {
        assert!(parse_metadata(" | ").is_empty());
    }
}
