//! Default properties.
//!
//! Reads the text captured from `defaultproperties` and
//! `structdefaultproperties` blocks into [`ObjectValues`]. A class starts from
//! a copy of its parent's defaults, so the parent must be imported first; a
//! `Default__Class` reference to a class whose defaults are not imported yet
//! defers the whole class to a later round.

use ordered_float::OrderedFloat;
use unrealscript_core::{
    ClassId, CompileError, ConstValue, FunctionId, Name, ObjectRef, PropertyId, PropertyType,
    Span, StructId,
};
use unrealscript_parser::{Lexer, Token};
use unrealscript_registry::{ObjectValues, PropertyValue, Registry};

use crate::compiler::Result;
use crate::session::{CompilationSession, ResolvedObject};

const ARCHETYPE_PREFIX: &str = "Default__";

/// Largest index accepted for `Array(i)=Value` on a dynamic array.
const MAX_DEFAULT_ARRAY_INDEX: u32 = 16 * 1024;

/// What importing one class's defaults did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefaultsOutcome {
    /// The class's defaults are set.
    Imported,
    /// Nothing was stored; `waiting_on` must be imported first.
    Deferred { waiting_on: Name },
}

/// Import the `defaultproperties` of `class`.
///
/// Classes whose parent has not been imported, or whose text references the
/// archetype of a class that has not been imported, are deferred.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn import_default_properties(
    registry: &mut Registry,
    session: &mut CompilationSession,
    class: ClassId,
) -> Result<DefaultsOutcome> {
    let entry = registry.class(class);
    let mut values = match entry.super_class {
        Some(parent) if !registry.class(parent).defaults_imported => {
            return Ok(DefaultsOutcome::Deferred {
                waiting_on: registry.class(parent).name.clone(),
            });
        }
        Some(parent) => registry.class(parent).defaults.clone(),
        None => ObjectValues::new(),
    };

    if let Some(text) = entry.default_properties_text.clone() {
        let file = format!("{} defaultproperties", entry.name);
        let mut importer = DefaultsImporter::new(registry, session, &text, file, Scope::Class(class));
        importer.import(&mut values)?;
        if let Some(waiting_on) = importer.waiting_on {
            tracing::debug!(class = %registry.class(class).name, waiting_on = %waiting_on, "defaults deferred");
            return Ok(DefaultsOutcome::Deferred { waiting_on });
        }
    }

    let entry = registry.class_mut(class);
    tracing::debug!(class = %entry.name, values = values.len(), "defaults imported");
    entry.defaults = values;
    entry.defaults_imported = true;
    Ok(DefaultsOutcome::Imported)
}

/// Import the `structdefaultproperties` of `id` on top of its parent
/// struct's defaults, which must already be imported.
pub fn import_struct_defaults(
    registry: &mut Registry,
    session: &mut CompilationSession,
    id: StructId,
) -> Result<()> {
    let entry = registry.script_struct(id);
    let mut values = entry
        .super_struct
        .map(|parent| registry.script_struct(parent).defaults.clone())
        .unwrap_or_default();
    if let Some(text) = entry.default_properties_text.clone() {
        let file = format!("{} structdefaultproperties", entry.name);
        let mut importer = DefaultsImporter::new(registry, session, &text, file, Scope::Struct(id));
        importer.import(&mut values)?;
        if let Some(waiting_on) = importer.waiting_on {
            return Err(CompileError::declaration(
                format!(
                    "Struct defaults can't reference the archetype of '{}'",
                    waiting_on
                ),
                Span::default(),
            ));
        }
    }
    registry.script_struct_mut(id).defaults = values;
    Ok(())
}

/// Whose members a defaults block assigns.
#[derive(Debug, Clone, Copy)]
enum Scope {
    Class(ClassId),
    Struct(StructId),
}

struct DefaultsImporter<'a> {
    registry: &'a Registry,
    session: &'a mut CompilationSession,
    lexer: Lexer,
    file: String,
    scope: Scope,
    /// First archetype found that is not imported yet.
    waiting_on: Option<Name>,
}

impl<'a> DefaultsImporter<'a> {
    fn new(
        registry: &'a Registry,
        session: &'a mut CompilationSession,
        text: &str,
        file: String,
        scope: Scope,
    ) -> Self {
        Self {
            registry,
            session,
            lexer: Lexer::new(text),
            file,
            scope,
            waiting_on: None,
        }
    }

    fn error(&self, token: &Token, message: impl Into<String>) -> CompileError {
        CompileError::type_error(message, token.span)
    }

    fn get_token(&mut self) -> Result<Token> {
        Ok(self.lexer.get_token(false)?)
    }

    fn get_word(&mut self) -> Result<Token> {
        Ok(self.lexer.get_token(true)?)
    }

    fn match_symbol(&mut self, symbol: &str) -> Result<bool> {
        Ok(self.lexer.match_symbol(symbol)?)
    }

    fn require_symbol(&mut self, symbol: &str, context: &str) -> Result<()> {
        if self.match_symbol(symbol)? {
            return Ok(());
        }
        let token = self.lexer.peek_token()?;
        Err(self.error(&token, format!("Missing '{}' in {}", symbol, context)))
    }

    fn find_property(&self, name: &str) -> Option<PropertyId> {
        match self.scope {
            Scope::Class(class) => self.registry.find_class_property(class, name),
            Scope::Struct(id) => self.registry.find_struct_member(id, name),
        }
    }

    fn import(&mut self, values: &mut ObjectValues) -> Result<()> {
        loop {
            let token = self.get_word()?;
            if token.is_eof() {
                return Ok(());
            }
            if token.matches_symbol(";") {
                continue;
            }
            if !token.is_identifier() {
                return Err(self.error(
                    &token,
                    format!("Expected a property name, found '{}'", token),
                ));
            }
            let property = self.find_property(&token.text).ok_or_else(|| {
                self.error(&token, format!("Unknown property '{}' in {}", token.text, self.file))
            })?;
            self.import_statement(values, property, &token)?;
        }
    }

    /// One `Name...` statement, its name already read.
    fn import_statement(
        &mut self,
        values: &mut ObjectValues,
        property: PropertyId,
        name: &Token,
    ) -> Result<()> {
        let base = self.registry.property(property).base();

        if self.match_symbol(".")? {
            return self.import_array_operation(values, property, name);
        }

        let index = if self.match_symbol("(")? {
            Some(self.import_index(")")?)
        } else if self.match_symbol("[")? {
            Some(self.import_index("]")?)
        } else {
            None
        };
        self.require_symbol("=", &format!("default of '{}'", name.text))?;

        match (&base.ty, index) {
            (PropertyType::Array(inner), Some(index)) => {
                if index > MAX_DEFAULT_ARRAY_INDEX {
                    return Err(self.error(name, format!("Index {} of '{}' is too large", index, name.text)));
                }
                let inner = (**inner).clone();
                let value = self.import_value(&inner)?;
                let zero = self.zero_value(&inner);
                let slot = values.get_mut(property, 0);
                match slot {
                    Some(PropertyValue::Array(elements)) => {
                        store_element(elements, index as usize, value, zero);
                    }
                    _ => {
                        let mut elements = Vec::new();
                        store_element(&mut elements, index as usize, value, zero);
                        values.set(property, 0, PropertyValue::Array(elements));
                    }
                }
            }
            (ty, Some(index)) => {
                if index >= base.array_dim {
                    return Err(self.error(
                        name,
                        format!(
                            "Index {} out of range for '{}' (dimension {})",
                            index, name.text, base.array_dim
                        ),
                    ));
                }
                let ty = ty.clone();
                let value = self.import_value(&ty)?;
                values.set(property, index, value);
            }
            (ty, None) => {
                let ty = ty.clone();
                let value = self.import_value(&ty)?;
                values.set(property, 0, value);
            }
        }
        Ok(())
    }

    fn import_index(&mut self, close: &str) -> Result<u32> {
        let token = self.get_token()?;
        let index = token
            .int_value()
            .filter(|v| *v >= 0)
            .ok_or_else(|| self.error(&token, format!("Bad array index '{}'", token)))?;
        self.require_symbol(close, "array index")?;
        Ok(index as u32)
    }

    /// `Array.Add(Value)`, `Array.Remove(Value)`, `Array.RemoveIndex(i)` or
    /// `Array.Empty`.
    fn import_array_operation(
        &mut self,
        values: &mut ObjectValues,
        property: PropertyId,
        name: &Token,
    ) -> Result<()> {
        let PropertyType::Array(inner) = self.registry.property(property).ty.clone() else {
            return Err(self.error(name, format!("'{}' is not a dynamic array", name.text)));
        };
        let operation = self.get_word()?;
        let mut elements = match values.remove(property, 0) {
            Some(PropertyValue::Array(elements)) => elements,
            _ => Vec::new(),
        };
        match operation.text.to_ascii_lowercase().as_str() {
            "empty" => {
                elements.clear();
                if self.match_symbol("(")? {
                    self.require_symbol(")", "'Empty'")?;
                }
            }
            "add" => {
                self.require_symbol("(", "'Add'")?;
                elements.push(self.import_value(&inner)?);
                self.require_symbol(")", "'Add'")?;
            }
            "remove" => {
                self.require_symbol("(", "'Remove'")?;
                let value = self.import_value(&inner)?;
                self.require_symbol(")", "'Remove'")?;
                elements.retain(|e| *e != value);
            }
            "removeindex" => {
                self.require_symbol("(", "'RemoveIndex'")?;
                let index = self.import_index(")")? as usize;
                if index < elements.len() {
                    elements.remove(index);
                }
            }
            _ => {
                return Err(self.error(
                    &operation,
                    format!("Unknown array operation '{}' on '{}'", operation.text, name.text),
                ));
            }
        }
        values.set(property, 0, PropertyValue::Array(elements));
        Ok(())
    }

    /// The value of one property or element.
    fn import_value(&mut self, ty: &PropertyType) -> Result<PropertyValue> {
        match ty {
            PropertyType::Byte { enum_ } => {
                let token = self.get_token()?;
                if let Some(id) = enum_
                    && token.is_identifier()
                {
                    let index = self
                        .registry
                        .enumeration(*id)
                        .tag_index(&Name::new(&token.text))
                        .ok_or_else(|| {
                            self.error(
                                &token,
                                format!(
                                    "'{}' is not a tag of '{}'",
                                    token.text,
                                    self.registry.enumeration(*id).name
                                ),
                            )
                        })?;
                    return Ok(PropertyValue::Byte(index));
                }
                let value = self.signed_int(token)?;
                u8::try_from(value)
                    .map(PropertyValue::Byte)
                    .map_err(|_| CompileError::type_error(format!("{} does not fit in a byte", value), self.lexer.here()))
            }
            PropertyType::Int => {
                let token = self.get_token()?;
                Ok(PropertyValue::Int(self.signed_int(token)?))
            }
            PropertyType::Float => {
                let token = self.get_token()?;
                let (negative, token) = self.sign(token)?;
                let value = match token.value {
                    Some(ConstValue::Float(v)) => v.0,
                    Some(ConstValue::Int(v)) => v as f32,
                    Some(ConstValue::Byte(v)) => f32::from(v),
                    _ => return Err(self.error(&token, format!("Bad float value '{}'", token))),
                };
                let value = if negative { -value } else { value };
                Ok(PropertyValue::Float(OrderedFloat(value)))
            }
            PropertyType::Bool => {
                let token = self.get_token()?;
                match token.value {
                    Some(ConstValue::Bool(v)) => Ok(PropertyValue::Bool(v)),
                    _ => Err(self.error(&token, format!("Bad bool value '{}'", token))),
                }
            }
            PropertyType::Name => {
                let token = self.get_word()?;
                match &token.value {
                    Some(ConstValue::Name(name)) => Ok(PropertyValue::Name(name.clone())),
                    Some(ConstValue::String(text)) => Ok(PropertyValue::Name(Name::new(text))),
                    _ if token.is_identifier() => Ok(PropertyValue::Name(Name::new(&token.text))),
                    _ => Err(self.error(&token, format!("Bad name value '{}'", token))),
                }
            }
            PropertyType::String => {
                let token = self.get_token()?;
                match token.value {
                    Some(ConstValue::String(text)) => Ok(PropertyValue::String(text)),
                    _ => Err(self.error(&token, format!("Bad string value '{}'", token))),
                }
            }
            PropertyType::Struct(id) => self.import_struct(*id),
            PropertyType::Array(inner) => {
                self.require_symbol("(", "array value")?;
                let mut elements = Vec::new();
                if !self.match_symbol(")")? {
                    loop {
                        elements.push(self.import_value(inner)?);
                        if self.match_symbol(")")? {
                            break;
                        }
                        self.require_symbol(",", "array value")?;
                    }
                }
                Ok(PropertyValue::Array(elements))
            }
            PropertyType::Object { class, meta } => self.import_object(*class, *meta),
            PropertyType::Interface(interface) => self.import_object(Some(*interface), None),
            PropertyType::Delegate { .. } => self.import_delegate(),
            PropertyType::Map { .. } => Ok(PropertyValue::Raw(self.lexer.read_raw_until(&['\n', ';'])?)),
            PropertyType::None => {
                let token = self.lexer.peek_token()?;
                Err(self.error(&token, "Property has no type"))
            }
        }
    }

    /// A leading `-` folded into the following number token.
    fn sign(&mut self, token: Token) -> Result<(bool, Token)> {
        if token.matches_symbol("-") {
            Ok((true, self.get_token()?))
        } else if token.matches_symbol("+") {
            Ok((false, self.get_token()?))
        } else {
            Ok((false, token))
        }
    }

    fn signed_int(&mut self, token: Token) -> Result<i32> {
        let (negative, token) = self.sign(token)?;
        let value = token
            .int_value()
            .ok_or_else(|| self.error(&token, format!("Bad integer value '{}'", token)))?;
        Ok(if negative { value.wrapping_neg() } else { value })
    }

    /// `(Member=Value, ...)` on top of the struct's defaults, or a
    /// `vect(...)`/`rot(...)` literal.
    fn import_struct(&mut self, id: StructId) -> Result<PropertyValue> {
        let mut members = self.registry.script_struct(id).defaults.clone();
        let token = self.get_token()?;
        match &token.value {
            Some(ConstValue::Vector(parts)) => {
                for (name, part) in ["X", "Y", "Z"].into_iter().zip(parts) {
                    let member = self.struct_member(id, name, &token)?;
                    members.set(member, 0, PropertyValue::Float(*part));
                }
                return Ok(PropertyValue::Struct(members));
            }
            Some(ConstValue::Rotator(parts)) => {
                for (name, part) in ["Pitch", "Yaw", "Roll"].into_iter().zip(parts) {
                    let member = self.struct_member(id, name, &token)?;
                    members.set(member, 0, PropertyValue::Int(*part));
                }
                return Ok(PropertyValue::Struct(members));
            }
            _ if token.matches_symbol("(") => {}
            _ => {
                return Err(self.error(
                    &token,
                    format!("Missing '(' in value of struct '{}'", self.registry.script_struct(id).name),
                ));
            }
        }

        if self.match_symbol(")")? {
            return Ok(PropertyValue::Struct(members));
        }
        loop {
            let name = self.get_word()?;
            let member = self.struct_member(id, &name.text, &name)?;
            let base = self.registry.property(member).base();
            let index = if self.match_symbol("[")? {
                self.import_index("]")?
            } else if self.match_symbol("(")? {
                self.import_index(")")?
            } else {
                0
            };
            if index >= base.array_dim && !base.is_dynamic_array() {
                return Err(self.error(&name, format!("Index {} out of range for '{}'", index, name.text)));
            }
            self.require_symbol("=", "struct value")?;
            let value = self.import_value(&base.ty)?;
            members.set(member, index, value);
            if self.match_symbol(")")? {
                return Ok(PropertyValue::Struct(members));
            }
            self.require_symbol(",", "struct value")?;
        }
    }

    fn struct_member(&self, id: StructId, name: &str, token: &Token) -> Result<PropertyId> {
        self.registry.find_struct_member(id, name).ok_or_else(|| {
            self.error(
                token,
                format!(
                    "'{}' is not a member of '{}'",
                    name,
                    self.registry.script_struct(id).name
                ),
            )
        })
    }

    /// `None`, `Default__Class`, `class'Name'` or `Type'Package.Object'`.
    fn import_object(&mut self, class: Option<ClassId>, meta: Option<ClassId>) -> Result<PropertyValue> {
        let token = self.get_token()?;
        if matches!(token.value, Some(ConstValue::Object(r)) if r.is_none()) {
            return Ok(PropertyValue::Object(ObjectRef::NONE));
        }
        if !token.is_identifier() {
            return Err(self.error(&token, format!("Bad object value '{}'", token)));
        }
        if let Some(class_name) = archetype_class(&token.text) {
            return self.archetype(&token, class_name, class);
        }

        let path_token = self.get_token()?;
        let Some(ConstValue::Name(path)) = &path_token.value else {
            return Err(self.error(&token, format!("Bad object value '{}'", token.text)));
        };
        let last = path.as_str().rsplit('.').next().unwrap_or_default();

        if token.matches_identifier("class") {
            let found = self
                .registry
                .find_class(last)
                .ok_or_else(|| self.error(&path_token, format!("Class '{}' not found", path)))?;
            if let Some(meta) = meta
                && !self.registry.is_child_of(found, meta)
            {
                return Err(self.error(
                    &path_token,
                    format!(
                        "'{}' is not a subclass of '{}'",
                        path,
                        self.registry.class(meta).name
                    ),
                ));
            }
            return Ok(PropertyValue::Object(ObjectRef::from(found)));
        }
        if let Some(class_name) = archetype_class(last) {
            return self.archetype(&path_token, class_name, class);
        }

        let object_class = self.registry.find_class(&token.text).ok_or_else(|| {
            self.error(&token, format!("Unknown object type '{}'", token.text))
        })?;
        if let Some(expected) = class
            && !self.registry.is_child_of(object_class, expected)
        {
            return Err(self.error(
                &token,
                format!(
                    "'{}' is not a '{}'",
                    token.text,
                    self.registry.class(expected).name
                ),
            ));
        }
        match self.session.resolver.resolve(&token.text, path.as_str()) {
            Some(ResolvedObject::Object(reference)) => Ok(PropertyValue::Object(reference)),
            Some(ResolvedObject::Redirector(target)) => Err(self.error(
                &path_token,
                format!("'{}' is a redirector to '{}'; reference the object directly", path, target),
            )),
            None => Err(self.error(
                &path_token,
                format!("Can't find {} '{}'", token.text, path),
            )),
        }
    }

    fn archetype(&mut self, token: &Token, class_name: &str, expected: Option<ClassId>) -> Result<PropertyValue> {
        let class = self
            .registry
            .find_class(class_name)
            .ok_or_else(|| self.error(token, format!("Class '{}' not found", class_name)))?;
        if let Some(expected) = expected
            && !self.registry.is_child_of(class, expected)
        {
            return Err(self.error(
                token,
                format!(
                    "Archetype of '{}' is not a '{}'",
                    class_name,
                    self.registry.class(expected).name
                ),
            ));
        }
        let own = matches!(self.scope, Scope::Class(c) if c == class);
        if !own && !self.registry.class(class).defaults_imported && self.waiting_on.is_none() {
            self.waiting_on = Some(self.registry.class(class).name.clone());
        }
        Ok(PropertyValue::Archetype(class))
    }

    /// A function name of the class, or `None`.
    fn import_delegate(&mut self) -> Result<PropertyValue> {
        let token = self.get_token()?;
        if matches!(token.value, Some(ConstValue::Object(r)) if r.is_none()) {
            return Ok(PropertyValue::Delegate(None));
        }
        let class = match self.scope {
            Scope::Class(class) => class,
            Scope::Struct(id) => self.registry.script_struct(id).owner,
        };
        let function: Option<FunctionId> = self.registry.find_class_function(class, &token.text);
        function
            .map(|f| PropertyValue::Delegate(Some(f)))
            .ok_or_else(|| self.error(&token, format!("Function '{}' not found", token.text)))
    }

    /// The value an unassigned element of `ty` holds.
    fn zero_value(&self, ty: &PropertyType) -> PropertyValue {
        match ty {
            PropertyType::Byte { .. } => PropertyValue::Byte(0),
            PropertyType::Int | PropertyType::None => PropertyValue::Int(0),
            PropertyType::Bool => PropertyValue::Bool(false),
            PropertyType::Float => PropertyValue::Float(OrderedFloat(0.0)),
            PropertyType::Name => PropertyValue::Name(Name::none()),
            PropertyType::String => PropertyValue::String(String::new()),
            PropertyType::Struct(id) => {
                PropertyValue::Struct(self.registry.script_struct(*id).defaults.clone())
            }
            PropertyType::Object { .. } | PropertyType::Interface(_) => {
                PropertyValue::Object(ObjectRef::NONE)
            }
            PropertyType::Delegate { .. } => PropertyValue::Delegate(None),
            PropertyType::Array(_) => PropertyValue::Array(Vec::new()),
            PropertyType::Map { .. } => PropertyValue::Raw(String::new()),
        }
    }
}

/// `Foo` of `Default__Foo`.
fn archetype_class(text: &str) -> Option<&str> {
    let prefix = text.get(..ARCHETYPE_PREFIX.len())?;
    prefix
        .eq_ignore_ascii_case(ARCHETYPE_PREFIX)
        .then(|| &text[ARCHETYPE_PREFIX.len()..])
}

fn store_element(elements: &mut Vec<PropertyValue>, index: usize, value: PropertyValue, zero: PropertyValue) {
    if elements.len() <= index {
        elements.resize(index + 1, zero);
    }
    elements[index] = value;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn archetype_prefix_ignores_case() {
        assert_eq!(archetype_class("Default__Pawn"), Some("Pawn"));
        assert_eq!(archetype_class("DEFAULT__Pawn"), Some("Pawn"));
        assert_eq!(archetype_class("Pawn"), None);
        assert_eq!(archetype_class("Def"), None);
    }

    #[test]
    fn dynamic_array_elements_grow_with_zero() {
        let mut elements = vec![PropertyValue::Int(1)];
        store_element(&mut elements, 3, PropertyValue::Int(4), PropertyValue::Int(0));
        assert_eq!(
            elements,
            vec![
                PropertyValue::Int(1),
                PropertyValue::Int(0),
                PropertyValue::Int(0),
                PropertyValue::Int(4),
            ]
        );
    }
}
