//! Constants and the keyword expressions `self`, `new`, `ArrayCount` and
//! `EnumCount`.

use ordered_float::OrderedFloat;
use unrealscript_core::limits::MAX_STRING_CONST_LENGTH;
use unrealscript_core::{
    ClassFlags, ClassId, ConstValue, Name, ObjectRef, ObjectRefKind, PropertyBase, PropertyType,
    StructId,
};
use unrealscript_parser::Token;

use crate::bytecode::ExprToken;
use crate::compiler::{Result, ScriptCompiler, token_error};
use crate::expr_info::ExprInfo;
use crate::session::ResolvedObject;

impl<'a> ScriptCompiler<'a> {
    /// Emit a constant in its shortest form. An integer expected as a byte
    /// or float is emitted as one.
    pub(crate) fn emit_const(
        &mut self,
        value: &ConstValue,
        hint: Option<&PropertyBase>,
    ) -> Result<ExprInfo> {
        let start = self.buffer.len();
        let hinted = hint.map(|h| &h.ty);
        let (ty, value) = match value {
            ConstValue::Int(v) => match hinted {
                Some(PropertyType::Byte { .. }) if (0..=255).contains(v) => {
                    self.buffer.emit_token(ExprToken::ByteConst);
                    self.buffer.emit_u8(*v as u8);
                    (PropertyType::byte(), ConstValue::Byte(*v as u8))
                }
                Some(PropertyType::Float) => {
                    let f = OrderedFloat(*v as f32);
                    self.buffer.emit_token(ExprToken::FloatConst);
                    self.buffer.emit_f32(f);
                    (PropertyType::Float, ConstValue::Float(f))
                }
                _ => {
                    self.emit_int(*v);
                    (PropertyType::Int, value.clone())
                }
            },
            ConstValue::Byte(v) => {
                self.buffer.emit_token(ExprToken::ByteConst);
                self.buffer.emit_u8(*v);
                (PropertyType::byte(), value.clone())
            }
            ConstValue::Bool(b) => {
                self.buffer.emit_token(if *b { ExprToken::True } else { ExprToken::False });
                (PropertyType::Bool, value.clone())
            }
            ConstValue::Float(f) => {
                self.buffer.emit_token(ExprToken::FloatConst);
                self.buffer.emit_f32(*f);
                (PropertyType::Float, value.clone())
            }
            ConstValue::Name(name) => {
                self.buffer.emit_token(ExprToken::NameConst);
                let index = self.name_index(name);
                self.buffer.emit_u32(index);
                (PropertyType::Name, value.clone())
            }
            ConstValue::String(text) => {
                if text.len() > MAX_STRING_CONST_LENGTH {
                    return Err(self.type_error(format!(
                        "String constant is too long (at most {} characters)",
                        MAX_STRING_CONST_LENGTH
                    )));
                }
                if text.is_ascii() {
                    self.buffer.emit_token(ExprToken::StringConst);
                    self.buffer.emit_cstring(text);
                } else {
                    self.buffer.emit_token(ExprToken::UnicodeStringConst);
                    self.buffer.emit_wide_string(text);
                }
                (PropertyType::String, value.clone())
            }
            ConstValue::Vector(v) => {
                let id = self.builtin_struct("Vector")?;
                self.buffer.emit_token(ExprToken::VectorConst);
                for part in v {
                    self.buffer.emit_f32(*part);
                }
                (PropertyType::Struct(id), value.clone())
            }
            ConstValue::Rotator(r) => {
                let id = self.builtin_struct("Rotator")?;
                self.buffer.emit_token(ExprToken::RotationConst);
                for part in r {
                    self.buffer.emit_i32(*part);
                }
                (PropertyType::Struct(id), value.clone())
            }
            ConstValue::Object(reference) if reference.is_none() => {
                self.buffer.emit_token(ExprToken::NoObject);
                (PropertyType::null_object(), value.clone())
            }
            ConstValue::Object(reference) => {
                self.buffer.emit_token(ExprToken::ObjectConst);
                self.buffer.emit_object(*reference);
                (self.object_const_type(*reference), value.clone())
            }
        };
        Ok(ExprInfo::constant(PropertyBase::new(ty), start, value))
    }

    /// Emit an integer constant in its shortest encoding.
    pub(crate) fn emit_int(&mut self, value: i32) {
        match value {
            0 => self.buffer.emit_token(ExprToken::IntZero),
            1 => self.buffer.emit_token(ExprToken::IntOne),
            2..=255 => {
                self.buffer.emit_token(ExprToken::IntConstByte);
                self.buffer.emit_u8(value as u8);
            }
            _ => {
                self.buffer.emit_token(ExprToken::IntConst);
                self.buffer.emit_i32(value);
            }
        }
    }

    fn builtin_struct(&self, name: &str) -> Result<StructId> {
        self.registry
            .find_struct(name)
            .ok_or_else(|| self.type_error(format!("Struct '{}' is not declared", name)))
    }

    fn object_const_type(&self, reference: ObjectRef) -> PropertyType {
        match reference.kind() {
            Some(ObjectRefKind::Class) => PropertyType::Object {
                class: Some(self.registry.class_class()),
                meta: Some(ClassId::new(reference.index())),
            },
            _ => match self.registry.object_class() {
                Some(object) => PropertyType::object(object),
                None => PropertyType::null_object(),
            },
        }
    }

    /// `Type'Path'`. Class literals resolve against the registry, anything
    /// else goes through the session's object resolver.
    pub(crate) fn compile_object_literal(&mut self, type_token: &Token, path: &Name) -> Result<ExprInfo> {
        let start = self.buffer.len();
        let class_class = self.registry.class_class();
        if type_token.matches_identifier("class") {
            let class_name = path.as_str().rsplit('.').next().unwrap_or_default();
            let class = self.registry.find_class(class_name).ok_or_else(|| {
                token_error(type_token, format!("Class '{}' not found", path))
            })?;
            self.buffer.emit_token(ExprToken::ObjectConst);
            self.buffer.emit_object(ObjectRef::from(class));
            return Ok(ExprInfo::constant(
                PropertyBase::new(PropertyType::Object {
                    class: Some(class_class),
                    meta: Some(class),
                }),
                start,
                ConstValue::Object(ObjectRef::from(class)),
            ));
        }

        let class = self.registry.find_class(&type_token.text).ok_or_else(|| {
            token_error(
                type_token,
                format!("Unknown object type '{}'", type_token.text),
            )
        })?;
        let resolved = self.session.resolver.resolve(&type_token.text, path.as_str());
        let reference = match resolved {
            Some(ResolvedObject::Object(reference)) => reference,
            Some(ResolvedObject::Redirector(target)) => {
                return Err(token_error(
                    type_token,
                    format!(
                        "'{}' is a redirector to '{}'; reference the object directly",
                        path, target
                    ),
                ));
            }
            None => {
                return Err(token_error(
                    type_token,
                    format!("Can't find {} '{}'", type_token.text, path),
                ));
            }
        };
        self.buffer.emit_token(ExprToken::ObjectConst);
        self.buffer.emit_object(reference);
        Ok(ExprInfo::constant(
            PropertyBase::new(PropertyType::object(class)),
            start,
            ConstValue::Object(reference),
        ))
    }

    pub(crate) fn compile_self(&mut self) -> Result<ExprInfo> {
        if self.in_static_function() {
            return Err(self.type_error("'self' can't be used in a static function"));
        }
        let start = self.buffer.len();
        self.buffer.emit_token(ExprToken::SelfRef);
        Ok(ExprInfo::rvalue(
            PropertyBase::new(PropertyType::object(self.class)),
            start,
        ))
    }

    /// `new [(Outer [, Name [, Flags]])] Class [(Template)]`, after `new`.
    ///
    /// Always five operands; the ones not written are `Nothing`.
    pub(crate) fn compile_new(&mut self) -> Result<ExprInfo> {
        let start = self.buffer.len();
        self.buffer.emit_token(ExprToken::New);
        let object = self.object_type();
        let mut given = 0;
        if self.match_symbol("(")? && !self.match_symbol(")")? {
            self.require_expr(&object, "'new' outer")?;
            given = 1;
            if self.match_symbol(",")? {
                self.require_expr(&PropertyBase::new(PropertyType::String), "'new' name")?;
                given = 2;
                if self.match_symbol(",")? {
                    self.require_expr(&Self::int_type(), "'new' flags")?;
                    given = 3;
                }
            }
            self.require_symbol(")", "'new'")?;
        }
        for _ in given..3 {
            self.buffer.emit_token(ExprToken::Nothing);
        }

        let class = self.compile_new_class()?;
        let flags = self.registry.class(class).flags;
        if flags.contains(ClassFlags::ABSTRACT) {
            return Err(self.type_error(format!(
                "Can't create an instance of abstract class '{}'",
                self.registry.class(class).name
            )));
        }
        if let Some(actor) = self.registry.find_class("Actor")
            && self.registry.is_child_of(class, actor)
        {
            return Err(self.type_error("Actors must be spawned, not created with 'new'"));
        }

        if self.match_symbol("(")? {
            self.require_expr(&object, "'new' template")?;
            self.require_symbol(")", "'new' template")?;
        } else {
            self.buffer.emit_token(ExprToken::Nothing);
        }
        Ok(ExprInfo {
            side_effect: true,
            ..ExprInfo::rvalue(PropertyBase::new(PropertyType::object(class)), start)
        })
    }

    /// The class operand of `new`: a class name or a class-valued expression.
    fn compile_new_class(&mut self) -> Result<ClassId> {
        let token = self.get_word()?;
        if token.is_identifier()
            && !token.matches_identifier("class")
            && let Some(class) = self.registry.find_class(&token.text)
            && !self.peek_symbol(".")?
        {
            self.buffer.emit_token(ExprToken::ObjectConst);
            self.buffer.emit_object(ObjectRef::from(class));
            return Ok(class);
        }
        self.lexer.unget_token(&token);
        let info = self
            .compile_expr_prec(None, 0)?
            .ok_or_else(|| self.type_error("Missing class in 'new'"))?;
        match info.ty.ty {
            PropertyType::Object {
                meta: Some(class), ..
            } => Ok(class),
            _ => Err(self.type_error(format!(
                "'new' needs a class, found '{}'",
                self.describe_type(&info.ty)
            ))),
        }
    }

    /// `ArrayCount(FixedArray)`: the dimension, as an integer constant.
    pub(crate) fn compile_array_count(&mut self) -> Result<ExprInfo> {
        self.require_symbol("(", "'ArrayCount'")?;
        let saved = self.buffer.checkpoint();
        self.whole_arrays = true;
        let inner = self.require_any_expr("'ArrayCount'");
        self.whole_arrays = false;
        let inner = inner?;
        self.buffer.restore(saved);
        self.require_symbol(")", "'ArrayCount'")?;
        if inner.ty.array_dim <= 1 {
            return Err(self.type_error("'ArrayCount' needs a fixed-size array"));
        }
        let start = self.buffer.len();
        let dim = inner.ty.array_dim as i32;
        self.emit_int(dim);
        Ok(ExprInfo::constant(Self::int_type(), start, ConstValue::Int(dim)))
    }

    /// `EnumCount(Enum)`: the number of declared tags.
    pub(crate) fn compile_enum_count(&mut self) -> Result<ExprInfo> {
        self.require_symbol("(", "'EnumCount'")?;
        let name = self.expect_name("enum name in 'EnumCount'")?;
        let id = self
            .registry
            .find_enum(&name.text)
            .ok_or_else(|| token_error(&name, format!("Enum '{}' not found", name.text)))?;
        self.require_symbol(")", "'EnumCount'")?;
        let count = self.registry.enumeration(id).declared_tags().len() as i32;
        let start = self.buffer.len();
        self.emit_int(count);
        Ok(ExprInfo::constant(Self::int_type(), start, ConstValue::Int(count)))
    }

    /// `Object`, or `None`'s type before the root class exists.
    pub(crate) fn object_type(&self) -> PropertyBase {
        PropertyBase::new(match self.registry.object_class() {
            Some(object) => PropertyType::object(object),
            None => PropertyType::null_object(),
        })
    }
}
