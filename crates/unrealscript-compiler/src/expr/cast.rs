//! Explicit casts: `int(x)`, `Vector(s)`, `Pawn(Other)`, `EMyEnum(i)` and
//! `class<Pawn>(C)`.

use unrealscript_core::{ClassId, EnumId, ObjectRef, PropertyBase, PropertyType};
use unrealscript_parser::Token;

use super::context::class_reference;
use crate::bytecode::ExprToken;
use crate::compiler::{Result, ScriptCompiler, token_error, value_type};
use crate::conversion::find_conversion;
use crate::expr_info::ExprInfo;

/// What a type name used as a function converts to.
enum CastTarget {
    Value(PropertyType),
    Class(ClassId),
    Enum(EnumId),
}

impl<'a> ScriptCompiler<'a> {
    /// Compile `Type(expr)` if `token` names a type; `(` is next.
    pub(crate) fn compile_cast(&mut self, token: &Token) -> Result<Option<ExprInfo>> {
        let Some(target) = self.cast_target(token) else {
            return Ok(None);
        };
        self.require_symbol("(", "cast")?;
        let context = format!("cast to '{}'", token.text);
        let inner = self.require_any_expr(&context)?;
        self.require_symbol(")", &context)?;

        let info = match target {
            CastTarget::Value(ty) => {
                let dest = PropertyBase::new(ty);
                let conversion = find_conversion(self.registry, &dest, &value_type(&inner.ty), true)
                    .ok_or_else(|| {
                        token_error(
                            token,
                            format!(
                                "Can't convert '{}' to '{}'",
                                self.describe_type(&inner.ty),
                                self.describe_type(&dest)
                            ),
                        )
                    })?;
                self.insert_conversion(inner.start, conversion.kind);
                ExprInfo::rvalue(dest, inner.start)
            }
            CastTarget::Enum(id) => {
                let start = inner.start;
                self.coerce(inner.clone(), &PropertyBase::new(PropertyType::byte()), true, &context)?;
                ExprInfo::rvalue(
                    PropertyBase::new(PropertyType::Byte { enum_: Some(id) }),
                    start,
                )
            }
            CastTarget::Class(class) => self.compile_class_cast(token, class, &inner)?,
        };
        Ok(Some(ExprInfo {
            side_effect: inner.side_effect,
            ..info
        }))
    }

    fn cast_target(&self, token: &Token) -> Option<CastTarget> {
        let primitive = match token.text.to_ascii_lowercase().as_str() {
            "byte" => Some(PropertyType::byte()),
            "int" => Some(PropertyType::Int),
            "bool" => Some(PropertyType::Bool),
            "float" => Some(PropertyType::Float),
            "name" => Some(PropertyType::Name),
            "string" => Some(PropertyType::String),
            _ => None,
        };
        if let Some(ty) = primitive {
            return Some(CastTarget::Value(ty));
        }
        if let Some(id) = self.registry.find_struct(&token.text) {
            return Some(CastTarget::Value(PropertyType::Struct(id)));
        }
        if let Some(class) = self.registry.find_class(&token.text) {
            return Some(CastTarget::Class(class));
        }
        self.registry.find_enum(&token.text).map(CastTarget::Enum)
    }

    /// `Class(object)`: nothing to emit for a cast to a parent class, a
    /// `DynamicCast` for a downcast and an `InterfaceCast` for an interface.
    fn compile_class_cast(
        &mut self,
        token: &Token,
        class: ClassId,
        inner: &ExprInfo,
    ) -> Result<ExprInfo> {
        let source = match inner.ty.ty {
            PropertyType::Object { class: Some(_), meta: Some(_) } => Some(self.registry.class_class()),
            PropertyType::Object { class, meta: None } => class,
            PropertyType::Interface(c) => Some(c),
            _ => {
                return Err(token_error(
                    token,
                    format!(
                        "Can't cast a '{}' value to '{}'",
                        self.describe_type(&inner.ty),
                        token.text
                    ),
                ));
            }
        };

        if self.registry.class(class).is_interface() {
            self.insert_class_cast(inner.start, ExprToken::InterfaceCast, class);
            return Ok(ExprInfo::rvalue(
                PropertyBase::new(PropertyType::Interface(class)),
                inner.start,
            ));
        }

        let result = ExprInfo::rvalue(PropertyBase::new(PropertyType::object(class)), inner.start);
        let source_is_interface = matches!(inner.ty.ty, PropertyType::Interface(_));
        match source {
            Some(source) if !source_is_interface && self.registry.is_child_of(source, class) => {
                Ok(result)
            }
            Some(source)
                if !source_is_interface && !self.registry.is_child_of(class, source) =>
            {
                Err(token_error(
                    token,
                    format!(
                        "Cast from '{}' to '{}' will always fail",
                        self.registry.class(source).name,
                        token.text
                    ),
                ))
            }
            _ => {
                self.insert_class_cast(inner.start, ExprToken::DynamicCast, class);
                Ok(result)
            }
        }
    }

    fn insert_class_cast(&mut self, start: usize, token: ExprToken, class: ClassId) {
        let mut bytes = vec![token.byte()];
        bytes.extend_from_slice(&ObjectRef::from(class).raw().to_le_bytes());
        self.buffer.insert(start, &bytes);
    }

    /// `class<Limitor>(expr)`, after `class`.
    pub(crate) fn compile_meta_cast(&mut self) -> Result<ExprInfo> {
        self.require_symbol("<", "class cast")?;
        let name = self.expect_name("class name in 'class<>' cast")?;
        let limitor = self
            .registry
            .find_class(&name.text)
            .ok_or_else(|| token_error(&name, format!("Class '{}' not found", name.text)))?;
        if !self.lexer.match_closing_angle()? {
            return Err(self.declaration_error("Missing '>' in class cast"));
        }
        self.require_symbol("(", "class cast")?;
        let inner = self.require_any_expr("class cast")?;
        self.require_symbol(")", "class cast")?;

        let class_class = self.registry.class_class();
        let result = class_reference(class_class, limitor);
        match inner.ty.ty {
            PropertyType::Object { meta: Some(meta), .. } if self.registry.is_child_of(meta, limitor) => {}
            PropertyType::Object { meta: Some(_), .. } => {
                self.insert_class_cast(inner.start, ExprToken::MetaCast, limitor);
            }
            PropertyType::Object { class: Some(c), meta: None } if self.registry.is_child_of(c, class_class) => {
                self.insert_class_cast(inner.start, ExprToken::MetaCast, limitor);
            }
            PropertyType::Object { class: None, .. } => {}
            _ => {
                return Err(token_error(
                    &name,
                    format!("Can't cast a '{}' value to a class", self.describe_type(&inner.ty)),
                ));
            }
        }
        Ok(ExprInfo {
            side_effect: inner.side_effect,
            ..ExprInfo::rvalue(result, inner.start)
        })
    }
}
