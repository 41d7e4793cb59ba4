//! Postfix access on a value: `a[i]`, `s.Member`, `obj.Member`,
//! `class'X'.default.Prop`, `ClassVar.static.F()` and `ClassVar.const.K`.

use unrealscript_core::{
    ClassId, FunctionFlags, FunctionId, ObjectRef, PropertyBase, PropertyFlags, PropertyId,
    PropertyType, StructId,
};
use unrealscript_parser::Token;

use super::{CallKind, FieldMode, FieldScope};
use crate::bytecode::ExprToken;
use crate::compiler::{Result, ScriptCompiler, token_error};
use crate::expr_info::ExprInfo;

/// What follows the context object.
enum ContextMember {
    /// A name looked up in a class.
    Field(FieldScope),
    /// `ClassVar.static.F(...)`.
    StaticCall(FunctionId),
}

impl<'a> ScriptCompiler<'a> {
    /// Apply every `[index]` and `.member` following `info`.
    pub(crate) fn compile_context_chain(&mut self, mut info: ExprInfo) -> Result<ExprInfo> {
        loop {
            if self.peek_symbol("[")? {
                info = self.compile_index(info)?;
                continue;
            }
            if !self.match_symbol(".")? {
                return Ok(info);
            }
            let member = self.get_word()?;
            if !member.is_identifier() {
                return Err(token_error(&member, "Missing member name after '.'"));
            }
            info = match info.ty.ty.clone() {
                _ if info.ty.is_fixed_array() => {
                    return Err(token_error(
                        &member,
                        "Can't access a member of a whole fixed array",
                    ));
                }
                PropertyType::Array(_) => self.compile_dynamic_array_method(info, &member)?,
                PropertyType::Struct(id) => {
                    let property = self.registry.find_struct_member(id, &member.text).ok_or_else(|| {
                        token_error(
                            &member,
                            format!(
                                "Unrecognized member '{}' in struct '{}'",
                                member.text,
                                self.registry.script_struct(id).name
                            ),
                        )
                    })?;
                    self.compile_struct_member(info, property, id, &member)?
                }
                PropertyType::Object {
                    class: Some(class_class),
                    meta: Some(meta),
                } => self.compile_class_context(info, class_class, meta, &member)?,
                PropertyType::Object { class: Some(class), .. } => {
                    let scope = Self::context_scope(class);
                    self.compile_object_context(info, &[ExprToken::Context.byte()], &member, ContextMember::Field(scope))?
                }
                PropertyType::Interface(class) => {
                    let header = [ExprToken::Context.byte(), ExprToken::InterfaceContext.byte()];
                    let scope = Self::context_scope(class);
                    self.compile_object_context(info, &header, &member, ContextMember::Field(scope))?
                }
                PropertyType::Object { class: None, .. } => {
                    return Err(token_error(&member, "Can't access a member of 'None'"));
                }
                _ => {
                    return Err(token_error(
                        &member,
                        format!(
                            "Can't access member '{}' of a '{}' value",
                            member.text,
                            self.describe_type(&info.ty)
                        ),
                    ));
                }
            };
        }
    }

    /// `value[index]`, the `[` not yet consumed.
    fn compile_index(&mut self, info: ExprInfo) -> Result<ExprInfo> {
        let token = if info.ty.is_fixed_array() {
            ExprToken::ArrayElement
        } else if info.ty.is_dynamic_array() {
            ExprToken::DynArrayElement
        } else {
            return Err(self.type_error(format!(
                "'{}' is not an array",
                self.describe_type(&info.ty)
            )));
        };
        self.require_symbol("[", "array access")?;
        self.buffer.insert(info.start, &[token.byte()]);
        self.require_expr(&Self::int_type(), "array index")?;
        self.require_symbol("]", "array index")?;
        Ok(ExprInfo {
            property: info.property,
            side_effect: info.side_effect,
            ..info.derived(info.ty.element())
        })
    }

    /// `struct.Member`. The member inherits the struct's constness; writing
    /// it sets the struct-modified flag.
    fn compile_struct_member(
        &mut self,
        info: ExprInfo,
        property: PropertyId,
        owner: StructId,
        token: &Token,
    ) -> Result<ExprInfo> {
        let entry = self.registry.property(property);
        if entry.flags.contains(PropertyFlags::DEPRECATED) {
            let name = entry.name.clone();
            self.warn(format!("'{}' is deprecated", name));
        }
        let mut base = self.registry.property(property).base();
        base.flags |= info.ty.flags & PropertyFlags::CONST;

        let mut header = vec![ExprToken::StructMember.byte()];
        header.extend_from_slice(&ObjectRef::from(property).raw().to_le_bytes());
        header.extend_from_slice(&ObjectRef::from(owner).raw().to_le_bytes());
        header.push(0);
        self.buffer.insert(info.start, &header);
        let flag = self.buffer.struct_modified_at(info.start + header.len() - 1);

        if base.is_fixed_array() && !self.whole_arrays && !self.peek_symbol("[")? {
            return Err(token_error(
                token,
                format!("'{}' is an array and needs an index", token.text),
            ));
        }
        let mut member = ExprInfo {
            property: Some(property),
            ..info.derived(base)
        };
        member.struct_mods.push(flag);
        Ok(member)
    }

    /// `ClassVar.default.Prop`, `ClassVar.static.F()`, `ClassVar.const.K`,
    /// or a member of the class object itself.
    fn compile_class_context(
        &mut self,
        info: ExprInfo,
        class_class: ClassId,
        meta: ClassId,
        member: &Token,
    ) -> Result<ExprInfo> {
        let specifier = ["default", "static", "const"]
            .into_iter()
            .find(|s| member.matches_identifier(s));
        let specifier = match specifier {
            Some(s) if self.peek_symbol(".")? => Some(s),
            _ => None,
        };
        let Some(specifier) = specifier else {
            let scope = Self::context_scope(class_class);
            return self.compile_object_context(
                info,
                &[ExprToken::Context.byte()],
                member,
                ContextMember::Field(scope),
            );
        };
        self.require_symbol(".", "class context")?;
        let name = self.expect_name(&format!("member after '{}.'", specifier))?;
        let header = [ExprToken::ClassContext.byte()];
        match specifier {
            "default" => {
                let scope = FieldScope {
                    mode: FieldMode::Default,
                    ..Self::context_scope(meta)
                };
                self.compile_object_context(info, &header, &name, ContextMember::Field(scope))
            }
            "static" => {
                let function = self
                    .registry
                    .find_class_function(meta, &name.text)
                    .ok_or_else(|| {
                        token_error(&name, format!("Function '{}' not found", name.text))
                    })?;
                if !self.registry.function(function).flags.contains(FunctionFlags::STATIC) {
                    return Err(token_error(
                        &name,
                        format!("'{}' is not a static function", name.text),
                    ));
                }
                self.compile_object_context(info, &header, &name, ContextMember::StaticCall(function))
            }
            _ => {
                let constant = self
                    .registry
                    .find_const(Some(meta), &name.text)
                    .ok_or_else(|| {
                        token_error(&name, format!("Constant '{}' not found", name.text))
                    })?;
                let value = self.registry.constant(constant).value.clone();
                self.buffer.truncate(info.start);
                self.emit_const(&value, None)
            }
        }
    }

    /// Wrap a member access in a context header:
    /// `header object skip field size member`. `skip` is the size of the
    /// member's code, jumped over when the object is `None`; `field` and
    /// `size` describe the result value zeroed in that case.
    fn compile_object_context(
        &mut self,
        info: ExprInfo,
        header: &[u8],
        member: &Token,
        target: ContextMember,
    ) -> Result<ExprInfo> {
        let (field, size) = self.context_result(&target, &member.text);
        self.buffer.insert(info.start, header);
        let skip = self.buffer.emit_skip();
        self.buffer.emit_object(field);
        self.buffer.emit_u8(size);
        let body = self.buffer.marker();

        let mut inner = match target {
            ContextMember::Field(scope) => self.compile_field_expr(member, scope, None)?,
            ContextMember::StaticCall(function) => {
                self.require_symbol("(", &format!("call to '{}'", member.text))?;
                let start = self.buffer.len();
                self.compile_function_call(function, CallKind::Virtual, start)?
            }
        };
        while self.peek_symbol("[")? {
            inner = self.compile_index(inner)?;
        }

        let member_size = self.buffer.len() - self.buffer.site_pos(body);
        let skip_pos = self.buffer.site_pos(skip);
        self.buffer.patch_u16(skip_pos, member_size as u16);

        Ok(ExprInfo {
            ty: inner.ty,
            start: info.start,
            lvalue: inner.lvalue,
            side_effect: inner.side_effect,
            const_value: None,
            property: inner.property,
            call: inner.call,
            local: None,
            struct_mods: Vec::new(),
        })
    }

    /// The value a context expression yields, for zeroing when the context
    /// object is `None`.
    fn context_result(&mut self, target: &ContextMember, name: &str) -> (ObjectRef, u8) {
        let property = match target {
            ContextMember::Field(scope) => self
                .registry
                .find_class_property(scope.class, name)
                .or_else(|| {
                    self.registry
                        .find_function(scope.class, None, name)
                        .and_then(|f| self.registry.function(f).return_param)
                }),
            ContextMember::StaticCall(function) => self.registry.function(*function).return_param,
        };
        match property {
            Some(property) => {
                let size = self.registry.property_size(property);
                (ObjectRef::from(property), size.min(u32::from(u8::MAX)) as u8)
            }
            None => (ObjectRef::NONE, 0),
        }
    }

    fn context_scope(class: ClassId) -> FieldScope {
        FieldScope {
            class,
            state: None,
            mode: FieldMode::Normal,
            in_context: true,
        }
    }
}

/// The type of a `class<X>` value.
pub(crate) fn class_reference(class_class: ClassId, meta: ClassId) -> PropertyBase {
    PropertyBase::new(PropertyType::Object {
        class: Some(class_class),
        meta: Some(meta),
    })
}
