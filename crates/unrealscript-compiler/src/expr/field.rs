//! Names in expressions.
//!
//! A bare name is looked up as a local or parameter, then a member variable,
//! then a function, then a constant, then an enum tag. Specifiers narrow the
//! lookup: `default.` reads class defaults, `static.` binds a static
//! function, `const.` names a constant, `global.` skips state overrides and
//! `super.` calls the parent version.

use unrealscript_core::{
    ClassId, ConstValue, EnumId, FieldOwner, FunctionFlags, FunctionId, Name, ObjectRef,
    PropertyBase, PropertyFlags, PropertyId, PropertyType, StateId,
};
use unrealscript_parser::Token;

use super::CallKind;
use crate::bytecode::ExprToken;
use crate::compiler::{Result, ScriptCompiler, token_error};
use crate::expr_info::ExprInfo;

/// How a name after a specifier is looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FieldMode {
    Normal,
    /// `default.X`
    Default,
    /// `static.F()`
    Static,
    /// `const.X`
    Const,
    /// `global.F()`
    Global,
    /// `super.F()`, or `super(Class).F()` with the class.
    Super(Option<ClassId>),
}

/// Where a name is looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldScope {
    pub class: ClassId,
    pub state: Option<StateId>,
    pub mode: FieldMode,
    /// Set for the member in `expr.member`: locals are out of reach and
    /// calls go through the context object.
    pub in_context: bool,
}

impl<'a> ScriptCompiler<'a> {
    /// Compile the name in `token` as a value.
    pub(crate) fn compile_field_expr(
        &mut self,
        token: &Token,
        scope: FieldScope,
        hint: Option<&PropertyBase>,
    ) -> Result<ExprInfo> {
        let name = token.text.as_str();
        match scope.mode {
            FieldMode::Const => {
                let constant = self
                    .registry
                    .find_const(Some(scope.class), name)
                    .ok_or_else(|| token_error(token, format!("Constant '{}' not found", name)))?;
                let value = self.registry.constant(constant).value.clone();
                return self.emit_const(&value, hint);
            }
            FieldMode::Default => {
                let property = self
                    .registry
                    .find_class_property(scope.class, name)
                    .ok_or_else(|| {
                        token_error(token, format!("Unknown default variable '{}'", name))
                    })?;
                return self.compile_variable(token, property, scope);
            }
            FieldMode::Static | FieldMode::Global | FieldMode::Super(_) => {
                return self.compile_bound_call(token, scope);
            }
            FieldMode::Normal => {}
        }

        if !scope.in_context
            && let Some(function) = self.function
            && let Some(local) = self
                .registry
                .find_own_property(FieldOwner::Function(function), name)
        {
            return self.compile_variable(token, local, scope);
        }

        if let Some(property) = self.registry.find_class_property(scope.class, name) {
            return self.compile_variable(token, property, scope);
        }

        if let Some(function) = self.registry.find_function(scope.class, scope.state, name) {
            return self.compile_function_reference(token, function, scope, hint);
        }

        if !scope.in_context {
            if let Some(constant) = self.registry.find_const(Some(scope.class), name) {
                let value = self.registry.constant(constant).value.clone();
                return self.emit_const(&value, hint);
            }
            if let Some(info) = self.compile_enum_tag(token, hint)? {
                return Ok(info);
            }
        }

        if scope.in_context {
            Err(token_error(
                token,
                format!(
                    "Unrecognized member '{}' in class '{}'",
                    name,
                    self.registry.class(scope.class).name
                ),
            ))
        } else {
            Err(token_error(token, format!("Unknown identifier '{}'", name)))
        }
    }

    /// Read a local, parameter or member variable.
    pub(crate) fn compile_variable(
        &mut self,
        token: &Token,
        property: PropertyId,
        scope: FieldScope,
    ) -> Result<ExprInfo> {
        let entry = self.registry.property(property).clone();
        let is_local = matches!(entry.owner, FieldOwner::Function(_));
        if !is_local {
            self.check_property_access(token, property)?;
            if !scope.in_context && scope.mode != FieldMode::Default && self.in_static_function() {
                return Err(token_error(
                    token,
                    format!("Can't access instance variable '{}' in a static function", entry.name),
                ));
            }
        }
        if entry.flags.contains(PropertyFlags::DEPRECATED) {
            self.warn(format!("'{}' is deprecated", entry.name));
        }

        if let PropertyType::Delegate {
            function: Some(function),
        } = entry.ty
            && entry.array_dim == 1
            && self.match_symbol("(")?
        {
            let start = self.buffer.len();
            let kind = CallKind::Delegate {
                property,
                local: is_local,
            };
            return self.compile_function_call(function, kind, start);
        }

        let start = self.buffer.len();
        if entry.ty == PropertyType::Bool {
            self.buffer.emit_token(ExprToken::BoolVariable);
        }
        let token_kind = if is_local {
            if entry.flags.contains(PropertyFlags::OUT_PARM) {
                ExprToken::LocalOutVariable
            } else {
                ExprToken::LocalVariable
            }
        } else if scope.mode == FieldMode::Default {
            ExprToken::DefaultVariable
        } else {
            ExprToken::InstanceVariable
        };
        self.buffer.emit_token(token_kind);
        self.buffer.emit_object(ObjectRef::from(property));

        let mut info = ExprInfo::variable(entry.base(), start, property);
        if is_local {
            info.local = self.note_local_read(property);
        }

        if entry.array_dim > 1 && !self.whole_arrays && !self.peek_symbol("[")? {
            return Err(token_error(
                token,
                format!("'{}' is an array and needs an index", entry.name),
            ));
        }
        if self.peek_symbol("(")? && !(self.foreach_array && info.ty.is_dynamic_array()) {
            return Err(token_error(token, format!("'{}' is not a function", entry.name)));
        }
        Ok(info)
    }

    /// A function name: a call if `(` follows, otherwise a delegate value.
    fn compile_function_reference(
        &mut self,
        token: &Token,
        function: FunctionId,
        scope: FieldScope,
        hint: Option<&PropertyBase>,
    ) -> Result<ExprInfo> {
        let entry = self.registry.function(function);
        let flags = entry.flags;
        let name = entry.name.clone();

        if self.match_symbol("(")? {
            if !scope.in_context
                && self.in_static_function()
                && !flags.contains(FunctionFlags::STATIC)
            {
                return Err(token_error(
                    token,
                    format!("Can't call instance function '{}' from a static function", name),
                ));
            }
            let kind = if flags.contains(FunctionFlags::DELEGATE) {
                let property = self.delegate_property(scope.class, function, token)?;
                CallKind::Delegate {
                    property,
                    local: false,
                }
            } else {
                CallKind::Virtual
            };
            let start = self.buffer.len();
            return self.compile_function_call(function, kind, start);
        }

        let wants_delegate = hint.is_some_and(|h| matches!(h.ty, PropertyType::Delegate { .. }));
        if !wants_delegate {
            return Err(token_error(
                token,
                format!("Missing '(' in call to '{}'", name),
            ));
        }
        let start = self.buffer.len();
        self.buffer.emit_token(ExprToken::InstanceDelegate);
        let index = self.name_index(&name);
        self.buffer.emit_u32(index);
        Ok(ExprInfo::rvalue(
            PropertyBase::new(PropertyType::Delegate {
                function: Some(function),
            }),
            start,
        ))
    }

    /// `static.F()`, `global.F()` and `super.F()`.
    fn compile_bound_call(&mut self, token: &Token, scope: FieldScope) -> Result<ExprInfo> {
        let name = token.text.as_str();
        let function = match scope.mode {
            FieldMode::Static => self.registry.find_function(scope.class, scope.state, name),
            FieldMode::Global => self.registry.find_class_function(scope.class, name),
            FieldMode::Super(Some(class)) => self.registry.find_class_function(class, name),
            FieldMode::Super(None) => self.find_super_function(name),
            _ => None,
        }
        .ok_or_else(|| token_error(token, format!("Function '{}' not found", name)))?;

        let flags = self.registry.function(function).flags;
        let kind = match scope.mode {
            FieldMode::Static => {
                if !flags.contains(FunctionFlags::STATIC) {
                    return Err(token_error(
                        token,
                        format!("'{}' is not a static function", name),
                    ));
                }
                CallKind::Final
            }
            FieldMode::Global => CallKind::Global,
            _ => CallKind::Final,
        };
        if flags.contains(FunctionFlags::DELEGATE) {
            return Err(token_error(
                token,
                format!("Delegate '{}' can't be called with a specifier", name),
            ));
        }
        if kind != CallKind::Final
            && self.in_static_function()
            && !flags.contains(FunctionFlags::STATIC)
        {
            return Err(token_error(
                token,
                format!("Can't call instance function '{}' from a static function", name),
            ));
        }
        self.require_symbol("(", &format!("call to '{}'", name))?;
        let start = self.buffer.len();
        self.compile_function_call(function, kind, start)
    }

    /// The version of `name` that the current function overrides: the
    /// parent state's, then the class's own, then the parent class's.
    fn find_super_function(&self, name: &str) -> Option<FunctionId> {
        let in_state_function = self
            .function
            .is_some_and(|f| matches!(self.registry.function(f).owner, FieldOwner::State(_)));
        if let Some(state) = self.state
            && in_state_function
        {
            if let Some(parent) = self.registry.state(state).super_state
                && let Some(found) = self.registry.find_state_function(parent, name)
            {
                return Some(found);
            }
            return self.registry.find_class_function(self.class, name);
        }
        let parent = self.class_entry().super_class?;
        self.registry.find_class_function(parent, name)
    }

    /// The property holding the current value of a delegate function.
    pub(crate) fn delegate_property(
        &self,
        class: ClassId,
        function: FunctionId,
        token: &Token,
    ) -> Result<PropertyId> {
        let name = format!("__{}__Delegate", self.registry.function(function).name);
        let owner = self.registry.function_class(function);
        self.registry
            .find_class_property(class, &name)
            .or_else(|| self.registry.find_class_property(owner, &name))
            .ok_or_else(|| {
                token_error(token, format!("Delegate property for '{}' not found", token.text))
            })
    }

    /// An enum tag, resolved against the expected enum first.
    fn compile_enum_tag(
        &mut self,
        token: &Token,
        hint: Option<&PropertyBase>,
    ) -> Result<Option<ExprInfo>> {
        let name = token.text.as_str();

        if let Some(enum_id) = self.registry.find_enum(name)
            && self.match_symbol(".")?
        {
            let tag = self.expect_name(&format!("tag of enum '{}'", name))?;
            let value = self
                .registry
                .enumeration(enum_id)
                .tag_index(&Name::new(&tag.text))
                .ok_or_else(|| {
                    token_error(&tag, format!("'{}' is not a tag of enum '{}'", tag.text, name))
                })?;
            return self.emit_enum_tag(enum_id, value).map(Some);
        }

        let hinted = hint.and_then(|h| h.ty.enum_id());
        let matches = self.registry.find_enum_tag(name);
        let found = match hinted.and_then(|e| matches.iter().find(|(id, _)| *id == e)) {
            Some(found) => Some(*found),
            None => match matches {
                [] => None,
                [single] => Some(*single),
                _ => {
                    return Err(token_error(
                        token,
                        format!("Enum tag '{}' is ambiguous; qualify it with its enum", name),
                    ));
                }
            },
        };
        match found {
            Some((enum_id, value)) => self.emit_enum_tag(enum_id, value).map(Some),
            None => Ok(None),
        }
    }

    fn emit_enum_tag(&mut self, enum_id: EnumId, value: u8) -> Result<ExprInfo> {
        let start = self.buffer.len();
        self.buffer.emit_token(ExprToken::ByteConst);
        self.buffer.emit_u8(value);
        Ok(ExprInfo::constant(
            PropertyBase::new(PropertyType::Byte {
                enum_: Some(enum_id),
            }),
            start,
            ConstValue::Byte(value),
        ))
    }

    /// Private and protected member variables.
    fn check_property_access(&mut self, token: &Token, property: PropertyId) -> Result<()> {
        let flags = self.registry.property(property).flags;
        let owner = self.registry.property_class(property);
        if flags.contains(PropertyFlags::PRIVATE) && owner != self.class {
            return Err(token_error(
                token,
                format!(
                    "'{}' is private in '{}'",
                    token.text,
                    self.registry.class(owner).name
                ),
            ));
        }
        if flags.contains(PropertyFlags::PROTECTED) && !self.registry.is_child_of(self.class, owner) {
            return Err(token_error(
                token,
                format!(
                    "'{}' is protected in '{}'",
                    token.text,
                    self.registry.class(owner).name
                ),
            ));
        }
        Ok(())
    }

    /// Private and protected functions.
    pub(crate) fn check_function_access(&self, token_text: &str, function: FunctionId) -> Result<()> {
        let flags = self.registry.function(function).flags;
        let owner = self.registry.function_class(function);
        if flags.contains(FunctionFlags::PRIVATE) && owner != self.class {
            return Err(self.type_error(format!(
                "'{}' is private in '{}'",
                token_text,
                self.registry.class(owner).name
            )));
        }
        if flags.contains(FunctionFlags::PROTECTED) && !self.registry.is_child_of(self.class, owner) {
            return Err(self.type_error(format!(
                "'{}' is protected in '{}'",
                token_text,
                self.registry.class(owner).name
            )));
        }
        Ok(())
    }
}
