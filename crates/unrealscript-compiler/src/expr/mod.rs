//! Expression compilation.
//!
//! Expressions are compiled straight into the script buffer in one
//! left-to-right pass. Every part returns an [`ExprInfo`] recording where its
//! code starts, so operator headers, casts and conversions are inserted in
//! front of operand code that is already emitted.
//!
//! - `literal`: constants, object literals and the expression keywords
//! - `field`: names, specifiers and variable reads
//! - `context`: indexing, struct members and `object.member`
//! - `array`: dynamic array methods
//! - `call`: function and delegate calls
//! - `operator`: overload resolution, `?:` and built-in comparisons
//! - `cast`: explicit casts

mod array;
mod call;
mod cast;
mod context;
mod field;
mod literal;
mod operator;

pub(crate) use call::CallKind;
pub(crate) use field::{FieldMode, FieldScope};

use ordered_float::OrderedFloat;
use unrealscript_core::limits::MAX_OPERATOR_PRECEDENCE;
use unrealscript_core::{ConstValue, ObjectRef, PropertyBase, PropertyType};

use crate::bytecode::ExprToken;
use crate::compiler::{Result, ScriptCompiler, value_type};
use crate::conversion::{ConversionKind, find_conversion};
use crate::expr_info::ExprInfo;

impl<'a> ScriptCompiler<'a> {
    /// Compile a full expression, or return `None` if none starts here.
    ///
    /// `hint` is the type the value is about to be converted to; it lets
    /// literals, enum tags and bare function names pick a matching form.
    pub(crate) fn compile_expr(&mut self, hint: Option<&PropertyBase>) -> Result<Option<ExprInfo>> {
        self.compile_expr_prec(hint, MAX_OPERATOR_PRECEDENCE)
    }

    /// Compile an expression whose binary operators all have a precedence
    /// below `max_prec`.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub(crate) fn compile_expr_prec(
        &mut self,
        hint: Option<&PropertyBase>,
        max_prec: u8,
    ) -> Result<Option<ExprInfo>> {
        let Some(operand) = self.compile_primary(hint)? else {
            return Ok(None);
        };
        let operand = self.compile_context_chain(operand)?;
        self.compile_operators(operand, hint, max_prec).map(Some)
    }

    /// Compile an expression converted to `dest`.
    pub(crate) fn require_expr(&mut self, dest: &PropertyBase, context: &str) -> Result<ExprInfo> {
        let info = self.require_value(Some(dest), context)?;
        self.coerce(info, dest, false, context)
    }

    /// Compile an expression of any type that has a value.
    pub(crate) fn require_any_expr(&mut self, context: &str) -> Result<ExprInfo> {
        self.require_value(None, context)
    }

    pub(crate) fn require_value(
        &mut self,
        hint: Option<&PropertyBase>,
        context: &str,
    ) -> Result<ExprInfo> {
        match self.compile_expr(hint)? {
            Some(info) if !info.is_void() => Ok(info),
            Some(_) => Err(self.type_error(format!(
                "Expression in {} does not return a value",
                context
            ))),
            None => Err(self.type_error(format!("Bad or missing expression in {}", context))),
        }
    }

    /// Convert an already emitted value to `dest`, inserting the conversion
    /// code in front of it. `explicit` admits truncating and explicit-only
    /// conversions.
    pub(crate) fn coerce(
        &mut self,
        info: ExprInfo,
        dest: &PropertyBase,
        explicit: bool,
        context: &str,
    ) -> Result<ExprInfo> {
        let Some(conversion) = find_conversion(self.registry, dest, &info.ty, explicit) else {
            return Err(self.type_error(format!(
                "Type mismatch in {}: '{}' vs '{}'",
                context,
                self.describe_type(&info.ty),
                self.describe_type(dest)
            )));
        };
        if conversion.kind == ConversionKind::Identity {
            return Ok(info);
        }
        self.insert_conversion(info.start, conversion.kind);
        Ok(ExprInfo {
            side_effect: info.side_effect,
            call: info.call,
            ..ExprInfo::rvalue(value_type(dest), info.start)
        })
    }

    /// Put the code of a conversion in front of the value starting at `start`.
    pub(crate) fn insert_conversion(&mut self, start: usize, kind: ConversionKind) {
        match kind {
            ConversionKind::Identity => {}
            // The operand is the one-byte `None` literal.
            ConversionKind::NullDelegate => {
                self.buffer.patch_u8(start, ExprToken::EmptyDelegate.byte());
            }
            ConversionKind::InterfaceCast(interface) => {
                let mut bytes = vec![ExprToken::InterfaceCast.byte()];
                bytes.extend_from_slice(&ObjectRef::from(interface).raw().to_le_bytes());
                self.buffer.insert(start, &bytes);
            }
            ConversionKind::Primitive(cast) => {
                self.buffer
                    .insert(start, &[ExprToken::PrimitiveCast.byte(), u8::from(cast)]);
            }
        }
    }

    /// Script spelling of a value shape, for messages.
    pub(crate) fn describe_type(&self, base: &PropertyBase) -> String {
        let name = self.registry.type_name(&base.ty);
        if base.array_dim > 1 {
            format!("{}[{}]", name, base.array_dim)
        } else {
            name
        }
    }

    /// The operand forms that do not start with another operand.
    fn compile_primary(&mut self, hint: Option<&PropertyBase>) -> Result<Option<ExprInfo>> {
        let token = self.get_token()?;
        if token.is_eof() {
            self.lexer.unget_token(&token);
            return Ok(None);
        }

        if token.is_const() {
            let Some(value) = token.value.clone() else {
                return Err(self.internal_error("Constant token without a value"));
            };
            return self.emit_const(&value, hint).map(Some);
        }

        if token.is_symbol() {
            if token.matches_symbol("(") {
                let inner = self.require_value(hint, "parenthesized expression")?;
                self.require_symbol(")", "parenthesized expression")?;
                return Ok(Some(ExprInfo {
                    lvalue: false,
                    ..inner
                }));
            }
            if token.matches_symbol("-") {
                let next = self.peek()?;
                let negated = match next.value {
                    Some(ConstValue::Int(v)) => Some(ConstValue::Int(v.wrapping_neg())),
                    Some(ConstValue::Byte(v)) => Some(ConstValue::Int(-i32::from(v))),
                    Some(ConstValue::Float(v)) => Some(ConstValue::Float(OrderedFloat(-v.0))),
                    _ => None,
                };
                if let Some(value) = negated {
                    self.get_token()?;
                    return self.emit_const(&value, hint).map(Some);
                }
            }
            if self.has_prefix_operator(&token.text) {
                return self.compile_prefix_operator(&token).map(Some);
            }
            self.lexer.unget_token(&token);
            return Ok(None);
        }

        // An identifier directly followed by a name literal: `Type'Path'`.
        let next = self.peek()?;
        if let Some(ConstValue::Name(path)) = &next.value
            && next.is_const()
            && next.start.offset == token.start.offset + token.text.len() as u32
        {
            self.get_token()?;
            return self.compile_object_literal(&token, path).map(Some);
        }

        let word = token.text.to_ascii_lowercase();
        match word.as_str() {
            "self" => return self.compile_self().map(Some),
            "new" => return self.compile_new().map(Some),
            "arraycount" => return self.compile_array_count().map(Some),
            "enumcount" => return self.compile_enum_count().map(Some),
            "default" | "static" | "const" | "global" if next.matches_symbol(".") => {
                self.get_token()?;
                let mode = match word.as_str() {
                    "default" => FieldMode::Default,
                    "static" => FieldMode::Static,
                    "const" => FieldMode::Const,
                    _ => FieldMode::Global,
                };
                let member = self.expect_name(&format!("member after '{}.'", word))?;
                let scope = self.self_scope(mode);
                return self.compile_field_expr(&member, scope, hint).map(Some);
            }
            "super" if next.matches_symbol(".") || next.matches_symbol("(") => {
                let mode = self.compile_super_specifier()?;
                let member = self.expect_name("function name after 'super'")?;
                let scope = self.self_scope(mode);
                return self.compile_field_expr(&member, scope, hint).map(Some);
            }
            "class" if next.matches_symbol("<") => return self.compile_meta_cast().map(Some),
            _ => {}
        }

        if next.matches_symbol("(")
            && let Some(info) = self.compile_cast(&token)?
        {
            return Ok(Some(info));
        }

        let scope = self.self_scope(FieldMode::Normal);
        self.compile_field_expr(&token, scope, hint).map(Some)
    }

    /// `super.` or `super(Class).`, after the `super` keyword.
    fn compile_super_specifier(&mut self) -> Result<FieldMode> {
        let target = if self.match_symbol("(")? {
            let name = self.expect_name("class name in 'super(...)'")?;
            let class = self.registry.find_class(&name.text).ok_or_else(|| {
                self.type_error(format!("Class '{}' not found", name.text))
            })?;
            if class == self.class || !self.registry.is_child_of(self.class, class) {
                return Err(self.type_error(format!(
                    "'{}' is not a parent class of '{}'",
                    name.text,
                    self.class_name()
                )));
            }
            self.require_symbol(")", "'super(...)'")?;
            Some(class)
        } else {
            None
        };
        self.require_symbol(".", "'super'")?;
        Ok(FieldMode::Super(target))
    }

    /// The scope of names written without a context object.
    pub(crate) fn self_scope(&self, mode: FieldMode) -> FieldScope {
        FieldScope {
            class: self.class,
            state: self.state,
            mode,
            in_context: false,
        }
    }

    /// The type of a value that must be `bool`.
    pub(crate) fn bool_type() -> PropertyBase {
        PropertyBase::new(PropertyType::Bool)
    }

    pub(crate) fn int_type() -> PropertyBase {
        PropertyBase::new(PropertyType::Int)
    }
}
