//! Dynamic array methods: `Length`, `Add`, `Insert`, `Remove`, `AddItem`,
//! `RemoveItem`, `InsertItem`, `Find` and `Sort`.

use unrealscript_core::{ConstValue, ObjectRef, PropertyBase, PropertyFlags, PropertyType};
use unrealscript_parser::Token;

use crate::bytecode::ExprToken;
use crate::compiler::{Result, ScriptCompiler, token_error, value_type};
use crate::expr_info::ExprInfo;

impl<'a> ScriptCompiler<'a> {
    /// `array.Method`, with `info` the already emitted array.
    pub(crate) fn compile_dynamic_array_method(
        &mut self,
        info: ExprInfo,
        method: &Token,
    ) -> Result<ExprInfo> {
        let element = value_type(&info.ty.element());
        let name = method.text.to_ascii_lowercase();
        match name.as_str() {
            "length" => {
                self.buffer.insert(info.start, &[ExprToken::DynArrayLength.byte()]);
                let ty = Self::int_type().with_flags(info.ty.flags & PropertyFlags::CONST);
                Ok(ExprInfo {
                    property: info.property,
                    ..info.derived(ty)
                })
            }
            "add" => {
                self.begin_array_mutation(&info, method)?;
                self.buffer.insert(info.start, &[ExprToken::DynArrayAdd.byte()]);
                self.require_expr(&Self::int_type(), "'Add' count")?;
                self.finish_array_call(method)?;
                Ok(Self::array_result(Self::int_type(), info.start))
            }
            "insert" | "remove" => {
                self.begin_array_mutation(&info, method)?;
                let token = if name == "insert" {
                    ExprToken::DynArrayInsert
                } else {
                    ExprToken::DynArrayRemove
                };
                self.buffer.insert(info.start, &[token.byte()]);
                self.require_expr(&Self::int_type(), &format!("'{}' index", method.text))?;
                self.require_symbol(",", &format!("call to '{}'", method.text))?;
                self.require_expr(&Self::int_type(), &format!("'{}' count", method.text))?;
                self.finish_array_call(method)?;
                Ok(Self::array_result(PropertyBase::none(), info.start))
            }
            "additem" | "removeitem" | "insertitem" => {
                self.begin_array_mutation(&info, method)?;
                let (token, ret) = match name.as_str() {
                    "additem" => (ExprToken::DynArrayAddItem, Self::int_type()),
                    "removeitem" => (ExprToken::DynArrayRemoveItem, PropertyBase::none()),
                    _ => (ExprToken::DynArrayInsertItem, Self::int_type()),
                };
                self.buffer.insert(info.start, &[token.byte()]);
                let skip = self.buffer.emit_skip();
                if token == ExprToken::DynArrayInsertItem {
                    self.require_expr(&Self::int_type(), "'InsertItem' index")?;
                    self.require_symbol(",", "call to 'InsertItem'")?;
                }
                self.require_expr(&element, &format!("'{}' item", method.text))?;
                self.finish_array_call(method)?;
                self.buffer.finish_skip(skip);
                Ok(Self::array_result(ret, info.start))
            }
            "find" => {
                self.require_symbol("(", "call to 'Find'")?;
                if let PropertyType::Struct(id) = element.ty
                    && let Some(ConstValue::Name(member)) = self.peek()?.value
                {
                    self.get_token()?;
                    let property = self.registry.find_struct_member(id, member.as_str()).ok_or_else(|| {
                        token_error(
                            method,
                            format!(
                                "'{}' is not a member of '{}'",
                                member,
                                self.registry.script_struct(id).name
                            ),
                        )
                    })?;
                    self.require_symbol(",", "call to 'Find'")?;
                    self.buffer.insert(info.start, &[ExprToken::DynArrayFindStruct.byte()]);
                    self.buffer.emit_object(ObjectRef::from(property));
                    let skip = self.buffer.emit_skip();
                    let member_type = value_type(&self.registry.property(property).base());
                    self.require_expr(&member_type, "'Find' value")?;
                    self.finish_array_call(method)?;
                    self.buffer.finish_skip(skip);
                    return Ok(Self::array_result(Self::int_type(), info.start));
                }
                self.buffer.insert(info.start, &[ExprToken::DynArrayFind.byte()]);
                let skip = self.buffer.emit_skip();
                self.require_expr(&element, "'Find' item")?;
                self.finish_array_call(method)?;
                self.buffer.finish_skip(skip);
                Ok(Self::array_result(Self::int_type(), info.start))
            }
            "sort" => {
                self.begin_array_mutation(&info, method)?;
                self.buffer.insert(info.start, &[ExprToken::DynArraySort.byte()]);
                let skip = self.buffer.emit_skip();
                let hint = PropertyBase::new(PropertyType::Delegate { function: None });
                let comparer = self.require_value(Some(&hint), "'Sort' comparison")?;
                if !matches!(comparer.ty.ty, PropertyType::Delegate { .. }) {
                    return Err(token_error(method, "'Sort' needs a delegate"));
                }
                self.finish_array_call(method)?;
                self.buffer.finish_skip(skip);
                Ok(Self::array_result(PropertyBase::none(), info.start))
            }
            _ => Err(token_error(
                method,
                format!("Unknown dynamic array function '{}'", method.text),
            )),
        }
    }

    /// Checks shared by the methods that change the array, which also
    /// consume the opening `(`.
    fn begin_array_mutation(&mut self, info: &ExprInfo, method: &Token) -> Result<()> {
        if !info.is_assignable() {
            return Err(token_error(
                method,
                format!("Can't call '{}' on a const array", method.text),
            ));
        }
        self.note_assigned(info);
        self.require_symbol("(", &format!("call to '{}'", method.text))
    }

    fn finish_array_call(&mut self, method: &Token) -> Result<()> {
        self.require_symbol(")", &format!("call to '{}'", method.text))?;
        self.buffer.emit_token(ExprToken::EndFunctionParms);
        Ok(())
    }

    fn array_result(ty: PropertyBase, start: usize) -> ExprInfo {
        ExprInfo {
            side_effect: true,
            ..ExprInfo::rvalue(ty, start)
        }
    }
}
