//! Function and delegate calls.
//!
//! A call is a header naming the function, one operand per parameter and
//! `EndFunctionParms`. Native functions with an index are called through
//! their index; others by name (virtual) or by reference (final).

use unrealscript_core::{
    FunctionFlags, FunctionId, ObjectRef, PropertyBase, PropertyFlags, PropertyId, PropertyType,
};
use unrealscript_registry::FunctionEntry;

use crate::bytecode::ExprToken;
use crate::compiler::{Result, ScriptCompiler, parameter_type, value_type};
use crate::conversion::same_type;
use crate::expr_info::ExprInfo;
use crate::nest::AllowFlags;

/// How a call finds the function it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CallKind {
    /// By name, through the object's class and state.
    Virtual,
    /// By reference, bound at compile time.
    Final,
    /// By name, ignoring states.
    Global,
    /// Through the delegate stored in `property`.
    Delegate { property: PropertyId, local: bool },
}

/// Header bytes of a call through a native index.
pub(crate) fn native_call_bytes(index: u16) -> Vec<u8> {
    let first = u16::from(ExprToken::FirstNative.byte());
    if (first..256).contains(&index) {
        vec![index as u8]
    } else {
        vec![
            ExprToken::ExtendedNative.byte() | (index >> 8) as u8,
            (index & 0xFF) as u8,
        ]
    }
}

impl<'a> ScriptCompiler<'a> {
    /// Header bytes for calling `function`.
    pub(crate) fn call_header(&mut self, function: FunctionId, kind: CallKind) -> Vec<u8> {
        let entry = self.registry.function(function);
        let native_index = entry.native_index;
        let flags = entry.flags;
        let name = entry.name.clone();

        let mut bytes = Vec::with_capacity(10);
        match kind {
            CallKind::Delegate { property, local } => {
                bytes.push(ExprToken::DelegateFunction.byte());
                bytes.push(u8::from(local));
                bytes.extend_from_slice(&ObjectRef::from(property).raw().to_le_bytes());
                bytes.extend_from_slice(&self.name_index(&name).to_le_bytes());
            }
            _ if native_index > 0 => bytes = native_call_bytes(native_index),
            CallKind::Global => {
                bytes.push(ExprToken::GlobalFunction.byte());
                bytes.extend_from_slice(&self.name_index(&name).to_le_bytes());
            }
            CallKind::Virtual if !flags.intersects(FunctionFlags::FINAL | FunctionFlags::PRIVATE) => {
                bytes.push(ExprToken::VirtualFunction.byte());
                bytes.extend_from_slice(&self.name_index(&name).to_le_bytes());
            }
            CallKind::Virtual | CallKind::Final => {
                bytes.push(ExprToken::FinalFunction.byte());
                bytes.extend_from_slice(&ObjectRef::from(function).raw().to_le_bytes());
            }
        }
        bytes
    }

    /// Compile a call after its `(`. `start` is where the call's code
    /// begins.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub(crate) fn compile_function_call(
        &mut self,
        function: FunctionId,
        kind: CallKind,
        start: usize,
    ) -> Result<ExprInfo> {
        let entry = self.registry.function(function).clone();
        if entry.flags.contains(FunctionFlags::LATENT) && !self.allows(AllowFlags::STATE_CODE) {
            return Err(self.type_error(format!(
                "Latent function '{}' can only be called from state code",
                entry.name
            )));
        }
        if entry.flags.contains(FunctionFlags::ITERATOR) && !self.allow_iterator {
            return Err(self.type_error(format!(
                "Iterator function '{}' can only be called in a 'foreach'",
                entry.name
            )));
        }
        self.check_function_access(entry.name.as_str(), function)?;
        // Only the head of the foreach may call the iterator.
        self.allow_iterator = false;

        let header = self.call_header(function, kind);
        self.buffer.emit_bytes(&header);
        self.compile_arguments(&entry)?;
        self.buffer.emit_token(ExprToken::EndFunctionParms);
        self.session.referenced.insert(function);

        let ret = entry
            .return_param
            .map(|r| value_type(&self.registry.property(r).base()))
            .unwrap_or_else(PropertyBase::none);
        Ok(ExprInfo::call(ret, start, function))
    }

    /// The argument list up to and including `)`. Omitted optional
    /// arguments become `EmptyParmValue`.
    fn compile_arguments(&mut self, entry: &FunctionEntry) -> Result<()> {
        let context = format!("call to '{}'", entry.name);
        let mut closed = self.match_symbol(")")?;
        for (i, param) in entry.params.iter().enumerate() {
            if !closed && i > 0 {
                if self.match_symbol(")")? {
                    closed = true;
                } else if !self.match_symbol(",")? {
                    return Err(self.type_error(format!("Missing ',' or ')' in {}", context)));
                }
            }
            let base = self.registry.property(*param).base();
            let param_name = self.registry.property(*param).name.clone();
            let omitted = closed || self.peek_symbol(",")? || self.peek_symbol(")")?;
            if omitted {
                if !base.flags.contains(PropertyFlags::OPTIONAL_PARM) {
                    return Err(self.type_error(format!(
                        "Call to '{}': missing parameter '{}'",
                        entry.name, param_name
                    )));
                }
                self.buffer.emit_token(ExprToken::EmptyParmValue);
                continue;
            }

            let what = format!("parameter '{}' of {}", param_name, context);
            if base.is_out() {
                self.compile_out_argument(entry, &base, &what)?;
            } else {
                let dest = value_type(&base);
                let info = self.require_value(Some(&dest), &what)?;
                let coerce = base.flags.contains(PropertyFlags::COERCE_PARM);
                self.coerce(info, &dest, coerce, &what)?;
            }
        }
        if !closed {
            if self.peek_symbol(",")? {
                return Err(self.type_error(format!("Too many parameters in {}", context)));
            }
            self.require_symbol(")", &context)?;
        }
        Ok(())
    }

    /// An `out` argument must be a writable variable of the parameter's
    /// exact type. Iterators also accept a variable of a subclass.
    fn compile_out_argument(
        &mut self,
        entry: &FunctionEntry,
        base: &PropertyBase,
        what: &str,
    ) -> Result<()> {
        let dest = parameter_type(base);
        let info = self.require_value(Some(&value_type(base)), what)?;
        if !info.is_assignable() {
            return Err(self.type_error(format!("{} is 'out' and needs a writable variable", capitalize(what))));
        }
        let exact = same_type(&value_type(&dest), &info.ty);
        let iterator_subclass = entry.flags.contains(FunctionFlags::ITERATOR)
            && match (&dest.ty, &info.ty.ty) {
                (
                    PropertyType::Object {
                        class: Some(parent),
                        meta: None,
                    },
                    PropertyType::Object {
                        class: Some(child),
                        meta: None,
                    },
                ) => self.registry.is_child_of(*child, *parent),
                _ => false,
            };
        if !exact && !iterator_subclass {
            return Err(self.type_error(format!(
                "Type mismatch in {}: '{}' vs '{}'",
                what,
                self.describe_type(&info.ty),
                self.describe_type(&value_type(&dest))
            )));
        }
        self.note_assigned(&info);
        Ok(())
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_indices_encode_in_one_or_two_bytes() {
        assert_eq!(native_call_bytes(0x70), vec![0x70]);
        assert_eq!(native_call_bytes(255), vec![0xFF]);
        assert_eq!(native_call_bytes(256), vec![0x61, 0x00]);
        assert_eq!(native_call_bytes(0x3A5), vec![0x63, 0xA5]);
        assert_eq!(native_call_bytes(0x20), vec![0x60, 0x20]);
    }

    #[test]
    fn messages_start_upper_case() {
        assert_eq!(capitalize("parameter 'A'"), "Parameter 'A'");
        assert_eq!(capitalize(""), "");
    }
}
