//! Bytecode decoder.
//!
//! Walks a script in pre-order and yields one [`Instruction`] per token with
//! its inline operands. Used by tests to assert on emitted code and by the
//! `ucc` driver to dump functions.

use std::fmt;

use thiserror::Error;
use unrealscript_core::ObjectRef;

use super::token::{CastToken, ExprToken};

/// Decoding failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DisasmError {
    #[error("unexpected end of script at offset {offset}")]
    UnexpectedEnd { offset: usize },
    #[error("unknown token 0x{byte:02X} at offset {offset}")]
    UnknownToken { offset: usize, byte: u8 },
    #[error("unknown cast 0x{byte:02X} at offset {offset}")]
    UnknownCast { offset: usize, byte: u8 },
}

/// What an instruction does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    Token(ExprToken),
    /// Direct call of a native function by index.
    Native(u16),
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Opcode::Token(token) => write!(f, "{:?}", token),
            Opcode::Native(index) => write!(f, "Native({})", index),
        }
    }
}

/// An inline operand.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    U8(u8),
    U16(u16),
    I32(i32),
    F32(f32),
    /// Name table index.
    Name(u32),
    Object(ObjectRef),
    Str(String),
    Cast(CastToken),
}

/// One decoded token.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    pub offset: usize,
    pub opcode: Opcode,
    pub operands: Vec<Operand>,
    /// Nesting depth below the statement that contains it.
    pub depth: usize,
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04X}: {}{}", self.offset, "  ".repeat(self.depth), self.opcode)?;
        for operand in &self.operands {
            match operand {
                Operand::U8(v) => write!(f, " {}", v)?,
                Operand::U16(v) => write!(f, " 0x{:04X}", v)?,
                Operand::I32(v) => write!(f, " {}", v)?,
                Operand::F32(v) => write!(f, " {}", v)?,
                Operand::Name(v) => write!(f, " name#{}", v)?,
                Operand::Object(r) => write!(f, " {}", r)?,
                Operand::Str(s) => write!(f, " {:?}", s)?,
                Operand::Cast(c) => write!(f, " {:?}", c)?,
            }
        }
        Ok(())
    }
}

/// Decode a whole script.
pub fn disassemble(code: &[u8]) -> Result<Vec<Instruction>, DisasmError> {
    let mut decoder = Decoder {
        code,
        pos: 0,
        depth: 0,
        out: Vec::new(),
    };
    while decoder.pos < code.len() {
        decoder.expr()?;
    }
    Ok(decoder.out)
}

/// Decode a script and keep only the opcodes.
pub fn opcodes(code: &[u8]) -> Result<Vec<Opcode>, DisasmError> {
    Ok(disassemble(code)?.into_iter().map(|i| i.opcode).collect())
}

/// Render a script as one instruction per line.
pub fn listing(code: &[u8]) -> Result<String, DisasmError> {
    let mut out = String::new();
    for instruction in disassemble(code)? {
        out.push_str(&instruction.to_string());
        out.push('\n');
    }
    Ok(out)
}

struct Decoder<'a> {
    code: &'a [u8],
    pos: usize,
    depth: usize,
    out: Vec<Instruction>,
}

impl Decoder<'_> {
    fn byte(&mut self) -> Result<u8, DisasmError> {
        let b = *self.code.get(self.pos).ok_or(DisasmError::UnexpectedEnd { offset: self.pos })?;
        self.pos += 1;
        Ok(b)
    }

    fn bytes<const N: usize>(&mut self) -> Result<[u8; N], DisasmError> {
        let end = self.pos + N;
        let slice = self
            .code
            .get(self.pos..end)
            .ok_or(DisasmError::UnexpectedEnd { offset: self.pos })?;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        self.pos = end;
        Ok(out)
    }

    fn u16(&mut self) -> Result<u16, DisasmError> {
        Ok(u16::from_le_bytes(self.bytes()?))
    }

    fn u32(&mut self) -> Result<u32, DisasmError> {
        Ok(u32::from_le_bytes(self.bytes()?))
    }

    fn push(&mut self, offset: usize, opcode: Opcode) -> usize {
        self.out.push(Instruction {
            offset,
            opcode,
            operands: Vec::new(),
            depth: self.depth,
        });
        self.out.len() - 1
    }

    fn operand(&mut self, index: usize, operand: Operand) {
        self.out[index].operands.push(operand);
    }

    fn child(&mut self) -> Result<Opcode, DisasmError> {
        self.depth += 1;
        let result = self.expr();
        self.depth -= 1;
        result
    }

    /// Decode children until `terminator` has been decoded.
    fn children_until(&mut self, terminator: ExprToken) -> Result<(), DisasmError> {
        loop {
            if self.child()? == Opcode::Token(terminator) {
                return Ok(());
            }
        }
    }

    fn expr(&mut self) -> Result<Opcode, DisasmError> {
        let offset = self.pos;
        let b = self.byte()?;

        if b >= ExprToken::FirstNative.byte() {
            self.push(offset, Opcode::Native(b as u16));
            self.children_until(ExprToken::EndFunctionParms)?;
            return Ok(Opcode::Native(b as u16));
        }
        if b >= ExprToken::ExtendedNative.byte() {
            let native = (((b & 0x0F) as u16) << 8) | self.byte()? as u16;
            self.push(offset, Opcode::Native(native));
            self.children_until(ExprToken::EndFunctionParms)?;
            return Ok(Opcode::Native(native));
        }

        let token = ExprToken::try_from(b).map_err(|_| DisasmError::UnknownToken { offset, byte: b })?;
        let at = self.push(offset, Opcode::Token(token));
        use ExprToken as T;
        match token {
            T::LocalVariable
            | T::InstanceVariable
            | T::DefaultVariable
            | T::StateVariable
            | T::LocalOutVariable
            | T::ReturnNothing
            | T::NativeParm
            | T::ObjectConst => {
                let r = ObjectRef::from_raw(self.u32()?);
                self.operand(at, Operand::Object(r));
            }
            T::Return | T::GotoLabel | T::BoolVariable | T::DynArrayLength | T::InterfaceContext => {
                self.child()?;
            }
            T::Switch => {
                let r = ObjectRef::from_raw(self.u32()?);
                self.operand(at, Operand::Object(r));
                let size = self.byte()?;
                self.operand(at, Operand::U8(size));
                self.child()?;
            }
            T::Jump => {
                let target = self.u16()?;
                self.operand(at, Operand::U16(target));
            }
            T::JumpIfNot => {
                let target = self.u16()?;
                self.operand(at, Operand::U16(target));
                self.child()?;
            }
            T::Assert => {
                let line = self.u16()?;
                self.operand(at, Operand::U16(line));
                let debug = self.byte()?;
                self.operand(at, Operand::U8(debug));
                self.child()?;
            }
            T::Case => {
                let next = self.u16()?;
                self.operand(at, Operand::U16(next));
                if next != u16::MAX {
                    self.child()?;
                }
            }
            T::LabelTable => loop {
                let name = self.u32()?;
                let target = self.u32()?;
                self.operand(at, Operand::Name(name));
                self.operand(at, Operand::I32(target as i32));
                if name == 0 {
                    break;
                }
            },
            T::EatReturnValue => {
                let r = ObjectRef::from_raw(self.u32()?);
                self.operand(at, Operand::Object(r));
                self.child()?;
            }
            T::Let
            | T::LetBool
            | T::LetDelegate
            | T::DynArrayElement
            | T::ArrayElement => {
                self.child()?;
                self.child()?;
            }
            T::New => {
                for _ in 0..5 {
                    self.child()?;
                }
            }
            T::ClassContext | T::Context => {
                self.child()?;
                let skip = self.u16()?;
                self.operand(at, Operand::U16(skip));
                let r = ObjectRef::from_raw(self.u32()?);
                self.operand(at, Operand::Object(r));
                let size = self.byte()?;
                self.operand(at, Operand::U8(size));
                self.child()?;
            }
            T::MetaCast | T::DynamicCast | T::InterfaceCast => {
                let r = ObjectRef::from_raw(self.u32()?);
                self.operand(at, Operand::Object(r));
                self.child()?;
            }
            T::Skip => {
                let skip = self.u16()?;
                self.operand(at, Operand::U16(skip));
                self.child()?;
            }
            T::VirtualFunction | T::GlobalFunction => {
                let name = self.u32()?;
                self.operand(at, Operand::Name(name));
                self.children_until(T::EndFunctionParms)?;
            }
            T::FinalFunction => {
                let r = ObjectRef::from_raw(self.u32()?);
                self.operand(at, Operand::Object(r));
                self.children_until(T::EndFunctionParms)?;
            }
            T::IntConst => {
                let v = self.u32()? as i32;
                self.operand(at, Operand::I32(v));
            }
            T::FloatConst => {
                let v = f32::from_le_bytes(self.bytes()?);
                self.operand(at, Operand::F32(v));
            }
            T::StringConst => {
                let mut s = String::new();
                loop {
                    match self.byte()? {
                        0 => break,
                        c => s.push(c as char),
                    }
                }
                self.operand(at, Operand::Str(s));
            }
            T::UnicodeStringConst => {
                let mut units = Vec::new();
                loop {
                    match self.u16()? {
                        0 => break,
                        u => units.push(u),
                    }
                }
                self.operand(at, Operand::Str(String::from_utf16_lossy(&units)));
            }
            T::NameConst | T::InstanceDelegate => {
                let name = self.u32()?;
                self.operand(at, Operand::Name(name));
            }
            T::RotationConst => {
                for _ in 0..3 {
                    let v = self.u32()? as i32;
                    self.operand(at, Operand::I32(v));
                }
            }
            T::VectorConst => {
                for _ in 0..3 {
                    let v = f32::from_le_bytes(self.bytes()?);
                    self.operand(at, Operand::F32(v));
                }
            }
            T::ByteConst | T::IntConstByte => {
                let v = self.byte()?;
                self.operand(at, Operand::U8(v));
            }
            T::Iterator => {
                self.child()?;
                let end = self.u16()?;
                self.operand(at, Operand::U16(end));
            }
            T::StructCmpEq | T::StructCmpNe => {
                let r = ObjectRef::from_raw(self.u32()?);
                self.operand(at, Operand::Object(r));
                self.child()?;
                self.child()?;
            }
            T::StructMember => {
                let member = ObjectRef::from_raw(self.u32()?);
                self.operand(at, Operand::Object(member));
                let owner = ObjectRef::from_raw(self.u32()?);
                self.operand(at, Operand::Object(owner));
                let modified = self.byte()?;
                self.operand(at, Operand::U8(modified));
                self.child()?;
            }
            T::PrimitiveCast => {
                let b = self.byte()?;
                let cast = CastToken::try_from(b).map_err(|_| DisasmError::UnknownCast {
                    offset: self.pos - 1,
                    byte: b,
                })?;
                self.operand(at, Operand::Cast(cast));
                self.child()?;
            }
            T::DynArrayInsert | T::DynArrayRemove | T::DynArrayAdd => {
                self.child()?;
                self.children_until(T::EndFunctionParms)?;
            }
            T::DynArrayAddItem
            | T::DynArrayRemoveItem
            | T::DynArrayFind
            | T::DynArrayInsertItem
            | T::DynArraySort => {
                self.child()?;
                let skip = self.u16()?;
                self.operand(at, Operand::U16(skip));
                self.children_until(T::EndFunctionParms)?;
            }
            T::DynArrayFindStruct => {
                self.child()?;
                let member = ObjectRef::from_raw(self.u32()?);
                self.operand(at, Operand::Object(member));
                let skip = self.u16()?;
                self.operand(at, Operand::U16(skip));
                self.children_until(T::EndFunctionParms)?;
            }
            T::DynArrayIterator => {
                self.child()?;
                self.child()?;
                let has_index = self.byte()?;
                self.operand(at, Operand::U8(has_index));
                if has_index != 0 {
                    self.child()?;
                }
                let end = self.u16()?;
                self.operand(at, Operand::U16(end));
            }
            T::EqualEqualDelDel | T::NotEqualDelDel | T::EqualEqualDelFunc | T::NotEqualDelFunc => {
                self.children_until(T::EndFunctionParms)?;
            }
            T::DebugInfo => {
                for _ in 0..3 {
                    let v = self.u32()? as i32;
                    self.operand(at, Operand::I32(v));
                }
                let op = self.byte()?;
                self.operand(at, Operand::U8(op));
            }
            T::DelegateFunction => {
                let local = self.byte()?;
                self.operand(at, Operand::U8(local));
                let r = ObjectRef::from_raw(self.u32()?);
                self.operand(at, Operand::Object(r));
                let name = self.u32()?;
                self.operand(at, Operand::Name(name));
                self.children_until(T::EndFunctionParms)?;
            }
            T::DelegateProperty => {
                let name = self.u32()?;
                self.operand(at, Operand::Name(name));
                let r = ObjectRef::from_raw(self.u32()?);
                self.operand(at, Operand::Object(r));
            }
            T::Conditional => {
                self.child()?;
                let skip = self.u16()?;
                self.operand(at, Operand::U16(skip));
                self.child()?;
                let skip = self.u16()?;
                self.operand(at, Operand::U16(skip));
                self.child()?;
            }
            T::DefaultParmValue => {
                let skip = self.u16()?;
                self.operand(at, Operand::U16(skip));
                self.children_until(T::EndParmValue)?;
            }
            T::Stop
            | T::Nothing
            | T::EndParmValue
            | T::EndFunctionParms
            | T::SelfRef
            | T::IntZero
            | T::IntOne
            | T::True
            | T::False
            | T::NoObject
            | T::IteratorPop
            | T::IteratorNext
            | T::EmptyParmValue
            | T::EmptyDelegate
            | T::EndOfScript
            | T::ExtendedNative
            | T::FirstNative => {}
        }
        Ok(Opcode::Token(token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_native_call_tree() {
        // Let(InstanceVariable, Native(146)(IntOne, IntZero))
        let mut code = vec![ExprToken::Let.byte(), ExprToken::InstanceVariable.byte()];
        code.extend_from_slice(&ObjectRef::new(unrealscript_core::ObjectRefKind::Property, 3).raw().to_le_bytes());
        code.extend_from_slice(&[146, ExprToken::IntOne.byte(), ExprToken::IntZero.byte()]);
        code.push(ExprToken::EndFunctionParms.byte());
        let ops = opcodes(&code).unwrap();
        assert_eq!(
            ops,
            vec![
                Opcode::Token(ExprToken::Let),
                Opcode::Token(ExprToken::InstanceVariable),
                Opcode::Native(146),
                Opcode::Token(ExprToken::IntOne),
                Opcode::Token(ExprToken::IntZero),
                Opcode::Token(ExprToken::EndFunctionParms),
            ]
        );
    }

    #[test]
    fn decodes_extended_native() {
        let code = [0x61, 0x2C, ExprToken::EndFunctionParms.byte()];
        let ops = opcodes(&code).unwrap();
        assert_eq!(ops[0], Opcode::Native(0x12C));
    }

    #[test]
    fn reports_truncated_operand() {
        let code = [ExprToken::IntConst.byte(), 1, 2];
        assert_eq!(
            disassemble(&code).unwrap_err(),
            DisasmError::UnexpectedEnd { offset: 1 }
        );
    }

    #[test]
    fn listing_shows_depth() {
        let code = [
            ExprToken::Return.byte(),
            ExprToken::IntConstByte.byte(),
            7,
            ExprToken::EndOfScript.byte(),
        ];
        let text = listing(&code).unwrap();
        assert!(text.contains("0000: Return"));
        assert!(text.contains("0001:   IntConstByte 7"));
    }
}
