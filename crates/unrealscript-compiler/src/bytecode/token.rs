//! Expression tokens and primitive cast codes.
//!
//! Every bytecode instruction starts with one byte. Values below
//! [`ExprToken::ExtendedNative`] name an [`ExprToken`]; `0x60..=0x6F` prefix
//! a native index of 256 or more; `0x70` and above are native function
//! indices called directly.

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Bytecode expression tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum ExprToken {
    // =========================================================================
    // Variables
    // =========================================================================
    /// A local variable or parameter.
    LocalVariable = 0x00,
    /// A member variable of the context object.
    InstanceVariable = 0x01,
    /// A member variable of the class default object.
    DefaultVariable = 0x02,
    /// A state variable.
    StateVariable = 0x03,

    // =========================================================================
    // Control flow
    // =========================================================================
    Return = 0x04,
    Switch = 0x05,
    Jump = 0x06,
    JumpIfNot = 0x07,
    /// Halt state code.
    Stop = 0x08,
    Assert = 0x09,
    Case = 0x0A,
    /// Placeholder for an absent expression.
    Nothing = 0x0B,
    LabelTable = 0x0C,
    /// Latent goto to a state label.
    GotoLabel = 0x0D,
    /// Destroy an unused return value.
    EatReturnValue = 0x0E,

    // =========================================================================
    // Assignment and access
    // =========================================================================
    Let = 0x0F,
    DynArrayElement = 0x10,
    New = 0x11,
    ClassContext = 0x12,
    MetaCast = 0x13,
    LetBool = 0x14,
    /// Ends a default parameter value.
    EndParmValue = 0x15,
    EndFunctionParms = 0x16,
    /// The executing object.
    SelfRef = 0x17,
    /// Skippable operand, preceded by its length.
    Skip = 0x18,
    Context = 0x19,
    ArrayElement = 0x1A,

    // =========================================================================
    // Calls
    // =========================================================================
    VirtualFunction = 0x1B,
    FinalFunction = 0x1C,

    // =========================================================================
    // Constants
    // =========================================================================
    IntConst = 0x1D,
    FloatConst = 0x1E,
    StringConst = 0x1F,
    ObjectConst = 0x20,
    NameConst = 0x21,
    RotationConst = 0x22,
    VectorConst = 0x23,
    ByteConst = 0x24,
    IntZero = 0x25,
    IntOne = 0x26,
    True = 0x27,
    False = 0x28,
    NativeParm = 0x29,
    NoObject = 0x2A,
    IntConstByte = 0x2C,
    /// Prefix marking a bool variable access.
    BoolVariable = 0x2D,
    DynamicCast = 0x2E,

    // =========================================================================
    // Iteration and comparison
    // =========================================================================
    Iterator = 0x2F,
    IteratorPop = 0x30,
    IteratorNext = 0x31,
    StructCmpEq = 0x32,
    StructCmpNe = 0x33,
    UnicodeStringConst = 0x34,
    StructMember = 0x35,

    // =========================================================================
    // Dynamic arrays and delegates
    // =========================================================================
    DynArrayLength = 0x36,
    /// A function called without virtual lookup through states.
    GlobalFunction = 0x37,
    PrimitiveCast = 0x38,
    DynArrayInsert = 0x39,
    /// Return from a function without an explicit value.
    ReturnNothing = 0x3A,
    EqualEqualDelDel = 0x3B,
    NotEqualDelDel = 0x3C,
    EqualEqualDelFunc = 0x3D,
    NotEqualDelFunc = 0x3E,
    EmptyDelegate = 0x3F,
    DynArrayRemove = 0x40,
    DebugInfo = 0x41,
    DelegateFunction = 0x42,
    DelegateProperty = 0x43,
    LetDelegate = 0x44,
    /// `cond ? a : b`.
    Conditional = 0x45,
    DynArrayFind = 0x46,
    DynArrayFindStruct = 0x47,
    /// An `out` parameter.
    LocalOutVariable = 0x48,
    /// Default value of an optional parameter, skipped when supplied.
    DefaultParmValue = 0x49,
    /// An omitted optional argument.
    EmptyParmValue = 0x4A,
    InstanceDelegate = 0x4B,
    InterfaceContext = 0x51,
    InterfaceCast = 0x52,
    EndOfScript = 0x53,
    DynArrayAdd = 0x54,
    DynArrayAddItem = 0x55,
    DynArrayRemoveItem = 0x56,
    DynArrayInsertItem = 0x57,
    DynArrayIterator = 0x58,
    DynArraySort = 0x59,

    /// First of sixteen prefixes for native indices of 256 and above.
    ExtendedNative = 0x60,
    /// First native index callable with a single byte.
    FirstNative = 0x70,
}

impl ExprToken {
    /// Byte value.
    #[inline]
    pub fn byte(self) -> u8 {
        self.into()
    }
}

/// Primitive conversions carried by [`ExprToken::PrimitiveCast`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum CastToken {
    InterfaceToObject = 0x36,
    InterfaceToString = 0x37,
    InterfaceToBool = 0x38,
    RotatorToVector = 0x39,
    ByteToInt = 0x3A,
    ByteToBool = 0x3B,
    ByteToFloat = 0x3C,
    IntToByte = 0x3D,
    IntToBool = 0x3E,
    IntToFloat = 0x3F,
    BoolToByte = 0x40,
    BoolToInt = 0x41,
    BoolToFloat = 0x42,
    FloatToByte = 0x43,
    FloatToInt = 0x44,
    FloatToBool = 0x45,
    ObjectToInterface = 0x46,
    ObjectToBool = 0x47,
    NameToBool = 0x48,
    StringToByte = 0x49,
    StringToInt = 0x4A,
    StringToBool = 0x4B,
    StringToFloat = 0x4C,
    StringToVector = 0x4D,
    StringToRotator = 0x4E,
    VectorToBool = 0x4F,
    VectorToRotator = 0x50,
    RotatorToBool = 0x51,
    ByteToString = 0x52,
    IntToString = 0x53,
    BoolToString = 0x54,
    FloatToString = 0x55,
    ObjectToString = 0x56,
    NameToString = 0x57,
    VectorToString = 0x58,
    RotatorToString = 0x59,
    DelegateToString = 0x5A,
    StringToName = 0x60,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_bytes() {
        assert_eq!(ExprToken::Let.byte(), 0x0F);
        assert_eq!(ExprToken::EndOfScript.byte(), 0x53);
        assert_eq!(ExprToken::try_from(0x2C).unwrap(), ExprToken::IntConstByte);
        assert!(ExprToken::try_from(0x2B).is_err());
    }

    #[test]
    fn cast_bytes() {
        assert_eq!(u8::from(CastToken::IntToFloat), 0x3F);
        assert_eq!(CastToken::try_from(0x60).unwrap(), CastToken::StringToName);
    }
}
