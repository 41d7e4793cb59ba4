//! Fixed compiler limits.

/// Longest identifier the tokenizer accepts.
pub const MAX_IDENTIFIER_LENGTH: usize = 64;

/// Longest string literal the tokenizer accepts.
pub const MAX_STRING_CONST_LENGTH: usize = 1024;

/// Longest name literal the tokenizer accepts.
pub const MAX_NAME_LENGTH: usize = MAX_IDENTIFIER_LENGTH;

/// Largest fixed array dimension.
pub const MAX_ARRAY_DIM: u32 = 2048;

/// Most tags an enumeration may declare, including the `_MAX` sentinel.
pub const MAX_ENUM_ENTRIES: usize = 255;

/// Return values larger than this many bytes are destructed explicitly when
/// an affector's result is discarded.
pub const MAX_INLINE_RETURN_SIZE: u32 = 64;

/// Largest native function index.
pub const MAX_NATIVE_INDEX: u32 = 4095;

/// First native index that needs the extended encoding.
pub const EXTENDED_NATIVE_BASE: u32 = 256;

/// Largest bytecode length; code offsets are 16 bits.
pub const MAX_SCRIPT_SIZE: usize = u16::MAX as usize;

/// Deepest nesting of scopes.
pub const MAX_NEST: usize = 16;

/// Lowest (tightest binding) operator precedence.
pub const MIN_OPERATOR_PRECEDENCE: u8 = 0;

/// Highest accepted operator precedence.
pub const MAX_OPERATOR_PRECEDENCE: u8 = 255;
