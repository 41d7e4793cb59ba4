//! Bytecode emission and decoding.
//!
//! - [`token`]: expression tokens and primitive cast codes
//! - [`buffer`]: the script buffer with relocatable code sites
//! - [`disasm`]: a decoder used by tests and the `ucc` dump command

pub mod buffer;
pub mod disasm;
pub mod token;

pub use buffer::{BufferCheckpoint, CodeSite, ScriptBuffer, SiteId, SiteKind};
pub use disasm::{DisasmError, Instruction, Opcode, Operand, disassemble, listing, opcodes};
pub use token::{CastToken, ExprToken};
