//! UnrealScript Compiler
//!
//! A two-pass compiler from UnrealScript class source to bytecode stored on
//! the [`Registry`](unrealscript_registry::Registry).
//!
//! ## Architecture
//!
//! - **Pass 1 (Declarations)**: class header, variables, enums, structs,
//!   consts, function signatures and states become reflection objects. Bodies,
//!   state code and the replication block are skipped and their positions
//!   recorded in the [`MetadataStore`].
//! - **Pass 2 (Code)**: every recorded body is re-read and compiled to
//!   bytecode, one [`ScriptBuffer`](bytecode::ScriptBuffer) per body.
//!
//! Default properties are imported once every class has compiled, see
//! [`defaults`].
//!
//! ## Modules
//!
//! - [`bytecode`]: expression tokens, the relocatable script buffer and a disassembler
//! - [`conversion`]: implicit and explicit conversions with their costs
//! - [`defaults`]: `defaultproperties` import
//! - [`metadata`]: compiler-only side tables
//! - [`nest`]: nesting scopes and jump fixups
//! - [`session`]: state shared by a batch

pub mod bytecode;
mod body;
mod compiler;
pub mod conversion;
mod declare;
pub mod defaults;
mod expr;
mod expr_info;
pub mod metadata;
pub mod nest;
mod replication;
pub mod session;
mod stmt;

pub use compiler::{CompilePass, Result, ScriptCompiler};
pub use conversion::{Conversion, ConversionKind, conversion_cost, find_conversion, get_conversion};
pub use declare::{ClassHeader, parse_class_header};
pub use defaults::{DefaultsOutcome, import_default_properties, import_struct_defaults};
pub use metadata::MetadataStore;
pub use session::{
    CompilationSession, CompileOptions, Diagnostic, Diagnostics, NullResolver, ObjectResolver,
    ResolvedObject, TableResolver,
};

pub use unrealscript_core::CompileError;
