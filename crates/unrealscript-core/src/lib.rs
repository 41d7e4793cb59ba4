//! UnrealScript Core crate.
//!
//! Types shared by every stage of the UnrealScript toolchain:
//!
//! - [`Span`] source positions
//! - [`Name`] and [`NameTable`] for case-insensitive interned identifiers
//! - typed ids for reflection objects plus the [`ObjectRef`] bytecode encoding
//! - flag sets for properties, classes, functions, structs and states
//! - [`PropertyType`] / [`PropertyBase`], the type currency of the compiler
//! - the unified error hierarchy

pub mod error;
pub mod flags;
pub mod ids;
pub mod limits;
pub mod name;
pub mod property;
pub mod span;

pub use error::{
    BuildError, CompileError, CompileErrorKind, LexError, RegistrationError, Severity,
    UnrealScriptError,
};
pub use flags::{
    ClassFlags, FunctionFlags, PlatformFlags, PropertyFlags, StateFlags, StructFlags,
};
pub use ids::{
    ClassId, ConstId, EnumId, FieldOwner, FunctionId, ObjectRef, ObjectRefKind, PropertyId,
    StateId, StructId,
};
pub use name::{Name, NameTable};
pub use property::{ConstValue, PropertyBase, PropertyKind, PropertyType};
pub use span::Span;
