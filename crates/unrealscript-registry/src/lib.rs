//! UnrealScript Registry crate.
//!
//! The reflection graph shared by both compiler passes, the default-property
//! importer and the header generator: arenas of classes, structs, functions,
//! states, properties, enums and consts, with by-name lookup, inheritance
//! queries and memory layout.

pub mod entries;
pub mod layout;
pub mod registry;
pub mod values;

pub use entries::{
    ClassEntry, ConstEntry, EnumEntry, FunctionEntry, ImplementedInterface, PropertyEntry,
    StateEntry, StructEntry,
};
pub use layout::{align_up, LayoutEnd, MAP_SIZE};
pub use registry::{Registry, CLASS_CLASS_NAME, OBJECT_CLASS_NAME};
pub use values::{ObjectValues, PropertyValue};
