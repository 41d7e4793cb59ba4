//! UnrealScript Native Headers
//!
//! Generates the C++ class headers (`<Package><Group>Classes.h`) that
//! native code compiles against, and decides which classes' native layout
//! may no longer match script.
//!
//! ## Architecture
//!
//! The [`NativeHeaderGenerator`] renders one header group from the
//! [`Registry`](unrealscript_registry::Registry) after both compiler passes.
//! The previous header on disk is compared class by class: a class whose
//! base class or member block differs is reported as changed and marked
//! misaligned by [`export_package_headers`].
//!
//! ## Modules
//!
//! - [`cpp`]: C++ type spellings and `P_GET` macros
//! - [`diff`]: comparison against the previous header
//! - [`export`]: writing headers and updating class flags
//! - [`generator`]: header text

pub mod cpp;
pub mod diff;
pub mod export;
pub mod generator;

pub use diff::{has_parent_class_changed, have_properties_changed};
pub use export::{
    AutoAccept, AutoDecline, ExportOptions, ExportReport, Prompter, apply_misalignment,
    export_package_headers, header_groups,
};
pub use generator::{GeneratedHeader, NativeHeaderGenerator, exports_header, header_file_name};
