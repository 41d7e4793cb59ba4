//! UnrealScript
//!
//! Batch compiler for UnrealScript packages: loads class sources, compiles
//! them to bytecode in dependency order, exports native C++ headers and
//! imports default properties.
//!
//! ## Crates
//!
//! - [`core`]: names, ids, flags, property types and errors
//! - [`parser`]: the tokenizer
//! - [`registry`]: the reflection graph compiled classes are stored in
//! - [`compiler`]: the two-pass class compiler
//! - [`headers`]: native header generation
//!
//! ## Modules
//!
//! - [`config`]: editor ini settings
//! - [`make`]: the build pipeline
//! - [`manifest`]: per-package source hashes for incremental builds
//! - [`options`]: command-line switches
//! - [`order`]: class compile order
//! - [`source`]: loading `.uc` files

pub mod config;
pub mod make;
pub mod manifest;
pub mod options;
pub mod order;
pub mod source;

pub use unrealscript_compiler as compiler;
pub use unrealscript_core as core;
pub use unrealscript_headers as headers;
pub use unrealscript_parser as parser;
pub use unrealscript_registry as registry;

pub use config::EditorConfig;
pub use make::{ClassFailure, MakeReport, ScriptBuild, make_scripts};
pub use manifest::BuildManifest;
pub use options::BuildOptions;
pub use source::{SourceClass, SourcePackage, load_package};
pub use unrealscript_core::{BuildError, UnrealScriptError};
