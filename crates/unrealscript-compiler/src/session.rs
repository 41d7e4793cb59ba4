//! Compilation session.
//!
//! One [`CompilationSession`] lives for a whole batch: it owns the name table
//! that name constants index into, the compiler-only metadata for every class
//! compiled so far, the C++ name cache, the warning sink and the native index
//! registry. Every compiler component borrows it.

use rustc_hash::{FxHashMap, FxHashSet};
use unrealscript_core::{ClassFlags, ClassId, FunctionId, NameTable, ObjectRef, Severity};
use unrealscript_registry::Registry;

use crate::metadata::MetadataStore;

/// Switches that change what the compiler emits or reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompileOptions {
    /// Emit `DebugInfo` before each statement.
    pub debug_info: bool,
    /// Report functions that are never referenced.
    pub list_unreferenced: bool,
    /// Skip the native size conformance check.
    pub no_conform: bool,
}

/// A non-fatal message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub file: String,
    pub line: u32,
    pub message: String,
}

impl Diagnostic {
    /// Render as a `File(Line) : Warning, message` log line.
    pub fn log_line(&self) -> String {
        let label = match self.severity {
            Severity::Info => "Info",
            Severity::Warning => "Warning",
            Severity::Error => "Error",
        };
        format!("{}({}) : {}, {}", self.file, self.line, label, self.message)
    }
}

/// Collected warnings and notes.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn warn(&mut self, file: &str, line: u32, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("{}({}) : Warning, {}", file, line, message);
        self.entries.push(Diagnostic {
            severity: Severity::Warning,
            file: file.to_string(),
            line,
            message,
        });
    }

    pub fn info(&mut self, file: &str, line: u32, message: impl Into<String>) {
        let message = message.into();
        tracing::info!("{}({}) : {}", file, line, message);
        self.entries.push(Diagnostic {
            severity: Severity::Info,
            file: file.to_string(),
            line,
            message,
        });
    }

    pub fn error(&mut self, file: &str, line: u32, message: impl Into<String>) {
        let message = message.into();
        tracing::error!("{}({}) : Error, {}", file, line, message);
        self.entries.push(Diagnostic {
            severity: Severity::Error,
            file: file.to_string(),
            line,
            message,
        });
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    /// Entries of one severity.
    pub fn with_severity(&self, severity: Severity) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(move |d| d.severity == severity)
    }

    pub fn warning_count(&self) -> usize {
        self.with_severity(Severity::Warning).count()
    }

    pub fn error_count(&self) -> usize {
        self.with_severity(Severity::Error).count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// What an object literal path resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedObject {
    Object(ObjectRef),
    /// The path names a redirector to another object.
    Redirector(String),
}

/// Resolves `Type'Package.Object'` literals that do not name classes.
pub trait ObjectResolver {
    fn resolve(&mut self, class: &str, path: &str) -> Option<ResolvedObject>;
}

/// A resolver that knows no objects.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullResolver;

impl ObjectResolver for NullResolver {
    fn resolve(&mut self, _class: &str, _path: &str) -> Option<ResolvedObject> {
        None
    }
}

/// A resolver backed by a fixed table, keyed by lowercase path.
#[derive(Debug, Clone, Default)]
pub struct TableResolver {
    objects: FxHashMap<String, ResolvedObject>,
}

impl TableResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: &str, object: ResolvedObject) {
        self.objects.insert(path.to_ascii_lowercase(), object);
    }
}

impl ObjectResolver for TableResolver {
    fn resolve(&mut self, _class: &str, path: &str) -> Option<ResolvedObject> {
        self.objects.get(&path.to_ascii_lowercase()).cloned()
    }
}

/// C++ names of script classes, computed once.
#[derive(Debug, Clone, Default)]
pub struct CppNameCache {
    names: FxHashMap<ClassId, String>,
}

impl CppNameCache {
    /// `AActor` for actor classes, `UObject` otherwise. Interfaces keep the
    /// `U` prefix; see [`interface_name`](Self::interface_name).
    pub fn name_of(&mut self, registry: &Registry, class: ClassId) -> String {
        if let Some(name) = self.names.get(&class) {
            return name.clone();
        }
        let entry = registry.class(class);
        let prefix = if entry.flags.contains(ClassFlags::INTERFACE) {
            "U"
        } else if registry
            .class_chain(class)
            .any(|c| registry.class(c).name.matches("Actor"))
        {
            "A"
        } else {
            "U"
        };
        let name = format!("{}{}", prefix, entry.name);
        self.names.insert(class, name.clone());
        name
    }

    /// The `I`-prefixed native interface name of an interface class.
    pub fn interface_name(&self, registry: &Registry, class: ClassId) -> String {
        format!("I{}", registry.class(class).name)
    }

    pub fn clear(&mut self) {
        self.names.clear();
    }
}

/// State shared by every class compiled in one batch.
pub struct CompilationSession {
    pub names: NameTable,
    pub metadata: MetadataStore,
    pub cpp_names: CppNameCache,
    pub options: CompileOptions,
    pub diagnostics: Diagnostics,
    /// Functions by native index, for duplicate detection.
    pub native_indices: FxHashMap<u16, FunctionId>,
    /// Functions referenced from compiled code.
    pub referenced: FxHashSet<FunctionId>,
    pub resolver: Box<dyn ObjectResolver>,
}

impl CompilationSession {
    pub fn new(options: CompileOptions) -> Self {
        Self {
            names: NameTable::new(),
            metadata: MetadataStore::new(),
            cpp_names: CppNameCache::default(),
            options,
            diagnostics: Diagnostics::default(),
            native_indices: FxHashMap::default(),
            referenced: FxHashSet::default(),
            resolver: Box::new(NullResolver),
        }
    }

    /// Use `resolver` for object literals.
    pub fn with_resolver(mut self, resolver: Box<dyn ObjectResolver>) -> Self {
        self.resolver = resolver;
        self
    }
}

impl Default for CompilationSession {
    fn default() -> Self {
        Self::new(CompileOptions::default())
    }
}

impl std::fmt::Debug for CompilationSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompilationSession")
            .field("names", &self.names.len())
            .field("options", &self.options)
            .field("diagnostics", &self.diagnostics.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use unrealscript_core::Name;

    #[test]
    fn cpp_prefixes() {
        let mut registry = Registry::new();
        let object = registry.add_class(Name::new("Object"), Name::new("Core")).unwrap();
        let actor = registry.add_class(Name::new("Actor"), Name::new("Engine")).unwrap();
        let pawn = registry.add_class(Name::new("Pawn"), Name::new("Engine")).unwrap();
        registry.class_mut(actor).super_class = Some(object);
        registry.class_mut(pawn).super_class = Some(actor);
        let mut cache = CppNameCache::default();
        assert_eq!(cache.name_of(&registry, object), "UObject");
        assert_eq!(cache.name_of(&registry, pawn), "APawn");
        assert_eq!(cache.interface_name(&registry, pawn), "IPawn");
    }

    #[test]
    fn warnings_are_collected() {
        let mut session = CompilationSession::default();
        session.diagnostics.warn("Foo.uc", 12, "Unused local 'X'");
        assert_eq!(session.diagnostics.warning_count(), 1);
        let entry = session.diagnostics.iter().next().unwrap();
        assert_eq!(entry.log_line(), "Foo.uc(12) : Warning, Unused local 'X'");
    }

    #[test]
    fn table_resolver_ignores_case() {
        let mut resolver = TableResolver::new();
        resolver.insert("Pkg.Thing", ResolvedObject::Redirector("Pkg.Other".into()));
        assert_eq!(
            resolver.resolve("Texture2D", "pkg.thing"),
            Some(ResolvedObject::Redirector("Pkg.Other".into()))
        );
    }
}
