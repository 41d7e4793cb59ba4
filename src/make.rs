//! The batch build.
//!
//! [`make_scripts`] runs the whole pipeline for the packages an
//! [`EditorConfig`] lists:
//!
//! 1. load `<Package>/Classes/*.uc` for every package
//! 2. order the classes by their declared dependencies
//! 3. run the declarations pass over every class, then the code pass
//! 4. export native headers for packages that changed
//! 5. import default properties until no class is left waiting
//!
//! A class that fails is reset and logged; the batch carries on with the
//! classes that do not depend on it, unless bootstrapping.

use std::path::Path;

use rustc_hash::FxHashSet;
use unrealscript_compiler::{
    ClassHeader, CompilationSession, CompilePass, DefaultsOutcome, ObjectResolver, ScriptCompiler,
    import_default_properties, import_struct_defaults, parse_class_header,
};
use unrealscript_core::{BuildError, ClassId, FieldOwner, FunctionFlags, Name};
use unrealscript_headers::{ExportOptions, ExportReport, Prompter, export_package_headers};
use unrealscript_registry::Registry;

use crate::config::EditorConfig;
use crate::manifest::{BuildManifest, MANIFEST_FILE, package_hash};
use crate::options::BuildOptions;
use crate::order::build_order;
use crate::source::{SourceClass, SourcePackage, load_package};

/// `info!` normally, `debug!` under `SILENTBUILD`.
macro_rules! chatter {
    ($silent:expr, $($arg:tt)+) => {
        if $silent {
            tracing::debug!($($arg)+)
        } else {
            tracing::info!($($arg)+)
        }
    };
}

/// A class that did not make it through the build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassFailure {
    pub class: Name,
    /// `File(Line) : Error, message`.
    pub log_line: String,
}

/// Outcome of a build.
#[derive(Debug, Default)]
pub struct MakeReport {
    /// Classes that compiled, in compile order.
    pub compiled: Vec<Name>,
    pub failures: Vec<ClassFailure>,
    /// Packages whose sources and dependencies are unchanged.
    pub up_to_date: Vec<Name>,
    pub headers: Vec<(Name, ExportReport)>,
    /// `Class.Function` for every script function nothing calls.
    pub unreferenced: Vec<String>,
    pub warnings: usize,
}

impl MakeReport {
    pub fn succeeded(&self) -> bool {
        self.failures.is_empty()
    }

    /// Whether `class` failed.
    pub fn failed(&self, class: &str) -> bool {
        self.failures.iter().any(|f| f.class.matches(class))
    }
}

/// The state of one batch: sources, the reflection graph being filled and
/// the session shared by every class compile.
pub struct ScriptBuild {
    registry: Registry,
    session: CompilationSession,
    options: BuildOptions,
    packages: Vec<SourcePackage>,
    /// Compiled classes in compile order.
    classes: Vec<ClassId>,
    failed: FxHashSet<Name>,
    report: MakeReport,
}

impl ScriptBuild {
    pub fn new(options: BuildOptions) -> Self {
        Self {
            registry: Registry::new(),
            session: CompilationSession::new(options.compile_options()),
            options,
            packages: Vec::new(),
            classes: Vec::new(),
            failed: FxHashSet::default(),
            report: MakeReport::default(),
        }
    }

    /// Resolve object literals through `resolver`.
    pub fn with_resolver(mut self, resolver: Box<dyn ObjectResolver>) -> Self {
        self.session.resolver = resolver;
        self
    }

    /// Queue a package. Packages compile in the order they are added.
    pub fn add_package(&mut self, package: SourcePackage) {
        self.packages.push(package);
    }

    pub fn packages(&self) -> &[SourcePackage] {
        &self.packages
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn session(&self) -> &CompilationSession {
        &self.session
    }

    pub fn report(&self) -> &MakeReport {
        &self.report
    }

    pub fn into_report(mut self) -> MakeReport {
        self.report.warnings = self.session.diagnostics.warning_count();
        self.report
    }

    /// Whether any class of `package` failed.
    pub fn package_failed(&self, package: &Name) -> bool {
        self.packages
            .iter()
            .filter(|p| p.name == *package)
            .flat_map(|p| &p.classes)
            .any(|c| self.failed.contains(&c.name))
    }

    /// Log a failure and remember the class so its dependents are skipped.
    fn fail(&mut self, class: &SourceClass, line: u32, message: String) {
        let file = class.file_name();
        self.session.diagnostics.error(&file, line, &message);
        self.failed.insert(class.name.clone());
        self.report.failures.push(ClassFailure {
            class: class.name.clone(),
            log_line: format!("{}({}) : Error, {}", file, line, message),
        });
    }

    /// Order, register and compile every queued class through both passes.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn compile_scripts(&mut self) -> Result<(), BuildError> {
        let sources: Vec<SourceClass> = self
            .packages
            .iter()
            .flat_map(|p| p.classes.iter().cloned())
            .collect();

        let mut classes = Vec::with_capacity(sources.len());
        let mut headers: Vec<ClassHeader> = Vec::with_capacity(sources.len());
        for class in sources {
            match parse_class_header(&class.source) {
                Ok(header) => {
                    classes.push(class);
                    headers.push(header);
                }
                Err(err) => {
                    self.fail(&class, err.line, err.message.clone());
                    if self.options.bootstrap {
                        return Err(BuildError::Bootstrap {
                            class: class.name.to_string(),
                            source: err,
                        });
                    }
                }
            }
        }

        let registry = &self.registry;
        let plan = build_order(&headers, |name| registry.find_class(name.as_str()).is_some());
        for (i, err) in plan.rejected {
            self.fail(&classes[i], 0, err.to_string());
            if self.options.bootstrap {
                return Err(err);
            }
        }
        let order_names: Vec<String> = plan.order.iter().map(|&i| classes[i].name.to_string()).collect();
        if self.options.show_dep {
            tracing::info!(order = %order_names.join(", "), "class compile order");
        } else {
            tracing::debug!(order = %order_names.join(", "), "class compile order");
        }

        let mut batch = Vec::with_capacity(plan.order.len());
        for i in plan.order {
            let class = &classes[i];
            match self.registry.add_class(class.name.clone(), class.package.clone()) {
                Ok(id) => batch.push((i, id)),
                Err(err) => self.fail(class, 0, err.to_string()),
            }
        }

        for pass in [CompilePass::Declarations, CompilePass::Code] {
            chatter!(self.options.silent, pass = pass.as_str(), classes = batch.len(), "compiling");
            for &(i, id) in &batch {
                let class = &classes[i];
                if self.failed.contains(&class.name) {
                    continue;
                }
                if let Some(dependency) = headers[i].dependencies().find(|d| self.failed.contains(*d)) {
                    let err = BuildError::DependencyFailed {
                        class: class.name.to_string(),
                        dependency: dependency.to_string(),
                    };
                    self.fail(class, 0, err.to_string());
                    continue;
                }

                let result = ScriptCompiler::new(
                    &mut self.session,
                    &mut self.registry,
                    id,
                    class.source.clone(),
                    class.file_name(),
                )
                .compile(pass);
                if let Err(err) = result {
                    self.registry.reset_class(id);
                    self.session.metadata.remove_class(id);
                    self.fail(class, err.line, err.message.clone());
                    if self.options.bootstrap {
                        return Err(BuildError::Bootstrap {
                            class: class.name.to_string(),
                            source: err,
                        });
                    }
                }
            }
        }

        for &(i, id) in &batch {
            if !self.failed.contains(&classes[i].name) {
                self.classes.push(id);
                self.report.compiled.push(classes[i].name.clone());
            }
        }
        chatter!(
            self.options.silent,
            compiled = self.report.compiled.len(),
            failed = self.report.failures.len(),
            warnings = self.session.diagnostics.warning_count(),
            "script compile finished"
        );
        Ok(())
    }

    /// Script functions of this batch that no compiled code references.
    /// Natives, events, delegates, operators and overrides are reachable
    /// from outside script and are not listed.
    pub fn list_unreferenced(&mut self) -> &[String] {
        let batch: FxHashSet<ClassId> = self.classes.iter().copied().collect();
        let hidden = FunctionFlags::NATIVE
            | FunctionFlags::EVENT
            | FunctionFlags::DELEGATE
            | FunctionFlags::OPERATOR
            | FunctionFlags::PRE_OPERATOR;
        let mut unreferenced = Vec::new();
        for id in self.registry.function_ids() {
            let function = self.registry.function(id);
            let class = match function.owner {
                FieldOwner::Class(class) => class,
                FieldOwner::State(state) => self.registry.state(state).owner,
                _ => continue,
            };
            if !batch.contains(&class)
                || function.flags.intersects(hidden)
                || function.super_function.is_some()
                || self.session.referenced.contains(&id)
            {
                continue;
            }
            let entry = format!("{}.{}", self.registry.class(class).name, function.name);
            tracing::info!(function = %entry, "unreferenced function");
            unreferenced.push(entry);
        }
        unreferenced.sort();
        self.report.unreferenced = unreferenced;
        &self.report.unreferenced
    }

    /// Write the headers of `package` into `dir`.
    pub fn export_headers(
        &mut self,
        package: &Name,
        dir: &Path,
        prompter: &mut dyn Prompter,
    ) -> Result<&ExportReport, BuildError> {
        let options = ExportOptions {
            delete_stale: self.options.delete_stale_headers(),
        };
        let export = export_package_headers(
            &mut self.registry,
            &mut self.session,
            package,
            dir,
            options,
            prompter,
        )?;
        chatter!(
            self.options.silent,
            package = %package,
            written = export.written.len(),
            unchanged = export.unchanged.len(),
            "exported headers"
        );
        self.report.headers.push((package.clone(), export));
        let (_, export) = &self.report.headers[self.report.headers.len() - 1];
        Ok(export)
    }

    /// Import struct and class defaults for every compiled class.
    ///
    /// Classes waiting on a parent or on another class's archetype are
    /// retried until a full round imports nothing; whatever is still waiting
    /// then fails.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn compile_class_defaults(&mut self) -> Result<(), BuildError> {
        let classes = self.classes.clone();
        for &class in &classes {
            for id in self.registry.class(class).structs.clone() {
                if let Err(err) = import_struct_defaults(&mut self.registry, &mut self.session, id) {
                    self.fail_compiled(class, err.line, err.message.clone());
                    if self.options.bootstrap {
                        return Err(self.bootstrap_error(class, err));
                    }
                }
            }
        }

        let mut pending: Vec<ClassId> = classes
            .into_iter()
            .filter(|&c| !self.failed.contains(&self.registry.class(c).name))
            .collect();
        let mut round = 0;
        while !pending.is_empty() {
            round += 1;
            let mut waiting = Vec::new();
            for &class in &pending {
                match import_default_properties(&mut self.registry, &mut self.session, class) {
                    Ok(DefaultsOutcome::Imported) => {}
                    Ok(DefaultsOutcome::Deferred { waiting_on }) => {
                        tracing::trace!(class = %self.registry.class(class).name, %waiting_on, "defaults deferred");
                        waiting.push((class, waiting_on));
                    }
                    Err(err) => {
                        self.fail_compiled(class, err.line, err.message.clone());
                        if self.options.bootstrap {
                            return Err(self.bootstrap_error(class, err));
                        }
                    }
                }
            }
            tracing::debug!(round, remaining = waiting.len(), "default properties round");
            if waiting.len() == pending.len() {
                let names: Vec<String> = waiting
                    .iter()
                    .map(|(c, on)| format!("{} (waiting on {})", self.registry.class(*c).name, on))
                    .collect();
                let err = BuildError::DefaultsStalled { classes: names };
                for &(class, _) in &waiting {
                    self.fail_compiled(class, 0, err.to_string());
                }
                if self.options.bootstrap {
                    return Err(err);
                }
                break;
            }
            pending = waiting.into_iter().map(|(c, _)| c).collect();
        }
        Ok(())
    }

    fn source_of(&self, class: ClassId) -> Option<SourceClass> {
        let name = &self.registry.class(class).name;
        self.packages
            .iter()
            .flat_map(|p| &p.classes)
            .find(|c| c.name == *name)
            .cloned()
    }

    fn fail_compiled(&mut self, class: ClassId, line: u32, message: String) {
        match self.source_of(class) {
            Some(source) => self.fail(&source, line, message),
            None => {
                let entry = self.registry.class(class);
                let path = format!("{}.uc", entry.name).into();
                let source = SourceClass::new(entry.package.clone(), path, "");
                self.fail(&source, line, message);
            }
        }
    }

    fn bootstrap_error(&self, class: ClassId, source: unrealscript_core::CompileError) -> BuildError {
        BuildError::Bootstrap {
            class: self.registry.class(class).name.to_string(),
            source,
        }
    }
}

/// Build every package `config` lists.
///
/// Without `FULL`, a package whose sources hash the same as in the last
/// manifest, and whose earlier packages are all unchanged too, is reported
/// up to date and its headers are left alone. It is still compiled so later
/// packages can see its declarations.
pub fn make_scripts(
    config: &EditorConfig,
    options: &BuildOptions,
    prompter: &mut dyn Prompter,
) -> Result<MakeReport, BuildError> {
    let mut build = ScriptBuild::new(*options);
    for package in &config.packages {
        build.add_package(load_package(&config.in_path, package)?);
    }

    let manifest_path = config.out_path.join(MANIFEST_FILE);
    let manifest = if options.full {
        BuildManifest::new()
    } else {
        BuildManifest::load(&manifest_path)?
    };

    build.compile_scripts()?;
    if options.list_unreferenced {
        build.list_unreferenced();
    }

    let packages: Vec<(Name, u64, bool)> = build
        .packages()
        .iter()
        .map(|p| (p.name.clone(), package_hash(p), manifest.is_current(p)))
        .collect();
    let mut next = manifest.clone();
    let mut unchanged_so_far = true;
    for (name, hash, current) in packages {
        unchanged_so_far &= current;
        if unchanged_so_far {
            chatter!(options.silent, package = %name, "package is up to date");
            build.report.up_to_date.push(name);
            continue;
        }
        if build.package_failed(&name) {
            tracing::warn!(package = %name, "skipping header export for failed package");
            continue;
        }
        build.export_headers(&name, &config.header_dir(name.as_str()), prompter)?;
        next.record(name.as_str(), hash);
    }

    build.compile_class_defaults()?;
    next.save(&manifest_path)?;
    let report = build.into_report();
    chatter!(
        options.silent,
        compiled = report.compiled.len(),
        failed = report.failures.len(),
        warnings = report.warnings,
        "make finished"
    );
    Ok(report)
}
