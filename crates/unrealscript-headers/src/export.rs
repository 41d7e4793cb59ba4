//! Writing a package's headers to disk.

use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use unrealscript_compiler::CompilationSession;
use unrealscript_core::{BuildError, ClassFlags, ClassId, Name};
use unrealscript_registry::Registry;

use crate::generator::{GeneratedHeader, NativeHeaderGenerator, exports_header};

/// Answers yes/no questions raised while exporting.
pub trait Prompter {
    fn confirm(&mut self, question: &str) -> bool;
}

/// Says yes to everything (`-auto`).
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoAccept;

impl Prompter for AutoAccept {
    fn confirm(&mut self, question: &str) -> bool {
        tracing::debug!(question, "auto-accepted");
        true
    }
}

/// Says no to everything (silent builds without `-auto`).
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoDecline;

impl Prompter for AutoDecline {
    fn confirm(&mut self, question: &str) -> bool {
        tracing::debug!(question, "declined");
        false
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ExportOptions {
    /// Remove `<Package>*Classes.h` files no group produced.
    pub delete_stale: bool,
}

/// What an export did on disk.
#[derive(Debug, Default)]
pub struct ExportReport {
    pub written: Vec<PathBuf>,
    pub unchanged: Vec<PathBuf>,
    /// Read-only headers the prompter refused to overwrite.
    pub declined: Vec<PathBuf>,
    pub deleted: Vec<PathBuf>,
}

/// Header groups used by the exported classes of `package`, the default
/// group first.
pub fn header_groups(registry: &Registry, package: &Name) -> Vec<Option<String>> {
    let groups: BTreeSet<Option<String>> = registry
        .class_ids()
        .map(|id| registry.class(id))
        .filter(|entry| entry.package == *package && exports_header(entry))
        .map(|entry| entry.header_group.clone())
        .collect();
    groups.into_iter().collect()
}

/// Generate and write every header of `package` into `dir`, then update
/// the misaligned flag of the package's classes.
pub fn export_package_headers(
    registry: &mut Registry,
    session: &mut CompilationSession,
    package: &Name,
    dir: &Path,
    options: ExportOptions,
    prompter: &mut dyn Prompter,
) -> Result<ExportReport, BuildError> {
    let mut report = ExportReport::default();
    let mut produced = BTreeSet::new();

    for group in header_groups(registry, package) {
        let path = dir.join(crate::generator::header_file_name(package, group.as_deref()));
        let previous = match fs::read_to_string(&path) {
            Ok(text) => Some(text),
            Err(err) if err.kind() == ErrorKind::NotFound => None,
            Err(err) => return Err(BuildError::io(&path, err)),
        };

        let header = NativeHeaderGenerator::new(registry, session, package.clone(), group)
            .with_previous(previous.as_deref())
            .generate();
        apply_misalignment(registry, &header);
        produced.insert(header.file_name.to_ascii_lowercase());

        if previous.as_deref() == Some(header.text.as_str()) {
            tracing::debug!(path = %path.display(), "header unchanged");
            report.unchanged.push(path);
            continue;
        }
        if write_header(&path, &header.text, prompter)? {
            tracing::info!(path = %path.display(), "wrote header");
            report.written.push(path);
        } else {
            tracing::warn!(path = %path.display(), "header is read-only, not updated");
            report.declined.push(path);
        }
    }

    if options.delete_stale {
        delete_stale_headers(package, dir, &produced, prompter, &mut report)?;
    }
    Ok(report)
}

/// Write `text` to `path`. A read-only file is only replaced when the
/// prompter agrees; returns whether the file was written.
fn write_header(path: &Path, text: &str, prompter: &mut dyn Prompter) -> Result<bool, BuildError> {
    match fs::metadata(path) {
        Ok(meta) if meta.permissions().readonly() => {
            let question = format!("{} is read-only; overwrite it?", path.display());
            if !prompter.confirm(&question) {
                return Ok(false);
            }
            let mut permissions = meta.permissions();
            #[allow(clippy::permissions_set_readonly_false)]
            permissions.set_readonly(false);
            fs::set_permissions(path, permissions).map_err(|e| BuildError::io(path, e))?;
        }
        Ok(_) => {}
        Err(err) if err.kind() == ErrorKind::NotFound => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|e| BuildError::io(parent, e))?;
            }
        }
        Err(err) => return Err(BuildError::io(path, err)),
    }
    fs::write(path, text).map_err(|e| BuildError::io(path, e))?;
    Ok(true)
}

fn delete_stale_headers(
    package: &Name,
    dir: &Path,
    produced: &BTreeSet<String>,
    prompter: &mut dyn Prompter,
    report: &mut ExportReport,
) -> Result<(), BuildError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(()),
        Err(err) => return Err(BuildError::io(dir, err)),
    };
    let prefix = package.as_str().to_ascii_lowercase();
    for entry in entries {
        let entry = entry.map_err(|e| BuildError::io(dir, e))?;
        let file_name = entry.file_name().to_string_lossy().to_ascii_lowercase();
        let ours = file_name.starts_with(&prefix) && file_name.ends_with("classes.h");
        if !ours || produced.contains(&file_name) {
            continue;
        }
        let path = entry.path();
        let question = format!("{} is no longer generated; delete it?", path.display());
        if prompter.confirm(&question) {
            fs::remove_file(&path).map_err(|e| BuildError::io(&path, e))?;
            tracing::info!(path = %path.display(), "deleted stale header");
            report.deleted.push(path);
        }
    }
    Ok(())
}

/// Mark the header's classes misaligned when their layout may differ from
/// the compiled C++: the base class or member block changed, or the parent
/// is misaligned. Script-only subclasses follow their nearest exported
/// ancestor.
pub fn apply_misalignment(registry: &mut Registry, header: &GeneratedHeader) {
    for &class in &header.classes {
        let parent_misaligned = registry
            .class(class)
            .super_class
            .is_some_and(|parent| registry.class(parent).flags.contains(ClassFlags::MISALIGNED));
        let misaligned = parent_misaligned || header.changed.contains(&class);
        registry.class_mut(class).flags.set(ClassFlags::MISALIGNED, misaligned);
        if misaligned {
            tracing::debug!(class = %registry.class(class).name, "class layout misaligned");
        }
    }

    let followers: Vec<(ClassId, bool)> = registry
        .class_ids()
        .filter(|&id| !exports_header(registry.class(id)))
        .filter_map(|id| {
            let anchor = registry
                .class_chain(id)
                .skip(1)
                .find(|&ancestor| exports_header(registry.class(ancestor)))?;
            header.classes.contains(&anchor).then(|| {
                (id, registry.class(anchor).flags.contains(ClassFlags::MISALIGNED))
            })
        })
        .collect();
    for (class, misaligned) in followers {
        registry.class_mut(class).flags.set(ClassFlags::MISALIGNED, misaligned);
    }
}
