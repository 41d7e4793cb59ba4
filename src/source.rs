//! Script sources on disk: `<root>/<Package>/Classes/<Class>.uc`.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use unrealscript_core::{BuildError, Name};

/// One class file.
#[derive(Debug, Clone)]
pub struct SourceClass {
    /// Class name, taken from the file stem.
    pub name: Name,
    pub package: Name,
    pub path: PathBuf,
    pub source: Arc<str>,
}

impl SourceClass {
    pub fn new(package: Name, path: PathBuf, source: impl Into<Arc<str>>) -> Self {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            name: Name::new(&stem),
            package,
            path,
            source: source.into(),
        }
    }

    /// File name used in log lines.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("{}.uc", self.name))
    }
}

/// The class files of one package, sorted by file name.
#[derive(Debug, Clone)]
pub struct SourcePackage {
    pub name: Name,
    pub classes: Vec<SourceClass>,
}

/// Read every `.uc` file under `<root>/<package>/Classes`.
pub fn load_package(root: &Path, package: &str) -> Result<SourcePackage, BuildError> {
    let dir = root.join(package).join("Classes");
    let entries = fs::read_dir(&dir).map_err(|e| BuildError::io(&dir, e))?;
    let mut paths = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| BuildError::io(&dir, e))?.path();
        let is_script = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("uc"));
        if is_script && path.is_file() {
            paths.push(path);
        }
    }
    paths.sort_by_key(|p| p.file_name().map(|n| n.to_string_lossy().to_ascii_lowercase()));

    let name = Name::new(package);
    let mut classes = Vec::with_capacity(paths.len());
    for path in paths {
        let source = fs::read_to_string(&path).map_err(|e| BuildError::io(&path, e))?;
        classes.push(SourceClass::new(name.clone(), path, source));
    }
    tracing::debug!(package, classes = classes.len(), "loaded package sources");
    Ok(SourcePackage { name, classes })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_name_comes_from_file_stem() {
        let class = SourceClass::new(Name::new("Game"), PathBuf::from("Src/Game/Classes/Pawn.uc"), "");
        assert_eq!(class.name, "Pawn");
        assert_eq!(class.file_name(), "Pawn.uc");
    }

    #[test]
    fn missing_package_directory_is_an_io_error() {
        let root = std::env::temp_dir().join("unrealscript-missing-root");
        let err = load_package(&root, "Nowhere").unwrap_err();
        assert!(matches!(err, BuildError::Io { .. }));
    }
}
