//! Per-package source hashes from the last successful build.
//!
//! The manifest is a text file of `Package=hash` lines, the hash being the
//! hex `xxh64` of the package's class files.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use unrealscript_core::BuildError;
use xxhash_rust::xxh64::Xxh64;

use crate::source::SourcePackage;

/// File name of the manifest inside the output directory.
pub const MANIFEST_FILE: &str = "ScriptManifest.ini";

/// Source hashes keyed by lowercase package name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildManifest {
    hashes: BTreeMap<String, u64>,
}

impl BuildManifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `path`; a missing file is an empty manifest. Malformed lines are
    /// skipped.
    pub fn load(path: &Path) -> Result<Self, BuildError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Self::new()),
            Err(err) => return Err(BuildError::io(path, err)),
        };
        let mut manifest = Self::new();
        for line in text.lines() {
            let Some((package, hash)) = line.split_once('=') else {
                continue;
            };
            match u64::from_str_radix(hash.trim(), 16) {
                Ok(hash) => manifest.record(package.trim(), hash),
                Err(_) => tracing::warn!(line, "ignoring malformed manifest line"),
            }
        }
        Ok(manifest)
    }

    pub fn save(&self, path: &Path) -> Result<(), BuildError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| BuildError::io(parent, e))?;
        }
        let text: String = self
            .hashes
            .iter()
            .map(|(package, hash)| format!("{}={:016x}\n", package, hash))
            .collect();
        fs::write(path, text).map_err(|e| BuildError::io(path, e))
    }

    pub fn hash_of(&self, package: &str) -> Option<u64> {
        self.hashes.get(&package.to_ascii_lowercase()).copied()
    }

    pub fn record(&mut self, package: &str, hash: u64) {
        self.hashes.insert(package.to_ascii_lowercase(), hash);
    }

    /// Whether `package` hashes the same as last time.
    pub fn is_current(&self, package: &SourcePackage) -> bool {
        self.hash_of(package.name.as_str()) == Some(package_hash(package))
    }
}

/// Hash of every class file name and text in `package`, in load order.
pub fn package_hash(package: &SourcePackage) -> u64 {
    let mut hasher = Xxh64::new(0);
    for class in &package.classes {
        hasher.update(class.name.as_str().to_ascii_lowercase().as_bytes());
        hasher.update(&[0]);
        hasher.update(class.source.as_bytes());
        hasher.update(&[0]);
    }
    hasher.digest()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceClass;
    use unrealscript_core::Name;

    fn package(source: &str) -> SourcePackage {
        SourcePackage {
            name: Name::new("Game"),
            classes: vec![SourceClass::new(Name::new("Game"), "Actor.uc".into(), source)],
        }
    }

    #[test]
    fn hash_tracks_source_text() {
        let a = package_hash(&package("class Actor;"));
        assert_eq!(a, package_hash(&package("class Actor;")));
        assert_ne!(a, package_hash(&package("class Actor native;")));
    }

    #[test]
    fn saved_manifest_loads_back() {
        let dir = std::env::temp_dir().join(format!("unrealscript-manifest-{}", std::process::id()));
        let path = dir.join(MANIFEST_FILE);
        let mut manifest = BuildManifest::new();
        manifest.record("Core", 0xdead_beef);
        manifest.save(&path).expect("save");

        let loaded = BuildManifest::load(&path).expect("load");
        assert_eq!(loaded.hash_of("core"), Some(0xdead_beef));
        assert_eq!(loaded, manifest);
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn missing_manifest_is_empty() {
        let path = std::env::temp_dir().join("unrealscript-no-such-dir").join(MANIFEST_FILE);
        assert_eq!(BuildManifest::load(&path).expect("load"), BuildManifest::new());
    }

    #[test]
    fn current_only_when_hash_matches() {
        let pkg = package("class Actor;");
        let mut manifest = BuildManifest::new();
        assert!(!manifest.is_current(&pkg));
        manifest.record("game", package_hash(&pkg));
        assert!(manifest.is_current(&pkg));
    }
}
