//! Editor ini settings that locate script sources and name the packages to
//! build.

use std::fs;
use std::path::{Path, PathBuf};

use unrealscript_core::BuildError;

const EDITOR_SECTION: &str = "Editor.EditorEngine";

/// The `[Editor.EditorEngine]` settings the build reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorConfig {
    /// Root holding `<Package>/Classes/*.uc`.
    pub in_path: PathBuf,
    /// Where build outputs (the manifest) are written.
    pub out_path: PathBuf,
    /// Packages in build order.
    pub packages: Vec<String>,
    /// Single directory for every generated header. Without it each package
    /// writes to `<in_path>/<Package>/Inc`.
    pub native_header_path: Option<PathBuf>,
}

impl EditorConfig {
    /// Read the editor section from ini text.
    ///
    /// `EditPackages=` and `+EditPackages=` both append, `-EditPackages=`
    /// removes. Lines starting with `;` or `#` are comments.
    pub fn from_ini(text: &str) -> Result<Self, BuildError> {
        let mut in_path = None;
        let mut out_path = None;
        let mut packages: Vec<String> = Vec::new();
        let mut native_header_path = None;
        let mut in_section = false;
        let mut saw_section = false;

        for raw in text.lines() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }
            if let Some(section) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                in_section = section.trim().eq_ignore_ascii_case(EDITOR_SECTION);
                saw_section |= in_section;
                continue;
            }
            if !in_section {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let value = value.trim();
            let (op, key) = match key.trim() {
                k if k.starts_with(['+', '.']) => ('+', &k[1..]),
                k if k.starts_with('-') => ('-', &k[1..]),
                k => ('=', k),
            };
            match key.to_ascii_lowercase().as_str() {
                "editpackagesinpath" => in_path = Some(PathBuf::from(value)),
                "editpackagesoutpath" => out_path = Some(PathBuf::from(value)),
                "nativeheaderpath" if !value.is_empty() => {
                    native_header_path = Some(PathBuf::from(value))
                }
                "editpackages" if op == '-' => {
                    packages.retain(|p| !p.eq_ignore_ascii_case(value));
                }
                "editpackages" if !value.is_empty() => {
                    if !packages.iter().any(|p| p.eq_ignore_ascii_case(value)) {
                        packages.push(value.to_string());
                    }
                }
                _ => {}
            }
        }

        if !saw_section {
            return Err(BuildError::Config(format!("missing [{}] section", EDITOR_SECTION)));
        }
        let in_path = in_path
            .ok_or_else(|| BuildError::Config("EditPackagesInPath is not set".into()))?;
        let out_path = out_path.unwrap_or_else(|| in_path.clone());
        if packages.is_empty() {
            return Err(BuildError::Config("no EditPackages listed".into()));
        }
        Ok(Self {
            in_path,
            out_path,
            packages,
            native_header_path,
        })
    }

    /// Read and parse an ini file. Relative paths in it are resolved against
    /// the file's directory.
    pub fn load(path: &Path) -> Result<Self, BuildError> {
        let text = fs::read_to_string(path).map_err(|e| BuildError::io(path, e))?;
        let mut config = Self::from_ini(&text)?;
        if let Some(base) = path.parent() {
            config.in_path = base.join(&config.in_path);
            config.out_path = base.join(&config.out_path);
            if let Some(headers) = &config.native_header_path {
                config.native_header_path = Some(base.join(headers));
            }
        }
        Ok(config)
    }

    /// Directory the headers of `package` are written to.
    pub fn header_dir(&self, package: &str) -> PathBuf {
        match &self.native_header_path {
            Some(dir) => dir.clone(),
            None => self.in_path.join(package).join("Inc"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INI: &str = "\
[Engine.Engine]
EditPackages=Ignored

[Editor.EditorEngine]
; sources
EditPackagesInPath=..\\Src
EditPackagesOutPath=..\\Script
EditPackages=Core
+EditPackages=Engine
+EditPackages=Game
-EditPackages=Engine
.EditPackages=core
";

    #[test]
    fn reads_editor_section() {
        let config = EditorConfig::from_ini(INI).expect("valid ini");
        assert_eq!(config.in_path, PathBuf::from("..\\Src"));
        assert_eq!(config.out_path, PathBuf::from("..\\Script"));
        assert_eq!(config.packages, vec!["Core", "Game"]);
        assert_eq!(config.native_header_path, None);
    }

    #[test]
    fn header_dir_defaults_to_package_inc() {
        let mut config = EditorConfig::from_ini(INI).expect("valid ini");
        assert_eq!(config.header_dir("Core"), PathBuf::from("..\\Src").join("Core").join("Inc"));
        config.native_header_path = Some(PathBuf::from("Headers"));
        assert_eq!(config.header_dir("Core"), PathBuf::from("Headers"));
    }

    #[test]
    fn missing_section_is_a_config_error() {
        let err = EditorConfig::from_ini("[Engine.Engine]\nEditPackages=Core\n").unwrap_err();
        assert!(matches!(err, BuildError::Config(_)));
    }

    #[test]
    fn missing_in_path_is_a_config_error() {
        let err = EditorConfig::from_ini("[Editor.EditorEngine]\nEditPackages=Core\n").unwrap_err();
        assert!(err.to_string().contains("EditPackagesInPath"));
    }
}
