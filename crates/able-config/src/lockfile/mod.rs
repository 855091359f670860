//! package.lock parsing and serialization
//!
//! The lockfile records every root that contributed packages to a load,
//! with a content checksum of its sources. Output is always sorted so the
//! file is stable under reordering.

use able_core::error::AbleError;
use camino::Utf8Path;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;

use crate::ConfigResult;

/// Lockfile name written next to the entry root's manifest
pub const LOCKFILE_NAME: &str = "package.lock";

/// Complete package.lock contents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lockfile {
    /// Name of the root package the lock was generated for
    pub root: String,

    /// Generation time (RFC 3339, UTC)
    pub generated: DateTime<Utc>,

    /// Tool that produced the file
    pub tool: String,

    /// Locked package roots
    #[serde(default)]
    pub packages: Vec<LockedPackage>,
}

/// One locked package root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockedPackage {
    pub name: String,
    pub version: String,
    /// Where the sources live, e.g. `path:/abs/dir`
    pub source: String,
    /// `blake3:<hex>` over the root's source files
    pub checksum: String,
    #[serde(default)]
    pub dependencies: Vec<LockedDependency>,
}

/// Dependency edge between locked roots
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LockedDependency {
    pub name: String,
    pub version: String,
}

impl Lockfile {
    /// Create an empty lockfile stamped with the current time
    pub fn new(root: impl Into<String>, tool: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            generated: Utc::now(),
            tool: tool.into(),
            packages: Vec::new(),
        }
    }

    /// Sort packages by name and each package's dependencies by name and
    /// version
    pub fn normalize(&mut self) {
        self.packages.sort_by(|a, b| a.name.cmp(&b.name));
        for package in &mut self.packages {
            package.dependencies.sort();
        }
    }

    /// Look up a locked package by name
    pub fn package(&self, name: &str) -> Option<&LockedPackage> {
        self.packages.iter().find(|p| p.name == name)
    }

    /// Serialize to TOML in normalized order
    pub fn to_toml_string(&self) -> ConfigResult<String> {
        let mut normalized = self.clone();
        normalized.normalize();
        toml::to_string(&normalized).map_err(|e| AbleError::Lockfile {
            path: LOCKFILE_NAME.into(),
            message: format!("serialization failed: {}", e),
        })
    }

    /// Parse TOML contents; `path` is used for error messages
    pub fn from_toml_str(path: &Utf8Path, contents: &str) -> ConfigResult<Self> {
        let mut lockfile: Lockfile = toml::from_str(contents).map_err(|e| AbleError::Lockfile {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        if lockfile.root.trim().is_empty() {
            return Err(AbleError::Lockfile {
                path: path.to_path_buf(),
                message: "missing root package name".to_string(),
            });
        }
        lockfile.normalize();
        Ok(lockfile)
    }

    /// Load and parse a lockfile from disk
    pub fn load(path: &Utf8Path) -> ConfigResult<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| AbleError::io(format!("Failed to read {}", path), e))?;
        Self::from_toml_str(path, &contents)
    }

    /// Write the lockfile to disk in normalized order
    pub fn write(&self, path: &Utf8Path) -> ConfigResult<()> {
        let contents = self.to_toml_string().map_err(|e| match e {
            AbleError::Lockfile { message, .. } => AbleError::Lockfile {
                path: path.to_path_buf(),
                message,
            },
            other => other,
        })?;
        if let Some(parent) = path.parent().filter(|p| !p.as_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| AbleError::io(format!("Failed to create {}", parent), e))?;
        }
        fs::write(path, contents).map_err(|e| AbleError::io(format!("Failed to write {}", path), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap()
    }

    fn package(name: &str, deps: &[(&str, &str)]) -> LockedPackage {
        LockedPackage {
            name: name.to_string(),
            version: "0.1.0".to_string(),
            source: format!("path:/src/{}", name),
            checksum: format!("blake3:{}", "0".repeat(64)),
            dependencies: deps
                .iter()
                .map(|(name, version)| LockedDependency {
                    name: name.to_string(),
                    version: version.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_parse_minimal_lockfile() {
        let contents = r#"
root = "app"
generated = "2026-03-14T09:26:53Z"
tool = "able-load 0.1.0"
"#;
        let lockfile = Lockfile::from_toml_str(Utf8Path::new("package.lock"), contents).unwrap();
        assert_eq!(lockfile.root, "app");
        assert_eq!(lockfile.generated, fixed_time());
        assert!(lockfile.packages.is_empty());
    }

    #[test]
    fn test_parse_with_packages() {
        let contents = r#"
root = "app"
generated = "2026-03-14T09:26:53Z"
tool = "able-load"

[[packages]]
name = "zeta"
version = "1.0.0"
source = "path:/z"
checksum = "blake3:ab"

[[packages]]
name = "app"
version = "0.1.0"
source = "path:/app"
checksum = "blake3:cd"

[[packages.dependencies]]
name = "zeta"
version = "1.0.0"

[[packages.dependencies]]
name = "alpha"
version = "2.0.0"
"#;
        let lockfile = Lockfile::from_toml_str(Utf8Path::new("package.lock"), contents).unwrap();
        assert_eq!(lockfile.packages[0].name, "app");
        let deps: Vec<_> = lockfile.packages[0].dependencies.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(deps, vec!["alpha", "zeta"]);
        assert!(lockfile.package("zeta").unwrap().dependencies.is_empty());
    }

    #[test]
    fn test_invalid_lockfile() {
        let err = Lockfile::from_toml_str(Utf8Path::new("/x/package.lock"), "root = ").unwrap_err();
        assert!(matches!(err, AbleError::Lockfile { ref path, .. } if path == "/x/package.lock"));

        let empty_root = "root = \"\"\ngenerated = \"2026-03-14T09:26:53Z\"\ntool = \"t\"\n";
        assert!(Lockfile::from_toml_str(Utf8Path::new("package.lock"), empty_root).is_err());
    }

    #[test]
    fn test_write_and_load() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = Utf8Path::from_path(temp_dir.path()).unwrap().join("nested/package.lock");

        let mut lockfile = Lockfile::new("app", "able-load");
        lockfile.generated = fixed_time();
        lockfile.packages = vec![package("lib", &[]), package("app", &[("lib", "0.1.0")])];
        lockfile.write(&path).unwrap();

        let loaded = Lockfile::load(&path).unwrap();
        let mut expected = lockfile.clone();
        expected.normalize();
        assert_eq!(loaded, expected);

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.find("name = \"app\"").unwrap() < text.find("name = \"lib\"").unwrap());
    }

    #[test]
    fn test_load_missing_file() {
        let err = Lockfile::load(Utf8Path::new("/definitely/missing/package.lock")).unwrap_err();
        assert!(matches!(err, AbleError::Io { .. }));
    }

    proptest! {
        #[test]
        fn output_is_independent_of_input_order(
            names in prop::collection::btree_set("[a-z]{1,6}", 1..6),
            rotate in 0usize..6
        ) {
            let mut packages: Vec<LockedPackage> = names
                .iter()
                .map(|name| package(name, &[("dep_b", "1.0.0"), ("dep_a", "2.0.0"), ("dep_a", "1.0.0")]))
                .collect();

            let mut first = Lockfile::new("root", "able-load");
            first.generated = fixed_time();
            first.packages = packages.clone();

            let len = packages.len();
            packages.rotate_left(rotate % len);
            packages.reverse();
            let mut second = first.clone();
            second.packages = packages;

            prop_assert_eq!(first.to_toml_string().unwrap(), second.to_toml_string().unwrap());

            let mut normalized = second.clone();
            normalized.normalize();
            for window in normalized.packages.windows(2) {
                prop_assert!(window[0].name <= window[1].name);
            }
            let deps = &normalized.packages[0].dependencies;
            prop_assert_eq!(deps[0].clone(), LockedDependency { name: "dep_a".into(), version: "1.0.0".into() });
        }
    }
}
