//! Manifest parsing: `lume.toml`, `lume.workspace.toml`, `lume.module.toml`.
//!
//! Keys are authoritative; unknown keys are ignored.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use semver::{Version, VersionReq};
use serde::{Deserialize, Serialize};

use crate::core::path::ModulePath;
use crate::core::PackageId;

/// Package manifest file name.
pub const PACKAGE_MANIFEST: &str = "lume.toml";

/// Workspace manifest file name.
pub const WORKSPACE_MANIFEST: &str = "lume.workspace.toml";

/// Per-directory module manifest file name.
pub const MODULE_MANIFEST: &str = "lume.module.toml";

/// Declared binary linkage of a package. Recorded, never acted on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Linkage {
    #[default]
    Static,
    Dynamic,
}

impl std::fmt::Display for Linkage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Linkage::Static => write!(f, "static"),
            Linkage::Dynamic => write!(f, "dynamic"),
        }
    }
}

/// A dependency entry: either `"^1.2"` or `{ version = "^1.2" }`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawDependency {
    Simple(String),
    Detailed { version: String },
}

impl RawDependency {
    fn requirement(&self) -> &str {
        match self {
            RawDependency::Simple(v) => v,
            RawDependency::Detailed { version } => version,
        }
    }
}

fn default_src_dir() -> String {
    "src".to_string()
}

/// Raw `lume.toml` as deserialized from TOML.
#[derive(Debug, Deserialize)]
struct RawManifest {
    name: String,

    #[serde(default)]
    scope: Option<String>,

    version: String,

    #[serde(default = "default_src_dir", rename = "src-dir")]
    src_dir: String,

    #[serde(default)]
    linkage: Linkage,

    #[serde(default)]
    parent: Option<String>,

    #[serde(default)]
    dependencies: BTreeMap<String, RawDependency>,
}

/// A parsed package manifest.
#[derive(Debug, Clone)]
pub struct Manifest {
    /// `[@scope/]name`
    pub package_id: PackageId,

    pub version: Version,

    /// Source directory relative to the package root
    pub src_dir: PathBuf,

    pub linkage: Linkage,

    /// Declared parent package, used by `parent` visibility
    pub parent: Option<PackageId>,

    /// Dependency identifier -> version constraint
    pub dependencies: BTreeMap<PackageId, VersionReq>,

    /// Where this manifest was read from (`None` for synthesized built-ins)
    pub manifest_path: Option<PathBuf>,
}

impl Manifest {
    /// Load a manifest from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest: {}", path.display()))?;

        Self::parse(&content, path)
    }

    /// Parse manifest content.
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        let raw: RawManifest = toml::from_str(content)
            .with_context(|| format!("failed to parse {}", path.display()))?;

        let package_id = PackageId::new(raw.scope.as_deref(), &raw.name)?;

        let version: Version = raw
            .version
            .parse()
            .with_context(|| format!("invalid version `{}` for {}", raw.version, package_id))?;

        let parent = raw
            .parent
            .as_deref()
            .map(PackageId::parse)
            .transpose()
            .with_context(|| format!("invalid `parent` for {}", package_id))?;

        let mut dependencies = BTreeMap::new();
        for (name, dep) in &raw.dependencies {
            let dep_id = PackageId::parse(name)
                .with_context(|| format!("invalid dependency identifier in {}", package_id))?;
            let req: VersionReq = dep.requirement().parse().with_context(|| {
                format!(
                    "invalid version constraint `{}` for dependency `{}` of {}",
                    dep.requirement(),
                    name,
                    package_id
                )
            })?;
            if dependencies.insert(dep_id, req).is_some() {
                bail!(
                    "dependency `{}` of {} is listed twice (identifiers are case-insensitive)",
                    dep_id,
                    package_id
                );
            }
        }

        Ok(Manifest {
            package_id,
            version,
            src_dir: PathBuf::from(raw.src_dir),
            linkage: raw.linkage,
            parent,
            dependencies,
            manifest_path: Some(path.to_path_buf()),
        })
    }

    /// Manifest for a built-in package whose sources live directly in `src_root`.
    pub fn builtin(package_id: PackageId, version: Version) -> Self {
        Manifest {
            package_id,
            version,
            src_dir: PathBuf::from("."),
            linkage: Linkage::Static,
            parent: None,
            dependencies: BTreeMap::new(),
            manifest_path: None,
        }
    }
}

/// Raw `lume.workspace.toml`.
#[derive(Debug, Deserialize)]
struct RawWorkspaceManifest {
    #[serde(default)]
    members: Vec<String>,
}

/// A parsed workspace manifest.
#[derive(Debug, Clone)]
pub struct WorkspaceManifest {
    /// Member package directories in declaration order, relative to the workspace root
    pub members: Vec<PathBuf>,
}

impl WorkspaceManifest {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read workspace manifest: {}", path.display()))?;
        Self::parse(&content, path)
    }

    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        let raw: RawWorkspaceManifest = toml::from_str(content)
            .with_context(|| format!("failed to parse {}", path.display()))?;

        let mut members: Vec<PathBuf> = Vec::with_capacity(raw.members.len());
        for member in raw.members {
            let member = PathBuf::from(member);
            if members.contains(&member) {
                tracing::warn!("workspace member `{}` listed twice", member.display());
                continue;
            }
            members.push(member);
        }

        Ok(WorkspaceManifest { members })
    }
}

/// Raw `lume.module.toml`.
#[derive(Debug, Deserialize)]
struct RawModuleManifest {
    #[serde(default)]
    exports: BTreeMap<String, String>,
}

/// A parsed module manifest: exported sub-path key -> file relative to the module directory.
#[derive(Debug, Clone, Default)]
pub struct ModuleManifest {
    exports: BTreeMap<ModulePath, String>,
}

impl ModuleManifest {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read module manifest: {}", path.display()))?;
        Self::parse(&content, path)
    }

    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        let raw: RawModuleManifest = toml::from_str(content)
            .with_context(|| format!("failed to parse {}", path.display()))?;

        // `./a`, `/a` and `a` are the same key; `""` and `"/"` are the root
        let mut exports = BTreeMap::new();
        for (key, target) in raw.exports {
            let normalized = ModulePath::parse(&key);
            if exports.insert(normalized.clone(), target).is_some() {
                bail!(
                    "{}: export key `{}` is defined more than once after normalization",
                    path.display(),
                    normalized
                );
            }
        }

        Ok(ModuleManifest { exports })
    }

    /// Look up the file mapped to `key` (`ModulePath::root()` for `"/"`).
    pub fn entry(&self, key: &ModulePath) -> Option<&str> {
        self.exports.get(key).map(String::as_str)
    }

    pub fn keys(&self) -> impl Iterator<Item = &ModulePath> {
        self.exports.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_manifest() {
        let manifest = Manifest::parse(
            r#"
name = "json"
scope = "acme"
version = "1.2.0"
linkage = "dynamic"
parent = "@acme/core"
unknown-key = true

[dependencies]
"@std" = "^0.3"
strings = { version = "~2.1" }
"#,
            Path::new("lume.toml"),
        )
        .unwrap();

        assert_eq!(manifest.package_id.as_str(), "@acme/json");
        assert_eq!(manifest.version, Version::new(1, 2, 0));
        assert_eq!(manifest.src_dir, PathBuf::from("src"));
        assert_eq!(manifest.linkage, Linkage::Dynamic);
        assert_eq!(manifest.parent, Some(PackageId::parse("@acme/core").unwrap()));
        assert_eq!(manifest.dependencies.len(), 2);
    }

    #[test]
    fn test_duplicate_dependency_after_normalization() {
        let err = Manifest::parse(
            "name = \"app\"\nversion = \"1.0.0\"\n[dependencies]\nJson = \"1\"\njson = \"1\"\n",
            Path::new("lume.toml"),
        );
        assert!(err.is_err());
    }

    #[test]
    fn test_missing_version_is_error() {
        let err = Manifest::parse("name = \"app\"\n", Path::new("lume.toml"));
        assert!(err.is_err());
    }

    #[test]
    fn test_default_linkage_and_src_dir() {
        let manifest =
            Manifest::parse("name = \"app\"\nversion = \"0.1.0\"\n", Path::new("lume.toml")).unwrap();
        assert_eq!(manifest.linkage, Linkage::Static);
        assert_eq!(manifest.src_dir, PathBuf::from("src"));
        assert!(manifest.parent.is_none());
    }

    #[test]
    fn test_module_manifest_keys_normalized() {
        let manifest = ModuleManifest::parse(
            r#"
[exports]
"/" = "./index.lume"
"./Parse" = "impl/parse.lume"
"#,
            Path::new("lume.module.toml"),
        )
        .unwrap();

        assert_eq!(manifest.entry(&ModulePath::root()), Some("./index.lume"));
        assert_eq!(manifest.entry(&ModulePath::parse("parse")), Some("impl/parse.lume"));
    }

    #[test]
    fn test_workspace_manifest_members_ordered() {
        let ws = WorkspaceManifest::parse(
            "members = [\"packages/core\", \"packages/app\"]\n",
            Path::new("lume.workspace.toml"),
        )
        .unwrap();
        assert_eq!(
            ws.members,
            vec![PathBuf::from("packages/core"), PathBuf::from("packages/app")]
        );
    }
}
