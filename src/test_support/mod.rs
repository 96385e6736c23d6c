//! Test fixtures for resolver unit tests.
//!
//! [`WorkspaceFixture`] writes a throwaway workspace to a temp directory:
//! member manifests, source files, module manifests, a directory registry
//! and built-in package roots.
//!
//! ```rust,ignore
//! let fx = WorkspaceFixture::new()
//!     .member("app", "name = \"app\"\nversion = \"1.0.0\"\n")
//!     .file("app/src/main.lume", "")
//!     .build();
//! let session = fx.session().unwrap();
//! ```

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::core::Workspace;
use crate::core::WORKSPACE_MANIFEST;
use crate::resolver::{PackageRegistry, ResolveError, Session};
use crate::sources::{DirectoryRegistry, Source};
use crate::util::config::{BuiltinConfig, ResolverConfig};

/// Directory (under the fixture root) holding the directory registry.
pub const REGISTRY_DIR: &str = "registry";

/// Directory (under the fixture root) holding built-in package roots.
pub const BUILTINS_DIR: &str = "builtins";

/// Builder for an on-disk workspace.
#[derive(Debug, Clone, Default)]
pub struct WorkspaceFixture {
    /// Member directory -> `lume.toml` content, in declaration order
    members: Vec<(String, String)>,
    /// Path relative to the fixture root -> content
    files: Vec<(String, String)>,
    /// (identifier, version, `lume.toml` content)
    published: Vec<(String, String, String)>,
    /// (identifier, version)
    builtins: Vec<(String, String)>,
}

impl WorkspaceFixture {
    pub fn new() -> Self {
        WorkspaceFixture::default()
    }

    /// Add a workspace member at `dir` with the given package manifest.
    pub fn member(mut self, dir: &str, manifest: &str) -> Self {
        self.members.push((dir.to_string(), manifest.to_string()));
        self
    }

    /// Write a file, relative to the fixture root.
    pub fn file(mut self, path: &str, content: &str) -> Self {
        self.files.push((path.to_string(), content.to_string()));
        self
    }

    /// Write an empty source file.
    pub fn touch(self, path: &str) -> Self {
        self.file(path, "")
    }

    /// Write a `lume.module.toml` in `dir` mapping each key to a file.
    pub fn module_manifest(self, dir: &str, exports: &[(&str, &str)]) -> Self {
        let mut content = String::from("[exports]\n");
        for (key, target) in exports {
            content.push_str(&format!("{:?} = {:?}\n", key, target));
        }
        self.file(&format!("{}/lume.module.toml", dir), &content)
    }

    /// Publish a package version to the directory registry.
    pub fn published(mut self, id: &str, version: &str, manifest: &str) -> Self {
        self.published
            .push((id.to_string(), version.to_string(), manifest.to_string()));
        self
    }

    /// Configure a built-in package rooted at [`builtin_dir`].
    pub fn builtin(mut self, id: &str, version: &str) -> Self {
        self.builtins.push((id.to_string(), version.to_string()));
        self
    }

    /// Write everything to a new temp directory.
    pub fn build(self) -> BuiltWorkspace {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().to_path_buf();

        let members: Vec<String> = self.members.iter().map(|(dir, _)| format!("{:?}", dir)).collect();
        write(
            &root.join(WORKSPACE_MANIFEST),
            &format!("members = [{}]\n", members.join(", ")),
        );
        for (dir, manifest) in &self.members {
            write(&root.join(dir).join("lume.toml"), manifest);
        }
        for (path, content) in &self.files {
            write(&root.join(path), content);
        }

        let registry_root = root.join(REGISTRY_DIR);
        std::fs::create_dir_all(&registry_root).unwrap();
        for (id, version, manifest) in &self.published {
            write(&registry_root.join(id).join(version).join("lume.toml"), manifest);
        }

        let mut config = ResolverConfig::default();
        config.registry.path = Some(registry_root);
        for (id, version) in &self.builtins {
            let path = root.join(builtin_dir(id));
            std::fs::create_dir_all(&path).unwrap();
            config.builtins.insert(
                id.clone(),
                BuiltinConfig {
                    path,
                    version: version.clone(),
                },
            );
        }

        BuiltWorkspace { tmp, config }
    }
}

/// Root of a built-in package relative to the fixture root: `@std` -> `builtins/std`.
pub fn builtin_dir(id: &str) -> String {
    format!("{}/{}", BUILTINS_DIR, id.trim_start_matches('@').replace('/', "-"))
}

/// A workspace on disk. Deleted when dropped.
pub struct BuiltWorkspace {
    tmp: TempDir,
    pub config: ResolverConfig,
}

impl BuiltWorkspace {
    pub fn root(&self) -> &Path {
        self.tmp.path()
    }

    pub fn registry_root(&self) -> PathBuf {
        self.root().join(REGISTRY_DIR)
    }

    /// Write another file after the fact.
    pub fn write(&self, path: &str, content: &str) {
        write(&self.root().join(path), content);
    }

    /// Build a package registry with the fixture's directory registry.
    pub fn registry(&self) -> Result<PackageRegistry, ResolveError> {
        let workspace = Workspace::load(self.root()).unwrap();
        let source = DirectoryRegistry::new(self.registry_root());
        PackageRegistry::build(&workspace, &self.config, Some(&source as &dyn Source))
    }

    /// Open a session over the fixture.
    pub fn session(&self) -> Result<Session, ResolveError> {
        Session::open(self.root(), self.config.clone())
    }
}

fn write(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
}
