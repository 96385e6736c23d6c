//! Workspace - the ordered set of local member packages.
//!
//! A workspace is a development-time grouping only; it is never itself an
//! import target. A directory with a plain `lume.toml` and no workspace
//! manifest is treated as a single-member workspace.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use rayon::prelude::*;

use crate::core::manifest::{Manifest, WorkspaceManifest, PACKAGE_MANIFEST, WORKSPACE_MANIFEST};

/// A loaded workspace. Immutable after construction.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,

    /// Absolute member package directories, in declaration order
    members: Vec<PathBuf>,
}

impl Workspace {
    /// Load the workspace rooted at `root`.
    pub fn load(root: &Path) -> Result<Self> {
        let ws_manifest = root.join(WORKSPACE_MANIFEST);
        let members = if ws_manifest.is_file() {
            let manifest = WorkspaceManifest::load(&ws_manifest)?;
            manifest.members.iter().map(|m| root.join(m)).collect()
        } else if root.join(PACKAGE_MANIFEST).is_file() {
            vec![root.to_path_buf()]
        } else {
            bail!(
                "no {} or {} found in {}",
                WORKSPACE_MANIFEST,
                PACKAGE_MANIFEST,
                root.display()
            );
        };

        tracing::debug!("workspace at {} with {} member(s)", root.display(), members.len());

        Ok(Workspace {
            root: root.to_path_buf(),
            members,
        })
    }

    /// Walk up from `start` to the nearest directory holding a workspace
    /// manifest, falling back to the nearest package manifest.
    pub fn find_root(start: &Path) -> Option<PathBuf> {
        let mut package_root = None;
        for dir in start.ancestors() {
            if dir.join(WORKSPACE_MANIFEST).is_file() {
                return Some(dir.to_path_buf());
            }
            if package_root.is_none() && dir.join(PACKAGE_MANIFEST).is_file() {
                package_root = Some(dir.to_path_buf());
            }
        }
        package_root
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn members(&self) -> &[PathBuf] {
        &self.members
    }

    /// Parse every member manifest, one task per member.
    ///
    /// Results keep declaration order. A member directory without a
    /// `lume.toml` is an error.
    pub fn load_members(&self) -> Vec<(PathBuf, Result<Manifest>)> {
        self.members
            .par_iter()
            .map(|dir| {
                let path = dir.join(PACKAGE_MANIFEST);
                let manifest = if path.is_file() {
                    Manifest::load(&path)
                } else {
                    Err(anyhow::anyhow!(
                        "workspace member {} has no {}",
                        dir.display(),
                        PACKAGE_MANIFEST
                    ))
                };
                (dir.clone(), manifest.with_context(|| format!("in workspace member {}", dir.display())))
            })
            .collect()
    }
}
