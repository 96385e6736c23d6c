//! Module location inside one package.
//!
//! Probe order for a sub-path `S`:
//!
//! 0. `S` (or, for `S.<ext>`, its stem) is a file/directory clash, or `S`
//!    lies below a directory two entries normalize to: ambiguous
//! 1. `S` has a source suffix: exactly `S`, nothing else
//! 2. the deepest directory along `S` with a `lume.module.toml` decides
//! 3. `S/mod.<ext>`
//! 4. `S.<ext>`, unless `S` was written with a trailing `/`
//! 5. not found
//!
//! A candidate file from steps 1-4 is itself checked for ambiguity before it
//! is returned.

use crate::core::module::{ModuleFile, ModuleKey};
use crate::core::path::ModulePath;
use crate::core::MODULE_MANIFEST;
use crate::resolver::errors::ResolveError;
use crate::resolver::index::SourceIndex;

/// Entry file name of a directory module, without extension.
pub const DIRECTORY_ENTRY: &str = "mod";

/// A sub-path to locate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocateRequest {
    pub path: ModulePath,
    /// Written with a trailing separator: only directory forms are tried.
    pub dir_only: bool,
}

impl LocateRequest {
    /// Parse a raw sub-path, remembering a trailing separator.
    pub fn parse(raw: &str) -> Self {
        LocateRequest {
            path: ModulePath::parse(raw),
            dir_only: raw.ends_with('/') || raw.ends_with('\\'),
        }
    }

    pub fn new(path: ModulePath, dir_only: bool) -> Self {
        LocateRequest { path, dir_only }
    }
}

/// Locate `request` in the package described by `index`.
pub fn locate(
    index: &SourceIndex,
    request: &LocateRequest,
    extensions: &[String],
) -> Result<ModuleFile, ResolveError> {
    let package = index.package();
    let sub_path = &request.path;
    let has_suffix = sub_path
        .extension()
        .is_some_and(|ext| extensions.iter().any(|e| e == ext));

    let not_found = |tried: Vec<String>| ResolveError::ModuleNotFound {
        package: package.to_string(),
        path: sub_path.to_string(),
        tried,
    };
    let found = |path: ModulePath| -> Result<Option<ModuleFile>, ResolveError> {
        if let Some(ambiguity) = index.ambiguity_along(&path) {
            return Err(index.ambiguity_error(ambiguity));
        }
        Ok(index.file(&path).map(|file| ModuleFile {
            key: ModuleKey::new(package, path.clone()),
            file: file.to_path_buf(),
        }))
    };

    if let Some(ambiguity) = index.ambiguity_along(sub_path) {
        return Err(index.ambiguity_error(ambiguity));
    }
    if has_suffix {
        if let Some(ambiguity) = index.ambiguity(&sub_path.without_extension()) {
            return Err(index.ambiguity_error(ambiguity));
        }
    }

    // 1. explicit suffix
    if has_suffix {
        tracing::debug!("{}: probing exactly {}", package, sub_path);
        return found(sub_path.clone())?.ok_or_else(|| not_found(vec![sub_path.to_string()]));
    }

    // 2. module manifest, deepest first
    for dir in sub_path.ancestors() {
        let Some(manifest) = index.module_manifest(&dir) else {
            continue;
        };
        let manifest = manifest?;
        let manifest_path = dir.join(MODULE_MANIFEST);
        let key = sub_path.strip_prefix(&dir).unwrap_or_default();
        tracing::debug!("{}: {} governs `{}` (key `{}`)", package, manifest_path, sub_path, key);

        let Some(target) = manifest.entry(&key) else {
            return Err(not_found(vec![format!("`{}` in {}", key, manifest_path)]));
        };
        let Some(target_path) = dir.join_relative(target) else {
            return Err(not_found(vec![format!("{} (outside the source root)", target)]));
        };
        return found(target_path.clone())?.ok_or_else(|| not_found(vec![target_path.to_string()]));
    }

    let mut tried = Vec::new();

    // 3. directory entry file
    for ext in extensions {
        let candidate = sub_path.join(DIRECTORY_ENTRY).with_extension(ext);
        tracing::debug!("{}: probing {}", package, candidate);
        if let Some(file) = found(candidate.clone())? {
            return Ok(file);
        }
        tried.push(candidate.to_string());
    }

    // 4. sibling file
    if !request.dir_only && !sub_path.is_root() {
        for ext in extensions {
            let candidate = sub_path.with_extension(ext);
            tracing::debug!("{}: probing {}", package, candidate);
            if let Some(file) = found(candidate.clone())? {
                return Ok(file);
            }
            tried.push(candidate.to_string());
        }
    }

    Err(not_found(tried))
}
