//! Single module lookups.

use crate::core::module::{ModuleFile, ModuleKey};
use crate::core::path::ModulePath;
use crate::core::PackageOrigin;
use crate::resolver::{ResolveError, Session};

/// The root module of the first workspace member.
pub fn default_requester(session: &Session) -> Option<ModuleKey> {
    let first = session.workspace().members().first()?;
    session
        .registry()
        .packages()
        .find(|p| p.origin() == PackageOrigin::Member && p.root() == first.as_path())
        .map(|p| ModuleKey::new(p.package_id(), ModulePath::root()))
}

/// Locate `spec` as seen from `from` (`<package>/<module path>`), or from the
/// first workspace member when `from` is not given.
pub fn locate_module(session: &Session, spec: &str, from: Option<&str>) -> Result<ModuleFile, ResolveError> {
    let requester = match from {
        Some(raw) => session.module_key(raw)?,
        None => default_requester(session).ok_or_else(|| ResolveError::UnresolvedPackage {
            package: "@self".to_string(),
            requested_by: None,
        })?,
    };
    tracing::debug!("locating `{}` from {}", spec, requester);
    session.locate(spec, &requester)
}
