//! Package identification - `[@scope/]name`.
//!
//! PackageIds are interned for the life of the process, so copies are free
//! and equality is a pointer comparison. Both parts are normalized the same
//! way module paths are, so `@Acme/Json` and `@acme/json` are one package.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::LazyLock;

use parking_lot::RwLock;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::core::path::normalize_segment;

/// Reserved scope that stands for the requesting package.
pub const SELF_SCOPE: &str = "@self";

/// Global package ID interner, keyed by the canonical `@scope/name` text.
static PACKAGE_INTERNER: LazyLock<RwLock<HashMap<Box<str>, &'static PackageIdInner>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

/// A unique package identifier (interned).
#[derive(Clone, Copy)]
pub struct PackageId {
    inner: &'static PackageIdInner,
}

#[derive(Debug)]
struct PackageIdInner {
    scope: Option<Box<str>>,
    name: Box<str>,
    repr: Box<str>,
}

/// A package identifier that could not be parsed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid package identifier `{raw}`: {reason}")]
pub struct InvalidPackageId {
    pub raw: String,
    pub reason: &'static str,
}

impl PackageId {
    /// Create a package ID from an optional scope (with or without `@`) and a name.
    pub fn new(scope: Option<&str>, name: &str) -> Result<Self, InvalidPackageId> {
        let invalid = |reason| InvalidPackageId {
            raw: match scope {
                Some(s) => format!("@{}/{}", s.trim_start_matches('@'), name),
                None => name.to_string(),
            },
            reason,
        };

        let name = normalize_segment(name.trim());
        validate_part(&name).map_err(invalid)?;

        let scope = match scope {
            Some(s) => {
                let s = normalize_segment(s.trim().trim_start_matches('@'));
                validate_part(&s).map_err(invalid)?;
                Some(s)
            }
            None => None,
        };

        let repr = match &scope {
            Some(s) => format!("@{}/{}", s, name),
            None => name.clone(),
        };

        Ok(Self::intern(scope, name, repr))
    }

    /// Parse `name` or `@scope/name`.
    pub fn parse(raw: &str) -> Result<Self, InvalidPackageId> {
        let invalid = |reason| InvalidPackageId {
            raw: raw.to_string(),
            reason,
        };

        if let Some(rest) = raw.strip_prefix('@') {
            match rest.split_once('/') {
                Some((scope, name)) => {
                    if name.contains('/') {
                        return Err(invalid("identifier has more than two segments"));
                    }
                    PackageId::new(Some(scope), name)
                }
                None => PackageId::scope_only(rest),
            }
        } else {
            if raw.contains('/') {
                return Err(invalid("unscoped identifier cannot contain `/`"));
            }
            PackageId::new(None, raw)
        }
    }

    /// A bare scope identifier such as `@std`. Its name keeps the `@`.
    pub fn scope_only(scope: &str) -> Result<Self, InvalidPackageId> {
        let part = normalize_segment(scope.trim().trim_start_matches('@'));
        validate_part(&part).map_err(|reason| InvalidPackageId {
            raw: format!("@{}", scope),
            reason,
        })?;
        let repr = format!("@{}", part);
        Ok(Self::intern(None, repr.clone(), repr))
    }

    fn intern(scope: Option<String>, name: String, repr: String) -> Self {
        // Fast path: already interned
        if let Some(&interned) = PACKAGE_INTERNER.read().get(repr.as_str()) {
            return PackageId { inner: interned };
        }

        let mut interner = PACKAGE_INTERNER.write();
        if let Some(&interned) = interner.get(repr.as_str()) {
            return PackageId { inner: interned };
        }

        let leaked: &'static PackageIdInner = Box::leak(Box::new(PackageIdInner {
            scope: scope.map(String::into_boxed_str),
            name: name.into_boxed_str(),
            repr: repr.clone().into_boxed_str(),
        }));
        interner.insert(repr.into_boxed_str(), leaked);

        PackageId { inner: leaked }
    }

    /// The scope without the leading `@`, if any.
    pub fn scope(&self) -> Option<&'static str> {
        self.inner.scope.as_deref()
    }

    /// The package name (`@std` for scope-only identifiers).
    pub fn name(&self) -> &'static str {
        &self.inner.name
    }

    /// Canonical `@scope/name` text.
    pub fn as_str(&self) -> &'static str {
        &self.inner.repr
    }

    /// Whether this is the reserved `@self` placeholder scope.
    pub fn is_self_scope(raw: &str) -> bool {
        raw == SELF_SCOPE || raw.starts_with("@self/")
    }
}

fn validate_part(part: &str) -> Result<(), &'static str> {
    if part.is_empty() {
        return Err("empty segment");
    }
    if part.chars().any(|c| c.is_whitespace() || c == '/' || c == '\\') {
        return Err("segment contains whitespace or a path separator");
    }
    if part.starts_with('@') {
        return Err("`@` is only allowed as the scope prefix");
    }
    if part == "self" {
        return Err("`self` is reserved");
    }
    if part == "." || part == ".." {
        return Err("segment cannot be `.` or `..`");
    }
    Ok(())
}

impl PartialEq for PackageId {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.inner, other.inner)
    }
}

impl Eq for PackageId {}

impl Hash for PackageId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(self.inner, state)
    }
}

impl PartialOrd for PackageId {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PackageId {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.inner.repr.cmp(&other.inner.repr)
    }
}

impl fmt::Debug for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PackageId({})", self.inner.repr)
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inner.repr)
    }
}

impl Serialize for PackageId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for PackageId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        PackageId::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_id_interning() {
        let a = PackageId::parse("@acme/json").unwrap();
        let b = PackageId::new(Some("acme"), "json").unwrap();
        let c = PackageId::new(Some("@acme"), "json").unwrap();

        assert_eq!(a, b);
        assert_eq!(a, c);
        assert!(std::ptr::eq(a.inner, b.inner));
    }

    #[test]
    fn test_package_id_normalized() {
        let a = PackageId::parse("@Acme/JSON").unwrap();
        let b = PackageId::parse("@acme/json").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "@acme/json");
    }

    #[test]
    fn test_unscoped() {
        let id = PackageId::parse("strings").unwrap();
        assert_eq!(id.scope(), None);
        assert_eq!(id.name(), "strings");
        assert_eq!(id.to_string(), "strings");
    }

    #[test]
    fn test_invalid_ids() {
        assert!(PackageId::parse("@self").is_err());
        assert!(PackageId::parse("@acme/").is_err());
        assert!(PackageId::parse("@acme/a/b").is_err());
        assert!(PackageId::parse("a/b").is_err());
        assert!(PackageId::parse("").is_err());
        assert!(PackageId::parse("@self/x").is_err());
    }

    #[test]
    fn test_scope_only() {
        let id = PackageId::parse("@std").unwrap();
        assert_eq!(id.as_str(), "@std");
        assert_eq!(id.scope(), None);
        assert_ne!(id, PackageId::parse("std").unwrap());
    }

    #[test]
    fn test_ordering() {
        let a = PackageId::parse("@acme/a").unwrap();
        let b = PackageId::parse("@acme/b").unwrap();
        let c = PackageId::parse("zeta").unwrap();
        assert!(a < b);
        assert!(b < c);
    }
}
