//! Normalized module paths.
//!
//! Every path segment is Unicode-normalized (NFC) and case-folded before it
//! is compared or used as a lookup key, so the same import string resolves
//! the same way on case-sensitive and case-insensitive filesystems.

use std::fmt;
use std::path::{Component, Path};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use unicode_normalization::UnicodeNormalization;

/// Normalize a single path segment: NFC, lowercase, NFC again.
///
/// Lowercasing can produce sequences that are no longer composed, hence
/// the second pass.
pub fn normalize_segment(segment: &str) -> String {
    let composed: String = segment.nfc().collect();
    composed.to_lowercase().nfc().collect()
}

/// A normalized, `/`-separated path relative to a package source root.
///
/// The empty path addresses the source root itself.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModulePath {
    segments: Vec<String>,
}

impl ModulePath {
    /// The source root.
    pub fn root() -> Self {
        ModulePath::default()
    }

    /// Parse a `/`-separated path, normalizing every segment.
    ///
    /// Empty segments and `.` are dropped. `..` is kept verbatim; use
    /// [`ModulePath::join_relative`] to resolve it.
    pub fn parse(raw: &str) -> Self {
        let segments = raw
            .split(['/', '\\'])
            .filter(|s| !s.is_empty() && *s != ".")
            .map(normalize_segment)
            .collect();
        ModulePath { segments }
    }

    /// Build a module path from a filesystem path relative to a source root.
    pub fn from_relative(path: &Path) -> Option<Self> {
        let mut segments = Vec::new();
        for component in path.components() {
            match component {
                Component::Normal(os) => segments.push(normalize_segment(&os.to_string_lossy())),
                Component::CurDir => {}
                _ => return None,
            }
        }
        Some(ModulePath { segments })
    }

    /// Resolve a relative path (which may contain `..`) against this
    /// directory. Returns `None` if the result would climb above the root.
    pub fn join_relative(&self, relative: &str) -> Option<Self> {
        let mut segments = self.segments.clone();
        for part in relative.split(['/', '\\']) {
            match part {
                "" | "." => {}
                ".." => {
                    segments.pop()?;
                }
                other => segments.push(normalize_segment(other)),
            }
        }
        Some(ModulePath { segments })
    }

    /// Append a single (already normalized or raw) segment.
    pub fn join(&self, segment: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(normalize_segment(segment));
        ModulePath { segments }
    }

    /// Append an extension to the last segment (`foo` -> `foo.lume`).
    pub fn with_extension(&self, ext: &str) -> Self {
        let mut segments = self.segments.clone();
        if let Some(last) = segments.last_mut() {
            last.push('.');
            last.push_str(&normalize_segment(ext));
        }
        ModulePath { segments }
    }

    /// The extension of the last segment, if any.
    pub fn extension(&self) -> Option<&str> {
        let last = self.segments.last()?;
        let (stem, ext) = last.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            None
        } else {
            Some(ext)
        }
    }

    /// This path with the extension of its last segment removed.
    pub fn without_extension(&self) -> Self {
        let mut segments = self.segments.clone();
        if self.extension().is_some() {
            if let Some(last) = segments.last_mut() {
                if let Some(dot) = last.rfind('.') {
                    last.truncate(dot);
                }
            }
        }
        ModulePath { segments }
    }

    /// The containing directory; the root is its own parent.
    pub fn parent(&self) -> Self {
        let mut segments = self.segments.clone();
        segments.pop();
        ModulePath { segments }
    }

    /// Strip `prefix` from the front of this path.
    pub fn strip_prefix(&self, prefix: &ModulePath) -> Option<Self> {
        if self.segments.starts_with(&prefix.segments) {
            Some(ModulePath {
                segments: self.segments[prefix.segments.len()..].to_vec(),
            })
        } else {
            None
        }
    }

    /// This path followed by each of its ancestors, ending with the root.
    pub fn ancestors(&self) -> impl Iterator<Item = ModulePath> + '_ {
        (0..=self.segments.len())
            .rev()
            .map(move |len| ModulePath {
                segments: self.segments[..len].to_vec(),
            })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// The path as a `/`-joined string (empty for the root).
    pub fn as_string(&self) -> String {
        self.segments.join("/")
    }
}

impl fmt::Display for ModulePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            write!(f, "/")
        } else {
            write!(f, "{}", self.segments.join("/"))
        }
    }
}

impl fmt::Debug for ModulePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ModulePath({:?})", self.as_string())
    }
}

impl Serialize for ModulePath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.as_string().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ModulePath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(ModulePath::parse(&raw))
    }
}
