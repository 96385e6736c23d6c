//! Import path classification.
//!
//! Pure string inspection: nothing here touches the registry or the
//! filesystem. A package path whose identifier is unknown is not a
//! classification error; the registry lookup reports it.

use crate::core::package_id::SELF_SCOPE;

/// The three kinds of import path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportPath<'a> {
    /// `./x`, `../x`: against the requester's directory, same package.
    Relative(&'a str),

    /// `@self/x`: the requester's own package, from its source root.
    SelfScoped(&'a str),

    /// `name/x`, `@scope/name/x`, `@scope/x`.
    Package {
        /// The identifier candidate, e.g. `@acme/json`
        package: &'a str,
        sub_path: &'a str,
        /// For `@scope/x/...`, the scope-only reading (`@scope` + `x/...`),
        /// consulted when the two-segment identifier is not registered.
        fallback: Option<(&'a str, &'a str)>,
    },
}

/// Classify a raw import string.
pub fn classify(raw: &str) -> ImportPath<'_> {
    if raw == "." || raw == ".." || raw.starts_with("./") || raw.starts_with("../") {
        return ImportPath::Relative(raw);
    }

    if raw == SELF_SCOPE {
        return ImportPath::SelfScoped("");
    }
    if let Some(rest) = raw.strip_prefix(SELF_SCOPE).and_then(|r| r.strip_prefix('/')) {
        return ImportPath::SelfScoped(rest);
    }

    if raw.starts_with('@') {
        let (scope, rest) = split_first(raw);
        if rest.is_empty() {
            return ImportPath::Package {
                package: scope,
                sub_path: "",
                fallback: None,
            };
        }

        let (name, sub_path) = split_first(rest);
        // `@scope/name` as one slice of `raw`
        let package = &raw[..scope.len() + 1 + name.len()];
        return ImportPath::Package {
            package,
            sub_path,
            fallback: Some((scope, rest)),
        };
    }

    let (package, sub_path) = split_first(raw);
    ImportPath::Package {
        package,
        sub_path,
        fallback: None,
    }
}

/// Split at the first `/`: `a/b/c` -> (`a`, `b/c`), `a` -> (`a`, ``).
fn split_first(raw: &str) -> (&str, &str) {
    match raw.split_once('/') {
        Some((head, tail)) => (head, tail),
        None => (raw, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative() {
        assert_eq!(classify("./util"), ImportPath::Relative("./util"));
        assert_eq!(classify("../shared/x"), ImportPath::Relative("../shared/x"));
        assert_eq!(classify(".."), ImportPath::Relative(".."));
    }

    #[test]
    fn test_self_scoped() {
        assert_eq!(classify("@self/Utils"), ImportPath::SelfScoped("Utils"));
        assert_eq!(classify("@self"), ImportPath::SelfScoped(""));
        // `@selfish` is an ordinary scope
        assert!(matches!(classify("@selfish/x"), ImportPath::Package { .. }));
    }

    #[test]
    fn test_scoped_package() {
        assert_eq!(
            classify("@acme/json/parse/"),
            ImportPath::Package {
                package: "@acme/json",
                sub_path: "parse/",
                fallback: Some(("@acme", "json/parse/")),
            }
        );
        assert_eq!(
            classify("@std"),
            ImportPath::Package {
                package: "@std",
                sub_path: "",
                fallback: None,
            }
        );
    }

    #[test]
    fn test_bare_first_segment_is_a_package() {
        // never a local directory
        assert_eq!(
            classify("utils/strings"),
            ImportPath::Package {
                package: "utils",
                sub_path: "strings",
                fallback: None,
            }
        );
    }
}
