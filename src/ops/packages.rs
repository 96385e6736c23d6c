//! Package listings.

use std::collections::HashSet;
use std::fmt::Write as _;

use crate::core::manifest::Linkage;
use crate::core::{Package, PackageId, PackageOrigin};
use crate::resolver::Session;

/// One registered package, as printed by `packages`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRow {
    pub id: PackageId,
    pub version: String,
    pub origin: PackageOrigin,
    pub linkage: Linkage,
    pub parent: Option<PackageId>,
}

/// Every registered package, members first, then by identifier.
pub fn package_rows(session: &Session) -> Vec<PackageRow> {
    let mut rows: Vec<PackageRow> = session
        .registry()
        .packages()
        .map(|p| PackageRow {
            id: p.package_id(),
            version: p.version().to_string(),
            origin: p.origin(),
            linkage: p.linkage(),
            parent: p.parent(),
        })
        .collect();
    rows.sort_by(|a, b| a.origin.cmp(&b.origin).then_with(|| a.id.cmp(&b.id)));
    rows
}

/// Render the package graph: one tree per workspace member, in member order.
///
/// A package already printed higher up is marked `(*)` and not expanded again.
pub fn package_tree(session: &Session) -> String {
    let registry = session.registry();
    let mut output = String::new();
    let mut seen = HashSet::new();

    let members = session.workspace().members().iter().filter_map(|dir| {
        registry
            .packages()
            .find(|p| p.origin() == PackageOrigin::Member && p.root() == dir.as_path())
    });

    for member in members {
        render(session, member, "", None, &mut seen, &mut output);
    }

    // built-ins nobody depends on still belong to the session
    for package in registry.packages() {
        if !seen.contains(&package.package_id()) {
            render(session, package, "", None, &mut seen, &mut output);
        }
    }
    output
}

fn render(
    session: &Session,
    package: &Package,
    indent: &str,
    last: Option<bool>,
    seen: &mut HashSet<PackageId>,
    output: &mut String,
) {
    let branch = match last {
        None => "",
        Some(true) => "└── ",
        Some(false) => "├── ",
    };
    let duplicate = !seen.insert(package.package_id());
    let _ = writeln!(
        output,
        "{}{}{} v{} ({}){}",
        indent,
        branch,
        package.package_id(),
        package.version(),
        package.origin(),
        if duplicate { " (*)" } else { "" }
    );
    if duplicate {
        return;
    }

    let child_indent = match last {
        None => indent.to_string(),
        Some(true) => format!("{}    ", indent),
        Some(false) => format!("{}│   ", indent),
    };
    let deps: Vec<&Package> = package
        .dependencies()
        .keys()
        .filter_map(|id| session.registry().get(*id))
        .collect();
    for (i, dep) in deps.iter().enumerate() {
        render(session, dep, &child_indent, Some(i + 1 == deps.len()), seen, output);
    }
}
