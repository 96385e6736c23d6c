//! `lume-resolve packages` command

use anyhow::Result;

use crate::cli::{GlobalArgs, PackagesArgs};
use crate::commands::open_session;
use lume_resolve::ops::{package_rows, package_tree};

pub fn execute(args: PackagesArgs, global: &GlobalArgs) -> Result<()> {
    let session = open_session(global)?;

    if args.tree {
        print!("{}", package_tree(&session));
        return Ok(());
    }

    for row in package_rows(&session) {
        let parent = row
            .parent
            .map(|p| format!(" (parent {})", p))
            .unwrap_or_default();
        println!(
            "{} v{} [{}, {}]{}",
            row.id, row.version, row.origin, row.linkage, parent
        );
    }

    Ok(())
}
