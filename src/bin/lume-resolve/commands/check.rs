//! `lume-resolve check` command

use anyhow::Result;

use crate::cli::{CheckArgs, GlobalArgs};
use crate::commands::{fail, use_color, workspace_config};
use lume_resolve::ops::{check, format_report, CheckOptions};

pub fn execute(args: CheckArgs, global: &GlobalArgs) -> Result<()> {
    let (root, config) = workspace_config(global)?;

    let options = CheckOptions {
        root,
        config,
        declarations: args.decls.map(|p| lume_resolve::util::fs::normalize_path(&p)),
    };

    let report = match check(&options) {
        Ok(report) => report,
        Err(e) => return fail(&e, global),
    };

    eprint!("{}", format_report(&report, use_color(global)));

    // Exit with error code if anything failed to resolve
    if !report.is_ok() {
        std::process::exit(1);
    }

    Ok(())
}
