//! `lume-resolve locate` command

use anyhow::Result;

use crate::cli::{GlobalArgs, LocateArgs};
use crate::commands::{fail, open_session};
use lume_resolve::ops::locate_module;
use lume_resolve::util::fs::display_relative;

pub fn execute(args: LocateArgs, global: &GlobalArgs) -> Result<()> {
    let session = open_session(global)?;

    match locate_module(&session, &args.spec, args.from.as_deref()) {
        Ok(module) => {
            println!("{}", module.key);
            println!(
                "  {}",
                display_relative(session.workspace().root(), &module.file)
            );
            Ok(())
        }
        Err(e) => fail(&e, global),
    }
}
