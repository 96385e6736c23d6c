//! High-level operations.
//!
//! Each operation opens (or takes) a [`Session`](crate::resolver::Session)
//! and turns its results into something a command can print.

pub mod check;
pub mod locate;
pub mod packages;

pub use check::{check, format_report, CheckOptions};
pub use locate::{default_requester, locate_module};
pub use packages::{package_rows, package_tree, PackageRow};
