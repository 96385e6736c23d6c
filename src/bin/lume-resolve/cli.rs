//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// lume-resolve - module and dependency resolution for Lume workspaces
#[derive(Parser)]
#[command(name = "lume-resolve")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Flags shared by every command.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Directory to start the workspace search from (defaults to the current directory)
    #[arg(long, global = true, value_name = "DIR")]
    pub manifest_dir: Option<PathBuf>,

    /// Directory registry holding external dependencies
    #[arg(long, global = true, env = "LUME_REGISTRY", value_name = "DIR")]
    pub registry: Option<PathBuf>,

    /// Number of worker threads
    #[arg(short, long, global = true)]
    pub jobs: Option<usize>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve every declared import and report problems
    Check(CheckArgs),

    /// Print the module file an import path resolves to
    Locate(LocateArgs),

    /// List registered packages
    Packages(PackagesArgs),
}

#[derive(Args)]
pub struct CheckArgs {
    /// JSON file with the declarations of every module
    #[arg(long, value_name = "FILE")]
    pub decls: Option<PathBuf>,
}

#[derive(Args)]
pub struct LocateArgs {
    /// Import path, e.g. `@self/util`, `./sibling` or `@acme/json/parse`
    pub spec: String,

    /// Requesting module as `<package>/<module path>` (defaults to the first member's root)
    #[arg(long, value_name = "MODULE")]
    pub from: Option<String>,
}

#[derive(Args)]
pub struct PackagesArgs {
    /// Show the dependency tree instead of a flat list
    #[arg(long)]
    pub tree: bool,
}
