//! Whole-unit resolution.
//!
//! `check` opens a session over a workspace, resolves every import the
//! declaration file lists and returns the report. Registry errors come back
//! as `Err`; everything else, including cycles, lands in the report.

use std::path::PathBuf;

use crate::core::DeclarationSet;
use crate::resolver::{ResolutionReport, ResolveError, Session};
use crate::util::config::ResolverConfig;

#[derive(Debug, Clone)]
pub struct CheckOptions {
    /// Workspace root
    pub root: PathBuf,

    pub config: ResolverConfig,

    /// JSON declaration file; without one only the package layout is checked
    pub declarations: Option<PathBuf>,
}

pub fn check(opts: &CheckOptions) -> Result<ResolutionReport, ResolveError> {
    let unit = match &opts.declarations {
        Some(path) => DeclarationSet::load(path).map_err(|e| ResolveError::manifest(Some(path.clone()), &e))?,
        None => DeclarationSet::new(),
    };

    let mut session = Session::open(&opts.root, opts.config.clone())?;
    tracing::info!(
        "checking {} module(s) in {}",
        unit.len(),
        opts.root.display()
    );
    Ok(session.resolve_unit(&unit))
}

/// Render every error and warning, then a one-line summary.
pub fn format_report(report: &ResolutionReport, color: bool) -> String {
    let mut output = String::new();

    for error in &report.errors {
        output.push_str(&error.to_diagnostic().format(color));
        output.push('\n');
    }
    for warning in &report.warnings {
        output.push_str(&warning.to_diagnostic().format(color));
        output.push('\n');
    }

    let bindings: usize = report.imports.iter().map(|i| i.bindings.len()).sum();
    output.push_str(&format!(
        "{} import(s) resolved ({} binding(s)), {} error(s), {} warning(s)\n",
        report.imports.len(),
        bindings,
        report.errors.len(),
        report.warnings.len()
    ));
    output
}
