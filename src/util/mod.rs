//! Shared utilities

pub mod config;
pub mod diagnostic;
pub mod fs;

pub use config::ResolverConfig;
pub use diagnostic::Diagnostic;
