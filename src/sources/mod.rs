//! Package sources.
//!
//! Sources offer candidate versions of external dependencies. Network
//! access is out of scope: every source reads packages already present on
//! disk.

pub mod directory;
pub mod source;

pub use directory::DirectoryRegistry;
pub use source::Source;
