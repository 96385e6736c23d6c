//! Configuration file support.
//!
//! Two configuration file locations are read:
//! - Global: `~/.lume/config.toml` - User-wide defaults
//! - Project: `<workspace>/.lume/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config, field by field.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Resolver configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Local directory registry for external dependencies
    pub registry: RegistryConfig,

    /// Built-in packages keyed by package identifier (e.g. `@std`)
    pub builtins: BTreeMap<String, BuiltinConfig>,

    /// Resolution settings
    pub resolve: ResolveSettings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Root of the directory registry
    pub path: Option<PathBuf>,
}

/// A built-in package: sources live directly under `path`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltinConfig {
    pub path: PathBuf,

    #[serde(default = "default_builtin_version")]
    pub version: String,
}

fn default_builtin_version() -> String {
    "0.0.0".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ResolveSettings {
    /// Worker threads (None or 0 = rayon default)
    pub jobs: Option<usize>,

    /// Recognized source-file suffixes, without the dot
    pub source_extensions: Option<Vec<String>>,
}

/// Extension used when none is configured.
pub const DEFAULT_SOURCE_EXTENSION: &str = "lume";

impl ResolverConfig {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        let mut config: ResolverConfig = toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;

        // Relative paths are relative to the directory holding `.lume/`
        if let Some(base) = path.parent().and_then(Path::parent) {
            config.rebase(base);
        }
        Ok(config)
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    fn rebase(&mut self, base: &Path) {
        if let Some(path) = &self.registry.path {
            self.registry.path = Some(base.join(path));
        }
        for builtin in self.builtins.values_mut() {
            builtin.path = base.join(&builtin.path);
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: ResolverConfig) {
        if other.registry.path.is_some() {
            self.registry.path = other.registry.path;
        }

        // Built-ins merge per identifier
        for (id, builtin) in other.builtins {
            self.builtins.insert(id, builtin);
        }

        if other.resolve.jobs.is_some() {
            self.resolve.jobs = other.resolve.jobs;
        }
        if other.resolve.source_extensions.is_some() {
            self.resolve.source_extensions = other.resolve.source_extensions;
        }
    }

    /// Recognized source-file suffixes, lowercased.
    pub fn source_extensions(&self) -> Vec<String> {
        match &self.resolve.source_extensions {
            Some(exts) if !exts.is_empty() => exts
                .iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
            _ => vec![DEFAULT_SOURCE_EXTENSION.to_string()],
        }
    }

    /// Worker thread count, if one was requested.
    pub fn jobs(&self) -> Option<usize> {
        self.resolve.jobs.filter(|&j| j > 0)
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.lume/config.toml)
/// 2. Global config (~/.lume/config.toml)
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> ResolverConfig {
    let mut config = ResolverConfig::default();

    if let Some(global_path) = global_path {
        if global_path.exists() {
            config.merge(ResolverConfig::load_or_default(global_path));
        }
    }

    if project_path.exists() {
        config.merge(ResolverConfig::load_or_default(project_path));
    }

    config
}

/// Get the global config directory (~/.lume).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".lume"))
}

/// Get the global config path (~/.lume/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (.lume/config.toml).
pub fn project_config_path(workspace_root: &Path) -> PathBuf {
    workspace_root.join(".lume").join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = ResolverConfig::default();
        assert!(config.registry.path.is_none());
        assert!(config.builtins.is_empty());
        assert_eq!(config.source_extensions(), vec!["lume"]);
        assert_eq!(config.jobs(), None);
    }

    #[test]
    fn test_config_load() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join(".lume").join("config.toml");
        std::fs::create_dir_all(config_path.parent().unwrap()).unwrap();

        std::fs::write(
            &config_path,
            r#"
[registry]
path = "vendor/registry"

[builtins."@std"]
path = "toolchain/std"
version = "0.3.0"

[resolve]
jobs = 8
source-extensions = [".Lume", "lm"]
"#,
        )
        .unwrap();

        let config = ResolverConfig::load(&config_path).unwrap();
        assert_eq!(config.registry.path, Some(tmp.path().join("vendor/registry")));
        assert_eq!(config.builtins["@std"].path, tmp.path().join("toolchain/std"));
        assert_eq!(config.builtins["@std"].version, "0.3.0");
        assert_eq!(config.jobs(), Some(8));
        assert_eq!(config.source_extensions(), vec!["lume", "lm"]);
    }

    #[test]
    fn test_config_merge() {
        let mut base = ResolverConfig::default();
        base.registry.path = Some(PathBuf::from("/global/registry"));
        base.resolve.jobs = Some(4);

        let mut override_cfg = ResolverConfig::default();
        override_cfg.registry.path = Some(PathBuf::from("/project/registry"));

        base.merge(override_cfg);

        assert_eq!(base.registry.path, Some(PathBuf::from("/project/registry")));
        assert_eq!(base.resolve.jobs, Some(4)); // Not overridden
    }

    #[test]
    fn test_load_config_precedence() {
        let tmp = TempDir::new().unwrap();
        let global_path = tmp.path().join("home/.lume/config.toml");
        let project_path = tmp.path().join("ws/.lume/config.toml");
        std::fs::create_dir_all(global_path.parent().unwrap()).unwrap();
        std::fs::create_dir_all(project_path.parent().unwrap()).unwrap();

        std::fs::write(&global_path, "[resolve]\njobs = 2\nsource-extensions = [\"lm\"]\n").unwrap();
        std::fs::write(&project_path, "[resolve]\njobs = 6\n").unwrap();

        let config = load_config(Some(&global_path), &project_path);
        assert_eq!(config.jobs(), Some(6));
        assert_eq!(config.source_extensions(), vec!["lm"]);
    }

    #[test]
    fn test_missing_files_mean_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(None, &tmp.path().join("nope.toml"));
        assert!(config.registry.path.is_none());
    }
}
