//! `weave.toml` loading.
//!
//! Lookup order: the path in `WEAVE_CONFIG` (must exist), then `./weave.toml`, then defaults.
//! Relative paths inside a config file resolve against the file's directory.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use weave_analyzer::cache::default_cache_file;
use weave_registry::{ExtensionsConfig, LedgerMode};

pub const CONFIG_FILE: &str = "weave.toml";
pub const CONFIG_ENV: &str = "WEAVE_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("reading {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("parsing {path}: {source}")]
	Parse {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
	/// Dependency lock artifact whose hash invalidates the analyzer cache.
	pub lock_file: PathBuf,
	/// Analyzer cache file. `None` uses the temp-directory default.
	pub cache_file: Option<PathBuf>,
	/// Unit wrapper records. `None` keeps materialization in memory.
	pub wrapper_dir: Option<PathBuf>,
	/// Root under which namespace directories are generated.
	pub output_dir: PathBuf,
	pub ledger: LedgerMode,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			lock_file: PathBuf::from("Cargo.lock"),
			cache_file: None,
			wrapper_dir: None,
			output_dir: PathBuf::from("target/weave/analyzers"),
			ledger: LedgerMode::Enabled,
		}
	}
}

impl Config {
	/// Reads the config from `WEAVE_CONFIG` or the current directory.
	pub fn discover() -> Result<Self, ConfigError> {
		let cwd = env::current_dir().map_err(|source| ConfigError::Io {
			path: PathBuf::from("."),
			source,
		})?;
		Self::discover_from(env::var_os(CONFIG_ENV).map(PathBuf::from), &cwd)
	}

	/// [`Config::discover`] with the environment and working directory supplied.
	pub fn discover_from(explicit: Option<PathBuf>, cwd: &Path) -> Result<Self, ConfigError> {
		if let Some(path) = explicit {
			return Self::load(&cwd.join(path));
		}
		let local = cwd.join(CONFIG_FILE);
		if local.is_file() {
			return Self::load(&local);
		}
		Ok(Self::default())
	}

	pub fn load(path: &Path) -> Result<Self, ConfigError> {
		let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
			path: path.to_path_buf(),
			source,
		})?;
		let config: Self = toml::from_str(&text).map_err(|source| ConfigError::Parse {
			path: path.to_path_buf(),
			source,
		})?;
		let base = path.parent().unwrap_or(Path::new("."));
		Ok(config.relative_to(base))
	}

	fn relative_to(self, base: &Path) -> Self {
		let resolve = |p: PathBuf| if p.is_absolute() { p } else { base.join(p) };
		Self {
			lock_file: resolve(self.lock_file),
			cache_file: self.cache_file.map(resolve),
			wrapper_dir: self.wrapper_dir.map(resolve),
			output_dir: resolve(self.output_dir),
			ledger: self.ledger,
		}
	}

	pub fn cache_file(&self) -> PathBuf {
		self.cache_file.clone().unwrap_or_else(default_cache_file)
	}

	pub fn extensions(&self) -> ExtensionsConfig {
		ExtensionsConfig {
			wrapper_dir: self.wrapper_dir.clone(),
			ledger: self.ledger,
		}
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn test_defaults_without_file() {
		let dir = tempfile::tempdir().unwrap();
		let config = Config::discover_from(None, dir.path()).unwrap();
		assert_eq!(config, Config::default());
		assert_eq!(config.cache_file(), default_cache_file());
	}

	#[test]
	fn test_local_file_resolves_relative_paths() {
		let dir = tempfile::tempdir().unwrap();
		fs::write(
			dir.path().join(CONFIG_FILE),
			"lock_file = \"deps.lock\"\nwrapper_dir = \"/abs/wrappers\"\nledger = \"disabled\"\n",
		)
		.unwrap();

		let config = Config::discover_from(None, dir.path()).unwrap();

		assert_eq!(config.lock_file, dir.path().join("deps.lock"));
		assert_eq!(config.wrapper_dir, Some(PathBuf::from("/abs/wrappers")));
		assert_eq!(config.output_dir, dir.path().join("target/weave/analyzers"));
		assert_eq!(config.extensions().ledger, LedgerMode::Disabled);
	}

	#[test]
	fn test_explicit_path_must_exist() {
		let dir = tempfile::tempdir().unwrap();
		let err = Config::discover_from(Some(PathBuf::from("missing.toml")), dir.path()).unwrap_err();
		assert!(matches!(err, ConfigError::Io { .. }));
	}

	#[test]
	fn test_unknown_keys_rejected() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("custom.toml");
		fs::write(&path, "lockfile = \"x\"\n").unwrap();

		let err = Config::discover_from(Some(path), dir.path()).unwrap_err();
		assert!(matches!(err, ConfigError::Parse { .. }));
	}
}
