use std::io;
use std::path::PathBuf;

/// Dirty-cache persistence fault. Never escapes [`crate::DirtyCache::is_dirty`].
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
	#[error("cache file {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: io::Error,
	},

	#[error("cache file {path} is not a JSON string array: {source}")]
	Json {
		path: PathBuf,
		#[source]
		source: serde_json::Error,
	},
}

#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
	#[error("invalid namespace {namespace:?}: {reason}")]
	Namespace {
		namespace: String,
		reason: &'static str,
	},

	#[error("writing {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: io::Error,
	},

	#[error("serializing {path}: {source}")]
	Json {
		path: PathBuf,
		#[source]
		source: serde_json::Error,
	},
}
