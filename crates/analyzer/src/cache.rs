//! Persistent fingerprint set deciding when analyzer artifacts are stale.
//!
//! # Role
//!
//! [`DirtyCache::is_dirty`] answers "has this fingerprint been seen since the dependency lock
//! last changed?". The lock artifact's hash acts as an indicator: when it changes, every
//! previously seen fingerprint is forgotten.
//!
//! # Invariants
//!
//! - The file is a single JSON array of strings, rewritten whole on each mutation.
//!   - Enforced in: [`DirtyCache::persist`] (temp file + atomic rename).
//! - A persistence fault never turns a dirty answer into a clean one.
//!   - Enforced in: [`DirtyCache::degrade`]; once degraded, every query answers dirty.
//! - A missing lock artifact answers dirty without touching storage.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use indexmap::IndexSet;
use tempfile::NamedTempFile;
use tracing::{debug, warn};
use weave_registry::fingerprint::hash_file;

use crate::CacheError;

pub const CACHE_FILE_NAME: &str = "analyzer-actions-cache.json";

/// Default cache location under the system temporary directory.
pub fn default_cache_file() -> PathBuf {
	std::env::temp_dir().join("weave").join(CACHE_FILE_NAME)
}

#[derive(Debug)]
pub struct DirtyCache {
	file: PathBuf,
	lock_file: PathBuf,
	storage: Option<IndexSet<String>>,
	degraded: bool,
}

impl DirtyCache {
	/// Cache persisted at `file`, invalidated whenever `lock_file` changes.
	pub fn new(file: impl Into<PathBuf>, lock_file: impl Into<PathBuf>) -> Self {
		Self {
			file: file.into(),
			lock_file: lock_file.into(),
			storage: None,
			degraded: false,
		}
	}

	pub fn path(&self) -> &Path {
		&self.file
	}

	pub fn lock_file(&self) -> &Path {
		&self.lock_file
	}

	/// True once a persistence fault has forced the cache into always-dirty mode.
	pub fn is_degraded(&self) -> bool {
		self.degraded
	}

	/// Returns true if `fingerprint` is new, recording it as seen.
	pub fn is_dirty(&mut self, fingerprint: &str) -> bool {
		let indicator = match hash_file(&self.lock_file) {
			Ok(hash) => hash,
			Err(error) => {
				debug!(lock_file = %self.lock_file.display(), %error, "lock artifact unavailable");
				return true;
			}
		};
		if self.degraded {
			return true;
		}

		match self.check(&indicator, fingerprint) {
			Ok(dirty) => dirty,
			Err(error) => self.degrade(error),
		}
	}

	fn check(&mut self, indicator: &str, fingerprint: &str) -> Result<bool, CacheError> {
		if !self.storage()?.contains(indicator) {
			debug!(%indicator, "lock artifact changed; flushing cache");
			self.flush()?;
			self.synchronize(indicator)?;
		}

		if self.storage()?.contains(fingerprint) {
			return Ok(false);
		}
		self.synchronize(fingerprint)?;
		Ok(true)
	}

	/// True if `fingerprint` is currently recorded. Does not check the indicator.
	pub fn contains(&mut self, fingerprint: &str) -> Result<bool, CacheError> {
		Ok(self.storage()?.contains(fingerprint))
	}

	/// Removes `fingerprint` so the next check reports it dirty again.
	pub fn forget(&mut self, fingerprint: &str) -> Result<(), CacheError> {
		if self.storage()?.shift_remove(fingerprint) {
			self.persist()?;
		}
		Ok(())
	}

	/// Deletes the cache file and empties the in-memory mirror.
	pub fn flush(&mut self) -> Result<(), CacheError> {
		self.storage = Some(IndexSet::new());
		match fs::remove_file(&self.file) {
			Ok(()) => Ok(()),
			Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
			Err(source) => Err(CacheError::Io {
				path: self.file.clone(),
				source,
			}),
		}
	}

	fn synchronize(&mut self, value: &str) -> Result<(), CacheError> {
		self.storage()?.insert(value.to_string());
		self.persist()
	}

	fn storage(&mut self) -> Result<&mut IndexSet<String>, CacheError> {
		if self.storage.is_none() {
			let hydrated = self.hydrate()?;
			self.storage = Some(hydrated);
		}
		Ok(self.storage.get_or_insert_default())
	}

	fn hydrate(&mut self) -> Result<IndexSet<String>, CacheError> {
		let bytes = match fs::read(&self.file) {
			Ok(bytes) => bytes,
			Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(IndexSet::new()),
			Err(source) => {
				return Err(CacheError::Io {
					path: self.file.clone(),
					source,
				});
			}
		};
		match serde_json::from_slice::<Vec<String>>(&bytes) {
			Ok(values) => Ok(values.into_iter().collect()),
			Err(source) => {
				let error = CacheError::Json {
					path: self.file.clone(),
					source,
				};
				warn!(%error, "discarding unreadable cache file");
				self.flush()?;
				Ok(IndexSet::new())
			}
		}
	}

	fn persist(&self) -> Result<(), CacheError> {
		let io_err = |source| CacheError::Io {
			path: self.file.clone(),
			source,
		};
		let values: Vec<&str> = self
			.storage
			.iter()
			.flatten()
			.map(String::as_str)
			.collect();
		let dir = self.file.parent().unwrap_or(Path::new("."));
		fs::create_dir_all(dir).map_err(io_err)?;

		let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
		serde_json::to_writer(&mut tmp, &values).map_err(|source| CacheError::Json {
			path: self.file.clone(),
			source,
		})?;
		tmp.flush().map_err(io_err)?;
		tmp.persist(&self.file).map_err(|e| io_err(e.error))?;
		Ok(())
	}

	fn degrade(&mut self, error: CacheError) -> bool {
		warn!(%error, "analyzer cache degraded; artifacts will always regenerate");
		self.degraded = true;
		true
	}
}

#[cfg(test)]
mod tests;
