//! Unit materialization.
//!
//! # Role
//!
//! Turns a [`UnitRef`] into a live [`Behavior`] instance. Instances pass through untouched.
//! Named references resolve through [`Compositions`]; when a wrapper directory is configured,
//! each name also gets a [`WrapperRecord`] on disk, written once and reused by every later
//! materialization, in this process or another.
//!
//! # Invariants
//!
//! - A wrapper file is never rewritten once it exists.
//!   - Enforced in: `write_once` (`persist_noclobber`).
//! - Loading the same wrapper path twice in one process reads it once.
//!   - Enforced in: [`UnitMaterializer::load`].
//! - Any wrapper I/O failure aborts the materialization; no instance is produced.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::fingerprint::hash_bytes;
use crate::unit::{Behavior, Compositions, UnitKind, UnitRef};
use crate::MaterializeError;

/// On-disk record standing for the wrapper type of one named unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrapperRecord {
	/// The reference name this wrapper was generated for.
	pub unit: String,
	/// The composition the wrapper composes.
	pub composes: String,
	pub kind: UnitKind,
}

pub struct UnitMaterializer {
	dir: Option<PathBuf>,
	loaded: Mutex<FxHashMap<PathBuf, Arc<WrapperRecord>>>,
}

impl UnitMaterializer {
	/// Materializer that never touches disk.
	pub fn in_memory() -> Self {
		Self {
			dir: None,
			loaded: Mutex::new(FxHashMap::default()),
		}
	}

	/// Materializer that records wrappers under `dir`.
	pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
		Self {
			dir: Some(dir.into()),
			loaded: Mutex::new(FxHashMap::default()),
		}
	}

	pub fn dir(&self) -> Option<&Path> {
		self.dir.as_deref()
	}

	/// Deterministic wrapper path for a reference name.
	pub fn wrapper_path(&self, name: &str) -> Option<PathBuf> {
		let dir = self.dir.as_ref()?;
		let hash = hash_bytes(name);
		Some(dir.join(format!("{}-{}.json", sanitize(name), &hash[..16])))
	}

	/// Produces an instance for `unit`.
	///
	/// Callers must have passed `unit` through [`crate::gate::ensure_unit`].
	pub fn materialize(
		&self,
		compositions: &Compositions,
		unit: &UnitRef,
	) -> Result<Arc<dyn Behavior>, MaterializeError> {
		let name = match unit {
			UnitRef::Instance(instance) => return Ok(Arc::clone(instance)),
			UnitRef::Named(name) => name,
		};

		let composes = match self.wrapper_path(name) {
			Some(path) => self.load(compositions, name, path)?.composes.clone(),
			None => name.clone(),
		};

		compositions
			.instantiate(&composes)
			.ok_or_else(|| MaterializeError::Unresolved {
				reference: name.clone(),
			})
	}

	/// True once the wrapper for `name` has been loaded in this process.
	pub fn is_loaded(&self, name: &str) -> bool {
		self.wrapper_path(name)
			.is_some_and(|path| self.loaded.lock().contains_key(&path))
	}

	/// Deletes every wrapper file and forgets loaded records. Returns the number of files removed.
	pub fn flush(&self) -> Result<usize, MaterializeError> {
		self.loaded.lock().clear();
		let Some(dir) = &self.dir else {
			return Ok(0);
		};
		let io_err = |source| MaterializeError::Io {
			path: dir.clone(),
			source,
		};
		let entries = match fs::read_dir(dir) {
			Ok(entries) => entries,
			Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
			Err(e) => return Err(io_err(e)),
		};
		let mut removed = 0;
		for entry in entries {
			let path = entry.map_err(io_err)?.path();
			if path.extension().is_some_and(|ext| ext == "json") {
				fs::remove_file(&path).map_err(|source| MaterializeError::Io {
					path: path.clone(),
					source,
				})?;
				removed += 1;
			}
		}
		debug!(dir = %dir.display(), removed, "flushed unit wrappers");
		Ok(removed)
	}

	fn load(
		&self,
		compositions: &Compositions,
		name: &str,
		path: PathBuf,
	) -> Result<Arc<WrapperRecord>, MaterializeError> {
		if let Some(record) = self.loaded.lock().get(&path) {
			return Ok(Arc::clone(record));
		}

		if !path.exists() {
			let kind = compositions
				.kind(name)
				.ok_or_else(|| MaterializeError::Unresolved {
					reference: name.to_string(),
				})?;
			let record = WrapperRecord {
				unit: name.to_string(),
				composes: name.to_string(),
				kind,
			};
			write_once(&path, &record)?;
		}

		let bytes = fs::read(&path).map_err(|source| MaterializeError::Io {
			path: path.clone(),
			source,
		})?;
		let record: WrapperRecord =
			serde_json::from_slice(&bytes).map_err(|source| MaterializeError::Corrupt {
				path: path.clone(),
				source,
			})?;
		if record.unit != name {
			return Err(MaterializeError::Mismatch {
				path,
				expected: name.to_string(),
				found: record.unit,
			});
		}

		let mut loaded = self.loaded.lock();
		Ok(Arc::clone(
			loaded.entry(path).or_insert_with(|| Arc::new(record)),
		))
	}
}

impl Default for UnitMaterializer {
	fn default() -> Self {
		Self::in_memory()
	}
}

/// Writes `record` to `path` unless the file already exists.
///
/// A concurrent writer that got there first wins; its file is kept.
fn write_once(path: &Path, record: &WrapperRecord) -> Result<(), MaterializeError> {
	let io_err = |source| MaterializeError::Io {
		path: path.to_path_buf(),
		source,
	};
	let dir = path.parent().unwrap_or(Path::new("."));
	fs::create_dir_all(dir).map_err(io_err)?;

	let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
	serde_json::to_writer_pretty(&mut tmp, record).map_err(|e| io_err(e.into()))?;

	match tmp.persist_noclobber(path) {
		Ok(_) => {
			debug!(unit = %record.unit, path = %path.display(), "wrote unit wrapper");
			Ok(())
		}
		Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => {
			debug!(unit = %record.unit, "unit wrapper written concurrently; reusing");
			Ok(())
		}
		Err(e) => Err(io_err(e.error)),
	}
}

fn sanitize(name: &str) -> String {
	name.chars()
		.map(|c| {
			if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
				c
			} else {
				'_'
			}
		})
		.collect()
}

#[cfg(test)]
mod tests;
