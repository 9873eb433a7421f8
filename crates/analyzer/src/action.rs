//! Analyzer bootstrap action: regenerate artifacts only when they are stale.
//!
//! Artifacts are stale when the ledger, the namespace or the output directory differ from the
//! last successful run, or when the namespace index is missing on disk.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use weave_registry::RegistrationLedger;
use weave_registry::fingerprint::hash_bytes;

use crate::generate::{GenerationReport, INDEX_FILE, Namespace, generate};
use crate::reflection::ReflectionBridge;
use crate::{DirtyCache, GenerateError};

#[derive(Debug)]
pub struct AnalyzerAction<'a> {
	ledger: &'a RegistrationLedger,
	cache: DirtyCache,
	namespace: Namespace,
	output_dir: PathBuf,
}

impl<'a> AnalyzerAction<'a> {
	pub fn new(
		ledger: &'a RegistrationLedger,
		cache: DirtyCache,
		namespace: Namespace,
		output_dir: impl Into<PathBuf>,
	) -> Self {
		Self {
			ledger,
			cache,
			namespace,
			output_dir: output_dir.into(),
		}
	}

	pub fn namespace(&self) -> &Namespace {
		&self.namespace
	}

	pub fn output_dir(&self) -> &Path {
		&self.output_dir
	}

	pub fn cache(&self) -> &DirtyCache {
		&self.cache
	}

	/// Identity of the artifacts this action would write: ledger content, namespace and
	/// output directory.
	pub fn fingerprint(&self) -> String {
		hash_bytes(format!(
			"{}\0{}\0{}",
			self.ledger.fingerprint(),
			self.namespace,
			self.output_dir.display()
		))
	}

	fn index_path(&self) -> PathBuf {
		self.output_dir
			.join(self.namespace.as_path())
			.join(INDEX_FILE)
	}

	/// True when [`Self::fingerprint`] has not been generated since the last lock change, or
	/// the index is missing.
	///
	/// Marks the fingerprint as seen.
	pub fn due(&mut self) -> bool {
		let fingerprint = self.fingerprint();
		self.check(&fingerprint)
	}

	fn check(&mut self, fingerprint: &str) -> bool {
		let dirty = self.cache.is_dirty(fingerprint);
		dirty || !self.index_path().is_file()
	}

	/// Generates unconditionally.
	pub fn run(&self) -> Result<GenerationReport, GenerateError> {
		generate(
			&ReflectionBridge::new(self.ledger),
			&self.namespace,
			&self.output_dir,
		)
	}

	/// Generates when [`Self::due`]. A failed run un-marks the fingerprint so the next call retries.
	pub fn run_if_due(&mut self) -> Result<Option<GenerationReport>, GenerateError> {
		let fingerprint = self.fingerprint();
		if !self.check(&fingerprint) {
			debug!(namespace = %self.namespace, "analyzer artifacts up to date");
			return Ok(None);
		}
		match self.run() {
			Ok(report) => Ok(Some(report)),
			Err(error) => {
				if let Err(cache_error) = self.cache.forget(&fingerprint) {
					warn!(%cache_error, "could not un-mark failed analyzer generation");
				}
				Err(error)
			}
		}
	}
}
