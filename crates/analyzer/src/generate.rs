//! Analyzer artifact generation.
//!
//! Writes one JSON artifact per destination type plus an `_index.json` under the directory
//! derived from a [`Namespace`]. The directory is owned by the generator: stale `*.json` files
//! from a previous run are removed first, subdirectories are left alone.
//!
//! # Invariants
//!
//! - No two destinations share an artifact file, and none shares the index file.
//!   - Enforced in: `ArtifactNames::claim`; stems starting with `_` are reserved.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Serialize;
use rustc_hash::FxHashSet;
use tracing::{debug, info};
use weave_registry::fingerprint::hash_bytes;

use crate::GenerateError;
use crate::reflection::{MethodDescriptor, ReflectionBridge};

pub const INDEX_FILE: &str = "_index.json";

/// `::`-separated identifier path naming where artifacts land, e.g. `App::Analyzers`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace {
	segments: Vec<String>,
}

impl Namespace {
	/// Parses `App::Analyzers`. A backslash is accepted as an alternative separator.
	pub fn parse(raw: &str) -> Result<Self, GenerateError> {
		let invalid = |reason| GenerateError::Namespace {
			namespace: raw.to_string(),
			reason,
		};
		let trimmed = raw.trim().trim_matches(|c: char| c == '\\' || c == ':');
		if trimmed.is_empty() {
			return Err(invalid("namespace is empty"));
		}

		let normalized = trimmed.replace('\\', "::");
		let segments: Vec<String> = normalized.split("::").map(str::to_string).collect();
		for segment in &segments {
			if segment.is_empty() {
				return Err(invalid("empty segment"));
			}
			if !is_identifier(segment) {
				return Err(invalid("segments must be identifiers"));
			}
		}
		Ok(Self { segments })
	}

	pub fn segments(&self) -> &[String] {
		&self.segments
	}

	/// Relative directory for this namespace, one component per segment.
	pub fn as_path(&self) -> PathBuf {
		self.segments.iter().collect()
	}
}

impl fmt::Display for Namespace {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.segments.join("::"))
	}
}

impl FromStr for Namespace {
	type Err = GenerateError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::parse(s)
	}
}

fn is_identifier(s: &str) -> bool {
	let mut chars = s.chars();
	chars
		.next()
		.is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
		&& chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Outcome of one [`generate`] run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationReport {
	pub directory: PathBuf,
	/// Per-destination artifacts, in destination order. Excludes the index.
	pub files: Vec<PathBuf>,
	pub methods: usize,
	/// Ledger fingerprint the artifacts were generated from.
	pub fingerprint: String,
}

#[derive(Serialize)]
struct DestinationArtifact<'a> {
	namespace: String,
	destination: &'a str,
	methods: &'a [MethodDescriptor],
}

#[derive(Serialize)]
struct IndexEntry {
	destination: String,
	file: String,
	methods: usize,
}

#[derive(Serialize)]
struct Index {
	namespace: String,
	fingerprint: String,
	destinations: Vec<IndexEntry>,
}

/// Regenerates every artifact for `namespace` under `output_dir`.
pub fn generate(
	bridge: &ReflectionBridge<'_>,
	namespace: &Namespace,
	output_dir: &Path,
) -> Result<GenerationReport, GenerateError> {
	let directory = output_dir.join(namespace.as_path());
	clear_artifacts(&directory)?;
	fs::create_dir_all(&directory).map_err(|source| GenerateError::Io {
		path: directory.clone(),
		source,
	})?;

	let ledger = bridge.ledger();
	let fingerprint = ledger.fingerprint();
	let mut files = Vec::new();
	let mut entries = Vec::new();
	let mut names = ArtifactNames::default();
	let mut total = 0;

	for destination in ledger.destinations() {
		let methods = bridge.methods(destination.as_str());
		if methods.is_empty() {
			continue;
		}
		let file = format!("{}.json", names.claim(destination.as_str()));
		let path = directory.join(&file);
		write_json(
			&path,
			&DestinationArtifact {
				namespace: namespace.to_string(),
				destination: destination.as_str(),
				methods: &methods,
			},
		)?;
		debug!(
			destination = %destination,
			methods = methods.len(),
			path = %path.display(),
			"wrote analyzer artifact"
		);

		total += methods.len();
		entries.push(IndexEntry {
			destination: destination.to_string(),
			file,
			methods: methods.len(),
		});
		files.push(path);
	}

	write_json(
		&directory.join(INDEX_FILE),
		&Index {
			namespace: namespace.to_string(),
			fingerprint: fingerprint.clone(),
			destinations: entries,
		},
	)?;

	info!(
		namespace = %namespace,
		directory = %directory.display(),
		destinations = files.len(),
		methods = total,
		"generated analyzer artifacts"
	);
	Ok(GenerationReport {
		directory,
		files,
		methods: total,
		fingerprint,
	})
}

/// Hands out one distinct file stem per destination within a run.
#[derive(Default)]
struct ArtifactNames {
	taken: FxHashSet<String>,
}

impl ArtifactNames {
	/// The readable stem when it is free and not reserved, otherwise the stem with a
	/// destination hash suffix.
	fn claim(&mut self, destination: &str) -> String {
		let stem = artifact_stem(destination);
		let stem = if stem.starts_with('_') || self.taken.contains(&stem) {
			format!("{stem}-{}", &hash_bytes(destination)[..16])
		} else {
			stem
		};
		self.taken.insert(stem.clone());
		stem
	}
}

/// `app::Widget` becomes `app.Widget`; characters outside `[A-Za-z0-9._-]` become `_`.
fn artifact_stem(destination: &str) -> String {
	destination
		.replace("::", ".")
		.chars()
		.map(|c| {
			if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') {
				c
			} else {
				'_'
			}
		})
		.collect()
}

fn clear_artifacts(directory: &Path) -> Result<(), GenerateError> {
	let io_err = |path: &Path, source| GenerateError::Io {
		path: path.to_path_buf(),
		source,
	};
	let entries = match fs::read_dir(directory) {
		Ok(entries) => entries,
		Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
		Err(e) => return Err(io_err(directory, e)),
	};
	for entry in entries {
		let path = entry.map_err(|e| io_err(directory, e))?.path();
		if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
			fs::remove_file(&path).map_err(|e| io_err(&path, e))?;
		}
	}
	Ok(())
}

fn write_json(path: &Path, value: &impl Serialize) -> Result<(), GenerateError> {
	let mut bytes = serde_json::to_vec_pretty(value).map_err(|source| GenerateError::Json {
		path: path.to_path_buf(),
		source,
	})?;
	bytes.push(b'\n');
	fs::write(path, bytes).map_err(|source| GenerateError::Io {
		path: path.to_path_buf(),
		source,
	})
}
