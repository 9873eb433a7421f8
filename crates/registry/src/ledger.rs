//! Registration ledger.
//!
//! Append-only record of every binding installed through [`crate::Extensions`]. The dispatch
//! table only remembers the winner per name; the ledger remembers every registration, in order,
//! and is what static analysis reads.

use std::fmt;

use indexmap::IndexMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::TypeName;
use crate::signature::Signature;

/// Where a binding came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum UnitSource {
	/// A composition resolved by name.
	Named(String),
	/// A live unit instance, identified by its unit name.
	Instance(String),
	/// A single handler registered without a unit.
	Handler,
}

impl fmt::Display for UnitSource {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Named(name) => write!(f, "named:{name}"),
			Self::Instance(name) => write!(f, "instance:{name}"),
			Self::Handler => write!(f, "handler"),
		}
	}
}

/// One recorded registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationBinding {
	pub destination: TypeName,
	pub name: String,
	pub signature: Signature,
	pub source: UnitSource,
	/// Ledger-wide registration order.
	pub sequence: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerMode {
	#[default]
	Enabled,
	/// Registrations install into the dispatch table only.
	Disabled,
}

#[derive(Default)]
struct Inner {
	by_destination: IndexMap<TypeName, Vec<OperationBinding>>,
	next_sequence: u64,
}

/// Destination to ordered bindings, never compacted.
pub struct RegistrationLedger {
	mode: LedgerMode,
	inner: Mutex<Inner>,
}

impl Default for RegistrationLedger {
	fn default() -> Self {
		Self::new(LedgerMode::Enabled)
	}
}

impl RegistrationLedger {
	pub fn new(mode: LedgerMode) -> Self {
		Self {
			mode,
			inner: Mutex::new(Inner::default()),
		}
	}

	pub fn mode(&self) -> LedgerMode {
		self.mode
	}

	/// Appends a binding. Returns its sequence number, or `None` when disabled.
	pub fn record(
		&self,
		destination: &TypeName,
		name: &str,
		signature: &Signature,
		source: &UnitSource,
	) -> Option<u64> {
		if self.mode == LedgerMode::Disabled {
			return None;
		}
		let mut inner = self.inner.lock();
		let sequence = inner.next_sequence;
		inner.next_sequence += 1;
		inner
			.by_destination
			.entry(destination.clone())
			.or_default()
			.push(OperationBinding {
				destination: destination.clone(),
				name: name.to_string(),
				signature: signature.clone(),
				source: source.clone(),
				sequence,
			});
		Some(sequence)
	}

	/// Every binding recorded for `destination`, oldest first.
	pub fn bindings(&self, destination: &str) -> Vec<OperationBinding> {
		self.inner
			.lock()
			.by_destination
			.get(destination)
			.cloned()
			.unwrap_or_default()
	}

	/// The most recent binding for `(destination, name)`.
	pub fn latest(&self, destination: &str, name: &str) -> Option<OperationBinding> {
		self.inner
			.lock()
			.by_destination
			.get(destination)?
			.iter()
			.rev()
			.find(|b| b.name == name)
			.cloned()
	}

	/// The most recent binding per name, ordered by each name's first registration.
	pub fn latest_bindings(&self, destination: &str) -> Vec<OperationBinding> {
		let inner = self.inner.lock();
		let Some(bindings) = inner.by_destination.get(destination) else {
			return Vec::new();
		};
		let mut latest: IndexMap<&str, &OperationBinding> = IndexMap::new();
		for binding in bindings {
			latest.insert(&binding.name, binding);
		}
		latest.into_values().cloned().collect()
	}

	/// Destinations with at least one binding, in first-registration order.
	pub fn destinations(&self) -> Vec<TypeName> {
		self.inner.lock().by_destination.keys().cloned().collect()
	}

	/// Total number of recorded bindings.
	pub fn len(&self) -> usize {
		self.inner.lock().by_destination.values().map(Vec::len).sum()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Content hash of every recorded binding, in order.
	pub fn fingerprint(&self) -> String {
		let inner = self.inner.lock();
		let mut hasher = Sha256::new();
		for (destination, bindings) in &inner.by_destination {
			for b in bindings {
				hasher.update(
					format!("{destination}\0{}\0{}\0{}\n", b.name, b.signature, b.source).as_bytes(),
				);
			}
		}
		hex::encode(hasher.finalize())
	}

	/// Drops every binding and restarts sequence numbering.
	pub fn reset(&self) {
		*self.inner.lock() = Inner::default();
	}
}

impl fmt::Debug for RegistrationLedger {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RegistrationLedger")
			.field("mode", &self.mode)
			.field("len", &self.len())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;
	use crate::signature::TypeHint;

	fn sig() -> Signature {
		Signature::new(Vec::new(), TypeHint::String)
	}

	#[test]
	fn test_latest_prefers_last_record() {
		let ledger = RegistrationLedger::default();
		let dest = TypeName::new("T");
		ledger.record(&dest, "a", &sig(), &UnitSource::Named("One".into()));
		ledger.record(&dest, "b", &sig(), &UnitSource::Handler);
		ledger.record(&dest, "a", &sig(), &UnitSource::Named("Two".into()));

		assert_eq!(ledger.len(), 3);
		let latest = ledger.latest("T", "a").unwrap();
		assert_eq!(latest.source, UnitSource::Named("Two".into()));
		assert_eq!(latest.sequence, 2);

		let names: Vec<_> = ledger
			.latest_bindings("T")
			.into_iter()
			.map(|b| (b.name, b.sequence))
			.collect();
		assert_eq!(names, vec![("a".to_string(), 2), ("b".to_string(), 1)]);
	}

	#[test]
	fn test_disabled_ledger_records_nothing() {
		let ledger = RegistrationLedger::new(LedgerMode::Disabled);
		let empty = ledger.fingerprint();
		assert_eq!(ledger.record(&"T".into(), "a", &sig(), &UnitSource::Handler), None);
		assert!(ledger.is_empty());
		assert_eq!(ledger.fingerprint(), empty);
	}

	#[test]
	fn test_fingerprint_tracks_content() {
		let ledger = RegistrationLedger::default();
		let before = ledger.fingerprint();
		ledger.record(&"T".into(), "a", &sig(), &UnitSource::Handler);
		let after = ledger.fingerprint();
		assert_ne!(before, after);
		assert_eq!(after, ledger.fingerprint());

		ledger.reset();
		assert_eq!(ledger.fingerprint(), before);
	}
}
