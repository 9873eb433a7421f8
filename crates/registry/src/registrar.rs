//! Binding registrar.
//!
//! [`Extensions`] owns everything a registration touches: the type catalog, the composition
//! registry, the materializer, the dispatch table and the ledger. It is an explicit object; tests
//! build their own and call [`Extensions::reset`] between cases when sharing one.
//!
//! # Concurrency
//!
//! - **Reads:** [`Extensions::invoke`] loads a dispatch snapshot without locking.
//! - **Writes:** registrations serialize on one writer lock so the dispatch table and the ledger
//!   change together. The destination gate is re-checked under that lock, and the catalog read
//!   guard is held until the install completes.

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dispatch::{Adapter, DispatchTable, Handler};
use crate::extract::extract;
use crate::gate;
use crate::ledger::{LedgerMode, RegistrationLedger, UnitSource};
use crate::materialize::UnitMaterializer;
use crate::unit::{Compositions, Factory, UnitKind, UnitRef};
use crate::{CompositionError, DispatchError, RegisterError, TypeCatalog, TypeName, Value};

/// A named unit applied to a destination by [`Extensions::bootstrap`].
#[derive(Debug, Clone, Copy)]
pub struct MixinDef {
	pub destination: &'static str,
	pub unit: &'static str,
}

inventory::collect!(MixinDef);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExtensionsConfig {
	/// Directory for unit wrapper records. `None` keeps materialization in memory.
	pub wrapper_dir: Option<PathBuf>,
	pub ledger: LedgerMode,
}

pub struct Extensions {
	catalog: RwLock<TypeCatalog>,
	compositions: RwLock<Compositions>,
	materializer: UnitMaterializer,
	dispatch: DispatchTable,
	ledger: RegistrationLedger,
	writer: Mutex<()>,
}

impl Extensions {
	/// Empty registry: no declared types, no compositions.
	pub fn new(config: ExtensionsConfig) -> Self {
		Self::with_parts(config, TypeCatalog::new(), Compositions::new())
	}

	/// Registry seeded with every `inventory`-submitted type and composition.
	pub fn from_inventory(config: ExtensionsConfig) -> Self {
		Self::with_parts(
			config,
			TypeCatalog::from_inventory(),
			Compositions::from_inventory(),
		)
	}

	/// [`Extensions::from_inventory`], then applies every submitted [`MixinDef`].
	///
	/// Stops at the first failing mixin. Mixins from different crates have no defined order.
	pub fn bootstrap(config: ExtensionsConfig) -> Result<Self, RegisterError> {
		let extensions = Self::from_inventory(config);
		for def in inventory::iter::<MixinDef> {
			extensions.register(def.destination, UnitRef::named(def.unit))?;
		}
		Ok(extensions)
	}

	fn with_parts(config: ExtensionsConfig, catalog: TypeCatalog, compositions: Compositions) -> Self {
		let materializer = match config.wrapper_dir {
			Some(dir) => UnitMaterializer::with_dir(dir),
			None => UnitMaterializer::in_memory(),
		};
		Self {
			catalog: RwLock::new(catalog),
			compositions: RwLock::new(compositions),
			materializer,
			dispatch: DispatchTable::new(),
			ledger: RegistrationLedger::new(config.ledger),
			writer: Mutex::new(()),
		}
	}

	pub fn declare_type(&self, name: impl Into<TypeName>, extensible: bool) {
		self.catalog.write().declare(name, extensible);
	}

	pub fn define_composition(&self, name: impl Into<String>, kind: UnitKind, factory: Factory) {
		self.compositions.write().define(name, kind, factory);
	}

	pub fn is_destination_compatible(&self, destination: &str) -> bool {
		gate::is_destination_compatible(&self.catalog.read(), destination)
	}

	pub fn is_unit_compatible(&self, unit: &UnitRef) -> bool {
		gate::is_unit_compatible(&self.compositions.read(), unit)
	}

	/// Installs every public operation of `unit` onto `destination`.
	///
	/// Returns the number of operations installed.
	pub fn register(
		&self,
		destination: impl Into<TypeName>,
		unit: impl Into<UnitRef>,
	) -> Result<usize, RegisterError> {
		let destination = destination.into();
		let unit = unit.into();

		gate::ensure_destination(&self.catalog.read(), &destination)?;
		let instance = {
			let compositions = self.compositions.read();
			gate::ensure_unit(&compositions, &unit)?;
			self.materializer.materialize(&compositions, &unit)?
		};

		let source = match &unit {
			UnitRef::Named(name) => UnitSource::Named(name.clone()),
			UnitRef::Instance(_) => UnitSource::Instance(instance.unit_name().to_string()),
		};
		let handlers = extract(&instance)
			.into_iter()
			.map(|(name, op)| (name, op.into_handler()))
			.collect();

		Ok(self.install(&destination, handlers, source)?)
	}

	/// Installs a single handler under `name`.
	pub fn register_operation(
		&self,
		destination: impl Into<TypeName>,
		name: impl Into<String>,
		handler: Handler,
	) -> Result<(), CompositionError> {
		let destination = destination.into();
		gate::ensure_destination(&self.catalog.read(), &destination)?;
		self.install(&destination, vec![(name.into(), handler)], UnitSource::Handler)?;
		Ok(())
	}

	fn install(
		&self,
		destination: &TypeName,
		handlers: Vec<(String, Handler)>,
		source: UnitSource,
	) -> Result<usize, CompositionError> {
		let _writer = self.writer.lock();
		let catalog = self.catalog.read();
		gate::ensure_destination(&catalog, destination)?;

		let adapters: Vec<Arc<Adapter>> = handlers
			.into_iter()
			.map(|(name, handler)| {
				Arc::new(Adapter::new(
					destination.clone(),
					name,
					handler,
					source.clone(),
				))
			})
			.collect();

		for old in self.dispatch.install(destination, &adapters) {
			debug!(
				destination = %destination,
				operation = old.name(),
				previous = %old.source(),
				current = %source,
				"operation shadowed"
			);
		}
		for adapter in &adapters {
			self.ledger
				.record(destination, adapter.name(), adapter.signature(), &source);
		}

		debug!(
			destination = %destination,
			source = %source,
			operations = adapters.len(),
			"registered operations"
		);
		drop(catalog);
		Ok(adapters.len())
	}

	/// Dispatches `name` on `destination`.
	///
	/// `receiver` is the instance the call is made on; pass `None` for a static-style call.
	pub fn invoke(
		&self,
		destination: &str,
		name: &str,
		receiver: Option<&Value>,
		args: &[Value],
	) -> Result<Value, DispatchError> {
		let adapter =
			self.dispatch
				.get(destination, name)
				.ok_or_else(|| DispatchError::UnknownOperation {
					destination: TypeName::new(destination),
					name: name.to_string(),
				})?;
		Ok(adapter.call(receiver, args)?)
	}

	pub fn adapter(&self, destination: &str, name: &str) -> Option<Arc<Adapter>> {
		self.dispatch.get(destination, name)
	}

	pub fn has_operation(&self, destination: &str, name: &str) -> bool {
		self.dispatch.contains(destination, name)
	}

	/// Operation names currently installed on `destination`.
	pub fn operations(&self, destination: &str) -> Vec<String> {
		self.dispatch.names(destination)
	}

	pub fn dispatch(&self) -> &DispatchTable {
		&self.dispatch
	}

	pub fn ledger(&self) -> &RegistrationLedger {
		&self.ledger
	}

	pub fn materializer(&self) -> &UnitMaterializer {
		&self.materializer
	}

	/// Clears installed operations and the ledger. Declarations and compositions are kept.
	pub fn reset(&self) {
		let _writer = self.writer.lock();
		self.dispatch.clear();
		self.ledger.reset();
	}
}

impl Default for Extensions {
	fn default() -> Self {
		Self::new(ExtensionsConfig::default())
	}
}
