//! Behavior units and the composition registry.
//!
//! A behavior unit is any [`Behavior`] implementor: a bundle of named members that can be copied
//! onto destination types. Units are referenced either as live instances or by name; named
//! references resolve through [`Compositions`], a name to factory map populated at startup.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::dispatch::CallContext;
use crate::signature::{Signature, TypeHint};
use crate::{InvocationFault, Value};

/// Body of an operation member.
///
/// The first argument is the unit instance the operation was extracted from.
pub type OperationFn = Arc<
	dyn Fn(&dyn Behavior, &CallContext<'_>, &[Value]) -> Result<Value, InvocationFault>
		+ Send
		+ Sync,
>;

/// Produces a fresh unit instance.
pub type Factory = Arc<dyn Fn() -> Arc<dyn Behavior> + Send + Sync>;

/// A reusable bundle of named members.
pub trait Behavior: Any + Send + Sync + 'static {
	/// Name used in diagnostics and ledger records.
	fn unit_name(&self) -> &str;

	/// Declared members in declaration order.
	fn members(&self) -> Vec<Member>;
}

impl dyn Behavior {
	pub fn downcast_ref<T: Behavior>(&self) -> Option<&T> {
		(self as &dyn Any).downcast_ref::<T>()
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
	Public,
	Protected,
	Private,
}

#[derive(Clone)]
pub enum MemberKind {
	Operation { signature: Signature, body: OperationFn },
	Property { hint: TypeHint },
}

/// One declared member of a unit.
#[derive(Clone)]
pub struct Member {
	pub name: String,
	pub visibility: Visibility,
	pub is_static: bool,
	pub kind: MemberKind,
}

impl Member {
	/// A public instance operation.
	pub fn operation<F>(name: impl Into<String>, signature: Signature, body: F) -> Self
	where
		F: Fn(&dyn Behavior, &CallContext<'_>, &[Value]) -> Result<Value, InvocationFault>
			+ Send
			+ Sync
			+ 'static,
	{
		Self {
			name: name.into(),
			visibility: Visibility::Public,
			is_static: false,
			kind: MemberKind::Operation {
				signature,
				body: Arc::new(body),
			},
		}
	}

	/// A public instance property.
	pub fn property(name: impl Into<String>, hint: TypeHint) -> Self {
		Self {
			name: name.into(),
			visibility: Visibility::Public,
			is_static: false,
			kind: MemberKind::Property { hint },
		}
	}

	pub fn with_visibility(mut self, visibility: Visibility) -> Self {
		self.visibility = visibility;
		self
	}

	pub fn into_static(mut self) -> Self {
		self.is_static = true;
		self
	}

	pub fn is_operation(&self) -> bool {
		matches!(self.kind, MemberKind::Operation { .. })
	}
}

impl fmt::Debug for Member {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let kind = match &self.kind {
			MemberKind::Operation { signature, .. } => format!("operation{signature}"),
			MemberKind::Property { hint } => format!("property: {hint}"),
		};
		f.debug_struct("Member")
			.field("name", &self.name)
			.field("visibility", &self.visibility)
			.field("is_static", &self.is_static)
			.field("kind", &kind)
			.finish()
	}
}

/// Reference to a behavior unit.
#[derive(Clone)]
pub enum UnitRef {
	/// A live instance, used as-is.
	Instance(Arc<dyn Behavior>),
	/// A composition name resolved through [`Compositions`].
	Named(String),
}

impl UnitRef {
	pub fn instance<B: Behavior>(unit: B) -> Self {
		Self::Instance(Arc::new(unit))
	}

	pub fn named(name: impl Into<String>) -> Self {
		Self::Named(name.into())
	}

	/// Human-readable reference: the composition name or the instance's unit name.
	pub fn describe(&self) -> String {
		match self {
			Self::Instance(unit) => unit.unit_name().to_string(),
			Self::Named(name) => name.clone(),
		}
	}
}

impl fmt::Debug for UnitRef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Instance(unit) => f.debug_tuple("Instance").field(&unit.unit_name()).finish(),
			Self::Named(name) => f.debug_tuple("Named").field(name).finish(),
		}
	}
}

impl From<&str> for UnitRef {
	fn from(name: &str) -> Self {
		Self::named(name)
	}
}

impl From<Arc<dyn Behavior>> for UnitRef {
	fn from(unit: Arc<dyn Behavior>) -> Self {
		Self::Instance(unit)
	}
}

/// Whether a named unit may be composed onto other types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
	/// A type-free bundle of operations.
	Composable,
	/// A full concrete type; never composable by name.
	Concrete,
}

/// Static composition definition, collected at link time.
pub struct CompositionDef {
	pub name: &'static str,
	pub kind: UnitKind,
	pub factory: fn() -> Arc<dyn Behavior>,
}

inventory::collect!(CompositionDef);

#[derive(Clone)]
struct Composition {
	kind: UnitKind,
	factory: Factory,
}

/// Name to factory map for named unit references.
#[derive(Clone, Default)]
pub struct Compositions {
	by_name: FxHashMap<String, Composition>,
}

impl Compositions {
	pub fn new() -> Self {
		Self::default()
	}

	/// Builds the registry from every [`CompositionDef`] submitted through `inventory`.
	pub fn from_inventory() -> Self {
		let mut compositions = Self::new();
		for def in inventory::iter::<CompositionDef> {
			let factory = def.factory;
			compositions.define(def.name, def.kind, Arc::new(move || factory()));
		}
		compositions
	}

	/// Defines or replaces a named composition.
	pub fn define(&mut self, name: impl Into<String>, kind: UnitKind, factory: Factory) {
		self.by_name.insert(name.into(), Composition { kind, factory });
	}

	pub fn kind(&self, name: &str) -> Option<UnitKind> {
		self.by_name.get(name).map(|c| c.kind)
	}

	/// Creates a fresh instance of the named composition.
	pub fn instantiate(&self, name: &str) -> Option<Arc<dyn Behavior>> {
		self.by_name.get(name).map(|c| (c.factory)())
	}

	pub fn len(&self) -> usize {
		self.by_name.len()
	}

	pub fn is_empty(&self) -> bool {
		self.by_name.is_empty()
	}
}

impl fmt::Debug for Compositions {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_map()
			.entries(self.by_name.iter().map(|(name, c)| (name, c.kind)))
			.finish()
	}
}
