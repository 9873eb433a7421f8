//! Declared destination types.
//!
//! A type can only receive injected operations if it was declared here with the extension point
//! enabled. Declarations come from `inventory` submissions (see [`crate::declare_type!`]) and from
//! [`crate::Extensions::declare_type`] at runtime.

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Identifier of a destination type.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeName(Arc<str>);

impl TypeName {
	pub fn new(name: impl AsRef<str>) -> Self {
		Self(Arc::from(name.as_ref()))
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Debug for TypeName {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{:?}", &*self.0)
	}
}

impl fmt::Display for TypeName {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl Borrow<str> for TypeName {
	fn borrow(&self) -> &str {
		&self.0
	}
}

impl From<&str> for TypeName {
	fn from(name: &str) -> Self {
		Self::new(name)
	}
}

impl From<String> for TypeName {
	fn from(name: String) -> Self {
		Self(Arc::from(name))
	}
}

impl Serialize for TypeName {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(&self.0)
	}
}

impl<'de> Deserialize<'de> for TypeName {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		String::deserialize(deserializer).map(Self::from)
	}
}

/// Static declaration of a type, collected at link time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeDecl {
	pub name: &'static str,
	/// The type exposes the dynamic operation extension point.
	pub extensible: bool,
}

inventory::collect!(TypeDecl);

impl TypeDecl {
	pub const fn extensible(name: &'static str) -> Self {
		Self {
			name,
			extensible: true,
		}
	}

	pub const fn sealed(name: &'static str) -> Self {
		Self {
			name,
			extensible: false,
		}
	}
}

/// Known types and whether each accepts injected operations.
#[derive(Debug, Clone, Default)]
pub struct TypeCatalog {
	types: FxHashMap<TypeName, bool>,
}

impl TypeCatalog {
	pub fn new() -> Self {
		Self::default()
	}

	/// Builds a catalog from every [`TypeDecl`] submitted through `inventory`.
	pub fn from_inventory() -> Self {
		let mut catalog = Self::new();
		for decl in inventory::iter::<TypeDecl> {
			catalog.declare(decl.name, decl.extensible);
		}
		catalog
	}

	/// Declares or redeclares a type. The latest declaration wins.
	pub fn declare(&mut self, name: impl Into<TypeName>, extensible: bool) {
		self.types.insert(name.into(), extensible);
	}

	pub fn contains(&self, name: &str) -> bool {
		self.types.contains_key(name)
	}

	/// Returns `Some(extensible)` for declared types.
	pub fn is_extensible(&self, name: &str) -> Option<bool> {
		self.types.get(name).copied()
	}

	pub fn len(&self) -> usize {
		self.types.len()
	}

	pub fn is_empty(&self) -> bool {
		self.types.is_empty()
	}
}
