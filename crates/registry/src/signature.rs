//! Operation signatures.
//!
//! A [`Signature`] travels with every installed operation: the adapter checks arity against it,
//! the ledger serializes it into the registration fingerprint, and the analyzer bridge turns it
//! into the single call variant of a method descriptor.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Value;

/// Static type annotation for a parameter or return value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeHint {
	Mixed,
	Null,
	Bool,
	Int,
	Float,
	String,
	List(Box<TypeHint>),
	Nullable(Box<TypeHint>),
	Named(String),
}

impl TypeHint {
	pub fn list(item: TypeHint) -> Self {
		Self::List(Box::new(item))
	}

	pub fn nullable(inner: TypeHint) -> Self {
		Self::Nullable(Box::new(inner))
	}

	/// Returns true if `value` inhabits this hint.
	///
	/// Named types cannot be checked at runtime and accept anything.
	pub fn accepts(&self, value: &Value) -> bool {
		match (self, value) {
			(Self::Mixed | Self::Named(_), _) => true,
			(Self::Null, Value::Null) => true,
			(Self::Bool, Value::Bool(_)) => true,
			(Self::Int, Value::Int(_)) => true,
			(Self::Float, Value::Float(_) | Value::Int(_)) => true,
			(Self::String, Value::Str(_)) => true,
			(Self::List(item), Value::List(items)) => items.iter().all(|v| item.accepts(v)),
			(Self::Nullable(_), Value::Null) => true,
			(Self::Nullable(inner), v) => inner.accepts(v),
			_ => false,
		}
	}
}

impl fmt::Display for TypeHint {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Mixed => write!(f, "mixed"),
			Self::Null => write!(f, "null"),
			Self::Bool => write!(f, "bool"),
			Self::Int => write!(f, "int"),
			Self::Float => write!(f, "float"),
			Self::String => write!(f, "string"),
			Self::List(item) => write!(f, "list<{item}>"),
			Self::Nullable(inner) => write!(f, "?{inner}"),
			Self::Named(name) => write!(f, "{name}"),
		}
	}
}

/// One declared parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
	pub name: String,
	pub hint: TypeHint,
	/// Optional parameters may be omitted by the caller.
	#[serde(default)]
	pub optional: bool,
}

impl Parameter {
	pub fn new(name: impl Into<String>, hint: TypeHint) -> Self {
		Self {
			name: name.into(),
			hint,
			optional: false,
		}
	}

	pub fn optional(name: impl Into<String>, hint: TypeHint) -> Self {
		Self {
			name: name.into(),
			hint,
			optional: true,
		}
	}
}

/// Parameter list, variadic flag and return type of an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
	pub parameters: Vec<Parameter>,
	/// The last parameter absorbs any number of trailing arguments.
	#[serde(default)]
	pub variadic: bool,
	pub returns: TypeHint,
}

impl Default for Signature {
	fn default() -> Self {
		Self {
			parameters: Vec::new(),
			variadic: false,
			returns: TypeHint::Mixed,
		}
	}
}

impl Signature {
	pub fn new(parameters: Vec<Parameter>, returns: TypeHint) -> Self {
		Self {
			parameters,
			variadic: false,
			returns,
		}
	}

	pub fn variadic(mut self) -> Self {
		self.variadic = true;
		self
	}

	/// Number of arguments a caller must supply.
	pub fn required_arity(&self) -> usize {
		let declared = self.parameters.iter().filter(|p| !p.optional).count();
		if self.variadic && declared > 0 && !self.parameters.last().is_some_and(|p| p.optional) {
			declared - 1
		} else {
			declared
		}
	}

	/// Maximum number of arguments, or `None` when variadic.
	pub fn max_arity(&self) -> Option<usize> {
		(!self.variadic).then_some(self.parameters.len())
	}

	/// Declared hint for the argument at `index`, accounting for a trailing variadic.
	pub fn hint_at(&self, index: usize) -> Option<&TypeHint> {
		match self.parameters.get(index) {
			Some(p) => Some(&p.hint),
			None if self.variadic => self.parameters.last().map(|p| &p.hint),
			None => None,
		}
	}
}

impl fmt::Display for Signature {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "(")?;
		let last = self.parameters.len().saturating_sub(1);
		for (i, p) in self.parameters.iter().enumerate() {
			if i > 0 {
				write!(f, ", ")?;
			}
			let dots = if self.variadic && i == last { "..." } else { "" };
			let opt = if p.optional { "?" } else { "" };
			write!(f, "{dots}{}{opt}: {}", p.name, p.hint)?;
		}
		write!(f, ") -> {}", self.returns)
	}
}

#[cfg(test)]
mod tests {
	use rstest::rstest;

	use super::*;

	#[rstest]
	#[case(TypeHint::String, Value::from("x"), true)]
	#[case(TypeHint::String, Value::Int(1), false)]
	#[case(TypeHint::Float, Value::Int(1), true)]
	#[case(TypeHint::nullable(TypeHint::Int), Value::Null, true)]
	#[case(TypeHint::list(TypeHint::Int), Value::List(vec![Value::Int(1), Value::from("a")]), false)]
	#[case(TypeHint::Named("Widget".into()), Value::Bool(true), true)]
	fn test_hint_accepts(#[case] hint: TypeHint, #[case] value: Value, #[case] expected: bool) {
		assert_eq!(hint.accepts(&value), expected);
	}

	#[test]
	fn test_variadic_arity() {
		let sig = Signature::new(
			vec![
				Parameter::new("sep", TypeHint::String),
				Parameter::new("parts", TypeHint::String),
			],
			TypeHint::String,
		)
		.variadic();
		assert_eq!(sig.required_arity(), 1);
		assert_eq!(sig.max_arity(), None);
		assert_eq!(sig.hint_at(7), Some(&TypeHint::String));
	}

	#[test]
	fn test_display() {
		let sig = Signature::new(vec![Parameter::new("name", TypeHint::String)], TypeHint::String);
		assert_eq!(sig.to_string(), "(name: string) -> string");
	}
}
