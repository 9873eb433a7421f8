//! Per-type dispatch table and operation adapters.
//!
//! # Role
//!
//! The table maps `(destination, name)` to an [`Adapter`]. Readers load the current snapshot
//! without locking; writers publish a new snapshot through `ArcSwap::rcu`, so a batch of
//! adapters from one registration becomes visible all at once.
//!
//! # Invariants
//!
//! - Last write wins per `(destination, name)`.
//! - An adapter always runs its handler inside an [`Attempt`]; faults never unwind past
//!   [`Adapter::call`].

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;
use indexmap::IndexMap;
use rustc_hash::FxHashMap;

use crate::ledger::UnitSource;
use crate::signature::Signature;
use crate::{Attempt, InvocationError, InvocationFault, TypeName, Value};

/// Execution context bound at call time.
///
/// `receiver` is the instance the operation was invoked on, absent for static-style calls.
/// `scope` is the destination type that owns the operation.
#[derive(Debug, Clone, Copy)]
pub struct CallContext<'a> {
	pub receiver: Option<&'a Value>,
	pub scope: &'a TypeName,
	pub operation: &'a str,
}

impl<'a> CallContext<'a> {
	pub fn is_static(&self) -> bool {
		self.receiver.is_none()
	}

	/// Returns the receiver or [`InvocationFault::MissingReceiver`].
	pub fn receiver(&self) -> Result<&'a Value, InvocationFault> {
		self.receiver.ok_or(InvocationFault::MissingReceiver)
	}
}

pub type HandlerFn =
	Arc<dyn Fn(&CallContext<'_>, &[Value]) -> Result<Value, InvocationFault> + Send + Sync>;

/// A callable with its declared signature.
#[derive(Clone)]
pub struct Handler {
	pub signature: Signature,
	pub call: HandlerFn,
}

impl Handler {
	pub fn new<F>(signature: Signature, call: F) -> Self
	where
		F: Fn(&CallContext<'_>, &[Value]) -> Result<Value, InvocationFault> + Send + Sync + 'static,
	{
		Self {
			signature,
			call: Arc::new(call),
		}
	}
}

impl fmt::Debug for Handler {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Handler")
			.field("signature", &self.signature)
			.finish_non_exhaustive()
	}
}

/// Installed form of an operation: binds the call context and captures faults.
#[derive(Debug)]
pub struct Adapter {
	destination: TypeName,
	name: String,
	handler: Handler,
	source: UnitSource,
}

impl Adapter {
	pub fn new(
		destination: TypeName,
		name: impl Into<String>,
		handler: Handler,
		source: UnitSource,
	) -> Self {
		Self {
			destination,
			name: name.into(),
			handler,
			source,
		}
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn destination(&self) -> &TypeName {
		&self.destination
	}

	pub fn signature(&self) -> &Signature {
		&self.handler.signature
	}

	pub fn source(&self) -> &UnitSource {
		&self.source
	}

	/// Runs the operation and surfaces any captured fault.
	pub fn call(&self, receiver: Option<&Value>, args: &[Value]) -> Result<Value, InvocationError> {
		self.attempt(receiver, args).eval(&self.destination, &self.name)
	}

	/// Runs the operation, keeping any fault inside the returned [`Attempt`].
	pub fn attempt(&self, receiver: Option<&Value>, args: &[Value]) -> Attempt {
		let cx = CallContext {
			receiver,
			scope: &self.destination,
			operation: &self.name,
		};
		Attempt::run(|| {
			check_arguments(&self.handler.signature, args)?;
			(self.handler.call)(&cx, args)
		})
	}
}

fn check_arguments(signature: &Signature, args: &[Value]) -> Result<(), InvocationFault> {
	let required = signature.required_arity();
	let too_many = signature.max_arity().is_some_and(|max| args.len() > max);
	if args.len() < required || too_many {
		let expected = match signature.max_arity() {
			Some(max) if max == required => required.to_string(),
			Some(max) => format!("{required}..={max}"),
			None => format!("at least {required}"),
		};
		return Err(InvocationFault::Arity {
			expected,
			given: args.len(),
		});
	}
	for (index, arg) in args.iter().enumerate() {
		if let Some(hint) = signature.hint_at(index)
			&& !hint.accepts(arg)
		{
			return Err(InvocationFault::Argument {
				index,
				expected: hint.clone(),
				found: arg.kind(),
			});
		}
	}
	Ok(())
}

type Table = FxHashMap<TypeName, IndexMap<String, Arc<Adapter>>>;

/// Snapshot-published map from destination and operation name to adapter.
pub struct DispatchTable {
	snap: ArcSwap<Table>,
}

impl Default for DispatchTable {
	fn default() -> Self {
		Self::new()
	}
}

impl DispatchTable {
	pub fn new() -> Self {
		Self {
			snap: ArcSwap::from_pointee(Table::default()),
		}
	}

	/// Publishes `adapters` for `destination` in one swap.
	///
	/// Returns the adapters that were replaced.
	pub fn install(&self, destination: &TypeName, adapters: &[Arc<Adapter>]) -> Vec<Arc<Adapter>> {
		let prev = self.snap.rcu(|current| {
			let mut next = Table::clone(current);
			let ops = next.entry(destination.clone()).or_default();
			for adapter in adapters {
				ops.insert(adapter.name().to_string(), Arc::clone(adapter));
			}
			next
		});

		let Some(old) = prev.get(destination) else {
			return Vec::new();
		};
		adapters
			.iter()
			.filter_map(|a| old.get(a.name()).cloned())
			.collect()
	}

	pub fn get(&self, destination: &str, name: &str) -> Option<Arc<Adapter>> {
		self.snap.load().get(destination)?.get(name).cloned()
	}

	pub fn contains(&self, destination: &str, name: &str) -> bool {
		self.snap
			.load()
			.get(destination)
			.is_some_and(|ops| ops.contains_key(name))
	}

	/// Operation names installed on `destination`, in first-installation order.
	pub fn names(&self, destination: &str) -> Vec<String> {
		self.snap
			.load()
			.get(destination)
			.map(|ops| ops.keys().cloned().collect())
			.unwrap_or_default()
	}

	/// Total number of installed adapters.
	pub fn len(&self) -> usize {
		self.snap.load().values().map(IndexMap::len).sum()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn clear(&self) {
		self.snap.store(Arc::new(Table::default()));
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::signature::{Parameter, TypeHint};

	fn echo(dest: &str, name: &str) -> Arc<Adapter> {
		let handler = Handler::new(
			Signature::new(vec![Parameter::new("v", TypeHint::Int)], TypeHint::Int),
			|_, args| Ok(args[0].clone()),
		);
		Arc::new(Adapter::new(dest.into(), name, handler, UnitSource::Handler))
	}

	#[test]
	fn test_install_reports_shadowed() {
		let table = DispatchTable::new();
		let dest = TypeName::new("T");
		assert!(table.install(&dest, &[echo("T", "a")]).is_empty());
		let shadowed = table.install(&dest, &[echo("T", "a"), echo("T", "b")]);
		assert_eq!(shadowed.len(), 1);
		assert_eq!(shadowed[0].name(), "a");
		assert_eq!(table.names("T"), vec!["a".to_string(), "b".to_string()]);
		assert_eq!(table.len(), 2);
	}

	#[test]
	fn test_arity_and_type_faults_are_captured() {
		let adapter = echo("T", "a");
		let err = adapter.call(None, &[]).unwrap_err();
		assert!(matches!(err.fault, InvocationFault::Arity { given: 0, .. }));

		let err = adapter.call(None, &[Value::from("x")]).unwrap_err();
		assert!(matches!(
			err.fault,
			InvocationFault::Argument {
				index: 0,
				found: "string",
				..
			}
		));

		assert_eq!(adapter.call(None, &[Value::Int(9)]), Ok(Value::Int(9)));
	}
}
