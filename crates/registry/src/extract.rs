//! Operation extraction from unit instances.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::dispatch::{CallContext, Handler};
use crate::signature::Signature;
use crate::unit::{Behavior, MemberKind, OperationFn, Visibility};
use crate::{InvocationFault, Value};

/// An operation body bound to the unit instance it was extracted from.
#[derive(Clone)]
pub struct BoundOperation {
	unit: Arc<dyn Behavior>,
	signature: Signature,
	body: OperationFn,
}

impl BoundOperation {
	pub fn signature(&self) -> &Signature {
		&self.signature
	}

	pub fn call(&self, cx: &CallContext<'_>, args: &[Value]) -> Result<Value, InvocationFault> {
		(self.body)(self.unit.as_ref(), cx, args)
	}

	/// Converts into a plain [`Handler`] that keeps the instance alive.
	pub fn into_handler(self) -> Handler {
		let signature = self.signature.clone();
		Handler::new(signature, move |cx, args| self.call(cx, args))
	}
}

impl fmt::Debug for BoundOperation {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("BoundOperation")
			.field("unit", &self.unit.unit_name())
			.field("signature", &self.signature)
			.finish_non_exhaustive()
	}
}

/// Public, non-static operations of `unit`, keyed by name in declaration order.
///
/// Properties, static members and non-public members are skipped. A repeated name keeps its
/// first position and its last body.
pub fn extract(unit: &Arc<dyn Behavior>) -> IndexMap<String, BoundOperation> {
	let mut operations = IndexMap::new();
	for member in unit.members() {
		if member.visibility != Visibility::Public || member.is_static {
			continue;
		}
		let MemberKind::Operation { signature, body } = member.kind else {
			continue;
		};
		operations.insert(
			member.name,
			BoundOperation {
				unit: Arc::clone(unit),
				signature,
				body,
			},
		);
	}
	operations
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::TypeName;
	use crate::signature::{Parameter, TypeHint};
	use crate::unit::Member;

	struct Counter {
		step: i64,
	}

	impl Behavior for Counter {
		fn unit_name(&self) -> &str {
			"Counter"
		}

		fn members(&self) -> Vec<Member> {
			let sig = Signature::new(vec![Parameter::new("n", TypeHint::Int)], TypeHint::Int);
			vec![
				Member::operation("bump", sig.clone(), |unit, _, args| {
					let step = unit.downcast_ref::<Counter>().map_or(0, |c| c.step);
					Ok(Value::Int(args[0].as_int().unwrap_or(0) + step))
				}),
				Member::operation("hidden", sig.clone(), |_, _, _| Ok(Value::Null))
					.with_visibility(Visibility::Private),
				Member::operation("make", sig.clone(), |_, _, _| Ok(Value::Null)).into_static(),
				Member::property("step", TypeHint::Int),
				Member::operation("reset", Signature::default(), |_, _, _| Ok(Value::Int(0))),
			]
		}
	}

	#[test]
	fn test_filters_and_orders() {
		let unit: Arc<dyn Behavior> = Arc::new(Counter { step: 2 });
		let ops = extract(&unit);
		let names: Vec<_> = ops.keys().map(String::as_str).collect();
		assert_eq!(names, ["bump", "reset"]);
	}

	#[test]
	fn test_operation_is_bound_to_instance() {
		let unit: Arc<dyn Behavior> = Arc::new(Counter { step: 5 });
		let ops = extract(&unit);
		let scope = TypeName::new("T");
		let cx = CallContext {
			receiver: None,
			scope: &scope,
			operation: "bump",
		};
		assert_eq!(ops["bump"].call(&cx, &[Value::Int(1)]), Ok(Value::Int(6)));
	}

	#[test]
	fn test_empty_unit_yields_empty_map() {
		struct Nothing;
		impl Behavior for Nothing {
			fn unit_name(&self) -> &str {
				"Nothing"
			}
			fn members(&self) -> Vec<Member> {
				vec![Member::property("x", TypeHint::Mixed)]
			}
		}
		let unit: Arc<dyn Behavior> = Arc::new(Nothing);
		assert!(extract(&unit).is_empty());
	}
}
