//! Failure-capturing execution of operation handlers.
//!
//! An [`Attempt`] runs a handler once and holds its outcome, whether the handler returned an
//! error or panicked. Nothing propagates until [`Attempt::eval`] is called.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use crate::{InvocationError, InvocationFault, TypeName, Value};

/// Captured outcome of a single handler run.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "an attempt holds a possible fault that only `eval` surfaces"]
pub struct Attempt {
	outcome: Result<Value, InvocationFault>,
}

impl Attempt {
	/// Runs `f`, converting both `Err` returns and panics into a captured fault.
	pub fn run<F>(f: F) -> Self
	where
		F: FnOnce() -> Result<Value, InvocationFault>,
	{
		let outcome = match panic::catch_unwind(AssertUnwindSafe(f)) {
			Ok(result) => result,
			Err(payload) => Err(InvocationFault::Panicked(panic_message(payload.as_ref()))),
		};
		Self { outcome }
	}

	pub fn failed(&self) -> bool {
		self.outcome.is_err()
	}

	pub fn fault(&self) -> Option<&InvocationFault> {
		self.outcome.as_ref().err()
	}

	/// Surfaces the captured fault, attributed to `destination::operation`.
	pub fn eval(self, destination: &TypeName, operation: &str) -> Result<Value, InvocationError> {
		self.outcome.map_err(|fault| InvocationError {
			destination: destination.clone(),
			operation: operation.to_string(),
			fault,
		})
	}
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
	if let Some(s) = payload.downcast_ref::<&str>() {
		(*s).to_string()
	} else if let Some(s) = payload.downcast_ref::<String>() {
		s.clone()
	} else {
		"non-string panic payload".to_string()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_success_passes_through() {
		let attempt = Attempt::run(|| Ok(Value::Int(4)));
		assert!(!attempt.failed());
		assert_eq!(attempt.eval(&"T".into(), "op"), Ok(Value::Int(4)));
	}

	#[test]
	fn test_error_is_captured_until_eval() {
		let attempt = Attempt::run(|| Err(InvocationFault::failed("nope")));
		assert!(attempt.failed());
		let err = attempt.eval(&"T".into(), "op").unwrap_err();
		assert_eq!(err.fault, InvocationFault::Failed("nope".into()));
		assert_eq!(err.to_string(), "T::op failed: nope");
	}

	#[test]
	fn test_panic_is_captured() {
		let attempt = Attempt::run(|| panic!("boom"));
		assert_eq!(
			attempt.fault(),
			Some(&InvocationFault::Panicked("boom".into()))
		);
	}
}
