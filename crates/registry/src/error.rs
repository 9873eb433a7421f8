use std::io;
use std::path::PathBuf;

use crate::TypeName;
use crate::signature::TypeHint;

/// A destination or unit reference failed the compatibility gate.
///
/// Raised before any side effect and never recovered locally.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompositionError {
	#[error("destination must support dynamic operation registration")]
	Destination { destination: TypeName },

	#[error("unit must be an instance or a composable behavior unit")]
	Unit { reference: String },
}

/// A fault raised while an injected operation executes.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvocationFault {
	#[error("expected {expected} argument(s), got {given}")]
	Arity { expected: String, given: usize },

	#[error("argument {index} expects {expected}, got {found}")]
	Argument {
		index: usize,
		expected: TypeHint,
		found: &'static str,
	},

	#[error("operation requires a receiver")]
	MissingReceiver,

	#[error("{0}")]
	Failed(String),

	#[error("operation panicked: {0}")]
	Panicked(String),
}

impl InvocationFault {
	pub fn failed(message: impl Into<String>) -> Self {
		Self::Failed(message.into())
	}
}

/// An [`InvocationFault`] surfaced to the caller of an operation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{destination}::{operation} failed: {fault}")]
pub struct InvocationError {
	pub destination: TypeName,
	pub operation: String,
	#[source]
	pub fault: InvocationFault,
}

/// Failure to produce an instance for a named unit reference.
#[derive(Debug, thiserror::Error)]
pub enum MaterializeError {
	#[error("wrapper {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: io::Error,
	},

	#[error("wrapper {path} is corrupt: {source}")]
	Corrupt {
		path: PathBuf,
		#[source]
		source: serde_json::Error,
	},

	#[error("wrapper {path} records unit {found:?}, expected {expected:?}")]
	Mismatch {
		path: PathBuf,
		expected: String,
		found: String,
	},

	#[error("no composition named {reference:?}")]
	Unresolved { reference: String },
}

/// Registration failure.
#[derive(Debug, thiserror::Error)]
pub enum RegisterError {
	#[error(transparent)]
	Composition(#[from] CompositionError),

	#[error("materializing unit failed: {0}")]
	Materialize(#[from] MaterializeError),
}

/// Dispatch failure from [`crate::Extensions::invoke`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DispatchError {
	#[error("{destination} has no operation named {name:?}")]
	UnknownOperation { destination: TypeName, name: String },

	#[error(transparent)]
	Invocation(#[from] InvocationError),
}
