//! Runtime operation injection onto opted-in types.
//!
//! # Purpose
//!
//! A behavior unit bundles named operations. [`Extensions::register`] copies the public
//! operations of a unit onto a destination type so that [`Extensions::invoke`] can dispatch
//! them by name, and records every installed binding in a [`RegistrationLedger`] that static
//! analysis reads back through `weave-analyzer`.
//!
//! # Mental Model
//!
//! 1. **Declare:** destination types ([`TypeDecl`]) and named behavior units
//!    ([`CompositionDef`]) are collected with `inventory` or added at runtime.
//! 2. **Gate:** [`gate`] rejects destinations that did not opt in and unit references that are
//!    not composable, before anything is written.
//! 3. **Materialize:** [`UnitMaterializer`] turns a [`UnitRef`] into a live instance.
//! 4. **Extract:** [`extract`] keeps public, non-static operations, bound to that instance.
//! 5. **Bind:** each operation is wrapped in an [`Adapter`] and published to the dispatch table
//!    in a single snapshot swap; the ledger gets one [`OperationBinding`] per operation.
//!
//! # Invariants
//!
//! - Incompatible destinations or units never mutate the dispatch table or the ledger.
//!   - Enforced in: [`Extensions::register`], [`Extensions::register_operation`].
//! - The dispatch table is last-write-wins per `(destination, name)`; the ledger only grows.
//!   - Enforced in: [`DispatchTable::install`], [`RegistrationLedger::record`].
//! - A named unit's wrapper record is written at most once.
//!   - Enforced in: [`UnitMaterializer::materialize`].

pub mod attempt;
pub mod catalog;
pub mod dispatch;
pub mod error;
pub mod extract;
pub mod fingerprint;
pub mod gate;
pub mod ledger;
mod macros;
pub mod materialize;
pub mod registrar;
pub mod signature;
pub mod unit;
pub mod value;

pub use attempt::Attempt;
pub use catalog::{TypeCatalog, TypeDecl, TypeName};
pub use dispatch::{Adapter, CallContext, DispatchTable, Handler, HandlerFn};
pub use error::{
	CompositionError, DispatchError, InvocationError, InvocationFault, MaterializeError,
	RegisterError,
};
pub use extract::{BoundOperation, extract};
pub use ledger::{LedgerMode, OperationBinding, RegistrationLedger, UnitSource};
pub use materialize::{UnitMaterializer, WrapperRecord};
pub use registrar::{Extensions, ExtensionsConfig, MixinDef};
pub use signature::{Parameter, Signature, TypeHint};
pub use unit::{
	Behavior, CompositionDef, Compositions, Factory, Member, MemberKind, OperationFn, UnitKind,
	UnitRef, Visibility,
};
pub use value::Value;

#[doc(hidden)]
pub use inventory as __inventory;
