//! Reflection bridge for the analysis host.
//!
//! # Purpose
//!
//! A type-checking host asks "does type `T` have method `m`, and what does it look like?". For
//! operations injected at runtime the answer comes from the latest [`OperationBinding`] in the
//! [`RegistrationLedger`], turned into a [`MethodDescriptor`].
//!
//! # Mental Model
//!
//! Descriptors are derived, never stored. Every injected operation is reported as a public
//! static method with one call variant built from its [`Signature`]; everything the ledger does
//! not know (docs, deprecation, throws) is reported absent, and side effects are unknown.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use weave_registry::{
	OperationBinding, Parameter, RegistrationLedger, Signature, TypeHint, TypeName, Visibility,
};

/// Three-valued answer used by analysis hosts for properties that may be unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trinary {
	Yes,
	No,
	Maybe,
}

/// Generic template parameters of a call variant, by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateTypeMap(BTreeMap<String, TypeHint>);

impl TemplateTypeMap {
	pub fn empty() -> Self {
		Self::default()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn get(&self, name: &str) -> Option<&TypeHint> {
		self.0.get(name)
	}
}

/// One callable shape of a method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionVariant {
	pub template_types: TemplateTypeMap,
	/// `None` until the host resolves templates against a call site.
	pub resolved_template_types: Option<TemplateTypeMap>,
	pub parameters: Vec<Parameter>,
	pub variadic: bool,
	pub return_type: TypeHint,
}

impl From<&Signature> for FunctionVariant {
	fn from(signature: &Signature) -> Self {
		Self {
			template_types: TemplateTypeMap::empty(),
			resolved_template_types: None,
			parameters: signature.parameters.clone(),
			variadic: signature.variadic,
			return_type: signature.returns.clone(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDescriptor {
	declaring_type: TypeName,
	name: String,
	visibility: Visibility,
	is_static: bool,
	is_final: Trinary,
	is_internal: Trinary,
	doc_comment: Option<String>,
	is_deprecated: Trinary,
	deprecated_description: Option<String>,
	throw_type: Option<TypeHint>,
	has_side_effects: Trinary,
	variants: Vec<FunctionVariant>,
}

impl MethodDescriptor {
	pub fn from_binding(binding: &OperationBinding) -> Self {
		Self {
			declaring_type: binding.destination.clone(),
			name: binding.name.clone(),
			visibility: Visibility::Public,
			is_static: true,
			is_final: Trinary::No,
			is_internal: Trinary::No,
			doc_comment: None,
			is_deprecated: Trinary::No,
			deprecated_description: None,
			throw_type: None,
			has_side_effects: Trinary::Maybe,
			variants: vec![FunctionVariant::from(&binding.signature)],
		}
	}

	pub fn declaring_type(&self) -> &TypeName {
		&self.declaring_type
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn visibility(&self) -> Visibility {
		self.visibility
	}

	pub fn is_public(&self) -> bool {
		self.visibility == Visibility::Public
	}

	pub fn is_private(&self) -> bool {
		self.visibility == Visibility::Private
	}

	pub fn is_static(&self) -> bool {
		self.is_static
	}

	pub fn is_final(&self) -> Trinary {
		self.is_final
	}

	pub fn is_internal(&self) -> Trinary {
		self.is_internal
	}

	pub fn doc_comment(&self) -> Option<&str> {
		self.doc_comment.as_deref()
	}

	pub fn is_deprecated(&self) -> Trinary {
		self.is_deprecated
	}

	pub fn deprecated_description(&self) -> Option<&str> {
		self.deprecated_description.as_deref()
	}

	pub fn throw_type(&self) -> Option<&TypeHint> {
		self.throw_type.as_ref()
	}

	pub fn has_side_effects(&self) -> Trinary {
		self.has_side_effects
	}

	pub fn variants(&self) -> &[FunctionVariant] {
		&self.variants
	}

	/// The declaration this method overrides. Injected methods are their own prototype.
	pub fn prototype(&self) -> &Self {
		self
	}
}

/// Host-facing hook: lets a type checker ask about methods it cannot see in source.
pub trait MethodsClassReflectionExtension {
	fn has_method(&self, declaring_type: &str, name: &str) -> bool;

	/// Callers must check [`Self::has_method`] first; unknown pairs yield `None`.
	fn method(&self, declaring_type: &str, name: &str) -> Option<MethodDescriptor>;
}

/// Answers reflection queries from a [`RegistrationLedger`].
#[derive(Debug, Clone, Copy)]
pub struct ReflectionBridge<'a> {
	ledger: &'a RegistrationLedger,
}

impl<'a> ReflectionBridge<'a> {
	pub fn new(ledger: &'a RegistrationLedger) -> Self {
		Self { ledger }
	}

	pub fn ledger(&self) -> &'a RegistrationLedger {
		self.ledger
	}

	/// Latest descriptor per operation name on `destination`, in first-registration order.
	pub fn methods(&self, destination: &str) -> Vec<MethodDescriptor> {
		self.ledger
			.latest_bindings(destination)
			.iter()
			.map(MethodDescriptor::from_binding)
			.collect()
	}
}

impl MethodsClassReflectionExtension for ReflectionBridge<'_> {
	fn has_method(&self, declaring_type: &str, name: &str) -> bool {
		self.ledger.latest(declaring_type, name).is_some()
	}

	fn method(&self, declaring_type: &str, name: &str) -> Option<MethodDescriptor> {
		self.ledger
			.latest(declaring_type, name)
			.map(|binding| MethodDescriptor::from_binding(&binding))
	}
}
