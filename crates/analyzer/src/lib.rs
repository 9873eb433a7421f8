//! Static-analysis bridge for operations registered through `weave-registry`.
//!
//! # Purpose
//!
//! Injected operations are invisible to a type checker that only reads declarations. This crate
//! reads the [`weave_registry::RegistrationLedger`] and
//!
//! - answers method reflection queries with synthetic [`MethodDescriptor`]s
//!   ([`ReflectionBridge`]);
//! - writes those descriptors as analyzer artifacts under a [`Namespace`] ([`generate`]);
//! - decides whether the artifacts are stale ([`DirtyCache`], [`AnalyzerAction`]).

pub mod action;
pub mod cache;
pub mod error;
pub mod generate;
pub mod reflection;

pub use action::AnalyzerAction;
pub use cache::DirtyCache;
pub use error::{CacheError, GenerateError};
pub use generate::{GenerationReport, Namespace, generate};
pub use reflection::{
	FunctionVariant, MethodDescriptor, MethodsClassReflectionExtension, ReflectionBridge,
	TemplateTypeMap, Trinary,
};
