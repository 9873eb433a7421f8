use std::fs;
use std::sync::Arc;

use super::*;
use crate::signature::Signature;
use crate::unit::Member;
use crate::{TypeName, Value};

struct Hello;

impl Behavior for Hello {
	fn unit_name(&self) -> &str {
		"Hello"
	}

	fn members(&self) -> Vec<Member> {
		vec![Member::operation("hi", Signature::default(), |_, _, _| {
			Ok(Value::from("hi"))
		})]
	}
}

fn compositions() -> Compositions {
	let mut c = Compositions::new();
	c.define(
		"app::Hello",
		UnitKind::Composable,
		Arc::new(|| Arc::new(Hello) as Arc<dyn Behavior>),
	);
	c
}

fn call_hi(unit: &Arc<dyn Behavior>) -> Value {
	let ops = crate::extract(unit);
	let scope = TypeName::new("T");
	let cx = crate::CallContext {
		receiver: None,
		scope: &scope,
		operation: "hi",
	};
	ops["hi"].call(&cx, &[]).expect("hi should succeed")
}

#[test]
fn test_instance_passes_through() {
	let instance: Arc<dyn Behavior> = Arc::new(Hello);
	let materializer = UnitMaterializer::in_memory();
	let out = materializer
		.materialize(&compositions(), &UnitRef::Instance(Arc::clone(&instance)))
		.unwrap();
	assert!(Arc::ptr_eq(&instance, &out));
}

#[test]
fn test_in_memory_named_resolution() {
	let materializer = UnitMaterializer::in_memory();
	let unit = materializer
		.materialize(&compositions(), &UnitRef::named("app::Hello"))
		.unwrap();
	assert_eq!(call_hi(&unit), Value::from("hi"));
	assert!(materializer.wrapper_path("app::Hello").is_none());
}

#[test]
fn test_wrapper_written_once_and_never_rewritten() {
	let dir = tempfile::tempdir().unwrap();
	let c = compositions();

	let first = UnitMaterializer::with_dir(dir.path());
	let path = first.wrapper_path("app::Hello").unwrap();
	assert!(!path.exists());
	let unit = first.materialize(&c, &UnitRef::named("app::Hello")).unwrap();
	assert!(path.exists());
	assert!(
		path.file_name()
			.unwrap()
			.to_string_lossy()
			.starts_with("app__Hello-")
	);

	// Same record, different bytes: a rewrite would restore pretty formatting.
	let compact = r#"{"unit":"app::Hello","composes":"app::Hello","kind":"composable"}"#;
	fs::write(&path, compact).unwrap();

	let second = UnitMaterializer::with_dir(dir.path());
	let again = second.materialize(&c, &UnitRef::named("app::Hello")).unwrap();
	assert_eq!(fs::read_to_string(&path).unwrap(), compact);
	assert_eq!(call_hi(&unit), call_hi(&again));
}

#[test]
fn test_loaded_wrapper_is_not_reread() {
	let dir = tempfile::tempdir().unwrap();
	let c = compositions();
	let materializer = UnitMaterializer::with_dir(dir.path());
	materializer
		.materialize(&c, &UnitRef::named("app::Hello"))
		.unwrap();
	assert!(materializer.is_loaded("app::Hello"));

	fs::write(materializer.wrapper_path("app::Hello").unwrap(), "garbage").unwrap();
	assert!(
		materializer
			.materialize(&c, &UnitRef::named("app::Hello"))
			.is_ok()
	);
}

#[test]
fn test_corrupt_wrapper_aborts() {
	let dir = tempfile::tempdir().unwrap();
	let materializer = UnitMaterializer::with_dir(dir.path());
	fs::write(materializer.wrapper_path("app::Hello").unwrap(), "{not json").unwrap();

	let err = materializer
		.materialize(&compositions(), &UnitRef::named("app::Hello"))
		.err()
		.unwrap();
	assert!(matches!(err, MaterializeError::Corrupt { .. }));
}

#[test]
fn test_mismatched_wrapper_aborts() {
	let dir = tempfile::tempdir().unwrap();
	let materializer = UnitMaterializer::with_dir(dir.path());
	fs::write(
		materializer.wrapper_path("app::Hello").unwrap(),
		r#"{"unit":"Other","composes":"app::Hello","kind":"composable"}"#,
	)
	.unwrap();

	let err = materializer
		.materialize(&compositions(), &UnitRef::named("app::Hello"))
		.err()
		.unwrap();
	assert!(matches!(err, MaterializeError::Mismatch { ref found, .. } if found == "Other"));
}

#[test]
fn test_flush_removes_wrappers() {
	let dir = tempfile::tempdir().unwrap();
	let materializer = UnitMaterializer::with_dir(dir.path());
	materializer
		.materialize(&compositions(), &UnitRef::named("app::Hello"))
		.unwrap();

	assert_eq!(materializer.flush().unwrap(), 1);
	assert!(!materializer.is_loaded("app::Hello"));
	assert!(!materializer.wrapper_path("app::Hello").unwrap().exists());
}
