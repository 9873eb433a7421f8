use std::fs;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use tempfile::TempDir;
use weave_cli::{Config, generate_analyzers};
use weave_registry::{Behavior, Extensions, Member, Parameter, Signature, TypeHint, Value};

struct Greeter;

impl Behavior for Greeter {
	fn unit_name(&self) -> &str {
		"Greeter"
	}

	fn members(&self) -> Vec<Member> {
		vec![Member::operation(
			"hello",
			Signature::new(vec![Parameter::new("name", TypeHint::String)], TypeHint::String),
			|_, _, args| Ok(Value::from(format!("Hello, {}", args[0]))),
		)]
	}
}

fn setup() -> (TempDir, Config, Extensions) {
	let dir = tempfile::tempdir().unwrap();
	fs::write(dir.path().join("Cargo.lock"), "# lock\n").unwrap();
	let config = Config {
		lock_file: dir.path().join("Cargo.lock"),
		cache_file: Some(dir.path().join("cache.json")),
		output_dir: dir.path().join("out"),
		..Config::default()
	};

	let ext = Extensions::new(config.extensions());
	ext.declare_type("Widget2", true);
	ext.register("Widget2", Arc::new(Greeter) as Arc<dyn Behavior>)
		.unwrap();
	(dir, config, ext)
}

#[test]
fn test_writes_artifacts_under_namespace() {
	let (dir, config, ext) = setup();

	let report = generate_analyzers(&ext, &config, "App::Analyzers", None, false)
		.unwrap()
		.expect("unconditional run always generates");

	let artifact = dir.path().join("out/App/Analyzers/Widget2.json");
	assert_eq!(report.files, vec![artifact.clone()]);
	let json: serde_json::Value = serde_json::from_slice(&fs::read(artifact).unwrap()).unwrap();
	assert_eq!(json["methods"][0]["name"], "hello");
}

#[test]
fn test_output_override() {
	let (dir, config, ext) = setup();
	let other = dir.path().join("elsewhere");

	generate_analyzers(&ext, &config, "App", Some(other.as_path()), false).unwrap();

	assert!(other.join("App/_index.json").is_file());
	assert!(!config.output_dir.exists());
}

#[test]
fn test_if_stale_skips_unchanged_registrations() {
	let (_dir, config, ext) = setup();

	assert!(generate_analyzers(&ext, &config, "App", None, true).unwrap().is_some());
	assert!(generate_analyzers(&ext, &config, "App", None, true).unwrap().is_none());
	assert!(generate_analyzers(&ext, &config, "App", None, false).unwrap().is_some());
}

#[test]
fn test_invalid_namespace_fails() {
	let (_dir, config, ext) = setup();

	let err = generate_analyzers(&ext, &config, "App::9lives", None, false).unwrap_err();

	assert!(err.to_string().contains("invalid namespace"));
	assert!(!config.output_dir.exists());
}

#[test]
fn test_if_stale_generates_new_namespace_and_missing_output() {
	let (_dir, config, ext) = setup();
	assert!(generate_analyzers(&ext, &config, "App", None, true).unwrap().is_some());

	assert!(generate_analyzers(&ext, &config, "Other", None, true).unwrap().is_some());
	assert!(config.output_dir.join("Other/_index.json").is_file());

	fs::remove_dir_all(&config.output_dir).unwrap();
	assert!(generate_analyzers(&ext, &config, "App", None, true).unwrap().is_some());
	assert!(config.output_dir.join("App/Widget2.json").is_file());
}
