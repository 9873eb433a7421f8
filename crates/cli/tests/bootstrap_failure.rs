//! A linked mixin aimed at a sealed type makes the command fail.

use std::fs;

use clap::Parser;
use weave_cli::{Cli, run};
use weave_registry::{Behavior, Member, Signature, Value};

struct Greeter;

impl Behavior for Greeter {
	fn unit_name(&self) -> &str {
		"Greeter"
	}

	fn members(&self) -> Vec<Member> {
		vec![Member::operation("hello", Signature::default(), |_, _, _| {
			Ok(Value::from("hi"))
		})]
	}
}

weave_registry::declare_type!("cli::Sealed", sealed);
weave_registry::composition!("cli::Greets" => Greeter);
weave_registry::mixin!("cli::Sealed", "cli::Greets");

#[test]
fn test_mixin_onto_sealed_type_fails_the_command() {
	let dir = tempfile::tempdir().unwrap();
	let config = dir.path().join("weave.toml");
	fs::write(&config, "output_dir = \"out\"\n").unwrap();
	let cli = Cli::try_parse_from([
		"weave",
		"--config",
		config.to_str().unwrap(),
		"generate-analyzers",
		"App",
	])
	.unwrap();

	let err = run(&cli).unwrap_err();

	assert!(
		format!("{err:#}").contains("destination must support dynamic operation registration"),
		"unexpected error: {err:#}"
	);
	assert!(!dir.path().join("out").exists());
}
