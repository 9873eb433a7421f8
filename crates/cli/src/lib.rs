//! `weave` command-line entry point.
//!
//! The binary bootstraps an [`Extensions`] registry from every declaration linked into it, so an
//! application that wants its own mixins analyzed builds a binary that links its crates and calls
//! [`main`]:
//!
//! ```ignore
//! use my_app as _;
//!
//! fn main() -> anyhow::Result<()> {
//! 	weave_cli::main()
//! }
//! ```

pub mod cli;
pub mod config;

use std::env;
use std::path::Path;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing::subscriber::SetGlobalDefaultError;
use weave_analyzer::{
	AnalyzerAction, DirtyCache, GenerationReport, Namespace, ReflectionBridge, generate,
};
use weave_registry::Extensions;

pub use cli::{Cli, Command};
pub use config::{Config, ConfigError};

pub const LOG_ENV: &str = "WEAVE_LOG";

/// Parses arguments, installs logging and runs the command.
pub fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();
	init_logging(cli.verbose)?;
	run(&cli)
}

/// Installs a stderr `fmt` subscriber. DEBUG when `verbose` or `WEAVE_LOG=debug`.
///
/// Fails if a global subscriber is already installed.
pub fn init_logging(verbose: bool) -> Result<(), SetGlobalDefaultError> {
	let debug = verbose || env::var(LOG_ENV).is_ok_and(|v| v.eq_ignore_ascii_case("debug"));
	let subscriber = tracing_subscriber::fmt()
		.with_max_level(if debug {
			tracing::Level::DEBUG
		} else {
			tracing::Level::INFO
		})
		.with_writer(std::io::stderr)
		.finish();

	tracing::subscriber::set_global_default(subscriber)
}

pub fn run(cli: &Cli) -> anyhow::Result<()> {
	let config = match &cli.config {
		Some(path) => Config::load(path)?,
		None => Config::discover()?,
	};

	match &cli.command {
		Command::GenerateAnalyzers {
			namespace,
			output,
			if_stale,
		} => {
			let extensions = Extensions::bootstrap(config.extensions())
				.context("applying registered mixins")?;
			let report = generate_analyzers(
				&extensions,
				&config,
				namespace,
				output.as_deref(),
				*if_stale,
			)?;
			if report.is_none() {
				info!(namespace = %namespace, "analyzer artifacts already current");
			}
			Ok(())
		}
	}
}

/// Writes analyzer artifacts for `extensions` under `namespace`.
///
/// With `if_stale`, generation is skipped (`Ok(None)`) when the dirty cache has already seen the
/// current registrations.
pub fn generate_analyzers(
	extensions: &Extensions,
	config: &Config,
	namespace: &str,
	output: Option<&Path>,
	if_stale: bool,
) -> anyhow::Result<Option<GenerationReport>> {
	let namespace = Namespace::parse(namespace)?;
	let output_dir = output.unwrap_or(&config.output_dir);

	if if_stale {
		let cache = DirtyCache::new(config.cache_file(), &config.lock_file);
		let mut action = AnalyzerAction::new(extensions.ledger(), cache, namespace, output_dir);
		return action.run_if_due().context("generating analyzer artifacts");
	}

	let report = generate(
		&ReflectionBridge::new(extensions.ledger()),
		&namespace,
		output_dir,
	)
	.context("generating analyzer artifacts")?;
	Ok(Some(report))
}
