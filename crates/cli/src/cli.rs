use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "weave")]
#[command(about = "Runtime operation injection toolkit")]
#[command(version)]
/// Command-line arguments.
pub struct Cli {
	/// Config file (defaults to $WEAVE_CONFIG, then ./weave.toml)
	#[arg(long, short = 'c', value_name = "PATH", global = true)]
	pub config: Option<PathBuf>,

	/// Verbose logging
	#[arg(long, short = 'v', global = true)]
	pub verbose: bool,

	#[command(subcommand)]
	pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
	/// Write analyzer artifacts for every registered operation
	GenerateAnalyzers {
		/// Target namespace, e.g. App::Analyzers
		namespace: String,

		/// Output root (overrides `output_dir` from the config)
		#[arg(long, short = 'o', value_name = "DIR")]
		output: Option<PathBuf>,

		/// Skip generation when the registrations have not changed since the last run
		#[arg(long)]
		if_stale: bool,
	},
}
