//! `weave` binary.

fn main() -> anyhow::Result<()> {
	weave_cli::main()
}
