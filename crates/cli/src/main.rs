//! listsync terminal client.
//!
//! Renders the shared list on stdout and reads edit commands from stdin.
//! Logs go to stderr.

mod app;
mod cli;
mod command;
mod config;
mod render;

use clap::Parser;
use cli::Cli;
use config::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();
	let file = config::load(&cli)?;
	let settings = Settings::resolve(&cli, file)?;

	setup_tracing(settings.verbose, settings.log.as_deref());
	tracing::info!(endpoint = %settings.endpoint, loopback = settings.loopback, "cli.start");

	app::run(settings).await
}

fn setup_tracing(verbose: bool, directive: Option<&str>) {
	use tracing_subscriber::EnvFilter;

	// RUST_LOG wins, then --verbose, then the config file
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match (verbose, directive) {
		(true, _) => EnvFilter::new("debug"),
		(false, Some(directive)) => EnvFilter::new(directive),
		(false, None) => EnvFilter::new("info"),
	});

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_target(true)
		.init();
}
