use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "listsync")]
#[command(about = "Edit a shared list from the terminal")]
#[command(version)]
/// Command-line arguments.
pub struct Cli {
	/// Origin of the hosting page (e.g. http://localhost:3333); the socket is at /ws
	pub origin: Option<String>,

	/// Explicit socket URL, overriding the origin
	#[arg(long, value_name = "URL")]
	pub endpoint: Option<String>,

	/// Config file (defaults to $LISTSYNC_CONFIG or the user config dir)
	#[arg(short, long, value_name = "PATH")]
	pub config: Option<PathBuf>,

	/// Delay before reconnecting after an unexpected close
	#[arg(long, value_name = "MS")]
	pub retry_delay_ms: Option<u64>,

	/// Do not reconnect for a fresh snapshot after a patch fails to apply
	#[arg(long)]
	pub no_resync: bool,

	/// Run against an in-process authority instead of a server
	#[arg(long)]
	pub loopback: bool,

	/// Verbose logging
	#[arg(short, long)]
	pub verbose: bool,
}
