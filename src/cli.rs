use clap::Parser;
use std::path::PathBuf;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "websrv")]
#[command(about = "Static file server for single-page applications", long_about = None)]
#[command(version)]
pub struct Cli {
	/// YAML configuration file, overridden by WEBSRV_ environment variables
	#[arg(short = 'c', long = "conf", value_name = "FILE")]
	pub conf: Option<PathBuf>,

	/// Directory to serve
	#[arg(value_name = "TARGET_DIR")]
	pub target_dir: PathBuf,
}
