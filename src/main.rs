use anyhow::Context;
use clap::Parser;
use websrv::{Cli, Websrv, init_logging};
use websrv_conf::load_settings;
use websrv_server::shutdown_signal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();

	let settings = load_settings(cli.conf.as_deref()).context("Error reading configuration")?;
	init_logging(&settings.log).context("Error setting up logging")?;
	tracing::debug!(?settings, "loaded configuration");

	let app = Websrv::bind(settings, &cli.target_dir)
		.await
		.context("Error during initialization")?;
	tracing::info!(
		webserver = %app.webserver_addr(),
		health = ?app.health_addr(),
		"websrv started"
	);

	app.run_until(shutdown_signal()).await.context("Error from server")
}
