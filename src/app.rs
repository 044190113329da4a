//! Running the webserver and health listeners
//!
//! On shutdown the webserver drains first. The health listener keeps
//! answering until the webserver has stopped, then gets
//! [`HEALTH_SHUTDOWN_TIMEOUT`] to close.

use std::future::Future;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use tokio::net::TcpListener;
use websrv_conf::Settings;
use websrv_server::{HttpServer, ShutdownCoordinator, bind, shutdown_after_signal};

use crate::error::{AppError, Result};
use crate::pipeline::{Pipeline, health_pipeline, webserver_pipeline};

/// Time the health listener gets to close once the webserver has stopped
pub const HEALTH_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

struct Listener {
	listener: TcpListener,
	addr: SocketAddr,
	pipeline: Pipeline,
}

impl Listener {
	async fn bind(port: u16, pipeline: Pipeline) -> Result<Self> {
		let listener = bind(SocketAddr::from(([0, 0, 0, 0], port))).await?;
		let addr = listener.local_addr().map_err(websrv_server::ServerError::from)?;
		Ok(Self {
			listener,
			addr,
			pipeline,
		})
	}
}

/// websrv with its listeners bound and pipelines built
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use websrv::Websrv;
/// use websrv_conf::Settings;
/// use websrv_server::shutdown_signal;
///
/// # async fn example() -> websrv::Result<()> {
/// let app = Websrv::bind(Settings::default(), Path::new("./dist")).await?;
/// println!("serving on {}", app.webserver_addr());
/// app.run_until(shutdown_signal()).await
/// # }
/// ```
pub struct Websrv {
	settings: Settings,
	webserver: Listener,
	health: Option<Listener>,
}

impl Websrv {
	/// Build the pipelines and bind `port.webserver` and, if enabled,
	/// `port.health` on all interfaces
	///
	/// # Errors
	///
	/// Returns [`AppError::TargetDir`] if `target_dir` is not a directory, the
	/// pipeline construction errors and [`AppError::Server`] for bind failures.
	pub async fn bind(settings: Settings, target_dir: &Path) -> Result<Self> {
		if !target_dir.is_dir() {
			return Err(AppError::TargetDir(target_dir.to_path_buf()));
		}

		let pipeline = webserver_pipeline(&settings, target_dir)?;
		tracing::info!(
			stages = ?pipeline.stage_names(),
			handler = pipeline.handler_name(),
			"built webserver pipeline"
		);
		let webserver = Listener::bind(settings.port.webserver, pipeline).await?;

		let health = if settings.health {
			Some(Listener::bind(settings.port.health, health_pipeline(&settings)).await?)
		} else {
			None
		};

		Ok(Self {
			settings,
			webserver,
			health,
		})
	}

	pub fn webserver_addr(&self) -> SocketAddr {
		self.webserver.addr
	}

	pub fn health_addr(&self) -> Option<SocketAddr> {
		self.health.as_ref().map(|health| health.addr)
	}

	/// Serve until `signal` resolves, then shut down gracefully
	///
	/// # Errors
	///
	/// Returns the first error of either listener.
	pub async fn run_until<F>(self, signal: F) -> Result<()>
	where
		F: Future<Output = ()> + Send + 'static,
	{
		let Self {
			settings,
			webserver,
			health,
		} = self;

		let coordinator = ShutdownCoordinator::new(settings.timeout.shutdown());
		tokio::spawn(shutdown_after_signal(
			signal,
			settings.shutdown_delay(),
			coordinator.clone(),
		));

		let webserver_task = tokio::spawn(
			HttpServer::new(webserver.pipeline.into_handler())
				.with_name("webserver")
				.with_read_timeout(settings.timeout.read())
				.serve(webserver.listener, coordinator),
		);

		let health = health.map(|health| {
			let coordinator = ShutdownCoordinator::new(HEALTH_SHUTDOWN_TIMEOUT);
			let task = tokio::spawn(
				HttpServer::new(health.pipeline.into_handler())
					.with_name("health")
					.with_read_timeout(settings.timeout.read())
					.serve(health.listener, coordinator.clone()),
			);
			(coordinator, task)
		});

		let webserver_result = webserver_task.await;

		if let Some((coordinator, task)) = health {
			coordinator.shutdown();
			task.await??;
		}
		webserver_result??;

		tracing::info!("shutdown complete");
		Ok(())
	}
}
