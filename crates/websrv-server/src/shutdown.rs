//! Shutdown coordination between the signal handler and the listeners
//!
//! A shutdown runs in three steps: a signal arrives, the configured delay
//! passes (so load balancers notice the instance going away), then every
//! listener subscribed to the [`ShutdownCoordinator`] stops accepting and
//! drains its connections within [`ShutdownCoordinator::timeout`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Broadcasts the shutdown request and reports when a listener has drained
///
/// Clones share the same state. Subscribers that start waiting after
/// [`shutdown`](Self::shutdown) was called return immediately.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use websrv_server::ShutdownCoordinator;
///
/// # tokio_test::block_on(async {
/// let coordinator = ShutdownCoordinator::new(Duration::from_secs(5));
/// assert!(!coordinator.is_shutting_down());
///
/// coordinator.shutdown();
/// coordinator.wait_for_shutdown().await;
/// assert!(coordinator.is_shutting_down());
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct ShutdownCoordinator {
	shutdown: Arc<watch::Sender<bool>>,
	complete: Arc<watch::Sender<bool>>,
	timeout: Duration,
}

impl ShutdownCoordinator {
	/// `timeout` bounds how long in-flight connections may take to finish
	pub fn new(timeout: Duration) -> Self {
		let (shutdown, _) = watch::channel(false);
		let (complete, _) = watch::channel(false);
		Self {
			shutdown: Arc::new(shutdown),
			complete: Arc::new(complete),
			timeout,
		}
	}

	pub fn timeout(&self) -> Duration {
		self.timeout
	}

	/// Ask every subscribed listener to stop
	pub fn shutdown(&self) {
		self.shutdown.send_replace(true);
	}

	pub fn is_shutting_down(&self) -> bool {
		*self.shutdown.borrow()
	}

	/// Resolve once [`shutdown`](Self::shutdown) has been called
	pub async fn wait_for_shutdown(&self) {
		let mut receiver = self.shutdown.subscribe();
		// The sender lives in `self`, so the channel cannot close while waiting.
		let _ = receiver.wait_for(|requested| *requested).await;
	}

	/// Mark the listener as stopped and drained
	pub fn notify_shutdown_complete(&self) {
		self.complete.send_replace(true);
	}

	/// Resolve once a listener has called [`notify_shutdown_complete`](Self::notify_shutdown_complete)
	pub async fn wait_for_completion(&self) {
		let mut receiver = self.complete.subscribe();
		let _ = receiver.wait_for(|complete| *complete).await;
	}
}

/// Resolve on interrupt (Ctrl-C) or, on Unix, `SIGTERM`
///
/// If a signal handler cannot be installed the error is logged and that
/// signal is never reported.
pub async fn shutdown_signal() {
	let interrupt = async {
		if let Err(error) = tokio::signal::ctrl_c().await {
			tracing::error!(%error, "failed to listen for interrupt");
			std::future::pending::<()>().await;
		}
	};

	#[cfg(unix)]
	let terminate = async {
		use tokio::signal::unix::{SignalKind, signal};

		match signal(SignalKind::terminate()) {
			Ok(mut stream) => {
				stream.recv().await;
			}
			Err(error) => {
				tracing::error!(%error, "failed to listen for SIGTERM");
				std::future::pending::<()>().await;
			}
		}
	};

	#[cfg(not(unix))]
	let terminate = std::future::pending::<()>();

	tokio::select! {
		() = interrupt => tracing::info!(signal = "interrupt", "shutdown signal received"),
		() = terminate => tracing::info!(signal = "SIGTERM", "shutdown signal received"),
	}
}

/// Wait for `signal`, then `delay`, then trigger `coordinator`
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use websrv_server::{ShutdownCoordinator, shutdown_after_signal};
///
/// # tokio_test::block_on(async {
/// let coordinator = ShutdownCoordinator::new(Duration::from_secs(5));
///
/// shutdown_after_signal(async {}, Duration::ZERO, coordinator.clone()).await;
///
/// assert!(coordinator.is_shutting_down());
/// # });
/// ```
pub async fn shutdown_after_signal<F>(signal: F, delay: Duration, coordinator: ShutdownCoordinator)
where
	F: Future<Output = ()>,
{
	signal.await;
	if !delay.is_zero() {
		tracing::info!(delay_secs = delay.as_secs_f64(), "delaying shutdown");
		tokio::time::sleep(delay).await;
	}
	tracing::info!("shutting down");
	coordinator.shutdown();
}
