use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::Service;
use hyper_util::rt::{TokioIo, TokioTimer};
use hyper_util::server::graceful::GracefulShutdown;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use websrv_http::{Handler, Request, Response};

use crate::error::{Result, ServerError};
use crate::shutdown::ShutdownCoordinator;

/// Pause after a failed `accept` before trying again
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(50);

/// HTTP/1.1 listener driving a [`Handler`]
pub struct HttpServer {
	handler: Arc<dyn Handler>,
	name: String,
	read_timeout: Option<Duration>,
}

impl HttpServer {
	/// Create a new server with the given handler
	///
	/// # Examples
	///
	/// ```
	/// use std::sync::Arc;
	/// use std::time::Duration;
	/// use websrv_server::{HealthHandler, HttpServer};
	///
	/// let server = HttpServer::new(Arc::new(HealthHandler))
	///     .with_name("health")
	///     .with_read_timeout(Duration::from_secs(10));
	///
	/// assert_eq!(server.name(), "health");
	/// ```
	pub fn new(handler: Arc<dyn Handler>) -> Self {
		Self {
			handler,
			name: "webserver".to_string(),
			read_timeout: None,
		}
	}

	/// Name used in log events
	pub fn with_name(mut self, name: impl Into<String>) -> Self {
		self.name = name.into();
		self
	}

	/// Close connections whose request headers take longer than `timeout`
	pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
		self.read_timeout = Some(timeout);
		self
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	/// Bind `addr` and serve until `coordinator` signals shutdown
	///
	/// # Errors
	///
	/// Returns [`ServerError::Bind`] when the address cannot be bound.
	///
	/// # Examples
	///
	/// ```no_run
	/// use std::sync::Arc;
	/// use std::time::Duration;
	/// use websrv_server::{HealthHandler, HttpServer, ShutdownCoordinator};
	///
	/// # async fn example() -> Result<(), websrv_server::ServerError> {
	/// let coordinator = ShutdownCoordinator::new(Duration::from_secs(5));
	/// HttpServer::new(Arc::new(HealthHandler))
	///     .listen_with_shutdown("0.0.0.0:8081".parse().unwrap(), coordinator)
	///     .await?;
	/// # Ok(())
	/// # }
	/// ```
	pub async fn listen_with_shutdown(
		self,
		addr: SocketAddr,
		coordinator: ShutdownCoordinator,
	) -> Result<()> {
		let listener = bind(addr).await?;
		self.serve(listener, coordinator).await
	}

	/// Serve connections from an already bound listener
	///
	/// After shutdown is requested the listener is closed, open connections
	/// finish their current request and close, and the call returns once
	/// they are gone or [`ShutdownCoordinator::timeout`] has elapsed.
	/// Connections still open at that point are abandoned.
	///
	/// # Errors
	///
	/// Returns [`ServerError::Io`] if the listener's address cannot be read.
	pub async fn serve(self, listener: TcpListener, coordinator: ShutdownCoordinator) -> Result<()> {
		let local_addr = listener.local_addr()?;
		tracing::info!(server = %self.name, addr = %local_addr, "listening");

		let mut builder = http1::Builder::new();
		if let Some(timeout) = self.read_timeout {
			builder.timer(TokioTimer::new()).header_read_timeout(timeout);
		}

		let graceful = GracefulShutdown::new();
		let shutdown = coordinator.wait_for_shutdown();
		tokio::pin!(shutdown);

		loop {
			tokio::select! {
				result = listener.accept() => {
					let (stream, remote_addr) = match result {
						Ok(accepted) => accepted,
						Err(error) => {
							tracing::warn!(server = %self.name, %error, "failed to accept connection");
							tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
							continue;
						}
					};

					let service = RequestService {
						handler: self.handler.clone(),
						remote_addr,
					};
					let connection = graceful.watch(builder.serve_connection(TokioIo::new(stream), service));
					let name = self.name.clone();

					tokio::task::spawn(async move {
						if let Err(error) = connection.await {
							tracing::debug!(server = %name, %remote_addr, %error, "connection closed with error");
						}
					});
				}
				() = &mut shutdown => {
					tracing::info!(server = %self.name, "stopped accepting connections");
					break;
				}
			}
		}

		drop(listener);

		match tokio::time::timeout(coordinator.timeout(), graceful.shutdown()).await {
			Ok(()) => tracing::info!(server = %self.name, "all connections closed"),
			Err(_) => tracing::warn!(
				server = %self.name,
				timeout_secs = coordinator.timeout().as_secs_f64(),
				"shutdown timed out with connections still open"
			),
		}

		coordinator.notify_shutdown_complete();
		Ok(())
	}
}

/// Bind a TCP listener on `addr`
///
/// # Errors
///
/// Returns [`ServerError::Bind`] naming the address.
pub async fn bind(addr: SocketAddr) -> Result<TcpListener> {
	TcpListener::bind(addr)
		.await
		.map_err(|source| ServerError::Bind { addr, source })
}

/// Service implementation for hyper
struct RequestService {
	handler: Arc<dyn Handler>,
	remote_addr: SocketAddr,
}

impl Service<hyper::Request<Incoming>> for RequestService {
	type Response = hyper::Response<Full<Bytes>>;
	type Error = Box<dyn std::error::Error + Send + Sync>;
	type Future = Pin<Box<dyn Future<Output = std::result::Result<Self::Response, Self::Error>> + Send + 'static>>;

	fn call(&self, req: hyper::Request<Incoming>) -> Self::Future {
		let handler = self.handler.clone();
		let remote_addr = self.remote_addr;

		Box::pin(async move {
			let (parts, body) = req.into_parts();
			let body = body.collect().await?.to_bytes();

			let mut request = Request::new(parts.method, parts.uri, parts.version, parts.headers, body);
			request.remote_addr = Some(remote_addr);

			// Stages turn expected failures into responses themselves; anything
			// reaching this point only gets the status and its reason phrase.
			let response = handler.handle(request).await.unwrap_or_else(|error| {
				tracing::error!(%error, "request handler failed");
				Response::from(error)
			});

			Ok(into_hyper(response))
		})
	}
}

fn into_hyper(response: Response) -> hyper::Response<Full<Bytes>> {
	let mut hyper_response = hyper::Response::new(Full::new(response.body));
	*hyper_response.status_mut() = response.status;
	*hyper_response.headers_mut() = response.headers;
	hyper_response
}
