//! Listeners bound to ephemeral ports

use async_trait::async_trait;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use websrv_http::{Error, Handler, Request, Response, Result};
use websrv_server::{HttpServer, ShutdownCoordinator, bind};

/// A server running in a background task
pub struct RunningServer {
	pub addr: SocketAddr,
	pub coordinator: ShutdownCoordinator,
	pub task: JoinHandle<websrv_server::Result<()>>,
}

impl RunningServer {
	/// Trigger shutdown and wait for the server task
	pub async fn stop(self) -> websrv_server::Result<()> {
		self.coordinator.shutdown();
		self.task.await.unwrap()
	}
}

/// Serve `handler` on `127.0.0.1:0`
pub async fn start(handler: Arc<dyn Handler>, shutdown_timeout: Duration) -> RunningServer {
	let listener = bind("127.0.0.1:0".parse().unwrap()).await.unwrap();
	let addr = listener.local_addr().unwrap();
	let coordinator = ShutdownCoordinator::new(shutdown_timeout);

	let server = HttpServer::new(handler)
		.with_name("test")
		.with_read_timeout(Duration::from_secs(1));
	let task = tokio::spawn(server.serve(listener, coordinator.clone()));

	RunningServer {
		addr,
		coordinator,
		task,
	}
}

/// Write `request` verbatim and read until the server closes the connection
pub async fn raw_request(addr: SocketAddr, request: &str) -> String {
	let mut stream = TcpStream::connect(addr).await.unwrap();
	stream.write_all(request.as_bytes()).await.unwrap();

	let mut buffer = Vec::new();
	stream.read_to_end(&mut buffer).await.unwrap();
	String::from_utf8(buffer).unwrap()
}

/// Answers with the method, path and client address it saw
pub struct WhoAmIHandler;

#[async_trait]
impl Handler for WhoAmIHandler {
	async fn handle(&self, request: Request) -> Result<Response> {
		if request.path() == "/fail" {
			return Err(Error::Internal("database password is hunter2".to_string()));
		}
		let remote = request
			.remote_addr
			.map(|addr| addr.ip().to_string())
			.unwrap_or_default();
		Ok(Response::ok().with_body(format!("{} {} {}", request.method, request.path(), remote)))
	}
}

/// Sleeps before answering
pub struct SlowHandler(pub Duration);

#[async_trait]
impl Handler for SlowHandler {
	async fn handle(&self, _request: Request) -> Result<Response> {
		tokio::time::sleep(self.0).await;
		Ok(Response::ok().with_body("done"))
	}
}
