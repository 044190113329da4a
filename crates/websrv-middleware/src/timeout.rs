//! Upper bound on the time spent producing a response

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use websrv_http::{Error, Handler, Middleware, Request, Response, Result};

use crate::timer::log_enter;

/// Answers 504 when the rest of the pipeline takes longer than `timeout`
///
/// The inner future is dropped on expiry, which cancels the work still in
/// flight for the request.
pub struct WriteTimeoutMiddleware {
	timeout: Duration,
}

impl WriteTimeoutMiddleware {
	pub fn new(timeout: Duration) -> Self {
		Self { timeout }
	}

	pub fn timeout(&self) -> Duration {
		self.timeout
	}
}

#[async_trait]
impl Middleware for WriteTimeoutMiddleware {
	async fn process(&self, request: Request, next: Arc<dyn Handler>) -> Result<Response> {
		log_enter(&request, "write-timeout");
		let path = request.path().to_string();

		match tokio::time::timeout(self.timeout, next.handle(request)).await {
			Ok(result) => result,
			Err(_) => {
				tracing::warn!(path = %path, timeout = ?self.timeout, "request exceeded write timeout");
				Ok(Response::from(Error::Timeout(self.timeout)))
			}
		}
	}
}
