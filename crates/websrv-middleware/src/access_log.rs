//! Access logging
//!
//! One `info` event per request with the fields of a Google Cloud style
//! `httpRequest` entry. Events use the `access` target so they can be filtered
//! separately from application logs.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use websrv_http::{Handler, Middleware, Request, Response, Result};

use crate::request_id::RequestId;
use crate::timer::log_enter;

/// Logs each request after the response is produced
pub struct AccessLogMiddleware;

impl AccessLogMiddleware {
	/// # Examples
	///
	/// ```
	/// use std::sync::Arc;
	/// use websrv_middleware::AccessLogMiddleware;
	/// use websrv_http::{Handler, Middleware, Request, Response};
	///
	/// struct Ok200;
	///
	/// #[async_trait::async_trait]
	/// impl Handler for Ok200 {
	///     async fn handle(&self, _request: Request) -> websrv_http::Result<Response> {
	///         Ok(Response::ok().with_body("hello"))
	///     }
	/// }
	///
	/// # tokio_test::block_on(async {
	/// let request = Request::builder().uri("/index.html").build().unwrap();
	/// let response = AccessLogMiddleware::new()
	///     .process(request, Arc::new(Ok200))
	///     .await
	///     .unwrap();
	/// assert_eq!(response.body, "hello");
	/// # });
	/// ```
	pub fn new() -> Self {
		Self
	}
}

impl Default for AccessLogMiddleware {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl Middleware for AccessLogMiddleware {
	async fn process(&self, request: Request, next: Arc<dyn Handler>) -> Result<Response> {
		log_enter(&request, "access-log");
		let start = Instant::now();
		let method = request.method.clone();
		let url = request.full_url();
		let user_agent = request.user_agent().to_string();
		let referer = request.referer().to_string();
		let remote_ip = request.remote_ip();
		let request_id = request
			.extensions
			.get::<RequestId>()
			.map(|RequestId(id)| id)
			.unwrap_or_default();

		let result = next.handle(request).await;

		let (status, size) = match &result {
			Ok(response) => (response.status.as_u16(), response.body.len()),
			Err(error) => (error.status_code().as_u16(), 0),
		};
		tracing::info!(
			target: "access",
			request_id = %request_id,
			method = %method,
			url = %url,
			status,
			size,
			user_agent = %user_agent,
			remote_ip = %remote_ip,
			referer = %referer,
			latency = %format!("{:.9}s", start.elapsed().as_secs_f64()),
			"request served"
		);

		result
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use hyper::StatusCode;
	use rstest::rstest;
	use websrv_http::Error;

	struct FailingHandler;

	#[async_trait]
	impl Handler for FailingHandler {
		async fn handle(&self, _request: Request) -> Result<Response> {
			Err(Error::Internal("boom".to_string()))
		}
	}

	#[rstest]
	#[tokio::test]
	async fn test_errors_pass_through() {
		let request = Request::builder()
			.uri("/missing")
			.header("user-agent", "test-agent")
			.build()
			.unwrap();

		let result = AccessLogMiddleware::new()
			.process(request, Arc::new(FailingHandler))
			.await;

		let error = result.unwrap_err();
		assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
	}
}
