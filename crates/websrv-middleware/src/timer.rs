//! Request timing
//!
//! [`TimerMiddleware`] stores the instant a request entered the pipeline.
//! Later stages call [`log_enter`] so the debug log shows how long each stage
//! took to be reached.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use websrv_http::{Handler, Middleware, Request, Response, Result};

/// Request extension holding the pipeline start time
#[derive(Debug, Clone, Copy)]
pub struct RequestStart(pub Instant);

/// Time since the request entered the timer stage
pub fn elapsed(request: &Request) -> Option<Duration> {
	request
		.extensions
		.get::<RequestStart>()
		.map(|RequestStart(start)| start.elapsed())
}

/// Log entry into the stage `name` at debug level
pub fn log_enter(request: &Request, name: &str) {
	match elapsed(request) {
		Some(since_start) => {
			tracing::debug!(stage = name, ?since_start, "entering {}", name)
		}
		None => tracing::debug!(stage = name, "entering {}", name),
	}
}

/// Stores a [`RequestStart`] in the request extensions
pub struct TimerMiddleware;

impl TimerMiddleware {
	/// # Examples
	///
	/// ```
	/// use std::sync::Arc;
	/// use websrv_middleware::timer::{TimerMiddleware, elapsed};
	/// use websrv_http::{Handler, Middleware, Request, Response};
	///
	/// struct Echo;
	///
	/// #[async_trait::async_trait]
	/// impl Handler for Echo {
	///     async fn handle(&self, request: Request) -> websrv_http::Result<Response> {
	///         assert!(elapsed(&request).is_some());
	///         Ok(Response::ok())
	///     }
	/// }
	///
	/// # tokio_test::block_on(async {
	/// let request = Request::builder().uri("/").build().unwrap();
	/// let response = TimerMiddleware::new().process(request, Arc::new(Echo)).await.unwrap();
	/// assert_eq!(response.status, hyper::StatusCode::OK);
	/// # });
	/// ```
	pub fn new() -> Self {
		Self
	}
}

impl Default for TimerMiddleware {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl Middleware for TimerMiddleware {
	async fn process(&self, request: Request, next: Arc<dyn Handler>) -> Result<Response> {
		request.extensions.insert(RequestStart(Instant::now()));
		next.handle(request).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	struct ElapsedHandler;

	#[async_trait]
	impl Handler for ElapsedHandler {
		async fn handle(&self, request: Request) -> Result<Response> {
			log_enter(&request, "test");
			let since_start = elapsed(&request).map(|d| d.as_nanos()).unwrap_or_default();
			Ok(Response::ok().with_body(since_start.to_string()))
		}
	}

	#[rstest]
	fn test_elapsed_without_timer() {
		let request = Request::builder().build().unwrap();

		assert!(elapsed(&request).is_none());
	}

	#[rstest]
	#[tokio::test]
	async fn test_timer_inserts_start() {
		let request = Request::builder().build().unwrap();

		let response = TimerMiddleware::new()
			.process(request, Arc::new(ElapsedHandler))
			.await
			.unwrap();

		let nanos: u128 = String::from_utf8(response.body.to_vec())
			.unwrap()
			.parse()
			.unwrap();
		assert!(nanos < Duration::from_secs(5).as_nanos());
	}
}
