//! Request id generation
//!
//! Every request gets a random 32 character id. It is stored in the request
//! extensions as [`RequestId`] and attached to a `tracing` span wrapping the
//! rest of the pipeline, so all events logged while serving the request carry
//! it.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::Instrument;
use websrv_http::{Error, Handler, Middleware, Request, Response, Result};
use websrv_utils::BufferedRandomIdGenerator;

use crate::timer::log_enter;

/// Length of generated request ids
pub const REQUEST_ID_LENGTH: usize = 32;

/// Number of ids kept ready by the generator
pub const REQUEST_ID_BUFFER: usize = 16;

/// Request extension holding the request id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

/// Assigns a [`RequestId`] to each request
pub struct RequestIdMiddleware {
	generator: Arc<BufferedRandomIdGenerator>,
}

impl RequestIdMiddleware {
	/// Create the stage with its own id generator
	///
	/// # Examples
	///
	/// ```
	/// use std::sync::Arc;
	/// use websrv_middleware::request_id::{RequestId, RequestIdMiddleware};
	/// use websrv_http::{Handler, Middleware, Request, Response};
	///
	/// struct IdEcho;
	///
	/// #[async_trait::async_trait]
	/// impl Handler for IdEcho {
	///     async fn handle(&self, request: Request) -> websrv_http::Result<Response> {
	///         let RequestId(id) = request.extensions.get::<RequestId>().unwrap();
	///         Ok(Response::ok().with_body(id))
	///     }
	/// }
	///
	/// # #[tokio::main]
	/// # async fn main() {
	/// let middleware = RequestIdMiddleware::new();
	/// let request = Request::builder().uri("/").build().unwrap();
	/// let response = middleware.process(request, Arc::new(IdEcho)).await.unwrap();
	/// assert_eq!(response.body.len(), 32);
	/// # }
	/// ```
	pub fn new() -> Self {
		Self::with_generator(Arc::new(BufferedRandomIdGenerator::new(
			REQUEST_ID_LENGTH,
			REQUEST_ID_BUFFER,
		)))
	}

	/// Draw ids from an existing generator
	pub fn with_generator(generator: Arc<BufferedRandomIdGenerator>) -> Self {
		Self { generator }
	}
}

#[async_trait]
impl Middleware for RequestIdMiddleware {
	async fn process(&self, request: Request, next: Arc<dyn Handler>) -> Result<Response> {
		log_enter(&request, "request-id");
		let id = self
			.generator
			.get()
			.await
			.ok_or_else(|| Error::Internal("request id generator closed".to_string()))?;

		let span = tracing::info_span!("request", request_id = %id);
		request.extensions.insert(RequestId(id));
		next.handle(request).instrument(span).await
	}
}
