//! Middleware and handler traits for HTTP request processing.
//!
//! A request travels through an ordered list of [`Middleware`] stages and ends
//! at a terminal [`Handler`]. Each stage may rewrite the request, answer it
//! directly, or post-process the response returned by the stages after it.
//!
//! ```rust
//! use websrv_http::{Handler, Middleware, Request, Response};
//! use async_trait::async_trait;
//! use std::sync::Arc;
//!
//! struct TracingMiddleware;
//!
//! #[async_trait]
//! impl Middleware for TracingMiddleware {
//!     async fn process(&self, request: Request, next: Arc<dyn Handler>) -> websrv_http::Result<Response> {
//!         println!("Request: {} {}", request.method, request.uri);
//!         next.handle(request).await
//!     }
//! }
//! ```

use async_trait::async_trait;
use std::sync::Arc;

use crate::{Request, Response, Result};

/// Handler trait for processing requests.
///
/// Handlers receive a request and produce a response or an error.
#[async_trait]
pub trait Handler: Send + Sync {
	/// Handles an HTTP request and produces a response.
	///
	/// # Errors
	///
	/// Returns an error if the request cannot be processed.
	async fn handle(&self, request: Request) -> Result<Response>;
}

/// Lets `Arc<dyn Handler>` be used wherever a handler is expected.
#[async_trait]
impl<T: Handler + ?Sized> Handler for Arc<T> {
	async fn handle(&self, request: Request) -> Result<Response> {
		(**self).handle(request).await
	}
}

/// Middleware trait for request/response processing.
#[async_trait]
pub trait Middleware: Send + Sync {
	/// Processes a request through this middleware.
	///
	/// # Arguments
	///
	/// * `request` - The incoming HTTP request
	/// * `next` - The next handler in the chain to call
	///
	/// # Errors
	///
	/// Returns an error if the middleware or next handler fails.
	async fn process(&self, request: Request, next: Arc<dyn Handler>) -> Result<Response>;

	/// Determines whether this middleware runs for the given request.
	///
	/// The check happens when the request reaches this stage, so it observes
	/// any rewrite done by the stages before it (for instance the cleaned path).
	/// When it returns `false` the request goes straight to the next stage.
	fn should_continue(&self, _request: &Request) -> bool {
		true
	}
}

/// Composes an ordered list of middleware around a terminal handler.
///
/// The first middleware added is the outermost one: it sees the request first
/// and the response last.
pub struct MiddlewareChain {
	middlewares: Vec<Arc<dyn Middleware>>,
	handler: Arc<dyn Handler>,
}

impl MiddlewareChain {
	/// Creates a new middleware chain with the given handler.
	///
	/// # Examples
	///
	/// ```rust
	/// use websrv_http::{MiddlewareChain, Handler, Request, Response};
	/// use std::sync::Arc;
	///
	/// struct NotFound;
	///
	/// #[async_trait::async_trait]
	/// impl Handler for NotFound {
	///     async fn handle(&self, _request: Request) -> websrv_http::Result<Response> {
	///         Ok(Response::not_found())
	///     }
	/// }
	///
	/// let chain = MiddlewareChain::new(Arc::new(NotFound));
	/// assert!(chain.is_empty());
	/// ```
	pub fn new(handler: Arc<dyn Handler>) -> Self {
		Self {
			middlewares: Vec::new(),
			handler,
		}
	}

	/// Adds a middleware to the chain using builder pattern.
	pub fn with_middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
		self.middlewares.push(middleware);
		self
	}

	/// Adds a middleware to the chain.
	pub fn add_middleware(&mut self, middleware: Arc<dyn Middleware>) {
		self.middlewares.push(middleware);
	}

	/// Number of middleware stages in front of the handler.
	pub fn len(&self) -> usize {
		self.middlewares.len()
	}

	pub fn is_empty(&self) -> bool {
		self.middlewares.is_empty()
	}

	/// Folds the chain into a single handler.
	///
	/// Useful when the same chain serves many requests: the composition is done
	/// once instead of on every call to [`Handler::handle`].
	pub fn into_handler(self) -> Arc<dyn Handler> {
		self.middlewares
			.into_iter()
			.rev()
			.fold(self.handler, |next, middleware| {
				Arc::new(ComposedHandler { middleware, next }) as Arc<dyn Handler>
			})
	}
}

#[async_trait]
impl Handler for MiddlewareChain {
	async fn handle(&self, request: Request) -> Result<Response> {
		if self.middlewares.is_empty() {
			return self.handler.handle(request).await;
		}

		let mut current_handler = self.handler.clone();
		for middleware in self.middlewares.iter().rev() {
			current_handler = Arc::new(ComposedHandler {
				middleware: middleware.clone(),
				next: current_handler,
			});
		}

		current_handler.handle(request).await
	}
}

/// One middleware bound to the rest of the chain.
struct ComposedHandler {
	middleware: Arc<dyn Middleware>,
	next: Arc<dyn Handler>,
}

#[async_trait]
impl Handler for ComposedHandler {
	async fn handle(&self, request: Request) -> Result<Response> {
		if !self.middleware.should_continue(&request) {
			return self.next.handle(request).await;
		}
		self.middleware.process(request, self.next.clone()).await
	}
}
