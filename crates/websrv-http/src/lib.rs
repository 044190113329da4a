//! HTTP request/response types and the middleware abstractions websrv is built on.
//!
//! ## Handler
//!
//! Every stage that produces a response implements [`Handler`]:
//!
//! ```rust
//! use websrv_http::{Handler, Request, Response};
//! use async_trait::async_trait;
//!
//! struct Hello;
//!
//! #[async_trait]
//! impl Handler for Hello {
//!     async fn handle(&self, _request: Request) -> websrv_http::Result<Response> {
//!         Ok(Response::ok().with_body("Hello!"))
//!     }
//! }
//! ```
//!
//! ## Middleware
//!
//! Cross-cutting concerns wrap a handler through [`Middleware`] and are composed
//! with a [`MiddlewareChain`].

pub mod error;
pub mod extensions;
pub mod middleware;
pub mod request;
pub mod response;

pub use error::{Error, Result};
pub use extensions::Extensions;
pub use middleware::{Handler, Middleware, MiddlewareChain};
pub use request::{Request, RequestBuilder};
pub use response::Response;

// Re-exported so downstream crates agree on one set of HTTP types.
pub use hyper::header;
pub use hyper::{HeaderMap, Method, StatusCode, Uri, Version};
