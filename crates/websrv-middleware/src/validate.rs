//! Method validation and path normalization
//!
//! Runs before every stage that looks at the path. After it the request path
//! is relative to the served root, free of `.` and `..` segments and
//! percent-decoded; the root itself is `"."`.

use async_trait::async_trait;
use hyper::header::{self, HeaderValue};
use hyper::{Method, StatusCode};
use percent_encoding::percent_decode_str;
use std::sync::Arc;
use websrv_http::{Handler, Middleware, Request, Response, Result};

use crate::timer::log_enter;

/// Body of the 405 response
pub const METHOD_NOT_ALLOWED_MESSAGE: &str = "This server only supports HTTP methods GET and HEAD";

/// Normalize an absolute request path into a key of the virtual filesystem
///
/// Duplicate slashes and `.` segments are dropped and `..` removes the
/// previous segment; `..` at the root stays at the root. Returns `None` when
/// `path` does not start with `/`.
///
/// # Examples
///
/// ```
/// use websrv_middleware::validate::clean_path;
///
/// assert_eq!(clean_path("/assets//img/../logo.png").as_deref(), Some("assets/logo.png"));
/// assert_eq!(clean_path("/../../etc/passwd").as_deref(), Some("etc/passwd"));
/// assert_eq!(clean_path("/").as_deref(), Some("."));
/// assert_eq!(clean_path("index.html"), None);
/// ```
pub fn clean_path(path: &str) -> Option<String> {
	let rooted = path.strip_prefix('/')?;

	let mut segments: Vec<&str> = Vec::new();
	for segment in rooted.split('/') {
		match segment {
			"" | "." => {}
			".." => {
				segments.pop();
			}
			other => segments.push(other),
		}
	}

	if segments.is_empty() {
		Some(".".to_string())
	} else {
		Some(segments.join("/"))
	}
}

/// Rejects methods other than GET and HEAD and cleans the request path
pub struct ValidateCleanMiddleware;

impl ValidateCleanMiddleware {
	pub fn new() -> Self {
		Self
	}

	fn method_not_allowed() -> Response {
		let mut response =
			Response::plain_error(StatusCode::METHOD_NOT_ALLOWED, METHOD_NOT_ALLOWED_MESSAGE);
		response
			.headers
			.insert(header::ALLOW, HeaderValue::from_static("GET, HEAD"));
		response
	}
}

impl Default for ValidateCleanMiddleware {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl Middleware for ValidateCleanMiddleware {
	async fn process(&self, mut request: Request, next: Arc<dyn Handler>) -> Result<Response> {
		log_enter(&request, "validate-clean");
		if request.method != Method::GET && request.method != Method::HEAD {
			tracing::debug!(method = %request.method, "rejected method");
			return Ok(Self::method_not_allowed());
		}

		let decoded = match percent_decode_str(request.path()).decode_utf8() {
			Ok(decoded) => decoded.into_owned(),
			Err(_) => {
				tracing::debug!(path = %request.path(), "path is not valid UTF-8");
				return Ok(Response::plain_error(StatusCode::BAD_REQUEST, ""));
			}
		};
		let Some(cleaned) = clean_path(&decoded) else {
			tracing::debug!(path = %decoded, "path is not absolute");
			return Ok(Response::plain_error(StatusCode::BAD_REQUEST, ""));
		};

		request.set_path(cleaned);
		next.handle(request).await
	}
}
