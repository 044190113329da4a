//! Nonce substitution in the `Content-Security-Policy` header

use async_trait::async_trait;
use hyper::header::{self, HeaderValue};
use std::sync::Arc;
use websrv_http::{Handler, Middleware, Request, Response, Result};

use crate::session::SessionId;
use crate::timer::log_enter;

/// The session nonce of a request, or the empty string without a session
///
/// Using the empty string keeps the placeholder from reaching the client.
pub fn session_nonce(request: &Request) -> String {
	match request.extensions.get::<SessionId>() {
		Some(SessionId(id)) => id,
		None => {
			tracing::warn!("session id not present in request");
			String::new()
		}
	}
}

/// Replaces the placeholder in the `Content-Security-Policy` response header
/// with the session nonce
pub struct CspHeaderMiddleware {
	placeholder: String,
}

impl CspHeaderMiddleware {
	/// # Examples
	///
	/// ```
	/// use std::sync::Arc;
	/// use websrv_middleware::CspHeaderMiddleware;
	/// use websrv_middleware::session::SessionId;
	/// use websrv_http::{Handler, Middleware, Request, Response};
	///
	/// struct Policy;
	///
	/// #[async_trait::async_trait]
	/// impl Handler for Policy {
	///     async fn handle(&self, _request: Request) -> websrv_http::Result<Response> {
	///         Ok(Response::ok().with_header(
	///             "Content-Security-Policy",
	///             "style-src 'self' 'nonce-${NONCE}'",
	///         ))
	///     }
	/// }
	///
	/// # tokio_test::block_on(async {
	/// let request = Request::builder().build().unwrap();
	/// request.extensions.insert(SessionId("abc".to_string()));
	///
	/// let response = CspHeaderMiddleware::new("${NONCE}")
	///     .process(request, Arc::new(Policy))
	///     .await
	///     .unwrap();
	/// assert_eq!(
	///     response.headers.get("content-security-policy").unwrap(),
	///     "style-src 'self' 'nonce-abc'"
	/// );
	/// # });
	/// ```
	pub fn new(placeholder: impl Into<String>) -> Self {
		Self {
			placeholder: placeholder.into(),
		}
	}

	fn replace_header(&self, response: &mut Response, nonce: &str) -> Result<()> {
		let Some(current) = response
			.headers
			.get(header::CONTENT_SECURITY_POLICY)
			.and_then(|value| value.to_str().ok())
		else {
			return Ok(());
		};
		if !current.contains(&self.placeholder) {
			return Ok(());
		}

		let replaced = current.replace(&self.placeholder, nonce);
		response.headers.insert(
			header::CONTENT_SECURITY_POLICY,
			HeaderValue::from_str(&replaced)?,
		);
		Ok(())
	}
}

#[async_trait]
impl Middleware for CspHeaderMiddleware {
	async fn process(&self, request: Request, next: Arc<dyn Handler>) -> Result<Response> {
		log_enter(&request, "csp-header");
		let nonce = session_nonce(&request);

		let mut response = next.handle(request).await?;
		self.replace_header(&mut response, &nonce)?;
		Ok(response)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	struct PolicyHandler {
		policy: Option<&'static str>,
	}

	#[async_trait]
	impl Handler for PolicyHandler {
		async fn handle(&self, _request: Request) -> Result<Response> {
			let response = Response::ok();
			Ok(match self.policy {
				Some(policy) => response.with_header("Content-Security-Policy", policy),
				None => response,
			})
		}
	}

	async fn run(session: Option<&str>, policy: Option<&'static str>) -> Response {
		let request = Request::builder().build().unwrap();
		if let Some(id) = session {
			request.extensions.insert(SessionId(id.to_string()));
		}
		CspHeaderMiddleware::new("${NONCE}")
			.process(request, Arc::new(PolicyHandler { policy }))
			.await
			.unwrap()
	}

	#[rstest]
	#[case(
		Some("N1"),
		"script-src 'nonce-${NONCE}'; style-src 'nonce-${NONCE}'",
		"script-src 'nonce-N1'; style-src 'nonce-N1'"
	)]
	#[case(None, "style-src 'nonce-${NONCE}'", "style-src 'nonce-'")]
	#[case(Some("N1"), "default-src 'self'", "default-src 'self'")]
	#[tokio::test]
	async fn test_header_replacement(
		#[case] session: Option<&str>,
		#[case] policy: &'static str,
		#[case] expected: &str,
	) {
		let response = run(session, Some(policy)).await;

		assert_eq!(
			response.headers.get(header::CONTENT_SECURITY_POLICY).unwrap(),
			expected
		);
	}

	#[rstest]
	#[tokio::test]
	async fn test_missing_header_not_added() {
		let response = run(Some("N1"), None).await;

		assert!(response.headers.get(header::CONTENT_SECURITY_POLICY).is_none());
	}
}
