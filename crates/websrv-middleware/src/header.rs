//! Static response headers

use async_trait::async_trait;
use hyper::header::{HeaderName, HeaderValue};
use std::sync::Arc;
use websrv_http::{Error, Handler, Middleware, Request, Response, Result};

use crate::timer::log_enter;

/// Adds the configured headers to every response
///
/// A header already set by a later stage is left untouched.
pub struct StaticHeadersMiddleware {
	headers: Vec<(HeaderName, HeaderValue)>,
}

impl StaticHeadersMiddleware {
	/// Parse the configured `name -> value` pairs
	///
	/// # Errors
	///
	/// Returns [`Error::InvalidHeader`] for a value that is not a valid header
	/// value and [`Error::Internal`] for an invalid header name.
	///
	/// # Examples
	///
	/// ```
	/// use websrv_middleware::StaticHeadersMiddleware;
	///
	/// let middleware = StaticHeadersMiddleware::new([
	///     ("X-Frame-Options", "DENY"),
	///     ("Referrer-Policy", "no-referrer"),
	/// ])
	/// .unwrap();
	/// assert_eq!(middleware.len(), 2);
	///
	/// assert!(StaticHeadersMiddleware::new([("Bad Name", "x")]).is_err());
	/// ```
	pub fn new<K, V>(headers: impl IntoIterator<Item = (K, V)>) -> Result<Self>
	where
		K: AsRef<str>,
		V: AsRef<str>,
	{
		let headers = headers
			.into_iter()
			.map(|(name, value)| {
				let name = HeaderName::from_bytes(name.as_ref().as_bytes()).map_err(|e| {
					Error::Internal(format!("invalid header name '{}': {}", name.as_ref(), e))
				})?;
				let value = HeaderValue::from_str(value.as_ref())?;
				Ok::<_, Error>((name, value))
			})
			.collect::<Result<Vec<_>>>()?;
		Ok(Self { headers })
	}

	pub fn len(&self) -> usize {
		self.headers.len()
	}

	pub fn is_empty(&self) -> bool {
		self.headers.is_empty()
	}
}

#[async_trait]
impl Middleware for StaticHeadersMiddleware {
	async fn process(&self, request: Request, next: Arc<dyn Handler>) -> Result<Response> {
		log_enter(&request, "static-headers");
		let mut response = next.handle(request).await?;
		for (name, value) in &self.headers {
			if !response.headers.contains_key(name) {
				response.headers.insert(name.clone(), value.clone());
			}
		}
		Ok(response)
	}
}
