use bytes::Bytes;
use hyper::header::{self, HeaderName, HeaderValue};
use hyper::{HeaderMap, StatusCode};

/// HTTP Response representation
///
/// Bodies are fully buffered; the server writes `body` in one frame.
#[derive(Debug, Clone)]
pub struct Response {
	pub status: StatusCode,
	pub headers: HeaderMap,
	pub body: Bytes,
}

impl Response {
	/// Create a new Response with the given status code
	///
	/// # Examples
	///
	/// ```
	/// use websrv_http::Response;
	/// use hyper::StatusCode;
	///
	/// let response = Response::new(StatusCode::OK);
	/// assert_eq!(response.status, StatusCode::OK);
	/// assert!(response.body.is_empty());
	/// ```
	pub fn new(status: StatusCode) -> Self {
		Self {
			status,
			headers: HeaderMap::new(),
			body: Bytes::new(),
		}
	}

	/// Create a Response with HTTP 200 OK status
	pub fn ok() -> Self {
		Self::new(StatusCode::OK)
	}

	/// Create a Response with HTTP 304 Not Modified status
	///
	/// # Examples
	///
	/// ```
	/// use websrv_http::Response;
	/// use hyper::StatusCode;
	///
	/// let response = Response::not_modified();
	/// assert_eq!(response.status, StatusCode::NOT_MODIFIED);
	/// assert!(response.body.is_empty());
	/// ```
	pub fn not_modified() -> Self {
		Self::new(StatusCode::NOT_MODIFIED)
	}

	/// Create a Response with HTTP 400 Bad Request status
	pub fn bad_request() -> Self {
		Self::new(StatusCode::BAD_REQUEST)
	}

	/// Create a Response with HTTP 404 Not Found status
	pub fn not_found() -> Self {
		Self::new(StatusCode::NOT_FOUND)
	}

	/// Create a Response with HTTP 405 Method Not Allowed status
	pub fn method_not_allowed() -> Self {
		Self::new(StatusCode::METHOD_NOT_ALLOWED)
	}

	/// Create a Response with HTTP 500 Internal Server Error status
	pub fn internal_server_error() -> Self {
		Self::new(StatusCode::INTERNAL_SERVER_ERROR)
	}

	/// Create a Response with HTTP 504 Gateway Timeout status
	pub fn gateway_timeout() -> Self {
		Self::new(StatusCode::GATEWAY_TIMEOUT)
	}

	/// Create a plain-text error response
	///
	/// The body is `message` followed by a newline, served as
	/// `text/plain; charset=utf-8` with `X-Content-Type-Options: nosniff`.
	///
	/// # Examples
	///
	/// ```
	/// use websrv_http::Response;
	/// use hyper::StatusCode;
	///
	/// let response = Response::plain_error(StatusCode::NOT_FOUND, "file not found");
	/// assert_eq!(response.status, StatusCode::NOT_FOUND);
	/// assert_eq!(response.body, "file not found\n");
	/// assert_eq!(
	///     response.headers.get("content-type").unwrap(),
	///     "text/plain; charset=utf-8"
	/// );
	/// ```
	pub fn plain_error(status: StatusCode, message: &str) -> Self {
		let mut response = Self::new(status).with_body(format!("{}\n", message));
		response.headers.insert(
			header::CONTENT_TYPE,
			HeaderValue::from_static("text/plain; charset=utf-8"),
		);
		response.headers.insert(
			header::X_CONTENT_TYPE_OPTIONS,
			HeaderValue::from_static("nosniff"),
		);
		response
	}

	/// Set the response body
	///
	/// # Examples
	///
	/// ```
	/// use websrv_http::Response;
	/// use bytes::Bytes;
	///
	/// let response = Response::ok().with_body("Hello, World!");
	/// assert_eq!(response.body, Bytes::from("Hello, World!"));
	/// ```
	pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
		self.body = body.into();
		self
	}

	/// Add a custom header to the response
	///
	/// Invalid names or values are ignored.
	///
	/// # Examples
	///
	/// ```
	/// use websrv_http::Response;
	///
	/// let response = Response::ok().with_header("X-Frame-Options", "DENY");
	/// assert_eq!(
	///     response.headers.get("x-frame-options").unwrap().to_str().unwrap(),
	///     "DENY"
	/// );
	/// ```
	pub fn with_header(mut self, name: &str, value: &str) -> Self {
		if let Ok(header_name) = HeaderName::from_bytes(name.as_bytes())
			&& let Ok(header_value) = HeaderValue::from_str(value)
		{
			self.headers.insert(header_name, header_value);
		}
		self
	}

	/// Add a header using typed HeaderName and HeaderValue
	pub fn with_typed_header(mut self, key: HeaderName, value: HeaderValue) -> Self {
		self.headers.insert(key, value);
		self
	}

	/// Set the `Content-Type` header
	///
	/// # Examples
	///
	/// ```
	/// use websrv_http::Response;
	///
	/// let response = Response::ok().with_content_type("text/css");
	/// assert_eq!(response.content_type(), Some("text/css"));
	/// ```
	pub fn with_content_type(self, media_type: &str) -> Self {
		self.with_header(header::CONTENT_TYPE.as_str(), media_type)
	}

	/// Returns the `Content-Type` header as a string, if present and valid
	pub fn content_type(&self) -> Option<&str> {
		self.headers
			.get(header::CONTENT_TYPE)
			.and_then(|value| value.to_str().ok())
	}
}

impl From<crate::Error> for Response {
	fn from(error: crate::Error) -> Self {
		let status = error.status_code();
		Response::plain_error(
			status,
			status.canonical_reason().unwrap_or("Internal Server Error"),
		)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_with_header_ignores_invalid_values() {
		let response = Response::ok()
			.with_header("X-Valid", "yes")
			.with_header("Bad Header", "value")
			.with_header("X-Bad-Value", "line\nbreak");

		assert_eq!(response.headers.len(), 1);
		assert_eq!(response.headers.get("x-valid").unwrap(), "yes");
	}

	#[rstest]
	fn test_plain_error_sets_nosniff() {
		let response = Response::plain_error(StatusCode::BAD_REQUEST, "bad request");

		assert_eq!(response.body, Bytes::from("bad request\n"));
		assert_eq!(
			response.headers.get(header::X_CONTENT_TYPE_OPTIONS).unwrap(),
			"nosniff"
		);
	}

	#[rstest]
	#[case(crate::Error::NotFound("a".into()), StatusCode::NOT_FOUND, "Not Found\n")]
	#[case(
		crate::Error::Internal("secret detail".into()),
		StatusCode::INTERNAL_SERVER_ERROR,
		"Internal Server Error\n"
	)]
	fn test_from_error_hides_message(
		#[case] error: crate::Error,
		#[case] status: StatusCode,
		#[case] body: &str,
	) {
		let response = Response::from(error);

		assert_eq!(response.status, status);
		assert_eq!(response.body, Bytes::from(body.to_string()));
	}
}
