mod methods;

use bytes::Bytes;
use hyper::{HeaderMap, Method, Uri, Version};
use std::net::SocketAddr;

use crate::{Error, Extensions, Result};

/// HTTP Request representation
///
/// Besides the raw request line the request carries a separately tracked
/// `path`. It starts out as the URI path and is rewritten by the stages that
/// normalize it, so later stages resolve files against the rewritten value
/// while the original `uri` stays available for logging.
#[derive(Debug)]
pub struct Request {
	pub method: Method,
	pub uri: Uri,
	pub version: Version,
	pub headers: HeaderMap,
	pub body: Bytes,
	pub remote_addr: Option<SocketAddr>,
	pub extensions: Extensions,
	path: String,
}

impl Request {
	/// Create a new request from its parts
	///
	/// # Examples
	///
	/// ```
	/// use websrv_http::Request;
	/// use hyper::{HeaderMap, Method, Uri, Version};
	/// use bytes::Bytes;
	///
	/// let request = Request::new(
	///     Method::GET,
	///     Uri::from_static("/index.html"),
	///     Version::HTTP_11,
	///     HeaderMap::new(),
	///     Bytes::new(),
	/// );
	/// assert_eq!(request.path(), "/index.html");
	/// ```
	pub fn new(method: Method, uri: Uri, version: Version, headers: HeaderMap, body: Bytes) -> Self {
		let path = uri.path().to_string();
		Self {
			method,
			uri,
			version,
			headers,
			body,
			remote_addr: None,
			extensions: Extensions::new(),
			path,
		}
	}

	/// Start building a request
	///
	/// # Examples
	///
	/// ```
	/// use websrv_http::Request;
	/// use hyper::Method;
	///
	/// let request = Request::builder()
	///     .method(Method::HEAD)
	///     .uri("/app.js?v=2")
	///     .build()
	///     .unwrap();
	///
	/// assert_eq!(request.method, Method::HEAD);
	/// assert_eq!(request.path(), "/app.js");
	/// ```
	pub fn builder() -> RequestBuilder {
		RequestBuilder::default()
	}

	/// The path used to resolve the requested file
	pub fn path(&self) -> &str {
		&self.path
	}

	/// Replace the path seen by the following stages
	///
	/// # Examples
	///
	/// ```
	/// use websrv_http::Request;
	///
	/// let mut request = Request::builder().uri("/a/../b.css").build().unwrap();
	/// request.set_path("b.css");
	///
	/// assert_eq!(request.path(), "b.css");
	/// assert_eq!(request.uri.path(), "/a/../b.css");
	/// ```
	pub fn set_path(&mut self, path: impl Into<String>) {
		self.path = path.into();
	}
}

/// Builder for [`Request`]
///
/// Defaults to `GET / HTTP/1.1` with no headers and an empty body.
#[derive(Debug)]
pub struct RequestBuilder {
	method: Method,
	uri: String,
	version: Version,
	headers: HeaderMap,
	body: Bytes,
	remote_addr: Option<SocketAddr>,
}

impl Default for RequestBuilder {
	fn default() -> Self {
		Self {
			method: Method::GET,
			uri: "/".to_string(),
			version: Version::HTTP_11,
			headers: HeaderMap::new(),
			body: Bytes::new(),
			remote_addr: None,
		}
	}
}

impl RequestBuilder {
	pub fn method(mut self, method: Method) -> Self {
		self.method = method;
		self
	}

	pub fn uri(mut self, uri: impl Into<String>) -> Self {
		self.uri = uri.into();
		self
	}

	pub fn version(mut self, version: Version) -> Self {
		self.version = version;
		self
	}

	pub fn headers(mut self, headers: HeaderMap) -> Self {
		self.headers = headers;
		self
	}

	/// Add a single header, ignoring invalid names or values
	pub fn header(mut self, name: &str, value: &str) -> Self {
		if let Ok(name) = hyper::header::HeaderName::from_bytes(name.as_bytes())
			&& let Ok(value) = hyper::header::HeaderValue::from_str(value)
		{
			self.headers.append(name, value);
		}
		self
	}

	pub fn body(mut self, body: impl Into<Bytes>) -> Self {
		self.body = body.into();
		self
	}

	pub fn remote_addr(mut self, addr: SocketAddr) -> Self {
		self.remote_addr = Some(addr);
		self
	}

	/// Build the request
	///
	/// # Errors
	///
	/// Returns [`Error::BadRequest`] when the URI cannot be parsed.
	pub fn build(self) -> Result<Request> {
		let uri: Uri = self
			.uri
			.parse()
			.map_err(|e| Error::BadRequest(format!("invalid URI '{}': {}", self.uri, e)))?;
		let mut request = Request::new(self.method, uri, self.version, self.headers, self.body);
		request.remote_addr = self.remote_addr;
		Ok(request)
	}
}
