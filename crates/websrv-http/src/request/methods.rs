use super::Request;
use hyper::header;

impl Request {
	/// Returns a header value as a string, if present and valid
	///
	/// # Examples
	///
	/// ```
	/// use websrv_http::Request;
	///
	/// let request = Request::builder()
	///     .header("x-custom", "value")
	///     .build()
	///     .unwrap();
	///
	/// assert_eq!(request.header_str("x-custom"), Some("value"));
	/// assert_eq!(request.header_str("x-missing"), None);
	/// ```
	pub fn header_str(&self, name: impl header::AsHeaderName) -> Option<&str> {
		self.headers.get(name).and_then(|value| value.to_str().ok())
	}

	/// Returns true if the client lists `encoding` in `Accept-Encoding`
	///
	/// Every `Accept-Encoding` header is considered. Each comma-separated token
	/// is trimmed of surrounding whitespace and compared case-sensitively.
	///
	/// # Examples
	///
	/// ```
	/// use websrv_http::Request;
	///
	/// let request = Request::builder()
	///     .header("accept-encoding", "br, gzip")
	///     .build()
	///     .unwrap();
	///
	/// assert!(request.accepts_encoding("gzip"));
	/// assert!(!request.accepts_encoding("deflate"));
	/// ```
	pub fn accepts_encoding(&self, encoding: &str) -> bool {
		self.headers
			.get_all(header::ACCEPT_ENCODING)
			.iter()
			.filter_map(|value| value.to_str().ok())
			.flat_map(|value| value.split(','))
			.any(|token| token.trim() == encoding)
	}

	/// The `User-Agent` header, or an empty string
	pub fn user_agent(&self) -> &str {
		self.header_str(header::USER_AGENT).unwrap_or("")
	}

	/// The `Referer` header, or an empty string
	pub fn referer(&self) -> &str {
		self.header_str(header::REFERER).unwrap_or("")
	}

	/// The `If-None-Match` header, if present
	pub fn if_none_match(&self) -> Option<&str> {
		self.header_str(header::IF_NONE_MATCH)
	}

	/// The remote IP address as text, or an empty string when unknown
	pub fn remote_ip(&self) -> String {
		self.remote_addr
			.map(|addr| addr.ip().to_string())
			.unwrap_or_default()
	}

	/// Build the full request URL for logging
	///
	/// Uses the `Host` header when the request line carries no authority.
	///
	/// # Examples
	///
	/// ```
	/// use websrv_http::Request;
	///
	/// let request = Request::builder()
	///     .uri("/app.js?v=1")
	///     .header("host", "example.com")
	///     .build()
	///     .unwrap();
	///
	/// assert_eq!(request.full_url(), "http://example.com/app.js?v=1");
	/// ```
	pub fn full_url(&self) -> String {
		if self.uri.authority().is_some() {
			return self.uri.to_string();
		}

		let path_and_query = self
			.uri
			.path_and_query()
			.map(|pq| pq.as_str())
			.unwrap_or("/");
		match self.header_str(header::HOST) {
			Some(host) => format!("http://{}{}", host, path_and_query),
			None => path_and_query.to_string(),
		}
	}
}
