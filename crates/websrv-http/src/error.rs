//! Error type shared by all request handlers.

use hyper::StatusCode;
use std::time::Duration;

/// Errors raised while processing a request.
///
/// Handlers return these instead of building error responses themselves when
/// the failure is not part of the normal response flow. The server turns any
/// error that reaches it into a response via [`Error::status_code`], without
/// leaking the message to the client.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Not found: {0}")]
	NotFound(String),

	#[error("Bad request: {0}")]
	BadRequest(String),

	#[error("Internal server error: {0}")]
	Internal(String),

	#[error("Invalid header value: {0}")]
	InvalidHeader(#[from] hyper::header::InvalidHeaderValue),

	#[error("Request timed out after {0:?}")]
	Timeout(Duration),

	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
}

impl Error {
	/// Returns the HTTP status this error maps to.
	///
	/// # Examples
	///
	/// ```
	/// use websrv_http::Error;
	/// use hyper::StatusCode;
	///
	/// assert_eq!(Error::NotFound("a.js".into()).status_code(), StatusCode::NOT_FOUND);
	/// assert_eq!(Error::Internal("boom".into()).status_code(), StatusCode::INTERNAL_SERVER_ERROR);
	/// ```
	pub fn status_code(&self) -> StatusCode {
		match self {
			Error::NotFound(_) => StatusCode::NOT_FOUND,
			Error::BadRequest(_) => StatusCode::BAD_REQUEST,
			Error::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
			Error::Internal(_) | Error::InvalidHeader(_) | Error::Io(_) => {
				StatusCode::INTERNAL_SERVER_ERROR
			}
		}
	}
}

/// Result alias used by handlers and middleware.
pub type Result<T> = std::result::Result<T, Error>;
