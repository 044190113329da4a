//! Terminal handler serving files through the fetch chain

use async_trait::async_trait;
use hyper::header::{self, HeaderValue};
use hyper::{Method, StatusCode};
use std::sync::Arc;
use websrv_http::{Handler, Request, Response};

use crate::compression::DynamicGzip;
use crate::error::FsError;
use crate::fetch::FetchChain;
use crate::media_types::MediaTypeMap;

/// Serves the file for `request.path()`
///
/// Sets `Content-Type` from the served path's extension and
/// `Content-Encoding: gzip` for compressed content. `HEAD` gets the same
/// headers with an empty body.
pub struct FileServerHandler {
	chain: Arc<FetchChain>,
	media_types: MediaTypeMap,
	dynamic_gzip: Option<DynamicGzip>,
}

impl FileServerHandler {
	pub fn new(chain: Arc<FetchChain>, media_types: MediaTypeMap) -> Self {
		Self {
			chain,
			media_types,
			dynamic_gzip: None,
		}
	}

	/// Compress uncompressed eligible content on the fly
	pub fn with_dynamic_gzip(mut self, dynamic_gzip: DynamicGzip) -> Self {
		self.dynamic_gzip = Some(dynamic_gzip);
		self
	}
}

#[async_trait]
impl Handler for FileServerHandler {
	async fn handle(&self, request: Request) -> websrv_http::Result<Response> {
		let accepts_gzip = request.accepts_encoding("gzip");

		let fetched = match self.chain.resolve(request.path(), accepts_gzip).await {
			Ok(fetched) => fetched,
			Err(FsError::NotFound(path)) => {
				tracing::error!(path = %path, "file not found");
				return Ok(Response::plain_error(StatusCode::NOT_FOUND, "file not found"));
			}
			Err(other) => return Err(other.into()),
		};
		tracing::debug!(path = %fetched.served_path, compressed = fetched.compressed, "serving file");

		let mut compressed = fetched.compressed;
		let mut body = fetched.content;
		if !compressed
			&& let Some(dynamic_gzip) = &self.dynamic_gzip
			&& dynamic_gzip.applies(&fetched.served_path, accepts_gzip)
		{
			body = dynamic_gzip.compress(&body)?;
			compressed = true;
		}

		let mut response = Response::ok()
			.with_content_type(self.media_types.lookup(&fetched.served_path));
		if compressed {
			response
				.headers
				.insert(header::CONTENT_ENCODING, HeaderValue::from_static("gzip"));
		}
		if request.method != Method::HEAD {
			response.body = body;
		}
		Ok(response)
	}
}
