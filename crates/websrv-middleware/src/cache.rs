//! Content-hash ETag cache
//!
//! Serves only static content, so an ETag computed once per representation
//! stays valid for the life of the process. The served bytes depend on the path
//! and on whether the client accepts gzip, so both form the key. The first
//! successful GET of a representation hashes the body; later requests reuse the
//! stored value and answer matching `If-None-Match` requests with 304 without
//! calling the rest of the pipeline.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use dashmap::DashMap;
use hyper::header::{self, HeaderValue};
use hyper::{Method, StatusCode};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use websrv_http::{Handler, Middleware, Request, Response, Result};

use crate::timer::log_enter;

/// ETag of `body`: the standard base64 encoding of its SHA-256 digest
///
/// # Examples
///
/// ```
/// use websrv_middleware::cache::content_hash;
///
/// assert_eq!(
///     content_hash(b""),
///     "47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU="
/// );
/// ```
pub fn content_hash(body: &[u8]) -> String {
	STANDARD.encode(Sha256::digest(body))
}

/// Identifies one representation of a served file
type CacheKey = (String, bool);

/// ETag and 304 handling keyed by served path and gzip acceptance
///
/// Must sit after the fallback stage so the key is the served path. Entries
/// are never evicted. Two concurrent first requests for one key may both
/// compute the hash; both values are equal and the last write is kept.
#[derive(Default)]
pub struct ContentHashCacheMiddleware {
	hashes: DashMap<CacheKey, String>,
}

impl ContentHashCacheMiddleware {
	/// # Examples
	///
	/// ```
	/// use std::sync::Arc;
	/// use hyper::StatusCode;
	/// use websrv_middleware::ContentHashCacheMiddleware;
	/// use websrv_http::{Handler, Middleware, Request, Response};
	///
	/// struct Static;
	///
	/// #[async_trait::async_trait]
	/// impl Handler for Static {
	///     async fn handle(&self, _request: Request) -> websrv_http::Result<Response> {
	///         Ok(Response::ok().with_body("content"))
	///     }
	/// }
	///
	/// # tokio_test::block_on(async {
	/// let cache = ContentHashCacheMiddleware::new();
	/// let handler = Arc::new(Static);
	///
	/// let first = cache
	///     .process(Request::builder().uri("/a.js").build().unwrap(), handler.clone())
	///     .await
	///     .unwrap();
	/// let etag = first.headers.get("etag").unwrap().to_str().unwrap().to_string();
	///
	/// let request = Request::builder()
	///     .uri("/a.js")
	///     .header("if-none-match", &etag)
	///     .build()
	///     .unwrap();
	/// let second = cache.process(request, handler).await.unwrap();
	/// assert_eq!(second.status, StatusCode::NOT_MODIFIED);
	/// assert!(second.body.is_empty());
	/// # });
	/// ```
	pub fn new() -> Self {
		Self::default()
	}

	/// The stored ETag for `path` as served to clients that do (`gzip`) or do
	/// not accept gzip
	pub fn get(&self, path: &str, gzip: bool) -> Option<String> {
		self.hashes
			.get(&(path.to_string(), gzip))
			.map(|entry| entry.value().clone())
	}

	pub fn len(&self) -> usize {
		self.hashes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.hashes.is_empty()
	}

	/// Known path: answer 304 or forward with the stored ETag
	async fn process_known(
		&self,
		request: Request,
		next: Arc<dyn Handler>,
		etag: String,
	) -> Result<Response> {
		if request.if_none_match() == Some(etag.as_str()) {
			tracing::debug!(path = %request.path(), etag = %etag, "returned not modified");
			return Ok(Response::not_modified());
		}

		tracing::debug!(path = %request.path(), etag = %etag, "returned stored etag");
		let value = HeaderValue::from_str(&etag)?;
		let mut response = next.handle(request).await?;
		response.headers.insert(header::ETAG, value);
		Ok(response)
	}

	/// Unknown representation: hash the body of a successful GET and store it
	async fn process_unknown(
		&self,
		request: Request,
		next: Arc<dyn Handler>,
		key: CacheKey,
	) -> Result<Response> {
		if request.method == Method::HEAD {
			return next.handle(request).await;
		}

		let mut response = next.handle(request).await?;
		if response.status != StatusCode::OK {
			return Ok(response);
		}

		let etag = content_hash(&response.body);
		tracing::debug!(path = %key.0, gzip = key.1, etag = %etag, "computed missing etag");
		response
			.headers
			.insert(header::ETAG, HeaderValue::from_str(&etag)?);
		self.hashes.insert(key, etag);
		Ok(response)
	}
}

#[async_trait]
impl Middleware for ContentHashCacheMiddleware {
	async fn process(&self, request: Request, next: Arc<dyn Handler>) -> Result<Response> {
		log_enter(&request, "cache");
		let key = (request.path().to_string(), request.accepts_encoding("gzip"));
		let known = self.hashes.get(&key).map(|entry| entry.value().clone());
		match known {
			Some(etag) => self.process_known(request, next, etag).await,
			None => self.process_unknown(request, next, key).await,
		}
	}
}
